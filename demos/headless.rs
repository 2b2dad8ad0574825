//! Renders a small incident map to PNG files without any windowing system.
//!
//! ```text
//! cargo run --example headless -- [out_dir]
//! ```
//!
//! Tiles are fetched over HTTP, so the first frames show the background until
//! loads come back. The demo keeps drawing until every requested tile has
//! settled or a few seconds have passed.

use anyhow::Context;
use incimap::prelude::*;
use std::path::PathBuf;

const WIDTH: u32 = 960;
const HEIGHT: u32 = 640;

fn sample_incidents() -> Vec<IncidentPoint> {
    let spots = [
        ("fire-1", 51.5074, -0.1278, IncidentStatus::Reported),
        ("flood-2", 51.5033, -0.1196, IncidentStatus::Investigating),
        ("crash-3", 51.5155, -0.0922, IncidentStatus::Resolved),
        ("crash-4", 51.5158, -0.0925, IncidentStatus::Reported),
        ("theft-5", 51.4975, -0.1357, IncidentStatus::Resolved),
        ("fire-6", 51.5205, -0.0780, IncidentStatus::Investigating),
        ("outage-7", 51.4700, -0.4543, IncidentStatus::Reported),
    ];
    spots
        .iter()
        .map(|(id, lat, lng, status)| IncidentPoint::new(*id, *lat, *lng).with_status(*status))
        .collect()
}

/// Tiles, heatmap and markers, bottom to top.
struct Layers {
    base: RasterSurface,
    heat: RasterSurface,
    markers: RasterSurface,
}

impl Layers {
    fn new() -> Self {
        Self {
            base: RasterSurface::new(WIDTH, HEIGHT),
            heat: RasterSurface::new(WIDTH, HEIGHT),
            markers: RasterSurface::new(WIDTH, HEIGHT),
        }
    }

    /// Flattens the visible layers for saving.
    fn composite(&self, show_heat: bool) -> image::RgbaImage {
        let mut out = self.base.image().clone();
        if show_heat {
            image::imageops::overlay(&mut out, self.heat.image(), 0, 0);
        }
        image::imageops::overlay(&mut out, self.markers.image(), 0, 0);
        out
    }
}

/// Draws frames whenever the engine asks for one, until it goes quiet.
async fn settle(map: &mut MapEngine, layers: &mut Layers, budget: Duration) -> FrameStats {
    let started = Instant::now();
    let mut last = FrameStats::default();
    while let Some(due) = map.next_frame_at() {
        if started.elapsed() > budget {
            log::warn!("gave up waiting for tiles after {:?}", budget);
            break;
        }
        let now = Instant::now();
        if due > now {
            tokio::time::sleep(due - now).await;
        }
        let outcome = map.render_frame(
            Instant::now(),
            &mut layers.base,
            &mut layers.heat,
            &mut layers.markers,
        );
        if let FrameOutcome::Rendered(stats) = outcome {
            last = stats;
        }
    }
    last
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    incimap::init_logging();

    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut map = MapEngine::new(EngineConfig::for_device(DeviceClass::Desktop))?;
    let (listener, events) = ChannelListener::new();
    map.add_listener(Box::new(listener));
    map.resize(WIDTH as f64, HEIGHT as f64);
    map.set_incidents(sample_incidents());

    let mut layers = Layers::new();
    let budget = Duration::from_secs(5);

    map.fit_all(Instant::now());
    let stats = settle(&mut map, &mut layers, budget).await;
    log::info!("markers view: {:?}", stats);
    let path = out_dir.join("incidents.png");
    layers
        .composite(map.display_mode().heatmap)
        .save(&path)
        .with_context(|| format!("writing {}", path.display()))?;

    map.set_display_mode(DisplayMode {
        theme: Theme::Dark,
        heatmap: true,
        ..DisplayMode::default()
    });
    let stats = settle(&mut map, &mut layers, budget).await;
    log::info!("heatmap view: {:?}", stats);
    let path = out_dir.join("heatmap.png");
    layers
        .composite(map.display_mode().heatmap)
        .save(&path)
        .with_context(|| format!("writing {}", path.display()))?;

    for event in events.try_iter() {
        if let MapEvent::MapStateChange { state } = event {
            println!("camera: {:?}", state.rounded());
        }
    }
    println!("wrote {}", out_dir.display());
    Ok(())
}

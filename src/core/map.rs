use crate::{
    animation::flight::{fit_bounds, Animation},
    core::{
        config::EngineConfig,
        geo::{IncidentPoint, LatLng, Point},
        viewport::{DisplayMode, MapState, Theme, Viewport},
    },
    input::{
        events::{dispatch, InputEvent, MapEvent, MapListener},
        handler::{Action, ClickTarget, InteractionController},
    },
    layers::{heatmap::HeatmapCompositor, markers::draw_markers},
    rendering::{
        scheduler::{RenderScheduler, ScheduleDecision},
        surface::{Color, Surface},
    },
    runtime::{network_spawner, AsyncSpawner},
    spatial::{
        clustering::{cluster_points, Marker},
        index::MarkerIndex,
    },
    tiles::{
        cache::{CachedTile, TileCache},
        loader::{HttpFetcher, TileFetcher, TileLoader},
        resolver::{TileResolver, TileSlot},
        source::TileSources,
    },
    MapError, Result,
};
use instant::Instant;
use std::sync::Arc;

const LIGHT_BACKGROUND: Color = Color::rgb(242, 239, 233);
const DARK_BACKGROUND: Color = Color::rgb(38, 38, 38);

/// Counters for one drawn frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub tiles_drawn: usize,
    pub tiles_requested: usize,
    pub markers_drawn: usize,
    pub heatmap_painted: bool,
}

/// Result of [`MapEngine::render_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Rendered(FrameStats),
    /// The canvas has no area; another render has been scheduled.
    Skipped,
}

/// One map instance: camera, tiles, markers, heatmap and scheduling.
///
/// The engine never spawns its own frame loop. The host asks
/// [`next_frame_at`](Self::next_frame_at) when to draw and calls
/// [`render_frame`](Self::render_frame) with its two surfaces.
pub struct MapEngine {
    config: EngineConfig,
    state: MapState,
    width: f64,
    height: f64,
    display: DisplayMode,

    incidents: Vec<IncidentPoint>,
    incidents_version: u64,
    selected: Option<String>,

    cache: TileCache,
    resolver: TileResolver,
    sources: TileSources,
    loader: TileLoader,

    scheduler: RenderScheduler,
    animation: Option<Animation>,
    controller: InteractionController,
    heatmap: HeatmapCompositor,
    warned_small_cache: bool,

    markers: Vec<Marker>,
    marker_index: MarkerIndex,

    listeners: Vec<Box<dyn MapListener>>,
    last_notified: Option<MapState>,
}

impl MapEngine {
    /// Engine fetching tiles over HTTP on the tokio runtime the caller is in.
    ///
    /// Fails with [`MapError::NoRuntime`] outside a runtime; use
    /// [`with_fetcher`](Self::with_fetcher) with a
    /// [`TokioSpawner`](crate::runtime::TokioSpawner) built from a `Handle` to
    /// create the engine elsewhere.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let spawner = network_spawner()?;
        let fetcher = HttpFetcher::with_user_agent(&config.tiles.user_agent)?;
        Ok(Self::with_fetcher(config, Arc::new(fetcher), spawner))
    }

    /// Engine with a custom tile fetcher and spawner.
    pub fn with_fetcher(
        config: EngineConfig,
        fetcher: Arc<dyn TileFetcher>,
        spawner: Arc<dyn AsyncSpawner>,
    ) -> Self {
        let state = config.default_camera.normalized(&config.zoom);
        let mut scheduler = RenderScheduler::new(config.scheduler.clone());
        scheduler.schedule_render(Instant::now());

        Self {
            state,
            width: 0.0,
            height: 0.0,
            display: DisplayMode::default(),
            incidents: Vec::new(),
            incidents_version: 0,
            selected: None,
            cache: TileCache::new(config.tiles.cache_size),
            resolver: TileResolver::new(config.tiles.margin_tiles, config.zoom),
            sources: TileSources::from_config(&config.tiles),
            loader: TileLoader::new(fetcher, spawner),
            scheduler,
            animation: None,
            controller: InteractionController::new(config.interaction.clone(), config.zoom),
            heatmap: HeatmapCompositor::new(config.heatmap.clone()),
            warned_small_cache: false,
            markers: Vec::new(),
            marker_index: MarkerIndex::new(),
            listeners: Vec::new(),
            last_notified: None,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn add_listener(&mut self, listener: Box<dyn MapListener>) {
        self.listeners.push(listener);
    }

    // --- host inputs ------------------------------------------------------------------------

    /// Replaces the incident set. Points that cannot be projected are kept
    /// but never drawn.
    pub fn set_incidents(&mut self, incidents: Vec<IncidentPoint>) {
        let invalid = incidents.iter().filter(|p| !p.is_renderable()).count();
        if invalid > 0 {
            log::debug!("{} of {} incidents have unusable coordinates", invalid, incidents.len());
        }
        self.incidents = incidents;
        self.incidents_version += 1;
        self.request_render();
    }

    pub fn incidents(&self) -> &[IncidentPoint] {
        &self.incidents
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        if mode != self.display {
            log::debug!("display mode {:?} -> {:?}", self.display, mode);
            self.display = mode;
            self.request_render();
        }
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display
    }

    /// Highlights one incident, or none.
    pub fn set_selected(&mut self, id: Option<String>) {
        if id != self.selected {
            self.selected = id;
            self.request_render();
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        let width = if width.is_finite() { width.max(0.0) } else { 0.0 };
        let height = if height.is_finite() { height.max(0.0) } else { 0.0 };
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.request_render();
        }
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.state, self.width, self.height)
    }

    // --- camera -----------------------------------------------------------------------------

    pub fn map_state(&self) -> MapState {
        self.state
    }

    /// Jumps the camera, cancelling any running fly-to.
    pub fn set_map_state(&mut self, state: MapState) {
        self.cancel_animation();
        self.state = state.normalized(&self.config.zoom);
        self.request_render();
    }

    /// Animates the camera to a coordinate, keeping the zoom when none is given.
    /// Replaces any animation already running, starting from the current camera.
    pub fn fly_to(&mut self, lat: f64, lng: f64, zoom: Option<f64>, now: Instant) -> Result<()> {
        if !LatLng::new(lat, lng).is_valid() {
            return Err(MapError::InvalidCoordinates(format!("{}, {}", lat, lng)));
        }
        let target = MapState {
            lat,
            lng,
            zoom: zoom.unwrap_or(self.state.zoom),
        }
        .normalized(&self.config.zoom);
        self.start_animation(target, now);
        Ok(())
    }

    /// Animates to the camera that frames every incident, or to the default
    /// camera when there is nothing to frame.
    pub fn fit_all(&mut self, now: Instant) {
        let target = fit_bounds(
            &self.incidents,
            self.width,
            self.height,
            self.config.scheduler.fit_padding_px,
            &self.config.zoom,
        )
        .unwrap_or_else(|| self.config.default_camera.normalized(&self.config.zoom));
        self.start_animation(target, now);
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    fn start_animation(&mut self, target: MapState, now: Instant) {
        log::debug!("fly-to {:?} -> {:?}", self.state, target);
        self.animation = Some(Animation::new(
            self.state,
            target,
            now,
            self.config.scheduler.fly_duration(),
        ));
        self.scheduler.note_interaction(now);
        self.scheduler.schedule_render(now);
    }

    fn cancel_animation(&mut self) {
        if self.animation.take().is_some() {
            log::debug!("fly-to cancelled");
        }
    }

    // --- input ------------------------------------------------------------------------------

    /// Feeds one input event. Camera gestures cancel a running fly-to.
    pub fn handle_input(&mut self, event: &InputEvent, now: Instant) {
        // typing into a host text field is not map interaction
        if let InputEvent::Key {
            in_text_input: true,
            ..
        } = event
        {
            return;
        }
        self.scheduler.note_interaction(now);
        let viewport = self.viewport();

        for action in self.controller.handle_event(event, &viewport) {
            match action {
                Action::Move(state) => {
                    self.cancel_animation();
                    self.state = state;
                    self.scheduler.schedule_render(now);
                }
                Action::Click(position) => {
                    let target = self.controller.resolve_click(
                        position,
                        &viewport,
                        &self.marker_index,
                        &self.markers,
                    );
                    self.click(target, now);
                }
            }
        }
    }

    fn click(&mut self, target: ClickTarget, now: Instant) {
        match target {
            ClickTarget::Incident(id) => self.emit(MapEvent::IncidentClick { id }),
            ClickTarget::Cluster { ids, zoom_to } => {
                self.emit(MapEvent::ClusterClick { ids });
                self.start_animation(zoom_to, now);
            }
            ClickTarget::Map(lat_lng) => self.emit(MapEvent::MapClick { lat_lng }),
        }
    }

    fn emit(&mut self, event: MapEvent) {
        for listener in self.listeners.iter_mut() {
            dispatch(listener.as_mut(), &event);
        }
    }

    // --- scheduling -------------------------------------------------------------------------

    pub fn schedule_render(&mut self, now: Instant) -> ScheduleDecision {
        self.scheduler.schedule_render(now)
    }

    fn request_render(&mut self) {
        self.scheduler.schedule_render(Instant::now());
    }

    /// When the host should call [`render_frame`](Self::render_frame) next;
    /// `None` when nothing is pending.
    pub fn next_frame_at(&self) -> Option<Instant> {
        self.scheduler.due_at()
    }

    pub fn scheduler(&self) -> &RenderScheduler {
        &self.scheduler
    }

    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    /// Markers drawn in the last frame.
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    // --- rendering --------------------------------------------------------------------------

    /// Draws one frame into three stacked layers: tiles on `base`, the heatmap
    /// on `overlay` and markers on `markers`, bottom to top.
    ///
    /// While the heatmap is switched off the overlay is left untouched and the
    /// host hides it; switching back on only repaints when the camera, canvas
    /// or incidents changed in the meantime.
    pub fn render_frame(
        &mut self,
        now: Instant,
        base: &mut dyn Surface,
        overlay: &mut dyn Surface,
        markers: &mut dyn Surface,
    ) -> FrameOutcome {
        self.scheduler.begin_frame(now);
        let tiles_arrived = self.drain_tiles();
        let animating = self.advance_animation(now);

        if self.width <= 0.0 || self.height <= 0.0 {
            log::debug!("canvas has no area, skipping frame");
            self.scheduler.schedule_render(now);
            return FrameOutcome::Skipped;
        }

        let viewport = self.viewport();
        let mut stats = FrameStats::default();
        self.draw_tiles(base, &viewport, &mut stats);

        if self.display.heatmap {
            stats.heatmap_painted =
                self.heatmap
                    .render(overlay, &viewport, &self.incidents, self.incidents_version);
        }

        self.markers = cluster_points(&self.incidents, &viewport, &self.config.clustering);
        markers.clear();
        let targets = draw_markers(
            markers,
            &viewport,
            &self.markers,
            self.selected.as_deref(),
            &self.config.clustering,
            &self.config.interaction,
        );
        stats.markers_drawn = targets.len();
        self.marker_index.rebuild(targets);

        if self.last_notified != Some(self.state) {
            self.last_notified = Some(self.state);
            self.emit(MapEvent::MapStateChange { state: self.state });
        }

        if animating || tiles_arrived || self.loader.in_flight() > 0 {
            self.scheduler.schedule_render(now);
        }
        FrameOutcome::Rendered(stats)
    }

    /// Moves finished loads into the cache. True when anything arrived.
    fn drain_tiles(&mut self) -> bool {
        let results = self.loader.drain();
        let arrived = !results.is_empty();
        for result in results {
            let tile = match result.image {
                Some(image) => CachedTile::Ready(image),
                None => CachedTile::Missing,
            };
            self.cache.set(result.url, tile);
        }
        arrived
    }

    /// Applies the running fly-to for `now`. True while it is still running.
    fn advance_animation(&mut self, now: Instant) -> bool {
        let Some(animation) = &self.animation else {
            return false;
        };
        if animation.is_finished(now) {
            self.state = animation.to.normalized(&self.config.zoom);
            self.animation = None;
            false
        } else {
            self.state = animation.sample(now).normalized(&self.config.zoom);
            true
        }
    }

    fn draw_tiles(&mut self, base: &mut dyn Surface, viewport: &Viewport, stats: &mut FrameStats) {
        let background = match self.display.theme {
            Theme::Light => LIGHT_BACKGROUND,
            Theme::Dark => DARK_BACKGROUND,
        };
        base.clear();
        base.fill_rect(0.0, 0.0, viewport.width, viewport.height, background);

        // centre tiles first, so a cache smaller than the viewport keeps those
        let mut slots = self.resolver.resolve(viewport);
        let centre = viewport.center_pixel();
        slots.sort_by(|a, b| {
            slot_distance(a, &centre).total_cmp(&slot_distance(b, &centre))
        });
        let urls: Vec<String> = slots
            .iter()
            .map(|slot| self.sources.primary_url(slot.coord, &self.display))
            .collect();
        self.cache.set_viewport_tiles(urls.iter().cloned());

        let capacity = self.cache.capacity();
        if slots.len() > capacity && !self.warned_small_cache {
            log::warn!(
                "viewport needs {} tiles but the cache holds {}; outer tiles stay blank",
                slots.len(),
                capacity
            );
            self.warned_small_cache = true;
        }

        for (rank, (slot, url)) in slots.iter().zip(urls).enumerate() {
            match self.cache.get(&url) {
                Some(CachedTile::Ready(image)) => {
                    base.draw_image(image, slot.x, slot.y, slot.size, slot.size);
                    stats.tiles_drawn += 1;
                }
                // pending or failed tiles leave the background showing
                Some(_) => {}
                // loading them would only evict the tiles nearer the centre
                None if rank >= capacity => {}
                None => {
                    let fallback = self.sources.fallback_url(slot.coord);
                    if self.loader.request(url.clone(), fallback) {
                        self.cache.set(url, CachedTile::Pending);
                        stats.tiles_requested += 1;
                    }
                }
            }
        }
    }
}

fn slot_distance(slot: &TileSlot, centre: &Point) -> f64 {
    let half = slot.size / 2.0;
    Point::new(slot.x + half, slot.y + half).distance_to(centre)
}

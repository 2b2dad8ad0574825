//! Heatmap compositing onto the overlay surface.
//!
//! Small point sets are drawn as one radial gradient per point. Past
//! `grid_threshold` visible points the compositor switches to a density grid:
//! points are binned into cells, blurred with a separable Gaussian kernel,
//! normalized and coloured through the configured gradient ramp.

use crate::core::config::HeatmapConfig;
use crate::core::geo::{IncidentPoint, Point};
use crate::core::viewport::{MapState, Viewport};
use crate::layers::markers::status_color;
use crate::rendering::surface::{Color, Surface};

/// Inputs that decide what the heatmap looks like. An unchanged key means
/// the overlay from the previous frame is still correct.
#[derive(Debug, Clone, Copy, PartialEq)]
struct HeatmapKey {
    points_version: u64,
    state: MapState,
    width: f64,
    height: f64,
}

/// How the last heatmap was drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeatmapPath {
    Gradient,
    Grid,
}

pub struct HeatmapCompositor {
    config: HeatmapConfig,
    drawn: Option<HeatmapKey>,
    last_path: Option<HeatmapPath>,
}

impl HeatmapCompositor {
    pub fn new(config: HeatmapConfig) -> Self {
        Self {
            config,
            drawn: None,
            last_path: None,
        }
    }

    pub fn config(&self) -> &HeatmapConfig {
        &self.config
    }

    pub fn last_path(&self) -> Option<HeatmapPath> {
        self.last_path
    }

    /// Redraws the overlay if anything it depends on changed. `points_version`
    /// must change whenever the point set does. Returns whether it painted.
    pub fn render(
        &mut self,
        surface: &mut dyn Surface,
        viewport: &Viewport,
        points: &[IncidentPoint],
        points_version: u64,
    ) -> bool {
        let key = HeatmapKey {
            points_version,
            state: viewport.state,
            width: viewport.width,
            height: viewport.height,
        };
        if self.drawn == Some(key) {
            return false;
        }

        surface.clear();
        let margin = self.config.radius_px;
        let visible: Vec<(Point, Color)> = points
            .iter()
            .filter(|p| p.is_renderable())
            .map(|p| (viewport.lat_lng_to_pixel(&p.lat_lng()), status_color(p.status)))
            .filter(|(pos, _)| viewport.contains_pixel(pos, margin))
            .collect();

        let path = if visible.len() > self.config.grid_threshold {
            self.draw_grid(surface, viewport, &visible);
            HeatmapPath::Grid
        } else {
            self.draw_gradients(surface, &visible);
            HeatmapPath::Gradient
        };
        log::debug!("heatmap redrawn: {} points, {:?} path", visible.len(), path);

        self.drawn = Some(key);
        self.last_path = Some(path);
        true
    }

    fn draw_gradients(&self, surface: &mut dyn Surface, visible: &[(Point, Color)]) {
        for (pos, color) in visible {
            surface.radial_gradient(
                pos.x,
                pos.y,
                self.config.radius_px,
                color.with_opacity(self.config.opacity),
            );
        }
    }

    fn draw_grid(&self, surface: &mut dyn Surface, viewport: &Viewport, visible: &[(Point, Color)]) {
        let cell = self.config.grid_cell_px.max(1.0);
        let mut grid = DensityGrid::new(
            (viewport.width / cell).ceil() as usize,
            (viewport.height / cell).ceil() as usize,
        );
        // points just off-canvas still bleed into the edge cells
        for (pos, _) in visible {
            let cx = (pos.x / cell).floor() as i64;
            let cy = (pos.y / cell).floor() as i64;
            grid.add_clamped(cx, cy, 1.0);
        }

        let sigma = (self.config.radius_px / cell / 2.0).max(0.5);
        grid.blur(sigma);
        grid.normalize();

        for row in 0..grid.height {
            for col in 0..grid.width {
                let value = grid.get(col, row);
                if value <= 0.01 {
                    continue;
                }
                let color = ramp_color(&self.config.gradient, value).with_opacity(self.config.opacity);
                surface.fill_rect(col as f64 * cell, row as f64 * cell, cell, cell, color);
            }
        }
    }
}

impl Default for HeatmapCompositor {
    fn default() -> Self {
        Self::new(HeatmapConfig::default())
    }
}

/// Maps a normalized density to a colour by interpolating between stops.
pub fn ramp_color(stops: &[(f64, Color)], value: f64) -> Color {
    let value = value.clamp(0.0, 1.0);
    let Some(first) = stops.first() else {
        return Color::TRANSPARENT;
    };
    if value <= first.0 {
        return first.1;
    }

    for pair in stops.windows(2) {
        let (t1, c1) = pair[0];
        let (t2, c2) = pair[1];
        if value >= t1 && value <= t2 {
            let span = t2 - t1;
            let t = if span > 0.0 { (value - t1) / span } else { 1.0 };
            return c1.lerp(c2, t);
        }
    }

    stops.last().map(|s| s.1).unwrap_or(Color::TRANSPARENT)
}

/// Row-major grid of densities.
#[derive(Debug, Clone)]
struct DensityGrid {
    width: usize,
    height: usize,
    cells: Vec<f64>,
}

impl DensityGrid {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0.0; width * height],
        }
    }

    fn get(&self, x: usize, y: usize) -> f64 {
        self.cells[y * self.width + x]
    }

    fn add_clamped(&mut self, x: i64, y: i64, amount: f64) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        self.cells[y * self.width + x] += amount;
    }

    /// Horizontal pass then vertical pass with the same 1D kernel.
    fn blur(&mut self, sigma: f64) {
        let kernel = gaussian_kernel(sigma);
        let r = (kernel.len() / 2) as i64;
        let (w, h) = (self.width as i64, self.height as i64);

        let mut tmp = vec![0.0; self.cells.len()];
        for y in 0..h {
            for x in 0..w {
                let mut acc = 0.0;
                for (k, weight) in kernel.iter().enumerate() {
                    let sx = x + k as i64 - r;
                    if sx >= 0 && sx < w {
                        acc += self.cells[(y * w + sx) as usize] * weight;
                    }
                }
                tmp[(y * w + x) as usize] = acc;
            }
        }
        for y in 0..h {
            for x in 0..w {
                let mut acc = 0.0;
                for (k, weight) in kernel.iter().enumerate() {
                    let sy = y + k as i64 - r;
                    if sy >= 0 && sy < h {
                        acc += tmp[(sy * w + x) as usize] * weight;
                    }
                }
                self.cells[(y * w + x) as usize] = acc;
            }
        }
    }

    fn normalize(&mut self) {
        let max = self.cells.iter().cloned().fold(0.0_f64, f64::max);
        if max > 0.0 {
            for c in &mut self.cells {
                *c /= max;
            }
        }
    }
}

fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let r = (sigma * 3.0).ceil() as i64;
    let mut kernel: Vec<f64> = (-r..=r)
        .map(|i| (-(i * i) as f64 / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f64 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= sum;
    }
    kernel
}

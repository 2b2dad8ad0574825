use crate::core::config::ZoomLimits;
use crate::core::constants::TILE_SIZE;
use crate::core::geo::{Point, TileCoord};
use crate::core::projection::project;
use crate::core::viewport::Viewport;

/// Inclusive range of unwrapped tile indices at one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub z: u8,
    pub min_x: i64,
    pub max_x: i64,
    pub min_y: i64,
    pub max_y: i64,
}

impl TileRange {
    pub fn columns(&self) -> i64 {
        self.max_x - self.min_x + 1
    }

    pub fn rows(&self) -> i64 {
        (self.max_y - self.min_y + 1).max(0)
    }
}

/// A tile to draw this frame: which tile, and where on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileSlot {
    pub coord: TileCoord,
    /// Top-left corner in canvas pixels.
    pub x: f64,
    pub y: f64,
    /// Edge length in canvas pixels; differs from the tile size at fractional zoom.
    pub size: f64,
}

/// Works out which tiles cover a viewport.
#[derive(Debug, Clone)]
pub struct TileResolver {
    margin: i64,
    limits: ZoomLimits,
}

impl TileResolver {
    pub fn new(margin: i64, limits: ZoomLimits) -> Self {
        Self {
            margin: margin.max(0),
            limits,
        }
    }

    /// Integer zoom whose tiles are drawn for a continuous zoom.
    pub fn tile_zoom(&self, zoom: f64) -> u8 {
        self.limits.clamp(zoom).round().clamp(0.0, 30.0) as u8
    }

    /// Tile index range covering the viewport's four corners plus the margin.
    /// Rows outside the world are cut off; columns are left unwrapped.
    pub fn tile_range(&self, viewport: &Viewport) -> TileRange {
        let z = self.tile_zoom(viewport.state.zoom);
        let scale = 2_f64.powf(viewport.state.zoom - z as f64);
        let center = project(viewport.state.lat, viewport.state.lng, z as f64);
        let half_w = viewport.width / 2.0 / scale;
        let half_h = viewport.height / 2.0 / scale;

        let corners = [
            Point::new(center.x - half_w, center.y - half_h),
            Point::new(center.x + half_w, center.y - half_h),
            Point::new(center.x - half_w, center.y + half_h),
            Point::new(center.x + half_w, center.y + half_h),
        ];
        let tile = TILE_SIZE as f64;
        let index = |v: f64| (v / tile).floor() as i64;
        let min_x = corners.iter().map(|c| index(c.x)).min().unwrap_or(0);
        let max_x = corners.iter().map(|c| index(c.x)).max().unwrap_or(0);
        let min_y = corners.iter().map(|c| index(c.y)).min().unwrap_or(0);
        let max_y = corners.iter().map(|c| index(c.y)).max().unwrap_or(0);

        let last_row = TileCoord::world_tiles(z) - 1;
        TileRange {
            z,
            min_x: min_x - self.margin,
            max_x: max_x + self.margin,
            min_y: (min_y - self.margin).max(0),
            max_y: (max_y + self.margin).min(last_row),
        }
    }

    /// Every tile slot to draw for the viewport, row by row.
    pub fn resolve(&self, viewport: &Viewport) -> Vec<TileSlot> {
        if viewport.is_empty() {
            return Vec::new();
        }
        let range = self.tile_range(viewport);
        let z = range.z;
        let scale = 2_f64.powf(viewport.state.zoom - z as f64);
        let center = project(viewport.state.lat, viewport.state.lng, z as f64);
        let size = TILE_SIZE as f64 * scale;

        let mut slots = Vec::with_capacity((range.columns() * range.rows()).max(0) as usize);
        for ty in range.min_y..=range.max_y {
            for tx in range.min_x..=range.max_x {
                let Some(coord) = TileCoord::wrapped(tx, ty, z) else {
                    continue;
                };
                slots.push(TileSlot {
                    coord,
                    x: (tx as f64 * TILE_SIZE as f64 - center.x) * scale + viewport.width / 2.0,
                    y: (ty as f64 * TILE_SIZE as f64 - center.y) * scale + viewport.height / 2.0,
                    size,
                });
            }
        }
        slots
    }
}

impl Default for TileResolver {
    fn default() -> Self {
        Self::new(1, ZoomLimits::default())
    }
}

use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Straight (non-premultiplied) RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Same colour with its alpha multiplied by `factor`.
    pub fn with_opacity(self, factor: f32) -> Self {
        let a = (self.a as f32 * factor.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }

    /// Linear blend towards `other`, `t` in [0, 1].
    pub fn lerp(self, other: Color, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// A 2D drawing target, in canvas pixels with the origin at the top left.
///
/// The engine draws into three stacked surfaces per frame: tiles at the
/// bottom, the heatmap overlay above them and markers on top. Hosts implement this for their
/// canvas; [`RasterSurface`](crate::rendering::raster::RasterSurface) is a CPU
/// implementation.
pub trait Surface {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Resets every pixel to transparent.
    fn clear(&mut self);

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color);

    /// Draws `image` stretched into the given destination rectangle.
    fn draw_image(&mut self, image: &RgbaImage, x: f64, y: f64, width: f64, height: f64);

    fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64, color: Color);

    fn stroke_circle(&mut self, cx: f64, cy: f64, radius: f64, line_width: f64, color: Color);

    /// Disc whose alpha falls from `color.a` at the centre to zero at `radius`.
    fn radial_gradient(&mut self, cx: f64, cy: f64, radius: f64, color: Color);

    /// Centred text label. Surfaces without a font may ignore it.
    fn fill_text(&mut self, _x: f64, _y: f64, _text: &str, _color: Color) {}
}

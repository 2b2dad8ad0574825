//! CPU surface backed by an `image::RgbaImage`.
//!
//! Used for headless rendering and in tests. Shapes are rasterised per pixel
//! centre with source-over blending; no anti-aliasing.

use crate::rendering::surface::{Color, Surface};
use image::{Rgba, RgbaImage};

#[derive(Debug, Clone)]
pub struct RasterSurface {
    image: RgbaImage,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    /// Reallocates the backing image; contents are discarded.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.image.dimensions() != (width, height) {
            self.image = RgbaImage::new(width, height);
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Color {
        let [r, g, b, a] = self.image.get_pixel(x, y).0;
        Color::rgba(r, g, b, a)
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    fn blend(&mut self, x: i64, y: i64, color: Color, coverage: f64) {
        if x < 0 || y < 0 || x >= self.image.width() as i64 || y >= self.image.height() as i64 {
            return;
        }
        let src_a = color.a as f64 / 255.0 * coverage.clamp(0.0, 1.0);
        if src_a <= 0.0 {
            return;
        }
        let dst = self.image.get_pixel_mut(x as u32, y as u32);
        let dst_a = dst.0[3] as f64 / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);
        let channel = |s: u8, d: u8| {
            ((s as f64 * src_a + d as f64 * dst_a * (1.0 - src_a)) / out_a).round() as u8
        };
        *dst = Rgba([
            channel(color.r, dst.0[0]),
            channel(color.g, dst.0[1]),
            channel(color.b, dst.0[2]),
            (out_a * 255.0).round() as u8,
        ]);
    }

    /// Pixel range covered by `[start, start + len)` clipped to `limit`.
    fn span(start: f64, len: f64, limit: u32) -> std::ops::Range<i64> {
        let lo = start.round().max(0.0) as i64;
        let hi = (start + len).round().min(limit as f64) as i64;
        lo..hi.max(lo)
    }

    fn for_each_in_disc(&mut self, cx: f64, cy: f64, radius: f64, mut f: impl FnMut(&mut Self, i64, i64, f64)) {
        if !(radius > 0.0) || !cx.is_finite() || !cy.is_finite() {
            return;
        }
        let xs = Self::span(cx - radius, radius * 2.0 + 1.0, self.image.width());
        let ys = Self::span(cy - radius, radius * 2.0 + 1.0, self.image.height());
        for y in ys {
            for x in xs.clone() {
                let dx = x as f64 + 0.5 - cx;
                let dy = y as f64 + 0.5 - cy;
                let d = (dx * dx + dy * dy).sqrt();
                if d <= radius {
                    f(self, x, y, d);
                }
            }
        }
    }
}

impl Surface for RasterSurface {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn clear(&mut self) {
        for p in self.image.pixels_mut() {
            *p = Rgba([0, 0, 0, 0]);
        }
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color) {
        for py in Self::span(y, height, self.image.height()) {
            for px in Self::span(x, width, self.image.width()) {
                self.blend(px, py, color, 1.0);
            }
        }
    }

    fn draw_image(&mut self, image: &RgbaImage, x: f64, y: f64, width: f64, height: f64) {
        if image.width() == 0 || image.height() == 0 || !(width > 0.0) || !(height > 0.0) {
            return;
        }
        let sx = image.width() as f64 / width;
        let sy = image.height() as f64 / height;
        for py in Self::span(y, height, self.image.height()) {
            let src_y = (((py as f64 + 0.5 - y) * sy) as i64).clamp(0, image.height() as i64 - 1);
            for px in Self::span(x, width, self.image.width()) {
                let src_x =
                    (((px as f64 + 0.5 - x) * sx) as i64).clamp(0, image.width() as i64 - 1);
                let [r, g, b, a] = image.get_pixel(src_x as u32, src_y as u32).0;
                self.blend(px, py, Color::rgba(r, g, b, a), 1.0);
            }
        }
    }

    fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64, color: Color) {
        self.for_each_in_disc(cx, cy, radius, |s, x, y, _| s.blend(x, y, color, 1.0));
    }

    fn stroke_circle(&mut self, cx: f64, cy: f64, radius: f64, line_width: f64, color: Color) {
        let inner = (radius - line_width / 2.0).max(0.0);
        let outer = radius + line_width / 2.0;
        self.for_each_in_disc(cx, cy, outer, |s, x, y, d| {
            if d >= inner {
                s.blend(x, y, color, 1.0);
            }
        });
    }

    fn radial_gradient(&mut self, cx: f64, cy: f64, radius: f64, color: Color) {
        self.for_each_in_disc(cx, cy, radius, |s, x, y, d| {
            s.blend(x, y, color, 1.0 - d / radius);
        });
    }
}

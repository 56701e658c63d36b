use thiserror::Error;

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("cannot acquire a drawing surface for {width}x{height} at dpr {dpr}")]
    EmptySurface { width: u32, height: u32, dpr: f32 },
}

/// Straight-alpha color, all components in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb8(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a)
    }

    /// Hue in degrees, saturation and lightness in percent.
    pub fn from_hsla(h: f32, s: f32, l: f32, a: f32) -> Self {
        let s = (s / 100.0).clamp(0.0, 1.0);
        let l = (l / 100.0).clamp(0.0, 1.0);
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let hp = h.rem_euclid(360.0) / 60.0;
        let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
        let (r1, g1, b1) = match hp as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = l - c / 2.0;
        Self::new(r1 + m, g1 + m, b1 + m, a)
    }

    pub fn lerp(self, other: Rgba, t: f32) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        Rgba::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
            self.a + (other.a - self.a) * t,
        )
    }

    /// Source-over composite of `src` onto `self`.
    pub fn over(self, src: Rgba) -> Rgba {
        let a = src.a + self.a * (1.0 - src.a);
        if a <= f32::EPSILON {
            return Rgba::TRANSPARENT;
        }
        let blend = |s: f32, d: f32| (s * src.a + d * self.a * (1.0 - src.a)) / a;
        Rgba::new(blend(src.r, self.r), blend(src.g, self.g), blend(src.b, self.b), a)
    }

    /// Flatten against an opaque background color, returning 8-bit channels.
    pub fn to_rgb8_over(self, bg: (u8, u8, u8)) -> (u8, u8, u8) {
        let a = self.a.clamp(0.0, 1.0);
        let ch = |c: f32, b: u8| {
            (b as f32 * (1.0 - a) + c.clamp(0.0, 1.0) * 255.0 * a).round() as u8
        };
        (ch(self.r, bg.0), ch(self.g, bg.1), ch(self.b, bg.2))
    }
}

/// Drawing capability handed to the renderer. All coordinates are logical
/// (device-independent) pixels; pixel-density scaling stays behind the trait.
pub trait Surface {
    fn logical_size(&self) -> (f32, f32);
    fn clear(&mut self);
    fn fill_vertical_gradient(&mut self, top: Rgba, bottom: Rgba);
    fn fill_circle(&mut self, x: f32, y: f32, r: f32, color: Rgba);
    /// Stroke a line from `head` to `tail` with a gradient evaluated along it
    /// (offset 0 at the head). Stops must be sorted by offset.
    fn stroke_gradient_line(
        &mut self,
        head: (f32, f32),
        tail: (f32, f32),
        width: f32,
        stops: &[(f32, Rgba)],
    );
}

/// Software raster backend. Backing store is `round(w*dpr) x round(h*dpr)`
/// physical pixels; drawing commands arrive in logical pixels and are scaled
/// by the pixel ratio, so high-density output stays sharp.
pub struct Raster {
    logical_w: f32,
    logical_h: f32,
    dpr: f32,
    width: usize,
    height: usize,
    pixels: Vec<Rgba>,
}

impl Raster {
    pub fn new(width: u32, height: u32, dpr: f32) -> Result<Self, SurfaceError> {
        let dpr = if dpr.is_finite() { dpr.max(1.0) } else { 1.0 };
        let pw = (width as f32 * dpr).round() as usize;
        let ph = (height as f32 * dpr).round() as usize;
        if pw == 0 || ph == 0 {
            return Err(SurfaceError::EmptySurface { width, height, dpr });
        }
        Ok(Self {
            logical_w: width as f32,
            logical_h: height as f32,
            dpr,
            width: pw,
            height: ph,
            pixels: vec![Rgba::TRANSPARENT; pw * ph],
        })
    }

    pub fn physical_size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn pixel(&self, x: usize, y: usize) -> Rgba {
        self.pixels[y * self.width + x]
    }

    fn blend(&mut self, x: usize, y: usize, src: Rgba) {
        let idx = y * self.width + x;
        self.pixels[idx] = self.pixels[idx].over(src);
    }

    fn eval_stops(stops: &[(f32, Rgba)], t: f32) -> Rgba {
        match stops {
            [] => Rgba::TRANSPARENT,
            [(_, only)] => *only,
            _ => {
                if t <= stops[0].0 {
                    return stops[0].1;
                }
                for pair in stops.windows(2) {
                    let (t0, c0) = pair[0];
                    let (t1, c1) = pair[1];
                    if t <= t1 {
                        let span = (t1 - t0).max(f32::EPSILON);
                        return c0.lerp(c1, (t - t0) / span);
                    }
                }
                stops[stops.len() - 1].1
            }
        }
    }
}

impl Surface for Raster {
    fn logical_size(&self) -> (f32, f32) {
        (self.logical_w, self.logical_h)
    }

    fn clear(&mut self) {
        self.pixels.fill(Rgba::TRANSPARENT);
    }

    fn fill_vertical_gradient(&mut self, top: Rgba, bottom: Rgba) {
        let span = (self.height - 1).max(1) as f32;
        for y in 0..self.height {
            let color = top.lerp(bottom, y as f32 / span);
            for x in 0..self.width {
                self.blend(x, y, color);
            }
        }
    }

    fn fill_circle(&mut self, x: f32, y: f32, r: f32, color: Rgba) {
        if !(x.is_finite() && y.is_finite() && r.is_finite()) || r <= 0.0 {
            return;
        }
        let (cx, cy, pr) = (x * self.dpr, y * self.dpr, r * self.dpr);
        let x0 = (cx - pr - 1.0).floor().max(0.0) as usize;
        let y0 = (cy - pr - 1.0).floor().max(0.0) as usize;
        let x1 = (cx + pr + 1.0).ceil().min(self.width as f32 - 1.0);
        let y1 = (cy + pr + 1.0).ceil().min(self.height as f32 - 1.0);
        if x1 < 0.0 || y1 < 0.0 || x0 as f32 > x1 || y0 as f32 > y1 {
            return;
        }
        for py in y0..=y1 as usize {
            for px in x0..=x1 as usize {
                let dx = px as f32 + 0.5 - cx;
                let dy = py as f32 + 0.5 - cy;
                // 1px coverage feather at the rim
                let cov = (pr - (dx * dx + dy * dy).sqrt() + 0.5).clamp(0.0, 1.0);
                if cov > 0.0 {
                    let mut src = color;
                    src.a *= cov;
                    self.blend(px, py, src);
                }
            }
        }
    }

    fn stroke_gradient_line(
        &mut self,
        head: (f32, f32),
        tail: (f32, f32),
        width: f32,
        stops: &[(f32, Rgba)],
    ) {
        if !(head.0.is_finite() && head.1.is_finite() && tail.0.is_finite() && tail.1.is_finite()) {
            return;
        }
        let (hx, hy) = (head.0 * self.dpr, head.1 * self.dpr);
        let (tx, ty) = (tail.0 * self.dpr, tail.1 * self.dpr);
        let (dx, dy) = (tx - hx, ty - hy);
        let len_sq = dx * dx + dy * dy;
        if len_sq <= f32::EPSILON {
            return;
        }
        let half = (width * self.dpr).max(0.0) / 2.0;
        let pad = half + 1.0;
        let x0 = (hx.min(tx) - pad).floor().max(0.0) as usize;
        let y0 = (hy.min(ty) - pad).floor().max(0.0) as usize;
        let x1 = (hx.max(tx) + pad).ceil().min(self.width as f32 - 1.0);
        let y1 = (hy.max(ty) + pad).ceil().min(self.height as f32 - 1.0);
        if x1 < 0.0 || y1 < 0.0 || x0 as f32 > x1 || y0 as f32 > y1 {
            return;
        }
        for py in y0..=y1 as usize {
            for px in x0..=x1 as usize {
                let (ox, oy) = (px as f32 + 0.5 - hx, py as f32 + 0.5 - hy);
                let t = ((ox * dx + oy * dy) / len_sq).clamp(0.0, 1.0);
                let (nx, ny) = (ox - t * dx, oy - t * dy);
                let dist = (nx * nx + ny * ny).sqrt();
                let cov = (half - dist + 0.5).clamp(0.0, 1.0);
                if cov > 0.0 {
                    let mut src = Self::eval_stops(stops, t);
                    src.a *= cov;
                    self.blend(px, py, src);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raster_rounds_physical_dimensions() {
        let r = Raster::new(800, 600, 1.5).unwrap();
        assert_eq!(r.physical_size(), (1200, 900));
        let r = Raster::new(1024, 768, 2.0).unwrap();
        assert_eq!(r.physical_size(), (2048, 1536));
        // fractional backing sizes round, both at creation and after resize
        let r = Raster::new(333, 100, 1.25).unwrap();
        assert_eq!(r.physical_size(), (416, 125));
    }

    #[test]
    fn raster_clamps_dpr_below_one() {
        let r = Raster::new(100, 50, 0.5).unwrap();
        assert_eq!(r.physical_size(), (100, 50));
    }

    #[test]
    fn zero_area_surface_is_an_error() {
        assert!(Raster::new(0, 600, 1.0).is_err());
        assert!(Raster::new(800, 0, 2.0).is_err());
    }

    #[test]
    fn gradient_covers_every_pixel() {
        let mut r = Raster::new(4, 8, 1.0).unwrap();
        r.fill_vertical_gradient(Rgba::new(1.0, 0.0, 0.0, 1.0), Rgba::new(0.0, 0.0, 1.0, 1.0));
        let (w, h) = r.physical_size();
        for y in 0..h {
            for x in 0..w {
                assert!(r.pixel(x, y).a > 0.99);
            }
        }
        assert!(r.pixel(0, 0).r > r.pixel(0, h - 1).r);
        assert!(r.pixel(0, h - 1).b > r.pixel(0, 0).b);
    }

    #[test]
    fn circle_center_takes_source_color() {
        let mut r = Raster::new(16, 16, 1.0).unwrap();
        r.fill_circle(8.0, 8.0, 3.0, Rgba::new(1.0, 1.0, 1.0, 0.8));
        let center = r.pixel(8, 8);
        assert!((center.a - 0.8).abs() < 1e-4);
        assert_eq!(r.pixel(0, 0), Rgba::TRANSPARENT);
    }

    #[test]
    fn circle_scales_with_pixel_ratio() {
        let mut r = Raster::new(16, 16, 2.0).unwrap();
        r.fill_circle(8.0, 8.0, 2.0, Rgba::new(1.0, 1.0, 1.0, 1.0));
        // physical center is (16, 16), physical radius 4
        assert!(r.pixel(16, 16).a > 0.99);
        assert!(r.pixel(16, 13).a > 0.99);
        assert_eq!(r.pixel(16, 24).a, 0.0);
    }

    #[test]
    fn offscreen_drawing_is_clipped() {
        let mut r = Raster::new(8, 8, 1.0).unwrap();
        r.fill_circle(-50.0, -50.0, 3.0, Rgba::new(1.0, 1.0, 1.0, 1.0));
        r.fill_circle(f32::NAN, 4.0, 3.0, Rgba::new(1.0, 1.0, 1.0, 1.0));
        r.stroke_gradient_line(
            (100.0, 100.0),
            (200.0, 150.0),
            2.0,
            &[(0.0, Rgba::new(1.0, 1.0, 1.0, 1.0)), (1.0, Rgba::TRANSPARENT)],
        );
        let (w, h) = r.physical_size();
        for y in 0..h {
            for x in 0..w {
                assert_eq!(r.pixel(x, y), Rgba::TRANSPARENT);
            }
        }
    }

    #[test]
    fn gradient_line_fades_from_head_to_tail() {
        let mut r = Raster::new(64, 8, 1.0).unwrap();
        r.stroke_gradient_line(
            (2.0, 4.0),
            (62.0, 4.0),
            2.0,
            &[
                (0.0, Rgba::new(1.0, 1.0, 1.0, 0.95)),
                (0.6, Rgba::new(1.0, 1.0, 1.0, 0.25)),
                (1.0, Rgba::TRANSPARENT),
            ],
        );
        let head = r.pixel(3, 4).a;
        let mid = r.pixel(32, 4).a;
        let tail = r.pixel(61, 4).a;
        assert!(head > 0.8);
        assert!(mid < head && mid > tail);
        assert!(tail < 0.05);
    }

    #[test]
    fn hsla_conversion_hits_primaries() {
        let red = Rgba::from_hsla(0.0, 100.0, 50.0, 1.0);
        assert!((red.r - 1.0).abs() < 1e-4 && red.g.abs() < 1e-4 && red.b.abs() < 1e-4);
        let green = Rgba::from_hsla(120.0, 100.0, 50.0, 1.0);
        assert!((green.g - 1.0).abs() < 1e-4 && green.r.abs() < 1e-4);
        let blue = Rgba::from_hsla(240.0, 100.0, 50.0, 1.0);
        assert!((blue.b - 1.0).abs() < 1e-4 && blue.r.abs() < 1e-4);
        let white = Rgba::from_hsla(37.0, 100.0, 100.0, 0.5);
        assert!(white.r > 0.99 && white.g > 0.99 && white.b > 0.99);
        assert!((white.a - 0.5).abs() < 1e-6);
    }

    #[test]
    fn source_over_is_identity_against_transparent() {
        let c = Rgba::new(0.3, 0.6, 0.9, 0.7);
        let out = Rgba::TRANSPARENT.over(c);
        assert!((out.r - c.r).abs() < 1e-5);
        assert!((out.a - c.a).abs() < 1e-5);
    }

    #[test]
    fn flatten_against_background() {
        let (r, g, b) = Rgba::new(1.0, 1.0, 1.0, 0.0).to_rgb8_over((10, 20, 30));
        assert_eq!((r, g, b), (10, 20, 30));
        let (r, _, _) = Rgba::new(1.0, 1.0, 1.0, 1.0).to_rgb8_over((10, 20, 30));
        assert_eq!(r, 255);
    }
}

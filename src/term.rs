use std::io::{self, Write};

use crate::surface::Raster;

/// Paints a raster onto the terminal as 24-bit half-block cells, two raster
/// rows per terminal row. Color escape sequences are only emitted when the
/// color actually changes, which keeps frames small on mostly-dark output.
pub struct HalfBlockPresenter {
    bg: (u8, u8, u8),
    buf: Vec<u8>,
}

impl HalfBlockPresenter {
    pub fn new(bg: (u8, u8, u8)) -> Self {
        Self { bg, buf: Vec::with_capacity(64 * 1024) }
    }

    pub fn present(&mut self, raster: &Raster, out: &mut impl Write) -> io::Result<()> {
        self.buf.clear();
        self.buf.extend_from_slice(b"\x1b[H");

        let (width, height) = raster.physical_size();
        let mut prev_top: Option<(u8, u8, u8)> = None;
        let mut prev_bot: Option<(u8, u8, u8)> = None;

        for y in (0..height).step_by(2) {
            for x in 0..width {
                let top = raster.pixel(x, y).to_rgb8_over(self.bg);
                let bot = if y + 1 < height {
                    raster.pixel(x, y + 1).to_rgb8_over(self.bg)
                } else {
                    top
                };

                if prev_top != Some(top) {
                    write!(self.buf, "\x1b[48;2;{};{};{}m", top.0, top.1, top.2)?;
                    prev_top = Some(top);
                }
                if prev_bot != Some(bot) {
                    write!(self.buf, "\x1b[38;2;{};{};{}m", bot.0, bot.1, bot.2)?;
                    prev_bot = Some(bot);
                }
                self.buf.extend_from_slice("▄".as_bytes());
            }
            self.buf.extend_from_slice(b"\x1b[0m");
            prev_top = None;
            prev_bot = None;
            if y + 2 < height {
                self.buf.extend_from_slice(b"\r\n");
            }
        }

        out.write_all(&self.buf)?;
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{Rgba, Surface};

    #[test]
    fn frame_layout_matches_the_raster() {
        let mut raster = Raster::new(3, 4, 1.0).unwrap();
        raster.fill_circle(1.0, 1.0, 1.0, Rgba::new(1.0, 1.0, 1.0, 1.0));

        let mut presenter = HalfBlockPresenter::new((0, 0, 0));
        let mut out = Vec::new();
        presenter.present(&raster, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("\x1b[H"));
        // 4 raster rows fold into 2 terminal rows of 3 cells each
        assert_eq!(text.matches('▄').count(), 6);
        assert_eq!(text.matches("\r\n").count(), 1);
        assert!(text.contains("\x1b[48;2;"));
        assert!(text.ends_with("\x1b[0m"));
    }

    #[test]
    fn unpainted_cells_take_the_background_color() {
        let raster = Raster::new(2, 2, 1.0).unwrap();
        let mut presenter = HalfBlockPresenter::new((26, 27, 38));
        let mut out = Vec::new();
        presenter.present(&raster, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\x1b[48;2;26;27;38m"));
        assert!(text.contains("\x1b[38;2;26;27;38m"));
    }
}

use super::{Result, Volume};
use image::{imageops, Rgb, RgbImage};
use std::{fmt, path::Path};

/// Coolwarm diverging color stops: blue -> light blue -> neutral gray -> salmon -> red
const COOLWARM_STOPS: [(f64, f64, f64); 5] = [
    (59.0, 76.0, 192.0),
    (141.0, 176.0, 254.0),
    (221.0, 221.0, 221.0),
    (244.0, 154.0, 123.0),
    (180.0, 4.0, 38.0),
];

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([0, 0, 0]);
// NaN and infinities
const BAD_VALUE: Rgb<u8> = Rgb([128, 128, 128]);

const FONT_WIDTH: u32 = 5;
const FONT_HEIGHT: u32 = 7;
const TITLE_SCALE: u32 = 2;
const TITLE_PAD: u32 = 6;

const BAR_GAP: u32 = 8;
const BAR_WIDTH: u32 = 16;
const TICK_LEN: u32 = 4;
const LABEL_GAP: u32 = 3;

/// Maps `t` in [0, 1] onto the coolwarm color map, 0.5 being the neutral color
pub fn coolwarm(t: f64) -> Rgb<u8> {
    let t = if t.is_nan() { 0.5 } else { t.clamp(0.0, 1.0) };
    let seg = t * 4.0;
    let i = (seg as usize).min(3);
    let s = seg - i as f64;

    let (r0, g0, b0) = COOLWARM_STOPS[i];
    let (r1, g1, b1) = COOLWARM_STOPS[i + 1];
    Rgb([
        (r0 + s * (r1 - r0)) as u8,
        (g0 + s * (g1 - g0)) as u8,
        (b0 + s * (b1 - b0)) as u8,
    ])
}

/// Two-slope color normalization with 0 pinned to the center of the color map
///
/// The range always spans at least `[-0.1, 0.1]` so that a constant volume
/// still renders in the neutral color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    pub min: f64,
    pub max: f64,
}

impl ColorScale {
    pub const MIN_HALF_RANGE: f64 = 0.1;

    /// Derives the scale from the finite values of the whole volume
    pub fn from_volume(volume: &Volume) -> Self {
        let (lo, hi) = volume.finite_range().unwrap_or((0.0, 0.0));
        Self {
            min: lo.min(-Self::MIN_HALF_RANGE),
            max: hi.max(Self::MIN_HALF_RANGE),
        }
    }
    /// Maps `value` into [0, 1]; `min` goes to 0, 0 to 0.5 and `max` to 1
    pub fn normalize(&self, value: f64) -> f64 {
        let t = if value <= 0.0 {
            0.5 * (value - self.min) / -self.min
        } else {
            0.5 + 0.5 * value / self.max
        };
        t.clamp(0.0, 1.0)
    }
    pub fn color(&self, value: f64) -> Rgb<u8> {
        if value.is_finite() {
            coolwarm(self.normalize(value))
        } else {
            BAD_VALUE
        }
    }
}

/// Title drawn above a rendered slice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caption {
    InitialCondition,
    /// 0-based slice index, displayed 1-based
    TimeStep(usize),
}

impl Caption {
    /// Returns the caption with the longest text among those of `slices` frames
    pub fn widest(&self, slices: usize) -> Caption {
        match self {
            Caption::InitialCondition => Caption::InitialCondition,
            Caption::TimeStep(_) => Caption::TimeStep(slices.saturating_sub(1)),
        }
    }
}

impl fmt::Display for Caption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Caption::InitialCondition => write!(f, "Initial Condition"),
            Caption::TimeStep(index) => write!(f, "Time Step {}", index + 1),
        }
    }
}

/// Interface to slice rasterization
pub trait SliceRenderer {
    /// Renders the slice `index` along `axis` of `volume` into the image file at `path`
    ///
    /// An existing file at `path` is overwritten.
    fn render_slice(
        &self,
        volume: &Volume,
        axis: usize,
        index: usize,
        caption: &Caption,
        path: &Path,
    ) -> Result<()>;
}

/// Heatmap renderer with a color bar and a bitmap font caption
#[derive(Debug, Clone, Copy)]
pub struct HeatmapRenderer {
    /// Slices are upscaled until their longer side reaches this many pixels
    pub min_side: u32,
}

impl Default for HeatmapRenderer {
    fn default() -> Self {
        Self { min_side: 256 }
    }
}

impl HeatmapRenderer {
    fn upscale_factor(&self, rows: usize, cols: usize) -> u32 {
        let longest = rows.max(cols).max(1) as u32;
        ((self.min_side + longest - 1) / longest).max(1)
    }
    /// Rasterizes a slice, trimming the white border
    ///
    /// Row 0 of the slice is drawn at the bottom of the plot. The title band
    /// is as wide as the widest caption of the same kind along `axis`, so all
    /// frames of one volume share the same dimensions.
    pub fn rasterize(
        &self,
        volume: &Volume,
        axis: usize,
        index: usize,
        caption: &Caption,
    ) -> Result<RgbImage> {
        let slice = volume.slice(axis, index)?;
        let scale = ColorScale::from_volume(volume);
        let (rows, cols) = slice.dim();
        let factor = self.upscale_factor(rows, cols);
        let plot_w = cols as u32 * factor;
        let plot_h = rows as u32 * factor;

        let labels = [scale.max, 0.0, scale.min].map(format_tick);
        let label_w = labels.iter().map(|l| text_width(l, 1)).max().unwrap_or(0);
        let bar_x = plot_w + BAR_GAP;
        let body_w = bar_x + BAR_WIDTH + TICK_LEN + LABEL_GAP + label_w;

        let mut body = RgbImage::from_pixel(body_w, plot_h, BACKGROUND);

        for ((r, c), &value) in slice.indexed_iter() {
            let color = scale.color(value);
            let x0 = c as u32 * factor;
            let y0 = (rows - 1 - r) as u32 * factor;
            for dy in 0..factor {
                for dx in 0..factor {
                    body.put_pixel(x0 + dx, y0 + dy, color);
                }
            }
        }

        for y in 0..plot_h {
            let t = if plot_h > 1 {
                1.0 - y as f64 / (plot_h - 1) as f64
            } else {
                0.5
            };
            let color = coolwarm(t);
            for x in 0..BAR_WIDTH {
                body.put_pixel(bar_x + x, y, color);
            }
        }
        let tick_x = bar_x + BAR_WIDTH;
        for (label, y) in labels.iter().zip([0, plot_h / 2, plot_h - 1]) {
            for x in 0..TICK_LEN {
                body.put_pixel(tick_x + x, y, INK);
            }
            let label_y = y
                .saturating_sub(FONT_HEIGHT / 2)
                .min(plot_h.saturating_sub(FONT_HEIGHT));
            draw_text(&mut body, label, tick_x + TICK_LEN + LABEL_GAP, label_y, 1);
        }
        let body = trim_whitespace(&body);

        let title = caption.to_string();
        let widest = caption.widest(volume.len_of(axis)?).to_string();
        let band_w = text_width(&widest, TITLE_SCALE);
        let band_h = FONT_HEIGHT * TITLE_SCALE + TITLE_PAD;
        let mut img = RgbImage::from_pixel(
            body.width().max(band_w),
            band_h + body.height(),
            BACKGROUND,
        );
        imageops::replace(&mut img, &body, 0, band_h as i64);
        let title_x = plot_w.saturating_sub(text_width(&title, TITLE_SCALE)) / 2;
        draw_text(&mut img, &title, title_x, 0, TITLE_SCALE);

        Ok(img)
    }
}

impl SliceRenderer for HeatmapRenderer {
    fn render_slice(
        &self,
        volume: &Volume,
        axis: usize,
        index: usize,
        caption: &Caption,
        path: &Path,
    ) -> Result<()> {
        self.rasterize(volume, axis, index, caption)?.save(path)?;
        Ok(())
    }
}

/// Crops the uniformly white border around an image
pub fn trim_whitespace(img: &RgbImage) -> RgbImage {
    let bounds = img
        .enumerate_pixels()
        .filter(|(_, _, p)| **p != BACKGROUND)
        .fold(None, |bounds, (x, y, _)| match bounds {
            None => Some((x, y, x, y)),
            Some((x0, y0, x1, y1)) => Some((x0.min(x), y0.min(y), x1.max(x), y1.max(y))),
        });
    match bounds {
        Some((x0, y0, x1, y1)) => {
            imageops::crop_imm(img, x0, y0, x1 - x0 + 1, y1 - y0 + 1).to_image()
        }
        None => img.clone(),
    }
}

fn format_tick(value: f64) -> String {
    format!("{value:.3}")
}

fn text_width(text: &str, scale: u32) -> u32 {
    let n = text.chars().count() as u32;
    (n * (FONT_WIDTH + 1)).saturating_sub(1) * scale
}

fn draw_text(img: &mut RgbImage, text: &str, x: u32, y: u32, scale: u32) {
    for (i, ch) in text.chars().enumerate() {
        let cx = x + i as u32 * (FONT_WIDTH + 1) * scale;
        for (row, bits) in glyph(ch).into_iter().enumerate() {
            for col in 0..FONT_WIDTH {
                if bits & (1 << (FONT_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        let px = cx + col * scale + dx;
                        let py = y + row as u32 * scale + dy;
                        if px < img.width() && py < img.height() {
                            img.put_pixel(px, py, INK);
                        }
                    }
                }
            }
        }
    }
}

/// 5x7 glyphs, one u8 per row with bit 4 as the leftmost pixel
///
/// Characters without a glyph are drawn as a hollow box.
fn glyph(ch: char) -> [u8; FONT_HEIGHT as usize] {
    match ch {
        ' ' => [0x00; FONT_HEIGHT as usize],
        '+' => [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x0E, 0x11, 0x01, 0x06, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'N' => [0x11, 0x19, 0x15, 0x13, 0x11, 0x11, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'a' => [0x00, 0x00, 0x0E, 0x01, 0x0F, 0x11, 0x0F],
        'd' => [0x01, 0x01, 0x0D, 0x13, 0x11, 0x11, 0x0F],
        'e' => [0x00, 0x00, 0x0E, 0x11, 0x1F, 0x10, 0x0E],
        'f' => [0x06, 0x09, 0x08, 0x1C, 0x08, 0x08, 0x08],
        'i' => [0x04, 0x00, 0x0C, 0x04, 0x04, 0x04, 0x0E],
        'l' => [0x0C, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'm' => [0x00, 0x00, 0x1A, 0x15, 0x15, 0x11, 0x11],
        'n' => [0x00, 0x00, 0x16, 0x19, 0x11, 0x11, 0x11],
        'o' => [0x00, 0x00, 0x0E, 0x11, 0x11, 0x11, 0x0E],
        'p' => [0x00, 0x00, 0x1E, 0x11, 0x1E, 0x10, 0x10],
        't' => [0x08, 0x08, 0x1C, 0x08, 0x08, 0x09, 0x06],
        _ => [0x1F, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1F],
    }
}

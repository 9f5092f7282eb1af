use std::path::Path;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::audio::VisualFilter;
use crate::color::{field_to_t, hsl_to_rgb, ColorScheme, Rgb};
use crate::error::Result;
use crate::grid::Grid;
use crate::params::{FEED_RANGE, KILL_RANGE};

/// Renders the B field at grid resolution, then resamples it to the display
/// size with a smoothing filter so the patterns come out soft.
///
/// The audio filter only touches `presented`; `display` stays the plain
/// frame and is what gets exported.
#[derive(Debug, Clone)]
pub struct Renderer {
    native: RgbaImage,
    display: RgbaImage,
    presented: RgbaImage,
}

impl Renderer {
    pub fn new(grid: &Grid, display_width: u32, display_height: u32) -> Self {
        Renderer {
            native: RgbaImage::new(grid.width() as u32, grid.height() as u32),
            display: RgbaImage::new(display_width, display_height),
            presented: RgbaImage::new(display_width, display_height),
        }
    }

    pub fn native(&self) -> &RgbaImage {
        &self.native
    }

    pub fn display(&self) -> &RgbaImage {
        &self.display
    }

    /// The display frame as shown on screen, audio filter included.
    pub fn presented(&self) -> &RgbaImage {
        &self.presented
    }

    pub fn render(&mut self, grid: &Grid, scheme: &ColorScheme, filter: VisualFilter) {
        for (b, pix) in grid.b().iter().zip(self.native.pixels_mut()) {
            *pix = scheme.interpolate(field_to_t(*b)).to_rgba(255);
        }

        let (w, h) = self.display.dimensions();
        self.display = imageops::resize(&self.native, w, h, FilterType::CatmullRom);

        self.presented.clone_from(&self.display);
        if !filter.is_neutral() {
            apply_filter(&mut self.presented, filter);
        }
    }

    /// Encodes the display frame as PNG, without the audio filter.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.display.save(path)?;
        Ok(())
    }
}

/// `brightness()` then `saturate()`, both with CSS filter semantics: each
/// stage clamps to the channel range before the next one runs.
pub fn apply_filter(img: &mut RgbaImage, filter: VisualFilter) {
    let s = filter.saturation;

    #[rustfmt::skip]
    let m = [
        0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s,
        0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s,
        0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s,
    ];

    for pix in img.pixels_mut() {
        let [r, g, b, a] = pix.0;
        let bright = |c: u8| (f32::from(c) * filter.brightness).max(0.0).min(255.0);
        let (r, g, b) = (bright(r), bright(g), bright(b));

        let to_u8 = |v: f32| v.round().max(0.0).min(255.0) as u8;
        *pix = Rgba([
            to_u8(m[0] * r + m[1] * g + m[2] * b),
            to_u8(m[3] * r + m[4] * g + m[5] * b),
            to_u8(m[6] * r + m[7] * g + m[8] * b),
            a,
        ]);
    }
}

/// Alpha blends `color` with `alpha` in `[0, 1]` over the pixel at `(x, y)`.
fn blend(img: &mut RgbaImage, x: u32, y: u32, color: Rgb, alpha: f32) {
    let pix = img.get_pixel_mut(x, y);
    let mix = |dst: u8, src: u8| {
        (f32::from(dst) * (1.0 - alpha) + f32::from(src) * alpha).round() as u8
    };

    pix.0 = [
        mix(pix.0[0], color.r),
        mix(pix.0[1], color.g),
        mix(pix.0[2], color.b),
        255,
    ];
}

fn fill_disc(img: &mut RgbaImage, (cx, cy): (f32, f32), radius: f32, color: Rgb, alpha: f32) {
    let (w, h) = img.dimensions();

    let x0 = (cx - radius).floor().max(0.0) as u32;
    let y0 = (cy - radius).floor().max(0.0) as u32;
    let x1 = ((cx + radius).ceil().max(0.0) as u32).min(w);
    let y1 = ((cy + radius).ceil().max(0.0) as u32).min(h);

    for y in y0..y1 {
        for x in x0..x1 {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            if dx * dx + dy * dy <= radius * radius {
                blend(img, x, y, color, alpha);
            }
        }
    }
}

const MAP_BACKGROUND: (Rgb, Rgb) = (Rgb::new(0x1a, 0x0a, 0x2e), Rgb::new(0x16, 0x21, 0x3e));
const MAP_GRID: Rgb = Rgb::new(0, 245, 255);
const MAP_DOT: Rgb = Rgb::new(255, 0, 110);

/// The feed/kill plane with a marker at the current parameters. Feed grows to
/// the right, kill grows upwards.
#[derive(Debug, Clone)]
pub struct ParameterMap {
    image: RgbaImage,
    label: String,
}

impl ParameterMap {
    pub fn new(width: u32, height: u32) -> Self {
        ParameterMap {
            image: RgbaImage::new(width, height),
            label: String::new(),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn indicator_position(&self, feed: f32, kill: f32) -> (f32, f32) {
        indicator_position(feed, kill, self.image.width() as f32, self.image.height() as f32)
    }

    /// Inverse of the indicator mapping, for clicks on the map.
    pub fn pick(&self, x: f32, y: f32) -> (f32, f32) {
        let w = self.image.width() as f32;
        let h = self.image.height() as f32;

        (FEED_RANGE.lerp(x / w), KILL_RANGE.lerp(1.0 - y / h))
    }

    pub fn draw(&mut self, feed: f32, kill: f32) {
        let (w, h) = self.image.dimensions();
        let (from, to) = MAP_BACKGROUND;

        // linear gradient from the top-left to the bottom-right corner,
        // sampled at pixel centers
        let (fw, fh) = (w as f32, h as f32);
        let norm = (fw * fw + fh * fh).max(1.0);
        for (x, y, pix) in self.image.enumerate_pixels_mut() {
            let t = ((x as f32 + 0.5) * fw + (y as f32 + 0.5) * fh) / norm;
            *pix = from.lerp(to, t.min(1.0)).to_rgba(255);
        }

        for i in 0..=10 {
            let x = ((i * w) / 10).min(w.saturating_sub(1));
            let y = ((i * h) / 10).min(h.saturating_sub(1));

            for yy in 0..h {
                blend(&mut self.image, x, yy, MAP_GRID, 0.2);
            }
            for xx in 0..w {
                blend(&mut self.image, xx, y, MAP_GRID, 0.2);
            }
        }

        let pos = self.indicator_position(feed, kill);
        fill_disc(&mut self.image, pos, 12.0, MAP_DOT, 0.3);
        fill_disc(&mut self.image, pos, 6.0, MAP_DOT, 1.0);

        self.label = format!("F: {:.3} | K: {:.3}", feed, kill);
    }
}

pub fn indicator_position(feed: f32, kill: f32, width: f32, height: f32) -> (f32, f32) {
    (FEED_RANGE.t(feed) * width, height - KILL_RANGE.t(kill) * height)
}

/// Frequency bars with a fading trail, hue sweeping from purple to cyan.
#[derive(Debug, Clone)]
pub struct AudioVisualizer {
    image: RgbaImage,
}

impl AudioVisualizer {
    pub fn new(width: u32, height: u32) -> Self {
        AudioVisualizer {
            image: RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn draw(&mut self, bins: &[u8]) {
        let (w, h) = self.image.dimensions();

        for y in 0..h {
            for x in 0..w {
                blend(&mut self.image, x, y, Rgb::new(0, 0, 0), 0.3);
            }
        }

        if bins.is_empty() {
            return;
        }

        let len = bins.len() as f32;
        let bar_width = w as f32 / len * 2.0;
        let bar_spacing = 1.0;

        for (i, &value) in bins.iter().take(bins.len() / 2).enumerate() {
            let bar_height = f32::from(value) / 255.0 * h as f32;
            let hue = bar_hue(i, bins.len());
            let color = hsl_to_rgb(hue, 1.0, 0.6);

            let x0 = i as f32 * (bar_width + bar_spacing);
            let x_start = x0.round() as u32;
            let x_end = ((x0 + bar_width).round() as u32).min(w);
            let y_start = (h as f32 - bar_height).round().max(0.0) as u32;

            for y in y_start..h {
                for x in x_start..x_end {
                    blend(&mut self.image, x, y, color, 0.8);
                }
            }
        }
    }
}

/// `280` for the lowest bin up to `460` (wrapping into cyan) for the last.
pub fn bar_hue(bin: usize, bin_count: usize) -> f32 {
    bin as f32 / bin_count as f32 * 180.0 + 280.0
}

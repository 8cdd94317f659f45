//! CPU-side popup content, rendered once into a `0RGB` pixel buffer and
//! blitted on every redraw.

use std::path::Path;

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::imageops::FilterType;
use image::GenericImageView;

use crate::PopupError;

pub const BACKGROUND: u32 = 0x00F0_F0F0;
pub const FOREGROUND: u32 = 0x0020_2020;

const GLYPH_SIZE: u32 = 8;
const TEXT_SCALE: u32 = 2;
const TEXT_PAD_X: u32 = 30;
const TEXT_PAD_Y: u32 = 20;
const LINE_GAP: u32 = 6;
const WRAP_COLUMNS: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl Canvas {
    pub fn filled(width: u32, height: u32, color: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            pixels: vec![color; (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    /// Decodes an image and shrinks it to fit `max` while keeping its aspect
    /// ratio. Smaller images keep their size. Transparent pixels are blended
    /// over the popup background.
    pub fn from_image_file(path: &Path, max: (u32, u32)) -> Result<Self, PopupError> {
        let decoded = image::open(path).map_err(|source| PopupError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

        let (width, height) = decoded.dimensions();
        let (fit_w, fit_h) = fit_within((width, height), max);
        let decoded = if (fit_w, fit_h) != (width, height) {
            decoded.resize_exact(fit_w, fit_h, FilterType::Lanczos3)
        } else {
            decoded
        };

        let rgba = decoded.to_rgba8();
        let pixels = rgba
            .pixels()
            .map(|px| {
                let [r, g, b, a] = px.0;
                blend_over(BACKGROUND, r, g, b, a)
            })
            .collect();

        Ok(Self {
            width: rgba.width().max(1),
            height: rgba.height().max(1),
            pixels,
        })
    }

    /// Lays out `message` with an 8x8 bitmap font at 2x, wrapped on word
    /// boundaries.
    pub fn from_text(message: &str) -> Self {
        let lines = wrap_text(message, WRAP_COLUMNS);
        let glyph = GLYPH_SIZE * TEXT_SCALE;
        let columns = lines
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0)
            .max(1) as u32;
        let rows = lines.len().max(1) as u32;

        let width = columns * glyph + TEXT_PAD_X * 2;
        let height = rows * glyph + rows.saturating_sub(1) * LINE_GAP + TEXT_PAD_Y * 2;
        let mut canvas = Self::filled(width, height, BACKGROUND);

        for (row, line) in lines.iter().enumerate() {
            let top = TEXT_PAD_Y + row as u32 * (glyph + LINE_GAP);
            for (col, ch) in line.chars().enumerate() {
                let left = TEXT_PAD_X + col as u32 * glyph;
                canvas.draw_glyph(ch, left, top);
            }
        }
        canvas
    }

    fn draw_glyph(&mut self, ch: char, left: u32, top: u32) {
        let Some(bitmap) = BASIC_FONTS
            .get(ch)
            .or_else(|| LATIN_FONTS.get(ch))
            .or_else(|| BASIC_FONTS.get('?'))
        else {
            return;
        };

        for (gy, bits) in bitmap.iter().enumerate() {
            for gx in 0..GLYPH_SIZE {
                if bits & (1 << gx) == 0 {
                    continue;
                }
                for sy in 0..TEXT_SCALE {
                    for sx in 0..TEXT_SCALE {
                        let x = left + gx * TEXT_SCALE + sx;
                        let y = top + gy as u32 * TEXT_SCALE + sy;
                        if x < self.width && y < self.height {
                            self.pixels[(y * self.width + x) as usize] = FOREGROUND;
                        }
                    }
                }
            }
        }
    }

    /// Copies the canvas into a `width` x `height` buffer, centred. Whatever
    /// the canvas does not cover is filled with the background colour.
    pub fn blit_into(&self, buffer: &mut [u32], width: u32, height: u32) {
        if buffer.len() != (width as usize) * (height as usize) {
            return;
        }
        buffer.fill(BACKGROUND);

        let offset_x = (width as i64 - self.width as i64) / 2;
        let offset_y = (height as i64 - self.height as i64) / 2;

        for y in 0..height as i64 {
            let src_y = y - offset_y;
            if src_y < 0 || src_y >= self.height as i64 {
                continue;
            }
            for x in 0..width as i64 {
                let src_x = x - offset_x;
                if src_x < 0 || src_x >= self.width as i64 {
                    continue;
                }
                let src = (src_y * self.width as i64 + src_x) as usize;
                let dst = (y * width as i64 + x) as usize;
                buffer[dst] = self.pixels[src];
            }
        }
    }
}

/// Largest size with the same aspect ratio that fits inside `max`, never
/// larger than the input.
pub fn fit_within(size: (u32, u32), max: (u32, u32)) -> (u32, u32) {
    let (width, height) = (size.0.max(1), size.1.max(1));
    let (max_w, max_h) = (max.0.max(1), max.1.max(1));
    if width <= max_w && height <= max_h {
        return (width, height);
    }
    let scale = f64::min(max_w as f64 / width as f64, max_h as f64 / height as f64);
    let fit_w = ((width as f64 * scale).round() as u32).clamp(1, max_w);
    let fit_h = ((height as f64 * scale).round() as u32).clamp(1, max_h);
    (fit_w, fit_h)
}

/// Greedy word wrap. Words longer than `columns` are split.
pub fn wrap_text(message: &str, columns: usize) -> Vec<String> {
    let columns = columns.max(1);
    let mut lines = Vec::new();

    for paragraph in message.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > columns {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let rest = word.split_off(columns);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            if word.is_empty() {
                continue;
            }
            let needed = if current.is_empty() {
                word.len()
            } else {
                current.chars().count() + 1 + word.len()
            };
            if needed > columns && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.extend(word);
        }
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn blend_over(background: u32, r: u8, g: u8, b: u8, a: u8) -> u32 {
    let mix = |fg: u8, shift: u32| -> u32 {
        let bg = (background >> shift) & 0xFF;
        let fg = fg as u32;
        let a = a as u32;
        (fg * a + bg * (255 - a)) / 255
    };
    (mix(r, 16) << 16) | (mix(g, 8) << 8) | mix(b, 0)
}

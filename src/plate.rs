//! Text plate rendering and quoted-span extraction.
//!
//! A "plate" is a small white bitmap with one text string painted in black,
//! handed to the generation model as a visual reference so it copies the
//! glyphs instead of synthesizing them. Generation models are unreliable at
//! drawing Arabic-script text directly; a pre-rendered plate sidesteps that.
//! Shaping runs through cosmic-text, which performs the bidi reordering and
//! contextual joining that right-to-left text needs. Drawing the same code
//! points left-to-right without shaping produces visually wrong output.

use std::io::Cursor;
use std::sync::LazyLock;

use base64::Engine;
use cosmic_text::{
    Align, Attrs, Buffer, Color, Family, FontSystem, Metrics, Shaping, SwashCache, Weight, Wrap,
};
use image::{DynamicImage, Rgba, RgbaImage};
use regex::Regex;
use serde::Deserialize;

use crate::error::GenError;

/// Matches text inside double or single quotes. Each pair type closes with
/// its own kind: `"a'b"` is one double-quoted span.
static QUOTED_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]+)"|'([^']+)'"#).expect("quoted-span regex is valid"));

/// Plate surface geometry and typography, configurable via the `[plate]`
/// table in the config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlateStyle {
    /// Surface width in pixels.
    pub width: u32,
    /// Surface height in pixels.
    pub height: u32,
    /// Font size in pixels.
    pub font_size: f32,
    /// Font family name; the system sans-serif when unset.
    pub font_family: Option<String>,
}

impl Default for PlateStyle {
    fn default() -> Self {
        // 512x128 at 48px suits single-line signage text. Taller plates are
        // a config change, not a second renderer.
        Self { width: 512, height: 128, font_size: 48.0, font_family: None }
    }
}

/// A rendered text plate: PNG bytes, their base64 encoding, and the file
/// name the prompt-engineering model uses to reference it.
#[derive(Debug, Clone)]
pub struct RenderedPlate {
    /// Deterministic file name, `text_plate_{n}.png` with a one-based `n`.
    pub name: String,
    /// Always `image/png`.
    pub mime_type: String,
    /// PNG payload.
    pub data: Vec<u8>,
    /// Base64 encoding of `data`.
    pub base64: String,
}

impl RenderedPlate {
    fn new(name: String, data: Vec<u8>) -> Self {
        let base64 = base64::engine::general_purpose::STANDARD.encode(&data);
        Self { name, mime_type: "image/png".into(), data, base64 }
    }
}

/// Renders text plates. Owns the font system and glyph cache, so rendering
/// takes `&mut self`; allocate one per process and reuse it.
pub struct PlateRenderer {
    font_system: FontSystem,
    swash_cache: SwashCache,
    style: PlateStyle,
}

impl PlateRenderer {
    /// Create a renderer over the system font database.
    #[must_use]
    pub fn new(style: PlateStyle) -> Self {
        Self { font_system: FontSystem::new(), swash_cache: SwashCache::new(), style }
    }

    /// Render one plate named `text_plate_{ordinal+1}.png`.
    ///
    /// An empty string still produces a valid, blank plate; callers filter
    /// empty spans upstream. Overlong text clips at the surface bounds, no
    /// wrapping or auto-shrink is attempted.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::Render`] when the surface dimensions are unusable
    /// or PNG encoding yields no output.
    pub fn render_plate(&mut self, text: &str, ordinal: usize) -> Result<RenderedPlate, GenError> {
        let width = self.style.width;
        let height = self.style.height;
        if width == 0 || height == 0 {
            return Err(GenError::Render(format!("invalid plate surface {width}x{height}")));
        }

        // White ground gives maximum luminance contrast for the generator
        // to correlate against when told to replicate the plate exactly.
        let mut canvas = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

        let mut buffer = self.shape_buffer(text);

        // Center the shaped block vertically; Align::Center handles the
        // horizontal axis.
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
        let top = {
            let line_count = buffer.layout_runs().count();
            let text_height = line_count as f32 * buffer.metrics().line_height;
            ((height as f32 - text_height) / 2.0).max(0.0) as i32
        };

        buffer.draw(
            &mut self.font_system,
            &mut self.swash_cache,
            Color::rgb(0, 0, 0),
            |x, y, w, h, color| {
                let alpha = u32::from(color.a());
                if alpha == 0 {
                    return;
                }
                #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
                for dy in 0..h as i32 {
                    for dx in 0..w as i32 {
                        let px = x + dx;
                        let py = y + dy + top;
                        if px < 0 || py < 0 || px >= width as i32 || py >= height as i32 {
                            continue;
                        }
                        let pixel = canvas.get_pixel_mut(px as u32, py as u32);
                        let glyph = [color.r(), color.g(), color.b()];
                        for (channel, value) in pixel.0.iter_mut().take(3).zip(glyph) {
                            let blended = (u32::from(*channel) * (255 - alpha)
                                + u32::from(value) * alpha)
                                / 255;
                            #[allow(clippy::cast_possible_truncation)]
                            {
                                *channel = blended as u8;
                            }
                        }
                    }
                }
            },
        );

        let mut png = Vec::new();
        DynamicImage::ImageRgba8(canvas)
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| GenError::Render(format!("PNG encoding failed: {e}")))?;
        if png.is_empty() {
            return Err(GenError::Render("PNG encoder produced no output".into()));
        }

        Ok(RenderedPlate::new(plate_name(ordinal), png))
    }

    /// Shape `text` as a single centered line on the configured surface.
    /// Overlong text overflows and clips at draw time; it must never wrap
    /// onto a second line.
    fn shape_buffer(&mut self, text: &str) -> Buffer {
        let metrics = Metrics::new(self.style.font_size, self.style.font_size * 1.2);
        let mut buffer = Buffer::new(&mut self.font_system, metrics);
        #[allow(clippy::cast_precision_loss)]
        buffer.set_size(
            &mut self.font_system,
            Some(self.style.width as f32),
            Some(self.style.height as f32),
        );
        buffer.set_wrap(&mut self.font_system, Wrap::None);

        let family = match &self.style.font_family {
            Some(name) => Family::Name(name),
            None => Family::SansSerif,
        };
        let attrs = Attrs::new().family(family).weight(Weight::BOLD);
        // Shaping::Advanced is what makes RTL text come out joined and in
        // visual order.
        buffer.set_text(&mut self.font_system, text, attrs, Shaping::Advanced);
        for line in &mut buffer.lines {
            line.set_align(Some(Align::Center));
        }
        buffer.shape_until_scroll(&mut self.font_system, false);
        buffer
    }

    /// Render one plate per quoted span in the prompt, in order of
    /// appearance. A prompt without quoted spans yields an empty vector,
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns the first [`GenError::Render`] from the underlying renderer.
    pub fn extract_plates(&mut self, prompt: &str) -> Result<Vec<RenderedPlate>, GenError> {
        extract_quoted_spans(prompt)
            .iter()
            .enumerate()
            .map(|(ordinal, text)| self.render_plate(text, ordinal))
            .collect()
    }
}

/// Deterministic plate file name for a zero-based ordinal.
#[must_use]
pub fn plate_name(ordinal: usize) -> String {
    format!("text_plate_{}.png", ordinal + 1)
}

/// All non-empty quoted spans in the prompt, left to right.
#[must_use]
pub fn extract_quoted_spans(prompt: &str) -> Vec<&str> {
    QUOTED_SPAN
        .captures_iter(prompt)
        .filter_map(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| m.as_str())
        .filter(|s| !s.is_empty())
        .collect()
}

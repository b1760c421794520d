//! Caption band compositor
//!
//! Burns a caption into an image: a translucent black band is blended across
//! the full width at a caller-supplied vertical position, and the caption is
//! drawn on top in white, sized so it spans the available width. The result
//! is encoded as JPEG for hand-off to an external messenger.
//!
//! All operations are synchronous and run on the invoking thread; the
//! compositor holds no state beyond the bundled font.

use std::sync::OnceLock;

use ab_glyph::{Font, FontRef, GlyphId, PxScale, ScaleFont};
use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::{Pixel, RgbImage, Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use thiserror::Error;

/// Horizontal padding between the image edge and the caption text (pixels)
pub const HORIZONTAL_PADDING: u32 = 30;

/// Vertical padding between the band edges and the caption text (pixels)
pub const VERTICAL_PADDING: u32 = 10;

/// Reference size used when measuring a caption before fitting
pub const REFERENCE_TEXT_SIZE: f32 = 48.0;

/// JPEG quality for encoded artifacts
pub const JPEG_QUALITY: u8 = 90;

/// Band fill: black at 60% opacity
const BAND_COLOR: Rgba<u8> = Rgba([0, 0, 0, 153]);

/// Caption text color
const TEXT_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

static FONT_BYTES: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");
static FONT: OnceLock<FontRef<'static>> = OnceLock::new();

/// Errors that can occur while compositing or encoding a caption
#[derive(Error, Debug, Clone)]
pub enum CaptionError {
    #[error("invalid source image: {0}")]
    InvalidImage(String),

    #[error("band top {band_top_y} outside image height {height}")]
    BandOutOfBounds { band_top_y: u32, height: u32 },

    #[error("degenerate caption: {0}")]
    DegenerateCaption(String),

    #[error("JPEG encoding failed: {0}")]
    Encode(String),

    #[error("bundled font failed to parse")]
    Font,
}

fn bundled_font() -> Result<&'static FontRef<'static>, CaptionError> {
    if let Some(font) = FONT.get() {
        return Ok(font);
    }
    let font = FontRef::try_from_slice(FONT_BYTES).map_err(|_| CaptionError::Font)?;
    Ok(FONT.get_or_init(|| font))
}

/// Sum of glyph advances (plus kerning) for a single line at the given size.
fn line_width(font: &FontRef<'_>, size: f32, text: &str) -> f32 {
    let scaled = font.as_scaled(PxScale::from(size));
    let mut width = 0.0f32;
    let mut prev: Option<GlyphId> = None;
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = prev {
            width += scaled.kern(prev, id);
        }
        width += scaled.h_advance(id);
        prev = Some(id);
    }
    width
}

/// Compositor for drawing caption bands onto decoded images.
///
/// Uses a single bundled font; font selection is deliberately not supported.
pub struct CaptionCompositor {
    font: &'static FontRef<'static>,
}

impl CaptionCompositor {
    /// Create a compositor backed by the bundled font.
    pub fn new() -> Result<Self, CaptionError> {
        Ok(Self {
            font: bundled_font()?,
        })
    }

    /// Compute the text size at which `text` spans `desired_width` pixels.
    ///
    /// Measures once at [`REFERENCE_TEXT_SIZE`] and scales linearly; glyph
    /// advances are linear in the pixel scale, so re-measuring at the fitted
    /// size reproduces `desired_width` up to float rounding.
    ///
    /// Text that measures to zero width (including the empty string) is a
    /// [`CaptionError::DegenerateCaption`], never a division fault. The same
    /// error is returned when `desired_width` is not positive.
    pub fn fitted_text_size(&self, desired_width: f32, text: &str) -> Result<f32, CaptionError> {
        if desired_width <= 0.0 {
            return Err(CaptionError::DegenerateCaption(format!(
                "no horizontal room for text (desired width {desired_width})"
            )));
        }
        let reference_width = line_width(self.font, REFERENCE_TEXT_SIZE, text);
        if reference_width <= 0.0 {
            return Err(CaptionError::DegenerateCaption(
                "caption measures to zero width".to_string(),
            ));
        }
        Ok(REFERENCE_TEXT_SIZE * desired_width / reference_width)
    }

    /// Pixel height of a caption line at the given size (ascent minus
    /// descent of the scaled font). Pure measurement, no side effects.
    pub fn text_height(&self, size: f32) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(size));
        scaled.ascent() - scaled.descent()
    }

    /// Blend the caption band onto a copy of `image` and draw `caption` over
    /// it in white, left-aligned at [`HORIZONTAL_PADDING`].
    ///
    /// The band spans the full width from `band_top_y` to
    /// `band_top_y + 2 * VERTICAL_PADDING + text_height`, with the bottom
    /// edge clamped to the image height. An empty caption returns the image
    /// unchanged: there is nothing to measure, so no band is drawn.
    ///
    /// Output dimensions always equal the input dimensions.
    pub fn composite(
        &self,
        image: &RgbaImage,
        caption: &str,
        band_top_y: u32,
    ) -> Result<RgbaImage, CaptionError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(CaptionError::InvalidImage(format!(
                "empty raster ({width}x{height})"
            )));
        }
        if band_top_y >= height {
            return Err(CaptionError::BandOutOfBounds { band_top_y, height });
        }

        let mut out = image.clone();
        if caption.is_empty() {
            return Ok(out);
        }

        let desired_width = width as f32 - 2.0 * HORIZONTAL_PADDING as f32;
        let fitted_size = self.fitted_text_size(desired_width, caption)?;
        let text_height = self.text_height(fitted_size);

        let band_bottom =
            (band_top_y + 2 * VERTICAL_PADDING + text_height.ceil() as u32).min(height);
        for y in band_top_y..band_bottom {
            for x in 0..width {
                out.get_pixel_mut(x, y).blend(&BAND_COLOR);
            }
        }

        draw_text_mut(
            &mut out,
            TEXT_COLOR,
            HORIZONTAL_PADDING as i32,
            (band_top_y + VERTICAL_PADDING) as i32,
            PxScale::from(fitted_size),
            self.font,
            caption,
        );

        Ok(out)
    }

    /// Composite and encode in one step.
    pub fn render(
        &self,
        image: &RgbaImage,
        caption: &str,
        band_top_y: u32,
    ) -> Result<Vec<u8>, CaptionError> {
        let composited = self.composite(image, caption, band_top_y)?;
        encode_jpeg(&composited)
    }
}

/// Encode an image as JPEG at [`JPEG_QUALITY`].
///
/// The returned byte stream is complete: decoding it yields an image with
/// the same dimensions as the input.
pub fn encode_jpeg(image: &RgbaImage) -> Result<Vec<u8>, CaptionError> {
    let rgb: RgbImage = image.convert();
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY);
    rgb.write_with_encoder(encoder)
        .map_err(|e| CaptionError::Encode(e.to_string()))?;
    Ok(bytes)
}

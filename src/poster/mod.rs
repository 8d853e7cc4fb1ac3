//! Poster rendering.
//!
//! A poster is a flat background with the person's photo on the left, a
//! greeting to its right and the optional club name centred at the bottom.

use std::io::Cursor;
use std::path::Path;
use std::path::PathBuf;
use std::time::Instant;

use ab_glyph::Font;
use ab_glyph::FontArc;
use ab_glyph::GlyphId;
use ab_glyph::PxScale;
use ab_glyph::ScaleFont;
use ab_glyph::point;
use async_trait::async_trait;
use image::DynamicImage;
use image::ImageFormat;
use image::Rgb;
use image::RgbImage;
use image::imageops;
use image::imageops::FilterType;
use log::debug;
use log::trace;

use crate::config::PosterDesign;
use crate::error::AppError;
use crate::event::EventMatch;
use crate::poster::error::PosterError;
use crate::poster::layout::TextLine;
use crate::poster::layout::TextMeasure;
use crate::poster::layout::layout_poster;
use crate::poster::photo::PhotoFetcher;

pub mod error;
pub mod layout;
pub mod photo;

/// Fonts tried, in order, when no `font_path` is configured.
pub const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/System/Library/Fonts/Helvetica.ttc",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Produces the PNG poster for a matched event.
#[async_trait]
pub trait PosterRenderer: Send + Sync {
    async fn render(&self, event: &EventMatch) -> Result<Vec<u8>, PosterError>;
}

#[derive(Clone)]
pub struct PosterFont {
    font: FontArc,
}

impl PosterFont {
    /// Loads `path`, or the first readable system font when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        if let Some(path) = path {
            let bytes = std::fs::read(path).map_err(|e| AppError::FontNotFound {
                msg: format!("cannot read '{}': {}", path.display(), e),
            })?;
            return Self::from_bytes(bytes).map_err(|e| AppError::FontNotFound {
                msg: format!("'{}': {}", path.display(), e),
            });
        }

        SYSTEM_FONT_CANDIDATES
            .iter()
            .map(|p| PathBuf::from(*p))
            .filter(|p| p.is_file())
            .find_map(|p| {
                let font = std::fs::read(&p).ok().and_then(|b| Self::from_bytes(b).ok())?;
                debug!("Using system font {}", p.display());
                Some(font)
            })
            .ok_or_else(|| AppError::FontNotFound {
                msg: "no font_path configured and no known system font is installed".to_string(),
            })
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, AppError> {
        let font = FontArc::try_from_vec(bytes).map_err(|e| AppError::FontNotFound {
            msg: e.to_string(),
        })?;
        Ok(Self { font })
    }

    /// Scale for a font size given in pixels per em.
    fn scale(&self, size: f32) -> PxScale {
        let height = self.font.height_unscaled();
        let units_per_em = self.font.units_per_em().unwrap_or(height);
        PxScale::from(size * height / units_per_em)
    }
}

impl TextMeasure for PosterFont {
    fn text_width(&self, text: &str, size: f32) -> f32 {
        let scaled = self.font.as_scaled(self.scale(size));
        let mut width = 0.0;
        let mut previous: Option<GlyphId> = None;
        for c in text.chars() {
            let glyph_id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                width += scaled.kern(prev, glyph_id);
            }
            width += scaled.h_advance(glyph_id);
            previous = Some(glyph_id);
        }
        width
    }
}

#[derive(Clone)]
pub struct PosterGenerator {
    font: PosterFont,
    design: PosterDesign,
    club_name: String,
    photos: PhotoFetcher,
}

impl PosterGenerator {
    pub fn new(
        design: PosterDesign,
        club_name: impl Into<String>,
        font: PosterFont,
    ) -> Result<Self, PosterError> {
        let photos = PhotoFetcher::new(design.photo_dir.clone())?;
        Ok(Self {
            font,
            design,
            club_name: club_name.into(),
            photos,
        })
    }

    /// Draws the poster around an already loaded photo and encodes it as PNG.
    pub fn compose(
        &self,
        photo: &DynamicImage,
        name: &str,
        event_name: &str,
    ) -> Result<Vec<u8>, PosterError> {
        let start = Instant::now();
        let layout = layout_poster(&self.design, &self.club_name, name, event_name, &self.font);

        let mut img = RgbImage::from_pixel(
            layout.width,
            layout.height,
            Rgb(self.design.background_color),
        );

        let photo = photo
            .resize_exact(layout.photo_size, layout.photo_size, FilterType::Lanczos3)
            .to_rgb8();
        imageops::replace(&mut img, &photo, layout.photo_x.into(), layout.photo_y.into());

        let color = Rgb(self.design.text_color);
        for line in &layout.lines {
            self.draw_text(&mut img, line, color);
        }

        let mut bytes: Vec<u8> = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;

        trace!("compose poster took {} ms", start.elapsed().as_millis());
        Ok(bytes)
    }

    /// Draws `line` with its top edge at `line.y`, blending glyph coverage
    /// into the existing pixels. Anything outside the image is clipped.
    fn draw_text(&self, img: &mut RgbImage, line: &TextLine, color: Rgb<u8>) {
        let scale = self.font.scale(line.size);
        let scaled = self.font.font.as_scaled(scale);
        let baseline = line.y as f32 + scaled.ascent();

        let mut caret = line.x as f32;
        let mut previous: Option<GlyphId> = None;
        for c in line.text.chars() {
            let glyph_id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, glyph_id);
            }
            let glyph = glyph_id.with_scale_and_position(scale, point(caret, baseline));
            caret += scaled.h_advance(glyph_id);
            previous = Some(glyph_id);

            let Some(outlined) = self.font.font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px = gx as i32 + bounds.min.x as i32;
                let py = gy as i32 + bounds.min.y as i32;
                if px < 0 || py < 0 || px >= img.width() as i32 || py >= img.height() as i32 {
                    return;
                }

                let coverage = coverage.clamp(0.0, 1.0);
                let pixel = img.get_pixel_mut(px as u32, py as u32);
                for (channel, target) in pixel.0.iter_mut().zip(color.0) {
                    *channel = (target as f32 * coverage + *channel as f32 * (1.0 - coverage))
                        .round() as u8;
                }
            });
        }
    }
}

#[async_trait]
impl PosterRenderer for PosterGenerator {
    async fn render(&self, event: &EventMatch) -> Result<Vec<u8>, PosterError> {
        let photo = self.photos.fetch(&event.photo_ref).await?;

        let generator = self.clone();
        let name = event.name.clone();
        let event_name = event.event_name.clone();
        tokio::task::spawn_blocking(move || generator.compose(&photo, &name, &event_name)).await?
    }
}

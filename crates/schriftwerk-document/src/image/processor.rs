// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — rotate, crop, grayscale, brightness/contrast adjustment
// ahead of OCR. Operates on in-memory images using the `image` and
// `imageproc` crates.

use std::path::Path;

use image::{DynamicImage, ImageFormat, ImageReader, RgbaImage};
use imageproc::geometric_transformations::{self, Interpolation};
use schriftwerk_core::error::{Result, SchriftwerkError};
use schriftwerk_core::types::ImageInfo;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// One editing step. Steps are applied in the order given.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageOp {
    /// Clockwise, in degrees.
    Rotate(f32),
    /// -255..=255, clamped.
    Brightness(i32),
    /// 1.0 is a no-op.
    Contrast(f32),
    Crop {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    Grayscale,
}

/// Read the dimensions and container format of an image without decoding
/// the pixel data.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn probe(path: impl AsRef<Path>) -> Result<ImageInfo> {
    let path = path.as_ref();
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let format = reader
        .format()
        .ok_or_else(|| SchriftwerkError::Image("unrecognised image format".into()))?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|err| SchriftwerkError::Image(format!("failed to read image header: {err}")))?;
    debug!(width, height, ?format, "Image probed");
    Ok(ImageInfo {
        path: path.to_path_buf(),
        width,
        height,
        format: format!("{format:?}"),
    })
}

/// Image processing pipeline operating on a single in-memory image.
///
/// All operations are non-destructive: each method consumes `self` and returns a
/// new `ImageProcessor` wrapping the transformed image, enabling method chaining.
///
/// ```ignore
/// ImageProcessor::open("receipt.jpg")?
///     .rotate(90.0)
///     .grayscale()
///     .adjust_contrast(1.4)
///     .save("receipt-clean.png")?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let img = image::open(path.as_ref())
            .map_err(|err| SchriftwerkError::Image(format!("failed to open image: {err}")))?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Apply one editing step.
    pub fn apply(self, op: ImageOp) -> Self {
        match op {
            ImageOp::Rotate(degrees) => self.rotate(degrees),
            ImageOp::Brightness(value) => self.adjust_brightness(value),
            ImageOp::Contrast(factor) => self.adjust_contrast(factor),
            ImageOp::Crop {
                x,
                y,
                width,
                height,
            } => self.crop(x, y, width, height),
            ImageOp::Grayscale => self.grayscale(),
        }
    }

    /// Apply a sequence of steps in order.
    pub fn apply_all(self, ops: &[ImageOp]) -> Self {
        ops.iter().fold(self, |processor, op| processor.apply(*op))
    }

    /// Rotate the image by an arbitrary angle in degrees (clockwise).
    ///
    /// For 90/180/270 degree rotations, lossless rotation is used. For other
    /// angles, affine transformation with bilinear interpolation is applied.
    #[instrument(skip(self), fields(degrees))]
    pub fn rotate(self, degrees: f32) -> Self {
        info!(degrees, "Rotating image");

        // Fast-path for exact multiples of 90.
        let normalised = degrees.rem_euclid(360.0);
        if (normalised - 90.0).abs() < 0.01 {
            return Self {
                image: self.image.rotate90(),
            };
        }
        if (normalised - 180.0).abs() < 0.01 {
            return Self {
                image: self.image.rotate180(),
            };
        }
        if (normalised - 270.0).abs() < 0.01 {
            return Self {
                image: self.image.rotate270(),
            };
        }
        if normalised.abs() < 0.01 || (normalised - 360.0).abs() < 0.01 {
            return self;
        }

        // White fill keeps the new corners from reading as dark text blobs.
        let rgba = self.image.to_rgba8();
        let rotated: RgbaImage = geometric_transformations::rotate_about_center(
            &rgba,
            degrees.to_radians(),
            Interpolation::Bilinear,
            image::Rgba([255u8, 255, 255, 255]),
        );

        debug!("General rotation applied");
        Self {
            image: DynamicImage::ImageRgba8(rotated),
        }
    }

    /// Crop a rectangular region from the image.
    ///
    /// `x` and `y` are the top-left corner. The rectangle is clamped to the
    /// image bounds and never collapses below one pixel on a non-empty image.
    #[instrument(skip(self), fields(x, y, width, height))]
    pub fn crop(self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let img_w = self.image.width();
        let img_h = self.image.height();

        let safe_x = x.min(img_w.saturating_sub(1));
        let safe_y = y.min(img_h.saturating_sub(1));
        let safe_w = width.max(1).min(img_w - safe_x);
        let safe_h = height.max(1).min(img_h - safe_y);

        info!(safe_x, safe_y, safe_w, safe_h, "Cropping image");

        Self {
            image: self.image.crop_imm(safe_x, safe_y, safe_w, safe_h),
        }
    }

    #[instrument(skip(self))]
    pub fn grayscale(self) -> Self {
        info!("Converting to grayscale");
        Self {
            image: self.image.grayscale(),
        }
    }

    /// Adjust brightness by `value`, clamped to -255..=255.
    #[instrument(skip(self), fields(value))]
    pub fn adjust_brightness(self, value: i32) -> Self {
        let clamped = value.clamp(-255, 255);
        info!(clamped, "Adjusting brightness");
        self.map_channels(|channel| (channel as i32 + clamped).clamp(0, 255) as u8)
    }

    /// Adjust contrast by a factor around mid-grey. Values > 1.0 increase
    /// contrast; values < 1.0 decrease it.
    #[instrument(skip(self), fields(factor))]
    pub fn adjust_contrast(self, factor: f32) -> Self {
        info!(factor, "Adjusting contrast");
        self.map_channels(|channel| {
            (factor * (channel as f32 - 128.0) + 128.0).clamp(0.0, 255.0) as u8
        })
    }

    /// Apply `adjust` to every colour channel, leaving alpha untouched.
    fn map_channels(self, adjust: impl Fn(u8) -> u8) -> Self {
        let rgba = self.image.to_rgba8();
        let adjusted = image::ImageBuffer::from_fn(rgba.width(), rgba.height(), |x, y| {
            let image::Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
            image::Rgba([adjust(r), adjust(g), adjust(b), a])
        });
        Self {
            image: DynamicImage::ImageRgba8(adjusted),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Write the image to a file. The format is inferred from the file extension.
    ///
    /// JPEG has no alpha channel, so images headed there are flattened to RGB
    /// first.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let format = ImageFormat::from_path(path)
            .map_err(|err| SchriftwerkError::Image(format!("unsupported output format: {err}")))?;

        let result = if format == ImageFormat::Jpeg {
            DynamicImage::ImageRgb8(self.image.to_rgb8()).save_with_format(path, format)
        } else {
            self.image.save_with_format(path, format)
        };
        // Keep filesystem failures as I/O so callers can tell them apart
        // from encoder failures.
        result.map_err(|err| match err {
            image::ImageError::IoError(e) => SchriftwerkError::Io(e),
            other => SchriftwerkError::Image(format!("failed to save image: {other}")),
        })?;
        info!(width = self.width(), height = self.height(), "Image saved");
        Ok(())
    }
}

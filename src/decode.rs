use std::io::Cursor;

use image::{GrayImage, ImageReader, Limits};
use imageproc::{
    contrast::{otsu_level, threshold, ThresholdType},
    filter::gaussian_blur_f32,
};
use tracing::debug;

use crate::{
    common::utils::{QRError, QRResult},
    model::{DecodedPayload, PayloadSource},
    reader::{BinaryImage, QRReader},
};

// Blur roughly equivalent to a 5x5 gaussian kernel
const BLUR_SIGMA: f32 = 1.1;

/// Largest accepted width or height. A version 40 symbol fits many times over
pub const MAX_IMAGE_DIMENSION: u32 = 8192;

const MAX_IMAGE_ALLOC: u64 = 256 * 1024 * 1024;

// Decode strategies
//------------------------------------------------------------------------------

/// One way of turning raw image bytes into QR payload text
pub trait DecodeStrategy: Send + Sync {
    fn source(&self) -> PayloadSource;

    fn decode(&self, bytes: &[u8]) -> QRResult<String>;
}

fn load_luma(bytes: &[u8]) -> QRResult<GrayImage> {
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_IMAGE_DIMENSION);
    limits.max_image_height = Some(MAX_IMAGE_DIMENSION);
    limits.max_alloc = Some(MAX_IMAGE_ALLOC);

    let mut reader =
        ImageReader::new(Cursor::new(bytes)).with_guessed_format().map_err(|_| QRError::InvalidImage)?;
    reader.limits(limits);
    let img = reader.decode().map_err(|e| {
        debug!(error = %e, "Image rejected");
        QRError::InvalidImage
    })?;
    Ok(img.to_luma8())
}

/// Adaptive block thresholding followed by the native reader
#[derive(Debug, Default, Clone, Copy)]
pub struct PrimaryDecoder;

impl DecodeStrategy for PrimaryDecoder {
    fn source(&self) -> PayloadSource {
        PayloadSource::PrimaryDecoder
    }

    fn decode(&self, bytes: &[u8]) -> QRResult<String> {
        let img = load_luma(bytes)?;
        QRReader::read(&img)
    }
}

/// Gaussian blur and a global Otsu threshold followed by the native reader
#[derive(Debug, Default, Clone, Copy)]
pub struct SecondaryDecoder;

impl DecodeStrategy for SecondaryDecoder {
    fn source(&self) -> PayloadSource {
        PayloadSource::SecondaryDecoder
    }

    fn decode(&self, bytes: &[u8]) -> QRResult<String> {
        let img = load_luma(bytes)?;
        let blurred = gaussian_blur_f32(&img, BLUR_SIGMA);
        let level = otsu_level(&blurred);
        let thresholded = threshold(&blurred, level, ThresholdType::Binary);
        QRReader::read_binary(BinaryImage::from_thresholded(&thresholded))
    }
}

// Decoder
//------------------------------------------------------------------------------

/// Runs its strategies in order and returns the first non-empty payload
pub struct QrDecoder {
    strategies: Vec<Box<dyn DecodeStrategy>>,
}

impl Default for QrDecoder {
    fn default() -> Self {
        Self::new(vec![Box::new(PrimaryDecoder), Box::new(SecondaryDecoder)])
    }
}

impl QrDecoder {
    pub fn new(strategies: Vec<Box<dyn DecodeStrategy>>) -> Self {
        Self { strategies }
    }

    /// Never fails. When every strategy misses, the payload is empty and attributed to the
    /// primary decoder
    pub fn decode(&self, bytes: &[u8]) -> DecodedPayload {
        for strategy in &self.strategies {
            let source = strategy.source();
            match strategy.decode(bytes) {
                Ok(text) if !text.is_empty() => return DecodedPayload::new(text, source),
                Ok(_) => debug!(%source, "Strategy decoded an empty payload"),
                Err(e) => debug!(%source, error = %e, "Strategy found no QR code"),
            }
        }

        DecodedPayload::empty(PayloadSource::PrimaryDecoder)
    }
}

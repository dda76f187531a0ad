// SPDX-License-Identifier: GPL-3.0-only

//! QR decode adapter
//!
//! Wraps the `rqrr` engine behind a small detector interface. Frames are
//! converted to grayscale and downscaled for real-time use; detected corner
//! coordinates are mapped back to full-frame space. Decode failures are
//! "no detection", never errors, and empty payloads are ignored.

use crate::backends::camera::types::{CameraFrame, PixelFormat};
use crate::errors::DecodeError;
use tracing::{debug, trace, warn};

/// A point in frame coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// One decoded symbol: payload text plus its quadrilateral location
///
/// Corners are in full-frame pixel coordinates, in perimeter order
/// starting at the top-left finder pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub text: String,
    pub corners: [Point; 4],
}

/// Detection over one frame's pixel data
///
/// The production implementation is [`QrDecoder`]; tests script their own.
pub trait Detector: Send + Sync {
    fn detect(&self, frame: &CameraFrame) -> Option<Detection>;
}

/// Settings for the decode engine
#[derive(Debug, Clone)]
pub struct DecodeSettings {
    /// Frames larger than this are downscaled before detection
    pub max_dimension: u32,
}

impl Default for DecodeSettings {
    fn default() -> Self {
        Self {
            max_dimension: crate::constants::decode::MAX_DIMENSION,
        }
    }
}

/// QR decoder backed by `rqrr`
pub struct QrDecoder {
    max_dimension: u32,
}

impl QrDecoder {
    /// One-time engine initialization
    ///
    /// Validates the settings and runs a warm-up pass over a blank buffer.
    /// This is the only fallible step; after it succeeds, detection can
    /// only ever report "nothing found".
    pub fn load(settings: DecodeSettings) -> Result<Self, DecodeError> {
        if settings.max_dimension == 0 {
            return Err(DecodeError::InvalidConfig(
                "max_dimension must be nonzero".to_string(),
            ));
        }

        let dim = crate::constants::decode::WARMUP_DIMENSION as usize;
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(dim, dim, |_, _| 255);
        let grids = prepared.detect_grids();
        trace!(grids = grids.len(), "Decode engine warm-up complete");

        Ok(Self {
            max_dimension: settings.max_dimension,
        })
    }
}

impl Detector for QrDecoder {
    fn detect(&self, frame: &CameraFrame) -> Option<Detection> {
        detect_sync(frame, self.max_dimension)
    }
}

/// Synchronous detection over one frame
fn detect_sync(frame: &CameraFrame, max_dimension: u32) -> Option<Detection> {
    if frame.format != PixelFormat::RGBA {
        warn!(format = %frame.format, "Decoder expects RGBA frames");
        return None;
    }

    let start = std::time::Instant::now();

    let gray = grayscale_from_frame(frame);
    let (gray, proc_width, proc_height, scale) =
        if frame.width > max_dimension || frame.height > max_dimension {
            let scale = (frame.width as f32 / max_dimension as f32)
                .max(frame.height as f32 / max_dimension as f32);
            let new_width = (frame.width as f32 / scale) as u32;
            let new_height = (frame.height as f32 / scale) as u32;
            let downscaled =
                downscale_gray(&gray, frame.width, frame.height, new_width, new_height);
            (downscaled, new_width, new_height, scale)
        } else {
            (gray, frame.width, frame.height, 1.0)
        };

    let row = proc_width as usize;
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        proc_width as usize,
        proc_height as usize,
        |x, y| gray[y * row + x],
    );
    let grids = prepared.detect_grids();

    trace!(
        count = grids.len(),
        proc_width,
        proc_height,
        elapsed_ms = start.elapsed().as_millis(),
        "Grid detection complete"
    );

    for grid in &grids {
        match grid.decode() {
            Ok((_meta, text)) => {
                if text.is_empty() {
                    debug!("Ignoring symbol with empty payload");
                    continue;
                }

                let corners = std::array::from_fn(|i| Point {
                    x: grid.bounds[i].x as f32 * scale,
                    y: grid.bounds[i].y as f32 * scale,
                });

                debug!(
                    len = text.len(),
                    total_ms = start.elapsed().as_millis(),
                    "Decoded symbol"
                );
                return Some(Detection { text, corners });
            }
            Err(e) => {
                debug!(error = %e, "Failed to decode detected symbol");
            }
        }
    }

    None
}

/// Convert an RGBA frame to grayscale, honoring row stride
fn grayscale_from_frame(frame: &CameraFrame) -> Vec<u8> {
    let width = frame.width as usize;
    let height = frame.height as usize;
    let stride = frame.stride as usize;

    let mut gray = Vec::with_capacity(width * height);

    for y in 0..height {
        let row_start = y * stride;
        for x in 0..width {
            let offset = row_start + x * 4;
            if offset + 2 < frame.data.len() {
                let r = frame.data[offset] as f32;
                let g = frame.data[offset + 1] as f32;
                let b = frame.data[offset + 2] as f32;
                gray.push((0.299 * r + 0.587 * g + 0.114 * b) as u8);
            } else {
                gray.push(0);
            }
        }
    }

    gray
}

/// Downscale a grayscale buffer using bilinear interpolation
fn downscale_gray(gray: &[u8], src_width: u32, src_height: u32, dst_width: u32, dst_height: u32) -> Vec<u8> {
    let src_w = src_width as usize;
    let src_h = src_height as usize;

    let mut result = Vec::with_capacity((dst_width * dst_height) as usize);

    let x_ratio = src_width as f32 / dst_width as f32;
    let y_ratio = src_height as f32 / dst_height as f32;

    for y in 0..dst_height {
        for x in 0..dst_width {
            let src_x = x as f32 * x_ratio;
            let src_y = y as f32 * y_ratio;

            let x0 = src_x as usize;
            let y0 = src_y as usize;
            let x1 = (x0 + 1).min(src_w - 1);
            let y1 = (y0 + 1).min(src_h - 1);

            let x_frac = src_x - x0 as f32;
            let y_frac = src_y - y0 as f32;

            let sample = |px: usize, py: usize| -> f32 {
                gray.get(py * src_w + px).copied().unwrap_or(0) as f32
            };

            let p00 = sample(x0, y0);
            let p01 = sample(x1, y0);
            let p10 = sample(x0, y1);
            let p11 = sample(x1, y1);

            let value = p00 * (1.0 - x_frac) * (1.0 - y_frac)
                + p01 * x_frac * (1.0 - y_frac)
                + p10 * (1.0 - x_frac) * y_frac
                + p11 * x_frac * y_frac;

            result.push(value as u8);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_frame(width: u32, height: u32) -> CameraFrame {
        CameraFrame::rgba(width, height, vec![255u8; (width * height * 4) as usize])
    }

    #[test]
    fn test_load_rejects_zero_dimension() {
        let result = QrDecoder::load(DecodeSettings { max_dimension: 0 });
        assert!(result.is_err());
    }

    #[test]
    fn test_blank_frame_yields_no_detection() {
        let decoder = QrDecoder::load(DecodeSettings::default()).unwrap();
        assert!(decoder.detect(&blank_frame(100, 100)).is_none());
    }

    #[test]
    fn test_oversized_frame_is_downscaled_without_detection() {
        let decoder = QrDecoder::load(DecodeSettings { max_dimension: 64 }).unwrap();
        assert!(decoder.detect(&blank_frame(200, 100)).is_none());
    }

    #[test]
    fn test_grayscale_honors_stride() {
        // 2x1 RGBA with 4 bytes of row padding
        let data = vec![
            255, 255, 255, 255, // white
            0, 0, 0, 255, // black
            9, 9, 9, 9, // padding
        ];
        let frame = CameraFrame {
            width: 2,
            height: 1,
            stride: 12,
            data: std::sync::Arc::from(data.as_slice()),
            format: PixelFormat::RGBA,
            captured_at: std::time::Instant::now(),
        };

        let gray = grayscale_from_frame(&frame);
        assert_eq!(gray.len(), 2);
        assert!(gray[0] > 250);
        assert_eq!(gray[1], 0);
    }

    #[test]
    fn test_downscale_gray_dimensions_and_range() {
        // Horizontal gradient 8x2 -> 4x1
        let gray: Vec<u8> = (0..16).map(|i| (i % 8) as u8 * 32).collect();
        let result = downscale_gray(&gray, 8, 2, 4, 1);
        assert_eq!(result.len(), 4);
        assert!(result[0] < result[3]);
    }
}

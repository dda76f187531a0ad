// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for frame sources

use std::sync::Arc;
use std::time::Instant;

/// Pixel format of a captured buffer
///
/// Sources negotiate one of these with the device and convert to RGBA
/// before publishing frames. Compressed formats are rejected during
/// negotiation; this crate does not do codec work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// RGBA - 32-bit with alpha, the only format published to consumers
    RGBA,
    /// RGB24 - 24-bit RGB (3 bytes per pixel, no alpha)
    RGB24,
    /// YUYV - Packed 4:2:2 (Y0 U Y1 V interleaved)
    YUYV,
    /// UYVY - Packed 4:2:2 (U Y0 V Y1 interleaved)
    UYVY,
    /// Gray8 - 8-bit grayscale (single channel)
    Gray8,
}

impl PixelFormat {
    /// Minimum bytes per row for a tightly packed buffer of this format
    pub fn min_stride(&self, width: u32) -> u32 {
        match self {
            Self::RGBA => width * 4,
            Self::RGB24 => width * 3,
            Self::YUYV | Self::UYVY => width * 2,
            Self::Gray8 => width,
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RGBA => write!(f, "RGBA"),
            Self::RGB24 => write!(f, "RGB24"),
            Self::YUYV => write!(f, "YUYV"),
            Self::UYVY => write!(f, "UYVY"),
            Self::Gray8 => write!(f, "Gray8"),
        }
    }
}

/// A single captured frame, converted to RGBA by the source
///
/// Frames are transient: read at tick time, handed to the decoder and the
/// overlay, then dropped. The pixel data is reference counted so the decode
/// task can outlive the slot it was read from.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Bytes per row; may exceed `width * 4` when rows carry padding
    pub stride: u32,
    pub data: Arc<[u8]>,
    pub format: PixelFormat,
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Build a tightly packed RGBA frame
    pub fn rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            stride: width * 4,
            data: Arc::from(data.as_slice()),
            format: PixelFormat::RGBA,
            captured_at: Instant::now(),
        }
    }
}

/// Device information reported by enumeration
#[derive(Debug, Clone, Default)]
pub struct CameraDeviceInfo {
    /// Device index (e.g. 0 for /dev/video0)
    pub index: usize,
    /// Human readable card name
    pub name: String,
    /// Device path (e.g. /dev/video0)
    pub path: String,
    /// Kernel driver name
    pub driver: String,
}

/// Information about an acquired stream, returned by `FrameSource::acquire`
#[derive(Debug, Clone)]
pub struct StreamInfo {
    pub device: String,
    pub width: u32,
    pub height: u32,
}

/// Result type for frame source operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors from frame source backends
#[derive(Debug, Clone)]
pub enum BackendError {
    /// No capture device present at the requested index
    DeviceNotFound(String),
    /// Device exists but could not be opened or started
    InitializationFailed(String),
    /// Device offers no format this crate can convert
    FormatNotSupported(String),
    /// The capture stream died after acquisition
    StreamError(String),
    /// Anything else
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::InitializationFailed(msg) => {
                write!(f, "Initialization failed: {}", msg)
            }
            BackendError::FormatNotSupported(msg) => write!(f, "Format not supported: {}", msg),
            BackendError::StreamError(msg) => write!(f, "Stream error: {}", msg),
            BackendError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_stride() {
        assert_eq!(PixelFormat::RGBA.min_stride(640), 2560);
        assert_eq!(PixelFormat::YUYV.min_stride(640), 1280);
        assert_eq!(PixelFormat::Gray8.min_stride(640), 640);
        assert_eq!(PixelFormat::RGB24.min_stride(640), 1920);
    }

    #[test]
    fn test_rgba_frame_is_tightly_packed() {
        let frame = CameraFrame::rgba(2, 2, vec![0u8; 16]);
        assert_eq!(frame.stride, 8);
        assert_eq!(frame.format, PixelFormat::RGBA);
        assert_eq!(frame.data.len(), 16);
    }
}

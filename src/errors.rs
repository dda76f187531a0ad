// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the scanning service

use crate::backends::camera::types::BackendError;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera-related errors
    Camera(CameraError),
    /// Decode engine errors
    Decode(DecodeError),
    /// Host bridge errors
    Bridge(BridgeError),
    /// Configuration errors
    Config(String),
    /// I/O errors
    Io(String),
    /// Generic error with message
    Other(String),
}

/// Camera-specific errors
#[derive(Debug, Clone)]
pub enum CameraError {
    /// No camera devices found
    NoCameraFound,
    /// Acquisition failed for a present device
    AcquisitionFailed(String),
}

/// Decode engine errors
#[derive(Debug, Clone)]
pub enum DecodeError {
    /// Settings the engine cannot run with
    InvalidConfig(String),
    /// The engine could not be brought up
    EngineFailure(String),
}

/// Host bridge errors
#[derive(Debug, Clone)]
pub enum BridgeError {
    /// The peer side of the channel is gone
    ChannelClosed,
    /// A line on the wire did not parse as a known port message
    InvalidMessage(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Decode(e) => write!(f, "Decode error: {}", e),
            AppError::Bridge(e) => write!(f, "Bridge error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Io(msg) => write!(f, "I/O error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::NoCameraFound => write!(f, "No camera devices found"),
            CameraError::AcquisitionFailed(msg) => write!(f, "Acquisition failed: {}", msg),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::InvalidConfig(msg) => write!(f, "Invalid decode config: {}", msg),
            DecodeError::EngineFailure(msg) => write!(f, "Decode engine failure: {}", msg),
        }
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::ChannelClosed => write!(f, "Bridge channel closed"),
            BridgeError::InvalidMessage(msg) => write!(f, "Invalid message: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for DecodeError {}
impl std::error::Error for BridgeError {}

// Conversions from sub-errors to AppError
impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<DecodeError> for AppError {
    fn from(err: DecodeError) -> Self {
        AppError::Decode(err)
    }
}

impl From<BridgeError> for AppError {
    fn from(err: BridgeError) -> Self {
        AppError::Bridge(err)
    }
}

impl From<BackendError> for CameraError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::DeviceNotFound(_) => CameraError::NoCameraFound,
            other => CameraError::AcquisitionFailed(other.to_string()),
        }
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::Camera(err.into())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_not_found_maps_to_no_camera() {
        let err: CameraError = BackendError::DeviceNotFound("/dev/video0".to_string()).into();
        assert!(matches!(err, CameraError::NoCameraFound));
    }

    #[test]
    fn test_other_backend_errors_keep_their_message() {
        let err: CameraError = BackendError::InitializationFailed("busy".to_string()).into();
        match err {
            CameraError::AcquisitionFailed(msg) => assert!(msg.contains("busy")),
            _ => panic!("Expected AcquisitionFailed"),
        }
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! Still-image frame source
//!
//! Replays one fixed frame, loaded from an image file or built from raw
//! pixels. Backs the one-shot CLI scan path and the test suite; no camera
//! hardware is involved.

use super::types::{BackendError, BackendResult, CameraFrame, StreamInfo};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Load an image file as a single RGBA frame
pub fn load_image_as_frame(path: &Path) -> BackendResult<CameraFrame> {
    let image = image::open(path).map_err(|e| {
        BackendError::Other(format!("failed to load {}: {}", path.display(), e))
    })?;

    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();

    debug!(path = %path.display(), width, height, "Loaded image as frame");
    Ok(CameraFrame::rgba(width, height, rgba.into_raw()))
}

/// Frame source that serves one fixed frame while acquired
pub struct StillSource {
    frame: Arc<CameraFrame>,
    label: String,
    active: bool,
}

impl StillSource {
    /// Build a source from an image file
    pub fn from_image(path: &Path) -> BackendResult<Self> {
        let frame = load_image_as_frame(path)?;
        Ok(Self {
            frame: Arc::new(frame),
            label: path.display().to_string(),
            active: false,
        })
    }

    /// Build a source from raw RGBA pixels
    pub fn from_pixels(width: u32, height: u32, rgba: Vec<u8>) -> BackendResult<Self> {
        let expected = (width * height * 4) as usize;
        if rgba.len() != expected {
            return Err(BackendError::Other(format!(
                "pixel buffer is {} bytes, expected {}",
                rgba.len(),
                expected
            )));
        }
        Ok(Self {
            frame: Arc::new(CameraFrame::rgba(width, height, rgba)),
            label: format!("still {}x{}", width, height),
            active: false,
        })
    }

    /// Build a source serving a solid color frame
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let mut rgba = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            rgba.extend_from_slice(&color);
        }
        Self {
            frame: Arc::new(CameraFrame::rgba(width, height, rgba)),
            label: format!("solid {}x{}", width, height),
            active: false,
        }
    }
}

impl super::FrameSource for StillSource {
    fn acquire(&mut self) -> BackendResult<StreamInfo> {
        self.active = true;
        Ok(StreamInfo {
            device: self.label.clone(),
            width: self.frame.width,
            height: self.frame.height,
        })
    }

    fn current_frame(&self) -> Option<Arc<CameraFrame>> {
        if self.active {
            Some(Arc::clone(&self.frame))
        } else {
            None
        }
    }

    fn release(&mut self) {
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! Frame source abstraction
//!
//! A frame source owns the camera stream handle and publishes the most
//! recent frame for the scan session to poll at tick time.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │     ScanSession     │  ← tick loop, polls current_frame()
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  FrameSource trait  │  ← acquire / current_frame / release
//! └──────────┬──────────┘
//!            │
//!      ┌─────┴──────┐
//!      ▼            ▼
//! ┌────────┐  ┌───────────┐
//! │  V4L2  │  │ StillImage│  ← real camera / fixed frame for tests & CLI
//! └────────┘  └───────────┘
//! ```

pub mod file_source;
pub mod format_converters;
pub mod frame_loop;
pub mod types;
pub mod v4l2;

pub use file_source::StillSource;
pub use types::*;
pub use v4l2::V4l2Source;

use std::sync::Arc;

/// A source of camera frames
///
/// Implementations own the underlying stream handle. At most one stream is
/// active per source; acquiring twice without releasing is an error.
pub trait FrameSource: Send {
    /// Acquire the underlying stream
    ///
    /// On success the source starts buffering frames. A missing device is
    /// reported as [`BackendError::DeviceNotFound`] so the session can
    /// distinguish "no camera" from other failures.
    fn acquire(&mut self) -> BackendResult<StreamInfo>;

    /// The most recently captured frame
    ///
    /// Returns `None` before acquisition and until the first frame has been
    /// buffered.
    fn current_frame(&self) -> Option<Arc<CameraFrame>>;

    /// Stop the stream and clear all references to it
    ///
    /// Safe to call when nothing is acquired.
    fn release(&mut self);

    /// Whether a stream is currently acquired
    fn is_active(&self) -> bool;
}

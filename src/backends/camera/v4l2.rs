// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 frame source
//!
//! Opens a `/dev/video*` device, negotiates an uncompressed format, and runs
//! an mmap capture stream on a dedicated thread. The thread converts each
//! buffer to RGBA and publishes it into a shared latest-frame slot that the
//! scan session polls at tick time.

use super::format_converters;
use super::frame_loop::CaptureLoopController;
use super::types::{
    BackendError, BackendResult, CameraDeviceInfo, CameraFrame, PixelFormat, StreamInfo,
};
use crate::constants::{capture, timing};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use tracing::{debug, info, warn};
use v4l::FourCC;
use v4l::buffer::Type;
use v4l::io::mmap::Stream as MmapStream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;

/// Latest-frame slot shared between the capture thread and the session
type FrameSlot = Arc<Mutex<Option<Arc<CameraFrame>>>>;

/// Frame source backed by a V4L2 capture device
pub struct V4l2Source {
    device_index: usize,
    requested_width: u32,
    requested_height: u32,
    latest: FrameSlot,
    controller: Option<CaptureLoopController>,
}

impl V4l2Source {
    /// Create a source for the given device index and requested resolution
    ///
    /// The device is not touched until [`FrameSource::acquire`] is called;
    /// the driver may adjust the resolution during negotiation.
    pub fn new(device_index: usize, width: u32, height: u32) -> Self {
        Self {
            device_index,
            requested_width: width,
            requested_height: height,
            latest: Arc::new(Mutex::new(None)),
            controller: None,
        }
    }
}

impl super::FrameSource for V4l2Source {
    fn acquire(&mut self) -> BackendResult<StreamInfo> {
        if self.controller.is_some() {
            return Err(BackendError::Other("stream already acquired".to_string()));
        }

        *self.latest.lock().unwrap() = None;

        let (ready_tx, ready_rx) = mpsc::channel();
        let latest = Arc::clone(&self.latest);
        let index = self.device_index;
        let width = self.requested_width;
        let height = self.requested_height;

        let controller = CaptureLoopController::start_owned("v4l2-capture", move |stop| {
            capture_thread(index, width, height, latest, ready_tx, stop);
        });

        match ready_rx.recv_timeout(timing::ACQUIRE_TIMEOUT) {
            Ok(Ok(info)) => {
                info!(
                    device = %info.device,
                    width = info.width,
                    height = info.height,
                    "Camera stream acquired"
                );
                self.controller = Some(controller);
                Ok(info)
            }
            Ok(Err(e)) => {
                drop(controller);
                Err(e)
            }
            Err(_) => {
                drop(controller);
                Err(BackendError::InitializationFailed(
                    "timed out waiting for capture setup".to_string(),
                ))
            }
        }
    }

    fn current_frame(&self) -> Option<Arc<CameraFrame>> {
        self.latest.lock().unwrap().clone()
    }

    fn release(&mut self) {
        if let Some(mut controller) = self.controller.take() {
            controller.stop();
        }
        *self.latest.lock().unwrap() = None;
    }

    fn is_active(&self) -> bool {
        self.controller.is_some()
    }
}

impl Drop for V4l2Source {
    fn drop(&mut self) {
        use super::FrameSource;
        self.release();
    }
}

/// Enumerate V4L2 capture devices
pub fn enumerate_devices() -> Vec<CameraDeviceInfo> {
    let mut devices = Vec::new();

    for node in v4l::context::enum_devices() {
        let index = node.index();
        let name = node
            .name()
            .unwrap_or_else(|| format!("video{}", index));
        let path = node.path().display().to_string();
        let driver = v4l::Device::new(index)
            .and_then(|dev| dev.query_caps())
            .map(|caps| caps.driver)
            .unwrap_or_default();

        devices.push(CameraDeviceInfo {
            index,
            name,
            path,
            driver,
        });
    }

    devices.sort_by_key(|d| d.index);
    devices
}

/// Body of the capture thread: setup handshake, then the blocking frame loop
fn capture_thread(
    index: usize,
    width: u32,
    height: u32,
    latest: FrameSlot,
    ready_tx: mpsc::Sender<BackendResult<StreamInfo>>,
    stop: Arc<AtomicBool>,
) {
    let dev = match v4l::Device::new(index) {
        Ok(dev) => dev,
        Err(e) => {
            let err = if e.kind() == std::io::ErrorKind::NotFound {
                BackendError::DeviceNotFound(format!("/dev/video{} not found", index))
            } else {
                BackendError::InitializationFailed(format!("open /dev/video{}: {}", index, e))
            };
            let _ = ready_tx.send(Err(err));
            return;
        }
    };

    let negotiated = negotiate_format(&dev, width, height);
    let Some((actual_width, actual_height, stride, pixel_format)) = negotiated else {
        let _ = ready_tx.send(Err(BackendError::FormatNotSupported(format!(
            "/dev/video{} offers no uncompressed format this crate can convert",
            index
        ))));
        return;
    };

    let device_name = dev
        .query_caps()
        .map(|caps| caps.card)
        .unwrap_or_else(|_| format!("video{}", index));

    let mut stream = match MmapStream::with_buffers(&dev, Type::VideoCapture, capture::BUFFER_COUNT)
    {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(BackendError::InitializationFailed(format!(
                "mmap stream: {}",
                e
            ))));
            return;
        }
    };

    let _ = ready_tx.send(Ok(StreamInfo {
        device: device_name,
        width: actual_width,
        height: actual_height,
    }));

    while !stop.load(Ordering::SeqCst) {
        match stream.next() {
            Ok((buf, meta)) => {
                let used = meta.bytesused as usize;
                let data = if used > 0 && used <= buf.len() {
                    &buf[..used]
                } else {
                    buf
                };
                let frame =
                    convert_frame(data, actual_width, actual_height, stride, pixel_format);
                *latest.lock().unwrap() = Some(Arc::new(frame));
            }
            Err(e) => {
                warn!(error = %e, "Capture stream error, stopping");
                break;
            }
        }
    }
}

/// Try the preferred fourcc list and return what the driver settled on
fn negotiate_format(dev: &v4l::Device, width: u32, height: u32) -> Option<(u32, u32, u32, PixelFormat)> {
    for fourcc in capture::PREFERRED_FOURCCS {
        let request = v4l::Format::new(width, height, FourCC::new(fourcc));
        match dev.set_format(&request) {
            Ok(actual) => {
                if let Some(pixel_format) = fourcc_to_format(&actual.fourcc) {
                    debug!(
                        fourcc = %actual.fourcc,
                        width = actual.width,
                        height = actual.height,
                        "Negotiated capture format"
                    );
                    return Some((actual.width, actual.height, actual.stride, pixel_format));
                }
                debug!(fourcc = %actual.fourcc, "Driver substituted an unsupported format");
            }
            Err(e) => {
                debug!(error = %e, "set_format rejected");
            }
        }
    }
    None
}

/// Map a V4L2 fourcc to a pixel format this crate can convert
fn fourcc_to_format(fourcc: &FourCC) -> Option<PixelFormat> {
    match &fourcc.repr {
        b"YUYV" => Some(PixelFormat::YUYV),
        b"UYVY" => Some(PixelFormat::UYVY),
        b"RGB3" => Some(PixelFormat::RGB24),
        b"GREY" => Some(PixelFormat::Gray8),
        _ => None,
    }
}

/// Convert one captured buffer to a tightly packed RGBA frame
fn convert_frame(
    data: &[u8],
    width: u32,
    height: u32,
    stride: u32,
    pixel_format: PixelFormat,
) -> CameraFrame {
    let min_stride = pixel_format.min_stride(width) as usize;
    let stride = stride as usize;

    let packed_storage;
    let packed: &[u8] = if stride > min_stride && stride * height as usize <= data.len() {
        packed_storage = pack_rows(data, min_stride, stride, height as usize);
        &packed_storage
    } else {
        data
    };

    let rgba = match pixel_format {
        PixelFormat::RGBA => packed.to_vec(),
        PixelFormat::RGB24 => format_converters::rgb24_to_rgba(packed, width, height),
        PixelFormat::YUYV => format_converters::yuyv_to_rgba(packed, width, height),
        PixelFormat::UYVY => format_converters::uyvy_to_rgba(packed, width, height),
        PixelFormat::Gray8 => format_converters::gray8_to_rgba(packed, width, height),
    };

    CameraFrame::rgba(width, height, rgba)
}

/// Copy rows out of a padded buffer, dropping the per-row padding
fn pack_rows(data: &[u8], row_bytes: usize, stride: usize, height: usize) -> Vec<u8> {
    let mut packed = Vec::with_capacity(row_bytes * height);

    for row in 0..height {
        let start = row * stride;
        let end = start + row_bytes;
        if end <= data.len() {
            packed.extend_from_slice(&data[start..end]);
        }
    }

    packed
}

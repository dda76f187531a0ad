// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Running the host bridge over stdio
//! - Listing available cameras
//! - One-shot scanning of an image file

use chrono::Local;
use qrscan::backends::camera::{V4l2Source, file_source, v4l2};
use qrscan::bridge;
use qrscan::config::Config;
use qrscan::decoder::{Detection, Detector, QrDecoder};
use qrscan::errors::{AppError, AppResult};
use qrscan::overlay::Canvas;
use qrscan::session::ScanSession;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Run the bridge over stdio with the real camera backend
///
/// Uses a current-thread runtime: the session, the bridge, and every
/// command handler share one execution context, so ticks and handlers can
/// never overlap. Only decode work leaves this thread.
pub fn run_bridge(config: &Config, camera_override: Option<usize>) -> AppResult<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let device_index = camera_override.unwrap_or(config.camera.device_index);
        let source = Box::new(V4l2Source::new(
            device_index,
            config.camera.width,
            config.camera.height,
        ));

        let (handle, ports) = bridge::channel();
        let session = ScanSession::new(
            source,
            config.decode_settings(),
            ports,
            config.session_config(),
        );

        let session_task = tokio::spawn(session.run());
        let result = bridge::stdio::run(handle).await;

        // The handle is gone now, so the session sees a closed command
        // channel, tears down, and exits.
        if let Err(e) = session_task.await {
            warn!(error = %e, "Session task failed");
        }

        result
    })
}

/// List all available cameras
pub fn list_cameras() -> AppResult<()> {
    let devices = v4l2::enumerate_devices();

    if devices.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for device in &devices {
        println!("  [{}] {} ({})", device.index, device.name, device.path);
        if !device.driver.is_empty() {
            println!("      Driver: {}", device.driver);
        }
        println!();
    }

    Ok(())
}

/// Decode a QR code from an image file
pub fn scan_image(
    input: &Path,
    output: Option<PathBuf>,
    annotate: bool,
    config: &Config,
) -> AppResult<()> {
    let frame = file_source::load_image_as_frame(input)?;
    let decoder = QrDecoder::load(config.decode_settings())?;

    let Some(detection) = decoder.detect(&frame) else {
        println!("No QR code detected in {}", input.display());
        return Ok(());
    };

    println!("Decoded payload: {}", detection.text);
    for (i, corner) in detection.corners.iter().enumerate() {
        println!("  corner {}: ({:.1}, {:.1})", i, corner.x, corner.y);
    }

    let target = match (output, annotate) {
        (Some(path), _) => Some(path),
        (None, true) => Some(PathBuf::from(format!(
            "scan_{}.png",
            Local::now().format("%Y%m%d_%H%M%S")
        ))),
        (None, false) => None,
    };

    if let Some(path) = target {
        write_annotated(&frame, &detection, &path, config)?;
        println!("Annotated image written to {}", path.display());
    }

    Ok(())
}

/// Write a copy of the frame with the detection box drawn on it
fn write_annotated(
    frame: &qrscan::backends::camera::CameraFrame,
    detection: &Detection,
    path: &Path,
    config: &Config,
) -> AppResult<()> {
    let mut canvas = Canvas::new();
    canvas.blit(frame);
    canvas.draw_box(&detection.corners, config.session_config().box_color);

    let image =
        image::RgbaImage::from_raw(canvas.width(), canvas.height(), canvas.pixels().to_vec())
            .ok_or_else(|| AppError::Other("canvas buffer size mismatch".to_string()))?;
    image
        .save(path)
        .map_err(|e| AppError::Other(format!("failed to write {}: {}", path.display(), e)))?;

    Ok(())
}

// SPDX-License-Identifier: GPL-3.0-only

//! Overlay rendering
//!
//! The canvas is the session's drawing surface: each active tick blits the
//! current frame onto it, and a successful detection strokes a closed
//! 4-point polygon around the symbol. Teardown clears the pixels and resets
//! the surface to zero size. Drawing on an empty surface is a no-op.

use crate::backends::camera::types::CameraFrame;
use crate::constants::overlay::LINE_WIDTH;
use crate::decoder::Point;
use tracing::trace;

/// An owned RGBA drawing surface
#[derive(Debug, Default)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    /// Create an empty (zero-sized) canvas
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA pixel data, row-major, tightly packed
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Whether the surface currently has no pixels
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Copy a frame onto the canvas, resizing the surface to match
    pub fn blit(&mut self, frame: &CameraFrame) {
        let width = frame.width as usize;
        let height = frame.height as usize;
        let stride = frame.stride as usize;
        let row_bytes = width * 4;

        if self.width != frame.width || self.height != frame.height {
            self.width = frame.width;
            self.height = frame.height;
            self.pixels = vec![0u8; row_bytes * height];
        }

        for y in 0..height {
            let src_start = y * stride;
            let src_end = src_start + row_bytes;
            if src_end > frame.data.len() {
                break;
            }
            let dst_start = y * row_bytes;
            self.pixels[dst_start..dst_start + row_bytes]
                .copy_from_slice(&frame.data[src_start..src_end]);
        }
    }

    /// Stroke a closed 4-sided polygon
    ///
    /// No-op when the surface is empty.
    pub fn draw_box(&mut self, corners: &[Point; 4], color: [u8; 4]) {
        if self.is_empty() {
            return;
        }

        trace!(width = self.width, height = self.height, "Drawing detection box");

        for i in 0..4 {
            let from = corners[i];
            let to = corners[(i + 1) % 4];
            self.stroke_line(from, to, color);
        }
    }

    /// Zero the pixels and reset the surface to zero size
    pub fn clear(&mut self) {
        self.pixels.clear();
        self.width = 0;
        self.height = 0;
    }

    /// Draw a line segment with the configured stroke width
    fn stroke_line(&mut self, from: Point, to: Point, color: [u8; 4]) {
        let mut x0 = from.x.round() as i64;
        let mut y0 = from.y.round() as i64;
        let x1 = to.x.round() as i64;
        let y1 = to.y.round() as i64;

        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.fill_dot(x0, y0, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    /// Stamp a square brush of the stroke width centered on a point
    fn fill_dot(&mut self, cx: i64, cy: i64, color: [u8; 4]) {
        let radius = (LINE_WIDTH / 2) as i64;
        for y in cy - radius..=cy + radius {
            for x in cx - radius..=cx + radius {
                self.set_pixel(x, y, color);
            }
        }
    }

    fn set_pixel(&mut self, x: i64, y: i64, color: [u8; 4]) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels[offset..offset + 4].copy_from_slice(&color);
    }
}

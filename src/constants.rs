// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Session and capture timing
pub mod timing {
    use std::time::Duration;

    /// Safety timeout: an acquired stream is torn down unconditionally after
    /// this long, regardless of detection state. A leak guard, not a feature.
    pub const SESSION_TIMEOUT: Duration = Duration::from_secs(20);

    /// Interval between detection ticks (roughly 30 per second)
    pub const TICK_INTERVAL: Duration = Duration::from_millis(33);

    /// Delay between the initialization command and the first acquisition
    /// attempt, giving the host time to settle its own state
    pub const STARTUP_DELAY: Duration = Duration::from_millis(500);

    /// How long `acquire` waits for the capture thread's setup handshake
    pub const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);
}

/// Overlay palette and geometry
pub mod colors {
    pub const DARK_GREEN: [u8; 4] = [0x61, 0xA5, 0x91, 0xFF];
    pub const PURPLE: [u8; 4] = [0x59, 0x4F, 0xEE, 0xFF];
    pub const ERROR_RED: [u8; 4] = [0xC8, 0x00, 0x00, 0xFF];
    pub const TEAL_GREEN: [u8; 4] = [0x00, 0xB2, 0xC3, 0xFF];

    /// Color of the box stroked around a detected symbol
    pub const DETECTION_BOX: [u8; 4] = PURPLE;
}

/// Overlay rendering
pub mod overlay {
    /// Stroke width of the detection box, in pixels
    pub const LINE_WIDTH: u32 = 4;
}

/// Decode engine defaults
pub mod decode {
    /// Frames larger than this are downscaled before detection. Symbols are
    /// typically large enough in-frame to survive 640px processing.
    pub const MAX_DIMENSION: u32 = 640;

    /// Side length of the blank buffer used for the engine warm-up pass
    pub const WARMUP_DIMENSION: u32 = 32;
}

/// V4L2 capture
pub mod capture {
    /// Number of mmap buffers queued on the capture stream
    pub const BUFFER_COUNT: u32 = 4;

    /// Uncompressed formats tried during negotiation, most preferred first
    pub const PREFERRED_FOURCCS: [&[u8; 4]; 4] = [b"YUYV", b"RGB3", b"UYVY", b"GREY"];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_is_opaque() {
        for color in [
            colors::DARK_GREEN,
            colors::PURPLE,
            colors::ERROR_RED,
            colors::TEAL_GREEN,
        ] {
            assert_eq!(color[3], 0xFF);
        }
    }

    #[test]
    fn test_session_timeout_is_twenty_seconds() {
        assert_eq!(timing::SESSION_TIMEOUT.as_millis(), 20_000);
    }
}

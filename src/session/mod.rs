// SPDX-License-Identifier: GPL-3.0-only

//! Scan session
//!
//! One session owns the frame source, the decode engine, and the overlay
//! canvas, and drives the capture/decode/render cycle from a single
//! cooperative loop. Commands, deadlines, and the tick interval are
//! multiplexed with `select!`; ticks are strictly sequential and the decode
//! step is awaited before the next branch is serviced.
//!
//! Lifecycle: `Inactive → Active` (stream acquired) `→ Frozen` (successful
//! detection) `→ Active` (unfreeze command) `→ Stopping → Inactive`
//! (teardown). Decoding and rendering happen only in `Active`.

use crate::backends::camera::FrameSource;
use crate::backends::camera::types::BackendError;
use crate::bridge::{Command, Event, SessionPorts};
use crate::constants::{colors, timing};
use crate::decoder::{DecodeSettings, Detector, QrDecoder};
use crate::errors::DecodeError;
use crate::overlay::Canvas;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Scanner state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScannerState {
    /// No stream; waiting for an initialization command
    #[default]
    Inactive,
    /// Stream up, detection running
    Active,
    /// Stream up, detection paused after a hit or a freeze command
    Frozen,
    /// Teardown in progress
    Stopping,
}

/// Session timing knobs, usually taken from [`crate::config::Config`]
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Interval between detection ticks
    pub tick_interval: Duration,
    /// Unconditional teardown deadline for an acquired stream
    pub session_timeout: Duration,
    /// Delay before the first acquisition attempt
    pub startup_delay: Duration,
    /// Color of the box stroked around a detection
    pub box_color: [u8; 4],
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval: timing::TICK_INTERVAL,
            session_timeout: timing::SESSION_TIMEOUT,
            startup_delay: timing::STARTUP_DELAY,
            box_color: colors::DETECTION_BOX,
        }
    }
}

/// A camera scan session
pub struct ScanSession {
    id: Uuid,
    source: Box<dyn FrameSource>,
    detector: Option<Arc<dyn Detector>>,
    decode_settings: DecodeSettings,
    canvas: Canvas,
    state: ScannerState,
    /// Set by a disable command; gates scan payloads until teardown
    stop_messages: bool,
    safety_deadline: Option<Instant>,
    disable_deadline: Option<Instant>,
    ports: SessionPorts,
    config: SessionConfig,
}

impl ScanSession {
    /// Create a session; the decode engine loads on first initialization
    pub fn new(
        source: Box<dyn FrameSource>,
        decode_settings: DecodeSettings,
        ports: SessionPorts,
        config: SessionConfig,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            detector: None,
            decode_settings,
            canvas: Canvas::new(),
            state: ScannerState::Inactive,
            stop_messages: false,
            safety_deadline: None,
            disable_deadline: None,
            ports,
            config,
        }
    }

    /// Create a session with a pre-built detector
    pub fn with_detector(
        source: Box<dyn FrameSource>,
        detector: Arc<dyn Detector>,
        ports: SessionPorts,
        config: SessionConfig,
    ) -> Self {
        let mut session = Self::new(source, DecodeSettings::default(), ports, config);
        session.detector = Some(detector);
        session
    }

    /// Drive the session until the host disconnects
    pub async fn run(mut self) {
        info!(session = %self.id, "Scan session started");

        // interval() panics on a zero period; clamp a busy-poll config to 1ms
        let tick_interval = self.config.tick_interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval(tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let deadline = self.next_deadline();

            tokio::select! {
                biased;
                command = self.ports.commands.recv() => {
                    match command {
                        Some(command) => self.handle_command(command).await,
                        None => {
                            debug!(session = %self.id, "Command channel closed");
                            self.teardown();
                            break;
                        }
                    }
                }
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(far_future)), if deadline.is_some() => {
                    info!(session = %self.id, "Teardown deadline reached");
                    self.teardown();
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        info!(session = %self.id, "Scan session ended");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::InitializeCamera => self.initialize_camera().await,
            Command::DisableCamera(after_ms) => self.schedule_disable(after_ms),
            Command::SetFrameFrozen(frozen) => self.set_frame_frozen(frozen),
            Command::RerouteTo(url) => {
                info!(session = %self.id, %url, "Opening URL");
                if let Err(e) = open::that_detached(&url) {
                    warn!(session = %self.id, error = %e, "Failed to open URL");
                }
            }
        }
    }

    /// Acquisition sequence: startup delay, engine load, then the stream
    async fn initialize_camera(&mut self) {
        if self.state != ScannerState::Inactive {
            warn!(session = %self.id, state = ?self.state, "Stream already up, ignoring initialization");
            return;
        }

        tokio::time::sleep(self.config.startup_delay).await;

        if let Err(e) = self.ensure_detector().await {
            warn!(session = %self.id, error = %e, "Decode engine failed to load");
            self.ports.emit(Event::ReceiveCameraActive(false));
            return;
        }

        match self.source.acquire() {
            Ok(info) => {
                self.stop_messages = false;
                self.state = ScannerState::Active;
                self.safety_deadline = Some(Instant::now() + self.config.session_timeout);
                info!(
                    session = %self.id,
                    device = %info.device,
                    width = info.width,
                    height = info.height,
                    "Camera active"
                );
                self.ports.emit(Event::ReceiveCameraActive(true));
            }
            Err(BackendError::DeviceNotFound(msg)) => {
                warn!(session = %self.id, %msg, "No camera found");
                self.ports.emit(Event::NoCameraFoundError(true));
                self.ports.emit(Event::ReceiveCameraActive(false));
            }
            Err(e) => {
                warn!(session = %self.id, error = %e, "Camera acquisition failed");
                self.ports.emit(Event::ReceiveCameraActive(false));
            }
        }
    }

    /// Load the decode engine off the loop thread, once
    async fn ensure_detector(&mut self) -> Result<(), DecodeError> {
        if self.detector.is_some() {
            return Ok(());
        }

        let settings = self.decode_settings.clone();
        let loaded = match tokio::task::spawn_blocking(move || QrDecoder::load(settings)).await {
            Ok(result) => result?,
            Err(e) => {
                return Err(DecodeError::EngineFailure(format!(
                    "load task failed: {}",
                    e
                )));
            }
        };

        self.detector = Some(Arc::new(loaded));
        Ok(())
    }

    fn schedule_disable(&mut self, after_ms: u64) {
        info!(session = %self.id, after_ms, "Disable scheduled");
        self.stop_messages = true;
        self.disable_deadline = Some(Instant::now() + Duration::from_millis(after_ms));
    }

    fn set_frame_frozen(&mut self, frozen: bool) {
        match (frozen, self.state) {
            (true, ScannerState::Active) => {
                debug!(session = %self.id, "Detection frozen");
                self.state = ScannerState::Frozen;
            }
            (false, ScannerState::Frozen) => {
                debug!(session = %self.id, "Detection resumed");
                self.state = ScannerState::Active;
            }
            _ => {
                debug!(session = %self.id, frozen, state = ?self.state, "Freeze command ignored in current state");
            }
        }
    }

    /// One detection tick; does work only in `Active` with a frame buffered
    async fn tick(&mut self) {
        if self.state != ScannerState::Active {
            return;
        }
        let Some(frame) = self.source.current_frame() else {
            return;
        };
        let Some(detector) = self.detector.clone() else {
            return;
        };

        self.canvas.blit(&frame);

        let decode_frame = Arc::clone(&frame);
        let detection =
            match tokio::task::spawn_blocking(move || detector.detect(&decode_frame)).await {
                Ok(result) => result,
                Err(e) => {
                    warn!(session = %self.id, error = %e, "Detection task panicked");
                    None
                }
            };

        let Some(detection) = detection else {
            return;
        };

        self.canvas.draw_box(&detection.corners, self.config.box_color);
        self.state = ScannerState::Frozen;
        info!(
            session = %self.id,
            len = detection.text.len(),
            "Symbol detected, freezing"
        );

        if self.stop_messages {
            debug!(session = %self.id, "Stop flag set, suppressing scan payload");
        } else {
            self.ports.emit(Event::ScannedDeviceCode(detection.text));
        }
    }

    /// Release the stream and report the camera as inactive, exactly once
    fn teardown(&mut self) {
        self.safety_deadline = None;
        self.disable_deadline = None;

        if self.state == ScannerState::Inactive {
            return;
        }

        self.state = ScannerState::Stopping;
        self.source.release();
        self.canvas.clear();
        self.ports.emit(Event::ReceiveCameraActive(false));
        self.state = ScannerState::Inactive;

        info!(session = %self.id, "Session torn down");
    }

    fn next_deadline(&self) -> Option<Instant> {
        match (self.safety_deadline, self.disable_deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }
}

fn far_future() -> Instant {
    Instant::now() + Duration::from_secs(86_400)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::StillSource;
    use crate::bridge;
    use crate::decoder::Detection;

    struct NeverDetector;

    impl Detector for NeverDetector {
        fn detect(&self, _frame: &crate::backends::camera::CameraFrame) -> Option<Detection> {
            None
        }
    }

    fn test_session() -> (ScanSession, bridge::BridgeHandle) {
        let (handle, ports) = bridge::channel();
        let source = Box::new(StillSource::solid(8, 8, [0, 0, 0, 255]));
        let session = ScanSession::with_detector(
            source,
            Arc::new(NeverDetector),
            ports,
            SessionConfig::default(),
        );
        (session, handle)
    }

    #[tokio::test]
    async fn test_freeze_transitions() {
        let (mut session, _handle) = test_session();

        session.state = ScannerState::Active;
        session.set_frame_frozen(true);
        assert_eq!(session.state, ScannerState::Frozen);

        session.set_frame_frozen(false);
        assert_eq!(session.state, ScannerState::Active);

        // Freeze commands are ignored without a stream
        session.state = ScannerState::Inactive;
        session.set_frame_frozen(true);
        assert_eq!(session.state, ScannerState::Inactive);
    }

    #[tokio::test]
    async fn test_teardown_is_idempotent() {
        let (mut session, mut handle) = test_session();

        session.state = ScannerState::Active;
        session.safety_deadline = Some(Instant::now() + Duration::from_secs(20));

        session.teardown();
        assert_eq!(session.state, ScannerState::Inactive);
        assert_eq!(session.next_deadline(), None);
        assert_eq!(
            handle.next_event().await,
            Some(Event::ReceiveCameraActive(false))
        );

        // A second teardown emits nothing
        session.teardown();
        drop(session);
        assert_eq!(handle.next_event().await, None);
    }

    #[tokio::test]
    async fn test_disable_sets_stop_flag_and_deadline() {
        let (mut session, _handle) = test_session();

        assert!(!session.stop_messages);
        session.schedule_disable(1500);
        assert!(session.stop_messages);
        assert!(session.disable_deadline.is_some());
    }

    #[tokio::test]
    async fn test_next_deadline_picks_earliest() {
        let (mut session, _handle) = test_session();
        let now = Instant::now();

        session.safety_deadline = Some(now + Duration::from_secs(20));
        session.disable_deadline = Some(now + Duration::from_secs(1));
        assert_eq!(session.next_deadline(), session.disable_deadline);
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! JSON-lines transport over stdin/stdout
//!
//! One wire message per line. Unparseable input is logged and skipped so a
//! host contract violation never kills the session; the loop ends on stdin
//! EOF, Ctrl-C, or session exit.

use super::{BridgeHandle, encode_event, parse_command};
use crate::errors::{AppResult, BridgeError};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

/// Run the bridge over stdio until the host disconnects
pub async fn run(mut handle: BridgeHandle) -> AppResult<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    let mut stdout = tokio::io::stdout();

    info!("Bridge running on stdio");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        match parse_command(line) {
                            Ok(command) => {
                                if handle.send(command).is_err() {
                                    warn!("Session is gone, stopping bridge");
                                    return Err(BridgeError::ChannelClosed.into());
                                }
                            }
                            Err(e) => {
                                warn!(error = %e, line, "Dropping unparseable command");
                            }
                        }
                    }
                    Ok(None) => {
                        info!("stdin closed, stopping bridge");
                        return Ok(());
                    }
                    Err(e) => {
                        return Err(e.into());
                    }
                }
            }
            event = handle.next_event() => {
                match event {
                    Some(event) => {
                        let encoded = encode_event(&event)?;
                        stdout.write_all(encoded.as_bytes()).await?;
                        stdout.write_all(b"\n").await?;
                        stdout.flush().await?;
                    }
                    None => {
                        debug!("Session closed its event channel, stopping bridge");
                        return Ok(());
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received, stopping bridge");
                return Ok(());
            }
        }
    }
}

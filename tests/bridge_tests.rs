// SPDX-License-Identifier: GPL-3.0-only

//! Wire format of the host port contract
//!
//! Port names and payload shapes are fixed by the hosting application;
//! these tests pin the exact JSON so a refactor cannot silently break the
//! contract.

use qrscan::bridge::{Command, Event, encode_event, parse_command};

#[test]
fn test_command_wire_names() {
    assert_eq!(
        serde_json::to_string(&Command::InitializeCamera).unwrap(),
        r#"{"port":"initializeCamera"}"#
    );
    assert_eq!(
        serde_json::to_string(&Command::DisableCamera(1500)).unwrap(),
        r#"{"port":"disableCamera","payload":1500}"#
    );
    assert_eq!(
        serde_json::to_string(&Command::SetFrameFrozen(true)).unwrap(),
        r#"{"port":"setFrameFrozen","payload":true}"#
    );
    assert_eq!(
        serde_json::to_string(&Command::RerouteTo("https://example.com".to_string())).unwrap(),
        r#"{"port":"rerouteTo","payload":"https://example.com"}"#
    );
}

#[test]
fn test_event_wire_names() {
    assert_eq!(
        encode_event(&Event::ReceiveCameraActive(true)).unwrap(),
        r#"{"port":"receiveCameraActive","payload":true}"#
    );
    assert_eq!(
        encode_event(&Event::NoCameraFoundError(true)).unwrap(),
        r#"{"port":"noCameraFoundError","payload":true}"#
    );
    assert_eq!(
        encode_event(&Event::ScannedDeviceCode("abc123".to_string())).unwrap(),
        r#"{"port":"scannedDeviceCode","payload":"abc123"}"#
    );
}

#[test]
fn test_parse_command_round_trip() {
    let commands = [
        Command::InitializeCamera,
        Command::DisableCamera(0),
        Command::SetFrameFrozen(false),
        Command::RerouteTo("https://example.com/devices/7".to_string()),
    ];

    for command in commands {
        let wire = serde_json::to_string(&command).unwrap();
        assert_eq!(parse_command(&wire).unwrap(), command);
    }
}

#[test]
fn test_parse_rejects_unknown_port() {
    assert!(parse_command(r#"{"port":"selfDestruct"}"#).is_err());
}

#[test]
fn test_parse_rejects_wrong_payload_type() {
    assert!(parse_command(r#"{"port":"disableCamera","payload":"soon"}"#).is_err());
}

#[test]
fn test_parse_rejects_garbage() {
    assert!(parse_command("not json at all").is_err());
}

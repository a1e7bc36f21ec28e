//! Fuzz target: inbound MQTT command payloads
//!
//! Feeds arbitrary bytes through `classify_message` on the command topic
//! and checks that anything accepted is one of the two commands and that
//! the parser agrees with its own canonical spelling.
//!
//! cargo fuzz run fuzz_command_payload

#![no_main]

use libfuzzer_sys::fuzz_target;
use sweepguard::adapters::mqtt::classify_message;
use sweepguard::app::commands::{AppCommand, MAX_COMMAND_LEN};
use sweepguard::events::BrokerEvent;

const TOPIC: &str = "device/commands";

fuzz_target!(|data: &[u8]| {
    let parsed = AppCommand::parse(data);

    match classify_message(Some(TOPIC), data, TOPIC) {
        Some(BrokerEvent::Command(cmd)) => {
            assert!(data.len() <= MAX_COMMAND_LEN, "accepted an oversized payload");
            assert_eq!(parsed, Some(cmd));
            assert_eq!(AppCommand::parse(cmd.as_str().as_bytes()), Some(cmd));
        }
        Some(other) => panic!("command topic produced {:?}", other),
        None => assert_eq!(parsed, None),
    }

    // Same bytes on any other topic never produce an event.
    assert!(classify_message(Some("device/telemetry"), data, TOPIC).is_none());
});

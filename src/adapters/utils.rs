//! String checks shared by the network adapters.

/// Every byte in `0x20..=0x7E`.  WiFi SSIDs are held to this.
pub(super) fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// A concrete MQTT topic name: non-empty, printable, no `+` / `#`
/// wildcards and no empty levels at either end.
pub(super) fn is_topic_name(s: &str) -> bool {
    !s.is_empty()
        && is_printable_ascii(s)
        && !s.contains(['+', '#'])
        && !s.starts_with('/')
        && !s.ends_with('/')
}

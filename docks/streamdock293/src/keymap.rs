//! Inbound key report decoding.

use dock_sync_core::ProtocolError;

/// Offset of the physical key code in an inbound report
pub const KEY_CODE_OFFSET: usize = 9;
/// Offset of the press flag in an inbound report
pub const STATE_OFFSET: usize = 10;

/// Physical key code reported by the device, paired with the logical key
/// (numbered left to right, top to bottom) it belongs to.
pub const KEY_MAP: [(u8, u8); 15] = [
    (0x01, 11),
    (0x02, 12),
    (0x03, 13),
    (0x04, 14),
    (0x05, 15),
    (0x06, 6),
    (0x07, 7),
    (0x08, 8),
    (0x09, 9),
    (0x0A, 10),
    (0x0B, 1),
    (0x0C, 2),
    (0x0D, 3),
    (0x0E, 4),
    (0x0F, 5),
];

/// Number of keys on the device
pub const KEY_COUNT: u8 = KEY_MAP.len() as u8;

/// Look up the logical key for a physical code
pub fn logical_key(code: u8) -> Option<u8> {
    KEY_MAP
        .iter()
        .find(|(physical, _)| *physical == code)
        .map(|(_, logical)| *logical)
}

/// Key identity carried by a report
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// Logical key index, 1..=15
    Mapped(u8),
    /// Physical code with no entry in [`KEY_MAP`]
    Unmapped(u8),
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Mapped(id) => write!(f, "{id}"),
            Key::Unmapped(code) => write!(f, "unmapped (0x{code:02x})"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyState {
    Pressed,
    Released,
}

impl KeyState {
    pub fn is_pressed(self) -> bool {
        self == KeyState::Pressed
    }
}

/// One key transition reported by the device
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub state: KeyState,
}

/// Decode an inbound report. Any nonzero state byte counts as a press.
pub fn decode(report: &[u8]) -> Result<KeyEvent, ProtocolError> {
    let (Some(&code), Some(&state)) = (report.get(KEY_CODE_OFFSET), report.get(STATE_OFFSET))
    else {
        return Err(ProtocolError::ShortReport {
            len: report.len(),
            need: STATE_OFFSET + 1,
        });
    };

    let key = match logical_key(code) {
        Some(id) => Key::Mapped(id),
        None => Key::Unmapped(code),
    };
    let state = if state != 0 {
        KeyState::Pressed
    } else {
        KeyState::Released
    };
    Ok(KeyEvent { key, state })
}

//! Key codes and how they are rendered for output.
//!
//! A [`KeyCode`] is the Windows virtual key code of a key-down event truncated
//! to a single byte.  Virtual key codes are defined in the range 0x01–0xFE, so
//! truncation is lossless for every real key; an out-of-range value such as
//! 0x100 silently wraps to 0x00.

pub mod quote;
pub mod windows_vk;

use std::fmt;

use serde::{Deserialize, Serialize};

/// A captured key code: a virtual key code truncated to one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyCode(u8);

impl KeyCode {
    /// Wraps a byte as a key code.
    pub const fn new(code: u8) -> Self {
        Self(code)
    }

    /// Truncates a raw virtual key code to its low byte.
    ///
    /// `0x41` stays `0x41`; `0x100` becomes `0x00`.
    pub const fn from_vk(vk_code: u32) -> Self {
        Self(vk_code as u8)
    }

    /// Returns the byte value.
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Renders the code as a quoted character literal, e.g. `'A'` or `'\x00'`.
    pub fn quoted(self) -> String {
        quote::quote_byte(self.0)
    }

    /// Returns the Windows virtual-key name (e.g. `VK_RETURN`), if assigned.
    pub fn name(self) -> Option<&'static str> {
        windows_vk::vk_name(self.0)
    }

    /// Renders the code in the requested output format.
    pub fn render(self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Quoted => self.quoted(),
            OutputFormat::Decimal => self.0.to_string(),
            OutputFormat::Hex => format!("{:#04x}", self.0),
            OutputFormat::Name => match self.name() {
                Some(name) => name.to_string(),
                None => format!("{:#04x}", self.0),
            },
        }
    }
}

impl From<u8> for KeyCode {
    fn from(code: u8) -> Self {
        Self(code)
    }
}

impl From<KeyCode> for u8 {
    fn from(code: KeyCode) -> Self {
        code.0
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.quoted())
    }
}

/// How the consumer writes each key code to the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Quoted character literal of the byte: `'A'`.
    #[default]
    Quoted,
    /// Decimal byte value: `65`.
    Decimal,
    /// Hexadecimal byte value: `0x41`.
    Hex,
    /// Virtual-key name, falling back to hex: `VK_A`.
    Name,
}

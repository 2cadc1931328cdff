//! Windows Virtual Key (VK) code name table.
//!
//! Reference: Windows Virtual-Key Codes (winuser.h).  Letters and digits have
//! no `VK_*` constant in the header; they are named `VK_A`…`VK_Z` and
//! `VK_0`…`VK_9` here, matching their ASCII values.
//!
//! `VK_NAMES` is a compile-time table of 256 entries indexed by VK code, so a
//! lookup is a single array index.  Reserved and unassigned codes hold `None`.

/// Returns the `VK_*` name of `vk`, or `None` for reserved/unassigned codes.
pub fn vk_name(vk: u8) -> Option<&'static str> {
    VK_NAMES[vk as usize]
}

const LETTERS: [&str; 26] = [
    "VK_A", "VK_B", "VK_C", "VK_D", "VK_E", "VK_F", "VK_G", "VK_H", "VK_I", "VK_J", "VK_K", "VK_L",
    "VK_M", "VK_N", "VK_O", "VK_P", "VK_Q", "VK_R", "VK_S", "VK_T", "VK_U", "VK_V", "VK_W", "VK_X",
    "VK_Y", "VK_Z",
];

const DIGITS: [&str; 10] = [
    "VK_0", "VK_1", "VK_2", "VK_3", "VK_4", "VK_5", "VK_6", "VK_7", "VK_8", "VK_9",
];

const NUMPAD: [&str; 10] = [
    "VK_NUMPAD0", "VK_NUMPAD1", "VK_NUMPAD2", "VK_NUMPAD3", "VK_NUMPAD4", "VK_NUMPAD5",
    "VK_NUMPAD6", "VK_NUMPAD7", "VK_NUMPAD8", "VK_NUMPAD9",
];

const FUNCTION_KEYS: [&str; 24] = [
    "VK_F1", "VK_F2", "VK_F3", "VK_F4", "VK_F5", "VK_F6", "VK_F7", "VK_F8", "VK_F9", "VK_F10",
    "VK_F11", "VK_F12", "VK_F13", "VK_F14", "VK_F15", "VK_F16", "VK_F17", "VK_F18", "VK_F19",
    "VK_F20", "VK_F21", "VK_F22", "VK_F23", "VK_F24",
];

/// Complete VK → name table indexed by VK code (0x00–0xFF).
const VK_NAMES: [Option<&str>; 256] = {
    let mut t: [Option<&str>; 256] = [None; 256];

    // ── Mouse buttons ─────────────────────────────────────────────────────────
    t[0x01] = Some("VK_LBUTTON");
    t[0x02] = Some("VK_RBUTTON");
    t[0x03] = Some("VK_CANCEL");
    t[0x04] = Some("VK_MBUTTON");
    t[0x05] = Some("VK_XBUTTON1");
    t[0x06] = Some("VK_XBUTTON2");

    // ── Control keys ──────────────────────────────────────────────────────────
    t[0x08] = Some("VK_BACK");
    t[0x09] = Some("VK_TAB");
    t[0x0C] = Some("VK_CLEAR");
    t[0x0D] = Some("VK_RETURN");
    t[0x10] = Some("VK_SHIFT");
    t[0x11] = Some("VK_CONTROL");
    t[0x12] = Some("VK_MENU");
    t[0x13] = Some("VK_PAUSE");
    t[0x14] = Some("VK_CAPITAL");

    // ── IME ───────────────────────────────────────────────────────────────────
    t[0x15] = Some("VK_KANA");
    t[0x16] = Some("VK_IME_ON");
    t[0x17] = Some("VK_JUNJA");
    t[0x18] = Some("VK_FINAL");
    t[0x19] = Some("VK_KANJI");
    t[0x1A] = Some("VK_IME_OFF");
    t[0x1B] = Some("VK_ESCAPE");
    t[0x1C] = Some("VK_CONVERT");
    t[0x1D] = Some("VK_NONCONVERT");
    t[0x1E] = Some("VK_ACCEPT");
    t[0x1F] = Some("VK_MODECHANGE");

    // ── Navigation ────────────────────────────────────────────────────────────
    t[0x20] = Some("VK_SPACE");
    t[0x21] = Some("VK_PRIOR");
    t[0x22] = Some("VK_NEXT");
    t[0x23] = Some("VK_END");
    t[0x24] = Some("VK_HOME");
    t[0x25] = Some("VK_LEFT");
    t[0x26] = Some("VK_UP");
    t[0x27] = Some("VK_RIGHT");
    t[0x28] = Some("VK_DOWN");
    t[0x29] = Some("VK_SELECT");
    t[0x2A] = Some("VK_PRINT");
    t[0x2B] = Some("VK_EXECUTE");
    t[0x2C] = Some("VK_SNAPSHOT");
    t[0x2D] = Some("VK_INSERT");
    t[0x2E] = Some("VK_DELETE");
    t[0x2F] = Some("VK_HELP");

    // ── Digit row (0x30–0x39) and letters (0x41–0x5A) ────────────────────────
    let mut i = 0;
    while i < DIGITS.len() {
        t[0x30 + i] = Some(DIGITS[i]);
        i += 1;
    }
    let mut i = 0;
    while i < LETTERS.len() {
        t[0x41 + i] = Some(LETTERS[i]);
        i += 1;
    }

    t[0x5B] = Some("VK_LWIN");
    t[0x5C] = Some("VK_RWIN");
    t[0x5D] = Some("VK_APPS");
    t[0x5F] = Some("VK_SLEEP");

    // ── Numpad (0x60–0x6F) ───────────────────────────────────────────────────
    let mut i = 0;
    while i < NUMPAD.len() {
        t[0x60 + i] = Some(NUMPAD[i]);
        i += 1;
    }
    t[0x6A] = Some("VK_MULTIPLY");
    t[0x6B] = Some("VK_ADD");
    t[0x6C] = Some("VK_SEPARATOR");
    t[0x6D] = Some("VK_SUBTRACT");
    t[0x6E] = Some("VK_DECIMAL");
    t[0x6F] = Some("VK_DIVIDE");

    // ── Function keys (VK_F1=0x70 … VK_F24=0x87) ─────────────────────────────
    let mut i = 0;
    while i < FUNCTION_KEYS.len() {
        t[0x70 + i] = Some(FUNCTION_KEYS[i]);
        i += 1;
    }

    t[0x90] = Some("VK_NUMLOCK");
    t[0x91] = Some("VK_SCROLL");

    // ── Left/right modifiers ──────────────────────────────────────────────────
    t[0xA0] = Some("VK_LSHIFT");
    t[0xA1] = Some("VK_RSHIFT");
    t[0xA2] = Some("VK_LCONTROL");
    t[0xA3] = Some("VK_RCONTROL");
    t[0xA4] = Some("VK_LMENU");
    t[0xA5] = Some("VK_RMENU");

    // ── Browser, volume and media keys ────────────────────────────────────────
    t[0xA6] = Some("VK_BROWSER_BACK");
    t[0xA7] = Some("VK_BROWSER_FORWARD");
    t[0xA8] = Some("VK_BROWSER_REFRESH");
    t[0xA9] = Some("VK_BROWSER_STOP");
    t[0xAA] = Some("VK_BROWSER_SEARCH");
    t[0xAB] = Some("VK_BROWSER_FAVORITES");
    t[0xAC] = Some("VK_BROWSER_HOME");
    t[0xAD] = Some("VK_VOLUME_MUTE");
    t[0xAE] = Some("VK_VOLUME_DOWN");
    t[0xAF] = Some("VK_VOLUME_UP");
    t[0xB0] = Some("VK_MEDIA_NEXT_TRACK");
    t[0xB1] = Some("VK_MEDIA_PREV_TRACK");
    t[0xB2] = Some("VK_MEDIA_STOP");
    t[0xB3] = Some("VK_MEDIA_PLAY_PAUSE");
    t[0xB4] = Some("VK_LAUNCH_MAIL");
    t[0xB5] = Some("VK_LAUNCH_MEDIA_SELECT");
    t[0xB6] = Some("VK_LAUNCH_APP1");
    t[0xB7] = Some("VK_LAUNCH_APP2");

    // ── OEM punctuation ───────────────────────────────────────────────────────
    t[0xBA] = Some("VK_OEM_1");      // ; :
    t[0xBB] = Some("VK_OEM_PLUS");   // = +
    t[0xBC] = Some("VK_OEM_COMMA");  // , <
    t[0xBD] = Some("VK_OEM_MINUS");  // - _
    t[0xBE] = Some("VK_OEM_PERIOD"); // . >
    t[0xBF] = Some("VK_OEM_2");      // / ?
    t[0xC0] = Some("VK_OEM_3");      // ` ~
    t[0xDB] = Some("VK_OEM_4");      // [ {
    t[0xDC] = Some("VK_OEM_5");      // \ |
    t[0xDD] = Some("VK_OEM_6");      // ] }
    t[0xDE] = Some("VK_OEM_7");      // ' "
    t[0xDF] = Some("VK_OEM_8");
    t[0xE2] = Some("VK_OEM_102");
    t[0xE5] = Some("VK_PROCESSKEY");
    t[0xE7] = Some("VK_PACKET");

    t[0xF6] = Some("VK_ATTN");
    t[0xF7] = Some("VK_CRSEL");
    t[0xF8] = Some("VK_EXSEL");
    t[0xF9] = Some("VK_EREOF");
    t[0xFA] = Some("VK_PLAY");
    t[0xFB] = Some("VK_ZOOM");
    t[0xFC] = Some("VK_NONAME");
    t[0xFD] = Some("VK_PA1");
    t[0xFE] = Some("VK_OEM_CLEAR");

    t
};

#[cfg(test)]
mod tests {
    use super::*;

    const KNOWN: &[(u8, &str)] = &[
        (0x08, "VK_BACK"),
        (0x0D, "VK_RETURN"),
        (0x1B, "VK_ESCAPE"),
        (0x20, "VK_SPACE"),
        (0x30, "VK_0"),
        (0x39, "VK_9"),
        (0x41, "VK_A"),
        (0x5A, "VK_Z"),
        (0x60, "VK_NUMPAD0"),
        (0x70, "VK_F1"),
        (0x87, "VK_F24"),
        (0xA0, "VK_LSHIFT"),
        (0xA5, "VK_RMENU"),
        (0xBA, "VK_OEM_1"),
        (0xFE, "VK_OEM_CLEAR"),
    ];

    #[test]
    fn test_known_codes_have_expected_names() {
        for &(vk, name) in KNOWN {
            assert_eq!(vk_name(vk), Some(name), "VK 0x{vk:02X}");
        }
    }

    #[test]
    fn test_reserved_codes_have_no_name() {
        for vk in [0x00u8, 0x07, 0x0A, 0x3A, 0x40, 0x5E, 0x88, 0xFF] {
            assert_eq!(vk_name(vk), None, "VK 0x{vk:02X} should be unassigned");
        }
    }

    #[test]
    fn test_assigned_names_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for vk in 0u8..=255 {
            if let Some(name) = vk_name(vk) {
                assert!(seen.insert(name), "{name} is assigned to more than one code");
            }
        }
    }
}

//! Low-level keyboard hook event decoding.
//!
//! A `WH_KEYBOARD_LL` hook procedure receives three arguments: a hook code,
//! a `w_param` naming the keyboard message, and an `l_param` pointing at a
//! `KBDLLHOOKSTRUCT`.  This module gives those values names and types without
//! touching the OS.
//!
//! Reference: <https://learn.microsoft.com/windows/win32/winmsg/lowlevelkeyboardproc>

/// The hook procedure may process the event.  Negative codes must be
/// forwarded untouched.
pub const HC_ACTION: i32 = 0;

/// Hook type selecting low-level keyboard monitoring.
pub const WH_KEYBOARD_LL: i32 = 13;

/// A non-system key was pressed (ALT not held).
pub const WM_KEYDOWN: u32 = 0x0100;
pub const WM_KEYUP: u32 = 0x0101;
/// A key was pressed while ALT was held, or F10.
pub const WM_SYSKEYDOWN: u32 = 0x0104;
pub const WM_SYSKEYUP: u32 = 0x0105;

/// `KBDLLHOOKSTRUCT.flags` bits.
pub const LLKHF_EXTENDED: u32 = 0x01;
pub const LLKHF_LOWER_IL_INJECTED: u32 = 0x02;
pub const LLKHF_INJECTED: u32 = 0x10;
pub const LLKHF_ALTDOWN: u32 = 0x20;

/// Keyboard message carried in the hook's `w_param`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookMessage {
    KeyDown,
    KeyUp,
    SysKeyDown,
    SysKeyUp,
    /// Any other message value, kept for logging.
    Other(u32),
}

impl HookMessage {
    /// Decodes a hook `w_param`.
    pub fn from_w_param(w_param: usize) -> Self {
        match u32::try_from(w_param) {
            Ok(WM_KEYDOWN) => Self::KeyDown,
            Ok(WM_KEYUP) => Self::KeyUp,
            Ok(WM_SYSKEYDOWN) => Self::SysKeyDown,
            Ok(WM_SYSKEYUP) => Self::SysKeyUp,
            Ok(other) => Self::Other(other),
            Err(_) => Self::Other(u32::MAX),
        }
    }

    /// Returns the message value to pass as `w_param`.
    pub fn to_w_param(self) -> usize {
        let msg = match self {
            Self::KeyDown => WM_KEYDOWN,
            Self::KeyUp => WM_KEYUP,
            Self::SysKeyDown => WM_SYSKEYDOWN,
            Self::SysKeyUp => WM_SYSKEYUP,
            Self::Other(msg) => msg,
        };
        msg as usize
    }

    /// `true` for key presses.  System key presses only count when
    /// `include_system_keys` is set.
    pub fn is_press(self, include_system_keys: bool) -> bool {
        match self {
            Self::KeyDown => true,
            Self::SysKeyDown => include_system_keys,
            _ => false,
        }
    }
}

/// Mirror of `KBDLLHOOKSTRUCT`.
///
/// The layout matches the Win32 struct field for field so a hook's `l_param`
/// can be read as a `*const RawKeyEvent`.  The pointee is only valid while the
/// hook procedure runs; callers copy it out before returning.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawKeyEvent {
    /// Virtual key code, 1–254.
    pub vk_code: u32,
    /// Hardware scan code.
    pub scan_code: u32,
    /// `LLKHF_*` bits.
    pub flags: u32,
    /// Milliseconds since system start.
    pub time: u32,
    /// `dwExtraInfo`, set by the injecting application for synthetic input.
    pub extra_info: usize,
}

impl RawKeyEvent {
    /// Builds an event carrying only a virtual key code.
    pub fn with_vk(vk_code: u32) -> Self {
        Self {
            vk_code,
            ..Self::default()
        }
    }

    /// Reads the event behind a hook `l_param`.
    ///
    /// Returns `None` for a null pointer.
    ///
    /// # Safety
    ///
    /// A non-zero `l_param` must point to a live, aligned `KBDLLHOOKSTRUCT`
    /// for the duration of this call (true inside a `WH_KEYBOARD_LL` hook
    /// procedure when the hook code is `HC_ACTION`).
    pub unsafe fn from_l_param(l_param: isize) -> Option<Self> {
        let ptr = l_param as *const RawKeyEvent;
        if ptr.is_null() {
            return None;
        }
        // SAFETY: caller guarantees ptr points to a valid KBDLLHOOKSTRUCT.
        Some(unsafe { *ptr })
    }

    /// Returns the address of this event as a hook `l_param`.
    pub fn as_l_param(&self) -> isize {
        self as *const RawKeyEvent as isize
    }

    /// `true` for extended keys (right-hand modifiers, numpad Enter, arrows).
    pub fn is_extended(&self) -> bool {
        self.flags & LLKHF_EXTENDED != 0
    }

    /// `true` if the event was injected by `SendInput` or similar.
    pub fn is_injected(&self) -> bool {
        self.flags & (LLKHF_INJECTED | LLKHF_LOWER_IL_INJECTED) != 0
    }

    /// `true` if ALT was held.
    pub fn is_alt_down(&self) -> bool {
        self.flags & LLKHF_ALTDOWN != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_w_param_decodes_keyboard_messages() {
        assert_eq!(HookMessage::from_w_param(0x0100), HookMessage::KeyDown);
        assert_eq!(HookMessage::from_w_param(0x0101), HookMessage::KeyUp);
        assert_eq!(HookMessage::from_w_param(0x0104), HookMessage::SysKeyDown);
        assert_eq!(HookMessage::from_w_param(0x0105), HookMessage::SysKeyUp);
        assert_eq!(HookMessage::from_w_param(0x0200), HookMessage::Other(0x0200));
    }

    #[test]
    fn test_to_w_param_inverts_from_w_param() {
        for msg in [
            HookMessage::KeyDown,
            HookMessage::KeyUp,
            HookMessage::SysKeyDown,
            HookMessage::SysKeyUp,
            HookMessage::Other(0x0113),
        ] {
            assert_eq!(HookMessage::from_w_param(msg.to_w_param()), msg);
        }
    }

    #[test]
    fn test_only_key_down_is_a_press_by_default() {
        assert!(HookMessage::KeyDown.is_press(false));
        assert!(!HookMessage::SysKeyDown.is_press(false));
        assert!(!HookMessage::KeyUp.is_press(false));
        assert!(!HookMessage::SysKeyUp.is_press(false));
        assert!(!HookMessage::Other(0).is_press(false));
    }

    #[test]
    fn test_system_key_down_is_a_press_when_enabled() {
        assert!(HookMessage::SysKeyDown.is_press(true));
        assert!(!HookMessage::SysKeyUp.is_press(true));
    }

    #[test]
    fn test_from_l_param_copies_the_event() {
        // Arrange
        let event = RawKeyEvent {
            vk_code: 0x41,
            scan_code: 0x1E,
            flags: LLKHF_INJECTED,
            time: 1234,
            extra_info: 7,
        };

        // Act
        let copied = unsafe { RawKeyEvent::from_l_param(event.as_l_param()) };

        // Assert
        assert_eq!(copied, Some(event));
    }

    #[test]
    fn test_from_l_param_rejects_null() {
        assert_eq!(unsafe { RawKeyEvent::from_l_param(0) }, None);
    }

    #[test]
    fn test_flag_helpers() {
        let mut event = RawKeyEvent::with_vk(0x0D);
        assert!(!event.is_extended());
        assert!(!event.is_injected());

        event.flags = LLKHF_EXTENDED | LLKHF_ALTDOWN;
        assert!(event.is_extended());
        assert!(event.is_alt_down());
        assert!(!event.is_injected());

        event.flags = LLKHF_LOWER_IL_INJECTED;
        assert!(event.is_injected());
    }

    #[test]
    fn test_layout_matches_kbdllhookstruct() {
        // Four DWORDs followed by a ULONG_PTR.
        let expected = 4 * std::mem::size_of::<u32>() + std::mem::size_of::<usize>();
        assert_eq!(std::mem::size_of::<RawKeyEvent>(), expected);
        assert_eq!(std::mem::align_of::<RawKeyEvent>(), std::mem::align_of::<usize>());
    }
}

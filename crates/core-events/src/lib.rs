//! Core event types and channel sizing for panekit.
//!
//! Everything the compositor consumes from the outside world is expressed as an
//! [`Event`]: key presses, mouse clicks, terminal resizes and fatal input errors.
//! Producers (the terminal reader thread, tests feeding scripted input) build
//! these values; the compositor loop is the only consumer.
//!
//! A key press carries a [`KeyCode`], which is either a symbolic [`Key`] or a
//! literal rune. Keybindings use the same type as their trigger so a binding can
//! never name a key and a rune at once.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::AtomicU64;

mod key_name;
pub use key_name::ParseKeyError;

// -------------------------------------------------------------------------------------------------
// Channel Policy
// -------------------------------------------------------------------------------------------------
// Both queues feeding the compositor loop are bounded. Producers block when a queue is full rather
// than dropping events: input fidelity matters more than producer latency, and every producer runs
// on its own thread so a blocked send never stalls the consumer.
// -------------------------------------------------------------------------------------------------
pub const INPUT_CHANNEL_CAP: usize = 20;
pub const UPDATE_CHANNEL_CAP: usize = 20;

// -------------------------------------------------------------------------------------------------
// Telemetry
// -------------------------------------------------------------------------------------------------
// Relaxed atomic counters. Inspected by tests and logged on loop shutdown.
// -------------------------------------------------------------------------------------------------
pub static INPUT_EVENTS_FORWARDED: AtomicU64 = AtomicU64::new(0);
pub static INPUT_SEND_FAILURES: AtomicU64 = AtomicU64::new(0);
pub static UPDATES_SCHEDULED: AtomicU64 = AtomicU64::new(0);
pub static UPDATES_EXECUTED: AtomicU64 = AtomicU64::new(0);

/// Top-level event produced by an input source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// Terminal resize (columns, rows).
    Resize(u16, u16),
    /// The input source failed; fatal to the loop that receives it.
    Error(String),
}

impl Event {
    /// Convenience constructor for an unmodified key or rune press.
    pub fn key(code: impl Into<KeyCode>) -> Self {
        Event::Key(KeyEvent::new(code, Modifier::empty()))
    }

    /// Convenience constructor for a mouse event at terminal cell `(x, y)`.
    pub fn mouse(key: Key, x: u16, y: u16) -> Self {
        Event::Mouse(MouseEvent {
            key,
            x,
            y,
            mods: Modifier::empty(),
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Event::Key(_) => "key",
            Event::Mouse(_) => "mouse",
            Event::Resize(..) => "resize",
            Event::Error(_) => "error",
        }
    }
}

bitflags::bitflags! {
    /// Modifier mask attached to key and mouse events.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Modifier: u8 {
        const ALT = 0b0000_0001;
    }
}

/// Symbolic (non-printable) keys, including mouse buttons which are routed
/// through keybindings the same way keys are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Enter,
    Tab,
    BackTab,
    Backspace,
    Esc,
    Space,
    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    F(u8),
    /// Control chord with a lowercase ASCII letter (`Ctrl('c')` is `C-c`).
    Ctrl(char),
    MouseLeft,
    MouseMiddle,
    MouseRight,
    MouseRelease,
    MouseWheelUp,
    MouseWheelDown,
}

impl Key {
    pub fn is_mouse(&self) -> bool {
        matches!(
            self,
            Key::MouseLeft
                | Key::MouseMiddle
                | Key::MouseRight
                | Key::MouseRelease
                | Key::MouseWheelUp
                | Key::MouseWheelDown
        )
    }
}

/// Normalized trigger: exactly one of a symbolic key or a literal rune.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Key(Key),
    Char(char),
}

impl KeyCode {
    pub fn as_char(&self) -> Option<char> {
        match self {
            KeyCode::Char(c) => Some(*c),
            KeyCode::Key(_) => None,
        }
    }

    pub fn as_key(&self) -> Option<Key> {
        match self {
            KeyCode::Key(k) => Some(*k),
            KeyCode::Char(_) => None,
        }
    }
}

impl From<Key> for KeyCode {
    fn from(key: Key) -> Self {
        KeyCode::Key(key)
    }
}

impl From<char> for KeyCode {
    fn from(ch: char) -> Self {
        KeyCode::Char(ch)
    }
}

impl FromStr for KeyCode {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        key_name::parse(s)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyCode::Char(c) => write!(f, "{c}"),
            KeyCode::Key(k) => f.write_str(&key_name::name(*k)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub mods: Modifier,
}

impl KeyEvent {
    pub fn new(code: impl Into<KeyCode>, mods: Modifier) -> Self {
        Self {
            code: code.into(),
            mods,
        }
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mods.contains(Modifier::ALT) {
            write!(f, "M-{}", self.code)
        } else {
            write!(f, "{}", self.code)
        }
    }
}

/// Mouse event at an absolute terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseEvent {
    /// One of the `Key::Mouse*` variants.
    pub key: Key,
    pub x: u16,
    pub y: u16,
    pub mods: Modifier,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn key_event_display() {
        let k = KeyEvent::new(Key::Ctrl('x'), Modifier::empty());
        assert_eq!(k.to_string(), "C-x");
        let alt = KeyEvent::new('f', Modifier::ALT);
        assert_eq!(alt.to_string(), "M-f");
    }

    #[test]
    fn key_code_conversions_are_exclusive() {
        let rune: KeyCode = 'q'.into();
        assert_eq!(rune.as_char(), Some('q'));
        assert_eq!(rune.as_key(), None);
        let key: KeyCode = Key::Enter.into();
        assert_eq!(key.as_key(), Some(Key::Enter));
        assert_eq!(key.as_char(), None);
    }

    #[test]
    fn mouse_keys_flagged() {
        assert!(Key::MouseLeft.is_mouse());
        assert!(Key::MouseWheelDown.is_mouse());
        assert!(!Key::Enter.is_mouse());
    }

    #[test]
    fn event_constructors() {
        assert_eq!(
            Event::key('a'),
            Event::Key(KeyEvent {
                code: KeyCode::Char('a'),
                mods: Modifier::empty()
            })
        );
        assert_eq!(Event::mouse(Key::MouseLeft, 3, 4).kind(), "mouse");
        assert_eq!(Event::Resize(80, 24).kind(), "resize");
    }
}

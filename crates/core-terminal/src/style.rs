//! Cell colors, text attributes and terminal modes.

use std::fmt;

/// Terminal palette color. `Default` defers to the terminal (or, for buffer
/// cells, to the owning view's colors).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    #[default]
    Default,
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    /// 256-color palette index; only honored in [`OutputMode::Color256`].
    Indexed(u8),
}

impl Color {
    const BASIC: [Color; 8] = [
        Color::Black,
        Color::Red,
        Color::Green,
        Color::Yellow,
        Color::Blue,
        Color::Magenta,
        Color::Cyan,
        Color::White,
    ];

    /// Basic palette color for ANSI offset `n` (0 = black .. 7 = white).
    pub fn basic(n: u8) -> Option<Color> {
        Self::BASIC.get(n as usize).copied()
    }

    pub fn from_name(name: &str) -> Option<Color> {
        let c = match name.to_ascii_lowercase().as_str() {
            "default" => Color::Default,
            "black" => Color::Black,
            "red" => Color::Red,
            "green" => Color::Green,
            "yellow" => Color::Yellow,
            "blue" => Color::Blue,
            "magenta" => Color::Magenta,
            "cyan" => Color::Cyan,
            "white" => Color::White,
            _ => return None,
        };
        Some(c)
    }
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct AttrFlags: u8 {
        const BOLD      = 0b0000_0001;
        const UNDERLINE = 0b0000_0010;
        const REVERSE   = 0b0000_0100;
    }
}

/// A color plus text attributes; used for both foreground and background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Attribute {
    pub color: Color,
    pub flags: AttrFlags,
}

impl Attribute {
    pub const DEFAULT: Attribute = Attribute {
        color: Color::Default,
        flags: AttrFlags::empty(),
    };

    pub const fn new(color: Color) -> Self {
        Self {
            color,
            flags: AttrFlags::empty(),
        }
    }

    pub fn with(mut self, flags: AttrFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn is_default(&self) -> bool {
        *self == Self::DEFAULT
    }
}

impl Default for Attribute {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<Color> for Attribute {
    fn from(color: Color) -> Self {
        Attribute::new(color)
    }
}

/// Number of colors the terminal is driven with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// 8 basic colors.
    #[default]
    Normal,
    /// 256-color palette.
    Color256,
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Normal => f.write_str("normal"),
            OutputMode::Color256 => f.write_str("256"),
        }
    }
}

bitflags::bitflags! {
    /// Input decoding flags handed to the surface when the loop starts.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct InputMode: u8 {
        /// A lone ESC is the Escape key.
        const ESC   = 0b0000_0001;
        /// ESC followed by a key is that key with the Alt modifier.
        const ALT   = 0b0000_0010;
        /// Report mouse events.
        const MOUSE = 0b0000_0100;
    }
}

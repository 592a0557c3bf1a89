//! Textual key names used by config files and string keybindings.
//!
//! Grammar: a single rune (`q`, `?`), a named key (`Enter`, `PgUp`, `F5`,
//! `MouseLeft`), or a control chord `C-<letter>`. Names are case-insensitive;
//! single runes are taken literally.

use crate::{Key, KeyCode};
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported key trigger: {0:?}")]
pub struct ParseKeyError(pub String);

const NAMED: &[(&str, Key)] = &[
    ("enter", Key::Enter),
    ("tab", Key::Tab),
    ("backtab", Key::BackTab),
    ("backspace", Key::Backspace),
    ("esc", Key::Esc),
    ("space", Key::Space),
    ("insert", Key::Insert),
    ("delete", Key::Delete),
    ("home", Key::Home),
    ("end", Key::End),
    ("pgup", Key::PageUp),
    ("pgdn", Key::PageDown),
    ("up", Key::Up),
    ("down", Key::Down),
    ("left", Key::Left),
    ("right", Key::Right),
    ("mouseleft", Key::MouseLeft),
    ("mousemiddle", Key::MouseMiddle),
    ("mouseright", Key::MouseRight),
    ("mouserelease", Key::MouseRelease),
    ("wheelup", Key::MouseWheelUp),
    ("wheeldown", Key::MouseWheelDown),
];

pub(crate) fn parse(s: &str) -> Result<KeyCode, ParseKeyError> {
    let mut chars = s.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(KeyCode::Char(c));
    }

    let lower = s.to_ascii_lowercase();
    if let Some((_, key)) = NAMED.iter().find(|(name, _)| *name == lower) {
        return Ok(KeyCode::Key(*key));
    }
    if let Some(rest) = lower.strip_prefix("c-") {
        let mut it = rest.chars();
        if let (Some(c), None) = (it.next(), it.next())
            && c.is_ascii_lowercase()
        {
            return Ok(KeyCode::Key(Key::Ctrl(c)));
        }
    }
    if let Some(num) = lower.strip_prefix('f')
        && let Ok(n) = num.parse::<u8>()
        && (1..=12).contains(&n)
    {
        return Ok(KeyCode::Key(Key::F(n)));
    }

    trace!(target: "input.keys", len = s.len(), "unsupported_key_name");
    Err(ParseKeyError(s.to_string()))
}

pub(crate) fn name(key: Key) -> String {
    match key {
        Key::Ctrl(c) => format!("C-{c}"),
        Key::F(n) => format!("F{n}"),
        Key::Enter => "Enter".into(),
        Key::Tab => "Tab".into(),
        Key::BackTab => "BackTab".into(),
        Key::Backspace => "Backspace".into(),
        Key::Esc => "Esc".into(),
        Key::Space => "Space".into(),
        Key::Insert => "Insert".into(),
        Key::Delete => "Delete".into(),
        Key::Home => "Home".into(),
        Key::End => "End".into(),
        Key::PageUp => "PgUp".into(),
        Key::PageDown => "PgDn".into(),
        Key::Up => "Up".into(),
        Key::Down => "Down".into(),
        Key::Left => "Left".into(),
        Key::Right => "Right".into(),
        Key::MouseLeft => "MouseLeft".into(),
        Key::MouseMiddle => "MouseMiddle".into(),
        Key::MouseRight => "MouseRight".into(),
        Key::MouseRelease => "MouseRelease".into(),
        Key::MouseWheelUp => "WheelUp".into(),
        Key::MouseWheelDown => "WheelDown".into(),
    }
}

use crate::EventSource;
use core_events::{Event, Key, KeyCode, KeyEvent, Modifier, MouseEvent};
use core_terminal::InputMode;
use crossterm::event::{
    self, Event as CEvent, KeyCode as CKeyCode, KeyEvent as CKeyEvent, KeyEventKind as CKind,
    KeyModifiers as CMods, MouseButton, MouseEvent as CMouseEvent, MouseEventKind,
};
use std::collections::VecDeque;
use tracing::{trace, warn};

/// Reads the controlling terminal through `crossterm::event::read`.
///
/// With [`InputMode::ALT`] unset, an Alt chord is split into a bare `Esc`
/// followed by the unmodified key.
pub struct CrosstermEventSource {
    alt_chords: bool,
    pending: VecDeque<Event>,
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        Self {
            alt_chords: true,
            pending: VecDeque::new(),
        }
    }
}

impl EventSource for CrosstermEventSource {
    fn poll_event(&mut self) -> Event {
        if let Some(ev) = self.pending.pop_front() {
            return ev;
        }
        loop {
            let raw = match event::read() {
                Ok(raw) => raw,
                Err(err) => {
                    warn!(target: "input.thread", kind = ?err.kind(), "read_failed");
                    return Event::Error(err.to_string());
                }
            };
            let Some(ev) = map_event(raw) else {
                continue;
            };
            if !self.alt_chords
                && let Event::Key(key) = ev
                && key.mods.contains(Modifier::ALT)
            {
                self.pending.push_back(Event::Key(KeyEvent::new(
                    key.code,
                    key.mods - Modifier::ALT,
                )));
                return Event::key(Key::Esc);
            }
            return ev;
        }
    }

    fn set_input_mode(&mut self, mode: InputMode) {
        self.alt_chords = mode.contains(InputMode::ALT);
    }
}

/// Translate a crossterm event. Returns `None` for events the compositor has
/// no use for (key releases, focus changes, mouse motion, unsupported keys).
pub fn map_event(raw: CEvent) -> Option<Event> {
    match raw {
        CEvent::Key(key) => map_key(&key).map(Event::Key),
        CEvent::Mouse(mouse) => map_mouse(&mouse).map(Event::Mouse),
        CEvent::Resize(w, h) => Some(Event::Resize(w, h)),
        other => {
            let kind = match other {
                CEvent::Paste(_) => "paste",
                CEvent::FocusGained | CEvent::FocusLost => "focus",
                _ => "other",
            };
            trace!(target: "input.event", kind, "ignored");
            None
        }
    }
}

fn map_key(key: &CKeyEvent) -> Option<KeyEvent> {
    if matches!(key.kind, CKind::Release) {
        return None;
    }
    let mods = map_mods(key.modifiers);
    let code: KeyCode = match key.code {
        CKeyCode::Char(' ') => Key::Space.into(),
        CKeyCode::Char(c) if key.modifiers.contains(CMods::CONTROL) && c.is_ascii_alphabetic() => {
            Key::Ctrl(c.to_ascii_lowercase()).into()
        }
        CKeyCode::Char(c) => c.into(),
        CKeyCode::Enter => Key::Enter.into(),
        CKeyCode::Tab => Key::Tab.into(),
        CKeyCode::BackTab => Key::BackTab.into(),
        CKeyCode::Backspace => Key::Backspace.into(),
        CKeyCode::Esc => Key::Esc.into(),
        CKeyCode::Insert => Key::Insert.into(),
        CKeyCode::Delete => Key::Delete.into(),
        CKeyCode::Home => Key::Home.into(),
        CKeyCode::End => Key::End.into(),
        CKeyCode::PageUp => Key::PageUp.into(),
        CKeyCode::PageDown => Key::PageDown.into(),
        CKeyCode::Up => Key::Up.into(),
        CKeyCode::Down => Key::Down.into(),
        CKeyCode::Left => Key::Left.into(),
        CKeyCode::Right => Key::Right.into(),
        CKeyCode::F(n) if (1..=12).contains(&n) => Key::F(n).into(),
        _ => return None,
    };
    Some(KeyEvent { code, mods })
}

fn map_mouse(mouse: &CMouseEvent) -> Option<MouseEvent> {
    let key = match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => Key::MouseLeft,
        MouseEventKind::Down(MouseButton::Middle) => Key::MouseMiddle,
        MouseEventKind::Down(MouseButton::Right) => Key::MouseRight,
        MouseEventKind::Up(_) => Key::MouseRelease,
        MouseEventKind::ScrollUp => Key::MouseWheelUp,
        MouseEventKind::ScrollDown => Key::MouseWheelDown,
        _ => return None,
    };
    Some(MouseEvent {
        key,
        x: mouse.column,
        y: mouse.row,
        mods: map_mods(mouse.modifiers),
    })
}

pub(crate) fn map_mods(m: CMods) -> Modifier {
    let mut out = Modifier::empty();
    if m.contains(CMods::ALT) {
        out |= Modifier::ALT;
    }
    out
}

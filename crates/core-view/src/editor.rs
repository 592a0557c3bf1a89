use crate::View;
use core_events::{Key, KeyCode, Modifier};

/// Turns a key press into edits on an editable view.
pub trait Editor {
    fn edit(&self, view: &mut View, code: KeyCode, mods: Modifier);
}

impl<F> Editor for F
where
    F: Fn(&mut View, KeyCode, Modifier),
{
    fn edit(&self, view: &mut View, code: KeyCode, mods: Modifier) {
        self(view, code, mods)
    }
}

/// Minimal line editor: typing, deletion, newlines, arrow navigation and
/// an Insert-key overwrite toggle.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultEditor;

impl Editor for DefaultEditor {
    fn edit(&self, view: &mut View, code: KeyCode, mods: Modifier) {
        match code {
            KeyCode::Char(ch) if mods.is_empty() => view.edit_write(ch),
            KeyCode::Char(_) => {}
            KeyCode::Key(key) => match key {
                Key::Space => view.edit_write(' '),
                Key::Backspace => view.edit_delete(true),
                Key::Delete => view.edit_delete(false),
                Key::Insert => view.set_overwrite(!view.overwrite()),
                Key::Enter => view.edit_newline(),
                Key::Down => view.move_cursor(0, 1, false),
                Key::Up => view.move_cursor(0, -1, false),
                Key::Left => view.move_cursor(-1, 0, false),
                Key::Right => view.move_cursor(1, 0, false),
                _ => {}
            },
        }
    }
}

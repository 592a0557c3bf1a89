//! Demo layout: a pane list and an editor side by side, a log underneath and
//! a frameless clock drawn over the editor's top edge.

use core_events::{Key, KeyCode, Modifier};
use core_gui::{Gui, GuiError, GuiResult, Manager, ViewSlot};
use core_terminal::Color;
use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

pub const PANES: &str = "panes";
pub const EDITOR: &str = "editor";
pub const LOG: &str = "log";
pub const CLOCK: &str = "clock";

/// Views Tab cycles through.
const FOCUS_RING: [&str; 3] = [PANES, EDITOR, LOG];

const LOG_ROWS: i32 = 4;
const CLOCK_WIDTH: i32 = 10;

pub struct DemoLayout;

impl Manager for DemoLayout {
    fn layout(&self, gui: &mut Gui) -> GuiResult<()> {
        let (w, h) = gui.size();
        let split = (w / 4).max(10);
        let bottom = (h - LOG_ROWS - 1).max(3);

        if let ViewSlot::New(v) = gui.set_view(PANES, 0, 0, split - 1, bottom)? {
            v.set_title("Panes");
            v.set_highlight(true);
            v.set_sel_bg(Color::Blue);
            writeln!(v, "{EDITOR}\n{LOG}\nhelp").map_err(anyhow::Error::from)?;
        }
        if let ViewSlot::New(v) = gui.set_view(EDITOR, split, 0, w - 1, bottom)? {
            v.set_title("Editor");
            v.set_editable(true);
            v.set_wrap(true);
        }
        if let ViewSlot::New(v) = gui.set_view(LOG, 0, bottom + 1, w - 1, h - 1)? {
            v.set_title("Log");
            v.set_autoscroll(true);
        }
        if let ViewSlot::New(v) = gui.set_view(CLOCK, w - CLOCK_WIDTH - 2, -1, w - 1, 1)? {
            v.set_frame(false);
        }

        if gui.current_view().is_none() {
            gui.set_current_view(EDITOR)?;
        }
        Ok(())
    }
}

/// Append one line to the log pane.
pub fn log_line(gui: &mut Gui, line: &str) -> GuiResult<()> {
    writeln!(gui.view_mut(LOG)?, "{line}").map_err(anyhow::Error::from)?;
    Ok(())
}

fn focus(gui: &mut Gui, name: &str) -> GuiResult<()> {
    gui.set_current_view(name)?;
    log_line(gui, &format!("focus -> {name}"))
}

fn next_view(gui: &mut Gui, _view: Option<&str>) -> GuiResult<()> {
    let current = gui.current_view().map(|v| v.name().to_string());
    let idx = FOCUS_RING
        .iter()
        .position(|n| Some(*n) == current.as_deref())
        .map_or(0, |i| (i + 1) % FOCUS_RING.len());
    focus(gui, FOCUS_RING[idx])
}

fn click_focus(gui: &mut Gui, view: Option<&str>) -> GuiResult<()> {
    let Some(name) = view else {
        return Ok(());
    };
    if name == CLOCK {
        return Ok(());
    }
    let name = name.to_string();
    focus(gui, &name)
}

/// Enter on the pane list focuses the named pane.
fn open_pane(gui: &mut Gui, _view: Option<&str>) -> GuiResult<()> {
    let panes = gui.view_mut(PANES)?;
    let (_, cy) = panes.cursor();
    let name = panes.line(cy)?.trim().to_string();
    if gui.view(&name).is_ok() {
        focus(gui, &name)
    } else {
        log_line(gui, &format!("no pane named {name:?}"))
    }
}

fn move_selection(dy: i32) -> impl Fn(&mut Gui, Option<&str>) -> GuiResult<()> {
    move |gui, _| {
        gui.view_mut(PANES)?.move_cursor(0, dy, false);
        Ok(())
    }
}

fn clear_log(gui: &mut Gui, _view: Option<&str>) -> GuiResult<()> {
    gui.view_mut(LOG)?.clear();
    Ok(())
}

/// Install the layout and its keybindings.
pub fn install(gui: &mut Gui, quit: KeyCode) {
    gui.set_manager(vec![Box::new(DemoLayout)]);
    let none = Modifier::empty();
    gui.set_keybinding("", quit, none, |_, _| Err(GuiError::Quit));
    gui.set_keybinding("", Key::Tab, none, next_view);
    gui.set_keybinding("", Key::MouseLeft, none, click_focus);
    gui.set_keybinding("", Key::Ctrl('l'), none, clear_log);
    gui.set_keybinding(PANES, Key::Enter, none, open_pane);
    gui.set_keybinding(PANES, Key::Up, none, move_selection(-1));
    gui.set_keybinding(PANES, Key::Down, none, move_selection(1));
    debug!(target: "runtime", bindings = gui.keybinding_count(), "demo_installed");
}

pub fn format_elapsed(elapsed: Duration) -> String {
    let s = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", s / 3600, (s / 60) % 60, s % 60)
}

/// Refresh the clock once a second from a background thread.
pub fn spawn_clock(gui: &Gui) -> std::io::Result<()> {
    let handle = gui.update_handle();
    let started = Instant::now();
    thread::Builder::new()
        .name("panekit-clock".into())
        .spawn(move || {
            loop {
                thread::sleep(Duration::from_secs(1));
                let text = format_elapsed(started.elapsed());
                handle.update(move |g| {
                    let clock = g.view_mut(CLOCK)?;
                    clock.clear();
                    write!(clock, "{text}").map_err(anyhow::Error::from)?;
                    Ok(())
                });
            }
        })?;
    Ok(())
}

//! core-gui: the view compositor and its event loop.
//!
//! A [`Gui`] owns the z-ordered view stack, the focus pointer, the layout
//! managers, the keybinding table and the toggles object. Everything is
//! mutated on the thread that runs [`Gui::main_loop`]; the only cross-thread
//! traffic is the two bounded queues feeding it (input events and scheduled
//! updates).
//!
//! Invariants:
//! * View names are unique; `views` order is z-order (last = topmost).
//! * Focus is held by name and always names a view in the stack (or none).
//! * Views are addressed by name, never by retained reference; handlers and
//!   managers receive `&mut Gui` and look up what they need.
//! * Switching managers is a hard reset: views, focus and bindings go.

use core_config::GuiOptions;
use core_events::{Event, INPUT_CHANNEL_CAP, KeyCode, Modifier, UPDATE_CHANNEL_CAP};
use core_input::{CrosstermEventSource, EventSource};
use core_keymap::KeybindingTable;
use core_terminal::{Attribute, CrosstermSurface, InputMode, OutputMode, Surface};
use core_view::View;
use crossbeam_channel::{Receiver, Sender, bounded};
use std::rc::Rc;
use std::thread;
use tracing::{debug, info, warn};

mod error;
mod event_loop;
mod render;

pub use error::{GuiError, GuiResult};
pub use event_loop::UpdateHandle;

/// Keybinding callback; receives the compositor and the target view's name.
pub type Handler = Rc<dyn Fn(&mut Gui, Option<&str>) -> GuiResult<()>>;

pub(crate) type UpdateFn = Box<dyn FnOnce(&mut Gui) -> GuiResult<()> + Send>;

/// Builds or refreshes the layout; run once per frame before drawing.
pub trait Manager {
    fn layout(&self, gui: &mut Gui) -> GuiResult<()>;
}

impl<F> Manager for F
where
    F: Fn(&mut Gui) -> GuiResult<()>,
{
    fn layout(&self, gui: &mut Gui) -> GuiResult<()> {
        self(gui)
    }
}

/// Outcome of [`Gui::set_view`]: `New` signals first-time creation.
#[derive(Debug)]
pub enum ViewSlot<'a> {
    New(&'a mut View),
    Existing(&'a mut View),
}

impl<'a> ViewSlot<'a> {
    pub fn is_new(&self) -> bool {
        matches!(self, ViewSlot::New(_))
    }

    pub fn into_view(self) -> &'a mut View {
        match self {
            ViewSlot::New(v) | ViewSlot::Existing(v) => v,
        }
    }
}

pub struct Gui {
    surface: Box<dyn Surface>,
    source: Option<Box<dyn EventSource>>,
    input_tx: Sender<Event>,
    input_rx: Receiver<Event>,
    update_tx: Sender<UpdateFn>,
    update_rx: Receiver<UpdateFn>,

    views: Vec<View>,
    current: Option<String>,
    managers: Vec<Rc<dyn Manager>>,
    keybindings: KeybindingTable<Handler>,

    options: GuiOptions,
    max_x: i32,
    max_y: i32,
}

impl Gui {
    pub fn new<S, E>(surface: S, source: E) -> Self
    where
        S: Surface + 'static,
        E: EventSource,
    {
        Self::with_options(surface, source, GuiOptions::default())
    }

    pub fn with_options<S, E>(surface: S, source: E, options: GuiOptions) -> Self
    where
        S: Surface + 'static,
        E: EventSource,
    {
        let (input_tx, input_rx) = bounded(INPUT_CHANNEL_CAP);
        let (update_tx, update_rx) = bounded(UPDATE_CHANNEL_CAP);
        let (max_x, max_y) = surface.size();
        Self {
            surface: Box::new(surface),
            source: Some(Box::new(source)),
            input_tx,
            input_rx,
            update_tx,
            update_rx,
            views: Vec::new(),
            current: None,
            managers: Vec::new(),
            keybindings: KeybindingTable::new(),
            options,
            max_x,
            max_y,
        }
    }

    /// Compositor on the real terminal. The terminal is restored when the
    /// `Gui` is dropped.
    pub fn crossterm(options: GuiOptions) -> GuiResult<Self> {
        let surface = CrosstermSurface::new(options.output)?;
        Ok(Self::with_options(surface, CrosstermEventSource::new(), options))
    }

    /// Terminal size as of the last frame.
    pub fn size(&self) -> (i32, i32) {
        (self.max_x, self.max_y)
    }

    // ---------------------------------------------------------------------------------------------
    // Toggles
    // ---------------------------------------------------------------------------------------------

    pub fn options(&self) -> &GuiOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: GuiOptions) {
        self.options = options;
    }

    pub fn output_mode(&self) -> OutputMode {
        self.options.output
    }

    pub fn bg_fg_color(&self) -> (Attribute, Attribute) {
        (self.options.bg, self.options.fg)
    }

    pub fn set_bg_fg_color(&mut self, bg: impl Into<Attribute>, fg: impl Into<Attribute>) {
        self.options.bg = bg.into();
        self.options.fg = fg.into();
    }

    pub fn sel_bg_fg_color(&self) -> (Attribute, Attribute) {
        (self.options.sel_bg, self.options.sel_fg)
    }

    pub fn set_sel_bg_fg_color(&mut self, bg: impl Into<Attribute>, fg: impl Into<Attribute>) {
        self.options.sel_bg = bg.into();
        self.options.sel_fg = fg.into();
    }

    pub fn highlight(&self) -> bool {
        self.options.highlight
    }

    pub fn set_highlight(&mut self, on: bool) {
        self.options.highlight = on;
    }

    pub fn cursor(&self) -> bool {
        self.options.cursor
    }

    pub fn set_cursor(&mut self, on: bool) {
        self.options.cursor = on;
    }

    pub fn mouse_events_enabled(&self) -> bool {
        self.options.mouse
    }

    /// Takes effect when the main loop starts.
    pub fn set_mouse_events_enabled(&mut self, on: bool) {
        self.options.mouse = on;
    }

    pub fn input_esc(&self) -> bool {
        self.options.input_esc
    }

    /// Takes effect when the main loop starts.
    pub fn set_input_esc(&mut self, on: bool) {
        self.options.input_esc = on;
    }

    pub fn ascii(&self) -> bool {
        self.options.ascii
    }

    pub fn set_ascii(&mut self, on: bool) {
        self.options.ascii = on;
    }

    /// Decoding flags derived from the toggles.
    pub fn input_mode(&self) -> InputMode {
        let mut mode = if self.options.input_esc {
            InputMode::ESC
        } else {
            InputMode::ALT
        };
        if self.options.mouse {
            mode |= InputMode::MOUSE;
        }
        mode
    }

    // ---------------------------------------------------------------------------------------------
    // Direct surface access
    // ---------------------------------------------------------------------------------------------

    fn check_point(&self, x: i32, y: i32) -> GuiResult<()> {
        if x < 0 || y < 0 || x >= self.max_x || y >= self.max_y {
            return Err(GuiError::InvalidPoint { x, y });
        }
        Ok(())
    }

    /// Write one cell, terminal-relative.
    pub fn set_rune(&mut self, x: i32, y: i32, ch: char, fg: Attribute, bg: Attribute) -> GuiResult<()> {
        self.check_point(x, y)?;
        self.surface.set_cell(x, y, ch, fg, bg)?;
        Ok(())
    }

    pub fn rune(&self, x: i32, y: i32) -> GuiResult<char> {
        self.check_point(x, y)?;
        Ok(self.surface.cell_at(x, y)?)
    }

    // ---------------------------------------------------------------------------------------------
    // View stack
    // ---------------------------------------------------------------------------------------------

    fn position_of(&self, name: &str) -> Option<usize> {
        self.views.iter().position(|v| v.name() == name)
    }

    /// Create or update the view `name`.
    ///
    /// An existing view keeps its content and position in the stack; only its
    /// bounds change and it is invalidated. A new view is seeded with the
    /// current colors and output mode and placed on top.
    pub fn set_view(&mut self, name: &str, x0: i32, y0: i32, x1: i32, y1: i32) -> GuiResult<ViewSlot<'_>> {
        if x0 >= x1 || y0 >= y1 {
            return Err(GuiError::InvalidDimensions { x0, y0, x1, y1 });
        }
        if name.is_empty() {
            return Err(GuiError::InvalidName);
        }
        if let Some(i) = self.position_of(name) {
            let view = &mut self.views[i];
            view.set_bounds(x0, y0, x1, y1);
            return Ok(ViewSlot::Existing(view));
        }

        let mut view = View::new(name, x0, y0, x1, y1);
        view.set_fg(self.options.fg);
        view.set_bg(self.options.bg);
        view.set_sel_fg(self.options.sel_fg);
        view.set_sel_bg(self.options.sel_bg);
        view.set_output_mode(self.options.output);
        debug!(target: "gui.view", name, x0, y0, x1, y1, "view_created");
        let idx = self.views.len();
        self.views.push(view);
        Ok(ViewSlot::New(&mut self.views[idx]))
    }

    pub fn view(&self, name: &str) -> GuiResult<&View> {
        self.views
            .iter()
            .find(|v| v.name() == name)
            .ok_or(GuiError::UnknownView)
    }

    pub fn view_mut(&mut self, name: &str) -> GuiResult<&mut View> {
        self.views
            .iter_mut()
            .find(|v| v.name() == name)
            .ok_or(GuiError::UnknownView)
    }

    /// All views, bottom to top.
    pub fn views(&self) -> &[View] {
        &self.views
    }

    /// Topmost view whose content area strictly contains `(x, y)`.
    pub fn view_by_position(&self, x: i32, y: i32) -> GuiResult<&View> {
        self.views
            .iter()
            .rev()
            .find(|v| v.contains(x, y))
            .ok_or(GuiError::UnknownView)
    }

    pub fn view_position(&self, name: &str) -> GuiResult<(i32, i32, i32, i32)> {
        self.view(name).map(View::bounds)
    }

    /// Remove a view. Focus is dropped if it pointed at it; keybindings scoped
    /// to the name are kept.
    pub fn delete_view(&mut self, name: &str) -> GuiResult<()> {
        let i = self.position_of(name).ok_or(GuiError::UnknownView)?;
        self.views.remove(i);
        if self.current.as_deref() == Some(name) {
            self.current = None;
        }
        debug!(target: "gui.view", name, "view_deleted");
        Ok(())
    }

    pub fn set_view_on_top(&mut self, name: &str) -> GuiResult<&mut View> {
        let i = self.position_of(name).ok_or(GuiError::UnknownView)?;
        let view = self.views.remove(i);
        let top = self.views.len();
        self.views.push(view);
        Ok(&mut self.views[top])
    }

    pub fn set_view_on_bottom(&mut self, name: &str) -> GuiResult<&mut View> {
        let i = self.position_of(name).ok_or(GuiError::UnknownView)?;
        let view = self.views.remove(i);
        self.views.insert(0, view);
        Ok(&mut self.views[0])
    }

    pub fn set_current_view(&mut self, name: &str) -> GuiResult<&mut View> {
        let i = self.position_of(name).ok_or(GuiError::UnknownView)?;
        debug!(target: "gui.view", name, "focus");
        self.current = Some(name.to_string());
        Ok(&mut self.views[i])
    }

    pub fn current_view(&self) -> Option<&View> {
        let name = self.current.as_deref()?;
        self.views.iter().find(|v| v.name() == name)
    }

    pub fn current_view_mut(&mut self) -> Option<&mut View> {
        let name = self.current.as_deref()?;
        self.views.iter_mut().find(|v| v.name() == name)
    }

    // ---------------------------------------------------------------------------------------------
    // Keybindings
    // ---------------------------------------------------------------------------------------------

    /// Bind `key` (a [`Key`](core_events::Key) or a rune) with `mods` to
    /// `handler`. An empty `view` binds globally.
    pub fn set_keybinding<F>(&mut self, view: &str, key: impl Into<KeyCode>, mods: Modifier, handler: F)
    where
        F: Fn(&mut Gui, Option<&str>) -> GuiResult<()> + 'static,
    {
        self.keybindings.add(view, key, mods, Rc::new(handler));
    }

    /// Like [`set_keybinding`](Self::set_keybinding) with the key given by name.
    pub fn set_keybinding_str<F>(&mut self, view: &str, key: &str, mods: Modifier, handler: F) -> GuiResult<()>
    where
        F: Fn(&mut Gui, Option<&str>) -> GuiResult<()> + 'static,
    {
        self.keybindings.add_str(view, key, mods, Rc::new(handler))?;
        Ok(())
    }

    pub fn delete_keybinding(&mut self, view: &str, key: impl Into<KeyCode>, mods: Modifier) -> GuiResult<()> {
        self.keybindings.remove(view, key, mods)?;
        Ok(())
    }

    pub fn delete_keybindings(&mut self, view: &str) {
        self.keybindings.remove_scope(view);
    }

    pub fn keybinding_count(&self) -> usize {
        self.keybindings.len()
    }

    // ---------------------------------------------------------------------------------------------
    // Managers
    // ---------------------------------------------------------------------------------------------

    /// Replace the managers. Views, focus and keybindings are cleared and a
    /// resize is queued so the next frame lays everything out afresh.
    pub fn set_manager(&mut self, managers: Vec<Box<dyn Manager>>) {
        self.managers = managers.into_iter().map(Rc::from).collect();
        self.views.clear();
        self.current = None;
        self.keybindings.clear();
        info!(target: "gui.loop", managers = self.managers.len(), "managers_set");

        // A zero-sized resize keeps the surface and only invalidates.
        let tx = self.input_tx.clone();
        let spawned = thread::Builder::new()
            .name("panekit-resize".into())
            .spawn(move || {
                send_resize(&tx);
            });
        if let Err(e) = spawned {
            warn!(target: "gui.loop", error = %e, "resize_schedule_failed");
        }
    }

    pub fn set_manager_fn<F>(&mut self, manager: F)
    where
        F: Fn(&mut Gui) -> GuiResult<()> + 'static,
    {
        let manager: Box<dyn Manager> = Box::new(manager);
        self.set_manager(vec![manager]);
    }

    /// Run every manager in registration order.
    fn layout(&mut self) -> GuiResult<()> {
        let managers = self.managers.clone();
        for m in &managers {
            m.layout(self)?;
        }
        Ok(())
    }
}

/// Queue the zero-sized resize that forces a fresh layout. Returns false when
/// the loop is gone.
fn send_resize(tx: &Sender<Event>) -> bool {
    if tx.send(Event::Resize(0, 0)).is_err() {
        debug!(target: "gui.loop", "resize_dropped_loop_gone");
        return false;
    }
    true
}

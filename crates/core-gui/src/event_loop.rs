//! The run loop: Idle -> Dispatch -> Drain -> Layout/Render -> Idle.
//!
//! The loop blocks in exactly one place (the `select!` over the two queues).
//! Everything after that runs to completion on the loop thread. Any stage
//! failing ends the loop with that error; [`GuiError::Quit`] is the graceful
//! case.
//!
//! Scheduling an update spawns a short-lived thread that blocks on the
//! bounded update queue, so callers never block but the relative order of
//! concurrently scheduled updates is not guaranteed.

use crate::{Gui, GuiError, GuiResult, UpdateFn};
use core_events::{Event, KeyCode, KeyEvent, Modifier, MouseEvent, UPDATES_EXECUTED, UPDATES_SCHEDULED};
use core_input::spawn_reader;
use crossbeam_channel::{Sender, select};
use std::convert::Infallible;
use std::sync::atomic::Ordering;
use std::thread;
use tracing::{debug, info, trace, warn};

/// Cloneable, `Send` handle for scheduling work on the loop thread.
#[derive(Clone)]
pub struct UpdateHandle {
    tx: Sender<UpdateFn>,
}

impl std::fmt::Debug for UpdateHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateHandle").finish_non_exhaustive()
    }
}

impl UpdateHandle {
    /// Queue `f` to run on the loop thread. Returns immediately.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Gui) -> GuiResult<()> + Send + 'static,
    {
        UPDATES_SCHEDULED.fetch_add(1, Ordering::Relaxed);
        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name("panekit-update".into())
            .spawn(move || {
                if tx.send(Box::new(f)).is_err() {
                    debug!(target: "gui.loop", "update_dropped_loop_gone");
                }
            });
        if let Err(e) = spawned {
            warn!(target: "gui.loop", error = %e, "update_spawn_failed");
        }
    }
}

impl Gui {
    pub fn update_handle(&self) -> UpdateHandle {
        UpdateHandle {
            tx: self.update_tx.clone(),
        }
    }

    /// Schedule `f` on the loop thread; see [`UpdateHandle::update`].
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Gui) -> GuiResult<()> + Send + 'static,
    {
        self.update_handle().update(f);
    }

    /// Run until a stage fails and return that failure. [`GuiError::Quit`]
    /// means a handler asked to stop.
    ///
    /// The event source is handed to a reader thread on the first call; a
    /// second call fails with [`GuiError::Input`].
    pub fn main_loop(&mut self) -> GuiError {
        let Err(err) = self.run_stages();
        info!(
            target: "gui.loop",
            quit = err.is_quit(),
            error = %err,
            updates_scheduled = UPDATES_SCHEDULED.load(Ordering::Relaxed),
            updates_executed = UPDATES_EXECUTED.load(Ordering::Relaxed),
            "main_loop_exit"
        );
        err
    }

    /// [`main_loop`](Self::main_loop) with the quit sentinel mapped to success.
    pub fn run(&mut self) -> GuiResult<()> {
        match self.main_loop() {
            GuiError::Quit => Ok(()),
            err => Err(err),
        }
    }

    fn run_stages(&mut self) -> GuiResult<Infallible> {
        let mut source = self
            .source
            .take()
            .ok_or_else(|| GuiError::Input("event source already in use".into()))?;
        let mode = self.input_mode();
        self.surface.set_input_mode(mode)?;
        source.set_input_mode(mode);
        spawn_reader(source, self.input_tx.clone())
            .map_err(|e| anyhow::Error::new(e).context("spawning input reader"))?;
        info!(target: "gui.loop", ?mode, views = self.views.len(), "main_loop_start");

        self.flush()?;
        let input_rx = self.input_rx.clone();
        let update_rx = self.update_rx.clone();
        loop {
            select! {
                recv(input_rx) -> ev => {
                    let ev = ev.map_err(|_| GuiError::Input("input queue closed".into()))?;
                    self.handle_event(ev)?;
                }
                recv(update_rx) -> f => {
                    let f = f.map_err(|_| GuiError::Input("update queue closed".into()))?;
                    self.run_update(f)?;
                }
            }
            self.consume_events()?;
            self.flush()?;
        }
    }

    /// Handle everything already queued without blocking.
    fn consume_events(&mut self) -> GuiResult<()> {
        loop {
            if let Ok(ev) = self.input_rx.try_recv() {
                self.handle_event(ev)?;
            } else if let Ok(f) = self.update_rx.try_recv() {
                self.run_update(f)?;
            } else {
                return Ok(());
            }
        }
    }

    fn run_update(&mut self, f: UpdateFn) -> GuiResult<()> {
        UPDATES_EXECUTED.fetch_add(1, Ordering::Relaxed);
        trace!(target: "gui.loop", "update");
        f(self)
    }

    fn handle_event(&mut self, event: Event) -> GuiResult<()> {
        trace!(target: "gui.loop", kind = event.kind(), "event");
        match event {
            Event::Key(key) => self.on_key(key),
            Event::Mouse(mouse) => self.on_mouse(mouse),
            Event::Resize(w, h) => {
                self.on_resize(w, h);
                Ok(())
            }
            Event::Error(msg) => {
                warn!(target: "gui.loop", error = %msg, "input_error");
                Err(GuiError::Input(msg))
            }
        }
    }

    fn on_resize(&mut self, w: u16, h: u16) {
        let (cur_w, cur_h) = self.surface.size();
        if w > 0 && h > 0 && (i32::from(w), i32::from(h)) != (cur_w, cur_h) {
            self.surface.resize(w, h);
        }
        (self.max_x, self.max_y) = self.surface.size();
        for v in &mut self.views {
            v.invalidate();
        }
        debug!(target: "gui.loop", w, h, "resize");
    }

    /// Keybindings scoped to the focused view run first; if none matched, an
    /// editable focused view gets the key through its editor.
    fn on_key(&mut self, key: KeyEvent) -> GuiResult<()> {
        let target = self.current.clone();
        if self.exec_keybindings(key.code, key.mods, target.as_deref())? {
            return Ok(());
        }
        if let Some(view) = self.current_view_mut()
            && view.editable()
        {
            view.feed_key(key.code, key.mods);
        }
        Ok(())
    }

    /// A click focuses nothing by itself: it moves the hit view's cursor and
    /// runs the bindings scoped to that view. Misses are ignored.
    fn on_mouse(&mut self, mouse: MouseEvent) -> GuiResult<()> {
        let (x, y) = (i32::from(mouse.x), i32::from(mouse.y));
        let Some(i) = self.views.iter().rposition(|v| v.contains(x, y)) else {
            trace!(target: "gui.keys", x, y, "mouse_miss");
            return Ok(());
        };
        let view = &mut self.views[i];
        let (x0, y0, _, _) = view.bounds();
        view.set_cursor(x - x0 - 1, y - y0 - 1)?;
        let name = view.name().to_string();
        self.exec_keybindings(KeyCode::Key(mouse.key), mouse.mods, Some(&name))?;
        Ok(())
    }

    /// Run every matching handler in registration order, stopping at the
    /// first failure. Returns whether anything matched.
    fn exec_keybindings(&mut self, code: KeyCode, mods: Modifier, view: Option<&str>) -> GuiResult<bool> {
        let handlers = self.keybindings.matching(code, mods, view);
        let trigger = match code {
            KeyCode::Key(k) => format!("{k:?}"),
            KeyCode::Char(_) => "rune".to_string(),
        };
        trace!(target: "gui.keys", trigger, ?mods, matched = handlers.len(), has_view = view.is_some(), "dispatch");
        for handler in &handlers {
            handler(self, view)?;
        }
        Ok(!handlers.is_empty())
    }
}

//! core-keymap: ordered keybinding table.
//!
//! Bindings are kept in insertion order and matched exhaustively: every
//! binding whose trigger, modifier and view scope agree with an event fires,
//! in the order it was registered. The table is generic over the handler
//! type so the compositor can store its own callback representation without
//! this crate knowing about it.
//!
//! Scope rules:
//! - An empty scope matches every target, including "no view focused".
//! - A non-empty scope matches only a target view with exactly that name.

use core_events::{KeyCode, Modifier, ParseKeyError};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::{debug, trace};

/// Most events match at most a handful of bindings.
pub type Matches<H> = SmallVec<[H; 4]>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeymapError {
    #[error("unsupported trigger: {0:?}")]
    UnsupportedTrigger(String),
    #[error("keybinding not found")]
    NotFound,
}

impl From<ParseKeyError> for KeymapError {
    fn from(err: ParseKeyError) -> Self {
        KeymapError::UnsupportedTrigger(err.0)
    }
}

#[derive(Debug, Clone)]
pub struct Keybinding<H> {
    scope: String,
    trigger: KeyCode,
    mods: Modifier,
    handler: H,
}

impl<H> Keybinding<H> {
    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn trigger(&self) -> KeyCode {
        self.trigger
    }

    pub fn mods(&self) -> Modifier {
        self.mods
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn matches_key(&self, code: KeyCode, mods: Modifier) -> bool {
        self.trigger == code && self.mods == mods
    }

    pub fn matches_view(&self, view: Option<&str>) -> bool {
        self.scope.is_empty() || view == Some(self.scope.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct KeybindingTable<H> {
    bindings: Vec<Keybinding<H>>,
}

impl<H> Default for KeybindingTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> KeybindingTable<H> {
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Keybinding<H>> {
        self.bindings.iter()
    }

    pub fn add(&mut self, scope: &str, trigger: impl Into<KeyCode>, mods: Modifier, handler: H) {
        let trigger = trigger.into();
        debug!(target: "keymap", scope, %trigger, ?mods, "bind");
        self.bindings.push(Keybinding {
            scope: scope.to_string(),
            trigger,
            mods,
            handler,
        });
    }

    /// Like [`add`](Self::add) with the trigger given by name (`"q"`, `"C-c"`,
    /// `"Enter"`).
    pub fn add_str(
        &mut self,
        scope: &str,
        trigger: &str,
        mods: Modifier,
        handler: H,
    ) -> Result<(), KeymapError> {
        let code: KeyCode = trigger.parse()?;
        self.add(scope, code, mods, handler);
        Ok(())
    }

    /// Remove the first binding with exactly this scope, trigger and modifier.
    pub fn remove(
        &mut self,
        scope: &str,
        trigger: impl Into<KeyCode>,
        mods: Modifier,
    ) -> Result<H, KeymapError> {
        let trigger = trigger.into();
        let idx = self
            .bindings
            .iter()
            .position(|kb| kb.scope == scope && kb.matches_key(trigger, mods))
            .ok_or(KeymapError::NotFound)?;
        debug!(target: "keymap", scope, %trigger, "unbind");
        Ok(self.bindings.remove(idx).handler)
    }

    /// Drop every binding registered for `scope`; returns how many went.
    pub fn remove_scope(&mut self, scope: &str) -> usize {
        let before = self.bindings.len();
        self.bindings.retain(|kb| kb.scope != scope);
        let removed = before - self.bindings.len();
        debug!(target: "keymap", scope, removed, "unbind_scope");
        removed
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }
}

impl<H: Clone> KeybindingTable<H> {
    /// Snapshot of every handler matching the event, in registration order.
    ///
    /// Handlers are cloned out so the caller may mutate the table (or the
    /// object owning it) while running them.
    pub fn matching(&self, code: KeyCode, mods: Modifier, view: Option<&str>) -> Matches<H> {
        let out: Matches<H> = self
            .bindings
            .iter()
            .filter(|kb| kb.matches_key(code, mods) && kb.matches_view(view))
            .map(|kb| kb.handler.clone())
            .collect();
        trace!(target: "keymap", matched = out.len(), has_view = view.is_some(), "match");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_events::Key;
    use pretty_assertions::assert_eq;

    fn none() -> Modifier {
        Modifier::empty()
    }

    #[test]
    fn all_matches_fire_in_order() {
        let mut t = KeybindingTable::new();
        t.add("", 'q', none(), 1);
        t.add("", 'q', none(), 2);
        t.add("", 'x', none(), 3);
        assert_eq!(t.matching('q'.into(), none(), None).to_vec(), vec![1, 2]);
    }

    #[test]
    fn scope_filters_by_view_name() {
        let mut t = KeybindingTable::new();
        t.add("main", Key::Enter, none(), "main");
        t.add("", Key::Enter, none(), "global");
        t.add("side", Key::Enter, none(), "side");
        let enter = KeyCode::from(Key::Enter);
        assert_eq!(t.matching(enter, none(), Some("main")).to_vec(), vec!["main", "global"]);
        assert_eq!(t.matching(enter, none(), None).to_vec(), vec!["global"]);
    }

    #[test]
    fn modifier_must_match_exactly() {
        let mut t = KeybindingTable::new();
        t.add("", 'f', Modifier::ALT, "alt-f");
        assert!(t.matching('f'.into(), none(), None).is_empty());
        assert_eq!(t.matching('f'.into(), Modifier::ALT, None).to_vec(), vec!["alt-f"]);
    }

    #[test]
    fn rune_and_key_triggers_are_distinct() {
        let mut t = KeybindingTable::new();
        t.add("", ' ', none(), "rune");
        assert!(t.matching(Key::Space.into(), none(), None).is_empty());
    }

    #[test]
    fn remove_takes_first_exact_match() {
        let mut t = KeybindingTable::new();
        t.add("v", 'a', none(), 1);
        t.add("v", 'a', none(), 2);
        assert_eq!(t.remove("v", 'a', none()), Ok(1));
        assert_eq!(t.len(), 1);
        assert_eq!(t.remove("", 'a', none()), Err(KeymapError::NotFound));
        assert_eq!(t.remove("v", 'a', Modifier::ALT), Err(KeymapError::NotFound));
    }

    #[test]
    fn remove_scope_is_unconditional() {
        let mut t = KeybindingTable::new();
        t.add("v", 'a', none(), 1);
        t.add("w", 'a', none(), 2);
        t.add("v", 'b', none(), 3);
        assert_eq!(t.remove_scope("v"), 2);
        assert_eq!(t.remove_scope("missing"), 0);
        assert_eq!(t.iter().map(|kb| *kb.handler()).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn add_str_parses_or_rejects() {
        let mut t = KeybindingTable::new();
        t.add_str("", "C-c", none(), 1).unwrap();
        assert_eq!(t.iter().next().map(|kb| kb.trigger()), Some(Key::Ctrl('c').into()));
        assert_eq!(
            t.add_str("", "Hyper-x", none(), 2),
            Err(KeymapError::UnsupportedTrigger("Hyper-x".into()))
        );
        assert_eq!(t.len(), 1);
    }
}

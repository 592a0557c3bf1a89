//! Views: named rectangles owning a text buffer.
//!
//! A [`View`] occupies `bounds = (x0, y0, x1, y1)` on the surface. Its frame
//! (if any) sits on the bounds' edges; content is drawn strictly inside, so the
//! content size is `(x1 - x0 - 1, y1 - y0 - 1)` and content cell `(0, 0)` is
//! surface cell `(x0 + 1, y0 + 1)`.
//!
//! Cursor and origin live in display coordinates: `origin` is the first
//! visible display row/column and `cursor` is relative to it. Edits translate
//! the cursor back to raw buffer coordinates, apply the change, then map the
//! result forward again and scroll the origin so the cursor stays visible.
//!
//! Views also implement `io::Write` (streamed output with SGR colors) and
//! `io::Read` (raw content, restartable with [`View::rewind`]).

use core_events::{KeyCode, Modifier};
use core_terminal::{Attribute, OutputMode, SurfaceError};
use core_text::TextBuffer;
use std::io;
use std::rc::Rc;
use thiserror::Error;

mod draw;
mod edit;
mod editor;

pub use editor::{DefaultEditor, Editor};

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("invalid point ({x}, {y})")]
    InvalidPoint { x: i32, y: i32 },
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

pub type ViewResult<T> = Result<T, ViewError>;

pub struct View {
    name: String,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    ox: usize,
    oy: usize,
    cx: usize,
    cy: usize,
    buffer: TextBuffer,
    read_offset: usize,
    output_mode: OutputMode,

    editable: bool,
    wrap: bool,
    autoscroll: bool,
    overwrite: bool,
    highlight: bool,
    frame: bool,
    mask: Option<char>,
    title: String,

    fg: Attribute,
    bg: Attribute,
    sel_fg: Attribute,
    sel_bg: Attribute,

    editor: Rc<dyn Editor>,
}

impl std::fmt::Debug for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("View")
            .field("name", &self.name)
            .field("bounds", &self.bounds())
            .field("origin", &(self.ox, self.oy))
            .field("cursor", &(self.cx, self.cy))
            .field("lines", &self.buffer.line_count())
            .finish_non_exhaustive()
    }
}

impl View {
    /// New framed view with default colors and the [`DefaultEditor`].
    pub fn new(name: impl Into<String>, x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self {
            name: name.into(),
            x0,
            y0,
            x1,
            y1,
            ox: 0,
            oy: 0,
            cx: 0,
            cy: 0,
            buffer: TextBuffer::new(),
            read_offset: 0,
            output_mode: OutputMode::Normal,
            editable: false,
            wrap: false,
            autoscroll: false,
            overwrite: false,
            highlight: false,
            frame: true,
            mask: None,
            title: String::new(),
            fg: Attribute::DEFAULT,
            bg: Attribute::DEFAULT,
            sel_fg: Attribute::DEFAULT,
            sel_bg: Attribute::DEFAULT,
            editor: Rc::new(DefaultEditor),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ---------------------------------------------------------------------------------------------
    // Geometry
    // ---------------------------------------------------------------------------------------------

    pub fn bounds(&self) -> (i32, i32, i32, i32) {
        (self.x0, self.y0, self.x1, self.y1)
    }

    /// Move/resize the view. The wrap index is rebuilt on next use.
    pub fn set_bounds(&mut self, x0: i32, y0: i32, x1: i32, y1: i32) {
        (self.x0, self.y0, self.x1, self.y1) = (x0, y0, x1, y1);
        self.invalidate();
    }

    /// Content size inside the frame.
    pub fn size(&self) -> (i32, i32) {
        (self.x1 - self.x0 - 1, self.y1 - self.y0 - 1)
    }

    /// True if `(x, y)` lies strictly between the view's edges.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x > self.x0 && x < self.x1 && y > self.y0 && y < self.y1
    }

    pub fn invalidate(&mut self) {
        self.buffer.invalidate();
    }

    fn content_dims(&self) -> (usize, usize) {
        let (w, h) = self.size();
        (w.max(0) as usize, h.max(0) as usize)
    }

    /// Keep the buffer's wrap width in step with flags and geometry.
    fn sync_wrap(&mut self) {
        let width = self.wrap.then(|| self.content_dims().0);
        self.buffer.set_wrap_width(width);
    }

    // ---------------------------------------------------------------------------------------------
    // Cursor / origin
    // ---------------------------------------------------------------------------------------------

    pub fn cursor(&self) -> (i32, i32) {
        (self.cx as i32, self.cy as i32)
    }

    /// Place the cursor relative to the origin; must be inside the content area.
    pub fn set_cursor(&mut self, x: i32, y: i32) -> ViewResult<()> {
        let (w, h) = self.size();
        if x < 0 || y < 0 || x >= w || y >= h {
            return Err(ViewError::InvalidPoint { x, y });
        }
        self.cx = x as usize;
        self.cy = y as usize;
        Ok(())
    }

    pub fn origin(&self) -> (i32, i32) {
        (self.ox as i32, self.oy as i32)
    }

    pub fn set_origin(&mut self, x: i32, y: i32) -> ViewResult<()> {
        if x < 0 || y < 0 {
            return Err(ViewError::InvalidPoint { x, y });
        }
        self.ox = x as usize;
        self.oy = y as usize;
        Ok(())
    }

    /// Pull the cursor back into the content area after the view shrank and
    /// return the stored position.
    pub fn clamp_cursor(&mut self) -> (i32, i32) {
        let (w, h) = self.size();
        let (cx, cy) = self.cursor();
        let clamped = (cx.min(w - 1).max(0), cy.min(h - 1).max(0));
        (self.cx, self.cy) = (clamped.0 as usize, clamped.1 as usize);
        clamped
    }

    // ---------------------------------------------------------------------------------------------
    // Flags and colors
    // ---------------------------------------------------------------------------------------------

    pub fn editable(&self) -> bool {
        self.editable
    }

    pub fn set_editable(&mut self, on: bool) {
        self.editable = on;
    }

    pub fn wrap(&self) -> bool {
        self.wrap
    }

    pub fn set_wrap(&mut self, on: bool) {
        self.wrap = on;
        if on {
            self.ox = 0;
        }
        self.sync_wrap();
    }

    pub fn autoscroll(&self) -> bool {
        self.autoscroll
    }

    pub fn set_autoscroll(&mut self, on: bool) {
        self.autoscroll = on;
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    pub fn set_overwrite(&mut self, on: bool) {
        self.overwrite = on;
    }

    pub fn highlight(&self) -> bool {
        self.highlight
    }

    pub fn set_highlight(&mut self, on: bool) {
        self.highlight = on;
    }

    pub fn frame(&self) -> bool {
        self.frame
    }

    pub fn set_frame(&mut self, on: bool) {
        self.frame = on;
    }

    pub fn mask(&self) -> Option<char> {
        self.mask
    }

    /// Substitute every drawn rune with `mask`; the buffer is untouched.
    pub fn set_mask(&mut self, mask: Option<char>) {
        self.mask = mask;
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn fg(&self) -> Attribute {
        self.fg
    }

    pub fn bg(&self) -> Attribute {
        self.bg
    }

    pub fn set_fg(&mut self, fg: impl Into<Attribute>) {
        self.fg = fg.into();
    }

    pub fn set_bg(&mut self, bg: impl Into<Attribute>) {
        self.bg = bg.into();
    }

    pub fn sel_fg(&self) -> Attribute {
        self.sel_fg
    }

    pub fn sel_bg(&self) -> Attribute {
        self.sel_bg
    }

    pub fn set_sel_fg(&mut self, fg: impl Into<Attribute>) {
        self.sel_fg = fg.into();
    }

    pub fn set_sel_bg(&mut self, bg: impl Into<Attribute>) {
        self.sel_bg = bg.into();
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    /// Color depth used when interpreting SGR sequences in written output.
    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    // ---------------------------------------------------------------------------------------------
    // Editor
    // ---------------------------------------------------------------------------------------------

    pub fn editor(&self) -> Rc<dyn Editor> {
        Rc::clone(&self.editor)
    }

    pub fn set_editor(&mut self, editor: impl Editor + 'static) {
        self.editor = Rc::new(editor);
    }

    /// Run this view's editor on a key press.
    pub fn feed_key(&mut self, code: KeyCode, mods: Modifier) {
        let editor = self.editor();
        editor.edit(self, code, mods);
    }

    // ---------------------------------------------------------------------------------------------
    // Content
    // ---------------------------------------------------------------------------------------------

    /// Raw (unwrapped) content.
    pub fn buffer(&self) -> String {
        self.buffer.raw_string()
    }

    /// Content as currently wrapped for this view's width.
    ///
    /// With wrap on, a line exactly as long as the width also gets an empty
    /// trailing row for the append position, so the result differs from
    /// [`View::buffer`] there.
    pub fn view_buffer(&mut self) -> String {
        self.sync_wrap();
        self.buffer.display_string()
    }

    pub fn text(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn line_count(&self) -> usize {
        self.buffer.line_count()
    }

    /// Display line `y` rows below the origin.
    pub fn line(&mut self, y: i32) -> ViewResult<String> {
        if y < 0 {
            return Err(ViewError::InvalidPoint { x: 0, y });
        }
        self.sync_wrap();
        self.buffer
            .display_line_string(self.oy + y as usize)
            .ok_or(ViewError::InvalidPoint { x: 0, y })
    }

    /// Space-delimited word under `(x, y)`, relative to the origin.
    pub fn word(&mut self, x: i32, y: i32) -> ViewResult<String> {
        if x < 0 || y < 0 {
            return Err(ViewError::InvalidPoint { x, y });
        }
        self.sync_wrap();
        let (rx, ry) = self
            .buffer
            .real_position(self.ox + x as usize, self.oy + y as usize);
        self.buffer
            .word_at(rx, ry)
            .ok_or(ViewError::InvalidPoint { x, y })
    }

    /// Empty the buffer and restart reads.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.read_offset = 0;
    }

    /// Restart `io::Read` from the beginning of the content.
    pub fn rewind(&mut self) {
        self.read_offset = 0;
    }

    /// Overwrite one cell with explicit colors, relative to the origin.
    pub fn set_cell(&mut self, x: i32, y: i32, ch: char, fg: Attribute, bg: Attribute) -> ViewResult<()> {
        if x < 0 || y < 0 {
            return Err(ViewError::InvalidPoint { x, y });
        }
        self.sync_wrap();
        let (rx, ry) = self
            .buffer
            .real_position(self.ox + x as usize, self.oy + y as usize);
        self.buffer.set_cell(rx, ry, core_text::Cell { ch, fg, bg });
        Ok(())
    }
}

impl io::Write for View {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.append_bytes(buf, self.output_mode);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Read for View {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let content = self.buffer.raw_string();
        let bytes = content.as_bytes();
        if self.read_offset >= bytes.len() {
            return Ok(0);
        }
        let n = out.len().min(bytes.len() - self.read_offset);
        out[..n].copy_from_slice(&bytes[self.read_offset..self.read_offset + n]);
        self.read_offset += n;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_terminal::Color;
    use pretty_assertions::assert_eq;
    use std::io::{Read, Write};

    #[test]
    fn size_is_inset_by_frame() {
        let v = View::new("v", 10, 5, 30, 15);
        assert_eq!(v.size(), (19, 9));
        assert!(v.contains(12, 7));
        assert!(!v.contains(10, 7));
        assert!(!v.contains(30, 7));
    }

    #[test]
    fn cursor_must_be_inside_content() {
        let mut v = View::new("v", 0, 0, 5, 3);
        v.set_cursor(3, 1).unwrap();
        assert_eq!(v.cursor(), (3, 1));
        assert!(matches!(v.set_cursor(4, 0), Err(ViewError::InvalidPoint { x: 4, y: 0 })));
        assert!(v.set_cursor(-1, 0).is_err());
        assert!(v.set_origin(0, -2).is_err());
    }

    #[test]
    fn wrap_follows_width_changes() {
        let mut v = View::new("w", 0, 0, 11, 5);
        v.set_wrap(true);
        write!(v, "{}", "a".repeat(25)).unwrap();
        assert_eq!(v.view_buffer().lines().count(), 3);
        v.set_bounds(0, 0, 21, 5);
        assert_eq!(v.view_buffer().lines().count(), 2);
        assert_eq!(v.buffer(), "a".repeat(25));
    }

    #[test]
    fn exact_width_line_gets_append_row() {
        let mut v = View::new("w", 0, 0, 5, 5);
        v.set_wrap(true);
        write!(v, "abcd").unwrap();
        assert_eq!(v.buffer(), "abcd");
        assert_eq!(v.view_buffer(), "abcd\n");
    }

    #[test]
    fn line_and_word_are_origin_relative() {
        let mut v = View::new("v", 0, 0, 20, 5);
        write!(v, "zero\none two\nthree").unwrap();
        assert_eq!(v.line(1).unwrap(), "one two");
        assert_eq!(v.word(5, 1).unwrap(), "two");
        v.set_origin(0, 1).unwrap();
        assert_eq!(v.line(0).unwrap(), "one two");
        assert_eq!(v.line(1).unwrap(), "three");
        assert!(matches!(v.line(2), Err(ViewError::InvalidPoint { .. })));
        assert!(v.word(9, 0).is_err());
    }

    #[test]
    fn read_and_rewind() {
        let mut v = View::new("v", 0, 0, 20, 5);
        write!(v, "ab\ncd").unwrap();
        let mut s = String::new();
        v.read_to_string(&mut s).unwrap();
        assert_eq!(s, "ab\ncd");
        let mut again = String::new();
        v.read_to_string(&mut again).unwrap();
        assert_eq!(again, "");
        v.rewind();
        let mut buf = [0u8; 2];
        assert_eq!(v.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf, b"ab");
    }

    #[test]
    fn clear_empties_and_restarts_reads() {
        let mut v = View::new("v", 0, 0, 20, 5);
        write!(v, "data").unwrap();
        let mut sink = String::new();
        v.read_to_string(&mut sink).unwrap();
        v.clear();
        assert_eq!(v.buffer(), "");
        write!(v, "new").unwrap();
        let mut s = String::new();
        v.read_to_string(&mut s).unwrap();
        assert_eq!(s, "new");
    }

    #[test]
    fn set_cell_overrides_colors() {
        let mut v = View::new("v", 0, 0, 20, 5);
        v.set_cell(2, 0, 'x', Attribute::new(Color::Red), Attribute::DEFAULT)
            .unwrap();
        assert_eq!(v.buffer(), "  x");
        assert_eq!(v.text().line(0).unwrap()[2].fg.color, Color::Red);
    }
}

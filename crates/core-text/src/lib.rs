//! Line store behind every view.
//!
//! A [`TextBuffer`] holds raw (unwrapped) lines of styled [`Cell`]s plus a
//! lazily rebuilt display index describing how those lines are split for the
//! current wrap width. Two coordinate spaces exist:
//!
//! * raw `(x, y)`: rune column within logical line `y`.
//! * display `(x, y)`: column within display line `y` after wrapping.
//!
//! Edit primitives take and return raw coordinates; the view owning the
//! buffer converts to display space for its cursor.
//!
//! Invariants:
//! * The display index is a pure function of `(lines, wrap width)`. Any
//!   mutation or width change taints it; it is rebuilt on next access.
//! * Wrapping counts runes, never display columns. A line of exactly
//!   `k * width` runes yields a trailing empty display segment so the append
//!   position has a row to live on.
//! * Deleting before the absolute start or after the absolute end is a no-op.

use core_terminal::{Attribute, OutputMode};
use std::ops::Range;
use tracing::trace;

mod escape;
pub use escape::EscapeInterpreter;

/// One rune with optional color overrides. `Attribute::DEFAULT` means the
/// owning view's colors apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Attribute,
    pub bg: Attribute,
}

impl Cell {
    pub fn plain(ch: char) -> Self {
        Self {
            ch,
            fg: Attribute::DEFAULT,
            bg: Attribute::DEFAULT,
        }
    }
}

/// One row of the display index: the slice `raw_x..raw_x + len` of raw line
/// `raw_y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayLine {
    pub raw_x: usize,
    pub raw_y: usize,
    pub len: usize,
}

impl DisplayLine {
    fn range(&self) -> Range<usize> {
        self.raw_x..self.raw_x + self.len
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    lines: Vec<Vec<Cell>>,
    display: Vec<DisplayLine>,
    tainted: bool,
    wrap_width: Option<usize>,
    escape: EscapeInterpreter,
    /// Trailing bytes of an incomplete UTF-8 sequence from the last stream write.
    partial: Vec<u8>,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: &str) -> Self {
        let mut buf = Self::new();
        for line in text.split('\n') {
            buf.lines.push(line.chars().map(Cell::plain).collect());
        }
        buf.tainted = true;
        buf
    }

    // ---------------------------------------------------------------------------------------------
    // Raw access
    // ---------------------------------------------------------------------------------------------

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, y: usize) -> Option<&[Cell]> {
        self.lines.get(y).map(Vec::as_slice)
    }

    pub fn line_len(&self, y: usize) -> usize {
        self.lines.get(y).map_or(0, Vec::len)
    }

    pub fn line_string(&self, y: usize) -> Option<String> {
        self.lines.get(y).map(|l| cells_to_string(l))
    }

    /// Unwrapped content, lines joined with `\n`.
    pub fn raw_string(&self) -> String {
        let mut out = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.extend(line.iter().map(|c| c.ch));
        }
        out
    }

    /// Whitespace-delimited token around raw column `x` of line `y`. A column
    /// sitting on a space yields the word to its left.
    pub fn word_at(&self, x: usize, y: usize) -> Option<String> {
        let line = self.lines.get(y)?;
        if x >= line.len() {
            return None;
        }
        let start = line[..x]
            .iter()
            .rposition(|c| c.ch == ' ')
            .map_or(0, |i| i + 1);
        let end = line[x..]
            .iter()
            .position(|c| c.ch == ' ')
            .map_or(line.len(), |i| i + x);
        Some(line[start..end].iter().map(|c| c.ch).collect())
    }

    // ---------------------------------------------------------------------------------------------
    // Display index
    // ---------------------------------------------------------------------------------------------

    pub fn wrap_width(&self) -> Option<usize> {
        self.wrap_width
    }

    /// `None` disables wrapping. `Some(0)` behaves like `None`.
    pub fn set_wrap_width(&mut self, width: Option<usize>) {
        if self.wrap_width != width {
            self.wrap_width = width;
            self.tainted = true;
        }
    }

    /// Force the display index to be rebuilt on next access.
    pub fn invalidate(&mut self) {
        self.tainted = true;
    }

    pub fn is_tainted(&self) -> bool {
        self.tainted
    }

    /// Rebuild the display index if stale.
    pub fn refresh(&mut self) {
        if !self.tainted {
            return;
        }
        self.display.clear();
        let width = self.wrap_width.filter(|w| *w > 0);
        for (raw_y, line) in self.lines.iter().enumerate() {
            match width {
                Some(w) if line.len() >= w => {
                    let mut n = 0;
                    while n <= line.len() {
                        let len = w.min(line.len() - n);
                        self.display.push(DisplayLine { raw_x: n, raw_y, len });
                        n += w;
                    }
                }
                _ => self.display.push(DisplayLine {
                    raw_x: 0,
                    raw_y,
                    len: line.len(),
                }),
            }
        }
        self.tainted = false;
        trace!(target: "gui.view", lines = self.lines.len(), rows = self.display.len(), "rewrap");
    }

    /// Display index as of the last [`refresh`](Self::refresh).
    pub fn display_lines(&self) -> &[DisplayLine] {
        &self.display
    }

    /// Cells shown on display row `dl`.
    pub fn segment(&self, dl: &DisplayLine) -> &[Cell] {
        self.lines
            .get(dl.raw_y)
            .and_then(|l| l.get(dl.range()))
            .unwrap_or(&[])
    }

    pub fn display_len(&mut self) -> usize {
        self.refresh();
        self.display.len()
    }

    pub fn display_line_string(&mut self, dy: usize) -> Option<String> {
        self.refresh();
        let dl = *self.display.get(dy)?;
        Some(cells_to_string(self.segment(&dl)))
    }

    /// Wrapped content, display rows joined with `\n`.
    pub fn display_string(&mut self) -> String {
        self.refresh();
        let rows: Vec<String> = self
            .display
            .iter()
            .map(|dl| cells_to_string(self.segment(dl)))
            .collect();
        rows.join("\n")
    }

    /// Map a display position to raw coordinates. Rows past the end of the
    /// display index map onto raw lines past the end of the buffer.
    pub fn real_position(&mut self, dx: usize, dy: usize) -> (usize, usize) {
        self.refresh();
        match self.display.get(dy) {
            Some(dl) => (dl.raw_x + dx, dl.raw_y),
            None => match self.display.last() {
                Some(last) => (dx, last.raw_y + dy - self.display.len() + 1),
                None => (dx, dy),
            },
        }
    }

    /// Inverse of [`real_position`](Self::real_position). A raw column maps to
    /// the last display segment of its line starting at or before it.
    pub fn display_position(&mut self, rx: usize, ry: usize) -> (usize, usize) {
        self.refresh();
        let Some(last) = self.display.last() else {
            return (rx, ry);
        };
        if ry > last.raw_y {
            return (rx, self.display.len() + ry - last.raw_y - 1);
        }
        let found = self
            .display
            .iter()
            .enumerate()
            .rev()
            .find(|(_, dl)| dl.raw_y == ry && dl.raw_x <= rx);
        match found {
            Some((dy, dl)) => (rx - dl.raw_x, dy),
            None => (rx, ry),
        }
    }

    // ---------------------------------------------------------------------------------------------
    // Edit primitives (raw coordinates in, new raw cursor out)
    // ---------------------------------------------------------------------------------------------

    fn ensure_line(&mut self, y: usize) {
        if y >= self.lines.len() {
            self.lines.resize_with(y + 1, Vec::new);
        }
    }

    /// Insert (or, with `overwrite`, replace) `ch` at `(x, y)`. Gaps before
    /// `x` are padded with spaces.
    pub fn write_rune(&mut self, x: usize, y: usize, ch: char, overwrite: bool) -> (usize, usize) {
        self.ensure_line(y);
        let line = &mut self.lines[y];
        if x > line.len() {
            line.resize(x, Cell::plain(' '));
        }
        if overwrite && x < line.len() {
            line[x] = Cell::plain(ch);
        } else {
            line.insert(x, Cell::plain(ch));
        }
        self.tainted = true;
        (x + 1, y)
    }

    /// Remove the rune before `(x, y)`, joining with the previous line at
    /// column 0.
    pub fn delete_before(&mut self, x: usize, y: usize) -> (usize, usize) {
        if x == 0 {
            if y == 0 || y > self.lines.len() {
                return (x, y);
            }
            let prev_len = self.line_len(y - 1);
            if y < self.lines.len() {
                let tail = self.lines.remove(y);
                self.lines[y - 1].extend(tail);
                self.tainted = true;
            }
            return (prev_len, y - 1);
        }
        if let Some(line) = self.lines.get_mut(y)
            && x <= line.len()
        {
            line.remove(x - 1);
            self.tainted = true;
        }
        (x - 1, y)
    }

    /// Remove the rune at `(x, y)`, joining the next line at end of line.
    pub fn delete_at(&mut self, x: usize, y: usize) -> (usize, usize) {
        let Some(len) = self.lines.get(y).map(Vec::len) else {
            return (x, y);
        };
        if x < len {
            self.lines[y].remove(x);
            self.tainted = true;
        } else if y + 1 < self.lines.len() {
            let next = self.lines.remove(y + 1);
            let line = &mut self.lines[y];
            if x > line.len() {
                line.resize(x, Cell::plain(' '));
            }
            line.extend(next);
            self.tainted = true;
        }
        (x, y)
    }

    /// Split line `y` at `x`; the cursor lands at the start of the new line.
    pub fn break_line(&mut self, x: usize, y: usize) -> (usize, usize) {
        self.ensure_line(y);
        let line = &mut self.lines[y];
        let right = if x < line.len() {
            line.split_off(x)
        } else {
            Vec::new()
        };
        self.lines.insert(y + 1, right);
        self.tainted = true;
        (0, y + 1)
    }

    /// Place `ch` with explicit colors at `(x, y)`, replacing what was there.
    pub fn set_cell(&mut self, x: usize, y: usize, cell: Cell) {
        self.ensure_line(y);
        let line = &mut self.lines[y];
        if x >= line.len() {
            line.resize(x + 1, Cell::plain(' '));
        }
        line[x] = cell;
        self.tainted = true;
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.display.clear();
        self.partial.clear();
        self.tainted = true;
    }

    // ---------------------------------------------------------------------------------------------
    // Streaming output
    // ---------------------------------------------------------------------------------------------

    /// Append streamed output: `\n` starts a new line, `\r` empties the
    /// current one, everything else runs through the escape interpreter.
    pub fn append_str(&mut self, text: &str, mode: OutputMode) {
        let mut cells = Vec::new();
        for ch in text.chars() {
            match ch {
                '\n' => self.lines.push(Vec::new()),
                '\r' => match self.lines.last_mut() {
                    Some(last) => last.clear(),
                    None => self.lines.push(Vec::new()),
                },
                _ => {
                    cells.clear();
                    self.escape.feed(ch, mode, &mut cells);
                    if cells.is_empty() {
                        continue;
                    }
                    match self.lines.last_mut() {
                        Some(last) => last.extend_from_slice(&cells),
                        None => self.lines.push(cells.clone()),
                    }
                }
            }
        }
        self.tainted = true;
    }

    /// Byte-oriented [`append_str`](Self::append_str). A multi-byte rune split
    /// across calls is held back until its remaining bytes arrive; invalid
    /// bytes become U+FFFD.
    pub fn append_bytes(&mut self, bytes: &[u8], mode: OutputMode) {
        let mut data = std::mem::take(&mut self.partial);
        data.extend_from_slice(bytes);
        let mut rest: &[u8] = &data;
        let mut text = String::new();
        loop {
            match std::str::from_utf8(rest) {
                Ok(s) => {
                    text.push_str(s);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    text.push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match e.error_len() {
                        Some(bad) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[bad..];
                        }
                        None => {
                            self.partial = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        self.append_str(&text, mode);
    }
}

fn cells_to_string(cells: &[Cell]) -> String {
    cells.iter().map(|c| c.ch).collect()
}

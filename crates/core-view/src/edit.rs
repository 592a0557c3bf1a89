//! Cursor movement and buffer edits at the cursor.

use crate::View;
use tracing::trace;

impl View {
    /// Raw buffer position under the cursor.
    fn raw_cursor(&mut self) -> (usize, usize) {
        self.sync_wrap();
        self.buffer.real_position(self.ox + self.cx, self.oy + self.cy)
    }

    /// Move the cursor onto raw position `(rx, ry)`, scrolling as needed.
    fn place_raw(&mut self, rx: usize, ry: usize) {
        let (dx, dy) = self.buffer.display_position(rx, ry);
        self.scroll_to(dx, dy);
    }

    /// Put the cursor on absolute display position `(x, y)` and adjust the
    /// origin so it is visible.
    fn scroll_to(&mut self, x: usize, y: usize) {
        let (w, h) = self.content_dims();
        let (w, h) = (w.max(1), h.max(1));
        if self.wrap {
            self.ox = 0;
        } else if x < self.ox {
            self.ox = x;
        } else if x >= self.ox + w {
            self.ox = x + 1 - w;
        }
        if y < self.oy {
            self.oy = y;
        } else if y >= self.oy + h {
            self.oy = y + 1 - h;
        }
        self.cx = x - self.ox;
        self.cy = y - self.oy;
    }

    /// Length of display row `y`, 0 past the end.
    fn row_len(&self, y: usize) -> usize {
        self.buffer
            .display_lines()
            .get(y)
            .map_or(0, |dl| dl.len)
    }

    /// Rightmost column the cursor may occupy on display row `y`.
    fn max_col(&self, y: usize, write_mode: bool) -> usize {
        let len = self.row_len(y);
        let mut max = if write_mode { len } else { len.saturating_sub(1) };
        if self.wrap {
            max = max.min(self.content_dims().0.saturating_sub(1));
        }
        max
    }

    /// Insert (or overwrite) `ch` at the cursor and advance past it.
    pub fn edit_write(&mut self, ch: char) {
        let (rx, ry) = self.raw_cursor();
        let (nx, ny) = self.buffer.write_rune(rx, ry, ch, self.overwrite);
        self.place_raw(nx, ny);
    }

    /// Delete the rune before (`backward`) or under the cursor.
    pub fn edit_delete(&mut self, backward: bool) {
        let (rx, ry) = self.raw_cursor();
        let (nx, ny) = if backward {
            self.buffer.delete_before(rx, ry)
        } else {
            self.buffer.delete_at(rx, ry)
        };
        self.place_raw(nx, ny);
    }

    /// Split the current line at the cursor.
    pub fn edit_newline(&mut self) {
        let (rx, ry) = self.raw_cursor();
        let (nx, ny) = self.buffer.break_line(rx, ry);
        self.place_raw(nx, ny);
        trace!(target: "gui.view", view = %self.name, line = ny, "newline");
    }

    /// Move the cursor by `(dx, dy)` display cells.
    ///
    /// Navigation (`write_mode == false`) keeps the cursor on existing runes.
    /// Write mode also allows the append position one past the end of a row,
    /// and a horizontal move off either end of a row continues on the
    /// adjacent row.
    pub fn move_cursor(&mut self, dx: i32, dy: i32, write_mode: bool) {
        self.sync_wrap();
        let rows = self.buffer.display_len();
        let last_row = rows.saturating_sub(1) as i64;
        let mut x = (self.ox + self.cx) as i64 + i64::from(dx);
        let mut y = (self.oy + self.cy) as i64 + i64::from(dy);

        y = y.clamp(0, last_row);
        let row = y as usize;
        let max = self.max_col(row, write_mode) as i64;
        if dx == 0 {
            x = x.min(max);
        } else if x > max {
            if write_mode && y < last_row {
                y += 1;
                x = 0;
            } else {
                x = max;
            }
        } else if x < 0 {
            if write_mode && y > 0 {
                y -= 1;
                x = self.max_col(y as usize, write_mode) as i64;
            } else {
                x = 0;
            }
        }
        self.scroll_to(x.max(0) as usize, y as usize);
    }
}

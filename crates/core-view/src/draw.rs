//! Content rendering into a surface.

use crate::{View, ViewResult};
use core_terminal::{Attribute, Surface};

/// Per-rune override, falling back to the view color when unset.
fn resolve(attr: Attribute, fallback: Attribute) -> Attribute {
    if attr.is_default() { fallback } else { attr }
}

impl View {
    /// Blank the content area with the view colors.
    pub fn clear_runes(&self, surface: &mut dyn Surface) -> ViewResult<()> {
        let (sw, sh) = surface.size();
        let xs = (self.x0 + 1).max(0)..self.x1.min(sw);
        let ys = (self.y0 + 1).max(0)..self.y1.min(sh);
        for sy in ys {
            for sx in xs.clone() {
                surface.set_cell(sx, sy, ' ', self.fg, self.bg)?;
            }
        }
        Ok(())
    }

    /// Draw the visible window of the display buffer.
    ///
    /// Cells outside the content area or the surface are skipped. With
    /// autoscroll on, the origin is first moved so the last row is visible.
    pub fn draw(&mut self, surface: &mut dyn Surface) -> ViewResult<()> {
        self.sync_wrap();
        self.buffer.refresh();
        let (w, h) = self.content_dims();
        let rows = self.buffer.display_lines().len();
        if self.autoscroll && rows > h {
            self.oy = rows - h;
        }
        self.clear_runes(surface)?;
        if w == 0 || h == 0 {
            return Ok(());
        }

        let cursor_line = if self.highlight {
            Some(self.buffer.real_position(self.ox + self.cx, self.oy + self.cy).1)
        } else {
            None
        };

        let lines = self.buffer.display_lines();
        for (row, dl) in lines.iter().skip(self.oy).take(h).enumerate() {
            let selected = cursor_line == Some(dl.raw_y);
            let sy = self.y0 + 1 + row as i32;
            let cells = self.buffer.segment(dl);
            for (col, cell) in cells.iter().skip(self.ox).take(w).enumerate() {
                let sx = self.x0 + 1 + col as i32;
                if !surface.contains(sx, sy) {
                    continue;
                }
                let (ch, fg, bg) = match self.mask {
                    Some(m) => (m, self.fg, self.bg),
                    None if selected => (cell.ch, self.sel_fg, self.sel_bg),
                    None => (cell.ch, resolve(cell.fg, self.fg), resolve(cell.bg, self.bg)),
                };
                surface.set_cell(sx, sy, ch, fg, bg)?;
            }
        }
        Ok(())
    }
}

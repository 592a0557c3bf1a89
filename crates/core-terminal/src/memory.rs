//! Headless surface.
//!
//! `MemorySurface` is a cheap handle: clones share the same grid, so a test can
//! hand one clone to the compositor and keep another to inspect what was drawn.

use crate::style::{Attribute, InputMode};
use crate::{Surface, SurfaceError, grid_index};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryCell {
    pub ch: char,
    pub fg: Attribute,
    pub bg: Attribute,
}

impl MemoryCell {
    const BLANK: MemoryCell = MemoryCell {
        ch: ' ',
        fg: Attribute::DEFAULT,
        bg: Attribute::DEFAULT,
    };
}

#[derive(Debug)]
struct Grid {
    width: i32,
    height: i32,
    cells: Vec<MemoryCell>,
    cursor: Option<(i32, i32)>,
    input_mode: InputMode,
    flushes: usize,
}

#[derive(Debug, Clone)]
pub struct MemorySurface {
    grid: Rc<RefCell<Grid>>,
}

impl MemorySurface {
    pub fn new(width: u16, height: u16) -> Self {
        let (w, h) = (i32::from(width), i32::from(height));
        Self {
            grid: Rc::new(RefCell::new(Grid {
                width: w,
                height: h,
                cells: vec![MemoryCell::BLANK; (w * h) as usize],
                cursor: None,
                input_mode: InputMode::empty(),
                flushes: 0,
            })),
        }
    }

    pub fn cell(&self, x: i32, y: i32) -> Option<MemoryCell> {
        let g = self.grid.borrow();
        grid_index(g.width, g.height, x, y).map(|i| g.cells[i])
    }

    /// Text of row `y` with trailing blanks trimmed.
    pub fn row_text(&self, y: i32) -> String {
        let g = self.grid.borrow();
        if y < 0 || y >= g.height {
            return String::new();
        }
        let start = (y * g.width) as usize;
        let row: String = g.cells[start..start + g.width as usize]
            .iter()
            .map(|c| c.ch)
            .collect();
        row.trim_end().to_string()
    }

    /// Visible hardware cursor position, `None` when hidden.
    pub fn cursor(&self) -> Option<(i32, i32)> {
        self.grid.borrow().cursor
    }

    pub fn input_mode(&self) -> InputMode {
        self.grid.borrow().input_mode
    }

    pub fn flush_count(&self) -> usize {
        self.grid.borrow().flushes
    }
}

impl Surface for MemorySurface {
    fn size(&self) -> (i32, i32) {
        let g = self.grid.borrow();
        (g.width, g.height)
    }

    fn resize(&mut self, width: u16, height: u16) {
        let mut g = self.grid.borrow_mut();
        g.width = i32::from(width);
        g.height = i32::from(height);
        g.cells = vec![MemoryCell::BLANK; usize::from(width) * usize::from(height)];
    }

    fn set_cell(
        &mut self,
        x: i32,
        y: i32,
        ch: char,
        fg: Attribute,
        bg: Attribute,
    ) -> Result<(), SurfaceError> {
        let mut g = self.grid.borrow_mut();
        let idx = grid_index(g.width, g.height, x, y).ok_or(SurfaceError::OutOfBounds { x, y })?;
        g.cells[idx] = MemoryCell { ch, fg, bg };
        Ok(())
    }

    fn cell_at(&self, x: i32, y: i32) -> Result<char, SurfaceError> {
        self.cell(x, y)
            .map(|c| c.ch)
            .ok_or(SurfaceError::OutOfBounds { x, y })
    }

    fn clear(&mut self, fg: Attribute, bg: Attribute) {
        let mut g = self.grid.borrow_mut();
        g.cells.fill(MemoryCell { ch: ' ', fg, bg });
    }

    fn flush(&mut self) -> Result<(), SurfaceError> {
        self.grid.borrow_mut().flushes += 1;
        Ok(())
    }

    fn set_cursor(&mut self, x: i32, y: i32) {
        self.grid.borrow_mut().cursor = Some((x, y));
    }

    fn hide_cursor(&mut self) {
        self.grid.borrow_mut().cursor = None;
    }

    fn set_input_mode(&mut self, mode: InputMode) -> Result<(), SurfaceError> {
        self.grid.borrow_mut().input_mode = mode;
        Ok(())
    }
}

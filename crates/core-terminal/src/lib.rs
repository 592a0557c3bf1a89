//! Character-cell surface abstraction and its implementations.
//!
//! The compositor never talks to the terminal directly. It drives a [`Surface`]:
//! a grid of styled cells plus a hardware cursor, committed to the screen by
//! [`Surface::flush`]. Two implementations ship here:
//!
//! * [`CrosstermSurface`]: raw-mode alternate-screen terminal via crossterm.
//!   Restores the terminal on drop, even when the caller early-returns.
//! * [`MemorySurface`]: headless grid used by tests and by embedders that want
//!   to render off-screen.
//!
//! Invariants:
//! * Coordinates are `(column, row)` from the top-left corner, `(0, 0)` origin.
//! * `set_cell`/`cell_at` reject points outside `[0, w) x [0, h)` with
//!   [`SurfaceError::OutOfBounds`]; callers that want silent clipping check
//!   [`Surface::contains`] first.
//! * Nothing reaches the screen before `flush`.

use thiserror::Error;

mod crossterm_surface;
mod memory;
pub mod style;

pub use crossterm_surface::CrosstermSurface;
pub use memory::{MemoryCell, MemorySurface};
pub use style::{AttrFlags, Attribute, Color, InputMode, OutputMode};

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("invalid point ({x}, {y})")]
    OutOfBounds { x: i32, y: i32 },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Cell grid the compositor renders into.
pub trait Surface {
    /// Current size in cells (columns, rows).
    fn size(&self) -> (i32, i32);

    /// Resize the backing grid; existing content is discarded.
    fn resize(&mut self, width: u16, height: u16);

    fn set_cell(
        &mut self,
        x: i32,
        y: i32,
        ch: char,
        fg: Attribute,
        bg: Attribute,
    ) -> Result<(), SurfaceError>;

    fn cell_at(&self, x: i32, y: i32) -> Result<char, SurfaceError>;

    /// Fill every cell with a blank using the given colors.
    fn clear(&mut self, fg: Attribute, bg: Attribute);

    fn flush(&mut self) -> Result<(), SurfaceError>;

    fn set_cursor(&mut self, x: i32, y: i32);

    fn hide_cursor(&mut self);

    fn set_input_mode(&mut self, mode: InputMode) -> Result<(), SurfaceError>;

    fn contains(&self, x: i32, y: i32) -> bool {
        let (w, h) = self.size();
        x >= 0 && y >= 0 && x < w && y < h
    }
}

impl<S: Surface + ?Sized> Surface for Box<S> {
    fn size(&self) -> (i32, i32) {
        (**self).size()
    }
    fn resize(&mut self, width: u16, height: u16) {
        (**self).resize(width, height)
    }
    fn set_cell(
        &mut self,
        x: i32,
        y: i32,
        ch: char,
        fg: Attribute,
        bg: Attribute,
    ) -> Result<(), SurfaceError> {
        (**self).set_cell(x, y, ch, fg, bg)
    }
    fn cell_at(&self, x: i32, y: i32) -> Result<char, SurfaceError> {
        (**self).cell_at(x, y)
    }
    fn clear(&mut self, fg: Attribute, bg: Attribute) {
        (**self).clear(fg, bg)
    }
    fn flush(&mut self) -> Result<(), SurfaceError> {
        (**self).flush()
    }
    fn set_cursor(&mut self, x: i32, y: i32) {
        (**self).set_cursor(x, y)
    }
    fn hide_cursor(&mut self) {
        (**self).hide_cursor()
    }
    fn set_input_mode(&mut self, mode: InputMode) -> Result<(), SurfaceError> {
        (**self).set_input_mode(mode)
    }
}

/// Row-major index of `(x, y)` in a `width`-wide grid, if the point is inside.
pub(crate) fn grid_index(width: i32, height: i32, x: i32, y: i32) -> Option<usize> {
    if x < 0 || y < 0 || x >= width || y >= height {
        return None;
    }
    Some((y * width + x) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_index_bounds() {
        assert_eq!(grid_index(4, 3, 0, 0), Some(0));
        assert_eq!(grid_index(4, 3, 3, 2), Some(11));
        assert_eq!(grid_index(4, 3, 4, 0), None);
        assert_eq!(grid_index(4, 3, 0, -1), None);
    }

    #[test]
    fn boxed_surface_forwards() {
        let mut boxed: Box<dyn Surface> = Box::new(MemorySurface::new(3, 2));
        assert_eq!(boxed.size(), (3, 2));
        assert!(boxed.contains(2, 1));
        assert!(!boxed.contains(3, 1));
        boxed
            .set_cell(1, 1, 'x', Attribute::DEFAULT, Attribute::DEFAULT)
            .unwrap();
        assert_eq!(boxed.cell_at(1, 1).unwrap(), 'x');
    }
}

//! Crossterm-backed surface.
//!
//! Keeps a back buffer the compositor writes into and a front buffer mirroring
//! what the terminal currently shows. `flush` emits only the cells that differ,
//! batched with `queue!` and committed with a single stdout flush.

use crate::style::{AttrFlags, Attribute, Color, InputMode, OutputMode};
use crate::{Surface, SurfaceError, grid_index};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{
        Attribute as CtAttribute, Color as CtColor, Print, SetAttribute, SetBackgroundColor,
        SetForegroundColor,
    },
    terminal::{
        self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
        enable_raw_mode,
    },
};
use std::io::{Stdout, Write, stdout};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Styled {
    ch: char,
    fg: Attribute,
    bg: Attribute,
}

const BLANK: Styled = Styled {
    ch: ' ',
    fg: Attribute::DEFAULT,
    bg: Attribute::DEFAULT,
};

pub struct CrosstermSurface {
    out: Stdout,
    mode: OutputMode,
    width: i32,
    height: i32,
    back: Vec<Styled>,
    /// `None` forces the cell to be repainted on the next flush.
    front: Vec<Option<Styled>>,
    cursor: Option<(i32, i32)>,
    input_mode: InputMode,
    entered: bool,
}

impl CrosstermSurface {
    /// Put the terminal in raw mode on the alternate screen.
    pub fn new(mode: OutputMode) -> Result<Self, SurfaceError> {
        enable_raw_mode()?;
        let mut out = stdout();
        execute!(out, EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        let (w, h) = terminal::size()?;
        debug!(target: "terminal", cols = w, rows = h, %mode, "surface_enter");
        let mut surface = Self {
            out,
            mode,
            width: 0,
            height: 0,
            back: Vec::new(),
            front: Vec::new(),
            cursor: None,
            input_mode: InputMode::empty(),
            entered: true,
        };
        surface.resize(w, h);
        Ok(surface)
    }

    pub fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn leave(&mut self) -> Result<(), SurfaceError> {
        if self.entered {
            if self.input_mode.contains(InputMode::MOUSE) {
                execute!(self.out, DisableMouseCapture)?;
            }
            execute!(self.out, SetAttribute(CtAttribute::Reset), LeaveAlternateScreen, Show)?;
            disable_raw_mode()?;
            self.entered = false;
            debug!(target: "terminal", "surface_leave");
        }
        Ok(())
    }
}

fn map_color(mode: OutputMode, color: Color) -> CtColor {
    match color {
        Color::Default => CtColor::Reset,
        Color::Black => CtColor::Black,
        Color::Red => CtColor::DarkRed,
        Color::Green => CtColor::DarkGreen,
        Color::Yellow => CtColor::DarkYellow,
        Color::Blue => CtColor::DarkBlue,
        Color::Magenta => CtColor::DarkMagenta,
        Color::Cyan => CtColor::DarkCyan,
        Color::White => CtColor::Grey,
        Color::Indexed(n) => match mode {
            OutputMode::Color256 => CtColor::AnsiValue(n),
            OutputMode::Normal => match Color::basic(n) {
                Some(basic) => map_color(mode, basic),
                None => CtColor::Reset,
            },
        },
    }
}

/// Queue a full style switch: reset, both colors, then attribute flags.
fn queue_style<W: Write>(out: &mut W, mode: OutputMode, fg: Attribute, bg: Attribute) -> Result<(), SurfaceError> {
    let flags = fg.flags | bg.flags;
    queue!(
        out,
        SetAttribute(CtAttribute::Reset),
        SetForegroundColor(map_color(mode, fg.color)),
        SetBackgroundColor(map_color(mode, bg.color))
    )?;
    if flags.contains(AttrFlags::BOLD) {
        queue!(out, SetAttribute(CtAttribute::Bold))?;
    }
    if flags.contains(AttrFlags::UNDERLINE) {
        queue!(out, SetAttribute(CtAttribute::Underlined))?;
    }
    if flags.contains(AttrFlags::REVERSE) {
        queue!(out, SetAttribute(CtAttribute::Reverse))?;
    }
    Ok(())
}

impl Surface for CrosstermSurface {
    fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.width = i32::from(width);
        self.height = i32::from(height);
        let n = usize::from(width) * usize::from(height);
        self.back = vec![BLANK; n];
        self.front = vec![None; n];
    }

    fn set_cell(
        &mut self,
        x: i32,
        y: i32,
        ch: char,
        fg: Attribute,
        bg: Attribute,
    ) -> Result<(), SurfaceError> {
        let idx =
            grid_index(self.width, self.height, x, y).ok_or(SurfaceError::OutOfBounds { x, y })?;
        self.back[idx] = Styled { ch, fg, bg };
        Ok(())
    }

    fn cell_at(&self, x: i32, y: i32) -> Result<char, SurfaceError> {
        grid_index(self.width, self.height, x, y)
            .map(|i| self.back[i].ch)
            .ok_or(SurfaceError::OutOfBounds { x, y })
    }

    fn clear(&mut self, fg: Attribute, bg: Attribute) {
        self.back.fill(Styled { ch: ' ', fg, bg });
    }

    fn flush(&mut self) -> Result<(), SurfaceError> {
        let mut style: Option<(Attribute, Attribute)> = None;
        let mut painted = 0usize;
        queue!(self.out, Hide)?;
        for y in 0..self.height {
            // Track where the terminal cursor sits to skip redundant MoveTo.
            let mut next_x: Option<i32> = None;
            for x in 0..self.width {
                let idx = (y * self.width + x) as usize;
                let cell = self.back[idx];
                if self.front[idx] == Some(cell) {
                    continue;
                }
                if next_x != Some(x) {
                    queue!(self.out, MoveTo(x as u16, y as u16))?;
                }
                if style != Some((cell.fg, cell.bg)) {
                    queue_style(&mut self.out, self.mode, cell.fg, cell.bg)?;
                    style = Some((cell.fg, cell.bg));
                }
                queue!(self.out, Print(cell.ch))?;
                self.front[idx] = Some(cell);
                next_x = Some(x + 1);
                painted += 1;
            }
        }
        queue!(self.out, SetAttribute(CtAttribute::Reset))?;
        if let Some((x, y)) = self.cursor
            && x >= 0
            && y >= 0
        {
            queue!(self.out, MoveTo(x as u16, y as u16), Show)?;
        }
        self.out.flush()?;
        trace!(target: "terminal.flush", painted, "flush");
        Ok(())
    }

    fn set_cursor(&mut self, x: i32, y: i32) {
        self.cursor = Some((x, y));
    }

    fn hide_cursor(&mut self) {
        self.cursor = None;
    }

    fn set_input_mode(&mut self, mode: InputMode) -> Result<(), SurfaceError> {
        let had_mouse = self.input_mode.contains(InputMode::MOUSE);
        let wants_mouse = mode.contains(InputMode::MOUSE);
        if wants_mouse && !had_mouse {
            execute!(self.out, EnableMouseCapture)?;
        } else if had_mouse && !wants_mouse {
            execute!(self.out, DisableMouseCapture)?;
        }
        self.input_mode = mode;
        debug!(target: "terminal", ?mode, "input_mode");
        Ok(())
    }
}

impl Drop for CrosstermSurface {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

//! ANSI SGR interpreter for streamed view output.
//!
//! Only `ESC [ <params> m` is understood. Anything else that starts with ESC
//! is handed back verbatim so it shows up in the view rather than vanishing.

use crate::Cell;
use core_terminal::{AttrFlags, Attribute, Color, OutputMode};

const MAX_PARAMS: usize = 20;
const MAX_PARAM_LEN: usize = 255;
const ESC: char = '\x1b';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    #[default]
    Ground,
    Escape,
    Csi,
    Params,
}

#[derive(Debug, Clone, Default)]
pub struct EscapeInterpreter {
    state: State,
    params: Vec<String>,
    /// Runes consumed by the sequence in progress, replayed on failure.
    pending: Vec<char>,
    fg: Attribute,
    bg: Attribute,
}

impl EscapeInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current pen colors applied to printable runes.
    pub fn pen(&self) -> (Attribute, Attribute) {
        (self.fg, self.bg)
    }

    pub fn in_sequence(&self) -> bool {
        self.state != State::Ground
    }

    /// Feed one rune, appending any cells it produces to `out`.
    pub fn feed(&mut self, ch: char, mode: OutputMode, out: &mut Vec<Cell>) {
        match self.step(ch, mode) {
            Ok(true) => {}
            Ok(false) => out.push(Cell {
                ch,
                fg: self.fg,
                bg: self.bg,
            }),
            Err(()) => {
                out.extend(self.pending.drain(..).map(Cell::plain));
                self.state = State::Ground;
                self.params.clear();
            }
        }
    }

    /// `Ok(true)` when `ch` was swallowed by an escape sequence, `Ok(false)`
    /// when it is a printable rune, `Err` when the sequence is malformed.
    fn step(&mut self, ch: char, mode: OutputMode) -> Result<bool, ()> {
        if self.state != State::Ground {
            self.pending.push(ch);
        }
        if self.params.len() > MAX_PARAMS
            || self.params.last().is_some_and(|p| p.len() > MAX_PARAM_LEN)
        {
            return Err(());
        }
        match self.state {
            State::Ground => {
                if ch == ESC {
                    self.pending.clear();
                    self.pending.push(ch);
                    self.state = State::Escape;
                    return Ok(true);
                }
                Ok(false)
            }
            State::Escape => {
                if ch == '[' {
                    self.state = State::Csi;
                    return Ok(true);
                }
                Err(())
            }
            State::Csi => {
                match ch {
                    '0'..='9' => self.params.push(String::new()),
                    'm' => self.params.push("0".into()),
                    _ => return Err(()),
                }
                self.state = State::Params;
                self.param_rune(ch, mode)
            }
            State::Params => self.param_rune(ch, mode),
        }
    }

    fn param_rune(&mut self, ch: char, mode: OutputMode) -> Result<bool, ()> {
        match ch {
            '0'..='9' => {
                if let Some(last) = self.params.last_mut() {
                    last.push(ch);
                }
                Ok(true)
            }
            ';' => {
                self.params.push(String::new());
                Ok(true)
            }
            'm' => {
                let params: Vec<u16> = self
                    .params
                    .iter()
                    .map(|p| if p.is_empty() { Ok(0) } else { p.parse::<u16>() })
                    .collect::<Result<_, _>>()
                    .map_err(|_| ())?;
                match mode {
                    OutputMode::Normal => self.apply_basic(&params),
                    OutputMode::Color256 => self.apply_256(&params)?,
                }
                self.state = State::Ground;
                self.params.clear();
                self.pending.clear();
                Ok(true)
            }
            _ => Err(()),
        }
    }

    fn apply_basic(&mut self, params: &[u16]) {
        for &p in params {
            match p {
                0 => {
                    self.fg = Attribute::DEFAULT;
                    self.bg = Attribute::DEFAULT;
                }
                1 => self.fg.flags |= AttrFlags::BOLD,
                4 => self.fg.flags |= AttrFlags::UNDERLINE,
                7 => self.fg.flags |= AttrFlags::REVERSE,
                30..=37 => self.fg.color = basic(p - 30),
                39 => self.fg.color = Color::Default,
                40..=47 => self.bg.color = basic(p - 40),
                49 => self.bg.color = Color::Default,
                _ => {}
            }
        }
    }

    fn apply_256(&mut self, params: &[u16]) -> Result<(), ()> {
        let [which, 5, index, rest @ ..] = params else {
            self.apply_basic(params);
            return Ok(());
        };
        let color = Color::Indexed(u8::try_from(*index).map_err(|_| ())?);
        match *which {
            38 => {
                self.fg.color = color;
                for p in rest {
                    match *p {
                        1 => self.fg.flags |= AttrFlags::BOLD,
                        4 => self.fg.flags |= AttrFlags::UNDERLINE,
                        7 => self.fg.flags |= AttrFlags::REVERSE,
                        _ => {}
                    }
                }
            }
            48 => self.bg.color = color,
            _ => return Err(()),
        }
        Ok(())
    }
}

fn basic(offset: u16) -> Color {
    u8::try_from(offset)
        .ok()
        .and_then(Color::basic)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(input: &str, mode: OutputMode) -> (Vec<Cell>, EscapeInterpreter) {
        let mut ei = EscapeInterpreter::new();
        let mut out = Vec::new();
        for ch in input.chars() {
            ei.feed(ch, mode, &mut out);
        }
        (out, ei)
    }

    fn text(cells: &[Cell]) -> String {
        cells.iter().map(|c| c.ch).collect()
    }

    #[test]
    fn plain_text_passes_through() {
        let (cells, _) = run("hello", OutputMode::Normal);
        assert_eq!(text(&cells), "hello");
        assert!(cells.iter().all(|c| c.fg.is_default() && c.bg.is_default()));
    }

    #[test]
    fn sgr_colors_apply_to_following_runes() {
        let (cells, ei) = run("a\x1b[31;44mb\x1b[0mc", OutputMode::Normal);
        assert_eq!(text(&cells), "abc");
        assert_eq!(cells[0].fg, Attribute::DEFAULT);
        assert_eq!(cells[1].fg.color, Color::Red);
        assert_eq!(cells[1].bg.color, Color::Blue);
        assert_eq!(cells[2].fg, Attribute::DEFAULT);
        assert!(!ei.in_sequence());
    }

    #[test]
    fn attributes_accumulate_on_foreground() {
        let (cells, _) = run("\x1b[1;4;7mx", OutputMode::Normal);
        assert_eq!(
            cells[0].fg.flags,
            AttrFlags::BOLD | AttrFlags::UNDERLINE | AttrFlags::REVERSE
        );
    }

    #[test]
    fn bare_reset_clears_pen() {
        let (cells, _) = run("\x1b[32m\x1b[mz", OutputMode::Normal);
        assert_eq!(cells[0].fg, Attribute::DEFAULT);
    }

    #[test]
    fn palette_index_only_in_256_mode() {
        let (cells, _) = run("\x1b[38;5;200mx\x1b[48;5;17my", OutputMode::Color256);
        assert_eq!(cells[0].fg.color, Color::Indexed(200));
        assert_eq!(cells[1].bg.color, Color::Indexed(17));

        // Normal mode reads 38;5;200 as plain SGR params and ignores them.
        let (cells, _) = run("\x1b[38;5;200mx", OutputMode::Normal);
        assert_eq!(cells[0].fg.color, Color::Default);
    }

    #[test]
    fn malformed_sequences_written_literally() {
        let (cells, ei) = run("\x1b(x", OutputMode::Normal);
        assert_eq!(text(&cells), "\x1b(x");
        assert!(!ei.in_sequence());

        let (cells, _) = run("\x1b[12Hz", OutputMode::Normal);
        assert_eq!(text(&cells), "\x1b[12Hz");
    }

    #[test]
    fn unknown_256_selector_is_literal() {
        let (cells, _) = run("\x1b[58;5;1m", OutputMode::Color256);
        assert_eq!(text(&cells), "\x1b[58;5;1m");
    }
}

//! One frame: clear, layout, frames and content in z-order, cursor, flush.

use crate::{Gui, GuiResult};
use core_terminal::{Attribute, Surface};
use core_view::View;
use tracing::debug;

struct Glyphs {
    horizontal: char,
    vertical: char,
    corners: [char; 4],
}

const UNICODE: Glyphs = Glyphs {
    horizontal: '─',
    vertical: '│',
    corners: ['┌', '┐', '└', '┘'],
};

const ASCII: Glyphs = Glyphs {
    horizontal: '-',
    vertical: '|',
    corners: ['+'; 4],
};

/// Write a frame glyph, skipping points off the surface.
fn put(surface: &mut dyn Surface, x: i32, y: i32, ch: char, fg: Attribute, bg: Attribute) -> GuiResult<()> {
    if surface.contains(x, y) {
        surface.set_cell(x, y, ch, fg, bg)?;
    }
    Ok(())
}

fn draw_frame(surface: &mut dyn Surface, view: &View, glyphs: &Glyphs, fg: Attribute, bg: Attribute) -> GuiResult<()> {
    let (x0, y0, x1, y1) = view.bounds();
    let (sw, sh) = surface.size();
    for x in (x0 + 1).max(0)..x1.min(sw) {
        put(surface, x, y0, glyphs.horizontal, fg, bg)?;
        put(surface, x, y1, glyphs.horizontal, fg, bg)?;
    }
    for y in (y0 + 1).max(0)..y1.min(sh) {
        put(surface, x0, y, glyphs.vertical, fg, bg)?;
        put(surface, x1, y, glyphs.vertical, fg, bg)?;
    }
    let [tl, tr, bl, br] = glyphs.corners;
    for (x, y, ch) in [(x0, y0, tl), (x1, y0, tr), (x0, y1, bl), (x1, y1, br)] {
        put(surface, x, y, ch, fg, bg)?;
    }
    Ok(())
}

/// Title starts two columns right of the top-left corner and stops before
/// the corner on the right.
fn draw_title(surface: &mut dyn Surface, view: &View, fg: Attribute, bg: Attribute) -> GuiResult<()> {
    let (x0, y0, x1, _) = view.bounds();
    let (max_x, _) = surface.size();
    for (i, ch) in view.title().chars().enumerate() {
        let x = x0 + 2 + i as i32;
        if x > x1 - 2 || x >= max_x {
            break;
        }
        put(surface, x, y0, ch, fg, bg)?;
    }
    Ok(())
}

impl Gui {
    /// Run one layout and render pass and flush the surface.
    ///
    /// The main loop calls this after every burst of events; embedders
    /// driving frames themselves may call it directly.
    pub fn flush(&mut self) -> GuiResult<()> {
        let (fg, bg) = (self.options.fg, self.options.bg);
        self.surface.clear(fg, bg);

        let (w, h) = self.surface.size();
        if (w, h) != (self.max_x, self.max_y) {
            debug!(target: "gui.view", from_w = self.max_x, from_h = self.max_y, w, h, "invalidate_all");
            for v in &mut self.views {
                v.invalidate();
            }
            (self.max_x, self.max_y) = (w, h);
        }

        self.layout()?;

        let glyphs = if self.options.ascii { &ASCII } else { &UNICODE };
        let (sel_fg, sel_bg) = (self.options.sel_fg, self.options.sel_bg);
        let surface: &mut dyn Surface = &mut *self.surface;
        for view in &mut self.views {
            if view.frame() {
                let focused = self.current.as_deref() == Some(view.name());
                let (ffg, fbg) = if self.options.highlight && focused {
                    (sel_fg, sel_bg)
                } else {
                    (fg, bg)
                };
                draw_frame(surface, view, glyphs, ffg, fbg)?;
                if !view.title().is_empty() {
                    draw_title(surface, view, ffg, fbg)?;
                }
            }
            view.draw(surface)?;
        }

        self.place_cursor();
        self.surface.flush()?;
        Ok(())
    }

    fn place_cursor(&mut self) {
        if !self.options.cursor {
            self.surface.hide_cursor();
            return;
        }
        let Some(view) = self.current_view_mut() else {
            self.surface.hide_cursor();
            return;
        };
        let (cx, cy) = view.clamp_cursor();
        let (x0, y0, _, _) = view.bounds();
        let (x, y) = (x0 + 1 + cx, y0 + 1 + cy);
        if self.surface.contains(x, y) {
            self.surface.set_cursor(x, y);
        } else {
            self.surface.hide_cursor();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Gui;
    use core_input::ChannelEventSource;
    use core_terminal::{Attribute, Color, MemorySurface};
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn gui_on(surface: &MemorySurface) -> Gui {
        let (_tx, src) = ChannelEventSource::pair();
        Gui::new(surface.clone(), src)
    }

    #[test]
    fn frame_title_and_content() {
        let s = MemorySurface::new(20, 6);
        let mut g = gui_on(&s);
        let v = g.set_view("v", 0, 0, 10, 3).unwrap().into_view();
        v.set_title("Title too long");
        write!(v, "hi").unwrap();
        g.flush().unwrap();
        // Clipped before the last two columns of the top edge.
        assert_eq!(s.row_text(0), "┌─Title t─┐");
        assert_eq!(s.row_text(1), "│hi       │");
        assert_eq!(s.row_text(2), "│         │");
        assert_eq!(s.row_text(3), format!("└{}┘", "─".repeat(9)));
        assert_eq!(s.flush_count(), 1);
    }

    #[test]
    fn ascii_frames_and_frameless_views() {
        let s = MemorySurface::new(12, 4);
        let mut g = gui_on(&s);
        g.set_ascii(true);
        g.set_view("a", 0, 0, 3, 2).unwrap();
        g.set_view("b", 5, 0, 9, 2).unwrap().into_view().set_frame(false);
        g.flush().unwrap();
        assert_eq!(s.row_text(0), "+--+");
        assert_eq!(s.row_text(1), "|  |");
        assert_eq!(s.row_text(2), "+--+");
    }

    #[test]
    fn frames_clip_at_surface_edge() {
        let s = MemorySurface::new(6, 3);
        let mut g = gui_on(&s);
        g.set_view("big", -2, -1, 10, 5).unwrap();
        g.flush().unwrap();
        assert_eq!(s.row_text(0), "");
        assert_eq!(s.row_text(1), "");
    }

    #[test]
    fn focused_frame_uses_selection_colors() {
        let s = MemorySurface::new(20, 6);
        let mut g = gui_on(&s);
        g.set_highlight(true);
        g.set_sel_bg_fg_color(Color::Default, Color::Green);
        g.set_view("a", 0, 0, 5, 3).unwrap();
        g.set_view("b", 6, 0, 11, 3).unwrap();
        g.set_current_view("b").unwrap();
        g.flush().unwrap();
        assert_eq!(s.cell(6, 0).unwrap().fg, Attribute::new(Color::Green));
        assert_eq!(s.cell(0, 0).unwrap().fg, Attribute::DEFAULT);
    }

    #[test]
    fn cursor_follows_focus_and_toggle() {
        let s = MemorySurface::new(20, 6);
        let mut g = gui_on(&s);
        g.set_view("a", 2, 1, 12, 5).unwrap();
        g.set_current_view("a").unwrap().set_cursor(3, 1).unwrap();
        g.flush().unwrap();
        assert_eq!(s.cursor(), None);

        g.set_cursor(true);
        g.flush().unwrap();
        assert_eq!(s.cursor(), Some((6, 3)));
    }

    #[test]
    fn shrinking_view_stores_clamped_cursor() {
        let s = MemorySurface::new(30, 10);
        let mut g = gui_on(&s);
        g.set_cursor(true);
        g.set_view("v", 0, 0, 20, 5).unwrap();
        g.set_current_view("v").unwrap().set_cursor(15, 2).unwrap();
        g.flush().unwrap();
        assert_eq!(s.cursor(), Some((16, 3)));

        g.set_view("v", 0, 0, 6, 3).unwrap();
        g.flush().unwrap();
        assert_eq!(s.cursor(), Some((5, 2)));
        let v = g.view_mut("v").unwrap();
        assert_eq!(v.cursor(), (4, 1));
        v.edit_write('X');
        assert_eq!(v.buffer(), "\n    X");
    }

    #[test]
    fn huge_view_renders_only_the_visible_area() {
        let s = MemorySurface::new(80, 24);
        let mut g = gui_on(&s);
        g.set_view("huge", 0, 0, 20_000, 20_000).unwrap();
        let started = std::time::Instant::now();
        g.flush().unwrap();
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
        assert_eq!(s.row_text(0), format!("┌{}", "─".repeat(79)));
        assert_eq!(s.row_text(23), "│");
    }

    #[test]
    fn resize_invalidates_views() {
        let mut s = MemorySurface::new(20, 6);
        let mut g = gui_on(&s);
        let v = g.set_view("w", 0, 0, 11, 4).unwrap().into_view();
        v.set_wrap(true);
        write!(v, "{}", "x".repeat(25)).unwrap();
        g.flush().unwrap();
        assert_eq!(s.row_text(3), "│xxxxx     │");

        use core_terminal::Surface;
        s.resize(30, 8);
        g.set_view("w", 0, 0, 6, 7).unwrap();
        g.flush().unwrap();
        assert_eq!(g.size(), (30, 8));
        assert_eq!(g.view_mut("w").unwrap().view_buffer().lines().count(), 5);
        assert_eq!(g.view("w").unwrap().buffer(), "x".repeat(25));
    }
}

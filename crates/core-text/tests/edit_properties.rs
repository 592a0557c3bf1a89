//! Property tests for TextBuffer editing and wrapping.

use core_text::TextBuffer;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Write(char),
    Overwrite(char),
    Newline,
    DeleteBefore,
    DeleteAt,
    Left,
    Up,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => prop::char::range('a', 'z').prop_map(Op::Write),
        1 => prop::char::range('A', 'Z').prop_map(Op::Overwrite),
        1 => Just(Op::Newline),
        2 => Just(Op::DeleteBefore),
        1 => Just(Op::DeleteAt),
        1 => Just(Op::Left),
        1 => Just(Op::Up),
    ]
}

/// Replay `ops` from an empty buffer, keeping the cursor on existing content.
fn replay(ops: &[Op]) -> (TextBuffer, (usize, usize)) {
    let mut buf = TextBuffer::new();
    let mut cur = (0usize, 0usize);
    for op in ops {
        cur = match op {
            Op::Write(c) => buf.write_rune(cur.0, cur.1, *c, false),
            Op::Overwrite(c) => buf.write_rune(cur.0, cur.1, *c, true),
            Op::Newline => buf.break_line(cur.0, cur.1),
            Op::DeleteBefore => buf.delete_before(cur.0, cur.1),
            Op::DeleteAt => buf.delete_at(cur.0, cur.1),
            Op::Left => (cur.0.saturating_sub(1), cur.1),
            Op::Up => {
                let y = cur.1.saturating_sub(1);
                (cur.0.min(buf.line_len(y)), y)
            }
        };
    }
    (buf, cur)
}

proptest! {
    #[test]
    fn delete_before_at_absolute_start_is_noop(ops in prop::collection::vec(op(), 0..60)) {
        let (mut buf, _) = replay(&ops);
        let before = buf.raw_string();
        let cur = buf.delete_before(0, 0);
        prop_assert_eq!(cur, (0, 0));
        prop_assert_eq!(buf.raw_string(), before);
    }

    #[test]
    fn delete_at_absolute_end_is_noop(ops in prop::collection::vec(op(), 0..60)) {
        let (mut buf, _) = replay(&ops);
        let before = buf.raw_string();
        let last = buf.line_count().saturating_sub(1);
        buf.delete_at(buf.line_len(last), last);
        prop_assert_eq!(buf.raw_string(), before);
    }

    #[test]
    fn inserting_a_string_reads_back_verbatim(s in "[a-z ]{0,20}(\n[a-z ]{0,20}){0,4}") {
        let mut buf = TextBuffer::new();
        let mut cur = (0, 0);
        for ch in s.chars() {
            cur = if ch == '\n' {
                buf.break_line(cur.0, cur.1)
            } else {
                buf.write_rune(cur.0, cur.1, ch, false)
            };
        }
        prop_assert_eq!(buf.raw_string(), s);
    }

    #[test]
    fn overwrite_inside_content_keeps_length(s in "[a-z]{1,30}", at in 0usize..30, ch in prop::char::range('A', 'Z')) {
        let mut buf = TextBuffer::from_text(&s);
        let x = at % s.len();
        buf.write_rune(x, 0, ch, true);
        prop_assert_eq!(buf.line_len(0), s.len());
        prop_assert_eq!(buf.line(0).unwrap()[x].ch, ch);
    }

    #[test]
    fn wrapping_preserves_raw_content(lines in prop::collection::vec("[a-z]{0,40}", 1..6), width in 1usize..16) {
        let text = lines.join("\n");
        let mut buf = TextBuffer::from_text(&text);
        buf.set_wrap_width(Some(width));
        buf.refresh();
        for (y, line) in lines.iter().enumerate() {
            let rows: Vec<_> = buf.display_lines().iter().filter(|d| d.raw_y == y).copied().collect();
            let expected_rows = if line.len() < width { 1 } else { line.len() / width + 1 };
            prop_assert_eq!(rows.len(), expected_rows);
            let joined: String = rows
                .iter()
                .flat_map(|d| buf.segment(d).iter().map(|c| c.ch))
                .collect();
            prop_assert_eq!(&joined, line);
            prop_assert!(rows.iter().all(|d| d.len <= width));
        }
        prop_assert_eq!(buf.raw_string(), text);
    }

    #[test]
    fn display_and_real_positions_are_inverse(lines in prop::collection::vec("[a-z]{0,30}", 1..5), width in 1usize..12, pick in 0usize..200) {
        let text = lines.join("\n");
        let mut buf = TextBuffer::from_text(&text);
        buf.set_wrap_width(Some(width));
        let y = pick % lines.len();
        let x = pick % (lines[y].len() + 1);
        let (dx, dy) = buf.display_position(x, y);
        prop_assert_eq!(buf.real_position(dx, dy), (x, y));
    }
}

//! End-to-end escape-sequence scenarios against a full `Terminal`.

use pretty_assertions::assert_eq;
use vt_term::{Color, MouseEncoding, Terminal};

fn glyph(term: &Terminal, row: usize, col: usize) -> String {
    term.snapshot().buffer.line(row).unwrap().get(col).unwrap().glyph.to_string()
}

#[test]
fn scenario_1_hello_positions_cursor() {
    let mut term = Terminal::new(80, 24);
    term.feed(b"Hello");
    assert_eq!(glyph(&term, 0, 0), "H");
    assert_eq!(glyph(&term, 0, 4), "o");
    assert_eq!(term.snapshot().cursor_row, 0);
    assert_eq!(term.snapshot().cursor_col, 5);
    assert_eq!(glyph(&term, 0, 5), " ");
}

#[test]
fn scenario_2_sgr_applies_and_resets() {
    let mut term = Terminal::new(80, 24);
    term.feed(b"\x1b[31;1mX\x1b[0mY");
    let cell0 = term.snapshot().buffer.line(0).unwrap().get(0).unwrap().clone();
    assert_eq!(&*cell0.glyph, "X");
    assert_eq!(cell0.style.fg, Color::Indexed(1));
    assert!(cell0.style.attrs.contains(vt_term::Attrs::BOLD));
    let cell1 = term.snapshot().buffer.line(0).unwrap().get(1).unwrap().clone();
    assert_eq!(&*cell1.glyph, "Y");
    assert_eq!(cell1.style, vt_term::Style::default());
}

#[test]
fn scenario_3_cup_positions_then_writes() {
    let mut term = Terminal::new(80, 24);
    term.feed(b"A\x1b[5;10HB");
    assert_eq!(glyph(&term, 0, 0), "A");
    assert_eq!(glyph(&term, 4, 9), "B");
    assert_eq!(term.snapshot().cursor_row, 4);
    assert_eq!(term.snapshot().cursor_col, 10);
}

#[test]
fn scenario_4_clear_then_home_then_write() {
    let mut term = Terminal::new(80, 24);
    term.feed(b"garbage everywhere");
    term.feed(b"\x1b[2J\x1b[HDone");
    assert_eq!(glyph(&term, 0, 0), "D");
    assert_eq!(glyph(&term, 0, 1), "o");
    assert_eq!(glyph(&term, 0, 2), "n");
    assert_eq!(glyph(&term, 0, 3), "e");
    assert_eq!(glyph(&term, 0, 4), " ");
    assert_eq!(term.snapshot().cursor_row, 0);
    assert_eq!(term.snapshot().cursor_col, 4);
    // everything else on the (cleared) buffer is blank
    for row in 1..24 {
        assert!(term.snapshot().buffer.line(row).unwrap().get(0).unwrap().is_blank());
    }
}

#[test]
fn scenario_5_line_feed_scrolls_a_3_row_buffer() {
    let mut term = Terminal::new(10, 3);
    term.feed(b"1\r\n2\r\n3");
    assert_eq!(glyph(&term, 0, 0), "1");
    assert_eq!(glyph(&term, 1, 0), "2");
    assert_eq!(glyph(&term, 2, 0), "3");
    assert_eq!(term.snapshot().cursor_row, 2);

    term.feed(b"\r\n4");
    assert_eq!(glyph(&term, 0, 0), "2");
    assert_eq!(glyph(&term, 1, 0), "3");
    assert_eq!(glyph(&term, 2, 0), "4");
}

#[test]
fn scenario_6_alternate_buffer_round_trip() {
    let mut term = Terminal::new(10, 3);
    term.feed(b"primary content");
    term.feed(b"\x1b[?1049h");
    term.feed(b"alt");
    assert_eq!(glyph(&term, 0, 0), "a");
    term.feed(b"\x1b[?1049l");
    assert_eq!(glyph(&term, 0, 0), "p");
}

#[test]
fn scenario_7_device_status_report_enqueues_cursor_position() {
    let mut term = Terminal::new(80, 24);
    term.feed(b"\x1b[5;10H");
    term.feed(b"\x1b[6n");
    assert_eq!(term.take_output(), b"\x1b[5;10R");
}

#[test]
fn scenario_8_utf8_codepoint_split_across_feeds() {
    let mut term = Terminal::new(80, 24);
    let bytes = "é".as_bytes().to_vec();
    term.feed(&bytes[..1]);
    term.feed(&bytes[1..]);
    assert_eq!(glyph(&term, 0, 0), "é");
}

#[test]
fn scenario_9_origin_mode_clamps_cup_to_scroll_region() {
    let mut term = Terminal::new(80, 24);
    term.feed(b"\x1b[5;10r"); // DECSTBM rows 5..10, 1-based
    term.feed(b"\x1b[?6h"); // origin mode on
    term.feed(b"\x1b[1;1H"); // CUP 1;1
    assert_eq!(term.snapshot().cursor_row, 4);
    assert_eq!(term.snapshot().cursor_col, 0);
}

#[test]
fn scenario_10_two_wide_glyphs_in_a_row() {
    let mut term = Terminal::new(80, 24);
    term.feed("世世".as_bytes());
    assert_eq!(glyph(&term, 0, 0), "世");
    assert!(term.snapshot().buffer.line(0).unwrap().get(1).unwrap().is_wide_continuation());
    assert_eq!(glyph(&term, 0, 2), "世");
    assert!(term.snapshot().buffer.line(0).unwrap().get(3).unwrap().is_wide_continuation());
    assert_eq!(term.snapshot().cursor_col, 4);
}

#[test]
fn sgr_mouse_mode_round_trip_and_encoding() {
    let mut term = Terminal::new(80, 24);
    term.feed(b"\x1b[?1000h\x1b[?1006h");
    let bytes = term.input_mouse(
        5,
        10,
        vt_term::MouseButton::Left,
        vt_term::MouseAction::Press,
        vt_term::Modifiers::empty(),
    );
    assert_eq!(bytes, b"\x1b[<0;5;10M");
    term.feed(b"\x1b[?1000l");
    let bytes = term.input_mouse(
        5,
        10,
        vt_term::MouseButton::Left,
        vt_term::MouseAction::Press,
        vt_term::Modifiers::empty(),
    );
    assert!(bytes.is_empty());
    assert_eq!(term.mouse_encoding, MouseEncoding::Sgr);
}

#[test]
fn bracketed_paste_wraps_when_mode_set() {
    let mut term = Terminal::new(80, 24);
    term.feed(b"\x1b[?2004h");
    let wrapped = term.encode_paste(b"pasted");
    assert_eq!(wrapped, b"\x1b[200~pasted\x1b[201~");
}

#[test]
fn soft_reset_restores_defaults_without_touching_buffer() {
    let mut term = Terminal::new(80, 24);
    term.feed(b"\x1b[31mred text\x1b[5;10r");
    term.feed(b"\x1b[!p");
    assert_eq!(glyph(&term, 0, 0), "r");
    term.feed(b"\x1b[HZ");
    let cell = term.snapshot().buffer.line(0).unwrap().get(0).unwrap().clone();
    assert_eq!(cell.style, vt_term::Style::default());
}

#[test]
fn full_reset_clears_buffer_and_cursor() {
    let mut term = Terminal::new(80, 24);
    term.feed(b"\x1b[10;10Hsomething");
    term.feed(b"\x1bc");
    assert_eq!(term.snapshot().cursor_row, 0);
    assert_eq!(term.snapshot().cursor_col, 0);
    assert!(term.snapshot().buffer.line(9).unwrap().get(9).unwrap().is_blank());
}

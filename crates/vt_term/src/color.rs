//! Color and style model (SGR attributes).

use bitflags::bitflags;

/// A foreground, background, or underline color. Equality is structural,
/// so `Color::Default` compares equal to itself but to nothing else —
/// resolving it to an actual RGB value is an embedder/rendering concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Color {
    #[default]
    Default,
    Indexed(u8),
    Rgb(u8, u8, u8),
}

/// Underline rendering, separate from the other boolean attributes because
/// it has more than two states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Underline {
    #[default]
    None,
    Single,
    Double,
    Curly,
    Dotted,
    Dashed,
}

bitflags! {
    /// Boolean SGR attributes. Underline is tracked separately in
    /// [`Style::underline`] since it is multi-valued.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Attrs: u16 {
        const BOLD        = 0b0000_0000_0001;
        const DIM         = 0b0000_0000_0010;
        const ITALIC      = 0b0000_0000_0100;
        const BLINK       = 0b0000_0000_1000;
        const INVERSE     = 0b0000_0001_0000;
        const HIDDEN      = 0b0000_0010_0000;
        const STRIKE      = 0b0000_0100_0000;
        const OVERLINE    = 0b0000_1000_0000;
    }
}

/// A complete SGR rendition state for a cell. `Style::default()` is the
/// "no attributes, default colors" style that every freshly cleared cell
/// carries, and compares equal to any other all-default style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    pub fg: Color,
    pub bg: Color,
    pub underline_color: Color,
    pub underline: Underline,
    pub attrs: Attrs,
}

impl Style {
    pub fn reset(&mut self) {
        *self = Style::default();
    }

    /// Apply one SGR parameter set (as parsed from a single `CSI...m`
    /// sequence, already split into top-level params with their
    /// `:`-separated sub-params) to this style. Unrecognized codes are
    /// silently ignored per spec.
    pub fn apply_sgr(&mut self, params: &[vt_parser::CsiParam]) {
        if params.is_empty() {
            self.reset();
            return;
        }
        let mut i = 0;
        while i < params.len() {
            let code = params[i].value;
            match code {
                0 => self.reset(),
                1 => self.attrs.insert(Attrs::BOLD),
                2 => self.attrs.insert(Attrs::DIM),
                3 => self.attrs.insert(Attrs::ITALIC),
                4 => {
                    self.underline = match params[i].sub_params.first() {
                        Some(0) => Underline::None,
                        Some(2) => Underline::Double,
                        Some(3) => Underline::Curly,
                        Some(4) => Underline::Dotted,
                        Some(5) => Underline::Dashed,
                        _ => Underline::Single,
                    };
                }
                5 => self.attrs.insert(Attrs::BLINK),
                7 => self.attrs.insert(Attrs::INVERSE),
                8 => self.attrs.insert(Attrs::HIDDEN),
                9 => self.attrs.insert(Attrs::STRIKE),
                21 => self.underline = Underline::Double,
                22 => self.attrs.remove(Attrs::BOLD | Attrs::DIM),
                23 => self.attrs.remove(Attrs::ITALIC),
                24 => self.underline = Underline::None,
                25 => self.attrs.remove(Attrs::BLINK),
                27 => self.attrs.remove(Attrs::INVERSE),
                28 => self.attrs.remove(Attrs::HIDDEN),
                29 => self.attrs.remove(Attrs::STRIKE),
                30..=37 => self.fg = Color::Indexed(code as u8 - 30),
                38 => {
                    if let Some((color, consumed)) = parse_extended_color(&params[i..]) {
                        self.fg = color;
                        i += consumed - 1;
                    }
                }
                39 => self.fg = Color::Default,
                40..=47 => self.bg = Color::Indexed(code as u8 - 40),
                48 => {
                    if let Some((color, consumed)) = parse_extended_color(&params[i..]) {
                        self.bg = color;
                        i += consumed - 1;
                    }
                }
                49 => self.bg = Color::Default,
                53 => self.attrs.insert(Attrs::OVERLINE),
                55 => self.attrs.remove(Attrs::OVERLINE),
                58 => {
                    if let Some((color, consumed)) = parse_extended_color(&params[i..]) {
                        self.underline_color = color;
                        i += consumed - 1;
                    }
                }
                59 => self.underline_color = Color::Default,
                90..=97 => self.fg = Color::Indexed(code as u8 - 90 + 8),
                100..=107 => self.bg = Color::Indexed(code as u8 - 100 + 8),
                _ => log::debug!("unrecognized SGR parameter {code}"),
            }
            i += 1;
        }
    }
}

/// Parse the extended-color tail of an SGR sequence starting at `38`/`48`/`58`.
/// Handles both the classic `;`-separated form (`38;5;n`, `38;2;r;g;b`) and
/// the `:`-sub-parameter form (`38:5:n`, `38:2::r:g:b`). Returns the decoded
/// color and how many top-level params (including the `38`/`48`/`58` itself)
/// were consumed.
fn parse_extended_color(params: &[vt_parser::CsiParam]) -> Option<(Color, usize)> {
    debug_assert!(!params.is_empty());
    // Sub-parameter form: `38:5:n` or `38:2::r:g:b` — everything lives in
    // params[0].sub_params.
    if !params[0].sub_params.is_empty() {
        let sub = &params[0].sub_params;
        return match sub.first() {
            Some(5) => sub.get(1).map(|n| (Color::Indexed(*n as u8), 1)),
            Some(2) => {
                // sub-param layout is `2 : [colorspace] : r : g : b`; the
                // optional colorspace id means r/g/b may be at offset 1 or 2.
                let rgb = if sub.len() >= 5 { &sub[2..5] } else { sub.get(1..4)? };
                Some((Color::Rgb(rgb[0] as u8, rgb[1] as u8, rgb[2] as u8), 1))
            }
            _ => None,
        };
    }
    // Classic `;`-separated form.
    match params.get(1).map(|p| p.value) {
        Some(5) => params.get(2).map(|n| (Color::Indexed(n.value as u8), 3)),
        Some(2) => {
            let r = params.get(2)?.value as u8;
            let g = params.get(3)?.value as u8;
            let b = params.get(4)?.value as u8;
            Some((Color::Rgb(r, g, b), 5))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vt_parser::CsiParam;

    fn params(values: &[u16]) -> Vec<CsiParam> {
        values.iter().map(|&v| CsiParam::new(v)).collect()
    }

    #[test]
    fn reset_clears_everything() {
        let mut s = Style {
            fg: Color::Indexed(1),
            attrs: Attrs::BOLD,
            ..Default::default()
        };
        s.apply_sgr(&params(&[0]));
        assert_eq!(s, Style::default());
    }

    #[test]
    fn bold_and_fg_red() {
        let mut s = Style::default();
        s.apply_sgr(&params(&[31, 1]));
        assert_eq!(s.fg, Color::Indexed(1));
        assert!(s.attrs.contains(Attrs::BOLD));
    }

    #[test]
    fn indexed_256_classic_form() {
        let mut s = Style::default();
        s.apply_sgr(&params(&[38, 5, 201]));
        assert_eq!(s.fg, Color::Indexed(201));
    }

    #[test]
    fn rgb_classic_form() {
        let mut s = Style::default();
        s.apply_sgr(&params(&[48, 2, 10, 20, 30]));
        assert_eq!(s.bg, Color::Rgb(10, 20, 30));
    }

    #[test]
    fn rgb_sub_param_form() {
        let mut s = Style::default();
        let mut p = CsiParam::new(38);
        p.sub_params = vec![2, 0, 255, 0, 0];
        s.apply_sgr(&[p]);
        assert_eq!(s.fg, Color::Rgb(255, 0, 0));
    }

    #[test]
    fn indexed_256_sub_param_form() {
        let mut s = Style::default();
        let mut p = CsiParam::new(38);
        p.sub_params = vec![5, 201];
        s.apply_sgr(&[p]);
        assert_eq!(s.fg, Color::Indexed(201));
    }

    #[test]
    fn unknown_param_ignored() {
        let mut s = Style::default();
        s.apply_sgr(&params(&[1, 26, 31]));
        assert!(s.attrs.contains(Attrs::BOLD));
        assert_eq!(s.fg, Color::Indexed(1));
    }

    #[test]
    fn double_underline_via_21_and_via_4_2() {
        let mut s = Style::default();
        s.apply_sgr(&params(&[21]));
        assert_eq!(s.underline, Underline::Double);
    }
}

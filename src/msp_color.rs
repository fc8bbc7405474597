use ratatui::style::Color;
use term_color_support::ColorSupport;

/// Named colours of the game palette
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Background,
    Panel,
    CellHidden,
    CellRevealed,
    CellHover,
    Mine,
    Flag,
    Text,
    Number(u8),    // 1..=8
    Celebrate(u8), // animation frame 0..=4
}

impl Tone {
    /// Reference RGB value and the closest basic ANSI colour
    fn swatch(self) -> ((u8, u8, u8), Color) {
        match self {
            Tone::Background =>   ((0x2b, 0x2d, 0x42), Color::Black),
            Tone::Panel =>        ((0x3d, 0x40, 0x5b), Color::Black),
            Tone::CellHidden =>   ((0x58, 0x5b, 0x7a), Color::DarkGray),
            Tone::CellRevealed => ((0xa8, 0xa9, 0xc4), Color::Gray),
            Tone::CellHover =>    ((0x6c, 0x6f, 0x8f), Color::LightBlue),
            Tone::Mine =>         ((0xd9, 0x04, 0x29), Color::Red),
            Tone::Flag =>         ((0x06, 0xff, 0xa5), Color::LightGreen),
            Tone::Text =>         ((0xed, 0xf2, 0xf4), Color::White),
            Tone::Number(n) => match n {
                1 => ((0x48, 0x95, 0xef), Color::Blue),
                2 => ((0x4c, 0xc9, 0xf0), Color::Cyan),
                3 => ((0x43, 0x61, 0xee), Color::LightBlue),
                4 => ((0x3f, 0x37, 0xc9), Color::Blue),
                5 => ((0x72, 0x09, 0xb7), Color::Magenta),
                6 => ((0xb5, 0x17, 0x9e), Color::LightMagenta),
                7 => ((0xf7, 0x25, 0x85), Color::LightRed),
                _ => ((0x56, 0x0b, 0xad), Color::Magenta),
            },
            Tone::Celebrate(frame) => match frame % 5 {
                0 => ((0x4c, 0xc9, 0xf0), Color::Cyan),
                1 => ((0x48, 0x95, 0xef), Color::LightBlue),
                2 => ((0x43, 0x61, 0xee), Color::Blue),
                3 => ((0x72, 0x09, 0xb7), Color::Magenta),
                _ => ((0xb5, 0x17, 0x9e), Color::LightMagenta),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    TrueColor,
    Indexed,
    Basic,
}

/// Resolves tones to terminal colours for the detected colour depth
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    depth: Depth,
}

impl Palette {
    pub fn detect() -> Self {
        let support = ColorSupport::stdout();
        let depth = if support.has_16m {
            Depth::TrueColor
        } else if support.has_256 {
            Depth::Indexed
        } else {
            Depth::Basic
        };
        Palette { depth }
    }

    #[cfg(test)]
    pub fn with_depth(depth: Depth) -> Self {
        Palette { depth }
    }

    pub fn color(&self, tone: Tone) -> Color {
        let ((r, g, b), basic) = tone.swatch();
        match self.depth {
            Depth::TrueColor => Color::Rgb(r, g, b),
            Depth::Indexed => Color::Indexed(xterm_index(r, g, b)),
            Depth::Basic => basic,
        }
    }
}

/// Nearest entry of the 6x6x6 colour cube (indices 16..=231)
fn xterm_index(r: u8, g: u8, b: u8) -> u8 {
    let level = |c: u8| ((c as u16 * 5 + 127) / 255) as u8;
    16 + 36 * level(r) + 6 * level(g) + level(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_true_color_uses_exact_rgb() {
        let palette = Palette::with_depth(Depth::TrueColor);
        assert_eq!(palette.color(Tone::Mine), Color::Rgb(0xd9, 0x04, 0x29));
        assert_eq!(palette.color(Tone::Number(1)), Color::Rgb(0x48, 0x95, 0xef));
    }

    #[test]
    fn test_indexed_stays_in_color_cube() {
        assert_eq!(xterm_index(0, 0, 0), 16);
        assert_eq!(xterm_index(255, 255, 255), 231);
        assert_eq!(xterm_index(255, 0, 0), 196);
        let palette = Palette::with_depth(Depth::Indexed);
        assert_eq!(palette.color(Tone::Flag), Color::Indexed(49));
    }

    #[test]
    fn test_basic_falls_back_to_ansi() {
        let palette = Palette::with_depth(Depth::Basic);
        assert_eq!(palette.color(Tone::Mine), Color::Red);
        assert_eq!(palette.color(Tone::Celebrate(7)), Color::Blue);
    }
}

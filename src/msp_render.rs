// Cell appearance as a pure function of engine state

use crate::msp_color::Tone;
use crate::msp_game::{CellState, GameState};

/// Glyph set; each cell glyph must be one terminal column wide
#[derive(Debug, Clone)]
pub struct Icons {
    pub hidden: &'static str,
    pub flag: &'static str,
    pub question: &'static str,
    pub mine: &'static str,
    pub wrong_flag: &'static str,
    pub face_playing: &'static str,
    pub face_won: &'static str,
    pub face_lost: &'static str,
    pub counter: &'static str,
    pub timer: &'static str,
}

impl Icons {
    pub fn new(ascii: bool) -> Self {
        if ascii {
            Icons {
                hidden: "#",
                flag: "F",
                question: "?",
                mine: "*",
                wrong_flag: "x",
                face_playing: ":)",
                face_won: "B)",
                face_lost: "X(",
                counter: "Mines",
                timer: "Time",
            }
        } else {
            Icons {
                hidden: "■",
                flag: "⚑",
                question: "?",
                mine: "☼",
                wrong_flag: "✗",
                face_playing: "😊",
                face_won: "😎",
                face_lost: "😵",
                counter: "💣",
                timer: "⏱",
            }
        }
    }

    pub fn face(&self, state: GameState) -> &'static str {
        match state {
            GameState::Won => self.face_won,
            GameState::Lost => self.face_lost,
            GameState::Ready | GameState::Playing => self.face_playing,
        }
    }
}

/// Everything the renderer needs to know about one cell
#[derive(Debug, Clone, Copy)]
pub struct CellView {
    pub state: CellState,
    pub mine: bool,
    pub adjacent: u8,
    pub game: GameState,
    pub detonated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellLook {
    pub text: String,
    pub fg: Tone,
    pub bg: Tone,
    pub sunken: bool, // opened cells and mines exposed at a loss
}

impl CellLook {
    fn new(text: &str, fg: Tone, bg: Tone) -> Self {
        CellLook {
            text: text.to_string(),
            fg,
            bg,
            sunken: false,
        }
    }

    fn sunken(mut self) -> Self {
        self.sunken = true;
        self
    }
}

pub fn cell_look(view: &CellView, icons: &Icons) -> CellLook {
    let lost = view.game == GameState::Lost;
    match (view.state, view.mine, lost) {
        (CellState::Revealed, _, _) if view.adjacent > 0 => CellLook::new(
            &view.adjacent.to_string(),
            Tone::Number(view.adjacent),
            Tone::CellRevealed,
        )
        .sunken(),
        (CellState::Revealed, _, _) => {
            CellLook::new(" ", Tone::Text, Tone::CellRevealed).sunken()
        }
        (_, true, true) if view.detonated => {
            CellLook::new(icons.mine, Tone::Text, Tone::Mine).sunken()
        }
        (CellState::Flagged, false, true) => {
            CellLook::new(icons.wrong_flag, Tone::Text, Tone::Mine)
        }
        (_, true, true) => CellLook::new(icons.mine, Tone::Mine, Tone::CellRevealed).sunken(),
        (CellState::Flagged, _, _) => CellLook::new(icons.flag, Tone::Flag, Tone::CellHidden),
        (CellState::Questioned, _, _) => {
            CellLook::new(icons.question, Tone::Text, Tone::CellHidden)
        }
        _ => CellLook::new(icons.hidden, Tone::CellHover, Tone::CellHidden),
    }
}

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Span, Spans, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::{Frame, Terminal};
use std::error::Error;
use std::io;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use unicode_width::UnicodeWidthStr;

use crate::msp_board::{Difficulty, Position};
use crate::msp_color::{Palette, Tone};
use crate::msp_config::{Config, save_config};
use crate::msp_game::{CellState, Game, GameState};
use crate::msp_render::{CellView, Icons, cell_look};

const TICK_RATE: Duration = Duration::from_millis(200);
const DOUBLE_CLICK: Duration = Duration::from_millis(400);
const CELEBRATION: Duration = Duration::from_millis(500);

// Centralized menu items (key, label)
const MENU_ITEMS: [(&str, &str); 5] = [
    ("F1", "Help"),
    ("F2", "New"),
    ("F5", "Difficulty"),
    ("F7", "Options"),
    ("Esc", "Exit"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modal {
    Help,
    Difficulty,
    Options,
    Won,
    Lost,
}

// Runtime UI state grouped so it can be handed to the draw and event functions
struct App<'a> {
    cfg: &'a mut Config,
    game: Game,
    seed: Option<u64>,
    palette: Palette,
    icons: Icons,
    cursor: Position,
    hover: Option<Position>,
    last_click: Option<(Position, Instant)>,
    modal: Option<Modal>,
    modal_focus: usize,
    announced: bool,
    celebrate: Option<Instant>,
    menu_hover: Option<usize>,
    // hit-test areas captured during the last draw
    menu_items: Vec<(u16, u16)>,
    menu_row: Option<u16>,
    face_rect: Option<Rect>,
    board_rect: Option<Rect>,
    modal_rect: Option<Rect>,
    exit: bool,
}

impl<'a> App<'a> {
    fn new(cfg: &'a mut Config, seed: Option<u64>) -> Self {
        let icons = Icons::new(cfg.ascii_icons);
        let game = new_game(cfg.difficulty, seed);
        App {
            cfg,
            game,
            seed,
            palette: Palette::detect(),
            icons,
            cursor: Position::new(0, 0),
            hover: None,
            last_click: None,
            modal: None,
            modal_focus: 0,
            announced: false,
            celebrate: None,
            menu_hover: None,
            menu_items: Vec::new(),
            menu_row: None,
            face_rect: None,
            board_rect: None,
            modal_rect: None,
            exit: false,
        }
    }

    /// Same board again: the engine is reset in place
    fn restart(&mut self) {
        self.game.reset();
        self.clear_session_ui();
        debug!("new game requested");
    }

    /// Different preset: the previous engine is discarded
    fn switch_difficulty(&mut self, difficulty: Difficulty) {
        self.cfg.difficulty = difficulty;
        save_config(self.cfg);
        self.game = new_game(difficulty, self.seed);
        self.cursor = Position::new(0, 0);
        self.clear_session_ui();
        info!(difficulty = difficulty.name(), "difficulty changed");
    }

    fn clear_session_ui(&mut self) {
        self.modal = None;
        self.announced = false;
        self.celebrate = None;
        self.last_click = None;
        self.hover = None;
    }

    fn reveal(&mut self, pos: Position) -> Result<(), Box<dyn Error>> {
        self.game.reveal_cell(pos)?;
        self.sync_outcome();
        Ok(())
    }

    fn flag(&mut self, pos: Position) -> Result<(), Box<dyn Error>> {
        if self.cfg.use_question_marks {
            self.game.cycle_mark(pos)?;
        } else {
            self.game.toggle_flag(pos)?;
        }
        Ok(())
    }

    fn chord(&mut self, pos: Position) -> Result<(), Box<dyn Error>> {
        self.game.auto_reveal_neighbors(pos)?;
        self.sync_outcome();
        Ok(())
    }

    fn left_click(&mut self, pos: Position) -> Result<(), Box<dyn Error>> {
        let now = Instant::now();
        let double = matches!(self.last_click, Some((p, t)) if p == pos && now.duration_since(t) <= DOUBLE_CLICK);
        self.last_click = Some((pos, now));
        self.cursor = pos;
        if double && self.game.cell_state(pos)? == CellState::Revealed {
            self.chord(pos)
        } else {
            self.reveal(pos)
        }
    }

    // Announce an end-of-game transition exactly once
    fn sync_outcome(&mut self) {
        if self.announced {
            return;
        }
        match self.game.state() {
            GameState::Lost => {
                self.announced = true;
                self.modal = Some(Modal::Lost);
            }
            GameState::Won => {
                self.announced = true;
                self.celebrate = Some(Instant::now());
            }
            GameState::Ready | GameState::Playing => {}
        }
    }

    fn open_modal(&mut self, modal: Modal) {
        self.modal_focus = match modal {
            Modal::Difficulty => self.cfg.difficulty.to_index(),
            _ => 0,
        };
        self.modal = Some(modal);
    }

    fn toggle_option(&mut self, index: usize) {
        match index {
            0 => self.cfg.use_question_marks = !self.cfg.use_question_marks,
            _ => {
                self.cfg.ascii_icons = !self.cfg.ascii_icons;
                self.icons = Icons::new(self.cfg.ascii_icons);
            }
        }
        save_config(self.cfg);
    }

    fn move_cursor(&mut self, d_row: isize, d_col: isize) {
        let row = (self.cursor.row as isize + d_row).clamp(0, self.game.rows() as isize - 1);
        let col = (self.cursor.col as isize + d_col).clamp(0, self.game.cols() as isize - 1);
        self.cursor = Position::new(row as usize, col as usize);
    }

    fn board_cell_at(&self, column: u16, row: u16) -> Option<Position> {
        let area = self.board_rect?;
        let x0 = area.x + 1;
        let y0 = area.y + 1;
        if column < x0 || row < y0 {
            return None;
        }
        let pos = Position::new((row - y0) as usize, ((column - x0) / 2) as usize);
        self.game.grid().contains(pos).then_some(pos)
    }

    fn face_hit(&self, column: u16, row: u16) -> bool {
        self.face_rect.is_some_and(|face| {
            row == face.y && column >= face.x && column < face.x + face.width
        })
    }

    fn menu_item_at(&self, column: u16, row: u16) -> Option<usize> {
        if self.menu_row != Some(row) {
            return None;
        }
        self.menu_items
            .iter()
            .position(|(start, end)| column >= *start && column < *end)
    }
}

fn new_game(difficulty: Difficulty, seed: Option<u64>) -> Game {
    let game = Game::for_difficulty(difficulty);
    match seed {
        Some(seed) => game.with_seed(seed),
        None => game,
    }
}

pub fn run(cfg: &mut Config, seed: Option<u64>) -> Result<(), Box<dyn Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnableMouseCapture, terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = {
        let mut app = App::new(cfg, seed);
        event_loop(&mut terminal, &mut app)
    };

    // Save current preferences before exiting
    save_config(cfg);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, terminal::LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

fn event_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let mut last_tick = Instant::now();
    while !app.exit {
        terminal.draw(|f| draw(f, app))?;

        let timeout = TICK_RATE
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(KeyEvent { code, modifiers, kind: KeyEventKind::Press, .. }) => {
                    handle_key(app, code, modifiers)?
                }
                Event::Mouse(me) => handle_mouse(app, me)?,
                _ => {}
            }
        }

        // the win notice waits for the celebration flash to finish
        if let Some(t0) = app.celebrate {
            if t0.elapsed() >= CELEBRATION {
                app.celebrate = None;
                app.modal = Some(Modal::Won);
            }
        }

        if last_tick.elapsed() >= TICK_RATE {
            last_tick = Instant::now();
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Result<(), Box<dyn Error>> {
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        app.exit = true;
        return Ok(());
    }

    match app.modal {
        Some(Modal::Difficulty) => match code {
            KeyCode::Up => app.modal_focus = app.modal_focus.saturating_sub(1),
            KeyCode::Down => app.modal_focus = (app.modal_focus + 1).min(Difficulty::ALL.len() - 1),
            KeyCode::Enter | KeyCode::Char(' ') => {
                app.switch_difficulty(Difficulty::from_index(app.modal_focus))
            }
            KeyCode::Char(c @ '1'..='3') => {
                app.switch_difficulty(Difficulty::from_index(c as usize - '1' as usize))
            }
            KeyCode::Esc | KeyCode::F(5) => app.modal = None,
            _ => {}
        },
        Some(Modal::Options) => match code {
            KeyCode::Up => app.modal_focus = 0,
            KeyCode::Down => app.modal_focus = 1,
            KeyCode::Char(' ') => app.toggle_option(app.modal_focus),
            KeyCode::Esc | KeyCode::Enter | KeyCode::F(7) => app.modal = None,
            _ => {}
        },
        Some(_) => match code {
            KeyCode::F(2) => app.restart(),
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char(' ') | KeyCode::F(1) => app.modal = None,
            _ => {}
        },
        None => match code {
            KeyCode::Left => app.move_cursor(0, -1),
            KeyCode::Right => app.move_cursor(0, 1),
            KeyCode::Up => app.move_cursor(-1, 0),
            KeyCode::Down => app.move_cursor(1, 0),
            KeyCode::Char(' ') => app.reveal(app.cursor)?,
            KeyCode::Char('f') | KeyCode::Char('F') => app.flag(app.cursor)?,
            KeyCode::Enter => app.chord(app.cursor)?,
            KeyCode::F(1) => app.open_modal(Modal::Help),
            KeyCode::F(2) => app.restart(),
            KeyCode::F(5) => app.open_modal(Modal::Difficulty),
            KeyCode::F(7) => app.open_modal(Modal::Options),
            KeyCode::Esc => app.exit = true,
            _ => {}
        },
    }
    Ok(())
}

fn handle_mouse(app: &mut App, me: MouseEvent) -> Result<(), Box<dyn Error>> {
    // while a modal is open only the modal receives clicks
    if let Some(modal) = app.modal {
        if let (MouseEventKind::Down(MouseButton::Left), Some(rect)) = (me.kind, app.modal_rect) {
            let inside = me.column >= rect.x
                && me.column < rect.x + rect.width
                && me.row >= rect.y
                && me.row < rect.y + rect.height;
            // content rows start one below the blank line after the border
            let item = (me.row as usize).checked_sub(rect.y as usize + 2);
            match (modal, item) {
                (Modal::Difficulty, Some(i)) if inside && i < Difficulty::ALL.len() => {
                    app.switch_difficulty(Difficulty::from_index(i))
                }
                (Modal::Options, Some(i)) if inside && i < 2 => {
                    app.modal_focus = i;
                    app.toggle_option(i);
                }
                (Modal::Difficulty | Modal::Options, _) if inside => {}
                _ => app.modal = None,
            }
        }
        return Ok(());
    }

    match me.kind {
        MouseEventKind::Moved => {
            app.hover = app.board_cell_at(me.column, me.row);
            app.menu_hover = app.menu_item_at(me.column, me.row);
        }
        MouseEventKind::Down(button) => {
            if let Some(i) = app.menu_item_at(me.column, me.row) {
                if button == MouseButton::Left {
                    menu_action(app, i);
                }
                return Ok(());
            }
            if app.face_hit(me.column, me.row) {
                if button == MouseButton::Left {
                    app.restart();
                }
                return Ok(());
            }
            if let Some(pos) = app.board_cell_at(me.column, me.row) {
                match button {
                    MouseButton::Left => app.left_click(pos)?,
                    MouseButton::Right => app.flag(pos)?,
                    MouseButton::Middle => app.chord(pos)?,
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn menu_action(app: &mut App, index: usize) {
    match index {
        0 => app.open_modal(Modal::Help),
        1 => app.restart(),
        2 => app.open_modal(Modal::Difficulty),
        3 => app.open_modal(Modal::Options),
        _ => app.exit = true,
    }
}

fn draw<B: Backend>(f: &mut Frame<B>, app: &mut App) {
    let size = f.size();
    let board_w = (app.game.cols() * 2) as u16 + 3;
    let board_h = app.game.rows() as u16 + 2;
    let min_twidth = board_w.max(60);
    let min_theight = board_h + 6;
    // If terminal too small, render a centered warning and skip normal UI
    if size.width < min_twidth || size.height < min_theight {
        let warn_lines = vec![
            Spans::from(Span::raw("Terminal size too small.")),
            Spans::from(Span::raw(format!("Minimum required: {} x {}", min_twidth, min_theight))),
        ];
        let warn = Paragraph::new(Text::from(warn_lines))
            .block(Block::default().borders(Borders::ALL).title("Resize Terminal"))
            .alignment(Alignment::Center);
        f.render_widget(Clear, size);
        let area = center_rect(40.min(size.width), 4.min(size.height), size);
        f.render_widget(warn, area);
        app.board_rect = None;
        app.face_rect = None;
        app.menu_row = None;
        return;
    }

    // layout: menu row, header (counter / face / timer), board
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([Constraint::Length(3), Constraint::Length(3), Constraint::Min(board_h)].as_ref())
        .split(size);

    draw_menu(f, app, chunks[0]);
    draw_header(f, app, chunks[1]);
    draw_board(f, app, chunks[2]);

    app.modal_rect = None;
    if let Some(modal) = app.modal {
        draw_modal(f, app, modal, size);
    }
}

fn draw_menu<B: Backend>(f: &mut Frame<B>, app: &mut App, area: Rect) {
    let key_fg = app.palette.color(Tone::Flag);
    let hover_bg = app.palette.color(Tone::CellHover);
    let mut spans = vec![Span::raw(" ")];
    let mut x = area.x + 2;
    app.menu_items.clear();
    for (i, (key, label)) in MENU_ITEMS.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("   "));
            x += 3;
        }
        let rest = format!(": {}", label);
        let (key_style, rest_style) = if Some(i) == app.menu_hover {
            (
                Style::default().bg(hover_bg).fg(key_fg).add_modifier(Modifier::BOLD),
                Style::default().bg(hover_bg),
            )
        } else {
            (Style::default().fg(key_fg).add_modifier(Modifier::BOLD), Style::default())
        };
        let w = (key.width() + rest.width()) as u16;
        app.menu_items.push((x, x + w));
        x += w;
        spans.push(Span::styled(key.to_string(), key_style));
        spans.push(Span::styled(rest, rest_style));
    }
    app.menu_row = Some(area.y + 1);
    let menu = Paragraph::new(Spans::from(spans))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);
    f.render_widget(menu, area);
}

fn draw_header<B: Backend>(f: &mut Frame<B>, app: &mut App, area: Rect) {
    let panel = Style::default()
        .bg(app.palette.color(Tone::Panel))
        .fg(app.palette.color(Tone::Flag))
        .add_modifier(Modifier::BOLD);
    let inner_w = area.width.saturating_sub(2) as usize;

    let left = format!(" {} {:03}", app.icons.counter, app.game.remaining_mines().min(999));
    let secs = app.game.elapsed().as_secs().min(999);
    let right = format!("{} {:03} ", app.icons.timer, secs);
    let face = format!("[{}]", app.icons.face(app.game.state()));

    let (left_w, face_w, right_w) = (left.width(), face.width(), right.width());
    let pad_left = (inner_w.saturating_sub(face_w) / 2).saturating_sub(left_w).max(1);
    let pad_right = inner_w.saturating_sub(left_w + pad_left + face_w + right_w).max(1);
    app.face_rect = Some(Rect::new(
        area.x + 1 + (left_w + pad_left) as u16,
        area.y + 1,
        face_w as u16,
        1,
    ));

    let spans = vec![
        Span::styled(left, panel),
        Span::styled(" ".repeat(pad_left), panel),
        Span::styled(face, panel.fg(app.palette.color(Tone::Text))),
        Span::styled(" ".repeat(pad_right), panel),
        Span::styled(right, panel),
    ];
    let header = Paragraph::new(Spans::from(spans))
        .block(Block::default().borders(Borders::ALL).style(panel));
    f.render_widget(header, area);
}

fn draw_board<B: Backend>(f: &mut Frame<B>, app: &mut App, area: Rect) {
    let game = &app.game;
    let board_area = center_rect((game.cols() * 2) as u16 + 3, game.rows() as u16 + 2, area);
    let board_bg = app.palette.color(Tone::Background);
    let celebrate_frame = app
        .celebrate
        .map(|t0| (t0.elapsed().as_millis() / 100) as u8);

    let mut lines = Vec::with_capacity(game.rows());
    for pos in game.grid().positions() {
        if pos.col == 0 {
            lines.push(Vec::with_capacity(game.cols() + 1));
        }
        // positions are validated by the grid itself
        let view = CellView {
            state: game.cell_state(pos).unwrap_or_default(),
            mine: game.is_mine(pos).unwrap_or(false),
            adjacent: game.adjacent_mines(pos).unwrap_or(0),
            game: game.state(),
            detonated: game.detonated() == Some(pos),
        };
        let look = cell_look(&view, &app.icons);
        let mut bg = look.bg;
        if view.state == CellState::Hidden && app.hover == Some(pos) && !game.state().is_over() {
            bg = Tone::CellHover;
        }
        if let (Some(frame), CellState::Flagged) = (celebrate_frame, view.state) {
            bg = Tone::Celebrate(frame);
        }
        let mut style = Style::default()
            .fg(app.palette.color(look.fg))
            .bg(app.palette.color(bg));
        // raised cells stand out, opened ones sit flat
        if !look.sunken {
            style = style.add_modifier(Modifier::BOLD);
        }
        if pos == app.cursor {
            style = style.add_modifier(Modifier::REVERSED);
        }
        if let Some(row) = lines.last_mut() {
            row.push(Span::styled(format!(" {}", look.text), style));
        }
    }
    let lines: Vec<Spans> = lines
        .into_iter()
        .map(|mut row| {
            // right-hand padding column in the board background
            row.push(Span::styled(" ", Style::default().bg(board_bg)));
            Spans::from(row)
        })
        .collect();

    let title = app.cfg.difficulty.name();
    let paragraph = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .title_alignment(Alignment::Center)
                .style(Style::default().bg(board_bg)),
        )
        .alignment(Alignment::Left);
    f.render_widget(paragraph, board_area);
    app.board_rect = Some(board_area);
}

fn draw_modal<B: Backend>(f: &mut Frame<B>, app: &mut App, modal: Modal, size: Rect) {
    let focus_style = Style::default()
        .bg(app.palette.color(Tone::CellHover))
        .add_modifier(Modifier::BOLD);
    let check = |on: bool| if on { "[x]" } else { "[ ]" };

    let (title, body): (&str, Vec<(String, bool)>) = match modal {
        Modal::Help => (
            "Help",
            vec![
                (" Controls:".to_string(), false),
                ("  L-Click | Space        - reveal".to_string(), false),
                ("  R-Click | F            - toggle flag".to_string(), false),
                ("  Dbl/M-Click | Enter    - chord (open neighbors)".to_string(), false),
                ("  Arrows                 - move cursor".to_string(), false),
                ("  F2 | face button       - new game".to_string(), false),
            ],
        ),
        Modal::Difficulty => (
            "Difficulty",
            Difficulty::ALL
                .iter()
                .enumerate()
                .map(|(i, d)| {
                    let mark = if *d == app.cfg.difficulty { "•" } else { " " };
                    (format!(" {} {}. {}", mark, i + 1, d.label()), i == app.modal_focus)
                })
                .collect(),
        ),
        Modal::Options => (
            "Options",
            vec![
                (
                    format!(" {} Use ? marks", check(app.cfg.use_question_marks)),
                    app.modal_focus == 0,
                ),
                (
                    format!(" {} ASCII icons", check(app.cfg.ascii_icons)),
                    app.modal_focus == 1,
                ),
            ],
        ),
        Modal::Won => {
            let secs = app.game.elapsed().as_secs();
            let prefix = if app.cfg.ascii_icons { "" } else { "🎉 " };
            ("Congratulations!", vec![(format!(" {}You won in {} seconds!", prefix, secs), false)])
        }
        Modal::Lost => {
            let prefix = if app.cfg.ascii_icons { "" } else { "💥 " };
            ("Game Over", vec![(format!(" {}You hit a mine! Try again!", prefix), false)])
        }
    };
    let footer = match modal {
        Modal::Difficulty => " Up/Down, Enter: select   Esc: close",
        Modal::Options => " Up/Down, Space: toggle   Esc: close",
        Modal::Won | Modal::Lost => " Enter: OK   F2: new game",
        Modal::Help => " Enter: close",
    };

    let content_w = body
        .iter()
        .map(|(s, _)| s.width())
        .chain([footer.width(), title.width()])
        .max()
        .unwrap_or(0);
    let width = (content_w as u16 + 4).min(size.width);
    let height = (body.len() as u16 + 5).min(size.height);
    let rect = center_rect(width, height, size);

    let mut lines = vec![Spans::from(Span::raw(""))];
    for (text, focused) in body {
        let style = if focused { focus_style } else { Style::default() };
        lines.push(Spans::from(Span::styled(text, style)));
    }
    lines.push(Spans::from(Span::raw("")));
    lines.push(Spans::from(Span::styled(
        footer,
        Style::default().fg(app.palette.color(Tone::Flag)),
    )));

    f.render_widget(Clear, rect);
    let paragraph = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .title_alignment(Alignment::Center),
        )
        .alignment(Alignment::Left);
    f.render_widget(paragraph, rect);
    app.modal_rect = Some(rect);
}

fn center_rect(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

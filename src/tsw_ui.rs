use anyhow::{Context, Result};
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use rand::Rng;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::time::Duration;
use tracing::debug;

use crate::tsw_board::{BoardView, Geometry, Screen};
use crate::tsw_color::Palette;
use crate::tsw_config::Settings;
use crate::tsw_session::{Phase, Session};

type Term = Terminal<CrosstermBackend<Stdout>>;

/// What an input event asks of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Click { column: u16, row: u16 }, // Terminal position of a mouse button press
    Reset,
    Quit,
}

/// Whether the loop keeps going after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Translate a terminal event; anything not understood maps to None
pub fn translate(event: &Event, reset_key: char) -> Option<Command> {
    match event {
        Event::Key(KeyEvent { code, modifiers, kind, .. }) => {
            // release/repeat events only arrive on some platforms
            if *kind != KeyEventKind::Press {
                return None;
            }
            match code {
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Some(Command::Quit),
                KeyCode::Char(c) if *c == reset_key => Some(Command::Reset),
                KeyCode::Esc | KeyCode::Char('q') => Some(Command::Quit),
                _ => None,
            }
        }
        Event::Mouse(me) => match me.kind {
            MouseEventKind::Down(_) => Some(Command::Click {
                column: me.column,
                row: me.row,
            }),
            _ => None,
        },
        _ => None,
    }
}

/// Apply one command. `surface` is where the board was drawn last frame
/// (None while the terminal is too small to show it).
pub fn dispatch<R: Rng>(session: &mut Session<R>, command: Command, surface: Option<Rect>, geometry: &Geometry) -> Flow {
    match command {
        Command::Click { column, row } => {
            let Some(surface) = surface else {
                return Flow::Continue;
            };
            if session.phase() == Phase::GameOver {
                debug!("click ignored, game over");
                return Flow::Continue;
            }
            let col = column as i32 - surface.x as i32;
            let row = row as i32 - surface.y as i32;
            match geometry.cell_at(col, row, session.grid().size()) {
                Some((x, y)) => {
                    let outcome = session.click(x, y);
                    debug!(x, y, ?outcome, "click");
                }
                None => debug!(col, row, "click outside board"),
            }
            Flow::Continue
        }
        Command::Reset => {
            session.reset();
            Flow::Continue
        }
        Command::Quit => Flow::Quit,
    }
}

fn enter(title: &str) -> Result<Term> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnableMouseCapture, terminal::EnterAlternateScreen, terminal::SetTitle(title))?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn leave(term: &mut Term) -> Result<()> {
    disable_raw_mode()?;
    execute!(term.backend_mut(), DisableMouseCapture, terminal::LeaveAlternateScreen)?;
    term.show_cursor()?;
    Ok(())
}

/// Take over the terminal and play until the player quits
pub fn run<R: Rng>(settings: &Settings, palette: Palette, mut session: Session<R>) -> Result<()> {
    let mut term = match enter(&settings.title) {
        Ok(term) => term,
        Err(e) => {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), DisableMouseCapture, terminal::LeaveAlternateScreen);
            return Err(e.context("cannot start terminal UI"));
        }
    };

    let result = event_loop(&mut term, settings, palette, &mut session);

    // Always try to restore terminal state.
    let restored = leave(&mut term).context("cannot restore terminal");
    result.and(restored)
}

fn event_loop<R: Rng>(term: &mut Term, settings: &Settings, palette: Palette, session: &mut Session<R>) -> Result<()> {
    let message = settings.overlay_message();
    let mut surface: Option<Rect> = None;
    loop {
        term.draw(|f| {
            let area = f.size();
            surface = settings.geometry.surface_in(area, session.grid().size());
            let board = BoardView::of(session, settings.geometry, palette, &message);
            f.render_widget(Screen::new(board), area);
        })?;

        // Block for the next event, then drain everything already queued
        let mut ev = event::read()?;
        loop {
            if let Some(command) = translate(&ev, settings.reset_key) {
                if dispatch(session, command, surface, &settings.geometry) == Flow::Quit {
                    return Ok(());
                }
            }
            if !event::poll(Duration::ZERO)? {
                break;
            }
            ev = event::read()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tsw_color::{Depth, PaletteConfig};
    use crate::tsw_grid::{Content, Rules};
    use ratatui::buffer::Buffer;
    use ratatui::widgets::Widget;
    use crossterm::event::{MouseButton, MouseEvent};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    // 80x35 terminal: the 56x25 surface sits at (12, 5)
    const SURFACE: Rect = Rect { x: 12, y: 5, width: 56, height: 25 };

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    /// Terminal position inside the interior of cell (x, y)
    fn click_on(x: usize, y: usize) -> Command {
        let r = Geometry::default().cell_rect(x, y);
        Command::Click {
            column: SURFACE.x + r.x + 1,
            row: SURFACE.y + r.y + 1,
        }
    }

    fn session() -> Session<StdRng> {
        Session::new(Rules::default(), StdRng::seed_from_u64(2024)).unwrap()
    }

    fn first(session: &Session<StdRng>, content: Content) -> (usize, usize) {
        let grid = session.grid();
        (0..grid.size())
            .flat_map(|y| (0..grid.size()).map(move |x| (x, y)))
            .find(|&(x, y)| grid.content(x, y) == content)
            .unwrap()
    }

    #[test]
    fn test_translate_keys() {
        assert_eq!(translate(&key(KeyCode::Char(' ')), ' '), Some(Command::Reset));
        assert_eq!(translate(&key(KeyCode::Esc), ' '), Some(Command::Quit));
        assert_eq!(translate(&key(KeyCode::Char('q')), ' '), Some(Command::Quit));
        assert_eq!(
            translate(&Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)), ' '),
            Some(Command::Quit)
        );
        assert_eq!(translate(&key(KeyCode::Char('x')), ' '), None);
        assert_eq!(translate(&key(KeyCode::Enter), ' '), None);
    }

    #[test]
    fn test_translate_custom_reset_key() {
        assert_eq!(translate(&key(KeyCode::Char('r')), 'r'), Some(Command::Reset));
        assert_eq!(translate(&key(KeyCode::Char(' ')), 'r'), None);
    }

    #[test]
    fn test_translate_ignores_key_release() {
        let release = Event::Key(KeyEvent::new_with_kind(KeyCode::Char(' '), KeyModifiers::NONE, KeyEventKind::Release));
        assert_eq!(translate(&release, ' '), None);
    }

    #[test]
    fn test_translate_mouse() {
        assert_eq!(
            translate(&mouse(MouseEventKind::Down(MouseButton::Left), 20, 7), ' '),
            Some(Command::Click { column: 20, row: 7 })
        );
        assert_eq!(
            translate(&mouse(MouseEventKind::Down(MouseButton::Right), 1, 2), ' '),
            Some(Command::Click { column: 1, row: 2 })
        );
        assert_eq!(translate(&mouse(MouseEventKind::Up(MouseButton::Left), 20, 7), ' '), None);
        assert_eq!(translate(&mouse(MouseEventKind::Moved, 20, 7), ' '), None);
        assert_eq!(translate(&Event::Resize(100, 40), ' '), None);
    }

    #[test]
    fn test_safe_click_reveals_cell() {
        let mut s = session();
        let (x, y) = first(&s, Content::Safe);
        let flow = dispatch(&mut s, click_on(x, y), Some(SURFACE), &Geometry::default());
        assert_eq!(flow, Flow::Continue);
        assert!(s.revealed().is_revealed(x, y));
        assert_eq!(s.phase(), Phase::Playing);
    }

    #[test]
    fn test_mine_click_ends_game_and_further_clicks_ignored() {
        let mut s = session();
        let (mx, my) = first(&s, Content::Mine);
        dispatch(&mut s, click_on(mx, my), Some(SURFACE), &Geometry::default());
        assert_eq!(s.phase(), Phase::GameOver);

        let before = s.revealed().clone();
        let (x, y) = first(&s, Content::Safe);
        dispatch(&mut s, click_on(x, y), Some(SURFACE), &Geometry::default());
        assert_eq!(s.revealed(), &before);
        assert_eq!(s.phase(), Phase::GameOver);
    }

    #[test]
    fn test_reset_after_game_over() {
        let mut s = session();
        let (mx, my) = first(&s, Content::Mine);
        dispatch(&mut s, click_on(mx, my), Some(SURFACE), &Geometry::default());
        dispatch(&mut s, Command::Reset, Some(SURFACE), &Geometry::default());
        assert_eq!(s.phase(), Phase::Playing);
        assert_eq!(s.revealed().count(), 0);
    }

    #[test]
    fn test_overlay_gone_after_reset() {
        let message = Settings::default().overlay_message();
        let palette = Palette::resolve(&PaletteConfig::default(), Depth::TrueColor);
        let area = Rect::new(0, 0, 56, 25);
        let overlay_row = |s: &Session<StdRng>| {
            let mut buf = Buffer::empty(area);
            BoardView::of(s, Geometry::default(), palette, &message).render(area, &mut buf);
            (0..area.width).map(|x| buf.get(x, 12).symbol.clone()).collect::<String>()
        };

        let mut s = session();
        let (mx, my) = first(&s, Content::Mine);
        dispatch(&mut s, click_on(mx, my), Some(SURFACE), &Geometry::default());
        assert!(overlay_row(&s).contains(&message));

        dispatch(&mut s, Command::Reset, Some(SURFACE), &Geometry::default());
        assert!(!overlay_row(&s).contains("Game Over"));
    }

    #[test]
    fn test_clicks_outside_board_do_nothing() {
        let mut s = session();
        let g = Geometry::default();
        // left of and above the surface, beyond its right and bottom edges
        for (column, row) in [(11, 10), (20, 4), (0, 0), (68, 10), (30, 29), (79, 34)] {
            dispatch(&mut s, Command::Click { column, row }, Some(SURFACE), &g);
        }
        assert_eq!(s.revealed().count(), 0);
        assert_eq!(s.phase(), Phase::Playing);
    }

    #[test]
    fn test_clicks_without_surface_do_nothing() {
        let mut s = session();
        dispatch(&mut s, Command::Click { column: 3, row: 2 }, None, &Geometry::default());
        assert_eq!(s.revealed().count(), 0);
    }

    #[test]
    fn test_leading_margin_belongs_to_cell() {
        let mut s = session();
        let (x, y) = first(&s, Content::Safe);
        let r = Geometry::default().cell_rect(x, y);
        // the margin column just before the cell box
        let command = Command::Click {
            column: SURFACE.x + r.x - 1,
            row: SURFACE.y + r.y,
        };
        dispatch(&mut s, command, Some(SURFACE), &Geometry::default());
        assert!(s.revealed().is_revealed(x, y));
    }

    #[test]
    fn test_quit() {
        let mut s = session();
        assert_eq!(dispatch(&mut s, Command::Quit, Some(SURFACE), &Geometry::default()), Flow::Quit);
    }
}

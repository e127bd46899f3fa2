// Board rendering: cell geometry, the board widget and the full-screen frame
// Widgets only read game state; nothing here mutates a session

use rand::Rng;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Span, Spans, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use serde::Deserialize;
use unicode_width::UnicodeWidthStr;

use crate::tsw_color::Palette;
use crate::tsw_grid::{BLANK_LABEL, Grid, RevealedState};
use crate::tsw_session::Session;

/// Cell size and spacing, in terminal columns/rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Geometry {
    pub cell_width: u16,
    pub cell_height: u16,
    pub margin_x: u16, // Gap before each column and after the last one
    pub margin_y: u16, // Gap before each row and after the last one
}

impl Default for Geometry {
    fn default() -> Self {
        // A 7x3 character box looks roughly square in most terminal fonts
        Geometry {
            cell_width: 7,
            cell_height: 3,
            margin_x: 2,
            margin_y: 1,
        }
    }
}

// index * cell + (index + 1) * margin, None when it leaves the u16 range
fn axis_offset(index: usize, cell: u16, margin: u16) -> Option<u16> {
    let i = u16::try_from(index).ok()?;
    i.checked_mul(cell)?.checked_add(i.checked_add(1)?.checked_mul(margin)?)
}

fn axis_cell(pos: i32, cell: u16, margin: u16, n: usize) -> Option<usize> {
    let pitch = cell as i32 + margin as i32;
    if pitch == 0 {
        return None;
    }
    // Floor division so positions left of / above the board stay negative
    let idx = pos.div_euclid(pitch);
    if idx >= 0 && (idx as usize) < n { Some(idx as usize) } else { None }
}

impl Geometry {
    /// Columns and rows needed to show an `n` x `n` board.
    /// None if the board would not fit any terminal.
    pub fn surface_size(&self, n: usize) -> Option<(u16, u16)> {
        // n cells and n + 1 margins: the same sum as the offset of a cell at index n
        let w = axis_offset(n, self.cell_width, self.margin_x)?;
        let h = axis_offset(n, self.cell_height, self.margin_y)?;
        Some((w, h))
    }

    /// Rectangle of cell (x, y), relative to the surface origin
    pub fn cell_rect(&self, x: usize, y: usize) -> Rect {
        Rect::new(
            axis_offset(x, self.cell_width, self.margin_x).unwrap_or(u16::MAX),
            axis_offset(y, self.cell_height, self.margin_y).unwrap_or(u16::MAX),
            self.cell_width,
            self.cell_height,
        )
    }

    /// Map a surface-relative position to the cell under it, if any
    pub fn cell_at(&self, col: i32, row: i32, n: usize) -> Option<(usize, usize)> {
        let x = axis_cell(col, self.cell_width, self.margin_x, n)?;
        let y = axis_cell(row, self.cell_height, self.margin_y, n)?;
        Some((x, y))
    }

    /// Where the board surface sits when centered in `area`, or None if it does not fit
    pub fn surface_in(&self, area: Rect, n: usize) -> Option<Rect> {
        let (w, h) = self.surface_size(n)?;
        if area.width < w || area.height < h {
            return None;
        }
        Some(center_rect(w, h, area))
    }
}

/// Paints one frame of the board from a grid, its revealed cells and the game-over flag
pub struct BoardView<'a> {
    grid: &'a Grid,
    revealed: &'a RevealedState,
    game_over: bool,
    geometry: Geometry,
    palette: Palette,
    message: &'a str,
}

impl<'a> BoardView<'a> {
    pub fn new(
        grid: &'a Grid,
        revealed: &'a RevealedState,
        game_over: bool,
        geometry: Geometry,
        palette: Palette,
        message: &'a str,
    ) -> Self {
        BoardView {
            grid,
            revealed,
            game_over,
            geometry,
            palette,
            message,
        }
    }

    pub fn of<R: Rng>(session: &'a Session<R>, geometry: Geometry, palette: Palette, message: &'a str) -> Self {
        BoardView::new(
            session.grid(),
            session.revealed(),
            session.game_over(),
            geometry,
            palette,
            message,
        )
    }

    fn paint_cell(&self, x: usize, y: usize, rect: Rect, buf: &mut Buffer) {
        let mine = self.grid.is_mine(x, y);
        let border = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.palette.text));

        if self.revealed.is_revealed(x, y) || (self.game_over && mine) {
            let fill = if mine { self.palette.mine } else { self.palette.revealed };
            buf.set_style(rect, Style::default().bg(fill));
            border.render(rect, buf);
            if !mine {
                let label = self.grid.label_of(x, y);
                if label != BLANK_LABEL {
                    let s = label.to_string();
                    let lx = rect.x + rect.width.saturating_sub(s.width() as u16) / 2;
                    let ly = rect.y + rect.height / 2;
                    let style = Style::default().fg(self.palette.text).add_modifier(Modifier::BOLD);
                    buf.set_string(lx, ly, s, style);
                }
            }
        } else {
            buf.set_style(rect, Style::default().bg(self.palette.hidden));
            border.render(rect, buf);
        }
    }

    fn paint_overlay(&self, area: Rect, buf: &mut Buffer) {
        let w = self.message.width() as u16;
        let x = area.x + area.width.saturating_sub(w) / 2;
        let y = area.y + area.height / 2;
        let style = Style::default()
            .fg(self.palette.highlight)
            .bg(self.palette.background)
            .add_modifier(Modifier::BOLD);
        buf.set_stringn(x, y, self.message, area.width as usize, style);
    }
}

impl Widget for BoardView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let n = self.grid.size();
        for x in 0..n {
            for y in 0..n {
                let rel = self.geometry.cell_rect(x, y);
                let rect = Rect::new(
                    area.x.saturating_add(rel.x),
                    area.y.saturating_add(rel.y),
                    rel.width,
                    rel.height,
                );
                // skip cells the area cannot hold
                let right = rect.x as u32 + rect.width as u32;
                let bottom = rect.y as u32 + rect.height as u32;
                if right > area.right() as u32 || bottom > area.bottom() as u32 {
                    continue;
                }
                self.paint_cell(x, y, rect, buf);
            }
        }
        if self.game_over {
            self.paint_overlay(area, buf);
        }
    }
}

/// Whole terminal frame: background, then the centered board or a resize notice
pub struct Screen<'a> {
    board: BoardView<'a>,
}

impl<'a> Screen<'a> {
    pub fn new(board: BoardView<'a>) -> Self {
        Screen { board }
    }
}

impl Widget for Screen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, Style::default().bg(self.board.palette.background));
        let n = self.board.grid.size();
        match self.board.geometry.surface_in(area, n) {
            Some(surface) => self.board.render(surface, buf),
            None => {
                let needed = match self.board.geometry.surface_size(n) {
                    Some((min_w, min_h)) => format!("Minimum required: {} x {}", min_w, min_h),
                    None => "Board geometry is too large.".to_string(),
                };
                let warn_lines = vec![
                    Spans::from(Span::raw("Terminal size too small.")),
                    Spans::from(Span::raw(needed)),
                ];
                let warn = Paragraph::new(Text::from(warn_lines))
                    .block(Block::default().borders(Borders::ALL).title("Resize Terminal"))
                    .alignment(Alignment::Center);
                let w = 40u16.min(area.width.saturating_sub(2));
                let h = 5u16.min(area.height.saturating_sub(2));
                warn.render(center_rect(w, h, area), buf);
            }
        }
    }
}

fn center_rect(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

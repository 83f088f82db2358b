//! Stateless rendering of a [`BoardView`].

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use shakmaty::{Color as PieceColor, File, Rank};

use super::input::BoardGeometry;
use crate::chess::TurnPhase;
use crate::session::BoardView;

const CELL_WIDTH: u16 = 5;
const CELL_HEIGHT: u16 = 2;
const RANK_LABEL_WIDTH: u16 = 2;
const BOARD_WIDTH: u16 = RANK_LABEL_WIDTH + 8 * CELL_WIDTH + 2;
const BOARD_HEIGHT: u16 = 8 * CELL_HEIGHT + 1 + 2;

const LIGHT_SQUARE: Color = Color::Rgb(240, 217, 181);
const DARK_SQUARE: Color = Color::Rgb(181, 136, 99);
const SELECTED_SQUARE: Color = Color::Rgb(246, 246, 105);
const DESTINATION_MARK: Color = Color::Rgb(0, 160, 0);

/// Renders one frame and returns where the board squares were drawn.
pub fn draw(frame: &mut Frame, view: &BoardView<'_>, input: &str, status: &str) -> BoardGeometry {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),            // Title
            Constraint::Length(BOARD_HEIGHT), // Board
            Constraint::Min(5),               // Annotation
            Constraint::Length(1),            // Status
            Constraint::Length(3),            // Input
        ])
        .split(area);

    let title = Paragraph::new("Chess Companion")
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    frame.render_widget(title, chunks[0]);

    let geometry = draw_board(frame, chunks[1], view);

    let annotation = Paragraph::new(view.annotation)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Strategy: {}", view.strategy)),
        );
    frame.render_widget(annotation, chunks[2]);

    let status_line = Paragraph::new(status).style(Style::default().fg(Color::Yellow));
    frame.render_widget(status_line, chunks[3]);

    let input_box = Paragraph::new(input).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Command (Enter to send, Esc to quit)"),
    );
    frame.render_widget(input_box, chunks[4]);
    frame.set_cursor_position((
        chunks[4].x + 1 + input.chars().count() as u16,
        chunks[4].y + 1,
    ));

    geometry
}

/// Status text derived from the turn phase.
pub fn phase_status(view: &BoardView<'_>) -> String {
    match view.phase {
        TurnPhase::AwaitingSelection => "Your move: click one of your pieces".to_string(),
        TurnPhase::AwaitingDestination => "Click a marked square to move, anywhere else to cancel".to_string(),
        TurnPhase::OpponentTurn => "Opponent is thinking...".to_string(),
        TurnPhase::GameOver(outcome) => format!("{}. Esc to quit", outcome),
    }
}

fn draw_board(frame: &mut Frame, area: Rect, view: &BoardView<'_>) -> BoardGeometry {
    let area = Rect {
        width: area.width.min(BOARD_WIDTH),
        ..area
    };
    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let geometry = BoardGeometry::new(
        inner.x + RANK_LABEL_WIDTH,
        inner.y,
        CELL_WIDTH,
        CELL_HEIGHT,
        view.human_side,
    );
    let bounds = frame.area();

    for dy in 0..8u16 {
        let (_, rank) = geometry.coords_for_cell(0, dy);
        let label_row = geometry.row_of(dy);
        if label_row < bounds.bottom() {
            let label = Paragraph::new(Rank::new(rank).char().to_string())
                .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(label, Rect::new(inner.x, label_row, 1, 1).intersection(bounds));
        }

        for dx in 0..8u16 {
            let cell = Rect::new(geometry.column_of(dx), label_row, CELL_WIDTH, CELL_HEIGHT)
                .intersection(bounds);
            if cell.area() == 0 {
                continue;
            }
            let (file, rank) = geometry.coords_for_cell(dx, dy);
            let square = geometry.square_for_cell(dx, dy);
            let background = if view.selection.square() == Some(square) {
                SELECTED_SQUARE
            } else if (file + rank) % 2 == 1 {
                LIGHT_SQUARE
            } else {
                DARK_SQUARE
            };

            let span = match view.board.piece_at(square) {
                Some(piece) => {
                    let fg = match piece.color {
                        PieceColor::White => Color::White,
                        PieceColor::Black => Color::Black,
                    };
                    let style = if view.selection.is_destination(square) {
                        Style::default().fg(fg).bg(DESTINATION_MARK)
                    } else {
                        Style::default().fg(fg)
                    };
                    Span::styled(
                        piece.role.upper_char().to_string(),
                        style.add_modifier(Modifier::BOLD),
                    )
                }
                None if view.selection.is_destination(square) => {
                    Span::styled("•", Style::default().fg(DESTINATION_MARK).add_modifier(Modifier::BOLD))
                }
                None => Span::raw(" "),
            };

            let paragraph = Paragraph::new(Line::from(span))
                .alignment(Alignment::Center)
                .style(Style::default().bg(background));
            frame.render_widget(paragraph, cell);
        }
    }

    let files_row = geometry.row_of(8);
    if files_row < bounds.bottom() {
        for dx in 0..8u16 {
            let (file, _) = geometry.coords_for_cell(dx, 0);
            let label = Paragraph::new(File::new(file).char().to_string())
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray));
            let cell = Rect::new(geometry.column_of(dx), files_row, CELL_WIDTH, 1).intersection(bounds);
            frame.render_widget(label, cell);
        }
    }

    geometry
}

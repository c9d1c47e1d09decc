use std::collections::HashMap;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};

use crate::game::{AgentStyle, BetOutcome, Cell, RoundEnd, Side, TickSnapshot, Winner};
use crate::metrics::{BetStreak, DuelMetrics};

/// What occupies a board cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    Empty,
    Food,
    Obstacle,
    Agent { style: AgentStyle, head: bool },
}

impl Glyph {
    fn symbol(&self) -> &'static str {
        match self {
            Glyph::Empty => ". ",
            Glyph::Food => "● ",
            Glyph::Obstacle => "▢ ",
            Glyph::Agent { style: AgentStyle::Filled, .. } => "■ ",
            Glyph::Agent { style: AgentStyle::Outline, .. } => "□ ",
        }
    }

    fn style(&self) -> Style {
        match self {
            Glyph::Empty => Style::default().fg(Color::DarkGray),
            Glyph::Food => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            Glyph::Obstacle => Style::default().fg(Color::Gray),
            Glyph::Agent { style, head } => {
                let color = match style {
                    AgentStyle::Filled => Color::Cyan,
                    AgentStyle::Outline => Color::Magenta,
                };
                let base = Style::default().fg(color);
                if *head {
                    base.add_modifier(Modifier::BOLD)
                } else {
                    base
                }
            }
        }
    }
}

/// Lay the snapshot out as rows of glyphs. Agents are drawn over food.
pub fn board_glyphs(board: &TickSnapshot, cols: usize, rows: usize) -> Vec<Vec<Glyph>> {
    let mut cells: HashMap<Cell, Glyph> = HashMap::new();

    for obstacle in &board.obstacles {
        cells.insert(*obstacle, Glyph::Obstacle);
    }
    cells.insert(board.food, Glyph::Food);
    for agent in &board.agents {
        for (i, segment) in agent.segments.iter().enumerate() {
            cells.insert(
                *segment,
                Glyph::Agent {
                    style: agent.style,
                    head: i == 0,
                },
            );
        }
    }

    (0..rows)
        .map(|y| {
            (0..cols)
                .map(|x| {
                    let cell = Cell::new(x as i32, y as i32);
                    cells.get(&cell).copied().unwrap_or(Glyph::Empty)
                })
                .collect()
        })
        .collect()
}

/// Everything besides the board that the spectator screen shows
pub struct DuelStatus<'a> {
    pub cols: usize,
    pub rows: usize,
    pub wins: (u32, u32),
    pub ties: u32,
    pub bet: Option<Side>,
    pub paused: bool,
    pub round_active: bool,
    pub last_round: Option<&'a RoundEnd>,
    pub streak: &'a BetStreak,
    pub metrics: &'a DuelMetrics,
    pub notice: Option<&'a str>,
}

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, frame: &mut Frame, board: &TickSnapshot, status: &DuelStatus) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // Header
                Constraint::Min(0),    // Board
                Constraint::Length(3), // Footer
            ])
            .split(frame.area());

        frame.render_widget(self.render_stats(board, status), chunks[0]);

        // Center the board horizontally
        let board_area = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(10),
                Constraint::Percentage(80),
                Constraint::Percentage(10),
            ])
            .split(chunks[1])[1];

        match status.last_round {
            Some(end) if !status.round_active => {
                frame.render_widget(self.render_round_over(end), board_area);
            }
            _ => {
                frame.render_widget(self.render_board(board, status), board_area);
            }
        }

        frame.render_widget(self.render_controls(status), chunks[2]);
    }

    fn render_board(&self, board: &TickSnapshot, status: &DuelStatus) -> Paragraph<'_> {
        let lines: Vec<Line> = board_glyphs(board, status.cols, status.rows)
            .into_iter()
            .map(|row| {
                Line::from(
                    row.into_iter()
                        .map(|glyph| Span::styled(glyph.symbol(), glyph.style()))
                        .collect::<Vec<_>>(),
                )
            })
            .collect();

        let title = if status.paused {
            " Snake Duel (paused) "
        } else {
            " Snake Duel "
        };

        Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Double)
                    .border_style(Style::default().fg(Color::White))
                    .title(title),
            )
            .alignment(Alignment::Center)
    }

    fn render_stats(&self, board: &TickSnapshot, status: &DuelStatus) -> Paragraph<'_> {
        let label = Style::default().fg(Color::Yellow);
        let value = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
        let [view_a, view_b] = &board.agents;

        let bet = match status.bet {
            Some(side) => side.as_str().to_string(),
            None => "-".to_string(),
        };

        let text = vec![
            Line::from(vec![
                Span::styled("■ A ", Style::default().fg(Color::Cyan)),
                Span::styled("Score: ", label),
                Span::styled(board.scores[0].to_string(), value),
                Span::styled("  Acc: ", label),
                Span::styled(format!("{:.2}", view_a.accuracy), value),
                Span::raw("    "),
                Span::styled("□ B ", Style::default().fg(Color::Magenta)),
                Span::styled("Score: ", label),
                Span::styled(board.scores[1].to_string(), value),
                Span::styled("  Acc: ", label),
                Span::styled(format!("{:.2}", view_b.accuracy), value),
            ]),
            Line::from(vec![
                Span::styled("Wins: ", label),
                Span::styled(format!("{} - {}", status.wins.0, status.wins.1), value),
                Span::styled("  Ties: ", label),
                Span::styled(status.ties.to_string(), value),
                Span::raw("    "),
                Span::styled("Bet: ", label),
                Span::styled(bet, value),
                Span::styled("  Streak: ", label),
                Span::styled(
                    format!("{} (best {})", status.streak.current(), status.streak.best()),
                    value,
                ),
                Span::raw("    "),
                Span::styled("Time: ", label),
                Span::styled(status.metrics.format_time(), Style::default().fg(Color::White)),
            ]),
            Line::from(Span::styled(
                status.notice.unwrap_or("").to_string(),
                Style::default().fg(Color::Gray),
            )),
        ];

        Paragraph::new(text).alignment(Alignment::Center)
    }

    fn render_round_over(&self, end: &RoundEnd) -> Paragraph<'_> {
        let (headline, color) = match end.winner {
            Winner::A => ("A WINS", Color::Cyan),
            Winner::B => ("B WINS", Color::Magenta),
            Winner::Tie => ("TIE", Color::Yellow),
        };

        let bet_line = match end.bet_outcome {
            BetOutcome::Won => Span::styled(
                "Your bet won!",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
            BetOutcome::Lost => Span::styled(
                "Your bet lost",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            BetOutcome::NoBet => Span::styled("No bet placed", Style::default().fg(Color::Gray)),
        };

        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                headline,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("Round time: ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    format!("{:.1}s", end.duration_ms as f64 / 1000.0),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ),
                Span::raw("    "),
                Span::styled("Scores: ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    format!("{} - {}", end.scores[0], end.scores[1]),
                    Style::default().fg(Color::White),
                ),
            ]),
            Line::from(""),
            Line::from(bet_line),
            Line::from(""),
            Line::from(Span::styled(
                "Next round starting...",
                Style::default().fg(Color::Gray),
            )),
        ];

        Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        )
    }

    fn render_controls(&self, status: &DuelStatus) -> Paragraph<'_> {
        let pause_label = if status.paused { " resume | " } else { " pause | " };

        let text = vec![Line::from(vec![
            Span::styled("A", Style::default().fg(Color::Cyan)),
            Span::raw("/"),
            Span::styled("B", Style::default().fg(Color::Magenta)),
            Span::raw(" bet | "),
            Span::styled("Space", Style::default().fg(Color::Cyan)),
            Span::raw(pause_label),
            Span::styled("R", Style::default().fg(Color::Green)),
            Span::raw(" restart | "),
            Span::styled("Q", Style::default().fg(Color::Red)),
            Span::raw(" to quit"),
        ])];

        Paragraph::new(text).alignment(Alignment::Center)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

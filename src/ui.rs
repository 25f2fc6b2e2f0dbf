pub mod grid;
pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
    Frame,
};

use crate::app::AppState;
use crate::session::{Feedback, GameSnapshot, Modality, SessionSummary};
use crate::speech::symbol;
use crate::ui::grid::Grid;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

pub fn draw(state: AppState, snapshot: &GameSnapshot, f: &mut Frame) {
    screen::current_screen(state).render(snapshot, f);
}

fn summary_line(summary: &SessionSummary) -> String {
    let mut line = format!(
        "score {}   wrong {}   missed {}   {}% acc",
        summary.score,
        summary.incorrect,
        summary.missed,
        summary.accuracy()
    );
    if summary.new_high_score {
        line.push_str("   NEW HIGH SCORE!");
    }
    line
}

pub struct HomeView<'a> {
    pub snapshot: &'a GameSnapshot,
}

impl Widget for HomeView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let s = self.snapshot;
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(3), // title
                Constraint::Length(1), // high score
                Constraint::Length(1), // padding
                Constraint::Length(3), // settings
                Constraint::Length(1), // modality
                Constraint::Length(1), // padding
                Constraint::Length(1), // last session
                Constraint::Min(0),
                Constraint::Length(2), // legend
            ])
            .split(area);

        Paragraph::new("N-Back Trainer")
            .block(Block::default().borders(Borders::ALL))
            .style(bold_style.fg(Color::Cyan))
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        let high_score = match s.high_score_set {
            Some(at) => format!("High score: {} (set {})", s.high_score, at.format("%Y-%m-%d")),
            None => format!("High score: {}", s.high_score),
        };
        Paragraph::new(high_score)
            .style(bold_style.fg(Color::Yellow))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

        Paragraph::new(format!(
            "N-back: {}   Interval: {} ms   Events: {}   Stimuli: {}",
            s.back_distance,
            s.interval.as_millis(),
            s.total_events,
            s.cardinality
        ))
        .block(Block::default().borders(Borders::ALL).title("Settings"))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

        let selected = bold_style.add_modifier(Modifier::REVERSED);
        let unselected = Style::default().add_modifier(Modifier::DIM);
        let (visual, audio) = match s.modality {
            Modality::Visual => (selected, unselected),
            Modality::Audio => (unselected, selected),
        };
        Paragraph::new(Line::from(vec![
            Span::raw("Mode: "),
            Span::styled(" Visual ", visual),
            Span::raw("  "),
            Span::styled(" Audio ", audio),
        ]))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);

        if let Some(summary) = &s.summary {
            Paragraph::new(format!("Last session: {}", summary_line(summary)))
                .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC))
                .alignment(Alignment::Center)
                .render(chunks[6], buf);
        }

        Paragraph::new(
            "(enter) start / (v)isual (a)udio (tab) toggle / (esc)ape\n(n/N) n-back +/- / (i/I) interval +/- / (e/E) events +/-",
        )
        .style(italic_style.fg(Color::Gray))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[8], buf);
    }
}

pub struct GameView<'a> {
    pub snapshot: &'a GameSnapshot,
}

impl Widget for GameView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let s = self.snapshot;
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(3), // score
                Constraint::Length(1), // progress / summary
                Constraint::Min(3),    // stimulus
                Constraint::Length(1), // feedback
                Constraint::Length(1), // legend
            ])
            .split(area);

        Paragraph::new(format!(
            "Score: {}   High score: {}",
            s.score, s.high_score
        ))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("N-Back (N={})", s.back_distance)),
        )
        .style(bold_style)
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

        let progress = if s.running {
            format!("Event {} / {}", s.presented, s.total_events)
        } else if let Some(summary) = &s.summary {
            summary_line(summary)
        } else {
            String::new()
        };
        Paragraph::new(progress)
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

        match s.modality {
            Modality::Visual => Grid {
                cardinality: s.cardinality,
                lit: s.stimulus,
            }
            .render(chunks[2], buf),
            Modality::Audio => {
                let text = match s.stimulus.and_then(symbol) {
                    Some(letter) => format!("♪  {letter}"),
                    None if s.running => "♪".to_string(),
                    None => "finished".to_string(),
                };
                let stage = chunks[2];
                if stage.height > 0 {
                    let middle = Rect::new(stage.x, stage.y + stage.height / 2, stage.width, 1);
                    Paragraph::new(text)
                        .style(bold_style.fg(Color::Cyan))
                        .alignment(Alignment::Center)
                        .render(middle, buf);
                }
            }
        }

        let feedback = match s.feedback {
            Feedback::Correct => Span::styled("✓ Correct!", bold_style.fg(Color::Green)),
            Feedback::Incorrect => Span::styled("✗ Try again!", bold_style.fg(Color::Red)),
            Feedback::None => Span::raw(""),
        };
        Paragraph::new(feedback)
            .alignment(Alignment::Center)
            .render(chunks[3], buf);

        let legend = if s.running {
            "(space) match / (r)estart / (esc)ape"
        } else {
            "(enter) play again / (b)ack / (esc)ape"
        };
        Paragraph::new(Span::styled(legend, italic_style))
            .alignment(Alignment::Center)
            .render(chunks[4], buf);
    }
}

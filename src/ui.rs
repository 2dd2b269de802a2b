use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use time_humanize::{Accuracy, HumanTime, Tense};
use unicode_width::UnicodeWidthStr;

use crate::engine::Outcome;
use crate::{App, AppScreen};

const HORIZONTAL_MARGIN: u16 = 5;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.screen {
            AppScreen::Quiz => render_quiz(self, area, buf),
            AppScreen::Summary => render_summary(self, area, buf),
            AppScreen::Progress => render_progress(self, area, buf),
        }
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn render_quiz(app: &App, area: Rect, buf: &mut Buffer) {
    let quiz = &app.quiz;
    let question = quiz.current();

    let top_pad = (area.height.saturating_sub(12)) / 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints(
            [
                Constraint::Length(top_pad),
                Constraint::Length(1), // feedback
                Constraint::Length(1),
                Constraint::Length(1), // prompt
                Constraint::Length(2),
                Constraint::Length(1), // option row 1
                Constraint::Length(1),
                Constraint::Length(1), // option row 2
                Constraint::Min(0),
                Constraint::Length(1), // footer
            ]
            .as_ref(),
        )
        .split(area);

    let feedback = match quiz.feedback() {
        Some(f) => {
            let style = match f.outcome {
                Outcome::Correct => bold().fg(Color::Green),
                Outcome::Wrong => bold().fg(Color::Red),
            };
            Span::styled(f.text.clone(), style)
        }
        None => Span::styled("feedback ~", dim()),
    };
    Paragraph::new(Line::from(feedback))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(question.prompt.clone(), bold()))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    // First row carries up to three options; the rest spill below
    let top_row: Vec<&String> = question.options.iter().take(3).collect();
    let bottom_row: Vec<&String> = question.options.iter().skip(3).collect();
    render_option_row(quiz, &top_row, 0, chunks[5], buf);
    if !bottom_row.is_empty() {
        render_option_row(quiz, &bottom_row, 3, chunks[7], buf);
    }

    let mode = if quiz.is_reverse() { "⇄ reverse" } else { "→ forward" };
    let footer = format!(
        "{} · streak {} · score {} · options {} · {} · (p)rogress · esc to finish",
        quiz.deck().name,
        quiz.stats().current_streak(),
        quiz.stats().score(),
        quiz.option_count(),
        mode,
    );
    Paragraph::new(Span::styled(footer, dim()))
        .alignment(Alignment::Center)
        .render(chunks[9], buf);
}

fn render_option_row(
    quiz: &crate::quiz::Quiz,
    options: &[&String],
    index_offset: usize,
    area: Rect,
    buf: &mut Buffer,
) {
    if options.is_empty() {
        return;
    }

    let constraints: Vec<Constraint> = options
        .iter()
        .map(|_| Constraint::Ratio(1, options.len() as u32))
        .collect();
    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    for (i, option) in options.iter().enumerate() {
        let disabled = quiz.wrong_picks().contains(*option);
        let style = if disabled {
            dim().add_modifier(Modifier::CROSSED_OUT)
        } else {
            bold().fg(Color::Cyan)
        };

        let label = format!("{} {}", index_offset + i + 1, option);
        Paragraph::new(Span::styled(label, style))
            .alignment(Alignment::Center)
            .render(cells[i], buf);
    }
}

fn render_summary(app: &App, area: Rect, buf: &mut Buffer) {
    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled("session results", bold())),
        Line::default(),
    ];

    if let Some(summary) = &app.summary {
        lines.push(stat_line("answered", summary.answered.to_string()));
        lines.push(stat_line("correct", summary.correct.to_string()));
        lines.push(stat_line("wrong", summary.wrong.to_string()));
        lines.push(stat_line(
            "accuracy",
            summary
                .accuracy
                .map_or("—".to_string(), |a| format!("{:.0}%", a * 100.0)),
        ));
        lines.push(stat_line("score", summary.score.to_string()));
        if let Some(avg) = summary.avg_answer_secs {
            let sd = summary.answer_secs_std_dev.unwrap_or(0.0);
            lines.push(stat_line("answer time", format!("{avg:.1}s ± {sd:.1}s")));
        }
        lines.push(stat_line(
            "all-time best",
            summary.snapshot.all_time.best_streak.to_string(),
        ));
    }

    if !app.fresh_achievements.is_empty() {
        lines.push(Line::default());
        for achievement in &app.fresh_achievements {
            lines.push(Line::from(Span::styled(
                format!("★ {}", achievement.title),
                bold().fg(Color::Yellow),
            )));
        }
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "(r) new session · (p) progress · esc quit",
        dim(),
    )));

    centered_paragraph(lines, area, buf);
}

fn render_progress(app: &App, area: Rect, buf: &mut Buffer) {
    let all_time = app.quiz.stats().all_time();

    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled("all-time progress", bold())),
        Line::default(),
        stat_line("sessions", all_time.total_sessions.to_string()),
        stat_line("correct", all_time.total_correct.to_string()),
        stat_line("wrong", all_time.total_incorrect.to_string()),
        stat_line("best streak", all_time.best_streak.to_string()),
        Line::default(),
    ];

    if !app.recent_sessions.is_empty() {
        lines.push(Line::from(Span::styled("recent sessions", bold())));
        for record in app.recent_sessions.iter().take(5) {
            let elapsed = (chrono::Local::now() - record.date)
                .to_std()
                .unwrap_or_default();
            lines.push(Line::from(Span::raw(format!(
                "{} — {} — {}/{} ({:.0}%)",
                HumanTime::from(elapsed).to_text_en(Accuracy::Rough, Tense::Past),
                record.deck,
                record.correct,
                record.answered,
                record.accuracy,
            ))));
        }
        lines.push(Line::default());
    }

    let shaky: Vec<(String, f64, u64, u64)> = all_time
        .character_mastery
        .iter()
        .map(|(kana, m)| {
            let total = m.correct + m.incorrect;
            let accuracy = if total == 0 {
                1.0
            } else {
                m.correct as f64 / total as f64
            };
            (kana.clone(), accuracy, m.correct, m.incorrect)
        })
        .sorted_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .take(10)
        .collect();

    if !shaky.is_empty() {
        lines.push(Line::from(Span::styled("weakest characters", bold())));
        for (kana, accuracy, correct, incorrect) in &shaky {
            let pad = " ".repeat(4usize.saturating_sub(kana.width()));
            lines.push(Line::from(Span::raw(format!(
                "{kana}{pad}{:>3.0}%  ({correct}✓ {incorrect}✗)",
                accuracy * 100.0,
            ))));
        }
        lines.push(Line::default());
    }

    let focus = app.quiz.selector().needs_focus(8);
    if !focus.is_empty() {
        let listing = focus
            .iter()
            .map(|(kana, weight)| format!("{kana} ×{weight:.1}"))
            .join("  ");
        lines.push(Line::from(Span::styled("needs focus", bold())));
        lines.push(Line::from(Span::raw(listing)));
        lines.push(Line::default());
    }

    lines.push(Line::from(Span::styled(
        "(b) back · (c) clear all progress · esc quit",
        dim(),
    )));

    centered_paragraph(lines, area, buf);
}

fn stat_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label:>12}  "), dim()),
        Span::styled(value, bold()),
    ])
}

fn centered_paragraph(lines: Vec<Line>, area: Rect, buf: &mut Buffer) {
    let height = lines.len() as u16;
    let top_pad = area.height.saturating_sub(height) / 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([Constraint::Length(top_pad), Constraint::Min(height)].as_ref())
        .split(area);

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[1], buf);
}

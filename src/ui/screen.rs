use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span, Text},
    widgets::{
        Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table, Widget, Wrap,
    },
};

use crate::{
    app::{App, SaveStatus, SetupField, SetupForm},
    game::GameResult,
    history::GameHistory,
    locale::{format_count, format_percent, format_seconds, format_timestamp, format_whole_seconds},
    problem::{Operator, Problem},
    ui::{charting, HORIZONTAL_MARGIN, VERTICAL_MARGIN},
};

/// A UI screen boundary: renders one app state
pub trait Screen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer);
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn legend(text: &str) -> Paragraph<'_> {
    Paragraph::new(Span::styled(
        text,
        Style::default().add_modifier(Modifier::ITALIC),
    ))
}

pub struct SetupScreen<'a> {
    pub form: &'a SetupForm,
}

impl Screen for SetupScreen<'_> {
    fn render(&self, _app: &App, area: Rect, buf: &mut Buffer) {
        let form = self.form;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(6), // fields
                Constraint::Length(2), // error
                Constraint::Min(0),
                Constraint::Length(1), // legend
            ])
            .split(area);

        let lines: Vec<Line> = SetupField::ALL
            .iter()
            .map(|&field| {
                let focused = field == form.focus;
                let value = match field {
                    SetupField::Count => form.count.clone(),
                    SetupField::Min => form.min.clone(),
                    SetupField::Max => form.max.clone(),
                    SetupField::Operators => operator_checkboxes(&form.operators),
                };
                let label_style = if focused {
                    bold().fg(Color::Yellow)
                } else {
                    Style::default()
                };
                Line::from(vec![
                    Span::styled(if focused { "> " } else { "  " }, label_style),
                    Span::styled(format!("{:<18}", field.label()), label_style),
                    Span::styled(value, bold()),
                ])
            })
            .collect();

        Paragraph::new(Text::from(lines))
            .block(Block::default().borders(Borders::ALL).title(" 1×1 Trainer "))
            .render(chunks[0], buf);

        if let Some(error) = &form.error {
            Paragraph::new(Span::styled(error.as_str(), bold().fg(Color::Red)))
                .wrap(Wrap { trim: true })
                .render(chunks[1], buf);
        }

        legend("(tab) next field / (+) (*) operators / (enter) start / (h)istory / (esc)ape")
            .render(chunks[3], buf);
    }
}

fn operator_checkboxes(enabled: &[Operator]) -> String {
    Operator::ALL
        .iter()
        .map(|op| {
            let mark = if enabled.contains(op) { 'x' } else { ' ' };
            format!("[{mark}] {}", op.symbol())
        })
        .collect::<Vec<_>>()
        .join("  ")
}

pub struct RunningScreen<'a> {
    pub problem: Option<&'a Problem>,
    pub index: usize,
    pub count: usize,
    pub input: &'a str,
}

impl Screen for RunningScreen<'_> {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let Some(problem) = self.problem else {
            return;
        };

        let side = area.height.saturating_sub(5) / 2;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(side),
                Constraint::Length(1), // progress
                Constraint::Length(1),
                Constraint::Length(1), // problem
                Constraint::Length(1),
                Constraint::Length(1), // timer
                Constraint::Min(0),
                Constraint::Length(1), // legend
            ])
            .split(area);

        Paragraph::new(Span::styled(
            format!(
                "Problem {} of {}",
                format_count(self.index as i64 + 1),
                format_count(self.count as i64)
            ),
            dim(),
        ))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

        Paragraph::new(problem_line(problem, self.input))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);

        if let Some(elapsed) = app.elapsed() {
            Paragraph::new(Span::styled(
                format!("{} s", format_whole_seconds(elapsed)),
                dim(),
            ))
            .alignment(Alignment::Center)
            .render(chunks[5], buf);
        }

        legend("(enter) submit / (esc)ape").render(chunks[7], buf);
    }
}

/// The problem with the hidden slot replaced by the answer being typed
fn problem_line<'a>(problem: &Problem, input: &'a str) -> Line<'a> {
    let slot = |value: Option<i64>| match value {
        Some(v) => Span::styled(v.to_string(), bold()),
        None if input.is_empty() => Span::styled(
            "__",
            bold().fg(Color::Yellow).add_modifier(Modifier::SLOW_BLINK),
        ),
        None => Span::styled(
            input,
            bold().fg(Color::Yellow).add_modifier(Modifier::UNDERLINED),
        ),
    };
    let [a, b, r] = problem.visible_slots();
    Line::from(vec![
        slot(a),
        Span::raw(format!(" {} ", problem.operator.symbol())),
        slot(b),
        Span::raw(" = "),
        slot(r),
    ])
}

pub struct FinishedScreen<'a> {
    pub result: &'a GameResult,
    pub save: &'a SaveStatus,
}

impl Screen for FinishedScreen<'_> {
    fn render(&self, _app: &App, area: Rect, buf: &mut Buffer) {
        let result = self.result;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // headline
                Constraint::Length(1), // stats
                Constraint::Length(1), // save status
                Constraint::Length(1),
                Constraint::Min(0), // mistakes
                Constraint::Length(1), // legend
            ])
            .split(area);

        let headline = if result.is_perfect() {
            Span::styled(
                format!(
                    "Perfect! All {} correct",
                    format_count(result.problem_count as i64)
                ),
                bold().fg(Color::Green),
            )
        } else {
            Span::styled(
                format!(
                    "{} of {} correct",
                    format_count(result.correct_count as i64),
                    format_count(result.problem_count as i64)
                ),
                bold(),
            )
        };
        Paragraph::new(headline)
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        Paragraph::new(Span::styled(
            format!(
                "{} correct   {} s total   {} s per problem",
                format_percent(result.correct_rate),
                format_whole_seconds(result.duration),
                format_seconds(result.duration_per_problem)
            ),
            bold(),
        ))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

        let save = match self.save {
            SaveStatus::Saved => Span::styled("Saved to history", dim()),
            SaveStatus::Failed(e) => {
                Span::styled(format!("Could not save history: {e}"), Style::default().fg(Color::Red))
            }
        };
        Paragraph::new(save)
            .alignment(Alignment::Center)
            .render(chunks[2], buf);

        let mistakes: Vec<Line> = result
            .mistakes()
            .map(|m| {
                let answered = m
                    .solution
                    .map_or_else(|| "-".to_string(), |v| v.to_string());
                Line::from(vec![
                    Span::raw(format!("{:<16}", m.problem.to_string())),
                    Span::styled(format!("yours {answered:>6}"), Style::default().fg(Color::Red)),
                    Span::styled(
                        format!("   correct {:>6}", m.problem.solution()),
                        Style::default().fg(Color::Green),
                    ),
                ])
            })
            .collect();
        if !mistakes.is_empty() {
            Paragraph::new(Text::from(mistakes))
                .block(Block::default().borders(Borders::ALL).title(" Mistakes "))
                .render(chunks[4], buf);
        }

        legend("(r)etry / (s)etup / (h)istory / (esc)ape").render(chunks[5], buf);
    }
}

pub struct HistoryScreen<'a> {
    pub history: Result<&'a GameHistory, &'a str>,
    pub scroll: usize,
}

impl Screen for HistoryScreen<'_> {
    fn render(&self, _app: &App, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1),      // summary
                Constraint::Percentage(50), // chart
                Constraint::Min(3),         // games
                Constraint::Length(1),      // legend
            ])
            .split(area);

        legend("(b)ack / ↑/↓ scroll / (esc)ape").render(chunks[3], buf);

        let history = match self.history {
            Ok(history) if !history.is_empty() => history,
            Ok(_) => {
                Paragraph::new(Span::styled("No games played yet", dim()))
                    .alignment(Alignment::Center)
                    .render(chunks[1], buf);
                return;
            }
            Err(e) => {
                Paragraph::new(Span::styled(
                    format!("Could not load history: {e}"),
                    bold().fg(Color::Red),
                ))
                .wrap(Wrap { trim: true })
                .render(chunks[1], buf);
                return;
            }
        };

        let summary = history.summary();
        let mut text = format!(
            "{} games   {} problems   {} average",
            format_count(summary.games as i64),
            format_count(summary.problems as i64),
            format_percent(summary.mean_correct_rate.unwrap_or_default()),
        );
        if let Some(per_problem) = summary.mean_duration_per_problem {
            text.push_str(&format!("   {} s per problem", format_seconds(per_problem)));
        }
        if let Some(sd) = summary.std_dev_duration_per_problem {
            text.push_str(&format!(" (sd {})", format_seconds(sd)));
        }
        Paragraph::new(Span::styled(text, bold()))
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        render_rate_chart(history, chunks[1], buf);

        let rows: Vec<Row> = history
            .games
            .iter()
            .rev()
            .skip(self.scroll)
            .map(|game| {
                Row::new(vec![
                    Cell::from(format_timestamp(game.started_at)),
                    Cell::from(format!(
                        "{} of {}",
                        format_count(game.correct_count as i64),
                        format_count(game.problem_count as i64)
                    )),
                    Cell::from(format_percent(game.correct_rate)),
                    Cell::from(format!("{} s", format_whole_seconds(game.duration))),
                    Cell::from(format!("{} s", format_seconds(game.duration_per_problem))),
                ])
            })
            .collect();

        let header = Row::new(vec!["Started", "Correct", "Rate", "Time", "Per problem"])
            .style(bold().fg(Color::Yellow));
        Table::new(
            rows,
            &[
                Constraint::Length(17),
                Constraint::Length(12),
                Constraint::Length(6),
                Constraint::Length(9),
                Constraint::Length(12),
            ],
        )
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Games (newest first, {}/{}) ", self.scroll + 1, history.len())),
        )
        .render(chunks[2], buf);
    }
}

fn render_rate_chart(history: &GameHistory, area: Rect, buf: &mut Buffer) {
    let coords = charting::rate_coords(history);
    let (game_count, highest_rate) = charting::compute_chart_params(&coords, 100.0);

    let datasets = vec![Dataset::default()
        .marker(Marker::Braille)
        .style(Style::default().fg(Color::Magenta))
        .graph_type(GraphType::Line)
        .data(&coords)];

    Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("game")
                .bounds([1.0, game_count])
                .labels(vec![
                    Span::styled("1", bold()),
                    Span::styled(charting::format_label(game_count), bold()),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("% correct")
                .bounds([0.0, highest_rate])
                .labels(vec![
                    Span::styled("0", bold()),
                    Span::styled(charting::format_label(highest_rate), bold()),
                ]),
        )
        .render(area, buf);
}

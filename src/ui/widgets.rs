//! Custom TUI widgets

use crate::engine::Status;
use crate::measure::{ResultStatus, TestResult};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Widget for displaying result rows
pub struct ResultsPanel<'a> {
    results: &'a [TestResult],
    title: &'a str,
}

impl<'a> ResultsPanel<'a> {
    pub fn new(results: &'a [TestResult], title: &'a str) -> Self {
        Self { results, title }
    }

    fn status_color(status: ResultStatus) -> Color {
        match status {
            ResultStatus::Ok => Color::Green,
            ResultStatus::Warning => Color::Yellow,
            ResultStatus::Error => Color::Red,
            ResultStatus::Info => Color::Cyan,
        }
    }

    fn status_symbol(status: ResultStatus) -> &'static str {
        match status {
            ResultStatus::Ok => "[OK]",
            ResultStatus::Warning => "[!!]",
            ResultStatus::Error => "[XX]",
            ResultStatus::Info => "[--]",
        }
    }
}

impl<'a> Widget for ResultsPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(self.title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White));

        let inner = block.inner(area);
        block.render(area, buf);

        let mut y = inner.y;
        for result in self.results {
            if y >= inner.y + inner.height {
                break;
            }

            let color = Self::status_color(result.status);
            let line = Line::from(vec![
                Span::styled(
                    format!("{} ", Self::status_symbol(result.status)),
                    Style::default().fg(color),
                ),
                Span::styled(
                    format!("{:<12} ", result.label),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ),
                Span::styled(&result.value, Style::default().fg(color)),
            ]);

            buf.set_line(inner.x, y, &line, inner.width);
            y += 1;
        }
    }
}

/// Widget for the help screen
pub struct HelpPanel;

impl Widget for HelpPanel {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title("Help - pulsekey")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        let inner = block.inner(area);
        block.render(area, buf);

        let help_text = [
            "",
            " BINDINGS",
            " -----------",
            " h                : Detect a new hotkey (next key or button)",
            " o                : Detect a new output",
            " Esc              : Cancel detection, rate entry or a stopped test",
            " m                : Switch Toggle / Hold mode",
            "",
            " RATE",
            " -----------",
            " + / -            : Step through suggested rates",
            " c                : Type a rate, Enter to apply",
            " j                : Humanize on/off",
            " p                : Micro pauses on/off",
            " [ / ]            : Jitter down / up",
            "",
            " RATE TEST",
            " -----------",
            " d                : Cycle test duration (5/10/15s)",
            " t                : Start a test, then hold or toggle the hotkey",
            " e                : Export the last result to JSON",
            "",
            " OTHER",
            " -----------",
            " Tab / Shift+Tab  : Switch views",
            " r                : Retry a blocked listener",
            " q                : Quit",
            "",
            " Command keys are ignored while clicking or during a test;",
            " Ctrl+C always quits.",
        ];

        for (i, line) in help_text.iter().enumerate() {
            if i as u16 >= inner.height {
                break;
            }
            let style = if line.contains("---") {
                Style::default().fg(Color::DarkGray)
            } else if line.len() > 1 && line[1..].chars().all(|c| c.is_ascii_uppercase() || c == ' ') {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            buf.set_string(inner.x, inner.y + i as u16, line, style);
        }
    }
}

/// Colour for the engine status badge
pub fn status_color(status: Status) -> Color {
    match status {
        s if s.is_blocked() => Color::Red,
        Status::CapturingHotkey | Status::CapturingOutput => Color::Yellow,
        Status::Running => Color::Green,
        _ => Color::White,
    }
}

/// Status bar widget
pub struct StatusBar<'a> {
    status: Status,
    view: &'a str,
    elapsed: &'a str,
    rate: u32,
    message: Option<&'a str>,
}

impl<'a> StatusBar<'a> {
    pub fn new(status: Status, view: &'a str, elapsed: &'a str, rate: u32) -> Self {
        Self {
            status,
            view,
            elapsed,
            rate,
            message: None,
        }
    }

    pub fn message(mut self, message: Option<&'a str>) -> Self {
        self.message = message;
        self
    }
}

impl<'a> Widget for StatusBar<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bg_style = Style::default().bg(Color::DarkGray).fg(Color::White);
        for x in area.x..area.x + area.width {
            buf.set_string(x, area.y, " ", bg_style);
        }

        // Left: status badge and view
        let badge = format!(" {} ", self.status.label());
        buf.set_string(
            area.x,
            area.y,
            &badge,
            bg_style
                .fg(status_color(self.status))
                .add_modifier(Modifier::BOLD),
        );
        let view = format!("| {} ", self.view);
        buf.set_string(area.x + badge.len() as u16, area.y, &view, bg_style);

        if let Some(msg) = self.message {
            let msg_style = Style::default().bg(Color::DarkGray).fg(Color::Yellow);
            let msg_x = area.x + (area.width / 2).saturating_sub(msg.len() as u16 / 2);
            buf.set_string(msg_x, area.y, msg, msg_style);
        }

        let right = format!(" {} | {}/s ", self.elapsed, self.rate);
        let right_x = area.x + area.width.saturating_sub(right.len() as u16);
        buf.set_string(right_x, area.y, &right, bg_style);
    }
}

/// Tab bar widget
pub struct TabBar<'a> {
    tabs: &'a [&'a str],
    selected: usize,
}

impl<'a> TabBar<'a> {
    pub fn new(tabs: &'a [&'a str], selected: usize) -> Self {
        Self { tabs, selected }
    }
}

impl<'a> Widget for TabBar<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut x = area.x;

        for (i, tab) in self.tabs.iter().enumerate() {
            let style = if i == self.selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::White)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White).bg(Color::DarkGray)
            };

            let label = format!(" {} ", tab);
            let width = label.len() as u16;

            if x + width <= area.x + area.width {
                buf.set_string(x, area.y, &label, style);
                x += width;

                if i < self.tabs.len() - 1 && x < area.x + area.width {
                    buf.set_string(x, area.y, "|", Style::default().fg(Color::DarkGray));
                    x += 1;
                }
            }
        }

        for fill_x in x..area.x + area.width {
            buf.set_string(fill_x, area.y, " ", Style::default().bg(Color::DarkGray));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_panel_renders_rows() {
        let rows = vec![TestResult::ok("Stability", "100/100")];
        let area = Rect::new(0, 0, 40, 4);
        let mut buf = Buffer::empty(area);
        ResultsPanel::new(&rows, "Rate Test").render(area, &mut buf);
        let text: String = (0..area.width)
            .map(|x| buf[(x, 1)].symbol().to_string())
            .collect();
        assert!(text.contains("[OK]"));
        assert!(text.contains("100/100"));
    }

    #[test]
    fn blocked_statuses_are_red() {
        assert_eq!(status_color(Status::OutputBlocked), Color::Red);
        assert_eq!(status_color(Status::Running), Color::Green);
    }
}

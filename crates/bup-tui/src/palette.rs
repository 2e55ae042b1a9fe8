//! Colours for the two display modes

use bup_core::{Priority, Status, ThemeMode, ToastKind};
use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub bg: Color,
    pub fg: Color,
    pub muted: Color,
    pub accent: Color,
    pub border: Color,
    pub highlight: Color,
    pub bar: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
}

impl Palette {
    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Dark => Self {
                bg: Color::Black,
                fg: Color::White,
                muted: Color::Gray,
                accent: Color::Cyan,
                border: Color::Blue,
                highlight: Color::DarkGray,
                bar: Color::DarkGray,
                success: Color::Green,
                warning: Color::Yellow,
                error: Color::Red,
            },
            ThemeMode::Light => Self {
                bg: Color::White,
                fg: Color::Black,
                muted: Color::DarkGray,
                accent: Color::Blue,
                border: Color::Gray,
                highlight: Color::Rgb(220, 230, 245),
                bar: Color::Rgb(230, 230, 230),
                success: Color::Rgb(0, 128, 0),
                warning: Color::Rgb(176, 112, 0),
                error: Color::Rgb(192, 0, 0),
            },
        }
    }

    pub fn base(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    pub fn title(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn status(&self, status: Status) -> Style {
        let color = match status {
            Status::PendingReview => self.warning,
            Status::Scheduled => self.accent,
            Status::InProgress => self.border,
            Status::Completed => self.success,
            Status::Rejected => self.muted,
        };
        Style::default().fg(color)
    }

    pub fn priority(&self, priority: Priority) -> Style {
        match priority {
            Priority::Urgent => Style::default()
                .fg(self.error)
                .add_modifier(Modifier::BOLD),
            Priority::High => Style::default().fg(self.error),
            Priority::Medium => Style::default().fg(self.warning),
            Priority::Low => Style::default().fg(self.muted),
        }
    }

    pub fn toast(&self, kind: ToastKind) -> Color {
        match kind {
            ToastKind::Success => self.success,
            ToastKind::Error => self.error,
            ToastKind::Info => self.accent,
        }
    }
}

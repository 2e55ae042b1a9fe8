//! Rendering

use crate::app::{App, FormField, Speaker};
use crate::palette::Palette;
use bup_core::refresh::RefreshState;
use bup_core::state;
use bup_core::{Issue, Modal, Section};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{
        Bar, BarChart, BarGroup, Block, Borders, Clear, Gauge, List, ListItem, ListState,
        Paragraph, Tabs, Wrap,
    },
};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

pub fn ui(f: &mut Frame, app: &App) {
    let palette = Palette::for_mode(app.theme.applied());
    f.render_widget(Block::default().style(palette.base()), f.area());

    if app.splash.is_visible() {
        render_splash(f, app, &palette);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_tabs(f, app, &palette, chunks[0]);
    match app.section() {
        Section::Home => render_home(f, app, &palette, chunks[1]),
        Section::Dashboard => render_dashboard(f, app, &palette, chunks[1]),
        Section::Reports => render_reports(f, app, &palette, chunks[1]),
        Section::Moderator => render_issue_list(
            f,
            app,
            &palette,
            chunks[1],
            Section::Moderator,
            "Review queue (oldest first)",
        ),
        Section::Schedule => render_schedule(f, app, &palette, chunks[1]),
        Section::Chat => render_chat(f, app, &palette, chunks[1]),
    }
    render_status_bar(f, app, &palette, chunks[2]);

    match app.top_modal() {
        Some(Modal::SubmitIssue) => render_submit_form(f, app, &palette),
        Some(Modal::IssueDetails) => render_details(f, app, &palette),
        Some(Modal::Login) => render_login(f, app, &palette),
        Some(Modal::Otp) => render_otp(f, app, &palette),
        Some(Modal::Theme) => render_theme(f, app, &palette),
        Some(Modal::Help) => render_help_overlay(f, &palette),
        None => {}
    }

    render_toasts(f, app, &palette);
}

fn bordered<'a>(title: impl Into<Line<'a>>, palette: &Palette) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .title(title)
}

fn render_splash(f: &mut Frame, app: &App, palette: &Palette) {
    let area = centered_rect(40, 30, f.area());
    let pending = app.gate.pending();
    let detail = if pending.is_empty() {
        "Ready".to_string()
    } else {
        format!("Loading {}", pending.join(", "))
    };

    let text = vec![
        Line::from(Span::styled("Campus Facilities", palette.title())),
        Line::from(""),
        Line::from(format!(
            "{} {}",
            SPINNER[(app.ticks % 4) as usize],
            detail
        )),
    ];
    let splash = Paragraph::new(text)
        .block(bordered("bup", palette))
        .alignment(Alignment::Center);
    f.render_widget(splash, area);
}

fn render_tabs(f: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let titles: Vec<Line> = Section::ALL
        .iter()
        .enumerate()
        .map(|(i, s)| Line::from(format!("{} {}", i + 1, s.title())))
        .collect();
    let selected = Section::ALL
        .iter()
        .position(|s| *s == app.section())
        .unwrap_or(0);

    let tabs = Tabs::new(titles)
        .block(bordered("Campus Facilities", palette))
        .select(selected)
        .style(Style::default().fg(palette.muted))
        .highlight_style(palette.title().add_modifier(Modifier::UNDERLINED));
    f.render_widget(tabs, area);
}

fn issue_item<'a>(issue: &Issue, palette: &Palette) -> ListItem<'a> {
    let location = issue.location.to_string();
    ListItem::new(Line::from(vec![
        Span::styled(
            format!("{:<8}", issue.priority.to_string()),
            palette.priority(issue.priority),
        ),
        Span::styled(
            format!("{:<15}", issue.status.label()),
            palette.status(issue.status),
        ),
        Span::styled(
            format!("{:<14}", issue.category),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(location, Style::default().fg(palette.muted)),
    ]))
}

fn render_issue_list(
    f: &mut Frame,
    app: &App,
    palette: &Palette,
    area: Rect,
    section: Section,
    title: &str,
) {
    let rows = app.rows(section);
    let title = format!("{} [{}]", title, rows.len());

    if rows.is_empty() {
        let empty = Paragraph::new("Nothing to show")
            .style(Style::default().fg(palette.muted))
            .block(bordered(title, palette));
        f.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = rows.iter().map(|i| issue_item(i, palette)).collect();
    let list = List::new(items)
        .block(bordered(title, palette))
        .highlight_style(
            Style::default()
                .bg(palette.highlight)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut list_state = ListState::default().with_selected(Some(app.selected_index(section)));
    f.render_stateful_widget(list, area, &mut list_state);
}

fn render_home(f: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let filter = state::read(&app.state).filter.clone();
    let mut spans = vec![Span::styled(
        "Search: ",
        Style::default().fg(palette.muted),
    )];
    if app.searching {
        spans.push(Span::styled(
            format!("{}_", filter.query),
            Style::default().fg(palette.accent),
        ));
    } else {
        spans.push(Span::raw(filter.query.clone()));
    }
    spans.push(Span::raw("   "));
    spans.push(Span::styled("Status: ", Style::default().fg(palette.muted)));
    spans.push(Span::raw(
        filter.status.map(|s| s.label()).unwrap_or("all").to_string(),
    ));
    spans.push(Span::raw("   "));
    spans.push(Span::styled("Priority: ", Style::default().fg(palette.muted)));
    spans.push(Span::raw(
        filter
            .priority
            .map(|p| p.to_string())
            .unwrap_or_else(|| "all".to_string()),
    ));

    let bar = Paragraph::new(Line::from(spans)).block(bordered("Filters", palette));
    f.render_widget(bar, chunks[0]);

    render_issue_list(f, app, palette, chunks[1], Section::Home, "Reported issues");
}

fn render_dashboard(f: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let stats = app.views.dashboard.snapshot();
    let pins = app.views.map.snapshot();

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let mut lines = vec![
        Line::from(vec![
            Span::raw("Total issues:  "),
            Span::styled(stats.total.to_string(), palette.title()),
        ]),
        Line::from(vec![
            Span::raw("Open:          "),
            Span::styled(stats.open.to_string(), palette.title()),
        ]),
        Line::from(vec![
            Span::raw("Urgent open:   "),
            Span::styled(
                stats.urgent_open.to_string(),
                Style::default().fg(palette.error),
            ),
        ]),
        Line::from(""),
    ];
    for (status, count) in &stats.by_status {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<15}", status.label()), palette.status(*status)),
            Span::raw(count.to_string()),
        ]));
    }
    f.render_widget(
        Paragraph::new(lines).block(bordered("Overview", palette)),
        chunks[0],
    );

    let items: Vec<ListItem> = if pins.is_empty() {
        vec![ListItem::new(Span::styled(
            "No open issues",
            Style::default().fg(palette.muted),
        ))]
    } else {
        pins.iter()
            .map(|(building, count)| {
                ListItem::new(Line::from(vec![
                    Span::styled("● ", Style::default().fg(palette.warning)),
                    Span::raw(format!("{:<24}", building)),
                    Span::styled(count.to_string(), palette.title()),
                ]))
            })
            .collect()
    };
    f.render_widget(
        List::new(items).block(bordered("Campus map (open per building)", palette)),
        chunks[1],
    );
}

fn render_reports(f: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let data = app.views.reports.snapshot();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(50),
            Constraint::Min(6),
            Constraint::Length(3),
        ])
        .split(area);

    let category_bars: Vec<Bar> = data
        .by_category
        .iter()
        .map(|(name, count)| {
            Bar::default()
                .value(*count as u64)
                .label(Line::from(name.clone()))
                .style(Style::default().fg(palette.accent))
        })
        .collect();
    let categories = BarChart::default()
        .block(bordered("Issues by category", palette))
        .data(BarGroup::default().bars(&category_bars))
        .bar_width(10)
        .bar_gap(2);
    f.render_widget(categories, chunks[0]);

    let priority_bars: Vec<Bar> = data
        .by_priority
        .iter()
        .map(|(priority, count)| {
            Bar::default()
                .value(*count as u64)
                .label(Line::from(priority.to_string()))
                .style(palette.priority(*priority))
        })
        .collect();
    let priorities = BarChart::default()
        .block(bordered("Issues by priority", palette))
        .data(BarGroup::default().bars(&priority_bars))
        .bar_width(8)
        .bar_gap(2);
    f.render_widget(priorities, chunks[1]);

    let rate = Gauge::default()
        .block(bordered("Resolution rate", palette))
        .gauge_style(Style::default().fg(palette.success))
        .ratio(data.resolution_rate.clamp(0.0, 1.0));
    f.render_widget(rate, chunks[2]);
}

fn render_schedule(f: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    if !app.is_logged_in() {
        let text = Paragraph::new("Log in (L) to see the visits assigned to you")
            .style(Style::default().fg(palette.muted))
            .block(bordered("Schedule", palette));
        f.render_widget(text, area);
        return;
    }

    let visits = app.rows(Section::Schedule);
    let items: Vec<ListItem> = visits
        .iter()
        .map(|issue| {
            let when = match (issue.scheduled_on(), issue.scheduled_at()) {
                (Some(day), Some(time)) => format!("{} {}", day, time.format("%H:%M")),
                (Some(day), None) => day.to_string(),
                _ => "unscheduled".to_string(),
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<18}", when), palette.title()),
                Span::styled(
                    format!("{:<14}", issue.category),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(issue.location.to_string()),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(bordered(format!("Assigned visits [{}]", visits.len()), palette))
        .highlight_style(Style::default().bg(palette.highlight))
        .highlight_symbol("> ");
    let mut list_state =
        ListState::default().with_selected(Some(app.selected_index(Section::Schedule)));
    f.render_stateful_widget(list, area, &mut list_state);
}

fn render_chat(f: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(area);

    let mut lines: Vec<Line> = Vec::new();
    for (speaker, text) in &app.chat.transcript {
        let (who, style) = match speaker {
            Speaker::User => ("You", palette.title()),
            Speaker::Assistant => ("Assistant", Style::default().fg(palette.success)),
        };
        lines.push(Line::from(Span::styled(format!("{}:", who), style)));
        lines.extend(text.lines().map(|l| Line::from(format!("  {}", l))));
        lines.push(Line::from(""));
    }
    if app.chat.waiting {
        lines.push(Line::from(Span::styled(
            format!("{} thinking", SPINNER[(app.ticks % 4) as usize]),
            Style::default().fg(palette.muted),
        )));
    }

    // Keep the newest lines in view
    let height = chunks[0].height.saturating_sub(2) as usize;
    let scroll = lines.len().saturating_sub(height) as u16;
    let transcript = Paragraph::new(Text::from(lines))
        .block(bordered("Facilities assistant", palette))
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    f.render_widget(transcript, chunks[0]);

    let (input, style) = if app.chat.editing {
        (
            format!("{}_", app.chat.input),
            Style::default().fg(palette.accent),
        )
    } else {
        (
            "Press Enter to type a message".to_string(),
            Style::default().fg(palette.muted),
        )
    };
    f.render_widget(
        Paragraph::new(input)
            .style(style)
            .block(bordered("Message", palette)),
        chunks[1],
    );
}

fn render_status_bar(f: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let mut spans = Vec::new();

    if app.toasts.is_busy() || app.refresh.state() == RefreshState::Refreshing {
        spans.push(Span::styled(
            format!("{} refreshing ", SPINNER[(app.ticks % 4) as usize]),
            Style::default().fg(palette.warning),
        ));
    }

    let user = app
        .auth
        .session()
        .map(|s| format!("{} ({})", s.user.name, s.user.role))
        .unwrap_or_else(|| "not logged in".to_string());
    spans.push(Span::styled(
        format!("[{}]", user),
        Style::default()
            .fg(palette.success)
            .add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::raw(" | "));
    spans.push(Span::raw(
        "[n]ew [r]efresh [t]heme [L]ogin [O]ut [/]search [f/p]filter [?]help [q]uit",
    ));

    let bar = Paragraph::new(Line::from(spans))
        .style(Style::default().bg(palette.bar).fg(palette.fg))
        .alignment(Alignment::Left);
    f.render_widget(bar, area);
}

fn render_toasts(f: &mut Frame, app: &App, palette: &Palette) {
    let toasts = app.toasts.visible();
    if toasts.is_empty() {
        return;
    }

    let frame = f.area();
    let width = frame.width.min(50);
    let x = frame.width.saturating_sub(width + 1);
    let mut y = frame.y + 3;

    for toast in toasts.iter().take(3) {
        if y + 3 > frame.height {
            break;
        }
        let area = Rect::new(x, y, width, 3);
        let color = palette.toast(toast.kind);
        f.render_widget(Clear, area);
        f.render_widget(
            Paragraph::new(toast.message.as_str())
                .style(palette.base())
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(color)),
                ),
            area,
        );
        y += 3;
    }
}

fn modal_block<'a>(title: &'a str, palette: &Palette) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent))
        .style(palette.base())
        .title(title)
}

fn render_submit_form(f: &mut Frame, app: &App, palette: &Palette) {
    let area = centered_rect(60, 70, f.area());
    f.render_widget(Clear, area);

    let form = &app.form;
    let label = |name: &'static str, field: FormField| {
        let style = if form.field == field {
            palette.title()
        } else {
            Style::default().fg(palette.muted)
        };
        Span::styled(format!("{:<13}", name), style)
    };
    let cursor = |field: FormField| if form.field == field { "_" } else { "" };

    let images = if form.images.is_empty() {
        "none".to_string()
    } else {
        form.images
            .iter()
            .map(|i| i.file_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let footer = if form.sending {
        Line::from(Span::styled(
            format!("{} submitting", SPINNER[(app.ticks % 4) as usize]),
            Style::default().fg(palette.warning),
        ))
    } else {
        Line::from(vec![
            Span::styled("[Enter]", Style::default().fg(palette.success)),
            Span::raw(" Submit  "),
            Span::styled("[Esc]", Style::default().fg(palette.error)),
            Span::raw(" Cancel  "),
            Span::styled("[Tab]", Style::default().fg(palette.warning)),
            Span::raw(" Next field"),
        ])
    };

    let text = vec![
        Line::from(vec![
            label("Category:", FormField::Category),
            Span::raw(&form.category),
            Span::raw(cursor(FormField::Category)),
        ]),
        Line::from(vec![
            label("Priority:", FormField::Priority),
            Span::styled(format!("< {} >", form.priority), palette.priority(form.priority)),
        ]),
        Line::from(vec![
            label("Building:", FormField::Building),
            Span::raw(&form.building),
            Span::raw(cursor(FormField::Building)),
        ]),
        Line::from(vec![
            label("Floor:", FormField::Floor),
            Span::raw(&form.floor),
            Span::raw(cursor(FormField::Floor)),
        ]),
        Line::from(vec![
            label("Room:", FormField::Room),
            Span::raw(&form.room),
            Span::raw(cursor(FormField::Room)),
        ]),
        Line::from(vec![label("Description:", FormField::Description)]),
        Line::from(vec![
            Span::raw("  "),
            Span::raw(&form.description),
            Span::raw(cursor(FormField::Description)),
        ]),
        Line::from(vec![
            label("Image path:", FormField::Image),
            Span::raw(&form.image_path),
            Span::raw(cursor(FormField::Image)),
        ]),
        Line::from(vec![
            Span::styled("  staged: ", Style::default().fg(palette.muted)),
            Span::raw(images),
        ]),
        Line::from(""),
        footer,
    ];

    let paragraph = Paragraph::new(text)
        .block(modal_block("Report an issue", palette))
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn render_details(f: &mut Frame, app: &App, palette: &Palette) {
    let Some(issue) = &app.detail else {
        return;
    };
    let area = centered_rect(60, 60, f.area());
    f.render_widget(Clear, area);

    let field = |name: &'static str, value: String| {
        Line::from(vec![
            Span::styled(format!("{:<13}", name), Style::default().fg(palette.muted)),
            Span::raw(value),
        ])
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled(issue.category.clone(), palette.title()),
            Span::raw("  "),
            Span::styled(issue.status.label(), palette.status(issue.status)),
        ]),
        Line::from(""),
        field("ID:", issue.id.clone()),
        field("Priority:", issue.priority.to_string()),
        field("Location:", issue.location.to_string()),
        field(
            "Reported:",
            issue.created_at.format("%Y-%m-%d %H:%M").to_string(),
        ),
    ];
    if let Some(by) = &issue.submitted_by {
        lines.push(field("Reported by:", by.display_name().to_string()));
    }
    if let Some(to) = &issue.assigned_to {
        lines.push(field("Assigned to:", to.display_name().to_string()));
    }
    if let Some(day) = issue.scheduled_on() {
        let time = issue
            .scheduled_at()
            .map(|t| format!(" {}", t.format("%H:%M")))
            .unwrap_or_default();
        lines.push(field("Visit:", format!("{}{}", day, time)));
    }
    lines.push(Line::from(""));
    lines.extend(issue.description.lines().map(|l| Line::from(l.to_string())));
    for url in &issue.images {
        lines.push(Line::from(Span::styled(
            url.clone(),
            Style::default().fg(palette.accent),
        )));
    }

    let paragraph = Paragraph::new(lines)
        .block(modal_block("Issue details (Esc to close)", palette))
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn render_login(f: &mut Frame, app: &App, palette: &Palette) {
    let area = centered_rect(50, 25, f.area());
    f.render_widget(Clear, area);

    let status = if app.login.busy {
        format!("{} sending code", SPINNER[(app.ticks % 4) as usize])
    } else {
        "Enter to send a code, Esc to cancel".to_string()
    };
    let text = vec![
        Line::from(vec![
            Span::styled("Email: ", palette.title()),
            Span::raw(format!("{}_", app.login.email)),
        ]),
        Line::from(""),
        Line::from(Span::styled(status, Style::default().fg(palette.muted))),
    ];
    f.render_widget(
        Paragraph::new(text).block(modal_block("Log in", palette)),
        area,
    );
}

fn render_otp(f: &mut Frame, app: &App, palette: &Palette) {
    let area = centered_rect(50, 25, f.area());
    f.render_widget(Clear, area);

    let digits: String = (0..bup_core::auth::OTP_LENGTH)
        .map(|i| app.login.code.chars().nth(i).unwrap_or('_'))
        .flat_map(|c| [c, ' '])
        .collect();

    let status = if app.login.busy {
        format!("{} verifying", SPINNER[(app.ticks % 4) as usize])
    } else {
        "Enter to verify, Ctrl-R to resend, Esc to cancel".to_string()
    };
    let text = vec![
        Line::from(format!("Code sent to {}", app.login.email)),
        Line::from(""),
        Line::from(Span::styled(digits, palette.title())),
        Line::from(""),
        Line::from(Span::styled(status, Style::default().fg(palette.muted))),
    ];
    f.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(modal_block("Verify email", palette)),
        area,
    );
}

fn render_theme(f: &mut Frame, app: &App, palette: &Palette) {
    let area = centered_rect(40, 30, f.area());
    f.render_widget(Clear, area);

    let current = app.theme.preference();
    let mut lines: Vec<Line> = bup_core::ThemePreference::ALL
        .iter()
        .enumerate()
        .map(|(i, pref)| {
            let marker = if *pref == current { "●" } else { "○" };
            Line::from(format!("  {} {}  {}", i + 1, marker, pref))
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("Applied: {}", app.theme.applied()),
        Style::default().fg(palette.muted),
    )));
    lines.push(Line::from(Span::styled(
        "1-3 choose, Enter cycles, Esc closes",
        Style::default().fg(palette.muted),
    )));

    f.render_widget(
        Paragraph::new(lines).block(modal_block("Theme", palette)),
        area,
    );
}

fn render_help_overlay(f: &mut Frame, palette: &Palette) {
    let area = centered_rect(60, 80, f.area());
    f.render_widget(Clear, area);

    let help_text = vec![
        Line::from(Span::styled("Keyboard Shortcuts", palette.title())),
        Line::from(""),
        Line::from("Navigation:"),
        Line::from("  Tab/Shift-Tab  Next/previous section"),
        Line::from("  1-6            Jump to section"),
        Line::from("  j/Down         Move down"),
        Line::from("  k/Up           Move up"),
        Line::from("  Enter          Issue details, or type in chat"),
        Line::from(""),
        Line::from("Issues:"),
        Line::from("  n              Report an issue"),
        Line::from("  r              Refresh now"),
        Line::from("  /              Search (home)"),
        Line::from("  f / p          Cycle status / priority filter"),
        Line::from("  x              Clear filters"),
        Line::from(""),
        Line::from("Account:"),
        Line::from("  L              Log in with an emailed code"),
        Line::from("  O              Log out"),
        Line::from("  t              Theme"),
        Line::from(""),
        Line::from("  ?              Help"),
        Line::from("  q / Ctrl-C     Quit"),
        Line::from("  Esc            Close the top dialog"),
    ];

    let paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.warning))
                .style(palette.base())
                .title("Help (press Esc to close)"),
        )
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_is_inside() {
        let outer = Rect::new(0, 0, 100, 40);
        let inner = centered_rect(60, 50, outer);
        assert_eq!(inner.width, 60);
        assert_eq!(inner.height, 20);
        assert_eq!(inner.x, 20);
        assert_eq!(inner.y, 10);
    }
}

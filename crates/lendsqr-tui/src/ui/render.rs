use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use lendsqr_core::utils::format_remaining;

use crate::app::{App, AppState, FilterField, View};

use super::styles;
use super::views::{detail, list};

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_main_content(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame, app),
        AppState::Filtering => render_filter_overlay(frame, app),
        AppState::ActionMenu => render_action_menu(frame, app),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        _ => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  lendsqr  Admin";
    let page = match app.view {
        View::List => "Users",
        View::Detail => "Users › User Details",
    };
    let help_hint = "[?] Help";
    let used = title.chars().count() + page.chars().count() + help_hint.len() + 7;

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::styled("   |   ", styles::muted_style()),
        Span::styled(page, styles::header_style()),
        Span::raw(" ".repeat((area.width as usize).saturating_sub(used + 2))),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.view {
        View::List => list::render(frame, app, area),
        View::Detail => detail::render(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = match app.view {
        View::List => "[/]search [f]ilter [a]ctions [R]eload | [q]uit",
        View::Detail => "[←/→] choose [Enter] apply [Esc] back | [q]uit",
    };

    let left_text = if let Some(ref msg) = app.status_message {
        format!(" {} ", msg)
    } else if let Some(expiry) = app.cache_expires {
        format!(" Cache expires in {} ", format_remaining(expiry))
    } else {
        " Not cached ".to_string()
    };

    let right_text = format!(" {} ", shortcuts);

    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.chars().count());
    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(56, 26, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");
    let source = app.config.source_location().to_string();

    let help_text = vec![
        Line::from(Span::styled("  lendsqr Admin", styles::title_style())),
        Line::from(Span::styled(format!("  version {}", version), styles::muted_style())),
        Line::from(Span::styled(format!("  source  {}", source), styles::muted_style())),
        Line::from(""),
        Line::from(Span::styled(" Users", styles::highlight_style())),
        help_line("↑/↓ j/k", "Move through the table"),
        help_line("←/→ [ ]", "Previous / next page"),
        help_line("p", "Cycle page size (10, 50, 100)"),
        help_line("/", "Search"),
        help_line("f", "Filter"),
        help_line("a", "Row actions"),
        help_line("Enter", "View details"),
        Line::from(""),
        Line::from(Span::styled(" User Details", styles::highlight_style())),
        help_line("←/→", "Choose a status button"),
        help_line("Enter", "Apply status"),
        help_line("Esc", "Back to users"),
        Line::from(""),
        Line::from(Span::styled(" General", styles::highlight_style())),
        help_line("R", "Reload users from source"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(help_text).block(block);

    frame.render_widget(paragraph, area);
}

fn render_filter_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(50, 17, frame.area());
    frame.render_widget(Clear, area);

    let form = &app.filter_form;
    let mut lines = vec![Line::from("")];

    for field in FilterField::ALL {
        let focused = form.focus == field;
        let value = form.value(field);
        let shown = if field.is_select() {
            let choice = if value.is_empty() { "Select" } else { value };
            format!("‹ {} ›", choice)
        } else {
            let cursor = if focused { "▌" } else { "" };
            format!("{}{}", value, cursor)
        };
        let style = if focused {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<14}", field.label()), styles::muted_style()),
            Span::styled(format!("{:<28}", shown), style),
        ]));
        lines.push(Line::from(""));
    }

    lines.push(Line::from(vec![
        Span::styled("  [Enter]", styles::help_key_style()),
        Span::styled(" Filter  ", styles::muted_style()),
        Span::styled("[Ctrl+R]", styles::help_key_style()),
        Span::styled(" Reset  ", styles::muted_style()),
        Span::styled("[Esc]", styles::help_key_style()),
        Span::styled(" Cancel", styles::muted_style()),
    ]));

    let block = Block::default()
        .title(" Filter ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_action_menu(frame: &mut Frame, app: &App) {
    let actions = app.row_actions();
    let height = actions.len() as u16 + 2;
    let area = centered_rect_fixed(28, height, frame.area());
    frame.render_widget(Clear, area);

    let lines: Vec<Line> = actions
        .iter()
        .enumerate()
        .map(|(i, action)| {
            let style = if i == app.action_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            Line::from(Span::styled(format!("  {:<24}", action.label()), style))
        })
        .collect();

    let title = app
        .selected_row()
        .map(|u| format!(" {} ", u.username))
        .unwrap_or_default();

    let block = Block::default()
        .title(title)
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 7, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block);

    frame.render_widget(paragraph, area);
}

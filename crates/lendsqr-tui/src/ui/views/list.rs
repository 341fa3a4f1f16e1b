use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use lendsqr_core::projector::{page_window, PageLink};
use lendsqr_core::utils::{format_joined_long, truncate_string};

use crate::app::{App, AppState};
use crate::ui::styles;

/// Render the users page: summary cards, the table and the pager
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Summary cards
            Constraint::Length(1), // Search / filter line
            Constraint::Min(5),    // Table
            Constraint::Length(1), // Pager
        ])
        .split(area);

    render_summary_cards(frame, app, chunks[0]);
    render_query_line(frame, app, chunks[1]);
    render_table(frame, app, chunks[2]);
    render_pager(frame, app, chunks[3]);
}

fn render_summary_cards(frame: &mut Frame, app: &App, area: Rect) {
    let cards = app.summary().cards();
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    for ((label, count), column) in cards.into_iter().zip(columns.iter()) {
        let lines = vec![
            Line::from(Span::styled(label, styles::muted_style())),
            Line::from(Span::styled(count, styles::title_style())),
        ];
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(styles::muted_style());
        frame.render_widget(Paragraph::new(lines).block(block), *column);
    }
}

fn render_query_line(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(" ")];

    let searching = matches!(app.state, AppState::Searching);
    if searching || !app.list.search().is_empty() {
        let cursor = if searching { "▌" } else { "" };
        spans.push(Span::styled("Search: ", styles::muted_style()));
        spans.push(Span::styled(
            format!("{}{}", app.list.search(), cursor),
            styles::search_style(),
        ));
    } else {
        spans.push(Span::styled("[/] search", styles::muted_style()));
    }

    let filters = app.list.filters();
    if !filters.is_empty() {
        let active: Vec<String> = [
            ("org", &filters.organization),
            ("user", &filters.username),
            ("email", &filters.email),
            ("date", &filters.date),
            ("phone", &filters.phone),
            ("status", &filters.status),
        ]
        .iter()
        .filter(|(_, v)| !v.trim().is_empty())
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();
        spans.push(Span::styled("   Filters: ", styles::muted_style()));
        spans.push(Span::styled(active.join(", "), styles::highlight_style()));
    } else {
        spans.push(Span::styled("   [f] filter", styles::muted_style()));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let projection = app.projection();
    let focused = matches!(app.state, AppState::Normal | AppState::ActionMenu);

    let header_cells = [
        "ORGANIZATION",
        "USERNAME",
        "EMAIL",
        "PHONE NUMBER",
        "DATE JOINED",
        "STATUS",
    ]
    .map(Cell::from);

    let header = Row::new(header_cells)
        .style(styles::header_style())
        .height(1);

    let rows: Vec<Row> = projection
        .visible
        .iter()
        .enumerate()
        .map(|(i, user)| {
            let style = if i == app.selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };

            Row::new(vec![
                Cell::from(truncate_string(&user.organization, 14)),
                Cell::from(truncate_string(&user.username, 18)),
                Cell::from(truncate_string(&user.email, 28)),
                Cell::from(user.phone.clone()),
                Cell::from(format_joined_long(&user.date_joined)),
                Cell::from(Span::styled(
                    user.status.clone(),
                    styles::status_style(&user.status()),
                )),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Fill(2),    // Organization
        Constraint::Fill(2),    // Username
        Constraint::Fill(3),    // Email
        Constraint::Length(14), // Phone
        Constraint::Length(22), // Date joined
        Constraint::Length(12), // Status
    ];

    let title = format!(
        " Users ({} of {}) - [a]ctions [Enter] details ",
        projection.match_count,
        app.repo.users().len()
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !projection.visible.is_empty() {
        state.select(Some(app.selection));
    }

    frame.render_stateful_widget(table, area, &mut state);

    if projection.visible.is_empty() {
        let message = if app.repo.users().is_empty() {
            "No users available"
        } else {
            "No users match the current search and filters"
        };
        let inner = Rect::new(
            area.x + 2,
            area.y + 2,
            area.width.saturating_sub(4),
            1u16.min(area.height.saturating_sub(3)),
        );
        frame.render_widget(
            Paragraph::new(Span::styled(message, styles::muted_style())),
            inner,
        );
    }
}

fn render_pager(frame: &mut Frame, app: &App, area: Rect) {
    let projection = app.projection();
    let page = app.list.page();

    let mut spans = vec![
        Span::styled(" Showing ", styles::muted_style()),
        Span::styled(
            format!("{}", app.list.page_size().as_usize()),
            styles::highlight_style(),
        ),
        Span::styled(
            format!(" out of {}  [p] page size", projection.match_count),
            styles::muted_style(),
        ),
    ];

    let mut links = vec![Span::styled("‹ ", styles::muted_style())];
    for link in page_window(page, projection.total_pages) {
        match link {
            PageLink::Page(n) if n == page => {
                links.push(Span::styled(format!("{} ", n), styles::title_style()));
            }
            PageLink::Page(n) => {
                links.push(Span::styled(format!("{} ", n), styles::muted_style()));
            }
            PageLink::Gap => links.push(Span::styled("… ", styles::muted_style())),
        }
    }
    links.push(Span::styled("›", styles::muted_style()));

    let left_width: usize = spans.iter().map(|s| s.content.chars().count()).sum();
    let right_width: usize = links.iter().map(|s| s.content.chars().count()).sum();
    let padding = (area.width as usize).saturating_sub(left_width + right_width + 1);
    spans.push(Span::raw(" ".repeat(padding)));
    spans.extend(links);

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

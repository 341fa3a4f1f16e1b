use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use lendsqr_core::utils::{format_balance, format_joined_long};
use lendsqr_core::UserRecord;

use crate::app::App;
use crate::ui::styles;

/// Width of the label column in detail sections.
const LABEL_WIDTH: usize = 24;

/// Render the user details page
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(user) = app.detail.as_ref() else {
        render_not_found(frame, app, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Back link + status buttons
            Constraint::Length(5), // Profile header
            Constraint::Min(5),    // Sections
        ])
        .split(area);

    render_actions(frame, app, chunks[0]);
    render_header(frame, user, chunks[1]);
    render_sections(frame, user, chunks[2]);
}

fn render_not_found(frame: &mut Frame, app: &App, area: Rect) {
    let id = app.detail_missing.as_deref().unwrap_or("-");
    let lines = vec![
        Line::from(Span::styled("  ← Back to Users [Esc]", styles::muted_style())),
        Line::from(""),
        Line::from(Span::styled(
            format!("  User not found ({})", id),
            styles::error_style(),
        )),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_actions(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled(" ← Back to Users [Esc]", styles::muted_style()),
        Span::raw("   "),
        Span::styled("User Details", styles::header_style()),
    ];

    let buttons: Vec<Span> = app
        .detail_actions()
        .iter()
        .enumerate()
        .flat_map(|(i, status)| {
            let focused = i == app.detail_selection;
            [
                Span::styled(
                    format!(" {} ", status.button_label().to_uppercase()),
                    styles::button_style(status, focused),
                ),
                Span::raw("  "),
            ]
        })
        .collect();

    let left: usize = spans.iter().map(|s| s.content.chars().count()).sum();
    let right: usize = buttons.iter().map(|s| s.content.chars().count()).sum();
    spans.push(Span::raw(
        " ".repeat((area.width as usize).saturating_sub(left + right + 2)),
    ));
    spans.extend(buttons);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_header(frame: &mut Frame, user: &UserRecord, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(25),
            Constraint::Percentage(35),
        ])
        .split(area);

    let identity = vec![
        Line::from(Span::styled(user.display_name().to_string(), styles::title_style())),
        Line::from(Span::styled(user.username.clone(), styles::muted_style())),
        Line::from(vec![
            Span::styled("Status: ", styles::muted_style()),
            Span::styled(user.status.clone(), styles::status_style(&user.status())),
        ]),
    ];
    let tier = vec![
        Line::from(Span::styled("User's Tier", styles::muted_style())),
        Line::from(Span::styled(tier_stars(user.profile.tier), styles::highlight_style())),
    ];
    let account = vec![
        Line::from(Span::styled(
            format_balance(&user.profile.account_balance),
            styles::title_style(),
        )),
        Line::from(Span::styled(
            format!("{}/{}", user.profile.account_number, user.profile.bank_name),
            styles::muted_style(),
        )),
        Line::from(Span::styled(
            format!("Joined {}", format_joined_long(&user.date_joined)),
            styles::muted_style(),
        )),
    ];

    for (lines, column) in [identity, tier, account].into_iter().zip(columns.iter()) {
        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(styles::muted_style());
        frame.render_widget(Paragraph::new(lines).block(block), *column);
    }
}

/// Three-star tier display, filled up to `tier`.
fn tier_stars(tier: u8) -> String {
    let filled = usize::from(tier.min(3));
    format!("{}{}", "★".repeat(filled), "☆".repeat(3 - filled))
}

fn field<'a>(label: &str, value: impl Into<String>) -> Line<'a> {
    let value = value.into();
    let value = if value.trim().is_empty() {
        "-".to_string()
    } else {
        value
    };
    Line::from(vec![
        Span::styled(format!("{:<width$}", label, width = LABEL_WIDTH), styles::muted_style()),
        Span::raw(value),
    ])
}

fn section<'a>(title: &str, fields: Vec<Line<'a>>) -> Vec<Line<'a>> {
    let mut lines = vec![Line::from(Span::styled(title.to_string(), styles::highlight_style()))];
    lines.extend(fields);
    lines.push(Line::from(""));
    lines
}

fn render_sections(frame: &mut Frame, user: &UserRecord, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let profile = &user.profile;
    let education = &user.education;
    let socials = &user.socials;

    let mut left = section(
        "Personal Information",
        vec![
            field("Full Name", profile.full_name.clone()),
            field("Phone Number", user.phone.clone()),
            field("Email Address", user.email.clone()),
            field("BVN", profile.bvn.clone()),
            field("Gender", profile.gender.clone()),
            field("Marital Status", profile.marital_status.clone()),
            field("Children", profile.children.clone()),
            field("Type of Residence", profile.residence.clone()),
        ],
    );
    left.extend(section(
        "Socials",
        vec![
            field("Twitter", socials.twitter.clone()),
            field("Facebook", socials.facebook.clone()),
            field("Instagram", socials.instagram.clone()),
        ],
    ));

    let [low, high] = education.monthly_income;
    let mut right = section(
        "Education and Employment",
        vec![
            field("Level of Education", education.level.clone()),
            field("Employment Status", education.status.clone()),
            field("Sector of Employment", education.sector.clone()),
            field("Duration of Employment", education.duration.clone()),
            field("Office Email", education.office_email.clone()),
            field(
                "Monthly Income",
                format!(
                    "{} - {}",
                    format_balance(&low.to_string()),
                    format_balance(&high.to_string())
                ),
            ),
            field("Loan Repayment", format_balance(&education.loan_repayment.to_string())),
        ],
    );

    let mut guarantors = Vec::new();
    for g in &user.guarantor {
        guarantors.push(field("Full Name", g.name.clone()));
        guarantors.push(field("Phone Number", g.phone.clone()));
        guarantors.push(field("Email Address", g.email.clone()));
        guarantors.push(field("Relationship", g.relationship.clone()));
        guarantors.push(Line::from(""));
    }
    if guarantors.is_empty() {
        guarantors.push(Line::from(Span::styled("No guarantor on record", styles::muted_style())));
    }
    right.extend(section("Guarantor", guarantors));

    for (lines, column) in [left, right].into_iter().zip(columns.iter()) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(styles::border_style(true));
        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
            *column,
        );
    }
}

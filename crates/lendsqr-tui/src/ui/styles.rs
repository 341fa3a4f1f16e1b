use ratatui::style::{Color, Modifier, Style};

use lendsqr_core::UserStatus;

// Color palette
pub const PRIMARY: Color = Color::Rgb(57, 205, 204);
pub const NAVY: Color = Color::Rgb(33, 63, 125);
pub const SUCCESS: Color = Color::Rgb(57, 205, 98);
pub const ACCENT: Color = Color::Rgb(233, 178, 0);
pub const ERROR: Color = Color::Rgb(228, 3, 59);
pub const MUTED: Color = Color::Rgb(128, 128, 128);
pub const HIGHLIGHT: Color = Color::Rgb(40, 48, 72);

// Styles
pub fn title_style() -> Style {
    Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
}

pub fn header_style() -> Style {
    Style::default().fg(NAVY).add_modifier(Modifier::BOLD)
}

pub fn selected_style() -> Style {
    Style::default()
        .bg(HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

pub fn list_item_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn muted_style() -> Style {
    Style::default().fg(MUTED)
}

pub fn highlight_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn error_style() -> Style {
    Style::default().fg(ERROR)
}

pub fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(PRIMARY)
    } else {
        Style::default().fg(MUTED)
    }
}

pub fn search_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn status_bar_style() -> Style {
    Style::default().bg(Color::Rgb(32, 32, 40)).fg(Color::White)
}

pub fn help_key_style() -> Style {
    Style::default()
        .fg(ACCENT)
        .add_modifier(Modifier::BOLD)
}

pub fn help_desc_style() -> Style {
    Style::default().fg(Color::White)
}

/// Badge color for a record's status.
pub fn status_style(status: &UserStatus) -> Style {
    match status {
        UserStatus::Active => Style::default().fg(SUCCESS),
        UserStatus::Inactive => Style::default().fg(MUTED),
        UserStatus::Blacklisted => Style::default().fg(ERROR),
        UserStatus::Unknown(_) => Style::default().fg(ACCENT),
    }
}

/// Detail view button; blacklisting is drawn as a destructive action.
pub fn button_style(status: &UserStatus, focused: bool) -> Style {
    let base = match status {
        UserStatus::Blacklisted => Style::default().fg(ERROR),
        _ => Style::default().fg(PRIMARY),
    };
    if focused {
        base.add_modifier(Modifier::BOLD | Modifier::REVERSED)
    } else {
        base
    }
}

//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, AppState, FilterField, View};

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    match app.state {
        AppState::Searching => return handle_search_input(app, key),
        AppState::Filtering => return handle_filter_input(app, key),
        AppState::ActionMenu => return handle_action_menu_input(app, key).await,
        _ => {}
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
            return Ok(false);
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
            return Ok(false);
        }
        KeyCode::Char('R') => {
            app.reload_from_source().await;
            return Ok(false);
        }
        _ => {}
    }

    app.status_message = None;
    match app.view {
        View::List => handle_list_input(app, key).await,
        View::Detail => handle_detail_input(app, key).await,
    }
    Ok(false)
}

async fn handle_list_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Left | KeyCode::Char('[') => app.prev_page(),
        KeyCode::Right | KeyCode::Char(']') => app.next_page(),
        KeyCode::Char('p') => app.cycle_page_size(),
        KeyCode::Char('/') => app.start_search(),
        KeyCode::Char('f') => app.start_filtering(),
        KeyCode::Char('a') => app.open_action_menu(),
        KeyCode::Enter => app.open_detail().await,
        KeyCode::Esc => {
            if !app.list.search().is_empty() {
                app.clear_search();
            }
        }
        _ => {}
    }
}

async fn handle_detail_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('b') => app.close_detail(),
        KeyCode::Left | KeyCode::Up | KeyCode::Char('h') => app.select_prev_detail_action(),
        KeyCode::Right | KeyCode::Down | KeyCode::Char('l') => app.select_next_detail_action(),
        KeyCode::Enter => app.run_detail_action().await,
        _ => {}
    }
}

fn handle_search_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
            app.clear_search();
        }
        KeyCode::Enter => {
            app.state = AppState::Normal;
            // Keep search query active
        }
        KeyCode::Backspace => app.pop_search_char(),
        KeyCode::Char(c) => app.push_search_char(c),
        _ => {}
    }
    Ok(false)
}

fn handle_filter_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => app.state = AppState::Normal,
        KeyCode::Enter => app.apply_filters(),
        KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.reset_filters()
        }
        KeyCode::Down | KeyCode::Tab => {
            app.filter_form.focus = app.filter_form.focus.next();
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.filter_form.focus = app.filter_form.focus.prev();
        }
        KeyCode::Left | KeyCode::Right => {
            let options = filter_options(app);
            app.filter_form
                .cycle(&options, matches!(key.code, KeyCode::Right));
        }
        KeyCode::Backspace => app.filter_form.pop_char(),
        KeyCode::Char(c) => app.filter_form.push_char(c),
        _ => {}
    }
    Ok(false)
}

/// Choices for the focused select field of the filter form.
fn filter_options(app: &App) -> Vec<String> {
    match app.filter_form.focus {
        FilterField::Organization => app.organization_options(),
        FilterField::Status => App::status_options(),
        _ => Vec::new(),
    }
}

async fn handle_action_menu_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    let count = app.row_actions().len();
    match key.code {
        KeyCode::Esc | KeyCode::Char('a') => app.state = AppState::Normal,
        KeyCode::Up | KeyCode::Char('k') => {
            app.action_selection = app.action_selection.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if app.action_selection + 1 < count {
                app.action_selection += 1;
            }
        }
        KeyCode::Enter => app.run_row_action().await,
        _ => {}
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{app_on, users};
    use lendsqr_core::storage::MemoryMedium;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn test_search_typing_filters_live() {
        let medium = MemoryMedium::new();
        let mut app = app_on(&medium, users(12)).await;

        handle_input(&mut app, press(KeyCode::Char('/'))).await.unwrap();
        assert_eq!(app.state, AppState::Searching);
        for c in "user1".chars() {
            handle_input(&mut app, press(KeyCode::Char(c))).await.unwrap();
        }
        // user1, user10, user11, user12
        assert_eq!(app.projection().match_count, 4);

        handle_input(&mut app, press(KeyCode::Esc)).await.unwrap();
        assert_eq!(app.state, AppState::Normal);
        assert_eq!(app.projection().match_count, 12);
    }

    #[tokio::test]
    async fn test_search_does_not_trigger_shortcuts() {
        let medium = MemoryMedium::new();
        let mut app = app_on(&medium, users(3)).await;

        handle_input(&mut app, press(KeyCode::Char('/'))).await.unwrap();
        let quit = handle_input(&mut app, press(KeyCode::Char('q'))).await.unwrap();

        assert!(!quit);
        assert_eq!(app.state, AppState::Searching);
        assert_eq!(app.search_input, "q");
    }

    #[tokio::test]
    async fn test_enter_opens_detail_and_esc_returns() {
        let medium = MemoryMedium::new();
        let mut app = app_on(&medium, users(3)).await;

        handle_input(&mut app, press(KeyCode::Down)).await.unwrap();
        handle_input(&mut app, press(KeyCode::Enter)).await.unwrap();
        assert_eq!(app.view, View::Detail);
        assert_eq!(app.detail.as_ref().map(|u| u.id.as_str()), Some("2"));

        handle_input(&mut app, press(KeyCode::Esc)).await.unwrap();
        assert_eq!(app.view, View::List);
    }

    #[tokio::test]
    async fn test_filter_overlay_select_and_apply() {
        let medium = MemoryMedium::new();
        let mut app = app_on(&medium, users(4)).await;

        handle_input(&mut app, press(KeyCode::Char('f'))).await.unwrap();
        assert_eq!(app.state, AppState::Filtering);
        handle_input(&mut app, press(KeyCode::Right)).await.unwrap();
        handle_input(&mut app, press(KeyCode::Enter)).await.unwrap();

        assert_eq!(app.state, AppState::Normal);
        assert_eq!(app.list.filters().organization, "Irorun");
        assert_eq!(app.projection().match_count, 2);
    }

    #[tokio::test]
    async fn test_quit_requires_confirmation() {
        let medium = MemoryMedium::new();
        let mut app = app_on(&medium, users(1)).await;

        assert!(!handle_input(&mut app, press(KeyCode::Char('q'))).await.unwrap());
        assert_eq!(app.state, AppState::ConfirmingQuit);
        assert!(!handle_input(&mut app, press(KeyCode::Char('n'))).await.unwrap());
        assert_eq!(app.state, AppState::Normal);

        handle_input(&mut app, press(KeyCode::Char('q'))).await.unwrap();
        assert!(handle_input(&mut app, press(KeyCode::Char('y'))).await.unwrap());
    }
}

//! Application state management for the Lendsqr admin dashboard.
//!
//! This module contains the core `App` struct that holds UI state and the
//! user repository. Every data change goes through `lendsqr_core`: the list
//! view reads a projection, status changes go through
//! `apply_status_change`, and changes made by other windows arrive through
//! `CrossViewSync`.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use lendsqr_core::projector::{organization_options, project, Projection};
use lendsqr_core::storage::{ExpiringStore, FileMedium};
use lendsqr_core::{
    apply_status_change, available_transitions, Config, CrossViewSync, FilterCriteria, ListState,
    UserRecord, UserRepository, UserStatus, UserSummary, USERS_KEY,
};

// ============================================================================
// Constants
// ============================================================================

/// Maximum length for the search box.
const MAX_SEARCH_LENGTH: usize = 100;

/// Maximum length for a filter form field.
const MAX_FILTER_LENGTH: usize = 64;

// ============================================================================
// UI State Types
// ============================================================================

/// Which page of the dashboard is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    List,
    Detail,
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    Filtering,
    ActionMenu,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Entry in the row action menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowAction {
    ViewDetails,
    SetStatus(UserStatus),
}

impl RowAction {
    pub fn label(&self) -> &str {
        match self {
            RowAction::ViewDetails => "View Details",
            RowAction::SetStatus(status) => status.action_label(),
        }
    }
}

/// Field of the filter form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Organization,
    Username,
    Email,
    Date,
    Phone,
    Status,
}

impl FilterField {
    pub const ALL: [FilterField; 6] = [
        FilterField::Organization,
        FilterField::Username,
        FilterField::Email,
        FilterField::Date,
        FilterField::Phone,
        FilterField::Status,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FilterField::Organization => "Organization",
            FilterField::Username => "Username",
            FilterField::Email => "Email",
            FilterField::Date => "Date",
            FilterField::Phone => "Phone Number",
            FilterField::Status => "Status",
        }
    }

    /// Fields chosen from a list rather than typed.
    pub fn is_select(&self) -> bool {
        matches!(self, FilterField::Organization | FilterField::Status)
    }

    pub fn next(&self) -> Self {
        match self {
            FilterField::Organization => FilterField::Username,
            FilterField::Username => FilterField::Email,
            FilterField::Email => FilterField::Date,
            FilterField::Date => FilterField::Phone,
            FilterField::Phone => FilterField::Status,
            FilterField::Status => FilterField::Organization,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            FilterField::Organization => FilterField::Status,
            FilterField::Username => FilterField::Organization,
            FilterField::Email => FilterField::Username,
            FilterField::Date => FilterField::Email,
            FilterField::Phone => FilterField::Date,
            FilterField::Status => FilterField::Phone,
        }
    }
}

/// Draft filter values being edited in the filter overlay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterForm {
    pub values: FilterCriteria,
    pub focus: FilterField,
}

impl FilterForm {
    fn new(values: FilterCriteria) -> Self {
        Self {
            values,
            focus: FilterField::Organization,
        }
    }

    pub fn value(&self, field: FilterField) -> &str {
        match field {
            FilterField::Organization => &self.values.organization,
            FilterField::Username => &self.values.username,
            FilterField::Email => &self.values.email,
            FilterField::Date => &self.values.date,
            FilterField::Phone => &self.values.phone,
            FilterField::Status => &self.values.status,
        }
    }

    fn value_mut(&mut self, field: FilterField) -> &mut String {
        match field {
            FilterField::Organization => &mut self.values.organization,
            FilterField::Username => &mut self.values.username,
            FilterField::Email => &mut self.values.email,
            FilterField::Date => &mut self.values.date,
            FilterField::Phone => &mut self.values.phone,
            FilterField::Status => &mut self.values.status,
        }
    }

    pub fn push_char(&mut self, c: char) {
        if self.focus.is_select() {
            return;
        }
        let value = self.value_mut(self.focus);
        if can_add_input_char(value.chars().count(), MAX_FILTER_LENGTH, c) {
            value.push(c);
        }
    }

    pub fn pop_char(&mut self) {
        let focus = self.focus;
        if focus.is_select() {
            self.value_mut(focus).clear();
        } else {
            self.value_mut(focus).pop();
        }
    }

    /// Step a select field through `options`, with "" (any) before the first.
    pub fn cycle(&mut self, options: &[String], forward: bool) {
        if !self.focus.is_select() {
            return;
        }
        let mut choices = vec![String::new()];
        choices.extend(options.iter().cloned());

        let value = self.value_mut(self.focus);
        let pos = choices.iter().position(|c| *c == *value).unwrap_or(0);
        let next = if forward {
            (pos + 1) % choices.len()
        } else {
            (pos + choices.len() - 1) % choices.len()
        };
        *value = choices[next].clone();
    }
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Main application state container
pub struct App {
    pub config: Config,
    pub repo: UserRepository,
    sync: CrossViewSync,

    // UI State
    pub state: AppState,
    pub view: View,
    pub list: ListState,
    pub search_input: String,
    pub filter_form: FilterForm,

    // Selection indices
    pub selection: usize,
    pub action_selection: usize,
    pub detail_selection: usize,

    /// Record shown in the detail view
    pub detail: Option<UserRecord>,
    /// Id requested by the detail view that no longer exists
    pub detail_missing: Option<String>,

    // Status message
    pub status_message: Option<String>,

    /// Expiry of the cached collection, for the status bar
    pub cache_expires: Option<DateTime<Utc>>,
}

impl App {
    /// Open the cache directory from `config` and build the app over it.
    pub fn new(config: Config) -> Result<Self> {
        let cache_dir = config.cache_dir()?;
        debug!(?cache_dir, "Cache directory configured");

        let medium = open_medium(&cache_dir)?;
        let source = config.user_source()?;
        info!(source = %config.source_location(), "User source configured");

        let store = ExpiringStore::new(Arc::new(medium));
        let repo = UserRepository::new(store, source).with_ttl(config.cache_ttl());
        Ok(Self::with_repository(config, repo))
    }

    pub fn with_repository(config: Config, repo: UserRepository) -> Self {
        let sync = CrossViewSync::subscribe(&repo);
        let list = ListState::new(config.page_size);
        Self {
            config,
            repo,
            sync,

            state: AppState::Normal,
            view: View::List,
            list,
            search_input: String::new(),
            filter_form: FilterForm::new(FilterCriteria::default()),

            selection: 0,
            action_selection: 0,
            detail_selection: 0,

            detail: None,
            detail_missing: None,

            status_message: None,
            cache_expires: None,
        }
    }

    /// First load of the dashboard: sweep expired entries, then load.
    pub async fn mount(&mut self) {
        self.repo.store().cleanup_expired();
        let count = self.repo.load().await.len();
        info!(count, "Dashboard mounted");
        if count == 0 {
            self.status_message = Some("No users available".to_string());
        }
        self.after_collection_change();
    }

    // ------------------------------------------------------------------------
    // Derived data
    // ------------------------------------------------------------------------

    /// Current page of the list view.
    pub fn projection(&self) -> Projection<'_> {
        project(
            self.repo.users(),
            self.list.search(),
            self.list.filters(),
            self.list.page(),
            self.list.page_size(),
        )
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary::from_users(self.repo.users())
    }

    pub fn organization_options(&self) -> Vec<String> {
        organization_options(self.repo.users())
    }

    pub fn status_options() -> Vec<String> {
        UserStatus::CANONICAL
            .iter()
            .map(|s| s.as_str().to_string())
            .collect()
    }

    /// Row under the cursor in the list view.
    pub fn selected_row(&self) -> Option<UserRecord> {
        self.projection().visible.get(self.selection).map(|u| (*u).clone())
    }

    /// Menu for the selected row: view details, then one entry per transition.
    pub fn row_actions(&self) -> Vec<RowAction> {
        let mut actions = vec![RowAction::ViewDetails];
        if let Some(user) = self.selected_row() {
            actions.extend(
                available_transitions(&user.status())
                    .into_iter()
                    .map(RowAction::SetStatus),
            );
        }
        actions
    }

    /// Status buttons offered by the detail view.
    pub fn detail_actions(&self) -> Vec<UserStatus> {
        self.detail
            .as_ref()
            .map(|u| available_transitions(&u.status()))
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------------
    // List view
    // ------------------------------------------------------------------------

    /// Re-establish the page and cursor bounds after any input or data change.
    fn reconcile(&mut self) {
        let visible = self.list.project(self.repo.users()).visible.len();
        self.selection = self.selection.min(visible.saturating_sub(1));
    }

    fn after_collection_change(&mut self) {
        self.cache_expires = self.repo.store().expires_at(USERS_KEY);
        self.reconcile();
    }

    pub fn select_next(&mut self) {
        let visible = self.projection().visible.len();
        if self.selection + 1 < visible {
            self.selection += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selection = self.selection.saturating_sub(1);
    }

    pub fn next_page(&mut self) {
        let total = self.projection().total_pages;
        if self.list.next_page(total) {
            self.selection = 0;
        }
    }

    pub fn prev_page(&mut self) {
        let total = self.projection().total_pages;
        if self.list.prev_page(total) {
            self.selection = 0;
        }
    }

    pub fn cycle_page_size(&mut self) {
        let size = self.list.page_size().next();
        self.list.set_page_size(size);
        self.selection = 0;
        self.reconcile();
    }

    pub fn start_search(&mut self) {
        self.search_input = self.list.search().to_string();
        self.state = AppState::Searching;
    }

    pub fn push_search_char(&mut self, c: char) {
        if can_add_input_char(self.search_input.chars().count(), MAX_SEARCH_LENGTH, c) {
            self.search_input.push(c);
            self.apply_search();
        }
    }

    pub fn pop_search_char(&mut self) {
        if self.search_input.pop().is_some() {
            self.apply_search();
        }
    }

    pub fn clear_search(&mut self) {
        self.search_input.clear();
        self.apply_search();
    }

    fn apply_search(&mut self) {
        self.list.set_search(self.search_input.clone());
        self.selection = 0;
        self.reconcile();
    }

    pub fn start_filtering(&mut self) {
        self.filter_form = FilterForm::new(self.list.filters().clone());
        self.state = AppState::Filtering;
    }

    pub fn apply_filters(&mut self) {
        self.list.set_filters(self.filter_form.values.clone());
        self.selection = 0;
        self.state = AppState::Normal;
        self.reconcile();
    }

    pub fn reset_filters(&mut self) {
        self.filter_form = FilterForm::new(FilterCriteria::default());
        self.list.clear_filters();
        self.selection = 0;
        self.state = AppState::Normal;
        self.reconcile();
    }

    pub fn open_action_menu(&mut self) {
        if self.selected_row().is_some() {
            self.action_selection = 0;
            self.state = AppState::ActionMenu;
        }
    }

    /// Run the highlighted action menu entry.
    pub async fn run_row_action(&mut self) {
        let actions = self.row_actions();
        self.state = AppState::Normal;
        match actions.get(self.action_selection) {
            Some(RowAction::ViewDetails) => self.open_detail().await,
            Some(RowAction::SetStatus(status)) => {
                if let Some(user) = self.selected_row() {
                    self.change_status(&user.id, status).await;
                }
            }
            None => {}
        }
    }

    // ------------------------------------------------------------------------
    // Detail view
    // ------------------------------------------------------------------------

    /// Open the detail view for the selected row.
    pub async fn open_detail(&mut self) {
        let Some(user) = self.selected_row() else {
            return;
        };
        if let Err(e) = self.repo.select_for_detail(&user) {
            self.status_message = Some(e.to_string());
            return;
        }
        self.show_detail(&user.id).await;
    }

    /// Show the record `id` in the detail view, as when navigating to it directly.
    pub async fn show_detail(&mut self, id: &str) {
        self.detail = self.repo.get_by_id(id).await;
        self.detail_missing = match self.detail {
            Some(_) => None,
            None => Some(id.to_string()),
        };
        self.detail_selection = 0;
        self.view = View::Detail;
    }

    pub fn close_detail(&mut self) {
        self.view = View::List;
        self.detail = None;
        self.detail_missing = None;
        self.reconcile();
    }

    pub fn select_next_detail_action(&mut self) {
        let count = self.detail_actions().len();
        if self.detail_selection + 1 < count {
            self.detail_selection += 1;
        }
    }

    pub fn select_prev_detail_action(&mut self) {
        self.detail_selection = self.detail_selection.saturating_sub(1);
    }

    /// Apply the highlighted detail view button.
    pub async fn run_detail_action(&mut self) {
        let Some(id) = self.detail.as_ref().map(|u| u.id.clone()) else {
            return;
        };
        if let Some(status) = self.detail_actions().get(self.detail_selection).cloned() {
            self.change_status(&id, &status).await;
            self.detail_selection = 0;
        }
    }

    // ------------------------------------------------------------------------
    // Mutations and sync
    // ------------------------------------------------------------------------

    /// Move record `id` to `status` and refresh both views.
    pub async fn change_status(&mut self, id: &str, status: &UserStatus) {
        match apply_status_change(&mut self.repo, id, status).await {
            Ok(Some(updated)) => {
                self.status_message = Some(format!(
                    "{} is now {}",
                    updated.display_name(),
                    updated.status
                ));
                if self.detail.as_ref().is_some_and(|d| d.id == updated.id) {
                    self.detail = Some(updated);
                }
            }
            Ok(None) => {
                self.status_message = Some("User not found".to_string());
            }
            Err(e) => {
                self.status_message = Some(e.to_string());
            }
        }
        self.after_collection_change();
    }

    /// Pick up changes made by other windows, and reload once the cached
    /// collection has expired.
    pub async fn check_sync(&mut self) {
        let mut reloaded = self.sync.sync(&mut self.repo).await;
        if reloaded {
            self.status_message = Some("Users updated in another window".to_string());
        } else if self.cache_expires.is_some_and(|expiry| Utc::now() > expiry) {
            debug!("User cache expired, reloading");
            self.repo.load().await;
            reloaded = true;
        }
        if !reloaded {
            return;
        }

        let detail_id = self.detail.as_ref().map(|d| d.id.clone());
        if let Some(id) = detail_id {
            self.detail = self.repo.users().iter().find(|u| u.id == id).cloned();
            if self.detail.is_none() {
                debug!(id = %id, "Open record removed by another window");
                self.detail_missing = Some(id);
                self.detail_selection = 0;
            }
        }
        self.after_collection_change();
    }

    /// Drop the cached collection and load it again from the source.
    pub async fn reload_from_source(&mut self) {
        self.repo.clear_cache();
        let count = self.repo.load().await.len();
        self.status_message = Some(format!("Loaded {} users", count));
        self.after_collection_change();
    }
}

/// Open the cache directory, watching it for writes by other processes.
/// Falls back to an unwatched directory if the watcher can't start.
fn open_medium(cache_dir: &Path) -> Result<FileMedium> {
    match FileMedium::open_watched(cache_dir) {
        Ok(medium) => Ok(medium),
        Err(e) => {
            warn!(error = %e, "Cache watcher unavailable, cross-window sync disabled");
            Ok(FileMedium::open(cache_dir)?)
        }
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character can be added to a text field of `max_len` characters
pub fn can_add_input_char(current_len: usize, max_len: usize, c: char) -> bool {
    current_len < max_len && !c.is_control()
}

// ============================================================================
// Tests
// ============================================================================

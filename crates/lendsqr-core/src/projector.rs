//! Derived view of the user collection: search, filters and paging.
//!
//! `project` is stateless. `ListState` holds the inputs a list view keeps
//! between renders and applies the page-reset and page-clamp rules.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::UserRecord;
use crate::utils::{contains_ignore_case, format_joined_long, format_joined_short};

/// Rows per page offered by the pager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum PageSize {
    #[default]
    Ten,
    Fifty,
    Hundred,
}

impl PageSize {
    pub const ALL: [PageSize; 3] = [PageSize::Ten, PageSize::Fifty, PageSize::Hundred];

    pub fn as_usize(self) -> usize {
        match self {
            PageSize::Ten => 10,
            PageSize::Fifty => 50,
            PageSize::Hundred => 100,
        }
    }

    pub fn from_usize(n: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_usize() == n)
    }

    /// Cycle to the next size, wrapping around.
    pub fn next(self) -> Self {
        match self {
            PageSize::Ten => PageSize::Fifty,
            PageSize::Fifty => PageSize::Hundred,
            PageSize::Hundred => PageSize::Ten,
        }
    }
}

impl TryFrom<usize> for PageSize {
    type Error = String;

    fn try_from(n: usize) -> Result<Self, Self::Error> {
        Self::from_usize(n).ok_or_else(|| format!("unsupported page size {}", n))
    }
}

impl From<PageSize> for usize {
    fn from(size: PageSize) -> usize {
        size.as_usize()
    }
}

/// Per-field filter constraints. Empty fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub organization: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    /// Substring of the stored `date_joined`, e.g. `2020-05-15`.
    pub date: String,
    /// Exact status, compared case-insensitively.
    pub status: String,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        [
            &self.organization,
            &self.username,
            &self.email,
            &self.phone,
            &self.date,
            &self.status,
        ]
        .iter()
        .all(|f| f.trim().is_empty())
    }
}

/// Whether `user` matches a free-text search. `query` must be lowercased.
fn matches_query(user: &UserRecord, query: &str) -> bool {
    contains_ignore_case(&user.organization, query)
        || contains_ignore_case(&user.username, query)
        || contains_ignore_case(&user.email, query)
        || contains_ignore_case(&user.phone, query)
        || contains_ignore_case(&user.status, query)
        || contains_ignore_case(&user.profile.full_name, query)
        || contains_ignore_case(&user.education.level, query)
        || user
            .guarantor
            .iter()
            .any(|g| contains_ignore_case(&g.name, query))
        || contains_ignore_case(&format_joined_long(&user.date_joined), query)
        || contains_ignore_case(&format_joined_short(&user.date_joined), query)
}

/// Search predicate; an empty search matches everything.
pub fn matches_search(user: &UserRecord, search: &str) -> bool {
    let query = search.trim().to_lowercase();
    query.is_empty() || matches_query(user, &query)
}

/// Conjunction of every non-empty filter field.
pub fn matches_filters(user: &UserRecord, filters: &FilterCriteria) -> bool {
    let field = |value: &str, wanted: &str| {
        let wanted = wanted.trim();
        wanted.is_empty() || contains_ignore_case(value, &wanted.to_lowercase())
    };
    let status = filters.status.trim();

    field(&user.organization, &filters.organization)
        && field(&user.username, &filters.username)
        && field(&user.email, &filters.email)
        && field(&user.phone, &filters.phone)
        && field(&user.date_joined, &filters.date)
        && (status.is_empty() || user.status.trim().eq_ignore_ascii_case(status))
}

/// `max(1, ceil(matches / per_page))`.
pub fn total_pages(matches: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 1;
    }
    matches.div_ceil(per_page).max(1)
}

/// One page of matching records.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection<'a> {
    pub visible: Vec<&'a UserRecord>,
    pub total_pages: usize,
    pub match_count: usize,
}

/// Search, filter and slice `users` for display.
///
/// Records keep their collection order. A `page` past the end yields an
/// empty slice; clamping is the caller's job (see [`ListState::clamp_page`]).
pub fn project<'a>(
    users: &'a [UserRecord],
    search: &str,
    filters: &FilterCriteria,
    page: usize,
    page_size: PageSize,
) -> Projection<'a> {
    let query = search.trim().to_lowercase();
    let matched: Vec<&UserRecord> = users
        .iter()
        .filter(|u| query.is_empty() || matches_query(u, &query))
        .filter(|u| matches_filters(u, filters))
        .collect();

    let per_page = page_size.as_usize();
    let start = page.saturating_sub(1).saturating_mul(per_page);
    let visible = matched.iter().skip(start).take(per_page).copied().collect();

    Projection {
        visible,
        total_pages: total_pages(matched.len(), per_page),
        match_count: matched.len(),
    }
}

/// An entry in the pager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    Page(usize),
    Gap,
}

/// Pages to show in the pager for `current` of `total`.
///
/// Up to seven pages are all listed. Beyond that: first, current ±1, last,
/// with a gap wherever pages are skipped.
pub fn page_window(current: usize, total: usize) -> Vec<PageLink> {
    let total = total.max(1);
    if total <= 7 {
        return (1..=total).map(PageLink::Page).collect();
    }

    let current = current.clamp(1, total);
    let lo = current.saturating_sub(1).max(2);
    let hi = (current + 1).min(total - 1);

    let mut links = vec![PageLink::Page(1)];
    if lo > 2 {
        links.push(PageLink::Gap);
    }
    links.extend((lo..=hi).map(PageLink::Page));
    if hi < total - 1 {
        links.push(PageLink::Gap);
    }
    links.push(PageLink::Page(total));
    links
}

/// Distinct organizations in the collection, sorted, for the filter form.
pub fn organization_options(users: &[UserRecord]) -> Vec<String> {
    users
        .iter()
        .map(|u| u.organization.trim())
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Search, filter and paging inputs held by a list view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListState {
    search: String,
    filters: FilterCriteria,
    page: usize,
    page_size: PageSize,
}

impl Default for ListState {
    fn default() -> Self {
        Self::new(PageSize::default())
    }
}

impl ListState {
    pub fn new(page_size: PageSize) -> Self {
        Self {
            search: String::new(),
            filters: FilterCriteria::default(),
            page: 1,
            page_size,
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn filters(&self) -> &FilterCriteria {
        &self.filters
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
        self.page = 1;
    }

    pub fn set_filters(&mut self, filters: FilterCriteria) {
        self.filters = filters;
        self.page = 1;
    }

    pub fn clear_filters(&mut self) {
        self.set_filters(FilterCriteria::default());
    }

    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.page_size = page_size;
        self.page = 1;
    }

    /// Move to `page` if it exists. Returns whether the page changed.
    pub fn go_to(&mut self, page: usize, total_pages: usize) -> bool {
        if page < 1 || page > total_pages || page == self.page {
            return false;
        }
        self.page = page;
        true
    }

    pub fn next_page(&mut self, total_pages: usize) -> bool {
        self.go_to(self.page + 1, total_pages)
    }

    pub fn prev_page(&mut self, total_pages: usize) -> bool {
        self.go_to(self.page.saturating_sub(1), total_pages)
    }

    /// Pull the page back inside `1..=total_pages`.
    pub fn clamp_page(&mut self, total_pages: usize) {
        self.page = self.page.clamp(1, total_pages.max(1));
    }

    /// Project `users` with the current inputs, clamping the page first.
    pub fn project<'a>(&mut self, users: &'a [UserRecord]) -> Projection<'a> {
        let first = project(users, &self.search, &self.filters, self.page, self.page_size);
        if (1..=first.total_pages).contains(&self.page) {
            return first;
        }
        self.clamp_page(first.total_pages);
        project(users, &self.search, &self.filters, self.page, self.page_size)
    }
}

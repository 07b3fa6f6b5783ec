//! Pagination widget and list page state.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::api::Page;
use crate::models::config::PaginationConfig;

fn get_pages(
    total_pages: usize,
    current_page: usize,
    left_edge: usize,
    left_current: usize,
    right_current: usize,
    right_edge: usize,
) -> Vec<Option<usize>> {
    let last_page = total_pages;

    if last_page == 0 {
        return vec![];
    }

    let mut pages = Vec::new();

    let left_end = (1 + left_edge).min(last_page + 1);
    pages.extend((1..left_end).map(Some));

    let mid_start = left_end.max(current_page.saturating_sub(left_current));
    let mid_end = (current_page + right_current + 1).min(last_page + 1);

    if mid_start > left_end {
        pages.push(None);
    }
    pages.extend((mid_start..mid_end).map(Some));

    let right_start = mid_end.max(last_page.saturating_sub(right_edge) + 1);

    if right_start > mid_end {
        pages.push(None);
    }
    pages.extend((right_start..=last_page).map(Some));

    pages
}

/// One page of items plus the page links to render. `None` marks an ellipsis.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pages: Vec<Option<usize>>,
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
    pub has_previous: bool,
    pub has_next: bool,
    /// A single page needs no widget.
    pub visible: bool,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, current_page: usize, total_pages: usize) -> Self {
        let current_page = if current_page == 0 { 1 } else { current_page };

        let pages = get_pages(total_pages, current_page, 1, 2, 2, 1);
        let total = items.len();

        Self {
            items,
            pages,
            page: current_page,
            total_pages,
            total,
            has_previous: current_page > 1,
            has_next: current_page < total_pages,
            visible: total_pages > 1,
        }
    }

    pub fn with_total(mut self, total: usize) -> Self {
        self.total = total;
        self
    }
}

impl From<Page> for Paginated<Value> {
    fn from(page: Page) -> Self {
        Paginated::new(page.items, page.page, page.pages).with_total(page.total)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    fn flipped(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

/// Which query keys a list page understands.
#[derive(Debug, Clone, Copy)]
pub struct ListOptions {
    pub filter_keys: &'static [&'static str],
    pub sortable: &'static [&'static str],
    pub default_sort: (&'static str, SortOrder),
}

pub const SEARCH_FILTER: &str = "search";

/// Filter, sort and paging state of a list page, rebuilt from the query
/// string of every request. Every change other than [`ListState::go_to`]
/// returns to the first page.
#[derive(Debug, Clone, Serialize)]
pub struct ListState {
    pub page: usize,
    pub per_page: usize,
    pub filters: BTreeMap<String, String>,
    pub sort_field: String,
    pub sort_order: SortOrder,
    #[serde(skip)]
    options: ListOptions,
    #[serde(skip)]
    limits: PaginationConfig,
}

impl ListState {
    pub fn new(options: ListOptions, limits: &PaginationConfig) -> Self {
        Self {
            page: 1,
            per_page: limits.default_page_size,
            filters: BTreeMap::new(),
            sort_field: options.default_sort.0.to_string(),
            sort_order: options.default_sort.1,
            options,
            limits: limits.clone(),
        }
    }

    /// Reads `page`, `per_page`, `sort_field`, `sort_order` and the known
    /// filter keys. Unknown keys and malformed values are ignored.
    pub fn from_query(
        query: &[(String, String)],
        options: ListOptions,
        limits: &PaginationConfig,
    ) -> Self {
        let mut state = Self::new(options, limits);

        for (key, value) in query {
            let value = value.trim();
            match key.as_str() {
                "page" => {
                    if let Ok(page) = value.parse::<usize>() {
                        state.page = page.max(1);
                    }
                }
                "per_page" | "page_size" => {
                    if let Ok(size) = value.parse::<usize>() {
                        state.per_page = state.clamp_page_size(size);
                    }
                }
                "sort_field" if options.sortable.contains(&value) => {
                    state.sort_field = value.to_string();
                }
                "sort_order" => {
                    if let Some(order) = SortOrder::parse(value) {
                        state.sort_order = order;
                    }
                }
                key if options.filter_keys.contains(&key) && !value.is_empty() => {
                    state.filters.insert(key.to_string(), value.to_string());
                }
                _ => {}
            }
        }
        state
    }

    fn clamp_page_size(&self, size: usize) -> usize {
        if self.limits.page_size_options.contains(&size) {
            size
        } else {
            size.clamp(1, self.limits.max_page_size.max(1))
        }
    }

    pub fn filter(&self, key: &str) -> &str {
        self.filters.get(key).map(String::as_str).unwrap_or_default()
    }

    pub fn search(&self) -> &str {
        self.filter(SEARCH_FILTER)
    }

    /// An empty value removes the filter.
    pub fn set_filter(&mut self, key: &str, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            self.filters.remove(key);
        } else if self.options.filter_keys.contains(&key) {
            self.filters.insert(key.to_string(), value.to_string());
        }
        self.page = 1;
    }

    pub fn set_search(&mut self, term: &str) {
        self.set_filter(SEARCH_FILTER, term);
    }

    /// The active column flips direction, a new column starts ascending.
    pub fn toggle_sort(&mut self, field: &str) {
        if self.sort_field == field {
            self.sort_order = self.sort_order.flipped();
        } else if self.options.sortable.contains(&field) {
            self.sort_field = field.to_string();
            self.sort_order = SortOrder::Asc;
        }
        self.page = 1;
    }

    pub fn set_page_size(&mut self, size: usize) {
        self.per_page = self.clamp_page_size(size);
        self.page = 1;
    }

    pub fn go_to(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn reset_filters(&mut self) {
        self.filters.clear();
        self.sort_field = self.options.default_sort.0.to_string();
        self.sort_order = self.options.default_sort.1;
        self.page = 1;
    }

    /// Query sent to the backend. Empty filters never appear.
    pub fn to_api_query(&self) -> Vec<(String, String)> {
        let mut query = vec![
            ("page".to_string(), self.page.to_string()),
            ("per_page".to_string(), self.per_page.to_string()),
        ];
        query.extend(
            self.filters
                .iter()
                .filter(|(_, value)| !value.trim().is_empty())
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        query.push(("sort_field".to_string(), self.sort_field.clone()));
        query.push(("sort_order".to_string(), self.sort_order.as_str().to_string()));
        query
    }

    fn href(&self, base: &str) -> String {
        match serde_html_form::to_string(self.to_api_query()) {
            Ok(query) => format!("{base}?{query}"),
            Err(err) => {
                log::warn!("Failed to encode list query: {err}");
                base.to_string()
            }
        }
    }

    pub fn current_href(&self, base: &str) -> String {
        self.href(base)
    }

    pub fn page_href(&self, base: &str, page: usize) -> String {
        let mut next = self.clone();
        next.go_to(page);
        next.href(base)
    }

    pub fn sort_href(&self, base: &str, field: &str) -> String {
        let mut next = self.clone();
        next.toggle_sort(field);
        next.href(base)
    }

    pub fn page_size_href(&self, base: &str, size: usize) -> String {
        let mut next = self.clone();
        next.set_page_size(size);
        next.href(base)
    }

    pub fn filter_href(&self, base: &str, key: &str, value: &str) -> String {
        let mut next = self.clone();
        next.set_filter(key, value);
        next.href(base)
    }

    pub fn reset_href(&self, base: &str) -> String {
        let mut next = self.clone();
        next.reset_filters();
        next.href(base)
    }

    /// Links for every page entry of `paginated`, in the same order.
    pub fn page_links<T>(&self, base: &str, paginated: &Paginated<T>) -> Vec<Option<(usize, String)>> {
        paginated
            .pages
            .iter()
            .map(|page| page.map(|page| (page, self.page_href(base, page))))
            .collect()
    }

    /// Column headers keyed by field with their toggle link and direction.
    pub fn sort_links(&self, base: &str) -> BTreeMap<&'static str, SortLink> {
        self.options
            .sortable
            .iter()
            .map(|field| {
                let active = self.sort_field == *field;
                (
                    *field,
                    SortLink {
                        href: self.sort_href(base, field),
                        active,
                        order: active.then_some(self.sort_order),
                    },
                )
            })
            .collect()
    }

    pub fn page_size_links(&self, base: &str) -> Vec<(usize, String)> {
        self.limits
            .page_size_options
            .iter()
            .map(|size| (*size, self.page_size_href(base, *size)))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SortLink {
    pub href: String,
    pub active: bool,
    pub order: Option<SortOrder>,
}

use tracing::warn;

/// Rows per page. `All` shows the whole set on a single page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSize {
    Limit(usize),
    All,
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::Limit(10)
    }
}

impl PageSize {
    /// Parse a page-size token ("All" or a positive number). Invalid input
    /// is corrected to the default and logged.
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("all") {
            return Some(PageSize::All);
        }
        match value.parse::<usize>() {
            Ok(n) if n > 0 => Some(PageSize::Limit(n)),
            _ => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            PageSize::All => "All".to_string(),
            PageSize::Limit(n) => n.to_string(),
        }
    }

    /// The window size sent to a server-side source. `All` asks for the
    /// whole known set.
    pub fn wire_value(&self, total_rows: usize) -> usize {
        match self {
            PageSize::Limit(n) => *n,
            PageSize::All => total_rows.max(1),
        }
    }
}

/// Current page, page size and total row count of the view being paged.
/// Invariant: `1 <= current_page <= last_page`.
#[derive(Debug, Clone)]
pub struct PaginationState {
    pub current_page: usize,
    pub page_size: PageSize,
    pub total_rows: usize,
}

impl Default for PaginationState {
    fn default() -> Self {
        PaginationState { current_page: 1, page_size: PageSize::default(), total_rows: 0 }
    }
}

impl PaginationState {
    pub fn new(page_size: PageSize) -> Self {
        PaginationState { current_page: 1, page_size, total_rows: 0 }
    }

    /// Number of the last page, never below 1 (an empty set still has one
    /// page so the placeholder row has somewhere to render).
    pub fn last_page(&self) -> usize {
        match self.page_size {
            PageSize::All => 1,
            PageSize::Limit(size) => {
                if self.total_rows == 0 {
                    1
                } else {
                    self.total_rows.div_ceil(size)
                }
            }
        }
    }

    /// Update the total and clamp the current page back into range. Any
    /// operation that shrinks the set must go through here.
    pub fn set_total(&mut self, total_rows: usize) {
        self.total_rows = total_rows;
        self.clamp();
    }

    pub fn clamp(&mut self) {
        let last = self.last_page();
        if self.current_page > last {
            self.current_page = last;
        }
        if self.current_page == 0 {
            self.current_page = 1;
        }
    }

    /// Move to a page, validated against the bounds. Out-of-range targets
    /// are rejected.
    pub fn set_page(&mut self, page: usize) -> bool {
        if page == 0 || page > self.last_page() {
            warn!("Page {page} is out of range 1..={}", self.last_page());
            return false;
        }
        self.current_page = page;
        true
    }

    /// Change the page size and jump back to the first page.
    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.page_size = page_size;
        self.current_page = 1;
    }
}

/// Slice a row-index view down to the current page window. Bounds are
/// clamped; a fully out-of-range page yields an empty slice rather than an
/// error, the controller clamps before rendering.
pub fn slice_view<'a>(view: &'a [usize], state: &PaginationState) -> &'a [usize] {
    match state.page_size {
        PageSize::All => view,
        PageSize::Limit(size) => {
            let start = (state.current_page - 1).saturating_mul(size).min(view.len());
            let end = start.saturating_add(size).min(view.len());
            &view[start..end]
        }
    }
}

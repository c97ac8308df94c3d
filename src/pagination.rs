use serde::Serialize;

pub const PAGE_SIZE: u64 = 20;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    pub total_movies: u64,
}

impl Pagination {
    /// Out-of-range pages are reported as-is; the page query simply returns
    /// nothing for them.
    pub fn new(total: u64, current_page: i64, page_size: u64) -> Self {
        let total_pages = total.div_ceil(page_size.max(1));
        Self {
            current_page,
            total_pages,
            has_next_page: current_page < total_pages as i64,
            has_prev_page: current_page > 1,
            total_movies: total,
        }
    }
}

/// Zero-based page index for a one-based page number.
///
/// `None` below 1, and for pages whose row offset does not fit the
/// database's signed 64-bit OFFSET.
pub fn page_index(page: i64, page_size: u64) -> Option<u64> {
    let index = u64::try_from(page).ok()?.checked_sub(1)?;
    index
        .checked_mul(page_size)
        .filter(|offset| i64::try_from(*offset).is_ok())
        .map(|_| index)
}

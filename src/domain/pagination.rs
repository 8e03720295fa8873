use serde::Serialize;

/// One slot of a numbered page control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "page", rename_all = "snake_case")]
pub enum PageItem {
    Page(u32),
    Ellipsis,
}

/// Controls with at most this many pages list every page.
const FULL_LIST_MAX: u32 = 5;

/// Build the numbered page control for `current` out of `total` pages.
///
/// Layout: first page, an ellipsis when `current` is more than 2 pages from
/// the start, up to 3 pages centred on `current`, an ellipsis when more than 2
/// pages from the end, last page. No page number appears twice.
pub fn page_window(current: u32, total: u32) -> Vec<PageItem> {
    if total == 0 {
        return Vec::new();
    }
    if total <= FULL_LIST_MAX {
        return (1..=total).map(PageItem::Page).collect();
    }

    let current = current.clamp(1, total);
    let mut items = vec![PageItem::Page(1)];

    if current > 3 {
        items.push(PageItem::Ellipsis);
    }

    let start = current.saturating_sub(1).max(2);
    let end = (current + 1).min(total - 1);
    items.extend((start..=end).map(PageItem::Page));

    if current + 2 < total {
        items.push(PageItem::Ellipsis);
    }

    items.push(PageItem::Page(total));
    items
}

/// Client-side windowing for screens that fetch one large page.
pub fn paginate_local<T>(items: &[T], page: u32, page_size: u32) -> &[T] {
    if page_size == 0 || page == 0 {
        return &[];
    }
    let start = (page as usize - 1).saturating_mul(page_size as usize);
    if start >= items.len() {
        return &[];
    }
    let end = (start + page_size as usize).min(items.len());
    &items[start..end]
}

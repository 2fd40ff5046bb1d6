use serde::Serialize;

/// 每页帖子数
pub const POSTS_PER_PAGE: usize = 10;

/// 分页窗口：已解析的页码及对应的 LIMIT/OFFSET
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: usize,
    pub num_pages: usize,
    pub per_page: usize,
    pub total: usize,
}

impl PageWindow {
    pub fn offset(&self) -> usize {
        (self.number - 1) * self.per_page
    }

    pub fn limit(&self) -> usize {
        self.per_page
    }
}

/// 一页已物化的结果
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub per_page: usize,
    pub total: usize,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page: Option<usize>,
    pub previous_page: Option<usize>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow) -> Self {
        let has_next = window.number < window.num_pages;
        let has_previous = window.number > 1;
        Self {
            items,
            number: window.number,
            num_pages: window.num_pages,
            per_page: window.per_page,
            total: window.total,
            has_next,
            has_previous,
            next_page: has_next.then(|| window.number + 1),
            previous_page: has_previous.then(|| window.number - 1),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// 解析请求的页码。
///
/// 缺失或非数字的页码视为第 1 页；超出 `1..=num_pages` 的数字页码
/// （包括 0 与负数）返回最后一页。空序列仍有一个空的第 1 页。
pub fn paginate(total: usize, per_page: usize, requested: Option<&str>) -> PageWindow {
    let per_page = per_page.max(1);
    let num_pages = if total == 0 {
        1
    } else {
        (total + per_page - 1) / per_page
    };

    let number = match requested.map(str::trim).map(str::parse::<i64>) {
        None | Some(Err(_)) => 1,
        Some(Ok(n)) if n >= 1 && (n as u64) <= num_pages as u64 => n as usize,
        Some(Ok(_)) => num_pages,
    };

    PageWindow {
        number,
        num_pages,
        per_page,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_thirteen_items() {
        let first = paginate(13, POSTS_PER_PAGE, None);
        assert_eq!(first.number, 1);
        assert_eq!(first.num_pages, 2);
        assert_eq!(first.offset(), 0);

        let second = paginate(13, POSTS_PER_PAGE, Some("2"));
        assert_eq!(second.number, 2);
        assert_eq!(second.offset(), 10);
    }

    #[test]
    fn test_out_of_range_returns_last_page() {
        assert_eq!(paginate(13, 10, Some("99")).number, 2);
        assert_eq!(paginate(13, 10, Some("0")).number, 2);
        assert_eq!(paginate(13, 10, Some("-3")).number, 2);
    }

    #[test]
    fn test_garbage_page_is_first_page() {
        assert_eq!(paginate(13, 10, Some("abc")).number, 1);
        assert_eq!(paginate(13, 10, Some("")).number, 1);
    }

    #[test]
    fn test_empty_sequence_has_one_page() {
        let window = paginate(0, 10, Some("5"));
        assert_eq!(window.num_pages, 1);
        assert_eq!(window.number, 1);

        let page: Page<i32> = Page::new(vec![], window);
        assert!(page.is_empty());
        assert!(!page.has_next);
        assert!(!page.has_previous);
    }

    #[test]
    fn test_page_navigation() {
        let page = Page::new(vec![1, 2, 3], paginate(13, 10, Some("2")));
        assert_eq!(page.len(), 3);
        assert_eq!(page.previous_page, Some(1));
        assert_eq!(page.next_page, None);
    }

    proptest! {
        #[test]
        fn prop_window_always_in_range(total in 0usize..500, per_page in 1usize..50, requested in any::<i64>()) {
            let raw = requested.to_string();
            let window = paginate(total, per_page, Some(&raw));
            prop_assert!(window.number >= 1);
            prop_assert!(window.number <= window.num_pages);
            prop_assert!(window.offset() <= total);
        }

        #[test]
        fn prop_pages_cover_every_item_once(total in 0usize..500, per_page in 1usize..50) {
            let num_pages = paginate(total, per_page, None).num_pages;
            let covered: usize = (1..=num_pages)
                .map(|n| {
                    let window = paginate(total, per_page, Some(&n.to_string()));
                    total.saturating_sub(window.offset()).min(window.limit())
                })
                .sum();
            prop_assert_eq!(covered, total);
        }
    }
}

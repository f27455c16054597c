use crate::config::Config;

/// Resolved pagination window for list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    pub fn new(page: Option<u32>, limit: Option<u32>, config: &Config) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(config.default_page_size)
                .clamp(1, config.max_page_size.max(1)),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }

    pub fn pages(&self, total: i64) -> i64 {
        let limit = self.limit as i64;
        (total.max(0) + limit - 1) / limit
    }
}

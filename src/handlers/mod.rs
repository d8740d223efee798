use serde::Deserialize;

pub mod customers;
pub mod imports;
pub mod orders;
pub mod products;
pub mod reports;
pub mod supplier_orders;

const MAX_PER_PAGE: u64 = 100;

/// Common pagination query parameters
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

impl PaginationParams {
    /// Page is 1-based; per_page is capped to keep responses bounded.
    pub fn normalized(&self) -> (u64, u64) {
        let page = self.page.max(1);
        let per_page = self.per_page.clamp(1, MAX_PER_PAGE);
        (page, per_page)
    }
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_apply() {
        let params: PaginationParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.normalized(), (1, 20));
    }

    #[test]
    fn pagination_is_clamped() {
        let params = PaginationParams {
            page: 0,
            per_page: 10_000,
        };
        assert_eq!(params.normalized(), (1, MAX_PER_PAGE));
    }
}

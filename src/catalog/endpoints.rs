//! URL endpoints of the order catalog API and the content host.

pub const DEFAULT_API_BASE: &str = "https://www.yipai360.com";
pub const DEFAULT_CONTENT_BASE: &str = "https://c360-o2o.c360dn.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub select_page: String,
    pub order_detail: String,
    pub content_base: String,
}

impl Endpoints {
    /// Build endpoints from an API base URL and a content host base URL.
    pub fn new(api_base: &str, content_base: &str) -> Self {
        let api_base = api_base.trim_end_matches('/');
        Self {
            select_page: format!("{}/applet/v2/photo/select-page", api_base),
            order_detail: format!("{}/applet/v2/order/detail", api_base),
            content_base: content_base.trim_end_matches('/').to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoints() {
        let ep = Endpoints::new(DEFAULT_API_BASE, DEFAULT_CONTENT_BASE);
        assert_eq!(
            ep.select_page,
            "https://www.yipai360.com/applet/v2/photo/select-page"
        );
        assert_eq!(ep.order_detail, "https://www.yipai360.com/applet/v2/order/detail");
        assert_eq!(ep.content_base, "https://c360-o2o.c360dn.com");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let ep = Endpoints::new("http://localhost:8080/", "http://localhost:8081/");
        assert_eq!(ep.order_detail, "http://localhost:8080/applet/v2/order/detail");
        assert_eq!(ep.content_base, "http://localhost:8081");
    }
}

//! Cache key scheme
//!
//! Response keys are `{prefix}_{request_uri}`, so one prefix covers every
//! variant of a listing (query string included) and can be invalidated with
//! a single `{prefix}_*` pattern.

/// Builds the cache key for a GET response
pub fn response_key(prefix: &str, uri: &str) -> String {
    format!("{prefix}_{uri}")
}

/// Builds the invalidation pattern covering a whole prefix
pub fn prefix_pattern(prefix: &str) -> String {
    format!("{prefix}_*")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_key_includes_query() {
        assert_eq!(
            response_key("traffic_reports", "/api/v1/traffic/reports?page=2"),
            "traffic_reports_/api/v1/traffic/reports?page=2"
        );
    }

    #[test]
    fn test_prefix_pattern() {
        assert_eq!(prefix_pattern("traffic_reports"), "traffic_reports_*");
    }
}

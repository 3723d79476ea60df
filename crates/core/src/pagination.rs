//! Pagination limits for list endpoints.

/// Default page size when `limit` is omitted.
pub const DEFAULT_PAGE_LIMIT: i64 = 50;

/// Largest page size a client may request.
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// Clamp a user-provided limit to `[1, max]`, falling back to `default`.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit_default() {
        assert_eq!(clamp_limit(None, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT), 50);
    }

    #[test]
    fn test_clamp_limit_bounds() {
        assert_eq!(clamp_limit(Some(0), DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT), 1);
        assert_eq!(clamp_limit(Some(-5), DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT), 1);
        assert_eq!(clamp_limit(Some(5000), DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT), 1000);
        assert_eq!(clamp_limit(Some(10), DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT), 10);
    }

    #[test]
    fn test_clamp_offset() {
        assert_eq!(clamp_offset(None), 0);
        assert_eq!(clamp_offset(Some(-3)), 0);
        assert_eq!(clamp_offset(Some(7)), 7);
    }
}

//! Fully-qualified cache and tag keys.
//!
//! Cache entries and tag indices live in disjoint key-spaces under fixed
//! namespace prefixes. A cache key folds in the optional entry kind
//! (route-handler output, page output, and fetch-level entries may share a
//! literal caller key) plus the request pathname, so no two distinct
//! `(key, pathname, kind)` triples can collide.
//!
//! # Key layout
//!
//! ```text
//! stratum:cache:{kind}:{pathname}:{key}     (kind segment omitted when absent)
//! stratum:tag:{tag}
//! ```
//!
//! Variable segments are escaped (`%` -> `%25`, `:` -> `%3A`) before
//! joining. The separator therefore never occurs inside a segment, which
//! makes the composition injective.

/// Namespace prefix for cache entries.
const CACHE_PREFIX: &str = "stratum:cache:";

/// Namespace prefix for tag indices.
const TAG_PREFIX: &str = "stratum:tag:";

/// Escape a key segment so it cannot contain the `:` separator.
fn escape(segment: &str) -> String {
    segment.replace('%', "%25").replace(':', "%3A")
}

/// Build the fully-qualified cache key for a caller key.
///
/// `kind` distinguishes entry classes that might otherwise collide on the
/// same literal key; when absent its segment is omitted entirely.
pub fn cache_key(key: &str, pathname: &str, kind: Option<&str>) -> String {
    match kind {
        Some(kind) => format!(
            "{CACHE_PREFIX}{}:{}:{}",
            escape(kind),
            escape(pathname),
            escape(key)
        ),
        None => format!("{CACHE_PREFIX}{}:{}", escape(pathname), escape(key)),
    }
}

/// Build the fully-qualified key for a tag's index record.
pub fn tag_key(tag: &str) -> String {
    format!("{TAG_PREFIX}{}", escape(tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_with_kind() {
        let key = cache_key("abc", "/products", Some("APP_PAGE"));
        assert_eq!(key, "stratum:cache:APP_PAGE:/products:abc");
    }

    #[test]
    fn test_cache_key_without_kind() {
        let key = cache_key("abc", "/products", None);
        assert_eq!(key, "stratum:cache:/products:abc");
    }

    #[test]
    fn test_kind_isolation() {
        let page = cache_key("a", "/p", Some("APP_PAGE"));
        let route = cache_key("a", "/p", Some("APP_ROUTE"));
        assert_ne!(page, route);
    }

    #[test]
    fn test_pathname_isolation() {
        let one = cache_key("a", "/one", Some("FETCH"));
        let two = cache_key("a", "/two", Some("FETCH"));
        assert_ne!(one, two);
    }

    #[test]
    fn test_separator_in_segment_does_not_collide() {
        // Without escaping these would both produce "...:p:x:a".
        let shifted = cache_key("a", "p:x", None);
        let literal = cache_key("x:a", "p", None);
        assert_ne!(shifted, literal);
    }

    #[test]
    fn test_tag_key_space_disjoint_from_cache_keys() {
        let tag = tag_key("products");
        assert!(tag.starts_with("stratum:tag:"));
        assert!(!tag.starts_with(CACHE_PREFIX));
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(
            cache_key("k", "/path", Some("FETCH")),
            cache_key("k", "/path", Some("FETCH"))
        );
        assert_eq!(tag_key("t"), tag_key("t"));
    }
}

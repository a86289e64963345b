use reqwest::header::{HeaderMap, LINK};
use url::Url;

/// Finds the next-page cursor in a response.
pub trait PaginationStrategy {
    fn next_cursor(&self, request_url: &Url, headers: &HeaderMap) -> Option<String>;
}

/// Cursor taken from the first `<...>` group of the `Link` header.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkHeaderPagination;

impl PaginationStrategy for LinkHeaderPagination {
    fn next_cursor(&self, request_url: &Url, headers: &HeaderMap) -> Option<String> {
        let raw = headers.get(LINK)?;
        let Ok(header) = raw.to_str() else {
            tracing::warn!(link = ?raw, "Link header is not valid text, ending feed");
            return None;
        };
        let header = header.trim();
        if header.is_empty() {
            return None;
        }

        let Some(target) = extract_bracketed(header) else {
            tracing::warn!(link = header, "Link header has no <url> group, ending feed");
            return None;
        };
        if target.is_empty() {
            return None;
        }

        // Relative cursors are resolved against the page that returned them
        let next = match request_url.join(target) {
            Ok(url) => url.to_string(),
            Err(_) => target.to_string(),
        };
        tracing::debug!(next = %next, "next header");
        Some(next)
    }
}

/// Contents of the first `<...>` group
fn extract_bracketed(header: &str) -> Option<&str> {
    let start = header.find('<')? + 1;
    let rest = &header[start..];
    let end = rest.find('>')?;
    Some(&rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn url() -> Url {
        Url::parse("https://ocpi.example.com/den/cpo/1.0/locations/?limit=1000&offset=0").unwrap()
    }

    fn headers(link: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(LINK, HeaderValue::from_str(link).unwrap());
        headers
    }

    #[test]
    fn test_no_link_header() {
        assert_eq!(LinkHeaderPagination.next_cursor(&url(), &HeaderMap::new()), None);
    }

    #[test]
    fn test_absolute_link() {
        let h = headers(
            r#"<https://ocpi.example.com/den/cpo/1.0/locations/?limit=1000&offset=1000>; rel="next""#,
        );
        assert_eq!(
            LinkHeaderPagination.next_cursor(&url(), &h).as_deref(),
            Some("https://ocpi.example.com/den/cpo/1.0/locations/?limit=1000&offset=1000")
        );
    }

    #[test]
    fn test_first_group_wins() {
        let h = headers(r#"<https://a.example.com/p2>; rel="next", <https://a.example.com/p9>; rel="last""#);
        assert_eq!(
            LinkHeaderPagination.next_cursor(&url(), &h).as_deref(),
            Some("https://a.example.com/p2")
        );
    }

    #[test]
    fn test_relative_link_resolved() {
        let h = headers("</den/cpo/1.0/locations/?limit=1000&offset=2000>");
        assert_eq!(
            LinkHeaderPagination.next_cursor(&url(), &h).as_deref(),
            Some("https://ocpi.example.com/den/cpo/1.0/locations/?limit=1000&offset=2000")
        );
    }

    #[test]
    fn test_unbracketed_or_empty_link_ends_feed() {
        assert_eq!(LinkHeaderPagination.next_cursor(&url(), &headers("https://x/")), None);
        assert_eq!(LinkHeaderPagination.next_cursor(&url(), &headers("<>")), None);
        assert_eq!(LinkHeaderPagination.next_cursor(&url(), &headers("")), None);
    }

    #[test]
    fn test_non_text_link_ends_feed() {
        let mut h = HeaderMap::new();
        h.insert(LINK, HeaderValue::from_bytes(b"<https://a.example.com/\xff>").unwrap());
        assert_eq!(LinkHeaderPagination.next_cursor(&url(), &h), None);
    }
}

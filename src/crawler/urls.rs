//! URL validation, same-origin checks and normalization used by the crawler

use url::{Origin, Url};

/// Parse `candidate` and accept it only if it is an absolute http(s) URL with a host
pub fn parse_valid_url(candidate: &str) -> Option<Url> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return None;
    }
    let url = Url::parse(candidate).ok()?;
    is_valid(&url).then_some(url)
}

/// Whether `candidate` passes URL-syntax validation
pub fn is_valid_url(candidate: &str) -> bool {
    parse_valid_url(candidate).is_some()
}

fn is_valid(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
        && url.host_str().is_some_and(|host| !host.is_empty())
        && !url.cannot_be_a_base()
}

/// Whether `url` has exactly the scheme, host and port of `origin`
pub fn is_same_origin(url: &Url, origin: &Origin) -> bool {
    &url.origin() == origin
}

/// Canonical form of a URL: no fragment and no trailing slash
///
/// Applying it twice gives the same result as applying it once.
pub fn normalize_url(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);

    let path = url.path().trim_end_matches('/').to_string();
    url.set_path(&path);

    let mut normalized = url.to_string();
    if url.query().is_none() {
        while normalized.ends_with('/') {
            normalized.pop();
        }
    }
    normalized
}

/// Normalize a URL given as a string
pub fn normalize(candidate: &str) -> Result<String, url::ParseError> {
    Url::parse(candidate).map(|url| normalize_url(&url))
}

/// Host of `url` without a leading `www.`
pub fn domain_name(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation() {
        assert!(is_valid_url("https://example.com"));
        assert!(is_valid_url("http://127.0.0.1:8080/page"));
        assert!(!is_valid_url("not a url"));
        assert!(!is_valid_url("example.com/page"));
        assert!(!is_valid_url("mailto:someone@example.com"));
        assert!(!is_valid_url("ftp://example.com/file"));
        assert!(!is_valid_url("javascript:void(0)"));
        assert!(!is_valid_url(""));
    }

    #[test]
    fn test_normalize_strips_fragment_and_trailing_slash() {
        assert_eq!(normalize("https://example.com/").unwrap(), "https://example.com");
        assert_eq!(normalize("https://example.com").unwrap(), "https://example.com");
        assert_eq!(
            normalize("https://example.com/about/#team").unwrap(),
            "https://example.com/about"
        );
        assert_eq!(
            normalize("https://example.com/search?q=rust#top").unwrap(),
            "https://example.com/search?q=rust"
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "https://example.com",
            "https://example.com/",
            "https://example.com//",
            "https://example.com/a/b/",
            "https://example.com/a//",
            "https://example.com/a/?x=1",
            "https://example.com/?x=/",
            "http://EXAMPLE.com:8080/Path/#frag",
            "https://example.com/a?",
            "https://example.com/#",
        ];

        for input in inputs {
            let once = normalize(input).unwrap();
            let twice = normalize(&once).unwrap();
            assert_eq!(once, twice, "normalization not idempotent for {input}");
        }
    }

    #[test]
    fn test_same_origin_is_exact() {
        let origin = Url::parse("https://example.com").unwrap().origin();

        let same = Url::parse("https://example.com/about").unwrap();
        let subdomain = Url::parse("https://blog.example.com/").unwrap();
        let other_scheme = Url::parse("http://example.com/").unwrap();
        let other_port = Url::parse("https://example.com:8443/").unwrap();

        assert!(is_same_origin(&same, &origin));
        assert!(!is_same_origin(&subdomain, &origin));
        assert!(!is_same_origin(&other_scheme, &origin));
        assert!(!is_same_origin(&other_port, &origin));
    }

    #[test]
    fn test_domain_name_strips_www() {
        let url = Url::parse("https://www.example.com/page").unwrap();
        assert_eq!(domain_name(&url).unwrap(), "example.com");

        let url = Url::parse("http://blog.example.com/post").unwrap();
        assert_eq!(domain_name(&url).unwrap(), "blog.example.com");
    }
}

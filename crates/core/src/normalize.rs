//! URL and phrase normalization shared by the cache and the workflows.

/// Scheme prepended to URLs stored without one.
pub const DEFAULT_SCHEME: &str = "https://";

/// Return `url` with an explicit scheme.
///
/// Anything already carrying `scheme://` is kept as is; bare hostnames and
/// paths get `https://`. Surrounding whitespace is trimmed.
pub fn ensure_scheme(url: &str) -> String {
    let trimmed = url.trim();
    if has_scheme(trimmed) { trimmed.to_string() } else { format!("{DEFAULT_SCHEME}{}", trimmed.trim_start_matches('/')) }
}

/// Whether `url` starts with an RFC 3986 style `scheme://` prefix.
pub fn has_scheme(url: &str) -> bool {
    let Some((scheme, _)) = url.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Canonical form of a phrase key: trimmed, lower-cased, inner whitespace collapsed.
pub fn normalize_phrase(phrase: &str) -> String {
    phrase.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Host part of a URL or bare domain, lower-cased and without `www.`.
pub fn domain_of(input: &str) -> String {
    let with_scheme = ensure_scheme(input);
    let rest = with_scheme.split_once("://").map(|(_, r)| r).unwrap_or(&with_scheme);
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host = host.rsplit_once('@').map(|(_, h)| h).unwrap_or(host);
    let host = host.split(':').next().unwrap_or_default().to_lowercase();
    host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_scheme_bare_host() {
        assert_eq!(ensure_scheme("apple.com"), "https://apple.com");
        assert_eq!(ensure_scheme("  apple.com/iphone "), "https://apple.com/iphone");
        assert_eq!(ensure_scheme("//cdn.example.com"), "https://cdn.example.com");
    }

    #[test]
    fn test_ensure_scheme_keeps_existing() {
        assert_eq!(ensure_scheme("https://apple.com"), "https://apple.com");
        assert_eq!(ensure_scheme("http://example.org"), "http://example.org");
        assert_eq!(ensure_scheme("ftp://files.example.org"), "ftp://files.example.org");
    }

    #[test]
    fn test_has_scheme_rejects_non_schemes() {
        assert!(!has_scheme("apple.com"));
        assert!(!has_scheme("://apple.com"));
        assert!(!has_scheme("1http://apple.com"));
        assert!(has_scheme("chrome-extension://abc"));
    }

    #[test]
    fn test_normalize_phrase() {
        assert_eq!(normalize_phrase("  Open   Apple "), "open apple");
    }

    #[test]
    fn test_domain_of() {
        assert_eq!(domain_of("https://www.Apple.com/iphone?x=1"), "apple.com");
        assert_eq!(domain_of("apple.com"), "apple.com");
        assert_eq!(domain_of("http://user@shop.example.com:8080/a"), "shop.example.com");
    }
}

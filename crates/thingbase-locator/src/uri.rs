//! Typed view over a parsed locator string.
//!
//! Scheme-qualified input goes through the `url` crate; scheme-less input
//! (relative paths, absolute paths, `//host/path` references) is split by
//! hand because `url` only parses absolute URLs. In both cases the path as it
//! was written is kept next to the decoded path, since `url` normalizes dot
//! segments away and traversal must be judged on what the user typed.

use std::fmt;

use url::Url;

use crate::error::{ParseError, ParseResult};

/// A parsed thing or context reference. Immutable once parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Locator {
    raw: String,
    scheme: String,
    host: Option<String>,
    path: String,
    raw_path: String,
    opaque: Option<String>,
    query: Option<String>,
    fragment: Option<String>,
    url: Option<Url>,
}

impl Locator {
    /// Parse a locator string.
    ///
    /// Accepts absolute and relative paths, `file://` and `http(s)://` URIs,
    /// and opaque forms such as `urn:uuid:...` or `tag:...`. Only syntactic
    /// problems are reported here; policy is left to the resolver.
    ///
    /// ```
    /// use thingbase_locator::Locator;
    ///
    /// let loc = Locator::parse("https://example.org/kb/thing.yml").unwrap();
    /// assert_eq!(loc.scheme(), "https");
    /// assert_eq!(loc.host(), Some("example.org"));
    ///
    /// let rel = Locator::parse("kb/thing.yml").unwrap();
    /// assert_eq!(rel.scheme(), "");
    /// assert!(!rel.has_absolute_path());
    /// ```
    pub fn parse(input: &str) -> ParseResult<Self> {
        if let Some(offset) = input.bytes().position(|b| b.is_ascii_control()) {
            return Err(ParseError::ControlCharacter { offset });
        }
        check_percent_escapes(input)?;

        match Url::parse(input) {
            Ok(url) => Self::from_url(input, url),
            Err(url::ParseError::RelativeUrlWithoutBase) => Self::from_reference(input),
            Err(e) => Err(e.into()),
        }
    }

    fn from_url(input: &str, url: Url) -> ParseResult<Self> {
        let scheme = url.scheme().to_string();
        let query = url.query().map(str::to_owned);
        let fragment = url.fragment().map(str::to_owned);

        if url.cannot_be_a_base() {
            return Ok(Self {
                raw: input.to_string(),
                scheme,
                host: None,
                path: String::new(),
                raw_path: String::new(),
                opaque: Some(url.path().to_string()),
                query,
                fragment,
                url: Some(url),
            });
        }

        let host = url.host_str().filter(|h| !h.is_empty()).map(str::to_owned);
        let path = if scheme == crate::LOCAL_SCHEME {
            decode(url.path())?
        } else {
            url.path().to_string()
        };

        Ok(Self {
            raw: input.to_string(),
            raw_path: raw_hierarchical_path(input).to_string(),
            scheme,
            host,
            path,
            opaque: None,
            query,
            fragment,
            url: Some(url),
        })
    }

    fn from_reference(input: &str) -> ParseResult<Self> {
        let (rest, fragment) = split_off(input, '#');
        let (rest, query) = split_off(rest, '?');

        let (host, raw_path) = match rest.strip_prefix("//") {
            Some(authority_and_path) => {
                let end = authority_and_path.find('/').unwrap_or(authority_and_path.len());
                let authority = &authority_and_path[..end];
                let host = (!authority.is_empty()).then(|| authority.to_string());
                (host, &authority_and_path[end..])
            }
            None => {
                let first = raw_path_first_segment(rest);
                if first.contains(':') {
                    return Err(ParseError::ColonInFirstSegment);
                }
                (None, rest)
            }
        };

        Ok(Self {
            raw: input.to_string(),
            scheme: String::new(),
            host,
            path: decode(raw_path)?,
            raw_path: raw_path.to_string(),
            opaque: None,
            query: query.map(str::to_owned),
            fragment: fragment.map(str::to_owned),
            url: None,
        })
    }

    /// The string this locator was parsed from.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Lowercased scheme, or `""` for scheme-less references.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Decoded path. Empty for opaque locators.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The path exactly as written, before dot-segment normalization or
    /// percent-decoding.
    pub fn raw_path(&self) -> &str {
        &self.raw_path
    }

    /// Everything after `scheme:` for locators such as `urn:uuid:...`.
    pub fn opaque(&self) -> Option<&str> {
        self.opaque.as_deref()
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// The underlying parsed URL, present for scheme-qualified input.
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    pub fn is_opaque(&self) -> bool {
        self.opaque.is_some()
    }

    /// Whether the path starts with a path separator.
    pub fn has_absolute_path(&self) -> bool {
        self.path.starts_with('/')
    }

    /// Whether any path segment, as written or once decoded, is `..`.
    pub fn has_parent_traversal(&self) -> bool {
        let raw = self
            .raw_path
            .split(['/', '\\'])
            .any(|segment| decode(segment).map(|s| s == "..").unwrap_or(false));
        raw || self.path.split(['/', '\\']).any(|segment| segment == "..")
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::str::FromStr for Locator {
    type Err = ParseError;

    fn from_str(s: &str) -> ParseResult<Self> {
        Self::parse(s)
    }
}

fn check_percent_escapes(input: &str) -> ParseResult<()> {
    let bytes = input.as_bytes();
    for (offset, _) in input.match_indices('%') {
        let well_formed = bytes
            .get(offset + 1..offset + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !well_formed {
            return Err(ParseError::InvalidPercentEncoding { offset });
        }
    }
    Ok(())
}

fn decode(s: &str) -> ParseResult<String> {
    urlencoding::decode(s)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| ParseError::InvalidUtf8)
}

fn split_off(s: &str, delimiter: char) -> (&str, Option<&str>) {
    match s.split_once(delimiter) {
        Some((head, tail)) => (head, Some(tail)),
        None => (s, None),
    }
}

fn raw_path_first_segment(path: &str) -> &str {
    path.split('/').next().unwrap_or_default()
}

/// Slice the hierarchical path out of `scheme://authority/path?query#frag`.
fn raw_hierarchical_path(input: &str) -> &str {
    let after_scheme = input.split_once(':').map_or(input, |(_, rest)| rest);
    let path = match after_scheme.strip_prefix("//") {
        Some(rest) => rest.find(['/', '\\']).map_or("", |i| &rest[i..]),
        None => after_scheme,
    };
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urn_is_opaque() {
        let loc = Locator::parse("urn:uuid:00000000-0000-0000-0000-000000000000").unwrap();
        assert_eq!(loc.scheme(), "urn");
        assert_eq!(loc.opaque(), Some("uuid:00000000-0000-0000-0000-000000000000"));
        assert!(loc.path().is_empty());
    }

    #[test]
    fn tag_round_trips_through_opaque() {
        let loc = Locator::parse("tag:test@example.org,1970:foobar").unwrap();
        assert_eq!(loc.scheme(), "tag");
        assert_eq!(loc.opaque(), Some("test@example.org,1970:foobar"));
        assert_eq!(loc.to_string(), "tag:test@example.org,1970:foobar");
    }

    #[test]
    fn https_keeps_host() {
        let loc = Locator::parse("https://example.org/foo/bar.html?x=1#top").unwrap();
        assert_eq!(loc.scheme(), "https");
        assert_eq!(loc.host(), Some("example.org"));
        assert_eq!(loc.path(), "/foo/bar.html");
        assert_eq!(loc.query(), Some("x=1"));
        assert_eq!(loc.fragment(), Some("top"));
        assert!(loc.url().is_some());
    }

    #[test]
    fn relative_path() {
        let loc = Locator::parse("testing/example.yml").unwrap();
        assert_eq!(loc.scheme(), "");
        assert_eq!(loc.path(), "testing/example.yml");
        assert!(!loc.has_absolute_path());
        assert!(loc.url().is_none());
    }

    #[test]
    fn absolute_path_without_scheme() {
        let loc = Locator::parse("/tmp/somefile.suffix").unwrap();
        assert_eq!(loc.scheme(), "");
        assert_eq!(loc.path(), "/tmp/somefile.suffix");
        assert!(loc.has_absolute_path());
    }

    #[test]
    fn file_uri_is_decoded() {
        let loc = Locator::parse("file:///home/kb/my%20thing.yml").unwrap();
        assert_eq!(loc.scheme(), "file");
        assert_eq!(loc.path(), "/home/kb/my thing.yml");
        assert_eq!(loc.raw_path(), "/home/kb/my%20thing.yml");
    }

    #[test]
    fn network_path_reference() {
        let loc = Locator::parse("//example.org/kb/a.yml").unwrap();
        assert_eq!(loc.scheme(), "");
        assert_eq!(loc.host(), Some("example.org"));
        assert_eq!(loc.path(), "/kb/a.yml");
    }

    #[test]
    fn reject_bad_percent_encoding() {
        assert_eq!(
            Locator::parse("kb/%zz.yml"),
            Err(ParseError::InvalidPercentEncoding { offset: 3 })
        );
        assert!(matches!(
            Locator::parse("kb/trailing%"),
            Err(ParseError::InvalidPercentEncoding { .. })
        ));
    }

    #[test]
    fn reject_non_utf8_escapes() {
        assert_eq!(Locator::parse("kb/%ff.yml"), Err(ParseError::InvalidUtf8));
    }

    #[test]
    fn reject_control_characters() {
        assert_eq!(
            Locator::parse("kb/a\nb"),
            Err(ParseError::ControlCharacter { offset: 4 })
        );
    }

    #[test]
    fn reject_colon_in_first_segment() {
        assert_eq!(Locator::parse(":foo/bar"), Err(ParseError::ColonInFirstSegment));
    }

    #[test]
    fn reject_broken_authority() {
        assert!(matches!(
            Locator::parse("http://[::1/kb"),
            Err(ParseError::Syntax(_))
        ));
    }

    #[test]
    fn traversal_is_seen_before_normalization() {
        let loc = Locator::parse("file:///ctx/../etc/passwd").unwrap();
        // `url` already collapsed the dot segment.
        assert_eq!(loc.path(), "/etc/passwd");
        assert!(loc.has_parent_traversal());
    }

    #[test]
    fn traversal_detection() {
        assert!(Locator::parse("../x").unwrap().has_parent_traversal());
        assert!(Locator::parse("a/b/..").unwrap().has_parent_traversal());
        assert!(Locator::parse("a/%2e%2e/b").unwrap().has_parent_traversal());
        assert!(Locator::parse("a%2F..%2Fb").unwrap().has_parent_traversal());
        assert!(!Locator::parse("a..b/c").unwrap().has_parent_traversal());
        assert!(!Locator::parse("a/./b").unwrap().has_parent_traversal());
    }
}

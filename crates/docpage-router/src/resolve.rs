//! URL to page resolution.
//!
//! Maps browser URLs under the site base onto page relative paths and back:
//!
//! | URL                  | relative path       |
//! |----------------------|---------------------|
//! | `/`                  | `index.md`          |
//! | `/en-US/`            | `en-US/index.md`    |
//! | `/guide.html`        | `guide.md`          |
//! | `/guide`             | `guide.md`          |
//! | `/guide#install`     | `guide.md`          |

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

/// Characters escaped within one path segment of an emitted URL.
const SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Error resolving a URL to a page.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// Configured base is not of the form `/` or `/path/`.
    #[error("Invalid base '{0}': must start and end with '/'")]
    InvalidBase(String),
    /// URL lies outside the site base.
    #[error("URL '{url}' is outside base '{base}'")]
    ForeignBase {
        /// Requested URL.
        url: String,
        /// Configured base.
        base: String,
    },
    /// URL contains a `..` segment.
    #[error("URL '{0}' escapes the site root")]
    Escapes(String),
    /// Percent-encoded bytes are not UTF-8.
    #[error("URL '{0}' is not valid UTF-8 after decoding")]
    InvalidEncoding(String),
}

/// Resolves URLs to page relative paths.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteResolver {
    base: String,
    clean_urls: bool,
}

impl Default for RouteResolver {
    fn default() -> Self {
        Self {
            base: "/".to_owned(),
            clean_urls: false,
        }
    }
}

impl RouteResolver {
    /// Create a resolver for a site served under `base`.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidBase`] unless `base` starts and ends with `/`.
    pub fn new(base: &str) -> Result<Self, RouteError> {
        if !base.starts_with('/') || !base.ends_with('/') {
            return Err(RouteError::InvalidBase(base.to_owned()));
        }
        Ok(Self {
            base: base.to_owned(),
            clean_urls: false,
        })
    }

    /// Emit URLs without the `.html` suffix.
    #[must_use]
    pub fn with_clean_urls(mut self, clean_urls: bool) -> Self {
        self.clean_urls = clean_urls;
        self
    }

    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    #[must_use]
    pub fn clean_urls(&self) -> bool {
        self.clean_urls
    }

    /// Resolve a URL (path, optional query and fragment) to a relative path.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::ForeignBase`] if the URL is not under the base,
    /// [`RouteError::Escapes`] if it contains `..`, and
    /// [`RouteError::InvalidEncoding`] if percent-decoding yields invalid UTF-8.
    pub fn resolve(&self, url: &str) -> Result<String, RouteError> {
        let path = url.split(['?', '#']).next().unwrap_or_default();
        let path = percent_decode_str(path)
            .decode_utf8()
            .map_err(|_| RouteError::InvalidEncoding(url.to_owned()))?;

        let rest = if let Some(rest) = path.strip_prefix(self.base.as_str()) {
            rest
        } else if path == self.base.trim_end_matches('/') {
            ""
        } else {
            return Err(RouteError::ForeignBase {
                url: url.to_owned(),
                base: self.base.clone(),
            });
        };

        let is_dir = rest.is_empty() || rest.ends_with('/');
        let mut segments = Vec::new();
        for segment in rest.split('/') {
            match segment {
                ".." => return Err(RouteError::Escapes(url.to_owned())),
                "" | "." => {}
                s if s.contains('\\') => return Err(RouteError::Escapes(url.to_owned())),
                s => segments.push(s),
            }
        }

        let mut relative = segments.join("/");
        if is_dir || relative.is_empty() {
            if !relative.is_empty() {
                relative.push('/');
            }
            relative.push_str("index.md");
        } else if let Some(stem) = relative.strip_suffix(".html") {
            relative = format!("{stem}.md");
        } else if !relative.ends_with(".md") {
            relative.push_str(".md");
        }

        tracing::trace!(url, relative_path = %relative, "Resolved route");
        Ok(relative)
    }

    /// URL of a page, the inverse of [`resolve`](Self::resolve).
    #[must_use]
    pub fn to_url(&self, relative_path: &str) -> String {
        let path = relative_path.trim_start_matches('/');
        let mut url = self.base.clone();

        if path == "index.md" {
            return url;
        }
        if let Some(dir) = path.strip_suffix("/index.md") {
            push_encoded(&mut url, dir);
            url.push('/');
            return url;
        }
        match path.strip_suffix(".md") {
            Some(stem) if self.clean_urls => push_encoded(&mut url, stem),
            Some(stem) => {
                push_encoded(&mut url, stem);
                url.push_str(".html");
            }
            None => push_encoded(&mut url, path),
        }
        url
    }
}

/// Append `path` to `url`, percent-encoding each segment.
fn push_encoded(url: &mut String, path: &str) {
    for (i, segment) in path.split('/').enumerate() {
        if i > 0 {
            url.push('/');
        }
        url.extend(utf8_percent_encode(segment, SEGMENT_ENCODE_SET));
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_new_validates_base() {
        assert!(RouteResolver::new("/").is_ok());
        assert!(RouteResolver::new("/docs/").is_ok());
        assert_eq!(
            RouteResolver::new("docs/"),
            Err(RouteError::InvalidBase("docs/".to_owned()))
        );
        assert_eq!(
            RouteResolver::new("/docs"),
            Err(RouteError::InvalidBase("/docs".to_owned()))
        );
    }

    #[test]
    fn test_resolve_root_and_directories() {
        let resolver = RouteResolver::default();
        assert_eq!(resolver.resolve("/").unwrap(), "index.md");
        assert_eq!(resolver.resolve("/en-US/").unwrap(), "en-US/index.md");
        assert_eq!(resolver.resolve("/a/b/").unwrap(), "a/b/index.md");
    }

    #[test]
    fn test_resolve_pages() {
        let resolver = RouteResolver::default();
        assert_eq!(resolver.resolve("/guide.html").unwrap(), "guide.md");
        assert_eq!(resolver.resolve("/guide").unwrap(), "guide.md");
        assert_eq!(resolver.resolve("/guide.md").unwrap(), "guide.md");
        assert_eq!(
            resolver.resolve("/en-US/syntax/idioms.html").unwrap(),
            "en-US/syntax/idioms.md"
        );
    }

    #[test]
    fn test_resolve_strips_query_and_fragment() {
        let resolver = RouteResolver::default();
        assert_eq!(resolver.resolve("/guide.html#install").unwrap(), "guide.md");
        assert_eq!(resolver.resolve("/guide?v=2#x").unwrap(), "guide.md");
        assert_eq!(resolver.resolve("/#warning").unwrap(), "index.md");
    }

    #[test]
    fn test_resolve_percent_decoding() {
        let resolver = RouteResolver::default();
        assert_eq!(
            resolver.resolve("/release%20notes.html").unwrap(),
            "release notes.md"
        );
        assert_eq!(
            resolver.resolve("/%FF.html"),
            Err(RouteError::InvalidEncoding("/%FF.html".to_owned()))
        );
    }

    #[test]
    fn test_resolve_collapses_empty_and_dot_segments() {
        let resolver = RouteResolver::default();
        assert_eq!(resolver.resolve("//a/./b.html").unwrap(), "a/b.md");
    }

    #[test]
    fn test_resolve_rejects_escape() {
        let resolver = RouteResolver::default();
        assert_eq!(
            resolver.resolve("/../secret.html"),
            Err(RouteError::Escapes("/../secret.html".to_owned()))
        );
        assert_eq!(
            resolver.resolve("/a/%2E%2E/b"),
            Err(RouteError::Escapes("/a/%2E%2E/b".to_owned()))
        );
        assert!(matches!(
            resolver.resolve("/a\\..\\b"),
            Err(RouteError::Escapes(_))
        ));
    }

    #[test]
    fn test_resolve_with_base() {
        let resolver = RouteResolver::new("/hetu/").unwrap();
        assert_eq!(resolver.resolve("/hetu/").unwrap(), "index.md");
        assert_eq!(resolver.resolve("/hetu").unwrap(), "index.md");
        assert_eq!(resolver.resolve("/hetu/en-US/").unwrap(), "en-US/index.md");
        assert_eq!(
            resolver.resolve("/other/guide.html"),
            Err(RouteError::ForeignBase {
                url: "/other/guide.html".to_owned(),
                base: "/hetu/".to_owned(),
            })
        );
        assert!(matches!(
            resolver.resolve("/hetuguide.html"),
            Err(RouteError::ForeignBase { .. })
        ));
    }

    #[test]
    fn test_to_url() {
        let resolver = RouteResolver::new("/hetu/").unwrap();
        assert_eq!(resolver.to_url("index.md"), "/hetu/");
        assert_eq!(resolver.to_url("en-US/index.md"), "/hetu/en-US/");
        assert_eq!(resolver.to_url("guide.md"), "/hetu/guide.html");
        assert_eq!(resolver.to_url("logo.png"), "/hetu/logo.png");
    }

    #[test]
    fn test_to_url_clean() {
        let resolver = RouteResolver::default().with_clean_urls(true);
        assert_eq!(resolver.to_url("guide.md"), "/guide");
        assert_eq!(resolver.to_url("en-US/index.md"), "/en-US/");
    }

    #[test]
    fn test_to_url_round_trips_through_resolve() {
        for clean in [false, true] {
            let resolver = RouteResolver::new("/docs/").unwrap().with_clean_urls(clean);
            for path in [
                "index.md",
                "en-US/index.md",
                "a/b/c.md",
                "release notes.md",
                "zh-CN/快速开始.md",
                "faq/c#?.md",
            ] {
                assert_eq!(resolver.resolve(&resolver.to_url(path)).unwrap(), path);
            }
        }
    }

    #[test]
    fn test_to_url_percent_encodes_segments() {
        let resolver = RouteResolver::default();
        assert_eq!(resolver.to_url("release notes.md"), "/release%20notes.html");
        assert_eq!(
            resolver.to_url("zh-CN/快速开始/index.md"),
            "/zh-CN/%E5%BF%AB%E9%80%9F%E5%BC%80%E5%A7%8B/"
        );
        assert_eq!(resolver.to_url("faq/c#?.md"), "/faq/c%23%3F.html");
    }
}

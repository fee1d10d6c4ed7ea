use std::fmt;
use std::str::FromStr;

use url::Url;

const YANDEX_SEARCH: &str = "https://yandex.com/images/search";
const GOOGLE_SEARCH: &str = "https://www.google.com/search";
const BING_SEARCH: &str = "https://www.bing.com/images/search";

/// The search engines an image can be harvested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Yandex,
    Google,
    Bing,
}

impl Provider {
    /// Default priority order.
    pub const ALL: [Provider; 3] = [Provider::Yandex, Provider::Google, Provider::Bing];

    /// Short name used in logs, events and filenames.
    pub fn tag(self) -> &'static str {
        match self {
            Provider::Yandex => "yandex",
            Provider::Google => "google",
            Provider::Bing => "bing",
        }
    }

    pub fn search_url(self, query: &str) -> Result<Url, url::ParseError> {
        match self {
            Provider::Yandex => Url::parse_with_params(YANDEX_SEARCH, &[("text", query)]),
            Provider::Google => Url::parse_with_params(GOOGLE_SEARCH, &[("q", query), ("tbm", "isch")]),
            Provider::Bing => Url::parse_with_params(BING_SEARCH, &[("q", query)]),
        }
    }

    /// CSS selector matching one result per element.
    pub fn selector(self) -> &'static str {
        match self {
            Provider::Yandex => "a.Link.ContentImage-Cover",
            Provider::Google => "img",
            Provider::Bing => "img.mimg",
        }
    }

    /// Attribute of a selected element that carries the image address.
    pub fn link_attribute(self) -> &'static str {
        match self {
            Provider::Yandex => "href",
            Provider::Google | Provider::Bing => "src",
        }
    }

    /// Turns an attribute value into a downloadable image URL, if it is one.
    pub fn extract_image_url(self, raw: &str) -> Option<String> {
        let candidate = match self {
            Provider::Yandex => decode_redirect_link(raw)?,
            Provider::Google | Provider::Bing => raw.trim().to_string(),
        };
        candidate.starts_with("http").then_some(candidate)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown provider {0:?} (expected yandex, google or bing)")]
pub struct UnknownProvider(pub String);

impl FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::ALL
            .into_iter()
            .find(|provider| provider.tag().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownProvider(s.to_string()))
    }
}

/// Pulls the real image address out of a results-page redirect link.
///
/// The address sits percent-encoded in the `img_url` query parameter and is
/// often scheme-relative. Relative links are resolved against the Yandex host.
pub fn decode_redirect_link(href: &str) -> Option<String> {
    let base = Url::parse(YANDEX_SEARCH).ok()?;
    let link = Url::options().base_url(Some(&base)).parse(href.trim()).ok()?;
    let encoded = link
        .query_pairs()
        .find(|(name, _)| name == "img_url")
        .map(|(_, value)| value.into_owned())?;
    if encoded.is_empty() {
        return None;
    }
    Some(normalize_scheme_relative(&encoded))
}

/// `//host/path` becomes `https://host/path`; anything else is returned as-is.
pub fn normalize_scheme_relative(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{url}")
    } else {
        url.to_string()
    }
}

use std::collections::HashMap;

use async_trait::async_trait;
use scraper::{Html, Selector};
use url::Url;

use crate::fetch::{build_client, fetch_bytes, BodyLimits};
use crate::page::{Element, Page, PageError, PageLoader};
use crate::{FetchError, FetchSettings};

/// Attributes a browser would report as resolved absolute URLs.
const URL_ATTRIBUTES: &[&str] = &["href", "src"];

/// Loads a results page with a single HTTP GET and queries the returned HTML.
///
/// Nothing runs scripts, so the page never grows when scrolled: discovery
/// converges after the first scroll and sees whatever the server rendered.
pub struct StaticPageLoader {
    client: reqwest::Client,
    max_bytes: u64,
}

impl StaticPageLoader {
    pub fn new(settings: &FetchSettings) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client(settings)?,
            max_bytes: settings.max_bytes,
        })
    }
}

#[async_trait]
impl PageLoader for StaticPageLoader {
    async fn load_page(&self, url: &str) -> Result<Box<dyn Page>, PageError> {
        let limits = BodyLimits {
            min_declared: None,
            max_bytes: self.max_bytes,
        };
        let output = fetch_bytes(&self.client, url, limits)
            .await
            .map_err(|err| PageError::Load(err.to_string()))?;
        let base = Url::parse(&output.metadata.final_url).ok();
        let html = String::from_utf8_lossy(&output.bytes).into_owned();
        Ok(Box::new(StaticPage::new(html, base)))
    }
}

/// An already-fetched HTML document.
pub struct StaticPage {
    html: String,
    base: Option<Url>,
}

impl StaticPage {
    pub fn new(html: String, base: Option<Url>) -> Self {
        Self { html, base }
    }
}

#[async_trait]
impl Page for StaticPage {
    async fn scroll_to_bottom(&self) -> Result<(), PageError> {
        Ok(())
    }

    async fn scroll_height(&self) -> Result<u64, PageError> {
        Ok(self.html.len() as u64)
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Box<dyn Element>>, PageError> {
        let parsed = Selector::parse(selector).map_err(|err| PageError::Selector {
            selector: selector.to_string(),
            message: err.to_string(),
        })?;
        let document = Html::parse_document(&self.html);
        let elements = document
            .select(&parsed)
            .map(|element| {
                let attributes = element
                    .value()
                    .attrs()
                    .map(|(name, value)| {
                        let value = if URL_ATTRIBUTES.contains(&name) {
                            resolve(value, self.base.as_ref())
                        } else {
                            value.to_string()
                        };
                        (name.to_string(), value)
                    })
                    .collect();
                Box::new(SnapshotElement { attributes }) as Box<dyn Element>
            })
            .collect();
        Ok(elements)
    }

    async fn close(self: Box<Self>) -> Result<(), PageError> {
        Ok(())
    }
}

/// Element attributes captured at query time.
#[derive(Debug, Clone, Default)]
pub struct SnapshotElement {
    attributes: HashMap<String, String>,
}

impl SnapshotElement {
    pub fn new(attributes: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            attributes: attributes.into_iter().collect(),
        }
    }
}

#[async_trait]
impl Element for SnapshotElement {
    async fn attribute(&self, name: &str) -> Result<Option<String>, PageError> {
        Ok(self.attributes.get(name).cloned())
    }
}

fn resolve(reference: &str, base: Option<&Url>) -> String {
    let trimmed = reference.trim();
    // data: URIs and fragments stay as-is; callers filter on the scheme.
    if let Ok(url) = Url::parse(trimmed) {
        return url.into();
    }
    base.and_then(|base| base.join(trimmed).ok())
        .map(String::from)
        .unwrap_or_else(|| trimmed.to_string())
}

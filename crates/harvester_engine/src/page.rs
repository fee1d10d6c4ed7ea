//! Browser capability used by the sources: load a results page, scroll it,
//! query elements. Backends live in `static_page` and `webdriver`.

use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    #[error("page failed to load: {0}")]
    Load(String),
    #[error("invalid selector {selector:?}: {message}")]
    Selector { selector: String, message: String },
    #[error("page script failed: {0}")]
    Script(String),
    #[error("element query failed: {0}")]
    Element(String),
    #[error("page backend unavailable: {0}")]
    Backend(String),
}

#[async_trait]
pub trait PageLoader: Send + Sync {
    async fn load_page(&self, url: &str) -> Result<Box<dyn Page>, PageError>;
}

#[async_trait]
pub trait Page: Send + Sync {
    async fn scroll_to_bottom(&self) -> Result<(), PageError>;

    async fn scroll_height(&self) -> Result<u64, PageError>;

    async fn find_all(&self, selector: &str) -> Result<Vec<Box<dyn Element>>, PageError>;

    /// Releases the page and whatever session backs it.
    async fn close(self: Box<Self>) -> Result<(), PageError>;
}

#[async_trait]
pub trait Element: Send + Sync {
    async fn attribute(&self, name: &str) -> Result<Option<String>, PageError>;
}

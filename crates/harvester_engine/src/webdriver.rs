//! Real-browser backend: each page is a fresh WebDriver session.

use async_trait::async_trait;
use fantoccini::elements::Element as WebElement;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{json, Map, Value};

use crate::page::{Element, Page, PageError, PageLoader};

const SCROLL_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight);";
const HEIGHT_SCRIPT: &str = "return document.body.scrollHeight;";

pub struct WebDriverPageLoader {
    endpoint: String,
    headless: bool,
}

impl WebDriverPageLoader {
    /// `endpoint` is the WebDriver server, e.g. `http://localhost:4444`.
    pub fn new(endpoint: impl Into<String>, headless: bool) -> Self {
        Self {
            endpoint: endpoint.into(),
            headless,
        }
    }

    fn capabilities(&self) -> Map<String, Value> {
        let mut caps = Map::new();
        if self.headless {
            caps.insert(
                "goog:chromeOptions".to_string(),
                json!({ "args": ["--headless=new"] }),
            );
            caps.insert(
                "moz:firefoxOptions".to_string(),
                json!({ "args": ["-headless"] }),
            );
        }
        caps
    }
}

#[async_trait]
impl PageLoader for WebDriverPageLoader {
    async fn load_page(&self, url: &str) -> Result<Box<dyn Page>, PageError> {
        let mut builder =
            ClientBuilder::rustls().map_err(|err| PageError::Backend(err.to_string()))?;
        let client = builder
            .capabilities(self.capabilities())
            .connect(&self.endpoint)
            .await
            .map_err(|err| PageError::Backend(err.to_string()))?;

        if let Err(err) = client.goto(url).await {
            // The session must not outlive a failed navigation.
            let _ = client.close().await;
            return Err(PageError::Load(err.to_string()));
        }
        Ok(Box::new(WebDriverPage { client }))
    }
}

pub struct WebDriverPage {
    client: Client,
}

#[async_trait]
impl Page for WebDriverPage {
    async fn scroll_to_bottom(&self) -> Result<(), PageError> {
        self.client
            .execute(SCROLL_SCRIPT, Vec::new())
            .await
            .map(|_| ())
            .map_err(|err| PageError::Script(err.to_string()))
    }

    async fn scroll_height(&self) -> Result<u64, PageError> {
        let value = self
            .client
            .execute(HEIGHT_SCRIPT, Vec::new())
            .await
            .map_err(|err| PageError::Script(err.to_string()))?;
        value
            .as_u64()
            .or_else(|| value.as_f64().map(|height| height as u64))
            .ok_or_else(|| PageError::Script(format!("unexpected scroll height {value}")))
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Box<dyn Element>>, PageError> {
        let elements = self
            .client
            .find_all(Locator::Css(selector))
            .await
            .map_err(|err| PageError::Element(err.to_string()))?;
        Ok(elements
            .into_iter()
            .map(|element| Box::new(WebDriverElement { element }) as Box<dyn Element>)
            .collect())
    }

    async fn close(self: Box<Self>) -> Result<(), PageError> {
        self.client
            .close()
            .await
            .map_err(|err| PageError::Backend(err.to_string()))
    }
}

struct WebDriverElement {
    element: WebElement,
}

#[async_trait]
impl Element for WebDriverElement {
    async fn attribute(&self, name: &str) -> Result<Option<String>, PageError> {
        self.element
            .attr(name)
            .await
            .map_err(|err| PageError::Element(err.to_string()))
    }
}

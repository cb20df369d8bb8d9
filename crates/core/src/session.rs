//! The one browser session an orchestration run owns.

use fantoccini::elements::Element;
use fantoccini::wd::WindowHandle;
use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use tracing::debug;

use crate::error::{SessionError, StepError};
use crate::step::Selector;

/// How to reach the WebDriver endpoint driving the browser.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// chromedriver endpoint.
    pub webdriver_url: String,
    /// Headless runs leave nothing for the operator to inspect; off by
    /// default on purpose.
    pub headless: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: false,
        }
    }
}

/// One live WebDriver session. Exactly one exists per orchestration run
/// and it is never shared across runs.
///
/// Dropping a `Session` does not end the browser session: every tab the
/// run opened stays on screen for the operator to read. That is the
/// product contract, not a leak.
pub struct Session {
    client: Client,
}

impl Session {
    pub async fn connect(config: &SessionConfig) -> Result<Self, SessionError> {
        let mut args = vec![
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
        ];
        if config.headless {
            args.push("--headless=new".to_string());
            args.push("--disable-gpu".to_string());
        }

        let mut caps = serde_json::Map::new();
        caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));

        debug!(target = "consulta", url = %config.webdriver_url, "connecting to webdriver");
        let client = ClientBuilder::rustls()
            .capabilities(caps)
            .connect(&config.webdriver_url)
            .await?;

        Ok(Self { client })
    }

    pub async fn goto(&self, url: &str) -> Result<(), StepError> {
        Ok(self.client.goto(url).await?)
    }

    pub async fn find(&self, selector: &Selector) -> Result<Element, StepError> {
        Ok(self.client.find(selector.locator()).await?)
    }

    /// All live window handles, in driver order.
    pub async fn windows(&self) -> Result<Vec<WindowHandle>, StepError> {
        Ok(self.client.windows().await?)
    }

    pub async fn current_window(&self) -> Result<WindowHandle, StepError> {
        Ok(self.client.window().await?)
    }

    /// Opens a fresh tab and returns its handle. Focus stays where it was
    /// until [`switch_to`](Self::switch_to) is called.
    pub async fn new_tab(&self) -> Result<WindowHandle, StepError> {
        let response = self.client.new_window(true).await?;
        Ok(response.handle)
    }

    pub async fn switch_to(&self, handle: &WindowHandle) -> Result<(), StepError> {
        Ok(self.client.switch_to_window(handle.clone()).await?)
    }

    /// Closes the currently focused tab. The caller must switch to a known
    /// handle afterwards; until then the session has no current window.
    pub async fn close_current(&self) -> Result<(), StepError> {
        Ok(self.client.close_window().await?)
    }

    /// Clicks through the DOM event path instead of the pointer. Some
    /// portals cover their controls with framework overlays that reject
    /// native clicks but honor a scripted one.
    pub async fn click_js(&self, element: &Element) -> Result<(), StepError> {
        let arg = serde_json::to_value(element)
            .map_err(|e| StepError::ElementInteraction(e.to_string()))?;
        self.client
            .execute("arguments[0].click();", vec![arg])
            .await?;
        Ok(())
    }
}

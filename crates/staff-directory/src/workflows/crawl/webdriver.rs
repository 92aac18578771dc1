use std::path::Path;

use async_trait::async_trait;
use serde_json::json;
use thirtyfour::prelude::*;
use thirtyfour::ChromiumLikeCapabilities;

use super::session::{BrowserError, Locator, PortalSession};

/// A Chrome session driven through a WebDriver server such as chromedriver.
#[derive(Clone)]
pub struct WebDriverSession {
    driver: WebDriver,
}

impl WebDriverSession {
    /// Start a visible Chrome window whose downloads land in `download_dir`.
    ///
    /// Chrome requires an absolute download directory.
    pub async fn launch(webdriver_url: &str, download_dir: &Path) -> Result<Self, BrowserError> {
        let mut caps = DesiredCapabilities::chrome();
        caps.add_experimental_option(
            "prefs",
            json!({
                "download.default_directory": download_dir.to_string_lossy(),
                "download.prompt_for_download": false,
            }),
        )
        .map_err(startup)?;

        let driver = WebDriver::new(webdriver_url, caps).await.map_err(startup)?;
        Ok(Self { driver })
    }

    async fn find(&self, locator: &Locator) -> Result<WebElement, BrowserError> {
        self.driver
            .find(by(locator))
            .await
            .map_err(|err| BrowserError::ElementMissing {
                locator: locator.clone(),
                message: err.to_string(),
            })
    }
}

impl std::fmt::Debug for WebDriverSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebDriverSession").finish_non_exhaustive()
    }
}

#[async_trait]
impl PortalSession for WebDriverSession {
    async fn open(&self, url: &str) -> Result<(), BrowserError> {
        self.driver
            .goto(url)
            .await
            .map_err(|err| BrowserError::Navigation {
                url: url.to_string(),
                message: err.to_string(),
            })
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        let url = self.driver.current_url().await.map_err(command)?;
        Ok(url.to_string())
    }

    async fn is_present(&self, locator: &Locator) -> Result<bool, BrowserError> {
        let elements = self.driver.find_all(by(locator)).await.map_err(command)?;
        Ok(!elements.is_empty())
    }

    async fn is_clickable(&self, locator: &Locator) -> Result<bool, BrowserError> {
        let elements = self.driver.find_all(by(locator)).await.map_err(command)?;
        match elements.first() {
            Some(element) => element.is_clickable().await.map_err(command),
            None => Ok(false),
        }
    }

    async fn fill(&self, locator: &Locator, text: &str) -> Result<(), BrowserError> {
        let element = self.find(locator).await?;
        element.clear().await.map_err(command)?;
        element.send_keys(text).await.map_err(command)
    }

    async fn press_enter(&self, locator: &Locator) -> Result<(), BrowserError> {
        let element = self.find(locator).await?;
        element.send_keys(Key::Enter).await.map_err(command)
    }

    async fn click(&self, locator: &Locator) -> Result<(), BrowserError> {
        let element = self.find(locator).await?;
        element.click().await.map_err(command)
    }

    async fn close(&self) -> Result<(), BrowserError> {
        self.driver.clone().quit().await.map_err(command)
    }
}

fn by(locator: &Locator) -> By {
    match locator {
        Locator::Name(value) => By::Name(value.clone()),
        Locator::Id(value) => By::Id(value.clone()),
        Locator::Css(value) => By::Css(value.clone()),
        Locator::XPath(value) => By::XPath(value.clone()),
    }
}

fn startup(err: WebDriverError) -> BrowserError {
    BrowserError::Startup(err.to_string())
}

fn command(err: WebDriverError) -> BrowserError {
    BrowserError::Command(err.to_string())
}

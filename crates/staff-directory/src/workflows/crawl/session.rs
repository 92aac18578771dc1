use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;

/// How to find one element on a portal page.
///
/// Parsed from `strategy=value`, e.g. `name=department` or
/// `xpath=//button[contains(text(), 'Export Results as CSV')]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Name(String),
    Id(String),
    Css(String),
    XPath(String),
}

impl FromStr for Locator {
    type Err = LocatorParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (strategy, value) = raw
            .split_once('=')
            .ok_or_else(|| LocatorParseError::MissingStrategy(raw.to_string()))?;
        let value = value.trim();
        if value.is_empty() {
            return Err(LocatorParseError::EmptyValue(raw.to_string()));
        }

        let value = value.to_string();
        match strategy.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name(value)),
            "id" => Ok(Self::Id(value)),
            "css" => Ok(Self::Css(value)),
            "xpath" => Ok(Self::XPath(value)),
            other => Err(LocatorParseError::UnknownStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Name(value) => write!(f, "name={value}"),
            Locator::Id(value) => write!(f, "id={value}"),
            Locator::Css(value) => write!(f, "css={value}"),
            Locator::XPath(value) => write!(f, "xpath={value}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocatorParseError {
    #[error("selector '{0}' must look like strategy=value")]
    MissingStrategy(String),
    #[error("selector '{0}' has an empty value")]
    EmptyValue(String),
    #[error("unknown selector strategy '{0}' (expected name, id, css or xpath)")]
    UnknownStrategy(String),
}

/// Failure reported by the browser backend.
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error("could not start browser session: {0}")]
    Startup(String),
    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },
    #[error("element {locator} not found: {message}")]
    ElementMissing { locator: Locator, message: String },
    #[error("browser command failed: {0}")]
    Command(String),
}

/// The handful of browser operations the crawl needs.
///
/// The production implementation drives a real browser over WebDriver; tests
/// substitute a scripted session.
#[async_trait]
pub trait PortalSession: Send + Sync {
    async fn open(&self, url: &str) -> Result<(), BrowserError>;

    async fn current_url(&self) -> Result<String, BrowserError>;

    /// Whether an element matching `locator` is currently in the DOM.
    async fn is_present(&self, locator: &Locator) -> Result<bool, BrowserError>;

    /// Whether the element is present, displayed and enabled.
    async fn is_clickable(&self, locator: &Locator) -> Result<bool, BrowserError>;

    /// Clear the field and type `text` into it.
    async fn fill(&self, locator: &Locator, text: &str) -> Result<(), BrowserError>;

    async fn press_enter(&self, locator: &Locator) -> Result<(), BrowserError>;

    async fn click(&self, locator: &Locator) -> Result<(), BrowserError>;

    /// End the browser session. Called once, after which the session is unusable.
    async fn close(&self) -> Result<(), BrowserError>;
}

#[async_trait]
impl<T> PortalSession for Arc<T>
where
    T: PortalSession + ?Sized,
{
    async fn open(&self, url: &str) -> Result<(), BrowserError> {
        (**self).open(url).await
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        (**self).current_url().await
    }

    async fn is_present(&self, locator: &Locator) -> Result<bool, BrowserError> {
        (**self).is_present(locator).await
    }

    async fn is_clickable(&self, locator: &Locator) -> Result<bool, BrowserError> {
        (**self).is_clickable(locator).await
    }

    async fn fill(&self, locator: &Locator, text: &str) -> Result<(), BrowserError> {
        (**self).fill(locator, text).await
    }

    async fn press_enter(&self, locator: &Locator) -> Result<(), BrowserError> {
        (**self).press_enter(locator).await
    }

    async fn click(&self, locator: &Locator) -> Result<(), BrowserError> {
        (**self).click(locator).await
    }

    async fn close(&self) -> Result<(), BrowserError> {
        (**self).close().await
    }
}

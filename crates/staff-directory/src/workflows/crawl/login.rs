use tracing::{debug, info, warn};

use super::session::{BrowserError, PortalSession};
use super::wait::{poll_until, WaitPolicy};
use crate::config::PortalConfig;

/// Progress of the interactive sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    /// The operator is still working through the identity provider.
    AwaitingLogin,
    /// The browser reached the portal's search page.
    Ready,
    /// The operator never finished within the login timeout.
    TimedOut,
}

impl LoginState {
    /// Feed the browser's current location into the machine.
    pub fn observe(self, location: &str, search_url: &str) -> Self {
        match self {
            LoginState::AwaitingLogin if location.contains(search_url) => LoginState::Ready,
            other => other,
        }
    }

    /// The login window closed without reaching the search page.
    pub fn expire(self) -> Self {
        match self {
            LoginState::AwaitingLogin => LoginState::TimedOut,
            other => other,
        }
    }
}

/// Open the sign-in page and block until the operator lands on the search page
/// or the policy's timeout elapses.
///
/// Only a failure to open the sign-in page is an error; every other outcome is
/// reported through the returned state.
pub async fn await_login<S>(
    session: &S,
    portal: &PortalConfig,
    policy: WaitPolicy,
) -> Result<LoginState, BrowserError>
where
    S: PortalSession + ?Sized,
{
    session.open(&portal.login_url).await?;
    info!(
        timeout = ?policy.timeout,
        "sign in manually in the browser window (password and second factor); \
         the crawl resumes once the directory search page loads"
    );

    let search_url = portal.search_url.as_str();
    let state = LoginState::AwaitingLogin;
    let outcome = poll_until(policy, move || async move {
        match session.current_url().await {
            Ok(location) => match state.observe(&location, search_url) {
                LoginState::Ready => Some(LoginState::Ready),
                _ => None,
            },
            Err(err) => {
                debug!(error = %err, "could not read browser location");
                None
            }
        }
    })
    .await;

    match outcome {
        Ok(ready) => {
            info!("login detected, starting automated downloads");
            Ok(ready)
        }
        Err(timeout) => {
            warn!(%timeout, "search page never loaded");
            Ok(state.expire())
        }
    }
}

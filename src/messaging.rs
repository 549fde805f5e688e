//! The action-tagged message contract between the pane UI and the engine.
//!
//! Requests arrive as JSON objects tagged by `action`. Every request,
//! including one that fails to decode, yields exactly one response.

use crate::base::syncerror::SyncError;
use crate::cookies::record::CookieRecord;
use crate::sync::domains::strip_www;
use crate::sync::orchestrator::{SyncOrchestrator, SyncResult};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    GetTabs,
    GetBookmarks,
    #[serde(rename_all = "camelCase")]
    SyncCookies { domain: String, target_url: String },
    #[serde(rename_all = "camelCase")]
    AdvancedSessionSync {
        domain: String,
        target_url: String,
        #[serde(default)]
        session_cookies: Vec<CookieRecord>,
        #[serde(default)]
        all_cookies: Vec<CookieRecord>,
    },
    GetDomainCookies { domain: String },
}

impl Request {
    pub fn action(&self) -> &'static str {
        match self {
            Request::GetTabs => "getTabs",
            Request::GetBookmarks => "getBookmarks",
            Request::SyncCookies { .. } => "syncCookies",
            Request::AdvancedSessionSync { .. } => "advancedSessionSync",
            Request::GetDomainCookies { .. } => "getDomainCookies",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fav_icon_url: Option<String>,
}

/// A bookmark with a URL, as flattened by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub url: String,
    /// Unix milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_added: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl Bookmark {
    /// The title, or the www-stripped host when the bookmark has none.
    pub fn display_title(&self) -> String {
        if !self.title.is_empty() {
            return self.title.clone();
        }
        Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(strip_www))
            .unwrap_or_else(|| self.url.clone())
    }
}

/// Alias for the `Future` type returned by browser host operations.
pub type HostFuture<'a, T> = BoxFuture<'a, Result<T, SyncError>>;

/// Tab and bookmark enumeration provided by the browser.
pub trait BrowserHost: Send + Sync {
    fn tabs(&self) -> HostFuture<'_, Vec<TabInfo>>;
    fn bookmarks(&self) -> HostFuture<'_, Vec<Bookmark>>;
}

impl<H: BrowserHost + ?Sized> BrowserHost for Arc<H> {
    fn tabs(&self) -> HostFuture<'_, Vec<TabInfo>> {
        (**self).tabs()
    }

    fn bookmarks(&self) -> HostFuture<'_, Vec<Bookmark>> {
        (**self).bookmarks()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub success: bool,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Tabs(Vec<TabInfo>),
    Bookmarks(Vec<Bookmark>),
    Sync(SyncResult),
    Cookies(Vec<CookieRecord>),
    Failure(Failure),
}

impl Response {
    pub fn failure(error: &SyncError) -> Self {
        Response::Failure(Failure {
            success: false,
            error: error.to_string(),
        })
    }

    pub fn is_failure(&self) -> bool {
        match self {
            Response::Failure(_) => true,
            Response::Sync(result) => !result.success,
            _ => false,
        }
    }
}

pub struct MessageRouter {
    orchestrator: Arc<SyncOrchestrator>,
    host: Arc<dyn BrowserHost>,
}

impl MessageRouter {
    pub fn new(orchestrator: Arc<SyncOrchestrator>, host: Arc<dyn BrowserHost>) -> Self {
        Self { orchestrator, host }
    }

    pub async fn dispatch(&self, request: Request) -> Response {
        let action = request.action();
        tracing::debug!(action, "dispatching");

        let response = match request {
            Request::GetTabs => self.host.tabs().await.map(Response::Tabs),
            Request::GetBookmarks => self.host.bookmarks().await.map(Response::Bookmarks),
            Request::SyncCookies { domain, target_url } => Ok(Response::Sync(
                self.orchestrator.basic_sync(&domain, &target_url).await,
            )),
            Request::AdvancedSessionSync {
                domain,
                target_url,
                session_cookies,
                all_cookies,
            } => Ok(Response::Sync(
                self.orchestrator
                    .apply_session(&domain, &target_url, &session_cookies, &all_cookies)
                    .await,
            )),
            Request::GetDomainCookies { domain } => self
                .orchestrator
                .get_domain_cookies(&domain)
                .await
                .map(Response::Cookies),
        };

        response.unwrap_or_else(|e| {
            tracing::warn!(action, error = %e, "request failed");
            Response::failure(&e)
        })
    }

    /// Decode, dispatch and encode one message.
    pub async fn handle_json(&self, message: &str) -> String {
        let response = match serde_json::from_str::<Request>(message) {
            Ok(request) => self.dispatch(request).await,
            Err(e) => Response::failure(&SyncError::from(e)),
        };

        serde_json::to_string(&response).unwrap_or_else(|e| {
            format!(
                r#"{{"success":false,"error":{}}}"#,
                serde_json::Value::String(e.to_string())
            )
        })
    }
}

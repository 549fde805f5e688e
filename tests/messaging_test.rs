use serde_json::{json, Value};
use splitsync::base::syncerror::SyncError;
use splitsync::config::SyncConfig;
use splitsync::cookies::memory::MemoryCookieStore;
use splitsync::cookies::record::CookieRecord;
use splitsync::messaging::{Bookmark, BrowserHost, HostFuture, MessageRouter, Request, TabInfo};
use splitsync::sync::SyncOrchestrator;
use std::sync::Arc;

struct FakeHost {
    bookmarks_fail: bool,
}

impl BrowserHost for FakeHost {
    fn tabs(&self) -> HostFuture<'_, Vec<TabInfo>> {
        Box::pin(async {
            Ok(vec![TabInfo {
                id: 7,
                title: "Inbox".to_string(),
                url: "https://app.example.com/".to_string(),
                fav_icon_url: None,
            }])
        })
    }

    fn bookmarks(&self) -> HostFuture<'_, Vec<Bookmark>> {
        let fail = self.bookmarks_fail;
        Box::pin(async move {
            if fail {
                return Err(SyncError::storage_failed("bookmarks locked"));
            }
            Ok(vec![Bookmark {
                id: "b1".to_string(),
                title: String::new(),
                url: "https://www.example.org/docs".to_string(),
                date_added: Some(1_700_000_000_000),
                parent_id: None,
            }])
        })
    }
}

fn router(bookmarks_fail: bool) -> (Arc<MemoryCookieStore>, MessageRouter) {
    let store = Arc::new(MemoryCookieStore::new());
    store.set_record(CookieRecord::new("sessionid", "abc", "example.com"));
    let orchestrator = Arc::new(SyncOrchestrator::new(store.clone(), &SyncConfig::default()));
    (store, MessageRouter::new(orchestrator, Arc::new(FakeHost { bookmarks_fail })))
}

async fn ask(router: &MessageRouter, message: Value) -> Value {
    let reply = router.handle_json(&message.to_string()).await;
    serde_json::from_str(&reply).unwrap()
}

#[tokio::test]
async fn test_get_tabs() {
    let (_, router) = router(false);
    let reply = ask(&router, json!({"action": "getTabs"})).await;
    assert_eq!(reply[0]["id"], 7);
    assert_eq!(reply[0]["url"], "https://app.example.com/");
    assert!(reply[0].get("favIconUrl").is_none());
}

#[tokio::test]
async fn test_get_bookmarks() {
    let (_, router) = router(false);
    let reply = ask(&router, json!({"action": "getBookmarks"})).await;
    assert_eq!(reply[0]["dateAdded"], 1_700_000_000_000i64);

    let bookmark: Bookmark = serde_json::from_value(reply[0].clone()).unwrap();
    assert_eq!(bookmark.display_title(), "example.org");
}

#[tokio::test]
async fn test_host_failure_becomes_failure_response() {
    let (_, router) = router(true);
    let reply = ask(&router, json!({"action": "getBookmarks"})).await;
    assert_eq!(reply["success"], false);
    assert!(reply["error"].as_str().unwrap().contains("bookmarks locked"));
}

#[tokio::test]
async fn test_sync_cookies() {
    let (store, router) = router(false);
    let reply = ask(
        &router,
        json!({"action": "syncCookies", "domain": "example.com", "targetUrl": "https://app.example.com/"}),
    )
    .await;

    assert_eq!(reply["success"], true);
    assert_eq!(reply["syncedCount"], 1);
    assert!(reply.get("error").is_none());
    assert_eq!(store.cookies_for_domain("app.example.com").len(), 1);
}

#[tokio::test]
async fn test_advanced_session_sync() {
    let (store, router) = router(false);
    let session = json!({"name": "sid", "value": "1", "domain": "example.com", "path": "/"});
    let other = json!({"name": "theme", "value": "dark", "domain": "example.com", "path": "/"});

    let reply = ask(
        &router,
        json!({
            "action": "advancedSessionSync",
            "domain": "example.com",
            "targetUrl": "https://app.example.com/",
            "sessionCookies": [session.clone()],
            "allCookies": [session, other],
        }),
    )
    .await;

    assert_eq!(reply["success"], true);
    assert_eq!(reply["totalCount"], 2);
    assert_eq!(reply["syncedCount"], 2);
    assert_eq!(store.cookies_for_domain("app.example.com").len(), 2);
}

#[tokio::test]
async fn test_far_future_expiration_does_not_sink_batch() {
    let (store, router) = router(false);
    let far = json!({
        "name": "sid", "value": "1", "domain": "example.com", "path": "/",
        "expirationDate": 253402300800.0
    });
    let normal = json!({
        "name": "theme", "value": "dark", "domain": "example.com", "path": "/",
        "expirationDate": 4102444800.0
    });
    let message = json!({
        "action": "advancedSessionSync",
        "domain": "example.com",
        "targetUrl": "https://app.example.com/",
        "sessionCookies": [far.clone()],
        "allCookies": [far, normal],
    });

    match serde_json::from_value::<Request>(message.clone()).unwrap() {
        Request::AdvancedSessionSync { all_cookies, .. } => {
            assert_eq!(all_cookies.len(), 2);
            assert!(all_cookies.iter().all(|c| c.expiration_date.is_some()));
        }
        other => panic!("unexpected request {:?}", other),
    }

    let reply = ask(&router, message).await;
    assert_eq!(reply["success"], true);
    assert_eq!(reply["totalCount"], 2);
    assert_eq!(reply["syncedCount"], 2);
    assert_eq!(store.cookies_for_domain("app.example.com").len(), 2);
}

#[tokio::test]
async fn test_get_domain_cookies() {
    let (_, router) = router(false);
    let reply = ask(&router, json!({"action": "getDomainCookies", "domain": "www.example.com"})).await;
    let cookies = reply.as_array().unwrap();
    assert_eq!(cookies.len(), 1);
    assert_eq!(cookies[0]["name"], "sessionid");
    assert_eq!(cookies[0]["httpOnly"], false);
}

#[tokio::test]
async fn test_invalid_target_is_reported() {
    let (_, router) = router(false);
    let reply = ask(
        &router,
        json!({"action": "syncCookies", "domain": "example.com", "targetUrl": "not a url"}),
    )
    .await;
    assert_eq!(reply["success"], false);
    assert_eq!(reply["error"], SyncError::InvalidTargetUrl.to_string());
}

#[tokio::test]
async fn test_malformed_messages_get_one_failure_each() {
    let (_, router) = router(false);
    for message in ["", "{", r#"{"action": "launchRockets"}"#, r#"{"action": "syncCookies"}"#] {
        let reply: Value = serde_json::from_str(&router.handle_json(message).await).unwrap();
        assert_eq!(reply["success"], false, "{}", message);
        assert!(reply["error"].as_str().unwrap().starts_with("Malformed message"));
    }
}

#[tokio::test]
async fn test_dispatch_typed_request() {
    let (_, router) = router(false);
    let request = Request::GetDomainCookies {
        domain: "".to_string(),
    };
    assert_eq!(request.action(), "getDomainCookies");
    assert!(router.dispatch(request).await.is_failure());
}

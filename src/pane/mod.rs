//! The secondary pane's navigation flow.
//!
//! One [`SplitPane`] drives one embedded frame:
//!
//! 1. normalize the input and record it in history
//! 2. pre-sync the session unless the destination is a static site
//! 3. offer alternatives for providers that refuse framing
//! 4. load, racing the host's load signal against a timeout
//! 5. validate, spending at most one forced-sync retry per navigation
//! 6. fall back to a view with a manual escape on failure
//!
//! Frame events and timer expiries arrive on one internal channel, tagged
//! with the [`Generation`] that armed them. Starting a new navigation makes
//! every earlier signal stale.

pub mod timer;

use crate::base::syncerror::SyncError;
use crate::config::SyncConfig;
use crate::history::{HistoryEntry, KeyValueStore, NavigationHistory};
use crate::render::fallback::{FallbackReason, FallbackView, RenderFallbackController};
use crate::render::frame::{EmbeddingFrame, FrameEvent};
use crate::sync::orchestrator::{SyncOrchestrator, SyncResult};
use crate::sync::registry::AlternativeRoute;
use crate::sync::validator::{cache_bust, RetryBudget, SessionValidator, Verdict};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use time::OffsetDateTime;
use timer::{DelayedTask, Generation, NavigationTracker};
use tokio::sync::mpsc;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
enum PaneSignal {
    Frame {
        generation: Generation,
        event: FrameEvent,
    },
    LoadTimeout {
        generation: Generation,
    },
    /// A new navigation started; waiters re-check their generation.
    Wake,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    Loaded {
        url: Url,
        retried: bool,
        sync: Option<SyncResult>,
    },
    Fallback {
        url: Url,
        view: FallbackView,
    },
    /// A later navigation replaced this one before it finished.
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlternativeOutcome {
    Rendered { url: Url },
    Failed(FallbackView),
    Superseded,
}

enum LoadResult {
    Loaded,
    Failed(FallbackReason),
    Superseded,
}

/// Turn address-bar input into a URL.
///
/// Input with a scheme is parsed as-is; input with a dot and no spaces gets
/// `https://`; anything else becomes a query on `search_url`.
pub fn normalize_input(input: &str, search_url: &str) -> Result<Url, SyncError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(SyncError::InvalidTargetUrl);
    }

    if input.starts_with("http://") || input.starts_with("https://") {
        return Ok(Url::parse(input)?);
    }

    if input.contains('.') && !input.contains(' ') {
        return Ok(Url::parse(&format!("https://{}", input))?);
    }

    let query: String = url::form_urlencoded::byte_serialize(input.as_bytes()).collect();
    Ok(Url::parse(&format!("{}{}", search_url, query))?)
}

pub struct SplitPane {
    config: SyncConfig,
    orchestrator: Arc<SyncOrchestrator>,
    validator: SessionValidator,
    fallback: RenderFallbackController,
    frame: Arc<dyn EmbeddingFrame>,
    history: Mutex<NavigationHistory>,
    tracker: NavigationTracker,
    page_host: String,
    signals: mpsc::UnboundedSender<PaneSignal>,
    inbox: tokio::sync::Mutex<mpsc::UnboundedReceiver<PaneSignal>>,
}

impl SplitPane {
    /// `page_host` is the primary pane's host; it seeds advanced collection.
    pub fn new(
        config: SyncConfig,
        orchestrator: Arc<SyncOrchestrator>,
        frame: Arc<dyn EmbeddingFrame>,
        storage: Arc<dyn KeyValueStore>,
        page_host: &str,
    ) -> Self {
        let (signals, inbox) = mpsc::unbounded_channel();
        let validator = SessionValidator::new(config.login_indicators.clone(), config.settle_delay());
        let fallback = RenderFallbackController::new(
            Arc::new(orchestrator.registry().clone()),
            config.attempt_policy(),
        );
        let history = NavigationHistory::load(storage, config.history_capacity);

        Self {
            config,
            orchestrator,
            validator,
            fallback,
            frame,
            history: Mutex::new(history),
            tracker: NavigationTracker::new(),
            page_host: page_host.to_lowercase(),
            signals,
            inbox: tokio::sync::Mutex::new(inbox),
        }
    }

    pub fn orchestrator(&self) -> &Arc<SyncOrchestrator> {
        &self.orchestrator
    }

    pub fn fallback(&self) -> &RenderFallbackController {
        &self.fallback
    }

    pub fn generation(&self) -> Generation {
        self.tracker.current()
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries()
            .to_vec()
    }

    /// Load signal from the host. Dropped unless a load is armed for the
    /// current navigation.
    pub fn on_frame_event(&self, event: FrameEvent) {
        match self.tracker.armed() {
            Some(generation) => {
                let _ = self.signals.send(PaneSignal::Frame { generation, event });
            }
            None => tracing::debug!(event = ?event, "dropping frame event, no load armed"),
        }
    }

    pub async fn navigate(&self, input: &str) -> Result<NavigationOutcome, SyncError> {
        let url = normalize_input(input, &self.config.search_url)?;
        let host = url.host_str().ok_or(SyncError::InvalidTargetUrl)?.to_string();
        let generation = self.begin();
        self.record_history(&url);

        let needs_sync = self.config.needs_session_sync(&host);
        tracing::info!(url = %url, generation = generation.get(), needs_sync, "navigating");

        let mut sync = None;
        if needs_sync {
            let result = self
                .orchestrator
                .advanced_sync(&host, url.as_str(), &self.page_host)
                .await;
            if !result.success {
                tracing::warn!(host = %host, error = ?result.error, "pre-sync failed, loading anyway");
            }
            sync = Some(result);
            if !self.tracker.is_current(generation) {
                return Ok(NavigationOutcome::Superseded);
            }
        }

        if let Some(view) = self.fallback.blocked_view(&url) {
            return Ok(NavigationOutcome::Fallback { url, view });
        }

        if needs_sync && !self.pause(generation, self.config.propagation_delay()).await {
            return Ok(NavigationOutcome::Superseded);
        }

        match self.load(generation, &url, self.config.load_timeout()).await {
            LoadResult::Loaded => {}
            LoadResult::Failed(reason) => return Ok(self.failed(url, reason)),
            LoadResult::Superseded => return Ok(NavigationOutcome::Superseded),
        }

        if !needs_sync {
            return Ok(NavigationOutcome::Loaded {
                url,
                retried: false,
                sync,
            });
        }

        let verdict = self.validator.validate(self.frame.as_ref()).await;
        if !self.tracker.is_current(generation) {
            return Ok(NavigationOutcome::Superseded);
        }

        let mut budget = RetryBudget::new();
        if verdict == Verdict::Verified || !budget.take() {
            return Ok(NavigationOutcome::Loaded {
                url,
                retried: false,
                sync,
            });
        }

        tracing::info!(url = %url, "session unverified, retrying with forced sync");
        if !self.pause(generation, self.config.retry_delay()).await {
            return Ok(NavigationOutcome::Superseded);
        }

        let forced = self
            .orchestrator
            .force_sync(&host, url.as_str(), &self.page_host)
            .await;
        if !self.tracker.is_current(generation) {
            return Ok(NavigationOutcome::Superseded);
        }

        // The retried load is accepted without another validation.
        let busted = cache_bust(&url, now_millis());
        match self.load(generation, &busted, self.config.load_timeout()).await {
            LoadResult::Loaded => Ok(NavigationOutcome::Loaded {
                url: busted,
                retried: true,
                sync: Some(forced),
            }),
            LoadResult::Failed(reason) => Ok(self.failed(url, reason)),
            LoadResult::Superseded => Ok(NavigationOutcome::Superseded),
        }
    }

    /// Try one delivery route of a framing-blocking provider.
    pub async fn attempt_alternative(
        &self,
        route: &AlternativeRoute,
        original: &Url,
    ) -> Result<AlternativeOutcome, SyncError> {
        let target = self.fallback.resolve_route(route, original)?;
        let generation = self.begin();
        let policy = self.fallback.policy();
        tracing::info!(route = %route.label, url = %target, "trying alternative route");

        match self.load(generation, &target, policy.timeout).await {
            LoadResult::Loaded => {}
            LoadResult::Failed(_) => {
                return Ok(AlternativeOutcome::Failed(
                    self.fallback.alternative_failed(route, original),
                ))
            }
            LoadResult::Superseded => return Ok(AlternativeOutcome::Superseded),
        }

        if !self.pause(generation, policy.settle).await {
            return Ok(AlternativeOutcome::Superseded);
        }

        if self.fallback.rendered(self.frame.as_ref()) {
            Ok(AlternativeOutcome::Rendered { url: target })
        } else {
            Ok(AlternativeOutcome::Failed(
                self.fallback.alternative_failed(route, original),
            ))
        }
    }

    /// Back to the route list after a failed alternative.
    pub fn try_another(&self, original: &Url) -> FallbackView {
        self.fallback.try_another(original)
    }

    fn begin(&self) -> Generation {
        let generation = self.tracker.begin();
        let _ = self.signals.send(PaneSignal::Wake);
        generation
    }

    fn record_history(&self, url: &Url) {
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = history.record(url, None) {
            tracing::warn!(error = %e, "failed to persist navigation history");
        }
    }

    fn failed(&self, url: Url, reason: FallbackReason) -> NavigationOutcome {
        let view = self.fallback.on_failure(&url, reason);
        NavigationOutcome::Fallback { url, view }
    }

    /// Sleep, then report whether `generation` is still the active navigation.
    async fn pause(&self, generation: Generation, delay: Duration) -> bool {
        tokio::time::sleep(delay).await;
        self.tracker.is_current(generation)
    }

    /// Point the frame at `url` and wait for its load, error or timeout.
    async fn load(&self, generation: Generation, url: &Url, timeout: Duration) -> LoadResult {
        let mut inbox = self.inbox.lock().await;
        while inbox.try_recv().is_ok() {}

        if !self.tracker.is_current(generation) {
            return LoadResult::Superseded;
        }

        self.tracker.arm(generation);
        if let Err(e) = self.frame.set_address(url) {
            self.tracker.disarm(generation);
            return LoadResult::Failed(FallbackReason::LoadError(e.to_string()));
        }

        let signals = self.signals.clone();
        let timer = DelayedTask::spawn(timeout, async move {
            let _ = signals.send(PaneSignal::LoadTimeout { generation });
        });

        let result = loop {
            let Some(signal) = inbox.recv().await else {
                break LoadResult::Superseded;
            };
            if !self.tracker.is_current(generation) {
                break LoadResult::Superseded;
            }

            match signal {
                PaneSignal::Frame { generation: g, event } if g == generation => match event {
                    FrameEvent::Loaded => break LoadResult::Loaded,
                    FrameEvent::Error(reason) => break LoadResult::Failed(FallbackReason::LoadError(reason)),
                },
                PaneSignal::LoadTimeout { generation: g } if g == generation => {
                    tracing::warn!(url = %url, "load timed out");
                    break LoadResult::Failed(FallbackReason::Timeout);
                }
                PaneSignal::Wake => {}
                stale => tracing::debug!(signal = ?stale, "discarding stale signal"),
            }
        };

        timer.cancel();
        self.tracker.disarm(generation);
        result
    }
}

fn now_millis() -> u128 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000).max(0) as u128
}

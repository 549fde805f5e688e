//! Sync orchestration.
//!
//! The orchestrator sequences collection, classification, rewriting and
//! application for one pane. Advanced and forced syncs are serialized by a
//! phase guard: a request that arrives while another is running is dropped
//! and reported as [`SyncError::SyncInFlight`].

use crate::base::context::StoreResultExt;
use crate::base::syncerror::SyncError;
use crate::base::syncphase::SyncPhase;
use crate::config::SyncConfig;
use crate::cookies::record::{CookieKey, CookieRecord};
use crate::cookies::store::CookieStore;
use crate::sync::classifier::CookieClassifier;
use crate::sync::collector::CookieCollector;
use crate::sync::domains::strip_www;
use crate::sync::registry::ProviderRegistry;
use crate::sync::rewriter::{apply_with_fallback, ApplyOutcome, RewritePolicy};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStrategy {
    #[default]
    Basic,
    Advanced,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub source_domain: String,
    pub target_url: String,
    #[serde(default)]
    pub strategy: SyncStrategy,
}

impl SyncRequest {
    pub fn new(source_domain: &str, target_url: &str, strategy: SyncStrategy) -> Self {
        Self {
            source_domain: source_domain.to_string(),
            target_url: target_url.to_string(),
            strategy,
        }
    }
}

/// Outcome of one sync invocation.
///
/// `synced_count` counts cookies that reached the store (primary or fallback
/// write); `reapplied_count` counts special-domain re-applications.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub success: bool,
    pub synced_count: usize,
    pub total_count: usize,
    pub reapplied_count: usize,
    #[serde(serialize_with = "error_string", skip_serializing_if = "Option::is_none")]
    pub error: Option<SyncError>,
}

impl SyncResult {
    pub fn failed(error: SyncError) -> Self {
        Self {
            success: false,
            error: Some(error),
            ..Self::default()
        }
    }

    fn completed(tally: Tally) -> Self {
        Self {
            success: true,
            synced_count: tally.synced,
            total_count: tally.total,
            reapplied_count: tally.reapplied,
            error: None,
        }
    }
}

fn error_string<S: Serializer>(error: &Option<SyncError>, serializer: S) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_str(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    synced: usize,
    total: usize,
    reapplied: usize,
}

impl Tally {
    fn absorb(&mut self, other: Tally) {
        self.synced += other.synced;
        self.total += other.total;
        self.reapplied += other.reapplied;
    }
}

/// Holds the orchestrator's phase for the duration of one guarded sync.
/// Dropping it returns the phase to `Idle`, including on early return.
struct PhaseGuard<'a> {
    phase: &'a Mutex<SyncPhase>,
}

impl<'a> PhaseGuard<'a> {
    fn try_enter(phase: &'a Mutex<SyncPhase>, first: SyncPhase) -> Option<Self> {
        let mut current = lock(phase);
        if !current.is_idle() {
            return None;
        }
        *current = first;
        Some(Self { phase })
    }

    fn advance(&self, next: SyncPhase) {
        let mut current = lock(self.phase);
        tracing::trace!(from = ?*current, to = ?next, "sync phase");
        *current = next;
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        *lock(self.phase) = SyncPhase::Idle;
    }
}

fn lock(phase: &Mutex<SyncPhase>) -> MutexGuard<'_, SyncPhase> {
    phase.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct SyncOrchestrator {
    store: Arc<dyn CookieStore>,
    collector: CookieCollector,
    classifier: CookieClassifier,
    registry: Arc<ProviderRegistry>,
    phase: Mutex<SyncPhase>,
}

impl SyncOrchestrator {
    pub fn new(store: Arc<dyn CookieStore>, config: &SyncConfig) -> Self {
        let registry = Arc::new(config.registry());
        let collector = CookieCollector::new(
            store.clone(),
            registry.clone(),
            config.common_subdomains.clone(),
        );
        let classifier = CookieClassifier::new(config.important_patterns.clone(), config.expiry_window());

        Self {
            store,
            collector,
            classifier,
            registry,
            phase: Mutex::new(SyncPhase::Idle),
        }
    }

    /// Current phase; `Idle` when no guarded sync is running.
    pub fn phase(&self) -> SyncPhase {
        *lock(&self.phase)
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Run `request`; `page_host` seeds the advanced domain set.
    pub async fn run(&self, request: &SyncRequest, page_host: &str) -> SyncResult {
        match request.strategy {
            SyncStrategy::Basic => self.basic_sync(&request.source_domain, &request.target_url).await,
            SyncStrategy::Advanced => {
                self.advanced_sync(&request.source_domain, &request.target_url, page_host)
                    .await
            }
        }
    }

    /// Replicate one domain's cookies with the ordinary policy.
    pub async fn basic_sync(&self, domain: &str, target_url: &str) -> SyncResult {
        let result = self.try_basic_sync(domain, target_url).await;
        self.finish("basic", domain, result)
    }

    /// Apply an already-classified session list and the full cookie list.
    ///
    /// Session cookies go first with the session-priority policy. The
    /// ordinary pass then skips every (name, domain) the session pass
    /// covered. Last, cookies interesting to a matching provider profile are
    /// re-applied with the session-priority policy.
    pub async fn apply_session(
        &self,
        domain: &str,
        target_url: &str,
        session_cookies: &[CookieRecord],
        all_cookies: &[CookieRecord],
    ) -> SyncResult {
        let Some(guard) = PhaseGuard::try_enter(&self.phase, SyncPhase::ApplyingSession) else {
            return self.dropped(domain);
        };

        let result = self
            .try_apply_session(&guard, domain, target_url, session_cookies, all_cookies)
            .await;

        drop(guard);
        self.finish("session", domain, result)
    }

    /// Collect across the widened domain set, classify, then apply in passes.
    pub async fn advanced_sync(&self, domain: &str, target_url: &str, page_host: &str) -> SyncResult {
        self.guarded_sync(domain, target_url, page_host, false).await
    }

    /// Like [`advanced_sync`](Self::advanced_sync), but every collected
    /// cookie is applied with the session-priority policy.
    pub async fn force_sync(&self, domain: &str, target_url: &str, page_host: &str) -> SyncResult {
        self.guarded_sync(domain, target_url, page_host, true).await
    }

    /// Raw enumeration for `domain`.
    pub async fn get_domain_cookies(&self, domain: &str) -> Result<Vec<CookieRecord>, SyncError> {
        let domain = source_domain(domain)?;
        self.store.get_all(&domain).await.fetch_context(&domain)
    }

    async fn guarded_sync(&self, domain: &str, target_url: &str, page_host: &str, force: bool) -> SyncResult {
        let Some(guard) = PhaseGuard::try_enter(&self.phase, SyncPhase::Collecting) else {
            return self.dropped(domain);
        };

        let result = self
            .try_guarded_sync(&guard, domain, target_url, page_host, force)
            .await;

        drop(guard);
        self.finish(if force { "forced" } else { "advanced" }, domain, result)
    }

    async fn try_basic_sync(&self, domain: &str, target_url: &str) -> Result<Tally, SyncError> {
        let domain = source_domain(domain)?;
        let target = Url::parse(target_url)?;

        let cookies = self.collector.collect_basic(&domain).await;
        self.apply_pass(cookies.iter(), &target, RewritePolicy::Ordinary)
            .await
    }

    async fn try_apply_session(
        &self,
        guard: &PhaseGuard<'_>,
        domain: &str,
        target_url: &str,
        session_cookies: &[CookieRecord],
        all_cookies: &[CookieRecord],
    ) -> Result<Tally, SyncError> {
        let domain = source_domain(domain)?;
        let target = Url::parse(target_url)?;
        self.run_passes(guard, &domain, &target, session_cookies, all_cookies)
            .await
    }

    async fn try_guarded_sync(
        &self,
        guard: &PhaseGuard<'_>,
        domain: &str,
        target_url: &str,
        page_host: &str,
        force: bool,
    ) -> Result<Tally, SyncError> {
        let domain = source_domain(domain)?;
        let target = Url::parse(target_url)?;

        let cookies = self.collector.collect_advanced(&domain, page_host).await;

        guard.advance(SyncPhase::Classifying);
        let session = if force {
            cookies.clone()
        } else {
            self.classifier.classify(&cookies).important
        };
        tracing::debug!(
            domain = %domain,
            session = session.len(),
            total = cookies.len(),
            force,
            "classified"
        );

        guard.advance(SyncPhase::ApplyingSession);
        self.run_passes(guard, &domain, &target, &session, &cookies)
            .await
    }

    async fn run_passes(
        &self,
        guard: &PhaseGuard<'_>,
        domain: &str,
        target: &Url,
        session_cookies: &[CookieRecord],
        all_cookies: &[CookieRecord],
    ) -> Result<Tally, SyncError> {
        let mut tally = self
            .apply_pass(session_cookies.iter(), target, RewritePolicy::SessionPriority)
            .await?;

        guard.advance(SyncPhase::ApplyingOrdinary);
        let applied: HashSet<CookieKey> = session_cookies.iter().map(CookieRecord::key).collect();
        let remaining = all_cookies.iter().filter(|c| !applied.contains(&c.key()));
        tally.absorb(self.apply_pass(remaining, target, RewritePolicy::Ordinary).await?);

        guard.advance(SyncPhase::SpecialDomainPass);
        tally.reapplied = self.special_domain_pass(domain, target, all_cookies).await?;

        Ok(tally)
    }

    async fn apply_pass<'c>(
        &self,
        cookies: impl Iterator<Item = &'c CookieRecord>,
        target: &Url,
        policy: RewritePolicy,
    ) -> Result<Tally, SyncError> {
        let mut tally = Tally::default();
        for cookie in cookies {
            tally.total += 1;
            let outcome = apply_with_fallback(self.store.as_ref(), cookie, target, policy).await?;
            if outcome.is_applied() {
                tally.synced += 1;
            }
        }
        Ok(tally)
    }

    async fn special_domain_pass(
        &self,
        domain: &str,
        target: &Url,
        all_cookies: &[CookieRecord],
    ) -> Result<usize, SyncError> {
        let target_host = target.host_str().unwrap_or_default();
        let hosts = [domain, target_host];

        let mut seen: HashSet<CookieKey> = HashSet::new();
        let mut reapplied = 0;
        for profile in self.registry.matching(&hosts) {
            for cookie in all_cookies.iter().filter(|c| profile.is_interesting(&c.name)) {
                if !seen.insert(cookie.key()) {
                    continue;
                }
                let outcome = apply_with_fallback(
                    self.store.as_ref(),
                    cookie,
                    target,
                    RewritePolicy::SessionPriority,
                )
                .await?;
                if outcome != ApplyOutcome::Abandoned {
                    reapplied += 1;
                }
            }
            tracing::debug!(provider = %profile.match_pattern, reapplied, "special-domain pass");
        }

        Ok(reapplied)
    }

    fn dropped(&self, domain: &str) -> SyncResult {
        tracing::warn!(domain = %domain, phase = ?self.phase(), "sync dropped, another is in flight");
        SyncResult::failed(SyncError::SyncInFlight)
    }

    fn finish(&self, strategy: &str, domain: &str, result: Result<Tally, SyncError>) -> SyncResult {
        match result {
            Ok(tally) => {
                tracing::info!(
                    strategy,
                    domain = %domain,
                    synced = tally.synced,
                    total = tally.total,
                    reapplied = tally.reapplied,
                    "sync complete"
                );
                SyncResult::completed(tally)
            }
            Err(e) => {
                tracing::warn!(strategy, domain = %domain, error = %e, "sync failed");
                SyncResult::failed(e)
            }
        }
    }
}

/// Lowercased, dot-trimmed, `www.`-stripped source domain.
fn source_domain(domain: &str) -> Result<String, SyncError> {
    let bare = domain.trim().trim_start_matches('.').to_lowercase();
    if bare.is_empty() || bare.contains(char::is_whitespace) || bare.contains('/') {
        return Err(SyncError::InvalidDomain);
    }
    Ok(strip_www(&bare))
}

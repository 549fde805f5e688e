//! Fallback views for destinations that will not render embedded.
//!
//! Every view carries an external URL, so the user always has a way out
//! even when every in-pane attempt fails.

use crate::base::syncerror::SyncError;
use crate::render::frame::EmbeddingFrame;
use crate::sync::registry::{AlternativeRoute, ProviderRegistry};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The frame reported a load error.
    LoadError(String),
    /// No load event arrived within the load timeout.
    Timeout,
    /// The provider is known to refuse embedding.
    FramingBlocked,
}

/// User-facing actions a view offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackAction {
    Retry,
    OpenExternally,
    ChooseAlternative,
    TryAnother,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackView {
    /// Generic failure: retry or open externally.
    LoadFailed { url: Url, reason: FallbackReason },
    /// Framing-blocking provider: pick a delivery route.
    Alternatives {
        url: Url,
        provider: String,
        routes: Vec<AlternativeRoute>,
    },
    /// A chosen route did not render.
    AlternativeFailed {
        url: Url,
        original: Url,
        route: AlternativeRoute,
    },
}

impl FallbackView {
    /// The address opened by the open-externally affordance.
    pub fn external_url(&self) -> &Url {
        match self {
            FallbackView::LoadFailed { url, .. }
            | FallbackView::Alternatives { url, .. }
            | FallbackView::AlternativeFailed { url, .. } => url,
        }
    }

    pub fn actions(&self) -> Vec<FallbackAction> {
        match self {
            FallbackView::LoadFailed { .. } => {
                vec![FallbackAction::Retry, FallbackAction::OpenExternally]
            }
            FallbackView::Alternatives { .. } => {
                vec![FallbackAction::ChooseAlternative, FallbackAction::OpenExternally]
            }
            FallbackView::AlternativeFailed { .. } => {
                vec![FallbackAction::OpenExternally, FallbackAction::TryAnother]
            }
        }
    }
}

/// Timing and size thresholds for one alternative-route attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptPolicy {
    pub timeout: Duration,
    pub settle: Duration,
    pub min_content: usize,
}

impl Default for AttemptPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            settle: Duration::from_secs(1),
            min_content: 100,
        }
    }
}

pub struct RenderFallbackController {
    registry: Arc<ProviderRegistry>,
    policy: AttemptPolicy,
}

impl RenderFallbackController {
    pub fn new(registry: Arc<ProviderRegistry>, policy: AttemptPolicy) -> Self {
        Self { registry, policy }
    }

    pub fn policy(&self) -> AttemptPolicy {
        self.policy
    }

    /// The alternatives view, if `target`'s host belongs to a framing-blocking provider.
    pub fn blocked_view(&self, target: &Url) -> Option<FallbackView> {
        let host = target.host_str()?;
        let profile = self.registry.framing_blocker(host)?;
        tracing::info!(host, provider = %profile.match_pattern, "provider blocks framing");

        Some(FallbackView::Alternatives {
            url: target.clone(),
            provider: profile.match_pattern.clone(),
            routes: profile.alternatives.clone(),
        })
    }

    /// View for a failed embedded load. Blocking providers still get their alternatives.
    pub fn on_failure(&self, target: &Url, reason: FallbackReason) -> FallbackView {
        tracing::warn!(url = %target, reason = ?reason, "embedded load failed");
        if let Some(view) = self.blocked_view(target) {
            return view;
        }
        FallbackView::LoadFailed {
            url: target.clone(),
            reason,
        }
    }

    /// Absolute URL for `route`; a route without one retries `original`.
    pub fn resolve_route(&self, route: &AlternativeRoute, original: &Url) -> Result<Url, SyncError> {
        match &route.url {
            Some(url) => Ok(Url::parse(url)?),
            None => Ok(original.clone()),
        }
    }

    /// Whether the frame rendered more than the minimum content.
    /// A frame whose document cannot be read did not render.
    pub fn rendered(&self, frame: &dyn EmbeddingFrame) -> bool {
        match frame.content_length() {
            Ok(len) => len > self.policy.min_content,
            Err(e) => {
                tracing::debug!(error = %e, "rendered content unreadable");
                false
            }
        }
    }

    pub fn alternative_failed(&self, route: &AlternativeRoute, original: &Url) -> FallbackView {
        let url = self
            .resolve_route(route, original)
            .unwrap_or_else(|_| original.clone());
        tracing::warn!(route = %route.label, url = %url, "alternative route failed");

        FallbackView::AlternativeFailed {
            url,
            original: original.clone(),
            route: route.clone(),
        }
    }

    /// "Try another": back to the route list for `original`.
    pub fn try_another(&self, original: &Url) -> FallbackView {
        self.blocked_view(original)
            .unwrap_or_else(|| FallbackView::LoadFailed {
                url: original.clone(),
                reason: FallbackReason::FramingBlocked,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::frame::MemoryFrame;
    use crate::sync::registry::default_profiles;

    fn controller() -> RenderFallbackController {
        RenderFallbackController::new(
            Arc::new(ProviderRegistry::new(default_profiles())),
            AttemptPolicy::default(),
        )
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_blocked_provider_offers_alternatives() {
        let view = controller()
            .blocked_view(&url("https://mail.google.com/mail/u/0/"))
            .unwrap();
        match &view {
            FallbackView::Alternatives { routes, provider, .. } => {
                assert_eq!(provider, "mail.google.com");
                assert_eq!(routes.len(), 4);
            }
            other => panic!("unexpected view {:?}", other),
        }
        assert!(view.actions().contains(&FallbackAction::OpenExternally));
    }

    #[test]
    fn test_generic_failure() {
        let target = url("https://example.com/");
        let view = controller().on_failure(&target, FallbackReason::Timeout);
        assert_eq!(
            view,
            FallbackView::LoadFailed {
                url: target.clone(),
                reason: FallbackReason::Timeout
            }
        );
        assert_eq!(view.external_url(), &target);
        assert_eq!(view.actions(), vec![FallbackAction::Retry, FallbackAction::OpenExternally]);
    }

    #[test]
    fn test_route_without_url_retries_original() {
        let original = url("https://mail.google.com/");
        let route = AlternativeRoute::new("Standard", None, "");
        assert_eq!(controller().resolve_route(&route, &original).unwrap(), original);
    }

    #[test]
    fn test_failed_alternative_keeps_escape_hatch() {
        let original = url("https://mail.google.com/");
        let route = AlternativeRoute::new("Mobile", Some("https://mail.google.com/mail/mu/"), "");
        let view = controller().alternative_failed(&route, &original);
        assert_eq!(view.external_url().as_str(), "https://mail.google.com/mail/mu/");
        assert!(view.actions().contains(&FallbackAction::TryAnother));

        assert!(matches!(
            controller().try_another(&original),
            FallbackView::Alternatives { .. }
        ));
    }

    #[test]
    fn test_rendered_threshold() {
        let frame = MemoryFrame::new();
        frame.set_content_length(100);
        assert!(!controller().rendered(&frame));
        frame.set_content_length(101);
        assert!(controller().rendered(&frame));
    }
}

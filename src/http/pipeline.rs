//! Authorization pipeline.
//!
//! Two fixed chains built from the policy stages. Both read top to bottom
//! as outermost to innermost:
//!
//! ```text
//! public:     security headers → CSP → rate limit → handler
//! protected:  security headers → CSP → rate limit → origin → token → handler
//! ```
//!
//! Unauthenticated requests spend rate-limit budget before any credential check.
//! Every chain built here gets its own limiter registry, so each route group
//! keeps a separate per-client budget.

use std::sync::Arc;

use axum::{middleware, Router};
use tower::ServiceBuilder;

use crate::auth::{token_middleware, TokenGate, TokenManager};
use crate::config::RateLimitConfig;
use crate::security::{
    csp_middleware, origin_middleware, rate_limit_middleware, security_headers_middleware,
    RateLimiterRegistry, SecurityPolicy,
};

/// Shared state of every pipeline stage.
#[derive(Clone)]
pub struct Pipeline {
    rate_limit: RateLimitConfig,
    policy: Arc<SecurityPolicy>,
    gate: TokenGate,
}

impl Pipeline {
    pub fn new(
        tokens: Arc<TokenManager>,
        rate_limit: RateLimitConfig,
        policy: Arc<SecurityPolicy>,
        cookie_name: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            rate_limit,
            policy,
            gate: TokenGate::new(tokens, cookie_name),
        }
    }

    /// Wrap every route (and fallback) of `router` in the public chain.
    ///
    /// `scope` names the route group; it gets a fresh limiter registry.
    pub fn public<S>(&self, scope: &'static str, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let limiter = Arc::new(RateLimiterRegistry::from_config(&self.rate_limit).with_scope(scope));

        router.layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(security_headers_middleware))
                .layer(middleware::from_fn_with_state(self.policy.clone(), csp_middleware))
                .layer(middleware::from_fn_with_state(limiter, rate_limit_middleware)),
        )
    }

    /// Wrap every route of `router` in the protected chain.
    pub fn protected<S>(&self, scope: &'static str, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let gated = router.layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn_with_state(self.policy.clone(), origin_middleware))
                .layer(middleware::from_fn_with_state(self.gate.clone(), token_middleware)),
        );

        // Layers applied later sit outside, so the public stages run first.
        self.public(scope, gated)
    }
}

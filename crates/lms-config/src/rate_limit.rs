//! Rate limiting configuration for the authentication endpoints.
//!
//! Sign-in, sign-up and token refresh are guarded by a per-client token bucket
//! built with the Governor crate.
//!
//! # Configuration
//!
//! - `RATE_LIMIT_ENABLED`: Turn the limiter on or off (default: true)
//! - `RATE_LIMIT_AUTH_PER_SECOND`: Seconds to replenish one token (default: 10)
//! - `RATE_LIMIT_AUTH_BURST_SIZE`: Bucket size (default: 5)
//!
//! # Example
//!
//! ```ignore
//! let config = RateLimitConfig::from_env();
//!
//! if let Some(governor) = config.auth_governor_config() {
//!     router = router.layer(GovernorLayer::new(governor));
//! }
//! ```

use tower_governor::governor::{GovernorConfig, GovernorConfigBuilder};
use tower_governor::key_extractor::SmartIpKeyExtractor;

use crate::jwt::parse_flag;

pub type AuthGovernorConfig =
    GovernorConfig<SmartIpKeyExtractor, ::governor::middleware::NoOpMiddleware>;

/// Rate limit configuration for the API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub enabled: bool,

    /// Interval in seconds after which one token is added back to the bucket.
    pub auth_per_second: u64,

    /// Maximum number of tokens that can accumulate.
    pub auth_burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auth_per_second: 10,
            auth_burst_size: 5,
        }
    }
}

impl RateLimitConfig {
    /// Creates a new `RateLimitConfig` from environment variables.
    ///
    /// Falls back to default values if environment variables are not set
    /// or cannot be parsed.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: std::env::var("RATE_LIMIT_ENABLED")
                .ok()
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.enabled),
            auth_per_second: std::env::var("RATE_LIMIT_AUTH_PER_SECOND")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.auth_per_second),
            auth_burst_size: std::env::var("RATE_LIMIT_AUTH_BURST_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.auth_burst_size),
        }
    }

    /// A limiter that never engages, for tests driving the router in-process.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Builds the governor config for authentication endpoints.
    ///
    /// Clients are keyed by `X-Forwarded-For`, `X-Real-Ip`, `Forwarded` or the
    /// peer address, in that order. Returns `None` when limiting is disabled
    /// or the values are rejected by the builder (zero rate or burst).
    #[must_use]
    pub fn auth_governor_config(&self) -> Option<AuthGovernorConfig> {
        if !self.enabled {
            return None;
        }

        let config = GovernorConfigBuilder::default()
            .per_second(self.auth_per_second)
            .burst_size(self.auth_burst_size)
            .key_extractor(SmartIpKeyExtractor)
            .finish();

        if config.is_none() {
            tracing::warn!(
                per_second = self.auth_per_second,
                burst_size = self.auth_burst_size,
                "Invalid rate limit settings, auth rate limiting disabled"
            );
        }

        config
    }
}

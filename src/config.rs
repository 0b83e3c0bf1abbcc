//! Environment-driven configuration.
//!
//! DESIGN
//! ======
//! Values load once at startup from environment variables with named
//! defaults. Reclamation knobs are grouped in `ReclaimConfig` so the
//! reclaimer and tests can carry them by value.

use std::time::Duration;

const DEFAULT_PORT: u16 = 4000;
const DEFAULT_CLIENT_ORIGIN: &str = "http://localhost:5173";

/// Seconds a board may sit at zero occupancy before destruction.
const DEFAULT_GRACE_SECS: u64 = 300;
/// Seconds of inactivity after which a board is destroyed regardless of
/// occupancy.
const DEFAULT_IDLE_CEILING_SECS: u64 = 1800;
/// Seconds between idle sweeps.
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

// =============================================================================
// RECLAMATION
// =============================================================================

/// Tuning knobs for board reclamation.
#[derive(Debug, Clone, Copy)]
pub struct ReclaimConfig {
    /// Grace window after occupancy reaches zero.
    pub grace: Duration,
    /// Absolute inactivity ceiling.
    pub idle_ceiling: Duration,
    /// Interval between recurring idle sweeps.
    pub sweep_interval: Duration,
}

impl ReclaimConfig {
    fn from_env() -> Self {
        Self {
            grace: Duration::from_secs(env_parse("BOARD_GRACE_SECS", DEFAULT_GRACE_SECS)),
            idle_ceiling: Duration::from_secs(env_parse("BOARD_IDLE_CEILING_SECS", DEFAULT_IDLE_CEILING_SECS)),
            sweep_interval: Duration::from_secs(env_parse("BOARD_SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS)),
        }
    }
}

// =============================================================================
// CONFIG
// =============================================================================

#[derive(Debug, Clone)]
pub struct Config {
    /// TCP port the server listens on.
    pub port: u16,
    /// Origin allowed by CORS; the canvas frontend.
    pub client_origin: String,
    pub reclaim: ReclaimConfig,
}

impl Config {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            port: env_parse("PORT", DEFAULT_PORT),
            client_origin: std::env::var("CLIENT_ORIGIN").unwrap_or_else(|_| DEFAULT_CLIENT_ORIGIN.into()),
            reclaim: ReclaimConfig::from_env(),
        }
    }
}

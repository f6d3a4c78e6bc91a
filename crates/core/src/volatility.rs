//! Volatility records (§3 Volatility record).

use serde::{Deserialize, Serialize};

/// Attaches to a trace to bound (or remove) its cache lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Volatility {
    /// Rebuild on every build (`--always`).
    Always,
    /// Cache valid for `duration_secs` from `stamped_at` (`--after DURATION`).
    After {
        duration_secs: u64,
        stamped_at: u64,
    },
}

impl Volatility {
    pub fn after(duration_secs: u64, stamped_at: u64) -> Self {
        Volatility::After {
            duration_secs,
            stamped_at,
        }
    }

    /// Whether the volatility window is still open at `now_secs` (§8
    /// property 6, `--after` validity window).
    pub fn is_valid_at(&self, now_secs: u64) -> bool {
        match self {
            Volatility::Always => false,
            Volatility::After {
                duration_secs,
                stamped_at,
            } => now_secs < stamped_at.saturating_add(*duration_secs),
        }
    }
}

#[cfg(test)]
#[path = "volatility_tests.rs"]
mod tests;

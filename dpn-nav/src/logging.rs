// SPDX-License-Identifier: AGPL-3.0-or-later
//! Tracing setup for host programs

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directives
pub const LOG_ENV: &str = "DPN_LOG";

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install a fmt subscriber filtered by `DPN_LOG` (default `info`).
///
/// Returns false when a global subscriber was already installed.
pub fn init() -> bool {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(filter())
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice() {
        let _ = init();
        assert!(!init());
    }
}

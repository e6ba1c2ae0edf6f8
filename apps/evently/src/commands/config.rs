//! # Config Commands

use tracing::debug;

use crate::state::{AppConfig, AppState};

/// The configuration the app was started with.
pub fn get_config(state: &AppState) -> AppConfig {
    debug!("get_config command");
    state.config.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support;

    #[tokio::test]
    async fn test_returns_startup_config() {
        let state = test_support::state().await;
        let config = get_config(&state);
        assert_eq!(config, AppConfig::for_tests());
        assert_eq!(config.payment.decline_rate_bps, 0);
    }
}

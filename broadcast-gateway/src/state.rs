//! Shared application state.

use crate::config::Config;
use crate::radio::RadioLink;

/// Shared application state passed to all handlers.
pub struct AppState {
    pub config: Config,
    pub radio: RadioLink,
}

impl AppState {
    pub fn new(config: Config, radio: RadioLink) -> Self {
        Self { config, radio }
    }
}

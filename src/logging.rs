// SPDX-License-Identifier: MPL-2.0
//! Logger initialization.
//!
//! On Android, log records go to logcat through `android_logger`. Other
//! targets only set the `log` max level; the host installs its own logger.

use crate::config::LoggingConfig;

/// Installs the platform logger. Safe to call more than once.
pub fn init(config: &LoggingConfig) {
    #[cfg(target_os = "android")]
    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(config.level_filter())
            .with_tag(config.tag.as_str()),
    );

    #[cfg(not(target_os = "android"))]
    log::set_max_level(config.level_filter());

    log::debug!("logging initialized (tag={}, level={})", config.tag, config.level);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_applies_configured_level_and_is_repeatable() {
        let config = LoggingConfig {
            tag: "test".into(),
            level: "warn".into(),
        };
        init(&config);
        init(&config);
        #[cfg(not(target_os = "android"))]
        assert_eq!(log::max_level(), log::LevelFilter::Warn);
    }
}

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Source URL is set and its timeout is non-zero
/// - Scraper page bound, lookup ceiling and interval are non-zero
/// - Seeder sweep interval is non-zero when the sweep is enabled
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.source.url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "source.url cannot be empty".to_string(),
        ));
    }

    if config.source.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "source.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.scraper.until_page == 0 {
        return Err(ConfigError::ValidationError(
            "scraper.until_page must be at least 1".to_string(),
        ));
    }

    if config.scraper.max_concurrent_lookups == 0 {
        return Err(ConfigError::ValidationError(
            "scraper.max_concurrent_lookups must be at least 1".to_string(),
        ));
    }

    if config.scraper.interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "scraper.interval_secs cannot be 0".to_string(),
        ));
    }

    if config.scraper.seeders_sweep_limit > 0 && config.scraper.seeders_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "scraper.seeders_interval_secs cannot be 0 when the seeder sweep is enabled"
                .to_string(),
        ));
    }

    Ok(())
}

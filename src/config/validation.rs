use crate::config::types::{Config, CrawlerConfig, SearchConfig, StorageConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on fetch workers
const MAX_WORKERS: usize = 256;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_storage_config(&config.storage)?;
    validate_search_config(&config.search)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    if config.channel_capacity < 1 {
        return Err(ConfigError::Validation(
            "channel_capacity must be >= 1".to_string(),
        ));
    }

    if config.fetch_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "fetch_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.checkpoint_interval_secs < 1 {
        return Err(ConfigError::Validation(
            "checkpoint_interval_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    if let Some(email) = &config.contact_email {
        validate_email(email)?;
    }

    Ok(())
}

/// Validates store configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates search configuration
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    if config.shard_directory.trim().is_empty() {
        return Err(ConfigError::Validation(
            "shard_directory cannot be empty".to_string(),
        ));
    }

    if config.shard_extension.is_empty() || config.shard_extension.contains('.') {
        return Err(ConfigError::Validation(format!(
            "shard_extension must be a non-empty extension without dots, got '{}'",
            config.shard_extension
        )));
    }

    Ok(())
}

/// Validates an email address (basic check)
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };

    if !valid {
        return Err(ConfigError::Validation(format!(
            "Invalid contact_email: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_workers_bounds() {
        let mut config = Config::default();

        config.crawler.workers = 0;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));

        config.crawler.workers = 257;
        assert!(validate(&config).is_err());

        config.crawler.workers = 256;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_intervals_rejected() {
        let mut config = Config::default();
        config.crawler.checkpoint_interval_secs = 0;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.crawler.fetch_timeout_secs = 0;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.crawler.channel_capacity = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_crawler_name_characters() {
        let mut config = Config::default();
        config.user_agent.crawler_name = "my-bot2".to_string();
        assert!(validate(&config).is_ok());

        config.user_agent.crawler_name = "my bot".to_string();
        assert!(validate(&config).is_err());

        config.user_agent.crawler_name = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_contact_details() {
        let mut config = Config::default();
        config.user_agent.contact_url = Some("not a url".to_string());
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));

        config.user_agent.contact_url = Some("https://example.com/bot".to_string());
        config.user_agent.contact_email = Some("admin@example.com".to_string());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("admin@example.com").is_ok());
        assert!(validate_email("admin").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("admin@localhost").is_err());
        assert!(validate_email("admin@example.").is_err());
    }

    #[test]
    fn test_shard_extension() {
        let mut config = Config::default();
        config.search.shard_extension = ".dragnet".to_string();
        assert!(validate(&config).is_err());

        config.search.shard_extension = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_database_path() {
        let mut config = Config::default();
        config.storage.database_path = "  ".to_string();
        assert!(validate(&config).is_err());
    }
}

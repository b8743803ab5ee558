//! Tests for configuration management functionality
//!
//! These tests verify the configuration providers and the provider config
//! loaded from them.

#[cfg(test)]
mod tests {
    use std::env;
    use std::time::Duration;

    use tokio_test::{assert_err, assert_ok};

    use crate::config::{
        CompositeConfigProvider, ConfigProvider, ConfigProviderExt, EnvConfigProvider,
        MemoryConfigProvider, ProviderConfig, DEFAULT_BASE_URL, MAX_RETRY_BUDGET,
    };
    use crate::error::ErrorKind;

    #[test]
    fn test_memory_config_provider() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("provider_api_key", "test_key");
        provider.set("provider_timeout_seconds", "45");
        provider.set("provider_temperature", "0.3");
        provider.set("verbose", "yes");

        assert_eq!(provider.get_string("provider_api_key").unwrap(), "test_key");
        assert_eq!(provider.get_int("provider_timeout_seconds").unwrap(), 45);
        assert_eq!(provider.get_float("provider_temperature").unwrap(), 0.3);
        assert!(provider.get_bool("verbose").unwrap());

        assert_eq!(provider.get_string_or("missing", "default"), "default");
        assert_eq!(provider.get_int_or("missing", 60), 60);
        assert!(!provider.get_bool_or("missing", false));

        let err = provider.get_string("missing").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(provider.get_int("provider_api_key").is_err());
    }

    #[test]
    fn test_env_config_provider() {
        env::set_var("GENTEST_ENV_PROVIDER_API_KEY", "env_test_key");
        env::set_var("GENTEST_ENV_RETRY_BUDGET", "4");

        let provider = EnvConfigProvider::new()
            .with_prefix("GENTEST")
            .with_namespace("ENV");

        assert_eq!(provider.get_string("provider_api_key").unwrap(), "env_test_key");
        assert_eq!(provider.get_int("retry-budget").unwrap(), 4);
        assert!(provider.get_string("NON_EXISTENT").is_err());

        env::remove_var("GENTEST_ENV_PROVIDER_API_KEY");
        env::remove_var("GENTEST_ENV_RETRY_BUDGET");
    }

    #[test]
    fn test_composite_config_provider() {
        let mut memory_provider = MemoryConfigProvider::new();
        memory_provider.set("provider_api_key", "memory_key");

        env::set_var("GENTEST_COMPOSITE_PROVIDER_API_KEY", "env_key");
        env::set_var("GENTEST_COMPOSITE_PROVIDER_MODEL", "env-model");

        let env_provider = EnvConfigProvider::new()
            .with_prefix("GENTEST")
            .with_namespace("COMPOSITE");

        let mut composite = CompositeConfigProvider::new();
        composite.add_provider(memory_provider);
        composite.add_provider(env_provider);

        // First provider wins; later ones fill the gaps
        assert_eq!(composite.get_string("provider_api_key").unwrap(), "memory_key");
        assert_eq!(composite.get_string("provider_model").unwrap(), "env-model");
        assert!(composite.get_string("NON_EXISTENT").is_err());

        env::remove_var("GENTEST_COMPOSITE_PROVIDER_API_KEY");
        env::remove_var("GENTEST_COMPOSITE_PROVIDER_MODEL");
    }

    #[test]
    fn test_provider_config_from_provider() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("provider_api_key", "sk-test");
        provider.set("provider_model", "gpt-4o");
        provider.set("provider_timeout_seconds", "10");
        provider.set("retry_budget", "1");
        provider.set("rate_limit_base_ms", "500");

        let config = assert_ok!(ProviderConfig::from_provider(&provider));
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.max_tokens, 2000);

        let policy = config.retry_policy();
        assert_eq!(policy.retry_budget, 1);
        assert_eq!(policy.attempt_timeout, Duration::from_secs(10));
        assert_eq!(policy.rate_limit_base, Duration::from_millis(500));
        assert_eq!(policy.transient_base, Duration::from_millis(1000));
    }

    #[test]
    fn test_missing_credential_is_configuration_error() {
        let err = ProviderConfig::from_provider(&MemoryConfigProvider::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let blank = ProviderConfig {
            api_key: "   ".to_string(),
            ..ProviderConfig::default()
        };
        assert_eq!(blank.validate().unwrap_err().kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_invalid_base_url_is_configuration_error() {
        let config = ProviderConfig {
            api_key: "sk-test".to_string(),
            base_url: "not a url".to_string(),
            ..ProviderConfig::default()
        };
        assert_eq!(assert_err!(config.validate()).kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let config = ProviderConfig {
            api_key: "sk-test".to_string(),
            timeout_seconds: 0,
            ..ProviderConfig::default()
        };
        assert_err!(config.validate());
    }

    #[test]
    fn test_negative_values_are_rejected() {
        for key in [
            "retry_budget",
            "provider_timeout_seconds",
            "provider_max_tokens",
            "rate_limit_base_ms",
            "transient_base_ms",
        ] {
            let mut provider = MemoryConfigProvider::new();
            provider.set("provider_api_key", "sk-test");
            provider.set(key, "-1");

            let err = assert_err!(ProviderConfig::from_provider(&provider));
            assert_eq!(err.kind(), ErrorKind::Configuration, "{}", key);
            assert!(err.to_string().contains(key));
        }
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("provider_api_key", "sk-test");
        provider.set("provider_max_tokens", "5000000000");
        assert_err!(ProviderConfig::from_provider(&provider));

        let mut provider = MemoryConfigProvider::new();
        provider.set("provider_api_key", "sk-test");
        provider.set("retry_budget", "abc");
        assert_err!(ProviderConfig::from_provider(&provider));
    }

    #[test]
    fn test_retry_budget_is_capped() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("provider_api_key", "sk-test");
        provider.set("retry_budget", &(MAX_RETRY_BUDGET + 1).to_string());
        let err = assert_err!(ProviderConfig::from_provider(&provider));
        assert_eq!(err.kind(), ErrorKind::Configuration);

        provider.set("retry_budget", &MAX_RETRY_BUDGET.to_string());
        let config = assert_ok!(ProviderConfig::from_provider(&provider));
        assert_eq!(config.retry_policy().max_attempts(), MAX_RETRY_BUDGET + 1);
    }
}

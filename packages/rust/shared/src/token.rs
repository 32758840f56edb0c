//! GitHub access token resolution.
//!
//! A token is required before any pipeline command runs: the enterprise
//! clone authenticates with it, and the lookup is deliberately performed
//! up front so a missing credential aborts the invocation before any
//! engine or network work starts.

use crate::config::AppConfig;
use crate::error::{GrafanaBuildError, Result};

/// Resolve the GitHub access token for this invocation.
///
/// Sources are consulted in a fixed priority order, first non-empty wins:
/// 1. the explicit `--github-token` flag value,
/// 2. the environment variable named by `[github].token_env`,
/// 3. the `[github].token` config file value.
pub fn resolve_token(explicit: Option<&str>, config: &AppConfig) -> Result<String> {
    if let Some(token) = explicit.filter(|t| !t.is_empty()) {
        return Ok(token.to_string());
    }

    let var_name = &config.github.token_env;
    match std::env::var(var_name) {
        Ok(token) if !token.is_empty() => {
            tracing::debug!(var = %var_name, "using token from environment");
            return Ok(token);
        }
        _ => {}
    }

    if let Some(token) = config.github.token.as_deref().filter(|t| !t.is_empty()) {
        tracing::debug!("using token from config file");
        return Ok(token.to_string());
    }

    Err(GrafanaBuildError::token_missing(format!(
        "set --github-token, the {var_name} environment variable, \
         or [github].token in the config file"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_env(var_name: &str) -> AppConfig {
        let mut config = AppConfig::default();
        config.github.token_env = var_name.into();
        config
    }

    #[test]
    fn explicit_flag_wins() {
        let mut config = config_with_env("GB_TEST_TOKEN_UNSET_1");
        config.github.token = Some("from-config".into());
        let token = resolve_token(Some("from-flag"), &config).expect("resolve");
        assert_eq!(token, "from-flag");
    }

    #[test]
    fn empty_flag_is_ignored() {
        let mut config = config_with_env("GB_TEST_TOKEN_UNSET_2");
        config.github.token = Some("from-config".into());
        let token = resolve_token(Some(""), &config).expect("resolve");
        assert_eq!(token, "from-config");
    }

    #[test]
    fn environment_beats_config_file() {
        // SAFETY: variable name is unique to this test; nothing else reads it.
        unsafe { std::env::set_var("GB_TEST_TOKEN_SET_3", "from-env") };
        let mut config = config_with_env("GB_TEST_TOKEN_SET_3");
        config.github.token = Some("from-config".into());
        let token = resolve_token(None, &config).expect("resolve");
        assert_eq!(token, "from-env");
    }

    #[test]
    fn config_file_fallback() {
        let mut config = config_with_env("GB_TEST_TOKEN_UNSET_4");
        config.github.token = Some("from-config".into());
        let token = resolve_token(None, &config).expect("resolve");
        assert_eq!(token, "from-config");
    }

    #[test]
    fn no_source_is_token_missing() {
        let config = config_with_env("GB_TEST_TOKEN_UNSET_5");
        let err = resolve_token(None, &config).expect_err("should fail");
        assert!(matches!(err, GrafanaBuildError::TokenMissing { .. }));
        assert!(err.to_string().contains("GB_TEST_TOKEN_UNSET_5"));
    }
}

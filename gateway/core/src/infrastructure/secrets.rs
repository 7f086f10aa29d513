// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Secret references in configuration.
//!
//! Config values that hold credentials may be written as `env:VAR_NAME`, in
//! which case the value is read from the environment at startup. Anything
//! else is taken literally.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SecretError {
    #[error("environment variable not set: {0}")]
    MissingEnv(String),

    #[error("secret reference '{0}' names no variable")]
    EmptyReference(String),
}

/// Resolve a possibly `env:`-prefixed secret reference.
pub fn resolve_secret(reference: &str) -> Result<String, SecretError> {
    match reference.strip_prefix("env:") {
        Some("") => Err(SecretError::EmptyReference(reference.to_string())),
        Some(var_name) => {
            std::env::var(var_name).map_err(|_| SecretError::MissingEnv(var_name.to_string()))
        }
        None => Ok(reference.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_values_pass_through() {
        assert_eq!(resolve_secret("plain-token").unwrap(), "plain-token");
    }

    #[test]
    fn test_env_reference() {
        assert_eq!(
            resolve_secret("env:SESSION_GATEWAY_TEST_SECRET_THAT_IS_NEVER_SET"),
            Err(SecretError::MissingEnv(
                "SESSION_GATEWAY_TEST_SECRET_THAT_IS_NEVER_SET".to_string()
            ))
        );
        assert!(matches!(
            resolve_secret("env:"),
            Err(SecretError::EmptyReference(_))
        ));

        // PATH is present in every test environment.
        let path = std::env::var("PATH").unwrap();
        assert_eq!(resolve_secret("env:PATH").unwrap(), path);
    }
}

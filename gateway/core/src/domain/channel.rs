// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Session Channels
//!
//! A session request is scoped to one `(source, type)` pair: the identifier the
//! challenge is delivered to (a phone number) and the channel it travels over.
//!
//! ## Canonical Form
//!
//! The salt hashes the source string byte-for-byte. Two spellings of the same
//! phone number produce two different salts, so [`SessionSource`] refuses
//! anything that is not already canonical instead of rewriting it. Callers own
//! canonicalization; the gateway only checks it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Out-of-band channel a session challenge is delivered over.
///
/// The lowercase wire name is part of the salt preimage (`"{source}:{type}"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Sms,
    Email,
}

impl ChannelType {
    /// Wire name hashed into the salt.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sms => "sms",
            Self::Email => "email",
        }
    }

    /// Whether the gateway can currently deliver a challenge over this channel.
    pub fn is_deliverable(&self) -> bool {
        match self {
            Self::Sms => true,
            Self::Email => false,
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelType {
    type Err = ChannelError;

    // Case-sensitive: "SMS" hashes differently from "sms".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sms" => Ok(Self::Sms),
            "email" => Ok(Self::Email),
            other => Err(ChannelError::UnsupportedType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("unsupported channel type: {0:?}")]
    UnsupportedType(String),

    #[error("source must not be empty")]
    Empty,

    #[error("source must not contain leading or trailing whitespace")]
    SurroundingWhitespace,

    #[error("source must not contain control characters")]
    ControlCharacter,

    #[error("sms source must be an E.164 phone number (e.g. +32478121212): {0:?}")]
    NotE164(String),

    #[error("email source must have the form local@domain: {0:?}")]
    InvalidEmail(String),
}

/// Validated channel identifier (phone number or email address).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionSource(String);

impl SessionSource {
    /// Validate `raw` as a canonical identifier for `channel`.
    ///
    /// The value is stored exactly as given.
    pub fn new(raw: impl Into<String>, channel: ChannelType) -> Result<Self, ChannelError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(ChannelError::Empty);
        }
        if raw.trim() != raw {
            return Err(ChannelError::SurroundingWhitespace);
        }
        if raw.chars().any(char::is_control) {
            return Err(ChannelError::ControlCharacter);
        }

        match channel {
            ChannelType::Sms => {
                if !is_e164(&raw) {
                    return Err(ChannelError::NotE164(raw));
                }
            }
            ChannelType::Email => {
                if !is_plausible_email(&raw) {
                    return Err(ChannelError::InvalidEmail(raw));
                }
            }
        }

        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionSource {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn is_e164(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('+') else {
        return false;
    };
    (8..=15).contains(&digits.len())
        && digits.bytes().all(|b| b.is_ascii_digit())
        && !digits.starts_with('0')
}

fn is_plausible_email(value: &str) -> bool {
    let mut parts = value.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_type_parsing_is_exact() {
        assert_eq!("sms".parse::<ChannelType>(), Ok(ChannelType::Sms));
        assert_eq!("email".parse::<ChannelType>(), Ok(ChannelType::Email));
        assert!(matches!(
            "SMS".parse::<ChannelType>(),
            Err(ChannelError::UnsupportedType(t)) if t == "SMS"
        ));
        assert!("whatsapp".parse::<ChannelType>().is_err());
    }

    #[test]
    fn test_only_sms_is_deliverable() {
        assert!(ChannelType::Sms.is_deliverable());
        assert!(!ChannelType::Email.is_deliverable());
    }

    #[test]
    fn test_sms_source_accepts_e164() {
        let source = SessionSource::new("+32478121212", ChannelType::Sms).unwrap();
        assert_eq!(source.as_str(), "+32478121212");
    }

    #[test]
    fn test_sms_source_rejects_non_canonical_forms() {
        for raw in [
            "0478121212",
            "+32 478 12 12 12",
            "+32-478-121212",
            "0032478121212",
            "+0478121212",
            "+1234",
            "+1234567890123456",
        ] {
            assert!(
                matches!(SessionSource::new(raw, ChannelType::Sms), Err(ChannelError::NotE164(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_source_rejects_whitespace_and_control_characters() {
        assert_eq!(
            SessionSource::new(" +32478121212", ChannelType::Sms),
            Err(ChannelError::SurroundingWhitespace)
        );
        assert_eq!(
            SessionSource::new("+3247812\u{0}1212", ChannelType::Sms),
            Err(ChannelError::ControlCharacter)
        );
        assert_eq!(SessionSource::new("", ChannelType::Sms), Err(ChannelError::Empty));
    }

    #[test]
    fn test_email_source_is_not_lowercased() {
        let source = SessionSource::new("Alice@Example.org", ChannelType::Email).unwrap();
        assert_eq!(source.as_str(), "Alice@Example.org");
        assert!(SessionSource::new("alice@", ChannelType::Email).is_err());
        assert!(SessionSource::new("a@b@c.org", ChannelType::Email).is_err());
    }
}

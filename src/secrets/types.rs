//! Secure types for handling secret entry values.
//!
//! Values written to the secret store are held in [`SecretValue`] so they
//! cannot leak through `Debug`/`Display` output or structured log fields.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A string wrapper that redacts its contents and zeroes memory on drop.
///
/// - Debug output shows `SecretValue([REDACTED])`
/// - Display output shows `[REDACTED]`
/// - The raw value is only reachable through [`SecretValue::expose_secret`]
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct SecretValue(String);

impl SecretValue {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Exposes the raw value. Call sites should be easy to audit.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// Size in bytes, used for storage tier decisions.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretValue([REDACTED])")
    }
}

impl fmt::Display for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for SecretValue {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SecretValue {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_value_redacts_output() {
        let secret = SecretValue::new("db-password");
        assert_eq!(format!("{:?}", secret), "SecretValue([REDACTED])");
        assert_eq!(format!("{}", secret), "[REDACTED]");
        assert_eq!(secret.expose_secret(), "db-password");
    }

    #[test]
    fn test_secret_value_len_and_equality() {
        let secret: SecretValue = "abc".into();
        assert_eq!(secret.len(), 3);
        assert!(!secret.is_empty());
        assert_eq!(secret, SecretValue::from("abc".to_string()));
        assert!(SecretValue::default().is_empty());
    }
}

//! Bearer token value object.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Bearer token issued by the gallery backend, masked in output and wiped on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct AuthToken {
    value: String,
}

impl AuthToken {
    /// Creates a token, rejecting blank or whitespace-containing values.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into().trim().to_string();

        if value.is_empty() || value.chars().any(char::is_whitespace) {
            return None;
        }

        Some(Self { value })
    }

    /// Creates token without validation.
    #[must_use]
    pub fn new_unchecked(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Returns token as string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Value for an `Authorization` header.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.value)
    }

    /// Returns masked token for display.
    #[must_use]
    pub fn masked(&self) -> String {
        if self.value.len() <= 10 {
            return "*".repeat(self.value.len());
        }

        let visible_prefix = &self.value[..4];
        let visible_suffix = &self.value[self.value.len() - 4..];
        format!("{visible_prefix}...{visible_suffix}")
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("value", &self.masked())
            .finish()
    }
}

impl fmt::Display for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.masked())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "eyJhbGciOiJIUzI1NiJ9.payload.signature";

    #[test]
    fn test_valid_token_is_trimmed() {
        let token = AuthToken::new(format!("  {RAW}\n")).unwrap();
        assert_eq!(token.as_str(), RAW);
    }

    #[test]
    fn test_blank_token_rejected() {
        assert!(AuthToken::new("   ").is_none());
        assert!(AuthToken::new("two words").is_none());
    }

    #[test]
    fn test_bearer_header_value() {
        let token = AuthToken::new_unchecked("abc");
        assert_eq!(token.bearer(), "Bearer abc");
    }

    #[test]
    fn test_debug_does_not_leak_token() {
        let token = AuthToken::new_unchecked(RAW);
        let debug_output = format!("{token:?}");

        assert!(!debug_output.contains(RAW));
        assert!(debug_output.contains("..."));
    }
}

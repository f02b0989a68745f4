//! Provider credentials
//!
//! Holds the Gemini, SerpAPI and Imgur secrets. Every value passes through
//! [`sanitize_credential`] so that pasted `NAME=value` lines do not end up
//! being sent to a provider verbatim.

use std::fmt;

/// Strip any leading `NAME=` assignments (repeatedly) and surrounding whitespace.
pub fn sanitize_credential(value: &str) -> String {
    let mut rest = value;
    while let Some(stripped) = strip_assignment_prefix(rest) {
        rest = stripped;
    }
    rest.trim().to_string()
}

fn strip_assignment_prefix(input: &str) -> Option<&str> {
    let trimmed = input.trim_start();
    let name_len = trimmed
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(trimmed.len());
    if name_len == 0 {
        return None;
    }
    let after_eq = trimmed[name_len..].trim_start().strip_prefix('=')?;
    Some(after_eq.trim_start())
}

fn normalize(value: &str) -> Option<String> {
    let cleaned = sanitize_credential(value);
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Shorten a secret for log output.
pub fn mask_secret(secret: &str) -> String {
    let prefix: String = secret.chars().take(4).collect();
    format!("{}...", prefix)
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub gemini_key: Option<String>,
    pub serpapi_key: Option<String>,
    pub imgur_client_id: Option<String>,
}

/// Partial credential change: `None` keeps the stored value, an empty
/// string clears it.
#[derive(Debug, Clone, Default)]
pub struct CredentialUpdate {
    pub gemini_key: Option<String>,
    pub serpapi_key: Option<String>,
    pub imgur_client_id: Option<String>,
}

impl Credentials {
    pub fn new(gemini_key: &str, serpapi_key: &str, imgur_client_id: &str) -> Self {
        Self {
            gemini_key: normalize(gemini_key),
            serpapi_key: normalize(serpapi_key),
            imgur_client_id: normalize(imgur_client_id),
        }
    }

    pub fn from_env() -> Self {
        let read = |name: &str| std::env::var(name).unwrap_or_default();
        Self::new(
            &read("GEMINI_API_KEY"),
            &read("SERPAPI_KEY"),
            &read("IMGUR_CLIENT_ID"),
        )
    }

    pub fn update(&mut self, update: CredentialUpdate) {
        fn apply(slot: &mut Option<String>, value: Option<String>) {
            if let Some(value) = value {
                *slot = normalize(&value);
            }
        }

        apply(&mut self.gemini_key, update.gemini_key);
        apply(&mut self.serpapi_key, update.serpapi_key);
        apply(&mut self.imgur_client_id, update.imgur_client_id);
    }

    /// Request-supplied keys win over stored ones.
    pub fn with_overrides(&self, overrides: &Credentials) -> Credentials {
        Credentials {
            gemini_key: overrides.gemini_key.clone().or_else(|| self.gemini_key.clone()),
            serpapi_key: overrides
                .serpapi_key
                .clone()
                .or_else(|| self.serpapi_key.clone()),
            imgur_client_id: overrides
                .imgur_client_id
                .clone()
                .or_else(|| self.imgur_client_id.clone()),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let masked = |v: &Option<String>| v.as_deref().map(mask_secret);
        f.debug_struct("Credentials")
            .field("gemini_key", &masked(&self.gemini_key))
            .field("serpapi_key", &masked(&self.serpapi_key))
            .field("imgur_client_id", &masked(&self.imgur_client_id))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_assignment_prefix() {
        assert_eq!(sanitize_credential("GEMINI_API_KEY=abc123"), "abc123");
        assert_eq!(sanitize_credential("  serpapi_key = xyz  "), "xyz");
    }

    #[test]
    fn test_sanitize_strips_repeated_prefixes() {
        assert_eq!(
            sanitize_credential("gemini_key = GEMINI_API_KEY=AIzaSyExample"),
            "AIzaSyExample"
        );
    }

    #[test]
    fn test_sanitize_leaves_clean_values_alone() {
        assert_eq!(sanitize_credential("AIza-Sy_Example"), "AIza-Sy_Example");
        assert_eq!(sanitize_credential(""), "");
    }

    #[test]
    fn test_new_treats_blank_as_absent() {
        let creds = Credentials::new("  ", "KEY=", "client");
        assert!(creds.gemini_key.is_none());
        assert!(creds.serpapi_key.is_none());
        assert_eq!(creds.imgur_client_id.as_deref(), Some("client"));
    }

    #[test]
    fn test_update_sets_keeps_and_clears() {
        let mut creds = Credentials::new("g1", "s1", "i1");
        creds.update(CredentialUpdate {
            gemini_key: Some("GEMINI_API_KEY=g2".to_string()),
            serpapi_key: None,
            imgur_client_id: Some(String::new()),
        });

        assert_eq!(creds.gemini_key.as_deref(), Some("g2"));
        assert_eq!(creds.serpapi_key.as_deref(), Some("s1"));
        assert!(creds.imgur_client_id.is_none());
    }

    #[test]
    fn test_with_overrides_prefers_request_values() {
        let stored = Credentials::new("stored-g", "stored-s", "");
        let request = Credentials::new("", "request-s", "");

        let effective = stored.with_overrides(&request);
        assert_eq!(effective.gemini_key.as_deref(), Some("stored-g"));
        assert_eq!(effective.serpapi_key.as_deref(), Some("request-s"));
        assert!(effective.imgur_client_id.is_none());
    }

    #[test]
    fn test_debug_masks_secrets() {
        let creds = Credentials::new("supersecretvalue", "", "");
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("supersecretvalue"));
        assert!(rendered.contains("supe..."));
    }
}

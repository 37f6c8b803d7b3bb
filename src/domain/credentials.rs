use std::fmt;

use crate::error::{Result, ScraperError};

/// Credentials for writing to the OSM API.
///
/// A bearer token must be obtained out of band; no interactive OAuth flow is run here.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Basic { username: String, password: String },
    Bearer { token: String },
}

impl Credentials {
    /// Resolve credentials from optional parts. A token wins over a username/password pair.
    pub fn from_parts(
        username: Option<String>,
        password: Option<String>,
        token: Option<String>,
    ) -> Option<Self> {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            return Some(Credentials::Bearer { token });
        }
        if username.is_none() && password.is_none() {
            return None;
        }
        Some(Credentials::Basic {
            username: username.unwrap_or_default(),
            password: password.unwrap_or_default(),
        })
    }

    /// Reject credentials with blank parts before anything touches the network
    pub fn validate(&self) -> Result<()> {
        match self {
            Credentials::Basic { username, password } => {
                if username.trim().is_empty() || password.is_empty() {
                    return Err(ScraperError::Config(
                        "Username and password required for actual upload".to_string(),
                    ));
                }
            }
            Credentials::Bearer { token } => {
                if token.trim().is_empty() {
                    return Err(ScraperError::Config("OSM access token is empty".to_string()));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
            Credentials::Bearer { .. } => f.debug_struct("Bearer").field("token", &"***").finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_takes_precedence() {
        let credentials = Credentials::from_parts(
            Some("mapper".into()),
            Some("secret".into()),
            Some("abc".into()),
        );
        assert_eq!(credentials, Some(Credentials::Bearer { token: "abc".into() }));
    }

    #[test]
    fn test_nothing_supplied_yields_none() {
        assert_eq!(Credentials::from_parts(None, None, Some("  ".into())), None);
    }

    #[test]
    fn test_username_without_password_fails_validation() {
        let credentials = Credentials::from_parts(Some("mapper".into()), None, None).unwrap();
        assert!(matches!(credentials.validate(), Err(ScraperError::Config(_))));
    }

    #[test]
    fn test_debug_output_redacts_secrets() {
        let credentials = Credentials::Basic {
            username: "mapper".into(),
            password: "hunter2".into(),
        };
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("mapper"));
        assert!(!rendered.contains("hunter2"));
    }
}

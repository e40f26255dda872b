//! Credential check against the configured user table.

use std::collections::HashMap;
use std::fmt;

use crate::error::PvError;

/// Username → password table supplied at startup.
#[derive(Clone, Default)]
pub struct Credentials {
    users: HashMap<String, String>,
}

impl Credentials {
    /// Parse `name:password` entries. The password may itself contain `:`.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, PvError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut users = HashMap::new();
        for entry in entries {
            let entry = entry.as_ref().trim();
            if entry.is_empty() {
                continue;
            }
            let (name, password) = entry
                .split_once(':')
                .filter(|(name, password)| !name.trim().is_empty() && !password.is_empty())
                .ok_or_else(|| {
                    PvError::InvalidInput(format!(
                        "Malformed user entry, expected name:password: {entry:?}"
                    ))
                })?;
            users.insert(name.trim().to_string(), password.to_string());
        }
        Ok(Self { users })
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn usernames(&self) -> impl Iterator<Item = &str> {
        self.users.keys().map(String::as_str)
    }

    fn verify(&self, username: &str, password: &str) -> bool {
        self.users
            .get(username)
            .is_some_and(|expected| expected == password)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.usernames().collect();
        names.sort_unstable();
        f.debug_struct("Credentials").field("users", &names).finish()
    }
}

/// Check a username/password pair. Returns the canonical username on success.
pub fn authenticate<'a>(
    credentials: &'a Credentials,
    username: &str,
    password: &str,
) -> Result<&'a str, PvError> {
    match credentials.users.get_key_value(username) {
        Some((name, _)) if credentials.verify(username, password) => {
            crate::metrics::login_attempt(true);
            tracing::info!(username = %name, "Login succeeded");
            Ok(name.as_str())
        }
        _ => {
            crate::metrics::login_attempt(false);
            tracing::warn!(username = %username, "Login failed");
            Err(PvError::Auth)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_users() -> Credentials {
        Credentials::from_entries(["alice:s3cret", "bob:pa:ss"]).unwrap()
    }

    #[test]
    fn parses_entries_and_skips_blanks() {
        let creds = Credentials::from_entries(["alice:one", "", " bob:two "]).unwrap();
        assert_eq!(creds.len(), 2);
        assert!(Credentials::from_entries(Vec::<String>::new())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn rejects_malformed_entries() {
        assert!(Credentials::from_entries(["alice"]).is_err());
        assert!(Credentials::from_entries([":pw"]).is_err());
        assert!(Credentials::from_entries(["alice:"]).is_err());
    }

    #[test]
    fn authenticates_exact_matches_only() {
        let creds = two_users();
        assert_eq!(authenticate(&creds, "alice", "s3cret").unwrap(), "alice");
        assert_eq!(authenticate(&creds, "bob", "pa:ss").unwrap(), "bob");

        assert!(matches!(
            authenticate(&creds, "alice", "S3cret"),
            Err(PvError::Auth)
        ));
        assert!(matches!(
            authenticate(&creds, "Alice", "s3cret"),
            Err(PvError::Auth)
        ));
        assert!(matches!(
            authenticate(&creds, "carol", ""),
            Err(PvError::Auth)
        ));
    }

    #[test]
    fn debug_output_hides_passwords() {
        let rendered = format!("{:?}", two_users());
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("s3cret"));
    }
}

use derive_more::Display;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::utils::errors::{ErrorCode, PavilionError};
use super::policy::SecurityPolicy;

#[derive(Clone, Copy, Debug, Deserialize, Display, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[display(fmt = "user")]
    User,
    #[display(fmt = "admin")]
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

///
/// A password hash the account used previously and when it was retired.
///
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PasswordHistoryEntry {
    pub hash: String,
    pub changed_at: bson::DateTime,
}

///
/// Bookkeeping for one issued token. The token_ref is the token's id, never the token itself.
///
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token_ref: String,
    pub device: String,
    pub last_active: bson::DateTime,
    pub expires_at: bson::DateTime,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.to_chrono() <= now
    }
}

///
/// The persisted account document (one per customer or admin) in the Accounts collection.
///
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub account_id: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub role: Role,
    pub created_at: bson::DateTime,
    pub password_hash: String,
    #[serde(default)]
    pub password_history: Vec<PasswordHistoryEntry>,
    pub password_changed_at: bson::DateTime,
    pub password_expires_at: bson::DateTime,
    #[serde(default)]
    pub failed_login_attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_lock_until: Option<bson::DateTime>,
    #[serde(default)]
    pub active_sessions: Vec<Session>,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>, // AES-GCM sealed, see utils::pii.
}

fn default_max_sessions() -> u32 {
    SecurityPolicy::default().default_max_sessions
}

impl Account {
    ///
    /// A freshly registered account - no history, no failures, no sessions.
    ///
    pub fn new(account_id: String, email: String, name: String, role: Role, password_hash: String,
        joined: DateTime<Utc>, policy: &SecurityPolicy) -> Self {

        Account {
            account_id,
            email,
            name,
            role,
            created_at: joined.into(),
            password_hash,
            password_history: vec!(),
            password_changed_at: joined.into(),
            password_expires_at: policy.password_expiry(joined).into(),
            failed_login_attempts: 0,
            account_lock_until: None,
            active_sessions: vec!(),
            max_sessions: policy.default_max_sessions.max(1),
            contact_phone: None,
        }
    }

    ///
    /// The session for the token reference, if it's still live.
    ///
    pub fn live_session(&self, token_ref: &str, now: DateTime<Utc>) -> Option<&Session> {
        self.active_sessions
            .iter()
            .find(|session| session.token_ref == token_ref && !session.is_expired(now))
    }
}

///
/// Emails are compared case-insensitively, so they're stored trimmed and lower-cased.
///
/// Only the basic shape is checked: something@domain.tld with no whitespace.
///
pub fn normalise_email(email: &str) -> Result<String, PavilionError> {
    let email = email.trim().to_lowercase();

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        },
        None => false,
    };

    match valid {
        true  => Ok(email),
        false => Err(ErrorCode::InvalidEmail.with_msg(&format!("'{}' is not a valid email address", email))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_email_is_normalised() -> Result<(), PavilionError> {
        assert_eq!(normalise_email("  Sachin@Example.COM ")?, "sachin@example.com");
        Ok(())
    }

    #[test]
    fn test_bad_emails_are_rejected() {
        for email in &["", "nobody", "@example.com", "a@b", "a@@b.com", "a b@example.com", "a@example.com."] {
            let err = normalise_email(email).unwrap_err();
            assert_eq!(err.error_code(), ErrorCode::InvalidEmail, "{} should be invalid", email);
        }
    }

    #[test]
    fn test_new_account_expiry_is_from_join_date() {
        let joined = DateTime::parse_from_rfc3339("2021-08-23T09:30:00Z").unwrap().with_timezone(&Utc);
        let account = Account::new("id".into(), "a@b.com".into(), "A".into(), Role::User, "$2b$".into(), joined, &SecurityPolicy::default());

        assert_eq!(account.password_changed_at.to_chrono(), joined);
        assert_eq!(account.password_expires_at.to_chrono(), joined + Duration::days(90));
        assert!(account.password_history.is_empty());
        assert_eq!(account.failed_login_attempts, 0);
        assert_eq!(account.max_sessions, 5);
    }

    #[test]
    fn test_persisted_layout_uses_document_field_names() -> Result<(), PavilionError> {
        let account = Account::new("id".into(), "a@b.com".into(), "A".into(), Role::Admin, "$2b$".into(), Utc::now(), &SecurityPolicy::default());
        let doc = bson::to_document(&account)?;

        for field in &["passwordHash", "passwordHistory", "passwordChangedAt", "passwordExpiresAt",
            "failedLoginAttempts", "activeSessions", "maxSessions"] {
            assert!(doc.contains_key(field), "missing {}", field);
        }

        // Unset lock is left out of the document entirely.
        assert!(!doc.contains_key("accountLockUntil"));
        assert_eq!(doc.get_str("role").unwrap(), "admin");

        let back: Account = bson::from_document(doc)?;
        assert_eq!(back.role, Role::Admin);
        Ok(())
    }

    #[test]
    fn test_documents_without_a_session_cap_get_the_default() -> Result<(), PavilionError> {
        let account = Account::new("id".into(), "a@b.com".into(), "A".into(), Role::User, "$2b$".into(), Utc::now(), &SecurityPolicy::default());
        let mut doc = bson::to_document(&account)?;
        doc.remove("maxSessions");
        doc.remove("activeSessions");

        let back: Account = bson::from_document(doc)?;
        assert_eq!(back.max_sessions, 5);
        assert!(back.active_sessions.is_empty());
        Ok(())
    }
}

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use crate::utils::config::Configuration;
use crate::utils::errors::{ErrorCode, PavilionError};
use super::account::PasswordHistoryEntry;
use super::algorithm::{self, Algorithm, argon::ArgonPolicy, bcrypt::BCryptPolicy};

///
/// The rules applied to every account - password rotation, lockout and session capping.
///
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SecurityPolicy {
    pub max_history_length: u32,
    pub max_age_days: u32,
    pub max_failures: u32,
    pub lockout_seconds: u32,
    pub session_ttl_seconds: u32,
    pub default_max_sessions: u32,
    pub algorithm: Algorithm,
    pub argon_policy: ArgonPolicy,
    pub bcrypt_policy: BCryptPolicy,
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        SecurityPolicy {
            max_history_length: 3,
            max_age_days: 90,
            max_failures: 5,
            lockout_seconds: 15 * 60,
            session_ttl_seconds: 24 * 60 * 60,
            default_max_sessions: 5,
            algorithm: Algorithm::BCrypt,
            argon_policy: ArgonPolicy::default(),
            bcrypt_policy: BCryptPolicy::default(),
        }
    }
}

impl From<&Configuration> for SecurityPolicy {
    fn from(config: &Configuration) -> Self {
        SecurityPolicy {
            max_history_length: config.max_history_length,
            max_age_days: config.max_age_days,
            max_failures: config.max_failures,
            lockout_seconds: config.lockout_seconds,
            session_ttl_seconds: config.session_ttl_seconds,
            default_max_sessions: config.default_max_sessions.max(1),
            algorithm: config.hash_algorithm,
            argon_policy: ArgonPolicy::default(),
            bcrypt_policy: BCryptPolicy { cost: config.bcrypt_cost, ..Default::default() },
        }
    }
}

impl SecurityPolicy {
    ///
    /// Use the configured hashing algorithm to hash the password and build a PHC string.
    ///
    /// This is CPU-bound, callers on the async runtime should use spawn_blocking.
    ///
    pub fn hash_into_phc(&self, plain_text_password: &str) -> Result<String, PavilionError> {
        if plain_text_password.is_empty() {
            return Err(ErrorCode::PasswordNotSpecified.with_msg("An empty password cannot be hashed"))
        }

        match self.algorithm {
            Algorithm::Argon  => self.argon_policy.hash_into_phc(plain_text_password),
            Algorithm::BCrypt => self.bcrypt_policy.hash_into_phc(plain_text_password),
        }
    }

    ///
    /// Reject the plain text password if it matches any of the most recent max_history_length hashes.
    ///
    /// History is oldest first. The current password hash is not part of the history and is not checked here.
    ///
    pub fn validate_history(&self, plain_text_password: &str, history: &[PasswordHistoryEntry]) -> Result<(), PavilionError> {
        for entry in history.iter().rev().take(self.max_history_length as usize) {
            if algorithm::validate(plain_text_password, &entry.hash)? {
                return Err(ErrorCode::PasswordReused
                    .with_msg(&format!("The password matches one used on {}", entry.changed_at)))
            }
        }

        Ok(())
    }

    pub fn password_expiry(&self, changed_on: DateTime<Utc>) -> DateTime<Utc> {
        changed_on + Duration::days(self.max_age_days as i64)
    }

    pub fn lock_until(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::seconds(self.lockout_seconds as i64)
    }

    pub fn session_expiry(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::seconds(self.session_ttl_seconds as i64)
    }
}

use std::sync::Arc;
use parking_lot::RwLock;
use chrono::{DateTime, Duration, Utc};
use crate::db::AccountStore;
use crate::model::policy::SecurityPolicy;
use super::{config::Configuration, errors::PavilionError, pii::PiiCipher, time_provider::TimeProvider, token::{JwtIssuer, TokenIssuer}};

///
/// The context is handed to every account operation and gives them access to the store, policy, clock, etc.
///
/// It carries no per-request state - the account being worked on is always passed explicitly.
///
pub struct ServiceContext {
    store: Arc<dyn AccountStore>,
    config: Configuration,
    policy: SecurityPolicy,
    time_provider: RwLock<TimeProvider>,
    tokens: Box<dyn TokenIssuer>,
    pii: PiiCipher,
    dummy_hash: String,
}

impl ServiceContext {
    pub fn new(config: Configuration, store: Arc<dyn AccountStore>) -> Result<Self, PavilionError> {
        let policy = SecurityPolicy::from(&config);
        let tokens = JwtIssuer::new(&config.jwt_secret, Duration::seconds(policy.session_ttl_seconds as i64))?;
        let pii = PiiCipher::new(&config.pii_key)?;
        let dummy_hash = policy.hash_into_phc(&super::generate_id())?;

        Ok(ServiceContext {
            store,
            config,
            policy,
            time_provider: RwLock::new(TimeProvider::default()),
            tokens: Box::new(tokens),
            pii,
            dummy_hash,
        })
    }

    ///
    /// Swap the token issuer, e.g. for one backed by an external identity service.
    ///
    pub fn with_token_issuer(mut self, tokens: Box<dyn TokenIssuer>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.time_provider.read().now()
    }

    ///
    /// Set or clear the fixed time.
    ///
    pub fn set_now(&self, now: Option<DateTime<Utc>>) {
        self.time_provider.write().fix(now);
    }

    pub fn advance_clock(&self, by: Duration) {
        self.time_provider.write().advance(by);
    }

    pub fn store(&self) -> &dyn AccountStore {
        self.store.as_ref()
    }

    pub fn policy(&self) -> &SecurityPolicy {
        &self.policy
    }

    pub fn tokens(&self) -> &dyn TokenIssuer {
        self.tokens.as_ref()
    }

    pub fn pii(&self) -> &PiiCipher {
        &self.pii
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    ///
    /// A hash of a random password, made with the configured algorithm and cost. Logins for unknown
    /// emails are verified against it so they take as long as a wrong password.
    ///
    pub(crate) fn dummy_hash(&self) -> &str {
        &self.dummy_hash
    }
}

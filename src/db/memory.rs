use std::collections::HashMap;
use parking_lot::RwLock;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use super::AccountStore;
use crate::{model::account::Account, utils::errors::{ErrorCode, PavilionError}};

///
/// An in-process credential store. Used by the tests and by embedders that don't want MongoDB.
///
/// Writes can be switched off to simulate the store going away.
///
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<HashMap<String, Account>>,
    fail_writes: AtomicBool,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.accounts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.read().is_empty()
    }

    fn check_writable(&self) -> Result<(), PavilionError> {
        match self.fail_writes.load(Ordering::SeqCst) {
            true  => Err(ErrorCode::StorageFailure.with_msg("The in-memory store is refusing writes")),
            false => Ok(()),
        }
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn load(&self, account_id: &str) -> Result<Option<Account>, PavilionError> {
        Ok(self.accounts.read().get(account_id).cloned())
    }

    async fn load_by_email(&self, email: &str) -> Result<Option<Account>, PavilionError> {
        Ok(self.accounts.read().values().find(|account| account.email == email).cloned())
    }

    async fn insert(&self, account: &Account) -> Result<(), PavilionError> {
        self.check_writable()?;
        let mut accounts = self.accounts.write();

        if accounts.values().any(|existing| existing.email == account.email) {
            return Err(ErrorCode::EmailUnavailable
                .with_msg(&format!("An account already exists for {}", account.email)))
        }

        accounts.insert(account.account_id.clone(), account.clone());
        Ok(())
    }

    async fn save(&self, account: &Account) -> Result<(), PavilionError> {
        self.check_writable()?;

        match self.accounts.write().get_mut(&account.account_id) {
            Some(existing) => {
                *existing = account.clone();
                Ok(())
            },
            None => Err(ErrorCode::AccountNotFound
                .with_msg(&format!("Account {} no longer exists", account.account_id))),
        }
    }
}

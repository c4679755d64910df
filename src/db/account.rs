use bson::doc;
use mongodb::{Collection, Database};
use async_trait::async_trait;
use super::{AccountStore, prelude::*};
use crate::{model::account::Account, utils::{errors::{ErrorCode, PavilionError}, mongo}};

///
/// Accounts persisted in the MongoDB Accounts collection.
///
#[derive(Clone, Debug)]
pub struct MongoAccountStore {
    db: Database,
}

impl MongoAccountStore {
    pub fn new(db: Database) -> Self {
        MongoAccountStore { db }
    }

    fn accounts(&self) -> Collection<Account> {
        self.db.collection::<Account>(ACCOUNTS)
    }
}

#[async_trait]
impl AccountStore for MongoAccountStore {
    async fn load(&self, account_id: &str) -> Result<Option<Account>, PavilionError> {
        Ok(self.accounts().find_one(doc!{ ACCOUNT_ID: account_id }, None).await?)
    }

    async fn load_by_email(&self, email: &str) -> Result<Option<Account>, PavilionError> {
        Ok(self.accounts().find_one(doc!{ EMAIL: email }, None).await?)
    }

    async fn insert(&self, account: &Account) -> Result<(), PavilionError> {
        match self.accounts().insert_one(account, None).await {
            Ok(_) => Ok(()),
            Err(err) => match mongo::is_duplicate_err(&err) {
                true  => Err(ErrorCode::EmailUnavailable
                    .with_msg(&format!("An account already exists for {}", account.email))),
                false => Err(PavilionError::from(err)),
            },
        }
    }

    async fn save(&self, account: &Account) -> Result<(), PavilionError> {
        let result = self.accounts()
            .replace_one(doc!{ ACCOUNT_ID: &account.account_id }, account, None)
            .await?;

        if result.matched_count == 0 {
            return Err(ErrorCode::AccountNotFound
                .with_msg(&format!("Account {} no longer exists", account.account_id)))
        }

        Ok(())
    }
}

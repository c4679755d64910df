pub mod account;
pub mod memory;

use async_trait::async_trait;
use crate::{model::account::Account, utils::errors::PavilionError};

pub mod prelude {
    // Collection names.
    pub const ACCOUNTS: &str = "Accounts";

    // Field names.
    pub const ACCOUNT_ID: &str = "accountId";
    pub const EMAIL:      &str = "email";
}

///
/// The credential store - one document per account, read whole and written whole.
///
/// There is no locking or version check here, two requests for the same account race and the
/// last write wins.
///
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn load(&self, account_id: &str) -> Result<Option<Account>, PavilionError>;

    ///
    /// The email must already be normalised.
    ///
    async fn load_by_email(&self, email: &str) -> Result<Option<Account>, PavilionError>;

    ///
    /// Persist a new account. An email already in use is EmailUnavailable.
    ///
    async fn insert(&self, account: &Account) -> Result<(), PavilionError>;

    ///
    /// Replace the whole account document in a single write.
    ///
    async fn save(&self, account: &Account) -> Result<(), PavilionError>;
}

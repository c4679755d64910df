pub mod login;
pub mod login_guard;
pub mod password_policy;
pub mod profile;
pub mod register;
pub mod sessions;

use crate::model::{account::Account, algorithm, policy::SecurityPolicy};
use crate::utils::{context::ServiceContext, errors::PavilionError};

pub use login::{LoginOutcome, authenticate, login, logout, logout_everywhere};
pub use login_guard::{is_locked, record_failure, record_success};
pub use password_policy::{apply_password_change, change_password, is_password_expired};
pub use profile::{contact_phone, set_contact_phone};
pub use register::{Registration, register};
pub use sessions::{add_session, remove_all_sessions, remove_session, set_max_sessions, touch_session};

///
/// Persist the updated account as a single document write and, only once that has succeeded,
/// replace the caller's copy with it. A storage failure leaves the caller's account untouched.
///
async fn commit(ctx: &ServiceContext, account: &mut Account, updated: Account) -> Result<(), PavilionError> {
    ctx.store().save(&updated).await?;
    *account = updated;
    Ok(())
}

///
/// Hashing is highly CPU-bound so it's performed on the blocking thread pool, not the event loop.
///
async fn hash_password(policy: &SecurityPolicy, plain_text_password: &str) -> Result<String, PavilionError> {
    let policy = policy.clone();
    let plain_text_password = plain_text_password.to_string();

    tokio::task::spawn_blocking(move || policy.hash_into_phc(&plain_text_password))
        .await
        .map_err(PavilionError::from)?
}

///
/// Verify a plain text password against a stored hash on the blocking thread pool.
///
async fn verify_password(plain_text_password: &str, phc: &str) -> Result<bool, PavilionError> {
    let phc = phc.to_string();
    let plain_text_password = plain_text_password.to_string();

    tokio::task::spawn_blocking(move || algorithm::validate(&plain_text_password, &phc))
        .await
        .map_err(PavilionError::from)?
}

use tracing::instrument;
use chrono::{DateTime, Utc};
use crate::model::account::{Account, PasswordHistoryEntry};
use crate::utils::{context::ServiceContext, errors::{ErrorCode, PavilionError}};
use super::{commit, verify_password};

///
/// Rotate the account onto a new password.
///
/// The candidate may not match any password in the history (the current password isn't in the history
/// so re-setting it once is allowed). On success the current hash is retired into the history, the
/// oldest entries are dropped to keep the history within the policy length, and the expiry is
/// recomputed from now.
///
#[instrument(skip(ctx, account, candidate), fields(account_id = %account.account_id))]
pub async fn apply_password_change(ctx: &ServiceContext, account: &mut Account, candidate: &str)
    -> Result<(), PavilionError> {

    let policy = ctx.policy().clone();
    let history = account.password_history.clone();
    let plain_text_password = candidate.to_string();

    // Checking the history means one verify per entry, so do it all on the blocking pool.
    let phc = tokio::task::spawn_blocking(move || {
            policy.validate_history(&plain_text_password, &history)?;
            policy.hash_into_phc(&plain_text_password)
        })
        .await
        .map_err(PavilionError::from)?
        .map_err(|err| {
            if err.error_code() == ErrorCode::PasswordReused {
                tracing::info!("Rejected a recently used password");
            }
            err
        })?;

    let now = ctx.now();
    let mut updated = account.clone();
    let retired = std::mem::replace(&mut updated.password_hash, phc);

    updated.password_history.push(PasswordHistoryEntry { hash: retired, changed_at: now.into() });

    let max_history = ctx.policy().max_history_length as usize;
    if updated.password_history.len() > max_history {
        let excess = updated.password_history.len() - max_history;
        updated.password_history.drain(..excess);
    }

    updated.password_changed_at = now.into();
    updated.password_expires_at = ctx.policy().password_expiry(now).into();

    commit(ctx, account, updated).await?;
    tracing::info!("Password changed");
    Ok(())
}

///
/// Change a password on behalf of its owner, who must prove they know the current one.
///
#[instrument(skip(ctx, current, candidate))]
pub async fn change_password(ctx: &ServiceContext, account_id: &str, current: &str, candidate: &str)
    -> Result<Account, PavilionError> {

    let mut account = match ctx.store().load(account_id).await? {
        Some(account) => account,
        None => return Err(ErrorCode::AccountNotFound.with_msg(&format!("Account {} does not exist", account_id))),
    };

    if !verify_password(current, &account.password_hash).await? {
        return Err(ErrorCode::InvalidCredentials.with_msg("The current password did not match"))
    }

    apply_password_change(ctx, &mut account, candidate).await?;
    Ok(account)
}

///
/// Has the password passed its expiry. Enforcing a reset is up to the caller.
///
pub fn is_password_expired(account: &Account, now: DateTime<Utc>) -> bool {
    now >= account.password_expires_at.to_chrono()
}

use tracing::instrument;
use chrono::{DateTime, Utc};
use crate::model::account::Account;
use crate::utils::{context::ServiceContext, errors::PavilionError};
use super::commit;

///
/// A lock only counts while it's in the future. Expired locks are never swept, they're simply
/// ignored here and cleared by the next login outcome.
///
pub fn is_locked(account: &Account, now: DateTime<Utc>) -> bool {
    match account.account_lock_until {
        Some(until) => until.to_chrono() > now,
        None => false,
    }
}

///
/// Count a failed login. The attempt that reaches the policy's limit locks the account.
///
/// If a previous lock has already run its course the count starts again from this failure.
///
#[instrument(skip(ctx, account), fields(account_id = %account.account_id))]
pub async fn record_failure(ctx: &ServiceContext, account: &mut Account) -> Result<(), PavilionError> {
    let now = ctx.now();
    let mut updated = account.clone();

    if updated.account_lock_until.is_some() && !is_locked(&updated, now) {
        updated.account_lock_until = None;
        updated.failed_login_attempts = 0;
    }

    updated.failed_login_attempts = updated.failed_login_attempts.saturating_add(1);

    if updated.failed_login_attempts >= ctx.policy().max_failures && updated.account_lock_until.is_none() {
        updated.account_lock_until = Some(ctx.policy().lock_until(now).into());
        tracing::warn!("Account locked after {} failed login attempts", updated.failed_login_attempts);
    }

    commit(ctx, account, updated).await
}

///
/// A successful login clears the failure count and any lock.
///
#[instrument(skip(ctx, account), fields(account_id = %account.account_id))]
pub async fn record_success(ctx: &ServiceContext, account: &mut Account) -> Result<(), PavilionError> {
    let mut updated = account.clone();
    updated.failed_login_attempts = 0;
    updated.account_lock_until = None;

    commit(ctx, account, updated).await
}

use tracing::instrument;
use crate::model::account::{Account, Session};
use crate::utils::{context::ServiceContext, errors::{ErrorCode, PavilionError}};
use super::commit;

///
/// Record a session for a newly issued token.
///
/// Expired sessions are pruned first and a token_ref that's already registered is refreshed in place.
/// If the account is still at its cap the session idle for longest (smallest last_active) is evicted -
/// when several share that last_active the earliest added goes.
///
#[instrument(skip(ctx, account, token_ref), fields(account_id = %account.account_id))]
pub async fn add_session(ctx: &ServiceContext, account: &mut Account, token_ref: &str, device: &str)
    -> Result<(), PavilionError> {

    let now = ctx.now();
    let mut updated = account.clone();

    updated.active_sessions.retain(|session| !session.is_expired(now));

    let session = Session {
        token_ref: token_ref.to_string(),
        device: device.to_string(),
        last_active: now.into(),
        expires_at: ctx.policy().session_expiry(now).into(),
    };

    if let Some(existing) = updated.active_sessions.iter_mut().find(|existing| existing.token_ref == token_ref) {
        *existing = session;
        return commit(ctx, account, updated).await
    }

    let max_sessions = updated.max_sessions.max(1) as usize;
    while updated.active_sessions.len() >= max_sessions {
        evict_oldest_idle(&mut updated.active_sessions);
    }

    updated.active_sessions.push(session);
    commit(ctx, account, updated).await
}

///
/// Forget the session for the token. Unknown references are not an error.
///
#[instrument(skip(ctx, account, token_ref), fields(account_id = %account.account_id))]
pub async fn remove_session(ctx: &ServiceContext, account: &mut Account, token_ref: &str)
    -> Result<(), PavilionError> {

    let mut updated = account.clone();
    updated.active_sessions.retain(|session| session.token_ref != token_ref);

    commit(ctx, account, updated).await
}

///
/// Mark the session as used now. A no-op if there's no such session.
///
pub async fn touch_session(ctx: &ServiceContext, account: &mut Account, token_ref: &str)
    -> Result<(), PavilionError> {

    let now = ctx.now();
    let mut updated = account.clone();

    match updated.active_sessions.iter_mut().find(|session| session.token_ref == token_ref) {
        Some(session) => session.last_active = now.into(),
        None => return Ok(()),
    }

    commit(ctx, account, updated).await
}

///
/// Sign the account out of every device.
///
#[instrument(skip(ctx, account), fields(account_id = %account.account_id))]
pub async fn remove_all_sessions(ctx: &ServiceContext, account: &mut Account) -> Result<(), PavilionError> {
    let mut updated = account.clone();
    updated.active_sessions.clear();

    commit(ctx, account, updated).await
}

///
/// Change how many concurrent sessions the account may hold. Lowering the cap evicts the longest idle
/// sessions straight away.
///
#[instrument(skip(ctx, account), fields(account_id = %account.account_id))]
pub async fn set_max_sessions(ctx: &ServiceContext, account: &mut Account, max_sessions: u32)
    -> Result<(), PavilionError> {

    if max_sessions == 0 {
        return Err(ErrorCode::InvalidArgument.with_msg("max_sessions must be at least 1"))
    }

    let mut updated = account.clone();
    updated.max_sessions = max_sessions;

    while updated.active_sessions.len() > max_sessions as usize {
        evict_oldest_idle(&mut updated.active_sessions);
    }

    commit(ctx, account, updated).await
}

fn evict_oldest_idle(sessions: &mut Vec<Session>) {
    // min_by_key keeps the first of equal minimums, i.e. the earliest added.
    let oldest = sessions
        .iter()
        .enumerate()
        .min_by_key(|(_, session)| session.last_active)
        .map(|(idx, _)| idx);

    if let Some(idx) = oldest {
        let evicted = sessions.remove(idx);
        tracing::info!("Evicted session on {} to stay within the session cap", evicted.device);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use more_asserts::assert_le;
    use crate::services::tests::{context, registered, start};

    fn refs(account: &Account) -> Vec<&str> {
        account.active_sessions.iter().map(|s| s.token_ref.as_str()).collect()
    }

    #[tokio::test]
    async fn test_oldest_idle_is_evicted() -> Result<(), PavilionError> {
        let ctx = context();
        start(&ctx);
        let mut account = registered(&ctx, "cap@example.com", "Wicket1!").await?;
        set_max_sessions(&ctx, &mut account, 2).await?;

        add_session(&ctx, &mut account, "A", "laptop").await?;
        ctx.advance_clock(Duration::minutes(1));
        add_session(&ctx, &mut account, "B", "phone").await?;
        ctx.advance_clock(Duration::minutes(1));
        add_session(&ctx, &mut account, "C", "tablet").await?;

        assert_eq!(refs(&account), vec!("B", "C"));
        Ok(())
    }

    #[tokio::test]
    async fn test_re_adding_a_session_refreshes_it_without_eviction() -> Result<(), PavilionError> {
        let ctx = context();
        let t0 = start(&ctx);
        let mut account = registered(&ctx, "again@example.com", "Wicket1!").await?;
        set_max_sessions(&ctx, &mut account, 2).await?;

        add_session(&ctx, &mut account, "A", "laptop").await?;
        ctx.advance_clock(Duration::minutes(1));
        add_session(&ctx, &mut account, "B", "phone").await?;
        ctx.advance_clock(Duration::minutes(1));
        add_session(&ctx, &mut account, "B", "phone").await?;

        assert_eq!(refs(&account), vec!("A", "B"));
        assert_eq!(account.active_sessions[0].last_active.to_chrono(), t0);
        assert_eq!(account.active_sessions[1].last_active.to_chrono(), t0 + Duration::minutes(2));
        assert_eq!(account.active_sessions[1].expires_at.to_chrono(), t0 + Duration::minutes(2) + Duration::hours(24));
        Ok(())
    }

    #[tokio::test]
    async fn test_eviction_is_by_idle_time_not_creation() -> Result<(), PavilionError> {
        let ctx = context();
        start(&ctx);
        let mut account = registered(&ctx, "idle@example.com", "Wicket1!").await?;
        set_max_sessions(&ctx, &mut account, 2).await?;

        add_session(&ctx, &mut account, "A", "laptop").await?;
        ctx.advance_clock(Duration::minutes(1));
        add_session(&ctx, &mut account, "B", "phone").await?;
        ctx.advance_clock(Duration::minutes(1));
        touch_session(&ctx, &mut account, "A").await?;
        ctx.advance_clock(Duration::minutes(1));
        add_session(&ctx, &mut account, "C", "tablet").await?;

        assert_eq!(refs(&account), vec!("A", "C"));
        Ok(())
    }

    #[tokio::test]
    async fn test_never_more_than_max_sessions() -> Result<(), PavilionError> {
        let ctx = context();
        start(&ctx);
        let mut account = registered(&ctx, "many@example.com", "Wicket1!").await?;

        for i in 0..12 {
            add_session(&ctx, &mut account, &format!("token-{}", i), "browser").await?;
            assert_le!(account.active_sessions.len(), 5);
        }

        // Every session shared the same last_active so the earliest added went first.
        assert_eq!(refs(&account), vec!("token-7", "token-8", "token-9", "token-10", "token-11"));
        Ok(())
    }

    #[tokio::test]
    async fn test_expired_sessions_are_pruned_before_eviction() -> Result<(), PavilionError> {
        let ctx = context();
        start(&ctx);
        let mut account = registered(&ctx, "prune@example.com", "Wicket1!").await?;
        set_max_sessions(&ctx, &mut account, 2).await?;

        add_session(&ctx, &mut account, "A", "laptop").await?;
        ctx.advance_clock(Duration::hours(12));
        add_session(&ctx, &mut account, "B", "phone").await?;

        // A has now expired (24h) but B has not, so nothing live is evicted.
        ctx.advance_clock(Duration::hours(12));
        add_session(&ctx, &mut account, "C", "tablet").await?;

        assert_eq!(refs(&account), vec!("B", "C"));
        assert_eq!(account.active_sessions[1].expires_at.to_chrono(), ctx.now() + Duration::hours(24));
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() -> Result<(), PavilionError> {
        let ctx = context();
        let mut account = registered(&ctx, "remove@example.com", "Wicket1!").await?;
        add_session(&ctx, &mut account, "A", "laptop").await?;

        let before = account.active_sessions.clone();
        remove_session(&ctx, &mut account, "missing").await?;
        assert_eq!(account.active_sessions, before);

        remove_session(&ctx, &mut account, "A").await?;
        remove_session(&ctx, &mut account, "A").await?;
        assert!(account.active_sessions.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_touch_unknown_session_is_a_no_op() -> Result<(), PavilionError> {
        let (ctx, store) = crate::services::tests::context_with_store();
        let mut account = registered(&ctx, "touch@example.com", "Wicket1!").await?;

        // No write is attempted, so even a failing store is fine.
        store.fail_writes(true);
        touch_session(&ctx, &mut account, "missing").await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_lowering_the_cap_evicts_and_zero_is_rejected() -> Result<(), PavilionError> {
        let ctx = context();
        start(&ctx);
        let mut account = registered(&ctx, "lower@example.com", "Wicket1!").await?;

        for token_ref in &["A", "B", "C"] {
            add_session(&ctx, &mut account, token_ref, "browser").await?;
            ctx.advance_clock(Duration::minutes(1));
        }

        set_max_sessions(&ctx, &mut account, 1).await?;
        assert_eq!(refs(&account), vec!("C"));

        let err = set_max_sessions(&ctx, &mut account, 0).await.unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::InvalidArgument);
        assert_eq!(account.max_sessions, 1);

        remove_all_sessions(&ctx, &mut account).await?;
        assert!(account.active_sessions.is_empty());
        Ok(())
    }
}

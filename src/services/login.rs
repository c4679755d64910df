use tracing::instrument;
use crate::model::account::{Account, normalise_email};
use crate::utils::{context::ServiceContext, errors::{ErrorCode, PavilionError}};
use super::{login_guard, password_policy, sessions, verify_password};

///
/// What a successful login hands back to the controller.
///
#[derive(Clone, Debug)]
pub struct LoginOutcome {
    pub token: String,
    pub account_id: String,
    pub password_expired: bool, // The login is allowed, the caller decides whether to force a change.
}

///
/// Sign in with an email and password.
///
/// A locked account is rejected before the password is even looked at. Unknown emails and wrong
/// passwords get the same InvalidCredentials, and both cost one password verification, so neither
/// the response nor its timing reveals who's registered.
///
#[instrument(skip(ctx, email, password))]
pub async fn login(ctx: &ServiceContext, email: &str, password: &str, device: &str) -> Result<LoginOutcome, PavilionError> {
    let account = match normalise_email(email) {
        Ok(email) => ctx.store().load_by_email(&email).await?,
        Err(_) => None,
    };

    let mut account = match account {
        Some(account) => account,
        None => {
            verify_password(password, ctx.dummy_hash()).await?;
            return Err(ErrorCode::InvalidCredentials.with_msg("No account for the email given"))
        },
    };

    if login_guard::is_locked(&account, ctx.now()) {
        return Err(ErrorCode::AccountLocked
            .with_msg(&format!("Account {} is locked out", account.account_id)))
    }

    if !verify_password(password, &account.password_hash).await? {
        login_guard::record_failure(ctx, &mut account).await?;
        return Err(ErrorCode::InvalidCredentials
            .with_msg(&format!("Password did not match for account {}", account.account_id)))
    }

    login_guard::record_success(ctx, &mut account).await?;

    let now = ctx.now();
    let issued = ctx.tokens().issue(&account.account_id, now)?;
    sessions::add_session(ctx, &mut account, &issued.token_ref, device).await?;

    let password_expired = password_policy::is_password_expired(&account, now);
    if password_expired {
        tracing::info!("Account {} signed in with an expired password", account.account_id);
    }

    Ok(LoginOutcome { token: issued.token, account_id: account.account_id, password_expired })
}

///
/// Resolve a bearer token to its account.
///
/// The token must verify and its session must still be registered on the account - an evicted or
/// signed-out session is rejected even though the token itself is still in date.
///
#[instrument(skip(ctx, token))]
pub async fn authenticate(ctx: &ServiceContext, token: &str) -> Result<Account, PavilionError> {
    let now = ctx.now();
    let claims = ctx.tokens().verify(token, now)?;

    let mut account = match ctx.store().load(&claims.sub).await? {
        Some(account) => account,
        None => return Err(ErrorCode::InvalidToken.with_msg(&format!("Token for missing account {}", claims.sub))),
    };

    if account.live_session(&claims.jti, now).is_none() {
        return Err(ErrorCode::InvalidToken.with_msg(&format!("No live session for token {}", claims.jti)))
    }

    sessions::touch_session(ctx, &mut account, &claims.jti).await?;
    Ok(account)
}

///
/// End the session belonging to the token.
///
#[instrument(skip(ctx, token))]
pub async fn logout(ctx: &ServiceContext, token: &str) -> Result<(), PavilionError> {
    let claims = ctx.tokens().verify(token, ctx.now())?;

    match ctx.store().load(&claims.sub).await? {
        Some(mut account) => sessions::remove_session(ctx, &mut account, &claims.jti).await,
        None => Ok(()),
    }
}

///
/// End every session on the token's account.
///
#[instrument(skip(ctx, token))]
pub async fn logout_everywhere(ctx: &ServiceContext, token: &str) -> Result<(), PavilionError> {
    let mut account = authenticate(ctx, token).await?;
    sessions::remove_all_sessions(ctx, &mut account).await
}

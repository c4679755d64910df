use tracing::instrument;
use crate::model::account::{Account, Role, normalise_email};
use crate::utils::{self, context::ServiceContext, errors::{ErrorCode, PavilionError}};
use super::hash_password;

///
/// The details a new customer (or an admin created by another admin) signs up with.
///
#[derive(Clone, Debug, Default)]
pub struct Registration {
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: Role,
}

///
/// Create an account with its first password.
///
/// There's no history yet so no reuse check, the expiry runs from the join date. A taken email is
/// reported with the same generic EmailUnavailable whether it's caught here or by the unique index.
///
#[instrument(skip(ctx, registration), fields(role = %registration.role))]
pub async fn register(ctx: &ServiceContext, registration: Registration) -> Result<Account, PavilionError> {
    let email = normalise_email(&registration.email)?;

    if registration.password.is_empty() {
        return Err(ErrorCode::PasswordNotSpecified.with_msg("A password is required to register"))
    }

    if ctx.store().load_by_email(&email).await?.is_some() {
        return Err(ErrorCode::EmailUnavailable.with_msg(&format!("An account already exists for {}", email)))
    }

    let phc = hash_password(ctx.policy(), &registration.password).await?;

    let account = Account::new(
        utils::generate_id(),
        email,
        registration.name.trim().to_string(),
        registration.role,
        phc,
        ctx.now(),
        ctx.policy());

    ctx.store().insert(&account).await?;

    tracing::info!("Registered account {}", account.account_id);
    Ok(account)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::algorithm;
    use crate::services::tests::context;

    fn registration(email: &str) -> Registration {
        Registration {
            email: email.to_string(),
            name: " Rahul ".to_string(),
            password: "CoverDrive1!".to_string(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn test_register_creates_a_clean_account() -> Result<(), PavilionError> {
        let ctx = context();
        let account = register(&ctx, registration("Rahul@Example.com")).await?;

        assert_eq!(account.email, "rahul@example.com");
        assert_eq!(account.name, "Rahul");
        assert!(account.password_history.is_empty());
        assert_eq!(account.failed_login_attempts, 0);
        assert!(account.active_sessions.is_empty());
        assert!(algorithm::validate("CoverDrive1!", &account.password_hash)?);
        assert!(ctx.store().load(&account.account_id).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_email_is_unique_regardless_of_case() -> Result<(), PavilionError> {
        let ctx = context();
        register(&ctx, registration("rahul@example.com")).await?;

        let err = register(&ctx, registration("RAHUL@example.com")).await.unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::EmailUnavailable);
        Ok(())
    }

    #[tokio::test]
    async fn test_register_validates_input() {
        let ctx = context();

        let err = register(&ctx, registration("not-an-email")).await.unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::InvalidEmail);

        let err = register(&ctx, Registration { password: String::new(), ..registration("a@b.com") }).await.unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::PasswordNotSpecified);
    }
}

use crate::model::account::Account;
use crate::utils::{context::ServiceContext, errors::PavilionError};
use super::commit;

///
/// Store (or clear) the account's contact phone number, sealed with the PII key.
///
pub async fn set_contact_phone(ctx: &ServiceContext, account: &mut Account, phone: Option<&str>)
    -> Result<(), PavilionError> {

    let mut updated = account.clone();
    updated.contact_phone = match phone.map(str::trim).filter(|phone| !phone.is_empty()) {
        Some(phone) => Some(ctx.pii().encrypt(phone)?),
        None => None,
    };

    commit(ctx, account, updated).await
}

pub fn contact_phone(ctx: &ServiceContext, account: &Account) -> Result<Option<String>, PavilionError> {
    match &account.contact_phone {
        Some(sealed) => Ok(Some(ctx.pii().decrypt(sealed)?)),
        None => Ok(None),
    }
}

use std::fs;
use tracing::{debug, info};
use super::errors::PavilionError;
use mongodb::error::ErrorKind;
use crate::db::prelude::*;
use crate::utils::errors::ErrorCode;
use crate::utils::config::Configuration;
use mongodb::{Client, Database, bson::{Document, doc}, options::ClientOptions};

///
/// Run any schema-like updates against MongoDB that haven't been run yet.
///
pub async fn update_mongo(db: &Database) -> Result<(), PavilionError> {
    create_init_indexes(db).await?;
    Ok(())
}

async fn create_init_indexes(db: &Database) -> Result<(), PavilionError> {
    // The unique email index is what turns a racing duplicate registration into EmailUnavailable.
    db.run_command(doc! { "createIndexes": ACCOUNTS, "indexes": [
        { "key": { ACCOUNT_ID: 1 }, "name": "idx_account_id", "unique": true },
        { "key": { EMAIL: 1 }, "name": "idx_email", "unique": true }] }, None).await?;

    Ok(())
}

///
/// Indicates if the MongoDB error is from a duplicate key violation.
///
pub fn is_duplicate_err(err: &mongodb::error::Error) -> bool {
    match &*err.kind {
        ErrorKind::Write(mongodb::error::WriteFailure::WriteError(we)) => we.code == 11000, /* Duplicate insert */
        _ => false,
    }
}

pub async fn get_mongo_db(app_name: &str, config: &Configuration) -> Result<Database, PavilionError> {

    let uri = match &config.mongo_credentials {
        Some(filename) => {
            debug!("Loading MongoDB credentials from secrets file {}", filename);

            // Read username and password from a secrets file.
            let credentials = fs::read_to_string(filename)
                .map_err(|err| ErrorCode::UnableToReadCredentials
                    .with_msg(&format!("Unable to read credentials from {}: {}", filename, err)))?;
            let mut credentials = credentials.lines();
            let uri = config.mongo_uri.replace("$USERNAME", credentials.next().unwrap_or_default());
            uri.replace("$PASSWORD", credentials.next().unwrap_or_default())
        },
        None => config.mongo_uri.clone(),
    };

    // Parse the uri now.
    let mut client_options = ClientOptions::parse(&uri).await?;

    // Manually set an option.
    client_options.app_name = Some(app_name.to_string());

    // Get a handle to the deployment.
    let client = Client::with_options(client_options)?;

    info!("Connecting to MongoDB...");

    let db = client.database(&config.db_name);
    ping(&db).await?;

    info!("Connected to MongoDB");
    Ok(db)
}

pub async fn ping(db: &Database) -> Result<Document, PavilionError> {
    Ok(db.run_command(doc! { "ping": 1 }, None).await?)
}

pub mod db;
pub mod model;
pub mod services;
pub mod utils;

use dotenv::dotenv;
use std::sync::Arc;
use utils::mongo;
use db::account::MongoAccountStore;
use utils::errors::PavilionError;
use utils::context::ServiceContext;
use utils::config::{Configuration, self};
use opentelemetry::{global, sdk::{propagation::TraceContextPropagator,trace,trace::Sampler}};
use tracing_subscriber::{prelude::__tracing_subscriber_SubscriberExt, Registry, util::SubscriberInitExt};

pub use services::{LoginOutcome, Registration};
pub use utils::errors::ErrorCode;

const APP_NAME: &str = "Pavilion";

///
/// Build everything the account operations need from the environment.
///
/// Loads any .env file, initialises tracing, connects to MongoDB and makes sure the indexes exist.
///
pub async fn bootstrap() -> Result<Arc<ServiceContext>, PavilionError> {

    // Load any local dev settings as environment variables from a .env file.
    dotenv().ok();

    // Default log level to INFO if it's not specified.
    config::default_env("RUST_LOG", "INFO");

    // Load the service configuration into struct.
    let config = Configuration::from_env()?;

    // Initialise tracing, with the Jaeger exporter if an endpoint is configured.
    if init_tracing(&config) {
        tracing::info!("Exporting traces to Jaeger");
    }

    tracing::info!("{} starting with configuration\n{}", APP_NAME, config.fmt_console()?);

    // Create a MongoDB client and connect to it before proceeding.
    let db = mongo::get_mongo_db(APP_NAME, &config).await?;

    // Ensure the schema is in sync with the code.
    mongo::update_mongo(&db).await?;

    let store = Arc::new(MongoAccountStore::new(db));
    Ok(Arc::new(ServiceContext::new(config, store)?))
}

///
/// Flush any spans still waiting to be exported to Jaeger.
///
pub fn shutdown() {
    global::shutdown_tracer_provider();
}

///
/// Initialise tracing and plug-in the Jaeger feature if enabled.
///
fn init_tracing(config: &Configuration) -> bool {
    global::set_text_map_propagator(TraceContextPropagator::new());

    match &config.jaeger_endpoint {
        Some(endpoint) if !endpoint.is_empty() => { // Install the Jaeger pipeline.
            let tracer = match opentelemetry_jaeger::new_pipeline()
                .with_service_name(APP_NAME)
                .with_trace_config(trace::config().with_sampler(Sampler::AlwaysOn))
                .with_agent_endpoint(endpoint.clone())
                .install_batch(opentelemetry::runtime::Tokio) {
                    Ok(tracer) => tracer,
                    Err(err) => {
                        eprintln!("Unable to build Jaeger pipeline, continuing without it: {}", err);
                        return init_tracing(&Configuration { jaeger_endpoint: None, ..config.clone() })
                    }
                };

            if let Err(err) = Registry::default()
                .with(tracing_subscriber::EnvFilter::from_default_env()) // Set the tracing level to match RUST_LOG env variable.
                .with(tracing_subscriber::fmt::layer().with_test_writer().with_ansi(true))
                .with(tracing_opentelemetry::layer().with_tracer(tracer))
                .try_init() {
                    tracing::info!("Tracing already initialised: {}", err.to_string()); // Allowed error here - tests call this fn repeatedly.
            }

            true
        },
        _ => {
            if let Err(err) = Registry::default()
                .with(tracing_subscriber::EnvFilter::from_default_env()) // Set the tracing level to match RUST_LOG env variable.
                .with(tracing_subscriber::fmt::layer().with_test_writer().with_ansi(true))
                .try_init() {
                    tracing::info!("Tracing already initialised: {}", err.to_string()); // Allowed error here - tests call this fn repeatedly.
            }

            false
        }
    }
}

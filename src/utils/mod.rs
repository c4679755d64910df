use uuid::Uuid;

pub mod config;
pub mod context;
pub mod errors;
pub mod mongo;
pub mod pii;
pub mod time_provider;
pub mod token;


pub fn generate_id() -> String {
    Uuid::new_v4().to_hyphenated().to_string()
}

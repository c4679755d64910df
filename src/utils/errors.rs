use bcrypt::BcryptError;
use mongodb::bson;
use tokio::task::JoinError;
use config::ConfigError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ErrorCode {
    HashThreadingIssue              = 0401,
    UnableToReadCredentials         = 0500,
    StorageFailure                  = 0503,
    InvalidBSON                     = 0504,
    InvalidJSON                     = 0505,
    HashingError                    = 0509,
    InvalidPHCFormat                = 0510,
    InvalidConfig                   = 0512,
    EncryptionError                 = 0513,
    TokenIssueError                 = 0514,
    InvalidArgument                 = 1000,
    InvalidEmail                    = 1001,
    PasswordNotSpecified            = 1002,
    PasswordReused                  = 2012,
    AccountNotFound                 = 2101,
    AccountLocked                   = 2102,
    InvalidCredentials              = 2103,
    EmailUnavailable                = 2300,
    InvalidToken                    = 2400,
}

impl ErrorCode {
    pub fn with_msg(&self, message: &str) -> PavilionError {
        PavilionError::new(*self, message)
    }

    ///
    /// The HTTP status the controller layer should answer with.
    ///
    pub fn http_status(&self) -> u16 {
        use ErrorCode::*;

        match self {
            HashThreadingIssue      |
            UnableToReadCredentials |
            StorageFailure          |
            InvalidBSON             |
            InvalidJSON             |
            HashingError            |
            InvalidPHCFormat        |
            InvalidConfig           |
            EncryptionError         |
            TokenIssueError         => 500,

            InvalidArgument      |
            InvalidEmail         |
            PasswordNotSpecified |
            PasswordReused       |
            EmailUnavailable     => 400,

            AccountNotFound => 404,

            AccountLocked      |
            InvalidCredentials |
            InvalidToken       => 401,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PavilionError {
    error_code: ErrorCode,
    message: String,
}

impl PavilionError {
    pub fn new(error_code: ErrorCode, message: &str) -> Self {
        PavilionError { error_code, message: message.to_string() }
    }

    pub fn error_code(&self) -> ErrorCode {
        self.error_code
    }

    ///
    /// The detailed message - for logs only, it may name accounts or driver internals.
    ///
    pub fn message(&self) -> &str {
        &self.message
    }

    ///
    /// The message safe to show an end user.
    ///
    /// These never reveal whether an email is registered or how long a lock has left to run.
    ///
    pub fn public_message(&self) -> &'static str {
        use ErrorCode::*;

        match self.error_code {
            PasswordReused       => "cannot reuse recent password",
            AccountLocked        => "account temporarily locked, try again later",
            InvalidCredentials   => "invalid email or password",
            InvalidToken         => "not authorised, please sign in again",
            EmailUnavailable     => "unable to register with the details provided",
            InvalidEmail         => "a valid email address is required",
            PasswordNotSpecified => "a password is required",
            InvalidArgument      => "the request was not valid",
            AccountNotFound      => "not found",
            _                    => "something went wrong, please try again later",
        }
    }

    pub fn http_status(&self) -> u16 {
        self.error_code.http_status()
    }
}

impl std::fmt::Display for PavilionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} ({}): {}", self.error_code, self.error_code as u32, self.message)
    }
}

impl std::error::Error for PavilionError {}

impl From<argon2::Error> for PavilionError {
    fn from(error: argon2::Error) -> Self {
        ErrorCode::InvalidConfig.with_msg(&format!("Invalid configuration for argon: {}", error))
    }
}

impl From<argon2::password_hash::Error> for PavilionError {
    fn from(error: argon2::password_hash::Error) -> Self {
        ErrorCode::HashingError.with_msg(&format!("Unable to hash password: {}", error))
    }
}

impl From<serde_json::Error> for PavilionError {
    fn from(error: serde_json::Error) -> Self {
        ErrorCode::InvalidJSON.with_msg(&format!("Unable to convert to json: {}", error))
    }
}

impl From<mongodb::error::Error> for PavilionError {
    fn from(error: mongodb::error::Error) -> Self {
        ErrorCode::StorageFailure.with_msg(&format!("MongoDB error: {}", error))
    }
}

impl From<bson::ser::Error> for PavilionError {
    fn from(error: bson::ser::Error) -> Self {
        ErrorCode::InvalidBSON.with_msg(&format!("Unable to serialise BSON: {}", error))
    }
}

impl From<bson::de::Error> for PavilionError {
    fn from(error: bson::de::Error) -> Self {
        ErrorCode::InvalidBSON.with_msg(&format!("Unable to deserialise BSON: {}", error))
    }
}

impl From<JoinError> for PavilionError {
    fn from(error: JoinError) -> Self {
        ErrorCode::HashThreadingIssue.with_msg(&format!("Unable to hash: {}", error))
    }
}

impl From<BcryptError> for PavilionError {
    fn from(error: BcryptError) -> Self {
        ErrorCode::HashingError.with_msg(&format!("Bcrypt failure: {}", error))
    }
}

impl From<ConfigError> for PavilionError {
    fn from(error: ConfigError) -> Self {
        ErrorCode::InvalidConfig.with_msg(&format!("The service configuration is not correct: {}", error))
    }
}

impl From<jsonwebtoken::errors::Error> for PavilionError {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match error.kind() {
            ErrorKind::InvalidKeyFormat => ErrorCode::TokenIssueError.with_msg(&format!("Token key is unusable: {}", error)),
            _ => ErrorCode::InvalidToken.with_msg(&format!("Token rejected: {}", error)),
        }
    }
}

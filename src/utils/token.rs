use uuid::Uuid;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use super::errors::{ErrorCode, PavilionError};

///
/// A freshly signed token and the reference the session registry keeps for it.
///
#[derive(Clone, Debug)]
pub struct IssuedToken {
    pub token: String,
    pub token_ref: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct TokenClaims {
    pub sub: String, // account_id
    pub jti: String, // token_ref
    pub iat: i64,
    pub exp: i64,
}

///
/// Signs and verifies bearer tokens. Time is passed in so the service clock governs expiry.
///
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, account_id: &str, now: DateTime<Utc>) -> Result<IssuedToken, PavilionError>;

    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, PavilionError>;
}

///
/// HS256 JSON web tokens.
///
pub struct JwtIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Result<Self, PavilionError> {
        if secret.trim().is_empty() {
            return Err(ErrorCode::InvalidConfig.with_msg("jwt_secret must be set"))
        }

        // Expiry is checked against our own clock in verify, not the system clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        Ok(JwtIssuer {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        })
    }
}

impl TokenIssuer for JwtIssuer {
    fn issue(&self, account_id: &str, now: DateTime<Utc>) -> Result<IssuedToken, PavilionError> {
        let expires_at = now + self.ttl;
        let claims = TokenClaims {
            sub: account_id.to_string(),
            jti: Uuid::new_v4().to_hyphenated().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ErrorCode::TokenIssueError.with_msg(&format!("Unable to sign token: {}", e)))?;

        Ok(IssuedToken { token, token_ref: claims.jti, expires_at })
    }

    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, PavilionError> {
        let claims = decode::<TokenClaims>(token, &self.decoding, &self.validation)?.claims;

        if Utc.timestamp(claims.exp, 0) <= now {
            return Err(ErrorCode::InvalidToken.with_msg(&format!("Token {} expired", claims.jti)))
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> JwtIssuer {
        JwtIssuer::new("a-test-secret", Duration::hours(24)).unwrap()
    }

    #[test]
    fn test_issue_and_verify() -> Result<(), PavilionError> {
        let now = Utc::now();
        let issued = issuer().issue("account-1", now)?;
        let claims = issuer().verify(&issued.token, now)?;

        assert_eq!(claims.sub, "account-1");
        assert_eq!(claims.jti, issued.token_ref);
        assert_eq!(issued.expires_at, now + Duration::hours(24));
        Ok(())
    }

    #[test]
    fn test_expired_token_is_rejected_by_service_clock() -> Result<(), PavilionError> {
        let now = Utc::now();
        let issued = issuer().issue("account-1", now)?;

        assert!(issuer().verify(&issued.token, now + Duration::hours(23)).is_ok());

        let err = issuer().verify(&issued.token, now + Duration::hours(24)).unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::InvalidToken);
        Ok(())
    }

    #[test]
    fn test_tampered_and_foreign_tokens_are_rejected() -> Result<(), PavilionError> {
        let now = Utc::now();
        let issued = issuer().issue("account-1", now)?;

        let other = JwtIssuer::new("another-secret", Duration::hours(24))?;
        assert_eq!(other.verify(&issued.token, now).unwrap_err().error_code(), ErrorCode::InvalidToken);
        assert_eq!(issuer().verify("not.a.token", now).unwrap_err().error_code(), ErrorCode::InvalidToken);
        Ok(())
    }

    #[test]
    fn test_empty_secret_is_refused() {
        assert!(JwtIssuer::new(" ", Duration::hours(1)).is_err());
    }
}

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::SecurityConfig;
use crate::itinerary::coerce::lenient;
use crate::itinerary::ItineraryError;

const ACCESS_TOKEN_TYPE: &str = "access_token";

/// Identity resolved from a bearer credential.
///
/// Compared against an itinerary's `owner` by exact string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Principal(String);

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id; numeric subjects are accepted and kept in string form
    #[serde(deserialize_with = "lenient::text")]
    pub sub: String,
    #[serde(rename = "type", default)]
    pub token_type: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(sub: impl Into<String>, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: sub.into(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug)]
pub enum JwtError {
    TokenGeneration(String),
    InvalidSecret,
    UnsupportedAlgorithm(String),
    InvalidToken(String),
}

impl fmt::Display for JwtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JwtError::TokenGeneration(msg) => write!(f, "JWT generation error: {}", msg),
            JwtError::InvalidSecret => write!(f, "Invalid JWT secret"),
            JwtError::UnsupportedAlgorithm(alg) => write!(f, "Unsupported JWT algorithm: {}", alg),
            JwtError::InvalidToken(msg) => write!(f, "Invalid JWT token: {}", msg),
        }
    }
}

impl std::error::Error for JwtError {}

/// Shared-secret signing material
#[derive(Clone)]
pub struct JwtKeys {
    secret: String,
    algorithm: Algorithm,
}

impl JwtKeys {
    pub fn new(secret: impl Into<String>, algorithm: Algorithm) -> Result<Self, JwtError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }
        // Only HMAC algorithms work with a shared secret
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(JwtError::UnsupportedAlgorithm(format!("{:?}", algorithm)));
        }
        Ok(Self { secret, algorithm })
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, JwtError> {
        let algorithm = Algorithm::from_str(&security.jwt_algorithm)
            .map_err(|_| JwtError::UnsupportedAlgorithm(security.jwt_algorithm.clone()))?;
        Self::new(security.jwt_secret.clone(), algorithm)
    }
}

pub fn generate_jwt(claims: &Claims, keys: &JwtKeys) -> Result<String, JwtError> {
    let encoding_key = EncodingKey::from_secret(keys.secret.as_bytes());
    let header = Header::new(keys.algorithm);

    encode(&header, claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Validate signature and expiry, returning the claims
pub fn decode_jwt(token: &str, keys: &JwtKeys) -> Result<Claims, JwtError> {
    let decoding_key = DecodingKey::from_secret(keys.secret.as_bytes());
    let validation = Validation::new(keys.algorithm);

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| JwtError::InvalidToken(e.to_string()))
}

/// Turns an opaque bearer credential into a principal.
///
/// Resolution is a pure function of the credential; session state such as
/// where the client keeps its token stays with the caller.
pub trait CredentialResolver: Send + Sync {
    fn resolve(&self, credential: &str) -> Result<Principal, ItineraryError>;
}

pub struct JwtCredentialResolver {
    keys: JwtKeys,
}

impl JwtCredentialResolver {
    pub fn new(keys: JwtKeys) -> Self {
        Self { keys }
    }
}

impl CredentialResolver for JwtCredentialResolver {
    fn resolve(&self, credential: &str) -> Result<Principal, ItineraryError> {
        let claims = decode_jwt(credential, &self.keys).map_err(|e| {
            tracing::debug!("Rejected bearer token: {}", e);
            ItineraryError::Unauthenticated("Token not valid".to_string())
        })?;

        if claims.sub.trim().is_empty() {
            return Err(ItineraryError::Unauthenticated("Token has no subject".to_string()));
        }
        if !claims.token_type.is_empty() && claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(ItineraryError::Unauthenticated("Token is not an access token".to_string()));
        }

        Ok(Principal::new(claims.sub))
    }
}

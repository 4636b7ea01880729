//! Password hashing and token primitives.
//!
//! Access tokens are HS256 JWTs carrying the user id as subject. Refresh and
//! password reset tokens are opaque random strings; only their SHA-256 hex
//! digest is ever persisted, so presented tokens can be looked up by hash.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Length of opaque refresh/reset tokens in characters.
const OPAQUE_TOKEN_LEN: usize = 64;

/// JWT claims for access tokens.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
    iat: i64,
}

/// Hash a plain password with bcrypt at the given cost factor.
pub fn hash_password(plain: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(plain, cost)
}

/// Verify a plain password against a stored bcrypt hash.
pub fn verify_password(plain: &str, hashed: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(plain, hashed)
}

/// Create a signed access token for a user.
///
/// Returns the encoded token together with its lifetime in seconds, which is
/// what the API reports as `expires_in`.
pub fn create_access_token(
    user_id: Uuid,
    secret: &str,
    minutes: i64,
) -> Result<(String, i64), jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let lifetime = Duration::minutes(minutes);

    let claims = Claims {
        sub: user_id.to_string(),
        exp: (now + lifetime).timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok((token, lifetime.num_seconds()))
}

/// Token verification failures. Expired tokens are distinguished internally
/// so callers can log them, but both map to the same 401 at the API boundary.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,
}

/// Decode an access token, validating signature and expiry, and return the
/// subject user id.
pub fn decode_access_token(token: &str, secret: &str) -> Result<Uuid, TokenError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })?;

    Uuid::parse_str(&data.claims.sub).map_err(|_| TokenError::Invalid)
}

/// Generate a high-entropy opaque token. The raw value is handed to the
/// caller exactly once; only its hash is stored.
pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(OPAQUE_TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// SHA-256 hex digest of an opaque token.
pub fn hash_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

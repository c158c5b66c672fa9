use std::collections::HashSet;

use anyhow::Result;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

const SIGNING_KEY_NAME: &str = "jwt_signing_key";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
    pub nbf: usize,
    pub jti: String,
}

pub async fn get_or_create_signing_key(pool: &SqlitePool) -> Result<Vec<u8>> {
    let existing: Option<(Vec<u8>,)> =
        sqlx::query_as("SELECT value FROM app_secrets WHERE key = ?")
            .bind(SIGNING_KEY_NAME)
            .fetch_optional(pool)
            .await?;

    if let Some((value,)) = existing {
        return Ok(value);
    }

    let mut key_bytes = [0_u8; 64];
    rand::thread_rng().fill_bytes(&mut key_bytes);
    let key = key_bytes.to_vec();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query("INSERT OR IGNORE INTO app_secrets (key, value, created_at) VALUES (?, ?, ?)")
        .bind(SIGNING_KEY_NAME)
        .bind(&key)
        .bind(&now)
        .execute(pool)
        .await?;

    let stored: (Vec<u8>,) = sqlx::query_as("SELECT value FROM app_secrets WHERE key = ?")
        .bind(SIGNING_KEY_NAME)
        .fetch_one(pool)
        .await?;

    Ok(stored.0)
}

pub fn create_token(key: &[u8], user: &str, ttl_secs: usize) -> Result<String> {
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user.to_string(),
        exp: now + ttl_secs,
        iat: now,
        nbf: now,
        jti: Uuid::new_v4().to_string(),
    };

    let token = encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(key))?;
    Ok(token)
}

pub fn verify_token(key: &[u8], token: &str) -> Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_nbf = true;
    validation.required_spec_claims = HashSet::from([
        "exp".to_string(),
        "nbf".to_string(),
        "iat".to_string(),
        "sub".to_string(),
        "jti".to_string(),
    ]);

    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(key), &validation)?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips_subject() {
        let key = b"test-signing-key-test-signing-key";
        let token = create_token(key, "alice@example.com", 60).unwrap();
        let claims = verify_token(key, &token).unwrap();
        assert_eq!(claims.sub, "alice@example.com");
    }

    #[test]
    fn token_signed_with_other_key_is_rejected() {
        let token = create_token(b"key-one-key-one-key-one", "alice", 60).unwrap();
        assert!(verify_token(b"key-two-key-two-key-two", &token).is_err());
    }
}

//! Bearer-token authentication.
//!
//! Access tokens are HS256 JWTs signed with the server's `XPG_JWT_SIGNING_KEY`. Claims carry the
//! merchant's subject id and an expiry; nothing else. Handlers receive the verified claims
//! through the [`JwtClaims`] extractor, so an unauthenticated request never reaches handler code.

use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use chrono::Utc;
use hmac::{Hmac, Mac};
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use xpg_common::Secret;

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
    helpers::to_hex,
};

type HmacSha256 = Hmac<Sha256>;

const JWT_HEADER_B64: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9"; // {"alg":"HS256","typ":"JWT"}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The merchant's subject id.
    pub sub: String,
    /// Expiry as a unix timestamp.
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenIssuer {
    signing_key: Secret<String>,
    validity: chrono::Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { signing_key: config.jwt_signing_key.clone(), validity: config.token_validity }
    }

    /// Issues a new signed access token for the given subject.
    pub fn issue_token(&self, subject_id: &str) -> Result<String, AuthError> {
        let claims = JwtClaims { sub: subject_id.to_string(), exp: (Utc::now() + self.validity).timestamp() };
        let claims_json =
            serde_json::to_vec(&claims).map_err(|e| AuthError::ValidationError(format!("Claims encoding: {e}")))?;
        let payload = format!("{JWT_HEADER_B64}.{}", base64::encode_config(claims_json, base64::URL_SAFE_NO_PAD));
        let signature = self.sign(payload.as_bytes())?;
        Ok(format!("{payload}.{}", base64::encode_config(signature, base64::URL_SAFE_NO_PAD)))
    }

    /// Verifies the signature and expiry of an access token and returns its claims.
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let mut parts = token.split('.');
        let (header, claims, signature) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(h), Some(c), Some(s), None) => (h, c, s),
            _ => return Err(AuthError::PoorlyFormattedToken("Expected three dot-separated segments".to_string())),
        };
        let signature = base64::decode_config(signature, base64::URL_SAFE_NO_PAD)
            .map_err(|e| AuthError::PoorlyFormattedToken(format!("Signature encoding: {e}")))?;
        let payload = format!("{header}.{claims}");
        let mut mac = HmacSha256::new_from_slice(self.signing_key.reveal().as_bytes())
            .map_err(|e| AuthError::ValidationError(e.to_string()))?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature).map_err(|_| AuthError::ValidationError("Signature mismatch".to_string()))?;
        let claims = base64::decode_config(claims, base64::URL_SAFE_NO_PAD)
            .map_err(|e| AuthError::PoorlyFormattedToken(format!("Claims encoding: {e}")))?;
        let claims: JwtClaims = serde_json::from_slice(&claims)
            .map_err(|e| AuthError::PoorlyFormattedToken(format!("Claims structure: {e}")))?;
        if claims.exp < Utc::now().timestamp() {
            return Err(AuthError::TokenExpired);
        }
        Ok(claims)
    }

    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, AuthError> {
        let mut mac = HmacSha256::new_from_slice(self.signing_key.reveal().as_bytes())
            .map_err(|e| AuthError::ValidationError(e.to_string()))?;
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract_claims(req))
    }
}

fn extract_claims(req: &HttpRequest) -> Result<JwtClaims, ServerError> {
    let issuer = req
        .app_data::<web::Data<TokenIssuer>>()
        .ok_or_else(|| ServerError::InitializeError("Token issuer is not configured".to_string()))?;
    let header = req.headers().get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let token = header
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AuthError::PoorlyFormattedToken("Expected a Bearer token".to_string()))?;
    let claims = issuer.validate_token(token.trim()).map_err(|e| {
        debug!("💻️ Access token rejected. {e}");
        e
    })?;
    Ok(claims)
}

/// Hashes a password with a fresh random salt. The stored form is `salt$hexdigest`.
pub fn hash_password(password: &str) -> String {
    let salt: String = thread_rng().sample_iter(&Alphanumeric).take(16).map(char::from).collect();
    format!("{salt}${}", digest(&salt, password))
}

/// Constant-format check of a password against a stored `salt$hexdigest` value.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, hash)) => digest(salt, password) == hash,
        None => false,
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    to_hex(&hasher.finalize())
}

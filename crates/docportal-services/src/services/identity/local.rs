//! Built-in identity provider
//!
//! Identities live in the record store's `identities` collection with argon2
//! password hashes. Sessions are HS256 JWTs; a token is only valid while its
//! identity exists and its password has not changed since issue.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use docportal_core::validation::{normalize_email, validate_email, validate_password};
use docportal_core::{AppError, Config, ErrorMetadata};
use docportal_db::{IdentityRecord, IdentityRepository};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::password::{hash_password, verify_password};
use super::{IdentityError, IdentityProvider, IdentityResult, Session};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    iat: i64,
    exp: i64,
}

#[derive(Clone)]
pub struct LocalIdentityProvider {
    identities: IdentityRepository,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    session_hours: i64,
    password_min_length: usize,
}

/// A missing identity record reads as `NotFound`; every other store failure
/// means the provider is unavailable.
fn unavailable(err: AppError) -> IdentityError {
    match err {
        AppError::NotFound(_) => IdentityError::NotFound,
        other => IdentityError::Unavailable(other.to_string()),
    }
}

impl LocalIdentityProvider {
    pub fn new(
        identities: IdentityRepository,
        jwt_secret: &str,
        session_hours: i64,
        password_min_length: usize,
    ) -> Self {
        Self {
            identities,
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            session_hours,
            password_min_length,
        }
    }

    pub fn from_config(config: &Config, identities: IdentityRepository) -> Self {
        Self::new(
            identities,
            config.jwt_secret(),
            config.jwt_expiry_hours(),
            config.password_min_length(),
        )
    }

    fn check_password_policy(&self, password: &str) -> IdentityResult<()> {
        validate_password(password, self.password_min_length)
            .map_err(|e| IdentityError::WeakPassword(e.client_message()))
    }

    async fn record_by_id(&self, id: Uuid) -> IdentityResult<IdentityRecord> {
        self.identities
            .find_by_id(id)
            .await
            .map_err(unavailable)?
            .ok_or(IdentityError::NotFound)
    }

    fn issue_session(&self, record: &IdentityRecord) -> IdentityResult<Session> {
        let now = Utc::now();
        let expires_at = now + Duration::hours(self.session_hours);
        let claims = Claims {
            sub: record.id.to_string(),
            email: record.email.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| IdentityError::Unavailable(format!("Failed to sign session: {}", e)))?;
        Ok(Session {
            token,
            account_id: record.id,
            expires_at,
        })
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    #[tracing::instrument(skip(self, password))]
    async fn create_identity(&self, email: &str, password: &str) -> IdentityResult<Uuid> {
        let email =
            validate_email(email).map_err(|e| IdentityError::InvalidEmail(e.client_message()))?;
        self.check_password_policy(password)?;

        let record = IdentityRecord {
            id: Uuid::new_v4(),
            email: email.clone(),
            password_hash: hash_password(password)?,
            created_at: Utc::now(),
            password_changed_at: None,
        };
        if !self.identities.create(&record).await.map_err(unavailable)? {
            return Err(IdentityError::EmailAlreadyInUse(email));
        }
        tracing::debug!(identity_id = %record.id, "Identity registered");
        Ok(record.id)
    }

    async fn verify_identity(&self, token: &str) -> IdentityResult<Uuid> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| IdentityError::InvalidOrExpiredToken)?;
        let id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| IdentityError::InvalidOrExpiredToken)?;

        let record = match self.record_by_id(id).await {
            Ok(record) => record,
            Err(IdentityError::NotFound) => return Err(IdentityError::InvalidOrExpiredToken),
            Err(e) => return Err(e),
        };
        if let Some(changed) = record.password_changed_at {
            if changed.timestamp() > data.claims.iat {
                return Err(IdentityError::InvalidOrExpiredToken);
            }
        }
        Ok(id)
    }

    #[tracing::instrument(skip(self), fields(identity_id = %id))]
    async fn delete_identity(&self, id: Uuid) -> IdentityResult<()> {
        let record = self.record_by_id(id).await?;
        if !self.identities.delete(&record.email).await.map_err(unavailable)? {
            return Err(IdentityError::NotFound);
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, current, new_password), fields(identity_id = %id))]
    async fn change_password(
        &self,
        id: Uuid,
        current: &str,
        new_password: &str,
    ) -> IdentityResult<()> {
        let record = self.record_by_id(id).await?;
        if !verify_password(current, &record.password_hash)? {
            return Err(IdentityError::WrongCurrentPassword);
        }
        self.check_password_policy(new_password)?;
        self.identities
            .update_password_hash(&record.email, &hash_password(new_password)?, Utc::now())
            .await
            .map_err(unavailable)
    }

    #[tracing::instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> IdentityResult<Session> {
        let email = normalize_email(email);
        let record = self
            .identities
            .find_by_email(&email)
            .await
            .map_err(unavailable)?
            .ok_or(IdentityError::InvalidCredentials)?;
        if !verify_password(password, &record.password_hash)? {
            return Err(IdentityError::InvalidCredentials);
        }
        self.issue_session(&record)
    }

    #[tracing::instrument(skip(self, new_password), fields(identity_id = %id))]
    async fn set_password(&self, id: Uuid, new_password: &str) -> IdentityResult<()> {
        let record = self.record_by_id(id).await?;
        self.check_password_policy(new_password)?;
        self.identities
            .update_password_hash(&record.email, &hash_password(new_password)?, Utc::now())
            .await
            .map_err(unavailable)
    }

    fn provider_name(&self) -> &'static str {
        "local"
    }
}

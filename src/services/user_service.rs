use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{hash_password, verify_password, JwtError, JwtKeys, PasswordError};
use crate::database::models::{NewUser, UserProfile};
use crate::database::{RepositoryError, UserStore};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Error)]
pub enum UserServiceError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Token(#[from] JwtError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("Password worker failed: {0}")]
    Worker(String),
}

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    jwt: JwtKeys,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, jwt: JwtKeys) -> Self {
        Self { store, jwt }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<UserProfile, UserServiceError> {
        let password = request.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| UserServiceError::Worker(e.to_string()))??;

        let user = self
            .store
            .create(NewUser {
                email: request.email.trim().to_string(),
                first_name: request.first_name,
                last_name: request.last_name,
                password_hash,
            })
            .await?;

        info!(user_id = %user.id, "Registered user");
        Ok(user.into())
    }

    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, request: LoginRequest) -> Result<String, UserServiceError> {
        let Some(user) = self.store.find_by_email(request.email.trim()).await? else {
            warn!("Login attempt for unknown email");
            return Err(UserServiceError::InvalidCredentials);
        };

        let password = request.password;
        let stored = user.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
            .await
            .map_err(|e| UserServiceError::Worker(e.to_string()))?;
        if !valid {
            warn!(user_id = %user.id, "Login attempt with wrong password");
            return Err(UserServiceError::InvalidCredentials);
        }

        let token = self.jwt.issue(user.id, &user.email)?;
        info!(user_id = %user.id, "User logged in");
        Ok(token)
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<UserProfile, UserServiceError> {
        self.store
            .find_by_id(user_id)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| RepositoryError::NotFound("User not found".to_string()).into())
    }
}

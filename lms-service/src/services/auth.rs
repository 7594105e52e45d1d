//! Authentication workflows: signup and login.

use crate::models::user::{AuthResponse, LoginRequest, SignupRequest};
use crate::services::{Database, JwtService};
use crate::utils::password::{hash_password, verify_password, Password};
use service_core::error::AppError;

const DEFAULT_SIGNUP_ROLE: &str = "Employee";

/// Signup/login service. Credential handling lives here so handlers stay
/// thin route adapters.
#[derive(Clone)]
pub struct AuthService {
    db: Database,
    jwt: JwtService,
}

impl AuthService {
    pub fn new(db: Database, jwt: JwtService) -> Self {
        Self { db, jwt }
    }

    /// Register a new user and mint their first session token.
    ///
    /// The role defaults to "Employee" when the request names none. The
    /// credential is argon2-hashed before anything touches the database.
    pub async fn signup(&self, req: SignupRequest) -> Result<AuthResponse, AppError> {
        let role_name = req
            .role_name
            .as_deref()
            .unwrap_or(DEFAULT_SIGNUP_ROLE);

        let role = self
            .db
            .find_role_by_name(role_name)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("Invalid role specified for signup.".to_string())
            })?;

        if self
            .db
            .email_or_username_taken(&req.email, &req.username)
            .await?
        {
            return Err(AppError::Conflict(
                "User already exists with the provided email or username.".to_string(),
            ));
        }

        let password_hash = hash_password(&Password::new(req.password))?;

        let user = self
            .db
            .insert_user(
                &req.first_name,
                &req.last_name,
                &req.username,
                &req.email,
                password_hash.as_str(),
                role.id,
            )
            .await?;

        let token = self.jwt.generate_token(user.id, user.role_id)?;
        let role = self.db.role_with_permissions(user.role_id).await?;

        Ok(AuthResponse {
            token,
            user: user.sanitized(role),
        })
    }

    /// Authenticate by email-or-username identifier plus password.
    ///
    /// Unknown identifier and wrong password produce byte-identical
    /// responses so the endpoint leaks no account-existence signal.
    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, AppError> {
        let invalid = || AppError::Unauthorized("Invalid credentials.".to_string());

        let user = self
            .db
            .find_user_by_identifier(&req.email)
            .await?
            .ok_or_else(invalid)?;

        verify_password(&Password::new(req.password), &user.password).map_err(|_| invalid())?;

        let token = self.jwt.generate_token(user.id, user.role_id)?;
        let role = self.db.role_with_permissions(user.role_id).await?;

        Ok(AuthResponse {
            token,
            user: user.sanitized(role),
        })
    }
}

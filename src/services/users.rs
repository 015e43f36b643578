//! Authentication and user management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{
        AccountStatus, RegisterUser, User, UserClaims, UserQuery, UserRole, UserSummary,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Register a new patron account. Accounts start PENDING and must be
    /// approved by staff before the user can borrow.
    pub async fn register(&self, req: RegisterUser) -> AppResult<User> {
        req.validate()?;

        if self.repository.users.email_exists(&req.email).await? {
            return Err(AppError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }
        if self
            .repository
            .users
            .university_id_exists(req.university_id)
            .await?
        {
            return Err(AppError::Conflict(
                "An account with this university ID already exists".to_string(),
            ));
        }

        let password_hash = self.hash_password(&req.password)?;
        let user = self.repository.users.create(&req, &password_hash).await?;

        tracing::info!("Registered new account {} ({})", user.id, user.email);
        Ok(user)
    }

    /// Authenticate by email and password, returning a JWT and the user
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_email(email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

        if !self.verify_password(&user, password)? {
            return Err(AppError::Authentication(
                "Invalid email or password".to_string(),
            ));
        }

        self.repository.users.touch_last_activity(user.id).await?;

        let token = self.create_token(&user)?;
        Ok((token, user))
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Search users with pagination (admin)
    pub async fn search_users(&self, query: &UserQuery) -> AppResult<(Vec<UserSummary>, i64)> {
        self.repository.users.search(query, None).await
    }

    /// Pending account requests (admin)
    pub async fn account_requests(&self, query: &UserQuery) -> AppResult<(Vec<UserSummary>, i64)> {
        self.repository
            .users
            .search(query, Some(AccountStatus::Pending))
            .await
    }

    /// Approve or reject an account request
    pub async fn update_status(&self, id: Uuid, status: AccountStatus) -> AppResult<User> {
        if status == AccountStatus::Pending {
            return Err(AppError::BadRequest(
                "Status must be APPROVED or REJECTED".to_string(),
            ));
        }

        let user = self.repository.users.update_status(id, status).await?;
        tracing::info!("Account {} set to {}", user.id, status);
        Ok(user)
    }

    /// Change a user's role
    pub async fn update_role(&self, id: Uuid, role: UserRole) -> AppResult<User> {
        let user = self.repository.users.update_role(id, role).await?;
        tracing::info!("User {} role set to {}", user.id, role);
        Ok(user)
    }

    /// Delete a user
    pub async fn delete_user(&self, id: Uuid, force: bool) -> AppResult<()> {
        self.repository.users.delete(id, force).await?;
        tracing::info!("Deleted user {}", id);
        Ok(())
    }

    fn create_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.email.clone(),
            user_id: user.id,
            role: user.role,
            status: user.status,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(&user.password_hash)
            .map_err(|e| AppError::Internal(format!("Invalid stored password hash: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

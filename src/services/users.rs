//! Staff accounts: authentication and user management

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::{
    config::{AuthConfig, BootstrapAdminConfig},
    error::{AppError, AppResult},
    models::{
        user::{
            AuthContext, CreateUser, LoginResponse, NewUser, Role, UpdateUser, User, UserClaims,
            UserConflicts, UserQuery,
        },
        PageRequest,
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

    /// Authenticate by username or email and return a JWT
    pub async fn authenticate(&self, login: &str, password: &str) -> AppResult<LoginResponse> {
        let user = self
            .repository
            .users_get_by_login(login.trim())
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid login or password".to_string()))?;

        if !self.verify_password(&user, password)? {
            tracing::warn!("Failed login attempt for {}", login);
            return Err(AppError::Authentication("Invalid login or password".to_string()));
        }

        let expiration_hours = self.config.jwt_expiration_hours as i64;
        let token = UserClaims::new(&user, expiration_hours)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        tracing::info!("User {} logged in", user.id);
        Ok(LoginResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: expiration_hours * 3600,
            user,
        })
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    async fn conflicts(
        &self,
        email: Option<&str>,
        username: Option<&str>,
        exclude_id: Option<i32>,
    ) -> AppResult<UserConflicts> {
        let email_taken = match email.filter(|e| !e.is_empty()) {
            Some(email) => self.repository.users_email_taken(email, exclude_id).await?,
            None => false,
        };
        let username_taken = match username.filter(|u| !u.is_empty()) {
            Some(username) => self.repository.users_username_taken(username, exclude_id).await?,
            None => false,
        };
        Ok(UserConflicts {
            email_taken,
            username_taken,
        })
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users_get_by_id(id).await
    }

    pub async fn list(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64, PageRequest)> {
        let page = PageRequest::new(query.page, query.per_page);
        let (users, total) = self.repository.users_list(query, page).await?;
        Ok((users, total, page))
    }

    pub async fn create(&self, data: &CreateUser) -> AppResult<User> {
        let conflicts = self
            .conflicts(data.email.as_deref(), data.username.as_deref(), None)
            .await?;
        let new_user = data.check(conflicts)?;
        let hash = self.hash_password(&new_user.password)?;
        let user = self.repository.users_create(&new_user, &hash).await?;
        tracing::info!("User created: id={} role={}", user.id, user.role);
        Ok(user)
    }

    pub async fn update(&self, id: i32, data: &UpdateUser) -> AppResult<User> {
        self.repository.users_get_by_id(id).await?;
        let conflicts = self
            .conflicts(data.email.as_deref(), data.username.as_deref(), Some(id))
            .await?;
        let changes = data.check(conflicts)?;
        let hash = match changes.password.as_deref() {
            Some(password) => Some(self.hash_password(password)?),
            None => None,
        };
        self.repository.users_update(id, &changes, hash.as_deref()).await
    }

    /// Delete a user; nobody can delete their own account
    pub async fn delete(&self, ctx: AuthContext, id: i32) -> AppResult<()> {
        if ctx.user_id == id {
            return Err(AppError::Authorization("You cannot delete your own account".to_string()));
        }
        self.repository.users_delete(id).await?;
        tracing::info!("User {} deleted by user {}", id, ctx.user_id);
        Ok(())
    }

    /// Create the configured admin account when no user exists yet
    pub async fn ensure_bootstrap_admin(&self) -> AppResult<Option<User>> {
        let Some(admin) = self.config.bootstrap_admin.as_ref() else {
            return Ok(None);
        };
        if self.repository.users_count().await? > 0 {
            return Ok(None);
        }

        let BootstrapAdminConfig {
            name,
            username,
            email,
            password,
        } = admin;
        let new_user = NewUser {
            name: name.clone(),
            username: Some(username.clone()).filter(|u| !u.is_empty()),
            email: email.clone(),
            password: password.clone(),
            role: Role::Admin,
        };
        let hash = self.hash_password(&new_user.password)?;
        let user = self.repository.users_create(&new_user, &hash).await?;
        tracing::warn!("Created bootstrap admin account '{}'; change its password", user.email);
        Ok(Some(user))
    }
}

//! Staff user model, roles and JWT claims

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::{AppError, FieldErrors};

/// Staff role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::User => "user",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "user" => Ok(Role::User),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

// SQLx conversion for Role (stored as TEXT)
impl sqlx::Type<Postgres> for Role {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for Role {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for Role {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Staff account
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub username: Option<String>,
    pub email: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing, default)]
    pub password: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Short user representation embedded in bookings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserRef {
    pub id: i32,
    pub name: String,
}

/// User list filters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct UserQuery {
    /// Matches name or email
    pub search: Option<String>,
    pub role: Option<String>,
    /// name, email, role or created_at
    pub sort_by: Option<String>,
    /// asc or desc
    pub sort_order: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Column to sort users by; unknown keys fall back to creation time
pub fn user_sort_column(sort_by: Option<&str>) -> &'static str {
    match sort_by {
        Some("name") => "name",
        Some("email") => "email",
        Some("role") => "role",
        _ => "created_at",
    }
}

/// Create user request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(
        required(message = "The name field is required"),
        length(min = 1, max = 255, message = "The name must be between 1 and 255 characters")
    )]
    pub name: Option<String>,
    #[validate(
        length(min = 3, max = 255, message = "The username must be between 3 and 255 characters")
    )]
    pub username: Option<String>,
    #[validate(
        required(message = "The email field is required"),
        email(message = "The email must be a valid email address")
    )]
    pub email: Option<String>,
    #[validate(
        required(message = "The password field is required"),
        length(min = 6, message = "The password must be at least 6 characters")
    )]
    pub password: Option<String>,
    /// admin, manager or user (defaults to user)
    pub role: Option<String>,
}

/// Update user request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(
        length(min = 1, max = 255, message = "The name must be between 1 and 255 characters")
    )]
    pub name: Option<String>,
    #[validate(
        length(min = 3, max = 255, message = "The username must be between 3 and 255 characters")
    )]
    pub username: Option<String>,
    #[validate(email(message = "The email must be a valid email address"))]
    pub email: Option<String>,
    /// Only applied when non-empty
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Uniqueness lookups done by the caller before validating a user request
#[derive(Debug, Clone, Copy, Default)]
pub struct UserConflicts {
    pub email_taken: bool,
    pub username_taken: bool,
}

/// Validated fields for a new user; the password is still in clear text
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub username: Option<String>,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Validated changes for an existing user
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

fn parse_role(errors: &mut FieldErrors, role: Option<&str>) -> Option<Role> {
    let raw = role?;
    match raw.parse() {
        Ok(role) => Some(role),
        Err(_) => {
            errors.add("role", "The selected role is invalid");
            None
        }
    }
}

fn check_conflicts(errors: &mut FieldErrors, conflicts: UserConflicts) {
    if conflicts.email_taken {
        errors.add("email", "The email has already been taken");
    }
    if conflicts.username_taken {
        errors.add("username", "The username has already been taken");
    }
}

impl CreateUser {
    pub fn check(&self, conflicts: UserConflicts) -> Result<NewUser, FieldErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };
        check_conflicts(&mut errors, conflicts);
        let role = parse_role(&mut errors, self.role.as_deref());

        match (&self.name, &self.email, &self.password) {
            (Some(name), Some(email), Some(password)) if errors.is_empty() => Ok(NewUser {
                name: name.clone(),
                username: self.username.clone().filter(|u| !u.is_empty()),
                email: email.clone(),
                password: password.clone(),
                role: role.unwrap_or(Role::User),
            }),
            _ => Err(errors),
        }
    }
}

impl UpdateUser {
    pub fn check(&self, conflicts: UserConflicts) -> Result<UserChanges, FieldErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };
        check_conflicts(&mut errors, conflicts);
        let role = parse_role(&mut errors, self.role.as_deref());

        let password = self.password.clone().filter(|p| !p.is_empty());
        if password.as_ref().is_some_and(|p| p.chars().count() < 6) {
            errors.add("password", "The password must be at least 6 characters");
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(UserChanges {
            name: self.name.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            password,
            role,
        })
    }
}

/// Login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// Username or email
    #[validate(length(min = 1, message = "The login field is required"))]
    pub login: String,
    #[validate(length(min = 1, message = "The password field is required"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    /// Lifetime of the token in seconds
    pub expires_in: i64,
    pub user: User,
}

/// The acting staff member for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: i32,
    pub role: Role,
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    pub fn new(user: &User, expiration_hours: i64) -> Self {
        let now = Utc::now();
        Self {
            sub: user.email.clone(),
            user_id: user.id,
            role: user.role,
            exp: (now + chrono::Duration::hours(expiration_hours)).timestamp(),
            iat: now.timestamp(),
        }
    }

    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn context(&self) -> AuthContext {
        AuthContext {
            user_id: self.user_id,
            role: self.role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Require admin privileges
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(role: Role) -> User {
        User {
            id: 7,
            name: "Sara".to_string(),
            username: Some("sara".to_string()),
            email: "sara@example.com".to_string(),
            password: "hash".to_string(),
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("Manager".parse::<Role>(), Ok(Role::Manager));
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn password_is_never_serialized() {
        let json = serde_json::to_value(sample_user(Role::User)).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn token_round_trip_keeps_identity() {
        let claims = UserClaims::new(&sample_user(Role::Admin), 1);
        let token = claims.create_token("secret").unwrap();
        let decoded = UserClaims::from_token(&token, "secret").unwrap();
        assert_eq!(decoded.user_id, 7);
        assert!(decoded.require_admin().is_ok());
        assert!(UserClaims::from_token(&token, "other").is_err());
    }

    #[test]
    fn non_admin_is_rejected() {
        let claims = UserClaims::new(&sample_user(Role::Manager), 1);
        assert!(matches!(claims.require_admin(), Err(AppError::Authorization(_))));
    }

    #[test]
    fn create_user_collects_errors() {
        let request = CreateUser {
            name: None,
            username: None,
            email: Some("not-an-email".to_string()),
            password: Some("123".to_string()),
            role: Some("owner".to_string()),
        };
        let errors = request
            .check(UserConflicts {
                email_taken: false,
                username_taken: false,
            })
            .unwrap_err();
        for field in ["name", "email", "password", "role"] {
            assert!(errors.contains(field), "missing error for {}", field);
        }
    }

    #[test]
    fn create_user_defaults_role() {
        let request = CreateUser {
            name: Some("Omar".to_string()),
            username: None,
            email: Some("omar@example.com".to_string()),
            password: Some("secret1".to_string()),
            role: None,
        };
        let user = request.check(UserConflicts::default()).unwrap();
        assert_eq!(user.role, Role::User);
        assert_eq!(user.email, "omar@example.com");
    }

    #[test]
    fn update_ignores_empty_password() {
        let request = UpdateUser {
            password: Some(String::new()),
            ..Default::default()
        };
        let changes = request.check(UserConflicts::default()).unwrap();
        assert!(changes.password.is_none());

        let short = UpdateUser {
            password: Some("abc".to_string()),
            ..Default::default()
        };
        assert!(short.check(UserConflicts::default()).unwrap_err().contains("password"));
    }

    #[test]
    fn unknown_sort_column_falls_back() {
        assert_eq!(user_sort_column(Some("email")), "email");
        assert_eq!(user_sort_column(Some("password")), "created_at");
    }
}

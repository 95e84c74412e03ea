//! Account routes: two-phase registration, login, password recovery.

use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{ApiResponse, User};
use crate::routes::JsonBody;
use crate::services::auth::{AuthService, Registration};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, alias = "confirmPassword")]
    pub confirm_password: String,
    #[serde(default, alias = "nama_lengkap")]
    pub full_name: Option<String>,
    #[serde(default, alias = "nomor_telepon")]
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub email: String,
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<ApiResponse<RegisterResponse>> {
    let email = AuthService::new(&state)
        .register(&Registration {
            email: &req.email,
            username: &req.username,
            password: &req.password,
            confirm_password: &req.confirm_password,
            full_name: req.full_name.as_deref(),
            phone: req.phone.as_deref(),
        })
        .await?;

    Ok(ApiResponse::ok(
        "OTP sent to your email",
        RegisterResponse {
            email: email.into_inner(),
        },
    ))
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub otp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreated {
    pub user_id: selempangku_core::UserId,
}

/// POST /auth/verify-email
pub async fn verify_email(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<VerifyEmailRequest>,
) -> Result<ApiResponse<UserCreated>> {
    let user = AuthService::new(&state)
        .verify_email(&req.email, &req.otp)
        .await?;
    Ok(ApiResponse::created(
        "Email verified, account created",
        UserCreated { user_id: user.id },
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    fn ensure_present(&self) -> Result<()> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(AppError::Validation(
                "Email and password are required".to_owned(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<ApiResponse<LoginResponse>> {
    req.ensure_present()?;
    let (token, user) = AuthService::new(&state)
        .login(&req.email, &req.password)
        .await?;
    Ok(ApiResponse::ok("Login successful", LoginResponse { token, user }))
}

/// POST /auth/admin/login
pub async fn admin_login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<ApiResponse<LoginResponse>> {
    req.ensure_present()?;
    let (token, user) = AuthService::new(&state)
        .admin_login(&req.email, &req.password)
        .await?;
    Ok(ApiResponse::ok(
        "Admin login successful",
        LoginResponse { token, user },
    ))
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

/// POST /auth/forgot-password
pub async fn forgot_password(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ForgotPasswordRequest>,
) -> Result<ApiResponse<Option<()>>> {
    AuthService::new(&state).forgot_password(&req.email).await?;
    Ok(ApiResponse::message("Password reset link sent to your email"))
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub token: String,
    #[serde(default, alias = "newPassword")]
    pub new_password: String,
    #[serde(default, alias = "confirmPassword")]
    pub confirm_password: String,
}

/// POST /auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ResetPasswordRequest>,
) -> Result<ApiResponse<Option<()>>> {
    AuthService::new(&state)
        .reset_password(
            &req.email,
            &req.token,
            &req.new_password,
            &req.confirm_password,
        )
        .await?;
    Ok(ApiResponse::message("Password has been reset"))
}

/// GET /auth/me
pub async fn me(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
) -> Result<ApiResponse<User>> {
    let user = AuthService::new(&state)
        .current_user(session.user_id)
        .await?;
    Ok(ApiResponse::ok("Current user", user))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_accepts_original_field_names() {
        let req: RegisterRequest = serde_json::from_value(serde_json::json!({
            "email": "a@b.co",
            "username": "wisudawan",
            "password": "secret123",
            "confirmPassword": "secret123",
            "nama_lengkap": "Budi",
            "nomor_telepon": "0812"
        }))
        .unwrap();
        assert_eq!(req.confirm_password, "secret123");
        assert_eq!(req.full_name.as_deref(), Some("Budi"));
        assert_eq!(req.phone.as_deref(), Some("0812"));
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let req: LoginRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(req.email.is_empty());
        assert!(req.password.is_empty());
    }

    #[test]
    fn test_blank_login_is_validation_error() {
        let req = LoginRequest {
            email: " ".to_owned(),
            password: "x".to_owned(),
        };
        assert!(matches!(req.ensure_present(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_user_created_shape() {
        let body = serde_json::to_value(UserCreated {
            user_id: selempangku_core::UserId::new(9),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "userId": 9 }));
    }
}

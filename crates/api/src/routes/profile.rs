//! Profile routes for the signed-in user.

use axum::extract::State;
use serde::Deserialize;

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{ApiResponse, ProfileUpdate, User};
use crate::routes::JsonBody;
use crate::routes::form::FormData;
use crate::services::auth::AuthService;
use crate::services::uploads::UploadKind;
use crate::state::AppState;

const AVATAR_FIELDS: &[&str] = &["avatar", "foto_profil"];

/// GET /profile
pub async fn show(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
) -> Result<ApiResponse<User>> {
    let user = AuthService::new(&state)
        .current_user(session.user_id)
        .await?;
    Ok(ApiResponse::ok("Profile", user))
}

/// PUT /profile (multipart)
///
/// Blank fields keep their stored value. A new avatar replaces the old file.
pub async fn update(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    form: FormData,
) -> Result<ApiResponse<User>> {
    let users = UserRepository::new(state.pool());
    let current = users
        .get_by_id(session.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_owned()))?;

    let avatar = form
        .save_file(state.uploads(), UploadKind::Avatar, AVATAR_FIELDS)
        .await?;

    let update = ProfileUpdate {
        full_name: form.text_owned(&["full_name", "nama_lengkap"]),
        phone: form.text_owned(&["phone", "nomor_telepon"]),
        address: form.text_owned(&["address", "alamat"]),
        gender: form.text_owned(&["gender", "jenis_kelamin"]),
        avatar: avatar.clone(),
    };

    let user = match users.update_profile(session.user_id, &update).await {
        Ok(user) => user,
        Err(err) => {
            if let Some(saved) = &avatar {
                state.uploads().remove(saved).await;
            }
            return Err(err.into());
        }
    };

    if avatar.is_some()
        && let Some(old) = current.avatar.as_deref()
    {
        state.uploads().remove(old).await;
    }

    tracing::info!(user_id = %session.user_id, "Profile updated");
    Ok(ApiResponse::ok("Profile updated", user))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default, alias = "currentPassword")]
    pub current_password: String,
    #[serde(default, alias = "newPassword")]
    pub new_password: String,
    #[serde(default, alias = "confirmPassword")]
    pub confirm_password: String,
}

/// PUT /profile/password
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    JsonBody(req): JsonBody<ChangePasswordRequest>,
) -> Result<ApiResponse<Option<()>>> {
    if req.current_password.is_empty() {
        return Err(AppError::Validation(
            "Current password is required".to_owned(),
        ));
    }
    AuthService::new(&state)
        .change_password(
            session.user_id,
            &req.current_password,
            &req.new_password,
            &req.confirm_password,
        )
        .await?;
    Ok(ApiResponse::message("Password changed"))
}

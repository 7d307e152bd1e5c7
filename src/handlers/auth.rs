use axum::{extract::State, response::Json};
use bcrypt::{hash, verify, DEFAULT_COST};

use crate::auth::UserType;
use crate::errors::{AppError, AppResult};
use crate::middleware::{AppJson, AppQuery};
use crate::models::{
    LoginRequest, LoginResponse, MessageResponse, RegisterAdminRequest, RegisterAdminResponse,
    TokenParams, VerifyTokenResponse,
};
use crate::state::AppState;

pub async fn login(
    State(state): State<AppState>,
    AppJson(credentials): AppJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    tracing::info!(
        "Login attempt for {} '{}'",
        credentials.user_type,
        credentials.username
    );

    match credentials.user_type {
        UserType::Student => {
            let student = state
                .store
                .user_by_student_id(&credentials.username)
                .await?
                .ok_or_else(|| {
                    AppError::Unauthenticated("Invalid student ID or password".to_string())
                })?;

            if !student.is_active {
                return Err(AppError::Forbidden("Account is inactive".to_string()));
            }

            // Accounts without a stored hash authenticate by student id alone
            // (legacy passwordless import).
            if let Some(password_hash) = &student.password_hash {
                if !verify(&credentials.password, password_hash)? {
                    return Err(AppError::Unauthenticated(
                        "Invalid student ID or password".to_string(),
                    ));
                }
            }

            let access_token =
                state
                    .tokens
                    .issue(student.id, &student.student_id, UserType::Student)?;

            Ok(Json(LoginResponse {
                success: true,
                message: "Login successful".to_string(),
                access_token,
                token_type: "bearer".to_string(),
                user_type: UserType::Student,
                user_id: student.id,
                username: student.student_id,
            }))
        }

        UserType::Admin => {
            let admin = state
                .store
                .admin_by_username(&credentials.username)
                .await?
                .ok_or_else(|| {
                    AppError::Unauthenticated("Invalid username or password".to_string())
                })?;

            if !admin.is_active {
                return Err(AppError::Forbidden("Account is inactive".to_string()));
            }

            if !verify(&credentials.password, &admin.password_hash)? {
                return Err(AppError::Unauthenticated(
                    "Invalid username or password".to_string(),
                ));
            }

            let access_token = state.tokens.issue(admin.id, &admin.username, UserType::Admin)?;

            Ok(Json(LoginResponse {
                success: true,
                message: "Login successful".to_string(),
                access_token,
                token_type: "bearer".to_string(),
                user_type: UserType::Admin,
                user_id: admin.id,
                username: admin.username,
            }))
        }
    }
}

pub async fn register(
    State(state): State<AppState>,
    AppJson(admin_data): AppJson<RegisterAdminRequest>,
) -> AppResult<Json<RegisterAdminResponse>> {
    validate_admin_credentials(&admin_data)?;

    if state
        .store
        .admin_by_username(&admin_data.username)
        .await?
        .is_some()
    {
        return Err(AppError::InvalidInput(format!(
            "Username '{}' already exists",
            admin_data.username
        )));
    }

    if let Some(email) = &admin_data.email {
        if state.store.admin_by_email(email).await?.is_some() {
            return Err(AppError::InvalidInput(format!(
                "Email '{}' already registered",
                email
            )));
        }
    }

    let password_hash = hash(admin_data.password.as_bytes(), DEFAULT_COST)?;
    let admin = state
        .store
        .create_admin(
            &admin_data.username,
            admin_data.email.as_deref(),
            &password_hash,
        )
        .await?;

    tracing::info!("Registered admin '{}'", admin.username);

    Ok(Json(RegisterAdminResponse {
        success: true,
        message: "Admin registered successfully".to_string(),
        admin_id: admin.id,
        username: admin.username,
    }))
}

pub async fn verify_token(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<TokenParams>,
) -> AppResult<Json<VerifyTokenResponse>> {
    let claims = state
        .tokens
        .verify(&params.token)
        .map_err(|_| AppError::Unauthenticated("Invalid or expired token".to_string()))?;

    Ok(Json(VerifyTokenResponse {
        success: true,
        valid: true,
        user_id: claims.user_id,
        username: claims.username,
        user_type: claims.user_type,
    }))
}

// Tokens are stateless; logout is handled client-side by discarding the token.
pub async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse {
        success: true,
        message: "Logged out successfully".to_string(),
    })
}

fn validate_admin_credentials(admin_data: &RegisterAdminRequest) -> AppResult<()> {
    let username_len = admin_data.username.chars().count();
    if !(3..=50).contains(&username_len) {
        return Err(AppError::InvalidInput(
            "Username must be between 3 and 50 characters".to_string(),
        ));
    }

    let password = &admin_data.password;
    if password.chars().count() < 8 {
        return Err(AppError::InvalidInput(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::InvalidInput(
            "Password must contain at least one digit".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_alphabetic()) {
        return Err(AppError::InvalidInput(
            "Password must contain at least one letter".to_string(),
        ));
    }

    if let Some(email) = &admin_data.email {
        if !email.contains('@') {
            return Err(AppError::InvalidInput(
                "Email address is not valid".to_string(),
            ));
        }
    }

    Ok(())
}

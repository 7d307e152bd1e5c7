//! Principal resolution for protected routes. The bearer token travels as the
//! `token` query parameter; the extractors validate it, check the principal
//! type, and load the account from storage.

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;

use crate::auth::{Claims, UserType};
use crate::errors::AppError;
use crate::models::{Admin, User};
use crate::state::AppState;

#[derive(Deserialize)]
struct TokenParam {
    token: Option<String>,
}

/// The authenticated student behind a request.
pub struct CurrentStudent(pub User);

/// The authenticated admin behind a request.
pub struct CurrentAdmin(pub Admin);

fn claims_from_query(parts: &Parts, state: &AppState) -> Result<Claims, AppError> {
    let Query(params) = Query::<TokenParam>::try_from_uri(&parts.uri)
        .map_err(|_| AppError::Unauthenticated("Missing access token".to_string()))?;

    let token = params
        .token
        .ok_or_else(|| AppError::Unauthenticated("Missing access token".to_string()))?;

    state.tokens.verify(&token)
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentStudent {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let claims = claims_from_query(parts, state)?;

        if claims.user_type != UserType::Student {
            return Err(AppError::Unauthenticated(
                "Invalid authentication credentials".to_string(),
            ));
        }

        let student = state
            .store
            .user_by_id(claims.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Student not found".to_string()))?;

        if !student.is_active {
            return Err(AppError::Forbidden("Account is inactive".to_string()));
        }

        Ok(CurrentStudent(student))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let claims = claims_from_query(parts, state)?;

        if claims.user_type != UserType::Admin {
            return Err(AppError::Unauthenticated(
                "Admin authentication required".to_string(),
            ));
        }

        let admin = state
            .store
            .admin_by_id(claims.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Admin not found".to_string()))?;

        if !admin.is_active {
            return Err(AppError::Forbidden(
                "Admin account is inactive".to_string(),
            ));
        }

        Ok(CurrentAdmin(admin))
    }
}

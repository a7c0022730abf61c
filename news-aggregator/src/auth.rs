use crate::error::AppError;
use crate::types::Author;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_IMAGE_HEADER: &str = "x-user-image";

/// The caller, as vouched for by the session layer in front of this service.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub author: Author,
}

fn header(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = header(parts, USER_ID_HEADER).ok_or(AppError::Unauthorized)?;

        Ok(AuthUser {
            id,
            author: Author {
                name: header(parts, USER_NAME_HEADER),
                image: header(parts, USER_IMAGE_HEADER),
            },
        })
    }
}

//! Request extractors

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use edt_common::validation::Validate;
use serde::de::DeserializeOwned;

use crate::ApiError;

/// JSON body that has been deserialized and passed [`Validate`]
///
/// Malformed bodies, missing fields and unknown enum values are rejected
/// with the same VALIDATION_FAILED response as field checks.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidJson(value))
    }
}

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use super::dto::Validate;
use crate::error::UserError;

/// JSON body that has been normalized and validated.
///
/// Unparseable JSON is rejected with 400, rule violations with 422; both use
/// the standard envelope.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Send,
{
    type Rejection = UserError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(mut value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| UserError::MalformedBody(rejection.body_text()))?;
        value.normalize();
        value.validate().map_err(UserError::Validation)?;
        Ok(ValidatedJson(value))
    }
}

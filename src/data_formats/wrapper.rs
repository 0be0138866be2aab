use axum::{
    async_trait,
    body::HttpBody,
    extract::FromRequest,
    http::Request,
    BoxError, Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::errors::RequestError;

/// A JSON body that has been deserialized and passed its `validator` rules.
///
/// Malformed bodies and rule violations both become [`RequestError::Validation`].
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, S, B> FromRequest<S, B> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    B: HttpBody + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    type Rejection = RequestError;

    async fn from_request(req: Request<B>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| RequestError::Validation(rejection.body_text()))?;
        value.validate()?;
        Ok(ValidJson(value))
    }
}

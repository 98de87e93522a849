use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use super::middleware::Identity;
use crate::error::AppError;

/// The identity established by `RequestAuthenticator` for this request.
///
/// Taking this as a handler argument is what makes a route protected: when no
/// identity was published the request fails with 401 before the handler runs.
#[derive(Debug, Clone)]
pub struct AuthenticatedEmployee(pub Identity);

impl FromRequest for AuthenticatedEmployee {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Identity>().cloned() {
            Some(identity) => ready(Ok(AuthenticatedEmployee(identity))),
            None => {
                let err = AppError::Unauthorized("Authentication required".to_string());
                ready(Err(err.into()))
            }
        }
    }
}

use std::rc::Rc;
use std::sync::Arc;

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use uuid::Uuid;

use super::directory::IdentityDirectory;
use super::token::TokenCodec;

/// The authenticated principal of a request, published into request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub employee_id: Uuid,
    pub email: String,
    pub authorities: Vec<String>,
}

/// Establishes an [`Identity`] from a bearer token when one checks out.
///
/// Never rejects a request. Whether an unauthenticated request may proceed is
/// decided downstream by the `AuthenticatedEmployee` extractor.
#[derive(Clone)]
pub struct RequestAuthenticator {
    codec: Arc<TokenCodec>,
    directory: Arc<dyn IdentityDirectory>,
}

fn bearer_token(authorization: &str) -> Option<&str> {
    authorization
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl RequestAuthenticator {
    pub fn new(codec: Arc<TokenCodec>, directory: Arc<dyn IdentityDirectory>) -> Self {
        Self { codec, directory }
    }

    /// Decides the identity for a request given its `Authorization` header.
    /// `None` means the request proceeds with whatever it already has.
    pub async fn authenticate(
        &self,
        authorization: Option<&str>,
        already_established: bool,
    ) -> Option<Identity> {
        let token = match authorization.and_then(bearer_token) {
            Some(token) => token,
            None => {
                log::debug!("No bearer token on request");
                return None;
            }
        };

        let subject = match self.codec.extract_subject(token) {
            Ok(subject) => subject,
            Err(e) => {
                log::warn!("Rejected bearer token: {}", e);
                return None;
            }
        };

        if already_established {
            return None;
        }

        let credential = match self.directory.find_by_email(&subject).await {
            Ok(Some(credential)) => credential,
            Ok(None) => {
                log::warn!("Token subject {} has no account", subject);
                return None;
            }
            Err(e) => {
                log::error!("Identity lookup for {} failed: {}", subject, e);
                return None;
            }
        };

        if !self.codec.is_valid(token, &credential.email) {
            return None;
        }

        log::debug!("Authenticated {}", credential.email);
        Some(Identity {
            employee_id: credential.employee_id,
            authorities: credential.authorities(),
            email: credential.email,
        })
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestAuthenticator
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequestAuthenticatorService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestAuthenticatorService {
            service: Rc::new(service),
            authenticator: self.clone(),
        }))
    }
}

pub struct RequestAuthenticatorService<S> {
    service: Rc<S>,
    authenticator: RequestAuthenticator,
}

impl<S, B> Service<ServiceRequest> for RequestAuthenticatorService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let authenticator = self.authenticator.clone();

        Box::pin(async move {
            let authorization = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            let already_established = req.extensions().get::<Identity>().is_some();

            if let Some(identity) = authenticator
                .authenticate(authorization.as_deref(), already_established)
                .await
            {
                req.extensions_mut().insert(identity);
            }

            service.call(req).await
        })
    }
}

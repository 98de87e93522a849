pub mod directory;
pub mod extractors;
pub mod middleware;
pub mod password;
pub mod service;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::Position;
use crate::validation::{not_blank, NAME_REGEX};

// Re-export necessary items
pub use directory::{Credential, IdentityDirectory, StoreDirectory};
pub use extractors::AuthenticatedEmployee;
pub use middleware::{Identity, RequestAuthenticator};
pub use password::PasswordHasher;
pub use service::CredentialService;
pub use token::{Claims, SigningKeyProvider, StaticSigningKey, TokenCodec, TokenError};

/// Represents the payload for a login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Matched case-insensitively.
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1), custom = "not_blank")]
    pub password: String,
}

/// Represents the payload for a self-registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        length(min = 1, max = 100),
        custom = "not_blank",
        regex(path = "NAME_REGEX", message = "Name contains invalid characters")
    )]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub position: Position,
    #[validate(length(min = 1, max = 100), custom = "not_blank")]
    pub password: String,
}

/// Response after successful login or registration.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Bearer token to present as `Authorization: Bearer <token>`.
    pub token: String,
}

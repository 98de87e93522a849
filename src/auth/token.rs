use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Claim names the codec owns. Callers cannot override them through extra claims.
const RESERVED_CLAIMS: [&str; 3] = ["sub", "iat", "exp"];

/// Claim carrying the list of role strings.
pub const AUTHORITIES_CLAIM: &str = "authorities";

/// Supplies the symmetric key used to sign and verify tokens.
///
/// The codec asks for the key on every operation, so an implementation can
/// rotate keys without touching any call site.
pub trait SigningKeyProvider: Send + Sync {
    fn signing_key(&self) -> Vec<u8>;
}

/// A key fixed for the lifetime of the process, loaded once at startup.
pub struct StaticSigningKey {
    key: Vec<u8>,
}

impl StaticSigningKey {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into() }
    }
}

impl SigningKeyProvider for StaticSigningKey {
    fn signing_key(&self) -> Vec<u8> {
        self.key.clone()
    }
}

/// Represents the claims encoded within a token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject of the token: the owner's normalized email.
    pub sub: String,
    /// Issue timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Any further claims, such as `authorities`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    /// The role strings carried in the `authorities` claim; empty if absent.
    pub fn authorities(&self) -> Vec<String> {
        self.extra
            .get(AUTHORITIES_CLAIM)
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Why a token could not be produced or accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Bad structure, bad encoding, wrong algorithm or a signature that does not verify.
    Malformed(String),
    /// Signature verified, but the embedded expiry has passed.
    Expired,
    /// Signing failed on our side.
    Encoding(String),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenError::Malformed(msg) => write!(f, "Malformed token: {}", msg),
            TokenError::Expired => write!(f, "Token has expired"),
            TokenError::Encoding(msg) => write!(f, "Failed to generate token: {}", msg),
        }
    }
}

impl std::error::Error for TokenError {}

/// Issues and verifies compact HS256-signed bearer tokens. Holds no state
/// besides the key source and the validity window.
pub struct TokenCodec {
    keys: Arc<dyn SigningKeyProvider>,
    validity: Duration,
}

impl TokenCodec {
    pub fn new(keys: Arc<dyn SigningKeyProvider>, validity: Duration) -> Self {
        Self { keys, validity }
    }

    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// Issues a token for `subject` that expires one validity window from now.
    pub fn issue(&self, subject: &str, claims: Map<String, Value>) -> Result<String, TokenError> {
        self.issue_at(subject, claims, Utc::now())
    }

    /// Issues a token as if it had been issued at `issued_at`.
    pub fn issue_at(
        &self,
        subject: &str,
        mut claims: Map<String, Value>,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        for reserved in RESERVED_CLAIMS {
            claims.remove(reserved);
        }

        let claims = Claims {
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.validity).timestamp(),
            extra: claims,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.keys.signing_key()),
        )
        .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verifies signature and expiry and returns the full claim set.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.keys.signing_key()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed(e.to_string()),
        })
    }

    /// Returns the subject of a verified, unexpired token.
    pub fn extract_subject(&self, token: &str) -> Result<String, TokenError> {
        self.decode(token).map(|claims| claims.sub)
    }

    /// True iff the token verifies, has not expired, and belongs to `expected_subject`.
    pub fn is_valid(&self, token: &str, expected_subject: &str) -> bool {
        match self.decode(token) {
            Ok(claims) => claims.sub == expected_subject,
            Err(_) => false,
        }
    }
}

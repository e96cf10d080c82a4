use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Claims of an access token issued by the external identity provider.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,  // user id
    pub exp: usize,
    #[serde(default)]
    pub iat: usize,
}

impl Claims {
    pub fn user_id(&self) -> Option<i32> {
        self.sub.parse().ok()
    }
}

#[derive(Debug)]
pub enum TokenVerifyResult {
    Valid(Claims),
    Expired,
    Invalid,
}

/// Verifies HS256 access tokens. Issuing them is not this service's job.
#[derive(Clone)]
pub struct JwtUtils {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtUtils {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn verify_token(&self, token: &str) -> TokenVerifyResult {
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => TokenVerifyResult::Valid(data.claims),
            Err(err) => match *err.kind() {
                ErrorKind::ExpiredSignature => TokenVerifyResult::Expired,
                _ => TokenVerifyResult::Invalid,
            },
        }
    }
}

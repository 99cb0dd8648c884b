use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use secrecy::ExposeSecret;
use uuid::Uuid;

use crate::{configuration::Jwt, error::Error};

use super::error::AuthError;

#[derive(serde::Deserialize, serde::Serialize)]
pub struct Claim {
    pub sub: Uuid,
    aud: String,
    iss: String,
    exp: usize,
    iat: usize,
}

pub fn encode_jwt(user_id: Uuid, jwt: &Jwt, ttl: Duration) -> Result<String, Error> {
    let now = Utc::now();
    let exp = (now + ttl).timestamp() as usize;
    let iat = now.timestamp() as usize;

    let claim = Claim {
        sub: user_id,
        aud: jwt.aud.clone(),
        iss: jwt.iss.clone(),
        iat,
        exp,
    };

    encode(
        &Header::default(),
        &claim,
        &EncodingKey::from_secret(jwt.secret.expose_secret().as_bytes()),
    )
    .map_err(|e| Error::Auth(AuthError::JwtError(e)))
}

pub fn decode_jwt(jwt_token: &str, jwt: &Jwt) -> Result<TokenData<Claim>, Error> {
    let mut validation = Validation::default();
    validation.set_issuer(&[&jwt.iss]);
    validation.set_audience(&[&jwt.aud]);

    decode::<Claim>(
        jwt_token,
        &DecodingKey::from_secret(jwt.secret.expose_secret().as_bytes()),
        &validation,
    )
    .map_err(|e| Error::Auth(AuthError::JwtError(e)))
}

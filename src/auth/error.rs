#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Jwt error")]
    JwtError(jsonwebtoken::errors::Error),
    #[error("Unauthenticated")]
    Unauthenticated,
}

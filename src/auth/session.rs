use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{configuration::Jwt, error::Error, model::UserId};

use super::{decode_jwt, error::AuthError};

/// Identity of the signed-in viewer, resolved once per user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
}

impl Session {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

/// Reports the current session, or `None` when nobody is signed in.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn current_session(&self) -> Result<Option<Session>, Error>;

    async fn require_session(&self) -> Result<Session, Error> {
        self.current_session()
            .await?
            .ok_or(Error::Auth(AuthError::Unauthenticated))
    }
}

/// Resolves the session from a bearer token issued by the auth provider.
///
/// The token is swapped in by the host on sign-in/refresh and cleared on
/// sign-out. A present but invalid token is an error, not an anonymous
/// session.
pub struct JwtSessionResolver {
    jwt: Jwt,
    token: RwLock<Option<SecretString>>,
}

impl JwtSessionResolver {
    pub fn new(jwt: Jwt) -> Self {
        Self {
            jwt,
            token: RwLock::new(None),
        }
    }

    pub async fn set_token(&self, token: SecretString) {
        *self.token.write().await = Some(token);
    }

    pub async fn clear(&self) {
        *self.token.write().await = None;
    }
}

impl std::fmt::Debug for JwtSessionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSessionResolver")
            .field("iss", &self.jwt.iss)
            .field("aud", &self.jwt.aud)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SessionResolver for JwtSessionResolver {
    #[tracing::instrument(name = "resolve jwt session", skip_all)]
    async fn current_session(&self) -> Result<Option<Session>, Error> {
        let token = self.token.read().await;
        let Some(token) = token.as_ref() else {
            return Ok(None);
        };

        let token_data = decode_jwt(token.expose_secret(), &self.jwt)?;

        Ok(Some(Session::new(token_data.claims.sub)))
    }
}

/// A session decided up front by the host, e.g. after its own sign-in flow.
#[derive(Debug, Clone, Default)]
pub struct StaticSessionResolver {
    session: Option<Session>,
}

impl StaticSessionResolver {
    pub fn signed_in(user_id: UserId) -> Self {
        Self {
            session: Some(Session::new(user_id)),
        }
    }

    pub fn anonymous() -> Self {
        Self { session: None }
    }
}

#[async_trait]
impl SessionResolver for StaticSessionResolver {
    async fn current_session(&self) -> Result<Option<Session>, Error> {
        Ok(self.session)
    }
}

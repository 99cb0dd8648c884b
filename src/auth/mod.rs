pub mod error;
pub mod jwt;
pub mod session;

pub use jwt::{decode_jwt, encode_jwt};
pub use session::{JwtSessionResolver, Session, SessionResolver, StaticSessionResolver};

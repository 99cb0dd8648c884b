use crate::error::RawFailure;

#[derive(thiserror::Error, Debug)]
pub enum DatabaseError {
    #[error("Database error")]
    DatabaseError(sqlx::Error),
    #[error("Record not found")]
    NotFound,
    #[error("Store rejected the request: {0}")]
    Rejected(RawFailure),
}

use thiserror::Error;

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum PermitError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Duplicate(&'static str),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{0}")]
    InvalidState(&'static str),
    #[error("{0}")]
    Database(&'static str),
}

impl PermitError {
    pub fn code(&self) -> &'static str {
        match self {
            PermitError::Validation(code)
            | PermitError::NotFound(code)
            | PermitError::Duplicate(code)
            | PermitError::Unauthorized(code)
            | PermitError::InvalidState(code)
            | PermitError::Database(code) => code,
        }
    }
}

use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::error::PermitError;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SignatureKind {
    Draw,
    Type,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Signature {
    pub kind: SignatureKind,
    pub data: String,
    pub name: String,
    pub date: DateTime,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SignatureRequest {
    pub kind: SignatureKind,
    pub data: String,
    pub name: String,
}

impl Signature {
    // A signature without a printed name is never accepted into a slot.
    pub fn accept(request: SignatureRequest) -> Result<Signature, PermitError> {
        if request.name.trim().is_empty() {
            return Err(PermitError::Validation("SIGNATURE_NAME_REQUIRED"));
        }
        Ok(Signature {
            kind: request.kind,
            data: request.data,
            name: request.name,
            date: DateTime::now(),
        })
    }
}

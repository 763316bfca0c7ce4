use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use super::signature::{Signature, SignatureRequest};

// Append-only; the newest entry defines the current authorised receiver.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct HandoverLog {
    pub _id: ObjectId,
    pub date: DateTime,
    pub receiver_name: String,
    pub signature: Signature,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct HandoverRequest {
    pub receiver_name: String,
    pub date: String,
    pub signature: SignatureRequest,
}

use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

pub const PHOTO_LIMIT: usize = 10;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PermitNote {
    pub _id: ObjectId,
    pub text: String,
    pub author: String,
    pub role: String,
    pub date: DateTime,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PermitNoteRequest {
    pub text: String,
    pub author: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PermitPhoto {
    pub _id: ObjectId,
    pub url: String,
    pub caption: String,
    pub uploaded_by: String,
    pub date: DateTime,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PermitPhotoRequest {
    pub url: String,
    pub caption: String,
    pub uploaded_by: String,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
}

/// A stored petition entry. Text fields are already sanitized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signature {
    pub id: i64,
    pub name: String,
    pub national_id: String,
    pub comment: String,
    pub anonymous: bool,
    pub signed: DateTime<Utc>,
}

/// A signature that passed validation and is ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSignature {
    pub name: String,
    pub national_id: String,
    pub comment: String,
    pub anonymous: bool,
}

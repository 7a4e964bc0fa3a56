use serde::Deserialize;

// -- Signatures --

/// Body of `POST /`. Every field is optional on the wire; missing fields
/// arrive as empty strings so validation can report them.
#[derive(Debug, Default, Deserialize)]
pub struct SignatureForm {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "nationalId")]
    pub national_id: String,
    /// Free-text comment.
    #[serde(default)]
    pub text: String,
    /// Checkbox; browsers send `"on"` when ticked and nothing otherwise.
    pub check: Option<String>,
}

// -- Auth --

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

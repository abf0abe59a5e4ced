use serde::{Deserialize, Serialize};

/// A roster entry. Field names on the wire follow the remote service's
/// sheet-column casing.
///
/// Employees are never edited in place; a rename or re-photo arrives as a
/// fresh record from the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Employee {
    #[serde(rename = "ID", deserialize_with = "super::sheet_id")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "ReferenceImageURL")]
    pub reference_image_url: String,
}

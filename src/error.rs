//! Error types for document deserialization.
//!
//! Every failure the kernel can report is an input-shape problem, so all
//! variants map to status `400` and carry the offending input for diagnosis.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// HTTP-style status attached to every validation failure.
pub const VALIDATION_STATUS: u16 = 400;

/// Error type for deserialization operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeserializeError {
    /// A primary or included resource has the wrong shape.
    #[error("Invalid `resource` argument: {detail}")]
    InvalidResource {
        /// Human readable description of the first violation.
        detail: String,
        /// The resource as received.
        resource: Value,
    },
    /// A relationship of an otherwise valid resource has the wrong shape.
    #[error("Invalid Relationship: {detail}")]
    InvalidRelationship {
        /// Human readable description of the first violation.
        detail: String,
        /// The resource owning the relationship.
        resource: Value,
    },
    /// The document envelope itself has the wrong shape.
    #[error("Invalid `payload` argument: {detail}")]
    InvalidDocument {
        /// Human readable description of the first violation.
        detail: String,
        /// The document as received.
        document: Value,
    },
}

impl DeserializeError {
    /// Status code for this error.
    pub fn status(&self) -> u16 {
        VALIDATION_STATUS
    }

    /// Short title for this error kind.
    pub fn title(&self) -> &'static str {
        match self {
            Self::InvalidResource { .. } => "Invalid `resource` argument",
            Self::InvalidRelationship { .. } => "Invalid Relationship",
            Self::InvalidDocument { .. } => "Invalid `payload` argument",
        }
    }

    /// Detail message.
    pub fn detail(&self) -> &str {
        match self {
            Self::InvalidResource { detail, .. }
            | Self::InvalidRelationship { detail, .. }
            | Self::InvalidDocument { detail, .. } => detail,
        }
    }

    /// The resource that failed validation, if any.
    pub fn resource(&self) -> Option<&Value> {
        match self {
            Self::InvalidResource { resource, .. } | Self::InvalidRelationship { resource, .. } => {
                Some(resource)
            }
            Self::InvalidDocument { .. } => None,
        }
    }

    /// Render as a structured error object.
    pub fn to_error_object(&self) -> ErrorObject {
        let meta = match self {
            Self::InvalidResource { resource, .. } | Self::InvalidRelationship { resource, .. } => {
                json!({ "resource": resource })
            }
            Self::InvalidDocument { document, .. } => json!({ "document": document }),
        };

        ErrorObject {
            status: self.status(),
            title: self.title().to_string(),
            detail: self.detail().to_string(),
            meta,
        }
    }
}

/// Serializable error object: `{status, title, detail, meta}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    /// Status code (always 400 for validation failures).
    pub status: u16,
    /// Short title of the error kind.
    pub title: String,
    /// Description of the violation.
    pub detail: String,
    /// Offending input, under `resource` or `document`.
    pub meta: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_object_carries_resource() {
        let resource = json!({"attributes": {"first": "bob"}});
        let err = DeserializeError::InvalidResource {
            detail: "\"type\" is required".to_string(),
            resource: resource.clone(),
        };

        let object = err.to_error_object();
        assert_eq!(object.status, 400);
        assert_eq!(object.title, "Invalid `resource` argument");
        assert_eq!(object.detail, "\"type\" is required");
        assert_eq!(object.meta["resource"], resource);
    }

    #[test]
    fn test_display_includes_title_and_detail() {
        let err = DeserializeError::InvalidRelationship {
            detail: "\"groups.data[0].type\" is required".to_string(),
            resource: Value::Null,
        };
        assert_eq!(
            err.to_string(),
            "Invalid Relationship: \"groups.data[0].type\" is required"
        );
    }

    #[test]
    fn test_document_error_has_no_resource() {
        let err = DeserializeError::InvalidDocument {
            detail: "\"data\" must be an object, an array or null".to_string(),
            document: json!({"data": 5}),
        };
        assert!(err.resource().is_none());
        assert_eq!(err.to_error_object().meta["document"], json!({"data": 5}));
    }
}

//! Store reply envelope
//!
//! The store answers every resource call with either a resource or an
//! OperationOutcome. An outcome may carry a suggested HTTP status which
//! overrides whatever the handler would otherwise answer with.

use serde_json::Value as JsonValue;

use crate::error::FhirError;
use crate::outcome::{status_hint, strip_status_hint};
use crate::resource::Resource;

#[derive(Debug, Clone, PartialEq)]
pub enum StoreReply {
    Resource(Resource),
    Outcome {
        outcome: Resource,
        status: Option<u16>,
    },
}

impl StoreReply {
    pub fn from_value(value: JsonValue) -> Result<Self, FhirError> {
        let status = status_hint(&value);
        let resource = Resource::from_value(value)?;
        if resource.is_outcome() {
            Ok(Self::Outcome {
                outcome: resource,
                status,
            })
        } else {
            Ok(Self::Resource(resource))
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Resource(_) => None,
            Self::Outcome { status, .. } => *status,
        }
    }

    pub fn is_resource(&self) -> bool {
        matches!(self, Self::Resource(_))
    }

    /// Outcome with its status hint removed, for callers that translate the status
    pub fn into_outcome_without_hint(self) -> Resource {
        let resource = match self {
            Self::Resource(r) => r,
            Self::Outcome { outcome, .. } => outcome,
        };
        let mut value = resource.into_value();
        strip_status_hint(&mut value);
        match value {
            JsonValue::Object(map) => Resource::from_object(map),
            _ => crate::OperationOutcome::success("").to_resource(),
        }
    }

    pub fn into_resource(self) -> Resource {
        match self {
            Self::Resource(r) => r,
            Self::Outcome { outcome, .. } => outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::OperationOutcome;
    use serde_json::json;

    #[test]
    fn classifies_outcomes_and_resources() {
        let patient =
            StoreReply::from_value(json!({"resourceType": "Patient", "id": "1"})).unwrap();
        assert!(patient.is_resource());
        assert_eq!(patient.status(), None);

        let gone =
            serde_json::to_value(OperationOutcome::not_found("gone").with_status(410)).unwrap();
        let reply = StoreReply::from_value(gone).unwrap();
        assert_eq!(reply.status(), Some(410));

        let stripped = reply.into_outcome_without_hint();
        assert!(stripped.is_outcome());
        assert_eq!(crate::outcome::status_hint(&stripped.into_value()), None);
    }
}

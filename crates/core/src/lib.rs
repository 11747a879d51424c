//! fhir-facade-core: transport-free FHIR REST interaction types
//!
//! This crate holds the pieces of the REST layer that do not touch HTTP or
//! the backing store: the resource envelope, OperationOutcome status hints,
//! canned responses, bundle enrichment, summary projection and the
//! CapabilityStatement augmentation.

pub mod bundle;
pub mod canned;
pub mod capability;
pub mod error;
pub mod outcome;
pub mod registry;
pub mod reply;
pub mod resource;
pub mod schema;
pub mod search_param;
pub mod summary;

pub use bundle::{Bundle, BundleEntry, BundleLink, BundleType};
pub use canned::{Canned, CannedResponse, CannedResponses, CannedStatuses};
pub use capability::{CapabilityOptions, CapabilityStatement, ConditionalDeleteStatus};
pub use error::FhirError;
pub use outcome::{IssueSeverity, IssueType, OperationOutcome, OperationOutcomeIssue};
pub use registry::KnownResources;
pub use reply::StoreReply;
pub use resource::Resource;
pub use schema::{ElementDefinition, ElementTable, SchemaLookup};
pub use search_param::{SearchParamType, SearchParameter};
pub use summary::SummaryMode;

//! FHIR REST interaction layer
//!
//! Protocol rules applied on top of the store: negotiation, response
//! assembly, versioning headers, summary projection and conditional
//! create/update/delete.

pub mod body;
pub mod conditional;
pub mod context;
pub mod guard;
pub mod headers;
pub mod interactions;
pub mod negotiate;
pub mod response;
pub mod summary;

pub use context::RequestContext;
pub use response::{FhirResponse, respond};

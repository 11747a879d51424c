//! Canned OperationOutcome responses
//!
//! Each template carries `%s` placeholders in its human readable fields and a
//! default status. Templates live in a process-wide registry and are never
//! mutated: every use clones the template before substituting.

use crate::outcome::{
    IssueDetails, IssueSeverity, IssueType, OperationOutcome, OperationOutcomeIssue,
};

/// Canned response kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Canned {
    UnknownResource,
    AlreadyExists,
    MultipleMatches,
    NothingToDelete,
    DeletedMany,
    MultipleDisallowed,
    Success,
    MissingBody,
    InvalidBody,
    TypeMismatch,
    IdMismatch,
    MissingQuery,
    UnsupportedMediaType,
    NotAcceptable,
    StoreFailure,
}

impl Canned {
    pub const ALL: [Canned; 15] = [
        Canned::UnknownResource,
        Canned::AlreadyExists,
        Canned::MultipleMatches,
        Canned::NothingToDelete,
        Canned::DeletedMany,
        Canned::MultipleDisallowed,
        Canned::Success,
        Canned::MissingBody,
        Canned::InvalidBody,
        Canned::TypeMismatch,
        Canned::IdMismatch,
        Canned::MissingQuery,
        Canned::UnsupportedMediaType,
        Canned::NotAcceptable,
        Canned::StoreFailure,
    ];

    fn template(self, statuses: &CannedStatuses) -> CannedResponse {
        use IssueSeverity::{Error, Information, Warning};
        let (severity, code, title, diagnostics, status) = match self {
            Canned::UnknownResource => (
                Error,
                IssueType::NotFound,
                "Unknown resource type",
                "Resource type '%s' is not supported. Known resource types: %s",
                404,
            ),
            Canned::AlreadyExists => (
                Information,
                IssueType::Duplicate,
                "Resource already exists",
                "A %s matching '%s' already exists; no resource was created",
                200,
            ),
            Canned::MultipleMatches => (
                Error,
                IssueType::MultipleMatches,
                "Multiple matches",
                "Conditional update of %s matched more than one resource for '%s'",
                412,
            ),
            Canned::NothingToDelete => (
                Warning,
                IssueType::NotFound,
                "Nothing to delete",
                "No %s resources match '%s'; nothing was deleted",
                statuses.nothing_to_delete,
            ),
            Canned::DeletedMany => (
                Information,
                IssueType::Informational,
                "Resources deleted",
                "Deleted %s resources of type %s matching '%s'",
                statuses.deleted_many,
            ),
            Canned::MultipleDisallowed => (
                Error,
                IssueType::MultipleMatches,
                "Multiple matches",
                "Conditional delete of %s matched more than one resource for '%s' and deleting multiple resources is disabled",
                412,
            ),
            Canned::Success => (
                Information,
                IssueType::Informational,
                "All OK",
                "Request completed successfully with status %s",
                200,
            ),
            Canned::MissingBody => (
                Error,
                IssueType::Required,
                "Missing request body",
                "A request body is required for %s",
                400,
            ),
            Canned::InvalidBody => (
                Error,
                IssueType::Structure,
                "Unparseable request body",
                "Unable to parse request body: %s",
                400,
            ),
            Canned::TypeMismatch => (
                Error,
                IssueType::Invalid,
                "Resource type mismatch",
                "Resource type '%s' in the body does not match '%s' in the URL",
                400,
            ),
            Canned::IdMismatch => (
                Error,
                IssueType::Invalid,
                "Resource id mismatch",
                "Resource id '%s' in the body does not match '%s' in the URL",
                400,
            ),
            Canned::MissingQuery => (
                Error,
                IssueType::Required,
                "Missing search criteria",
                "Conditional %s requires search parameters in the query string",
                400,
            ),
            Canned::UnsupportedMediaType => (
                Error,
                IssueType::NotSupported,
                "Unsupported media type",
                "Request bodies in %s format are not supported",
                415,
            ),
            Canned::NotAcceptable => (
                Error,
                IssueType::NotSupported,
                "Not acceptable",
                "Responses in %s format are not supported",
                406,
            ),
            Canned::StoreFailure => (
                Error,
                IssueType::Exception,
                "Internal error",
                "%s",
                500,
            ),
        };

        CannedResponse {
            template: OperationOutcome {
                resource_type: "OperationOutcome".to_string(),
                issue: vec![OperationOutcomeIssue {
                    severity,
                    code,
                    details: Some(IssueDetails {
                        text: title.to_string(),
                    }),
                    diagnostics: Some(diagnostics.to_string()),
                    extension: Vec::new(),
                }],
            },
            status,
        }
    }
}

/// Statuses of canned responses that a deployment may configure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CannedStatuses {
    pub nothing_to_delete: u16,
    pub deleted_many: u16,
}

impl Default for CannedStatuses {
    fn default() -> Self {
        Self {
            nothing_to_delete: 404,
            deleted_many: 200,
        }
    }
}

/// An OperationOutcome template and its default status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CannedResponse {
    template: OperationOutcome,
    status: u16,
}

impl CannedResponse {
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Clone the template and fill its placeholders, left to right, in every
    /// human readable field. Missing arguments render as empty strings.
    pub fn instantiate(&self, args: &[&str]) -> OperationOutcome {
        let mut outcome = self.template.clone();
        for issue in &mut outcome.issue {
            if let Some(diagnostics) = issue.diagnostics.as_mut() {
                *diagnostics = substitute(diagnostics, args);
            }
            if let Some(details) = issue.details.as_mut() {
                details.text = substitute(&details.text, args);
            }
        }
        outcome
    }
}

/// Registry of every canned response, built once at startup
#[derive(Debug, Clone)]
pub struct CannedResponses {
    entries: Vec<CannedResponse>,
}

impl CannedResponses {
    pub fn new(statuses: CannedStatuses) -> Self {
        Self {
            entries: Canned::ALL
                .iter()
                .map(|kind| kind.template(&statuses))
                .collect(),
        }
    }

    pub fn get(&self, kind: Canned) -> &CannedResponse {
        // entries are built from Canned::ALL in declaration order
        &self.entries[kind as usize]
    }

    /// Instantiate a canned response, returning the outcome and its status
    pub fn render(&self, kind: Canned, args: &[&str]) -> (OperationOutcome, u16) {
        let canned = self.get(kind);
        (canned.instantiate(args), canned.status())
    }
}

impl Default for CannedResponses {
    fn default() -> Self {
        Self::new(CannedStatuses::default())
    }
}

fn substitute(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut rest = template;
    while let Some(pos) = rest.find("%s") {
        out.push_str(&rest[..pos]);
        out.push_str(args.next().copied().unwrap_or_default());
        rest = &rest[pos + 2..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_order_matches_kinds() {
        let canned = CannedResponses::default();
        for kind in Canned::ALL {
            assert_eq!(*canned.get(kind), kind.template(&CannedStatuses::default()));
        }
    }

    #[test]
    fn instantiation_does_not_touch_the_template() {
        let canned = CannedResponses::default();
        let (first, status) = canned.render(Canned::DeletedMany, &["3", "Patient", "name=x"]);
        let (second, _) = canned.render(Canned::DeletedMany, &["7", "Observation", "code=y"]);

        assert_eq!(status, 200);
        assert_eq!(
            first.diagnostics(),
            Some("Deleted 3 resources of type Patient matching 'name=x'")
        );
        assert_eq!(
            second.diagnostics(),
            Some("Deleted 7 resources of type Observation matching 'code=y'")
        );
        assert!(
            canned
                .get(Canned::DeletedMany)
                .instantiate(&[])
                .diagnostics()
                .unwrap()
                .starts_with("Deleted  resources")
        );
    }

    #[test]
    fn configured_statuses_apply() {
        let canned = CannedResponses::new(CannedStatuses {
            nothing_to_delete: 200,
            deleted_many: 202,
        });
        assert_eq!(canned.get(Canned::NothingToDelete).status(), 200);
        assert_eq!(canned.get(Canned::DeletedMany).status(), 202);
        assert_eq!(canned.get(Canned::MultipleDisallowed).status(), 412);
    }

    #[test]
    fn substitute_handles_extra_and_missing_args() {
        assert_eq!(substitute("a %s b %s", &["1"]), "a 1 b ");
        assert_eq!(substitute("no placeholders", &["x"]), "no placeholders");
        assert_eq!(substitute("%s%s", &["x", "y", "z"]), "xy");
    }
}

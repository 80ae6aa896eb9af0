//! Rules that correct and enrich CMDI records, and the pipeline that applies
//! a configured list of them to every harvested record.
mod affiliation;
pub mod config;
mod creators;
pub mod diff;
mod error;
mod identifier;
mod modifier;
mod person;
pub mod pipeline;
mod rights_holder;
mod role;
mod templates;

pub use affiliation::AddAffiliation;
pub use creators::{AuthorStrings, CreatorDictionary, InferCreators};
pub use error::{ModifierError, Result};
pub use identifier::{short_identifier, IdentifierFormatError};
pub use modifier::Modifier;
pub use person::PersonToOrganization;
pub use rights_holder::AddRightsHolder;
pub use role::RoleContext;
pub use templates::{OrganizationTemplate, TemplateError, Wrapper};

/// Tracing target for data problems found while modifying records. These
/// are meant for review separately from progress output.
pub const DIAGNOSTICS: &str = "cmdi::diagnostics";

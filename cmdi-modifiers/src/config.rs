//! Loading modifier configuration from files.
//!
//! Everything is read once before the pipeline starts and is immutable from
//! then on.
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::affiliation::AddAffiliation;
use crate::creators::CreatorDictionary;
use crate::templates::{OrganizationTemplate, TemplateError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Cannot parse {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid organization template for {context}: {source}")]
    Template {
        context: String,
        source: TemplateError,
    },
}

/// One entry of the affiliations file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AffiliationEntry {
    pub first_name: String,
    pub last_name: String,
    /// An `organizationInfo` element as XML text.
    pub organization_info_str: String,
}

impl AffiliationEntry {
    pub fn to_modifier(&self) -> Result<AddAffiliation, ConfigError> {
        let organization = OrganizationTemplate::parse(&self.organization_info_str).map_err(
            |source| ConfigError::Template {
                context: format!("{} {}", self.first_name, self.last_name),
                source,
            },
        )?;
        Ok(AddAffiliation::new(
            &self.first_name,
            &self.last_name,
            organization,
        ))
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_json<T: for<'de> Deserialize<'de>>(path: &Path, json: &str) -> Result<T, ConfigError> {
    serde_json::from_str(json).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// A JSON list of `{first_name, last_name, organization_info_str}`, one
/// modifier per entry.
pub fn load_affiliations(path: &Path) -> Result<Vec<AddAffiliation>, ConfigError> {
    let entries: Vec<AffiliationEntry> = parse_json(path, &read(path)?)?;
    entries.iter().map(AffiliationEntry::to_modifier).collect()
}

/// A JSON object from PID to `{fi, en, label}`.
pub fn load_creator_dictionary(path: &Path) -> Result<CreatorDictionary, ConfigError> {
    parse_json(path, &read(path)?)
}

/// One PID per line. Blank lines are ignored.
pub fn load_pid_list(path: &Path) -> Result<BTreeSet<String>, ConfigError> {
    Ok(parse_pid_list(&read(path)?))
}

pub fn parse_pid_list(text: &str) -> BTreeSet<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// A file holding a single `organizationInfo` element.
pub fn load_template(path: &Path) -> Result<OrganizationTemplate, ConfigError> {
    OrganizationTemplate::parse(&read(path)?).map_err(|source| ConfigError::Template {
        context: path.display().to_string(),
        source,
    })
}

use cmdi_record::{string_literal, Node, Record};
use tracing::{debug, info};

use crate::error::Result;
use crate::modifier::Modifier;
use crate::role::RoleContext;
use crate::templates::{OrganizationTemplate, Wrapper};

/// Turns an organization that was entered as a person back into an
/// organization, wherever the role allows one.
///
/// The person is recognized by surname, optionally together with a given
/// name. Licensor and distribution rights holder persons are replaced with
/// the corresponding organization element. Contact persons and metadata
/// creators must be persons and are left alone. Any other parent element
/// fails the whole call before anything is edited.
#[derive(Debug, Clone)]
pub struct PersonToOrganization {
    name: String,
    surname: String,
    given_name: Option<String>,
    organization: OrganizationTemplate,
}

impl PersonToOrganization {
    pub fn new(
        name: impl Into<String>,
        surname: impl Into<String>,
        given_name: Option<String>,
        organization: OrganizationTemplate,
    ) -> Self {
        Self {
            name: name.into(),
            surname: surname.into(),
            given_name,
            organization,
        }
    }

    /// FIN-CLARIN recorded as a person with surname "FIN-CLARIN".
    pub fn fin_clarin() -> Self {
        Self::new(
            "FIN-CLARIN to organization",
            "FIN-CLARIN",
            None,
            OrganizationTemplate::fin_clarin(),
        )
    }

    /// The Language Bank recorded as a person with surname "The Language
    /// Bank of Finland".
    pub fn language_bank() -> Self {
        Self::new(
            "Language Bank to organization",
            "The Language Bank of Finland",
            None,
            OrganizationTemplate::language_bank(),
        )
    }

    fn xpath(&self) -> String {
        let mut predicate = format!("cmd:surname = {}", string_literal(&self.surname));
        if let Some(given_name) = &self.given_name {
            predicate.push_str(&format!(" and cmd:givenName = {}", string_literal(given_name)));
        }
        format!("//cmd:personInfo[{predicate}]")
    }

    fn rewrites(&self, record: &mut Record) -> Result<Vec<(Node, Wrapper)>> {
        let mut rewrites: Vec<(Node, Wrapper)> = Vec::new();
        for person in record.select_all(&self.xpath())? {
            let Some(parent) = record.parent(person) else {
                continue;
            };
            let (local, namespace) = record.element_name(parent).unwrap_or_default();
            let role = RoleContext::from_name(local, namespace)?;
            match role.organization_wrapper() {
                Some(wrapper) => {
                    if !rewrites.iter().any(|(node, _)| *node == parent) {
                        rewrites.push((parent, wrapper));
                    }
                }
                None => {
                    debug!(
                        surname = self.surname.as_str(),
                        role = role.local_name(),
                        "leaving person in place"
                    );
                }
            }
        }
        Ok(rewrites)
    }
}

impl Modifier for PersonToOrganization {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, record: &mut Record) -> Result<bool> {
        // classify everything first so an unknown parent leaves the record
        // as it was
        let rewrites = self.rewrites(record)?;
        if rewrites.is_empty() {
            return Ok(false);
        }
        for (parent, wrapper) in rewrites {
            let organization =
                record.parse_fragment(&wrapper.wrap_organization(&self.organization))?;
            record.replace(parent, organization)?;
            info!(
                surname = self.surname.as_str(),
                element = wrapper.local_name(),
                "replaced person with organization"
            );
        }
        record.reindent()?;
        Ok(true)
    }
}

use cmdi_record::{string_literal, Record};
use tracing::info;

use crate::error::Result;
use crate::modifier::Modifier;
use crate::templates::{OrganizationTemplate, Wrapper};

/// Gives a person an affiliation if they have none yet.
#[derive(Debug, Clone)]
pub struct AddAffiliation {
    name: String,
    given_name: String,
    surname: String,
    organization: OrganizationTemplate,
}

impl AddAffiliation {
    pub fn new(given_name: &str, surname: &str, organization: OrganizationTemplate) -> Self {
        Self {
            name: format!("affiliation for {given_name} {surname}"),
            given_name: given_name.to_string(),
            surname: surname.to_string(),
            organization,
        }
    }

    fn xpath(&self) -> String {
        format!(
            "//cmd:personInfo[cmd:surname = {} and cmd:givenName = {}][not(cmd:affiliation)]",
            string_literal(&self.surname),
            string_literal(&self.given_name)
        )
    }
}

impl Modifier for AddAffiliation {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, record: &mut Record) -> Result<bool> {
        let persons = record.select_all(&self.xpath())?;
        if persons.is_empty() {
            return Ok(false);
        }
        for person in &persons {
            let affiliation =
                record.parse_fragment(&Wrapper::Affiliation.wrap_organization(&self.organization))?;
            record.append(*person, affiliation)?;
        }
        info!(
            given_name = self.given_name.as_str(),
            surname = self.surname.as_str(),
            count = persons.len(),
            "added affiliation"
        );
        record.reindent()?;
        Ok(true)
    }
}

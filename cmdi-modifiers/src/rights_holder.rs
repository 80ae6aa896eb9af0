use std::collections::BTreeSet;

use cmdi_record::Record;
use tracing::{info, warn};

use crate::error::{ModifierError, Result};
use crate::modifier::Modifier;
use crate::templates::{OrganizationTemplate, Wrapper};
use crate::DIAGNOSTICS;

const RIGHTS_HOLDER_XPATH: &str =
    "//cmd:distributionRightsHolderPerson | //cmd:distributionRightsHolderOrganization";
const LICENCE_INFO_XPATH: &str =
    "oai:metadata/cmd:CMD/cmd:Components/cmd:resourceInfo/cmd:distributionInfo/cmd:licenceInfo";

/// Adds a distribution rights holder organization to the records listed.
///
/// The rights holder goes into the first `licenceInfo` of the resource.
/// This only ever inserts: a listed record that already names a rights
/// holder is a conflict.
#[derive(Debug, Clone)]
pub struct AddRightsHolder {
    pids: BTreeSet<String>,
    organization: OrganizationTemplate,
}

impl AddRightsHolder {
    pub fn new(pids: impl IntoIterator<Item = String>, organization: OrganizationTemplate) -> Self {
        Self {
            pids: pids.into_iter().collect(),
            organization,
        }
    }
}

impl Modifier for AddRightsHolder {
    fn name(&self) -> &str {
        "add distribution rights holder"
    }

    fn apply(&self, record: &mut Record) -> Result<bool> {
        let pid = record.pid()?;
        if !self.pids.contains(&pid) {
            return Ok(false);
        }
        if !record.select_all(RIGHTS_HOLDER_XPATH)?.is_empty() {
            return Err(ModifierError::Conflict { pid });
        }
        let Some(&licence) = record.select_all(LICENCE_INFO_XPATH)?.first() else {
            warn!(
                target: DIAGNOSTICS,
                pid = pid.as_str(),
                "no licenceInfo to add a rights holder to"
            );
            return Ok(false);
        };
        let wrapper = Wrapper::DistributionRightsHolderOrganization;
        let rights_holder = record.parse_fragment(&wrapper.wrap_organization(&self.organization))?;
        record.append(licence, rights_holder)?;
        info!(pid = pid.as_str(), "added distribution rights holder");
        record.reindent()?;
        Ok(true)
    }
}

use cmdi_record::CMD_NAMESPACE;

use crate::error::ModifierError;
use crate::templates::Wrapper;

/// The element a `personInfo` sits in, which decides what a person may be
/// turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleContext {
    ContactPerson,
    MetadataCreator,
    LicensorPerson,
    DistributionRightsHolderPerson,
}

impl RoleContext {
    pub fn from_name(local: &str, namespace: &str) -> Result<Self, ModifierError> {
        if namespace == CMD_NAMESPACE {
            match local {
                "contactPerson" => return Ok(Self::ContactPerson),
                "metadataCreator" => return Ok(Self::MetadataCreator),
                "licensorPerson" => return Ok(Self::LicensorPerson),
                "distributionRightsHolderPerson" => {
                    return Ok(Self::DistributionRightsHolderPerson)
                }
                _ => {}
            }
        }
        Err(ModifierError::UnrecognizedStructure {
            tag: format!("{{{namespace}}}{local}"),
        })
    }

    pub fn local_name(self) -> &'static str {
        match self {
            Self::ContactPerson => "contactPerson",
            Self::MetadataCreator => "metadataCreator",
            Self::LicensorPerson => "licensorPerson",
            Self::DistributionRightsHolderPerson => "distributionRightsHolderPerson",
        }
    }

    /// The organization element replacing a person in this role, if the
    /// schema allows organizations here at all.
    ///
    /// Contact persons and metadata creators stay persons.
    pub fn organization_wrapper(self) -> Option<Wrapper> {
        match self {
            Self::ContactPerson | Self::MetadataCreator => None,
            Self::LicensorPerson => Some(Wrapper::LicensorOrganization),
            Self::DistributionRightsHolderPerson => {
                Some(Wrapper::DistributionRightsHolderOrganization)
            }
        }
    }
}

use cmdi_record::CMD_NAMESPACE;
use thiserror::Error;
use xot::Xot;

const FIN_CLARIN: &str = r#"<organizationInfo>
    <organizationName xml:lang="en">FIN-CLARIN</organizationName>
    <organizationShortName xml:lang="en">FIN-CLARIN</organizationShortName>
    <departmentName xml:lang="en">University of Helsinki</departmentName>
    <communicationInfo>
        <email>fin-clarin@helsinki.fi</email>
        <url>http://www.helsinki.fi/fin-clarin</url>
        <address>PO Box 24 (Unioninkatu 40)</address>
        <zipCode>00014</zipCode>
        <city>University of Helsinki</city>
        <country>Finland</country>
    </communicationInfo>
</organizationInfo>"#;

const LANGUAGE_BANK: &str = r#"<organizationInfo>
    <organizationName xml:lang="fi">CSC - Tieteen tietotekniikan keskus Oy</organizationName>
    <organizationName xml:lang="en">CSC — IT Center for Science Ltd</organizationName>
    <organizationShortName xml:lang="en">CSC</organizationShortName>
    <departmentName xml:lang="en">Kielipankki</departmentName>
    <communicationInfo>
        <email>kielipankki@csc.fi</email>
        <url>http://www.csc.fi/english</url>
        <address>P.O. Box 405</address>
        <zipCode>FI-02101</zipCode>
        <city>Espoo</city>
        <country>Finland</country>
        <telephoneNumber>+358 (0)9 457 2001</telephoneNumber>
        <faxNumber>+358 (0)9 457 2302</faxNumber>
    </communicationInfo>
</organizationInfo>"#;

const UHEL: &str = r#"<organizationInfo>
    <organizationName xml:lang="en">University of Helsinki</organizationName>
    <organizationShortName xml:lang="en">UHEL</organizationShortName>
    <communicationInfo>
        <email>firstname.surname@helsinki.fi</email>
    </communicationInfo>
</organizationInfo>"#;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Organization template is not well-formed XML: {0}")]
    Parse(#[from] xot::ParseError),
    #[error("Organization template must be an organizationInfo element, found {0}")]
    WrongElement(String),
    #[error("Organization template has no element")]
    Empty,
}

/// An `organizationInfo` XML fragment.
///
/// Templates are inserted into the CMD namespace, so they need not (but
/// may) declare it themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationTemplate {
    xml: String,
}

impl OrganizationTemplate {
    /// Check that `xml` is a single `organizationInfo` element.
    pub fn parse(xml: &str) -> Result<Self, TemplateError> {
        let mut xot = Xot::new();
        let root = xot.parse(&Wrapper::Affiliation.wrap(xml))?;
        let wrapper = xot.document_element(root).map_err(|_| TemplateError::Empty)?;
        let element = xot
            .children(wrapper)
            .filter(|child| xot.is_element(*child))
            .last()
            .ok_or(TemplateError::Empty)?;
        let local = xot
            .element(element)
            .map(|element| xot.local_name_str(element.name()))
            .unwrap_or_default();
        if local != "organizationInfo" {
            return Err(TemplateError::WrongElement(local.to_string()));
        }
        Ok(Self {
            xml: xml.trim().to_string(),
        })
    }

    /// FIN-CLARIN, the consortium that curates the metadata.
    pub fn fin_clarin() -> Self {
        Self {
            xml: FIN_CLARIN.to_string(),
        }
    }

    /// CSC, the host of the Language Bank of Finland.
    pub fn language_bank() -> Self {
        Self {
            xml: LANGUAGE_BANK.to_string(),
        }
    }

    /// The University of Helsinki, rights holder for corpora published by
    /// the Language Bank.
    pub fn uhel() -> Self {
        Self {
            xml: UHEL.to_string(),
        }
    }

    pub fn xml(&self) -> &str {
        &self.xml
    }
}

/// Elements that wrap a person or organization together with its role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrapper {
    LicensorOrganization,
    DistributionRightsHolderOrganization,
    Affiliation,
    ResourceCreatorPerson,
    ResourceCreatorOrganization,
}

impl Wrapper {
    pub fn local_name(self) -> &'static str {
        match self {
            Self::LicensorOrganization => "licensorOrganization",
            Self::DistributionRightsHolderOrganization => "distributionRightsHolderOrganization",
            Self::Affiliation => "affiliation",
            Self::ResourceCreatorPerson => "resourceCreatorPerson",
            Self::ResourceCreatorOrganization => "resourceCreatorOrganization",
        }
    }

    /// The content of the `role` element.
    pub fn role(self) -> &'static str {
        match self {
            Self::LicensorOrganization => "licensor",
            Self::DistributionRightsHolderOrganization => "distributionRightsHolder",
            Self::Affiliation => "affiliation",
            Self::ResourceCreatorPerson | Self::ResourceCreatorOrganization => "resourceCreator",
        }
    }

    /// The wrapper as a complete fragment with `content` after the role.
    pub fn wrap(self, content: &str) -> String {
        let name = self.local_name();
        format!(
            r#"<{name} xmlns="{CMD_NAMESPACE}"><role>{}</role>{content}</{name}>"#,
            self.role()
        )
    }

    pub fn wrap_organization(self, organization: &OrganizationTemplate) -> String {
        self.wrap(organization.xml())
    }
}

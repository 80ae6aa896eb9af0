use std::collections::BTreeMap;

use cmdi_record::{string_literal, Node, Record, CMD_NAMESPACE};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::error::Result;
use crate::modifier::Modifier;
use crate::templates::Wrapper;
use crate::DIAGNOSTICS;

const RESOURCE_INFO_XPATH: &str = "oai:metadata/cmd:CMD/cmd:Components/cmd:resourceInfo";

/// The author strings of one record, in Finnish and in English.
///
/// Authors are separated by `;`. An author in curly braces is an
/// organization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthorStrings {
    pub fi: String,
    pub en: String,
    /// Display label of the resource, only used in messages.
    #[serde(default)]
    pub label: String,
}

/// Author strings keyed by PID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct CreatorDictionary {
    entries: BTreeMap<String, AuthorStrings>,
}

impl CreatorDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pid: impl Into<String>, authors: AuthorStrings) {
        self.entries.insert(pid.into(), authors);
    }

    pub fn get(&self, pid: &str) -> Option<&AuthorStrings> {
        self.entries.get(pid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, AuthorStrings)> for CreatorDictionary {
    fn from_iter<T: IntoIterator<Item = (String, AuthorStrings)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

// Why an author list could not be turned into creators. None of these stop
// the run; the record just doesn't get creators.
#[derive(Debug, Error, PartialEq, Eq)]
enum Unresolved {
    #[error("{fi} Finnish authors but {en} English authors")]
    AuthorCountMismatch { fi: usize, en: usize },
    #[error("no organizationInfo named {0:?}")]
    UnknownOrganization(String),
    #[error("Finnish author {fi:?} and English author {en:?} differ")]
    AmbiguousPerson { fi: String, en: String },
    #[error("author {0:?} is not of the form \"first last\"")]
    UnsupportedName(String),
    #[error("no personInfo for {given_name} {surname}")]
    UnknownPerson { given_name: String, surname: String },
    #[error("author list is empty")]
    NoAuthors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Creator {
    Person(Node),
    Organization(Node),
}

impl Creator {
    fn wrapper(self) -> Wrapper {
        match self {
            Self::Person(_) => Wrapper::ResourceCreatorPerson,
            Self::Organization(_) => Wrapper::ResourceCreatorOrganization,
        }
    }

    fn node(self) -> Node {
        match self {
            Self::Person(node) | Self::Organization(node) => node,
        }
    }
}

/// Adds `resourceCreationInfo` from a dictionary of author strings.
///
/// Creators are never made up from the strings: every author has to match a
/// person or organization already described somewhere in the record, and
/// that description is copied. If any author cannot be matched the record is
/// left without creators.
#[derive(Debug, Clone)]
pub struct InferCreators {
    dictionary: CreatorDictionary,
}

impl InferCreators {
    pub fn new(dictionary: CreatorDictionary) -> Self {
        Self { dictionary }
    }

    fn resolve(
        &self,
        record: &mut Record,
        authors: &AuthorStrings,
    ) -> Result<std::result::Result<Vec<Creator>, Unresolved>> {
        let fi: Vec<&str> = authors.fi.split(';').map(str::trim).collect();
        let en: Vec<&str> = authors.en.split(';').map(str::trim).collect();
        if fi.len() != en.len() {
            return Ok(Err(Unresolved::AuthorCountMismatch {
                fi: fi.len(),
                en: en.len(),
            }));
        }

        let mut creators = Vec::new();
        for (&en, &fi) in en.iter().zip(fi.iter()) {
            if en.is_empty() && fi.is_empty() {
                continue;
            }
            let creator = if en.starts_with('{') || fi.starts_with('{') {
                let (en, fi) = (strip_braces(en), strip_braces(fi));
                match find_organization(record, en, fi)? {
                    Some(organization) => Creator::Organization(organization),
                    None => {
                        let name = if en.is_empty() { fi } else { en };
                        return Ok(Err(Unresolved::UnknownOrganization(name.to_string())));
                    }
                }
            } else {
                let name = match (en, fi) {
                    (en, fi) if en == fi => en,
                    (en, "") => en,
                    ("", fi) => fi,
                    (en, fi) => {
                        return Ok(Err(Unresolved::AmbiguousPerson {
                            fi: fi.to_string(),
                            en: en.to_string(),
                        }))
                    }
                };
                let tokens: Vec<&str> = name.split_whitespace().collect();
                let [given_name, surname] = tokens.as_slice() else {
                    return Ok(Err(Unresolved::UnsupportedName(name.to_string())));
                };
                match find_person(record, given_name, surname)? {
                    Some(person) => Creator::Person(person),
                    None => {
                        return Ok(Err(Unresolved::UnknownPerson {
                            given_name: given_name.to_string(),
                            surname: surname.to_string(),
                        }))
                    }
                }
            };
            creators.push(creator);
        }

        if creators.is_empty() {
            return Ok(Err(Unresolved::NoAuthors));
        }
        Ok(Ok(creators))
    }
}

impl Modifier for InferCreators {
    fn name(&self) -> &str {
        "infer resource creators"
    }

    fn apply(&self, record: &mut Record) -> Result<bool> {
        let pid = record.pid()?;
        let Some(authors) = self.dictionary.get(&pid) else {
            return Ok(false);
        };
        let duplicate = !record
            .select_all(&format!("{RESOURCE_INFO_XPATH}/cmd:resourceCreationInfo"))?
            .is_empty();
        if duplicate {
            warn!(
                target: DIAGNOSTICS,
                pid = pid.as_str(),
                "resourceCreationInfo already present, skipping insertion of duplicate"
            );
        }

        let creators = match self.resolve(record, authors)? {
            Ok(creators) => creators,
            Err(unresolved) => {
                warn!(
                    target: DIAGNOSTICS,
                    pid = pid.as_str(),
                    label = authors.label.as_str(),
                    "cannot infer creators: {unresolved}"
                );
                return Ok(false);
            }
        };
        if duplicate {
            return Ok(false);
        }
        let Some(resource_info) = record.select_all(RESOURCE_INFO_XPATH)?.first().copied() else {
            warn!(target: DIAGNOSTICS, pid = pid.as_str(), "record has no resourceInfo");
            return Ok(false);
        };

        let creation_info = record.parse_fragment(&format!(
            r#"<resourceCreationInfo xmlns="{CMD_NAMESPACE}"/>"#
        ))?;
        for creator in &creators {
            let wrapper = record.parse_fragment(&creator.wrapper().wrap(""))?;
            let description = record.duplicate(creator.node());
            record.append(wrapper, description)?;
            record.append(creation_info, wrapper)?;
        }
        record.append(resource_info, creation_info)?;
        info!(
            pid = pid.as_str(),
            creators = creators.len(),
            "added resourceCreationInfo"
        );
        record.reindent()?;
        Ok(true)
    }
}

fn strip_braces(s: &str) -> &str {
    s.trim().trim_start_matches('{').trim_end_matches('}').trim()
}

fn find_organization(record: &mut Record, en: &str, fi: &str) -> Result<Option<Node>> {
    let names: Vec<String> = [en, fi]
        .into_iter()
        .filter(|name| !name.is_empty())
        .map(|name| format!("cmd:organizationName = {}", string_literal(name)))
        .collect();
    if names.is_empty() {
        return Ok(None);
    }
    let xpath = format!("//cmd:organizationInfo[{}]", names.join(" or "));
    Ok(record.select_all(&xpath)?.first().copied())
}

fn find_person(record: &mut Record, given_name: &str, surname: &str) -> Result<Option<Node>> {
    let xpath = format!(
        "//cmd:personInfo[cmd:surname = {} and cmd:givenName = {}]",
        string_literal(surname),
        string_literal(given_name)
    );
    Ok(record.select_all(&xpath)?.first().copied())
}

#[cfg(test)]
mod tests {
    use cmdi_record::Namespaces;

    use super::*;
    use crate::testing::{count, person, record, PID};

    const JRC: &str = r#"<distributionInfo><licenceInfo><licensorOrganization><role>licensor</role>
        <organizationInfo>
          <organizationName xml:lang="en">Joint Research Centre (JRC)</organizationName>
          <organizationName xml:lang="fi">Yhteinen tutkimuskeskus</organizationName>
        </organizationInfo>
      </licensorOrganization></licenceInfo></distributionInfo>"#;

    fn dictionary(fi: &str, en: &str) -> InferCreators {
        let mut dictionary = CreatorDictionary::new();
        dictionary.insert(
            PID,
            AuthorStrings {
                fi: fi.to_string(),
                en: en.to_string(),
                label: "Test corpus".to_string(),
            },
        );
        InferCreators::new(dictionary)
    }

    fn contacts() -> String {
        format!(
            "<contactPerson>{}</contactPerson><contactPerson>{}</contactPerson>",
            person("Virtanen", "Matti"),
            person("Korhonen", "Liisa")
        )
    }

    fn resolve(
        modifier: &InferCreators,
        record: &mut Record,
    ) -> std::result::Result<Vec<Creator>, Unresolved> {
        let authors = modifier.dictionary.get(PID).unwrap().clone();
        modifier.resolve(record, &authors).unwrap()
    }

    #[test]
    fn test_organization_creator() {
        let mut record = record(JRC);
        let modifier = dictionary("", "{Joint Research Centre (JRC)}");
        assert!(modifier.apply(&mut record).unwrap());
        let creators = record
            .select_all("//cmd:resourceInfo/cmd:resourceCreationInfo/cmd:resourceCreatorOrganization")
            .unwrap();
        assert_eq!(creators.len(), 1);
        let role = record.select(creators[0], "cmd:role").unwrap();
        assert_eq!(record.text(role[0]), "resourceCreator");
        assert_eq!(
            count(
                &mut record,
                "//cmd:resourceCreatorOrganization/cmd:organizationInfo/cmd:organizationName[@xml:lang = 'fi']"
            ),
            1
        );
    }

    #[test]
    fn test_finnish_organization_name_matches() {
        let mut record = record(JRC);
        let modifier = dictionary("{Yhteinen tutkimuskeskus}", "{JRC}");
        assert!(modifier.apply(&mut record).unwrap());
    }

    #[test]
    fn test_unknown_organization() {
        let mut record = record(&contacts());
        let modifier = dictionary("", "{Joint Research Centre (JRC)}");
        assert_eq!(
            resolve(&modifier, &mut record),
            Err(Unresolved::UnknownOrganization(
                "Joint Research Centre (JRC)".to_string()
            ))
        );
        assert!(!modifier.apply(&mut record).unwrap());
        assert_eq!(count(&mut record, "//cmd:resourceCreationInfo"), 0);
    }

    #[test]
    fn test_persons_in_order() {
        let mut record = record(&contacts());
        // the second English author is missing, so the Finnish one is used
        let modifier = dictionary("Liisa Korhonen; Matti Virtanen", "Liisa Korhonen; ");
        assert!(modifier.apply(&mut record).unwrap());
        let surnames = record
            .select_all("//cmd:resourceCreationInfo/cmd:resourceCreatorPerson/cmd:personInfo/cmd:surname")
            .unwrap();
        let surnames: Vec<String> = surnames.iter().map(|node| record.text(*node)).collect();
        assert_eq!(surnames, vec!["Korhonen", "Virtanen"]);
    }

    #[test]
    fn test_inserted_creators_round_trip() {
        let mut record = record(&contacts());
        let modifier = dictionary(
            "Liisa Korhonen; Matti Virtanen",
            "Liisa Korhonen; Matti Virtanen",
        );
        assert!(modifier.apply(&mut record).unwrap());
        let pretty = record.serialize(true).unwrap();
        let reparsed = Record::parse(&pretty, Namespaces::cmdi()).unwrap();
        assert_eq!(reparsed.serialize(true).unwrap(), pretty);
        assert_eq!(reparsed.serialize(false).unwrap(), record.serialize(false).unwrap());
        assert!(pretty.contains("<resourceCreationInfo>\n"));
    }

    #[test]
    fn test_count_mismatch() {
        let mut record = record(&contacts());
        let modifier = dictionary("Liisa Korhonen; Matti Virtanen", "Liisa Korhonen");
        assert_eq!(
            resolve(&modifier, &mut record),
            Err(Unresolved::AuthorCountMismatch { fi: 2, en: 1 })
        );
        assert!(!modifier.apply(&mut record).unwrap());
    }

    #[test]
    fn test_ambiguous_person() {
        let mut record = record(&contacts());
        let modifier = dictionary("Liisa Korhonen", "Matti Virtanen");
        assert_eq!(
            resolve(&modifier, &mut record),
            Err(Unresolved::AmbiguousPerson {
                fi: "Liisa Korhonen".to_string(),
                en: "Matti Virtanen".to_string()
            })
        );
    }

    #[test]
    fn test_unsupported_name() {
        let mut record = record(&contacts());
        let modifier = dictionary("Liisa Maria Korhonen", "");
        assert_eq!(
            resolve(&modifier, &mut record),
            Err(Unresolved::UnsupportedName("Liisa Maria Korhonen".to_string()))
        );
    }

    #[test]
    fn test_all_or_nothing() {
        let mut record = record(&contacts());
        let modifier = dictionary(
            "Liisa Korhonen; Pekka Nieminen",
            "Liisa Korhonen; Pekka Nieminen",
        );
        assert_eq!(
            resolve(&modifier, &mut record),
            Err(Unresolved::UnknownPerson {
                given_name: "Pekka".to_string(),
                surname: "Nieminen".to_string()
            })
        );
        assert!(!modifier.apply(&mut record).unwrap());
        assert_eq!(count(&mut record, "//cmd:resourceCreationInfo"), 0);
    }

    #[test]
    fn test_only_empty_authors() {
        let mut record = record(&contacts());
        let modifier = dictionary(" ; ", ";");
        assert_eq!(resolve(&modifier, &mut record), Err(Unresolved::NoAuthors));
        assert!(!modifier.apply(&mut record).unwrap());
    }

    #[test]
    fn test_not_in_dictionary() {
        let mut record = crate::testing::record_with_pid("urn:nbn:fi:lb-1", &contacts());
        assert!(!dictionary("Liisa Korhonen", "").apply(&mut record).unwrap());
    }

    #[test]
    fn test_existing_creation_info_not_duplicated() {
        let mut record = record(&format!(
            "{}<resourceCreationInfo><resourceCreatorPerson><role>resourceCreator</role>{}</resourceCreatorPerson></resourceCreationInfo>",
            contacts(),
            person("Korhonen", "Liisa")
        ));
        let modifier = dictionary("Liisa Korhonen", "Liisa Korhonen");
        assert!(!modifier.apply(&mut record).unwrap());
        assert_eq!(count(&mut record, "//cmd:resourceCreationInfo"), 1);
    }

    #[test]
    fn test_idempotent() {
        let mut record = record(&contacts());
        let modifier = dictionary("Matti Virtanen", "Matti Virtanen");
        assert!(modifier.apply(&mut record).unwrap());
        assert!(!modifier.apply(&mut record).unwrap());
        assert_eq!(count(&mut record, "//cmd:resourceCreatorPerson"), 1);
    }

    #[test]
    fn test_dictionary_json() {
        let dictionary: CreatorDictionary = serde_json::from_str(
            r#"{"urn:nbn:fi:lb-1": {"fi": "Liisa Korhonen", "en": "Liisa Korhonen", "label": "Corpus"}}"#,
        )
        .unwrap();
        assert_eq!(dictionary.len(), 1);
        assert_eq!(dictionary.get("urn:nbn:fi:lb-1").unwrap().label, "Corpus");
    }
}

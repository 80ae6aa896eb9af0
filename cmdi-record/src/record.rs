use tracing::trace;
use xee_xpath::context::StaticContextBuilder;
use xee_xpath::{Documents, Queries, Query};
use xot::output::xml::Parameters;
use xot::output::Indentation;
use xot::Node;

use crate::error::{Error, Result};
use crate::namespaces::Namespaces;
use crate::whitespace::strip_indentation;

const SELF_LINK_XPATH: &str = "oai:metadata/cmd:CMD/cmd:Header/cmd:MdSelfLink";

/// One harvested metadata record.
///
/// The record owns its document. Modifiers borrow it mutably for the
/// duration of a single edit, and node handles they obtain are only valid
/// until the next [`Record::reindent`].
pub struct Record {
    documents: Documents,
    namespaces: Namespaces,
    document_element: Node,
}

impl Record {
    /// Parse a record from XML text.
    ///
    /// Indentation whitespace is dropped on load so that the pretty
    /// serialization is independent of how the record was formatted by the
    /// repository.
    pub fn parse(xml: &str, namespaces: Namespaces) -> Result<Self> {
        let mut documents = Documents::new();
        let handle = documents
            .add_string_without_uri(xml)
            .map_err(|e| Error::Documents(e.to_string()))?;
        let queries = Queries::default();
        // "." on a document handle is the document node, not its element
        let root = queries
            .one(".", |_, item| Ok(item.to_node()?))?
            .execute(&mut documents, handle)?;
        let document_element = documents.xot().document_element(root)?;
        strip_indentation(documents.xot_mut(), document_element);
        Ok(Self {
            documents,
            namespaces,
            document_element,
        })
    }

    /// The outermost element, normally `oai:record`.
    pub fn document_element(&self) -> Node {
        self.document_element
    }

    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    /// Select the nodes matched by `xpath`, evaluated with `context` as the
    /// context item. No match gives an empty vector.
    pub fn select(&mut self, context: Node, xpath: &str) -> Result<Vec<Node>> {
        let mut builder = StaticContextBuilder::default();
        for (prefix, uri) in self.namespaces.iter() {
            builder.add_namespace(prefix, uri);
        }
        let queries = Queries::new(builder);
        let query = queries.many(xpath, |_, item| Ok(item.to_node()?))?;
        Ok(query.execute(&mut self.documents, context)?)
    }

    /// Select with the document element as context.
    pub fn select_all(&mut self, xpath: &str) -> Result<Vec<Node>> {
        self.select(self.document_element, xpath)
    }

    pub fn exists(&mut self, context: Node, xpath: &str) -> Result<bool> {
        Ok(!self.select(context, xpath)?.is_empty())
    }

    pub fn parent(&self, node: Node) -> Option<Node> {
        self.documents.xot().parent(node)
    }

    /// The local name and namespace URI of an element node.
    pub fn element_name(&self, node: Node) -> Option<(&str, &str)> {
        let xot = self.documents.xot();
        xot.element(node)
            .map(|element| xot.name_ns_str(element.name()))
    }

    /// The string value of a node: all descendant text, concatenated.
    pub fn text(&self, node: Node) -> String {
        self.documents.xot().string_value(node)
    }

    /// Put `new` in the place of `old`. `new` must be detached.
    pub fn replace(&mut self, old: Node, new: Node) -> Result<()> {
        let xot = self.documents.xot_mut();
        xot.insert_before(old, new)?;
        xot.remove(old)?;
        Ok(())
    }

    /// Append `child` as the last child of `parent`.
    pub fn append(&mut self, parent: Node, child: Node) -> Result<()> {
        self.documents.xot_mut().append(parent, child)?;
        Ok(())
    }

    /// A detached deep copy of `node`.
    pub fn duplicate(&mut self, node: Node) -> Node {
        self.documents.xot_mut().clone_node(node)
    }

    /// Build a detached element from a complete XML fragment. The fragment
    /// must declare the namespaces it uses.
    pub fn parse_fragment(&mut self, xml: &str) -> Result<Node> {
        let xot = self.documents.xot_mut();
        let root = xot.parse(xml)?;
        let element = xot.document_element(root)?;
        strip_indentation(xot, element);
        Ok(xot.clone_node(element))
    }

    /// Serialize the whole document. The pretty form is what gets diffed
    /// and uploaded.
    pub fn serialize(&self, pretty: bool) -> Result<String> {
        let xot = self.documents.xot();
        let root = xot
            .parent(self.document_element)
            .ok_or(Error::NoDocumentNode)?;
        let parameters = Parameters {
            indentation: pretty.then(Indentation::default),
            ..Default::default()
        };
        Ok(xot.serialize_xml_string(parameters, root)?)
    }

    /// Serialize a single element on its own, declaring the namespaces it
    /// inherits from its ancestors.
    pub fn node_xml(&self, node: Node) -> Result<String> {
        Ok(self.documents.xot().to_string(node)?)
    }

    /// Normalize the document after structural edits.
    ///
    /// Whitespace carried in by inserted fragments is removed and the
    /// document is loaded afresh, so query results are in document order
    /// for the edited tree. All previously obtained node handles become
    /// invalid.
    pub fn reindent(&mut self) -> Result<()> {
        strip_indentation(self.documents.xot_mut(), self.document_element);
        let xml = self.serialize(false)?;
        *self = Record::parse(&xml, self.namespaces.clone())?;
        trace!("reloaded record after edit");
        Ok(())
    }

    /// The persistent identifier from `Header/MdSelfLink`.
    pub fn pid(&mut self) -> Result<String> {
        let links = self.select_all(SELF_LINK_XPATH)?;
        match links.as_slice() {
            [link] => Ok(self.text(*link).trim().to_string()),
            [] => Err(Error::MissingIdentifier),
            links => Err(Error::MultipleIdentifiers(links.len())),
        }
    }
}

/// Quote `s` as an XPath string literal.
pub fn string_literal(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const RECORD: &str = r#"<record xmlns="http://www.openarchives.org/OAI/2.0/">
  <header><identifier>oai:clarino.uib.no:lb-2020010100</identifier></header>
  <metadata>
    <CMD xmlns="http://www.clarin.eu/cmd/">
      <Header>
        <MdSelfLink>urn:nbn:fi:lb-2020010100</MdSelfLink>
      </Header>
      <Components>
        <resourceInfo>
          <contactPerson>
            <personInfo>
              <surname>Doe</surname>
              <givenName>Jane</givenName>
            </personInfo>
          </contactPerson>
        </resourceInfo>
      </Components>
    </CMD>
  </metadata>
</record>"#;

    fn record() -> Record {
        Record::parse(RECORD, Namespaces::cmdi()).unwrap()
    }

    #[test]
    fn test_pid() {
        assert_eq!(record().pid().unwrap(), "urn:nbn:fi:lb-2020010100");
    }

    #[test]
    fn test_document_element_is_record() {
        let record = record();
        assert_eq!(
            record.element_name(record.document_element()),
            Some(("record", crate::OAI_NAMESPACE))
        );
        let compact = record.serialize(false).unwrap();
        assert!(compact.starts_with("<record xmlns=\"http://www.openarchives.org/OAI/2.0/\">"));
        assert!(compact.ends_with("</record>"));
    }

    #[test]
    fn test_missing_pid() {
        let mut record = Record::parse(
            r#"<record xmlns="http://www.openarchives.org/OAI/2.0/"><metadata/></record>"#,
            Namespaces::cmdi(),
        )
        .unwrap();
        assert!(matches!(record.pid(), Err(Error::MissingIdentifier)));
    }

    #[test]
    fn test_select_nothing() {
        let mut record = record();
        assert!(record.select_all("//cmd:licensorPerson").unwrap().is_empty());
    }

    #[test]
    fn test_parent_and_name() {
        let mut record = record();
        let persons = record.select_all("//cmd:personInfo").unwrap();
        assert_eq!(persons.len(), 1);
        let parent = record.parent(persons[0]).unwrap();
        assert_eq!(
            record.element_name(parent),
            Some(("contactPerson", crate::CMD_NAMESPACE))
        );
    }

    #[test]
    fn test_select_relative() {
        let mut record = record();
        let person = record.select_all("//cmd:personInfo").unwrap()[0];
        let surnames = record.select(person, "cmd:surname").unwrap();
        assert_eq!(record.text(surnames[0]), "Doe");
    }

    #[test]
    fn test_replace_with_fragment() {
        let mut record = record();
        let contact = record.select_all("//cmd:contactPerson").unwrap()[0];
        let fragment = record
            .parse_fragment(
                r#"<contactPerson xmlns="http://www.clarin.eu/cmd/">
                     <personInfo><surname>Roe</surname></personInfo>
                   </contactPerson>"#,
            )
            .unwrap();
        record.replace(contact, fragment).unwrap();
        record.reindent().unwrap();
        let surnames = record.select_all("//cmd:surname").unwrap();
        assert_eq!(surnames.len(), 1);
        assert_eq!(record.text(surnames[0]), "Roe");
    }

    #[test]
    fn test_append_duplicate() {
        let mut record = record();
        let resource_info = record.select_all("//cmd:resourceInfo").unwrap()[0];
        let person = record.select_all("//cmd:personInfo").unwrap()[0];
        let copy = record.duplicate(person);
        record.append(resource_info, copy).unwrap();
        record.reindent().unwrap();
        assert_eq!(record.select_all("//cmd:personInfo").unwrap().len(), 2);
        assert_eq!(
            record
                .select_all("//cmd:resourceInfo/cmd:personInfo")
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_serialize_is_stable() {
        let record = record();
        let first = record.serialize(true).unwrap();
        let second = record.serialize(true).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_serialize_round_trip() {
        let record = record();
        let pretty = record.serialize(true).unwrap();
        let reparsed = Record::parse(&pretty, Namespaces::cmdi()).unwrap();
        assert_eq!(reparsed.serialize(true).unwrap(), pretty);
    }

    #[test]
    fn test_serialize_round_trip_after_edit() {
        let mut record = record();
        let person = record.select_all("//cmd:personInfo").unwrap()[0];
        let fragment = record
            .parse_fragment(
                r#"<organizationInfo xmlns="http://www.clarin.eu/cmd/">
  <organizationName xml:lang="en">FIN-CLARIN</organizationName>
</organizationInfo>"#,
            )
            .unwrap();
        record.replace(person, fragment).unwrap();
        record.reindent().unwrap();
        let pretty = record.serialize(true).unwrap();
        let reparsed = Record::parse(&pretty, Namespaces::cmdi()).unwrap();
        assert_eq!(reparsed.serialize(true).unwrap(), pretty);
        assert_eq!(reparsed.serialize(false).unwrap(), record.serialize(false).unwrap());
        assert!(!pretty.contains("personInfo"));
        assert!(pretty.contains(
            "<contactPerson>\n            <organizationInfo>\n              <organizationName"
        ));
    }

    #[test]
    fn test_serialize_ignores_input_indentation() {
        let compact = record().serialize(false).unwrap();
        assert!(!compact.contains("\n  "));
        let reparsed = Record::parse(&compact, Namespaces::cmdi()).unwrap();
        assert_eq!(
            reparsed.serialize(true).unwrap(),
            record().serialize(true).unwrap()
        );
    }

    #[rstest]
    #[case("FIN-CLARIN", r#""FIN-CLARIN""#)]
    #[case("O'Brien", r#""O'Brien""#)]
    #[case(r#"a "b""#, r#""a ""b""""#)]
    fn test_string_literal(#[case] s: &str, #[case] expected: &str) {
        assert_eq!(string_literal(s), expected);
    }

    #[test]
    fn test_node_xml_inherits_namespaces() {
        let mut record = record();
        let person = record.select_all("//cmd:personInfo").unwrap()[0];
        let xml = record.node_xml(person).unwrap();
        let mut detached = Record::parse(&xml, Namespaces::cmdi()).unwrap();
        assert_eq!(
            detached
                .select_all("/cmd:personInfo/cmd:surname")
                .unwrap()
                .len(),
            1
        );
    }
}

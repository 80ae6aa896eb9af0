/// The CMDI namespace used by every element inside `CMD`.
pub const CMD_NAMESPACE: &str = "http://www.clarin.eu/cmd/";
/// The OAI-PMH envelope namespace.
pub const OAI_NAMESPACE: &str = "http://www.openarchives.org/OAI/2.0/";

/// Prefix declarations made available to XPath expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespaces {
    declarations: Vec<(String, String)>,
}

impl Namespaces {
    /// An empty mapping. Only unprefixed names without a namespace can be
    /// matched with it.
    pub fn new() -> Self {
        Self {
            declarations: Vec::new(),
        }
    }

    /// The mapping used for harvested records: `cmd` and `oai`.
    pub fn cmdi() -> Self {
        let mut namespaces = Self::new();
        namespaces.add("cmd", CMD_NAMESPACE);
        namespaces.add("oai", OAI_NAMESPACE);
        namespaces
    }

    /// Declare `prefix`. A later declaration of the same prefix wins.
    pub fn add(&mut self, prefix: &str, uri: &str) -> &mut Self {
        self.declarations.retain(|(existing, _)| existing != prefix);
        self.declarations.push((prefix.to_string(), uri.to_string()));
        self
    }

    pub fn uri(&self, prefix: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|(existing, _)| existing == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.declarations
            .iter()
            .map(|(prefix, uri)| (prefix.as_str(), uri.as_str()))
    }
}

impl Default for Namespaces {
    fn default() -> Self {
        Self::new()
    }
}

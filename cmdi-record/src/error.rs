use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Cannot parse XML fragment: {0}")]
    Parse(#[from] xot::ParseError),
    #[error("Cannot load record: {0}")]
    Documents(String),
    #[error("Xot error: {0}")]
    Xot(#[from] xot::Error),
    #[error("XPath error: {0}")]
    XPath(#[from] xee_xpath::error::Error),
    #[error("Record has no MdSelfLink")]
    MissingIdentifier,
    #[error("Record has {0} MdSelfLink elements, expected exactly one")]
    MultipleIdentifiers(usize),
    #[error("Record has no document node")]
    NoDocumentNode,
}

pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModifierError {
    /// A match was found in a context no rule exists for.
    #[error("Unexpected person element of type {tag} encountered")]
    UnrecognizedStructure { tag: String },
    /// An insert-only rule found the value it would insert already present.
    #[error("Record {pid} already has a distribution rights holder")]
    Conflict { pid: String },
    #[error(transparent)]
    Record(#[from] cmdi_record::Error),
}

pub type Result<T> = std::result::Result<T, ModifierError>;

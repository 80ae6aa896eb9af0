//! CMDI metadata records.
//!
//! A [`Record`] wraps one harvested OAI-PMH record in a Xot arena and makes
//! it available to XPath queries, using an explicit [`Namespaces`] mapping.
//! Records can be edited in place and serialized back into a canonical,
//! indentation-normalized form that diffs cleanly.
mod error;
mod namespaces;
mod record;
mod whitespace;

pub use error::{Error, Result};
pub use namespaces::{Namespaces, CMD_NAMESPACE, OAI_NAMESPACE};
pub use record::{string_literal, Record};
pub use xot::Node;

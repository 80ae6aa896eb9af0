use cmdi_record::Record;

use crate::error::Result;

/// A single correction or enrichment rule.
///
/// `apply` edits the record in place and reports whether anything changed.
/// Nothing to do is `Ok(false)`, never an error. Applying a modifier to a
/// record it already corrected must not repeat the correction.
pub trait Modifier {
    /// Short human readable name, used in logs.
    fn name(&self) -> &str;

    fn apply(&self, record: &mut Record) -> Result<bool>;
}

//! Transaction branch identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one branch of a global transaction.
///
/// The global part is shared by every participant enlisted in the same
/// transaction; the branch qualifier distinguishes participants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Xid {
    pub format_id: i32,
    #[serde(with = "serde_bytes")]
    pub global_transaction_id: Vec<u8>,
    #[serde(with = "serde_bytes")]
    pub branch_qualifier: Vec<u8>,
}

impl Xid {
    pub fn new(format_id: i32, global_transaction_id: Vec<u8>, branch_qualifier: Vec<u8>) -> Self {
        Self {
            format_id,
            global_transaction_id,
            branch_qualifier,
        }
    }
}

impl fmt::Display for Xid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.format_id)?;
        write_hex(f, &self.global_transaction_id)?;
        f.write_str(":")?;
        write_hex(f, &self.branch_qualifier)
    }
}

fn write_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    for b in bytes {
        write!(f, "{b:02x}")?;
    }
    Ok(())
}

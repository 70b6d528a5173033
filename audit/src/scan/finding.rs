//! Diagnostics emitted by the continuity scan.
//!
//! A [`ContinuityBreak`] is the signal the auditor exists for: a stored
//! block whose declared parent hash is not the hash stored one number below.
//! A [`MissingRecord`] is only produced under [`GapPolicy::Report`] and marks
//! a position that could not be checked because a row is absent.
//!
//! [`GapPolicy::Report`]: super::GapPolicy::Report

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::storage::block::{serialize_prefixed_hex, to_prefixed_hex};
use crate::storage::{Block, BlockNumber};

/// A broken parent-hash link between two consecutive stored blocks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ContinuityBreak {
    /// Number of the block whose parent link is broken.
    pub child_num: BlockNumber,
    /// Parent hash the child declares.
    #[serde(serialize_with = "serialize_prefixed_hex")]
    pub child_parent_hash: Vec<u8>,
    /// Always `child_num - 1`.
    pub parent_num: BlockNumber,
    /// Hash actually stored for `parent_num`.
    #[serde(serialize_with = "serialize_prefixed_hex")]
    pub parent_block_hash: Vec<u8>,
}

impl ContinuityBreak {
    pub fn new(child: &Block, parent: &Block) -> Self {
        Self {
            child_num: child.number,
            child_parent_hash: child.parent_hash.clone(),
            parent_num: parent.number,
            parent_block_hash: parent.hash.clone(),
        }
    }
}

impl fmt::Display for ContinuityBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Block #{}, parentHash {}",
            self.child_num,
            to_prefixed_hex(&self.child_parent_hash)
        )?;
        write!(
            f,
            "ParentBlock #{}, blockHash {}",
            self.parent_num,
            to_prefixed_hex(&self.parent_block_hash)
        )
    }
}

/// Which side of a scanned pair had no stored row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingSide {
    /// The block at the scanned position itself.
    Child,
    /// Its predecessor.
    Parent,
    Both,
}

impl MissingSide {
    /// `None` when both rows are present.
    pub fn from_presence(child_present: bool, parent_present: bool) -> Option<Self> {
        match (child_present, parent_present) {
            (true, true) => None,
            (false, true) => Some(MissingSide::Child),
            (true, false) => Some(MissingSide::Parent),
            (false, false) => Some(MissingSide::Both),
        }
    }
}

/// A scanned position that could not be compared because a row is absent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MissingRecord {
    /// The position being checked.
    pub child_num: BlockNumber,
    pub missing: MissingSide,
}

impl MissingRecord {
    /// Block numbers with no stored row, newest first.
    pub fn missing_numbers(&self) -> Vec<BlockNumber> {
        let parent_num = self.child_num.checked_sub(1);
        match self.missing {
            MissingSide::Child => vec![self.child_num],
            MissingSide::Parent => parent_num.into_iter().collect(),
            MissingSide::Both => std::iter::once(self.child_num).chain(parent_num).collect(),
        }
    }
}

impl fmt::Display for MissingRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self
            .missing_numbers()
            .into_iter()
            .map(|n| format!("Missing Block #{n} (checking Block #{})", self.child_num))
            .collect();
        f.write_str(&lines.join("\n"))
    }
}

/// Anything the scan reports for a single position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    Break(ContinuityBreak),
    Missing(MissingRecord),
}

impl Finding {
    pub fn child_num(&self) -> BlockNumber {
        match self {
            Finding::Break(b) => b.child_num,
            Finding::Missing(m) => m.child_num,
        }
    }

    pub fn as_break(&self) -> Option<&ContinuityBreak> {
        match self {
            Finding::Break(b) => Some(b),
            Finding::Missing(_) => None,
        }
    }

    pub fn is_break(&self) -> bool {
        matches!(self, Finding::Break(_))
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::Break(b) => b.fmt(f),
            Finding::Missing(m) => m.fmt(f),
        }
    }
}

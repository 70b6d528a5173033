//! In-memory block store.
//!
//! Holds blocks in a `BTreeMap` behind a `parking_lot::RwLock`. Useful for
//! tests, benchmarks and auditing small exports that were loaded without a
//! database. Writes here only ever come from whoever builds the fixture; the
//! scanner itself reads through [`BlockStore`] like any other backend.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::block::{Block, BlockNumber};
use super::store::{BlockStore, StoreResult, StoreStats};

/// Block store backed by an ordered map.
#[derive(Debug, Default)]
pub struct MemoryBlockStore {
    blocks: RwLock<BTreeMap<BlockNumber, Block>>,
}

impl MemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from any collection of blocks. Later entries win when
    /// two blocks share a number.
    pub fn from_blocks(blocks: impl IntoIterator<Item = Block>) -> Self {
        let map = blocks.into_iter().map(|b| (b.number, b)).collect();
        Self {
            blocks: RwLock::new(map),
        }
    }

    /// Insert or replace the block at its number.
    pub fn insert(&self, block: Block) -> Option<Block> {
        self.blocks.write().insert(block.number, block)
    }

    /// Remove the block at `number`, opening a gap.
    pub fn remove(&self, number: BlockNumber) -> Option<Block> {
        self.blocks.write().remove(&number)
    }

    /// Overwrite the declared parent hash of an existing block.
    ///
    /// Returns false when there is no block at `number`.
    pub fn set_parent_hash(&self, number: BlockNumber, parent_hash: impl Into<Vec<u8>>) -> bool {
        match self.blocks.write().get_mut(&number) {
            Some(block) => {
                block.parent_hash = parent_hash.into();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.read().is_empty()
    }
}

#[async_trait]
impl BlockStore for MemoryBlockStore {
    async fn count_and_max(&self) -> StoreResult<StoreStats> {
        let blocks = self.blocks.read();
        let max = blocks.keys().next_back().copied();
        Ok(StoreStats::new(blocks.len() as u64, max))
    }

    async fn block_by_number(&self, number: BlockNumber) -> StoreResult<Option<Block>> {
        Ok(self.blocks.read().get(&number).cloned())
    }
}

//! The block registry produced by the builder.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use crate::block::BasicBlock;
use crate::error::{PlaytimeError, Result};
use crate::label::Label;

/// Incoming-edge side table: block label → labels of its predecessors.
pub type Incoming = HashMap<Label, BTreeSet<Label>>;

/// A control-flow graph keyed by label, rooted at [`Label::Entry`].
#[derive(Debug, Clone, PartialEq)]
pub struct BlockGraph {
    blocks: BTreeMap<Label, BasicBlock>,
}

impl BlockGraph {
    pub(crate) fn from_blocks(blocks: impl IntoIterator<Item = BasicBlock>) -> Self {
        let mut map: BTreeMap<Label, BasicBlock> = blocks
            .into_iter()
            .map(|b| (b.label().clone(), b))
            .collect();
        map.entry(Label::Entry)
            .or_insert_with(|| BasicBlock::new(Label::Entry));
        Self { blocks: map }
    }

    /// Number of blocks in the registry (reachable or not).
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    #[must_use]
    pub fn get(&self, label: &Label) -> Option<&BasicBlock> {
        self.blocks.get(label)
    }

    /// All blocks in label order.
    pub fn blocks(&self) -> impl Iterator<Item = &BasicBlock> {
        self.blocks.values()
    }

    /// Look up the target of the edge `from → to`.
    ///
    /// # Errors
    ///
    /// [`PlaytimeError::DanglingEdge`] when `to` is not registered.
    pub fn resolve(&self, from: &Label, to: &Label) -> Result<&BasicBlock> {
        self.blocks
            .get(to)
            .ok_or_else(|| PlaytimeError::DanglingEdge {
                from: from.to_string(),
                to: to.to_string(),
            })
    }

    /// Breadth-first incoming-edge sets over the part reachable from entry.
    ///
    /// The entry block is present with an empty set (unless something jumps
    /// back to it); unreachable blocks are absent.
    ///
    /// # Errors
    ///
    /// [`PlaytimeError::DanglingEdge`] when a reachable edge has no target.
    pub fn incoming(&self) -> Result<Incoming> {
        let mut incoming: Incoming = HashMap::with_capacity(self.blocks.len());
        incoming.insert(Label::Entry, BTreeSet::new());
        let Some(entry) = self.blocks.get(&Label::Entry) else {
            return Ok(incoming);
        };

        let mut queue: VecDeque<&BasicBlock> = VecDeque::from([entry]);
        while let Some(block) = queue.pop_front() {
            for target in block.next() {
                let succ = self.resolve(block.label(), target)?;
                if incoming
                    .entry(target.clone())
                    .or_default()
                    .insert(block.label().clone())
                {
                    queue.push_back(succ);
                }
            }
        }
        Ok(incoming)
    }

    pub(crate) fn into_blocks(self) -> BTreeMap<Label, BasicBlock> {
        self.blocks
    }
}

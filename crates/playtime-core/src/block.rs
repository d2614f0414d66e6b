use crate::label::Label;
use crate::record::Record;

/// A labeled run of sequential content plus its possible exits.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    label: Label,
    text: Vec<Record>,
    next: Vec<Label>,
    disabled: bool,
    deadend: bool,
}

impl BasicBlock {
    #[must_use]
    pub const fn new(label: Label) -> Self {
        Self {
            label,
            text: Vec::new(),
            next: Vec::new(),
            disabled: false,
            deadend: false,
        }
    }

    #[must_use]
    pub const fn label(&self) -> &Label {
        &self.label
    }

    /// Records accumulated in source order.
    #[must_use]
    pub fn text(&self) -> &[Record] {
        &self.text
    }

    /// Successor labels in insertion order. Duplicates are allowed.
    #[must_use]
    pub fn next(&self) -> &[Label] {
        &self.next
    }

    /// No further edges are accepted once set.
    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Falling off the end of this block is not a valid completion.
    #[must_use]
    pub const fn is_deadend(&self) -> bool {
        self.deadend
    }

    /// A block with no successors that is not a dead end.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.next.is_empty() && !self.deadend
    }

    pub(crate) fn say(&mut self, record: Record) {
        self.text.push(record);
    }

    /// Stop execution here. The first terminator wins.
    pub(crate) fn end(&mut self, dead: bool) {
        if self.disabled {
            return;
        }
        self.disabled = true;
        self.deadend = dead;
    }

    /// Add an edge; a forced edge disables the block afterwards.
    ///
    /// Returns `false` when the block was already disabled and the edge was
    /// dropped. Callers reject self-edges before getting here.
    pub(crate) fn jump(&mut self, target: Label, force: bool) -> bool {
        debug_assert_ne!(target, self.label, "self-edges are rejected by the builder");
        if self.disabled {
            return false;
        }
        if force {
            self.disabled = true;
        }
        self.next.push(target);
        true
    }

    /// Append `other`'s content and take over its exits.
    pub(crate) fn absorb(&mut self, other: Self) {
        self.text.extend(other.text);
        self.next = other.next;
        self.disabled = other.disabled;
        self.deadend = other.deadend;
    }

    pub(crate) fn rename(&mut self, label: Label) {
        self.label = label;
    }

    /// Replace every edge to `from` with an edge to `to`.
    pub(crate) fn relink(&mut self, from: &Label, to: &Label) {
        for target in &mut self.next {
            if target == from {
                target.clone_from(to);
            }
        }
    }
}

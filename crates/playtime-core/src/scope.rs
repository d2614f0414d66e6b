//! The indentation stack machine behind [`GraphBuilder`](crate::GraphBuilder).
//!
//! Each open `...:` header is a [`Frame`]. Opening a frame wires the
//! fallthrough edge into the new body; closing one synthesizes a merge block
//! and wires the body (or, for menus and if-chains, every collected arm) to
//! it. The frame below the stack is the root, which owns the entry block and
//! is never closed.
//!
//! Body indentation is stored as the absolute prefix (enclosing prefix plus
//! the body's own extra whitespace), so prefixes strictly grow towards the
//! top of the stack.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::block::BasicBlock;
use crate::error::{IndentIssue, PlaytimeError, Result};
use crate::graph::BlockGraph;
use crate::label::{Label, LabelArena, SyntheticKind};
use crate::record::Record;
use crate::syntax::{Header, leading_whitespace};

/// Index into the block arena.
type BlockId = usize;

/// Index into the arm collections.
type ArmsId = usize;

/// How a frame joins its children when it closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Forking {
    None,
    /// `menu:`; every choice is an alternative.
    Regular,
    /// An if/elif/else chain. `direct` is cleared by `else`, after which
    /// there is no implicit path around the arms.
    Parallel { direct: bool },
}

#[derive(Debug)]
struct Frame {
    /// Block receiving this frame's content right now.
    block: BlockId,
    /// Absolute body prefix; `None` until the first body line arrives.
    indent: Option<String>,
    forking: Forking,
    /// For forking frames their own arms; for arm frames the parent's.
    arms: Option<ArmsId>,
    /// Global label name that dotted labels declared below resolve against.
    scope: Option<String>,
}

impl Frame {
    const fn body(block: BlockId, forking: Forking, arms: Option<ArmsId>) -> Self {
        Self {
            block,
            indent: None,
            forking,
            arms,
            scope: None,
        }
    }

    fn indent(&self) -> &str {
        self.indent.as_deref().unwrap_or_default()
    }
}

#[derive(Debug)]
pub(crate) struct ScopeMachine {
    root: Frame,
    stack: Vec<Frame>,
    blocks: Vec<BasicBlock>,
    index: HashMap<Label, BlockId>,
    arms: Vec<Vec<BlockId>>,
    labels: LabelArena,
}

impl ScopeMachine {
    pub(crate) fn new() -> Self {
        let mut index = HashMap::new();
        index.insert(Label::Entry, 0);
        Self {
            root: Frame {
                block: 0,
                indent: Some(String::new()),
                forking: Forking::None,
                arms: None,
                scope: None,
            },
            stack: Vec::new(),
            blocks: vec![BasicBlock::new(Label::Entry)],
            index,
            arms: Vec::new(),
            labels: LabelArena::default(),
        }
    }

    /// Blocks allocated so far, entry included.
    pub(crate) fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Open frames, root excluded.
    pub(crate) fn depth(&self) -> usize {
        self.stack.len()
    }

    fn top(&self) -> &Frame {
        self.stack.last().unwrap_or(&self.root)
    }

    fn top_mut(&mut self) -> &mut Frame {
        match self.stack.last_mut() {
            Some(frame) => frame,
            None => &mut self.root,
        }
    }

    fn current(&mut self) -> &mut BasicBlock {
        let block = self.top().block;
        &mut self.blocks[block]
    }

    // -----------------------------------------------------------------------
    // Indentation
    // -----------------------------------------------------------------------

    /// Match a non-blank line against the open frames, closing the ones it
    /// dedents out of, and return the line without its indentation.
    pub(crate) fn align<'l>(&mut self, line: &'l str, line_number: usize) -> Result<&'l str> {
        let fail = |issue| PlaytimeError::Indentation {
            line: line_number,
            content: line.to_owned(),
            issue,
        };

        if self.top().indent.is_none() {
            let enclosing = self
                .stack
                .iter()
                .rev()
                .nth(1)
                .unwrap_or(&self.root)
                .indent()
                .to_owned();
            let rest = line
                .strip_prefix(enclosing.as_str())
                .ok_or_else(|| fail(IndentIssue::DedentedBody))?;
            let extra = leading_whitespace(rest);
            if extra.is_empty() {
                return Err(fail(IndentIssue::UnindentedBody));
            }
            trace!(line = line_number, depth = self.depth(), "body indentation established");
            self.top_mut().indent = Some(format!("{enclosing}{extra}"));
            return Ok(&rest[extra.len()..]);
        }

        while !self.stack.is_empty() && !line.starts_with(self.top().indent()) {
            self.close(line_number)?;
        }
        let rest = line.strip_prefix(self.top().indent()).unwrap_or(line);
        if leading_whitespace(rest).is_empty() {
            Ok(rest)
        } else if self.stack.is_empty() {
            Err(fail(IndentIssue::IndentedTopLevel))
        } else {
            Err(fail(IndentIssue::UnmatchedDedent))
        }
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Push a frame for a `...:` header.
    pub(crate) fn open(&mut self, header: Header<'_>, line_number: usize) -> Result<()> {
        let (named, forking, arms) = match header {
            Header::Label(name) => {
                self.close_parallel(line_number)?;
                let name = if name.starts_with('.') {
                    format!("{}{name}", self.scope_name(name, line_number)?)
                } else {
                    self.top_mut().scope = Some(name.to_owned());
                    name.to_owned()
                };
                (Some(Label::Named(name)), Forking::None, None)
            }
            Header::Menu => {
                self.close_parallel(line_number)?;
                (None, Forking::Regular, Some(self.new_arms()))
            }
            Header::If => {
                self.close_parallel(line_number)?;
                let arms = self.open_chain(line_number)?;
                (None, Forking::None, Some(arms))
            }
            Header::Elif | Header::Else => {
                let top = self.top_mut();
                let Forking::Parallel { direct } = &mut top.forking else {
                    return Err(PlaytimeError::MisplacedBranch {
                        line: line_number,
                        keyword: header.keyword(),
                    });
                };
                if header == Header::Else {
                    *direct = false;
                }
                (None, Forking::None, top.arms)
            }
            Header::Other => {
                self.close_parallel(line_number)?;
                let top = self.top();
                let arms = match top.forking {
                    Forking::Regular => top.arms,
                    Forking::None | Forking::Parallel { .. } => None,
                };
                (None, Forking::None, arms)
            }
        };

        let label =
            named.unwrap_or_else(|| self.labels.mint(line_number, SyntheticKind::Scope));
        if self.index.contains_key(&label) {
            return Err(PlaytimeError::DuplicateLabel {
                line: line_number,
                label: label.to_string(),
            });
        }
        let from = self.top().block;
        self.edge(from, &label, false, line_number)?;
        let block = self.allocate(label);
        debug!(
            line = line_number,
            header = header.keyword(),
            label = %self.blocks[block].label(),
            depth = self.depth() + 1,
            "push"
        );
        self.stack.push(Frame::body(block, forking, arms));
        Ok(())
    }

    /// Insert the dispatch frame of an if-chain and return its arm collection.
    ///
    /// The frame sits at the enclosing body's indentation so that `elif` and
    /// `else` siblings find it on top once the previous arm has closed.
    fn open_chain(&mut self, line_number: usize) -> Result<ArmsId> {
        let cond = self.labels.mint(line_number, SyntheticKind::Conditional);
        let from = self.top().block;
        self.edge(from, &cond, true, line_number)?;
        let block = self.allocate(cond);
        let arms = self.new_arms();
        let indent = self.top().indent.clone();
        trace!(line = line_number, label = %self.blocks[block].label(), "open if-chain");
        self.stack.push(Frame {
            block,
            indent,
            forking: Forking::Parallel { direct: true },
            arms: Some(arms),
            scope: None,
        });
        Ok(arms)
    }

    /// Pop the top frame and wire its exits.
    pub(crate) fn close(&mut self, line_number: usize) -> Result<()> {
        let Some(frame) = self.stack.pop() else {
            return Ok(());
        };

        match (frame.forking, frame.arms) {
            (Forking::None, Some(arms)) => {
                trace!(line = line_number, label = %self.blocks[frame.block].label(), "pop arm");
                if let Some(collected) = self.arms.get_mut(arms) {
                    collected.push(frame.block);
                }
            }
            (Forking::None, None) => {
                let merge = self.labels.mint(line_number, SyntheticKind::Merge);
                self.edge(frame.block, &merge, false, line_number)?;
                let merge = self.allocate(merge);
                self.top_mut().block = merge;
                trace!(line = line_number, "pop block");
            }
            (forking, arms) => {
                let merge = self.labels.mint(line_number, SyntheticKind::Merge);
                let collected = arms
                    .and_then(|id| self.arms.get_mut(id))
                    .map(std::mem::take)
                    .unwrap_or_default();
                for arm in &collected {
                    self.edge(*arm, &merge, false, line_number)?;
                }
                if forking == (Forking::Parallel { direct: true }) {
                    self.edge(frame.block, &merge, false, line_number)?;
                }
                let merge = self.allocate(merge);
                self.top_mut().block = merge;
                debug!(line = line_number, arms = collected.len(), ?forking, "pop branch");
            }
        }
        Ok(())
    }

    /// Close a pending if-chain; anything but `elif`/`else` ends it.
    pub(crate) fn close_parallel(&mut self, line_number: usize) -> Result<()> {
        if matches!(self.top().forking, Forking::Parallel { .. }) {
            self.close(line_number)?;
        }
        Ok(())
    }

    /// `jump TARGET`: a forced edge out of the current block.
    pub(crate) fn jump(&mut self, target: &str, line_number: usize) -> Result<()> {
        let target = if target.starts_with('.') {
            format!("{}{target}", self.scope_name(target, line_number)?)
        } else {
            target.to_owned()
        };
        let from = self.top().block;
        debug!(line = line_number, from = %self.blocks[from].label(), to = %target, "jump");
        self.edge(from, &Label::Named(target), true, line_number)
    }

    /// `return`: execution stops in the current block.
    pub(crate) fn terminate(&mut self, dead: bool) {
        let block = self.current();
        trace!(label = %block.label(), dead, "terminate");
        block.end(dead);
    }

    pub(crate) fn say(&mut self, record: Record) {
        self.current().say(record);
    }

    /// Close every open frame, as a dedent to column zero would.
    pub(crate) fn finish(mut self, line_number: usize) -> Result<BlockGraph> {
        while !self.stack.is_empty() {
            self.close(line_number)?;
        }
        Ok(BlockGraph::from_blocks(self.blocks))
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Global label that a dotted `name` at this point resolves against.
    fn scope_name(&self, name: &str, line_number: usize) -> Result<&str> {
        self.stack
            .iter()
            .rev()
            .chain(std::iter::once(&self.root))
            .find_map(|frame| frame.scope.as_deref())
            .ok_or_else(|| PlaytimeError::NoLabelScope {
                line: line_number,
                label: name.to_owned(),
            })
    }

    fn edge(&mut self, from: BlockId, to: &Label, force: bool, line_number: usize) -> Result<()> {
        let block = &mut self.blocks[from];
        if block.label() == to {
            return Err(PlaytimeError::SelfJump {
                line: line_number,
                label: to.to_string(),
            });
        }
        if block.jump(to.clone(), force) {
            trace!(from = %block.label(), to = %to, force, "edge");
        } else {
            trace!(from = %block.label(), to = %to, "edge dropped, block already ended");
        }
        Ok(())
    }

    /// Register a fresh block. Callers check for duplicates first.
    fn allocate(&mut self, label: Label) -> BlockId {
        let id = self.blocks.len();
        self.index.insert(label.clone(), id);
        self.blocks.push(BasicBlock::new(label));
        id
    }

    fn new_arms(&mut self) -> ArmsId {
        self.arms.push(Vec::new());
        self.arms.len() - 1
    }
}

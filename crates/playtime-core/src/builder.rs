//! Line-by-line control-flow graph construction.

use tracing::{debug, instrument};

use crate::error::Result;
use crate::graph::BlockGraph;
use crate::optimize::{OptimizedGraph, optimize};
use crate::record::{CostAggregator, LineClassifier};
use crate::scope::ScopeMachine;
use crate::syntax::{self, Statement};

/// Incremental graph builder.
///
/// Feed lines in source order with [`parse_line`](Self::parse_line), then
/// call [`optimize`](Self::optimize) (or [`finish`](Self::finish) for the
/// raw graph). After any error the builder must be discarded.
///
/// ```
/// use playtime_core::{BlockCost, GraphBuilder, Record};
///
/// let classify = |line: &str| line.starts_with("scene").then_some(Record::Scene);
/// let aggregate = |records: &[Record]| BlockCost::new(records.len() as f64);
///
/// let mut builder = GraphBuilder::new(classify, aggregate);
/// for (n, line) in ["scene a", "menu:", "    \"x\":", "        scene b"].iter().enumerate() {
///     builder.parse_line(line, n + 1)?;
/// }
/// let graph = builder.optimize()?;
/// assert_eq!(graph.minimum().map(|p| p.total), Some(2.0));
/// # Ok::<(), playtime_core::PlaytimeError>(())
/// ```
pub struct GraphBuilder<C, A> {
    classifier: C,
    aggregator: A,
    machine: ScopeMachine,
    last_line: usize,
}

impl<C, A> GraphBuilder<C, A>
where
    C: LineClassifier,
    A: CostAggregator,
{
    pub fn new(classifier: C, aggregator: A) -> Self {
        Self {
            classifier,
            aggregator,
            machine: ScopeMachine::new(),
            last_line: 0,
        }
    }

    /// Feed one source line. `line_number` is 1-based and only used for
    /// error reporting and synthetic label names.
    ///
    /// # Errors
    ///
    /// Indentation errors, duplicate labels, self-jumps, dotted labels with
    /// no enclosing global label, and `elif`/`else` outside an if-chain.
    pub fn parse_line(&mut self, line: &str, line_number: usize) -> Result<()> {
        self.last_line = line_number;
        if syntax::split_comment(line).0.trim().is_empty() {
            return Ok(());
        }

        let rest = self.machine.align(line, line_number)?;
        match syntax::statement(rest) {
            Statement::Header(header) => self.machine.open(header, line_number),
            Statement::Jump(target) => {
                self.machine.close_parallel(line_number)?;
                self.machine.jump(target, line_number)
            }
            Statement::Terminate { dead } => {
                self.machine.close_parallel(line_number)?;
                self.machine.terminate(dead);
                Ok(())
            }
            Statement::Content(content) => {
                self.machine.close_parallel(line_number)?;
                if let Some(record) = self.classifier.classify(content) {
                    self.machine.say(record);
                }
                Ok(())
            }
        }
    }

    /// Blocks allocated so far, before any merging.
    pub fn block_count(&self) -> usize {
        self.machine.block_count()
    }

    /// Close every open block and return the raw graph.
    ///
    /// # Errors
    ///
    /// Only if closing a block fails, which well-formed input never does.
    pub fn finish(self) -> Result<BlockGraph> {
        self.machine.finish(self.last_line)
    }

    /// Close every open block, merge chains and cost every block.
    ///
    /// # Errors
    ///
    /// [`DanglingEdge`](crate::PlaytimeError::DanglingEdge) for a jump to a
    /// label that was never declared, and
    /// [`NonFiniteCost`](crate::PlaytimeError::NonFiniteCost) when the
    /// aggregator misbehaves.
    #[instrument(skip_all, fields(lines = self.last_line))]
    pub fn optimize(self) -> Result<OptimizedGraph> {
        let Self {
            aggregator,
            machine,
            last_line,
            ..
        } = self;
        let graph = machine.finish(last_line)?;
        debug!(blocks = graph.len(), "graph built");
        optimize(graph, &aggregator)
    }
}

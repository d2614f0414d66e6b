use std::fmt;

/// Convenience alias used throughout the core.
pub type Result<T> = std::result::Result<T, PlaytimeError>;

/// The three failure families a document can hit.
///
/// Every family is fatal for the document being processed; there is no
/// recovery inside the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed indentation.
    Structure,
    /// A label, jump or branch keyword that does not resolve.
    Reference,
    /// The injected aggregator returned an unusable cost.
    Aggregation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Structure => "structure",
            Self::Reference => "reference",
            Self::Aggregation => "aggregation",
        })
    }
}

/// What exactly is wrong with a line's leading whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndentIssue {
    /// A line outside every block starts with whitespace.
    IndentedTopLevel,
    /// The first line after a `:` header is not indented past the header.
    UnindentedBody,
    /// The first line after a `:` header is dedented below the header.
    DedentedBody,
    /// The indentation matches no open block.
    UnmatchedDedent,
}

impl fmt::Display for IndentIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::IndentedTopLevel => "top-level statement is indented",
            Self::UnindentedBody => "block body is not indented past its header",
            Self::DedentedBody => "block body is dedented below its header",
            Self::UnmatchedDedent => "indentation matches no open block",
        })
    }
}

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Indentation,
    DuplicateLabel,
    SelfJump,
    NoLabelScope,
    MisplacedBranch,
    DanglingEdge,
    NonFiniteCost,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Indentation => "E1001",
            Self::DuplicateLabel => "E2001",
            Self::SelfJump => "E2002",
            Self::NoLabelScope => "E2003",
            Self::MisplacedBranch => "E2004",
            Self::DanglingEdge => "E2005",
            Self::NonFiniteCost => "E3001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Indentation => "Inconsistent indentation",
            Self::DuplicateLabel => "Label declared twice",
            Self::SelfJump => "Block jumps to itself",
            Self::NoLabelScope => "Relative label outside any named label",
            Self::MisplacedBranch => "elif/else without an open if",
            Self::DanglingEdge => "Jump target does not exist",
            Self::NonFiniteCost => "Aggregator returned a non-finite cost",
        }
    }

    /// Optional remediation hint.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::Indentation => Some("Indent every block body consistently past its `:` header."),
            Self::DuplicateLabel => Some("Rename one of the labels."),
            Self::SelfJump => None,
            Self::NoLabelScope => {
                Some("Declare a global label before using `.local` labels or jumps.")
            }
            Self::MisplacedBranch => Some("Place elif/else directly after an if block."),
            Self::DanglingEdge => {
                Some("Pass every file that declares the jumped-to label, or fix the label name.")
            }
            Self::NonFiniteCost => Some("Check reading speeds: they must be positive."),
        }
    }

    /// The failure family this code belongs to.
    #[must_use]
    pub const fn kind(self) -> ErrorKind {
        match self {
            Self::Indentation => ErrorKind::Structure,
            Self::DuplicateLabel
            | Self::SelfJump
            | Self::NoLabelScope
            | Self::MisplacedBranch
            | Self::DanglingEdge => ErrorKind::Reference,
            Self::NonFiniteCost => ErrorKind::Aggregation,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Every way building, optimizing or solving a script can fail.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlaytimeError {
    #[error("line {line}: {issue}: {content:?}")]
    Indentation {
        line: usize,
        content: String,
        issue: IndentIssue,
    },

    #[error("line {line}: label `{label}` is already declared")]
    DuplicateLabel { line: usize, label: String },

    #[error("line {line}: block `{label}` jumps to itself")]
    SelfJump { line: usize, label: String },

    #[error("line {line}: relative label `{label}` has no enclosing global label")]
    NoLabelScope { line: usize, label: String },

    #[error("line {line}: `{keyword}` is not preceded by an if block")]
    MisplacedBranch { line: usize, keyword: &'static str },

    #[error("block `{from}` jumps to unknown label `{to}`")]
    DanglingEdge { from: String, to: String },

    #[error("block `{label}` has non-finite cost {cost}")]
    NonFiniteCost { label: String, cost: f64 },
}

impl PlaytimeError {
    /// Stable machine code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Indentation { .. } => ErrorCode::Indentation,
            Self::DuplicateLabel { .. } => ErrorCode::DuplicateLabel,
            Self::SelfJump { .. } => ErrorCode::SelfJump,
            Self::NoLabelScope { .. } => ErrorCode::NoLabelScope,
            Self::MisplacedBranch { .. } => ErrorCode::MisplacedBranch,
            Self::DanglingEdge { .. } => ErrorCode::DanglingEdge,
            Self::NonFiniteCost { .. } => ErrorCode::NonFiniteCost,
        }
    }

    /// The failure family of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.code().kind()
    }

    /// Source line the error points at, when there is one.
    #[must_use]
    pub const fn line(&self) -> Option<usize> {
        match self {
            Self::Indentation { line, .. }
            | Self::DuplicateLabel { line, .. }
            | Self::SelfJump { line, .. }
            | Self::NoLabelScope { line, .. }
            | Self::MisplacedBranch { line, .. } => Some(*line),
            Self::DanglingEdge { .. } | Self::NonFiniteCost { .. } => None,
        }
    }
}

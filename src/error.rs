//! Error types shared by the engine cache, the transform provider and the
//! analytic-signal routines.

use core::fmt;

use crate::layout::BufferLayout;

/// Errors that can occur while planning or computing an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HilbertError {
    /// The input slice was empty.
    EmptyInput,
    /// Input and output slices differ in length.
    MismatchedLengths,
    /// A buffer of `elements` values could not be allocated.
    Allocation { elements: usize },
    /// The transform provider cannot build a plan for this size and layout.
    Unplannable { len: usize, layout: BufferLayout },
    /// A plan was requested before [`crate::lifecycle::initialize`] ran.
    ProviderUninitialized,
    /// A plan was executed against buffers of a different layout or size.
    LayoutMismatch,
    /// The transform provider rejected the buffers handed to a plan.
    Execution,
    /// Persisted tuning data could not be read or written.
    Wisdom(WisdomError),
}

impl fmt::Display for HilbertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HilbertError::EmptyInput => write!(f, "input slice is empty"),
            HilbertError::MismatchedLengths => {
                write!(f, "input and output must have the same length")
            }
            HilbertError::Allocation { elements } => {
                write!(f, "failed to allocate a buffer of {} elements", elements)
            }
            HilbertError::Unplannable { len, layout } => {
                write!(f, "cannot plan a {:?} transform of length {}", layout, len)
            }
            HilbertError::ProviderUninitialized => {
                write!(f, "transform provider used before initialization")
            }
            HilbertError::LayoutMismatch => {
                write!(f, "plan executed against buffers of another layout or size")
            }
            HilbertError::Execution => write!(f, "transform execution failed"),
            HilbertError::Wisdom(err) => write!(f, "wisdom: {}", err),
        }
    }
}

impl std::error::Error for HilbertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HilbertError::Wisdom(err) => Some(err),
            _ => None,
        }
    }
}

impl From<WisdomError> for HilbertError {
    fn from(err: WisdomError) -> Self {
        HilbertError::Wisdom(err)
    }
}

/// Errors raised while importing or exporting tuning data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WisdomError {
    /// The file could not be read or written.
    Io(std::io::ErrorKind),
    /// The first line is not a recognised wisdom header.
    Header,
    /// The stored digest does not match the body.
    Checksum,
    /// An entry line could not be parsed (1-based line number).
    Entry { line: usize },
}

impl fmt::Display for WisdomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WisdomError::Io(kind) => write!(f, "i/o error: {}", kind),
            WisdomError::Header => write!(f, "missing or unsupported header"),
            WisdomError::Checksum => write!(f, "checksum mismatch"),
            WisdomError::Entry { line } => write!(f, "malformed entry on line {}", line),
        }
    }
}

impl std::error::Error for WisdomError {}

impl From<std::io::Error> for WisdomError {
    fn from(err: std::io::Error) -> Self {
        WisdomError::Io(err.kind())
    }
}

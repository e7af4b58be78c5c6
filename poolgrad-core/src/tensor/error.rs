use crate::shapes::Shape3;

/// Represents the different errors that can occur from creating tensors,
/// running pooling ops, or decoding persisted layers.
#[non_exhaustive]
#[derive(Debug)]
pub enum Error {
    /// Allocation could not be reserved
    OutOfMemory,
    /// Not enough elements were provided when creating a tensor
    WrongNumElements,
    /// A tensor dimension, window span, or layer field was zero
    ZeroDim,
    /// A batch of zero samples was requested
    EmptyBatch,
    /// A tensor or flat buffer disagrees with the shape an op expects.
    /// For flat buffers the shapes are single element lengths.
    ShapeMismatch {
        expected: std::vec::Vec<usize>,
        found: std::vec::Vec<usize>,
    },
    /// A coordinate was outside of a tensor
    IndexOutOfBounds { index: [usize; 3], shape: Shape3 },
    /// Persisted bytes could not be decoded
    Deserialize(std::string::String),
    /// No deserializer is registered for this type tag
    UnknownType(std::string::String),
    /// An R-gradient was requested from an artifact made without R-operator inputs
    MissingROutput,
}

impl Error {
    pub(crate) fn shape_mismatch(expected: Shape3, found: Shape3) -> Self {
        Error::ShapeMismatch {
            expected: expected.concrete().into(),
            found: found.concrete().into(),
        }
    }

    pub(crate) fn len_mismatch(expected: usize, found: usize) -> Self {
        Error::ShapeMismatch {
            expected: std::vec![expected],
            found: std::vec![found],
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::error::Error for Error {}

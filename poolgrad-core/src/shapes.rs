//! The shape of a [crate::tensor::Tensor3] and its linear index convention.

use crate::tensor::Error;

/// Dimensions of a channels-last 3d tensor.
///
/// Data is laid out with depth varying fastest, then x, then y:
/// `(x, y, z)` lives at `z + x * depth + y * depth * width`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape3 {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
}

impl Shape3 {
    pub const fn new(width: usize, height: usize, depth: usize) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// The total number of elements a tensor of this shape holds.
    pub const fn num_elements(&self) -> usize {
        self.width * self.height * self.depth
    }

    /// [Shape3::num_elements], or `None` if the count does not fit in `usize`.
    pub const fn checked_num_elements(&self) -> Option<usize> {
        match self.width.checked_mul(self.height) {
            Some(wh) => wh.checked_mul(self.depth),
            None => None,
        }
    }

    pub const fn concrete(&self) -> [usize; 3] {
        [self.width, self.height, self.depth]
    }

    /// Whether every dimension is non-zero.
    pub const fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && self.depth > 0
    }

    /// Linear offset of `(x, y, z)` without a bounds check.
    #[inline(always)]
    pub(crate) const fn offset(&self, x: usize, y: usize, z: usize) -> usize {
        z + x * self.depth + y * self.depth * self.width
    }

    /// Linear offset of `(x, y, z)`, or [Error::IndexOutOfBounds] when any
    /// coordinate falls outside the shape.
    pub fn try_index(&self, x: usize, y: usize, z: usize) -> Result<usize, Error> {
        if x < self.width && y < self.height && z < self.depth {
            Ok(self.offset(x, y, z))
        } else {
            Err(Error::IndexOutOfBounds {
                index: [x, y, z],
                shape: *self,
            })
        }
    }
}

impl std::fmt::Display for Shape3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.width, self.height, self.depth)
    }
}

//! # poolgrad-core
//!
//! The storage and kernel layer underneath `poolgrad`. Everything here is a
//! plain function of its inputs: there are no devices, tapes, or global state.
//!
//! # Tensors
//!
//! *See [tensor] and [shapes] for more information.*
//!
//! A [`tensor::Tensor3`] is a dense, channels-last 3d array with shape
//! `(width, height, depth)`. The element at `(x, y, z)` lives at linear offset
//! `z + x * depth + y * depth * width`, so depth varies fastest.
//!
//! ```rust
//! # use poolgrad_core::prelude::*;
//! let mut t: Tensor3<f32> = Tensor3::zeros(4, 3, 2);
//! t.set(1, 2, 1, 0.5);
//! assert_eq!(t.get(1, 2, 1), 0.5);
//! assert_eq!(t.as_slice()[1 + 2 + 2 * 2 * 4], 0.5);
//! ```
//!
//! # Max pooling
//!
//! *See [tensor_ops] for more information.*
//!
//! [`tensor_ops::MaxPool2DOp`] describes non-overlapping pooling windows over
//! the width and height of a tensor. Calling it produces an artifact that
//! remembers which input cell won each window, so that reverse-mode gradients
//! and forward-mode (R-operator) directional derivatives are routed through the
//! exact same cells:
//!
//! ```rust
//! # use poolgrad_core::prelude::*;
//! let op = MaxPool2DOp::new(2, 2, 3, 3, 1);
//! let x = Tensor3::from_vec(3, 3, 1, vec![1.0f32, 5.0, 2.0, 0.0, 3.0, 9.0, 4.0, 8.0, 7.0]);
//! let pooled = x.max_pool2d(&op);
//! assert_eq!(pooled.output(), &[5.0, 9.0, 8.0, 7.0]);
//! let grad = pooled.backward(&Tensor3::from_vec(2, 2, 1, vec![1.0, 2.0, 3.0, 4.0]));
//! assert_eq!(grad.as_slice(), &[0.0, 1.0, 0.0, 0.0, 0.0, 2.0, 0.0, 3.0, 4.0]);
//! ```
//!
//! # Feature flags
//!
//! - `fast-alloc` (default): allocate buffers with `vec![0; n]`. Without it,
//!   allocation goes through `try_reserve` and reports [`tensor::Error::OutOfMemory`].
//! - `parallel` (default): process batch samples concurrently with rayon.
//! - `test-f64`: run the unit tests with `f64` instead of `f32`.

pub mod dtypes;
pub mod shapes;
pub mod tensor;
pub mod tensor_ops;

/// Contains subset of all public exports.
pub mod prelude {
    pub use crate::dtypes::*;
    pub use crate::shapes::*;
    pub use crate::tensor::*;
    pub use crate::tensor_ops::*;
}

//! # poolgrad
//!
//! A differentiable max pooling layer meant to sit inside an automatic
//! differentiation graph. It supports:
//!
//! 1. Forward pooling of channels-last [`Tensor3`](prelude::Tensor3)s
//!    with non-overlapping, edge-clipped windows.
//! 2. Reverse-mode gradient routing to the arg-max of every window.
//! 3. Forward-mode (R-operator) propagation of a directional derivative
//!    through the same arg-max cells.
//! 4. Batches of samples packed sample-major in one flat buffer.
//!
//! ```rust
//! # use poolgrad::prelude::*;
//! let layer = MaxPool2D::new(3, 3, 10, 11, 2);
//! assert_eq!((layer.output_width(), layer.output_height()), (4, 4));
//!
//! let x: Tensor3<f32> = Tensor3::zeros(10, 11, 2);
//! let pooled = layer.forward(&x);
//! let grad = pooled.backward(&Tensor3::zeros(4, 4, 2));
//! assert_eq!(grad.shape(), x.shape());
//! ```
//!
//! Layers persist as a type tag plus a fixed byte encoding, see [nn::serialize].
//! With the `safetensors` feature they can also be written to `.safetensors`
//! files.

pub mod nn;

pub use poolgrad_core::{dtypes, shapes, tensor, tensor_ops};

/// Contains subset of all public exports.
pub mod prelude {
    pub use crate::nn::*;
    pub use poolgrad_core::prelude::*;
}

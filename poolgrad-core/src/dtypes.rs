//! Element types that tensors and pooling kernels operate on.

/// Floating point element of a [crate::tensor::Tensor3].
///
/// Implemented for [f32] and [f64].
pub trait Dtype:
    'static
    + Copy
    + Clone
    + Default
    + std::fmt::Debug
    + std::fmt::Display
    + PartialOrd
    + Send
    + Sync
    + num_traits::Float
    + num_traits::NumAssignOps
{
}

impl Dtype for f32 {}
impl Dtype for f64 {}

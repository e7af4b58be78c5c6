//! Operations on [crate::tensor::Tensor3]s.
//!
//! The only op is non-overlapping 2d max pooling, [MaxPool2DOp]. It has three
//! passes that must agree on which input cell wins each window:
//!
//! | Pass | Entry point | Artifact method |
//! | --- | --- | --- |
//! | forward | [TryMaxPool2D::try_max_pool2d], [MaxPool2DOp::try_forward_batch] | - |
//! | reverse mode | - | [Pooled::try_backward], [Pooled::try_accumulate_grad] |
//! | R-operator | [TryMaxPool2D::try_max_pool2d_r], [MaxPool2DOp::try_forward_batch_r] | [RPooled::try_backward_r] |

mod max_pool2d;

pub use max_pool2d::{MaxPool2DOp, Pooled, RPooled, Selection, TryMaxPool2D, Window};

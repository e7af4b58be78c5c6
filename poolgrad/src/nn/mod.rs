//! High level neural network building blocks.
//!
//! - [MaxPool2D]: the max pooling layer and its configuration descriptor.
//! - [Module]: forward entry points shared by layers.
//! - [Differentiable], [RDifferentiable], [Applied]: what the surrounding
//!   graph engine calls to push gradients back through an applied layer.
//! - [serialize]: type-tagged byte encoding and the [Registry] of layer kinds.

mod graph;
mod layers;
mod module;
pub mod serialize;

#[cfg(feature = "safetensors")]
pub mod safetensors;

pub use graph::{Applied, Differentiable, RDifferentiable};
pub use layers::*;
pub use module::Module;
pub use serialize::{Layer, Registry, Serializer};

#[cfg(feature = "safetensors")]
pub use self::safetensors::{LoadFromSafetensors, SaveToSafetensors};

//! Contracts between an applied layer and the differentiation graph around it.
//!
//! The graph engine owns the gradient (and R-gradient) accumulators of every
//! variable. After a layer has been applied, the engine hands the artifact the
//! upstream gradient of its output plus a mutable view of the input's
//! accumulator, and the artifact adds its contribution.

use poolgrad_core::{
    dtypes::Dtype,
    tensor::Error,
    tensor_ops::{Pooled, RPooled},
};

/// An applied layer that can send gradients back to its input.
pub trait Differentiable<E> {
    /// Output of every sample, sample-major.
    fn output(&self) -> &[E];

    fn batch_size(&self) -> usize;

    /// Adds the input gradient implied by `upstream` (the gradient of
    /// [Differentiable::output]) onto `grad`.
    fn propagate_gradient(&self, upstream: &[E], grad: &mut [E]) -> Result<(), Error>;
}

/// An applied layer that was also given a directional derivative of its input.
pub trait RDifferentiable<E>: Differentiable<E> {
    /// Directional derivative of [Differentiable::output].
    fn r_output(&self) -> &[E];

    /// Adds the input gradient of `upstream` onto `grad`, and the input
    /// R-gradient of `upstream_r` onto `r_grad`.
    fn propagate_r_gradient(
        &self,
        upstream: &[E],
        upstream_r: &[E],
        grad: &mut [E],
        r_grad: &mut [E],
    ) -> Result<(), Error>;
}

impl<E: Dtype> Differentiable<E> for Pooled<E> {
    fn output(&self) -> &[E] {
        Pooled::output(self)
    }

    fn batch_size(&self) -> usize {
        Pooled::batch_size(self)
    }

    fn propagate_gradient(&self, upstream: &[E], grad: &mut [E]) -> Result<(), Error> {
        self.try_accumulate_grad(upstream, grad)
    }
}

impl<E: Dtype> Differentiable<E> for RPooled<E> {
    fn output(&self) -> &[E] {
        RPooled::output(self)
    }

    fn batch_size(&self) -> usize {
        RPooled::batch_size(self)
    }

    fn propagate_gradient(&self, upstream: &[E], grad: &mut [E]) -> Result<(), Error> {
        self.pooled().try_accumulate_grad(upstream, grad)
    }
}

impl<E: Dtype> RDifferentiable<E> for RPooled<E> {
    fn r_output(&self) -> &[E] {
        RPooled::r_output(self)
    }

    fn propagate_r_gradient(
        &self,
        upstream: &[E],
        upstream_r: &[E],
        grad: &mut [E],
        r_grad: &mut [E],
    ) -> Result<(), Error> {
        self.try_accumulate_r_grad(upstream, upstream_r, grad, r_grad)
    }
}

/// What applying a layer produced, depending on whether a directional
/// derivative came along with the input.
#[derive(Debug, Clone)]
pub enum Applied<E> {
    Plain(Pooled<E>),
    ROp(RPooled<E>),
}

impl<E: Dtype> Applied<E> {
    /// The directional derivative of the output, if this came from an
    /// R-operator call.
    pub fn r_output(&self) -> Option<&[E]> {
        match self {
            Applied::Plain(_) => None,
            Applied::ROp(r) => Some(r.r_output()),
        }
    }

    pub fn pooled(&self) -> &Pooled<E> {
        match self {
            Applied::Plain(p) => p,
            Applied::ROp(r) => r.pooled(),
        }
    }

    /// [RDifferentiable::propagate_r_gradient], or [Error::MissingROutput]
    /// for a plain application.
    pub fn try_propagate_r_gradient(
        &self,
        upstream: &[E],
        upstream_r: &[E],
        grad: &mut [E],
        r_grad: &mut [E],
    ) -> Result<(), Error> {
        match self {
            Applied::Plain(_) => Err(Error::MissingROutput),
            Applied::ROp(r) => r.propagate_r_gradient(upstream, upstream_r, grad, r_grad),
        }
    }
}

impl<E: Dtype> From<Pooled<E>> for Applied<E> {
    fn from(p: Pooled<E>) -> Self {
        Applied::Plain(p)
    }
}

impl<E: Dtype> From<RPooled<E>> for Applied<E> {
    fn from(r: RPooled<E>) -> Self {
        Applied::ROp(r)
    }
}

impl<E: Dtype> Differentiable<E> for Applied<E> {
    fn output(&self) -> &[E] {
        self.pooled().output()
    }

    fn batch_size(&self) -> usize {
        self.pooled().batch_size()
    }

    fn propagate_gradient(&self, upstream: &[E], grad: &mut [E]) -> Result<(), Error> {
        self.pooled().try_accumulate_grad(upstream, grad)
    }
}

use crate::nn::{Applied, Module};
use poolgrad_core::{
    dtypes::Dtype,
    shapes::Shape3,
    tensor::{Error, Tensor3},
    tensor_ops::{MaxPool2DOp, Pooled, RPooled, TryMaxPool2D},
};

/// Max pool over the width and height of channels-last 3d tensors, with
/// non-overlapping `x_span` by `y_span` windows. Each window reduces to its
/// maximum value, independently per channel.
///
/// The output is `ceil(input_width / x_span)` by `ceil(input_height / y_span)`
/// by `input_depth`. The last window along an axis is clipped when the input
/// is not a multiple of the span.
///
/// The configuration is immutable. Each forward call returns its own artifact
/// ([Pooled], [RPooled], or [Applied]) remembering which cell won every
/// window, so one layer can serve concurrent calls.
///
/// ```rust
/// # use poolgrad::prelude::*;
/// let layer = MaxPool2D::new(2, 2, 9, 9, 7);
/// assert_eq!(layer.output_shape(), Shape3::new(5, 5, 7));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaxPool2D {
    op: MaxPool2DOp,
}

impl MaxPool2D {
    pub fn new(
        x_span: usize,
        y_span: usize,
        input_width: usize,
        input_height: usize,
        input_depth: usize,
    ) -> Self {
        Self::try_new(x_span, y_span, input_width, input_height, input_depth).unwrap()
    }

    /// Returns [Error::ZeroDim] if any field is zero.
    pub fn try_new(
        x_span: usize,
        y_span: usize,
        input_width: usize,
        input_height: usize,
        input_depth: usize,
    ) -> Result<Self, Error> {
        let op = MaxPool2DOp::try_new(x_span, y_span, input_width, input_height, input_depth)
            .map_err(|e| {
                log::debug!(
                    "rejected max pool config spans={x_span}x{y_span} input={input_width}x{input_height}x{input_depth}: {e}"
                );
                e
            })?;
        Ok(Self { op })
    }

    pub fn x_span(&self) -> usize {
        self.op.x_span()
    }

    pub fn y_span(&self) -> usize {
        self.op.y_span()
    }

    pub fn input_width(&self) -> usize {
        self.op.inp_shape().width
    }

    pub fn input_height(&self) -> usize {
        self.op.inp_shape().height
    }

    pub fn input_depth(&self) -> usize {
        self.op.inp_shape().depth
    }

    pub fn output_width(&self) -> usize {
        self.op.out_shape().width
    }

    pub fn output_height(&self) -> usize {
        self.op.out_shape().height
    }

    /// Always [MaxPool2D::input_depth].
    pub fn output_depth(&self) -> usize {
        self.op.out_shape().depth
    }

    pub fn input_shape(&self) -> Shape3 {
        self.op.inp_shape()
    }

    pub fn output_shape(&self) -> Shape3 {
        self.op.out_shape()
    }

    pub fn op(&self) -> &MaxPool2DOp {
        &self.op
    }

    /// Pools `batch` samples packed sample-major in `x`.
    pub fn try_forward_batch<E: Dtype>(&self, x: &[E], batch: usize) -> Result<Pooled<E>, Error> {
        log::trace!("max pool forward {} batch={batch}", self.input_shape());
        self.op.try_forward_batch(x, batch)
    }

    pub fn forward_batch<E: Dtype>(&self, x: &[E], batch: usize) -> Pooled<E> {
        self.try_forward_batch(x, batch).unwrap()
    }

    /// Pools `batch` samples and carries their directional derivative `dir`
    /// through the selected cells.
    pub fn try_forward_batch_r<E: Dtype>(
        &self,
        x: &[E],
        dir: &[E],
        batch: usize,
    ) -> Result<RPooled<E>, Error> {
        log::trace!("max pool R-forward {} batch={batch}", self.input_shape());
        self.op.try_forward_batch_r(x, dir, batch)
    }

    pub fn forward_batch_r<E: Dtype>(&self, x: &[E], dir: &[E], batch: usize) -> RPooled<E> {
        self.try_forward_batch_r(x, dir, batch).unwrap()
    }

    /// Graph engine entry point: pools `batch` samples, with a directional
    /// derivative when `dir` is given.
    pub fn apply<E: Dtype>(
        &self,
        x: &[E],
        dir: Option<&[E]>,
        batch: usize,
    ) -> Result<Applied<E>, Error> {
        Ok(match dir {
            Some(dir) => self.try_forward_batch_r(x, dir, batch)?.into(),
            None => self.try_forward_batch(x, batch)?.into(),
        })
    }
}

impl<E: Dtype> Module<&Tensor3<E>> for MaxPool2D {
    type Output = Pooled<E>;
    fn try_forward(&self, x: &Tensor3<E>) -> Result<Self::Output, Error> {
        log::trace!("max pool forward {}", x.shape());
        x.try_max_pool2d(&self.op)
    }
}

/// `(input, direction)`: the R-operator forward pass.
impl<E: Dtype> Module<(&Tensor3<E>, &Tensor3<E>)> for MaxPool2D {
    type Output = RPooled<E>;
    fn try_forward(&self, (x, dir): (&Tensor3<E>, &Tensor3<E>)) -> Result<Self::Output, Error> {
        log::trace!("max pool R-forward {}", x.shape());
        x.try_max_pool2d_r(&self.op, dir)
    }
}

mod cpu_kernel;

use crate::{
    dtypes::Dtype,
    shapes::Shape3,
    tensor::{try_alloc_zeros, Error, Tensor3},
};
use std::{ops::Range, vec::Vec};

/// Non-overlapping max pooling over the width and height of a
/// `(w_in, h_in, chan)` tensor. Channels are pooled independently.
///
/// The output is `(ceil(w_in / x_span), ceil(h_in / y_span), chan)`. When the
/// input is not a multiple of the span, the last window along that axis is
/// clipped to what remains.
///
/// The op is plain configuration. Everything a forward call learns about its
/// input lives in the returned [Pooled] / [RPooled].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct MaxPool2DOp {
    pub(super) x_span: usize,
    pub(super) y_span: usize,
    pub(super) w_in: usize,
    pub(super) h_in: usize,
    pub(super) chan: usize,
    pub(super) w_out: usize,
    pub(super) h_out: usize,
}

/// The input cells covered by one output cell, for every channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub x: Range<usize>,
    pub y: Range<usize>,
}

impl MaxPool2DOp {
    pub fn new(x_span: usize, y_span: usize, w_in: usize, h_in: usize, chan: usize) -> Self {
        Self::try_new(x_span, y_span, w_in, h_in, chan).unwrap()
    }

    /// Returns [Error::ZeroDim] if any argument is zero, and
    /// [Error::OutOfMemory] if the input element count does not fit in `usize`.
    pub fn try_new(
        x_span: usize,
        y_span: usize,
        w_in: usize,
        h_in: usize,
        chan: usize,
    ) -> Result<Self, Error> {
        if x_span == 0 || y_span == 0 || w_in == 0 || h_in == 0 || chan == 0 {
            return Err(Error::ZeroDim);
        }
        if Shape3::new(w_in, h_in, chan).checked_num_elements().is_none() {
            return Err(Error::OutOfMemory);
        }
        Ok(Self {
            x_span,
            y_span,
            w_in,
            h_in,
            chan,
            w_out: w_in.div_ceil(x_span),
            h_out: h_in.div_ceil(y_span),
        })
    }

    pub fn x_span(&self) -> usize {
        self.x_span
    }

    pub fn y_span(&self) -> usize {
        self.y_span
    }

    pub fn inp_shape(&self) -> Shape3 {
        Shape3::new(self.w_in, self.h_in, self.chan)
    }

    /// Pooling never mixes channels, so depth is carried through.
    pub fn out_shape(&self) -> Shape3 {
        Shape3::new(self.w_out, self.h_out, self.chan)
    }

    pub fn inp_numel(&self) -> usize {
        self.inp_shape().num_elements()
    }

    pub fn out_numel(&self) -> usize {
        self.out_shape().num_elements()
    }

    /// The window feeding output column `ox` and row `oy`.
    ///
    /// **Panics** if `(ox, oy)` is outside the output.
    pub fn window(&self, ox: usize, oy: usize) -> Window {
        assert!(ox < self.w_out && oy < self.h_out, "window out of range");
        let x0 = ox * self.x_span;
        let y0 = oy * self.y_span;
        Window {
            x: x0..(x0 + self.x_span).min(self.w_in),
            y: y0..(y0 + self.y_span).min(self.h_in),
        }
    }

    /// Every `((ox, oy), window)` pair, row by row.
    pub fn windows(&self) -> impl Iterator<Item = ((usize, usize), Window)> + '_ {
        (0..self.h_out)
            .flat_map(move |oy| (0..self.w_out).map(move |ox| ((ox, oy), self.window(ox, oy))))
    }

    fn check_batch(&self, len: usize, batch: usize) -> Result<(), Error> {
        if batch == 0 {
            return Err(Error::EmptyBatch);
        }
        // out_numel <= inp_numel, so every later batch product fits too
        match batch.checked_mul(self.inp_numel()) {
            Some(expected) if expected == len => Ok(()),
            Some(expected) => Err(Error::len_mismatch(expected, len)),
            None => Err(Error::ShapeMismatch {
                expected: std::vec![batch, self.inp_numel()],
                found: std::vec![len],
            }),
        }
    }

    fn check_tensor<E>(&self, t: &Tensor3<E>) -> Result<(), Error> {
        if t.shape() != self.inp_shape() {
            return Err(Error::shape_mismatch(self.inp_shape(), t.shape()));
        }
        Ok(())
    }

    /// Pools `batch` samples concatenated sample-major in `inp`. Samples never
    /// interact.
    pub fn try_forward_batch<E: Dtype>(&self, inp: &[E], batch: usize) -> Result<Pooled<E>, Error> {
        self.check_batch(inp.len(), batch)?;
        let (output, argmax) = cpu_kernel::forward(self, inp, batch)?;
        Ok(Pooled {
            output,
            selection: Selection {
                op: *self,
                batch,
                argmax,
            },
        })
    }

    pub fn forward_batch<E: Dtype>(&self, inp: &[E], batch: usize) -> Pooled<E> {
        self.try_forward_batch(inp, batch).unwrap()
    }

    /// Pools `batch` samples and carries the directional derivative `dir`
    /// (same layout as `inp`) through the selected cells.
    pub fn try_forward_batch_r<E: Dtype>(
        &self,
        inp: &[E],
        dir: &[E],
        batch: usize,
    ) -> Result<RPooled<E>, Error> {
        self.check_batch(inp.len(), batch)?;
        self.check_batch(dir.len(), batch)?;
        let pooled = self.try_forward_batch(inp, batch)?;
        let r_output = cpu_kernel::gather(self, &pooled.selection.argmax, dir)?;
        Ok(RPooled { pooled, r_output })
    }

    pub fn forward_batch_r<E: Dtype>(&self, inp: &[E], dir: &[E], batch: usize) -> RPooled<E> {
        self.try_forward_batch_r(inp, dir, batch).unwrap()
    }
}

/// The arg-max of every output cell of a forward call, as flat indices into
/// the (batched) input buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    op: MaxPool2DOp,
    batch: usize,
    argmax: Vec<usize>,
}

impl Selection {
    pub fn op(&self) -> &MaxPool2DOp {
        &self.op
    }

    pub fn batch_size(&self) -> usize {
        self.batch
    }

    /// The selected input index of each output cell, in output order.
    pub fn indices(&self) -> &[usize] {
        &self.argmax
    }

    fn check_out(&self, len: usize) -> Result<(), Error> {
        let expected = self.batch * self.op.out_numel();
        if len != expected {
            return Err(Error::len_mismatch(expected, len));
        }
        Ok(())
    }

    fn check_inp(&self, len: usize) -> Result<(), Error> {
        let expected = self.batch * self.op.inp_numel();
        if len != expected {
            return Err(Error::len_mismatch(expected, len));
        }
        Ok(())
    }

    /// Adds each value of `grad_out` onto the selected cell of `grad_inp`.
    pub fn try_route<E: Dtype>(&self, grad_out: &[E], grad_inp: &mut [E]) -> Result<(), Error> {
        self.check_out(grad_out.len())?;
        self.check_inp(grad_inp.len())?;
        cpu_kernel::route(&self.op, &self.argmax, grad_out, grad_inp);
        Ok(())
    }

    /// Reads the selected cell of an input-shaped buffer for each output.
    pub fn try_gather<E: Dtype>(&self, src: &[E]) -> Result<Vec<E>, Error> {
        self.check_inp(src.len())?;
        cpu_kernel::gather(&self.op, &self.argmax, src)
    }
}

/// Result of a forward max pool: the pooled values plus the [Selection]
/// that reverse-mode routing reuses.
#[derive(Debug, Clone)]
pub struct Pooled<E> {
    output: Vec<E>,
    selection: Selection,
}

impl<E: Dtype> Pooled<E> {
    pub fn op(&self) -> &MaxPool2DOp {
        &self.selection.op
    }

    pub fn batch_size(&self) -> usize {
        self.selection.batch
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// All samples' outputs, sample-major.
    pub fn output(&self) -> &[E] {
        &self.output
    }

    pub fn into_output(self) -> Vec<E> {
        self.output
    }

    /// The output of sample `i` as a tensor, if `i < batch_size()`.
    pub fn sample_output(&self, i: usize) -> Option<Tensor3<E>> {
        sample_tensor(self.op().out_shape(), &self.output, i)
    }

    /// Gradient of the input of a single-sample call, given the gradient of
    /// its output. Non-selected cells get exactly zero.
    pub fn try_backward(&self, grad_out: &Tensor3<E>) -> Result<Tensor3<E>, Error> {
        let out_shape = self.op().out_shape();
        if grad_out.shape() != out_shape {
            return Err(Error::shape_mismatch(out_shape, grad_out.shape()));
        }
        if self.batch_size() != 1 {
            return Err(Error::len_mismatch(
                self.batch_size() * out_shape.num_elements(),
                grad_out.len(),
            ));
        }
        let s = self.op().inp_shape();
        let mut grad_inp = Tensor3::try_zeros(s.width, s.height, s.depth)?;
        self.selection.try_route(grad_out.as_slice(), grad_inp.as_mut_slice())?;
        Ok(grad_inp)
    }

    pub fn backward(&self, grad_out: &Tensor3<E>) -> Tensor3<E> {
        self.try_backward(grad_out).unwrap()
    }

    /// Batched [Pooled::try_backward] over flat, sample-major buffers.
    pub fn try_backward_batch(&self, grad_out: &[E]) -> Result<Vec<E>, Error> {
        self.selection.check_out(grad_out.len())?;
        let mut grad_inp = try_alloc_zeros(self.batch_size() * self.op().inp_numel())?;
        self.selection.try_route(grad_out, &mut grad_inp)?;
        Ok(grad_inp)
    }

    /// Adds the routed `grad_out` onto an existing input gradient.
    pub fn try_accumulate_grad(&self, grad_out: &[E], grad_inp: &mut [E]) -> Result<(), Error> {
        self.selection.try_route(grad_out, grad_inp)
    }
}

/// Result of an R-operator forward max pool: [Pooled] plus the directional
/// derivative of the output.
#[derive(Debug, Clone)]
pub struct RPooled<E> {
    pooled: Pooled<E>,
    r_output: Vec<E>,
}

impl<E: Dtype> RPooled<E> {
    pub fn pooled(&self) -> &Pooled<E> {
        &self.pooled
    }

    pub fn into_parts(self) -> (Pooled<E>, Vec<E>) {
        (self.pooled, self.r_output)
    }

    pub fn selection(&self) -> &Selection {
        self.pooled.selection()
    }

    pub fn batch_size(&self) -> usize {
        self.pooled.batch_size()
    }

    pub fn output(&self) -> &[E] {
        self.pooled.output()
    }

    /// The directional derivative of every output, sample-major.
    pub fn r_output(&self) -> &[E] {
        &self.r_output
    }

    pub fn sample_r_output(&self, i: usize) -> Option<Tensor3<E>> {
        sample_tensor(self.pooled.op().out_shape(), &self.r_output, i)
    }

    /// Routes an output gradient and its R-gradient back to the input. Both
    /// travel through the same selection, so the result is the pair
    /// `(grad_inp, r_grad_inp)`.
    pub fn try_backward_r(
        &self,
        grad_out: &[E],
        r_grad_out: &[E],
    ) -> Result<(Vec<E>, Vec<E>), Error> {
        let selection = self.selection();
        selection.check_out(grad_out.len())?;
        selection.check_out(r_grad_out.len())?;
        let grad_inp = self.pooled.try_backward_batch(grad_out)?;
        let r_grad_inp = self.pooled.try_backward_batch(r_grad_out)?;
        Ok((grad_inp, r_grad_inp))
    }

    pub fn backward_r(&self, grad_out: &[E], r_grad_out: &[E]) -> (Vec<E>, Vec<E>) {
        self.try_backward_r(grad_out, r_grad_out).unwrap()
    }

    /// Accumulating version of [RPooled::try_backward_r]. Nothing is written
    /// unless all four buffers have the right length.
    pub fn try_accumulate_r_grad(
        &self,
        grad_out: &[E],
        r_grad_out: &[E],
        grad_inp: &mut [E],
        r_grad_inp: &mut [E],
    ) -> Result<(), Error> {
        let selection = self.selection();
        selection.check_out(grad_out.len())?;
        selection.check_out(r_grad_out.len())?;
        selection.check_inp(grad_inp.len())?;
        selection.check_inp(r_grad_inp.len())?;
        selection.try_route(grad_out, grad_inp)?;
        selection.try_route(r_grad_out, r_grad_inp)
    }
}

fn sample_tensor<E: Copy>(shape: Shape3, data: &[E], i: usize) -> Option<Tensor3<E>> {
    let n = shape.num_elements();
    let chunk = data.chunks_exact(n).nth(i)?;
    Some(Tensor3 {
        shape,
        data: chunk.to_vec(),
    })
}

/// Max pooling of a single [Tensor3].
pub trait TryMaxPool2D<E: Dtype> {
    fn max_pool2d(&self, op: &MaxPool2DOp) -> Pooled<E> {
        self.try_max_pool2d(op).unwrap()
    }

    /// Returns [Error::ShapeMismatch] if `self` is not shaped like `op`'s input.
    fn try_max_pool2d(&self, op: &MaxPool2DOp) -> Result<Pooled<E>, Error>;

    fn max_pool2d_r(&self, op: &MaxPool2DOp, dir: &Self) -> RPooled<E> {
        self.try_max_pool2d_r(op, dir).unwrap()
    }

    /// Pools `self` and carries the directional derivative `dir` through the
    /// selected cells.
    fn try_max_pool2d_r(&self, op: &MaxPool2DOp, dir: &Self) -> Result<RPooled<E>, Error>;
}

impl<E: Dtype> TryMaxPool2D<E> for Tensor3<E> {
    fn try_max_pool2d(&self, op: &MaxPool2DOp) -> Result<Pooled<E>, Error> {
        op.check_tensor(self)?;
        op.try_forward_batch(self.as_slice(), 1)
    }

    fn try_max_pool2d_r(&self, op: &MaxPool2DOp, dir: &Self) -> Result<RPooled<E>, Error> {
        op.check_tensor(self)?;
        op.check_tensor(dir)?;
        op.try_forward_batch_r(self.as_slice(), dir.as_slice(), 1)
    }
}

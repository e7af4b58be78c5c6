use super::MaxPool2DOp;
use crate::{
    dtypes::Dtype,
    tensor::{try_alloc_elem, try_alloc_zeros, Error},
};
use std::vec::Vec;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Whether `v` replaces `best` as the selection of a window. Strictly greater
/// values win, so ties keep the earlier cell. A NaN beats any number.
#[inline(always)]
fn beats<E: Dtype>(v: E, best: E) -> bool {
    v > best || (v.is_nan() && !best.is_nan())
}

/// Pools a single sample. Windows are scanned row by row (increasing y) and
/// left to right within a row (increasing x). `base` is the offset of `inp`
/// inside the batched buffer and is added to every recorded selection.
fn forward_sample<E: Dtype>(
    op: &MaxPool2DOp,
    inp: &[E],
    out: &mut [E],
    argmax: &mut [usize],
    base: usize,
) {
    let inp_shape = op.inp_shape();
    let out_shape = op.out_shape();
    for oy in 0..op.h_out {
        for ox in 0..op.w_out {
            let win = op.window(ox, oy);
            for z in 0..op.chan {
                let mut best_i = inp_shape.offset(win.x.start, win.y.start, z);
                let mut best = inp[best_i];
                for y in win.y.clone() {
                    for x in win.x.clone() {
                        let i = inp_shape.offset(x, y, z);
                        if beats(inp[i], best) {
                            best = inp[i];
                            best_i = i;
                        }
                    }
                }
                let o = out_shape.offset(ox, oy, z);
                out[o] = best;
                argmax[o] = base + best_i;
            }
        }
    }
}

/// Adds every output gradient of one sample onto its selected input cell.
fn route_sample<E: Dtype>(argmax: &[usize], grad_out: &[E], grad_inp: &mut [E], base: usize) {
    for (&i, &g) in argmax.iter().zip(grad_out.iter()) {
        grad_inp[i - base] += g;
    }
}

/// Pools `batch` concatenated samples. Shapes must already be validated.
pub(super) fn forward<E: Dtype>(
    op: &MaxPool2DOp,
    inp: &[E],
    batch: usize,
) -> Result<(Vec<E>, Vec<usize>), Error> {
    let inp_numel = op.inp_numel();
    let out_numel = op.out_numel();
    let mut out = try_alloc_zeros::<E>(batch * out_numel)?;
    let mut argmax = try_alloc_elem(batch * out_numel, 0usize)?;

    #[cfg(feature = "parallel")]
    inp.par_chunks_exact(inp_numel)
        .zip(out.par_chunks_exact_mut(out_numel))
        .zip(argmax.par_chunks_exact_mut(out_numel))
        .enumerate()
        .for_each(|(b, ((inp, out), argmax))| {
            forward_sample(op, inp, out, argmax, b * inp_numel)
        });

    #[cfg(not(feature = "parallel"))]
    for (b, ((inp, out), argmax)) in inp
        .chunks_exact(inp_numel)
        .zip(out.chunks_exact_mut(out_numel))
        .zip(argmax.chunks_exact_mut(out_numel))
        .enumerate()
    {
        forward_sample(op, inp, out, argmax, b * inp_numel);
    }

    Ok((out, argmax))
}

/// Accumulates `grad_out` into `grad_inp` through the selections.
/// Shapes must already be validated.
pub(super) fn route<E: Dtype>(
    op: &MaxPool2DOp,
    argmax: &[usize],
    grad_out: &[E],
    grad_inp: &mut [E],
) {
    let inp_numel = op.inp_numel();
    let out_numel = op.out_numel();

    #[cfg(feature = "parallel")]
    grad_inp
        .par_chunks_exact_mut(inp_numel)
        .zip(grad_out.par_chunks_exact(out_numel))
        .zip(argmax.par_chunks_exact(out_numel))
        .enumerate()
        .for_each(|(b, ((grad_inp, grad_out), argmax))| {
            route_sample(argmax, grad_out, grad_inp, b * inp_numel)
        });

    #[cfg(not(feature = "parallel"))]
    for (b, ((grad_inp, grad_out), argmax)) in grad_inp
        .chunks_exact_mut(inp_numel)
        .zip(grad_out.chunks_exact(out_numel))
        .zip(argmax.chunks_exact(out_numel))
        .enumerate()
    {
        route_sample(argmax, grad_out, grad_inp, b * inp_numel);
    }
}

/// Reads the selected cell of `src` for every output. `src` must be the
/// full batched input-shaped buffer.
pub(super) fn gather<E: Dtype>(
    op: &MaxPool2DOp,
    argmax: &[usize],
    src: &[E],
) -> Result<Vec<E>, Error> {
    let out_numel = op.out_numel();
    let mut out = try_alloc_zeros::<E>(argmax.len())?;

    #[cfg(feature = "parallel")]
    out.par_chunks_exact_mut(out_numel)
        .zip(argmax.par_chunks_exact(out_numel))
        .for_each(|(out, argmax)| {
            out.iter_mut()
                .zip(argmax.iter())
                .for_each(|(o, &i)| *o = src[i])
        });

    #[cfg(not(feature = "parallel"))]
    for (out, argmax) in out
        .chunks_exact_mut(out_numel)
        .zip(argmax.chunks_exact(out_numel))
    {
        out.iter_mut()
            .zip(argmax.iter())
            .for_each(|(o, &i)| *o = src[i]);
    }

    Ok(out)
}

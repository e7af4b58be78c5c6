use super::Error;
use crate::dtypes::Dtype;

use std::vec::Vec;

/// Allocates `numel` zeros.
#[inline]
pub(crate) fn try_alloc_zeros<E: Dtype>(numel: usize) -> Result<Vec<E>, Error> {
    try_alloc_elem(numel, E::zero())
}

#[inline]
pub(crate) fn try_alloc_elem<E: Copy>(numel: usize, elem: E) -> Result<Vec<E>, Error> {
    #[cfg(feature = "fast-alloc")]
    {
        Ok(std::vec![elem; numel])
    }

    #[cfg(not(feature = "fast-alloc"))]
    {
        let mut data: Vec<E> = Vec::new();
        data.try_reserve(numel).map_err(|_| Error::OutOfMemory)?;
        data.resize(numel, elem);
        Ok(data)
    }
}

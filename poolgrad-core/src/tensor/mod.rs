//! The [Tensor3] type and its constructors/accessors.
//!
//! # Creating tensors
//!
//! 1. [Tensor3::zeros] / [Tensor3::try_zeros] allocate a zero-filled tensor.
//! 2. [Tensor3::from_vec] / [Tensor3::try_from_vec] wrap an existing buffer of
//!    exactly `width * height * depth` elements.
//! 3. [Tensor3::sample] fills a tensor from any [rand::distributions::Distribution].
//!
//! # Indexing
//!
//! Coordinates are `(x, y, z)`. The `try_` accessors return
//! [Error::IndexOutOfBounds] for coordinates outside the tensor, the plain
//! accessors panic.

mod allocate;
mod error;

pub(crate) use allocate::{try_alloc_elem, try_alloc_zeros};
pub use error::Error;

use crate::{dtypes::Dtype, shapes::Shape3};
use rand::{distributions::Distribution, Rng};
use std::vec::Vec;

/// A dense, channels-last 3d array. Exclusively owns its data.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor3<E> {
    pub(crate) shape: Shape3,
    pub(crate) data: Vec<E>,
}

impl<E: Dtype> Tensor3<E> {
    /// Creates a zero-filled tensor.
    pub fn zeros(width: usize, height: usize, depth: usize) -> Self {
        Self::try_zeros(width, height, depth).unwrap()
    }

    /// Fallible version of [Tensor3::zeros].
    pub fn try_zeros(width: usize, height: usize, depth: usize) -> Result<Self, Error> {
        let shape = Shape3::new(width, height, depth);
        if !shape.is_valid() {
            return Err(Error::ZeroDim);
        }
        let numel = shape.checked_num_elements().ok_or(Error::OutOfMemory)?;
        let data = try_alloc_zeros(numel)?;
        Ok(Self { shape, data })
    }

    /// Creates a tensor with every element drawn from `distr`.
    pub fn sample<R: Rng, D: Distribution<E>>(
        width: usize,
        height: usize,
        depth: usize,
        rng: &mut R,
        distr: D,
    ) -> Self {
        let mut t = Self::zeros(width, height, depth);
        t.data.iter_mut().for_each(|v| *v = distr.sample(rng));
        t
    }
}

impl<E> Tensor3<E> {
    /// Wraps `data` as a tensor of the given dimensions.
    pub fn from_vec(width: usize, height: usize, depth: usize, data: Vec<E>) -> Self {
        Self::try_from_vec(width, height, depth, data).unwrap()
    }

    /// Fallible version of [Tensor3::from_vec]. Returns [Error::WrongNumElements]
    /// when `data.len() != width * height * depth`.
    pub fn try_from_vec(
        width: usize,
        height: usize,
        depth: usize,
        data: Vec<E>,
    ) -> Result<Self, Error> {
        let shape = Shape3::new(width, height, depth);
        if !shape.is_valid() {
            return Err(Error::ZeroDim);
        }
        if shape.checked_num_elements() != Some(data.len()) {
            return Err(Error::WrongNumElements);
        }
        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> Shape3 {
        self.shape
    }

    pub fn width(&self) -> usize {
        self.shape.width
    }

    pub fn height(&self) -> usize {
        self.shape.height
    }

    pub fn depth(&self) -> usize {
        self.shape.depth
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always `false`, since every dimension of a tensor is non-zero.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[E] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [E] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<E> {
        self.data
    }

    /// Linear offset of `(x, y, z)` into [Tensor3::as_slice].
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        self.try_index(x, y, z).unwrap()
    }

    pub fn try_index(&self, x: usize, y: usize, z: usize) -> Result<usize, Error> {
        self.shape.try_index(x, y, z)
    }
}

impl<E: Copy> Tensor3<E> {
    pub fn get(&self, x: usize, y: usize, z: usize) -> E {
        self.try_get(x, y, z).unwrap()
    }

    pub fn try_get(&self, x: usize, y: usize, z: usize) -> Result<E, Error> {
        let i = self.try_index(x, y, z)?;
        Ok(self.data[i])
    }

    pub fn set(&mut self, x: usize, y: usize, z: usize, value: E) {
        self.try_set(x, y, z, value).unwrap()
    }

    pub fn try_set(&mut self, x: usize, y: usize, z: usize, value: E) -> Result<(), Error> {
        let i = self.try_index(x, y, z)?;
        self.data[i] = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::*;
    use rand::{rngs::StdRng, SeedableRng};
    use rand_distr::StandardNormal;

    #[test]
    fn test_zeros() {
        let t: Tensor3<TestDtype> = Tensor3::zeros(4, 5, 3);
        assert_eq!(t.shape(), Shape3::new(4, 5, 3));
        assert_eq!(t.len(), 60);
        assert!(t.as_slice().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_zeros_too_large() {
        assert!(matches!(
            Tensor3::<TestDtype>::try_zeros(usize::MAX, 2, 1),
            Err(Error::OutOfMemory)
        ));
        assert!(matches!(
            Tensor3::<TestDtype>::try_zeros(usize::MAX / 2 + 1, 1, 2),
            Err(Error::OutOfMemory)
        ));
    }

    #[test]
    fn test_zero_dim_is_rejected() {
        assert!(matches!(
            Tensor3::<TestDtype>::try_zeros(0, 5, 3),
            Err(Error::ZeroDim)
        ));
        assert!(matches!(
            Tensor3::<TestDtype>::try_from_vec(2, 0, 1, vec![]),
            Err(Error::ZeroDim)
        ));
    }

    #[test]
    fn test_from_vec_wrong_num_elements() {
        let r = Tensor3::<TestDtype>::try_from_vec(2, 2, 2, vec![0.0; 7]);
        assert!(matches!(r, Err(Error::WrongNumElements)));
    }

    #[test]
    fn test_get_set_uses_depth_fastest_layout() {
        let mut t: Tensor3<TestDtype> = Tensor3::zeros(3, 2, 2);
        t.set(2, 1, 1, 7.0);
        assert_eq!(t.get(2, 1, 1), 7.0);
        assert_eq!(t.as_slice()[1 + 2 * 2 + 2 * 3], 7.0);
        assert_eq!(t.as_slice().iter().filter(|v| **v != 0.0).count(), 1);
    }

    #[test]
    fn test_accessors_out_of_bounds() {
        let mut t: Tensor3<TestDtype> = Tensor3::zeros(3, 2, 2);
        assert!(matches!(
            t.try_get(3, 0, 0),
            Err(Error::IndexOutOfBounds { .. })
        ));
        assert!(matches!(
            t.try_set(0, 2, 0, 1.0),
            Err(Error::IndexOutOfBounds { .. })
        ));
        assert!(t.as_slice().iter().all(|v| *v == 0.0));
    }

    #[test]
    #[should_panic]
    fn test_get_panics_out_of_bounds() {
        let t: Tensor3<TestDtype> = Tensor3::zeros(3, 2, 2);
        t.get(0, 0, 2);
    }

    #[test]
    fn test_sample_is_seeded() {
        let a: Tensor3<TestDtype> =
            Tensor3::sample(4, 4, 2, &mut StdRng::seed_from_u64(0), StandardNormal);
        let b: Tensor3<TestDtype> =
            Tensor3::sample(4, 4, 2, &mut StdRng::seed_from_u64(0), StandardNormal);
        assert_eq!(a, b);
        assert!(a.as_slice().iter().any(|v| *v != 0.0));
    }
}

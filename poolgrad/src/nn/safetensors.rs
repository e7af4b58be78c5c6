//! Saving layers to, and loading them from, `.safetensors` files.
//!
//! A layer is stored as a single `U8` tensor named after its
//! [Serializer::TYPE_TAG], holding its [Serializer::serialize] bytes.

use super::{serialize::Registry, Layer, Serializer};
use memmap2::MmapOptions;
use safetensors::{
    serialize_to_file,
    tensor::{Dtype as SDtype, SafeTensors, TensorView},
    SafeTensorError,
};
use std::{collections::BTreeMap, path::Path};

#[derive(Debug)]
pub enum Error {
    SafeTensorError(SafeTensorError),
    IoError(std::io::Error),
    LayerError(poolgrad_core::tensor::Error),
}

impl From<SafeTensorError> for Error {
    fn from(safe_error: SafeTensorError) -> Error {
        Error::SafeTensorError(safe_error)
    }
}

impl From<std::io::Error> for Error {
    fn from(io_error: std::io::Error) -> Error {
        Error::IoError(io_error)
    }
}

impl From<poolgrad_core::tensor::Error> for Error {
    fn from(layer_error: poolgrad_core::tensor::Error) -> Error {
        Error::LayerError(layer_error)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::error::Error for Error {}

fn save(path: &Path, tag: &str, data: &[u8]) -> Result<(), Error> {
    let mut views: BTreeMap<String, TensorView> = BTreeMap::new();
    views.insert(
        tag.to_string(),
        TensorView::new(SDtype::U8, vec![data.len()], data)?,
    );
    serialize_to_file(&views, &None, path)?;
    Ok(())
}

fn with_tensors<T, F>(path: &Path, f: F) -> Result<T, Error>
where
    F: FnOnce(&SafeTensors) -> Result<T, Error>,
{
    let file = std::fs::File::open(path)?;
    let buffer = unsafe { MmapOptions::new().map(&file)? };
    let tensors = SafeTensors::deserialize(&buffer)?;
    f(&tensors)
}

/// Something that can be saved to a `.safetensors` file.
///
/// Every [Serializer] implements SaveToSafetensors.
pub trait SaveToSafetensors: Serializer {
    /// Save this layer into the `.safetensors` file located at `path`.
    ///
    /// Example:
    /// ```ignore
    /// # use poolgrad::prelude::*;
    /// let layer = MaxPool2D::new(2, 2, 28, 28, 8);
    /// layer.save_safetensors("pool.safetensors").unwrap();
    /// ```
    fn save_safetensors<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        save(path.as_ref(), Self::TYPE_TAG, &self.serialize())
    }
}

impl<T: Serializer> SaveToSafetensors for T {}

/// Something that can be loaded from a `.safetensors` file.
///
/// Every [Serializer] implements LoadFromSafetensors.
pub trait LoadFromSafetensors: Serializer {
    /// Loads a layer of this type from the `.safetensors` at `path`.
    fn load_safetensors<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        with_tensors(path.as_ref(), |tensors| {
            let view = tensors.tensor(Self::TYPE_TAG)?;
            Ok(Self::deserialize(view.data())?)
        })
    }
}

impl<T: Serializer> LoadFromSafetensors for T {}

impl Layer {
    pub fn save_safetensors<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        save(path.as_ref(), self.type_tag(), &self.serialize())
    }

    /// Loads whichever layer the file at `path` holds, looking its type tag up
    /// in `registry`. The file must hold exactly one tensor.
    pub fn load_safetensors<P: AsRef<Path>>(path: P, registry: &Registry) -> Result<Self, Error> {
        with_tensors(path.as_ref(), |tensors| {
            let names = tensors.names();
            let [tag] = names.as_slice() else {
                return Err(poolgrad_core::tensor::Error::Deserialize(format!(
                    "expected a single layer, found {} tensors",
                    names.len()
                ))
                .into());
            };
            let view = tensors.tensor(tag)?;
            Ok(registry.deserialize(tag, view.data())?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::MaxPool2D;
    use tempfile::NamedTempFile;

    #[test]
    fn test_save_load_layer() {
        let file = NamedTempFile::new().expect("failed to create tempfile");
        let saved = MaxPool2D::new(3, 3, 10, 11, 2);
        saved.save_safetensors(file.path()).unwrap();
        let loaded = MaxPool2D::load_safetensors(file.path()).unwrap();
        assert_eq!(loaded, saved);
    }

    #[test]
    fn test_load_through_registry() {
        let file = NamedTempFile::new().expect("failed to create tempfile");
        let saved: Layer = MaxPool2D::new(4, 10, 30, 51, 2).into();
        saved.save_safetensors(file.path()).unwrap();
        let loaded = Layer::load_safetensors(file.path(), &Registry::default()).unwrap();
        assert_eq!(loaded, saved);

        assert!(matches!(
            Layer::load_safetensors(file.path(), &Registry::empty()),
            Err(Error::LayerError(
                poolgrad_core::tensor::Error::UnknownType(_)
            ))
        ));
    }

    #[test]
    fn test_load_garbage() {
        let file = NamedTempFile::new().expect("failed to create tempfile");
        std::fs::write(file.path(), b"not a safetensors file").unwrap();
        assert!(matches!(
            MaxPool2D::load_safetensors(file.path()),
            Err(Error::SafeTensorError(_))
        ));
    }
}

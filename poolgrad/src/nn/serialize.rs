//! Type-tagged byte encoding of layers.
//!
//! A persisted layer is a pair `(type tag, bytes)`. The tag tells a
//! [Registry] which decoder to run when loading. Layers here carry no learned
//! parameters, so the bytes are only configuration.
//!
//! [MaxPool2D] encodes as exactly 40 bytes: `x_span`, `y_span`,
//! `input_width`, `input_height`, `input_depth`, each a little endian `u64`.
//!
//! ```rust
//! # use poolgrad::prelude::*;
//! let layer = MaxPool2D::new(3, 3, 10, 11, 2);
//! let bytes = layer.serialize();
//! let loaded = Registry::default().deserialize(MaxPool2D::TYPE_TAG, &bytes).unwrap();
//! assert_eq!(loaded, Layer::MaxPool2D(layer));
//! ```

use super::MaxPool2D;
use poolgrad_core::tensor::Error;
use std::collections::BTreeMap;

/// Something with a stable type tag and byte encoding.
pub trait Serializer: Sized {
    /// Unique name of this kind of layer.
    const TYPE_TAG: &'static str;

    fn serialize(&self) -> Vec<u8>;

    /// Returns [Error::Deserialize] for malformed or truncated bytes.
    fn deserialize(bytes: &[u8]) -> Result<Self, Error>;
}

/// Convert slice of little endian bytes into `usize` fields.
fn read_le_fields<const N: usize>(bytes: &[u8]) -> Result<[usize; N], Error> {
    if bytes.len() != N * 8 {
        return Err(Error::Deserialize(format!(
            "expected {} bytes, found {}",
            N * 8,
            bytes.len()
        )));
    }
    let mut fields = [0usize; N];
    for (field, chunk) in fields.iter_mut().zip(bytes.chunks_exact(8)) {
        let mut le = [0u8; 8];
        le.copy_from_slice(chunk);
        let v = u64::from_le_bytes(le);
        *field = usize::try_from(v)
            .map_err(|_| Error::Deserialize(format!("field {v} does not fit in usize")))?;
    }
    Ok(fields)
}

impl Serializer for MaxPool2D {
    const TYPE_TAG: &'static str = "poolgrad::MaxPool2D";

    fn serialize(&self) -> Vec<u8> {
        [
            self.x_span(),
            self.y_span(),
            self.input_width(),
            self.input_height(),
            self.input_depth(),
        ]
        .iter()
        .flat_map(|&f| (f as u64).to_le_bytes())
        .collect()
    }

    fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        let [x_span, y_span, w, h, d] = read_le_fields::<5>(bytes).map_err(|e| {
            log::debug!("failed to decode {}: {e}", Self::TYPE_TAG);
            e
        })?;
        MaxPool2D::try_new(x_span, y_span, w, h, d).map_err(|e| {
            Error::Deserialize(format!("{}: invalid configuration ({e})", Self::TYPE_TAG))
        })
    }
}

/// Every kind of layer a [Registry] can produce.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layer {
    MaxPool2D(MaxPool2D),
}

impl Layer {
    pub fn type_tag(&self) -> &'static str {
        match self {
            Layer::MaxPool2D(_) => MaxPool2D::TYPE_TAG,
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Layer::MaxPool2D(l) => l.serialize(),
        }
    }
}

impl From<MaxPool2D> for Layer {
    fn from(l: MaxPool2D) -> Self {
        Layer::MaxPool2D(l)
    }
}

pub type Deserializer = fn(&[u8]) -> Result<Layer, Error>;

/// Maps type tags to decoders. [Registry::default] knows every built-in layer.
#[derive(Clone)]
pub struct Registry {
    /// Using BTreeMap for a deterministic iteration order
    by_tag: BTreeMap<&'static str, Deserializer>,
}

impl Default for Registry {
    fn default() -> Self {
        let mut r = Self::empty();
        r.register::<MaxPool2D>();
        r
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("tags", &self.by_tag.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Registry {
    /// A registry that knows no layers.
    pub fn empty() -> Self {
        Self {
            by_tag: BTreeMap::new(),
        }
    }

    /// Registers `L` under [Serializer::TYPE_TAG], replacing any previous
    /// decoder for that tag.
    pub fn register<L: Serializer + Into<Layer>>(&mut self) {
        self.by_tag
            .insert(L::TYPE_TAG, |bytes: &[u8]| -> Result<Layer, Error> {
                L::deserialize(bytes).map(Into::into)
            });
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.by_tag.contains_key(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.by_tag.keys().copied()
    }

    /// Decodes `bytes` with the decoder registered for `tag`.
    ///
    /// Returns [Error::UnknownType] if no decoder is registered for `tag`.
    pub fn deserialize(&self, tag: &str, bytes: &[u8]) -> Result<Layer, Error> {
        let f = self.by_tag.get(tag).ok_or_else(|| {
            log::debug!("no deserializer registered for {tag:?}");
            Error::UnknownType(tag.to_string())
        })?;
        f(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for layer in [
            MaxPool2D::new(3, 3, 10, 11, 2),
            MaxPool2D::new(4, 10, 30, 51, 2),
            MaxPool2D::new(1, 1, 1, 1, 1),
        ] {
            let bytes = layer.serialize();
            assert_eq!(bytes.len(), 40);
            assert_eq!(MaxPool2D::deserialize(&bytes).unwrap(), layer);
        }
    }

    #[test]
    fn test_byte_layout() {
        let bytes = MaxPool2D::new(3, 4, 10, 11, 2).serialize();
        let mut expected = Vec::new();
        for v in [3u64, 4, 10, 11, 2] {
            expected.extend_from_slice(&v.to_le_bytes());
        }
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_truncated_bytes() {
        let bytes = MaxPool2D::new(3, 3, 10, 11, 2).serialize();
        for len in [0, 8, 39] {
            assert!(matches!(
                MaxPool2D::deserialize(&bytes[..len]),
                Err(Error::Deserialize(_))
            ));
        }
        let mut longer = bytes.clone();
        longer.push(0);
        assert!(matches!(
            MaxPool2D::deserialize(&longer),
            Err(Error::Deserialize(_))
        ));
    }

    #[test]
    fn test_zero_field_rejected() {
        let mut bytes = MaxPool2D::new(3, 3, 10, 11, 2).serialize();
        bytes[8..16].copy_from_slice(&0u64.to_le_bytes());
        assert!(matches!(
            MaxPool2D::deserialize(&bytes),
            Err(Error::Deserialize(_))
        ));
    }

    #[test]
    fn test_registry() {
        let registry = Registry::default();
        assert!(registry.contains(MaxPool2D::TYPE_TAG));
        assert_eq!(registry.tags().collect::<Vec<_>>(), [MaxPool2D::TYPE_TAG]);

        let layer: Layer = MaxPool2D::new(5, 4, 17, 19, 3).into();
        let loaded = registry
            .deserialize(layer.type_tag(), &layer.serialize())
            .unwrap();
        assert_eq!(loaded, layer);

        assert!(matches!(
            registry.deserialize("poolgrad::AvgPool2D", &layer.serialize()),
            Err(Error::UnknownType(tag)) if tag == "poolgrad::AvgPool2D"
        ));
        assert!(matches!(
            Registry::empty().deserialize(MaxPool2D::TYPE_TAG, &layer.serialize()),
            Err(Error::UnknownType(_))
        ));
    }
}

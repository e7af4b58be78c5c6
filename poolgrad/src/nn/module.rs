use poolgrad_core::tensor::Error;

/// Something that can be applied to an `Input` to produce `Module::Output`.
///
/// Generic `Input` means you can implement module for multiple input types on
/// the same struct. [super::MaxPool2D] implements it for a single tensor and
/// for an `(input, direction)` pair of tensors.
pub trait Module<Input> {
    type Output;

    fn try_forward(&self, x: Input) -> Result<Self::Output, Error>;

    fn forward(&self, x: Input) -> Self::Output {
        self.try_forward(x).unwrap()
    }
}

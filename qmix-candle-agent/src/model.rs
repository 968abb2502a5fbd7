//! Interface of recurrent Q-networks consumed by the loss computation.
use anyhow::Result;
use candle_core::Tensor;
use candle_nn::VarBuilder;

/// Recurrent network mapping an input and a hidden state to Q-values.
///
/// Like the other models of this crate, it does not own its variables: they
/// live in the [`VarMap`] behind the [`VarBuilder`] it is built with, so that
/// an online network and its target copy can be kept in separate var maps.
///
/// [`VarMap`]: candle_nn::VarMap
pub trait RecurrentModel {
    /// Configuration from which the model is constructed.
    type Config;

    /// Builds the model with [`VarBuilder`] and [`RecurrentModel::Config`].
    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Returns a zero hidden state of `batch_size` rows on the model's device.
    fn init_hidden(&self, batch_size: usize) -> Result<Tensor>;

    /// Returns Q-values and the next hidden state.
    fn forward(&self, input: &Tensor, hidden: &Tensor) -> Result<(Tensor, Tensor)>;
}

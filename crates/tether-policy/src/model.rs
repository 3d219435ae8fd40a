//! The pluggable model-execution seam.

use tether_core::PolicyError;

/// A numeric model mapping a flat observation tensor to a flat action tensor.
///
/// Runs on the inference worker thread, so implementations must be `Send`.
/// `input` has the observation space's flattened size and `output` the
/// action space's; the output buffer still holds the previous decision's
/// values on entry.
///
/// # Examples
///
/// ```
/// use tether_core::PolicyError;
/// use tether_policy::ModelBackend;
///
/// struct Sum;
///
/// impl ModelBackend for Sum {
///     fn run_sync(&mut self, input: &[f32], output: &mut [f32]) -> Result<(), PolicyError> {
///         let s: f32 = input.iter().sum();
///         output.fill(s);
///         Ok(())
///     }
/// }
///
/// let mut out = [0.0; 2];
/// Sum.run_sync(&[1.0, 2.0], &mut out).unwrap();
/// assert_eq!(out, [3.0, 3.0]);
/// ```
pub trait ModelBackend: Send + 'static {
    /// Name used in logs.
    fn name(&self) -> &str {
        "model"
    }

    /// Run the model to completion.
    fn run_sync(&mut self, input: &[f32], output: &mut [f32]) -> Result<(), PolicyError>;
}

impl<F> ModelBackend for F
where
    F: FnMut(&[f32], &mut [f32]) -> Result<(), PolicyError> + Send + 'static,
{
    fn run_sync(&mut self, input: &[f32], output: &mut [f32]) -> Result<(), PolicyError> {
        self(input, output)
    }
}

//! Response-model traits and the composite residual problem.
//!
//! A measured response is the product of a background model (the
//! transmission of everything but the resonator) and a foreground resonator
//! model. Both are [`ResponseModel`]s evaluated from named [`Parameters`];
//! resonator models additionally implement [`ResonatorModel`].
//!
//! [`ModelProblem`] turns a composite model and a measurement into a
//! [`Problem`] over the internal (unbounded) values of the varying parameters.

use crate::error::{check_lengths, ResonatorError, Result};
use crate::parameters::Parameters;
use crate::problem::Problem;
use ndarray::{concatenate, Array1, Axis};
use num_complex::Complex64;

/// Name of the resonance frequency parameter.
pub const RESONANCE_FREQUENCY: &str = "resonance_frequency";
/// Name of the internal loss parameter.
pub const INTERNAL_LOSS: &str = "internal_loss";
/// Name of the coupling loss parameter.
pub const COUPLING_LOSS: &str = "coupling_loss";
/// Name of the asymmetry parameter.
pub const ASYMMETRY: &str = "asymmetry";
/// Name of the Kerr drive parameter.
pub const KXIN: &str = "kxin";

/// Fractional detuning `frequency / resonance_frequency - 1`.
pub fn detuning(frequency: &Array1<f64>, resonance_frequency: f64) -> Array1<f64> {
    frequency.mapv(|f| f / resonance_frequency - 1.0)
}

/// Physical parameters of a resonator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResonatorParameters {
    pub resonance_frequency: f64,
    pub internal_loss: f64,
    pub coupling_loss: f64,
    pub asymmetry: f64,
    /// Kerr drive; zero for a linear resonator
    pub kxin: f64,
}

impl ResonatorParameters {
    /// Parameters of a linear resonator (`kxin = 0`).
    pub fn linear(
        resonance_frequency: f64,
        internal_loss: f64,
        coupling_loss: f64,
        asymmetry: f64,
    ) -> Self {
        Self {
            resonance_frequency,
            internal_loss,
            coupling_loss,
            asymmetry,
            kxin: 0.0,
        }
    }

    /// The same parameters with the given Kerr drive.
    pub fn with_kxin(self, kxin: f64) -> Self {
        Self { kxin, ..self }
    }

    /// Read the parameters from a named collection; a missing `kxin` is zero.
    pub fn from_parameters(params: &Parameters) -> Result<Self> {
        let kxin = if params.contains(KXIN) {
            params.value(KXIN)?
        } else {
            0.0
        };

        Ok(Self {
            resonance_frequency: params.value(RESONANCE_FREQUENCY)?,
            internal_loss: params.value(INTERNAL_LOSS)?,
            coupling_loss: params.value(COUPLING_LOSS)?,
            asymmetry: params.value(ASYMMETRY)?,
            kxin,
        })
    }

    /// Check the physical invariants: positive finite frequency and losses,
    /// finite asymmetry and drive.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            (RESONANCE_FREQUENCY, self.resonance_frequency),
            (INTERNAL_LOSS, self.internal_loss),
            (COUPLING_LOSS, self.coupling_loss),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ResonatorError::InvalidParameter(format!(
                    "{} must be finite and positive, got {}",
                    name, value
                )));
            }
        }

        for (name, value) in [(ASYMMETRY, self.asymmetry), (KXIN, self.kxin)] {
            if !value.is_finite() {
                return Err(ResonatorError::InvalidParameter(format!(
                    "{} must be finite, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }

    /// `internal_loss + coupling_loss`
    pub fn total_loss(&self) -> f64 {
        self.internal_loss + self.coupling_loss
    }

    /// Fractional detuning of each frequency from resonance.
    pub fn detuning(&self, frequency: &Array1<f64>) -> Array1<f64> {
        detuning(frequency, self.resonance_frequency)
    }
}

/// A complex response model evaluated from named parameters.
pub trait ResponseModel {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Names of the parameters the model reads, in the order `guess` adds them.
    fn parameter_names(&self) -> Vec<&'static str>;

    /// Evaluate the response at each frequency.
    fn eval(&self, params: &Parameters, frequency: &Array1<f64>) -> Result<Array1<Complex64>>;

    /// Starting values and bounds estimated from a measurement.
    fn guess(&self, frequency: &Array1<f64>, data: &Array1<Complex64>) -> Result<Parameters>;
}

/// A foreground model describing the resonator itself.
pub trait ResonatorModel: ResponseModel {
    /// The response far from resonance.
    fn reference_point(&self) -> Complex64 {
        Complex64::new(1.0, 0.0)
    }

    /// Recover `(detuning, internal_loss)` from background-normalized
    /// scattering data, holding the other fitted parameters fixed.
    fn invert(
        &self,
        _params: &ResonatorParameters,
        _scattering_data: &Array1<Complex64>,
    ) -> Result<(Array1<f64>, Array1<f64>)> {
        Err(ResonatorError::NotImplemented(format!(
            "inversion of the {} model",
            self.name()
        )))
    }
}

/// Weighted residual problem for `background * foreground` against a measurement.
///
/// Residuals are the real parts of `(model - data)` divided by the real
/// parts of the errors, followed by the imaginary parts divided by the
/// imaginary parts of the errors. Without errors every weight is 1.
pub struct ModelProblem<'a> {
    foreground: &'a dyn ResponseModel,
    background: &'a dyn ResponseModel,
    frequency: &'a Array1<f64>,
    data: &'a Array1<Complex64>,
    real_weights: Array1<f64>,
    imag_weights: Array1<f64>,
    parameters: Parameters,
}

impl<'a> ModelProblem<'a> {
    /// Create a problem; `parameters` supplies the starting values, bounds and
    /// vary flags of both models.
    pub fn new(
        foreground: &'a dyn ResponseModel,
        background: &'a dyn ResponseModel,
        frequency: &'a Array1<f64>,
        data: &'a Array1<Complex64>,
        errors: Option<&Array1<Complex64>>,
        parameters: Parameters,
    ) -> Result<Self> {
        check_lengths("data", frequency.len(), data.len())?;

        let (real_weights, imag_weights) = match errors {
            Some(errors) => {
                check_lengths("errors", frequency.len(), errors.len())?;
                if errors
                    .iter()
                    .any(|e| !(e.re.is_finite() && e.im.is_finite() && e.re > 0.0 && e.im > 0.0))
                {
                    return Err(ResonatorError::InvalidInput(
                        "errors must have finite, positive real and imaginary parts".to_string(),
                    ));
                }
                (errors.mapv(|e| 1.0 / e.re), errors.mapv(|e| 1.0 / e.im))
            }
            None => (
                Array1::ones(frequency.len()),
                Array1::ones(frequency.len()),
            ),
        };

        Ok(Self {
            foreground,
            background,
            frequency,
            data,
            real_weights,
            imag_weights,
            parameters,
        })
    }

    /// The parameters the problem was created with.
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Internal values of the varying parameters, the optimizer's starting point.
    pub fn initial_internal(&self) -> Result<Array1<f64>> {
        Ok(Array1::from(self.parameters.varying_internal_values()?))
    }

    /// Parameters with the varying ones set from internal values.
    pub fn parameters_at(&self, internal: &Array1<f64>) -> Result<Parameters> {
        let mut params = self.parameters.clone();
        params.update_from_internal(&internal.to_vec())?;
        Ok(params)
    }

    /// `background * foreground` at the measured frequencies.
    pub fn model_values(&self, params: &Parameters) -> Result<Array1<Complex64>> {
        let background = self.background.eval(params, self.frequency)?;
        let foreground = self.foreground.eval(params, self.frequency)?;
        Ok(background * foreground)
    }

    /// Weighted residuals at the given parameters.
    pub fn residuals(&self, params: &Parameters) -> Result<Array1<f64>> {
        let difference = self.model_values(params)? - self.data;
        let real = difference.mapv(|z| z.re) * &self.real_weights;
        let imag = difference.mapv(|z| z.im) * &self.imag_weights;
        concatenate(Axis(0), &[real.view(), imag.view()]).map_err(|e| {
            ResonatorError::DimensionMismatch(format!("cannot join residuals: {}", e))
        })
    }

    /// Number of data values (twice the number of points).
    pub fn ndata(&self) -> usize {
        2 * self.frequency.len()
    }

    /// Number of varying parameters.
    pub fn nvarys(&self) -> usize {
        self.parameters.varying_count()
    }
}

impl Problem for ModelProblem<'_> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let params = self.parameters_at(params)?;
        self.residuals(&params)
    }

    fn parameter_count(&self) -> usize {
        self.nvarys()
    }

    fn residual_count(&self) -> usize {
        self.ndata()
    }
}

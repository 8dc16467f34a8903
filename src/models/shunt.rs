//! Resonators in the shunt ("hanger") configuration.
//!
//! The resonator hangs off a transmission line, so far from resonance the
//! line transmits fully and at resonance the transmission dips:
//!
//! ```text
//! S21 = 1 - (1 + i asymmetry) / (1 + (internal_loss + 2 i x) / coupling_loss)
//! ```
//!
//! with `x` the detuning. The Kerr-nonlinear version replaces `x` by
//! `x - kerr_detuning(x)`.

use crate::error::{ResonatorError, Result};
use crate::model::{
    ResonatorModel, ResonatorParameters, ResponseModel, ASYMMETRY, COUPLING_LOSS, INTERNAL_LOSS,
    KXIN, RESONANCE_FREQUENCY,
};
use crate::models::guess::guess_smooth;
use crate::nonlinear::{kerr_detuning, kerr_detuning_at_bifurcation, Choose, ChooseRoot};
use crate::parameters::Parameters;
use ndarray::Array1;
use num_complex::Complex64;

/// Lower bound of the loss parameters produced by `guess`.
pub const MIN_LOSS: f64 = 1e-12;
/// Upper bound of the loss parameters produced by `guess`.
pub const MAX_LOSS: f64 = 1.0;
/// Magnitude bound of the asymmetry produced by `guess`.
pub const MAX_ASYMMETRY: f64 = 10.0;
/// `guess` bounds `kxin` to this multiple of the bifurcation drive of the
/// guessed losses, in either sign.
pub const KXIN_BOUND_FACTOR: f64 = 1000.0;

fn shunt_response(detuning: f64, params: &ResonatorParameters) -> Complex64 {
    let numerator = Complex64::new(1.0, params.asymmetry);
    let denominator = 1.0
        + Complex64::new(params.internal_loss, 2.0 * detuning) / params.coupling_loss;
    1.0 - numerator / denominator
}

/// Linear shunt response at each frequency.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use resonator::model::ResonatorParameters;
/// use resonator::models::shunt::shunt;
///
/// let params = ResonatorParameters::linear(5e9, 1e-5, 1e-4, 0.0);
/// let s21 = shunt(&array![5e9], &params).unwrap();
/// // depth at resonance is internal / (internal + coupling)
/// assert!((s21[0].re - 1.0 / 11.0).abs() < 1e-12);
/// ```
pub fn shunt(frequency: &Array1<f64>, params: &ResonatorParameters) -> Result<Array1<Complex64>> {
    params.validate()?;
    Ok(params.detuning(frequency).mapv(|x| shunt_response(x, params)))
}

/// Linear shunt response at a single frequency.
pub fn shunt_at(frequency: f64, params: &ResonatorParameters) -> Result<Complex64> {
    params.validate()?;
    Ok(shunt_response(
        frequency / params.resonance_frequency - 1.0,
        params,
    ))
}

/// Kerr-nonlinear shunt response at each frequency.
///
/// Where the response is bistable, `choose` selects the branch.
pub fn shunt_nonlinear<C>(
    frequency: &Array1<f64>,
    params: &ResonatorParameters,
    choose: &C,
) -> Result<Array1<Complex64>>
where
    C: ChooseRoot + ?Sized,
{
    params.validate()?;
    let detuning = params.detuning(frequency);
    let shift = kerr_detuning(
        &detuning,
        params.coupling_loss,
        params.internal_loss,
        params.kxin,
        choose,
    );
    Ok((detuning - shift).mapv(|x| shunt_response(x, params)))
}

/// Kerr-nonlinear shunt response at a single frequency.
pub fn shunt_nonlinear_at<C>(frequency: f64, params: &ResonatorParameters, choose: &C) -> Result<Complex64>
where
    C: ChooseRoot + ?Sized,
{
    let values = shunt_nonlinear(&Array1::from_elem(1, frequency), params, choose)?;
    Ok(values[0])
}

/// Starting parameters shared by both shunt models.
fn guess_parameters(
    frequency: &Array1<f64>,
    data: &Array1<Complex64>,
    nonlinear: bool,
) -> Result<Parameters> {
    let (resonance_frequency, coupling_loss, internal_loss) = guess_smooth(frequency, data)?;
    for (name, value) in [(COUPLING_LOSS, coupling_loss), (INTERNAL_LOSS, internal_loss)] {
        if !(value.is_finite() && value > 0.0) {
            return Err(ResonatorError::InvalidInput(format!(
                "cannot estimate {} from the data (got {}); \
                 the normalized data must dip below 1 with a resolved linewidth",
                name, value
            )));
        }
    }

    let (fmin, fmax) = frequency
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &f| {
            (lo.min(f), hi.max(f))
        });

    let mut params = Parameters::new();
    params.add_param_with_bounds(RESONANCE_FREQUENCY, resonance_frequency, fmin, fmax)?;
    params.add_param_with_bounds(INTERNAL_LOSS, internal_loss, MIN_LOSS, MAX_LOSS)?;
    params.add_param_with_bounds(COUPLING_LOSS, coupling_loss, MIN_LOSS, MAX_LOSS)?;
    params.add_param_with_bounds(ASYMMETRY, 0.0, -MAX_ASYMMETRY, MAX_ASYMMETRY)?;
    if nonlinear {
        let bound = KXIN_BOUND_FACTOR * kerr_detuning_at_bifurcation(coupling_loss, internal_loss);
        params.add_param_with_bounds(KXIN, 0.0, -bound, bound)?;
    }

    Ok(params)
}

/// Linear shunt-coupled resonator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Shunt;

impl ResponseModel for Shunt {
    fn name(&self) -> &str {
        "shunt"
    }

    fn parameter_names(&self) -> Vec<&'static str> {
        vec![RESONANCE_FREQUENCY, INTERNAL_LOSS, COUPLING_LOSS, ASYMMETRY]
    }

    fn eval(&self, params: &Parameters, frequency: &Array1<f64>) -> Result<Array1<Complex64>> {
        let physical = ResonatorParameters::from_parameters(params)?;
        shunt(frequency, &ResonatorParameters { kxin: 0.0, ..physical })
    }

    fn guess(&self, frequency: &Array1<f64>, data: &Array1<Complex64>) -> Result<Parameters> {
        guess_parameters(frequency, data, false)
    }
}

impl ResonatorModel for Shunt {
    /// Solve the shunt response for the detuning and the internal loss:
    ///
    /// ```text
    /// z = coupling_loss * ((1 + i asymmetry) / (1 - s) - 1)
    /// detuning = Im(z) / 2
    /// internal_loss = Re(z)
    /// ```
    fn invert(
        &self,
        params: &ResonatorParameters,
        scattering_data: &Array1<Complex64>,
    ) -> Result<(Array1<f64>, Array1<f64>)> {
        let numerator = Complex64::new(1.0, params.asymmetry);
        let z = scattering_data.mapv(|s| params.coupling_loss * (numerator / (1.0 - s) - 1.0));
        Ok((z.mapv(|z| z.im / 2.0), z.mapv(|z| z.re)))
    }
}

/// Shunt-coupled resonator with a Kerr-type nonlinearity.
///
/// `choose` picks the branch where the response is bistable.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShuntNonlinear<C: ChooseRoot = Choose> {
    choose: C,
}

impl<C: ChooseRoot> ShuntNonlinear<C> {
    /// Create a model that follows the branch selected by `choose`.
    pub fn new(choose: C) -> Self {
        Self { choose }
    }

    /// The branch selection policy.
    pub fn choose(&self) -> &C {
        &self.choose
    }
}

impl<C: ChooseRoot> ResponseModel for ShuntNonlinear<C> {
    fn name(&self) -> &str {
        "shunt_nonlinear"
    }

    fn parameter_names(&self) -> Vec<&'static str> {
        vec![RESONANCE_FREQUENCY, INTERNAL_LOSS, COUPLING_LOSS, ASYMMETRY, KXIN]
    }

    fn eval(&self, params: &Parameters, frequency: &Array1<f64>) -> Result<Array1<Complex64>> {
        let physical = ResonatorParameters::from_parameters(params)?;
        shunt_nonlinear(frequency, &physical, &self.choose)
    }

    fn guess(&self, frequency: &Array1<f64>, data: &Array1<Complex64>) -> Result<Parameters> {
        guess_parameters(frequency, data, true)
    }
}

impl<C: ChooseRoot> ResonatorModel for ShuntNonlinear<C> {
    /// The nonlinear response has no closed-form inverse: the Kerr shift
    /// depends on the detuning being solved for. Always `NotImplemented`.
    fn invert(
        &self,
        _params: &ResonatorParameters,
        _scattering_data: &Array1<Complex64>,
    ) -> Result<(Array1<f64>, Array1<f64>)> {
        Err(ResonatorError::NotImplemented(
            "inversion of the nonlinear shunt model has no closed form".to_string(),
        ))
    }
}

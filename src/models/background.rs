//! Background models: the response of everything in the measurement chain
//! except the resonator.
//!
//! Parameter names carry the `background_` prefix so they never collide
//! with the resonator parameters in the composite fit.

use crate::error::{check_lengths, ResonatorError, Result};
use crate::model::ResponseModel;
use crate::parameters::{Parameter, Parameters};
use ndarray::Array1;
use num_complex::Complex64;
use std::f64::consts::PI;

/// Name of the background magnitude parameter.
pub const BACKGROUND_MAGNITUDE: &str = "background_magnitude";
/// Name of the background phase parameter, in radians.
pub const BACKGROUND_PHASE: &str = "background_phase";
/// Name of the electrical delay parameter, in seconds.
pub const BACKGROUND_DELAY: &str = "background_delay";
/// Name of the frequency at which the delay contributes no phase.
pub const BACKGROUND_REFERENCE_FREQUENCY: &str = "background_reference_frequency";

fn require_points(data: &Array1<Complex64>, model: &str) -> Result<()> {
    if data.is_empty() {
        return Err(ResonatorError::InvalidInput(format!(
            "cannot guess the {} background from an empty sweep",
            model
        )));
    }
    Ok(())
}

/// Mean of the first and last points, where the resonator is closest to its
/// reference point.
fn endpoint_mean(data: &Array1<Complex64>) -> Complex64 {
    (data[0] + data[data.len() - 1]) / 2.0
}

fn magnitude_parameter(magnitude: f64) -> Result<Parameter> {
    let mut param = Parameter::new(BACKGROUND_MAGNITUDE, magnitude);
    param.set_bounds(0.0, f64::INFINITY)?;
    Ok(param)
}

/// Unit background; contributes no parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct One;

impl ResponseModel for One {
    fn name(&self) -> &str {
        "one"
    }

    fn parameter_names(&self) -> Vec<&'static str> {
        Vec::new()
    }

    fn eval(&self, _params: &Parameters, frequency: &Array1<f64>) -> Result<Array1<Complex64>> {
        Ok(Array1::from_elem(frequency.len(), Complex64::new(1.0, 0.0)))
    }

    fn guess(&self, _frequency: &Array1<f64>, _data: &Array1<Complex64>) -> Result<Parameters> {
        Ok(Parameters::new())
    }
}

/// Frequency-independent complex gain `magnitude * exp(i phase)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComplexConstant;

impl ResponseModel for ComplexConstant {
    fn name(&self) -> &str {
        "complex_constant"
    }

    fn parameter_names(&self) -> Vec<&'static str> {
        vec![BACKGROUND_MAGNITUDE, BACKGROUND_PHASE]
    }

    fn eval(&self, params: &Parameters, frequency: &Array1<f64>) -> Result<Array1<Complex64>> {
        let gain = Complex64::from_polar(
            params.value(BACKGROUND_MAGNITUDE)?,
            params.value(BACKGROUND_PHASE)?,
        );
        Ok(Array1::from_elem(frequency.len(), gain))
    }

    fn guess(&self, _frequency: &Array1<f64>, data: &Array1<Complex64>) -> Result<Parameters> {
        require_points(data, self.name())?;
        let (magnitude, phase) = endpoint_mean(data).to_polar();

        let mut params = Parameters::new();
        params.add(magnitude_parameter(magnitude)?)?;
        params.add_param(BACKGROUND_PHASE, phase)?;
        Ok(params)
    }
}

/// Complex gain with an electrical delay:
///
/// ```text
/// magnitude * exp(i phase) * exp(-2 pi i (f - reference_frequency) delay)
/// ```
///
/// The reference frequency is fixed at the start of the sweep so the phase
/// and the delay are not degenerate.
#[derive(Debug, Clone, Copy, Default)]
pub struct MagnitudePhaseDelay;

impl MagnitudePhaseDelay {
    /// Phase of each point with the `2 pi` jumps removed.
    fn unwrapped_phase(data: &Array1<Complex64>) -> Vec<f64> {
        let mut phase = Vec::with_capacity(data.len());
        let mut offset = 0.0;
        let mut previous: Option<f64> = None;
        for z in data.iter() {
            let wrapped = z.arg();
            if let Some(last) = previous {
                let jump = wrapped + offset - last;
                offset -= 2.0 * PI * (jump / (2.0 * PI)).round();
            }
            let value = wrapped + offset;
            phase.push(value);
            previous = Some(value);
        }
        phase
    }
}

impl ResponseModel for MagnitudePhaseDelay {
    fn name(&self) -> &str {
        "magnitude_phase_delay"
    }

    fn parameter_names(&self) -> Vec<&'static str> {
        vec![
            BACKGROUND_MAGNITUDE,
            BACKGROUND_PHASE,
            BACKGROUND_DELAY,
            BACKGROUND_REFERENCE_FREQUENCY,
        ]
    }

    fn eval(&self, params: &Parameters, frequency: &Array1<f64>) -> Result<Array1<Complex64>> {
        let gain = Complex64::from_polar(
            params.value(BACKGROUND_MAGNITUDE)?,
            params.value(BACKGROUND_PHASE)?,
        );
        let delay = params.value(BACKGROUND_DELAY)?;
        let reference = params.value(BACKGROUND_REFERENCE_FREQUENCY)?;
        Ok(frequency.mapv(|f| gain * Complex64::from_polar(1.0, -2.0 * PI * (f - reference) * delay)))
    }

    fn guess(&self, frequency: &Array1<f64>, data: &Array1<Complex64>) -> Result<Parameters> {
        check_lengths("data", frequency.len(), data.len())?;
        require_points(data, self.name())?;
        let last = data.len() - 1;

        let phase = Self::unwrapped_phase(data);
        let span = frequency[last] - frequency[0];
        let delay = if span != 0.0 {
            -(phase[last] - phase[0]) / (2.0 * PI * span)
        } else {
            0.0
        };
        let magnitude = (data[0].norm() + data[last].norm()) / 2.0;

        let mut params = Parameters::new();
        params.add(magnitude_parameter(magnitude)?)?;
        params.add_param(BACKGROUND_PHASE, phase[0])?;
        params.add_param(BACKGROUND_DELAY, delay)?;

        let mut reference = Parameter::new(BACKGROUND_REFERENCE_FREQUENCY, frequency[0]);
        reference.set_vary(false);
        params.add(reference)?;

        Ok(params)
    }
}

//! Fitting a composite `background * resonator` model to a measurement.
//!
//! A [`ResonatorFitter`] exists only once its fit has converged: construction
//! guesses starting values, runs the least-squares engine, and estimates the
//! parameter uncertainties. A fit that fails to converge returns
//! [`ResonatorError::ConvergenceFailure`] and keeps nothing.
//!
//! ## Example Usage
//!
//! ```rust
//! use ndarray::Array1;
//! use num_complex::Complex64;
//! use resonator::fitter::ResonatorFitter;
//! use resonator::model::ResonatorParameters;
//! use resonator::models::shunt;
//!
//! let truth = ResonatorParameters::linear(5e9, 2e-5, 5e-5, 0.1);
//! let frequency = Array1::linspace(4.999e9, 5.001e9, 501);
//! let gain = Complex64::from_polar(0.7, 0.5);
//! let data = shunt(&frequency, &truth).unwrap() * gain;
//!
//! let fitter = ResonatorFitter::shunt(frequency, data, None).unwrap();
//! let fitted = fitter.resonator_parameters().unwrap();
//! assert!((fitted.coupling_loss / 5e-5 - 1.0).abs() < 1e-6);
//! ```

use crate::error::{check_lengths, ResonatorError, Result};
use crate::lm::{ConvergenceStatus, LeastSquaresSolver, LevenbergMarquardt, LmConfig};
use crate::model::{ModelProblem, ResonatorModel, ResonatorParameters, ResponseModel};
use crate::models::{ComplexConstant, Shunt, ShuntNonlinear};
use crate::nonlinear::ChooseRoot;
use crate::parameters::{Parameter, ParameterError, Parameters};
use crate::uncertainty::UncertaintyCalculator;
use crate::utils::finite_difference;
use log::{info, warn};
use ndarray::{Array1, Array2};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Number of points in the model curve of [`MeasurementModelResonance`]
/// unless a caller asks for another.
pub const DEFAULT_NUM_MODEL_POINTS: usize = 10000;

/// Changes applied to one guessed parameter before the fit starts.
///
/// Bounds are applied first, then the value, then the vary flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterOverride {
    pub value: Option<f64>,
    pub vary: Option<bool>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ParameterOverride {
    /// Start from `value` instead of the guess.
    pub fn value(value: f64) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }

    /// Hold the parameter at `value`.
    pub fn fixed(value: f64) -> Self {
        Self {
            value: Some(value),
            vary: Some(false),
            ..Self::default()
        }
    }

    /// Replace the guessed bounds.
    pub fn bounds(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            ..Self::default()
        }
    }

    fn apply(&self, param: &mut Parameter) -> std::result::Result<(), ParameterError> {
        if self.min.is_some() || self.max.is_some() {
            let min = self.min.unwrap_or_else(|| param.min());
            let max = self.max.unwrap_or_else(|| param.max());
            param.set_bounds(min, max)?;
        }
        if let Some(value) = self.value {
            param.set_value(value)?;
        }
        if let Some(vary) = self.vary {
            param.set_vary(vary);
        }
        Ok(())
    }
}

/// Options for [`ResonatorFitter::fit`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    /// Configuration of the Levenberg-Marquardt engine; its `epsilon` also
    /// sets the step of the Jacobian used for the uncertainties
    pub config: LmConfig,

    /// Overrides keyed by parameter name
    pub overrides: BTreeMap<String, ParameterOverride>,
}

impl FitOptions {
    /// Default engine configuration, no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given engine configuration.
    pub fn with_config(mut self, config: LmConfig) -> Self {
        self.config = config;
        self
    }

    /// Add or replace the override for `name`.
    pub fn with_override(mut self, name: &str, change: ParameterOverride) -> Self {
        self.overrides.insert(name.to_string(), change);
        self
    }

    /// Hold `name` at `value` during the fit.
    pub fn fix(self, name: &str, value: f64) -> Self {
        self.with_override(name, ParameterOverride::fixed(value))
    }

    fn apply(&self, params: &mut Parameters) -> Result<()> {
        for (name, change) in &self.overrides {
            let param = params
                .get_mut(name)
                .ok_or_else(|| ParameterError::ParameterNotFound { name: name.clone() })?;
            change.apply(param)?;
        }
        Ok(())
    }
}

/// Outcome of a converged fit.
#[derive(Debug, Clone)]
pub struct FitResult {
    /// Best-fit parameters of both models, with standard errors when the
    /// covariance could be estimated
    pub params: Parameters,

    /// Covariance of the varying parameters, in their order
    pub covariance: Option<Array2<f64>>,

    /// Correlation of the varying parameters
    pub correlation: Option<Array2<f64>>,

    /// Sum of squared weighted residuals
    pub chisqr: f64,

    /// `chisqr / max(ndata - nvarys, 1)`
    pub redchi: f64,

    /// Number of data values (two per point)
    pub ndata: usize,

    /// Number of varying parameters
    pub nvarys: usize,

    /// Engine iterations
    pub iterations: usize,

    /// Residual evaluations
    pub func_evals: usize,

    /// Why the engine stopped
    pub status: ConvergenceStatus,

    /// Engine message
    pub message: String,

    /// Composite model at the measured frequencies
    pub best_fit: Array1<Complex64>,

    /// Weighted residuals, real parts then imaginary parts
    pub residuals: Array1<f64>,
}

impl fmt::Display for FitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Fit Result:")?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  Iterations: {} ({} evaluations)", self.iterations, self.func_evals)?;
        writeln!(f, "  Chi-square: {:.6e} (reduced {:.6e})", self.chisqr, self.redchi)?;
        writeln!(f, "  Data values: {}, varying parameters: {}", self.ndata, self.nvarys)?;
        for param in self.params.iter() {
            match param.stderr() {
                Some(stderr) => {
                    writeln!(f, "  {} = {:.8e} +/- {:.2e}", param.name(), param.value(), stderr)?
                }
                None if param.vary() => writeln!(f, "  {} = {:.8e}", param.name(), param.value())?,
                None => writeln!(f, "  {} = {:.8e} (fixed)", param.name(), param.value())?,
            }
        }
        Ok(())
    }
}

/// The measurement, a dense model curve, and the model at resonance, ready
/// for plotting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementModelResonance {
    pub measurement_frequency: Array1<f64>,
    pub measurement_data: Array1<Complex64>,
    pub model_frequency: Array1<f64>,
    pub model_data: Array1<Complex64>,
    pub resonance_frequency: f64,
    pub resonance_data: Complex64,
    /// Whether every value was divided by the background model
    pub normalized: bool,
}

/// A converged fit of `background * foreground` to a measurement.
pub struct ResonatorFitter<F: ResonatorModel> {
    frequency: Array1<f64>,
    data: Array1<Complex64>,
    errors: Option<Array1<Complex64>>,
    foreground: F,
    background: Box<dyn ResponseModel>,
    result: FitResult,
}

impl<F: ResonatorModel> fmt::Debug for ResonatorFitter<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResonatorFitter")
            .field("foreground", &self.foreground.name())
            .field("background", &self.background.name())
            .field("points", &self.frequency.len())
            .field("result", &self.result)
            .finish()
    }
}

impl<F: ResonatorModel> ResonatorFitter<F> {
    /// Fit with the default Levenberg-Marquardt engine configured by `options`.
    pub fn fit(
        frequency: Array1<f64>,
        data: Array1<Complex64>,
        foreground: F,
        background: Box<dyn ResponseModel>,
        errors: Option<Array1<Complex64>>,
        options: &FitOptions,
    ) -> Result<Self> {
        let solver = LevenbergMarquardt::with_config(options.config.clone());
        Self::fit_with(frequency, data, foreground, background, errors, options, &solver)
    }

    /// Fit with any least-squares engine.
    ///
    /// The background is guessed from the raw data and the foreground from
    /// the data divided by the guessed background. `options.overrides` are
    /// applied to the merged guess before the engine starts.
    pub fn fit_with<S>(
        frequency: Array1<f64>,
        data: Array1<Complex64>,
        foreground: F,
        background: Box<dyn ResponseModel>,
        errors: Option<Array1<Complex64>>,
        options: &FitOptions,
        solver: &S,
    ) -> Result<Self>
    where
        S: LeastSquaresSolver + ?Sized,
    {
        check_lengths("data", frequency.len(), data.len())?;
        if let Some(errors) = &errors {
            check_lengths("errors", frequency.len(), errors.len())?;
        }

        let background_params = background.guess(&frequency, &data)?;
        let normalized = &data / &background.eval(&background_params, &frequency)?;
        let mut params = foreground.guess(&frequency, &normalized)?;
        params.extend(background_params)?;
        options.apply(&mut params)?;

        let result = Self::solve(
            &frequency,
            &data,
            errors.as_ref(),
            &foreground,
            background.as_ref(),
            params,
            options,
            solver,
        )?;

        Ok(Self {
            frequency,
            data,
            errors,
            foreground,
            background,
            result,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn solve<S>(
        frequency: &Array1<f64>,
        data: &Array1<Complex64>,
        errors: Option<&Array1<Complex64>>,
        foreground: &F,
        background: &dyn ResponseModel,
        params: Parameters,
        options: &FitOptions,
        solver: &S,
    ) -> Result<FitResult>
    where
        S: LeastSquaresSolver + ?Sized,
    {
        let problem = ModelProblem::new(foreground, background, frequency, data, errors, params)?;
        let start = problem.initial_internal()?;
        let outcome = solver.minimize(&problem, start)?;

        if !outcome.success {
            warn!(
                "{} x {} fit failed after {} iterations: {}",
                background.name(),
                foreground.name(),
                outcome.iterations,
                outcome.message
            );
            return Err(ResonatorError::ConvergenceFailure(format!(
                "{} after {} iterations",
                outcome.message, outcome.iterations
            )));
        }

        let mut fitted = problem.parameters_at(&outcome.params)?;
        let (ndata, nvarys) = (problem.ndata(), problem.nvarys());
        let calculator = UncertaintyCalculator::new(ndata, nvarys, outcome.cost);

        let mut covariance = None;
        let mut correlation = None;
        if nvarys > 0 {
            let jacobian = finite_difference::jacobian_from_base(
                &problem,
                &outcome.params,
                &outcome.residuals,
                Some(options.config.epsilon),
            )?;
            match calculator.analyze(&jacobian, &fitted, &outcome.params.to_vec()) {
                Ok(uncertainty) => {
                    for (name, stderr) in &uncertainty.standard_errors {
                        if let Some(param) = fitted.get_mut(name) {
                            param.set_stderr(Some(*stderr));
                        }
                    }
                    covariance = Some(uncertainty.covariance);
                    correlation = Some(uncertainty.correlation);
                }
                Err(e) => warn!("standard errors are unavailable: {}", e),
            }
        }

        let best_fit = problem.model_values(&fitted)?;
        info!(
            "{} x {} fit converged after {} iterations: chisqr {:.6e}, redchi {:.6e}",
            background.name(),
            foreground.name(),
            outcome.iterations,
            outcome.cost,
            calculator.redchi
        );

        Ok(FitResult {
            params: fitted,
            covariance,
            correlation,
            chisqr: outcome.cost,
            redchi: calculator.redchi,
            ndata,
            nvarys,
            iterations: outcome.iterations,
            func_evals: outcome.func_evals,
            status: outcome.status,
            message: outcome.message,
            best_fit,
            residuals: outcome.residuals,
        })
    }

    pub fn frequency(&self) -> &Array1<f64> {
        &self.frequency
    }

    pub fn data(&self) -> &Array1<Complex64> {
        &self.data
    }

    pub fn errors(&self) -> Option<&Array1<Complex64>> {
        self.errors.as_ref()
    }

    pub fn foreground(&self) -> &F {
        &self.foreground
    }

    pub fn background(&self) -> &dyn ResponseModel {
        self.background.as_ref()
    }

    pub fn result(&self) -> &FitResult {
        &self.result
    }

    /// Best-fit parameters of both models.
    pub fn parameters(&self) -> &Parameters {
        &self.result.params
    }

    /// Best-fit value of any parameter.
    pub fn value(&self, name: &str) -> Result<f64> {
        Ok(self.result.params.value(name)?)
    }

    /// Standard error of a parameter; `None` for fixed parameters and when
    /// the covariance could not be estimated.
    pub fn stderr(&self, name: &str) -> Option<f64> {
        self.result.params.get(name).and_then(Parameter::stderr)
    }

    /// The fitted physical parameters of the resonator.
    pub fn resonator_parameters(&self) -> Result<ResonatorParameters> {
        ResonatorParameters::from_parameters(&self.result.params)
    }

    pub fn resonance_frequency(&self) -> Result<f64> {
        Ok(self.resonator_parameters()?.resonance_frequency)
    }

    pub fn internal_loss(&self) -> Result<f64> {
        Ok(self.resonator_parameters()?.internal_loss)
    }

    pub fn coupling_loss(&self) -> Result<f64> {
        Ok(self.resonator_parameters()?.coupling_loss)
    }

    pub fn asymmetry(&self) -> Result<f64> {
        Ok(self.resonator_parameters()?.asymmetry)
    }

    /// Fitted Kerr drive; zero for a linear model.
    pub fn kxin(&self) -> Result<f64> {
        Ok(self.resonator_parameters()?.kxin)
    }

    /// `internal_loss + coupling_loss`
    pub fn total_loss(&self) -> Result<f64> {
        Ok(self.resonator_parameters()?.total_loss())
    }

    /// `1 / internal_loss`
    pub fn internal_quality_factor(&self) -> Result<f64> {
        Ok(1.0 / self.internal_loss()?)
    }

    /// `1 / coupling_loss`
    pub fn coupling_quality_factor(&self) -> Result<f64> {
        Ok(1.0 / self.coupling_loss()?)
    }

    /// `1 / total_loss`
    pub fn total_quality_factor(&self) -> Result<f64> {
        Ok(1.0 / self.total_loss()?)
    }

    /// Full width at half maximum in frequency units,
    /// `resonance_frequency * total_loss`.
    pub fn linewidth(&self) -> Result<f64> {
        let params = self.resonator_parameters()?;
        Ok(params.resonance_frequency * params.total_loss())
    }

    /// Composite model at the best-fit parameters.
    pub fn model(&self, frequency: &Array1<f64>) -> Result<Array1<Complex64>> {
        Ok(self.background_model(frequency)? * self.foreground_model(frequency)?)
    }

    /// Background model at the best-fit parameters.
    pub fn background_model(&self, frequency: &Array1<f64>) -> Result<Array1<Complex64>> {
        self.background.eval(&self.result.params, frequency)
    }

    /// Resonator model at the best-fit parameters.
    pub fn foreground_model(&self, frequency: &Array1<f64>) -> Result<Array1<Complex64>> {
        self.foreground.eval(&self.result.params, frequency)
    }

    /// Recover `(detuning, internal_loss)` from background-normalized
    /// scattering data using the fitted parameters.
    pub fn invert(
        &self,
        scattering_data: &Array1<Complex64>,
    ) -> Result<(Array1<f64>, Array1<f64>)> {
        self.foreground
            .invert(&self.resonator_parameters()?, scattering_data)
    }

    /// The measurement, the model on `num_model_points` evenly spaced
    /// frequencies spanning it, and the model at the fitted resonance
    /// frequency. With `normalize` each is divided by the background model at
    /// the same frequencies.
    pub fn measurement_model_resonance(
        &self,
        normalize: bool,
        num_model_points: usize,
    ) -> Result<MeasurementModelResonance> {
        if num_model_points == 0 {
            return Err(ResonatorError::InvalidInput(
                "the model curve needs at least one point".to_string(),
            ));
        }

        let (fmin, fmax) = self
            .frequency
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &f| {
                (lo.min(f), hi.max(f))
            });
        let model_frequency = Array1::linspace(fmin, fmax, num_model_points);
        let resonance_frequency = self.resonance_frequency()?;
        let at_resonance = Array1::from_elem(1, resonance_frequency);

        let mut measurement_data = self.data.clone();
        let mut model_data = self.model(&model_frequency)?;
        let mut resonance_data = self.model(&at_resonance)?[0];

        if normalize {
            measurement_data = measurement_data / self.background_model(&self.frequency)?;
            model_data = model_data / self.background_model(&model_frequency)?;
            resonance_data /= self.background_model(&at_resonance)?[0];
        }

        Ok(MeasurementModelResonance {
            measurement_frequency: self.frequency.clone(),
            measurement_data,
            model_frequency,
            model_data,
            resonance_frequency,
            resonance_data,
            normalized: normalize,
        })
    }
}

impl ResonatorFitter<Shunt> {
    /// Fit the linear shunt model with a complex-constant background.
    pub fn shunt(
        frequency: Array1<f64>,
        data: Array1<Complex64>,
        errors: Option<Array1<Complex64>>,
    ) -> Result<Self> {
        Self::fit(
            frequency,
            data,
            Shunt,
            Box::new(ComplexConstant),
            errors,
            &FitOptions::default(),
        )
    }
}

impl<C: ChooseRoot> ResonatorFitter<ShuntNonlinear<C>> {
    /// Fit the Kerr-nonlinear shunt model with a complex-constant background,
    /// following the branch selected by `choose`.
    pub fn shunt_nonlinear(
        frequency: Array1<f64>,
        data: Array1<Complex64>,
        errors: Option<Array1<Complex64>>,
        choose: C,
    ) -> Result<Self> {
        Self::fit(
            frequency,
            data,
            ShuntNonlinear::new(choose),
            Box::new(ComplexConstant),
            errors,
            &FitOptions::default(),
        )
    }
}

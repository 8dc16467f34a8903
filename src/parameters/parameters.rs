//! Ordered collection of named parameters.
//!
//! The order in which parameters are added is preserved; it defines the
//! order of the vector the optimizer works on.

use crate::parameters::parameter::{Parameter, ParameterError};
use serde::{Deserialize, Serialize};

/// A collection of parameters for a fit, looked up by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters {
    params: Vec<Parameter>,
}

impl Parameters {
    /// Create a new empty parameters collection
    ///
    /// # Examples
    ///
    /// ```
    /// use resonator::parameters::Parameters;
    ///
    /// let params = Parameters::new();
    /// assert_eq!(params.len(), 0);
    /// ```
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Add a parameter, failing if one with the same name already exists.
    pub fn add(&mut self, param: Parameter) -> Result<(), ParameterError> {
        if self.contains(param.name()) {
            return Err(ParameterError::DuplicateParameter {
                name: param.name().to_string(),
            });
        }
        self.params.push(param);
        Ok(())
    }

    /// Add a new unbounded parameter with the given name and value
    pub fn add_param(&mut self, name: &str, value: f64) -> Result<(), ParameterError> {
        self.add(Parameter::new(name, value))
    }

    /// Add a new bounded parameter with the given name, value, and bounds
    ///
    /// # Examples
    ///
    /// ```
    /// use resonator::parameters::Parameters;
    ///
    /// let mut params = Parameters::new();
    /// params.add_param_with_bounds("coupling_loss", 1e-4, 1e-12, 1.0).unwrap();
    /// assert_eq!(params.value("coupling_loss").unwrap(), 1e-4);
    /// ```
    pub fn add_param_with_bounds(
        &mut self,
        name: &str,
        value: f64,
        min: f64,
        max: f64,
    ) -> Result<(), ParameterError> {
        self.add(Parameter::with_bounds(name, value, min, max)?)
    }

    /// Append every parameter of `other`, failing on the first name clash.
    pub fn extend(&mut self, other: Parameters) -> Result<(), ParameterError> {
        for param in other.params {
            self.add(param)?;
        }
        Ok(())
    }

    /// Get a parameter by name
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name() == name)
    }

    /// Get a mutable reference to a parameter by name
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.params.iter_mut().find(|p| p.name() == name)
    }

    /// Get the value of a parameter by name.
    pub fn value(&self, name: &str) -> Result<f64, ParameterError> {
        self.get(name)
            .map(Parameter::value)
            .ok_or_else(|| ParameterError::ParameterNotFound {
                name: name.to_string(),
            })
    }

    /// Check if a parameter exists
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Get the number of parameters
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check if the collection is empty
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parameter names in insertion order.
    pub fn names(&self) -> Vec<String> {
        self.params.iter().map(|p| p.name().to_string()).collect()
    }

    /// Iterate over parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    /// Parameters the optimizer may vary, in insertion order.
    pub fn varying(&self) -> Vec<&Parameter> {
        self.params.iter().filter(|p| p.vary()).collect()
    }

    /// Number of parameters the optimizer may vary.
    pub fn varying_count(&self) -> usize {
        self.params.iter().filter(|p| p.vary()).count()
    }

    /// Internal (optimizer-domain) values of the varying parameters.
    pub fn varying_internal_values(&self) -> Result<Vec<f64>, ParameterError> {
        self.params
            .iter()
            .filter(|p| p.vary())
            .map(Parameter::to_internal)
            .collect()
    }

    /// Update the varying parameters from internal values, in order.
    ///
    /// # Examples
    ///
    /// ```
    /// use resonator::parameters::Parameters;
    ///
    /// let mut params = Parameters::new();
    /// params.add_param_with_bounds("asymmetry", 1.0, -10.0, 10.0).unwrap();
    /// params.add_param("resonance_frequency", 5e9).unwrap();
    /// params.get_mut("resonance_frequency").unwrap().set_vary(false);
    ///
    /// params.update_from_internal(&[0.0]).unwrap();
    /// assert!(params.value("asymmetry").unwrap().abs() < 1e-12);
    /// assert_eq!(params.value("resonance_frequency").unwrap(), 5e9);
    /// ```
    pub fn update_from_internal(&mut self, values: &[f64]) -> Result<(), ParameterError> {
        let expected = self.varying_count();
        if values.len() != expected {
            return Err(ParameterError::VaryingCountMismatch {
                expected,
                actual: values.len(),
            });
        }

        let varying = self.params.iter_mut().filter(|p| p.vary());
        for (param, &internal) in varying.zip(values) {
            let external = param.bounds().clamp(param.from_internal(internal));
            param.set_value(external)?;
        }

        Ok(())
    }

    /// Reset all parameters to their initial values
    pub fn reset(&mut self) {
        for param in self.params.iter_mut() {
            param.reset();
        }
    }

    /// Serialize the collection to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a collection from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

//! Parameter bounds and the Minuit-style transform used during fitting.
//!
//! The optimizer works with unbounded internal values; the transform maps
//! them onto the bounded external values that the resonator models see.

use serde::{Deserialize, Serialize};
use std::f64::{INFINITY, NEG_INFINITY};
use thiserror::Error;

/// Errors that can occur when working with parameter bounds
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    #[error("Invalid bounds: min ({min}) must not exceed max ({max})")]
    InvalidBounds { min: f64, max: f64 },

    #[error("Parameter value {value} is outside bounds: [{min}, {max}]")]
    ValueOutsideBounds { value: f64, min: f64, max: f64 },

    #[error("Non-finite parameter value is not allowed")]
    NonFiniteValue,
}

/// The closed interval a parameter value is confined to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Minimum allowed value for the parameter
    pub min: f64,

    /// Maximum allowed value for the parameter
    pub max: f64,
}

// JSON has no infinities, so an open side is written as null.
impl Serialize for Bounds {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Bounds", 2)?;
        state.serialize_field("min", &self.min.is_finite().then_some(self.min))?;
        state.serialize_field("max", &self.max.is_finite().then_some(self.max))?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for Bounds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct BoundsHelper {
            #[serde(default)]
            min: Option<f64>,

            #[serde(default)]
            max: Option<f64>,
        }

        let helper = BoundsHelper::deserialize(deserializer)?;
        Ok(Bounds {
            min: helper.min.unwrap_or(NEG_INFINITY),
            max: helper.max.unwrap_or(INFINITY),
        })
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: NEG_INFINITY,
            max: INFINITY,
        }
    }
}

impl Bounds {
    /// Create new bounds, failing if `min > max` or either side is NaN.
    ///
    /// # Examples
    ///
    /// ```
    /// use resonator::parameters::bounds::Bounds;
    ///
    /// let bounds = Bounds::new(1e-12, 1.0).unwrap();
    /// assert_eq!(bounds.min, 1e-12);
    /// assert_eq!(bounds.max, 1.0);
    /// assert!(Bounds::new(1.0, 0.0).is_err());
    /// ```
    pub fn new(min: f64, max: f64) -> Result<Self, BoundsError> {
        if min.is_nan() || max.is_nan() || min > max {
            return Err(BoundsError::InvalidBounds { min, max });
        }

        Ok(Self { min, max })
    }

    /// Bounds from negative to positive infinity.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Bounds with only a minimum value.
    pub fn min_only(min: f64) -> Self {
        Self { min, max: INFINITY }
    }

    /// Bounds with only a maximum value.
    pub fn max_only(max: f64) -> Self {
        Self {
            min: NEG_INFINITY,
            max,
        }
    }

    /// Check if a value lies within the bounds (inclusive).
    pub fn is_within_bounds(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Check if the parameter is bounded from below
    pub fn has_lower_bound(&self) -> bool {
        self.min.is_finite()
    }

    /// Check if the parameter is bounded from above
    pub fn has_upper_bound(&self) -> bool {
        self.max.is_finite()
    }

    /// Clamp a value into the bounds.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// Minuit-style transform between internal (unbounded) and external
/// (bounded) parameter values.
///
/// * two-sided: `external = min + (sin(internal) + 1) * (max - min) / 2`
/// * lower only: `external = min - 1 + sqrt(internal^2 + 1)`
/// * upper only: `external = max + 1 - sqrt(internal^2 + 1)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsTransform {
    bounds: Bounds,
}

impl BoundsTransform {
    /// Create a new bounds transform
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }

    /// Map an internal value onto the bounded external domain.
    pub fn to_external(&self, internal_value: f64) -> f64 {
        let b = &self.bounds;
        match (b.has_lower_bound(), b.has_upper_bound()) {
            (false, false) => internal_value,
            (true, false) => b.min - 1.0 + (internal_value * internal_value + 1.0).sqrt(),
            (false, true) => b.max + 1.0 - (internal_value * internal_value + 1.0).sqrt(),
            (true, true) => b.min + (internal_value.sin() + 1.0) * (b.max - b.min) / 2.0,
        }
    }

    /// Map an external value to the internal domain used by the optimizer.
    pub fn to_internal(&self, external_value: f64) -> Result<f64, BoundsError> {
        if !external_value.is_finite() {
            return Err(BoundsError::NonFiniteValue);
        }

        let b = &self.bounds;
        if !b.is_within_bounds(external_value) {
            return Err(BoundsError::ValueOutsideBounds {
                value: external_value,
                min: b.min,
                max: b.max,
            });
        }

        let internal = match (b.has_lower_bound(), b.has_upper_bound()) {
            (false, false) => external_value,
            (true, false) => ((external_value - b.min + 1.0).powi(2) - 1.0).sqrt(),
            (false, true) => ((b.max - external_value + 1.0).powi(2) - 1.0).sqrt(),
            (true, true) => {
                let scaled = 2.0 * (external_value - b.min) / (b.max - b.min) - 1.0;
                // Degenerate bounds (min == max) give 0/0.
                if scaled.is_nan() {
                    0.0
                } else {
                    scaled.clamp(-1.0, 1.0).asin()
                }
            }
        };

        Ok(internal)
    }

    /// Derivative of the external value with respect to the internal value.
    ///
    /// Used to carry covariance estimates from the internal domain back to
    /// the external parameters.
    pub fn external_derivative(&self, internal_value: f64) -> f64 {
        let b = &self.bounds;
        match (b.has_lower_bound(), b.has_upper_bound()) {
            (false, false) => 1.0,
            (true, false) => internal_value / (internal_value * internal_value + 1.0).sqrt(),
            (false, true) => -internal_value / (internal_value * internal_value + 1.0).sqrt(),
            (true, true) => (b.max - b.min) * internal_value.cos() / 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bounds_creation() {
        let bounds = Bounds::new(0.0, 10.0).unwrap();
        assert_eq!(bounds.min, 0.0);
        assert_eq!(bounds.max, 10.0);

        assert!(Bounds::new(10.0, 0.0).is_err());
        assert!(Bounds::new(f64::NAN, 0.0).is_err());

        let bounds = Bounds::unbounded();
        assert_eq!(bounds.min, NEG_INFINITY);
        assert_eq!(bounds.max, INFINITY);

        assert_eq!(Bounds::min_only(5.0).max, INFINITY);
        assert_eq!(Bounds::max_only(15.0).min, NEG_INFINITY);
    }

    #[test]
    fn test_is_within_bounds() {
        let bounds = Bounds::new(0.0, 10.0).unwrap();

        assert!(bounds.is_within_bounds(0.0));
        assert!(bounds.is_within_bounds(5.0));
        assert!(bounds.is_within_bounds(10.0));
        assert!(!bounds.is_within_bounds(-1.0));
        assert!(!bounds.is_within_bounds(11.0));
        assert!(!bounds.is_within_bounds(f64::NAN));
    }

    #[test]
    fn test_transform_round_trip() {
        let transforms = [
            BoundsTransform::new(Bounds::new(1e-12, 1.0).unwrap()),
            BoundsTransform::new(Bounds::new(-10.0, 10.0).unwrap()),
            BoundsTransform::new(Bounds::min_only(0.0)),
            BoundsTransform::new(Bounds::max_only(2.0)),
            BoundsTransform::new(Bounds::unbounded()),
        ];

        for transform in transforms.iter() {
            for &value in &[1e-4, 0.3, 0.999] {
                let internal = transform.to_internal(value).unwrap();
                assert_relative_eq!(transform.to_external(internal), value, max_relative = 1e-9);
            }
        }
    }

    #[test]
    fn test_to_internal_rejects_out_of_bounds() {
        let transform = BoundsTransform::new(Bounds::new(0.0, 1.0).unwrap());
        assert!(matches!(
            transform.to_internal(2.0),
            Err(BoundsError::ValueOutsideBounds { .. })
        ));
        assert_eq!(
            transform.to_internal(f64::INFINITY),
            Err(BoundsError::NonFiniteValue)
        );
    }

    #[test]
    fn test_external_derivative_matches_finite_difference() {
        let transform = BoundsTransform::new(Bounds::new(-10.0, 10.0).unwrap());
        let internal = 0.4;
        let h = 1e-7;
        let numeric =
            (transform.to_external(internal + h) - transform.to_external(internal - h)) / (2.0 * h);
        assert_relative_eq!(
            transform.external_derivative(internal),
            numeric,
            max_relative = 1e-6
        );

        let lower = BoundsTransform::new(Bounds::min_only(1.0));
        let numeric = (lower.to_external(internal + h) - lower.to_external(internal - h)) / (2.0 * h);
        assert_relative_eq!(lower.external_derivative(internal), numeric, max_relative = 1e-6);
    }

    #[test]
    fn test_serialization_of_open_bounds() {
        let json = serde_json::to_string(&Bounds::min_only(1e-12)).unwrap();
        assert_eq!(json, r#"{"min":1e-12,"max":null}"#);

        let bounds: Bounds = serde_json::from_str(&json).unwrap();
        assert_eq!(bounds.min, 1e-12);
        assert_eq!(bounds.max, INFINITY);
    }
}

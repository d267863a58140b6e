//! Tagged real values.
//!
//! Derived quantities (probabilities, information content, similarity,
//! log-likelihood) can be mathematically undefined for some inputs. Those
//! cases are carried as an [`Undefined`] reason instead of `NaN`, so callers
//! can tell them apart from a genuine zero.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a derived value has no finite result.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Undefined {
    #[error("corpus total is zero")]
    EmptyCorpus,

    #[error("probability is zero")]
    ZeroProbability,

    #[error("information content is zero")]
    ZeroInformation,

    #[error("denominator is zero")]
    ZeroDenominator,

    #[error("depends on an undefined value")]
    UndefinedOperand,
}

/// A finite real, or the reason it is undefined.
pub type Measure = std::result::Result<f64, Undefined>;

/// Rejects non-finite results, tagging them with `reason`.
#[inline]
pub fn finite(value: f64, reason: Undefined) -> Measure {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finite_passes_values_through() {
        assert_eq!(finite(0.0, Undefined::ZeroDenominator), Ok(0.0));
        assert_eq!(finite(-2.5, Undefined::ZeroDenominator), Ok(-2.5));
    }

    #[test]
    fn test_finite_tags_nan_and_infinity() {
        assert_eq!(
            finite(f64::NAN, Undefined::ZeroProbability),
            Err(Undefined::ZeroProbability)
        );
        assert_eq!(
            finite(f64::INFINITY, Undefined::ZeroInformation),
            Err(Undefined::ZeroInformation)
        );
    }
}

//! 数値データ型制約と区間充足可能性

use fukurow_owl::model::{vocabulary, DataRange};
use fukurow_owl::OwlError;
use serde::{Deserialize, Serialize};

/// Numeric value space, ordered by inclusion (N ⊂ Z ⊂ R)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NumericDomain {
    Natural,
    Integer,
    Real,
}

impl NumericDomain {
    fn contains(self, value: f64) -> bool {
        match self {
            Self::Real => value.is_finite(),
            Self::Integer => value.is_finite() && value.fract() == 0.0,
            Self::Natural => value.is_finite() && value.fract() == 0.0 && value >= 0.0,
        }
    }
}

/// A single restriction descriptor consumed by [`DatatypeChecker`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DatatypeRestriction {
    Domain(NumericDomain),
    MinInclusive(f64),
    MinExclusive(f64),
    MaxInclusive(f64),
    MaxExclusive(f64),
    Equals(f64),
}

/// Translate a data range of the axiom model into restriction descriptors
pub fn parse_range(range: &DataRange) -> Result<Vec<DatatypeRestriction>, OwlError> {
    let mut restrictions = Vec::with_capacity(range.facets.len() + 2);

    let datatype = range.datatype.as_str();
    let local = datatype
        .strip_prefix(vocabulary::XSD)
        .or_else(|| datatype.strip_prefix(vocabulary::OWL))
        .ok_or_else(|| OwlError::UnsupportedFeature(format!("datatype {}", datatype)))?;

    match local {
        "integer" | "int" | "long" | "short" | "byte" => {
            restrictions.push(DatatypeRestriction::Domain(NumericDomain::Integer));
        }
        "nonNegativeInteger" | "unsignedLong" | "unsignedInt" | "unsignedShort" | "unsignedByte" => {
            restrictions.push(DatatypeRestriction::Domain(NumericDomain::Natural));
        }
        "positiveInteger" => {
            restrictions.push(DatatypeRestriction::Domain(NumericDomain::Natural));
            restrictions.push(DatatypeRestriction::MinExclusive(0.0));
        }
        "nonPositiveInteger" => {
            restrictions.push(DatatypeRestriction::Domain(NumericDomain::Integer));
            restrictions.push(DatatypeRestriction::MaxInclusive(0.0));
        }
        "negativeInteger" => {
            restrictions.push(DatatypeRestriction::Domain(NumericDomain::Integer));
            restrictions.push(DatatypeRestriction::MaxExclusive(0.0));
        }
        "decimal" | "double" | "float" | "real" | "rational" => {
            restrictions.push(DatatypeRestriction::Domain(NumericDomain::Real));
        }
        _ => {
            return Err(OwlError::UnsupportedFeature(format!("datatype {}", datatype)));
        }
    }

    for facet in &range.facets {
        let value: f64 = facet
            .value
            .trim()
            .parse()
            .map_err(|_| OwlError::InvalidAxiom(format!("non-numeric facet value '{}'", facet.value)))?;
        if value.is_nan() {
            return Err(OwlError::InvalidAxiom("NaN facet value".to_string()));
        }

        let restriction = match facet.facet.as_str() {
            vocabulary::XSD_MIN_INCLUSIVE => DatatypeRestriction::MinInclusive(value),
            vocabulary::XSD_MIN_EXCLUSIVE => DatatypeRestriction::MinExclusive(value),
            vocabulary::XSD_MAX_INCLUSIVE => DatatypeRestriction::MaxInclusive(value),
            vocabulary::XSD_MAX_EXCLUSIVE => DatatypeRestriction::MaxExclusive(value),
            vocabulary::OWL_HAS_VALUE => DatatypeRestriction::Equals(value),
            other => return Err(OwlError::UnsupportedFeature(format!("facet {}", other))),
        };
        restrictions.push(restriction);
    }

    Ok(restrictions)
}

/// Satisfiability predicate for conjunctions of datatype restrictions
pub trait DatatypeChecker: Send + Sync {
    fn is_satisfiable(&self, restrictions: &[DatatypeRestriction]) -> bool;

    /// Whether every value admitted by `sub` is admitted by `sup`
    fn is_subsumed(&self, sub: &[DatatypeRestriction], sup: &[DatatypeRestriction]) -> bool;
}

/// Checker over closed numeric intervals
#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalChecker;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bound {
    value: f64,
    exclusive: bool,
}

/// Normalised interval: both ends inclusive, empty when `lower > upper`
#[derive(Debug, Clone, Copy, PartialEq)]
struct Interval {
    domain: NumericDomain,
    lower: f64,
    upper: f64,
}

impl Interval {
    fn from_restrictions(restrictions: &[DatatypeRestriction]) -> Self {
        let mut domain = NumericDomain::Real;
        let mut lower = Bound { value: f64::NEG_INFINITY, exclusive: false };
        let mut upper = Bound { value: f64::INFINITY, exclusive: false };

        let tighten_lower = |bound: Bound, lower: &mut Bound| {
            if bound.value > lower.value || (bound.value == lower.value && bound.exclusive) {
                *lower = bound;
            }
        };
        let tighten_upper = |bound: Bound, upper: &mut Bound| {
            if bound.value < upper.value || (bound.value == upper.value && bound.exclusive) {
                *upper = bound;
            }
        };

        for restriction in restrictions {
            match *restriction {
                DatatypeRestriction::Domain(d) => domain = domain.min(d),
                DatatypeRestriction::MinInclusive(v) => tighten_lower(Bound { value: v, exclusive: false }, &mut lower),
                DatatypeRestriction::MinExclusive(v) => tighten_lower(Bound { value: v, exclusive: true }, &mut lower),
                DatatypeRestriction::MaxInclusive(v) => tighten_upper(Bound { value: v, exclusive: false }, &mut upper),
                DatatypeRestriction::MaxExclusive(v) => tighten_upper(Bound { value: v, exclusive: true }, &mut upper),
                DatatypeRestriction::Equals(v) => {
                    tighten_lower(Bound { value: v, exclusive: false }, &mut lower);
                    tighten_upper(Bound { value: v, exclusive: false }, &mut upper);
                }
            }
        }
        if domain == NumericDomain::Natural {
            tighten_lower(Bound { value: 0.0, exclusive: false }, &mut lower);
        }

        let (lower, upper) = match domain {
            NumericDomain::Real => (
                if lower.exclusive { next_up(lower.value) } else { lower.value },
                if upper.exclusive { next_down(upper.value) } else { upper.value },
            ),
            NumericDomain::Integer | NumericDomain::Natural => (
                if lower.exclusive { lower.value.floor() + 1.0 } else { lower.value.ceil() },
                if upper.exclusive { upper.value.ceil() - 1.0 } else { upper.value.floor() },
            ),
        };

        Self { domain, lower, upper }
    }

    fn is_empty(&self) -> bool {
        self.lower > self.upper
    }

    fn contains(&self, other: &Interval) -> bool {
        if other.is_empty() {
            return true;
        }
        if self.is_empty() || other.lower < self.lower || other.upper > self.upper {
            return false;
        }
        other.domain <= self.domain || (other.lower == other.upper && self.domain.contains(other.lower))
    }
}

impl DatatypeChecker for IntervalChecker {
    fn is_satisfiable(&self, restrictions: &[DatatypeRestriction]) -> bool {
        !Interval::from_restrictions(restrictions).is_empty()
    }

    fn is_subsumed(&self, sub: &[DatatypeRestriction], sup: &[DatatypeRestriction]) -> bool {
        Interval::from_restrictions(sup).contains(&Interval::from_restrictions(sub))
    }
}

/// Smallest float strictly greater than `x`
fn next_up(x: f64) -> f64 {
    if x.is_nan() || x == f64::INFINITY {
        return x;
    }
    if x == 0.0 {
        return f64::from_bits(1);
    }
    let bits = x.to_bits();
    if x > 0.0 {
        f64::from_bits(bits + 1)
    } else {
        f64::from_bits(bits - 1)
    }
}

fn next_down(x: f64) -> f64 {
    -next_up(-x)
}

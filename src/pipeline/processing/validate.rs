use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

use crate::constants::{DEFAULT_INVALID_EXAMPLE_LIMIT, DEFAULT_MAX_ELEVATION, DEFAULT_MIN_ELEVATION};
use crate::domain::{Category, CategoryMap, Element};
use crate::observability::metrics;

/// Inclusive plausibility band in metres
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevationRange {
    pub min: f64,
    pub max: f64,
}

impl Default for ElevationRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_ELEVATION,
            max: DEFAULT_MAX_ELEVATION,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InvalidReason {
    NoElevationData,
    BelowMinimum { elevation: f64, minimum: f64 },
    AboveMaximum { elevation: f64, maximum: f64 },
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReason::NoElevationData => f.write_str("No elevation data"),
            InvalidReason::BelowMinimum { elevation, minimum } => {
                write!(f, "Elevation {}m below minimum {}m", elevation, minimum)
            }
            InvalidReason::AboveMaximum { elevation, maximum } => {
                write!(f, "Elevation {}m above maximum {}m", elevation, maximum)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Valid,
    Invalid(Vec<InvalidReason>),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }

    pub fn reasons(&self) -> &[InvalidReason] {
        match self {
            ValidationOutcome::Valid => &[],
            ValidationOutcome::Invalid(reasons) => reasons,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvalidElement {
    pub element: Element,
    pub outcome: ValidationOutcome,
}

/// Valid/invalid partition of one category, input order kept in both halves
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub valid: Vec<Element>,
    pub invalid: Vec<InvalidElement>,
}

/// Per-category entry of the validated snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatedCategory {
    pub valid_count: usize,
    pub invalid_count: usize,
    pub valid_elements: Vec<Element>,
}

impl From<ValidationReport> for ValidatedCategory {
    fn from(report: ValidationReport) -> Self {
        Self {
            valid_count: report.valid.len(),
            invalid_count: report.invalid.len(),
            valid_elements: report.valid,
        }
    }
}

pub struct ElevationValidator {
    range: ElevationRange,
    example_limit: usize,
}

impl Default for ElevationValidator {
    fn default() -> Self {
        Self::new(ElevationRange::default(), DEFAULT_INVALID_EXAMPLE_LIMIT)
    }
}

impl ElevationValidator {
    pub fn new(range: ElevationRange, example_limit: usize) -> Self {
        Self {
            range,
            example_limit,
        }
    }

    pub fn range(&self) -> ElevationRange {
        self.range
    }

    pub fn validate_one(&self, element: &Element) -> ValidationOutcome {
        let Some(elevation) = element.fetched_elevation() else {
            return ValidationOutcome::Invalid(vec![InvalidReason::NoElevationData]);
        };

        if elevation < self.range.min {
            ValidationOutcome::Invalid(vec![InvalidReason::BelowMinimum {
                elevation,
                minimum: self.range.min,
            }])
        } else if elevation > self.range.max {
            ValidationOutcome::Invalid(vec![InvalidReason::AboveMaximum {
                elevation,
                maximum: self.range.max,
            }])
        } else {
            ValidationOutcome::Valid
        }
    }

    pub fn validate_many(&self, elements: &[Element]) -> ValidationReport {
        let mut report = ValidationReport::default();
        for element in elements {
            match self.validate_one(element) {
                ValidationOutcome::Valid => report.valid.push(element.clone()),
                outcome => report.invalid.push(InvalidElement {
                    element: element.clone(),
                    outcome,
                }),
            }
        }
        report
    }

    /// Validate every category and log a capped sample of invalid reasons
    pub fn validate_all(&self, enriched: &CategoryMap<Vec<Element>>) -> CategoryMap<ValidationReport> {
        enriched.map(|category, elements| {
            let report = self.validate_many(elements);
            self.log_summary(category, &report);
            report
        })
    }

    fn log_summary(&self, category: Category, report: &ValidationReport) {
        if report.valid.is_empty() && report.invalid.is_empty() {
            return;
        }
        for _ in &report.valid {
            metrics::validate::element_classified(category.as_str(), true);
        }
        for _ in &report.invalid {
            metrics::validate::element_classified(category.as_str(), false);
        }

        info!(
            "{}: {} valid, {} invalid",
            category.label(),
            report.valid.len(),
            report.invalid.len()
        );
        for invalid in report.invalid.iter().take(self.example_limit) {
            let reasons: Vec<String> = invalid.outcome.reasons().iter().map(ToString::to_string).collect();
            warn!(
                "  {} {}: {}",
                invalid.element.kind(),
                invalid.element.id,
                reasons.join("; ")
            );
        }
        let hidden = report.invalid.len().saturating_sub(self.example_limit);
        if hidden > 0 {
            warn!("  ... and {} more", hidden);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Coordinates;

    fn located(id: i64) -> Element {
        Element::point(id, Some(Coordinates::new(45.5, 25.45)))
    }

    #[test]
    fn test_missing_fetched_elevation_is_no_data() {
        // a hand-set ele tag does not count
        let element = located(1).with_tag("ele", "500");
        let outcome = ElevationValidator::default().validate_one(&element);
        assert_eq!(outcome, ValidationOutcome::Invalid(vec![InvalidReason::NoElevationData]));
        assert_eq!(outcome.reasons()[0].to_string(), "No elevation data");
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let validator = ElevationValidator::default();
        assert!(validator.validate_one(&located(1).with_elevation(0.0)).is_valid());
        assert!(validator.validate_one(&located(2).with_elevation(2600.0)).is_valid());
        assert!(!validator.validate_one(&located(3).with_elevation(2600.1)).is_valid());
    }

    #[test]
    fn test_one_decimal_below_minimum_is_rejected() {
        let validator = ElevationValidator::new(ElevationRange { min: 100.0, max: 200.0 }, 3);
        let outcome = validator.validate_one(&located(1).with_elevation(99.9));
        assert_eq!(
            outcome.reasons()[0].to_string(),
            "Elevation 99.9m below minimum 100m"
        );
    }

    #[test]
    fn test_above_maximum_reason_text() {
        let outcome = ElevationValidator::default().validate_one(&located(7).with_elevation(3000.0));
        assert_eq!(
            outcome.reasons()[0].to_string(),
            "Elevation 3000m above maximum 2600m"
        );
    }

    #[test]
    fn test_validate_many_preserves_order() {
        let elements = vec![
            located(1).with_elevation(100.0),
            located(2),
            located(3).with_elevation(200.0),
            located(4).with_elevation(-5.0),
        ];

        let report = ElevationValidator::default().validate_many(&elements);

        assert_eq!(report.valid.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(
            report.invalid.iter().map(|i| i.element.id).collect::<Vec<_>>(),
            vec![2, 4]
        );
        assert!(report.invalid.iter().all(|i| !i.outcome.is_valid()));
    }

    #[test]
    fn test_revalidating_valid_elements_is_stable() {
        let validator = ElevationValidator::default();
        let enriched = CategoryMap {
            train_stations: vec![located(1).with_elevation(850.3), located(2)],
            alpine_huts: vec![located(3).with_elevation(1800.0)],
            other_accommodations: vec![],
        };

        let first = validator.validate_all(&enriched);
        let valid_only = first.map(|_, report| report.valid.clone());
        let second = validator.validate_all(&valid_only);

        assert_eq!(second.map(|_, r| r.valid.clone()), valid_only);
        assert!(second.iter().all(|(_, r)| r.invalid.is_empty()));
    }

    #[test]
    fn test_validated_category_counts() {
        let report = ElevationValidator::default()
            .validate_many(&[located(1).with_elevation(10.0), located(2)]);
        let validated = ValidatedCategory::from(report);
        assert_eq!(validated.valid_count, 1);
        assert_eq!(validated.invalid_count, 1);
        assert_eq!(validated.valid_elements.len(), 1);
    }
}

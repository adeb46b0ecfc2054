//! Scenario Kernel: Derived Indices
//!
//! The two headline scalars. Every consumer (rules, reports, run history)
//! goes through these functions; nothing re-derives the weights.

use crate::arithmetic::{finite_or_zero, normalized_adoption};
use crate::domain::{MeasuredMetrics, Metrics, UnmeasuredMetrics};

pub const MSI_EFFICIENCY_WEIGHT: f64 = 0.3;
pub const MSI_ADOPTION_WEIGHT: f64 = 0.3;
pub const MSI_COST_WEIGHT: f64 = 0.2;
pub const MSI_INCIDENT_WEIGHT: f64 = 0.2;

pub const GDI_DEBT_WEIGHT: f64 = 0.25;
pub const GDI_GAP_WEIGHT: f64 = 0.25;
pub const GDI_CAPTURE_WEIGHT: f64 = 0.15;
pub const GDI_KNOWLEDGE_WEIGHT: f64 = 0.15;
pub const GDI_IRREVERSIBILITY_WEIGHT: f64 = 0.2;

/// Measured Success Index. Higher is better.
///
/// Adoption is normalised by 3 and capped at 1 before weighting.
pub fn measured_success_index(measured: &MeasuredMetrics) -> f64 {
    finite_or_zero(measured.production_efficiency) * MSI_EFFICIENCY_WEIGHT
        + normalized_adoption(measured.welfare_standard_adoption) * MSI_ADOPTION_WEIGHT
        + (1.0 - finite_or_zero(measured.cost_per_unit)) * MSI_COST_WEIGHT
        + (1.0 - finite_or_zero(measured.welfare_incident_rate)) * MSI_INCIDENT_WEIGHT
}

/// Governance Debt Index. Higher is worse.
pub fn governance_debt_index(unmeasured: &UnmeasuredMetrics) -> f64 {
    finite_or_zero(unmeasured.welfare_debt) * GDI_DEBT_WEIGHT
        + finite_or_zero(unmeasured.enforcement_gap) * GDI_GAP_WEIGHT
        + finite_or_zero(unmeasured.regulatory_capture) * GDI_CAPTURE_WEIGHT
        + finite_or_zero(unmeasured.sentience_knowledge_gap) * GDI_KNOWLEDGE_WEIGHT
        + finite_or_zero(unmeasured.system_irreversibility) * GDI_IRREVERSIBILITY_WEIGHT
}

/// Both indices for a metrics snapshot, `(msi, gdi)`.
pub fn indices(metrics: &Metrics) -> (f64, f64) {
    (
        measured_success_index(&metrics.measured),
        governance_debt_index(&metrics.unmeasured),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arithmetic::approx_eq;

    #[test]
    fn test_weights_sum_to_one() {
        let msi = MSI_EFFICIENCY_WEIGHT + MSI_ADOPTION_WEIGHT + MSI_COST_WEIGHT + MSI_INCIDENT_WEIGHT;
        let gdi = GDI_DEBT_WEIGHT
            + GDI_GAP_WEIGHT
            + GDI_CAPTURE_WEIGHT
            + GDI_KNOWLEDGE_WEIGHT
            + GDI_IRREVERSIBILITY_WEIGHT;
        assert!(approx_eq(msi, 1.0, 1e-12));
        assert!(approx_eq(gdi, 1.0, 1e-12));
    }

    #[test]
    fn test_msi_baseline_example() {
        let m = MeasuredMetrics {
            production_efficiency: 0.5,
            cost_per_unit: 0.3,
            welfare_incident_rate: 0.1,
            welfare_standard_adoption: 0.5,
        };
        assert!(approx_eq(measured_success_index(&m), 0.52, 1e-9));
    }

    #[test]
    fn test_gdi_baseline_example() {
        let u = UnmeasuredMetrics {
            welfare_debt: 0.1,
            enforcement_gap: 0.1,
            regulatory_capture: 0.2,
            sentience_knowledge_gap: 0.2,
            system_irreversibility: 0.1,
        };
        assert!(approx_eq(governance_debt_index(&u), 0.13, 1e-9));
    }

    #[test]
    fn test_adoption_above_cap_scores_as_cap() {
        let mut m = MeasuredMetrics {
            production_efficiency: 1.0,
            cost_per_unit: 0.0,
            welfare_incident_rate: 0.0,
            welfare_standard_adoption: 3.0,
        };
        assert!(approx_eq(measured_success_index(&m), 1.0, 1e-12));
        m.welfare_standard_adoption = 7.0;
        assert!(approx_eq(measured_success_index(&m), 1.0, 1e-12));
    }

    #[test]
    fn test_non_finite_reads_as_zero() {
        let u = UnmeasuredMetrics {
            welfare_debt: f64::NAN,
            ..UnmeasuredMetrics::default()
        };
        assert_eq!(governance_debt_index(&u), 0.0);
    }
}

//! Scenario Kernel: Core Domain Types
//!
//! Pure data. No transition logic.
//! Serialized with camelCase keys so persisted state keeps the shape the
//! presentation layer already reads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::arithmetic::{clamp_range, ADOPTION_CAP, UNIT_MAX, UNIT_MIN};

// ── Metric keys ────────────────────────────────────────────────────

/// Closed set of "measured" metric names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MeasuredKey {
    ProductionEfficiency,
    CostPerUnit,
    WelfareIncidentRate,
    WelfareStandardAdoption,
}

impl MeasuredKey {
    pub const ALL: [MeasuredKey; 4] = [
        MeasuredKey::ProductionEfficiency,
        MeasuredKey::CostPerUnit,
        MeasuredKey::WelfareIncidentRate,
        MeasuredKey::WelfareStandardAdoption,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MeasuredKey::ProductionEfficiency => "productionEfficiency",
            MeasuredKey::CostPerUnit => "costPerUnit",
            MeasuredKey::WelfareIncidentRate => "welfareIncidentRate",
            MeasuredKey::WelfareStandardAdoption => "welfareStandardAdoption",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MeasuredKey::ProductionEfficiency => "Production Efficiency",
            MeasuredKey::CostPerUnit => "Cost Per Unit",
            MeasuredKey::WelfareIncidentRate => "Welfare Incident Rate",
            MeasuredKey::WelfareStandardAdoption => "Welfare Standard Adoption",
        }
    }

    pub fn higher_is_better(&self) -> bool {
        matches!(
            self,
            MeasuredKey::ProductionEfficiency | MeasuredKey::WelfareStandardAdoption
        )
    }

    pub fn upper_bound(&self) -> f64 {
        match self {
            MeasuredKey::WelfareStandardAdoption => ADOPTION_CAP,
            _ => UNIT_MAX,
        }
    }
}

/// Closed set of "unmeasured" (governance debt) metric names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnmeasuredKey {
    WelfareDebt,
    EnforcementGap,
    RegulatoryCapture,
    SentienceKnowledgeGap,
    SystemIrreversibility,
}

impl UnmeasuredKey {
    pub const ALL: [UnmeasuredKey; 5] = [
        UnmeasuredKey::WelfareDebt,
        UnmeasuredKey::EnforcementGap,
        UnmeasuredKey::RegulatoryCapture,
        UnmeasuredKey::SentienceKnowledgeGap,
        UnmeasuredKey::SystemIrreversibility,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UnmeasuredKey::WelfareDebt => "welfareDebt",
            UnmeasuredKey::EnforcementGap => "enforcementGap",
            UnmeasuredKey::RegulatoryCapture => "regulatoryCapture",
            UnmeasuredKey::SentienceKnowledgeGap => "sentienceKnowledgeGap",
            UnmeasuredKey::SystemIrreversibility => "systemIrreversibility",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UnmeasuredKey::WelfareDebt => "Welfare Debt",
            UnmeasuredKey::EnforcementGap => "Enforcement Gap",
            UnmeasuredKey::RegulatoryCapture => "Regulatory Capture",
            UnmeasuredKey::SentienceKnowledgeGap => "Sentience Knowledge Gap",
            UnmeasuredKey::SystemIrreversibility => "System Irreversibility",
        }
    }

    /// Phrase used in the per-decision "what we did not measure" sentence.
    pub fn impact_noun(&self) -> &'static str {
        match self {
            UnmeasuredKey::WelfareDebt => "welfare debt",
            UnmeasuredKey::EnforcementGap => "enforcement gap",
            UnmeasuredKey::RegulatoryCapture => "regulatory capture",
            UnmeasuredKey::SentienceKnowledgeGap => "knowledge gaps about animal sentience",
            UnmeasuredKey::SystemIrreversibility => "system irreversibility",
        }
    }
}

/// Any metric field, measured or unmeasured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetricField {
    Measured(MeasuredKey),
    Unmeasured(UnmeasuredKey),
}

impl MetricField {
    /// All nine fields, measured first, in declaration order.
    pub fn all() -> impl Iterator<Item = MetricField> {
        MeasuredKey::ALL
            .into_iter()
            .map(MetricField::Measured)
            .chain(UnmeasuredKey::ALL.into_iter().map(MetricField::Unmeasured))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricField::Measured(k) => k.as_str(),
            MetricField::Unmeasured(k) => k.as_str(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MetricField::Measured(k) => k.label(),
            MetricField::Unmeasured(k) => k.label(),
        }
    }

    /// Unmeasured metrics are all "lower is better".
    pub fn higher_is_better(&self) -> bool {
        match self {
            MetricField::Measured(k) => k.higher_is_better(),
            MetricField::Unmeasured(_) => false,
        }
    }

    pub fn upper_bound(&self) -> f64 {
        match self {
            MetricField::Measured(k) => k.upper_bound(),
            MetricField::Unmeasured(_) => UNIT_MAX,
        }
    }

    pub fn clamp_value(&self, value: f64) -> f64 {
        clamp_range(value, UNIT_MIN, self.upper_bound())
    }
}

// ── Metrics ────────────────────────────────────────────────────────

/// Outcomes visible to in-universe institutions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MeasuredMetrics {
    pub production_efficiency: f64,
    pub cost_per_unit: f64,
    pub welfare_incident_rate: f64,
    /// `[0, 3]`, normalised only when scored.
    pub welfare_standard_adoption: f64,
}

impl MeasuredMetrics {
    pub fn get(&self, key: MeasuredKey) -> f64 {
        match key {
            MeasuredKey::ProductionEfficiency => self.production_efficiency,
            MeasuredKey::CostPerUnit => self.cost_per_unit,
            MeasuredKey::WelfareIncidentRate => self.welfare_incident_rate,
            MeasuredKey::WelfareStandardAdoption => self.welfare_standard_adoption,
        }
    }

    pub fn set(&mut self, key: MeasuredKey, value: f64) {
        let slot = match key {
            MeasuredKey::ProductionEfficiency => &mut self.production_efficiency,
            MeasuredKey::CostPerUnit => &mut self.cost_per_unit,
            MeasuredKey::WelfareIncidentRate => &mut self.welfare_incident_rate,
            MeasuredKey::WelfareStandardAdoption => &mut self.welfare_standard_adoption,
        };
        *slot = value;
    }
}

/// Hidden, compounding costs. Every field in `[0, 1]`, higher is worse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UnmeasuredMetrics {
    pub welfare_debt: f64,
    pub enforcement_gap: f64,
    pub regulatory_capture: f64,
    pub sentience_knowledge_gap: f64,
    pub system_irreversibility: f64,
}

impl UnmeasuredMetrics {
    pub fn get(&self, key: UnmeasuredKey) -> f64 {
        match key {
            UnmeasuredKey::WelfareDebt => self.welfare_debt,
            UnmeasuredKey::EnforcementGap => self.enforcement_gap,
            UnmeasuredKey::RegulatoryCapture => self.regulatory_capture,
            UnmeasuredKey::SentienceKnowledgeGap => self.sentience_knowledge_gap,
            UnmeasuredKey::SystemIrreversibility => self.system_irreversibility,
        }
    }

    pub fn set(&mut self, key: UnmeasuredKey, value: f64) {
        let slot = match key {
            UnmeasuredKey::WelfareDebt => &mut self.welfare_debt,
            UnmeasuredKey::EnforcementGap => &mut self.enforcement_gap,
            UnmeasuredKey::RegulatoryCapture => &mut self.regulatory_capture,
            UnmeasuredKey::SentienceKnowledgeGap => &mut self.sentience_knowledge_gap,
            UnmeasuredKey::SystemIrreversibility => &mut self.system_irreversibility,
        };
        *slot = value;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Metrics {
    pub measured: MeasuredMetrics,
    pub unmeasured: UnmeasuredMetrics,
}

impl Metrics {
    pub fn get(&self, field: MetricField) -> f64 {
        match field {
            MetricField::Measured(k) => self.measured.get(k),
            MetricField::Unmeasured(k) => self.unmeasured.get(k),
        }
    }

    pub fn set(&mut self, field: MetricField, value: f64) {
        match field {
            MetricField::Measured(k) => self.measured.set(k, value),
            MetricField::Unmeasured(k) => self.unmeasured.set(k, value),
        }
    }
}

// ── Adjustments (choice deltas, great-person and wonder effects) ──

/// Partial additive changes to the metric groups. Absent keys are no-ops.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricsAdjustment {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub measured: BTreeMap<MeasuredKey, f64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub unmeasured: BTreeMap<UnmeasuredKey, f64>,
}

/// Ring spawn request carried by a delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RingSpawn {
    pub lat: f64,
    pub lng: f64,
    pub event_type: RingEventType,
    pub ttl: u32,
}

/// Map-side part of an adjustment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapAdjustment {
    /// Additive per-region changes keyed by ISO-3 code.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub region_values: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub activate_arcs: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub activate_hubs: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub spawn_rings: Vec<RingSpawn>,
}

/// One additive adjustment bundle, reused for choice deltas,
/// great-person effects and wonder effects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricAdjustment {
    pub metrics: MetricsAdjustment,
    pub map: MapAdjustment,
}

/// Content-authored delta attached to a choice.
pub type Delta = MetricAdjustment;

impl MetricAdjustment {
    pub fn is_empty(&self) -> bool {
        self.metrics.measured.is_empty()
            && self.metrics.unmeasured.is_empty()
            && self.map.region_values.is_empty()
            && self.map.activate_arcs.is_empty()
            && self.map.activate_hubs.is_empty()
            && self.map.spawn_rings.is_empty()
    }

    pub fn measured(mut self, key: MeasuredKey, amount: f64) -> Self {
        self.metrics.measured.insert(key, amount);
        self
    }

    pub fn unmeasured(mut self, key: UnmeasuredKey, amount: f64) -> Self {
        self.metrics.unmeasured.insert(key, amount);
        self
    }

    pub fn region(mut self, code: &str, amount: f64) -> Self {
        self.map.region_values.insert(code.to_string(), amount);
        self
    }
}

// ── Map ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MapMode {
    #[default]
    WelfareStandards,
    WelfareDebt,
    Enforcement,
}

impl MapMode {
    pub const ALL: [MapMode; 3] = [MapMode::WelfareStandards, MapMode::WelfareDebt, MapMode::Enforcement];

    pub fn as_str(&self) -> &'static str {
        match self {
            MapMode::WelfareStandards => "welfareStandards",
            MapMode::WelfareDebt => "welfareDebt",
            MapMode::Enforcement => "enforcement",
        }
    }

    pub fn parse(s: &str) -> Option<MapMode> {
        MapMode::ALL.into_iter().find(|m| m.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RingEventType {
    PolicyShift,
    WelfareIncident,
    RegulatoryResponse,
    MarketChange,
    ResearchBreakthrough,
    PublicPressure,
}

/// An activated flow arc. The engine stores ids only; geometry is external.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveArc {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggered_by_node_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveHub {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveRing {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub event_type: RingEventType,
    pub ttl: u32,
    pub created_turn: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggered_by_node_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapState {
    pub mode: MapMode,
    /// Per-region welfare value in `[0, 1]`, keyed by ISO-3 code.
    pub region_values: BTreeMap<String, f64>,
    pub active_arcs: Vec<ActiveArc>,
    pub active_hubs: Vec<ActiveHub>,
    pub active_rings: Vec<ActiveRing>,
}

// ── History & memory ───────────────────────────────────────────────

/// Free-text belief with a decaying confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assumption {
    pub text: String,
    pub strength: f64,
    pub created_turn: u32,
    pub last_reaffirmed_turn: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Memory {
    pub assumptions_bank: Vec<Assumption>,
}

/// One applied decision. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub turn: u32,
    pub phase_id: String,
    pub node_id: String,
    pub node_title: String,
    #[serde(default)]
    pub choice_id: String,
    pub chosen_label: String,
    pub owner_role: String,
    pub rationale: String,
    pub assumptions: String,
    pub unmeasured_impact: String,
    /// Wall-clock milliseconds, supplied by the caller.
    pub timestamp: i64,
    /// Deep copy of the metrics right after this decision.
    pub metrics_snapshot: Metrics,
}

// ── Unlocks & outcomes ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GreatPersonRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    pub unlocked_turn: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveEvent {
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub triggered_turn: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VictoryType {
    Welfare,
    Debt,
    Enforcement,
    Balance,
}

impl VictoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VictoryType::Welfare => "welfare",
            VictoryType::Debt => "debt",
            VictoryType::Enforcement => "enforcement",
            VictoryType::Balance => "balance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossType {
    WelfareCollapse,
    DebtCrisis,
    EnforcementFailure,
    IrreversibilityLock,
    RegulatoryCapture,
}

impl LossType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LossType::WelfareCollapse => "welfare_collapse",
            LossType::DebtCrisis => "debt_crisis",
            LossType::EnforcementFailure => "enforcement_failure",
            LossType::IrreversibilityLock => "irreversibility_lock",
            LossType::RegulatoryCapture => "regulatory_capture",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossSeverity {
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LossWarning {
    #[serde(rename = "type")]
    pub loss_type: LossType,
    pub severity: LossSeverity,
    pub turn: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Flags {
    pub is_complete: bool,
    pub show_debug: bool,
}

// ── Root state ─────────────────────────────────────────────────────

/// Complete game state. Replaced wholesale by every transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub turn: u32,
    pub current_node_id: String,
    pub phase_id: String,
    pub metrics: Metrics,
    /// Frozen copy of `metrics` at game start.
    pub initial_metrics: Metrics,
    pub map: MapState,
    pub audit_trail: Vec<AuditRecord>,
    #[serde(default)]
    pub memory: Memory,
    #[serde(default)]
    pub flags: Flags,
    #[serde(default)]
    pub great_people: Vec<GreatPersonRecord>,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub completed_wonders: Vec<String>,
    #[serde(default)]
    pub researched_techs: Vec<String>,
    #[serde(default)]
    pub active_events: Vec<ActiveEvent>,
    #[serde(default)]
    pub victory_type: Option<VictoryType>,
    #[serde(default)]
    pub loss_warnings: Vec<LossWarning>,
    #[serde(default)]
    pub loss_conditions_met: Vec<LossType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_name: Option<String>,
}

impl GameState {
    pub fn has_achievement(&self, id: &str) -> bool {
        self.achievements.iter().any(|a| a == id)
    }

    pub fn has_wonder(&self, id: &str) -> bool {
        self.completed_wonders.iter().any(|w| w == id)
    }

    pub fn has_great_person(&self, id: &str) -> bool {
        self.great_people.iter().any(|gp| gp.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_field_covers_all_nine_keys() {
        let names: Vec<&str> = MetricField::all().map(|f| f.as_str()).collect();
        assert_eq!(names.len(), 9);
        assert_eq!(names[0], "productionEfficiency");
        assert_eq!(names[8], "systemIrreversibility");
    }

    #[test]
    fn adoption_field_has_its_own_cap() {
        let f = MetricField::Measured(MeasuredKey::WelfareStandardAdoption);
        assert_eq!(f.clamp_value(4.0), ADOPTION_CAP);
        assert_eq!(f.clamp_value(-1.0), 0.0);
        let g = MetricField::Unmeasured(UnmeasuredKey::WelfareDebt);
        assert_eq!(g.clamp_value(1.4), 1.0);
    }

    #[test]
    fn delta_parses_with_missing_sections() {
        let delta: Delta = serde_json::from_str(
            r#"{"metrics": {"measured": {"costPerUnit": 0.1}}}"#,
        )
        .unwrap();
        assert_eq!(delta.metrics.measured[&MeasuredKey::CostPerUnit], 0.1);
        assert!(delta.metrics.unmeasured.is_empty());
        assert!(delta.map.region_values.is_empty());

        let empty: Delta = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn loss_warning_uses_type_key() {
        let w = LossWarning {
            loss_type: LossType::DebtCrisis,
            severity: LossSeverity::Warning,
            turn: 3,
        };
        let v = serde_json::to_value(&w).unwrap();
        assert_eq!(v["type"], "debt_crisis");
        assert_eq!(v["severity"], "warning");
    }
}

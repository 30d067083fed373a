//! Run-wide and per-strategy settings.
//!
//! Every settings struct deserializes with `#[serde(default)]`, so callers only
//! spell out the fields they want to change. Unknown fields are rejected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::OptimizeError;
use crate::types::{Priority, Request, Roll};

/// Below these sizes a leftover length strip is waste instead of a remainder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemainderThresholds {
    pub min_width_mm: u32,
    pub min_length_m: f64,
}

impl Default for RemainderThresholds {
    fn default() -> Self {
        Self {
            min_width_mm: 50,
            min_length_m: 0.5,
        }
    }
}

impl RemainderThresholds {
    pub fn is_useful(&self, width: u32, length: f64) -> bool {
        width >= self.min_width_mm && length >= self.min_length_m
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunOptions {
    pub remainder: RemainderThresholds,
    pub allow_collage: bool,
    pub parallel: bool,
    /// Instant deadlines are measured against. `None` means "when the solver is built".
    pub reference_time: Option<DateTime<Utc>>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            remainder: RemainderThresholds::default(),
            allow_collage: true,
            parallel: true,
            reference_time: None,
        }
    }
}

/// Base score per priority tier for the priority packer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PriorityWeights {
    pub low: f64,
    pub normal: f64,
    pub high: f64,
    pub urgent: f64,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            low: 20.0,
            normal: 50.0,
            high: 80.0,
            urgent: 100.0,
        }
    }
}

impl PriorityWeights {
    pub fn weight(&self, priority: Priority) -> f64 {
        match priority {
            Priority::Low => self.low,
            Priority::Normal => self.normal,
            Priority::High => self.high,
            Priority::Urgent => self.urgent,
        }
    }
}

/// Width multiplier per priority tier for the multi-objective scorer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TierMultipliers {
    pub low: f64,
    pub normal: f64,
    pub high: f64,
    pub urgent: f64,
}

impl Default for TierMultipliers {
    fn default() -> Self {
        Self {
            low: 1.0,
            normal: 2.0,
            high: 3.0,
            urgent: 4.0,
        }
    }
}

impl TierMultipliers {
    pub fn weight(&self, priority: Priority) -> f64 {
        match priority {
            Priority::Low => self.low,
            Priority::Normal => self.normal,
            Priority::High => self.high,
            Priority::Urgent => self.urgent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeadlineBonus {
    pub overdue: f64,
    pub today: f64,
    pub within_3_days: f64,
    pub within_week: f64,
}

impl Default for DeadlineBonus {
    fn default() -> Self {
        Self {
            overdue: 50.0,
            today: 30.0,
            within_3_days: 20.0,
            within_week: 10.0,
        }
    }
}

impl DeadlineBonus {
    /// Monotonic step function of the (fractional) days left before the deadline.
    pub fn bonus(&self, days_left: f64) -> f64 {
        if days_left < 0.0 {
            self.overdue
        } else if days_left < 1.0 {
            self.today
        } else if days_left < 3.0 {
            self.within_3_days
        } else if days_left < 7.0 {
            self.within_week
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PriorityOptions {
    pub weights: PriorityWeights,
    pub deadline_bonus: DeadlineBonus,
    /// Units smaller than this area (mm·m) get `small_order_penalty` subtracted.
    pub small_order_area: f64,
    pub small_order_penalty: f64,
    pub size_bonus_divisor: f64,
}

impl Default for PriorityOptions {
    fn default() -> Self {
        Self {
            weights: PriorityWeights::default(),
            deadline_bonus: DeadlineBonus::default(),
            small_order_area: 100.0,
            small_order_penalty: 10.0,
            size_bonus_divisor: 1000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    Ffd,
    Bfd,
    #[default]
    Hybrid,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WasteMinOptions {
    pub mode: FitMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RollMinOptions {
    /// Largest accepted leftover width, as a fraction of the roll width.
    pub waste_limit: f64,
    pub bucket_mm: u32,
}

impl Default for RollMinOptions {
    fn default() -> Self {
        Self {
            waste_limit: 0.30,
            bucket_mm: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ObjectiveWeights {
    pub waste: f64,
    pub priority: f64,
    pub rolls: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            waste: 0.4,
            priority: 0.4,
            rolls: 0.2,
        }
    }
}

impl ObjectiveWeights {
    pub fn sum(&self) -> f64 {
        self.waste + self.priority + self.rolls
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MultiObjectiveOptions {
    pub weights: ObjectiveWeights,
    pub priority_weights: TierMultipliers,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnGenOptions {
    pub max_iterations: usize,
    pub max_patterns: usize,
    pub tolerance: f64,
}

impl Default for ColumnGenOptions {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            max_patterns: 100,
            tolerance: 0.001,
        }
    }
}

/// Input document accepted by the CLI and the HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Job {
    pub rolls: Vec<Roll>,
    pub requests: Vec<Request>,
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub settings: Option<serde_json::Value>,
    #[serde(default)]
    pub run: RunOptions,
}

impl Job {
    /// Rejects rolls and requests with a zero width, a non-positive or
    /// non-finite length, or a zero quantity.
    pub fn validate(&self) -> crate::error::Result<()> {
        for r in &self.rolls {
            if r.width == 0 || !is_positive_length(r.length) {
                return Err(OptimizeError::InvalidInput(format!(
                    "roll {} must have a positive width and length, got {}mm x {}m",
                    r.id, r.width, r.length
                )));
            }
        }
        for r in &self.requests {
            if r.width == 0 || !is_positive_length(r.length) {
                return Err(OptimizeError::InvalidInput(format!(
                    "request {} must have a positive width and length, got {}mm x {}m",
                    r.id, r.width, r.length
                )));
            }
            if r.quantity == 0 {
                return Err(OptimizeError::InvalidInput(format!(
                    "request {} must have a quantity of at least 1",
                    r.id
                )));
            }
        }
        Ok(())
    }
}

fn is_positive_length(length: f64) -> bool {
    length.is_finite() && length > 0.0
}

//! Strategy registry and dispatch.
//!
//! The set of strategies is closed: [`StrategyKind`] names them, [`Strategy`]
//! carries a kind together with its parsed settings.

pub mod bidimensional;
pub mod column_gen;
pub mod multi_objective;
pub mod priority;
pub mod roll_min;
pub mod waste_min;

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::accounting::EfficiencyBasis;
use crate::config::{
    ColumnGenOptions, MultiObjectiveOptions, PriorityOptions, RollMinOptions, RunOptions,
    WasteMinOptions,
};
use crate::error::{OptimizeError, Result};
use crate::roll_bin::RollBin;
use crate::solver::CancelToken;
use crate::types::{RequestUnit, Roll};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    #[serde(rename = "priority")]
    Priority,
    #[serde(rename = "waste-min")]
    WasteMin,
    #[serde(rename = "bidimensional")]
    Bidimensional,
    #[serde(rename = "roll-min")]
    RollMin,
    #[serde(rename = "multi")]
    MultiObjective,
    #[serde(rename = "column-gen")]
    ColumnGen,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 6] = [
        StrategyKind::Bidimensional,
        StrategyKind::WasteMin,
        StrategyKind::Priority,
        StrategyKind::RollMin,
        StrategyKind::MultiObjective,
        StrategyKind::ColumnGen,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            StrategyKind::Priority => "priority",
            StrategyKind::WasteMin => "waste-min",
            StrategyKind::Bidimensional => "bidimensional",
            StrategyKind::RollMin => "roll-min",
            StrategyKind::MultiObjective => "multi",
            StrategyKind::ColumnGen => "column-gen",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::Priority => "Order priority",
            StrategyKind::WasteMin => "Waste minimization",
            StrategyKind::Bidimensional => "Length combination (bidimensional)",
            StrategyKind::RollMin => "Roll minimization",
            StrategyKind::MultiObjective => "Multi-objective",
            StrategyKind::ColumnGen => "Column generation",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            StrategyKind::Priority => {
                "Serves high-priority and near-deadline orders first, even at the cost of more waste."
            }
            StrategyKind::WasteMin => {
                "First-fit and best-fit decreasing packing by width; hybrid mode keeps whichever wastes less."
            }
            StrategyKind::Bidimensional => {
                "Packs by area, checking both the width and the length of each roll."
            }
            StrategyKind::RollMin => {
                "Groups similar widths to use as few rolls as possible, within a waste ceiling."
            }
            StrategyKind::MultiObjective => {
                "Blends waste, priority and roll-count goals into one greedy score."
            }
            StrategyKind::ColumnGen => {
                "Repeatedly builds the best single-roll pattern against the shrinking request pool."
            }
        }
    }

    pub fn has_settings(&self) -> bool {
        !matches!(self, StrategyKind::Bidimensional)
    }

    pub fn efficiency_basis(&self) -> EfficiencyBasis {
        match self {
            StrategyKind::Bidimensional => EfficiencyBasis::Area,
            _ => EfficiencyBasis::Width,
        }
    }

    pub fn info(&self) -> StrategyInfo {
        StrategyInfo {
            id: self.id(),
            name: self.name(),
            description: self.description(),
            has_settings: self.has_settings(),
            efficiency_basis: self.efficiency_basis(),
            default_settings: Strategy::default_for(*self).settings(),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = OptimizeError;

    fn from_str(s: &str) -> Result<Self> {
        StrategyKind::ALL
            .into_iter()
            .find(|k| k.id() == s)
            .ok_or_else(|| OptimizeError::UnknownStrategy(s.to_string()))
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Registry entry: what a strategy is and which settings it declares.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub has_settings: bool,
    pub efficiency_basis: EfficiencyBasis,
    pub default_settings: serde_json::Value,
}

pub fn registry() -> Vec<StrategyInfo> {
    StrategyKind::ALL.iter().map(|k| k.info()).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    Priority(PriorityOptions),
    WasteMin(WasteMinOptions),
    Bidimensional,
    RollMin(RollMinOptions),
    MultiObjective(MultiObjectiveOptions),
    ColumnGen(ColumnGenOptions),
}

impl Strategy {
    pub fn default_for(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::Priority => Strategy::Priority(PriorityOptions::default()),
            StrategyKind::WasteMin => Strategy::WasteMin(WasteMinOptions::default()),
            StrategyKind::Bidimensional => Strategy::Bidimensional,
            StrategyKind::RollMin => Strategy::RollMin(RollMinOptions::default()),
            StrategyKind::MultiObjective => Strategy::MultiObjective(MultiObjectiveOptions::default()),
            StrategyKind::ColumnGen => Strategy::ColumnGen(ColumnGenOptions::default()),
        }
    }

    /// Resolves `id` and parses `settings` for it. Fails before any computation
    /// on an unknown id or on settings of the wrong shape.
    pub fn lookup(id: &str, settings: Option<&serde_json::Value>) -> Result<Self> {
        let kind: StrategyKind = id.parse()?;
        Self::from_settings(kind, settings)
    }

    pub fn from_settings(kind: StrategyKind, settings: Option<&serde_json::Value>) -> Result<Self> {
        Ok(match kind {
            StrategyKind::Priority => Strategy::Priority(parse_settings(kind, settings)?),
            StrategyKind::WasteMin => Strategy::WasteMin(parse_settings(kind, settings)?),
            StrategyKind::Bidimensional => {
                if let Some(v) = settings
                    && !v.is_null()
                    && v.as_object().is_none_or(|o| !o.is_empty())
                {
                    return Err(OptimizeError::InvalidOptions {
                        strategy: kind.id().to_string(),
                        message: "this strategy takes no settings".to_string(),
                    });
                }
                Strategy::Bidimensional
            }
            StrategyKind::RollMin => Strategy::RollMin(parse_settings(kind, settings)?),
            StrategyKind::MultiObjective => Strategy::MultiObjective(parse_settings(kind, settings)?),
            StrategyKind::ColumnGen => Strategy::ColumnGen(parse_settings(kind, settings)?),
        })
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Priority(_) => StrategyKind::Priority,
            Strategy::WasteMin(_) => StrategyKind::WasteMin,
            Strategy::Bidimensional => StrategyKind::Bidimensional,
            Strategy::RollMin(_) => StrategyKind::RollMin,
            Strategy::MultiObjective(_) => StrategyKind::MultiObjective,
            Strategy::ColumnGen(_) => StrategyKind::ColumnGen,
        }
    }

    pub fn settings(&self) -> serde_json::Value {
        let value = match self {
            Strategy::Priority(o) => serde_json::to_value(o),
            Strategy::WasteMin(o) => serde_json::to_value(o),
            Strategy::Bidimensional => Ok(serde_json::Value::Object(Default::default())),
            Strategy::RollMin(o) => serde_json::to_value(o),
            Strategy::MultiObjective(o) => serde_json::to_value(o),
            Strategy::ColumnGen(o) => serde_json::to_value(o),
        };
        value.unwrap_or_default()
    }

    /// Runs the strategy over one material's rolls and units. Returns only
    /// bins that received at least one cut.
    pub(crate) fn pack(
        &self,
        rolls: &[Roll],
        units: &[RequestUnit],
        ctx: &PackContext<'_>,
    ) -> Result<Vec<RollBin>> {
        match self {
            Strategy::Priority(o) => priority::pack(rolls, units, o, ctx),
            Strategy::WasteMin(o) => waste_min::pack(rolls, units, o, ctx),
            Strategy::Bidimensional => bidimensional::pack(rolls, units, ctx),
            Strategy::RollMin(o) => roll_min::pack(rolls, units, o, ctx),
            Strategy::MultiObjective(o) => multi_objective::pack(rolls, units, o, ctx),
            Strategy::ColumnGen(o) => column_gen::pack(rolls, units, o, ctx),
        }
    }
}

fn parse_settings<T>(kind: StrategyKind, settings: Option<&serde_json::Value>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    match settings {
        None | Some(serde_json::Value::Null) => Ok(T::default()),
        Some(v) => serde_json::from_value(v.clone()).map_err(|e| OptimizeError::InvalidOptions {
            strategy: kind.id().to_string(),
            message: e.to_string(),
        }),
    }
}

/// Per-run state handed to every strategy call.
pub struct PackContext<'a> {
    pub run: &'a RunOptions,
    pub reference_time: DateTime<Utc>,
    pub cancel: &'a CancelToken,
}

impl PackContext<'_> {
    /// Checked between per-roll iterations.
    pub fn checkpoint(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(OptimizeError::Cancelled);
        }
        Ok(())
    }
}

pub(crate) fn rolls_by_width_desc(rolls: &[Roll]) -> Vec<Roll> {
    let mut sorted = rolls.to_vec();
    sorted.sort_by(|a, b| b.width.cmp(&a.width));
    sorted
}

pub(crate) fn rolls_by_area_desc(rolls: &[Roll]) -> Vec<Roll> {
    let mut sorted = rolls.to_vec();
    sorted.sort_by(|a, b| b.area().total_cmp(&a.area()));
    sorted
}

/// Removes the entries at `taken` (any order) from `pool`, keeping the rest in order.
pub(crate) fn remove_taken<T>(pool: &mut Vec<T>, taken: &[usize]) {
    let mut idx = 0;
    pool.retain(|_| {
        let keep = !taken.contains(&idx);
        idx += 1;
        keep
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_known_ids() {
        for kind in StrategyKind::ALL {
            let s = Strategy::lookup(kind.id(), None).unwrap();
            assert_eq!(s.kind(), kind);
        }
    }

    #[test]
    fn test_unknown_strategy_fails_at_lookup() {
        let err = Strategy::lookup("simulated-annealing", None).unwrap_err();
        assert!(matches!(err, OptimizeError::UnknownStrategy(ref id) if id == "simulated-annealing"));
    }

    #[test]
    fn test_malformed_settings() {
        let err = Strategy::lookup("column-gen", Some(&json!({"max_iterations": "many"}))).unwrap_err();
        assert!(matches!(err, OptimizeError::InvalidOptions { .. }));

        let err = Strategy::lookup("bidimensional", Some(&json!({"x": 1}))).unwrap_err();
        assert!(matches!(err, OptimizeError::InvalidOptions { .. }));
        assert!(Strategy::lookup("bidimensional", Some(&json!({}))).is_ok());
    }

    #[test]
    fn test_settings_override_defaults() {
        let s = Strategy::lookup("roll-min", Some(&json!({"waste_limit": 0.05}))).unwrap();
        match s {
            Strategy::RollMin(o) => {
                assert_eq!(o.waste_limit, 0.05);
                assert_eq!(o.bucket_mm, 10);
            }
            other => panic!("unexpected strategy {other:?}"),
        }
    }

    #[test]
    fn test_registry_declares_settings() {
        let reg = registry();
        assert_eq!(reg.len(), 6);
        let cg = reg.iter().find(|i| i.id == "column-gen").unwrap();
        assert_eq!(cg.default_settings["max_iterations"], json!(20));
        let bi = reg.iter().find(|i| i.id == "bidimensional").unwrap();
        assert!(!bi.has_settings);
        assert_eq!(bi.efficiency_basis, EfficiencyBasis::Area);
    }

    #[test]
    fn test_kind_serde_matches_id() {
        for kind in StrategyKind::ALL {
            assert_eq!(serde_json::to_value(kind).unwrap(), json!(kind.id()));
        }
    }

    #[test]
    fn test_remove_taken_keeps_order() {
        let mut v = vec!['a', 'b', 'c', 'd', 'e'];
        remove_taken(&mut v, &[3, 0]);
        assert_eq!(v, vec!['b', 'c', 'e']);
    }
}

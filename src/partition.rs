//! Splits a run by material and runs the strategy once per material.

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::accounting::classify;
use crate::collage;
use crate::error::Result;
use crate::ledger::{DemandLedger, FulfillmentState};
use crate::strategy::{PackContext, Strategy};
use crate::types::{
    MaterialPlan, MaterialStats, Pattern, RequestUnit, Roll, UnfulfilledReason, UnfulfilledUnit,
    UnitState,
};

/// Rolls and units of one material code, owned by the group.
#[derive(Debug, Clone)]
pub(crate) struct MaterialGroup {
    pub material: String,
    pub rolls: Vec<Roll>,
    pub units: Vec<RequestUnit>,
}

/// Result of one material run. `plan` is `None` when the material had no rolls.
#[derive(Debug, Clone)]
pub(crate) struct MaterialOutcome {
    pub plan: Option<MaterialPlan>,
    pub fulfilled: Vec<String>,
    pub unfulfilled: Vec<UnfulfilledUnit>,
}

/// Groups units by material, ordered by material code. Only materials with at
/// least one unit form a group.
pub(crate) fn group_by_material(rolls: &[Roll], units: &[RequestUnit]) -> Vec<MaterialGroup> {
    let mut groups: BTreeMap<&str, MaterialGroup> = BTreeMap::new();
    for u in units {
        groups
            .entry(u.material.as_str())
            .or_insert_with(|| MaterialGroup {
                material: u.material.clone(),
                rolls: rolls.iter().filter(|r| r.material == u.material).cloned().collect(),
                units: Vec::new(),
            })
            .units
            .push(u.clone());
    }
    groups.into_values().collect()
}

pub(crate) fn run_all(
    strategy: &Strategy,
    groups: &[MaterialGroup],
    ctx: &PackContext<'_>,
) -> Result<Vec<MaterialOutcome>> {
    if ctx.run.parallel {
        groups.par_iter().map(|g| run_group(strategy, g, ctx)).collect()
    } else {
        groups.iter().map(|g| run_group(strategy, g, ctx)).collect()
    }
}

pub(crate) fn run_group(
    strategy: &Strategy,
    group: &MaterialGroup,
    ctx: &PackContext<'_>,
) -> Result<MaterialOutcome> {
    if group.rolls.is_empty() {
        tracing::debug!(
            material = %group.material,
            units = group.units.len(),
            "no rolls for material, skipping"
        );
        let unfulfilled = group
            .units
            .iter()
            .map(|u| unfulfilled(u, u.length, UnitState::Pending, UnfulfilledReason::NoMatchingRolls))
            .collect();
        return Ok(MaterialOutcome {
            plan: None,
            fulfilled: Vec::new(),
            unfulfilled,
        });
    }

    let mut bins = strategy.pack(&group.rolls, &group.units, ctx)?;
    let mut ledger = DemandLedger::from_bins(&group.units, &bins);
    if ctx.run.allow_collage {
        let resolved = collage::resolve(&mut bins, &group.rolls, &group.units, &mut ledger, ctx)?;
        if resolved > 0 {
            tracing::debug!(material = %group.material, resolved, "length collage");
        }
    }

    let basis = strategy.kind().efficiency_basis();
    let patterns: Vec<Pattern> = bins
        .into_iter()
        .filter(|b| !b.is_empty())
        .map(|b| classify(b, &ctx.run.remainder, basis))
        .collect();

    let mut fulfilled = Vec::new();
    let mut missing = Vec::new();
    for u in &group.units {
        let owed = ledger.owed(&u.id);
        match ledger.state(&u.id) {
            FulfillmentState::Fulfilled => fulfilled.push(u.id.clone()),
            FulfillmentState::PartiallyCut => missing.push(unfulfilled(
                u,
                owed,
                UnitState::PartiallyCut,
                UnfulfilledReason::InsufficientLength,
            )),
            FulfillmentState::Unfulfillable => {
                let state = if ledger.segments(&u.id) > 0 {
                    UnitState::PartiallyCut
                } else {
                    UnitState::Pending
                };
                missing.push(unfulfilled(u, owed, state, UnfulfilledReason::InsufficientLength));
            }
            FulfillmentState::Pending => missing.push(unfulfilled(
                u,
                owed,
                UnitState::Pending,
                UnfulfilledReason::NotPlaced,
            )),
        }
    }

    let statistics = material_stats(&patterns, fulfilled.len(), group.units.len());
    tracing::debug!(
        material = %group.material,
        rolls_used = statistics.rolls_used,
        fulfilled = statistics.fulfilled_requests,
        total = statistics.total_requests,
        efficiency = statistics.efficiency,
        "material done"
    );

    Ok(MaterialOutcome {
        plan: Some(MaterialPlan {
            material: group.material.clone(),
            patterns,
            statistics,
        }),
        fulfilled,
        unfulfilled: missing,
    })
}

fn material_stats(patterns: &[Pattern], fulfilled: usize, total: usize) -> MaterialStats {
    let efficiency = if patterns.is_empty() {
        0.0
    } else {
        patterns.iter().map(|p| p.efficiency).sum::<f64>() / patterns.len() as f64
    };
    MaterialStats {
        efficiency: efficiency.clamp(0.0, 100.0),
        total_waste: patterns.iter().map(|p| p.waste).sum(),
        total_remainder: patterns.iter().map(|p| p.remainder_area).sum(),
        rolls_used: patterns.len(),
        fulfilled_requests: fulfilled,
        total_requests: total,
    }
}

fn unfulfilled(
    unit: &RequestUnit,
    residual: f64,
    state: UnitState,
    reason: UnfulfilledReason,
) -> UnfulfilledUnit {
    UnfulfilledUnit {
        unit_id: unit.id.clone(),
        request_id: unit.request_id.clone(),
        material: unit.material.clone(),
        width: unit.width,
        requested_length: unit.length,
        residual_length: residual,
        state,
        reason,
    }
}

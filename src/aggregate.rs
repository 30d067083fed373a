//! Folds per-material results into a [`Plan`] and compares plans across strategies.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::partition::MaterialOutcome;
use crate::strategy::StrategyKind;
use crate::types::{
    Plan, Priority, Request, RequestFulfillment, RequestUnit, Statistics, TierStats,
};

pub(crate) fn aggregate(
    kind: StrategyKind,
    requests: &[Request],
    units: &[RequestUnit],
    total_rolls: usize,
    outcomes: Vec<MaterialOutcome>,
) -> Plan {
    let mut materials = Vec::new();
    let mut fulfilled: HashSet<String> = HashSet::new();
    let mut unfulfilled = Vec::new();
    for o in outcomes {
        materials.extend(o.plan);
        fulfilled.extend(o.fulfilled);
        unfulfilled.extend(o.unfulfilled);
    }

    // Pattern-count weighted mean of the material efficiencies.
    let pattern_count: usize = materials.iter().map(|m| m.patterns.len()).sum();
    let efficiency = if pattern_count == 0 {
        0.0
    } else {
        materials
            .iter()
            .map(|m| m.statistics.efficiency * m.patterns.len() as f64)
            .sum::<f64>()
            / pattern_count as f64
    };

    let mut by_priority: BTreeMap<Priority, TierStats> =
        Priority::ALL.iter().map(|p| (*p, TierStats::default())).collect();
    let mut per_request: HashMap<&str, u32> = HashMap::new();
    for u in units {
        let hit = fulfilled.contains(&u.id);
        let tier = by_priority.entry(u.priority).or_default();
        tier.total += 1;
        if hit {
            tier.fulfilled += 1;
            *per_request.entry(u.request_id.as_str()).or_default() += 1;
        }
    }

    let fulfillment = requests
        .iter()
        .map(|r| RequestFulfillment {
            request_id: r.id.clone(),
            order_ref: r.order_ref.clone(),
            requested: r.quantity,
            fulfilled: per_request.get(r.id.as_str()).copied().unwrap_or(0),
        })
        .collect();

    let statistics = Statistics {
        efficiency: efficiency.clamp(0.0, 100.0),
        total_waste: materials.iter().map(|m| m.statistics.total_waste).sum(),
        total_remainder: materials.iter().map(|m| m.statistics.total_remainder).sum(),
        rolls_used: materials.iter().map(|m| m.statistics.rolls_used).sum(),
        total_rolls,
        fulfilled_requests: fulfilled.len(),
        total_requests: units.len(),
        by_priority,
    };

    Plan {
        strategy: kind.id().to_string(),
        materials,
        statistics,
        fulfillment,
        unfulfilled,
    }
}

/// Headline figures of one strategy's plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyResult {
    pub strategy: String,
    pub name: String,
    pub efficiency: f64,
    pub total_waste: f64,
    pub rolls_used: usize,
    pub fulfilled_requests: usize,
    pub total_requests: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub results: Vec<StrategyResult>,
    pub best_efficiency: Option<String>,
    pub lowest_waste: Option<String>,
    pub fewest_rolls: Option<String>,
    pub most_fulfilled: Option<String>,
}

/// Ranks `plans` per metric. On ties the earlier plan wins.
pub fn compare_plans(plans: &[Plan]) -> Comparison {
    let results: Vec<StrategyResult> = plans
        .iter()
        .map(|p| StrategyResult {
            name: p
                .strategy
                .parse::<StrategyKind>()
                .map(|k| k.name().to_string())
                .unwrap_or_else(|_| p.strategy.clone()),
            strategy: p.strategy.clone(),
            efficiency: p.statistics.efficiency,
            total_waste: p.statistics.total_waste,
            rolls_used: p.statistics.rolls_used,
            fulfilled_requests: p.statistics.fulfilled_requests,
            total_requests: p.statistics.total_requests,
        })
        .collect();

    let pick = |better: fn(&StrategyResult, &StrategyResult) -> bool| {
        let mut best: Option<&StrategyResult> = None;
        for r in &results {
            if best.is_none_or(|b| better(r, b)) {
                best = Some(r);
            }
        }
        best.map(|r| r.strategy.clone())
    };

    Comparison {
        best_efficiency: pick(|a, b| a.efficiency > b.efficiency),
        lowest_waste: pick(|a, b| a.total_waste < b.total_waste),
        fewest_rolls: pick(|a, b| a.rolls_used < b.rolls_used),
        most_fulfilled: pick(|a, b| a.fulfilled_requests > b.fulfilled_requests),
        results,
    }
}

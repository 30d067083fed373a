use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};

use crate::aggregate::{Comparison, aggregate, compare_plans};
use crate::config::RunOptions;
use crate::error::Result;
use crate::partition::{group_by_material, run_all};
use crate::strategy::{PackContext, Strategy, StrategyKind};
use crate::types::{Plan, Request, Roll, expand_requests};

/// Cooperative cancellation flag, checked between per-roll iterations.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub struct Solver {
    strategy: Strategy,
    run: RunOptions,
    reference_time: DateTime<Utc>,
}

impl Solver {
    pub fn new(strategy: Strategy, run: RunOptions) -> Self {
        let reference_time = run.reference_time.unwrap_or_else(Utc::now);
        Self {
            strategy,
            run,
            reference_time,
        }
    }

    /// Looks the strategy up by id; fails before any computation on an unknown
    /// id or malformed settings.
    pub fn from_id(id: &str, settings: Option<&serde_json::Value>, run: RunOptions) -> Result<Self> {
        Ok(Self::new(Strategy::lookup(id, settings)?, run))
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn solve(&self, rolls: &[Roll], requests: &[Request]) -> Result<Plan> {
        self.solve_with_cancel(rolls, requests, &CancelToken::default())
    }

    pub fn solve_with_cancel(
        &self,
        rolls: &[Roll],
        requests: &[Request],
        cancel: &CancelToken,
    ) -> Result<Plan> {
        let kind = self.strategy.kind();
        let units = expand_requests(requests);
        tracing::info!(
            strategy = %kind,
            rolls = rolls.len(),
            requests = requests.len(),
            units = units.len(),
            "optimization started"
        );

        let ctx = PackContext {
            run: &self.run,
            reference_time: self.reference_time,
            cancel,
        };
        let groups = group_by_material(rolls, &units);
        let outcomes = run_all(&self.strategy, &groups, &ctx)?;
        let plan = aggregate(kind, requests, &units, rolls.len(), outcomes);

        tracing::info!(
            strategy = %kind,
            rolls_used = plan.statistics.rolls_used,
            fulfilled = plan.statistics.fulfilled_requests,
            total = plan.statistics.total_requests,
            efficiency = plan.statistics.efficiency,
            waste = plan.statistics.total_waste,
            "optimization finished"
        );
        Ok(plan)
    }
}

/// One-shot run with default run options.
pub fn optimize(
    id: &str,
    settings: Option<&serde_json::Value>,
    rolls: &[Roll],
    requests: &[Request],
) -> Result<Plan> {
    Solver::from_id(id, settings, RunOptions::default())?.solve(rolls, requests)
}

/// Runs every registered strategy with default settings against the same
/// reference instant and ranks the results.
pub fn compare(rolls: &[Roll], requests: &[Request], run: &RunOptions) -> Result<(Vec<Plan>, Comparison)> {
    let run = RunOptions {
        reference_time: Some(run.reference_time.unwrap_or_else(Utc::now)),
        ..run.clone()
    };
    let plans = StrategyKind::ALL
        .into_iter()
        .map(|k| Solver::new(Strategy::default_for(k), run.clone()).solve(rolls, requests))
        .collect::<Result<Vec<_>>>()?;
    let comparison = compare_plans(&plans);
    Ok((plans, comparison))
}

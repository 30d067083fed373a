//! Length collage: completes a unit's length from several rolls.
//!
//! Runs after a strategy has packed one material. It picks up units the strategy
//! left partially cut, plus never-placed units longer than any roll wide enough to
//! take them. Width is never split across rolls, only length.

use crate::error::Result;
use crate::ledger::{DemandLedger, FulfillmentState};
use crate::roll_bin::RollBin;
use crate::strategy::PackContext;
use crate::types::{LENGTH_EPSILON, RequestUnit, Roll};

/// Where a candidate roll currently stands.
#[derive(Debug, Clone, Copy)]
enum Slot {
    /// Roll already carries cuts; index into the bins.
    Bin(usize),
    /// Roll not used yet; index into the material's rolls.
    Fresh(usize),
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    slot: Slot,
    length: f64,
}

/// Resolves shortfalls in place. Returns the number of units completed.
pub(crate) fn resolve(
    bins: &mut Vec<RollBin>,
    rolls: &[Roll],
    units: &[RequestUnit],
    ledger: &mut DemandLedger,
    ctx: &PackContext<'_>,
) -> Result<usize> {
    let mut targets: Vec<&RequestUnit> = units
        .iter()
        .filter(|u| match ledger.state(&u.id) {
            FulfillmentState::PartiallyCut => true,
            FulfillmentState::Pending => exceeds_every_roll(u, rolls),
            _ => false,
        })
        .collect();
    targets.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.seq.cmp(&b.seq)));

    let mut resolved = 0;
    for unit in targets {
        ctx.checkpoint()?;
        let owed = ledger.owed(&unit.id);
        let candidates = candidates_for(unit, bins, rolls);

        let mut plan: Vec<(Candidate, f64)> = Vec::new();
        let mut left = owed;
        for c in candidates {
            if left <= LENGTH_EPSILON {
                break;
            }
            let take = left.min(c.length);
            plan.push((c, take));
            left -= take;
        }

        if left > LENGTH_EPSILON {
            tracing::warn!(
                unit = %unit.id,
                owed,
                residual = left,
                "length collage cannot cover the shortfall"
            );
            ledger.mark_unfulfillable(&unit.id);
            continue;
        }

        let first = ledger.segments(&unit.id);
        if first > 0 {
            for cut in bins.iter_mut().flat_map(|b| b.cuts.iter_mut()) {
                if cut.unit_id == unit.id && cut.collage_index.is_none() {
                    cut.collage_index = Some(0);
                }
            }
        }

        let mut still_owed = owed;
        for (i, (c, take)) in plan.into_iter().enumerate() {
            still_owed -= take;
            let bin_idx = match c.slot {
                Slot::Bin(b) => b,
                Slot::Fresh(r) => {
                    bins.push(RollBin::new(rolls[r].clone()));
                    bins.len() - 1
                }
            };
            let cut = bins[bin_idx].place_segment(unit, take, still_owed, Some(first + i as u32));
            ledger.record(cut);
        }

        tracing::debug!(
            unit = %unit.id,
            segments = ledger.segments(&unit.id),
            "length collage complete"
        );
        resolved += 1;
    }
    Ok(resolved)
}

/// True when every roll wide enough for `unit` is too short for it, so only a
/// collage can ever satisfy it.
fn exceeds_every_roll(unit: &RequestUnit, rolls: &[Roll]) -> bool {
    let mut wide_enough = rolls.iter().filter(|r| r.width >= unit.width).peekable();
    wide_enough.peek().is_some() && wide_enough.all(|r| r.length + LENGTH_EPSILON < unit.length)
}

/// Rolls that can host a new lane for `unit`, longest first.
fn candidates_for(unit: &RequestUnit, bins: &[RollBin], rolls: &[Roll]) -> Vec<Candidate> {
    let mut out = Vec::new();
    for (ri, roll) in rolls.iter().enumerate() {
        if roll.width < unit.width {
            continue;
        }
        match bins.iter().position(|b| b.roll.id == roll.id) {
            Some(bi) if bins[bi].fits_width(unit.width) => out.push(Candidate {
                slot: Slot::Bin(bi),
                length: bins[bi].lane_length(),
            }),
            Some(_) => {}
            None => out.push(Candidate {
                slot: Slot::Fresh(ri),
                length: roll.length,
            }),
        }
    }
    out.sort_by(|a, b| b.length.total_cmp(&a.length));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunOptions;
    use crate::solver::CancelToken;
    use crate::test_support::{roll, units};
    use crate::types::{Priority, Request};
    use chrono::Utc;

    fn with_ctx<T>(f: impl FnOnce(&PackContext<'_>) -> T) -> T {
        let run = RunOptions::default();
        let cancel = CancelToken::default();
        let ctx = PackContext {
            run: &run,
            reference_time: Utc::now(),
            cancel: &cancel,
        };
        f(&ctx)
    }

    fn total_length(bins: &[RollBin], unit_id: &str) -> f64 {
        bins.iter()
            .flat_map(|b| &b.cuts)
            .filter(|c| c.unit_id == unit_id)
            .map(|c| c.length)
            .sum()
    }

    #[test]
    fn test_partial_cut_completed_from_second_roll() {
        let rolls = vec![roll("r10", 1000, 10.0), roll("r20", 1000, 20.0)];
        let u = units(&[Request::new("a", "M1", 1000, 25.0, 1, Priority::Normal)]);
        let mut bin = RollBin::new(rolls[0].clone());
        bin.place(&u[0]);
        let mut bins = vec![bin];
        let mut ledger = DemandLedger::from_bins(&u, &bins);

        let done = with_ctx(|ctx| resolve(&mut bins, &rolls, &u, &mut ledger, ctx).unwrap());
        assert_eq!(done, 1);
        assert_eq!(ledger.state("a-0"), FulfillmentState::Fulfilled);
        assert_eq!(bins.len(), 2);
        assert!((total_length(&bins, "a-0") - 25.0).abs() < LENGTH_EPSILON);
        assert_eq!(bins[0].cuts[0].collage_index, Some(0));
        assert_eq!(bins[1].cuts[0].collage_index, Some(1));
        assert!((bins[1].cuts[0].length - 15.0).abs() < LENGTH_EPSILON);
        assert!(!bins[1].cuts[0].is_partial());
    }

    #[test]
    fn test_pending_unit_longer_than_every_roll() {
        let rolls = vec![roll("r10", 1000, 10.0), roll("r20", 1000, 20.0)];
        let u = units(&[Request::new("a", "M1", 1000, 25.0, 1, Priority::Normal)]);
        let mut bins = Vec::new();
        let mut ledger = DemandLedger::new(&u);

        with_ctx(|ctx| resolve(&mut bins, &rolls, &u, &mut ledger, ctx).unwrap());
        assert!(ledger.is_fulfilled("a-0"));
        // Longest roll first: 20 then 5 from the 10 m roll.
        assert_eq!(bins[0].roll.id, "r20");
        assert_eq!(bins[0].cuts[0].length, 20.0);
        assert_eq!(bins[0].cuts[0].collage_index, Some(0));
        assert!((bins[1].cuts[0].length - 5.0).abs() < LENGTH_EPSILON);
    }

    #[test]
    fn test_pending_unit_that_fits_one_roll_is_left_alone() {
        let rolls = vec![roll("r1", 1000, 30.0)];
        let u = units(&[Request::new("a", "M1", 1000, 25.0, 1, Priority::Normal)]);
        let mut bins = Vec::new();
        let mut ledger = DemandLedger::new(&u);

        let done = with_ctx(|ctx| resolve(&mut bins, &rolls, &u, &mut ledger, ctx).unwrap());
        assert_eq!(done, 0);
        assert!(bins.is_empty());
        assert_eq!(ledger.state("a-0"), FulfillmentState::Pending);
    }

    #[test]
    fn test_shortfall_too_large_commits_nothing() {
        let rolls = vec![roll("r10", 1000, 10.0), roll("r5", 1000, 5.0)];
        let u = units(&[Request::new("a", "M1", 1000, 25.0, 1, Priority::Normal)]);
        let mut bin = RollBin::new(rolls[0].clone());
        bin.place(&u[0]);
        let mut bins = vec![bin];
        let mut ledger = DemandLedger::from_bins(&u, &bins);

        with_ctx(|ctx| resolve(&mut bins, &rolls, &u, &mut ledger, ctx).unwrap());
        assert_eq!(ledger.state("a-0"), FulfillmentState::Unfulfillable);
        assert!((ledger.owed("a-0") - 15.0).abs() < LENGTH_EPSILON);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].cuts[0].collage_index, None);
    }

    #[test]
    fn test_uses_free_width_on_a_used_roll() {
        // The 30 m roll already carries a 500 lane; the 400-wide unit still fits beside it.
        let rolls = vec![roll("r30", 1000, 30.0), roll("r8", 400, 8.0)];
        let u = units(&[
            Request::new("x", "M1", 500, 30.0, 1, Priority::Normal),
            Request::new("a", "M1", 400, 35.0, 1, Priority::High),
        ]);
        let mut bin = RollBin::new(rolls[0].clone());
        bin.place(&u[0]);
        let mut bins = vec![bin];
        let mut ledger = DemandLedger::from_bins(&u, &bins);

        with_ctx(|ctx| resolve(&mut bins, &rolls, &u, &mut ledger, ctx).unwrap());
        assert!(ledger.is_fulfilled("a-0"));
        assert_eq!(bins[0].cuts.len(), 2);
        assert_eq!(bins[0].cuts[1].x, 500);
        assert!((total_length(&bins, "a-0") - 35.0).abs() < LENGTH_EPSILON);
    }

    #[test]
    fn test_never_splits_width() {
        let rolls = vec![roll("r1", 600, 10.0), roll("r2", 600, 10.0)];
        let u = units(&[Request::new("a", "M1", 1000, 15.0, 1, Priority::Normal)]);
        let mut bins = Vec::new();
        let mut ledger = DemandLedger::new(&u);

        let done = with_ctx(|ctx| resolve(&mut bins, &rolls, &u, &mut ledger, ctx).unwrap());
        assert_eq!(done, 0);
        assert!(bins.is_empty());
        assert_eq!(ledger.state("a-0"), FulfillmentState::Pending);
    }

    #[test]
    fn test_cancelled() {
        let rolls = vec![roll("r10", 1000, 10.0), roll("r20", 1000, 20.0)];
        let u = units(&[Request::new("a", "M1", 1000, 25.0, 1, Priority::Normal)]);
        let run = RunOptions::default();
        let cancel = CancelToken::default();
        cancel.cancel();
        let ctx = PackContext {
            run: &run,
            reference_time: Utc::now(),
            cancel: &cancel,
        };
        let mut bins = Vec::new();
        let mut ledger = DemandLedger::new(&u);
        let err = resolve(&mut bins, &rolls, &u, &mut ledger, &ctx).unwrap_err();
        assert!(matches!(err, crate::error::OptimizeError::Cancelled));
    }
}

use super::{PackContext, remove_taken, rolls_by_width_desc};
use crate::config::MultiObjectiveOptions;
use crate::error::Result;
use crate::roll_bin::RollBin;
use crate::types::{RequestUnit, Roll};

pub fn score(unit: &RequestUnit, opts: &MultiObjectiveOptions) -> f64 {
    opts.priority_weights.weight(unit.priority) * (unit.width as f64 / 1000.0)
}

pub(crate) fn pack(
    rolls: &[Roll],
    units: &[RequestUnit],
    opts: &MultiObjectiveOptions,
    ctx: &PackContext<'_>,
) -> Result<Vec<RollBin>> {
    let sum = opts.weights.sum();
    if (sum - 1.0).abs() > 1e-6 {
        tracing::warn!(
            waste = opts.weights.waste,
            priority = opts.weights.priority,
            rolls = opts.weights.rolls,
            sum,
            "objective weights do not sum to 1.0"
        );
    }

    let mut pool: Vec<(f64, &RequestUnit)> = units.iter().map(|u| (score(u, opts), u)).collect();
    pool.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut bins = Vec::new();
    for roll in rolls_by_width_desc(rolls) {
        ctx.checkpoint()?;
        if pool.is_empty() {
            break;
        }

        let mut bin = RollBin::new(roll);
        let mut taken = Vec::new();
        for (i, (_, unit)) in pool.iter().enumerate() {
            if bin.free_width() == 0 {
                break;
            }
            if bin.fits_width(unit.width) {
                bin.place(unit);
                taken.push(i);
            }
        }

        if !bin.is_empty() {
            remove_taken(&mut pool, &taken);
            bins.push(bin);
        }
    }
    Ok(bins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ObjectiveWeights, RunOptions};
    use crate::solver::CancelToken;
    use crate::test_support::{roll, units};
    use crate::types::{Priority, Request};
    use chrono::Utc;

    #[test]
    fn test_score_blends_priority_and_width() {
        let opts = MultiObjectiveOptions::default();
        let u = units(&[
            Request::new("hi", "M1", 300, 1.0, 1, Priority::High),
            Request::new("lo", "M1", 800, 1.0, 1, Priority::Low),
        ]);
        assert!((score(&u[0], &opts) - 0.9).abs() < 1e-9);
        assert!((score(&u[1], &opts) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_fills_by_score() {
        let rolls = vec![roll("r1", 1000, 10.0)];
        let u = units(&[
            Request::new("lo", "M1", 800, 5.0, 1, Priority::Low),
            Request::new("hi", "M1", 300, 5.0, 1, Priority::High),
            Request::new("mid", "M1", 400, 5.0, 1, Priority::Normal),
        ]);
        let run = RunOptions::default();
        let cancel = CancelToken::default();
        let ctx = PackContext {
            run: &run,
            reference_time: Utc::now(),
            cancel: &cancel,
        };
        let bins = pack(&rolls, &u, &MultiObjectiveOptions::default(), &ctx).unwrap();
        // hi 0.9, lo 0.8, mid 0.8: hi first, then lo (earlier of the tie) does not fit, mid does.
        let ids: Vec<&str> = bins[0].cuts.iter().map(|c| c.unit_id.as_str()).collect();
        assert_eq!(ids, vec!["hi-0", "mid-0"]);
    }

    #[test]
    fn test_unbalanced_weights_still_pack() {
        let rolls = vec![roll("r1", 1000, 10.0), roll("r2", 600, 10.0)];
        let u = units(&[
            Request::new("a", "M1", 500, 5.0, 2, Priority::Urgent),
            Request::new("b", "M1", 400, 5.0, 1, Priority::Low),
        ]);
        let run = RunOptions::default();
        let cancel = CancelToken::default();
        let ctx = PackContext {
            run: &run,
            reference_time: Utc::now(),
            cancel: &cancel,
        };
        let unbalanced = MultiObjectiveOptions {
            weights: ObjectiveWeights {
                waste: 0.3,
                priority: 0.3,
                rolls: 0.1,
            },
            ..MultiObjectiveOptions::default()
        };
        assert!((unbalanced.weights.sum() - 0.7).abs() < 1e-9);

        let lane_ids = |bins: &[RollBin]| -> Vec<Vec<String>> {
            bins.iter()
                .map(|b| b.cuts.iter().map(|c| c.unit_id.clone()).collect())
                .collect()
        };
        let got = pack(&rolls, &u, &unbalanced, &ctx).unwrap();
        let expected = pack(&rolls, &u, &MultiObjectiveOptions::default(), &ctx).unwrap();
        assert_eq!(lane_ids(&got), lane_ids(&expected));
        assert_eq!(got.iter().map(|b| b.cuts.len()).sum::<usize>(), 3);
    }
}

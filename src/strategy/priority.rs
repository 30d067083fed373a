use chrono::{DateTime, Utc};

use super::{PackContext, remove_taken, rolls_by_area_desc};
use crate::config::PriorityOptions;
use crate::error::Result;
use crate::roll_bin::RollBin;
use crate::types::{RequestUnit, Roll};

/// `weight(priority) + size bonus + deadline bonus - small order penalty`.
pub fn score(unit: &RequestUnit, opts: &PriorityOptions, now: DateTime<Utc>) -> f64 {
    let area = unit.area();
    let size_bonus = if opts.size_bonus_divisor > 0.0 {
        area / opts.size_bonus_divisor
    } else {
        0.0
    };
    let deadline_bonus = unit
        .deadline
        .map(|d| {
            let days = (d - now).num_seconds() as f64 / 86_400.0;
            opts.deadline_bonus.bonus(days)
        })
        .unwrap_or(0.0);
    let penalty = if area < opts.small_order_area {
        opts.small_order_penalty
    } else {
        0.0
    };
    opts.weights.weight(unit.priority) + size_bonus + deadline_bonus - penalty
}

pub(crate) fn pack(
    rolls: &[Roll],
    units: &[RequestUnit],
    opts: &PriorityOptions,
    ctx: &PackContext<'_>,
) -> Result<Vec<RollBin>> {
    let mut pool: Vec<(f64, &RequestUnit)> = units
        .iter()
        .map(|u| (score(u, opts, ctx.reference_time), u))
        .collect();
    pool.sort_by(|a, b| b.0.total_cmp(&a.0).then(b.1.area().total_cmp(&a.1.area())));

    let mut bins = Vec::new();
    for roll in rolls_by_area_desc(rolls) {
        ctx.checkpoint()?;
        if pool.is_empty() {
            break;
        }

        let mut bin = RollBin::new(roll);
        let mut taken = Vec::new();
        for (i, (_, unit)) in pool.iter().enumerate() {
            if bin.fits_width(unit.width) {
                bin.place(unit);
                taken.push(i);
                if bin.free_width() == 0 {
                    break;
                }
            }
        }

        if !bin.is_empty() {
            tracing::debug!(
                roll = %bin.roll.id,
                cuts = bin.cuts.len(),
                free_width = bin.free_width(),
                "priority pattern"
            );
            remove_taken(&mut pool, &taken);
            bins.push(bin);
        }
    }
    Ok(bins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunOptions;
    use crate::solver::CancelToken;
    use crate::test_support::{roll, units};
    use crate::types::{Priority, Request};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    fn run(rolls: &[Roll], requests: &[Request]) -> Vec<RollBin> {
        let run = RunOptions::default();
        let cancel = CancelToken::default();
        let ctx = PackContext {
            run: &run,
            reference_time: now(),
            cancel: &cancel,
        };
        pack(rolls, &units(requests), &PriorityOptions::default(), &ctx).unwrap()
    }

    #[test]
    fn test_score_components() {
        let opts = PriorityOptions::default();
        let u = Request::new("a", "M1", 400, 50.0, 1, Priority::High).expand(0).remove(0);
        assert!((score(&u, &opts, now()) - (80.0 + 20.0)).abs() < 1e-9);

        let small = Request::new("s", "M1", 10, 5.0, 1, Priority::Low).expand(0).remove(0);
        assert!((score(&small, &opts, now()) - (20.0 + 0.05 - 10.0)).abs() < 1e-9);
    }

    #[test]
    fn test_deadline_raises_score() {
        let opts = PriorityOptions::default();
        let base = Request::new("a", "M1", 400, 50.0, 1, Priority::Normal);
        let later = base.clone().with_deadline(now() + Duration::days(30));
        let soon = base.clone().with_deadline(now() + Duration::hours(12));
        let overdue = base.with_deadline(now() - Duration::days(1));
        let s = |r: &Request| score(&r.expand(0)[0], &opts, now());
        assert!(s(&overdue) > s(&soon));
        assert!(s(&soon) > s(&later));
    }

    #[test]
    fn test_high_priority_wins_the_roll() {
        let rolls = vec![roll("r1", 1000, 100.0)];
        let requests = vec![
            Request::new("B", "M1", 700, 50.0, 1, Priority::Low),
            Request::new("A", "M1", 400, 50.0, 1, Priority::High),
        ];
        let bins = run(&rolls, &requests);
        assert_eq!(bins.len(), 1);
        let ids: Vec<&str> = bins[0].cuts.iter().map(|c| c.unit_id.as_str()).collect();
        assert_eq!(ids, vec!["A-0"]);
    }

    #[test]
    fn test_no_backtracking_within_a_roll() {
        // 600 goes first, 500 is skipped, 400 fills the rest; 500 is not retried.
        let rolls = vec![roll("r1", 1000, 10.0)];
        let requests = vec![
            Request::new("a", "M1", 600, 5.0, 1, Priority::Urgent),
            Request::new("b", "M1", 500, 5.0, 1, Priority::High),
            Request::new("c", "M1", 400, 5.0, 1, Priority::Low),
        ];
        let bins = run(&rolls, &requests);
        let ids: Vec<&str> = bins[0].cuts.iter().map(|c| c.unit_id.as_str()).collect();
        assert_eq!(ids, vec!["a-0", "c-0"]);
    }

    #[test]
    fn test_larger_rolls_first() {
        let rolls = vec![roll("small", 1000, 10.0), roll("big", 1000, 90.0)];
        let requests = vec![Request::new("a", "M1", 300, 5.0, 1, Priority::Normal)];
        let bins = run(&rolls, &requests);
        assert_eq!(bins[0].roll.id, "big");
    }
}

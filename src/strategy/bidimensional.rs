use super::{PackContext, rolls_by_area_desc};
use crate::error::Result;
use crate::roll_bin::RollBin;
use crate::types::{LENGTH_EPSILON, RequestUnit, Roll};

/// Simplified non-overlap test: lanes must fit side by side across the width and
/// the longest lane, candidate included, must fit along the roll.
pub(crate) fn can_place(bin: &RollBin, unit: &RequestUnit) -> bool {
    bin.fits_width(unit.width)
        && bin.max_cut_length().max(unit.length) <= bin.roll.length + LENGTH_EPSILON
}

pub(crate) fn pack(rolls: &[Roll], units: &[RequestUnit], ctx: &PackContext<'_>) -> Result<Vec<RollBin>> {
    let mut pool: Vec<&RequestUnit> = units.iter().collect();
    pool.sort_by(|a, b| b.area().total_cmp(&a.area()));

    let mut bins = Vec::new();
    for roll in rolls_by_area_desc(rolls) {
        ctx.checkpoint()?;
        if pool.is_empty() {
            break;
        }

        let mut bin = RollBin::new(roll);
        let mut i = 0;
        while i < pool.len() && bin.free_width() > 0 {
            if can_place(&bin, pool[i]) {
                let unit = pool.remove(i);
                bin.place(unit);
            } else {
                i += 1;
            }
        }

        if !bin.is_empty() {
            tracing::debug!(
                roll = %bin.roll.id,
                cuts = bin.cuts.len(),
                area_efficiency = bin.area_efficiency(),
                "bidimensional pattern"
            );
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
    use crate::test_support::{roll, unit, units};
    use crate::types::{Priority, Request};
    use chrono::Utc;

    fn run(rolls: &[Roll], requests: &[Request]) -> Vec<RollBin> {
        let run = RunOptions::default();
        let cancel = CancelToken::default();
        let ctx = PackContext {
            run: &run,
            reference_time: Utc::now(),
            cancel: &cancel,
        };
        pack(rolls, &units(requests), &ctx).unwrap()
    }

    #[test]
    fn test_can_place_checks_both_dimensions() {
        let mut bin = RollBin::new(roll("r1", 1000, 20.0));
        assert!(can_place(&bin, &unit("a", 600, 20.0)));
        assert!(!can_place(&bin, &unit("a", 600, 20.5)));
        bin.place(&unit("a", 600, 15.0));
        assert!(can_place(&bin, &unit("b", 400, 20.0)));
        assert!(!can_place(&bin, &unit("b", 401, 1.0)));
    }

    #[test]
    fn test_never_cuts_past_roll_length() {
        let rolls = vec![roll("r1", 1000, 10.0)];
        let bins = run(&rolls, &[Request::new("a", "M1", 500, 25.0, 1, Priority::High)]);
        assert!(bins.is_empty());
    }

    #[test]
    fn test_area_order() {
        // The 300x40 unit (12000) outranks the 500x10 unit (5000) even though it is narrower.
        let rolls = vec![roll("r1", 700, 50.0)];
        let bins = run(
            &rolls,
            &[
                Request::new("wide", "M1", 500, 10.0, 1, Priority::Normal),
                Request::new("long", "M1", 300, 40.0, 1, Priority::Normal),
            ],
        );
        let ids: Vec<&str> = bins[0].cuts.iter().map(|c| c.unit_id.as_str()).collect();
        assert_eq!(ids, vec!["long-0"]);
    }
}

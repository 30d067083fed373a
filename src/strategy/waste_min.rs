use super::{PackContext, rolls_by_width_desc};
use crate::accounting::layout_waste;
use crate::config::{FitMode, RemainderThresholds, WasteMinOptions};
use crate::error::Result;
use crate::roll_bin::RollBin;
use crate::types::{RequestUnit, Roll};

pub(crate) fn pack(
    rolls: &[Roll],
    units: &[RequestUnit],
    opts: &WasteMinOptions,
    ctx: &PackContext<'_>,
) -> Result<Vec<RollBin>> {
    match opts.mode {
        FitMode::Ffd => first_fit_decreasing(rolls, units, ctx),
        FitMode::Bfd => best_fit_decreasing(rolls, units, ctx),
        FitMode::Hybrid => {
            let ffd = first_fit_decreasing(rolls, units, ctx)?;
            let bfd = best_fit_decreasing(rolls, units, ctx)?;
            Ok(pick_lower_waste(ffd, bfd, &ctx.run.remainder))
        }
    }
}

/// Keeps whichever layout wastes less after classification; ties keep first-fit.
pub(crate) fn pick_lower_waste(
    ffd: Vec<RollBin>,
    bfd: Vec<RollBin>,
    thresholds: &RemainderThresholds,
) -> Vec<RollBin> {
    let ffd_waste = layout_waste(&ffd, thresholds);
    let bfd_waste = layout_waste(&bfd, thresholds);
    tracing::debug!(ffd_waste, bfd_waste, "hybrid waste comparison");
    if ffd_waste <= bfd_waste { ffd } else { bfd }
}

fn units_by_width_desc(units: &[RequestUnit]) -> Vec<&RequestUnit> {
    let mut sorted: Vec<&RequestUnit> = units.iter().collect();
    sorted.sort_by(|a, b| b.width.cmp(&a.width));
    sorted
}

/// Each roll takes every remaining unit that still fits, in decreasing width order.
pub(crate) fn first_fit_decreasing(
    rolls: &[Roll],
    units: &[RequestUnit],
    ctx: &PackContext<'_>,
) -> Result<Vec<RollBin>> {
    let mut pool = units_by_width_desc(units);
    let mut bins = Vec::new();

    for roll in rolls_by_width_desc(rolls) {
        ctx.checkpoint()?;
        if pool.is_empty() {
            break;
        }

        let mut bin = RollBin::new(roll);
        let mut i = 0;
        while i < pool.len() && bin.free_width() > 0 {
            if bin.fits_width(pool[i].width) {
                let unit = pool.remove(i);
                bin.place(unit);
            } else {
                i += 1;
            }
        }

        if !bin.is_empty() {
            bins.push(bin);
        }
    }
    Ok(bins)
}

/// Each roll repeatedly takes the unit leaving the least free width; ties go to
/// the earlier unit in decreasing width order.
pub(crate) fn best_fit_decreasing(
    rolls: &[Roll],
    units: &[RequestUnit],
    ctx: &PackContext<'_>,
) -> Result<Vec<RollBin>> {
    let mut pool = units_by_width_desc(units);
    let mut bins = Vec::new();

    for roll in rolls_by_width_desc(rolls) {
        ctx.checkpoint()?;
        if pool.is_empty() {
            break;
        }

        let mut bin = RollBin::new(roll);
        while let Some(idx) = best_fit_index(bin.free_width(), &pool) {
            let unit = pool.remove(idx);
            bin.place(unit);
        }

        if !bin.is_empty() {
            bins.push(bin);
        }
    }
    Ok(bins)
}

pub(crate) fn best_fit_index(free_width: u32, pool: &[&RequestUnit]) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;
    for (i, u) in pool.iter().enumerate() {
        if u.width > free_width {
            continue;
        }
        let leftover = free_width - u.width;
        if best.is_none_or(|(_, b)| leftover < b) {
            best = Some((i, leftover));
        }
    }
    best.map(|(i, _)| i)
}

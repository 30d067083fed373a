use super::{PackContext, remove_taken};
use crate::config::ColumnGenOptions;
use crate::error::Result;
use crate::roll_bin::RollBin;
use crate::strategy::waste_min::best_fit_index;
use crate::types::{RequestUnit, Roll};

struct Candidate {
    roll_idx: usize,
    bin: RollBin,
    taken: Vec<usize>,
    score: f64,
}

/// Best-fit sub-procedure: builds one pattern for `roll` from `pool`, returning
/// the bin and the pool indices it consumed.
fn best_fit_pattern(roll: &Roll, pool: &[&RequestUnit]) -> (RollBin, Vec<usize>) {
    let mut bin = RollBin::new(roll.clone());
    let mut remaining: Vec<(usize, &RequestUnit)> = pool.iter().copied().enumerate().collect();
    let mut taken = Vec::new();

    loop {
        let view: Vec<&RequestUnit> = remaining.iter().map(|(_, u)| *u).collect();
        let Some(pick) = best_fit_index(bin.free_width(), &view) else {
            break;
        };
        let (idx, unit) = remaining.remove(pick);
        bin.place(unit);
        taken.push(idx);
    }
    (bin, taken)
}

pub(crate) fn pattern_score(bin: &RollBin) -> f64 {
    bin.width_efficiency() + 10.0 * bin.cuts.len() as f64
}

pub(crate) fn pack(
    rolls: &[Roll],
    units: &[RequestUnit],
    opts: &ColumnGenOptions,
    ctx: &PackContext<'_>,
) -> Result<Vec<RollBin>> {
    let mut pool: Vec<&RequestUnit> = units.iter().collect();
    pool.sort_by(|a, b| b.priority.cmp(&a.priority).then(b.width.cmp(&a.width)));
    let mut available: Vec<Roll> = rolls.to_vec();
    let mut bins = Vec::new();

    for iteration in 0..opts.max_iterations {
        if pool.is_empty() || available.is_empty() || bins.len() >= opts.max_patterns {
            break;
        }

        let mut best: Option<Candidate> = None;
        for (roll_idx, roll) in available.iter().enumerate() {
            ctx.checkpoint()?;
            let (bin, taken) = best_fit_pattern(roll, &pool);
            if bin.is_empty() {
                continue;
            }
            let score = pattern_score(&bin);
            if best.as_ref().is_none_or(|b| score > b.score + opts.tolerance) {
                best = Some(Candidate {
                    roll_idx,
                    bin,
                    taken,
                    score,
                });
            }
        }

        let Some(best) = best else {
            tracing::debug!(iteration, "no roll yields a cut, stopping");
            break;
        };
        tracing::debug!(
            iteration,
            roll = %best.bin.roll.id,
            score = best.score,
            cuts = best.bin.cuts.len(),
            "column generation picked pattern"
        );
        remove_taken(&mut pool, &best.taken);
        available.remove(best.roll_idx);
        bins.push(best.bin);
    }
    Ok(bins)
}

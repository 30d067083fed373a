use std::collections::{BTreeMap, VecDeque};

use super::{PackContext, rolls_by_width_desc};
use crate::config::RollMinOptions;
use crate::error::Result;
use crate::roll_bin::RollBin;
use crate::types::{RequestUnit, Roll};

fn bucket_key(width: u32, bucket_mm: u32) -> u32 {
    let step = bucket_mm.max(1);
    width / step * step
}

pub(crate) fn pack(
    rolls: &[Roll],
    units: &[RequestUnit],
    opts: &RollMinOptions,
    ctx: &PackContext<'_>,
) -> Result<Vec<RollBin>> {
    let mut buckets: BTreeMap<u32, VecDeque<&RequestUnit>> = BTreeMap::new();
    for u in units {
        buckets
            .entry(bucket_key(u.width, opts.bucket_mm))
            .or_default()
            .push_back(u);
    }

    let mut bins = Vec::new();
    for roll in rolls_by_width_desc(rolls) {
        ctx.checkpoint()?;
        if buckets.values().all(|q| q.is_empty()) {
            break;
        }

        let mut bin = RollBin::new(roll);
        let mut taken: Vec<(u32, &RequestUnit)> = Vec::new();
        for (&key, queue) in buckets.iter_mut().rev() {
            while queue.front().is_some_and(|u| bin.fits_width(u.width)) {
                let Some(u) = queue.pop_front() else { break };
                bin.place(u);
                taken.push((key, u));
            }
        }

        if bin.is_empty() {
            continue;
        }

        let waste_fraction = bin.free_width() as f64 / bin.roll.width as f64;
        if waste_fraction <= opts.waste_limit {
            bins.push(bin);
        } else {
            tracing::debug!(
                roll = %bin.roll.id,
                waste_fraction,
                limit = opts.waste_limit,
                "pattern over waste limit, roll left unused"
            );
            for (key, u) in taken.into_iter().rev() {
                buckets.entry(key).or_default().push_front(u);
            }
        }
    }
    Ok(bins)
}

use std::collections::HashMap;

use crate::types::{LENGTH_EPSILON, Pattern, Plan, Priority, Request, RequestUnit, Roll};

pub(crate) fn unit(id: &str, width: u32, length: f64) -> RequestUnit {
    Request::new(id, "M1", width, length, 1, Priority::Normal)
        .expand(0)
        .remove(0)
}

pub(crate) fn units(requests: &[Request]) -> Vec<RequestUnit> {
    crate::types::expand_requests(requests)
}

pub(crate) fn roll(id: &str, width: u32, length: f64) -> Roll {
    Roll::new(id, "M1", width, length)
}

pub(crate) fn assert_closed(p: &Pattern) {
    let total = p.roll.area();
    let sum = p.waste + p.used_area + p.remainder_area;
    assert!(
        (sum - total).abs() <= 1e-6 * total.max(1.0),
        "roll {}: waste {} + used {} + remainder {} != {}",
        p.roll.id,
        p.waste,
        p.used_area,
        p.remainder_area,
        total
    );
}

/// Validates a complete plan:
/// 1. Area closure on every pattern
/// 2. No cut wider than its roll, lanes never exceed the roll width
/// 3. Fulfilled + unfulfilled == total units, and every fulfilled unit's cuts
///    add up to its requested length
pub(crate) fn assert_plan_valid(plan: &Plan) {
    let mut placed: HashMap<&str, (f64, f64)> = HashMap::new();

    for (pi, p) in plan.patterns().enumerate() {
        assert_closed(p);
        let lane_sum: u32 = p.cuts.iter().map(|c| c.width).sum();
        assert!(
            lane_sum <= p.roll.width,
            "pattern {pi} on {}: lanes {} > roll width {}",
            p.roll.id,
            lane_sum,
            p.roll.width
        );
        for c in &p.cuts {
            assert!(c.width <= p.roll.width, "cut {} wider than roll", c.unit_id);
            assert!(
                c.length <= p.roll.length + LENGTH_EPSILON,
                "cut {} longer than roll",
                c.unit_id
            );
            let e = placed.entry(&c.unit_id).or_insert((0.0, c.requested_length));
            e.0 += c.length;
        }
        assert!((0.0..=100.0).contains(&p.efficiency));
    }

    let s = &plan.statistics;
    assert_eq!(
        s.fulfilled_requests + plan.unfulfilled.len(),
        s.total_requests,
        "fulfilled {} + unfulfilled {} != total {}",
        s.fulfilled_requests,
        plan.unfulfilled.len(),
        s.total_requests
    );
    assert!(s.fulfilled_requests <= s.total_requests);
    assert!((0.0..=100.0).contains(&s.efficiency), "efficiency {}", s.efficiency);

    let fulfilled = placed
        .iter()
        .filter(|(_, (got, want))| (got - want).abs() <= LENGTH_EPSILON)
        .count();
    assert_eq!(fulfilled, s.fulfilled_requests, "fulfilled count vs cut lengths");

    for u in &plan.unfulfilled {
        if let Some((got, _)) = placed.get(u.unit_id.as_str()) {
            assert!(
                (u.residual_length - (u.requested_length - got)).abs() <= LENGTH_EPSILON,
                "residual of {} does not match its cuts",
                u.unit_id
            );
        }
    }
}

pub(crate) fn fulfilled_ids(plan: &Plan) -> Vec<String> {
    let mut ids: Vec<String> = plan
        .fulfillment
        .iter()
        .filter(|f| f.fulfilled > 0)
        .map(|f| f.request_id.clone())
        .collect();
    ids.sort();
    ids
}

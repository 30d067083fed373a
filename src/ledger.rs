use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::roll_bin::RollBin;
use crate::types::{Cut, LENGTH_EPSILON, RequestUnit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentState {
    Pending,
    PartiallyCut,
    Fulfilled,
    Unfulfillable,
}

#[derive(Debug, Clone)]
struct Entry {
    requested: f64,
    placed: f64,
    segments: u32,
    unfulfillable: bool,
}

/// Remaining demand per expanded unit id for one material run.
#[derive(Debug, Clone, Default)]
pub struct DemandLedger {
    entries: HashMap<String, Entry>,
}

impl DemandLedger {
    pub fn new(units: &[RequestUnit]) -> Self {
        let entries = units
            .iter()
            .map(|u| {
                (
                    u.id.clone(),
                    Entry {
                        requested: u.length,
                        placed: 0.0,
                        segments: 0,
                        unfulfillable: false,
                    },
                )
            })
            .collect();
        Self { entries }
    }

    pub fn from_bins(units: &[RequestUnit], bins: &[RollBin]) -> Self {
        let mut ledger = Self::new(units);
        for cut in bins.iter().flat_map(|b| &b.cuts) {
            ledger.record(cut);
        }
        ledger
    }

    pub fn record(&mut self, cut: &Cut) {
        if let Some(e) = self.entries.get_mut(&cut.unit_id) {
            e.placed += cut.length;
            e.segments += 1;
        }
    }

    pub fn mark_unfulfillable(&mut self, unit_id: &str) {
        if let Some(e) = self.entries.get_mut(unit_id) {
            e.unfulfillable = true;
        }
    }

    /// Length still owed on `unit_id`; zero for unknown ids.
    pub fn owed(&self, unit_id: &str) -> f64 {
        self.entries
            .get(unit_id)
            .map(|e| (e.requested - e.placed).max(0.0))
            .unwrap_or(0.0)
    }

    pub fn segments(&self, unit_id: &str) -> u32 {
        self.entries.get(unit_id).map(|e| e.segments).unwrap_or(0)
    }

    pub fn is_fulfilled(&self, unit_id: &str) -> bool {
        self.state(unit_id) == FulfillmentState::Fulfilled
    }

    pub fn state(&self, unit_id: &str) -> FulfillmentState {
        let Some(e) = self.entries.get(unit_id) else {
            return FulfillmentState::Pending;
        };
        if e.requested - e.placed <= LENGTH_EPSILON {
            FulfillmentState::Fulfilled
        } else if e.unfulfillable {
            FulfillmentState::Unfulfillable
        } else if e.segments > 0 {
            FulfillmentState::PartiallyCut
        } else {
            FulfillmentState::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{roll, unit};

    #[test]
    fn test_states() {
        let units = vec![unit("a", 500, 25.0), unit("b", 400, 5.0), unit("c", 100, 1.0)];
        let mut bin = RollBin::new(roll("r1", 1000, 10.0));
        bin.place(&units[0]);
        bin.place(&units[1]);
        let mut ledger = DemandLedger::from_bins(&units, &[bin]);

        assert_eq!(ledger.state("a-0"), FulfillmentState::PartiallyCut);
        assert!((ledger.owed("a-0") - 15.0).abs() < LENGTH_EPSILON);
        assert_eq!(ledger.state("b-0"), FulfillmentState::Fulfilled);
        assert_eq!(ledger.state("c-0"), FulfillmentState::Pending);
        assert_eq!(ledger.owed("c-0"), 1.0);

        ledger.mark_unfulfillable("c-0");
        assert_eq!(ledger.state("c-0"), FulfillmentState::Unfulfillable);
    }

    #[test]
    fn test_unknown_unit() {
        let ledger = DemandLedger::new(&[]);
        assert_eq!(ledger.owed("x-0"), 0.0);
        assert_eq!(ledger.segments("x-0"), 0);
        assert!(!ledger.is_fulfilled("x-0"));
    }
}

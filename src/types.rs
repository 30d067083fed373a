use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tolerance used whenever two lengths (metres) are compared.
pub const LENGTH_EPSILON: f64 = 1e-6;

/// A stocked roll. Width in millimetres, length in metres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roll {
    pub id: String,
    pub material: String,
    pub width: u32,
    pub length: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<String>,
}

impl Roll {
    pub fn new(id: impl Into<String>, material: impl Into<String>, width: u32, length: f64) -> Self {
        Self {
            id: id.into(),
            material: material.into(),
            width,
            length,
            weight: None,
            batch: None,
        }
    }

    /// Total area in mm·m.
    pub fn area(&self) -> f64 {
        self.width as f64 * self.length
    }
}

impl std::fmt::Display for Roll {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}] {}mm x {}m", self.id, self.material, self.width, self.length)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[serde(alias = "1")]
    Low,
    #[default]
    #[serde(alias = "medium", alias = "2")]
    Normal,
    #[serde(alias = "3")]
    High,
    #[serde(alias = "4")]
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Normal,
        Priority::High,
        Priority::Urgent,
    ];
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        };
        f.write_str(s)
    }
}

/// A demand for `quantity` pieces of `width` x `length` in one material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: String,
    #[serde(default)]
    pub order_ref: String,
    pub material: String,
    pub width: u32,
    pub length: f64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
}

fn default_quantity() -> u32 {
    1
}

impl Request {
    pub fn new(
        id: impl Into<String>,
        material: impl Into<String>,
        width: u32,
        length: f64,
        quantity: u32,
        priority: Priority,
    ) -> Self {
        let id = id.into();
        Self {
            order_ref: id.clone(),
            id,
            material: material.into(),
            width,
            length,
            quantity,
            priority,
            deadline: None,
        }
    }

    pub fn with_order_ref(mut self, order_ref: impl Into<String>) -> Self {
        self.order_ref = order_ref.into();
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Expands into `quantity` units with ids `"{id}-{n}"`.
    pub fn expand(&self, first_seq: usize) -> Vec<RequestUnit> {
        (0..self.quantity)
            .map(|n| RequestUnit {
                id: format!("{}-{}", self.id, n),
                request_id: self.id.clone(),
                order_ref: self.order_ref.clone(),
                material: self.material.clone(),
                width: self.width,
                length: self.length,
                priority: self.priority,
                deadline: self.deadline,
                seq: first_seq + n as usize,
            })
            .collect()
    }
}

/// One quantity-1 unit of a [`Request`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestUnit {
    pub id: String,
    pub request_id: String,
    pub order_ref: String,
    pub material: String,
    pub width: u32,
    pub length: f64,
    pub priority: Priority,
    pub deadline: Option<DateTime<Utc>>,
    pub seq: usize,
}

impl RequestUnit {
    pub fn area(&self) -> f64 {
        self.width as f64 * self.length
    }
}

pub fn expand_requests(requests: &[Request]) -> Vec<RequestUnit> {
    let mut units = Vec::new();
    for r in requests {
        let next = units.len();
        units.extend(r.expand(next));
    }
    units
}

pub fn total_units(requests: &[Request]) -> usize {
    requests.iter().map(|r| r.quantity as usize).sum()
}

/// Placement of (part of) one request unit on one roll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cut {
    pub unit_id: String,
    pub request_id: String,
    pub order_ref: String,
    pub width: u32,
    pub length: f64,
    pub requested_length: f64,
    /// Offset across the roll width, mm.
    pub x: u32,
    /// Offset along the roll length, m.
    pub y: f64,
    /// Length still owed on the unit right after this cut was made.
    pub remaining_length: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collage_index: Option<u32>,
}

impl Cut {
    pub fn area(&self) -> f64 {
        self.width as f64 * self.length
    }

    pub fn is_partial(&self) -> bool {
        self.remaining_length > LENGTH_EPSILON
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PieceKind {
    WidthStrip,
    LengthStrip,
}

/// Leftover block large enough to go back to inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemainingPiece {
    pub width: u32,
    pub length: f64,
    pub x: u32,
    pub y: f64,
    pub kind: PieceKind,
}

impl RemainingPiece {
    pub fn area(&self) -> f64 {
        self.width as f64 * self.length
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub roll: Roll,
    pub cuts: Vec<Cut>,
    pub used_width: u32,
    pub used_area: f64,
    pub waste: f64,
    pub remainder_area: f64,
    pub remaining_pieces: Vec<RemainingPiece>,
    pub efficiency: f64,
    pub is_length_collage: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialStats {
    pub efficiency: f64,
    pub total_waste: f64,
    pub total_remainder: f64,
    pub rolls_used: usize,
    pub fulfilled_requests: usize,
    pub total_requests: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialPlan {
    pub material: String,
    pub patterns: Vec<Pattern>,
    pub statistics: MaterialStats,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierStats {
    pub total: usize,
    pub fulfilled: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub efficiency: f64,
    pub total_waste: f64,
    pub total_remainder: f64,
    pub rolls_used: usize,
    pub total_rolls: usize,
    pub fulfilled_requests: usize,
    pub total_requests: usize,
    pub by_priority: BTreeMap<Priority, TierStats>,
}

/// Per original request: how many of its units were fulfilled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFulfillment {
    pub request_id: String,
    pub order_ref: String,
    pub requested: u32,
    pub fulfilled: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitState {
    Pending,
    PartiallyCut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnfulfilledReason {
    /// No roll of the unit's material was supplied.
    NoMatchingRolls,
    /// The strategy left the unit unplaced.
    NotPlaced,
    /// A length collage was attempted but the candidate rolls were too short.
    InsufficientLength,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnfulfilledUnit {
    pub unit_id: String,
    pub request_id: String,
    pub material: String,
    pub width: u32,
    pub requested_length: f64,
    pub residual_length: f64,
    pub state: UnitState,
    pub reason: UnfulfilledReason,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub strategy: String,
    pub materials: Vec<MaterialPlan>,
    pub statistics: Statistics,
    pub fulfillment: Vec<RequestFulfillment>,
    pub unfulfilled: Vec<UnfulfilledUnit>,
}

impl Plan {
    pub fn patterns(&self) -> impl Iterator<Item = &Pattern> {
        self.materials.iter().flat_map(|m| &m.patterns)
    }

    pub fn unfulfilled_count(&self) -> usize {
        self.unfulfilled.len()
    }
}

//! Classifies every unit of roll area as used, remainder or waste.

use serde::{Deserialize, Serialize};

use crate::config::RemainderThresholds;
use crate::roll_bin::RollBin;
use crate::types::{LENGTH_EPSILON, Pattern, PieceKind, RemainingPiece};

/// What a pattern's efficiency percentage is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EfficiencyBasis {
    Width,
    Area,
}

/// Turns a filled bin into a [`Pattern`].
///
/// Area is split into:
/// - used: the cuts themselves;
/// - width strip: `roll.width - used_width` by the longest cut, always a remainder;
/// - length strip: full width past the longest cut, a remainder when it meets
///   `thresholds`, waste otherwise;
/// - lane tails: the part of each lane past its own cut, waste.
///
/// A bin with no cuts is all waste.
pub fn classify(bin: RollBin, thresholds: &RemainderThresholds, basis: EfficiencyBasis) -> Pattern {
    let roll_area = bin.roll.area();
    let efficiency = match basis {
        EfficiencyBasis::Width => bin.width_efficiency(),
        EfficiencyBasis::Area => bin.area_efficiency(),
    };

    if bin.is_empty() {
        return Pattern {
            roll: bin.roll,
            cuts: Vec::new(),
            used_width: 0,
            used_area: 0.0,
            waste: roll_area,
            remainder_area: 0.0,
            remaining_pieces: Vec::new(),
            efficiency: 0.0,
            is_length_collage: false,
        };
    }

    let used_width = bin.used_width();
    let used_area = bin.used_area();
    let max_len = bin.max_cut_length();
    let roll_width = bin.roll.width;
    let roll_length = bin.roll.length;

    let mut waste: f64 = bin
        .cuts
        .iter()
        .map(|c| c.width as f64 * (max_len - c.length))
        .sum();
    let mut pieces = Vec::new();

    if used_width < roll_width && max_len > 0.0 {
        pieces.push(RemainingPiece {
            width: roll_width - used_width,
            length: max_len,
            x: used_width,
            y: 0.0,
            kind: PieceKind::WidthStrip,
        });
    }

    let tail = roll_length - max_len;
    if tail > LENGTH_EPSILON {
        if thresholds.is_useful(roll_width, tail) {
            pieces.push(RemainingPiece {
                width: roll_width,
                length: tail,
                x: 0,
                y: max_len,
                kind: PieceKind::LengthStrip,
            });
        } else {
            waste += roll_width as f64 * tail;
        }
    }

    let remainder_area = pieces.iter().map(|p| p.area()).sum();
    let is_length_collage = bin.cuts.iter().any(|c| c.collage_index.is_some());

    Pattern {
        roll: bin.roll,
        cuts: bin.cuts,
        used_width,
        used_area,
        waste,
        remainder_area,
        remaining_pieces: pieces,
        efficiency,
        is_length_collage,
    }
}

/// Total classified waste of a set of bins, without consuming them.
pub fn layout_waste(bins: &[RollBin], thresholds: &RemainderThresholds) -> f64 {
    bins.iter()
        .map(|b| classify(b.clone(), thresholds, EfficiencyBasis::Width).waste)
        .sum()
}

use crate::types::{Cut, LENGTH_EPSILON, RequestUnit, Roll};

/// Working state of one roll while a strategy fills it.
///
/// Cuts are laid side by side across the width. Each cut owns its lane
/// (width slice) from `y = 0`; the tail of a lane is never handed to another cut.
#[derive(Debug, Clone)]
pub struct RollBin {
    pub roll: Roll,
    pub cuts: Vec<Cut>,
}

impl RollBin {
    pub fn new(roll: Roll) -> Self {
        Self {
            roll,
            cuts: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cuts.is_empty()
    }

    pub fn used_width(&self) -> u32 {
        self.cuts.iter().map(|c| c.width).sum()
    }

    pub fn free_width(&self) -> u32 {
        self.roll.width.saturating_sub(self.used_width())
    }

    pub fn fits_width(&self, width: u32) -> bool {
        width <= self.free_width()
    }

    pub fn used_area(&self) -> f64 {
        self.cuts.iter().map(|c| c.area()).sum()
    }

    pub fn max_cut_length(&self) -> f64 {
        self.cuts.iter().map(|c| c.length).fold(0.0, f64::max)
    }

    /// Length a new lane would get on this roll.
    pub fn lane_length(&self) -> f64 {
        self.roll.length
    }

    /// Places as much of `unit` as the lane allows. A unit longer than the roll is
    /// cut to the roll length and the shortfall is recorded on the cut.
    pub fn place(&mut self, unit: &RequestUnit) -> &Cut {
        let length = unit.length.min(self.lane_length());
        self.place_segment(unit, length, unit.length - length, None)
    }

    /// Places a lane of exactly `length` for `unit`.
    pub fn place_segment(
        &mut self,
        unit: &RequestUnit,
        length: f64,
        remaining_after: f64,
        collage_index: Option<u32>,
    ) -> &Cut {
        debug_assert!(self.fits_width(unit.width), "lane wider than free width");
        debug_assert!(length <= self.lane_length() + LENGTH_EPSILON);

        let cut = Cut {
            unit_id: unit.id.clone(),
            request_id: unit.request_id.clone(),
            order_ref: unit.order_ref.clone(),
            width: unit.width,
            length,
            requested_length: unit.length,
            x: self.used_width(),
            y: 0.0,
            remaining_length: remaining_after.max(0.0),
            collage_index,
        };
        let idx = self.cuts.len();
        self.cuts.push(cut);
        &self.cuts[idx]
    }

    /// Width utilization in percent.
    pub fn width_efficiency(&self) -> f64 {
        if self.roll.width == 0 {
            return 0.0;
        }
        (self.used_width() as f64 / self.roll.width as f64 * 100.0).clamp(0.0, 100.0)
    }

    /// Area utilization in percent.
    pub fn area_efficiency(&self) -> f64 {
        let area = self.roll.area();
        if area <= 0.0 {
            return 0.0;
        }
        (self.used_area() / area * 100.0).clamp(0.0, 100.0)
    }
}

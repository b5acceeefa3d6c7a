//! Radial placement of buckets around the draggable's home position.

use lsl_core::{Point, Rect};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;
use crate::error::{ExpResult, ExperimentError, invalid};
use crate::shuffle::{Shuffled, shuffle};

/// `count` points evenly spaced on a circle, the first at `start_angle_deg`.
/// Angles grow clockwise on screen because y points down.
pub fn radial_layout(center: Point, radius: f64, count: usize, start_angle_deg: f64) -> Vec<Point> {
    if count == 0 {
        return Vec::new();
    }
    let step = 360.0 / count as f64;
    (0..count)
        .map(|i| {
            let theta = (start_angle_deg + step * i as f64).to_radians();
            Point::new(
                center.x + radius * theta.cos(),
                center.y + radius * theta.sin(),
            )
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Arena measurements for one viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportGeometry {
    pub center: Point,
    pub box_size: f64,
    pub draggable_size: f64,
    pub droppable_size: f64,
    pub radius: f64,
}

impl ViewportGeometry {
    /// The arena is the largest square that leaves a droppable-sized border inside the
    /// viewport minus the bottom margin; buckets sit on the circle inscribed in it.
    pub fn compute(viewport: Viewport, cfg: &LayoutConfig) -> ExpResult<Self> {
        if !(viewport.width > 0.0 && viewport.height > 0.0) {
            return Err(ExperimentError::Setup(format!(
                "viewport {}x{} has no area",
                viewport.width, viewport.height
            )));
        }
        let usable_height = viewport.height - cfg.bottom_margin;
        let box_size = (viewport.width * (1.0 - cfg.droppable_size_ratio))
            .min(usable_height * (1.0 - cfg.droppable_size_ratio));
        if !(box_size > 0.0) {
            return Err(ExperimentError::Setup(format!(
                "viewport {}x{} leaves no room below a {} px margin",
                viewport.width, viewport.height, cfg.bottom_margin
            )));
        }

        let draggable_size = box_size * cfg.draggable_size_ratio;
        let droppable_size = box_size * cfg.droppable_size_ratio;
        Ok(Self {
            center: Point::new(
                viewport.width / 2.0,
                viewport.height / 2.0 - cfg.bottom_margin,
            ),
            box_size,
            draggable_size,
            droppable_size,
            radius: box_size / 2.0 - droppable_size / 2.0,
        })
    }

    /// Where the draggable starts and returns to after a missed drop.
    pub fn home_rect(&self) -> Rect {
        Rect::centered_square(self.center, self.draggable_size)
    }
}

/// Which semantic bucket sits in which physical slot.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketArrangement {
    /// Slot centers in slot order.
    pub slot_centers: Vec<Point>,
    pub droppable_size: f64,
    /// `display_order[slot]` is the bucket shown in `slot`.
    pub order: Shuffled<usize>,
}

impl BucketArrangement {
    pub fn bucket_count(&self) -> usize {
        self.slot_centers.len()
    }

    pub fn bucket_in_slot(&self, slot: usize) -> Option<usize> {
        self.order.display_order.get(slot).copied()
    }

    pub fn slot_of(&self, bucket: usize) -> Option<usize> {
        self.order.display_order.iter().position(|&b| b == bucket)
    }

    pub fn bucket_rect(&self, bucket: usize) -> Option<Rect> {
        let slot = self.slot_of(bucket)?;
        Some(Rect::centered_square(
            self.slot_centers[slot],
            self.droppable_size,
        ))
    }

    /// Bucket rectangles in semantic order.
    pub fn bucket_rects(&self) -> Vec<Rect> {
        (0..self.bucket_count())
            .filter_map(|b| self.bucket_rect(b))
            .collect()
    }
}

/// Lays `count` buckets on the arena circle, optionally in a random slot order.
pub fn arrange_buckets<R: Rng + ?Sized>(
    geometry: &ViewportGeometry,
    count: usize,
    start_angle_deg: f64,
    randomize: bool,
    rng: &mut R,
) -> ExpResult<BucketArrangement> {
    if count == 0 {
        return invalid("a drag trial needs at least one bucket");
    }
    if !(geometry.droppable_size > 0.0) {
        return Err(ExperimentError::MalformedGeometry(format!(
            "droppable size {} is not positive",
            geometry.droppable_size
        )));
    }

    let slot_centers = radial_layout(geometry.center, geometry.radius, count, start_angle_deg);
    let identity: Vec<usize> = (0..count).collect();
    let order = if randomize {
        shuffle(&identity, rng)
    } else {
        Shuffled::identity(identity)
    };

    Ok(BucketArrangement {
        slot_centers,
        droppable_size: geometry.droppable_size,
        order,
    })
}

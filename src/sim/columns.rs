//! Two-column layout
//!
//! Ranks come from the ascending size order. Walking ranks from the largest
//! down, odd ranks stack in the right column and even ranks in the left one,
//! each column growing downward from the top edge with no gaps.

use std::cmp::Ordering;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::state::{BoxEntity, BoxId};
use crate::settings::Playfield;

/// Side of the playfield a box is stacked against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Column {
    Left,
    Right,
}

impl Column {
    /// Odd ranks go right, even ranks go left
    #[inline]
    pub fn for_rank(rank: usize) -> Self {
        if rank % 2 != 0 {
            Column::Right
        } else {
            Column::Left
        }
    }
}

/// Order two optional sizes; an absent size sorts before any present one
pub fn compare_sizes(a: Option<f32>, b: Option<f32>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Order two optional boxes by size
pub fn compare_boxes(a: Option<&BoxEntity>, b: Option<&BoxEntity>) -> Ordering {
    compare_sizes(a.map(|b| b.size), b.map(|b| b.size))
}

/// Input to the layout: one box of the sorted population
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutEntry {
    pub id: BoxId,
    pub bounds: Vec2,
    /// Current depth, carried over into the target
    pub z: f32,
}

/// Target assigned to one box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub id: BoxId,
    pub rank: usize,
    pub column: Column,
    pub target: Vec3,
}

/// Assign a target to every entry of an ascending-sorted slice.
///
/// Placements are returned in processing order: highest rank first, rank 0
/// last.
pub fn plan_columns(sorted: &[LayoutEntry], field: &Playfield) -> Vec<Placement> {
    // (y, height) of the lowest box placed so far in each column
    let mut last_left: Option<(f32, f32)> = None;
    let mut last_right: Option<(f32, f32)> = None;
    let mut placements = Vec::with_capacity(sorted.len());

    for (rank, entry) in sorted.iter().enumerate().rev() {
        let column = Column::for_rank(rank);
        let half = entry.bounds / 2.0;

        let (x, last) = match column {
            Column::Right => (field.right_inner() - half.x, &mut last_right),
            Column::Left => (field.left_inner() + half.x, &mut last_left),
        };
        let y = match *last {
            None => field.top() - half.y,
            Some((last_y, last_height)) => last_y - last_height / 2.0 - half.y,
        };
        *last = Some((y, entry.bounds.y));

        placements.push(Placement {
            id: entry.id,
            rank,
            column,
            target: Vec3::new(x, y, entry.z),
        });
    }

    placements
}

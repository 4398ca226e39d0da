// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Directional candidate scoring and maximum-intersection recovery.

use kurbo::Rect;

use crate::{Direction, FocusSpace};

/// Weight of the directional-travel term (dominates everything else).
const W_MOVE: f64 = 10_000.0;
/// Weight of the beyond-center bias term.
const W_CENTER: f64 = 100.0;
/// Penalty multiplier for motion orthogonal to the requested direction.
const TANGENTIAL_PENALTY: f64 = 4.0;

/// One rectangle reduced to direction-relative intervals.
///
/// The main axis is the axis of travel, sign-flipped so the requested
/// direction is always "positive main". This keeps the scoring below free of
/// per-direction branches.
#[derive(Copy, Clone)]
struct Canonical {
    main_lo: f64,
    main_hi: f64,
    tang_lo: f64,
    tang_hi: f64,
}

impl Canonical {
    fn new(rect: Rect, direction: Direction) -> Self {
        let (main_lo, main_hi, tang_lo, tang_hi) = if direction.is_horizontal() {
            (rect.x0, rect.x1, rect.y0, rect.y1)
        } else {
            (rect.y0, rect.y1, rect.x0, rect.x1)
        };
        if direction.is_forward() {
            Self {
                main_lo,
                main_hi,
                tang_lo,
                tang_hi,
            }
        } else {
            // Flip the main axis so Left/Up become positive travel.
            Self {
                main_lo: -main_hi,
                main_hi: -main_lo,
                tang_lo,
                tang_hi,
            }
        }
    }

    fn main_center(&self) -> f64 {
        (self.main_lo + self.main_hi) / 2.0
    }

    fn tang_center(&self) -> f64 {
        (self.tang_lo + self.tang_hi) / 2.0
    }
}

/// Axis-aligned non-overlapping distance between two intervals (0 if they overlap).
fn interval_gap(a_lo: f64, a_hi: f64, b_lo: f64, b_hi: f64) -> f64 {
    (b_lo - a_hi).max(a_lo - b_hi).max(0.0)
}

/// Scores one candidate; `None` means rejected.
fn score(focused: &Canonical, candidate: &Canonical, one_dimension: bool) -> Option<f64> {
    let main_gap = interval_gap(
        focused.main_lo,
        focused.main_hi,
        candidate.main_lo,
        candidate.main_hi,
    );
    let tang_gap = interval_gap(
        focused.tang_lo,
        focused.tang_hi,
        candidate.tang_lo,
        candidate.tang_hi,
    );

    // Signed directional travel: negative when the candidate lies behind.
    let signed_main = if candidate.main_hi <= focused.main_lo {
        -main_gap
    } else {
        main_gap
    };
    if signed_main < 0.0 {
        return None;
    }

    if one_dimension && tang_gap > 0.0 {
        return None;
    }

    // Beyond-center bias: project the candidate's center onto the segment the
    // focused rectangle occupies on its far side. A candidate whose projected
    // offset from the focused center is not positive does not lie meaningfully
    // past the focused rectangle.
    let projected = candidate
        .main_center()
        .max(focused.main_lo + main_gap)
        .min(focused.main_hi + main_gap);
    let center_main = projected - focused.main_center();
    if center_main <= 0.0 {
        return None;
    }

    let center_tang = candidate.tang_center() - focused.tang_center();
    let residual_main = candidate.main_center() - focused.main_center();
    let residual_tang = center_tang;

    Some(
        W_MOVE * (signed_main * signed_main + TANGENTIAL_PENALTY * tang_gap * tang_gap)
            + W_CENTER * (center_main * center_main + TANGENTIAL_PENALTY * center_tang * center_tang)
            + (residual_main * residual_main + TANGENTIAL_PENALTY * residual_tang * residual_tang),
    )
}

/// Picks the best focus candidate in the requested direction.
///
/// Every entry in `space` except `ignore` is scored against `focused_rect`;
/// the candidate with the lowest cost wins. Candidates behind the direction,
/// or not meaningfully past the focused rectangle's center, are rejected.
///
/// With `one_dimension` set, any candidate with a nonzero tangential gap is
/// additionally rejected — used when searching strictly within one row or
/// column.
///
/// Ties keep the first-found candidate (the space's traversal order).
#[must_use]
pub fn find_next_focus<K: Copy + Eq>(
    space: &FocusSpace<'_, K>,
    focused_rect: Rect,
    direction: Direction,
    ignore: Option<K>,
    one_dimension: bool,
) -> Option<K> {
    let focused = Canonical::new(focused_rect, direction);

    let mut best: Option<(K, f64)> = None;
    for entry in space.nodes {
        if ignore == Some(entry.id) {
            continue;
        }
        let candidate = Canonical::new(entry.rect, direction);
        if let Some(cost) = score(&focused, &candidate, one_dimension) {
            if !cost.is_finite() {
                continue;
            }
            match best {
                Some((_, best_cost)) if cost >= best_cost => {}
                _ => best = Some((entry.id, cost)),
            }
        }
    }
    best.map(|(id, _)| id)
}

/// Picks the candidate whose rectangle overlaps `shadow_rect` the most.
///
/// Used for focus-continuity recovery: when a focused node is destroyed, its
/// vacated rectangle is matched against the remaining visible candidates by
/// intersection area. Candidates with no overlap are ignored; ties keep the
/// first-found candidate.
#[must_use]
pub fn find_focus_from_rect<K: Copy + Eq>(space: &FocusSpace<'_, K>, shadow_rect: Rect) -> Option<K> {
    let mut best: Option<(K, f64)> = None;
    for entry in space.nodes {
        let overlap = entry.rect.intersect(shadow_rect);
        let area = overlap.width().max(0.0) * overlap.height().max(0.0);
        if area <= 0.0 {
            continue;
        }
        match best {
            Some((_, best_area)) if area <= best_area => {}
            _ => best = Some((entry.id, area)),
        }
    }
    best.map(|(id, _)| id)
}

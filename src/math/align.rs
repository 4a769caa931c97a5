use std::f64::consts::FRAC_PI_4;

use super::{try_normalize, Vector2};

/// The eight compass directions at 45° spacing, starting at +x and turning
/// counter-clockwise.
///
/// Used as the candidate tangent set at a control point with no segments.
#[must_use]
pub fn compass_directions() -> Vec<Vector2> {
    (0..8)
        .map(|i| {
            let angle = f64::from(i) * FRAC_PI_4;
            Vector2::new(angle.cos(), angle.sin())
        })
        .collect()
}

/// Picks the candidate direction best aligned with `chord`.
///
/// Candidates and chord are compared as unit vectors by dot product. Ties
/// keep the earliest candidate, so the result is deterministic for a given
/// candidate order. Zero-length candidates are skipped.
///
/// Returns the chosen candidate as a unit vector, or `None` if `chord` is
/// zero-length or no usable candidate exists.
#[must_use]
pub fn aligned_direction(candidates: &[Vector2], chord: &Vector2) -> Option<Vector2> {
    let chord = try_normalize(chord)?;

    let mut best: Option<(Vector2, f64)> = None;
    for dir in candidates.iter().filter_map(try_normalize) {
        let dot = chord.dot(&dir);
        match best {
            Some((_, best_dot)) if dot <= best_dot => {}
            _ => best = Some((dir, dot)),
        }
    }
    best.map(|(dir, _)| dir)
}

/// Projects `offset` onto the candidate direction best aligned with it.
///
/// Returns `offset` unchanged when no direction can be chosen.
#[must_use]
pub fn snap_to_direction(candidates: &[Vector2], offset: &Vector2) -> Vector2 {
    match aligned_direction(candidates, offset) {
        Some(dir) => dir * dir.dot(offset),
        None => *offset,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn compass_has_eight_unit_directions() {
        let dirs = compass_directions();
        assert_eq!(dirs.len(), 8);
        for d in &dirs {
            assert_relative_eq!(d.norm(), 1.0, epsilon = 1e-12);
        }
        assert_relative_eq!(dirs[0], Vector2::new(1.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(dirs[2], Vector2::new(0.0, 1.0), epsilon = 1e-12);
    }

    #[test]
    fn picks_largest_dot_product() {
        let candidates = [Vector2::new(1.0, 0.0), Vector2::new(0.0, 3.0)];
        let dir = aligned_direction(&candidates, &Vector2::new(0.2, 1.0)).unwrap();
        assert_relative_eq!(dir, Vector2::new(0.0, 1.0), epsilon = 1e-12);
    }

    #[test]
    fn tie_keeps_first_candidate_in_order() {
        let chord = Vector2::new(1.0, 1.0);

        let xy = [Vector2::new(1.0, 0.0), Vector2::new(0.0, 1.0)];
        let dir = aligned_direction(&xy, &chord).unwrap();
        assert_eq!(dir, Vector2::new(1.0, 0.0));

        let yx = [Vector2::new(0.0, 1.0), Vector2::new(1.0, 0.0)];
        let dir = aligned_direction(&yx, &chord).unwrap();
        assert_eq!(dir, Vector2::new(0.0, 1.0));
    }

    #[test]
    fn zero_vectors_are_rejected() {
        let candidates = [Vector2::zeros(), Vector2::new(0.0, -1.0)];
        let dir = aligned_direction(&candidates, &Vector2::new(1.0, 0.0)).unwrap();
        assert_eq!(dir, Vector2::new(0.0, -1.0));

        assert!(aligned_direction(&candidates, &Vector2::zeros()).is_none());
        let only_zero = [Vector2::zeros()];
        assert!(aligned_direction(&only_zero, &Vector2::new(1.0, 0.0)).is_none());
    }

    #[test]
    fn snapping_projects_onto_compass() {
        let snapped = snap_to_direction(&compass_directions(), &Vector2::new(2.0, 0.3));
        assert_relative_eq!(snapped, Vector2::new(2.0, 0.0), epsilon = 1e-12);
    }
}

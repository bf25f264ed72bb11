//! Pad geometry: column coordinates and the pure geometric predicates the cost model needs.
//!
//! Coordinates use layout units: `x` grows to the player's right, `y` grows towards the
//! back of the pad (up arrow has `y = 1`). Layouts are looked up by pad type name.

use nalgebra::Vector2;

use crate::error::{ParityError, Result};

/// Two columns can be bracketed by one foot if their squared distance is at most this.
pub const BRACKET_DISTANCE_SQ: f64 = 2.0;

/// Static description of a pad.
#[derive(Clone, Debug, PartialEq)]
pub struct StageLayout {
    name: &'static str,
    points: Vec<Vector2<f64>>,
}

impl StageLayout {
    /// Four panels: left, down, up, right.
    pub fn dance_single() -> Self {
        Self {
            name: "dance-single",
            points: vec![
                Vector2::new(-1.0, 0.0),
                Vector2::new(0.0, -1.0),
                Vector2::new(0.0, 1.0),
                Vector2::new(1.0, 0.0),
            ],
        }
    }

    /// Two single pads side by side.
    pub fn dance_double() -> Self {
        Self {
            name: "dance-double",
            points: vec![
                Vector2::new(-1.0, 0.0),
                Vector2::new(-0.7, -1.0),
                Vector2::new(-0.7, 1.0),
                Vector2::new(-0.2, 0.0),
                Vector2::new(0.2, 0.0),
                Vector2::new(0.7, -1.0),
                Vector2::new(0.7, 1.0),
                Vector2::new(1.0, 0.0),
            ],
        }
    }

    /// Catalog lookup by pad type.
    pub fn by_name(name: &str) -> Result<Self> {
        match name {
            "dance-single" => Ok(Self::dance_single()),
            "dance-double" => Ok(Self::dance_double()),
            other => Err(ParityError::UnknownLayout(other.to_string())),
        }
    }

    /// Names accepted by `by_name`.
    pub fn catalog() -> &'static [&'static str] {
        &["dance-single", "dance-double"]
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn column_count(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn point(&self, column: usize) -> Vector2<f64> {
        self.points[column]
    }

    /// Outermost columns (left side, right side); used for sideswitch and crossover rules.
    #[inline]
    pub fn side_columns(&self) -> (usize, usize) {
        (0, self.points.len() - 1)
    }

    #[inline]
    pub fn distance_sq(&self, a: usize, b: usize) -> f64 {
        (self.points[a] - self.points[b]).norm_squared()
    }

    /// Can a single foot cover both columns with heel and toe?
    #[inline]
    pub fn bracket_check(&self, a: usize, b: usize) -> bool {
        self.distance_sq(a, b) <= BRACKET_DISTANCE_SQ
    }

    /// Midpoint of the occupied columns; origin if neither is set.
    pub fn average_point(&self, a: Option<usize>, b: Option<usize>) -> Vector2<f64> {
        match (a, b) {
            (None, None) => Vector2::zeros(),
            (Some(a), None) => self.points[a],
            (None, Some(b)) => self.points[b],
            (Some(a), Some(b)) => (self.points[a] + self.points[b]) * 0.5,
        }
    }

    /// Signed, saturating horizontal facing from `left` to `right`.
    ///
    /// The unit direction's x component is raised to the 4th power; the sign is negative
    /// when `right` is not strictly to the right of `left`. Same column gives 0.
    pub fn x_difference(&self, left: usize, right: usize) -> f64 {
        if left == right {
            return 0.0;
        }
        let d = self.points[right] - self.points[left];
        signed_pow4(d.x / d.norm())
    }

    /// Vertical counterpart of `x_difference` (positive when `right` lies behind `left`).
    pub fn y_difference(&self, left: usize, right: usize) -> f64 {
        if left == right {
            return 0.0;
        }
        let d = self.points[right] - self.points[left];
        signed_pow4(d.y / d.norm())
    }
}

#[inline]
fn signed_pow4(v: f64) -> f64 {
    let p = v.powi(4);
    if v <= 0.0 {
        -p
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_resolves_known_layouts() {
        for name in StageLayout::catalog() {
            let l = StageLayout::by_name(name).unwrap();
            assert_eq!(l.name(), *name);
        }
        assert_eq!(StageLayout::dance_single().column_count(), 4);
        assert_eq!(StageLayout::dance_double().column_count(), 8);
        assert!(matches!(
            StageLayout::by_name("pump-single"),
            Err(ParityError::UnknownLayout(_))
        ));
    }

    #[test]
    fn single_bracket_feasibility() {
        let l = StageLayout::dance_single();
        // left+down, left+up, down+right, up+right are adjacent (distance² = 2)
        assert!(l.bracket_check(0, 1));
        assert!(l.bracket_check(0, 2));
        assert!(l.bracket_check(1, 3));
        assert!(l.bracket_check(2, 3));
        // left+right and down+up are 2 units apart
        assert!(!l.bracket_check(0, 3));
        assert!(!l.bracket_check(1, 2));
    }

    #[test]
    fn facing_differentials_saturate_with_sign() {
        let l = StageLayout::dance_single();
        assert!((l.x_difference(0, 3) - 1.0).abs() < 1e-12);
        assert!((l.x_difference(3, 0) + 1.0).abs() < 1e-12);
        // down → up is purely vertical: x component is 0, counted as non-positive
        assert_eq!(l.x_difference(1, 2), 0.0);
        assert!((l.y_difference(1, 2) - 1.0).abs() < 1e-12);
        // diagonal: (1/√2)^4 = 0.25
        assert!((l.x_difference(0, 2) - 0.25).abs() < 1e-12);
        assert_eq!(l.x_difference(2, 2), 0.0);
    }

    #[test]
    fn average_point_handles_missing_parts() {
        let l = StageLayout::dance_single();
        assert_eq!(l.average_point(None, None), Vector2::zeros());
        assert_eq!(l.average_point(Some(3), None), Vector2::new(1.0, 0.0));
        let mid = l.average_point(Some(0), Some(2));
        assert!((mid - Vector2::new(-0.5, 0.5)).norm() < 1e-12);
    }
}

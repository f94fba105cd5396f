//! The static simulation enclosure.
//!
//! Walls are degenerate infinite-mass bodies: axis-aligned half-plane
//! boundaries at the four sides of the simulation rectangle. Each side has a
//! fixed unit normal pointing into the arena, which is the direction a
//! contact normal takes when a body corner touches that wall.

use nalgebra::{Point2, Vector2};

use crate::error::SimError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One side of the simulation boundary rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum WallSide {
    /// The x = left boundary.
    Left,
    /// The x = right boundary.
    Right,
    /// The y = bottom boundary (the floor).
    Bottom,
    /// The y = top boundary (the ceiling).
    Top,
}

impl WallSide {
    /// All four sides, in scan order.
    pub const ALL: [Self; 4] = [Self::Left, Self::Right, Self::Bottom, Self::Top];

    /// Unit normal pointing into the arena (from the wall toward a body
    /// resting against it).
    #[must_use]
    pub fn normal(self) -> Vector2<f64> {
        match self {
            Self::Left => Vector2::new(1.0, 0.0),
            Self::Right => Vector2::new(-1.0, 0.0),
            Self::Bottom => Vector2::new(0.0, 1.0),
            Self::Top => Vector2::new(0.0, -1.0),
        }
    }
}

impl std::fmt::Display for WallSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Bottom => "bottom",
            Self::Top => "top",
        };
        write!(f, "{name} wall")
    }
}

/// The axis-aligned simulation rectangle.
///
/// # Example
///
/// ```
/// use planar_types::{Boundary, WallSide};
/// use nalgebra::Point2;
///
/// let arena = Boundary::new(-3.0, 3.0, 0.0, 4.0);
///
/// // A point half a unit below the floor has penetrated it by 0.5
/// let depth = arena.penetration(WallSide::Bottom, Point2::new(0.0, -0.5));
/// assert_eq!(depth, 0.5);
/// assert!(!arena.contains(Point2::new(0.0, -0.5)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Boundary {
    /// Left edge x coordinate.
    pub left: f64,
    /// Right edge x coordinate.
    pub right: f64,
    /// Bottom edge y coordinate.
    pub bottom: f64,
    /// Top edge y coordinate.
    pub top: f64,
}

impl Boundary {
    /// Create a boundary rectangle.
    #[must_use]
    pub const fn new(left: f64, right: f64, bottom: f64, top: f64) -> Self {
        Self {
            left,
            right,
            bottom,
            top,
        }
    }

    /// A centered rectangle with the given width and height.
    #[must_use]
    pub fn centered(width: f64, height: f64) -> Self {
        Self::new(-width / 2.0, width / 2.0, -height / 2.0, height / 2.0)
    }

    /// Check that edges are ordered and finite.
    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.left.is_finite()
            && self.right.is_finite()
            && self.bottom.is_finite()
            && self.top.is_finite())
        {
            return Err(SimError::invalid_config("boundary must be finite"));
        }
        if self.left >= self.right || self.bottom >= self.top {
            return Err(SimError::invalid_config(format!(
                "degenerate boundary: [{}, {}] x [{}, {}]",
                self.left, self.right, self.bottom, self.top
            )));
        }
        Ok(())
    }

    /// Arena width.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Arena height.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    /// Whether the point lies strictly inside the arena.
    #[must_use]
    pub fn contains(&self, p: Point2<f64>) -> bool {
        p.x > self.left && p.x < self.right && p.y > self.bottom && p.y < self.top
    }

    /// Signed penetration of `p` past the given wall: positive when the point
    /// is beyond the boundary, negative when it is inside the arena by that
    /// distance.
    #[must_use]
    pub fn penetration(&self, side: WallSide, p: Point2<f64>) -> f64 {
        match side {
            WallSide::Left => self.left - p.x,
            WallSide::Right => p.x - self.right,
            WallSide::Bottom => self.bottom - p.y,
            WallSide::Top => p.y - self.top,
        }
    }
}

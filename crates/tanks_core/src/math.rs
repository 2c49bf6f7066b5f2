//! Fixed-point math utilities for deterministic simulation.
//!
//! All tank simulation uses fixed-point arithmetic so that a scenario
//! replays identically on every machine. Positions are pixels, time
//! is seconds, speeds are pixels per second.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// Build a fixed-point ratio `num / den` without touching floats.
#[must_use]
pub fn ratio(num: i32, den: i32) -> Fixed {
    Fixed::from_num(num) / Fixed::from_num(den)
}

/// Fixed-point 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_decimal")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_decimal")]
    pub y: Fixed,
}

/// Serde support for human-written configuration values.
///
/// Reads and writes decimal numbers (`1.5`, `200`) and converts them to
/// fixed-point once at the boundary. Simulation code never sees the float.
pub mod fixed_decimal {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as a decimal.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_num::<f64>().serialize(serializer)
    }

    /// Deserialize a fixed-point number from a decimal.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Fixed::checked_from_num(value).ok_or_else(|| {
            serde::de::Error::custom(format!("value {value} out of fixed-point range"))
        })
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a vector from integer pixel coordinates.
    #[must_use]
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Calculate squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x * other.x + self.y * other.y
    }

    /// Vector length.
    #[must_use]
    pub fn length(self) -> Fixed {
        fixed_sqrt(self.dot(self))
    }

    /// Multiply both components by a scalar.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Normalize vector using fixed-point math.
    ///
    /// The zero vector normalizes to zero.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len_sq = self.dot(self);

        if len_sq == Fixed::ZERO {
            return Self::ZERO;
        }

        let len = fixed_sqrt(len_sq);
        if len == Fixed::ZERO {
            return Self::ZERO;
        }

        Self::new(self.x / len, self.y / len)
    }
}

/// Computes the square root of a fixed-point number using binary search.
fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = Fixed::ZERO;
    let mut high = if value > Fixed::ONE { value } else { Fixed::ONE };

    for _ in 0..64 {
        let mid = (low + high) / Fixed::from_num(2);
        let mid_sq = mid.saturating_mul(mid);

        if mid_sq <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    // The loop never tests the initial `high`, which is the root of 1.
    if high.saturating_mul(high) <= value {
        high
    } else {
        low
    }
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl std::ops::Neg for Vec2Fixed {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

/// Axis-aligned rectangle in pixel space (top-left origin, y grows down).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// Left edge.
    pub left: Fixed,
    /// Top edge.
    pub top: Fixed,
    /// Width (never negative).
    pub width: Fixed,
    /// Height (never negative).
    pub height: Fixed,
}

impl Rect {
    /// Rectangle of `size` centered on `center`.
    #[must_use]
    pub fn from_center(center: Vec2Fixed, size: Vec2Fixed) -> Self {
        let half_w = size.x / Fixed::from_num(2);
        let half_h = size.y / Fixed::from_num(2);
        Self {
            left: center.x - half_w,
            top: center.y - half_h,
            width: size.x,
            height: size.y,
        }
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> Fixed {
        self.left + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> Fixed {
        self.top + self.height
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> Vec2Fixed {
        Vec2Fixed::new(
            self.left + self.width / Fixed::from_num(2),
            self.top + self.height / Fixed::from_num(2),
        )
    }

    /// Shrink every side by `margin`, clamping to a zero-size rectangle.
    #[must_use]
    pub fn shrink(&self, margin: Fixed) -> Self {
        let width = (self.width - margin * Fixed::from_num(2)).max(Fixed::ZERO);
        let height = (self.height - margin * Fixed::from_num(2)).max(Fixed::ZERO);
        let center = self.center();
        Self::from_center(center, Vec2Fixed::new(width, height))
    }

    /// Overlapping region of two rectangles, if they intersect with
    /// positive area.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if left < right && top < bottom {
            Some(Self {
                left,
                top,
                width: right - left,
                height: bottom - top,
            })
        } else {
            None
        }
    }

    /// Check whether two rectangles overlap with positive area.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.intersection(other).is_some()
    }
}

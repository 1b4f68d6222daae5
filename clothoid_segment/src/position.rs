use core::ops::{Add, Neg, Sub};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use uom::si::f64::Length;
use uom::si::length::meter;

use crate::Float;

/// A point in the plane of the segment
#[derive(Default, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    pub x: Length,
    pub y: Length,
}

impl Neg for Position {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

impl Add for Position {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub for Position {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl Position {
    pub fn new_meter(x: Float, y: Float) -> Self {
        Self::from_array_meter([x, y])
    }

    pub fn from_array_meter(p: [Float; 2]) -> Self {
        Position {
            x: Length::new::<meter>(p[0]),
            y: Length::new::<meter>(p[1]),
        }
    }

    pub fn as_array_meter(&self) -> [Float; 2] {
        [self.x.get::<meter>(), self.y.get::<meter>()]
    }

    /// euclidean distance between two positions
    pub fn distance(&self, other: &Position) -> Length {
        let [dx, dy] = (*other - *self).as_array_meter();
        Length::new::<meter>(libm::hypot(dx, dy))
    }
}

use crate::core::point_mass::{PointMass, Vec2};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Which side of the domain a wall bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WallSide {
    Left,
    Right,
    Bottom,
    Top,
}

impl WallSide {
    pub const ALL: [WallSide; 4] = [WallSide::Left, WallSide::Right, WallSide::Bottom, WallSide::Top];

    /// Axis of the wall normal (0 = x, 1 = y).
    #[inline]
    pub fn axis(&self) -> usize {
        match self {
            WallSide::Left | WallSide::Right => 0,
            WallSide::Bottom | WallSide::Top => 1,
        }
    }

    /// Sign of the inward normal along [`WallSide::axis`]: +1 for the min walls.
    #[inline]
    pub fn inward_sign(&self) -> f64 {
        match self {
            WallSide::Left | WallSide::Bottom => 1.0,
            WallSide::Right | WallSide::Top => -1.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            WallSide::Left => "WALL_LEFT",
            WallSide::Right => "WALL_RIGHT",
            WallSide::Bottom => "WALL_BOTTOM",
            WallSide::Top => "WALL_TOP",
        }
    }
}

/// Axis-aligned simulation domain `[x_min, x_max] x [y_min, y_max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl Default for Domain {
    fn default() -> Self {
        Self {
            x_min: -6.0,
            y_min: -6.0,
            x_max: 6.0,
            y_max: 6.0,
        }
    }
}

impl Domain {
    pub fn validate(&self) -> Result<()> {
        let finite = [self.x_min, self.y_min, self.x_max, self.y_max]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.x_max <= self.x_min || self.y_max <= self.y_min {
            return Err(Error::InvalidParam(
                "domain must be finite with max > min on both axes".into(),
            ));
        }
        Ok(())
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn center(&self) -> Vec2 {
        [0.5 * (self.x_min + self.x_max), 0.5 * (self.y_min + self.y_max)]
    }
}

/// An immovable rectangular body lying just outside one side of the domain.
#[derive(Debug, Clone)]
pub struct Wall {
    pub side: WallSide,
    pub body: PointMass,
}

impl Wall {
    /// Build the wall for `side`, `thickness` thick, overlapping the neighbouring
    /// walls at the corners.
    pub fn new(side: WallSide, domain: &Domain, thickness: f64) -> Result<Self> {
        if !thickness.is_finite() || thickness <= 0.0 {
            return Err(Error::InvalidParam("wall thickness must be > 0".into()));
        }
        let [cx, cy] = domain.center();
        let half = 0.5 * thickness;
        let long_x = domain.width() + 2.0 * thickness;
        let long_y = domain.height() + 2.0 * thickness;
        let (center, w, h) = match side {
            WallSide::Left => ([domain.x_min - half, cy], thickness, long_y),
            WallSide::Right => ([domain.x_max + half, cy], thickness, long_y),
            WallSide::Bottom => ([cx, domain.y_min - half], long_x, thickness),
            WallSide::Top => ([cx, domain.y_max + half], long_x, thickness),
        };
        let body = PointMass::immovable_rect(side.name(), center, w, h)?;
        Ok(Self { side, body })
    }

    /// Coordinate of the face that touches the domain, along [`WallSide::axis`].
    #[inline]
    pub fn face(&self) -> f64 {
        let (lo, hi) = self.body.span(self.side.axis());
        if self.side.inward_sign() > 0.0 {
            hi
        } else {
            lo
        }
    }

    /// Signed clearance between a body and the inner face. Negative means the body's
    /// extent is past the face, i.e. penetrating (the wall is treated as a half-space).
    #[inline]
    pub fn gap(&self, pos: &Vec2, half_extent: f64) -> f64 {
        let axis = self.side.axis();
        self.side.inward_sign() * (pos[axis] - self.face()) - half_extent
    }

    /// Velocity component along the inward normal; negative means approaching.
    #[inline]
    pub fn normal_velocity(&self, vel: &Vec2) -> f64 {
        self.side.inward_sign() * vel[self.side.axis()]
    }

    /// Position coordinate along the normal axis where `gap` is exactly zero.
    #[inline]
    pub fn contact_coordinate(&self, half_extent: f64) -> f64 {
        self.face() + self.side.inward_sign() * half_extent
    }
}

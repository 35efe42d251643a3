use crate::error::{Error, Result};

/// Fixed spatial dimension (2D).
pub const DIM: usize = 2;

/// Plain 2D vector `[x, y]`.
pub type Vec2 = [f64; DIM];

/// Collision geometry of a point mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Disc of the given radius centred on the position.
    Circle { radius: f64 },
    /// Axis-aligned rectangle centred on the position.
    Rectangle { width: f64, height: f64 },
}

impl Shape {
    /// Distance from the centre to the shape's boundary along `axis` (0 = x, 1 = y).
    #[inline]
    pub fn half_extent(&self, axis: usize) -> f64 {
        match *self {
            Shape::Circle { radius } => radius,
            Shape::Rectangle { width, height } => {
                if axis == 0 {
                    0.5 * width
                } else {
                    0.5 * height
                }
            }
        }
    }

    fn validate(&self) -> Result<()> {
        let ok = match *self {
            Shape::Circle { radius } => radius.is_finite() && radius > 0.0,
            Shape::Rectangle { width, height } => {
                width.is_finite() && width > 0.0 && height.is_finite() && height > 0.0
            }
        };
        if ok {
            Ok(())
        } else {
            Err(Error::InvalidParam(
                "shape dimensions must be finite and > 0".into(),
            ))
        }
    }
}

/// A named rigid body with 2D position and velocity.
///
/// Atoms have finite mass. Walls use `f64::INFINITY` and never move.
#[derive(Debug, Clone)]
pub struct PointMass {
    /// Stable name, e.g. `ATOM1` or `WALL_LEFT`.
    pub name: String,
    /// Position of the centre (x, y).
    pub r: Vec2,
    /// Velocity (vx, vy).
    pub v: Vec2,
    /// Mass (> 0, possibly infinite).
    pub mass: f64,
    /// Geometric extent used for collision tests.
    pub shape: Shape,
}

impl PointMass {
    /// Create a point mass after validating invariants.
    ///
    /// Errors:
    /// - `Error::InvalidParam` if `mass` is not > 0, the shape is degenerate, or any
    ///   component of `r`/`v` is NaN/inf.
    pub fn new(name: impl Into<String>, r: Vec2, v: Vec2, mass: f64, shape: Shape) -> Result<Self> {
        if mass.is_nan() || mass <= 0.0 {
            return Err(Error::InvalidParam("mass must be > 0".into()));
        }
        shape.validate()?;
        if !r.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("position must be finite".into()));
        }
        if !v.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("velocity must be finite".into()));
        }
        Ok(Self {
            name: name.into(),
            r,
            v,
            mass,
            shape,
        })
    }

    /// Circular body at rest.
    pub fn circle(name: impl Into<String>, r: Vec2, radius: f64, mass: f64) -> Result<Self> {
        Self::new(name, r, [0.0; DIM], mass, Shape::Circle { radius })
    }

    /// Immovable rectangular body of infinite mass.
    pub fn immovable_rect(name: impl Into<String>, r: Vec2, width: f64, height: f64) -> Result<Self> {
        Self::new(
            name,
            r,
            [0.0; DIM],
            f64::INFINITY,
            Shape::Rectangle { width, height },
        )
    }

    /// True for infinite-mass bodies.
    #[inline]
    pub fn is_immovable(&self) -> bool {
        self.mass.is_infinite()
    }

    /// Kinetic energy 1/2 m |v|^2; zero for immovable bodies.
    #[inline]
    pub fn kinetic_energy(&self) -> f64 {
        if self.is_immovable() {
            return 0.0;
        }
        0.5 * self.mass * dot(&self.v, &self.v)
    }

    /// Smallest and largest coordinate covered by the shape along `axis`.
    #[inline]
    pub fn span(&self, axis: usize) -> (f64, f64) {
        let h = self.shape.half_extent(axis);
        (self.r[axis] - h, self.r[axis] + h)
    }

    /// Set mass (must be > 0 and finite for movable bodies).
    pub fn set_mass(&mut self, mass: f64) -> Result<()> {
        if !mass.is_finite() || mass <= 0.0 {
            return Err(Error::InvalidParam("mass must be finite and > 0".into()));
        }
        self.mass = mass;
        Ok(())
    }

    /// Set position (validated as finite).
    pub fn set_position(&mut self, r: Vec2) -> Result<()> {
        if !r.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("position must be finite".into()));
        }
        self.r = r;
        Ok(())
    }

    /// Set velocity (validated as finite).
    pub fn set_velocity(&mut self, v: Vec2) -> Result<()> {
        if !v.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("velocity must be finite".into()));
        }
        self.v = v;
        Ok(())
    }
}

#[inline]
pub fn dot(a: &Vec2, b: &Vec2) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[inline]
pub fn sub(a: &Vec2, b: &Vec2) -> Vec2 {
    [a[0] - b[0], a[1] - b[1]]
}

#[inline]
pub fn norm(a: &Vec2) -> f64 {
    dot(a, a).sqrt()
}

use core::ops::{Add, Mul, Neg, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IVertex2 {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FVertex2 {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DVertex2 {
    pub x: f64,
    pub y: f64,
}

/// Double precision 3D vertex, `x` is the column, `y` the line and `z` the
/// plane coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DVertex3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl DVertex3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn cross(self, rhs: Self) -> Self {
        Self {
            x: self.y * rhs.z - self.z * rhs.y,
            y: self.z * rhs.x - self.x * rhs.z,
            z: self.x * rhs.y - self.y * rhs.x,
        }
    }

    pub fn norm(self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn normalize(self) -> Self {
        let n = self.norm();
        if n == 0.0 {
            Self::default()
        } else {
            self * (1.0 / n)
        }
    }
}

impl Add for DVertex3 {
    type Output = DVertex3;

    fn add(self, rhs: DVertex3) -> Self::Output {
        DVertex3 {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl Sub for DVertex3 {
    type Output = DVertex3;

    fn sub(self, rhs: DVertex3) -> Self::Output {
        DVertex3 {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl Neg for DVertex3 {
    type Output = DVertex3;

    fn neg(self) -> Self::Output {
        DVertex3 {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

impl Mul<f64> for DVertex3 {
    type Output = DVertex3;

    fn mul(self, rhs: f64) -> Self::Output {
        DVertex3 {
            x: self.x * rhs,
            y: self.y * rhs,
            z: self.z * rhs,
        }
    }
}

impl Mul<DVertex3> for f64 {
    type Output = DVertex3;

    fn mul(self, rhs: DVertex3) -> Self::Output {
        rhs * self
    }
}

/// Round half up to the nearest integer, the rounding every run-coordinate
/// computation in the workspace uses.
pub fn nint(v: f64) -> i32 {
    (v + 0.5).floor() as i32
}

#[cfg(test)]
mod tests {
    use super::{DVertex3, nint};

    #[test]
    fn vertex_ops() {
        let a = DVertex3::new(1.0, 2.0, 2.0);
        let b = DVertex3::new(0.0, -1.0, 3.0);

        assert_eq!(a + b, DVertex3::new(1.0, 1.0, 5.0));
        assert_eq!(a - b, DVertex3::new(1.0, 3.0, -1.0));
        assert!((a.dot(b) - 4.0).abs() < 1e-12);
        assert!((a.norm() - 3.0).abs() < 1e-12);
        assert_eq!(
            DVertex3::new(1.0, 0.0, 0.0).cross(DVertex3::new(0.0, 1.0, 0.0)),
            DVertex3::new(0.0, 0.0, 1.0)
        );
        assert_eq!(DVertex3::default().normalize(), DVertex3::default());
    }

    #[test]
    fn nint_rounds_half_up() {
        assert_eq!(nint(2.5), 3);
        assert_eq!(nint(-2.5), -2);
        assert_eq!(nint(-2.6), -3);
        assert_eq!(nint(0.49), 0);
    }
}

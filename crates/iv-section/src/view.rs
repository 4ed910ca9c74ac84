use serde::{Deserialize, Serialize};

use iv_core::DVertex3;

type Matrix3 = [[f64; 3]; 3];

/// Cutting plane through a volume.
///
/// The plane is `z' = dist` in the view frame, where a point `v` maps to
/// `R (v - fixed)` and `R = Rz(zeta) Ry(phi) Rz(theta)`. Angles are in
/// radians. The rotation is only valid after [`init`](Self::init).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewStruct {
    pub fixed: [f64; 3],
    pub theta: f64,
    pub phi: f64,
    pub zeta: f64,
    pub dist: f64,
    #[serde(skip)]
    rotation: Matrix3,
    #[serde(skip)]
    initialized: bool,
}

impl Default for ViewStruct {
    fn default() -> Self {
        Self {
            fixed: [0.0; 3],
            theta: 0.0,
            phi: 0.0,
            zeta: 0.0,
            dist: 0.0,
            rotation: IDENTITY,
            initialized: false,
        }
    }
}

const IDENTITY: Matrix3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

fn rot_z(a: f64) -> Matrix3 {
    let (s, c) = a.sin_cos();
    [[c, s, 0.0], [-s, c, 0.0], [0.0, 0.0, 1.0]]
}

fn rot_y(a: f64) -> Matrix3 {
    let (s, c) = a.sin_cos();
    [[c, 0.0, -s], [0.0, 1.0, 0.0], [s, 0.0, c]]
}

fn mat_mul(a: &Matrix3, b: &Matrix3) -> Matrix3 {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

impl ViewStruct {
    pub fn new(fixed: DVertex3, theta: f64, phi: f64, zeta: f64, dist: f64) -> Self {
        Self {
            fixed: [fixed.x, fixed.y, fixed.z],
            theta,
            phi,
            zeta,
            dist,
            ..Self::default()
        }
    }

    /// Computes the rotation from the current angles.
    pub fn init(&mut self) {
        self.rotation = mat_mul(&mat_mul(&rot_z(self.zeta), &rot_y(self.phi)), &rot_z(self.theta));
        self.initialized = true;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Unit normal of the cutting plane in volume coordinates.
    pub fn normal(&self) -> DVertex3 {
        let r = &self.rotation;
        DVertex3::new(r[2][0], r[2][1], r[2][2])
    }

    /// Maps a volume point into the view frame.
    pub fn transform_vertex(&self, v: DVertex3) -> DVertex3 {
        let d = [v.x - self.fixed[0], v.y - self.fixed[1], v.z - self.fixed[2]];
        let r = &self.rotation;
        let row = |i: usize| r[i][0] * d[0] + r[i][1] * d[1] + r[i][2] * d[2];
        DVertex3::new(row(0), row(1), row(2))
    }

    /// Signed distance of `v` from the cutting plane.
    pub fn signed_distance(&self, v: DVertex3) -> f64 {
        self.transform_vertex(v).z - self.dist
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use super::ViewStruct;
    use iv_core::DVertex3;

    fn close(a: DVertex3, b: DVertex3) -> bool {
        (a - b).norm() < 1e-9
    }

    #[test]
    fn zero_angles_only_translate() {
        let mut view = ViewStruct::new(DVertex3::new(1.0, 2.0, 3.0), 0.0, 0.0, 0.0, 0.0);
        assert!(!view.is_initialized());
        view.init();
        let out = view.transform_vertex(DVertex3::new(4.0, 4.0, 4.0));
        assert!(close(out, DVertex3::new(3.0, 2.0, 1.0)));
    }

    #[test]
    fn quarter_tilt_looks_along_columns() {
        let mut view = ViewStruct::new(DVertex3::default(), 0.0, FRAC_PI_2, 0.0, 2.0);
        view.init();
        assert!(close(view.normal(), DVertex3::new(1.0, 0.0, 0.0)));
        assert!((view.signed_distance(DVertex3::new(5.0, -3.0, 7.0)) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn rotation_is_orthonormal() {
        let mut view = ViewStruct::new(DVertex3::default(), 0.3, 1.1, -0.7, 0.0);
        view.init();
        let a = view.transform_vertex(DVertex3::new(1.0, 0.0, 0.0));
        let b = view.transform_vertex(DVertex3::new(0.0, 1.0, 0.0));
        assert!((a.norm() - 1.0).abs() < 1e-9);
        assert!(a.dot(b).abs() < 1e-9);
    }

    #[test]
    fn deserialized_view_needs_init() {
        let view: ViewStruct = serde_json::from_str(r#"{"phi": 1.0, "dist": 4.0}"#).expect("parse");
        assert_eq!(view.theta, 0.0);
        assert!(!view.is_initialized());
    }
}

//! Transform records. Parameters are stored and persisted as given; applying
//! them is left to callers.

use std::rc::Rc;

use crate::geom::{DVertex2, FVertex2};
use crate::plane::PlaneDomain;
use crate::shapes::PropertyList;

#[derive(Debug, Clone, PartialEq)]
pub struct AffineTransform {
    /// Legacy transform kind code.
    pub kind: u8,
    pub tx: f64,
    pub ty: f64,
    pub tz: f64,
    pub scale: f64,
    pub theta: f64,
    pub phi: f64,
    pub alpha: f64,
    pub psi: f64,
    pub xsi: f64,
    pub invert: i32,
    pub matrix: [[f64; 4]; 4],
}

impl AffineTransform {
    pub fn identity(kind: u8) -> Self {
        let mut matrix = [[0.0; 4]; 4];
        for (i, row) in matrix.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        Self {
            kind,
            tx: 0.0,
            ty: 0.0,
            tz: 0.0,
            scale: 1.0,
            theta: 0.0,
            phi: 0.0,
            alpha: 0.0,
            psi: 0.0,
            xsi: 0.0,
            invert: 0,
            matrix,
        }
    }
}

/// Triangular element of a finite-element warp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarpElement {
    pub kind: u8,
    pub n: i32,
    pub nodes: [i32; 3],
    pub u: [f32; 3],
    pub a: [f32; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub struct WarpTransform {
    pub image_displacement: f32,
    pub iteration_displacement: f32,
    pub node_coords: Vec<DVertex2>,
    pub displacements: Vec<DVertex2>,
    pub elements: Vec<WarpElement>,
}

pub const MAX_NODAL_DEGREE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchPoint {
    pub kind: i32,
    pub node: i32,
    pub coords: FVertex2,
    pub elements: [i32; MAX_NODAL_DEGREE],
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureMatch {
    pub points: Vec<MatchPoint>,
}

/// Plane-by-plane warp of a volume with tie points per plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Warp3D {
    pub iteration: i32,
    pub current_plane: i32,
    pub max_displacement: f32,
    pub planes: Rc<PlaneDomain>,
    pub matches: Vec<Option<Rc<FeatureMatch>>>,
    pub properties: Option<Rc<PropertyList>>,
}

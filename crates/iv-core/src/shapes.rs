//! Non-raster domains carried alongside interval objects: polygons, boundary
//! lists, histograms, rectangles, vectors and points. They are plain data; no
//! geometry is computed on them here.

use std::rc::Rc;

use crate::geom::{DVertex2, FVertex2, IVertex2};

#[derive(Debug, Clone, PartialEq)]
pub enum PolygonVertices {
    Int(Vec<IVertex2>),
    Float(Vec<FVertex2>),
    Double(Vec<DVertex2>),
}

impl PolygonVertices {
    pub fn len(&self) -> usize {
        match self {
            Self::Int(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub vertices: PolygonVertices,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundKind {
    Piece,
    Hole,
}

/// Tree of boundary polygons: `next` links siblings, `down` links the
/// boundaries nested inside this one.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundList {
    pub kind: BoundKind,
    pub next: Option<Rc<BoundList>>,
    pub down: Option<Rc<BoundList>>,
    pub wrap: i32,
    pub polygon: Option<Rc<Polygon>>,
}

impl BoundList {
    /// Number of boundaries in this list including nested ones.
    pub fn count(&self) -> usize {
        1 + self.next.as_ref().map_or(0, |b| b.count()) + self.down.as_ref().map_or(0, |b| b.count())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HistogramBins {
    Int(Vec<i32>),
    Float(Vec<f64>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub origin: f64,
    pub bin_size: f64,
    pub bins: HistogramBins,
}

impl Histogram {
    pub fn bin_count(&self) -> usize {
        match &self.bins {
            HistogramBins::Int(b) => b.len(),
            HistogramBins::Float(b) => b.len(),
        }
    }
}

/// Possibly rotated rectangle given by its four corners.
#[derive(Debug, Clone, PartialEq)]
pub enum Rectangle {
    Int { columns: [i32; 4], lines: [i32; 4], angle: f32 },
    Float { columns: [f32; 4], lines: [f32; 4], angle: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Vector {
    Int { k1: i32, l1: i32, k2: i32, l2: i32, style: i32 },
    Float { k1: f32, l1: f32, k2: f32, l2: f32, style: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Point {
    Int { k: i32, l: i32, style: i32 },
    Float { k: f32, l: f32, style: i32 },
}

/// Opaque property payload attached to objects.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropertyList {
    pub data: Vec<u8>,
}

use std::rc::Rc;

use crate::error::{Error, Result, try_filled_vec};
use crate::interval::IntervalDomain;
use crate::shapes::{BoundList, Histogram, Polygon};
use crate::transform::{AffineTransform, WarpTransform};

/// What every slot of a plane domain is expected to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneDomainKind {
    Empty,
    Interval,
    Polygon,
    BoundList,
    Histogram,
    Affine,
    Warp,
}

/// One plane of a plane domain.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PlaneSlot {
    #[default]
    Null,
    Interval(Rc<IntervalDomain>),
    Polygon(Rc<Polygon>),
    BoundList(Rc<BoundList>),
    Histogram(Rc<Histogram>),
    Affine(Rc<AffineTransform>),
    Warp(Rc<WarpTransform>),
}

impl PlaneSlot {
    /// Null slots and empty interval domains both count as null.
    pub fn is_null(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Interval(d) => d.is_empty(),
            _ => false,
        }
    }

    pub fn kind(&self) -> Option<PlaneDomainKind> {
        match self {
            Self::Null => None,
            Self::Interval(_) => Some(PlaneDomainKind::Interval),
            Self::Polygon(_) => Some(PlaneDomainKind::Polygon),
            Self::BoundList(_) => Some(PlaneDomainKind::BoundList),
            Self::Histogram(_) => Some(PlaneDomainKind::Histogram),
            Self::Affine(_) => Some(PlaneDomainKind::Affine),
            Self::Warp(_) => Some(PlaneDomainKind::Warp),
        }
    }

    pub fn as_interval(&self) -> Option<&Rc<IntervalDomain>> {
        match self {
            Self::Interval(d) if !d.is_empty() => Some(d),
            _ => None,
        }
    }
}

/// Ordered stack of per-plane domains.
///
/// `planes[i]` belongs to plane `plane_first + i`. The line and column bounds
/// are the union over the non-null interval planes once standardized.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneDomain {
    kind: PlaneDomainKind,
    plane_first: i32,
    plane_last: i32,
    line_first: i32,
    line_last: i32,
    column_first: i32,
    column_last: i32,
    pub voxel_size: [f32; 3],
    planes: Vec<PlaneSlot>,
}

impl PlaneDomain {
    pub fn new(
        kind: PlaneDomainKind,
        plane_first: i32,
        plane_last: i32,
        line_first: i32,
        line_last: i32,
        column_first: i32,
        column_last: i32,
    ) -> Result<Self> {
        if kind == PlaneDomainKind::Empty {
            return Ok(Self::empty());
        }
        if plane_last < plane_first {
            return Err(Error::InvalidDomain("last plane precedes first plane"));
        }
        if line_last < line_first || column_last < column_first {
            return Err(Error::InvalidDomain("inverted line or column bounds"));
        }

        let n = (i64::from(plane_last) - i64::from(plane_first) + 1) as usize;
        Ok(Self {
            kind,
            plane_first,
            plane_last,
            line_first,
            line_last,
            column_first,
            column_last,
            voxel_size: [1.0; 3],
            planes: try_filled_vec(n, PlaneSlot::Null)?,
        })
    }

    pub fn empty() -> Self {
        Self {
            kind: PlaneDomainKind::Empty,
            plane_first: 0,
            plane_last: 0,
            line_first: 0,
            line_last: 0,
            column_first: 0,
            column_last: 0,
            voxel_size: [1.0; 3],
            planes: Vec::new(),
        }
    }

    pub fn kind(&self) -> PlaneDomainKind {
        self.kind
    }

    pub fn plane_first(&self) -> i32 {
        self.plane_first
    }

    pub fn plane_last(&self) -> i32 {
        self.plane_last
    }

    pub fn line_first(&self) -> i32 {
        self.line_first
    }

    pub fn line_last(&self) -> i32 {
        self.line_last
    }

    pub fn column_first(&self) -> i32 {
        self.column_first
    }

    pub fn column_last(&self) -> i32 {
        self.column_last
    }

    pub fn plane_count(&self) -> usize {
        self.planes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kind == PlaneDomainKind::Empty || self.planes.iter().all(PlaneSlot::is_null)
    }

    fn plane_index(&self, plane: i32) -> Option<usize> {
        if self.kind == PlaneDomainKind::Empty || plane < self.plane_first || plane > self.plane_last {
            None
        } else {
            Some((plane - self.plane_first) as usize)
        }
    }

    pub fn plane(&self, plane: i32) -> Option<&PlaneSlot> {
        self.plane_index(plane).map(|idx| &self.planes[idx])
    }

    /// Iterates `(plane, slot)` in plane order.
    pub fn planes(&self) -> impl Iterator<Item = (i32, &PlaneSlot)> + '_ {
        self.planes
            .iter()
            .enumerate()
            .map(move |(i, s)| (self.plane_first + i as i32, s))
    }

    /// Stores `slot` at `plane`, releasing the previous occupant. The slot
    /// must match the domain kind.
    pub fn set_plane(&mut self, plane: i32, slot: PlaneSlot) -> Result<()> {
        let idx = self
            .plane_index(plane)
            .ok_or(Error::InvalidParameter("plane outside domain"))?;
        if let Some(kind) = slot.kind()
            && kind != self.kind
        {
            return Err(Error::InvalidDomain("plane slot does not match domain kind"));
        }
        self.planes[idx] = slot;
        Ok(())
    }

    /// Trims null planes from both ends and recomputes the line and column
    /// bounds from the interval planes. Returns `false` when every plane is
    /// null, in which case the bounds are left unchanged.
    pub fn standardize(&mut self) -> bool {
        let Some(first) = self.planes.iter().position(|s| !s.is_null()) else {
            return false;
        };
        let last = self
            .planes
            .iter()
            .rposition(|s| !s.is_null())
            .unwrap_or(first);

        self.planes.truncate(last + 1);
        self.planes.drain(..first);
        self.plane_last = self.plane_first + last as i32;
        self.plane_first += first as i32;

        for slot in &mut self.planes {
            if slot.is_null() {
                *slot = PlaneSlot::Null;
            }
        }

        if self.kind == PlaneDomainKind::Interval {
            let mut bounds: Option<(i32, i32, i32, i32)> = None;
            for dom in self.planes.iter().filter_map(PlaneSlot::as_interval) {
                let b = (dom.line_first(), dom.line_last(), dom.column_first(), dom.column_last());
                bounds = Some(match bounds {
                    None => b,
                    Some((l1, ll, k1, kl)) => (l1.min(b.0), ll.max(b.1), k1.min(b.2), kl.max(b.3)),
                });
            }
            if let Some((l1, ll, k1, kl)) = bounds {
                self.line_first = l1;
                self.line_last = ll;
                self.column_first = k1;
                self.column_last = kl;
            }
        }
        true
    }

    /// Total number of covered voxels over all interval planes.
    pub fn volume(&self) -> u64 {
        self.planes
            .iter()
            .filter_map(PlaneSlot::as_interval)
            .map(|d| d.area())
            .sum()
    }
}

//! Run-length encoded 2D and 3D domains, their value tables and scans.
//!
//! ## Interval Domains
//! An [`IntervalDomain`] stores a region as sorted closed column runs per
//! line. Columns and lines are absolute and may be negative. A standardized
//! domain has no touching runs, no uncovered border lines and tight column
//! bounds; every algorithm in the workspace hands back standardized domains.
//!
//! ## Plane Domains
//! A [`PlaneDomain`] stacks one [`PlaneSlot`] per plane. Slots share their
//! contents through `Rc`, so assigning a plane is a reference count bump.
//!
//! ## Scans
//! [`IntervalScan`] walks runs line-major, column-minor. Exhaustion is
//! reported as [`Error::EndOfObject`], which is a loop terminator rather
//! than a failure. [`GreyScan`] adds the grey samples of each run.
//!
//! ## Values
//! Grey tables come in six pixel types. Ragged tables follow the domain
//! runs, rectangular ones cover the whole bounding box.

mod error;
mod geom;
mod interval;
mod object;
mod plane;
mod scan;
mod shapes;
mod transform;
mod values;

pub use error::{Error, Result, optional, try_filled_vec};
pub use geom::{DVertex2, DVertex3, FVertex2, IVertex2, nint};
pub use interval::{Interval, IntervalDomain, IntervalDomainKind, IntervalLine, LineRuns, Occupancy};
pub use object::{Compound, CompoundKind, Object, Object2D, Object3D, ObjectType, TransformedObject};
pub use plane::{PlaneDomain, PlaneDomainKind, PlaneSlot};
pub use scan::{
    GreyScan, GreyScanMut, IntervalScan, RasterDirection, ScanItem, ScanState, collect_runs,
};
pub use shapes::{
    BoundKind, BoundList, Histogram, HistogramBins, Point, Polygon, PolygonVertices, PropertyList,
    Rectangle, Vector,
};
pub use transform::{
    AffineTransform, FeatureMatch, MAX_NODAL_DEGREE, MatchPoint, Warp3D, WarpElement, WarpTransform,
};
pub use values::{
    GreyBuffer, GreyLayoutKind, GreySlice, GreySliceMut, GreyType, GreyValues, Pixel, PixelValue,
    VoxelValues, pack_rgba, rgba_channels,
};

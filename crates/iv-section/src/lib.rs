//! Cutting planes through interval volumes.
//!
//! A [`ViewStruct`] describes an oriented plane. [`segment`] walks every
//! run of a volume, evaluates the signed plane distance at both run ends
//! and sends the run, or the two pieces of a run that crosses the plane, to
//! the negative or positive output volume.

mod segment;
mod view;

pub use segment::segment;
pub use view::ViewStruct;

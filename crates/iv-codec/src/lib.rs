//! Reader and writer for the legacy binary object format.
//!
//! ## Layout
//! Every object starts with a one-byte type tag followed by its entities.
//! Optional entities are preceded by their own tag byte where zero means
//! absent. Words are 32-bit little endian; floats and doubles use the legacy
//! byte shuffles in [`wire`].
//!
//! ## Stream ends
//! [`read_object`] distinguishes three outcomes at a tag boundary: a clean
//! end of stream ([`Error::EndOfStream`](iv_core::Error::EndOfStream)), an
//! explicit null tag ([`Error::EndOfObject`](iv_core::Error::EndOfObject))
//! and a stream cut inside an entity
//! ([`Error::TruncatedStream`](iv_core::Error::TruncatedStream)).
//! [`read_objects`] folds the first two into iterator exhaustion.

mod read;
pub mod tags;
pub mod wire;
mod write;

pub use read::{
    ObjectStream, read_affine, read_boundlist, read_feature_match, read_grey_values, read_histogram,
    read_interval_domain, read_object, read_objects, read_plane_domain, read_polygon, read_property_list,
    read_rectangle, read_voxel_values, read_warp,
};
pub use wire::{WireReader, WireWriter};
pub use write::{
    write_affine, write_boundlist, write_feature_match, write_grey_values, write_histogram,
    write_interval_domain, write_object, write_objects, write_plane_domain, write_polygon,
    write_property_list, write_rectangle, write_voxel_values, write_warp,
};

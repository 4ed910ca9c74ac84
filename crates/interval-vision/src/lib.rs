//! Umbrella crate for the `interval-vision` workspace.
//!
//! Re-exports the object model from `iv-core` at the root and the processing
//! crates as modules.

pub use iv_core::*;

pub use iv_codec as codec;
pub use iv_edge as edge;
pub use iv_morph as morph;
pub use iv_section as section;

pub use iv_codec::{read_object, read_objects, write_object, write_objects};

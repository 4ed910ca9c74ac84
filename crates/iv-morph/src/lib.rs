//! Morphological dilation of interval domains.
//!
//! Dilation works run by run: every output line is the union of the object
//! lines shifted by each element line, each run widened by the element run.
//! Runs closer than one column are fused. Results carry no grey values.
//!
//! Structuring elements are ordinary objects. [`std_struct_element`] grows
//! the common ones from a distance type and a radius, and
//! [`special_element`] returns the fixed 3x3 neighbourhoods.

mod connectivity;
mod dilation;
mod elements;

pub use connectivity::{Connectivity, dilate_connected, neighbourhood};
pub use dilation::{dilate, dilate_domains, line_struct_dil, union_domains, union_runs};
pub use elements::{
    DistanceType, ElementDim, SpecialElement, StdElementConfig, circle, single_pixel, special_element, sphere,
    std_struct_element,
};

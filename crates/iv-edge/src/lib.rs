//! Gradient edges on interval objects.
//!
//! Every stage scans its inputs in lockstep: the object, its derivatives
//! and the modulus share one domain, so the n-th run of each scan covers the
//! same pixels. Stages reject inputs whose runs disagree.
//!
//! Pipeline:
//! - derivatives along columns and lines through a [`DerivativeFilter`],
//! - [`modulus`] of the two derivatives,
//! - [`nm_suppress`] thins the modulus to ridge pixels,
//! - [`hysteresis_threshold`] keeps ridges reaching the primary threshold.
//!
//! [`edge_detect`] chains the stages with an [`EdgeConfig`].
//! [`set_range_lut`] remaps grey values in place.

mod canny;
mod filter;
mod hysteresis;
mod lut;
mod modgrad;
mod nms;
mod support;

pub use canny::{EdgeConfig, EdgeOutput, edge_detect};
pub use filter::{Axis, CentralDifference, DerivativeFilter};
pub use hysteresis::hysteresis_threshold;
pub use lut::set_range_lut;
pub use modgrad::{grey_mod_gradient, modulus, rgba_mod_gradient};
pub use nms::nm_suppress;

use log::debug;
use serde::{Deserialize, Serialize};

use iv_core::{Object, Result};
use iv_morph::Connectivity;

use crate::filter::{Axis, DerivativeFilter};
use crate::hysteresis::hysteresis_threshold;
use crate::modgrad::{modulus, promote};
use crate::nms::nm_suppress;
use crate::support::valued_2d;

/// Thresholds of the edge pipeline, in gradient modulus units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    /// Edges must reach this modulus somewhere.
    pub primary: f64,
    /// Edges extend through pixels down to this modulus.
    pub secondary: f64,
    pub connectivity: Connectivity,
    /// Return the gradient modulus alongside the edges.
    pub keep_gradient: bool,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            primary: 40.0,
            secondary: 10.0,
            connectivity: Connectivity::Eight,
            keep_gradient: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeOutput {
    /// Thinned edge pixels with their gradient modulus.
    pub edges: Object,
    pub gradient: Option<Object>,
}

/// Gradient, non-maximal suppression and hysteresis threshold in one pass.
pub fn edge_detect<F: DerivativeFilter + ?Sized>(obj: &Object, filter: &F, cfg: &EdgeConfig) -> Result<EdgeOutput> {
    let Some(src) = valued_2d(obj, "edge object")? else {
        return Ok(EdgeOutput {
            edges: Object::Empty,
            gradient: cfg.keep_gradient.then_some(Object::Empty),
        });
    };
    let (mut primary, mut secondary) = (cfg.primary, cfg.secondary);
    if primary < secondary {
        debug!("swapping hysteresis thresholds {primary} < {secondary}");
        std::mem::swap(&mut primary, &mut secondary);
    }

    let src = promote(src)?;
    let gx = Object::Domain2D(filter.derivative(&src, Axis::Columns)?);
    let gy = Object::Domain2D(filter.derivative(&src, Axis::Lines)?);
    let grad = modulus(&Object::Domain2D(src), &gx, &gy)?;
    let thin = nm_suppress(&grad, &gy, &gx, secondary)?;
    let edges = hysteresis_threshold(&thin, primary, secondary, cfg.connectivity)?;

    let count = |o: &Object| o.as_2d().map(|o| o.domain.area()).unwrap_or(0);
    debug!(
        "edges: {} of {} suppressed pixels kept",
        count(&edges),
        count(&thin)
    );
    Ok(EdgeOutput {
        edges,
        gradient: cfg.keep_gradient.then_some(grad),
    })
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::{EdgeConfig, edge_detect};
    use crate::filter::CentralDifference;
    use iv_core::{GreyType, GreyValues, Interval, IntervalDomain, Object, Object2D, PixelValue};
    use iv_morph::Connectivity;

    /// Disc of radius 12 with a bright square in the middle.
    fn target() -> Object {
        let runs = (-12..=12)
            .map(|y: i32| {
                let half = ((144 - y * y) as f64).sqrt() as i32;
                vec![Interval::new(-half, half)]
            })
            .collect();
        let domain = IntervalDomain::from_runs(-12, runs).expect("runs");
        let mut v = GreyValues::new_for_domain(&domain, GreyType::UByte, PixelValue::UByte(0)).expect("values");
        for l in -4..=4 {
            for k in -4..=4 {
                v.set(l, k, PixelValue::UByte(200)).expect("set");
            }
        }
        Object::Domain2D(Object2D::with_values(Rc::new(domain), Rc::new(v)))
    }

    #[test]
    fn square_outline_is_found() {
        let cfg = EdgeConfig {
            keep_gradient: true,
            ..EdgeConfig::default()
        };
        let out = edge_detect(&target(), &CentralDifference, &cfg).expect("edges");
        let edges = out.edges.as_2d().expect("2d");
        let d = &edges.domain;
        assert!(d.contains(0, 4) && d.contains(0, 5));
        assert!(d.contains(-4, 0) && d.contains(5, 0));
        assert!(!d.contains(0, 0));
        assert!(!d.contains(0, -10));
        assert_eq!(edges.values().expect("values").get(0, 4), PixelValue::Int(100));
        assert!(out.gradient.is_some());
    }

    #[test]
    fn flat_object_has_no_edges() {
        let domain = IntervalDomain::rect(0, 9, 0, 9).expect("rect");
        let v = GreyValues::new_for_domain(&domain, GreyType::Float, PixelValue::Float(3.0)).expect("values");
        let obj = Object::Domain2D(Object2D::with_values(Rc::new(domain), Rc::new(v)));
        let out = edge_detect(&obj, &CentralDifference, &EdgeConfig::default()).expect("edges");
        assert_eq!(out.edges, Object::Empty);
        assert_eq!(out.gradient, None);
    }

    #[test]
    fn config_from_partial_json() {
        let cfg: EdgeConfig = serde_json::from_str(r#"{"primary": 80.0, "connectivity": "four"}"#).expect("parse");
        assert_eq!(cfg.secondary, 10.0);
        assert_eq!(cfg.connectivity, Connectivity::Four);
    }
}

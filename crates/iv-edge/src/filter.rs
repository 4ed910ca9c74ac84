use std::rc::Rc;

use iv_core::{GreyScanMut, GreyType, GreyValues, Object2D, PixelValue, RasterDirection, Result, optional};

/// Direction of a first derivative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Along a line, towards increasing columns.
    Columns,
    /// Across lines, towards increasing lines.
    Lines,
}

/// First-derivative operator over the grey values of a 2D object.
///
/// Implementations return an object on the same domain with a `Double`
/// table, so the result scans in lockstep with the input.
pub trait DerivativeFilter {
    fn derivative(&self, obj: &Object2D, axis: Axis) -> Result<Object2D>;
}

/// Half the difference of the two neighbours along the axis. A neighbour
/// outside the domain is replaced by the centre pixel.
#[derive(Debug, Clone, Copy, Default)]
pub struct CentralDifference;

impl DerivativeFilter for CentralDifference {
    fn derivative(&self, obj: &Object2D, axis: Axis) -> Result<Object2D> {
        let src = obj.values()?;
        let domain = &obj.domain;
        let mut out = GreyValues::new_for_domain(domain, GreyType::Double, PixelValue::Double(0.0))?;
        let (dl, dk) = match axis {
            Axis::Columns => (0, 1),
            Axis::Lines => (1, 0),
        };
        let sample = |l: i32, k: i32, centre: f64| {
            if domain.contains(l, k) {
                src.get(l, k).to_f64()
            } else {
                centre
            }
        };

        let mut dst = GreyScanMut::new(domain, &mut out, RasterDirection::IncLineIncCol);
        while let Some((item, mut span)) = optional(dst.next_run())? {
            let l = item.line;
            for (i, k) in (item.left..=item.right).enumerate() {
                let c = src.get(l, k).to_f64();
                let ahead = sample(l + dl, k + dk, c);
                let behind = sample(l - dl, k - dk, c);
                span.set_f64(i, 0.5 * (ahead - behind));
            }
        }
        Ok(Object2D::with_values(Rc::clone(domain), Rc::new(out)))
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::{Axis, CentralDifference, DerivativeFilter};
    use iv_core::{GreyType, GreyValues, Interval, IntervalDomain, Object2D, PixelValue};

    fn ramp() -> Object2D {
        let domain = IntervalDomain::from_runs(0, vec![vec![Interval::new(0, 4)]; 3]).expect("runs");
        let mut v = GreyValues::new_for_domain(&domain, GreyType::Int, PixelValue::Int(0)).expect("values");
        for l in 0..3 {
            for k in 0..5 {
                v.set(l, k, PixelValue::Int(3 * k + 10 * l)).expect("set");
            }
        }
        Object2D::with_values(Rc::new(domain), Rc::new(v))
    }

    #[test]
    fn interior_and_border_slopes() {
        let obj = ramp();
        let gx = CentralDifference.derivative(&obj, Axis::Columns).expect("gx");
        let gx = gx.values().expect("values");
        assert_eq!(gx.get(1, 2), PixelValue::Double(3.0));
        // One-sided at the run ends.
        assert_eq!(gx.get(1, 0), PixelValue::Double(1.5));

        let gy = CentralDifference.derivative(&obj, Axis::Lines).expect("gy");
        let gy = gy.values().expect("values");
        assert_eq!(gy.get(1, 3), PixelValue::Double(10.0));
        assert_eq!(gy.get(2, 3), PixelValue::Double(5.0));
    }
}

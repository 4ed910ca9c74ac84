use std::rc::Rc;

use log::debug;

use iv_core::{
    Error, GreyScan, GreyScanMut, GreySlice, GreyType, GreyValues, Object, Object2D, PixelValue, RasterDirection,
    Result, optional, rgba_channels,
};

use crate::filter::{Axis, DerivativeFilter};
use crate::support::{exhausted, follow, follow_f64, valued_2d};

const DIR: RasterDirection = RasterDirection::IncLineIncCol;

fn is_integral(ty: GreyType) -> bool {
    matches!(ty, GreyType::Int | GreyType::Short | GreyType::UByte)
}

/// Gradient modulus `sqrt(gx^2 + gy^2)` stored in the pixel type of `obj`.
///
/// The three objects are scanned in lockstep and must share their domain.
/// Integer results are truncated. Colour objects are rejected.
pub fn modulus(obj: &Object, gx: &Object, gy: &Object) -> Result<Object> {
    let Some(src) = valued_2d(obj, "modulus object")? else {
        return Ok(Object::Empty);
    };
    let (Some(gx), Some(gy)) = (valued_2d(gx, "gradient object")?, valued_2d(gy, "gradient object")?) else {
        return Err(Error::NullInput("gradient object"));
    };
    let ty = src.values()?.grey_type();
    if ty == GreyType::Rgba {
        return Err(Error::unsupported("modulus grey", ty as i32));
    }

    let mut out = GreyValues::new_for_domain(&src.domain, ty, src.values()?.background())?;
    let mut dst = GreyScanMut::new(&src.domain, &mut out, DIR);
    let mut sx = GreyScan::new(gx, DIR)?;
    let mut sy = GreyScan::new(gy, DIR)?;
    while let Some((item, mut span)) = optional(dst.next_run())? {
        let x = follow_f64(&mut sx, &item)?;
        let y = follow_f64(&mut sy, &item)?;
        for (i, (a, b)) in x.iter().zip(&y).enumerate() {
            let g = (a * a + b * b).sqrt();
            span.set_f64(i, if is_integral(ty) { g.trunc() } else { g });
        }
    }
    exhausted(&mut sx)?;
    exhausted(&mut sy)?;
    Ok(Object::Domain2D(Object2D::with_values(
        Rc::clone(&src.domain),
        Rc::new(out),
    )))
}

/// `obj` with unsigned byte values widened to int, so gradients do not clip.
pub(crate) fn promote(obj: &Object2D) -> Result<Object2D> {
    let values = obj.values()?;
    if values.grey_type() != GreyType::UByte {
        return Ok(obj.clone());
    }
    Ok(Object2D::with_values(
        Rc::clone(&obj.domain),
        Rc::new(values.convert_to(GreyType::Int)?),
    ))
}

/// Gradient modulus of a grey object using `filter` for the derivatives.
pub fn grey_mod_gradient<F: DerivativeFilter + ?Sized>(obj: &Object, filter: &F) -> Result<Object> {
    let Some(src) = valued_2d(obj, "gradient object")? else {
        return Ok(Object::Empty);
    };
    let src = promote(src)?;
    let gx = Object::Domain2D(filter.derivative(&src, Axis::Columns)?);
    let gy = Object::Domain2D(filter.derivative(&src, Axis::Lines)?);
    modulus(&Object::Domain2D(src), &gx, &gy)
}

/// One colour channel of an RGBA object as an unsigned byte object.
fn channel(obj: &Object2D, c: usize) -> Result<Object2D> {
    let mut out = GreyValues::new_for_domain(&obj.domain, GreyType::UByte, PixelValue::UByte(0))?;
    let mut dst = GreyScanMut::new(&obj.domain, &mut out, DIR);
    let mut src = GreyScan::new(obj, DIR)?;
    while let Some((item, mut span)) = optional(dst.next_run())? {
        let samples = follow(&mut src, &item)?;
        let GreySlice::Rgba(px) = samples else {
            return Err(Error::InvalidValues("colour channel of a grey table"));
        };
        for (i, p) in px.iter().enumerate() {
            span.set(i, PixelValue::UByte(rgba_channels(*p)[c]));
        }
    }
    Ok(Object2D::with_values(Rc::clone(&obj.domain), Rc::new(out)))
}

/// Gradient modulus of a colour object: the modulus of the six channel
/// derivatives, stored as short. Non-colour objects take the grey path.
pub fn rgba_mod_gradient<F: DerivativeFilter + ?Sized>(obj: &Object, filter: &F) -> Result<Object> {
    let src = match obj {
        Object::Domain2D(o) if o.grey_type() == Some(GreyType::Rgba) && !o.domain.is_empty() => o,
        _ => return grey_mod_gradient(obj, filter),
    };

    let mut grads = Vec::with_capacity(6);
    for c in 0..3 {
        let ch = channel(src, c)?;
        grads.push(filter.derivative(&ch, Axis::Columns)?);
        grads.push(filter.derivative(&ch, Axis::Lines)?);
    }

    let mut out = GreyValues::new_for_domain(&src.domain, GreyType::Short, PixelValue::Short(0))?;
    let mut dst = GreyScanMut::new(&src.domain, &mut out, DIR);
    let mut scans = grads
        .iter()
        .map(|g| GreyScan::new(g, DIR))
        .collect::<Result<Vec<_>>>()?;
    let mut acc = Vec::new();
    while let Some((item, mut span)) = optional(dst.next_run())? {
        acc.clear();
        acc.resize(item.width(), 0.0);
        for scan in &mut scans {
            let g = follow_f64(scan, &item)?;
            for (a, v) in acc.iter_mut().zip(&g) {
                *a += v * v;
            }
        }
        for (i, sum) in acc.iter().enumerate() {
            span.set_f64(i, sum.sqrt().trunc());
        }
    }
    for scan in &mut scans {
        exhausted(scan)?;
    }
    debug!("colour gradient over {} pixels", src.domain.area());
    Ok(Object::Domain2D(Object2D::with_values(
        Rc::clone(&src.domain),
        Rc::new(out),
    )))
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::{grey_mod_gradient, modulus, rgba_mod_gradient};
    use crate::filter::CentralDifference;
    use iv_core::{
        Error, GreyType, GreyValues, Interval, IntervalDomain, Object, Object2D, PixelValue, pack_rgba,
    };

    fn filled(domain: &Rc<IntervalDomain>, ty: GreyType, f: impl Fn(i32, i32) -> PixelValue) -> Object {
        let mut v = GreyValues::new_for_domain(domain, ty, PixelValue::Int(0)).expect("values");
        for (l, runs) in domain.lines() {
            for itv in runs.iter() {
                for k in itv.left..=itv.right {
                    v.set(l, k, f(l, k)).expect("set");
                }
            }
        }
        Object::Domain2D(Object2D::with_values(Rc::clone(domain), Rc::new(v)))
    }

    fn strip() -> Rc<IntervalDomain> {
        Rc::new(IntervalDomain::from_runs(
            0,
            vec![vec![Interval::new(0, 3), Interval::new(6, 8)]; 2],
        ).expect("runs"))
    }

    #[test]
    fn modulus_truncates_into_object_type() {
        let d = strip();
        let obj = filled(&d, GreyType::Short, |_, _| PixelValue::Int(0));
        let gx = filled(&d, GreyType::Double, |_, _| PixelValue::Double(3.0));
        let gy = filled(&d, GreyType::Double, |_, k| PixelValue::Double(if k > 4 { 4.0 } else { 1.0 }));
        let m = modulus(&obj, &gx, &gy).expect("modulus");
        let v = m.as_2d().expect("2d").values().expect("values");
        assert_eq!(v.grey_type(), GreyType::Short);
        assert_eq!(v.get(1, 7), PixelValue::Short(5));
        // sqrt(10) truncates to 3.
        assert_eq!(v.get(0, 2), PixelValue::Short(3));
    }

    #[test]
    fn modulus_rejects_colour_and_mismatch() {
        let d = strip();
        let rgba = filled(&d, GreyType::Rgba, |_, _| PixelValue::Rgba(0));
        let g = filled(&d, GreyType::Double, |_, _| PixelValue::Double(1.0));
        assert!(matches!(modulus(&rgba, &g, &g), Err(Error::UnsupportedType { .. })));

        let other = Rc::new(IntervalDomain::from_runs(0, vec![vec![Interval::new(0, 8)]; 2]).expect("runs"));
        let g2 = filled(&other, GreyType::Double, |_, _| PixelValue::Double(1.0));
        let obj = filled(&d, GreyType::Int, |_, _| PixelValue::Int(0));
        assert!(matches!(modulus(&obj, &g2, &g), Err(Error::InvalidDomain(_))));
        assert_eq!(modulus(&Object::Empty, &g, &g).expect("empty"), Object::Empty);
    }

    #[test]
    fn modulus_rejects_gradients_with_other_lines() {
        let rows = |n| Rc::new(IntervalDomain::from_runs(0, vec![vec![Interval::new(0, 3)]; n]).expect("runs"));
        let two = filled(&rows(2), GreyType::Int, |_, _| PixelValue::Int(0));
        let one = filled(&rows(1), GreyType::Double, |_, _| PixelValue::Double(1.0));
        assert!(matches!(modulus(&two, &one, &one), Err(Error::InvalidDomain(_))));

        let single = filled(&rows(1), GreyType::Int, |_, _| PixelValue::Int(0));
        let three = filled(&rows(3), GreyType::Double, |_, _| PixelValue::Double(1.0));
        assert!(matches!(modulus(&single, &three, &three), Err(Error::InvalidDomain(_))));
        assert!(matches!(modulus(&single, &one, &three), Err(Error::InvalidDomain(_))));
    }

    #[test]
    fn ubyte_gradient_is_promoted() {
        let d = Rc::new(IntervalDomain::from_runs(0, vec![vec![Interval::new(0, 4)]; 3]).expect("runs"));
        let obj = filled(&d, GreyType::UByte, |_, k| PixelValue::Int(if k >= 2 { 250 } else { 0 }));
        let m = grey_mod_gradient(&obj, &CentralDifference).expect("gradient");
        let v = m.as_2d().expect("2d").values().expect("values");
        assert_eq!(v.grey_type(), GreyType::Int);
        assert_eq!(v.get(1, 1), PixelValue::Int(125));
        assert_eq!(v.get(1, 4), PixelValue::Int(0));
    }

    #[test]
    fn colour_gradient_sums_channels() {
        let d = Rc::new(IntervalDomain::from_runs(0, vec![vec![Interval::new(0, 2)]]).expect("runs"));
        let obj = filled(&d, GreyType::Rgba, |_, k| {
            let c = if k == 2 { 8 } else { 0 };
            PixelValue::Rgba(pack_rgba(c, c, c, 255))
        });
        let m = rgba_mod_gradient(&obj, &CentralDifference).expect("gradient");
        let v = m.as_2d().expect("2d").values().expect("values");
        assert_eq!(v.grey_type(), GreyType::Short);
        // Each channel has gx = 4 at column 1: sqrt(3 * 16) = 6.93.
        assert_eq!(v.get(0, 1), PixelValue::Short(6));

        let grey = filled(&d, GreyType::Float, |_, k| PixelValue::Float(k as f32));
        let m = rgba_mod_gradient(&grey, &CentralDifference).expect("gradient");
        assert_eq!(m.as_2d().expect("2d").values().expect("values").grey_type(), GreyType::Float);
    }
}

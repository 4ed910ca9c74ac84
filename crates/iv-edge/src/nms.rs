use iv_core::{Error, GreyScan, GreyType, Object, RasterDirection, Result, optional};

use crate::support::{LineRunBuf, exhausted, follow_f64, next_f64, restrict, valued_2d};

const TAN22_5: f64 = 0.414_213_562_373_095_1;
const TAN67_5: f64 = 2.414_213_562_373_095;

/// Neighbour offset `(lines, columns)` along the gradient, quantised to
/// one of four directions.
fn direction(gx: f64, gy: f64) -> (i32, i32) {
    let (ax, ay) = (gx.abs(), gy.abs());
    if ay <= ax * TAN22_5 {
        (0, 1)
    } else if ay >= ax * TAN67_5 {
        (1, 0)
    } else if gx * gy > 0.0 {
        (1, 1)
    } else {
        (1, -1)
    }
}

/// Non-maximal suppression of a gradient modulus.
///
/// Keeps the pixels of `modulus` that are at least `min` and not smaller
/// than either neighbour along the gradient `(gx, gy)`. Pixels outside the
/// domain count as zero. The result carries the retained modulus values.
pub fn nm_suppress(modulus: &Object, gy: &Object, gx: &Object, min: f64) -> Result<Object> {
    let Some(m) = valued_2d(modulus, "modulus object")? else {
        return Ok(Object::Empty);
    };
    let (Some(gx), Some(gy)) = (valued_2d(gx, "gradient object")?, valued_2d(gy, "gradient object")?) else {
        return Err(Error::NullInput("gradient object"));
    };
    let values = m.values()?;
    if values.grey_type() == GreyType::Rgba {
        return Err(Error::unsupported("suppression grey", GreyType::Rgba as i32));
    }
    let domain = &m.domain;
    let mag = |l: i32, k: i32| {
        if domain.contains(l, k) {
            values.get(l, k).to_f64()
        } else {
            0.0
        }
    };

    let dir = RasterDirection::IncLineIncCol;
    let mut keep = LineRunBuf::new(domain);
    let mut sm = GreyScan::new(m, dir)?;
    let mut sx = GreyScan::new(gx, dir)?;
    let mut sy = GreyScan::new(gy, dir)?;
    while let Some((item, run)) = optional(next_f64(&mut sm))? {
        let x = follow_f64(&mut sx, &item)?;
        let y = follow_f64(&mut sy, &item)?;

        let l = item.line;
        for (i, k) in (item.left..=item.right).enumerate() {
            let v = run[i];
            if v <= 0.0 || v < min {
                continue;
            }
            let (dl, dk) = direction(x[i], y[i]);
            if v >= mag(l - dl, k - dk) && v >= mag(l + dl, k + dk) {
                keep.push(l, k, k);
            }
        }
    }
    exhausted(&mut sx)?;
    exhausted(&mut sy)?;
    restrict(m, keep.into_domain()?)
}

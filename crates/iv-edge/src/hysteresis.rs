use iv_core::{Error, GreyScan, GreyType, Interval, Object, RasterDirection, Result, optional};
use iv_morph::Connectivity;

use crate::support::{LineRunBuf, next_f64, restrict, valued_2d};

#[derive(Debug, Clone, Copy)]
struct Run {
    itv: Interval,
    strong: bool,
}

fn touching(a: Interval, b: Interval, slack: i32) -> bool {
    a.left <= b.right + slack && b.left <= a.right + slack
}

/// Hysteresis threshold over runs.
///
/// Pixels of at least `secondary` form runs. A run survives when it is
/// connected, through other such runs, to a pixel of at least `primary`.
/// Runs on adjacent lines connect when they overlap, or for 8-connectivity
/// when they touch diagonally. The result keeps the input values.
pub fn hysteresis_threshold(obj: &Object, primary: f64, secondary: f64, conn: Connectivity) -> Result<Object> {
    let slack = match conn {
        Connectivity::Four => 0,
        Connectivity::Eight => 1,
        _ => return Err(Error::InvalidParameter("hysteresis needs 4- or 8-connectivity")),
    };
    let Some(src) = valued_2d(obj, "threshold object")? else {
        return Ok(Object::Empty);
    };
    if src.values()?.grey_type() == GreyType::Rgba {
        return Err(Error::unsupported("threshold grey", GreyType::Rgba as i32));
    }

    let line_first = src.domain.line_first();
    let mut lines: Vec<Vec<Run>> = vec![Vec::new(); src.domain.height()];
    let mut scan = GreyScan::new(src, RasterDirection::IncLineIncCol)?;
    while let Some((item, run)) = optional(next_f64(&mut scan))? {
        let runs = &mut lines[(item.line - line_first) as usize];
        let mut open: Option<Run> = None;
        for (k, v) in (item.left..).zip(run) {
            if v >= secondary {
                let r = open.get_or_insert(Run {
                    itv: Interval::new(k, k),
                    strong: false,
                });
                r.itv.right = k;
                r.strong |= v >= primary;
            } else if let Some(r) = open.take() {
                runs.push(r);
            }
        }
        runs.extend(open);
    }

    let mut keep: Vec<Vec<bool>> = lines.iter().map(|r| vec![false; r.len()]).collect();
    let mut stack = Vec::new();
    for (li, runs) in lines.iter().enumerate() {
        for (ri, r) in runs.iter().enumerate() {
            if r.strong {
                keep[li][ri] = true;
                stack.push((li, ri));
            }
        }
    }
    while let Some((li, ri)) = stack.pop() {
        let itv = lines[li][ri].itv;
        for nl in [li.wrapping_sub(1), li + 1] {
            let Some(neighbours) = lines.get(nl) else {
                continue;
            };
            for (nr, n) in neighbours.iter().enumerate() {
                if !keep[nl][nr] && touching(itv, n.itv, slack) {
                    keep[nl][nr] = true;
                    stack.push((nl, nr));
                }
            }
        }
    }

    let mut out = LineRunBuf::new(&src.domain);
    for (li, runs) in lines.iter().enumerate() {
        for (r, _) in runs.iter().zip(&keep[li]).filter(|(_, k)| **k) {
            out.push(line_first + li as i32, r.itv.left, r.itv.right);
        }
    }
    restrict(src, out.into_domain()?)
}

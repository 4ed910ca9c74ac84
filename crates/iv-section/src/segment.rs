use std::rc::Rc;

use log::debug;

use iv_core::{
    DVertex3, Error, Interval, IntervalDomain, IntervalScan, Object, PlaneDomain, PlaneDomainKind, PlaneSlot,
    RasterDirection, Result, ScanItem, nint,
};

use crate::view::ViewStruct;

/// Sub-pixel offset applied to run endpoints so voxel centres never sit on
/// the plane.
const BIAS: f64 = 0.05;

/// Which side of the plane the voxels of a run fall on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Negative,
    Positive,
}

struct SplitLines {
    negative: Vec<Vec<Interval>>,
    positive: Vec<Vec<Interval>>,
}

impl SplitLines {
    fn with_height(height: usize) -> Self {
        Self {
            negative: vec![Vec::new(); height],
            positive: vec![Vec::new(); height],
        }
    }

    fn side(&mut self, side: Side, idx: usize) -> &mut Vec<Interval> {
        match side {
            Side::Negative => &mut self.negative[idx],
            Side::Positive => &mut self.positive[idx],
        }
    }

    fn into_slots(self, line_first: i32) -> Result<(PlaneSlot, PlaneSlot)> {
        let slot = |runs: Vec<Vec<Interval>>| -> Result<PlaneSlot> {
            let dom = IntervalDomain::from_runs(line_first, runs)?;
            Ok(if dom.is_empty() {
                PlaneSlot::Null
            } else {
                PlaneSlot::Interval(Rc::new(dom))
            })
        };
        Ok((slot(self.negative)?, slot(self.positive)?))
    }
}

fn split_run(view: &ViewStruct, plane: i32, run: &ScanItem, idx: usize, out: &mut SplitLines) {
    let y = f64::from(run.line) + BIAS;
    let z = f64::from(plane) + BIAS;
    let dl = view.signed_distance(DVertex3::new(f64::from(run.left) + BIAS, y, z));
    let dr = view.signed_distance(DVertex3::new(f64::from(run.right) + BIAS, y, z));

    let left_side = if dl < 0.0 { Side::Negative } else { Side::Positive };
    let right_side = if dr < 0.0 { Side::Negative } else { Side::Positive };
    if left_side == right_side {
        out.side(left_side, idx).push(Interval::new(run.left, run.right));
        return;
    }

    // Columns from the crossing to the right end.
    let delta = nint(dr / (dr - dl) * f64::from(run.right - run.left));
    let split = run.right - delta;
    out.side(left_side, idx).push(Interval::new(run.left, split));
    if delta != 0 {
        out.side(right_side, idx).push(Interval::new(split + 1, run.right));
    }
}

fn split_plane(view: &ViewStruct, plane: i32, dom: &IntervalDomain) -> Result<(PlaneSlot, PlaneSlot)> {
    let mut lines = SplitLines::with_height(dom.height());
    for run in IntervalScan::new(dom, RasterDirection::IncLineIncCol) {
        let idx = (run.line - dom.line_first()) as usize;
        split_run(view, plane, &run, idx, &mut lines);
    }
    lines.into_slots(dom.line_first())
}

/// Splits a volume into the parts on the negative and positive side of the
/// view plane.
///
/// A run crossing the plane is cut at the column nearest the interpolated
/// crossing. A side with no voxels comes back as [`Object::Empty`]. The
/// outputs carry no values.
pub fn segment(obj: &Object, view: Option<&ViewStruct>) -> Result<(Object, Object)> {
    let input = match obj {
        Object::Empty => return Ok((Object::Empty, Object::Empty)),
        Object::Domain3D(o3) => o3,
        other => return Err(Error::unsupported("section object", other.object_type() as i32)),
    };
    let domain = &input.domain;
    match domain.kind() {
        PlaneDomainKind::Empty => return Ok((Object::Empty, Object::Empty)),
        PlaneDomainKind::Interval => {}
        _ => return Err(Error::InvalidDomain("section needs interval planes")),
    }
    if domain.is_empty() {
        return Ok((Object::Empty, Object::Empty));
    }
    let view = view.ok_or(Error::InvalidValues("no view structure"))?;
    if !view.is_initialized() {
        return Err(Error::InvalidValues("view structure is not initialised"));
    }

    let make = || {
        PlaneDomain::new(
            domain.kind(),
            domain.plane_first(),
            domain.plane_last(),
            domain.line_first(),
            domain.line_last(),
            domain.column_first(),
            domain.column_last(),
        )
        .map(|mut d| {
            d.voxel_size = domain.voxel_size;
            d
        })
    };
    let mut negative = make()?;
    let mut positive = make()?;

    for (p, slot) in domain.planes() {
        let Some(plane) = slot.as_interval().filter(|d| !d.is_empty()) else {
            continue;
        };
        let (neg, pos) = split_plane(view, p, plane)?;
        negative.set_plane(p, neg)?;
        positive.set_plane(p, pos)?;
    }

    let finish = |mut d: PlaneDomain| {
        if d.standardize() {
            Object::domain_3d(d)
        } else {
            Object::Empty
        }
    };
    let (negative, positive) = (finish(negative), finish(positive));
    debug!(
        "section split {} voxels into {} and {}",
        domain.volume(),
        volume_of(&negative),
        volume_of(&positive)
    );
    Ok((negative, positive))
}

fn volume_of(obj: &Object) -> u64 {
    obj.as_3d().map(|o| o.domain.volume()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;
    use std::rc::Rc;

    use super::segment;
    use crate::view::ViewStruct;
    use iv_core::{
        DVertex3, Error, Interval, IntervalDomain, Object, Object3D, PlaneDomain, PlaneDomainKind, PlaneSlot,
    };

    fn block(planes: i32, lines: i32, columns: i32) -> Object {
        let mut pd = PlaneDomain::new(PlaneDomainKind::Interval, 0, planes - 1, 0, lines - 1, 0, columns - 1)
            .expect("planes");
        for p in 0..planes {
            let dom = IntervalDomain::rect(0, lines - 1, 0, columns - 1).expect("rect");
            pd.set_plane(p, PlaneSlot::Interval(Rc::new(dom))).expect("set");
        }
        Object::Domain3D(Object3D::new(Rc::new(pd)))
    }

    /// Disc of radius 6 with a hole, on five planes of varying offset.
    fn lumpy() -> Object {
        let mut pd = PlaneDomain::new(PlaneDomainKind::Interval, -2, 2, -8, 8, -8, 8).expect("planes");
        for p in -2..=2 {
            let runs = (-6..=6)
                .map(|y: i32| {
                    let half = (36 - y * y) as f64;
                    let half = half.sqrt() as i32;
                    if y.abs() < 2 {
                        vec![Interval::new(-half + p, -2 + p), Interval::new(2 + p, half + p)]
                    } else {
                        vec![Interval::new(-half + p, half + p)]
                    }
                })
                .collect();
            pd.set_plane(p, PlaneSlot::Interval(Rc::new(IntervalDomain::from_runs(-6, runs).expect("runs"))))
                .expect("set");
        }
        pd.standardize();
        Object::Domain3D(Object3D::new(Rc::new(pd)))
    }

    fn view(theta: f64, phi: f64, zeta: f64, dist: f64) -> ViewStruct {
        let mut v = ViewStruct::new(DVertex3::default(), theta, phi, zeta, dist);
        v.init();
        v
    }

    fn covers(obj: &Object, p: i32, l: i32, k: i32) -> bool {
        obj.as_3d()
            .ok()
            .and_then(|o| o.domain.plane(p).and_then(|s| s.as_interval().cloned()))
            .is_some_and(|d| d.contains(l, k))
    }

    #[test]
    fn column_plane_splits_runs() {
        let v = view(0.0, FRAC_PI_2, 0.0, 4.5);
        let (neg, pos) = segment(&block(2, 3, 10), Some(&v)).expect("segment");
        let neg = neg.as_3d().expect("neg");
        let pos = pos.as_3d().expect("pos");
        let plane = neg.plane_object(0).expect("plane");
        assert_eq!(plane.domain.line_runs(1).to_vec(), vec![Interval::new(0, 4)]);
        let plane = pos.plane_object(1).expect("plane");
        assert_eq!(plane.domain.line_runs(2).to_vec(), vec![Interval::new(5, 9)]);
        assert_eq!(neg.domain.volume() + pos.domain.volume(), 60);
    }

    #[test]
    fn halves_partition_the_volume() {
        let obj = lumpy();
        let v = view(0.4, 0.9, -0.3, 0.7);
        let (neg, pos) = segment(&obj, Some(&v)).expect("segment");
        let input = obj.as_3d().expect("3d");
        let mut seen = 0;
        for p in -3..=3 {
            for l in -9..=9 {
                for k in -11..=11 {
                    let inside = covers(&obj, p, l, k);
                    let (a, b) = (covers(&neg, p, l, k), covers(&pos, p, l, k));
                    assert!(!(a && b), "voxel ({p}, {l}, {k}) on both sides");
                    assert_eq!(inside, a || b, "voxel ({p}, {l}, {k})");
                    seen += u64::from(inside);
                }
            }
        }
        assert_eq!(seen, input.domain.volume());
        assert!(!neg.is_empty() && !pos.is_empty());
    }

    #[test]
    fn plane_wholly_on_one_side() {
        // Planes 0 and 1 lie below z = 2.5.
        let v = view(0.0, 0.0, 0.0, 2.5);
        let (neg, pos) = segment(&block(2, 2, 2), Some(&v)).expect("segment");
        assert_eq!(neg.as_3d().expect("neg").domain.volume(), 8);
        assert_eq!(pos, Object::Empty);
    }

    #[test]
    fn empty_volume_gives_two_empties() {
        let (a, b) = segment(&Object::Empty, None).expect("segment");
        assert!(a.is_empty() && b.is_empty());
    }

    #[test]
    fn rejects_bad_inputs() {
        let obj = block(1, 1, 1);
        assert!(matches!(segment(&obj, None), Err(Error::InvalidValues(_))));
        let raw = ViewStruct::default();
        assert!(matches!(segment(&obj, Some(&raw)), Err(Error::InvalidValues(_))));

        let flat = Object::domain_2d(IntervalDomain::rect(0, 1, 0, 1).expect("rect"));
        let v = view(0.0, 0.0, 0.0, 0.0);
        assert!(matches!(segment(&flat, Some(&v)), Err(Error::UnsupportedType { .. })));

        let poly = PlaneDomain::new(PlaneDomainKind::Polygon, 0, 0, 0, 0, 0, 0).expect("planes");
        let poly = Object::Domain3D(Object3D::new(Rc::new(poly)));
        assert!(matches!(segment(&poly, Some(&v)), Err(Error::InvalidDomain(_))));
    }
}

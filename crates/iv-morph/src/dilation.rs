//! Minkowski sum of interval domains.
//!
//! Output line `y` is the union over every line pair `(la, lb)` with
//! `la + lb == y` of one line dilated by the other. Dilating a line by a
//! single run shifts every run by the run's left and right ends and fuses
//! runs the shift closes up; the per-pair results are folded into an
//! accumulator with a two-pointer merge.

use std::rc::Rc;

use log::debug;

use iv_core::{
    Error, Interval, IntervalDomain, IntervalDomainKind, Object, Object2D, Object3D, PlaneDomain,
    PlaneDomainKind, PlaneSlot, Result, TransformedObject,
};

/// Runs of `line` dilated by the single run `by`, appended to `out`.
///
/// Neighbouring runs fuse once the gap between them is at most one column
/// after shifting. Shifts past the `i32` column range are rejected.
pub fn line_struct_dil(line: &[Interval], by: Interval, out: &mut Vec<Interval>) -> Result<()> {
    let Some((first, rest)) = line.split_first() else {
        return Ok(());
    };
    let reach = i64::from(by.right) - i64::from(by.left) + 1;
    let mut left = checked_sum(first.left, by.left)?;
    let mut prev = *first;
    for itv in rest {
        if i64::from(itv.left) > i64::from(prev.right) + reach {
            out.push(Interval::new(left, checked_sum(prev.right, by.right)?));
            left = checked_sum(itv.left, by.left)?;
        }
        prev = *itv;
    }
    out.push(Interval::new(left, checked_sum(prev.right, by.right)?));
    Ok(())
}

/// Union of two sorted run lists into `out`. Runs that overlap or touch
/// (gap of at most one column) are fused.
pub fn union_runs(a: &[Interval], b: &[Interval], out: &mut Vec<Interval>) {
    out.clear();
    out.reserve(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() || j < b.len() {
        let next = match (a.get(i), b.get(j)) {
            (Some(x), Some(y)) if x.left <= y.left => {
                i += 1;
                *x
            }
            (_, Some(y)) => {
                j += 1;
                *y
            }
            (Some(x), None) => {
                i += 1;
                *x
            }
            (None, None) => break,
        };
        match out.last_mut() {
            Some(last) if next.left <= last.right.saturating_add(1) => last.right = last.right.max(next.right),
            _ => out.push(next),
        }
    }
}

/// Scratch for folding dilated lines into one accumulator.
#[derive(Debug, Default)]
struct LineUnion {
    acc: Vec<Interval>,
    spare: Vec<Interval>,
    shifted: Vec<Interval>,
}

impl LineUnion {
    fn clear(&mut self) {
        self.acc.clear();
    }

    /// Adds `line` dilated by every run of `by`.
    fn add_pair(&mut self, line: &[Interval], by: &[Interval]) -> Result<()> {
        // Walk the shorter list run by run.
        let (long, short) = if by.len() < line.len() { (line, by) } else { (by, line) };
        for &run in short {
            self.shifted.clear();
            line_struct_dil(long, run, &mut self.shifted)?;
            union_runs(&self.acc, &self.shifted, &mut self.spare);
            std::mem::swap(&mut self.acc, &mut self.spare);
        }
        Ok(())
    }

    fn take(&mut self) -> Vec<Interval> {
        std::mem::take(&mut self.acc)
    }
}

fn checked_sum(a: i32, b: i32) -> Result<i32> {
    a.checked_add(b)
        .ok_or(Error::InvalidParameter("dilated bounds overflow"))
}

/// Dilation of two interval domains. Either operand may be the empty kind,
/// giving an empty result.
pub fn dilate_domains(a: &IntervalDomain, b: &IntervalDomain) -> Result<IntervalDomain> {
    if a.is_empty() || b.is_empty() {
        return Ok(IntervalDomain::empty());
    }
    let line_first = checked_sum(a.line_first(), b.line_first())?;
    let line_last = checked_sum(a.line_last(), b.line_last())?;
    let column_first = checked_sum(a.column_first(), b.column_first())?;
    let column_last = checked_sum(a.column_last(), b.column_last())?;

    let mut out = IntervalDomain::new(
        IntervalDomainKind::RunCoded,
        line_first,
        line_last,
        column_first,
        column_last,
    )?;
    let mut union = LineUnion::default();
    for y in line_first..=line_last {
        union.clear();
        let la_first = a.line_first().max(y - b.line_last());
        let la_last = a.line_last().min(y - b.line_first());
        for la in la_first..=la_last {
            let runs_a = a.line_runs(la);
            let runs_b = b.line_runs(y - la);
            if runs_a.is_empty() || runs_b.is_empty() {
                continue;
            }
            union.add_pair(&runs_a, &runs_b)?;
        }
        out.set_line(y, union.take())?;
    }
    out.standardize();
    debug!(
        "dilated {} x {} intervals into {}",
        a.interval_count(),
        b.interval_count(),
        out.interval_count()
    );
    Ok(out)
}

/// Union of two interval domains.
pub fn union_domains(a: &IntervalDomain, b: &IntervalDomain) -> Result<IntervalDomain> {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ok(IntervalDomain::empty()),
        (true, false) => return Ok(b.clone()),
        (false, true) => return Ok(a.clone()),
        (false, false) => {}
    }
    let line_first = a.line_first().min(b.line_first());
    let line_last = a.line_last().max(b.line_last());
    let mut out = IntervalDomain::new(
        IntervalDomainKind::RunCoded,
        line_first,
        line_last,
        a.column_first().min(b.column_first()),
        a.column_last().max(b.column_last()),
    )?;
    let mut merged = Vec::new();
    for y in line_first..=line_last {
        union_runs(&a.line_runs(y), &b.line_runs(y), &mut merged);
        out.set_line(y, std::mem::take(&mut merged))?;
    }
    out.standardize();
    Ok(out)
}

/// Dilates `obj` by `element`.
///
/// Results carry a domain only. An empty element leaves the object's domain
/// unchanged. A 2D element applied to a 3D object acts on every plane.
/// Transformed objects are dilated inside their wrapper and transformed
/// elements are unwrapped.
pub fn dilate(obj: &Object, element: &Object) -> Result<Object> {
    match obj {
        Object::Empty => Ok(Object::Empty),
        Object::Domain2D(o) if o.domain.is_empty() => Ok(Object::Empty),
        Object::Domain2D(o) => dilate_2d(o, element),
        Object::Domain3D(o) => dilate_3d(o, element),
        Object::Transformed(t) => Ok(Object::Transformed(TransformedObject {
            transform: Rc::clone(&t.transform),
            object: Rc::new(dilate(&t.object, element)?),
            properties: t.properties.clone(),
        })),
        other => Err(Error::unsupported("dilation object", other.object_type() as i32)),
    }
}

fn dilate_2d(obj: &Object2D, element: &Object) -> Result<Object> {
    let unchanged = || Ok(Object::Domain2D(Object2D::new(Rc::clone(&obj.domain))));
    match element {
        Object::Empty => unchanged(),
        Object::Domain2D(e) if e.domain.is_empty() => unchanged(),
        Object::Domain2D(e) => Ok(Object::domain_2d(dilate_domains(&obj.domain, &e.domain)?)),
        Object::Transformed(t) => dilate_2d(obj, &t.object),
        other => Err(Error::unsupported("structuring element", other.object_type() as i32)),
    }
}

/// Wraps a 2D element as a single-plane element at plane 0.
fn broadcast_element(element: &Rc<IntervalDomain>) -> Result<PlaneDomain> {
    let mut planes = PlaneDomain::new(
        PlaneDomainKind::Interval,
        0,
        0,
        element.line_first(),
        element.line_last(),
        element.column_first(),
        element.column_last(),
    )?;
    planes.set_plane(0, PlaneSlot::Interval(Rc::clone(element)))?;
    Ok(planes)
}

fn dilate_3d(obj: &Object3D, element: &Object) -> Result<Object> {
    match obj.domain.kind() {
        PlaneDomainKind::Empty => return Ok(Object::Empty),
        PlaneDomainKind::Interval => {}
        _ => return Err(Error::InvalidDomain("dilation needs interval planes")),
    }
    let unchanged = || Ok(Object::Domain3D(Object3D::new(Rc::clone(&obj.domain))));
    match element {
        Object::Empty => unchanged(),
        Object::Domain2D(e) if e.domain.is_empty() => unchanged(),
        Object::Domain2D(e) => dilate_planes(&obj.domain, &broadcast_element(&e.domain)?),
        Object::Domain3D(e) => match e.domain.kind() {
            PlaneDomainKind::Empty => unchanged(),
            PlaneDomainKind::Interval => dilate_planes(&obj.domain, &e.domain),
            _ => Err(Error::InvalidDomain("structuring element needs interval planes")),
        },
        Object::Transformed(t) => dilate_3d(obj, &t.object),
        other => Err(Error::unsupported("structuring element", other.object_type() as i32)),
    }
}

/// Output plane `p` is the union over element planes `q` of the object plane
/// `p - q` dilated by element plane `q`.
fn dilate_planes(obj: &PlaneDomain, element: &PlaneDomain) -> Result<Object> {
    let plane_first = checked_sum(obj.plane_first(), element.plane_first())?;
    let plane_last = checked_sum(obj.plane_last(), element.plane_last())?;
    let mut out = PlaneDomain::new(
        PlaneDomainKind::Interval,
        plane_first,
        plane_last,
        obj.line_first(),
        obj.line_last(),
        obj.column_first(),
        obj.column_last(),
    )?;
    out.voxel_size = obj.voxel_size;

    for p in plane_first..=plane_last {
        let mut acc = IntervalDomain::empty();
        for (q, slot) in element.planes() {
            let Some(by) = slot.as_interval() else {
                continue;
            };
            let Some(src) = obj.plane(p - q).and_then(PlaneSlot::as_interval) else {
                continue;
            };
            let dilated = dilate_domains(src, by)?;
            acc = union_domains(&acc, &dilated)?;
        }
        if !acc.is_empty() {
            out.set_plane(p, PlaneSlot::Interval(Rc::new(acc)))?;
        }
    }
    out.standardize();
    debug!(
        "dilated planes {}..={} into {}..={}",
        obj.plane_first(),
        obj.plane_last(),
        out.plane_first(),
        out.plane_last()
    );
    Ok(Object::domain_3d(out))
}

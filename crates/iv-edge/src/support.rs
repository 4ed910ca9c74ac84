use std::rc::Rc;

use iv_core::{
    Error, GreyScan, GreyScanMut, GreySlice, GreyValues, Interval, IntervalDomain, Object, Object2D, RasterDirection, Result,
    ScanItem, optional,
};

/// The 2D object behind `obj`, `None` for an empty one. Values are required.
pub(crate) fn valued_2d<'a>(obj: &'a Object, what: &'static str) -> Result<Option<&'a Object2D>> {
    match obj {
        Object::Domain2D(o) if o.domain.is_empty() => Ok(None),
        Object::Domain2D(o) => {
            o.values()?;
            Ok(Some(o))
        }
        Object::Empty => Ok(None),
        other => Err(Error::unsupported(what, other.object_type() as i32)),
    }
}

/// Fails unless two lockstep scans emitted the same run.
pub(crate) fn congruent(a: &ScanItem, b: &ScanItem) -> Result<()> {
    if (a.line, a.left, a.right) == (b.line, b.left, b.right) {
        Ok(())
    } else {
        Err(Error::InvalidDomain("lockstep scans are not congruent"))
    }
}

/// Runs collected per line, starting at `line_first`.
pub(crate) struct LineRunBuf {
    line_first: i32,
    lines: Vec<Vec<Interval>>,
}

impl LineRunBuf {
    pub(crate) fn new(domain: &IntervalDomain) -> Self {
        Self {
            line_first: domain.line_first(),
            lines: vec![Vec::new(); domain.height()],
        }
    }

    /// Appends columns `left..=right`, extending the previous run when they
    /// touch it.
    pub(crate) fn push(&mut self, line: i32, left: i32, right: i32) {
        let runs = &mut self.lines[(line - self.line_first) as usize];
        match runs.last_mut() {
            Some(last) if last.right + 1 >= left => last.right = last.right.max(right),
            _ => runs.push(Interval::new(left, right)),
        }
    }

    pub(crate) fn into_domain(self) -> Result<IntervalDomain> {
        IntervalDomain::from_runs(self.line_first, self.lines)
    }
}

/// `src` cut down to `domain`, with a fresh table of the same type holding
/// the retained samples.
pub(crate) fn restrict(src: &Object2D, domain: IntervalDomain) -> Result<Object> {
    if domain.is_empty() {
        return Ok(Object::Empty);
    }
    let from = src.values()?;
    let mut values = GreyValues::new_for_domain(&domain, from.grey_type(), from.background())?;
    let mut dst = GreyScanMut::new(&domain, &mut values, RasterDirection::IncLineIncCol);
    while let Some((item, mut span)) = optional(dst.next_run())? {
        for (i, k) in (item.left..=item.right).enumerate() {
            span.set(i, from.get(item.line, k));
        }
    }
    Ok(Object::Domain2D(Object2D::with_values(Rc::new(domain), Rc::new(values))))
}

/// Grey scan over `obj` that also yields the run samples as `f64`.
pub(crate) fn next_f64(scan: &mut GreyScan<'_>) -> Result<(ScanItem, Vec<f64>)> {
    let (item, span) = scan.next_run()?;
    Ok((item, span.to_f64_vec()))
}

/// Next run of a scan that follows `lead` in lockstep. Running out early or
/// emitting a different run is a domain mismatch.
pub(crate) fn follow<'a>(scan: &mut GreyScan<'a>, lead: &ScanItem) -> Result<GreySlice<'a>> {
    match scan.next_run() {
        Ok((item, span)) => {
            congruent(lead, &item)?;
            Ok(span)
        }
        Err(Error::EndOfObject) => Err(Error::InvalidDomain("lockstep scans are not congruent")),
        Err(e) => Err(e),
    }
}

pub(crate) fn follow_f64(scan: &mut GreyScan<'_>, lead: &ScanItem) -> Result<Vec<f64>> {
    Ok(follow(scan, lead)?.to_f64_vec())
}

/// Fails when a following scan still has runs after the leading one ended.
pub(crate) fn exhausted(scan: &mut GreyScan<'_>) -> Result<()> {
    match scan.next_run() {
        Err(Error::EndOfObject) => Ok(()),
        Ok(_) => Err(Error::InvalidDomain("lockstep scans are not congruent")),
        Err(e) => Err(e),
    }
}

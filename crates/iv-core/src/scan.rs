//! Raster scans over interval domains.
//!
//! [`IntervalScan::next_interval`] is the only transition driver. It reports
//! [`Error::EndOfObject`] once the domain is exhausted; loops treat that as
//! termination, never as a failure. The [`Iterator`] impl does this for you.

use crate::error::{Error, Result};
use crate::interval::{IntervalDomain, LineRuns};
use crate::object::Object2D;
use crate::values::{GreySlice, GreySliceMut, GreyValues};

/// Line and column traversal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RasterDirection {
    /// Increasing lines, increasing columns. The canonical order.
    #[default]
    IncLineIncCol,
    IncLineDecCol,
    DecLineIncCol,
    DecLineDecCol,
}

impl RasterDirection {
    fn lines_increase(self) -> bool {
        matches!(self, Self::IncLineIncCol | Self::IncLineDecCol)
    }

    fn columns_increase(self) -> bool {
        matches!(self, Self::IncLineIncCol | Self::DecLineIncCol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Uninitialized,
    Ready,
    InLine,
    Exhausted,
}

/// One emitted run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanItem {
    pub line: i32,
    pub left: i32,
    pub right: i32,
    /// First run emitted on this line.
    pub new_line: bool,
    /// No further runs remain on this line.
    pub line_end: bool,
}

impl ScanItem {
    pub fn width(&self) -> usize {
        (self.right - self.left + 1) as usize
    }
}

#[derive(Debug, Clone)]
pub struct IntervalScan<'a> {
    domain: Option<&'a IntervalDomain>,
    direction: RasterDirection,
    state: ScanState,
    next_line: i32,
    lines_left: usize,
    line: i32,
    runs: LineRuns<'a>,
    pos: usize,
}

impl Default for IntervalScan<'_> {
    fn default() -> Self {
        Self {
            domain: None,
            direction: RasterDirection::default(),
            state: ScanState::Uninitialized,
            next_line: 0,
            lines_left: 0,
            line: 0,
            runs: LineRuns::Borrowed(&[]),
            pos: 0,
        }
    }
}

impl<'a> IntervalScan<'a> {
    /// A scan that is ready to emit the first run of `domain`.
    pub fn new(domain: &'a IntervalDomain, direction: RasterDirection) -> Self {
        let mut scan = Self::default();
        scan.init(domain, direction);
        scan
    }

    /// Scan over the domain of a 2D object.
    pub fn for_object(obj: &'a Object2D, direction: RasterDirection) -> Self {
        Self::new(&obj.domain, direction)
    }

    /// (Re)starts the scan. Scans are not rewindable otherwise.
    pub fn init(&mut self, domain: &'a IntervalDomain, direction: RasterDirection) {
        self.domain = Some(domain);
        self.direction = direction;
        self.state = ScanState::Ready;
        self.lines_left = domain.height();
        self.next_line = if direction.lines_increase() {
            domain.line_first()
        } else {
            domain.line_last()
        };
        self.runs = LineRuns::Borrowed(&[]);
        self.pos = 0;
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn direction(&self) -> RasterDirection {
        self.direction
    }

    /// Advances to the next run.
    pub fn next_interval(&mut self) -> Result<ScanItem> {
        let domain = match (self.state, self.domain) {
            (ScanState::Uninitialized, _) | (_, None) => {
                return Err(Error::NullInput("scan is not initialised"));
            }
            (ScanState::Exhausted, _) => return Err(Error::EndOfObject),
            (_, Some(d)) => d,
        };

        if self.state == ScanState::InLine && self.pos < self.runs.len() {
            return Ok(self.emit());
        }

        while self.lines_left > 0 {
            let line = self.next_line;
            self.lines_left -= 1;
            if self.direction.lines_increase() {
                self.next_line += 1;
            } else {
                self.next_line -= 1;
            }

            let runs = domain.line_runs(line);
            if !runs.is_empty() {
                self.line = line;
                self.runs = runs;
                self.pos = 0;
                self.state = ScanState::InLine;
                return Ok(self.emit());
            }
        }

        self.state = ScanState::Exhausted;
        Err(Error::EndOfObject)
    }

    fn emit(&mut self) -> ScanItem {
        let n = self.runs.len();
        let idx = if self.direction.columns_increase() {
            self.pos
        } else {
            n - 1 - self.pos
        };
        let itv = self.runs[idx];
        self.pos += 1;
        ScanItem {
            line: self.line,
            left: itv.left,
            right: itv.right,
            new_line: self.pos == 1,
            line_end: self.pos == n,
        }
    }
}

impl Iterator for IntervalScan<'_> {
    type Item = ScanItem;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_interval().ok()
    }
}

/// Scan that also resolves the grey values of every emitted run.
#[derive(Debug, Clone)]
pub struct GreyScan<'a> {
    scan: IntervalScan<'a>,
    values: &'a GreyValues,
}

impl<'a> GreyScan<'a> {
    pub fn new(obj: &'a Object2D, direction: RasterDirection) -> Result<Self> {
        Ok(Self {
            scan: IntervalScan::for_object(obj, direction),
            values: obj.values()?,
        })
    }

    pub fn values(&self) -> &'a GreyValues {
        self.values
    }

    /// Next run with its samples, in column order regardless of direction.
    pub fn next_run(&mut self) -> Result<(ScanItem, GreySlice<'a>)> {
        let item = self.scan.next_interval()?;
        let span = self
            .values
            .span(item.line, item.left, item.right)
            .ok_or(Error::InvalidValues("run lies outside the value table"))?;
        Ok((item, span))
    }
}

/// Mutable grey scan. Each run borrows the table until the next call.
#[derive(Debug)]
pub struct GreyScanMut<'a> {
    scan: IntervalScan<'a>,
    values: &'a mut GreyValues,
}

impl<'a> GreyScanMut<'a> {
    pub fn new(domain: &'a IntervalDomain, values: &'a mut GreyValues, direction: RasterDirection) -> Self {
        Self {
            scan: IntervalScan::new(domain, direction),
            values,
        }
    }

    pub fn next_run(&mut self) -> Result<(ScanItem, GreySliceMut<'_>)> {
        let item = self.scan.next_interval()?;
        let span = self
            .values
            .span_mut(item.line, item.left, item.right)
            .ok_or(Error::InvalidValues("run lies outside the value table"))?;
        Ok((item, span))
    }
}

/// Collects every run of `domain` in canonical order.
pub fn collect_runs(domain: &IntervalDomain) -> Vec<ScanItem> {
    IntervalScan::new(domain, RasterDirection::default()).collect()
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::{GreyScan, GreyScanMut, IntervalScan, RasterDirection, ScanState, collect_runs};
    use crate::Error;
    use crate::interval::{Interval, IntervalDomain, IntervalDomainKind};
    use crate::object::Object2D;
    use crate::values::{GreySliceMut, GreyType, GreyValues, PixelValue};

    fn sample() -> IntervalDomain {
        IntervalDomain::from_runs(
            -1,
            vec![
                vec![Interval::new(0, 2), Interval::new(6, 7)],
                vec![],
                vec![Interval::new(-3, -3)],
            ],
        ).expect("runs")
    }

    #[test]
    fn canonical_order_and_flags() {
        let dom = sample();
        let mut scan = IntervalScan::new(&dom, RasterDirection::IncLineIncCol);
        assert_eq!(scan.state(), ScanState::Ready);

        let a = scan.next_interval().expect("first");
        assert_eq!((a.line, a.left, a.right, a.new_line, a.line_end), (-1, 0, 2, true, false));
        assert_eq!(scan.state(), ScanState::InLine);
        let b = scan.next_interval().expect("second");
        assert_eq!((b.line, b.left, b.new_line, b.line_end), (-1, 6, false, true));
        let c = scan.next_interval().expect("third");
        assert_eq!((c.line, c.left, c.right, c.new_line, c.line_end), (1, -3, -3, true, true));

        assert!(matches!(scan.next_interval(), Err(Error::EndOfObject)));
        assert_eq!(scan.state(), ScanState::Exhausted);
        assert!(matches!(scan.next_interval(), Err(Error::EndOfObject)));
    }

    #[test]
    fn triples_are_strictly_increasing_and_rebuild_the_domain() {
        let dom = sample();
        let runs = collect_runs(&dom);
        for w in runs.windows(2) {
            assert!((w[0].line, w[0].left) < (w[1].line, w[1].left));
        }

        let mut rebuilt =
            IntervalDomain::new(IntervalDomainKind::RunCoded, -1, 1, dom.column_first(), dom.column_last())
                .expect("valid");
        for r in &runs {
            rebuilt.push_interval(r.line, r.left, r.right).expect("push");
        }
        rebuilt.standardize();
        assert_eq!(rebuilt, dom);
    }

    #[test]
    fn reversed_directions() {
        let dom = sample();
        let lines: Vec<(i32, i32)> = IntervalScan::new(&dom, RasterDirection::DecLineDecCol)
            .map(|i| (i.line, i.left))
            .collect();
        assert_eq!(lines, vec![(1, -3), (-1, 6), (-1, 0)]);
    }

    #[test]
    fn uninitialised_and_empty_scans() {
        let mut scan = IntervalScan::default();
        assert!(matches!(scan.next_interval(), Err(Error::NullInput(_))));

        let empty = IntervalDomain::empty();
        scan.init(&empty, RasterDirection::default());
        assert!(matches!(scan.next_interval(), Err(Error::EndOfObject)));
    }

    #[test]
    fn rect_domain_yields_one_run_per_line() {
        let dom = IntervalDomain::rect(0, 2, 4, 9).expect("valid");
        let runs = collect_runs(&dom);
        assert_eq!(runs.len(), 3);
        assert!(runs.iter().all(|r| r.left == 4 && r.right == 9 && r.line_end));
    }

    #[test]
    fn grey_scans_resolve_spans() {
        let dom = sample();
        let mut values = GreyValues::new_for_domain(&dom, GreyType::Int, PixelValue::Int(0)).expect("values");
        {
            let mut scan = GreyScanMut::new(&dom, &mut values, RasterDirection::default());
            while let Ok((item, span)) = scan.next_run() {
                if let GreySliceMut::Int(s) = span {
                    for (i, px) in s.iter_mut().enumerate() {
                        *px = item.left + i as i32;
                    }
                }
            }
        }

        let obj = Object2D::with_values(Rc::new(dom), Rc::new(values));
        let mut scan = GreyScan::new(&obj, RasterDirection::default()).expect("values present");
        let mut seen = 0;
        while let Ok((item, span)) = scan.next_run() {
            for i in 0..span.len() {
                assert_eq!(span.get(i), PixelValue::Int(item.left + i as i32));
                seen += 1;
            }
        }
        assert_eq!(seen, 6);
    }
}

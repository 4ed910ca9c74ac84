use core::ops::Deref;

use crate::error::{Error, Result, try_filled_vec};

/// Closed column range `[left, right]` on one line, in absolute columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    pub left: i32,
    pub right: i32,
}

impl Interval {
    pub const fn new(left: i32, right: i32) -> Self {
        Self { left, right }
    }

    pub fn width(self) -> i32 {
        self.right - self.left + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalDomainKind {
    /// Nothing is covered. Carries no lines.
    Empty,
    /// Explicit sorted runs per line.
    RunCoded,
    /// The whole bounding box is covered, no runs are stored.
    Rect,
}

/// Outcome of [`IntervalDomain::standardize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupancy {
    Occupied,
    Empty,
}

/// The runs of one line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IntervalLine {
    intervals: Vec<Interval>,
}

impl IntervalLine {
    pub fn new(intervals: Vec<Interval>) -> Self {
        Self { intervals }
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    fn standardize(&mut self) {
        if self.intervals.len() < 2 {
            return;
        }
        self.intervals.sort_unstable_by_key(|itv| itv.left);

        let mut w = 0usize;
        for r in 1..self.intervals.len() {
            let next = self.intervals[r];
            let cur = &mut self.intervals[w];
            if next.left <= cur.right.saturating_add(1) {
                cur.right = cur.right.max(next.right);
            } else {
                w += 1;
                self.intervals[w] = next;
            }
        }
        self.intervals.truncate(w + 1);
    }
}

/// Runs of a single line, borrowed from a run-coded domain or synthesised for
/// a rectangular one.
#[derive(Debug, Clone, Copy)]
pub enum LineRuns<'a> {
    Borrowed(&'a [Interval]),
    Rect([Interval; 1]),
}

impl Deref for LineRuns<'_> {
    type Target = [Interval];

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Borrowed(s) => s,
            Self::Rect(one) => one,
        }
    }
}

/// Run-length encoded 2D region.
///
/// Lines are indexed implicitly: `lines[i]` holds the runs of line
/// `line_first + i`. After [`standardize`](Self::standardize) every line's
/// runs are sorted and separated by at least one uncovered column, the first
/// and last line carry runs and the column bounds are tight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalDomain {
    kind: IntervalDomainKind,
    line_first: i32,
    line_last: i32,
    column_first: i32,
    column_last: i32,
    lines: Vec<IntervalLine>,
}

impl IntervalDomain {
    pub fn new(
        kind: IntervalDomainKind,
        line_first: i32,
        line_last: i32,
        column_first: i32,
        column_last: i32,
    ) -> Result<Self> {
        if kind == IntervalDomainKind::Empty {
            return Ok(Self::empty());
        }
        if line_last < line_first {
            return Err(Error::InvalidDomain("last line precedes first line"));
        }
        if column_last < column_first {
            return Err(Error::InvalidDomain("last column precedes first column"));
        }

        let lines = match kind {
            IntervalDomainKind::RunCoded => {
                let n = (i64::from(line_last) - i64::from(line_first) + 1) as usize;
                try_filled_vec(n, IntervalLine::default())?
            }
            _ => Vec::new(),
        };

        Ok(Self {
            kind,
            line_first,
            line_last,
            column_first,
            column_last,
            lines,
        })
    }

    pub fn empty() -> Self {
        Self {
            kind: IntervalDomainKind::Empty,
            line_first: 0,
            line_last: 0,
            column_first: 0,
            column_last: 0,
            lines: Vec::new(),
        }
    }

    pub fn rect(line_first: i32, line_last: i32, column_first: i32, column_last: i32) -> Result<Self> {
        Self::new(
            IntervalDomainKind::Rect,
            line_first,
            line_last,
            column_first,
            column_last,
        )
    }

    /// Builds a standardized run-coded domain from per-line runs starting at
    /// `line_first`. Bounds are derived from the runs.
    pub fn from_runs(line_first: i32, runs: Vec<Vec<Interval>>) -> Result<Self> {
        let mut column_first = i32::MAX;
        let mut column_last = i32::MIN;
        for itv in runs.iter().flatten() {
            column_first = column_first.min(itv.left);
            column_last = column_last.max(itv.right);
        }
        if column_first > column_last {
            return Ok(Self::empty());
        }

        let line_last = i32::try_from(runs.len() - 1)
            .ok()
            .and_then(|n| line_first.checked_add(n))
            .ok_or(Error::InvalidParameter("line range overflows"))?;
        let mut dom = Self {
            kind: IntervalDomainKind::RunCoded,
            line_first,
            line_last,
            column_first,
            column_last,
            lines: runs.into_iter().map(IntervalLine::new).collect(),
        };
        dom.standardize();
        Ok(dom)
    }

    pub fn kind(&self) -> IntervalDomainKind {
        self.kind
    }

    pub fn line_first(&self) -> i32 {
        self.line_first
    }

    pub fn line_last(&self) -> i32 {
        self.line_last
    }

    pub fn column_first(&self) -> i32 {
        self.column_first
    }

    pub fn column_last(&self) -> i32 {
        self.column_last
    }

    pub fn height(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.line_last - self.line_first + 1) as usize
        }
    }

    pub fn width(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.column_last - self.column_first + 1) as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.kind == IntervalDomainKind::Empty
    }

    fn line_index(&self, line: i32) -> Option<usize> {
        if self.is_empty() || line < self.line_first || line > self.line_last {
            None
        } else {
            Some((line - self.line_first) as usize)
        }
    }

    /// Appends a run to `line`. Runs must be appended left to right.
    pub fn push_interval(&mut self, line: i32, left: i32, right: i32) -> Result<()> {
        if self.kind != IntervalDomainKind::RunCoded {
            return Err(Error::InvalidDomain("runs can only be added to a run-coded domain"));
        }
        let idx = self
            .line_index(line)
            .ok_or(Error::InvalidParameter("line outside domain"))?;
        if left > right {
            return Err(Error::InvalidParameter("interval left exceeds right"));
        }
        if left < self.column_first || right > self.column_last {
            return Err(Error::InvalidDomain("interval outside column bounds"));
        }

        let runs = &mut self.lines[idx].intervals;
        if runs.last().is_some_and(|last| left < last.left) {
            return Err(Error::InvalidParameter("runs must be appended left to right"));
        }
        runs.push(Interval::new(left, right));
        Ok(())
    }

    /// Replaces the runs of `line`. Column bounds are not checked, call
    /// [`standardize`](Self::standardize) afterwards.
    pub fn set_line(&mut self, line: i32, intervals: Vec<Interval>) -> Result<()> {
        if self.kind != IntervalDomainKind::RunCoded {
            return Err(Error::InvalidDomain("runs can only be set on a run-coded domain"));
        }
        let idx = self
            .line_index(line)
            .ok_or(Error::InvalidParameter("line outside domain"))?;
        self.lines[idx] = IntervalLine::new(intervals);
        Ok(())
    }

    /// Runs of `line`, empty outside the domain.
    pub fn line_runs(&self, line: i32) -> LineRuns<'_> {
        match (self.kind, self.line_index(line)) {
            (IntervalDomainKind::RunCoded, Some(idx)) => LineRuns::Borrowed(self.lines[idx].intervals()),
            (IntervalDomainKind::Rect, Some(_)) => {
                LineRuns::Rect([Interval::new(self.column_first, self.column_last)])
            }
            _ => LineRuns::Borrowed(&[]),
        }
    }

    pub fn line_interval_count(&self, line: i32) -> usize {
        self.line_runs(line).len()
    }

    /// Iterates `(line, runs)` for every line of the bounding box.
    pub fn lines(&self) -> impl Iterator<Item = (i32, LineRuns<'_>)> + '_ {
        let range = if self.is_empty() {
            1..=0
        } else {
            self.line_first..=self.line_last
        };
        range.map(move |l| (l, self.line_runs(l)))
    }

    pub fn interval_count(&self) -> usize {
        match self.kind {
            IntervalDomainKind::Empty => 0,
            IntervalDomainKind::Rect => self.height(),
            IntervalDomainKind::RunCoded => self.lines.iter().map(IntervalLine::len).sum(),
        }
    }

    /// Number of covered pixels.
    pub fn area(&self) -> u64 {
        match self.kind {
            IntervalDomainKind::Empty => 0,
            IntervalDomainKind::Rect => self.height() as u64 * self.width() as u64,
            IntervalDomainKind::RunCoded => self
                .lines
                .iter()
                .flat_map(|l| l.intervals.iter())
                .map(|itv| itv.width() as u64)
                .sum(),
        }
    }

    pub fn contains(&self, line: i32, column: i32) -> bool {
        let runs = self.line_runs(line);
        let idx = runs.partition_point(|itv| itv.right < column);
        runs.get(idx).is_some_and(|itv| itv.left <= column)
    }

    /// Explicit one-run-per-line copy of a rectangular domain; other kinds
    /// are cloned.
    pub fn to_run_coded(&self) -> Self {
        if self.kind != IntervalDomainKind::Rect {
            return self.clone();
        }
        let full = Interval::new(self.column_first, self.column_last);
        Self {
            kind: IntervalDomainKind::RunCoded,
            line_first: self.line_first,
            line_last: self.line_last,
            column_first: self.column_first,
            column_last: self.column_last,
            lines: (0..self.height())
                .map(|_| IntervalLine::new(vec![full]))
                .collect(),
        }
    }

    /// Merges touching runs, trims uncovered leading and trailing lines and
    /// tightens the column bounds. A run-coded domain left without runs turns
    /// into the empty kind.
    pub fn standardize(&mut self) -> Occupancy {
        match self.kind {
            IntervalDomainKind::Empty => return Occupancy::Empty,
            IntervalDomainKind::Rect => return Occupancy::Occupied,
            IntervalDomainKind::RunCoded => {}
        }

        for line in &mut self.lines {
            line.standardize();
        }

        let Some(first) = self.lines.iter().position(|l| !l.is_empty()) else {
            *self = Self::empty();
            return Occupancy::Empty;
        };
        let last = self
            .lines
            .iter()
            .rposition(|l| !l.is_empty())
            .unwrap_or(first);

        self.lines.truncate(last + 1);
        self.lines.drain(..first);
        self.line_last = self.line_first + last as i32;
        self.line_first += first as i32;

        let mut k1 = i32::MAX;
        let mut kl = i32::MIN;
        for line in &self.lines {
            if let (Some(a), Some(b)) = (line.intervals.first(), line.intervals.last()) {
                k1 = k1.min(a.left);
                kl = kl.max(b.right);
            }
        }
        self.column_first = k1;
        self.column_last = kl;

        Occupancy::Occupied
    }
}

#[cfg(test)]
mod tests {
    use super::{Interval, IntervalDomain, IntervalDomainKind, Occupancy};
    use crate::Error;

    fn square3() -> IntervalDomain {
        let mut d = IntervalDomain::new(IntervalDomainKind::RunCoded, -1, 1, -1, 1).expect("valid");
        for l in -1..=1 {
            d.push_interval(l, -1, 1).expect("in bounds");
        }
        d
    }

    #[test]
    fn construct_rejects_inverted_bounds() {
        let err = IntervalDomain::new(IntervalDomainKind::RunCoded, 3, 2, 0, 0).expect_err("inverted");
        assert!(matches!(err, Error::InvalidDomain(_)));
    }

    #[test]
    fn standardize_merges_adjacent_and_overlapping_runs() {
        let mut d = IntervalDomain::new(IntervalDomainKind::RunCoded, 0, 0, 0, 20).expect("valid");
        d.set_line(
            0,
            vec![
                Interval::new(0, 2),
                Interval::new(3, 4),
                Interval::new(8, 10),
                Interval::new(9, 12),
                Interval::new(14, 14),
            ],
        )
        .expect("line in range");

        assert_eq!(d.standardize(), Occupancy::Occupied);
        assert_eq!(
            &*d.line_runs(0),
            &[Interval::new(0, 4), Interval::new(8, 12), Interval::new(14, 14)]
        );
        assert_eq!((d.column_first(), d.column_last()), (0, 14));
    }

    #[test]
    fn standardize_is_idempotent_and_keeps_gap_of_two() {
        let mut d = IntervalDomain::new(IntervalDomainKind::RunCoded, 0, 3, -5, 40).expect("valid");
        d.set_line(1, vec![Interval::new(5, 7), Interval::new(1, 3), Interval::new(8, 9)])
            .expect("line");
        d.set_line(2, vec![Interval::new(-5, -5), Interval::new(-3, 0)])
            .expect("line");
        d.standardize();
        let once = d.clone();
        d.standardize();
        assert_eq!(d, once);

        for (_, runs) in d.lines() {
            for pair in runs.windows(2) {
                assert!(pair[1].left - pair[0].right >= 2);
            }
        }
    }

    #[test]
    fn standardize_trims_empty_border_lines() {
        let mut d = IntervalDomain::new(IntervalDomainKind::RunCoded, 0, 9, 0, 9).expect("valid");
        d.push_interval(3, 2, 4).expect("push");
        d.push_interval(5, 1, 1).expect("push");
        d.standardize();

        assert_eq!((d.line_first(), d.line_last()), (3, 5));
        assert_eq!((d.column_first(), d.column_last()), (1, 4));
        assert_eq!(d.line_interval_count(4), 0);
        assert_eq!(d.interval_count(), 2);
    }

    #[test]
    fn domain_without_runs_standardizes_to_empty() {
        let mut d = IntervalDomain::new(IntervalDomainKind::RunCoded, 0, 2, 0, 2).expect("valid");
        assert_eq!(d.standardize(), Occupancy::Empty);
        assert!(d.is_empty());
        assert_eq!(d.area(), 0);
    }

    #[test]
    fn push_checks_order_and_bounds() {
        let mut d = IntervalDomain::new(IntervalDomainKind::RunCoded, 0, 0, 0, 10).expect("valid");
        d.push_interval(0, 5, 6).expect("push");
        assert!(d.push_interval(0, 1, 2).is_err());
        assert!(d.push_interval(0, 8, 11).is_err());
        assert!(d.push_interval(1, 8, 9).is_err());
    }

    #[test]
    fn rect_counts_and_conversion() {
        let r = IntervalDomain::rect(2, 4, 10, 14).expect("valid");
        assert_eq!(r.interval_count(), 3);
        assert_eq!(r.area(), 15);
        assert!(r.contains(3, 14));
        assert!(!r.contains(5, 12));

        let rc = r.to_run_coded();
        assert_eq!(rc.kind(), IntervalDomainKind::RunCoded);
        assert_eq!(rc.area(), 15);
        assert_eq!(&*rc.line_runs(4), &[Interval::new(10, 14)]);
    }

    #[test]
    fn runs_past_the_last_line_are_rejected() {
        let run = vec![Interval::new(0, 0)];
        let top = IntervalDomain::from_runs(i32::MAX, vec![run.clone()]).expect("one line fits");
        assert_eq!(top.line_last(), i32::MAX);
        assert!(matches!(
            IntervalDomain::from_runs(i32::MAX - 1, vec![run.clone(); 3]),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn contains_respects_gaps() {
        let d = IntervalDomain::from_runs(0, vec![vec![Interval::new(0, 1), Interval::new(4, 6)]]).expect("runs");
        assert!(d.contains(0, 1));
        assert!(!d.contains(0, 2));
        assert!(d.contains(0, 5));
        assert!(!d.contains(1, 5));
        assert_eq!(square3().area(), 9);
    }
}

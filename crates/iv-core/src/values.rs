//! Grey value tables attached to interval and plane domains.
//!
//! A ragged table stores one value line per domain line spanning from the
//! first run's left column to the last run's right column. A rectangular
//! table stores the full bounding box in raster order.

use core::ops::Range;
use std::rc::Rc;

use crate::error::{Error, Result, try_filled_vec};
use crate::interval::{IntervalDomain, IntervalDomainKind};

/// Closed set of pixel types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GreyType {
    Int,
    Short,
    UByte,
    Float,
    Double,
    /// Packed 8-bit red, green, blue and alpha, red in the low byte.
    Rgba,
}

impl GreyType {
    pub const ALL: [GreyType; 6] = [
        GreyType::Int,
        GreyType::Short,
        GreyType::UByte,
        GreyType::Float,
        GreyType::Double,
        GreyType::Rgba,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Short => "short",
            Self::UByte => "ubyte",
            Self::Float => "float",
            Self::Double => "double",
            Self::Rgba => "rgba",
        }
    }
}

pub fn rgba_channels(p: u32) -> [u8; 4] {
    p.to_le_bytes()
}

pub fn pack_rgba(r: u8, g: u8, b: u8, a: u8) -> u32 {
    u32::from_le_bytes([r, g, b, a])
}

/// Storage element of a grey table.
pub trait Pixel: Copy + PartialEq + Default + core::fmt::Debug + 'static {
    const TYPE: GreyType;

    fn to_f64(self) -> f64;

    /// Saturating conversion, integer types round to nearest.
    fn from_f64(v: f64) -> Self;
}

macro_rules! int_pixel {
    ($t:ty, $ty:ident) => {
        impl Pixel for $t {
            const TYPE: GreyType = GreyType::$ty;

            fn to_f64(self) -> f64 {
                f64::from(self)
            }

            fn from_f64(v: f64) -> Self {
                v.round() as $t
            }
        }
    };
}

int_pixel!(i32, Int);
int_pixel!(i16, Short);
int_pixel!(u8, UByte);

impl Pixel for f32 {
    const TYPE: GreyType = GreyType::Float;

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn from_f64(v: f64) -> Self {
        v as f32
    }
}

impl Pixel for f64 {
    const TYPE: GreyType = GreyType::Double;

    fn to_f64(self) -> f64 {
        self
    }

    fn from_f64(v: f64) -> Self {
        v
    }
}

/// Colour pixels convert to the mean of their colour channels and grey values
/// become opaque grey.
impl Pixel for u32 {
    const TYPE: GreyType = GreyType::Rgba;

    fn to_f64(self) -> f64 {
        let [r, g, b, _] = rgba_channels(self);
        (f64::from(r) + f64::from(g) + f64::from(b)) / 3.0
    }

    fn from_f64(v: f64) -> Self {
        let c = v.round() as u8;
        pack_rgba(c, c, c, 255)
    }
}

/// A single pixel value tagged with its type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PixelValue {
    Int(i32),
    Short(i16),
    UByte(u8),
    Float(f32),
    Double(f64),
    Rgba(u32),
}

impl PixelValue {
    pub fn zero(ty: GreyType) -> Self {
        match ty {
            GreyType::Int => Self::Int(0),
            GreyType::Short => Self::Short(0),
            GreyType::UByte => Self::UByte(0),
            GreyType::Float => Self::Float(0.0),
            GreyType::Double => Self::Double(0.0),
            GreyType::Rgba => Self::Rgba(0),
        }
    }

    pub fn grey_type(self) -> GreyType {
        match self {
            Self::Int(_) => GreyType::Int,
            Self::Short(_) => GreyType::Short,
            Self::UByte(_) => GreyType::UByte,
            Self::Float(_) => GreyType::Float,
            Self::Double(_) => GreyType::Double,
            Self::Rgba(_) => GreyType::Rgba,
        }
    }

    pub fn to_f64(self) -> f64 {
        match self {
            Self::Int(v) => v.to_f64(),
            Self::Short(v) => v.to_f64(),
            Self::UByte(v) => v.to_f64(),
            Self::Float(v) => v.to_f64(),
            Self::Double(v) => v,
            Self::Rgba(v) => v.to_f64(),
        }
    }

    /// Integer view of the value. Colour values keep their packed bits.
    pub fn to_i32(self) -> i32 {
        match self {
            Self::Int(v) => v,
            Self::Short(v) => i32::from(v),
            Self::UByte(v) => i32::from(v),
            Self::Float(v) => i32::from_f64(f64::from(v)),
            Self::Double(v) => i32::from_f64(v),
            Self::Rgba(v) => v as i32,
        }
    }

    pub fn convert(self, ty: GreyType) -> Self {
        if self.grey_type() == ty {
            return self;
        }
        let v = self.to_f64();
        match ty {
            GreyType::Int => Self::Int(i32::from_f64(v)),
            GreyType::Short => Self::Short(i16::from_f64(v)),
            GreyType::UByte => Self::UByte(u8::from_f64(v)),
            GreyType::Float => Self::Float(f32::from_f64(v)),
            GreyType::Double => Self::Double(v),
            GreyType::Rgba => Self::Rgba(u32::from_f64(v)),
        }
    }
}

/// Typed sample storage.
#[derive(Debug, Clone, PartialEq)]
pub enum GreyBuffer {
    Int(Vec<i32>),
    Short(Vec<i16>),
    UByte(Vec<u8>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Rgba(Vec<u32>),
}

/// Borrowed run of samples.
#[derive(Debug)]
pub enum GreySlice<'a> {
    Int(&'a [i32]),
    Short(&'a [i16]),
    UByte(&'a [u8]),
    Float(&'a [f32]),
    Double(&'a [f64]),
    Rgba(&'a [u32]),
}

#[derive(Debug)]
pub enum GreySliceMut<'a> {
    Int(&'a mut [i32]),
    Short(&'a mut [i16]),
    UByte(&'a mut [u8]),
    Float(&'a mut [f32]),
    Double(&'a mut [f64]),
    Rgba(&'a mut [u32]),
}

macro_rules! each_variant {
    ($enum:ident, $value:expr, $v:ident => $body:expr) => {
        match $value {
            $enum::Int($v) => $body,
            $enum::Short($v) => $body,
            $enum::UByte($v) => $body,
            $enum::Float($v) => $body,
            $enum::Double($v) => $body,
            $enum::Rgba($v) => $body,
        }
    };
}

impl GreyBuffer {
    /// Zero-filled buffer of `len` samples.
    pub fn zeroed(ty: GreyType, len: usize) -> Result<Self> {
        Self::filled(len, PixelValue::zero(ty))
    }

    /// `len` copies of `value`, typed after the value.
    pub fn filled(len: usize, value: PixelValue) -> Result<Self> {
        Ok(match value {
            PixelValue::Int(v) => Self::Int(try_filled_vec(len, v)?),
            PixelValue::Short(v) => Self::Short(try_filled_vec(len, v)?),
            PixelValue::UByte(v) => Self::UByte(try_filled_vec(len, v)?),
            PixelValue::Float(v) => Self::Float(try_filled_vec(len, v)?),
            PixelValue::Double(v) => Self::Double(try_filled_vec(len, v)?),
            PixelValue::Rgba(v) => Self::Rgba(try_filled_vec(len, v)?),
        })
    }

    pub fn grey_type(&self) -> GreyType {
        match self {
            Self::Int(_) => GreyType::Int,
            Self::Short(_) => GreyType::Short,
            Self::UByte(_) => GreyType::UByte,
            Self::Float(_) => GreyType::Float,
            Self::Double(_) => GreyType::Double,
            Self::Rgba(_) => GreyType::Rgba,
        }
    }

    pub fn len(&self) -> usize {
        each_variant!(GreyBuffer, self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, idx: usize) -> PixelValue {
        match self {
            Self::Int(v) => PixelValue::Int(v[idx]),
            Self::Short(v) => PixelValue::Short(v[idx]),
            Self::UByte(v) => PixelValue::UByte(v[idx]),
            Self::Float(v) => PixelValue::Float(v[idx]),
            Self::Double(v) => PixelValue::Double(v[idx]),
            Self::Rgba(v) => PixelValue::Rgba(v[idx]),
        }
    }

    fn set(&mut self, idx: usize, value: PixelValue) {
        self.slice_mut(idx..idx + 1).set(0, value);
    }

    fn slice(&self, r: Range<usize>) -> GreySlice<'_> {
        match self {
            Self::Int(v) => GreySlice::Int(&v[r]),
            Self::Short(v) => GreySlice::Short(&v[r]),
            Self::UByte(v) => GreySlice::UByte(&v[r]),
            Self::Float(v) => GreySlice::Float(&v[r]),
            Self::Double(v) => GreySlice::Double(&v[r]),
            Self::Rgba(v) => GreySlice::Rgba(&v[r]),
        }
    }

    fn slice_mut(&mut self, r: Range<usize>) -> GreySliceMut<'_> {
        match self {
            Self::Int(v) => GreySliceMut::Int(&mut v[r]),
            Self::Short(v) => GreySliceMut::Short(&mut v[r]),
            Self::UByte(v) => GreySliceMut::UByte(&mut v[r]),
            Self::Float(v) => GreySliceMut::Float(&mut v[r]),
            Self::Double(v) => GreySliceMut::Double(&mut v[r]),
            Self::Rgba(v) => GreySliceMut::Rgba(&mut v[r]),
        }
    }

    fn converted(&self, ty: GreyType) -> Result<Self> {
        if self.grey_type() == ty {
            return Ok(self.clone());
        }
        let mut out = Self::zeroed(ty, self.len())?;
        for i in 0..self.len() {
            out.set(i, self.get(i));
        }
        Ok(out)
    }
}

impl GreySlice<'_> {
    pub fn len(&self) -> usize {
        each_variant!(GreySlice, self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, idx: usize) -> PixelValue {
        match self {
            Self::Int(v) => PixelValue::Int(v[idx]),
            Self::Short(v) => PixelValue::Short(v[idx]),
            Self::UByte(v) => PixelValue::UByte(v[idx]),
            Self::Float(v) => PixelValue::Float(v[idx]),
            Self::Double(v) => PixelValue::Double(v[idx]),
            Self::Rgba(v) => PixelValue::Rgba(v[idx]),
        }
    }

    /// Samples widened to `f64`, colour pixels by channel mean.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        each_variant!(GreySlice, self, v => v.iter().map(|p| p.to_f64()).collect())
    }
}

impl GreySliceMut<'_> {
    pub fn len(&self) -> usize {
        each_variant!(GreySliceMut, self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn grey_type(&self) -> GreyType {
        match self {
            Self::Int(_) => GreyType::Int,
            Self::Short(_) => GreyType::Short,
            Self::UByte(_) => GreyType::UByte,
            Self::Float(_) => GreyType::Float,
            Self::Double(_) => GreyType::Double,
            Self::Rgba(_) => GreyType::Rgba,
        }
    }

    /// Stores `value` converted to the slice type.
    pub fn set(&mut self, idx: usize, value: PixelValue) {
        match (self, value) {
            (Self::Rgba(v), PixelValue::Rgba(x)) => v[idx] = x,
            (this, x) => this.set_f64(idx, x.to_f64()),
        }
    }

    /// Stores an `f64` sample with saturating conversion.
    pub fn set_f64(&mut self, idx: usize, value: f64) {
        each_variant!(GreySliceMut, self, v => v[idx] = Pixel::from_f64(value))
    }
}

/// Storage shape of a grey table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GreyLayoutKind {
    Ragged,
    Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ValueLine {
    column_first: i32,
    column_last: i32,
    offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum Layout {
    Ragged {
        line_first: i32,
        lines: Vec<ValueLine>,
    },
    Rect {
        line_first: i32,
        line_last: i32,
        column_first: i32,
        width: usize,
    },
}

/// Grey values of a 2D object.
#[derive(Debug, Clone, PartialEq)]
pub struct GreyValues {
    layout: Layout,
    background: PixelValue,
    buffer: GreyBuffer,
}

impl GreyValues {
    /// Table congruent with `domain` preset to the background. Ragged for a
    /// run-coded domain, rectangular for a rectangle.
    pub fn new_for_domain(domain: &IntervalDomain, ty: GreyType, background: PixelValue) -> Result<Self> {
        match domain.kind() {
            IntervalDomainKind::Empty => Err(Error::InvalidDomain("no values for an empty domain")),
            IntervalDomainKind::Rect => Self::new_rect(
                domain.line_first(),
                domain.line_last(),
                domain.column_first(),
                domain.column_last(),
                ty,
                background,
            ),
            IntervalDomainKind::RunCoded => {
                let mut lines = Vec::new();
                lines
                    .try_reserve_exact(domain.height())
                    .map_err(Error::allocation(domain.height()))?;
                let mut offset = 0usize;
                for (_, runs) in domain.lines() {
                    let line = match (runs.first(), runs.last()) {
                        (Some(a), Some(b)) => ValueLine {
                            column_first: a.left,
                            column_last: b.right,
                            offset,
                        },
                        _ => ValueLine {
                            column_first: 0,
                            column_last: -1,
                            offset,
                        },
                    };
                    offset += (line.column_last - line.column_first + 1) as usize;
                    lines.push(line);
                }
                let background = background.convert(ty);
                Ok(Self {
                    layout: Layout::Ragged {
                        line_first: domain.line_first(),
                        lines,
                    },
                    background,
                    buffer: GreyBuffer::filled(offset, background)?,
                })
            }
        }
    }

    pub fn new_rect(
        line_first: i32,
        line_last: i32,
        column_first: i32,
        column_last: i32,
        ty: GreyType,
        background: PixelValue,
    ) -> Result<Self> {
        if line_last < line_first || column_last < column_first {
            return Err(Error::InvalidDomain("inverted rectangle bounds"));
        }
        let width = (column_last - column_first + 1) as usize;
        let height = (line_last - line_first + 1) as usize;
        let len = width
            .checked_mul(height)
            .ok_or(Error::AllocationFailure { requested: usize::MAX })?;
        let background = background.convert(ty);
        Ok(Self {
            layout: Layout::Rect {
                line_first,
                line_last,
                column_first,
                width,
            },
            background,
            buffer: GreyBuffer::filled(len, background)?,
        })
    }

    pub fn grey_type(&self) -> GreyType {
        self.buffer.grey_type()
    }

    pub fn layout_kind(&self) -> GreyLayoutKind {
        match self.layout {
            Layout::Ragged { .. } => GreyLayoutKind::Ragged,
            Layout::Rect { .. } => GreyLayoutKind::Rect,
        }
    }

    pub fn background(&self) -> PixelValue {
        self.background
    }

    pub fn set_background(&mut self, background: PixelValue) {
        self.background = background.convert(self.grey_type());
    }

    pub fn buffer(&self) -> &GreyBuffer {
        &self.buffer
    }

    /// Every stored sample in storage order.
    pub fn samples(&self) -> GreySlice<'_> {
        self.buffer.slice(0..self.buffer.len())
    }

    pub fn samples_mut(&mut self) -> GreySliceMut<'_> {
        let n = self.buffer.len();
        self.buffer.slice_mut(0..n)
    }

    fn range(&self, line: i32, left: i32, right: i32) -> Option<Range<usize>> {
        if left > right {
            return None;
        }
        match &self.layout {
            Layout::Ragged { line_first, lines } => {
                let idx = usize::try_from(i64::from(line) - i64::from(*line_first)).ok()?;
                let vl = lines.get(idx)?;
                if left < vl.column_first || right > vl.column_last {
                    return None;
                }
                let start = vl.offset + (left - vl.column_first) as usize;
                Some(start..start + (right - left + 1) as usize)
            }
            Layout::Rect {
                line_first,
                line_last,
                column_first,
                width,
            } => {
                if line < *line_first || line > *line_last || left < *column_first {
                    return None;
                }
                let k0 = (left - column_first) as usize;
                let k1 = (right - column_first) as usize;
                if k1 >= *width {
                    return None;
                }
                let row = (line - line_first) as usize * width;
                Some(row + k0..row + k1 + 1)
            }
        }
    }

    /// Value at a pixel, the background outside the stored area.
    pub fn get(&self, line: i32, column: i32) -> PixelValue {
        match self.range(line, column, column) {
            Some(r) => self.buffer.get(r.start),
            None => self.background,
        }
    }

    pub fn set(&mut self, line: i32, column: i32, value: PixelValue) -> Result<()> {
        let r = self
            .range(line, column, column)
            .ok_or(Error::InvalidParameter("pixel outside value table"))?;
        self.buffer.set(r.start, value);
        Ok(())
    }

    /// Samples of columns `left..=right` on `line`, `None` unless the whole
    /// run is stored.
    pub fn span(&self, line: i32, left: i32, right: i32) -> Option<GreySlice<'_>> {
        let r = self.range(line, left, right)?;
        Some(self.buffer.slice(r))
    }

    pub fn span_mut(&mut self, line: i32, left: i32, right: i32) -> Option<GreySliceMut<'_>> {
        let r = self.range(line, left, right)?;
        Some(self.buffer.slice_mut(r))
    }

    /// Copy with every sample and the background converted to `ty`.
    pub fn convert_to(&self, ty: GreyType) -> Result<Self> {
        Ok(Self {
            layout: self.layout.clone(),
            background: self.background.convert(ty),
            buffer: self.buffer.converted(ty)?,
        })
    }
}

/// Per-plane grey tables of a 3D object.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelValues {
    plane_first: i32,
    pub background: PixelValue,
    planes: Vec<Option<Rc<GreyValues>>>,
}

impl VoxelValues {
    pub fn new(plane_first: i32, plane_last: i32, background: PixelValue) -> Result<Self> {
        if plane_last < plane_first {
            return Err(Error::InvalidValues("last plane precedes first plane"));
        }
        let n = (i64::from(plane_last) - i64::from(plane_first) + 1) as usize;
        Ok(Self {
            plane_first,
            background,
            planes: try_filled_vec(n, None)?,
        })
    }

    pub fn plane_first(&self) -> i32 {
        self.plane_first
    }

    pub fn plane_last(&self) -> i32 {
        self.plane_first + self.planes.len() as i32 - 1
    }

    pub fn plane_count(&self) -> usize {
        self.planes.len()
    }

    fn plane_index(&self, plane: i32) -> Option<usize> {
        let idx = usize::try_from(i64::from(plane) - i64::from(self.plane_first)).ok()?;
        (idx < self.planes.len()).then_some(idx)
    }

    pub fn plane(&self, plane: i32) -> Option<&Rc<GreyValues>> {
        self.plane_index(plane).and_then(|i| self.planes[i].as_ref())
    }

    pub fn plane_mut(&mut self, plane: i32) -> Option<&mut Rc<GreyValues>> {
        let idx = self.plane_index(plane)?;
        self.planes[idx].as_mut()
    }

    pub fn set_plane(&mut self, plane: i32, values: Option<Rc<GreyValues>>) -> Result<()> {
        let idx = self
            .plane_index(plane)
            .ok_or(Error::InvalidParameter("plane outside voxel table"))?;
        self.planes[idx] = values;
        Ok(())
    }

    pub fn planes(&self) -> impl Iterator<Item = (i32, Option<&Rc<GreyValues>>)> + '_ {
        self.planes
            .iter()
            .enumerate()
            .map(move |(i, v)| (self.plane_first + i as i32, v.as_ref()))
    }

    /// Takes the background and pixel type from the first plane that carries
    /// a table. Returns `false` if there is none.
    pub fn reconcile_background(&mut self) -> bool {
        match self.planes.iter().flatten().next() {
            Some(values) => {
                self.background = values.background();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{GreyLayoutKind, GreyType, GreyValues, PixelValue, VoxelValues, pack_rgba};
    use crate::interval::{Interval, IntervalDomain};
    use std::rc::Rc;

    fn gappy() -> IntervalDomain {
        IntervalDomain::from_runs(
            2,
            vec![
                vec![Interval::new(0, 1), Interval::new(5, 6)],
                vec![],
                vec![Interval::new(3, 3)],
            ],
        ).expect("runs")
    }

    #[test]
    fn ragged_table_spans_first_to_last_run() {
        let dom = gappy();
        let mut v = GreyValues::new_for_domain(&dom, GreyType::Short, PixelValue::Int(7)).expect("values");
        assert_eq!(v.layout_kind(), GreyLayoutKind::Ragged);
        assert_eq!(v.background(), PixelValue::Short(7));
        assert_eq!(v.buffer().len(), 7 + 1);

        v.set(2, 5, PixelValue::Int(40)).expect("in table");
        assert_eq!(v.get(2, 5), PixelValue::Short(40));
        assert_eq!(v.get(3, 0), PixelValue::Short(7));
        assert!(v.set(3, 0, PixelValue::Int(1)).is_err());
        assert!(v.span(2, 0, 6).is_some());
        assert!(v.span(4, 2, 3).is_none());
    }

    #[test]
    fn rect_table_is_raster_ordered() {
        let mut v =
            GreyValues::new_rect(0, 1, 10, 12, GreyType::Int, PixelValue::Int(0)).expect("values");
        if let Some(mut s) = v.span_mut(1, 10, 12) {
            for i in 0..s.len() {
                s.set_f64(i, i as f64 + 1.0);
            }
        }
        assert_eq!(v.get(1, 11), PixelValue::Int(2));
        match v.samples() {
            super::GreySlice::Int(s) => assert_eq!(s, &[0, 0, 0, 1, 2, 3]),
            other => panic!("unexpected slice {other:?}"),
        }
    }

    #[test]
    fn conversion_saturates() {
        let dom = IntervalDomain::from_runs(0, vec![vec![Interval::new(0, 1)]]).expect("runs");
        let mut v = GreyValues::new_for_domain(&dom, GreyType::Int, PixelValue::Int(0)).expect("values");
        v.set(0, 0, PixelValue::Int(300)).expect("set");
        v.set(0, 1, PixelValue::Int(-4)).expect("set");

        let u = v.convert_to(GreyType::UByte).expect("convert");
        assert_eq!(u.get(0, 0), PixelValue::UByte(255));
        assert_eq!(u.get(0, 1), PixelValue::UByte(0));
    }

    #[test]
    fn rgba_grey_mean() {
        let p = PixelValue::Rgba(pack_rgba(30, 60, 90, 255));
        assert_eq!(p.convert(GreyType::Int), PixelValue::Int(60));
        assert_eq!(
            PixelValue::UByte(12).convert(GreyType::Rgba),
            PixelValue::Rgba(pack_rgba(12, 12, 12, 255))
        );
    }

    #[test]
    fn voxel_background_comes_from_first_table() {
        let dom = IntervalDomain::from_runs(0, vec![vec![Interval::new(0, 0)]]).expect("runs");
        let mut vv = VoxelValues::new(4, 6, PixelValue::Int(0)).expect("voxels");
        assert!(!vv.reconcile_background());

        let table = GreyValues::new_for_domain(&dom, GreyType::Float, PixelValue::Float(2.5)).expect("values");
        vv.set_plane(5, Some(Rc::new(table))).expect("set");
        assert!(vv.reconcile_background());
        assert_eq!(vv.background, PixelValue::Float(2.5));
        assert!(vv.plane(4).is_none());
        assert!(vv.set_plane(7, None).is_err());
    }
}

use std::io::Read;
use std::rc::Rc;

use log::{debug, warn};

use iv_core::{
    AffineTransform, BoundKind, BoundList, Compound, CompoundKind, DVertex2, Error, FVertex2, FeatureMatch,
    GreyScanMut, GreySliceMut, GreyType, GreyValues, Histogram, HistogramBins, IVertex2, Interval,
    IntervalDomain, IntervalDomainKind, MAX_NODAL_DEGREE, MatchPoint, Object, Object2D, Object3D, ObjectType,
    PixelValue, PlaneDomain, PlaneDomainKind, PlaneSlot, Point, Polygon, PolygonVertices, PropertyList,
    RasterDirection, Rectangle, Result, TransformedObject, Vector, VoxelValues, Warp3D, WarpElement,
    WarpTransform, optional,
};

use crate::tags;
use crate::wire::WireReader;

fn read_vec<R: Read, T>(
    r: &mut WireReader<R>,
    n: usize,
    mut item: impl FnMut(&mut WireReader<R>) -> Result<T>,
) -> Result<Vec<T>> {
    let mut out = Vec::new();
    out.try_reserve_exact(n).map_err(Error::allocation(n))?;
    for _ in 0..n {
        out.push(item(r)?);
    }
    Ok(out)
}

/// A nested object where the stream may not end.
fn read_nested_object<R: Read>(r: &mut WireReader<R>) -> Result<Object> {
    match read_object(r) {
        Err(Error::EndOfStream) => Err(Error::TruncatedStream),
        other => other,
    }
}

/// Trailing property lists are best effort: failures are logged and dropped.
fn trailing_properties<R: Read>(r: &mut WireReader<R>) -> Option<Rc<PropertyList>> {
    match read_property_list(r) {
        Ok(p) => Some(Rc::new(p)),
        Err(Error::EndOfObject) => None,
        Err(e) => {
            warn!("ignoring unreadable property list: {e}");
            None
        }
    }
}

/// Reads the next object.
///
/// A stream that ends before the type tag gives [`Error::EndOfStream`], a
/// null tag gives [`Error::EndOfObject`].
pub fn read_object<R: Read>(r: &mut WireReader<R>) -> Result<Object> {
    let code = r.tag()?.ok_or(Error::EndOfStream)?;
    if code == tags::NULL {
        return Err(Error::EndOfObject);
    }
    let ty = tags::object_type(code)?;
    debug!("reading {} object at byte {}", ty.name(), r.position() - 1);

    Ok(match ty {
        ObjectType::Empty => Object::Empty,
        ObjectType::Domain2D => Object::Domain2D(read_domain_2d(r)?),
        ObjectType::Domain3D => Object::Domain3D(read_domain_3d(r)?),
        ObjectType::Transformed => {
            let transform = Rc::new(read_affine(r)?);
            let object = Rc::new(read_nested_object(r)?);
            Object::Transformed(TransformedObject {
                transform,
                object,
                properties: trailing_properties(r),
            })
        }
        ObjectType::Warp3D => {
            let mut warp = read_warp_3d(r)?;
            warp.properties = trailing_properties(r);
            Object::Warp3D(Rc::new(warp))
        }
        ObjectType::Polygon => Object::Polygon(Rc::new(read_polygon(r)?)),
        ObjectType::BoundList => Object::BoundList(Rc::new(read_boundlist(r)?)),
        ObjectType::Histogram => Object::Histogram(Rc::new(read_histogram(r)?)),
        ObjectType::Rectangle => Object::Rectangle(Rc::new(read_rectangle(r)?)),
        ObjectType::VectorInt => Object::Vector(Vector::Int {
            k1: r.word()?,
            l1: r.word()?,
            k2: r.word()?,
            l2: r.word()?,
            style: r.word()?,
        }),
        ObjectType::VectorFloat => Object::Vector(Vector::Float {
            k1: r.float()?,
            l1: r.float()?,
            k2: r.float()?,
            l2: r.float()?,
            style: r.word()?,
        }),
        ObjectType::PointInt => Object::Point(Point::Int {
            k: r.word()?,
            l: r.word()?,
            style: r.word()?,
        }),
        ObjectType::PointFloat => Object::Point(Point::Float {
            k: r.float()?,
            l: r.float()?,
            style: r.word()?,
        }),
        ObjectType::Affine => Object::Affine(Rc::new(read_affine(r)?)),
        ObjectType::Warp => Object::Warp(Rc::new(read_warp(r)?)),
        ObjectType::FeatureMatch => Object::FeatureMatch(Rc::new(read_feature_match(r)?)),
        ObjectType::CompoundArray1 => Object::Compound(read_compound(r, CompoundKind::Array1)?),
        ObjectType::CompoundArray2 => Object::Compound(read_compound(r, CompoundKind::Array2)?),
        ObjectType::Property => {
            Object::Property(trailing_properties(r).unwrap_or_else(|| Rc::new(PropertyList::default())))
        }
    })
}

fn read_domain_2d<R: Read>(r: &mut WireReader<R>) -> Result<Object2D> {
    let domain = read_interval_domain(r)?;
    let values = read_grey_values(r, &domain)?;
    Ok(Object2D {
        domain: Rc::new(domain),
        values: values.map(Rc::new),
        properties: trailing_properties(r),
    })
}

fn read_domain_3d<R: Read>(r: &mut WireReader<R>) -> Result<Object3D> {
    let mut domain = read_plane_domain(r)?;
    let values = read_voxel_values(r, &mut domain)?;
    Ok(Object3D {
        domain: Rc::new(domain),
        values: values.map(Rc::new),
        properties: trailing_properties(r),
    })
}

/// Interval domain. Run columns are stored relative to the first column and
/// the decoded domain is standardized. A run-coded domain without runs reads
/// as [`Error::EndOfObject`].
pub fn read_interval_domain<R: Read>(r: &mut WireReader<R>) -> Result<IntervalDomain> {
    let code = r.required_tag()?;
    if code == tags::NULL {
        return Err(Error::EndOfObject);
    }
    let line_first = r.word()?;
    let line_last = r.word()?;
    let column_first = r.word()?;
    let column_last = r.word()?;

    match code {
        tags::interval::RECT => IntervalDomain::rect(line_first, line_last, column_first, column_last),
        tags::interval::RUN_CODED => {
            let mut domain = IntervalDomain::new(
                IntervalDomainKind::RunCoded,
                line_first,
                line_last,
                column_first,
                column_last,
            )?;
            let counts = read_vec(r, domain.height(), |r| r.count())?;
            if counts.iter().all(|&n| n == 0) {
                return Err(Error::EndOfObject);
            }

            for (line, n) in (line_first..=line_last).zip(counts) {
                let runs = read_vec(r, n, |r| {
                    let left = r.word()?;
                    let right = r.word()?;
                    match (column_first.checked_add(left), column_first.checked_add(right)) {
                        (Some(left), Some(right)) => Ok(Interval::new(left, right)),
                        _ => Err(Error::InvalidDomain("run column overflows")),
                    }
                })?;
                domain.set_line(line, runs)?;
            }
            domain.standardize();
            Ok(domain)
        }
        other => Err(Error::unsupported("interval domain", i32::from(other))),
    }
}

fn read_background<R: Read>(r: &mut WireReader<R>, ty: GreyType) -> Result<PixelValue> {
    Ok(match ty {
        GreyType::Float => PixelValue::Float(r.float()?),
        GreyType::Double => PixelValue::Double(r.double()?),
        GreyType::Rgba => PixelValue::Rgba(r.word()? as u32),
        GreyType::Int | GreyType::Short | GreyType::UByte => PixelValue::Int(r.word()?),
    })
}

fn bad_packing(table: &'static str, packing: u8) -> Error {
    Error::unsupported(table, i32::from(packing))
}

/// Fills `span` from the stream. Int and short tables may arrive packed in
/// a narrower type; the other tables ignore the packing byte.
fn read_samples<R: Read>(r: &mut WireReader<R>, span: GreySliceMut<'_>, packing: u8) -> Result<()> {
    match span {
        GreySliceMut::Int(s) => match tags::grey_type(packing) {
            Ok(GreyType::Int) => {
                for px in s.iter_mut() {
                    *px = r.word()?;
                }
            }
            Ok(GreyType::Short) => {
                for px in s.iter_mut() {
                    *px = i32::from(r.short()?);
                }
            }
            Ok(GreyType::UByte) => {
                for px in s.iter_mut() {
                    *px = i32::from(r.byte()?);
                }
            }
            _ => return Err(bad_packing("int table packing", packing)),
        },
        GreySliceMut::Short(s) => match tags::grey_type(packing) {
            Ok(GreyType::Short) => {
                for px in s.iter_mut() {
                    *px = r.short()?;
                }
            }
            Ok(GreyType::UByte) => {
                for px in s.iter_mut() {
                    *px = i16::from(r.byte()?);
                }
            }
            _ => return Err(bad_packing("short table packing", packing)),
        },
        GreySliceMut::UByte(s) => {
            for px in s.iter_mut() {
                *px = r.byte()?;
            }
        }
        GreySliceMut::Float(s) => {
            for px in s.iter_mut() {
                *px = r.float()?;
            }
        }
        GreySliceMut::Double(s) => {
            for px in s.iter_mut() {
                *px = r.double()?;
            }
        }
        GreySliceMut::Rgba(s) => {
            for px in s.iter_mut() {
                *px = r.word()? as u32;
            }
        }
    }
    Ok(())
}

/// Grey values over `domain`, `None` for the null tag.
///
/// Ragged tables carry one run of samples per scan interval in raster
/// order, so the domain must be decoded first.
pub fn read_grey_values<R: Read>(r: &mut WireReader<R>, domain: &IntervalDomain) -> Result<Option<GreyValues>> {
    let code = r.required_tag()?;
    if code == tags::NULL {
        return Ok(None);
    }
    let ty = tags::grey_type(code)?;
    if domain.is_empty() {
        return Err(Error::InvalidDomain("grey values need a non-empty domain"));
    }
    let packing = r.byte()?;
    let background = read_background(r, ty)?;
    let mut values = GreyValues::new_for_domain(domain, ty, background)?;

    match domain.kind() {
        IntervalDomainKind::Rect => read_samples(r, values.samples_mut(), packing)?,
        _ => {
            let mut scan = GreyScanMut::new(domain, &mut values, RasterDirection::IncLineIncCol);
            loop {
                match scan.next_run() {
                    Ok((_, span)) => read_samples(r, span, packing)?,
                    Err(Error::EndOfObject) => break,
                    Err(e) => return Err(e),
                }
            }
        }
    }
    debug!(
        "read {} values over {} intervals",
        ty.name(),
        domain.interval_count()
    );
    Ok(Some(values))
}

/// Voxel values over `domain`.
///
/// Decoding is lenient: a plane whose table fails to decode loses both its
/// values and its domain, and the remaining planes are still attempted. The
/// voxel background is taken from the plane tables afterwards.
pub fn read_voxel_values<R: Read>(r: &mut WireReader<R>, domain: &mut PlaneDomain) -> Result<Option<VoxelValues>> {
    let code = r.required_tag()?;
    if code == tags::NULL {
        return Ok(None);
    }
    if code != tags::VOXEL_GREY {
        return Err(Error::unsupported("voxel values", i32::from(code)));
    }
    if domain.kind() != PlaneDomainKind::Interval {
        return Err(Error::InvalidDomain("voxel values need interval planes"));
    }

    let background = PixelValue::Int(r.word()?);
    let mut voxels = VoxelValues::new(domain.plane_first(), domain.plane_last(), background)?;
    let mut dropped = 0usize;
    for plane in domain.plane_first()..=domain.plane_last() {
        let plane_domain = domain.plane(plane).and_then(PlaneSlot::as_interval).cloned();
        let result = match plane_domain {
            Some(d) => read_grey_values(r, &d),
            None => match r.required_tag() {
                Ok(tags::NULL) => Ok(None),
                Ok(_) => Err(Error::InvalidDomain("values given for a null plane")),
                Err(e) => Err(e),
            },
        };
        match result {
            Ok(values) => voxels.set_plane(plane, values.map(Rc::new))?,
            Err(e) => {
                warn!("plane {plane}: dropping unreadable values ({e})");
                domain.set_plane(plane, PlaneSlot::Null)?;
                dropped += 1;
            }
        }
    }
    voxels.reconcile_background();
    if dropped > 0 {
        warn!(
            "returning partial 3D object, {dropped} of {} planes dropped",
            domain.plane_count()
        );
    }
    Ok(Some(voxels))
}

pub fn read_plane_domain<R: Read>(r: &mut WireReader<R>) -> Result<PlaneDomain> {
    let code = r.required_tag()?;
    if code == tags::NULL {
        return Err(Error::EndOfObject);
    }
    if code == tags::plane::LEGACY_DOMAIN {
        warn!("converting legacy plane domain tag {code}");
    }
    let kind = tags::plane_kind(code)?;
    let plane_first = r.word()?;
    let plane_last = r.word()?;
    let line_first = r.word()?;
    let line_last = r.word()?;
    let column_first = r.word()?;
    let column_last = r.word()?;

    let mut domain = PlaneDomain::new(
        kind,
        plane_first,
        plane_last,
        line_first,
        line_last,
        column_first,
        column_last,
    )?;
    domain.voxel_size = [r.float()?, r.float()?, r.float()?];
    // Redundant plane positions.
    for _ in 0..domain.plane_count() {
        r.float()?;
    }

    for plane in plane_first..=plane_last {
        let slot = match kind {
            PlaneDomainKind::Interval => {
                optional(read_interval_domain(r))?.map(|d| PlaneSlot::Interval(Rc::new(d)))
            }
            PlaneDomainKind::Polygon => optional(read_polygon(r))?.map(|d| PlaneSlot::Polygon(Rc::new(d))),
            PlaneDomainKind::BoundList => {
                optional(read_boundlist(r))?.map(|d| PlaneSlot::BoundList(Rc::new(d)))
            }
            PlaneDomainKind::Histogram => {
                optional(read_histogram(r))?.map(|d| PlaneSlot::Histogram(Rc::new(d)))
            }
            PlaneDomainKind::Affine => optional(read_affine(r))?.map(|d| PlaneSlot::Affine(Rc::new(d))),
            PlaneDomainKind::Warp => optional(read_warp(r))?.map(|d| PlaneSlot::Warp(Rc::new(d))),
            PlaneDomainKind::Empty => None,
        };
        if let Some(slot) = slot {
            domain.set_plane(plane, slot)?;
        }
    }
    debug!(
        "read plane domain {plane_first}..={plane_last}, {} voxels",
        domain.volume()
    );
    Ok(domain)
}

pub fn read_property_list<R: Read>(r: &mut WireReader<R>) -> Result<PropertyList> {
    match r.required_tag()? {
        tags::NULL => return Err(Error::EndOfObject),
        tags::PROPERTY_SIMPLE => {}
        other => return Err(Error::unsupported("property list", i32::from(other))),
    }
    // The stored size counts four bytes that are never written.
    let size = r.word()?.checked_sub(4).ok_or(Error::TruncatedStream)?;
    let size = usize::try_from(size).map_err(|_| Error::TruncatedStream)?;
    Ok(PropertyList { data: r.bytes(size)? })
}

pub fn read_polygon<R: Read>(r: &mut WireReader<R>) -> Result<Polygon> {
    let code = r.required_tag()?;
    if code == tags::NULL {
        return Err(Error::EndOfObject);
    }
    let n = r.count()?;
    let vertices = match code {
        tags::polygon::INT => PolygonVertices::Int(read_vec(r, n, |r| {
            let y = r.word()?;
            let x = r.word()?;
            Ok(IVertex2 { x, y })
        })?),
        tags::polygon::FLOAT => PolygonVertices::Float(read_vec(r, n, |r| {
            let y = r.float()?;
            let x = r.float()?;
            Ok(FVertex2 { x, y })
        })?),
        tags::polygon::DOUBLE => PolygonVertices::Double(read_vec(r, n, |r| {
            let y = r.double()?;
            let x = r.double()?;
            Ok(DVertex2 { x, y })
        })?),
        other => return Err(Error::unsupported("polygon", i32::from(other))),
    };
    Ok(Polygon { vertices })
}

pub fn read_boundlist<R: Read>(r: &mut WireReader<R>) -> Result<BoundList> {
    match r.required_tag()? {
        tags::NULL => return Err(Error::EndOfObject),
        tags::boundlist::NODE => {}
        other => return Err(Error::unsupported("boundlist", i32::from(other))),
    }
    let kind = match r.byte()? {
        tags::boundlist::PIECE => BoundKind::Piece,
        tags::boundlist::HOLE => BoundKind::Hole,
        other => return Err(Error::unsupported("boundlist kind", i32::from(other))),
    };
    let next = optional(read_boundlist(r))?.map(Rc::new);
    let down = optional(read_boundlist(r))?.map(Rc::new);
    let wrap = r.word()?;
    let polygon = optional(read_polygon(r))?.map(Rc::new);
    Ok(BoundList {
        kind,
        next,
        down,
        wrap,
        polygon,
    })
}

pub fn read_rectangle<R: Read>(r: &mut WireReader<R>) -> Result<Rectangle> {
    match r.required_tag()? {
        tags::NULL => Err(Error::EndOfObject),
        tags::rectangle::INT => {
            let mut columns = [0i32; 4];
            let mut lines = [0i32; 4];
            for c in &mut columns {
                *c = r.word()?;
            }
            for l in &mut lines {
                *l = r.word()?;
            }
            Ok(Rectangle::Int {
                columns,
                lines,
                angle: r.float()?,
            })
        }
        tags::rectangle::FLOAT => {
            let mut columns = [0f32; 4];
            let mut lines = [0f32; 4];
            for c in &mut columns {
                *c = r.float()?;
            }
            for l in &mut lines {
                *l = r.float()?;
            }
            Ok(Rectangle::Float {
                columns,
                lines,
                angle: r.float()?,
            })
        }
        other => Err(Error::unsupported("rectangle", i32::from(other))),
    }
}

/// Histogram domain. Legacy layouts carry three unused words, float bins
/// stored as floats and no origin or bin size.
pub fn read_histogram<R: Read>(r: &mut WireReader<R>) -> Result<Histogram> {
    let code = r.required_tag()?;
    match code {
        tags::NULL => Err(Error::EndOfObject),
        tags::histogram::OLD_INT | tags::histogram::OLD_FLOAT => {
            for _ in 0..3 {
                r.word()?;
            }
            let n = r.count()?;
            let bins = if code == tags::histogram::OLD_INT {
                HistogramBins::Int(read_vec(r, n, |r| r.word())?)
            } else {
                HistogramBins::Float(read_vec(r, n, |r| r.float().map(f64::from))?)
            };
            Ok(Histogram {
                origin: 0.0,
                bin_size: 1.0,
                bins,
            })
        }
        tags::histogram::INT | tags::histogram::FLOAT => {
            let n = r.count()?;
            let origin = r.double()?;
            let bin_size = r.double()?;
            let bins = if code == tags::histogram::INT {
                HistogramBins::Int(read_vec(r, n, |r| r.word())?)
            } else {
                HistogramBins::Float(read_vec(r, n, |r| r.double())?)
            };
            Ok(Histogram {
                origin,
                bin_size,
                bins,
            })
        }
        other => Err(Error::unsupported("histogram", i32::from(other))),
    }
}

pub fn read_affine<R: Read>(r: &mut WireReader<R>) -> Result<AffineTransform> {
    let code = r.required_tag()?;
    if code == tags::NULL {
        return Err(Error::EndOfObject);
    }
    let mut t = AffineTransform::identity(code);
    t.tx = r.double()?;
    t.ty = r.double()?;
    t.tz = r.double()?;
    t.scale = r.double()?;
    t.theta = r.double()?;
    t.phi = r.double()?;
    t.alpha = r.double()?;
    t.psi = r.double()?;
    t.xsi = r.double()?;
    t.invert = r.word()?;
    for row in &mut t.matrix {
        for v in row.iter_mut() {
            *v = r.double()?;
        }
    }
    Ok(t)
}

fn read_float_vertex<R: Read>(r: &mut WireReader<R>) -> Result<DVertex2> {
    let x = f64::from(r.float()?);
    let y = f64::from(r.float()?);
    Ok(DVertex2 { x, y })
}

/// Finite-element warp. The object tag is repeated ahead of the fields.
pub fn read_warp<R: Read>(r: &mut WireReader<R>) -> Result<WarpTransform> {
    match r.required_tag()? {
        tags::NULL => return Err(Error::EndOfObject),
        tags::object::WARP => {}
        other => return Err(Error::unsupported("warp transform", i32::from(other))),
    }
    let element_count = r.count()?;
    let node_count = r.count()?;
    let image_displacement = r.float()?;
    let iteration_displacement = r.float()?;
    let node_coords = read_vec(r, node_count, read_float_vertex)?;
    let displacements = read_vec(r, node_count, read_float_vertex)?;
    let elements = read_vec(r, element_count, |r| {
        let kind = r.byte()?;
        let n = r.word()?;
        let mut e = WarpElement {
            kind,
            n,
            nodes: [0; 3],
            u: [0.0; 3],
            a: [0.0; 3],
        };
        for v in &mut e.nodes {
            *v = r.word()?;
        }
        for v in &mut e.u {
            *v = r.float()?;
        }
        for v in &mut e.a {
            *v = r.float()?;
        }
        Ok(e)
    })?;
    Ok(WarpTransform {
        image_displacement,
        iteration_displacement,
        node_coords,
        displacements,
        elements,
    })
}

pub fn read_feature_match<R: Read>(r: &mut WireReader<R>) -> Result<FeatureMatch> {
    let n = r.count()?;
    let points = read_vec(r, n, |r| {
        let kind = r.word()?;
        let node = r.word()?;
        let x = r.float()?;
        let y = r.float()?;
        let mut elements = [0i32; MAX_NODAL_DEGREE];
        for e in &mut elements {
            *e = r.word()?;
        }
        Ok(MatchPoint {
            kind,
            node,
            coords: FVertex2 { x, y },
            elements,
        })
    })?;
    Ok(FeatureMatch { points })
}

fn read_warp_3d<R: Read>(r: &mut WireReader<R>) -> Result<Warp3D> {
    let iteration = r.word()?;
    let current_plane = r.word()?;
    let max_displacement = r.float()?;
    let planes = read_plane_domain(r)?;
    let matches = read_vec(r, planes.plane_count(), |r| {
        read_feature_match(r).map(|m| Some(Rc::new(m)))
    })?;
    Ok(Warp3D {
        iteration,
        current_plane,
        max_displacement,
        planes: Rc::new(planes),
        matches,
        properties: None,
    })
}

fn read_compound<R: Read>(r: &mut WireReader<R>, kind: CompoundKind) -> Result<Compound> {
    let element_code = r.required_tag()?;
    let element_type = match (kind, element_code) {
        (CompoundKind::Array1, tags::NULL) => return Err(Error::EndOfObject),
        (_, tags::NULL) => None,
        (_, code) => Some(tags::object_type(code)?),
    };
    let n = r.count()?;
    let objects = read_vec(r, n, |r| read_nested_object(r).map(Rc::new))?;
    Ok(Compound {
        kind,
        element_type,
        objects,
        properties: trailing_properties(r),
    })
}

/// Objects from a stream, ending cleanly at end of stream or a null tag.
/// The first error is yielded once and ends the iteration.
#[derive(Debug)]
pub struct ObjectStream<R> {
    reader: WireReader<R>,
    done: bool,
}

impl<R: Read> ObjectStream<R> {
    pub fn into_inner(self) -> WireReader<R> {
        self.reader
    }
}

impl<R: Read> Iterator for ObjectStream<R> {
    type Item = Result<Object>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match read_object(&mut self.reader) {
            Ok(obj) => Some(Ok(obj)),
            Err(Error::EndOfStream | Error::EndOfObject) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

pub fn read_objects<R: Read>(reader: R) -> ObjectStream<R> {
    ObjectStream {
        reader: WireReader::new(reader),
        done: false,
    }
}

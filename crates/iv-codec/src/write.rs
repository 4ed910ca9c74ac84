use std::io::Write;

use log::debug;

use iv_core::{
    AffineTransform, BoundKind, BoundList, Compound, CompoundKind, DVertex2, Error, FeatureMatch, GreySlice,
    GreyType, GreyValues, Histogram, HistogramBins, IntervalDomain, IntervalDomainKind, IntervalScan, Object,
    Object2D, Object3D, PixelValue, PlaneDomain, PlaneSlot, Point, Polygon, PolygonVertices, PropertyList,
    RasterDirection, Rectangle, Result, Vector, VoxelValues, Warp3D, WarpTransform,
};

use crate::tags;
use crate::wire::WireWriter;

/// Writes one object. The empty object and objects over an empty domain are
/// written as the empty marker.
pub fn write_object<W: Write>(w: &mut WireWriter<W>, obj: &Object) -> Result<()> {
    if obj.is_empty() {
        return w.byte(tags::object::EMPTY);
    }
    let ty = obj.object_type();
    debug!("writing {} object", ty.name());
    w.byte(tags::object_code(ty))?;

    match obj {
        Object::Empty => Ok(()),
        Object::Domain2D(o) => write_domain_2d(w, o),
        Object::Domain3D(o) => write_domain_3d(w, o),
        Object::Transformed(t) => {
            write_affine(w, &t.transform)?;
            write_object(w, &t.object)?;
            write_property_list(w, t.properties.as_deref())
        }
        Object::Warp3D(warp) => {
            write_warp_3d(w, warp)?;
            write_property_list(w, warp.properties.as_deref())
        }
        Object::Polygon(p) => write_polygon(w, Some(p)),
        Object::BoundList(b) => write_boundlist(w, Some(b)),
        Object::Histogram(h) => write_histogram(w, h),
        Object::Rectangle(rect) => write_rectangle(w, rect),
        Object::Vector(Vector::Int { k1, l1, k2, l2, style }) => {
            for v in [*k1, *l1, *k2, *l2, *style] {
                w.word(v)?;
            }
            Ok(())
        }
        Object::Vector(Vector::Float { k1, l1, k2, l2, style }) => {
            for v in [*k1, *l1, *k2, *l2] {
                w.float(v)?;
            }
            w.word(*style)
        }
        Object::Point(Point::Int { k, l, style }) => {
            w.word(*k)?;
            w.word(*l)?;
            w.word(*style)
        }
        Object::Point(Point::Float { k, l, style }) => {
            w.float(*k)?;
            w.float(*l)?;
            w.word(*style)
        }
        Object::Affine(t) => write_affine(w, t),
        Object::Warp(t) => write_warp(w, Some(t)),
        Object::FeatureMatch(m) => write_feature_match(w, m),
        Object::Compound(c) => write_compound(w, c),
        Object::Property(p) => write_property_list(w, Some(p)),
    }
}

fn write_domain_2d<W: Write>(w: &mut WireWriter<W>, obj: &Object2D) -> Result<()> {
    write_interval_domain(w, &obj.domain)?;
    write_grey_values(w, &obj.domain, obj.values.as_deref())?;
    write_property_list(w, obj.properties.as_deref())
}

fn write_domain_3d<W: Write>(w: &mut WireWriter<W>, obj: &Object3D) -> Result<()> {
    write_plane_domain(w, &obj.domain)?;
    write_voxel_values(w, &obj.domain, obj.values.as_deref())?;
    write_property_list(w, obj.properties.as_deref())
}

/// Interval domain, run columns relative to the first column. An empty
/// domain is written as the null tag.
pub fn write_interval_domain<W: Write>(w: &mut WireWriter<W>, domain: &IntervalDomain) -> Result<()> {
    let code = match domain.kind() {
        IntervalDomainKind::Empty => return w.byte(tags::NULL),
        IntervalDomainKind::RunCoded => tags::interval::RUN_CODED,
        IntervalDomainKind::Rect => tags::interval::RECT,
    };
    w.byte(code)?;
    let k1 = domain.column_first();
    for v in [domain.line_first(), domain.line_last(), k1, domain.column_last()] {
        w.word(v)?;
    }
    if code == tags::interval::RUN_CODED {
        for (_, runs) in domain.lines() {
            w.count(runs.len())?;
        }
        for (_, runs) in domain.lines() {
            for itv in runs.iter() {
                w.word(itv.left - k1)?;
                w.word(itv.right - k1)?;
            }
        }
    }
    Ok(())
}

/// Narrowest packing that holds every stored sample of an int or short
/// table.
fn packing_for(ty: GreyType, spans: &[GreySlice<'_>]) -> GreyType {
    if !matches!(ty, GreyType::Int | GreyType::Short) {
        return ty;
    }
    let (mut lo, mut hi) = (i32::MAX, i32::MIN);
    for span in spans {
        match span {
            GreySlice::Int(s) => {
                for &v in s.iter() {
                    lo = lo.min(v);
                    hi = hi.max(v);
                }
            }
            GreySlice::Short(s) => {
                for &v in s.iter() {
                    lo = lo.min(i32::from(v));
                    hi = hi.max(i32::from(v));
                }
            }
            _ => return ty,
        }
    }
    if lo > hi || (lo >= 0 && hi <= i32::from(u8::MAX)) {
        GreyType::UByte
    } else if ty == GreyType::Int && (lo < i32::from(i16::MIN) || hi > i32::from(i16::MAX)) {
        GreyType::Int
    } else {
        GreyType::Short
    }
}

fn write_samples<W: Write>(w: &mut WireWriter<W>, span: &GreySlice<'_>, packing: GreyType) -> Result<()> {
    match span {
        GreySlice::Int(s) => {
            for &v in s.iter() {
                match packing {
                    GreyType::UByte => w.byte(v as u8)?,
                    GreyType::Short => w.short(v as i16)?,
                    _ => w.word(v)?,
                }
            }
        }
        GreySlice::Short(s) => {
            for &v in s.iter() {
                match packing {
                    GreyType::UByte => w.byte(v as u8)?,
                    _ => w.short(v)?,
                }
            }
        }
        GreySlice::UByte(s) => w.bytes(s)?,
        GreySlice::Float(s) => {
            for &v in s.iter() {
                w.float(v)?;
            }
        }
        GreySlice::Double(s) => {
            for &v in s.iter() {
                w.double(v)?;
            }
        }
        GreySlice::Rgba(s) => {
            for &v in s.iter() {
                w.word(v as i32)?;
            }
        }
    }
    Ok(())
}

/// Grey values over `domain`, one run of samples per scan interval.
pub fn write_grey_values<W: Write>(
    w: &mut WireWriter<W>,
    domain: &IntervalDomain,
    values: Option<&GreyValues>,
) -> Result<()> {
    let Some(values) = values else {
        return w.byte(tags::NULL);
    };
    let ty = values.grey_type();
    let spans = IntervalScan::new(domain, RasterDirection::IncLineIncCol)
        .map(|item| {
            values
                .span(item.line, item.left, item.right)
                .ok_or(Error::InvalidValues("run lies outside the value table"))
        })
        .collect::<Result<Vec<_>>>()?;
    let packing = packing_for(ty, &spans);

    w.byte(tags::grey_code(ty))?;
    w.byte(tags::grey_code(packing))?;
    match values.background() {
        PixelValue::Float(v) => w.float(v)?,
        PixelValue::Double(v) => w.double(v)?,
        other => w.word(other.to_i32())?,
    }
    for span in &spans {
        write_samples(w, span, packing)?;
    }
    Ok(())
}

pub fn write_voxel_values<W: Write>(
    w: &mut WireWriter<W>,
    domain: &PlaneDomain,
    values: Option<&VoxelValues>,
) -> Result<()> {
    let Some(values) = values else {
        return w.byte(tags::NULL);
    };
    w.byte(tags::VOXEL_GREY)?;
    w.word(values.background.to_i32())?;
    for (plane, slot) in domain.planes() {
        match slot.as_interval() {
            Some(d) => write_grey_values(w, d, values.plane(plane).map(|v| &**v))?,
            None => w.byte(tags::NULL)?,
        }
    }
    Ok(())
}

pub fn write_plane_domain<W: Write>(w: &mut WireWriter<W>, domain: &PlaneDomain) -> Result<()> {
    let code = tags::plane_code(domain.kind());
    w.byte(code)?;
    if code == tags::NULL {
        return Ok(());
    }
    for v in [
        domain.plane_first(),
        domain.plane_last(),
        domain.line_first(),
        domain.line_last(),
        domain.column_first(),
        domain.column_last(),
    ] {
        w.word(v)?;
    }
    for v in domain.voxel_size {
        w.float(v)?;
    }
    for (plane, _) in domain.planes() {
        w.float(plane as f32 * domain.voxel_size[2])?;
    }
    for (_, slot) in domain.planes() {
        match slot {
            PlaneSlot::Null => w.byte(tags::NULL)?,
            PlaneSlot::Interval(d) => write_interval_domain(w, d)?,
            PlaneSlot::Polygon(p) => write_polygon(w, Some(p))?,
            PlaneSlot::BoundList(b) => write_boundlist(w, Some(b))?,
            PlaneSlot::Histogram(h) => write_histogram(w, h)?,
            PlaneSlot::Affine(t) => write_affine(w, t)?,
            PlaneSlot::Warp(t) => write_warp(w, Some(t))?,
        }
    }
    Ok(())
}

/// Property list, or the null tag when absent.
pub fn write_property_list<W: Write>(w: &mut WireWriter<W>, list: Option<&PropertyList>) -> Result<()> {
    let Some(list) = list else {
        return w.byte(tags::NULL);
    };
    let size = list
        .data
        .len()
        .checked_add(4)
        .ok_or(Error::InvalidParameter("property list too large"))?;
    w.byte(tags::PROPERTY_SIMPLE)?;
    w.count(size)?;
    w.bytes(&list.data)
}

pub fn write_polygon<W: Write>(w: &mut WireWriter<W>, polygon: Option<&Polygon>) -> Result<()> {
    let Some(polygon) = polygon else {
        return w.byte(tags::NULL);
    };
    match &polygon.vertices {
        PolygonVertices::Int(vs) => {
            w.byte(tags::polygon::INT)?;
            w.count(vs.len())?;
            for v in vs {
                w.word(v.y)?;
                w.word(v.x)?;
            }
        }
        PolygonVertices::Float(vs) => {
            w.byte(tags::polygon::FLOAT)?;
            w.count(vs.len())?;
            for v in vs {
                w.float(v.y)?;
                w.float(v.x)?;
            }
        }
        PolygonVertices::Double(vs) => {
            w.byte(tags::polygon::DOUBLE)?;
            w.count(vs.len())?;
            for v in vs {
                w.double(v.y)?;
                w.double(v.x)?;
            }
        }
    }
    Ok(())
}

pub fn write_boundlist<W: Write>(w: &mut WireWriter<W>, list: Option<&BoundList>) -> Result<()> {
    let Some(list) = list else {
        return w.byte(tags::NULL);
    };
    w.byte(tags::boundlist::NODE)?;
    w.byte(match list.kind {
        BoundKind::Piece => tags::boundlist::PIECE,
        BoundKind::Hole => tags::boundlist::HOLE,
    })?;
    write_boundlist(w, list.next.as_deref())?;
    write_boundlist(w, list.down.as_deref())?;
    w.word(list.wrap)?;
    write_polygon(w, list.polygon.as_deref())
}

pub fn write_rectangle<W: Write>(w: &mut WireWriter<W>, rect: &Rectangle) -> Result<()> {
    match rect {
        Rectangle::Int { columns, lines, angle } => {
            w.byte(tags::rectangle::INT)?;
            for &v in columns.iter().chain(lines.iter()) {
                w.word(v)?;
            }
            w.float(*angle)
        }
        Rectangle::Float { columns, lines, angle } => {
            w.byte(tags::rectangle::FLOAT)?;
            for &v in columns.iter().chain(lines.iter()) {
                w.float(v)?;
            }
            w.float(*angle)
        }
    }
}

/// Histograms are always written in the current layout.
pub fn write_histogram<W: Write>(w: &mut WireWriter<W>, hist: &Histogram) -> Result<()> {
    let code = match hist.bins {
        HistogramBins::Int(_) => tags::histogram::INT,
        HistogramBins::Float(_) => tags::histogram::FLOAT,
    };
    w.byte(code)?;
    w.count(hist.bin_count())?;
    w.double(hist.origin)?;
    w.double(hist.bin_size)?;
    match &hist.bins {
        HistogramBins::Int(bins) => bins.iter().try_for_each(|&v| w.word(v)),
        HistogramBins::Float(bins) => bins.iter().try_for_each(|&v| w.double(v)),
    }
}

pub fn write_affine<W: Write>(w: &mut WireWriter<W>, t: &AffineTransform) -> Result<()> {
    if t.kind == tags::NULL {
        return Err(Error::InvalidParameter("affine transform kind must be non-zero"));
    }
    w.byte(t.kind)?;
    for v in [t.tx, t.ty, t.tz, t.scale, t.theta, t.phi, t.alpha, t.psi, t.xsi] {
        w.double(v)?;
    }
    w.word(t.invert)?;
    for row in &t.matrix {
        for &v in row {
            w.double(v)?;
        }
    }
    Ok(())
}

fn write_float_vertex<W: Write>(w: &mut WireWriter<W>, v: &DVertex2) -> Result<()> {
    w.float(v.x as f32)?;
    w.float(v.y as f32)
}

pub fn write_warp<W: Write>(w: &mut WireWriter<W>, warp: Option<&WarpTransform>) -> Result<()> {
    let Some(warp) = warp else {
        return w.byte(tags::NULL);
    };
    if warp.displacements.len() != warp.node_coords.len() {
        return Err(Error::InvalidParameter("one displacement per node required"));
    }
    w.byte(tags::object::WARP)?;
    w.count(warp.elements.len())?;
    w.count(warp.node_coords.len())?;
    w.float(warp.image_displacement)?;
    w.float(warp.iteration_displacement)?;
    for v in warp.node_coords.iter().chain(warp.displacements.iter()) {
        write_float_vertex(w, v)?;
    }
    for e in &warp.elements {
        w.byte(e.kind)?;
        w.word(e.n)?;
        for &v in &e.nodes {
            w.word(v)?;
        }
        for &v in e.u.iter().chain(e.a.iter()) {
            w.float(v)?;
        }
    }
    Ok(())
}

pub fn write_feature_match<W: Write>(w: &mut WireWriter<W>, m: &FeatureMatch) -> Result<()> {
    w.count(m.points.len())?;
    for p in &m.points {
        w.word(p.kind)?;
        w.word(p.node)?;
        w.float(p.coords.x)?;
        w.float(p.coords.y)?;
        for &e in &p.elements {
            w.word(e)?;
        }
    }
    Ok(())
}

fn write_warp_3d<W: Write>(w: &mut WireWriter<W>, warp: &Warp3D) -> Result<()> {
    w.word(warp.iteration)?;
    w.word(warp.current_plane)?;
    w.float(warp.max_displacement)?;
    write_plane_domain(w, &warp.planes)?;
    let empty = FeatureMatch::default();
    for i in 0..warp.planes.plane_count() {
        let m = warp.matches.get(i).and_then(Option::as_deref).unwrap_or(&empty);
        write_feature_match(w, m)?;
    }
    Ok(())
}

fn write_compound<W: Write>(w: &mut WireWriter<W>, c: &Compound) -> Result<()> {
    let element_type = match (c.kind, c.element_type) {
        (_, Some(ty)) => Some(ty),
        (CompoundKind::Array1, None) => Some(
            c.objects
                .first()
                .map(|o| o.object_type())
                .ok_or(Error::InvalidParameter("single-type compound needs an element type"))?,
        ),
        (CompoundKind::Array2, None) => None,
    };
    w.byte(element_type.map_or(tags::NULL, tags::object_code))?;
    w.count(c.objects.len())?;
    for obj in &c.objects {
        write_object(w, obj)?;
    }
    write_property_list(w, c.properties.as_deref())
}

/// Writes every object and flushes, handing the sink back.
pub fn write_objects<'a, W: Write>(sink: W, objects: impl IntoIterator<Item = &'a Object>) -> Result<W> {
    let mut w = WireWriter::new(sink);
    let mut n = 0usize;
    for obj in objects {
        write_object(&mut w, obj)?;
        n += 1;
    }
    w.flush()?;
    debug!("wrote {n} objects");
    Ok(w.into_inner())
}

use std::rc::Rc;

use log::debug;

use iv_core::{
    Error, GreyScanMut, GreySliceMut, GreyValues, IntervalDomain, Object, PlaneDomainKind, RasterDirection, Result, optional,
    pack_rgba, rgba_channels,
};

/// Grey range `min..=max` mapped through a byte table.
struct RangeLut<'a> {
    min: i32,
    max: i32,
    table: &'a [u8],
}

impl RangeLut<'_> {
    fn map(&self, v: i32) -> u8 {
        let idx = v.clamp(self.min, self.max) - self.min;
        self.table[idx as usize]
    }

    fn map_rgba(&self, p: u32) -> u32 {
        let [r, g, b, a] = rgba_channels(p);
        let m = |c: u8| self.map(i32::from(c));
        pack_rgba(m(r), m(g), m(b), a)
    }

    fn apply(&self, span: &mut GreySliceMut<'_>) {
        match span {
            GreySliceMut::Int(v) => v.iter_mut().for_each(|x| *x = i32::from(self.map(*x))),
            GreySliceMut::Short(v) => v.iter_mut().for_each(|x| *x = i16::from(self.map(i32::from(*x)))),
            GreySliceMut::UByte(v) => v.iter_mut().for_each(|x| *x = self.map(i32::from(*x))),
            GreySliceMut::Float(v) => v.iter_mut().for_each(|x| *x = f32::from(self.map(*x as i32))),
            GreySliceMut::Double(v) => v.iter_mut().for_each(|x| *x = f64::from(self.map(*x as i32))),
            GreySliceMut::Rgba(v) => v.iter_mut().for_each(|x| *x = self.map_rgba(*x)),
        }
    }

    fn apply_2d(&self, domain: &IntervalDomain, values: &mut GreyValues) -> Result<()> {
        let mut scan = GreyScanMut::new(domain, values, RasterDirection::IncLineIncCol);
        while let Some((_, mut span)) = optional(scan.next_run())? {
            self.apply(&mut span);
        }
        Ok(())
    }

    fn apply_object(&self, obj: &mut Object) -> Result<()> {
        match obj {
            Object::Empty => Ok(()),
            Object::Domain2D(o) => {
                if o.domain.is_empty() {
                    return Ok(());
                }
                let values = o.values.as_mut().ok_or(Error::InvalidValues("object carries no grey values"))?;
                self.apply_2d(&o.domain, Rc::make_mut(values))
            }
            Object::Domain3D(o) => {
                if o.domain.kind() != PlaneDomainKind::Interval {
                    return Err(Error::InvalidDomain("grey mapping needs interval planes"));
                }
                let voxels = o.values.as_mut().ok_or(Error::InvalidValues("object carries no voxel values"))?;
                let voxels = Rc::make_mut(voxels);
                for (p, slot) in o.domain.planes() {
                    let (Some(domain), Some(values)) = (slot.as_interval(), voxels.plane_mut(p)) else {
                        continue;
                    };
                    self.apply_2d(domain, Rc::make_mut(values))?;
                }
                Ok(())
            }
            Object::Transformed(t) => self.apply_object(Rc::make_mut(&mut t.object)),
            other => Err(Error::unsupported("grey mapping object", other.object_type() as i32)),
        }
    }
}

/// Replaces every grey value `v` of `obj` by `lut[v - min]`, with `v`
/// clamped to `min..=max`. Colour values are mapped per channel and keep
/// their alpha. Values shared with other objects are copied first.
pub fn set_range_lut(obj: &mut Object, min: i32, max: i32, lut: &[u8]) -> Result<()> {
    if max < min {
        return Err(Error::InvalidParameter("lookup range is inverted"));
    }
    let span = (i64::from(max) - i64::from(min) + 1) as usize;
    if lut.len() < span {
        return Err(Error::InvalidParameter("lookup table shorter than its range"));
    }
    debug!("mapping grey range {min}..={max} through a {}-entry table", lut.len());
    RangeLut { min, max, table: lut }.apply_object(obj)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::set_range_lut;
    use iv_core::{
        AffineTransform, Error, GreyType, GreyValues, Interval, IntervalDomain, Object, Object2D, Object3D,
        PixelValue, PlaneDomain, PlaneDomainKind, PlaneSlot, TransformedObject, VoxelValues, pack_rgba,
    };

    fn inverse() -> Vec<u8> {
        (0..=255u8).rev().collect()
    }

    fn obj(ty: GreyType, fill: PixelValue) -> Object2D {
        let domain = IntervalDomain::from_runs(0, vec![vec![Interval::new(0, 1), Interval::new(4, 4)]]).expect("runs");
        let v = GreyValues::new_for_domain(&domain, ty, fill).expect("values");
        Object2D::with_values(Rc::new(domain), Rc::new(v))
    }

    #[test]
    fn maps_and_clamps() {
        let mut o = Object::Domain2D(obj(GreyType::Int, PixelValue::Int(300)));
        set_range_lut(&mut o, 0, 255, &inverse()).expect("lut");
        let v = o.as_2d().expect("2d").values().expect("values");
        assert_eq!(v.get(0, 4), PixelValue::Int(0));

        let mut f = Object::Domain2D(obj(GreyType::Float, PixelValue::Float(10.7)));
        set_range_lut(&mut f, 0, 255, &inverse()).expect("lut");
        assert_eq!(f.as_2d().expect("2d").values().expect("values").get(0, 0), PixelValue::Float(245.0));
    }

    #[test]
    fn colour_keeps_alpha() {
        let mut o = Object::Domain2D(obj(GreyType::Rgba, PixelValue::Rgba(pack_rgba(0, 10, 255, 77))));
        set_range_lut(&mut o, 0, 255, &inverse()).expect("lut");
        let v = o.as_2d().expect("2d").values().expect("values");
        assert_eq!(v.get(0, 1), PixelValue::Rgba(pack_rgba(255, 245, 0, 77)));
    }

    #[test]
    fn shared_values_are_copied_on_write() {
        let base = obj(GreyType::UByte, PixelValue::UByte(5));
        let keep = Rc::clone(base.values.as_ref().expect("values"));
        let mut o = Object::Domain2D(base);
        set_range_lut(&mut o, 0, 255, &inverse()).expect("lut");
        assert_eq!(keep.get(0, 0), PixelValue::UByte(5));
        assert_eq!(o.as_2d().expect("2d").values().expect("values").get(0, 0), PixelValue::UByte(250));
    }

    #[test]
    fn recurses_into_planes_and_wrappers() {
        let plane = obj(GreyType::Short, PixelValue::Short(1));
        let mut pd = PlaneDomain::new(PlaneDomainKind::Interval, 0, 1, 0, 0, 0, 4).expect("planes");
        pd.set_plane(0, PlaneSlot::Interval(Rc::clone(&plane.domain))).expect("set");
        let mut vv = VoxelValues::new(0, 1, PixelValue::Short(0)).expect("voxels");
        vv.set_plane(0, plane.values.clone()).expect("set");
        let mut vol = Object::Domain3D(Object3D {
            domain: Rc::new(pd),
            values: Some(Rc::new(vv)),
            properties: None,
        });
        set_range_lut(&mut vol, 0, 3, &[9, 8, 7, 6]).expect("lut");
        let o3 = vol.as_3d().expect("3d");
        let p0 = o3.plane_object(0).expect("plane");
        assert_eq!(p0.values().expect("values").get(0, 4), PixelValue::Short(8));

        let mut wrapped = Object::Transformed(TransformedObject {
            transform: Rc::new(AffineTransform::identity(1)),
            object: Rc::new(Object::Domain2D(obj(GreyType::Double, PixelValue::Double(2.0)))),
            properties: None,
        });
        set_range_lut(&mut wrapped, 0, 3, &[9, 8, 7, 6]).expect("lut");
        let Object::Transformed(t) = &wrapped else {
            panic!("still wrapped");
        };
        assert_eq!(
            t.object.as_2d().expect("2d").values().expect("values").get(0, 1),
            PixelValue::Double(7.0)
        );
    }

    #[test]
    fn checks_arguments() {
        let mut o = Object::Domain2D(obj(GreyType::Int, PixelValue::Int(0)));
        assert!(matches!(set_range_lut(&mut o, 0, 10, &[1, 2]), Err(Error::InvalidParameter(_))));
        assert!(set_range_lut(&mut Object::Empty, 0, 0, &[0]).is_ok());
        let mut bare = Object::domain_2d(IntervalDomain::rect(0, 1, 0, 1).expect("rect"));
        assert!(matches!(set_range_lut(&mut bare, 0, 0, &[0]), Err(Error::InvalidValues(_))));
    }
}

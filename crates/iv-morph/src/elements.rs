//! Standard structuring elements.
//!
//! The 3x3 specials are centred on the origin with line `-1` first.

use std::rc::Rc;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use iv_core::{
    Error, Interval, IntervalDomain, Object, Object3D, PlaneDomain, PlaneDomainKind,
    PlaneSlot, Result, nint,
};

use crate::connectivity::{Connectivity, cross, dilate_connected, square};

/// Dimensionality of a generated element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ElementDim {
    #[default]
    #[serde(rename = "2d")]
    Planar,
    #[serde(rename = "3d")]
    Volume,
}

/// Distance used to grow a standard element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceType {
    Four,
    Eight,
    Six,
    Eighteen,
    TwentySix,
    /// Alternating 4- and 8-connected steps.
    Octagonal,
    #[default]
    Euclidean,
}

impl FromStr for DistanceType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "4" | "four" => Self::Four,
            "8" | "eight" => Self::Eight,
            "6" | "six" => Self::Six,
            "18" | "eighteen" => Self::Eighteen,
            "26" | "twenty_six" => Self::TwentySix,
            "oct" | "octagonal" => Self::Octagonal,
            "euclidean" => Self::Euclidean,
            other => return Err(format!("unknown distance type `{other}`")),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StdElementConfig {
    pub dim: ElementDim,
    pub distance: DistanceType,
    pub radius: f64,
}

impl Default for StdElementConfig {
    fn default() -> Self {
        Self {
            dim: ElementDim::Planar,
            distance: DistanceType::Euclidean,
            radius: 1.0,
        }
    }
}

/// The fixed 3x3 elements. Indexed variants carry their index, checked when
/// the element is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialElement {
    H4,
    Ex4,
    A8,
    H5(u8),
    H6(u8),
    H7(u8),
    A3(u8),
    E1,
    E2,
    V2,
}

type Row = Option<(i32, i32)>;

fn rows3(rows: [Row; 3]) -> Result<IntervalDomain> {
    IntervalDomain::from_runs(
        -1,
        rows.iter()
            .map(|r| r.map(|(a, b)| vec![Interval::new(a, b)]).unwrap_or_default())
            .collect(),
    )
}

const FULL: Row = Some((-1, 1));
const MID: Row = Some((0, 0));
const LEFT: Row = Some((-1, 0));
const RIGHT: Row = Some((0, 1));

fn bad_index() -> Error {
    Error::InvalidParameter("special element index out of range")
}

fn special_domain(kind: SpecialElement) -> Result<IntervalDomain> {
    Ok(match kind {
        SpecialElement::H4 => cross()?,
        SpecialElement::Ex4 => rows3([FULL, MID, FULL])?,
        SpecialElement::A8 => square()?,
        SpecialElement::H5(n) => rows3(match n {
            0 => [LEFT, FULL, MID],
            1 => [RIGHT, FULL, MID],
            2 => [MID, FULL, RIGHT],
            3 => [MID, FULL, LEFT],
            _ => return Err(bad_index()),
        })?,
        SpecialElement::H6(n) => rows3(match n {
            0 => [LEFT, FULL, RIGHT],
            1 => [RIGHT, FULL, LEFT],
            2 => [MID, FULL, FULL],
            3 => [LEFT, FULL, LEFT],
            4 => [FULL, FULL, MID],
            5 => [RIGHT, FULL, RIGHT],
            _ => return Err(bad_index()),
        })?,
        SpecialElement::H7(n) => rows3(match n {
            0 => [RIGHT, FULL, FULL],
            1 => [LEFT, FULL, FULL],
            2 => [FULL, FULL, LEFT],
            3 => [FULL, FULL, RIGHT],
            _ => return Err(bad_index()),
        })?,
        SpecialElement::A3(n) => rows3(match n {
            0 => [MID, FULL, None],
            1 => [MID, RIGHT, MID],
            2 => [None, FULL, MID],
            3 => [MID, LEFT, MID],
            _ => return Err(bad_index()),
        })?,
        SpecialElement::E1 => IntervalDomain::from_runs(0, vec![vec![Interval::new(0, 1)]])?,
        SpecialElement::E2 => IntervalDomain::from_runs(0, vec![vec![Interval::new(-1, 1)]])?,
        SpecialElement::V2 => rows3([MID, MID, MID])?,
    })
}

pub fn special_element(kind: SpecialElement) -> Result<Object> {
    Ok(Object::domain_2d(special_domain(kind)?))
}

/// One pixel at column `k`, line `l` and, for a volume, plane `p`.
pub fn single_pixel(dim: ElementDim, k: i32, l: i32, p: i32) -> Result<Object> {
    let pixel = IntervalDomain::from_runs(l, vec![vec![Interval::new(k, k)]])?;
    match dim {
        ElementDim::Planar => Ok(Object::domain_2d(pixel)),
        ElementDim::Volume => {
            let mut planes = PlaneDomain::new(PlaneDomainKind::Interval, p, p, l, l, k, k)?;
            planes.set_plane(p, PlaneSlot::Interval(Rc::new(pixel)))?;
            Ok(Object::domain_3d(planes))
        }
    }
}

fn circle_domain(radius: f64, x: f64, y: f64) -> Result<IntervalDomain> {
    if radius < 0.0 {
        return Err(Error::InvalidParameter("negative radius"));
    }
    if radius < 0.5 {
        let (k, l) = (nint(x), nint(y));
        return IntervalDomain::from_runs(l, vec![vec![Interval::new(k, k)]]);
    }
    let line_first = nint(y - radius);
    let line_last = nint(y + radius);
    let column_first = nint(x - radius);
    let column_last = nint(x + radius);
    let centre = column_first + (column_last - column_first + 1) / 2;

    let runs = (line_first..=line_last)
        .map(|l| {
            let dy = f64::from(l) - y;
            let delta = radius * radius - dy * dy;
            let half = if delta < 0.5 { 0 } else { delta.sqrt() as i32 };
            vec![Interval::new(centre - half, centre + half)]
        })
        .collect();
    IntervalDomain::from_runs(line_first, runs)
}

/// Disc of `radius` centred on `(x, y)`. A radius below one half gives a
/// single pixel.
pub fn circle(radius: f64, x: f64, y: f64) -> Result<Object> {
    Ok(Object::domain_2d(circle_domain(radius, x, y)?))
}

/// Ball of `radius`, a disc for a planar element. Each plane is a disc of
/// the chord radius, at least one.
pub fn sphere(dim: ElementDim, radius: f64, x: f64, y: f64, z: f64) -> Result<Object> {
    if radius < 0.0 {
        return Err(Error::InvalidParameter("negative radius"));
    }
    if dim == ElementDim::Planar {
        return circle(radius, x, y);
    }
    let plane_first = nint(z - radius);
    let plane_last = nint(z + radius);
    let mut planes = PlaneDomain::new(
        PlaneDomainKind::Interval,
        plane_first,
        plane_last,
        nint(y - radius),
        nint(y + radius),
        nint(x - radius),
        nint(x + radius),
    )?;
    for p in plane_first..=plane_last {
        let dz = f64::from(p) - z;
        let chord = radius * radius - dz * dz;
        let chord = if chord < 1.0 { 1.0 } else { chord.sqrt() };
        planes.set_plane(p, PlaneSlot::Interval(Rc::new(circle_domain(chord, x, y)?)))?;
    }
    planes.standardize();
    Ok(Object::Domain3D(Object3D::new(Rc::new(planes))))
}

fn grow(dim: ElementDim, steps: i32, mut step_conn: impl FnMut(i32) -> Connectivity) -> Result<Object> {
    let mut obj = single_pixel(dim, 0, 0, 0)?;
    for remaining in (0..steps).rev() {
        obj = dilate_connected(&obj, step_conn(remaining))?;
    }
    Ok(obj)
}

/// Element of the given distance type and radius centred on the origin.
///
/// A radius below one half gives the empty object. Connectivity distances
/// dilate the origin pixel `nint(radius)` times.
pub fn std_struct_element(dim: ElementDim, distance: DistanceType, radius: f64) -> Result<Object> {
    if radius < 0.0 {
        return Err(Error::InvalidParameter("negative radius"));
    }
    if radius < 0.5 {
        return Ok(Object::Empty);
    }
    let steps = nint(radius);
    let conn = match distance {
        DistanceType::Four => Some(Connectivity::Four),
        DistanceType::Eight => Some(Connectivity::Eight),
        DistanceType::Six => Some(Connectivity::Six),
        DistanceType::Eighteen => Some(Connectivity::Eighteen),
        DistanceType::TwentySix => Some(Connectivity::TwentySix),
        DistanceType::Octagonal | DistanceType::Euclidean => None,
    };
    let element = match (distance, conn) {
        (_, Some(c)) => grow(dim, steps, |_| c)?,
        (DistanceType::Octagonal, None) => grow(dim, steps, |remaining| {
            if remaining & 1 == 1 {
                Connectivity::Four
            } else {
                Connectivity::Eight
            }
        })?,
        _ => sphere(dim, radius, 0.0, 0.0, 0.0)?,
    };
    debug!("built {distance:?} element of radius {radius}");
    Ok(element)
}

impl StdElementConfig {
    pub fn build(&self) -> Result<Object> {
        std_struct_element(self.dim, self.distance, self.radius)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        DistanceType, ElementDim, SpecialElement, StdElementConfig, circle, single_pixel, special_element, sphere,
        std_struct_element,
    };
    use iv_core::{Error, Interval, Object};

    fn area(o: &Object) -> u64 {
        o.as_2d().expect("2d").domain.area()
    }

    #[test]
    fn specials_have_expected_shapes() {
        assert_eq!(area(&special_element(SpecialElement::H4).expect("h4")), 5);
        assert_eq!(area(&special_element(SpecialElement::Ex4).expect("ex4")), 7);
        assert_eq!(area(&special_element(SpecialElement::A8).expect("a8")), 9);
        assert_eq!(area(&special_element(SpecialElement::H6(4)).expect("h6")), 7);
        assert_eq!(area(&special_element(SpecialElement::H5(0)).expect("h5")), 6);
        assert_eq!(area(&special_element(SpecialElement::H7(2)).expect("h7")), 8);
        assert_eq!(area(&special_element(SpecialElement::E1).expect("e1")), 2);

        let a3 = special_element(SpecialElement::A3(0)).expect("a3");
        let d = &a3.as_2d().expect("2d").domain;
        assert_eq!((d.line_first(), d.line_last()), (-1, 0));

        let v2 = special_element(SpecialElement::V2).expect("v2");
        let d = &v2.as_2d().expect("2d").domain;
        assert_eq!((d.column_first(), d.column_last(), d.height()), (0, 0, 3));
    }

    #[test]
    fn special_index_is_checked() {
        assert!(matches!(
            special_element(SpecialElement::H6(6)),
            Err(Error::InvalidParameter(_))
        ));
        assert!(special_element(SpecialElement::A3(4)).is_err());
    }

    #[test]
    fn circle_rows_are_centred() {
        let c = circle(2.0, 0.0, 0.0).expect("circle");
        let d = &c.as_2d().expect("2d").domain;
        assert_eq!(d.line_runs(0).to_vec(), vec![Interval::new(-2, 2)]);
        assert_eq!(d.line_runs(-2).to_vec(), vec![Interval::new(0, 0)]);
        assert_eq!(d.line_runs(1).to_vec(), vec![Interval::new(-1, 1)]);

        assert_eq!(area(&circle(0.3, 4.4, -1.6).expect("pixel")), 1);
        assert!(circle(-1.0, 0.0, 0.0).is_err());
    }

    #[test]
    fn sphere_planes_shrink_away_from_centre() {
        let s = sphere(ElementDim::Volume, 2.0, 0.0, 0.0, 0.0).expect("sphere");
        let o3 = s.as_3d().expect("3d");
        assert_eq!((o3.domain.plane_first(), o3.domain.plane_last()), (-2, 2));
        let mid = o3.plane_object(0).expect("mid").domain.area();
        let cap = o3.plane_object(2).expect("cap").domain.area();
        assert!(cap < mid);
    }

    #[test]
    fn std_elements_grow_by_distance() {
        assert_eq!(std_struct_element(ElementDim::Planar, DistanceType::Four, 0.2).expect("tiny"), Object::Empty);
        assert!(std_struct_element(ElementDim::Planar, DistanceType::Eight, -1.0).is_err());

        let diamond = std_struct_element(ElementDim::Planar, DistanceType::Four, 2.0).expect("diamond");
        assert_eq!(area(&diamond), 13);
        let square = std_struct_element(ElementDim::Planar, DistanceType::Eight, 2.0).expect("square");
        assert_eq!(area(&square), 25);
        // One 4-connected and one 8-connected step.
        let oct = std_struct_element(ElementDim::Planar, DistanceType::Octagonal, 2.0).expect("octagon");
        assert_eq!(area(&oct), 21);

        let cube = std_struct_element(ElementDim::Volume, DistanceType::TwentySix, 1.0).expect("cube");
        assert_eq!(cube.as_3d().expect("3d").domain.volume(), 27);
        assert_eq!(single_pixel(ElementDim::Volume, 1, 2, 3).expect("px").as_3d().expect("3d").domain.volume(), 1);
    }

    #[test]
    fn config_defaults_fill_missing_fields() {
        let cfg: StdElementConfig = serde_json::from_str(r#"{"distance": "eight"}"#).expect("parse");
        assert_eq!(cfg.radius, 1.0);
        assert_eq!(cfg.dim, ElementDim::Planar);
        assert_eq!(area(&cfg.build().expect("build")), 9);
        assert_eq!("26".parse::<DistanceType>().expect("parse"), DistanceType::TwentySix);
    }
}

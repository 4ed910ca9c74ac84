use std::rc::Rc;

use serde::{Deserialize, Serialize};

use iv_core::{Error, Interval, IntervalDomain, Object, Object3D, PlaneDomain, PlaneDomainKind, PlaneSlot, Result};

use crate::dilation::dilate;

/// Pixel and voxel neighbourhoods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    Four,
    Eight,
    Six,
    Eighteen,
    TwentySix,
}

impl Connectivity {
    pub fn is_planar(self) -> bool {
        matches!(self, Self::Four | Self::Eight)
    }
}

pub(crate) fn cross() -> Result<IntervalDomain> {
    IntervalDomain::from_runs(
        -1,
        vec![
            vec![Interval::new(0, 0)],
            vec![Interval::new(-1, 1)],
            vec![Interval::new(0, 0)],
        ],
    )
}

pub(crate) fn square() -> Result<IntervalDomain> {
    IntervalDomain::from_runs(-1, vec![vec![Interval::new(-1, 1)]; 3])
}

pub(crate) fn origin() -> Result<IntervalDomain> {
    IntervalDomain::from_runs(0, vec![vec![Interval::new(0, 0)]])
}

/// Three planes `-1..=1` centred on the origin.
fn slab(below: IntervalDomain, middle: IntervalDomain, above: IntervalDomain) -> Result<Object> {
    let mut planes = PlaneDomain::new(PlaneDomainKind::Interval, -1, 1, -1, 1, -1, 1)?;
    for (p, d) in [(-1, below), (0, middle), (1, above)] {
        planes.set_plane(p, PlaneSlot::Interval(Rc::new(d)))?;
    }
    planes.standardize();
    Ok(Object::Domain3D(Object3D::new(Rc::new(planes))))
}

/// Structuring element of the unit neighbourhood.
///
/// Volume neighbourhoods applied to a planar object keep only their
/// in-plane part: 6 acts like 4, 18 and 26 like 8.
pub fn neighbourhood(conn: Connectivity, volume: bool) -> Result<Object> {
    if !volume {
        let d = match conn {
            Connectivity::Four | Connectivity::Six => cross()?,
            Connectivity::Eight | Connectivity::Eighteen | Connectivity::TwentySix => square()?,
        };
        return Ok(Object::domain_2d(d));
    }
    match conn {
        Connectivity::Four => Ok(Object::domain_2d(cross()?)),
        Connectivity::Eight => Ok(Object::domain_2d(square()?)),
        Connectivity::Six => slab(origin()?, cross()?, origin()?),
        Connectivity::Eighteen => slab(cross()?, square()?, cross()?),
        Connectivity::TwentySix => slab(square()?, square()?, square()?),
    }
}

/// Dilation by the unit neighbourhood of `conn`.
pub fn dilate_connected(obj: &Object, conn: Connectivity) -> Result<Object> {
    let volume = match obj {
        Object::Domain2D(_) | Object::Empty => false,
        Object::Domain3D(_) => true,
        Object::Transformed(t) => matches!(*t.object, Object::Domain3D(_)),
        other => return Err(Error::unsupported("dilation object", other.object_type() as i32)),
    };
    dilate(obj, &neighbourhood(conn, volume)?)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::{Connectivity, dilate_connected, origin};
    use iv_core::{Object, Object3D, PlaneDomain, PlaneDomainKind, PlaneSlot};

    fn pixel_volume() -> Object {
        let mut pd = PlaneDomain::new(PlaneDomainKind::Interval, 0, 0, 0, 0, 0, 0).expect("pd");
        pd.set_plane(0, PlaneSlot::Interval(Rc::new(origin().expect("origin")))).expect("set");
        Object::Domain3D(Object3D::new(Rc::new(pd)))
    }

    #[test]
    fn planar_neighbourhood_sizes() {
        let px = Object::domain_2d(origin().expect("origin"));
        let area = |c| {
            dilate_connected(&px, c)
                .expect("dilate")
                .as_2d()
                .expect("2d")
                .domain
                .area()
        };
        assert_eq!(area(Connectivity::Four), 5);
        assert_eq!(area(Connectivity::Eight), 9);
        assert_eq!(area(Connectivity::Six), 5);
    }

    #[test]
    fn volume_neighbourhood_sizes() {
        let vol = pixel_volume();
        let volume = |c| {
            dilate_connected(&vol, c)
                .expect("dilate")
                .as_3d()
                .expect("3d")
                .domain
                .volume()
        };
        assert_eq!(volume(Connectivity::Six), 7);
        assert_eq!(volume(Connectivity::Eighteen), 19);
        assert_eq!(volume(Connectivity::TwentySix), 27);
        assert_eq!(volume(Connectivity::Eight), 9);
    }

    #[test]
    fn config_names_are_snake_case() {
        let c: Connectivity = serde_json::from_str("\"twenty_six\"").expect("parse");
        assert_eq!(c, Connectivity::TwentySix);
    }
}

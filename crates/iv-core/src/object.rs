use std::rc::Rc;

use crate::error::{Error, Result};
use crate::interval::IntervalDomain;
use crate::plane::{PlaneDomain, PlaneDomainKind};
use crate::shapes::{BoundList, Histogram, Point, Polygon, PropertyList, Rectangle, Vector};
use crate::transform::{AffineTransform, FeatureMatch, Warp3D, WarpTransform};
use crate::values::{GreyType, GreyValues, PixelValue, VoxelValues};

/// Discriminant of [`Object`], one per persisted object kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Empty,
    Domain2D,
    Domain3D,
    Transformed,
    Warp3D,
    Polygon,
    BoundList,
    Histogram,
    Rectangle,
    VectorInt,
    VectorFloat,
    PointInt,
    PointFloat,
    Affine,
    Warp,
    FeatureMatch,
    CompoundArray1,
    CompoundArray2,
    Property,
}

impl ObjectType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Domain2D => "2d-domain",
            Self::Domain3D => "3d-domain",
            Self::Transformed => "transformed",
            Self::Warp3D => "3d-warp",
            Self::Polygon => "polygon",
            Self::BoundList => "boundlist",
            Self::Histogram => "histogram",
            Self::Rectangle => "rectangle",
            Self::VectorInt => "vector-int",
            Self::VectorFloat => "vector-float",
            Self::PointInt => "point-int",
            Self::PointFloat => "point-float",
            Self::Affine => "affine",
            Self::Warp => "warp",
            Self::FeatureMatch => "feature-match",
            Self::CompoundArray1 => "compound-1",
            Self::CompoundArray2 => "compound-2",
            Self::Property => "property",
        }
    }
}

/// 2D region with optional grey values.
#[derive(Debug, Clone, PartialEq)]
pub struct Object2D {
    pub domain: Rc<IntervalDomain>,
    pub values: Option<Rc<GreyValues>>,
    pub properties: Option<Rc<PropertyList>>,
}

impl Object2D {
    pub fn new(domain: Rc<IntervalDomain>) -> Self {
        Self {
            domain,
            values: None,
            properties: None,
        }
    }

    pub fn with_values(domain: Rc<IntervalDomain>, values: Rc<GreyValues>) -> Self {
        Self {
            domain,
            values: Some(values),
            properties: None,
        }
    }

    /// Same domain with a fresh zero-filled table of `ty`.
    pub fn with_new_values(&self, ty: GreyType, background: PixelValue) -> Result<Self> {
        let values = GreyValues::new_for_domain(&self.domain, ty, background)?;
        Ok(Self {
            domain: Rc::clone(&self.domain),
            values: Some(Rc::new(values)),
            properties: self.properties.clone(),
        })
    }

    pub fn grey_type(&self) -> Option<GreyType> {
        self.values.as_ref().map(|v| v.grey_type())
    }

    pub fn values(&self) -> Result<&GreyValues> {
        self.values
            .as_deref()
            .ok_or(Error::InvalidValues("object carries no grey values"))
    }
}

/// Stack of per-plane regions with optional voxel values.
#[derive(Debug, Clone, PartialEq)]
pub struct Object3D {
    pub domain: Rc<PlaneDomain>,
    pub values: Option<Rc<VoxelValues>>,
    pub properties: Option<Rc<PropertyList>>,
}

impl Object3D {
    pub fn new(domain: Rc<PlaneDomain>) -> Self {
        Self {
            domain,
            values: None,
            properties: None,
        }
    }

    /// The 2D object on `plane`, `None` for a null plane or a plane outside
    /// the domain.
    pub fn plane_object(&self, plane: i32) -> Option<Object2D> {
        let domain = self.domain.plane(plane)?.as_interval()?;
        let values = self.values.as_ref().and_then(|v| v.plane(plane)).cloned();
        Some(Object2D {
            domain: Rc::clone(domain),
            values,
            properties: None,
        })
    }
}

/// An object carried together with an affine transform.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedObject {
    pub transform: Rc<AffineTransform>,
    pub object: Rc<Object>,
    pub properties: Option<Rc<PropertyList>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompoundKind {
    /// Objects of one type.
    Array1,
    /// Objects of mixed types.
    Array2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Compound {
    pub kind: CompoundKind,
    /// Shared element type, `None` when unspecified.
    pub element_type: Option<ObjectType>,
    pub objects: Vec<Rc<Object>>,
    pub properties: Option<Rc<PropertyList>>,
}

/// Every object kind the library reads, writes and processes.
///
/// Parts are shared through `Rc`: cloning an object assigns another reference
/// to the same domain and values, dropping it frees that reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Empty,
    Domain2D(Object2D),
    Domain3D(Object3D),
    Transformed(TransformedObject),
    Warp3D(Rc<Warp3D>),
    Polygon(Rc<Polygon>),
    BoundList(Rc<BoundList>),
    Histogram(Rc<Histogram>),
    Rectangle(Rc<Rectangle>),
    Vector(Vector),
    Point(Point),
    Affine(Rc<AffineTransform>),
    Warp(Rc<WarpTransform>),
    FeatureMatch(Rc<FeatureMatch>),
    Compound(Compound),
    Property(Rc<PropertyList>),
}

impl Object {
    pub fn domain_2d(domain: IntervalDomain) -> Self {
        if domain.is_empty() {
            Self::Empty
        } else {
            Self::Domain2D(Object2D::new(Rc::new(domain)))
        }
    }

    pub fn domain_3d(domain: PlaneDomain) -> Self {
        if domain.is_empty() {
            Self::Empty
        } else {
            Self::Domain3D(Object3D::new(Rc::new(domain)))
        }
    }

    pub fn object_type(&self) -> ObjectType {
        match self {
            Self::Empty => ObjectType::Empty,
            Self::Domain2D(_) => ObjectType::Domain2D,
            Self::Domain3D(_) => ObjectType::Domain3D,
            Self::Transformed(_) => ObjectType::Transformed,
            Self::Warp3D(_) => ObjectType::Warp3D,
            Self::Polygon(_) => ObjectType::Polygon,
            Self::BoundList(_) => ObjectType::BoundList,
            Self::Histogram(_) => ObjectType::Histogram,
            Self::Rectangle(_) => ObjectType::Rectangle,
            Self::Vector(Vector::Int { .. }) => ObjectType::VectorInt,
            Self::Vector(Vector::Float { .. }) => ObjectType::VectorFloat,
            Self::Point(Point::Int { .. }) => ObjectType::PointInt,
            Self::Point(Point::Float { .. }) => ObjectType::PointFloat,
            Self::Affine(_) => ObjectType::Affine,
            Self::Warp(_) => ObjectType::Warp,
            Self::FeatureMatch(_) => ObjectType::FeatureMatch,
            Self::Compound(c) => match c.kind {
                CompoundKind::Array1 => ObjectType::CompoundArray1,
                CompoundKind::Array2 => ObjectType::CompoundArray2,
            },
            Self::Property(_) => ObjectType::Property,
        }
    }

    /// True for the empty marker, an empty 2D domain and a plane domain whose
    /// interval planes are all null.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Domain2D(o) => o.domain.is_empty(),
            Self::Domain3D(o) => {
                o.domain.kind() == PlaneDomainKind::Empty
                    || (o.domain.kind() == PlaneDomainKind::Interval && o.domain.is_empty())
            }
            _ => false,
        }
    }

    pub fn as_2d(&self) -> Result<&Object2D> {
        match self {
            Self::Domain2D(o) => Ok(o),
            Self::Empty => Err(Error::NullInput("object")),
            other => Err(Error::unsupported("2D object", other.object_type() as i32)),
        }
    }

    pub fn as_3d(&self) -> Result<&Object3D> {
        match self {
            Self::Domain3D(o) => Ok(o),
            Self::Empty => Err(Error::NullInput("object")),
            other => Err(Error::unsupported("3D object", other.object_type() as i32)),
        }
    }

    pub fn properties(&self) -> Option<&Rc<PropertyList>> {
        match self {
            Self::Domain2D(o) => o.properties.as_ref(),
            Self::Domain3D(o) => o.properties.as_ref(),
            Self::Transformed(o) => o.properties.as_ref(),
            Self::Compound(c) => c.properties.as_ref(),
            Self::Warp3D(w) => w.properties.as_ref(),
            Self::Property(p) => Some(p),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::{Object, Object3D, ObjectType};
    use crate::interval::{Interval, IntervalDomain};
    use crate::plane::{PlaneDomain, PlaneDomainKind, PlaneSlot};
    use crate::shapes::Point;
    use crate::values::{GreyType, PixelValue};

    #[test]
    fn empty_domains_make_empty_objects() {
        assert_eq!(Object::domain_2d(IntervalDomain::empty()), Object::Empty);

        let pd = PlaneDomain::new(PlaneDomainKind::Interval, 0, 2, 0, 0, 0, 0).expect("valid");
        let obj = Object::Domain3D(Object3D::new(Rc::new(pd)));
        assert!(obj.is_empty());
        assert!(Object::Empty.is_empty());
    }

    #[test]
    fn types_follow_variant_payload() {
        let p = Object::Point(Point::Float {
            k: 1.0,
            l: 2.0,
            style: 0,
        });
        assert_eq!(p.object_type(), ObjectType::PointFloat);
        assert!(!p.is_empty());
        assert!(p.as_2d().is_err());
    }

    #[test]
    fn plane_object_shares_the_plane_domain() {
        let plane = Rc::new(IntervalDomain::from_runs(0, vec![vec![Interval::new(0, 3)]]).expect("runs"));
        let mut pd = PlaneDomain::new(PlaneDomainKind::Interval, 5, 6, 0, 0, 0, 3).expect("valid");
        pd.set_plane(5, PlaneSlot::Interval(Rc::clone(&plane))).expect("set");
        let obj = Object3D::new(Rc::new(pd));

        let o2 = obj.plane_object(5).expect("plane present");
        assert!(Rc::ptr_eq(&o2.domain, &plane));
        assert!(obj.plane_object(6).is_none());

        let with = o2.with_new_values(GreyType::UByte, PixelValue::Int(3)).expect("values");
        assert_eq!(with.grey_type(), Some(GreyType::UByte));
        assert_eq!(with.values().expect("values").get(0, 9), PixelValue::UByte(3));
    }
}

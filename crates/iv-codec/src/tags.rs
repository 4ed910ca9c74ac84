//! Type tag bytes of the wire format.

use iv_core::{Error, GreyType, ObjectType, PlaneDomainKind, Result};

/// Null tag: end of object, or an absent optional entity.
pub const NULL: u8 = 0;

pub mod object {
    pub const DOMAIN_2D: u8 = 1;
    pub const DOMAIN_3D: u8 = 2;
    pub const TRANSFORMED: u8 = 3;
    pub const WARP_3D: u8 = 4;
    pub const POLYGON: u8 = 10;
    pub const BOUNDLIST: u8 = 11;
    pub const HISTOGRAM: u8 = 13;
    pub const RECTANGLE: u8 = 20;
    pub const VECTOR_INT: u8 = 30;
    pub const VECTOR_FLOAT: u8 = 31;
    pub const POINT_INT: u8 = 40;
    pub const POINT_FLOAT: u8 = 41;
    pub const AFFINE: u8 = 63;
    pub const WARP: u8 = 64;
    pub const FEATURE_MATCH: u8 = 65;
    pub const COMPOUND_ARRAY_1: u8 = 80;
    pub const COMPOUND_ARRAY_2: u8 = 81;
    pub const PROPERTY: u8 = 110;
    pub const EMPTY: u8 = 253;
}

pub mod interval {
    pub const RUN_CODED: u8 = 1;
    pub const RECT: u8 = 2;
}

pub mod plane {
    /// Written by old files for interval planes.
    pub const LEGACY_DOMAIN: u8 = 2;
    pub const DOMAIN: u8 = 3;
    pub const POLYGON: u8 = 4;
    pub const BOUNDLIST: u8 = 5;
    pub const HISTOGRAM: u8 = 6;
    pub const AFFINE: u8 = 7;
    pub const WARP: u8 = 8;
}

pub mod polygon {
    pub const INT: u8 = 1;
    pub const FLOAT: u8 = 2;
    pub const DOUBLE: u8 = 3;
}

pub mod boundlist {
    /// Written ahead of every list node, the real kind follows.
    pub const NODE: u8 = 1;
    pub const PIECE: u8 = 0;
    pub const HOLE: u8 = 1;
}

pub mod rectangle {
    pub const INT: u8 = 1;
    pub const FLOAT: u8 = 2;
}

pub mod histogram {
    pub const OLD_INT: u8 = 1;
    pub const OLD_FLOAT: u8 = 2;
    pub const INT: u8 = 3;
    pub const FLOAT: u8 = 4;
}

pub const PROPERTY_SIMPLE: u8 = 1;
pub const VOXEL_GREY: u8 = 1;

pub fn grey_code(ty: GreyType) -> u8 {
    match ty {
        GreyType::Int => 1,
        GreyType::Short => 2,
        GreyType::UByte => 3,
        GreyType::Float => 4,
        GreyType::Double => 5,
        GreyType::Rgba => 6,
    }
}

pub fn grey_type(code: u8) -> Result<GreyType> {
    Ok(match code {
        1 => GreyType::Int,
        2 => GreyType::Short,
        3 => GreyType::UByte,
        4 => GreyType::Float,
        5 => GreyType::Double,
        6 => GreyType::Rgba,
        other => return Err(Error::unsupported("grey", i32::from(other))),
    })
}

pub fn object_code(ty: ObjectType) -> u8 {
    match ty {
        ObjectType::Empty => object::EMPTY,
        ObjectType::Domain2D => object::DOMAIN_2D,
        ObjectType::Domain3D => object::DOMAIN_3D,
        ObjectType::Transformed => object::TRANSFORMED,
        ObjectType::Warp3D => object::WARP_3D,
        ObjectType::Polygon => object::POLYGON,
        ObjectType::BoundList => object::BOUNDLIST,
        ObjectType::Histogram => object::HISTOGRAM,
        ObjectType::Rectangle => object::RECTANGLE,
        ObjectType::VectorInt => object::VECTOR_INT,
        ObjectType::VectorFloat => object::VECTOR_FLOAT,
        ObjectType::PointInt => object::POINT_INT,
        ObjectType::PointFloat => object::POINT_FLOAT,
        ObjectType::Affine => object::AFFINE,
        ObjectType::Warp => object::WARP,
        ObjectType::FeatureMatch => object::FEATURE_MATCH,
        ObjectType::CompoundArray1 => object::COMPOUND_ARRAY_1,
        ObjectType::CompoundArray2 => object::COMPOUND_ARRAY_2,
        ObjectType::Property => object::PROPERTY,
    }
}

pub fn object_type(code: u8) -> Result<ObjectType> {
    Ok(match code {
        object::EMPTY => ObjectType::Empty,
        object::DOMAIN_2D => ObjectType::Domain2D,
        object::DOMAIN_3D => ObjectType::Domain3D,
        object::TRANSFORMED => ObjectType::Transformed,
        object::WARP_3D => ObjectType::Warp3D,
        object::POLYGON => ObjectType::Polygon,
        object::BOUNDLIST => ObjectType::BoundList,
        object::HISTOGRAM => ObjectType::Histogram,
        object::RECTANGLE => ObjectType::Rectangle,
        object::VECTOR_INT => ObjectType::VectorInt,
        object::VECTOR_FLOAT => ObjectType::VectorFloat,
        object::POINT_INT => ObjectType::PointInt,
        object::POINT_FLOAT => ObjectType::PointFloat,
        object::AFFINE => ObjectType::Affine,
        object::WARP => ObjectType::Warp,
        object::FEATURE_MATCH => ObjectType::FeatureMatch,
        object::COMPOUND_ARRAY_1 => ObjectType::CompoundArray1,
        object::COMPOUND_ARRAY_2 => ObjectType::CompoundArray2,
        object::PROPERTY => ObjectType::Property,
        other => return Err(Error::unsupported("object", i32::from(other))),
    })
}

pub fn plane_code(kind: PlaneDomainKind) -> u8 {
    match kind {
        PlaneDomainKind::Empty => NULL,
        PlaneDomainKind::Interval => plane::DOMAIN,
        PlaneDomainKind::Polygon => plane::POLYGON,
        PlaneDomainKind::BoundList => plane::BOUNDLIST,
        PlaneDomainKind::Histogram => plane::HISTOGRAM,
        PlaneDomainKind::Affine => plane::AFFINE,
        PlaneDomainKind::Warp => plane::WARP,
    }
}

pub fn plane_kind(code: u8) -> Result<PlaneDomainKind> {
    Ok(match code {
        plane::LEGACY_DOMAIN | plane::DOMAIN => PlaneDomainKind::Interval,
        plane::POLYGON => PlaneDomainKind::Polygon,
        plane::BOUNDLIST => PlaneDomainKind::BoundList,
        plane::HISTOGRAM => PlaneDomainKind::Histogram,
        plane::AFFINE => PlaneDomainKind::Affine,
        plane::WARP => PlaneDomainKind::Warp,
        other => return Err(Error::unsupported("plane domain", i32::from(other))),
    })
}

#[cfg(test)]
mod tests {
    use super::{grey_code, grey_type, object_code, object_type, plane_kind};
    use iv_core::{GreyType, ObjectType, PlaneDomainKind};

    #[test]
    fn grey_codes_never_collide_with_the_null_tag() {
        for ty in GreyType::ALL {
            let code = grey_code(ty);
            assert_ne!(code, 0);
            assert_eq!(grey_type(code).expect("known"), ty);
        }
        assert!(grey_type(0).is_err());
    }

    #[test]
    fn object_codes_are_reversible() {
        for ty in [ObjectType::Domain2D, ObjectType::Warp, ObjectType::Empty, ObjectType::PointFloat] {
            assert_eq!(object_type(object_code(ty)).expect("known"), ty);
        }
        assert!(object_type(99).is_err());
    }

    #[test]
    fn legacy_plane_kind_maps_to_interval() {
        assert_eq!(plane_kind(2).expect("legacy"), PlaneDomainKind::Interval);
        assert_eq!(plane_kind(3).expect("current"), PlaneDomainKind::Interval);
    }
}

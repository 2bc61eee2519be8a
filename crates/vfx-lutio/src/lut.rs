//! The value returned by readers and accepted by writers.

use crate::{AscCdl, Lut1D, Lut3D, Lut3x1D, LutSequence, Matrix, Operator, Range};

/// Any LUT-like object a codec can produce or consume.
#[derive(Debug, Clone, PartialEq)]
pub enum Lut {
    /// Single-channel curve.
    Lut1D(Lut1D),
    /// Per-channel curves.
    Lut3x1D(Lut3x1D),
    /// RGB cube.
    Lut3D(Lut3D),
    /// Matrix with offset.
    Matrix(Matrix),
    /// Range remap.
    Range(Range),
    /// One ASC CDL.
    Cdl(AscCdl),
    /// Several ASC CDLs (collections, decision lists, EDL and ALE files).
    CdlCollection(Vec<AscCdl>),
    /// Chain of operators.
    Sequence(LutSequence),
}

impl Lut {
    /// Short type name used in messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Lut::Lut1D(_) => "LUT1D",
            Lut::Lut3x1D(_) => "LUT3x1D",
            Lut::Lut3D(_) => "LUT3D",
            Lut::Matrix(_) => "Matrix",
            Lut::Range(_) => "Range",
            Lut::Cdl(_) => "ASC_CDL",
            Lut::CdlCollection(_) => "ASC_CDL collection",
            Lut::Sequence(_) => "LUTSequence",
        }
    }

    /// Display name, if the value carries one.
    pub fn name(&self) -> Option<&str> {
        match self {
            Lut::Lut1D(lut) => Some(&lut.name),
            Lut::Lut3x1D(lut) => Some(&lut.name),
            Lut::Lut3D(lut) => Some(&lut.name),
            Lut::Matrix(m) => Some(&m.name),
            Lut::Range(r) => Some(&r.name),
            Lut::Cdl(cdl) => Some(&cdl.name),
            Lut::CdlCollection(_) | Lut::Sequence(_) => None,
        }
    }

    /// True for [`Lut::Sequence`].
    pub fn is_sequence(&self) -> bool {
        matches!(self, Lut::Sequence(_))
    }

    /// Returns the 1D LUT, if this is one.
    pub fn as_lut1d(&self) -> Option<&Lut1D> {
        match self {
            Lut::Lut1D(lut) => Some(lut),
            _ => None,
        }
    }

    /// Returns the 3x1D LUT, if this is one.
    pub fn as_lut3x1d(&self) -> Option<&Lut3x1D> {
        match self {
            Lut::Lut3x1D(lut) => Some(lut),
            _ => None,
        }
    }

    /// Returns the 3D LUT, if this is one.
    pub fn as_lut3d(&self) -> Option<&Lut3D> {
        match self {
            Lut::Lut3D(lut) => Some(lut),
            _ => None,
        }
    }

    /// Returns the matrix, if this is one.
    pub fn as_matrix(&self) -> Option<&Matrix> {
        match self {
            Lut::Matrix(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the CDL, if this is one.
    pub fn as_cdl(&self) -> Option<&AscCdl> {
        match self {
            Lut::Cdl(cdl) => Some(cdl),
            _ => None,
        }
    }

    /// Returns the CDLs of a collection, or the single CDL as a slice.
    pub fn cdls(&self) -> Option<&[AscCdl]> {
        match self {
            Lut::Cdl(cdl) => Some(std::slice::from_ref(cdl)),
            Lut::CdlCollection(cdls) => Some(cdls),
            _ => None,
        }
    }

    /// Returns the sequence, if this is one.
    pub fn as_sequence(&self) -> Option<&LutSequence> {
        match self {
            Lut::Sequence(seq) => Some(seq),
            _ => None,
        }
    }
}

impl From<Operator> for Lut {
    fn from(op: Operator) -> Self {
        match op {
            Operator::Lut1D(lut) => Lut::Lut1D(lut),
            Operator::Lut3x1D(lut) => Lut::Lut3x1D(lut),
            Operator::Lut3D(lut) => Lut::Lut3D(lut),
            Operator::Matrix(m) => Lut::Matrix(m),
            Operator::Range(r) => Lut::Range(r),
            Operator::Cdl(cdl) => Lut::Cdl(cdl),
        }
    }
}

macro_rules! impl_from_lut {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Lut {
                fn from(value: $ty) -> Self {
                    Lut::$variant(value)
                }
            }
        )*
    };
}

impl_from_lut! {
    Lut1D => Lut1D,
    Lut3x1D => Lut3x1D,
    Lut3D => Lut3D,
    Matrix => Matrix,
    Range => Range,
    Cdl => AscCdl,
    Sequence => LutSequence,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_round_trips_into_lut() {
        let lut = Lut::from(Operator::from(Lut3D::identity(2).with_name("cube")));
        assert_eq!(lut.kind(), "LUT3D");
        assert_eq!(lut.name(), Some("cube"));
        assert!(lut.as_lut3d().is_some());
        assert!(lut.as_lut1d().is_none());
    }

    #[test]
    fn cdls_view() {
        let single = Lut::from(AscCdl::default());
        assert_eq!(single.cdls().map(<[_]>::len), Some(1));
        let many = Lut::CdlCollection(vec![AscCdl::default(), AscCdl::default()]);
        assert_eq!(many.cdls().map(<[_]>::len), Some(2));
        assert!(Lut::from(Matrix::identity()).cdls().is_none());
    }
}

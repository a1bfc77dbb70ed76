//! Variable-length primitive matrices of any rank.
//!
//! Encoding:
//! ```text
//! tag:u8  rank:i32  body
//! body(rank == 1) = len:i32 element*
//! body(rank >  1) = len:i32 body(rank - 1)*
//! ```
//! Element tags are single ASCII letters (`Z B C D F I J S`), with `L`
//! holding entity ids.

use crate::types::*;
use uuid::Uuid;

/// Element type of a matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Bool,
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Uuid,
}

impl ElementKind {
    pub const fn tag(self) -> u8 {
        match self {
            Self::Bool => b'Z',
            Self::Byte => b'B',
            Self::Char => b'C',
            Self::Double => b'D',
            Self::Float => b'F',
            Self::Int => b'I',
            Self::Long => b'J',
            Self::Short => b'S',
            Self::Uuid => b'L',
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'Z' => Some(Self::Bool),
            b'B' => Some(Self::Byte),
            b'C' => Some(Self::Char),
            b'D' => Some(Self::Double),
            b'F' => Some(Self::Float),
            b'I' => Some(Self::Int),
            b'J' => Some(Self::Long),
            b'S' => Some(Self::Short),
            b'L' => Some(Self::Uuid),
            _ => None,
        }
    }

    /// Encoded size of one element
    pub const fn size(self) -> usize {
        match self {
            Self::Bool => SIZE_OF_BOOLEAN,
            Self::Byte => SIZE_OF_BYTE,
            Self::Char => SIZE_OF_CHAR,
            Self::Double => SIZE_OF_DOUBLE,
            Self::Float => SIZE_OF_FLOAT,
            Self::Int => SIZE_OF_INT,
            Self::Long => SIZE_OF_LONG,
            Self::Short => SIZE_OF_SHORT,
            Self::Uuid => SIZE_OF_UUID,
        }
    }
}

/// A rank-1 run of elements
#[derive(Debug, Clone, PartialEq)]
pub enum MatrixData {
    Bool(Vec<bool>),
    Byte(Vec<i8>),
    Char(Vec<u16>),
    Double(Vec<f64>),
    Float(Vec<f32>),
    Int(Vec<i32>),
    Long(Vec<i64>),
    Short(Vec<i16>),
    Uuid(Vec<Uuid>),
}

impl MatrixData {
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Bool(_) => ElementKind::Bool,
            Self::Byte(_) => ElementKind::Byte,
            Self::Char(_) => ElementKind::Char,
            Self::Double(_) => ElementKind::Double,
            Self::Float(_) => ElementKind::Float,
            Self::Int(_) => ElementKind::Int,
            Self::Long(_) => ElementKind::Long,
            Self::Short(_) => ElementKind::Short,
            Self::Uuid(_) => ElementKind::Uuid,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Bool(v) => v.len(),
            Self::Byte(v) => v.len(),
            Self::Char(v) => v.len(),
            Self::Double(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Long(v) => v.len(),
            Self::Short(v) => v.len(),
            Self::Uuid(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A matrix of primitives. Rows of a nested matrix share the element kind
/// and have rank one less than their parent.
#[derive(Debug, Clone, PartialEq)]
pub enum Matrix {
    Vector(MatrixData),
    Nested {
        kind: ElementKind,
        rank: usize,
        rows: Vec<Matrix>,
    },
}

impl Matrix {
    /// Build a nested matrix from rows of equal kind and rank
    pub fn nested(kind: ElementKind, rows: Vec<Matrix>) -> Option<Self> {
        let rank = rows.first().map(Matrix::rank).unwrap_or(1);
        if rows.iter().any(|r| r.kind() != kind || r.rank() != rank) {
            return None;
        }
        Some(Self::Nested {
            kind,
            rank: rank + 1,
            rows,
        })
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Vector(data) => data.kind(),
            Self::Nested { kind, .. } => *kind,
        }
    }

    pub fn rank(&self) -> usize {
        match self {
            Self::Vector(_) => 1,
            Self::Nested { rank, .. } => *rank,
        }
    }

    /// Whether the outermost dimension is empty
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Vector(data) => data.is_empty(),
            Self::Nested { rows, .. } => rows.is_empty(),
        }
    }

    /// Size of the full encoding (tag, rank and body)
    pub fn encoded_size(&self) -> usize {
        SIZE_OF_BYTE + SIZE_OF_INT + self.body_size()
    }

    fn body_size(&self) -> usize {
        match self {
            Self::Vector(data) => SIZE_OF_INT + data.len() * data.kind().size(),
            Self::Nested { rows, .. } => {
                SIZE_OF_INT + rows.iter().map(Matrix::body_size).sum::<usize>()
            }
        }
    }
}

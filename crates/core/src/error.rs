//! Construction-time errors and per-frame drop reasons.
//!
//! Records are validated when they are added to a store or buffer. Once a
//! frame starts there are no recoverable failures: offending primitives are
//! dropped and counted under a [`DropReason`].

use std::fmt;

use thiserror::Error;

/// Which id space an invalid id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdKind {
    Texture,
    Material,
    Glyph,
    Node,
    Geometry,
    Vertex3D,
    Vertex2D,
    UvTriple,
    Triangle,
}

impl IdKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdKind::Texture => "texture",
            IdKind::Material => "material",
            IdKind::Glyph => "glyph",
            IdKind::Node => "node",
            IdKind::Geometry => "geometry",
            IdKind::Vertex3D => "3d vertex",
            IdKind::Vertex2D => "2d vertex",
            IdKind::UvTriple => "uv triple",
            IdKind::Triangle => "triangle",
        }
    }
}

impl fmt::Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RasterError {
    /// An id (or the end of an id range) is outside the store it refers to.
    #[error("invalid {kind} id {id} (store holds {len})")]
    InvalidId { kind: IdKind, id: u32, len: u32 },

    /// The store or buffer is full; the record was rejected.
    #[error("{store} is at capacity ({capacity})")]
    CapacityExceeded {
        store: &'static str,
        capacity: usize,
    },

    /// The record cannot produce any primitive (wrong vertex count, zero-area triangle record).
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(&'static str),

    /// Texture dimensions disagree with the pixel array.
    #[error("texture {width}x{height} needs {expected} pixels, got {actual}")]
    InvalidTexture {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, RasterError>;

impl RasterError {
    pub(crate) fn invalid(kind: IdKind, id: u32, len: usize) -> Self {
        RasterError::InvalidId {
            kind,
            id,
            len: len as u32,
        }
    }
}

/// Fail with [`RasterError::InvalidId`] unless `id < len`.
pub(crate) fn check_id(kind: IdKind, id: u32, len: usize) -> Result<()> {
    if (id as usize) < len {
        Ok(())
    } else {
        Err(RasterError::invalid(kind, id, len))
    }
}

/// Why a primitive or fragment was silently dropped during a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// Zero-area triangle, coincident line endpoints, or non-finite coordinates.
    Degenerate,
    /// Whole primitive behind the eye or outside one clip half-space.
    OutOfFrustum,
    /// Primitive buffer full.
    CapacityExceeded,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::Degenerate => "degenerate",
            DropReason::OutOfFrustum => "out of frustum",
            DropReason::CapacityExceeded => "capacity exceeded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_id_accepts_in_range_ids() {
        assert!(check_id(IdKind::Material, 0, 1).is_ok());
        assert_eq!(
            check_id(IdKind::Material, 1, 1),
            Err(RasterError::InvalidId {
                kind: IdKind::Material,
                id: 1,
                len: 1
            })
        );
    }

    #[test]
    fn error_messages_name_the_store() {
        let err = RasterError::invalid(IdKind::Texture, 7, 2);
        assert_eq!(err.to_string(), "invalid texture id 7 (store holds 2)");

        let err = RasterError::CapacityExceeded {
            store: "material store",
            capacity: 4,
        };
        assert_eq!(err.to_string(), "material store is at capacity (4)");
    }
}

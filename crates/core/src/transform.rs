//! Transform pack: per-node model matrices plus the shared view and projection.

use glam::{Mat4, Vec3, Vec4};

use crate::error::{check_id, IdKind, RasterError, Result};
use crate::types::NodeId;

#[derive(Debug, Clone)]
pub struct TransformPack {
    projection: Mat4,
    view_3d: Mat4,
    view_2d: Mat4,
    /// Slot 0 is the identity node.
    models: Vec<Mat4>,
    capacity: usize,
}

impl TransformPack {
    pub fn new(capacity: usize) -> Self {
        Self {
            projection: Mat4::IDENTITY,
            view_3d: Mat4::IDENTITY,
            view_2d: Mat4::IDENTITY,
            models: vec![Mat4::IDENTITY],
            capacity: capacity.max(1),
        }
    }

    pub fn add_node_transform(&mut self, model: Mat4) -> Result<NodeId> {
        if self.models.len() >= self.capacity {
            return Err(RasterError::CapacityExceeded {
                store: "transform pack",
                capacity: self.capacity,
            });
        }
        self.models.push(model);
        Ok((self.models.len() - 1) as NodeId)
    }

    /// Replace a node's model matrix. Slot 0 stays the identity.
    pub fn set_node_transform(&mut self, id: NodeId, model: Mat4) -> Result<()> {
        if id == 0 {
            return Err(RasterError::invalid(IdKind::Node, id, self.models.len()));
        }
        check_id(IdKind::Node, id, self.models.len())?;
        self.models[id as usize] = model;
        Ok(())
    }

    /// Model matrix for `id`; unknown ids resolve to the identity.
    #[inline]
    pub fn model(&self, id: NodeId) -> Mat4 {
        self.models.get(id as usize).copied().unwrap_or(Mat4::IDENTITY)
    }

    pub fn set_view_matrix_3d(&mut self, view: Mat4) {
        self.view_3d = view;
    }

    pub fn set_view_matrix_2d(&mut self, view: Mat4) {
        self.view_2d = view;
    }

    pub fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
    }

    pub fn view_3d(&self) -> Mat4 {
        self.view_3d
    }

    pub fn view_2d(&self) -> Mat4 {
        self.view_2d
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn node_count(&self) -> usize {
        self.models.len()
    }
}

/// 2D view that maps cell coordinates onto NDC.
///
/// `(0, 0)` lands on the top-left corner of the grid and `(width, height)` on
/// the bottom-right; z passes through unchanged.
pub fn pixel_space_2d(width: u16, height: u16) -> Mat4 {
    let w = width.max(1) as f32;
    let h = height.max(1) as f32;
    Mat4::from_cols(
        Vec4::new(2.0 / w, 0.0, 0.0, 0.0),
        Vec4::new(0.0, -2.0 / h, 0.0, 0.0),
        Vec4::new(0.0, 0.0, 1.0, 0.0),
        Vec4::new(-1.0, 1.0, 0.0, 1.0),
    )
}

/// NDC to cell coordinates: x right, y down, depth unchanged.
#[inline]
pub fn ndc_to_pixel(ndc: Vec3, width: u16, height: u16) -> Vec3 {
    Vec3::new(
        (ndc.x + 1.0) * 0.5 * width as f32,
        (1.0 - ndc.y) * 0.5 * height as f32,
        ndc.z,
    )
}

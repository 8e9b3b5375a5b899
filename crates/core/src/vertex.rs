//! Vertex buffer: source/transformed vertex pools, UV triples, triangle records.
//!
//! Per-vertex data is stored structure-of-arrays. Each pool keeps the
//! untransformed source next to the transformed result so the model·view
//! pass can be rerun every frame without touching the scene graph.

use std::ops::Range;

use glam::{Vec2, Vec3, Vec4};

use crate::config::Capacities;
use crate::error::{check_id, IdKind, RasterError, Result};
use crate::transform::TransformPack;
use crate::types::NodeId;

/// Contiguous run of records: `start .. start + count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: u32,
    pub count: u32,
}

impl Span {
    pub const fn new(start: u32, count: u32) -> Self {
        Self { start, count }
    }

    pub fn end(&self) -> u32 {
        self.start.saturating_add(self.count)
    }

    pub fn range(&self) -> Range<usize> {
        self.start as usize..self.end() as usize
    }

    pub fn contains(&self, index: u32) -> bool {
        index >= self.start && index < self.end()
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Which vertex pool a record lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Space {
    TwoD,
    ThreeD,
}

impl Space {
    fn id_kind(&self) -> IdKind {
        match self {
            Space::TwoD => IdKind::Vertex2D,
            Space::ThreeD => IdKind::Vertex3D,
        }
    }
}

/// Three (u, v) pairs, one per triangle corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UvTriple(pub [Vec2; 3]);

impl UvTriple {
    pub fn new(a: Vec2, b: Vec2, c: Vec2) -> Self {
        Self([a, b, c])
    }

    /// Weighted sum of the three corners.
    #[inline]
    pub fn interpolate(&self, weights: [f32; 3]) -> Vec2 {
        self.0[0] * weights[0] + self.0[1] * weights[1] + self.0[2] * weights[2]
    }
}

/// Indexed triangle: three absolute vertex indices into one pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleRecord {
    pub space: Space,
    pub indices: [u32; 3],
    pub uv: u32,
    /// Unit normal of the source triangle.
    pub normal: Vec3,
}

#[derive(Debug, Clone)]
struct Pool {
    source: Vec<Vec4>,
    transformed: Vec<Vec4>,
    capacity: usize,
    name: &'static str,
}

impl Pool {
    fn new(capacity: usize, name: &'static str) -> Self {
        Self {
            source: Vec::new(),
            transformed: Vec::new(),
            capacity,
            name,
        }
    }

    fn push_all(&mut self, points: &[Vec3]) -> Result<Span> {
        if self.source.len() + points.len() > self.capacity {
            return Err(RasterError::CapacityExceeded {
                store: self.name,
                capacity: self.capacity,
            });
        }
        let start = self.source.len() as u32;
        for p in points {
            let v = p.extend(1.0);
            self.source.push(v);
            self.transformed.push(v);
        }
        Ok(Span::new(start, points.len() as u32))
    }

    fn transform(&mut self, matrix: glam::Mat4, span: Span) {
        let end = (span.end() as usize).min(self.source.len());
        let start = (span.start as usize).min(end);
        for (dst, src) in self.transformed[start..end]
            .iter_mut()
            .zip(&self.source[start..end])
        {
            *dst = matrix * *src;
        }
    }
}

#[derive(Debug, Clone)]
pub struct VertexBuffer {
    pool_3d: Pool,
    pool_2d: Pool,
    uvs: Vec<UvTriple>,
    uv_capacity: usize,
    triangles: Vec<TriangleRecord>,
    triangle_capacity: usize,
}

impl VertexBuffer {
    pub fn new(capacities: &Capacities) -> Self {
        Self {
            pool_3d: Pool::new(capacities.vertices_3d, "3d vertex pool"),
            pool_2d: Pool::new(capacities.vertices_2d, "2d vertex pool"),
            uvs: Vec::new(),
            uv_capacity: capacities.uv_triples,
            triangles: Vec::new(),
            triangle_capacity: capacities.triangles,
        }
    }

    pub fn add_vertex_3d(&mut self, position: Vec3) -> Result<u32> {
        self.pool_3d.push_all(&[position]).map(|s| s.start)
    }

    /// Append several 3D vertices; all or nothing.
    pub fn add_vertices_3d(&mut self, positions: &[Vec3]) -> Result<Span> {
        self.pool_3d.push_all(positions)
    }

    /// Append a 2D vertex; `z` is its depth within the 2D plane stack.
    pub fn add_vertex_2d(&mut self, position: Vec2, z: f32) -> Result<u32> {
        self.pool_2d.push_all(&[position.extend(z)]).map(|s| s.start)
    }

    /// Append several 2D vertices given as (x, y, z); all or nothing.
    pub fn add_vertices_2d(&mut self, positions: &[Vec3]) -> Result<Span> {
        self.pool_2d.push_all(positions)
    }

    pub fn add_uv_triple(&mut self, uv: UvTriple) -> Result<u32> {
        self.add_uv_triples(&[uv]).map(|s| s.start)
    }

    /// Append several UV triples; all or nothing.
    pub fn add_uv_triples(&mut self, uvs: &[UvTriple]) -> Result<Span> {
        if self.uvs.len() + uvs.len() > self.uv_capacity {
            return Err(RasterError::CapacityExceeded {
                store: "uv triple pool",
                capacity: self.uv_capacity,
            });
        }
        let start = self.uvs.len() as u32;
        self.uvs.extend_from_slice(uvs);
        Ok(Span::new(start, uvs.len() as u32))
    }

    /// Append an indexed triangle. The normal is computed from the source positions.
    pub fn add_triangle(&mut self, space: Space, indices: [u32; 3], uv: u32) -> Result<u32> {
        if self.triangles.len() >= self.triangle_capacity {
            return Err(RasterError::CapacityExceeded {
                store: "triangle pool",
                capacity: self.triangle_capacity,
            });
        }
        let pool = self.pool(space);
        for &i in &indices {
            check_id(space.id_kind(), i, pool.source.len())?;
        }
        check_id(IdKind::UvTriple, uv, self.uvs.len())?;

        let [a, b, c] = indices.map(|i| pool.source[i as usize].truncate());
        let normal = (b - a).cross(c - a).normalize_or_zero();
        if normal == Vec3::ZERO {
            return Err(RasterError::DegenerateGeometry("zero-area triangle record"));
        }

        self.triangles.push(TriangleRecord {
            space,
            indices,
            uv,
            normal,
        });
        Ok((self.triangles.len() - 1) as u32)
    }

    /// `transformed[i] = view_3d · model[node] · source[i]` over `span` of the 3D pool.
    pub fn apply_model_view_3d(&mut self, transforms: &TransformPack, node: NodeId, span: Span) {
        let matrix = transforms.view_3d() * transforms.model(node);
        self.pool_3d.transform(matrix, span);
    }

    /// `transformed[i] = view_2d · model[node] · source[i]` over `span` of the 2D pool.
    pub fn apply_model_view_2d(&mut self, transforms: &TransformPack, node: NodeId, span: Span) {
        let matrix = transforms.view_2d() * transforms.model(node);
        self.pool_2d.transform(matrix, span);
    }

    pub fn apply_model_view(&mut self, space: Space, transforms: &TransformPack, node: NodeId, span: Span) {
        match space {
            Space::TwoD => self.apply_model_view_2d(transforms, node, span),
            Space::ThreeD => self.apply_model_view_3d(transforms, node, span),
        }
    }

    /// Overwrite the source position of an existing 3D vertex.
    pub fn set_vertex_3d(&mut self, index: u32, position: Vec3) -> Result<()> {
        check_id(IdKind::Vertex3D, index, self.pool_3d.source.len())?;
        self.pool_3d.source[index as usize] = position.extend(1.0);
        Ok(())
    }

    /// Overwrite the source position of an existing 2D vertex.
    pub fn set_vertex_2d(&mut self, index: u32, position: Vec2, z: f32) -> Result<()> {
        check_id(IdKind::Vertex2D, index, self.pool_2d.source.len())?;
        self.pool_2d.source[index as usize] = position.extend(z).extend(1.0);
        Ok(())
    }

    pub fn source(&self, space: Space, index: u32) -> Option<Vec4> {
        self.pool(space).source.get(index as usize).copied()
    }

    pub fn transformed(&self, space: Space, index: u32) -> Option<Vec4> {
        self.pool(space).transformed.get(index as usize).copied()
    }

    pub fn uv_triple(&self, index: u32) -> Option<&UvTriple> {
        self.uvs.get(index as usize)
    }

    pub fn triangle(&self, index: u32) -> Option<&TriangleRecord> {
        self.triangles.get(index as usize)
    }

    pub fn len(&self, space: Space) -> usize {
        self.pool(space).source.len()
    }

    pub fn uv_len(&self) -> usize {
        self.uvs.len()
    }

    pub fn triangle_len(&self) -> usize {
        self.triangles.len()
    }

    fn pool(&self, space: Space) -> &Pool {
        match space {
            Space::TwoD => &self.pool_2d,
            Space::ThreeD => &self.pool_3d,
        }
    }
}

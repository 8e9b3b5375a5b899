//! Primitive buffer and the geometry → primitive expansion.
//!
//! The buffer is cleared and refilled every frame. Primitive ids are the
//! insertion index, so they are dense and start at 0 each frame.

use glam::{Mat4, Vec4};

use crate::drawing::DrawingBuffer;
use crate::error::DropReason;
use crate::geometry::{Geometry, GeometryBuffer, GeometryKind};
use crate::transform::{ndc_to_pixel, TransformPack};
use crate::types::{GeometryId, MaterialId, NodeId, PrimitiveId, INVALID_ID};
use crate::vertex::{Space, VertexBuffer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Point,
    Line,
    Triangle,
}

impl PrimitiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::Point => "point",
            PrimitiveKind::Line => "line",
            PrimitiveKind::Triangle => "triangle",
        }
    }
}

/// Vertex in cell coordinates. `z` is the post-divide depth, `w` the clip-space w.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenVertex {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for ScreenVertex {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

impl ScreenVertex {
    /// Vertex without perspective (w = 1).
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z, w: 1.0 }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.w.is_finite()
    }
}

/// Ids a primitive inherits from the record that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimitiveSource {
    pub geometry_id: GeometryId,
    pub node_id: NodeId,
    pub material_id: MaterialId,
    /// UV triple resolved from the geometry, or `INVALID_ID`.
    pub uv: u32,
}

impl PrimitiveSource {
    /// Source for a primitive that is not backed by a geometry record.
    pub const fn material(material_id: MaterialId) -> Self {
        Self {
            geometry_id: 0,
            node_id: 0,
            material_id,
            uv: INVALID_ID,
        }
    }

    pub const fn with_uv(mut self, uv: u32) -> Self {
        self.uv = uv;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Primitive {
    pub kind: PrimitiveKind,
    /// Points repeat vertex 0; lines repeat vertex 1.
    pub vertices: [ScreenVertex; 3],
    pub geometry_id: GeometryId,
    pub node_id: NodeId,
    pub material_id: MaterialId,
    pub primitive_id: PrimitiveId,
    pub uv: u32,
}

/// Fixed-capacity per-frame primitive list.
#[derive(Debug, Clone)]
pub struct PrimitiveBuffer {
    prims: Vec<Primitive>,
    capacity: usize,
}

impl PrimitiveBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            prims: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Drop all primitives; the next id handed out is 0.
    pub fn clear(&mut self) {
        self.prims.clear();
    }

    /// Append a primitive, assigning the next id. `None` when full.
    pub fn push(
        &mut self,
        kind: PrimitiveKind,
        vertices: [ScreenVertex; 3],
        source: PrimitiveSource,
    ) -> Option<PrimitiveId> {
        if self.prims.len() >= self.capacity {
            return None;
        }
        let primitive_id = self.prims.len() as PrimitiveId;
        self.prims.push(Primitive {
            kind,
            vertices,
            geometry_id: source.geometry_id,
            node_id: source.node_id,
            material_id: source.material_id,
            primitive_id,
            uv: source.uv,
        });
        Some(primitive_id)
    }

    pub fn push_point(&mut self, v: ScreenVertex, source: PrimitiveSource) -> Option<PrimitiveId> {
        self.push(PrimitiveKind::Point, [v, v, v], source)
    }

    pub fn push_line(
        &mut self,
        a: ScreenVertex,
        b: ScreenVertex,
        source: PrimitiveSource,
    ) -> Option<PrimitiveId> {
        self.push(PrimitiveKind::Line, [a, b, b], source)
    }

    pub fn push_triangle(
        &mut self,
        a: ScreenVertex,
        b: ScreenVertex,
        c: ScreenVertex,
        source: PrimitiveSource,
    ) -> Option<PrimitiveId> {
        self.push(PrimitiveKind::Triangle, [a, b, c], source)
    }

    pub fn get(&self, id: PrimitiveId) -> Option<&Primitive> {
        self.prims.get(id as usize)
    }

    pub fn as_slice(&self) -> &[Primitive] {
        &self.prims
    }

    pub fn iter(&self) -> impl Iterator<Item = &Primitive> {
        self.prims.iter()
    }

    pub fn len(&self) -> usize {
        self.prims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prims.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Counters from one [`build_primitives`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub emitted: u32,
    pub degenerate: u32,
    pub out_of_frustum: u32,
    pub overflow: u32,
}

impl BuildStats {
    fn record_drop(&mut self, reason: DropReason) {
        match reason {
            DropReason::Degenerate => self.degenerate += 1,
            DropReason::OutOfFrustum => self.out_of_frustum += 1,
            DropReason::CapacityExceeded => self.overflow += 1,
        }
    }

    pub fn dropped(&self) -> u32 {
        self.degenerate + self.out_of_frustum + self.overflow
    }
}

/// Expand every geometry record into screen-space primitives.
///
/// Runs model·view over each record's vertex range, projects 3D vertices,
/// divides by w, maps NDC to cells, and appends points, lines and triangles.
/// Culled and degenerate primitives are counted, never reported as errors.
pub fn build_primitives(
    geometry: &GeometryBuffer,
    vertices: &mut VertexBuffer,
    transforms: &TransformPack,
    drawing: &DrawingBuffer,
    primitives: &mut PrimitiveBuffer,
    log_dropped: bool,
) -> BuildStats {
    primitives.clear();
    let mut stats = BuildStats::default();

    for (geometry_id, g) in geometry.iter() {
        if g.vertices.is_empty() {
            continue;
        }
        let space = g.space();
        vertices.apply_model_view(space, transforms, g.node_id, g.vertices);

        let expander = Expander {
            vertices,
            space,
            projection: transforms.projection(),
            width: drawing.width(),
            height: drawing.height(),
            log_dropped,
        };
        expander.expand(geometry_id, g, primitives, &mut stats);
    }

    if stats.overflow > 0 {
        log::warn!(
            "primitive buffer full ({}), dropped {} primitives",
            primitives.capacity(),
            stats.overflow
        );
    }
    stats
}

struct Expander<'a> {
    vertices: &'a VertexBuffer,
    space: Space,
    projection: Mat4,
    width: u16,
    height: u16,
    log_dropped: bool,
}

impl Expander<'_> {
    fn expand(
        &self,
        geometry_id: GeometryId,
        g: &Geometry,
        out: &mut PrimitiveBuffer,
        stats: &mut BuildStats,
    ) {
        let source = |uv: u32| PrimitiveSource {
            geometry_id,
            node_id: g.node_id,
            material_id: g.material_id,
            uv,
        };
        let s = g.vertices.start;
        let n = g.vertices.count;

        match g.kind {
            GeometryKind::Point2D | GeometryKind::Point3D => {
                self.emit(PrimitiveKind::Point, [s, s, s], source(g.uv_for(0)), out, stats);
            }
            GeometryKind::Points2D => {
                for i in s..s + n {
                    self.emit(PrimitiveKind::Point, [i, i, i], source(g.uv_for(0)), out, stats);
                }
            }
            GeometryKind::Line2D | GeometryKind::Line3D => {
                self.emit(PrimitiveKind::Line, [s, s + 1, s + 1], source(g.uv_for(0)), out, stats);
            }
            GeometryKind::Rect2D => {
                self.emit(PrimitiveKind::Triangle, [s, s + 1, s + 2], source(g.uv_for(0)), out, stats);
                self.emit(PrimitiveKind::Triangle, [s, s + 2, s + 3], source(g.uv_for(1)), out, stats);
            }
            GeometryKind::Polygon2D | GeometryKind::Polygon3D => match g.triangles {
                Some(tris) => {
                    for t in tris.start..tris.end() {
                        if let Some(record) = self.vertices.triangle(t) {
                            self.emit(PrimitiveKind::Triangle, record.indices, source(record.uv), out, stats);
                        }
                    }
                }
                None => {
                    for i in 1..n.saturating_sub(1) {
                        let corners = [s, s + i, s + i + 1];
                        self.emit(PrimitiveKind::Triangle, corners, source(g.uv_for(i - 1)), out, stats);
                    }
                }
            },
            GeometryKind::PolygonFan2D | GeometryKind::PolygonFan3D => {
                let rim = n.saturating_sub(1);
                // Two rim vertices make a single triangle; closing the ring would repeat it.
                let count = if rim >= 3 { rim } else { rim.min(1) };
                for i in 0..count {
                    let corners = [s, s + 1 + i, s + 1 + (i + 1) % rim];
                    self.emit(PrimitiveKind::Triangle, corners, source(g.uv_for(i)), out, stats);
                }
            }
        }
    }

    fn emit(
        &self,
        kind: PrimitiveKind,
        corners: [u32; 3],
        source: PrimitiveSource,
        out: &mut PrimitiveBuffer,
        stats: &mut BuildStats,
    ) {
        let used = match kind {
            PrimitiveKind::Point => 1,
            PrimitiveKind::Line => 2,
            PrimitiveKind::Triangle => 3,
        };
        let clips = corners.map(|i| self.clip(i));

        let verdict = if outside_frustum(&clips[..used]) {
            Err(DropReason::OutOfFrustum)
        } else {
            let sv = clips.map(|c| self.screen(c));
            check_shape(kind, &sv).map(|()| sv)
        };

        match verdict {
            Ok(sv) => match out.push(kind, sv, source) {
                Some(_) => stats.emitted += 1,
                None => stats.record_drop(DropReason::CapacityExceeded),
            },
            Err(reason) => {
                stats.record_drop(reason);
                if self.log_dropped {
                    log::debug!(
                        "dropped {} from geometry {}: {}",
                        kind.as_str(),
                        source.geometry_id,
                        reason.as_str()
                    );
                }
            }
        }
    }

    #[inline]
    fn clip(&self, index: u32) -> Vec4 {
        let v = self
            .vertices
            .transformed(self.space, index)
            .unwrap_or(Vec4::new(f32::NAN, f32::NAN, f32::NAN, f32::NAN));
        match self.space {
            // The 2D view maps straight into clip space.
            Space::TwoD => v,
            Space::ThreeD => self.projection * v,
        }
    }

    #[inline]
    fn screen(&self, clip: Vec4) -> ScreenVertex {
        let p = ndc_to_pixel(clip.truncate() / clip.w, self.width, self.height);
        ScreenVertex {
            x: p.x,
            y: p.y,
            z: p.z,
            w: clip.w,
        }
    }
}

/// True when every vertex is behind the eye or all lie strictly outside one
/// clip half-space (zero-to-one depth).
fn outside_frustum(clips: &[Vec4]) -> bool {
    let all = |test: fn(&Vec4) -> bool| clips.iter().all(test);
    all(|c| c.w <= 0.0)
        || all(|c| c.x < -c.w)
        || all(|c| c.x > c.w)
        || all(|c| c.y < -c.w)
        || all(|c| c.y > c.w)
        || all(|c| c.z < 0.0)
        || all(|c| c.z > c.w)
}

fn check_shape(kind: PrimitiveKind, sv: &[ScreenVertex; 3]) -> Result<(), DropReason> {
    let [a, b, c] = sv;
    match kind {
        PrimitiveKind::Point if a.is_finite() => Ok(()),
        PrimitiveKind::Line if a.is_finite() && b.is_finite() && (a.x != b.x || a.y != b.y) => {
            Ok(())
        }
        PrimitiveKind::Triangle if a.is_finite() && b.is_finite() && c.is_finite() => {
            let area = signed_area(a, b, c);
            if area != 0.0 && area.is_finite() {
                Ok(())
            } else {
                Err(DropReason::Degenerate)
            }
        }
        _ => Err(DropReason::Degenerate),
    }
}

/// Twice the signed area of the screen-space triangle.
#[inline]
pub fn signed_area(a: &ScreenVertex, b: &ScreenVertex, c: &ScreenVertex) -> f32 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

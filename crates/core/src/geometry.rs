//! Geometry buffer: typed records that reference vertex-buffer ranges.
//!
//! A record never owns vertex data. It names a range of one vertex pool, the
//! first UV triple it consumes, an optional range of triangle records, the
//! node whose model matrix moves it, and the material that shades it.

use crate::error::{check_id, IdKind, RasterError, Result};
use crate::types::{GeometryId, MaterialId, NodeId, INVALID_ID};
use crate::vertex::{Space, Span, VertexBuffer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point2D,
    Point3D,
    /// One point primitive per vertex.
    Points2D,
    Line2D,
    Line3D,
    /// Four corners in order; split into (0,1,2) and (0,2,3).
    Rect2D,
    /// Convex polygon fanned from its first vertex, or an indexed mesh.
    Polygon2D,
    Polygon3D,
    /// First vertex is the centre of a closed ring of triangles.
    PolygonFan2D,
    PolygonFan3D,
}

impl GeometryKind {
    pub fn space(&self) -> Space {
        match self {
            GeometryKind::Point2D
            | GeometryKind::Points2D
            | GeometryKind::Line2D
            | GeometryKind::Rect2D
            | GeometryKind::Polygon2D
            | GeometryKind::PolygonFan2D => Space::TwoD,
            GeometryKind::Point3D
            | GeometryKind::Line3D
            | GeometryKind::Polygon3D
            | GeometryKind::PolygonFan3D => Space::ThreeD,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryKind::Point2D => "point_2d",
            GeometryKind::Point3D => "point_3d",
            GeometryKind::Points2D => "points_2d",
            GeometryKind::Line2D => "line_2d",
            GeometryKind::Line3D => "line_3d",
            GeometryKind::Rect2D => "rect_2d",
            GeometryKind::Polygon2D => "polygon_2d",
            GeometryKind::Polygon3D => "polygon_3d",
            GeometryKind::PolygonFan2D => "polygon_fan_2d",
            GeometryKind::PolygonFan3D => "polygon_fan_3d",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub kind: GeometryKind,
    pub vertices: Span,
    /// First UV triple, or `INVALID_ID` for geometry without UVs.
    pub uv_start: u32,
    /// Triangle records for indexed polygons.
    pub triangles: Option<Span>,
    pub node_id: NodeId,
    pub material_id: MaterialId,
}

impl Geometry {
    pub fn new(kind: GeometryKind, vertices: Span) -> Self {
        Self {
            kind,
            vertices,
            uv_start: INVALID_ID,
            triangles: None,
            node_id: 0,
            material_id: 0,
        }
    }

    pub fn with_uv_start(mut self, uv_start: u32) -> Self {
        self.uv_start = uv_start;
        self
    }

    pub fn with_triangles(mut self, triangles: Span) -> Self {
        self.triangles = Some(triangles);
        self
    }

    pub fn with_node(mut self, node_id: NodeId) -> Self {
        self.node_id = node_id;
        self
    }

    pub fn with_material(mut self, material_id: MaterialId) -> Self {
        self.material_id = material_id;
        self
    }

    pub fn space(&self) -> Space {
        self.kind.space()
    }

    /// Number of UV triples this record consumes from `uv_start`.
    pub fn uv_triples_needed(&self) -> u32 {
        if self.triangles.is_some() {
            return 0;
        }
        match self.kind {
            GeometryKind::Point2D
            | GeometryKind::Point3D
            | GeometryKind::Points2D
            | GeometryKind::Line2D
            | GeometryKind::Line3D => 1,
            GeometryKind::Rect2D => 2,
            GeometryKind::Polygon2D | GeometryKind::Polygon3D => self.vertices.count.saturating_sub(2),
            GeometryKind::PolygonFan2D | GeometryKind::PolygonFan3D => {
                self.vertices.count.saturating_sub(1)
            }
        }
    }

    /// UV triple for the `n`th triangle of a non-indexed record.
    pub fn uv_for(&self, n: u32) -> u32 {
        if self.uv_start == INVALID_ID {
            INVALID_ID
        } else {
            self.uv_start + n
        }
    }

    fn background() -> Self {
        Geometry::new(GeometryKind::Point2D, Span::default())
    }
}

/// Read-only view of the stores a geometry record may reference.
#[derive(Debug, Clone, Copy)]
pub struct GeometryContext<'a> {
    pub vertices: &'a VertexBuffer,
    pub materials: usize,
    pub nodes: usize,
}

#[derive(Debug, Clone)]
pub struct GeometryBuffer {
    records: Vec<Geometry>,
    capacity: usize,
}

impl GeometryBuffer {
    /// Create a buffer holding only the background sentinel (geometry 0).
    pub fn new(capacity: usize) -> Self {
        let mut records = Vec::new();
        records.push(Geometry::background());
        Self {
            records,
            capacity: capacity.max(1),
        }
    }

    /// Validate and append a record.
    pub fn add(&mut self, geometry: Geometry, ctx: &GeometryContext<'_>) -> Result<GeometryId> {
        if self.records.len() >= self.capacity {
            return Err(RasterError::CapacityExceeded {
                store: "geometry buffer",
                capacity: self.capacity,
            });
        }
        validate(&geometry, ctx)?;
        self.records.push(geometry);
        Ok((self.records.len() - 1) as GeometryId)
    }

    pub fn add_point_2d(
        &mut self,
        ctx: &GeometryContext<'_>,
        vertex: u32,
        uv_start: u32,
        node: NodeId,
        material: MaterialId,
    ) -> Result<GeometryId> {
        self.add_simple(ctx, GeometryKind::Point2D, Span::new(vertex, 1), uv_start, node, material)
    }

    pub fn add_point_3d(
        &mut self,
        ctx: &GeometryContext<'_>,
        vertex: u32,
        uv_start: u32,
        node: NodeId,
        material: MaterialId,
    ) -> Result<GeometryId> {
        self.add_simple(ctx, GeometryKind::Point3D, Span::new(vertex, 1), uv_start, node, material)
    }

    pub fn add_points_2d(
        &mut self,
        ctx: &GeometryContext<'_>,
        vertices: Span,
        uv_start: u32,
        node: NodeId,
        material: MaterialId,
    ) -> Result<GeometryId> {
        self.add_simple(ctx, GeometryKind::Points2D, vertices, uv_start, node, material)
    }

    pub fn add_line_2d(
        &mut self,
        ctx: &GeometryContext<'_>,
        vertices: Span,
        uv_start: u32,
        node: NodeId,
        material: MaterialId,
    ) -> Result<GeometryId> {
        self.add_simple(ctx, GeometryKind::Line2D, vertices, uv_start, node, material)
    }

    pub fn add_line_3d(
        &mut self,
        ctx: &GeometryContext<'_>,
        vertices: Span,
        uv_start: u32,
        node: NodeId,
        material: MaterialId,
    ) -> Result<GeometryId> {
        self.add_simple(ctx, GeometryKind::Line3D, vertices, uv_start, node, material)
    }

    pub fn add_rect_2d(
        &mut self,
        ctx: &GeometryContext<'_>,
        vertices: Span,
        uv_start: u32,
        node: NodeId,
        material: MaterialId,
    ) -> Result<GeometryId> {
        self.add_simple(ctx, GeometryKind::Rect2D, vertices, uv_start, node, material)
    }

    pub fn add_polygon_2d(
        &mut self,
        ctx: &GeometryContext<'_>,
        vertices: Span,
        uv_start: u32,
        node: NodeId,
        material: MaterialId,
    ) -> Result<GeometryId> {
        self.add_simple(ctx, GeometryKind::Polygon2D, vertices, uv_start, node, material)
    }

    pub fn add_polygon_3d(
        &mut self,
        ctx: &GeometryContext<'_>,
        vertices: Span,
        uv_start: u32,
        node: NodeId,
        material: MaterialId,
    ) -> Result<GeometryId> {
        self.add_simple(ctx, GeometryKind::Polygon3D, vertices, uv_start, node, material)
    }

    pub fn add_polygon_fan_2d(
        &mut self,
        ctx: &GeometryContext<'_>,
        vertices: Span,
        uv_start: u32,
        node: NodeId,
        material: MaterialId,
    ) -> Result<GeometryId> {
        self.add_simple(ctx, GeometryKind::PolygonFan2D, vertices, uv_start, node, material)
    }

    pub fn add_polygon_fan_3d(
        &mut self,
        ctx: &GeometryContext<'_>,
        vertices: Span,
        uv_start: u32,
        node: NodeId,
        material: MaterialId,
    ) -> Result<GeometryId> {
        self.add_simple(ctx, GeometryKind::PolygonFan3D, vertices, uv_start, node, material)
    }

    /// Indexed 2D polygon: one triangle per record in `triangles`.
    pub fn add_indexed_mesh_2d(
        &mut self,
        ctx: &GeometryContext<'_>,
        vertices: Span,
        triangles: Span,
        node: NodeId,
        material: MaterialId,
    ) -> Result<GeometryId> {
        let g = Geometry::new(GeometryKind::Polygon2D, vertices)
            .with_triangles(triangles)
            .with_node(node)
            .with_material(material);
        self.add(g, ctx)
    }

    /// Indexed 3D polygon: one triangle per record in `triangles`.
    pub fn add_indexed_mesh_3d(
        &mut self,
        ctx: &GeometryContext<'_>,
        vertices: Span,
        triangles: Span,
        node: NodeId,
        material: MaterialId,
    ) -> Result<GeometryId> {
        let g = Geometry::new(GeometryKind::Polygon3D, vertices)
            .with_triangles(triangles)
            .with_node(node)
            .with_material(material);
        self.add(g, ctx)
    }

    fn add_simple(
        &mut self,
        ctx: &GeometryContext<'_>,
        kind: GeometryKind,
        vertices: Span,
        uv_start: u32,
        node: NodeId,
        material: MaterialId,
    ) -> Result<GeometryId> {
        let g = Geometry::new(kind, vertices)
            .with_uv_start(uv_start)
            .with_node(node)
            .with_material(material);
        self.add(g, ctx)
    }

    /// Rebind a record to another material without rewriting it.
    pub fn update_geometry_material(
        &mut self,
        id: GeometryId,
        material: MaterialId,
        materials: usize,
    ) -> Result<()> {
        check_id(IdKind::Geometry, id, self.records.len())?;
        check_id(IdKind::Material, material, materials)?;
        self.records[id as usize].material_id = material;
        Ok(())
    }

    pub fn get(&self, id: GeometryId) -> Option<&Geometry> {
        self.records.get(id as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = (GeometryId, &Geometry)> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, g)| (i as GeometryId, g))
    }

    /// Number of records, including the sentinel.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.len() <= 1
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

fn validate(g: &Geometry, ctx: &GeometryContext<'_>) -> Result<()> {
    let count = g.vertices.count;
    let count_ok = match g.kind {
        GeometryKind::Point2D | GeometryKind::Point3D => count == 1,
        GeometryKind::Points2D => count >= 1,
        GeometryKind::Line2D | GeometryKind::Line3D => count == 2,
        GeometryKind::Rect2D => count == 4,
        GeometryKind::Polygon2D
        | GeometryKind::Polygon3D
        | GeometryKind::PolygonFan2D
        | GeometryKind::PolygonFan3D => count >= 3,
    };
    if !count_ok {
        return Err(RasterError::DegenerateGeometry(match g.kind {
            GeometryKind::Point2D | GeometryKind::Point3D => "point needs exactly one vertex",
            GeometryKind::Points2D => "point list needs at least one vertex",
            GeometryKind::Line2D | GeometryKind::Line3D => "line needs exactly two vertices",
            GeometryKind::Rect2D => "rect needs exactly four vertices",
            _ => "polygon needs at least three vertices",
        }));
    }

    let space = g.space();
    let pool_len = ctx.vertices.len(space);
    let vertex_kind = match space {
        Space::TwoD => IdKind::Vertex2D,
        Space::ThreeD => IdKind::Vertex3D,
    };
    if g.vertices.end() as usize > pool_len {
        return Err(RasterError::invalid(vertex_kind, g.vertices.end() - 1, pool_len));
    }

    if let Some(tris) = g.triangles {
        if !matches!(g.kind, GeometryKind::Polygon2D | GeometryKind::Polygon3D) {
            return Err(RasterError::DegenerateGeometry(
                "only polygons may carry triangle records",
            ));
        }
        if tris.is_empty() {
            return Err(RasterError::DegenerateGeometry("indexed polygon without triangles"));
        }
        if tris.end() as usize > ctx.vertices.triangle_len() {
            return Err(RasterError::invalid(
                IdKind::Triangle,
                tris.end() - 1,
                ctx.vertices.triangle_len(),
            ));
        }
        for t in tris.start..tris.end() {
            let Some(record) = ctx.vertices.triangle(t) else {
                return Err(RasterError::invalid(IdKind::Triangle, t, ctx.vertices.triangle_len()));
            };
            if record.space != space {
                return Err(RasterError::DegenerateGeometry(
                    "triangle record belongs to the other vertex pool",
                ));
            }
            // apply_model_view only refreshes the record's own range.
            if let Some(&i) = record.indices.iter().find(|&&i| !g.vertices.contains(i)) {
                return Err(RasterError::invalid(vertex_kind, i, pool_len));
            }
        }
    } else if g.uv_start != INVALID_ID {
        let needed = g.uv_triples_needed();
        let end = g.uv_start.saturating_add(needed);
        if end as usize > ctx.vertices.uv_len() {
            return Err(RasterError::invalid(
                IdKind::UvTriple,
                end.saturating_sub(1),
                ctx.vertices.uv_len(),
            ));
        }
    }

    check_id(IdKind::Node, g.node_id, ctx.nodes)?;
    check_id(IdKind::Material, g.material_id, ctx.materials)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Capacities;
    use crate::vertex::UvTriple;
    use glam::Vec3;

    fn vertices() -> VertexBuffer {
        let mut vb = VertexBuffer::new(&Capacities::default());
        vb.add_vertices_2d(&[
            Vec3::new(0.0, 0.0, 0.5),
            Vec3::new(4.0, 0.0, 0.5),
            Vec3::new(4.0, 4.0, 0.5),
            Vec3::new(0.0, 4.0, 0.5),
        ])
        .unwrap();
        vb.add_uv_triples(&[UvTriple::default(), UvTriple::default()])
            .unwrap();
        vb
    }

    #[test]
    fn sentinel_occupies_id_zero() {
        let buf = GeometryBuffer::new(4);
        assert_eq!(buf.len(), 1);
        assert!(buf.is_empty());
        let sentinel = buf.get(0).unwrap();
        assert_eq!(sentinel.kind, GeometryKind::Point2D);
        assert!(sentinel.vertices.is_empty());
    }

    #[test]
    fn adds_validated_records() {
        let vb = vertices();
        let ctx = GeometryContext {
            vertices: &vb,
            materials: 2,
            nodes: 1,
        };
        let mut buf = GeometryBuffer::new(8);

        assert_eq!(buf.add_rect_2d(&ctx, Span::new(0, 4), 0, 0, 1), Ok(1));
        assert_eq!(buf.add_polygon_2d(&ctx, Span::new(0, 4), 0, 0, 0), Ok(2));
        assert_eq!(buf.add_point_2d(&ctx, 3, INVALID_ID, 0, 0), Ok(3));

        // Vertex range past the pool.
        assert!(matches!(
            buf.add_polygon_2d(&ctx, Span::new(2, 3), 0, 0, 0),
            Err(RasterError::InvalidId {
                kind: IdKind::Vertex2D,
                ..
            })
        ));
        // Fan over four vertices needs three triples, only two exist.
        assert!(matches!(
            buf.add_polygon_fan_2d(&ctx, Span::new(0, 4), 0, 0, 0),
            Err(RasterError::InvalidId {
                kind: IdKind::UvTriple,
                ..
            })
        ));
        assert!(matches!(
            buf.add_line_2d(&ctx, Span::new(0, 3), INVALID_ID, 0, 0),
            Err(RasterError::DegenerateGeometry(_))
        ));
        assert!(matches!(
            buf.add_point_2d(&ctx, 0, INVALID_ID, 1, 0),
            Err(RasterError::InvalidId {
                kind: IdKind::Node,
                ..
            })
        ));
        assert!(matches!(
            buf.add_point_2d(&ctx, 0, INVALID_ID, 0, 2),
            Err(RasterError::InvalidId {
                kind: IdKind::Material,
                ..
            })
        ));
        // 3D pool is empty.
        assert!(buf.add_point_3d(&ctx, 0, INVALID_ID, 0, 0).is_err());
    }

    #[test]
    fn indexed_mesh_records_must_stay_inside_the_vertex_range() {
        let mut vb = vertices();
        vb.add_triangle(Space::TwoD, [0, 1, 2], 0).unwrap();
        vb.add_triangle(Space::TwoD, [0, 2, 3], 1).unwrap();
        let ctx = GeometryContext {
            vertices: &vb,
            materials: 1,
            nodes: 1,
        };
        let mut buf = GeometryBuffer::new(8);

        assert_eq!(
            buf.add_indexed_mesh_2d(&ctx, Span::new(0, 4), Span::new(0, 2), 0, 0),
            Ok(1)
        );
        assert!(buf
            .add_indexed_mesh_2d(&ctx, Span::new(0, 3), Span::new(0, 2), 0, 0)
            .is_err());
        assert!(buf
            .add_indexed_mesh_3d(&ctx, Span::new(0, 4), Span::new(0, 2), 0, 0)
            .is_err());
    }

    #[test]
    fn update_geometry_material_rebinds() {
        let vb = vertices();
        let ctx = GeometryContext {
            vertices: &vb,
            materials: 3,
            nodes: 1,
        };
        let mut buf = GeometryBuffer::new(4);
        let id = buf.add_point_2d(&ctx, 0, INVALID_ID, 0, 0).unwrap();

        buf.update_geometry_material(id, 2, 3).unwrap();
        assert_eq!(buf.get(id).unwrap().material_id, 2);
        assert!(buf.update_geometry_material(id, 3, 3).is_err());
        assert!(buf.update_geometry_material(9, 0, 3).is_err());
    }

    #[test]
    fn capacity_counts_the_sentinel() {
        let vb = vertices();
        let ctx = GeometryContext {
            vertices: &vb,
            materials: 1,
            nodes: 1,
        };
        let mut buf = GeometryBuffer::new(2);
        assert!(buf.add_point_2d(&ctx, 0, INVALID_ID, 0, 0).is_ok());
        assert!(matches!(
            buf.add_point_2d(&ctx, 1, INVALID_ID, 0, 0),
            Err(RasterError::CapacityExceeded { .. })
        ));
    }
}

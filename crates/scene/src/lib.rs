//! Scene graph for the rasterizer.
//!
//! Nodes live in an arena and refer to each other by [`NodeHandle`]. A parent
//! is always created before its children, so walking the arena in order visits
//! every parent first and world matrices can be computed in one pass.
//!
//! The graph is the only collaborator that talks to the renderer's stores:
//! [`SceneGraph::sync_into`] uploads new nodes once and afterwards only
//! refreshes transform slots and material bindings.

pub mod assets;

use glam::{Mat4, Vec2, Vec3};
use thiserror::Error;

use termrast_core::{Geometry, GeometryKind, RasterError, Renderer, Space, Span, UvTriple};
use termrast_types::{GeometryId, MaterialId, NodeId, INVALID_ID};

pub use assets::{AssetError, AssetLoader, MemoryAssets, MeshData, TextureData};
pub use termrast_core as core;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SceneError {
    #[error("unknown scene node {0}")]
    UnknownNode(u32),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Raster(#[from] RasterError),
}

pub type Result<T> = std::result::Result<T, SceneError>;

/// Index of a node in the scene arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(u32);

impl NodeHandle {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Transform-only node.
    Group,
    Mesh {
        mesh: MeshData,
        material: MaterialId,
    },
    /// Axis-aligned rectangle in 2D design space, UVs spanning the texture.
    Quad2D {
        min: Vec2,
        max: Vec2,
        z: f32,
        material: MaterialId,
    },
    /// Open polyline, one line segment per consecutive pair.
    Polyline2D {
        points: Vec<Vec2>,
        z: f32,
        material: MaterialId,
    },
    Points2D {
        points: Vec<Vec2>,
        z: f32,
        material: MaterialId,
    },
    Line3D {
        from: Vec3,
        to: Vec3,
        material: MaterialId,
    },
}

impl NodeKind {
    pub fn material(&self) -> Option<MaterialId> {
        match self {
            NodeKind::Group => None,
            NodeKind::Mesh { material, .. }
            | NodeKind::Quad2D { material, .. }
            | NodeKind::Polyline2D { material, .. }
            | NodeKind::Points2D { material, .. }
            | NodeKind::Line3D { material, .. } => Some(*material),
        }
    }

    fn material_mut(&mut self) -> Option<&mut MaterialId> {
        match self {
            NodeKind::Group => None,
            NodeKind::Mesh { material, .. }
            | NodeKind::Quad2D { material, .. }
            | NodeKind::Polyline2D { material, .. }
            | NodeKind::Points2D { material, .. }
            | NodeKind::Line3D { material, .. } => Some(material),
        }
    }
}

/// Renderer-side ids of a synced node.
#[derive(Debug, Clone, Default)]
struct Binding {
    slot: NodeId,
    geometries: Vec<GeometryId>,
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeHandle>,
    children: Vec<NodeHandle>,
    local: Mat4,
    kind: NodeKind,
    binding: Option<Binding>,
    material_dirty: bool,
}

#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    /// Scratch world matrices reused by `sync_into`.
    worlds: Vec<Mat4>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Graph holding only the root group.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                local: Mat4::IDENTITY,
                kind: NodeKind::Group,
                binding: None,
                material_dirty: false,
            }],
            worlds: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeHandle {
        NodeHandle(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn add_child(&mut self, parent: NodeHandle, kind: NodeKind) -> Result<NodeHandle> {
        self.check(parent)?;
        let handle = NodeHandle(self.nodes.len() as u32);
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            local: Mat4::IDENTITY,
            kind,
            binding: None,
            material_dirty: false,
        });
        self.nodes[parent.index()].children.push(handle);
        Ok(handle)
    }

    pub fn set_local(&mut self, node: NodeHandle, local: Mat4) -> Result<()> {
        self.check(node)?;
        self.nodes[node.index()].local = local;
        Ok(())
    }

    pub fn local(&self, node: NodeHandle) -> Result<Mat4> {
        self.check(node)?;
        Ok(self.nodes[node.index()].local)
    }

    /// Rebind a node's material; applied on the next sync. Groups ignore it.
    pub fn set_material(&mut self, node: NodeHandle, material: MaterialId) -> Result<()> {
        self.check(node)?;
        let n = &mut self.nodes[node.index()];
        if let Some(slot) = n.kind.material_mut() {
            *slot = material;
            n.material_dirty = true;
        }
        Ok(())
    }

    pub fn kind(&self, node: NodeHandle) -> Result<&NodeKind> {
        self.check(node)?;
        Ok(&self.nodes[node.index()].kind)
    }

    pub fn children(&self, node: NodeHandle) -> Result<&[NodeHandle]> {
        self.check(node)?;
        Ok(&self.nodes[node.index()].children)
    }

    pub fn parent(&self, node: NodeHandle) -> Result<Option<NodeHandle>> {
        self.check(node)?;
        Ok(self.nodes[node.index()].parent)
    }

    /// Product of the local matrices from the root down to `node`.
    pub fn world_transform(&self, node: NodeHandle) -> Result<Mat4> {
        self.check(node)?;
        let mut world = Mat4::IDENTITY;
        let mut cursor = Some(node);
        while let Some(h) = cursor {
            let n = &self.nodes[h.index()];
            world = n.local * world;
            cursor = n.parent;
        }
        Ok(world)
    }

    /// Transform slot a node was given by the last sync.
    pub fn slot(&self, node: NodeHandle) -> Option<NodeId> {
        self.nodes.get(node.index())?.binding.as_ref().map(|b| b.slot)
    }

    /// Geometry records a node was given by the last sync.
    pub fn geometries(&self, node: NodeHandle) -> &[GeometryId] {
        self.nodes
            .get(node.index())
            .and_then(|n| n.binding.as_ref())
            .map_or(&[], |b| b.geometries.as_slice())
    }

    /// Push the graph into the renderer.
    ///
    /// New nodes get a transform slot and their geometry is uploaded once.
    /// Known nodes only have their world matrix and, when changed, their
    /// material rewritten.
    pub fn sync_into(&mut self, renderer: &mut Renderer) -> Result<()> {
        self.worlds.clear();
        for i in 0..self.nodes.len() {
            let parent_world = match self.nodes[i].parent {
                Some(p) => self.worlds[p.index()],
                None => Mat4::IDENTITY,
            };
            let world = parent_world * self.nodes[i].local;
            self.worlds.push(world);

            let node = &mut self.nodes[i];
            match &node.binding {
                None => {
                    let binding = upload(&node.kind, world, renderer)?;
                    log::debug!(
                        "scene node {} bound to slot {} with {} geometries",
                        i,
                        binding.slot,
                        binding.geometries.len()
                    );
                    node.binding = Some(binding);
                    node.material_dirty = false;
                }
                Some(binding) => {
                    if binding.slot != 0 {
                        renderer.set_node_transform(binding.slot, world)?;
                    }
                    if node.material_dirty {
                        if let Some(material) = node.kind.material() {
                            for &g in &binding.geometries {
                                renderer.update_geometry_material(g, material)?;
                            }
                        }
                        node.material_dirty = false;
                    }
                }
            }
        }
        Ok(())
    }

    fn check(&self, node: NodeHandle) -> Result<()> {
        if node.index() < self.nodes.len() {
            Ok(())
        } else {
            Err(SceneError::UnknownNode(node.0))
        }
    }
}

/// Allocate a transform slot and upload the node's geometry.
fn upload(kind: &NodeKind, world: Mat4, renderer: &mut Renderer) -> Result<Binding> {
    if let NodeKind::Group = kind {
        // Groups only feed their children's world matrices.
        return Ok(Binding::default());
    }
    let slot = renderer.add_node_transform(world)?;
    let mut geometries = Vec::new();

    match kind {
        NodeKind::Group => {}
        NodeKind::Mesh { mesh, material } => {
            mesh.validate()?;
            let vertices = renderer.add_vertices_3d(&mesh.positions)?;
            let uvs = renderer.add_uv_triples(&mesh.uvs)?;
            let mut first = INVALID_ID;
            for (k, tri) in mesh.triangles.iter().enumerate() {
                let indices = tri.map(|i| vertices.start + i);
                let id = renderer.add_triangle(Space::ThreeD, indices, uvs.start + k as u32)?;
                if k == 0 {
                    first = id;
                }
            }
            let triangles = Span::new(first, mesh.triangles.len() as u32);
            geometries.push(renderer.add_geometry(
                Geometry::new(GeometryKind::Polygon3D, vertices)
                    .with_triangles(triangles)
                    .with_node(slot)
                    .with_material(*material),
            )?);
        }
        NodeKind::Quad2D { min, max, z, material } => {
            let corners = [
                Vec3::new(min.x, min.y, *z),
                Vec3::new(max.x, min.y, *z),
                Vec3::new(max.x, max.y, *z),
                Vec3::new(min.x, max.y, *z),
            ];
            let vertices = renderer.add_vertices_2d(&corners)?;
            let uvs = renderer.add_uv_triples(&[
                UvTriple::new(Vec2::ZERO, Vec2::X, Vec2::ONE),
                UvTriple::new(Vec2::ZERO, Vec2::ONE, Vec2::Y),
            ])?;
            geometries.push(renderer.add_geometry(
                Geometry::new(GeometryKind::Rect2D, vertices)
                    .with_uv_start(uvs.start)
                    .with_node(slot)
                    .with_material(*material),
            )?);
        }
        NodeKind::Polyline2D { points, z, material } => {
            let positions: Vec<Vec3> = points.iter().map(|p| p.extend(*z)).collect();
            let vertices = renderer.add_vertices_2d(&positions)?;
            for i in 0..vertices.count.saturating_sub(1) {
                geometries.push(renderer.add_geometry(
                    Geometry::new(GeometryKind::Line2D, Span::new(vertices.start + i, 2))
                        .with_node(slot)
                        .with_material(*material),
                )?);
            }
        }
        NodeKind::Points2D { points, z, material } => {
            let positions: Vec<Vec3> = points.iter().map(|p| p.extend(*z)).collect();
            let vertices = renderer.add_vertices_2d(&positions)?;
            geometries.push(renderer.add_geometry(
                Geometry::new(GeometryKind::Points2D, vertices)
                    .with_node(slot)
                    .with_material(*material),
            )?);
        }
        NodeKind::Line3D { from, to, material } => {
            let vertices = renderer.add_vertices_3d(&[*from, *to])?;
            geometries.push(renderer.add_geometry(
                Geometry::new(GeometryKind::Line3D, vertices)
                    .with_node(slot)
                    .with_material(*material),
            )?);
        }
    }
    Ok(Binding { slot, geometries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use termrast_core::{pixel_space_2d, Material, RenderConfig};
    use termrast_types::Rgb;

    fn renderer() -> (Renderer, MaterialId, MaterialId) {
        let mut r = Renderer::new(RenderConfig::new(8, 8));
        r.transforms_mut().set_view_matrix_2d(pixel_space_2d(8, 8));
        let red = r
            .add_material(Material::StaticColorFront(Rgb::new(255, 0, 0)))
            .unwrap();
        let blue = r
            .add_material(Material::StaticColorFront(Rgb::new(0, 0, 255)))
            .unwrap();
        (r, red, blue)
    }

    #[test]
    fn world_transform_composes_parent_first() {
        let mut scene = SceneGraph::new();
        let group = scene.add_child(scene.root(), NodeKind::Group).unwrap();
        let child = scene.add_child(group, NodeKind::Group).unwrap();
        scene
            .set_local(group, Mat4::from_translation(Vec3::X))
            .unwrap();
        scene
            .set_local(child, Mat4::from_scale(Vec3::splat(2.0)))
            .unwrap();

        let world = scene.world_transform(child).unwrap();
        assert_eq!(world.transform_point3(Vec3::X), Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(scene.children(group).unwrap(), &[child]);
        assert_eq!(scene.parent(child).unwrap(), Some(group));
    }

    #[test]
    fn unknown_nodes_are_rejected() {
        let mut scene = SceneGraph::new();
        assert_eq!(
            scene.add_child(NodeHandle(7), NodeKind::Group),
            Err(SceneError::UnknownNode(7))
        );
        assert!(scene.world_transform(NodeHandle(3)).is_err());
    }

    #[test]
    fn sync_uploads_once_then_moves_transforms() {
        let (mut r, red, _) = renderer();
        let mut scene = SceneGraph::new();
        let quad = scene
            .add_child(
                scene.root(),
                NodeKind::Quad2D {
                    min: Vec2::ZERO,
                    max: Vec2::new(2.0, 2.0),
                    z: 0.5,
                    material: red,
                },
            )
            .unwrap();

        scene.sync_into(&mut r).unwrap();
        let geometry_count = r.geometry().len();
        r.render_frame();
        assert_eq!(r.drawing().cell(0, 0).unwrap().front, Rgb::new(255, 0, 0));

        scene
            .set_local(quad, Mat4::from_translation(Vec3::new(4.0, 4.0, 0.0)))
            .unwrap();
        scene.sync_into(&mut r).unwrap();
        assert_eq!(r.geometry().len(), geometry_count);
        r.render_frame();
        assert_ne!(r.drawing().cell(0, 0).unwrap().front, Rgb::new(255, 0, 0));
        assert_eq!(r.drawing().cell(5, 5).unwrap().front, Rgb::new(255, 0, 0));
    }

    #[test]
    fn set_material_rebinds_on_sync() {
        let (mut r, red, blue) = renderer();
        let mut scene = SceneGraph::new();
        let line = scene
            .add_child(
                scene.root(),
                NodeKind::Polyline2D {
                    points: vec![Vec2::new(0.0, 1.0), Vec2::new(4.0, 1.0), Vec2::new(4.0, 5.0)],
                    z: 0.5,
                    material: red,
                },
            )
            .unwrap();
        scene.sync_into(&mut r).unwrap();
        assert_eq!(scene.geometries(line).len(), 2);

        scene.set_material(line, blue).unwrap();
        scene.sync_into(&mut r).unwrap();
        for &g in scene.geometries(line) {
            assert_eq!(r.geometry().get(g).unwrap().material_id, blue);
        }
    }

    #[test]
    fn mesh_nodes_become_indexed_geometry() {
        let (mut r, red, _) = renderer();
        let mut scene = SceneGraph::new();
        let cube = scene
            .add_child(
                scene.root(),
                NodeKind::Mesh {
                    mesh: MeshData::cube(1.0),
                    material: red,
                },
            )
            .unwrap();
        scene.sync_into(&mut r).unwrap();

        let g = r.geometry().get(scene.geometries(cube)[0]).unwrap();
        assert_eq!(g.kind, GeometryKind::Polygon3D);
        assert_eq!(g.triangles.map(|t| t.count), Some(12));
        assert_eq!(scene.slot(cube), Some(1));
    }
}

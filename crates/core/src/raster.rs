//! Scan conversion of points, lines and triangles into the depth layers.

use glam::Vec2;

use crate::drawing::{DrawingBuffer, Fragment, PixInfo, WriteOutcome};
use crate::primitive::{Primitive, PrimitiveBuffer, PrimitiveKind, ScreenVertex};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RasterStats {
    /// Fragments that landed inside the grid.
    pub fragments: u32,
    pub front_writes: u32,
    pub back_writes: u32,
    pub rejected: u32,
    /// Fragments dropped for non-finite or out-of-range depth.
    pub depth_culled: u32,
}

/// Rasterize every primitive, in id order, into `drawing`.
///
/// The result does not depend on primitive order: ties in depth go to the
/// lower primitive id.
pub fn rasterize(primitives: &PrimitiveBuffer, drawing: &mut DrawingBuffer) -> RasterStats {
    let mut stats = RasterStats::default();
    if drawing.width() == 0 || drawing.height() == 0 {
        return stats;
    }
    for prim in primitives.iter() {
        match prim.kind {
            PrimitiveKind::Point => raster_point(prim, drawing, &mut stats),
            PrimitiveKind::Line => raster_line(prim, drawing, &mut stats),
            PrimitiveKind::Triangle => raster_triangle(prim, drawing, &mut stats),
        }
    }
    stats
}

#[inline]
#[allow(clippy::too_many_arguments)]
fn plot(
    drawing: &mut DrawingBuffer,
    stats: &mut RasterStats,
    prim: &Primitive,
    x: i32,
    y: i32,
    depth: f32,
    weights: [f32; 3],
    corrected: [f32; 3],
) {
    if x < 0 || y < 0 || x > u16::MAX as i32 || y > u16::MAX as i32 {
        return;
    }
    let Some(index) = drawing.index(x as u16, y as u16) else {
        return;
    };
    stats.fragments += 1;
    if !depth.is_finite() || depth < 0.0 || depth > drawing.clear_depth() {
        stats.depth_culled += 1;
        return;
    }
    let frag = Fragment {
        depth,
        info: PixInfo {
            weights,
            corrected,
            node_id: prim.node_id,
            geometry_id: prim.geometry_id,
            material_id: prim.material_id,
            primitive_id: prim.primitive_id,
        },
    };
    match drawing.write(index, &frag) {
        WriteOutcome::Front => stats.front_writes += 1,
        WriteOutcome::Back => stats.back_writes += 1,
        WriteOutcome::Rejected => stats.rejected += 1,
    }
}

fn raster_point(prim: &Primitive, drawing: &mut DrawingBuffer, stats: &mut RasterStats) {
    let v = prim.vertices[0];
    if !v.x.is_finite() || !v.y.is_finite() {
        return;
    }
    let w = [1.0, 0.0, 0.0];
    plot(drawing, stats, prim, v.x.round() as i32, v.y.round() as i32, v.z, w, w);
}

fn raster_line(prim: &Primitive, drawing: &mut DrawingBuffer, stats: &mut RasterStats) {
    let [a, b, _] = prim.vertices;
    let pa = Vec2::new(a.x, a.y);
    let pb = Vec2::new(b.x, b.y);
    if !pa.is_finite() || !pb.is_finite() {
        return;
    }
    // Every position that rounds into the grid survives, as for points.
    let min = Vec2::splat(-0.5);
    let max = Vec2::new(drawing.width() as f32 - 0.5, drawing.height() as f32 - 0.5);
    let Some((t0, t1)) = clip_segment(pa, pb, min, max) else {
        return;
    };

    let d = pb - pa;
    let len2 = d.length_squared();
    if len2 == 0.0 {
        return;
    }
    let start = pa + d * t0;
    let end = pa + d * t1;
    let (mut x, mut y) = (start.x.round() as i32, start.y.round() as i32);
    let (x1, y1) = (end.x.round() as i32, end.y.round() as i32);

    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        // Parameter of the cell projected onto the unclipped segment.
        let t = ((Vec2::new(x as f32, y as f32) - pa).dot(d) / len2).clamp(0.0, 1.0);
        let depth = a.z + (b.z - a.z) * t;
        let weights = [1.0 - t, t, 0.0];
        let corrected = perspective_correct(weights, [a.z, b.z, 1.0]);
        plot(drawing, stats, prim, x, y, depth, weights, corrected);

        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Liang–Barsky clip of segment `a → b` to `[min.x, max.x] × [min.y, max.y]`.
///
/// Returns the parameter interval that survives, or `None` when the segment
/// misses the box.
pub fn clip_segment(a: Vec2, b: Vec2, min: Vec2, max: Vec2) -> Option<(f32, f32)> {
    let d = b - a;
    let mut t0 = 0.0f32;
    let mut t1 = 1.0f32;
    let bounds = [
        (-d.x, a.x - min.x),
        (d.x, max.x - a.x),
        (-d.y, a.y - min.y),
        (d.y, max.y - a.y),
    ];
    for (p, q) in bounds {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    Some((t0, t1))
}

/// Edge function: positive when `p` is on the inner side of `a → b` for a
/// positively oriented triangle in y-down cell space.
#[inline]
pub fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (p.x - a.x) * (b.y - a.y) - (p.y - a.y) * (b.x - a.x)
}

/// Top-left fill rule: whether samples exactly on `a → b` belong to this triangle.
#[inline]
fn owns_edge(a: Vec2, b: Vec2) -> bool {
    let d = b - a;
    d.y > 0.0 || (d.y == 0.0 && d.x < 0.0)
}

#[inline]
fn inside(e: f32, owned: bool) -> bool {
    e > 0.0 || (e == 0.0 && owned)
}

fn raster_triangle(prim: &Primitive, drawing: &mut DrawingBuffer, stats: &mut RasterStats) {
    let [va, vb, vc] = prim.vertices;
    let p = |v: ScreenVertex| Vec2::new(v.x, v.y);
    let (a, mut b, mut c) = (p(va), p(vb), p(vc));

    let mut area = edge(a, b, c);
    if area == 0.0 || !area.is_finite() {
        return;
    }
    // Normalise to positive orientation and remember how to map weights back.
    let swapped = area < 0.0;
    if swapped {
        std::mem::swap(&mut b, &mut c);
        area = -area;
    }

    let min = a.min(b).min(c);
    let max = a.max(b).max(c);
    let x0 = (min.x - 0.5).ceil().max(0.0);
    let y0 = (min.y - 0.5).ceil().max(0.0);
    let x1 = (max.x - 0.5).floor().min(drawing.width() as f32 - 1.0);
    let y1 = (max.y - 0.5).floor().min(drawing.height() as f32 - 1.0);
    if !(x0 <= x1 && y0 <= y1) {
        return;
    }

    let own_bc = owns_edge(b, c);
    let own_ca = owns_edge(c, a);
    let own_ab = owns_edge(a, b);
    let z = [va.z, vb.z, vc.z];

    for y in y0 as i32..=y1 as i32 {
        for x in x0 as i32..=x1 as i32 {
            let s = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let e0 = edge(b, c, s);
            let e1 = edge(c, a, s);
            let e2 = edge(a, b, s);
            if !(inside(e0, own_bc) && inside(e1, own_ca) && inside(e2, own_ab)) {
                continue;
            }
            let (l0, l1, l2) = (e0 / area, e1 / area, e2 / area);
            let weights = if swapped { [l0, l2, l1] } else { [l0, l1, l2] };
            let depth = weights[0] * z[0] + weights[1] * z[1] + weights[2] * z[2];
            let corrected = perspective_correct(weights, z);
            plot(drawing, stats, prim, x, y, depth, weights, corrected);
        }
    }
}

/// `(l_i / z_i) / Σ (l_j / z_j)` over the per-vertex depths.
///
/// Vertices with zero weight do not take part. Falls back to `weights` when a
/// contributing depth is zero or not finite, or when the sum is.
#[inline]
pub fn perspective_correct(weights: [f32; 3], z: [f32; 3]) -> [f32; 3] {
    let mut q = [0.0f32; 3];
    for i in 0..3 {
        if weights[i] == 0.0 {
            continue;
        }
        if z[i] == 0.0 || !z[i].is_finite() {
            return weights;
        }
        q[i] = weights[i] / z[i];
    }
    let sum = q[0] + q[1] + q[2];
    if sum == 0.0 || !sum.is_finite() {
        return weights;
    }
    [q[0] / sum, q[1] / sum, q[2] / sum]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::{CanvasCell, CellState, BACK, FRONT};
    use crate::primitive::PrimitiveSource;

    fn setup(w: u16, h: u16) -> (PrimitiveBuffer, DrawingBuffer) {
        (
            PrimitiveBuffer::new(64),
            DrawingBuffer::new(w, h, 1000.0, CanvasCell::default()),
        )
    }

    fn sv(x: f32, y: f32, z: f32) -> ScreenVertex {
        ScreenVertex::new(x, y, z)
    }

    fn filled(drawing: &DrawingBuffer) -> usize {
        (0..drawing.canvas().len())
            .filter(|&i| drawing.cell_state(i) != CellState::Empty)
            .count()
    }

    #[test]
    fn point_uses_rounded_cell() {
        let (mut prims, mut drawing) = setup(4, 4);
        prims.push_point(sv(1.0, 1.5, 0.5), PrimitiveSource::material(0));
        let stats = rasterize(&prims, &mut drawing);
        assert_eq!(stats.front_writes, 1);
        let layer = drawing.layer(1, 2, FRONT).unwrap();
        assert_eq!(layer.depth, 0.5);
        assert_eq!(layer.info.weights, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn border_points_land_and_outside_points_vanish() {
        let (mut prims, mut drawing) = setup(3, 2);
        let src = PrimitiveSource::material(0);
        prims.push_point(sv(0.0, 0.0, 0.1), src);
        prims.push_point(sv(2.0, 1.0, 0.1), src);
        prims.push_point(sv(3.0, 1.0, 0.1), src);
        prims.push_point(sv(-1.0, 0.0, 0.1), src);
        let stats = rasterize(&prims, &mut drawing);
        assert_eq!(stats.fragments, 2);
        assert!(drawing.layer(0, 0, FRONT).is_some());
        assert!(drawing.layer(2, 1, FRONT).is_some());
    }

    #[test]
    fn depth_outside_range_is_dropped() {
        let (mut prims, mut drawing) = setup(2, 1);
        let src = PrimitiveSource::material(0);
        prims.push_point(sv(0.0, 0.0, -0.1), src);
        prims.push_point(sv(1.0, 0.0, f32::NAN), src);
        prims.push_point(sv(1.0, 0.0, 2000.0), src);
        let stats = rasterize(&prims, &mut drawing);
        assert_eq!(stats.depth_culled, 3);
        assert_eq!(filled(&drawing), 0);
    }

    #[test]
    fn horizontal_line_covers_every_cell_with_interpolated_depth() {
        let (mut prims, mut drawing) = setup(5, 1);
        prims.push_line(sv(0.0, 0.0, 0.0), sv(4.0, 0.0, 0.4), PrimitiveSource::material(0));
        rasterize(&prims, &mut drawing);
        for x in 0..5u16 {
            let layer = drawing.layer(x, 0, FRONT).unwrap();
            assert!((layer.depth - x as f32 * 0.1).abs() < 1e-6);
            let [w0, w1, w2] = layer.info.weights;
            assert!((w0 + w1 + w2 - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn line_is_clipped_to_the_grid() {
        let (mut prims, mut drawing) = setup(4, 4);
        prims.push_line(sv(-10.0, 2.0, 0.5), sv(10.0, 2.0, 0.5), PrimitiveSource::material(0));
        let stats = rasterize(&prims, &mut drawing);
        assert_eq!(stats.fragments, 4);
        assert_eq!(filled(&drawing), 4);

        let (lo, hi) = (Vec2::splat(-0.5), Vec2::splat(3.5));
        assert!(clip_segment(Vec2::new(-5.0, -5.0), Vec2::new(-1.0, -1.0), lo, hi).is_none());
    }

    #[test]
    fn lines_within_half_a_cell_of_the_border_are_drawn() {
        let (mut prims, mut drawing) = setup(8, 8);
        let src = PrimitiveSource::material(0);
        prims.push_line(sv(0.0, 7.4, 0.5), sv(7.0, 7.4, 0.5), src);
        prims.push_line(sv(-0.3, 0.0, 0.5), sv(-0.3, 6.0, 0.5), src);
        let stats = rasterize(&prims, &mut drawing);
        assert_eq!(stats.fragments, 15);
        for x in 0..8u16 {
            assert!(drawing.layer(x, 7, FRONT).is_some(), "bottom row cell {x}");
        }
        for y in 0..=6u16 {
            assert!(drawing.layer(0, y, FRONT).is_some(), "left column cell {y}");
        }

        // Past the half-cell margin nothing lands.
        let (mut prims, mut drawing) = setup(8, 8);
        prims.push_line(sv(0.0, 7.6, 0.5), sv(7.0, 7.6, 0.5), src);
        assert_eq!(rasterize(&prims, &mut drawing).fragments, 0);
    }

    #[test]
    fn triangle_weights_sum_to_one_in_both_windings() {
        for flip in [false, true] {
            let (mut prims, mut drawing) = setup(8, 8);
            let (a, b, c) = (sv(0.0, 0.0, 0.1), sv(8.0, 0.0, 0.2), sv(0.0, 8.0, 0.3));
            let src = PrimitiveSource::material(0);
            if flip {
                prims.push_triangle(a, c, b, src);
            } else {
                prims.push_triangle(a, b, c, src);
            }
            rasterize(&prims, &mut drawing);
            // The hypotenuse is not a top-left edge, so its 8 centres stay out.
            assert_eq!(filled(&drawing), 28);

            let layer = drawing.layer(0, 0, FRONT).unwrap();
            let [w0, w1, w2] = layer.info.weights;
            assert!((w0 + w1 + w2 - 1.0).abs() < 1e-5);
            // (0.5, 0.5) sits closest to vertex a whichever way it was wound.
            assert!(w0 > 0.8);
            let [c0, c1, c2] = layer.info.corrected;
            assert!((c0 + c1 + c2 - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn shared_edge_is_owned_once() {
        let (mut prims, mut drawing) = setup(4, 4);
        let src = PrimitiveSource::material(0);
        let (a, b, c, d) = (sv(0.0, 0.0, 0.5), sv(4.0, 0.0, 0.5), sv(4.0, 4.0, 0.5), sv(0.0, 4.0, 0.5));
        prims.push_triangle(a, b, c, src);
        prims.push_triangle(a, c, d, src);
        let stats = rasterize(&prims, &mut drawing);
        assert_eq!(stats.fragments, 16);
        assert_eq!(stats.back_writes, 0);
    }

    #[test]
    fn overlapping_triangles_fill_both_layers() {
        let (mut prims, mut drawing) = setup(2, 2);
        let src = PrimitiveSource::material(0);
        let tri = |z| [sv(0.0, 0.0, z), sv(4.0, 0.0, z), sv(0.0, 4.0, z)];
        let [a, b, c] = tri(0.7);
        prims.push_triangle(a, b, c, src);
        let [a, b, c] = tri(0.3);
        prims.push_triangle(a, b, c, src);
        rasterize(&prims, &mut drawing);
        assert_eq!(drawing.layer(0, 0, FRONT).unwrap().info.primitive_id, 1);
        assert_eq!(drawing.layer(0, 0, BACK).unwrap().info.primitive_id, 0);
    }

    #[test]
    fn perspective_correction_favours_the_near_vertex() {
        let c = perspective_correct([0.5, 0.5, 0.0], [1.0, 3.0, 0.0]);
        assert!((c[0] - 0.75).abs() < 1e-6);
        assert!((c[1] - 0.25).abs() < 1e-6);
        assert_eq!(c[2], 0.0);
        assert_eq!(perspective_correct([0.5, 0.5, 0.0], [0.0, 2.0, 1.0]), [0.5, 0.5, 0.0]);
        assert_eq!(perspective_correct([0.5, 0.5, 0.0], [f32::NAN, 2.0, 1.0]), [0.5, 0.5, 0.0]);
    }

    #[test]
    fn triangle_corrected_weights_divide_by_vertex_depth() {
        let (mut prims, mut drawing) = setup(16, 16);
        let z = [0.25, 0.75, 0.75];
        prims.push_triangle(
            sv(0.0, 0.0, z[0]),
            sv(16.0, 0.0, z[1]),
            sv(0.0, 16.0, z[2]),
            PrimitiveSource::material(0),
        );
        rasterize(&prims, &mut drawing);

        let info = drawing.layer(8, 0, FRONT).unwrap().info;
        let w = info.weights;
        let q = [w[0] / z[0], w[1] / z[1], w[2] / z[2]];
        let sum = q[0] + q[1] + q[2];
        for i in 0..3 {
            assert!((info.corrected[i] - q[i] / sum).abs() < 1e-5, "{:?}", info.corrected);
        }
        // The nearer vertex pulls harder than its plain weight.
        assert!(info.corrected[0] > w[0] + 0.1);
    }
}

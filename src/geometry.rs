use glam::Vec3;
use std::f32::consts::PI;

/// Vertex layout shared by every mesh and the render pipeline
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, uv: [f32; 2]) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            uv,
        }
    }
}

/// CPU-side triangle mesh ready for upload
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Radius of the origin-centered sphere enclosing every vertex,
    /// used for pointer picking
    pub fn bounding_radius(&self) -> f32 {
        self.vertices
            .iter()
            .map(|v| Vec3::from_array(v.position).length())
            .fold(0.0, f32::max)
    }
}

fn spherical_uv(p: Vec3) -> [f32; 2] {
    let n = p.normalize_or_zero();
    let u = 0.5 + n.z.atan2(n.x) / (2.0 * PI);
    let v = 0.5 - n.y.asin() / PI;
    [u, v]
}

/// Build a flat-shaded solid from a canonical vertex table and triangle
/// list. Vertices are projected onto the circumscribed sphere of `radius`;
/// every triangle gets its own outward face normal so edges stay crisp.
fn flat_polyhedron(positions: &[Vec3], triangles: &[[usize; 3]], radius: f32) -> MeshData {
    let scaled: Vec<Vec3> = positions
        .iter()
        .map(|p| p.normalize() * radius)
        .collect();

    let mut mesh = MeshData::default();
    for tri in triangles {
        let (a, b, c) = (scaled[tri[0]], scaled[tri[1]], scaled[tri[2]]);
        let centroid = (a + b + c) / 3.0;
        let mut normal = (b - a).cross(c - a).normalize_or_zero();
        let (b, c) = if normal.dot(centroid) < 0.0 {
            normal = -normal;
            (c, b)
        } else {
            (b, c)
        };
        let base = mesh.vertices.len() as u32;
        for p in [a, b, c] {
            mesh.vertices.push(Vertex::new(p, normal, spherical_uv(p)));
        }
        mesh.indices.extend_from_slice(&[base, base + 1, base + 2]);
    }
    mesh
}

/// Twenty-faced gem, the centerpiece shape
pub fn icosahedron(radius: f32) -> MeshData {
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let positions = [
        Vec3::new(-1.0, t, 0.0),
        Vec3::new(1.0, t, 0.0),
        Vec3::new(-1.0, -t, 0.0),
        Vec3::new(1.0, -t, 0.0),
        Vec3::new(0.0, -1.0, t),
        Vec3::new(0.0, 1.0, t),
        Vec3::new(0.0, -1.0, -t),
        Vec3::new(0.0, 1.0, -t),
        Vec3::new(t, 0.0, -1.0),
        Vec3::new(t, 0.0, 1.0),
        Vec3::new(-t, 0.0, -1.0),
        Vec3::new(-t, 0.0, 1.0),
    ];
    let triangles = [
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];
    flat_polyhedron(&positions, &triangles, radius)
}

/// Twelve pentagonal faces, triangulated three per pentagon
pub fn dodecahedron(radius: f32) -> MeshData {
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let r = 1.0 / t;
    let positions = [
        Vec3::new(-1.0, -1.0, -1.0),
        Vec3::new(-1.0, -1.0, 1.0),
        Vec3::new(-1.0, 1.0, -1.0),
        Vec3::new(-1.0, 1.0, 1.0),
        Vec3::new(1.0, -1.0, -1.0),
        Vec3::new(1.0, -1.0, 1.0),
        Vec3::new(1.0, 1.0, -1.0),
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(0.0, -r, -t),
        Vec3::new(0.0, -r, t),
        Vec3::new(0.0, r, -t),
        Vec3::new(0.0, r, t),
        Vec3::new(-r, -t, 0.0),
        Vec3::new(-r, t, 0.0),
        Vec3::new(r, -t, 0.0),
        Vec3::new(r, t, 0.0),
        Vec3::new(-t, 0.0, -r),
        Vec3::new(t, 0.0, -r),
        Vec3::new(-t, 0.0, r),
        Vec3::new(t, 0.0, r),
    ];
    let triangles = [
        [3, 11, 7],
        [3, 7, 15],
        [3, 15, 13],
        [7, 19, 17],
        [7, 17, 6],
        [7, 6, 15],
        [17, 4, 8],
        [17, 8, 10],
        [17, 10, 6],
        [8, 0, 16],
        [8, 16, 2],
        [8, 2, 10],
        [0, 12, 1],
        [0, 1, 18],
        [0, 18, 16],
        [6, 10, 2],
        [6, 2, 13],
        [6, 13, 15],
        [2, 16, 18],
        [2, 18, 3],
        [2, 3, 13],
        [18, 1, 9],
        [18, 9, 11],
        [18, 11, 3],
        [4, 14, 12],
        [4, 12, 0],
        [4, 0, 8],
        [11, 9, 5],
        [11, 5, 19],
        [11, 19, 7],
        [19, 5, 14],
        [19, 14, 4],
        [19, 4, 17],
        [1, 12, 14],
        [1, 14, 5],
        [1, 5, 9],
    ];
    flat_polyhedron(&positions, &triangles, radius)
}

/// Eight-faced diamond
pub fn octahedron(radius: f32) -> MeshData {
    let positions = [
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(-1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.0, -1.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
        Vec3::new(0.0, 0.0, -1.0),
    ];
    let triangles = [
        [0, 2, 4],
        [0, 4, 3],
        [0, 3, 5],
        [0, 5, 2],
        [1, 2, 5],
        [1, 5, 3],
        [1, 3, 4],
        [1, 4, 2],
    ];
    flat_polyhedron(&positions, &triangles, radius)
}

/// Smooth-shaded ring. `radius` is the center of the tube circle,
/// `tube` the tube's own radius.
pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> MeshData {
    let mut mesh = MeshData::default();

    for j in 0..=radial_segments {
        for i in 0..=tubular_segments {
            let u = i as f32 / tubular_segments as f32 * 2.0 * PI;
            let v = j as f32 / radial_segments as f32 * 2.0 * PI;

            let position = Vec3::new(
                (radius + tube * v.cos()) * u.cos(),
                (radius + tube * v.cos()) * u.sin(),
                tube * v.sin(),
            );
            let ring_center = Vec3::new(radius * u.cos(), radius * u.sin(), 0.0);
            let normal = (position - ring_center).normalize();
            let uv = [
                i as f32 / tubular_segments as f32,
                j as f32 / radial_segments as f32,
            ];
            mesh.vertices.push(Vertex::new(position, normal, uv));
        }
    }

    for j in 1..=radial_segments {
        for i in 1..=tubular_segments {
            let a = (tubular_segments + 1) * j + i - 1;
            let b = (tubular_segments + 1) * (j - 1) + i - 1;
            let c = (tubular_segments + 1) * (j - 1) + i;
            let d = (tubular_segments + 1) * j + i;
            mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    mesh
}

/// Vertical pill: a cylinder of `length` capped with hemispheres of
/// `radius`. Total height is `length + 2 * radius`.
pub fn capsule(radius: f32, length: f32, cap_segments: u32, radial_segments: u32) -> MeshData {
    let mut mesh = MeshData::default();
    let half = length / 2.0;

    // Profile rows from bottom pole to top pole. Polar angle runs
    // -pi/2..0 over the bottom cap and 0..pi/2 over the top cap; the two
    // equator rows at angle 0 bound the straight cylinder wall.
    let mut rows: Vec<(f32, f32, f32)> = Vec::new();
    for k in 0..=cap_segments {
        let angle = -PI / 2.0 + (k as f32 / cap_segments as f32) * (PI / 2.0);
        rows.push((radius * angle.cos(), -half + radius * angle.sin(), angle));
    }
    for k in 0..=cap_segments {
        let angle = (k as f32 / cap_segments as f32) * (PI / 2.0);
        rows.push((radius * angle.cos(), half + radius * angle.sin(), angle));
    }

    let total_height = length + 2.0 * radius;
    for &(ring_radius, y, angle) in &rows {
        for i in 0..=radial_segments {
            let theta = i as f32 / radial_segments as f32 * 2.0 * PI;
            let position = Vec3::new(ring_radius * theta.cos(), y, ring_radius * theta.sin());
            let normal = Vec3::new(
                angle.cos() * theta.cos(),
                angle.sin(),
                angle.cos() * theta.sin(),
            )
            .normalize_or_zero();
            let uv = [
                i as f32 / radial_segments as f32,
                (y + total_height / 2.0) / total_height,
            ];
            mesh.vertices.push(Vertex::new(position, normal, uv));
        }
    }

    let ring = radial_segments + 1;
    for row in 0..(rows.len() as u32 - 1) {
        for i in 0..radial_segments {
            let a = row * ring + i;
            let b = row * ring + i + 1;
            let c = (row + 1) * ring + i;
            let d = (row + 1) * ring + i + 1;
            mesh.indices.extend_from_slice(&[a, c, b, b, c, d]);
        }
    }

    mesh
}

/// Flat ground quad in the XZ plane, `size` units on a side, facing +Y
pub fn plane(size: f32) -> MeshData {
    let h = size / 2.0;
    let n = Vec3::Y;
    MeshData {
        vertices: vec![
            Vertex::new(Vec3::new(-h, 0.0, -h), n, [0.0, 0.0]),
            Vertex::new(Vec3::new(h, 0.0, -h), n, [1.0, 0.0]),
            Vertex::new(Vec3::new(h, 0.0, h), n, [1.0, 1.0]),
            Vertex::new(Vec3::new(-h, 0.0, h), n, [0.0, 1.0]),
        ],
        indices: vec![0, 2, 1, 0, 3, 2],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_well_formed(mesh: &MeshData) {
        assert!(!mesh.vertices.is_empty());
        assert_eq!(mesh.indices.len() % 3, 0);
        for &i in &mesh.indices {
            assert!((i as usize) < mesh.vertices.len(), "index {} out of bounds", i);
        }
        for v in &mesh.vertices {
            let n = Vec3::from_array(v.normal);
            assert!(
                (n.length() - 1.0).abs() < 1e-3,
                "normal {:?} not unit length",
                v.normal
            );
        }
    }

    fn assert_outward_normals(mesh: &MeshData) {
        for tri in mesh.indices.chunks(3) {
            let a = Vec3::from_array(mesh.vertices[tri[0] as usize].position);
            let b = Vec3::from_array(mesh.vertices[tri[1] as usize].position);
            let c = Vec3::from_array(mesh.vertices[tri[2] as usize].position);
            let n = Vec3::from_array(mesh.vertices[tri[0] as usize].normal);
            let centroid = (a + b + c) / 3.0;
            assert!(n.dot(centroid) > 0.0, "face normal points inward");
        }
    }

    #[test]
    fn icosahedron_has_twenty_faces_on_the_sphere() {
        let mesh = icosahedron(3.0);
        assert_well_formed(&mesh);
        assert_outward_normals(&mesh);
        assert_eq!(mesh.triangle_count(), 20);
        assert!((mesh.bounding_radius() - 3.0).abs() < 1e-3);
        for v in &mesh.vertices {
            let d = Vec3::from_array(v.position).length();
            assert!((d - 3.0).abs() < 1e-3, "vertex off the circumsphere: {}", d);
        }
    }

    #[test]
    fn dodecahedron_has_twelve_pentagons() {
        let mesh = dodecahedron(1.5);
        assert_well_formed(&mesh);
        assert_outward_normals(&mesh);
        assert_eq!(mesh.triangle_count(), 36);
        assert!((mesh.bounding_radius() - 1.5).abs() < 1e-3);
    }

    #[test]
    fn octahedron_has_eight_faces() {
        let mesh = octahedron(1.5);
        assert_well_formed(&mesh);
        assert_outward_normals(&mesh);
        assert_eq!(mesh.triangle_count(), 8);
        assert!((mesh.bounding_radius() - 1.5).abs() < 1e-3);
    }

    #[test]
    fn torus_grid_dimensions() {
        let mesh = torus(0.6, 0.25, 16, 32);
        assert_well_formed(&mesh);
        assert_eq!(mesh.vertices.len(), 17 * 33);
        assert_eq!(mesh.triangle_count(), (16 * 32 * 2) as usize);
        assert!((mesh.bounding_radius() - 0.85).abs() < 1e-3);
    }

    #[test]
    fn torus_normals_point_away_from_the_ring() {
        let mesh = torus(0.6, 0.25, 16, 32);
        for v in &mesh.vertices {
            let p = Vec3::from_array(v.position);
            let n = Vec3::from_array(v.normal);
            // Walking a tube radius along the normal must leave the surface
            let outside = p + n * 0.25;
            let ring = Vec3::new(p.x, p.y, 0.0).normalize_or_zero() * 0.6;
            assert!((outside - ring).length() > (p - ring).length() - 1e-4);
        }
    }

    #[test]
    fn capsule_spans_its_full_height() {
        let mesh = capsule(0.5, 1.6, 2, 16);
        assert_well_formed(&mesh);
        let min_y = mesh
            .vertices
            .iter()
            .map(|v| v.position[1])
            .fold(f32::INFINITY, f32::min);
        let max_y = mesh
            .vertices
            .iter()
            .map(|v| v.position[1])
            .fold(f32::NEG_INFINITY, f32::max);
        assert!((min_y + 1.3).abs() < 1e-3);
        assert!((max_y - 1.3).abs() < 1e-3);
        assert!((mesh.bounding_radius() - 1.3).abs() < 1e-3);
    }

    #[test]
    fn capsule_wall_vertices_sit_at_the_radius() {
        let mesh = capsule(0.5, 1.6, 2, 16);
        for v in &mesh.vertices {
            let p = v.position;
            if p[1].abs() <= 0.8 + 1e-4 {
                let ring = (p[0] * p[0] + p[2] * p[2]).sqrt();
                assert!((ring - 0.5).abs() < 1e-3, "wall ring radius {}", ring);
            }
        }
    }

    #[test]
    fn plane_is_flat_and_faces_up() {
        let mesh = plane(40.0);
        assert_well_formed(&mesh);
        assert_eq!(mesh.triangle_count(), 2);
        for v in &mesh.vertices {
            assert_eq!(v.position[1], 0.0);
            assert_eq!(v.normal, [0.0, 1.0, 0.0]);
        }
    }
}

//! Triangle meshes loaded from Wavefront OBJ.
//!
//! The importer understands `v`, `vt`, `vn` and `f` statements (with the
//! `v`, `v/vt`, `v//vn` and `v/vt/vn` corner forms, and negative relative
//! indices). Polygons are fan-triangulated. When the file carries no normals,
//! per-vertex normals are rebuilt through a half-edge structure by averaging
//! the normals of the faces around each vertex.
//!
//! Meshes feed two things: the mesh-surface emitter, which samples points
//! with probability proportional to triangle area, and the collider visuals.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use glam::{Vec2, Vec3};
use rand::Rng;

use crate::assets::AssetSource;
use crate::error::MeshError;

/// One triangle with per-corner attributes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub v: [Vec3; 3],
    pub uv: [Vec2; 3],
    pub n: [Vec3; 3],
    pub area: f32,
}

impl Triangle {
    /// Build a triangle with flat normals and no texture coordinates.
    pub fn flat(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        let normal = face_normal(v0, v1, v2);
        Self {
            v: [v0, v1, v2],
            uv: [Vec2::ZERO; 3],
            n: [normal; 3],
            area: triangle_area(v0, v1, v2),
        }
    }

    /// Geometric normal from the winding order.
    pub fn face_normal(&self) -> Vec3 {
        face_normal(self.v[0], self.v[1], self.v[2])
    }
}

fn face_normal(v0: Vec3, v1: Vec3, v2: Vec3) -> Vec3 {
    (v1 - v0).cross(v2 - v0).normalize_or_zero()
}

fn triangle_area(v0: Vec3, v1: Vec3, v2: Vec3) -> f32 {
    (v1 - v0).cross(v2 - v0).length() / 2.0
}

/// A point picked on a mesh surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSample {
    /// Index of the triangle the point lies on.
    pub triangle: usize,
    pub point: Vec3,
    pub normal: Vec3,
}

/// Static triangle soup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
    total_area: f32,
}

impl Mesh {
    /// A mesh with no triangles; what a failed load yields.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap a list of triangles.
    pub fn from_triangles(triangles: Vec<Triangle>) -> Self {
        let total_area = triangles.iter().map(|t| t.area).sum();
        Self {
            triangles,
            total_area,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Sum of all triangle areas.
    pub fn total_area(&self) -> f32 {
        self.total_area
    }

    /// Load an OBJ through `assets`.
    ///
    /// A missing or malformed file is logged and yields an empty mesh, so the
    /// demo keeps running with the content visibly absent.
    pub fn load(assets: &dyn AssetSource, path: &str) -> Self {
        let Some(bytes) = assets.read(path) else {
            log::error!("Failed to open OBJ file at: {}", path);
            return Self::empty();
        };

        match Self::from_obj(&String::from_utf8_lossy(&bytes)) {
            Ok(mesh) => {
                log::info!("Loaded {} ({} triangles)", path, mesh.triangles.len());
                mesh
            }
            Err(e) => {
                log::error!("Failed to parse OBJ file {}: {}", path, e);
                Self::empty()
            }
        }
    }

    /// Parse OBJ source text.
    pub fn from_obj(src: &str) -> Result<Self, MeshError> {
        let obj = ObjData::parse(src)?;
        Ok(obj.into_mesh())
    }

    /// Index of the triangle whose cumulative area range contains `threshold`.
    ///
    /// Linear scan; `threshold` is expected in `[0, total_area)`.
    pub fn triangle_at_area(&self, threshold: f32) -> Option<usize> {
        let mut running = 0.0;
        for (i, tri) in self.triangles.iter().enumerate() {
            running += tri.area;
            if threshold < running {
                return Some(i);
            }
        }
        // Float slop at the very top of the range
        self.triangles.len().checked_sub(1)
    }

    /// Pick a uniformly distributed point on the surface.
    ///
    /// Triangles are chosen with probability proportional to their area, then
    /// a point is drawn in the parallelogram spanned by two edges and folded
    /// back across the shared diagonal when it lands outside the triangle.
    pub fn sample_surface<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<SurfaceSample> {
        if self.total_area <= 0.0 {
            return None;
        }

        let threshold = rng.gen::<f32>() * self.total_area;
        let index = self.triangle_at_area(threshold)?;
        let tri = &self.triangles[index];

        let mut a: f32 = rng.gen();
        let mut b: f32 = rng.gen();
        if a + b > 1.0 {
            a = 1.0 - a;
            b = 1.0 - b;
        }

        Some(SurfaceSample {
            triangle: index,
            point: tri.v[0] + (tri.v[1] - tri.v[0]) * a + (tri.v[2] - tri.v[0]) * b,
            normal: tri.face_normal(),
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Corner {
    v: usize,
    vt: Option<usize>,
    vn: Option<usize>,
}

#[derive(Debug, Default)]
struct ObjData {
    positions: Vec<Vec3>,
    uvs: Vec<Vec2>,
    normals: Vec<Vec3>,
    faces: Vec<Vec<Corner>>,
}

impl ObjData {
    fn parse(src: &str) -> Result<Self, MeshError> {
        let mut obj = ObjData::default();

        for (i, raw) in src.lines().enumerate() {
            let line = i + 1;
            let text = raw.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }

            let mut parts = text.split_whitespace();
            match parts.next() {
                Some("v") => {
                    let [x, y, z] = parse_floats::<3>(&mut parts, line)?;
                    obj.positions.push(Vec3::new(x, y, z));
                }
                Some("vt") => {
                    let [u, v] = parse_floats::<2>(&mut parts, line)?;
                    // Image rows run top to bottom
                    obj.uvs.push(Vec2::new(u, 1.0 - v));
                }
                Some("vn") => {
                    let [x, y, z] = parse_floats::<3>(&mut parts, line)?;
                    obj.normals.push(Vec3::new(x, y, z).normalize_or_zero());
                }
                Some("f") => {
                    let face = parts
                        .map(|token| obj.parse_corner(token, line))
                        .collect::<Result<Vec<_>, _>>()?;
                    if face.len() < 3 {
                        return Err(MeshError::DegenerateFace { line });
                    }
                    obj.faces.push(face);
                }
                // o, g, s, usemtl, mtllib...
                _ => {}
            }
        }

        Ok(obj)
    }

    fn parse_corner(&self, token: &str, line: usize) -> Result<Corner, MeshError> {
        let mut fields = token.split('/');
        let v = match fields.next() {
            Some(s) => resolve_index(s, self.positions.len(), line)?,
            None => return Err(MeshError::MissingComponent { line }),
        };
        let vt = match fields.next() {
            Some(s) if !s.is_empty() => Some(resolve_index(s, self.uvs.len(), line)?),
            _ => None,
        };
        let vn = match fields.next() {
            Some(s) if !s.is_empty() => Some(resolve_index(s, self.normals.len(), line)?),
            _ => None,
        };
        Ok(Corner { v, vt, vn })
    }

    fn into_mesh(self) -> Mesh {
        let rebuilt = if self.normals.is_empty() {
            let polygons: Vec<Vec<usize>> = self
                .faces
                .iter()
                .map(|face| face.iter().map(|c| c.v).collect())
                .collect();
            Some(HalfEdgeMesh::build(&self.positions, &polygons).vertex_normals())
        } else {
            None
        };

        let mut triangles = Vec::new();
        for face in &self.faces {
            for k in 1..face.len() - 1 {
                let corners = [face[0], face[k], face[k + 1]];
                let v = corners.map(|c| self.positions[c.v]);
                let mut tri = Triangle::flat(v[0], v[1], v[2]);

                if corners.iter().all(|c| c.vt.is_some()) {
                    tri.uv = corners.map(|c| c.vt.map_or(Vec2::ZERO, |i| self.uvs[i]));
                }

                match &rebuilt {
                    Some(normals) => {
                        let n = corners.map(|c| normals[c.v]);
                        if n.iter().all(|n| *n != Vec3::ZERO) {
                            tri.n = n;
                        }
                    }
                    None => {
                        if corners.iter().all(|c| c.vn.is_some()) {
                            tri.n = corners.map(|c| c.vn.map_or(Vec3::ZERO, |i| self.normals[i]));
                        }
                    }
                }

                triangles.push(tri);
            }
        }

        Mesh::from_triangles(triangles)
    }
}

fn parse_floats<'a, const N: usize>(
    parts: &mut impl Iterator<Item = &'a str>,
    line: usize,
) -> Result<[f32; N], MeshError> {
    let mut out = [0.0; N];
    for slot in out.iter_mut() {
        let token = parts.next().ok_or(MeshError::MissingComponent { line })?;
        *slot = token.parse().map_err(|_| MeshError::InvalidNumber {
            line,
            token: token.to_string(),
        })?;
    }
    Ok(out)
}

/// Turn a 1-based (or negative, relative) OBJ index into a 0-based one.
fn resolve_index(token: &str, count: usize, line: usize) -> Result<usize, MeshError> {
    let raw: i64 = token.parse().map_err(|_| MeshError::InvalidNumber {
        line,
        token: token.to_string(),
    })?;

    let resolved = if raw > 0 {
        raw - 1
    } else {
        count as i64 + raw
    };

    if raw == 0 || resolved < 0 || resolved >= count as i64 {
        return Err(MeshError::IndexOutOfRange { line, index: raw });
    }
    Ok(resolved as usize)
}

#[derive(Debug, Clone, Copy)]
struct HalfEdge {
    next: usize,
    twin: Option<usize>,
    /// Vertex this edge points to.
    vertex: usize,
    face: usize,
}

#[derive(Debug, Clone, Copy)]
struct HeVertex {
    /// One edge leaving this vertex.
    half_edge: Option<usize>,
    position: Vec3,
}

#[derive(Debug, Clone, Copy)]
struct HeFace {
    half_edge: usize,
    normal: Vec3,
}

/// Connectivity used to rebuild smooth normals.
#[derive(Debug, Default)]
struct HalfEdgeMesh {
    vertices: Vec<HeVertex>,
    faces: Vec<HeFace>,
    half_edges: Vec<HalfEdge>,
}

impl HalfEdgeMesh {
    fn build(positions: &[Vec3], polygons: &[Vec<usize>]) -> Self {
        let mut mesh = HalfEdgeMesh {
            vertices: positions
                .iter()
                .map(|&position| HeVertex {
                    half_edge: None,
                    position,
                })
                .collect(),
            ..Default::default()
        };
        let mut edge_map: HashMap<(usize, usize), usize> = HashMap::new();

        for (f, polygon) in polygons.iter().enumerate() {
            let base = mesh.half_edges.len();
            let n = polygon.len();

            for k in 0..n {
                let src = polygon[k];
                let dst = polygon[(k + 1) % n];
                let id = base + k;

                let twin = edge_map.get(&(dst, src)).copied();
                if let Some(t) = twin {
                    mesh.half_edges[t].twin = Some(id);
                }

                mesh.half_edges.push(HalfEdge {
                    next: base + (k + 1) % n,
                    twin,
                    vertex: dst,
                    face: f,
                });
                mesh.vertices[src].half_edge = Some(id);

                match edge_map.entry((src, dst)) {
                    Entry::Occupied(_) => {
                        log::warn!("Edge {}->{} already in mesh, winding is inconsistent", src, dst);
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(id);
                    }
                }
            }

            mesh.faces.push(HeFace {
                half_edge: base,
                normal: Vec3::ZERO,
            });
        }

        mesh.compute_face_normals();
        mesh
    }

    /// Normal of each face from its first three corners (faces are assumed planar).
    fn compute_face_normals(&mut self) {
        for f in 0..self.faces.len() {
            let e0 = self.faces[f].half_edge;
            let e1 = self.half_edges[e0].next;
            let e2 = self.half_edges[e1].next;
            let p = [e0, e1, e2].map(|e| self.vertices[self.half_edges[e].vertex].position);
            self.faces[f].normal = face_normal(p[0], p[1], p[2]);
        }
    }

    fn prev(&self, e: usize) -> usize {
        let mut p = e;
        for _ in 0..self.half_edges.len() {
            let n = self.half_edges[p].next;
            if n == e {
                return p;
            }
            p = n;
        }
        p
    }

    /// Faces touching vertex `v`, found by rotating around it.
    ///
    /// On a boundary the clockwise sweep stops early, so the remaining faces
    /// are collected by sweeping the other way from the start edge.
    fn faces_around(&self, v: usize) -> Vec<usize> {
        let Some(start) = self.vertices[v].half_edge else {
            return Vec::new();
        };
        let limit = self.half_edges.len();
        let mut faces = Vec::new();

        let mut e = start;
        let mut closed = false;
        while faces.len() < limit {
            faces.push(self.half_edges[e].face);
            match self.half_edges[e].twin {
                Some(t) => {
                    e = self.half_edges[t].next;
                    if e == start {
                        closed = true;
                        break;
                    }
                }
                None => break,
            }
        }

        if !closed {
            let mut e = start;
            while faces.len() < limit {
                match self.half_edges[self.prev(e)].twin {
                    Some(t) if t != start => {
                        e = t;
                        faces.push(self.half_edges[e].face);
                    }
                    _ => break,
                }
            }
        }

        faces
    }

    fn vertex_normals(&self) -> Vec<Vec3> {
        (0..self.vertices.len())
            .map(|v| {
                self.faces_around(v)
                    .into_iter()
                    .map(|f| self.faces[f].normal)
                    .sum::<Vec3>()
                    .normalize_or_zero()
            })
            .collect()
    }
}

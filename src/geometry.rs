//! Hand-authored vertex and index tables for the desk objects.
//!
//! Triangles wind counter-clockwise seen from outside. Ring meshes (charger,
//! pencil) share one layout: top ring 0..8 with hub 8, bottom ring 9..17 with
//! hub 17.

use crate::mesh::{Mesh, MeshError, VertexLayout};

#[rustfmt::skip]
const BOTTLE_VERTICES: [f32; 16 * 8] = [
    // cap
    -0.25, 1.00,  0.00,   1.0, 1.0, 0.0,   0.00, 1.00,
     0.00, 1.00,  0.25,   1.0, 0.5, 0.0,   0.25, 1.00,
     0.25, 1.00,  0.00,   0.0, 0.0, 1.0,   0.50, 1.00,
     0.00, 1.00, -0.25,   0.0, 0.5, 0.5,   1.00, 1.00,
    -0.25, 0.80,  0.00,   1.0, 1.0, 0.0,   0.00, 0.00,
     0.00, 0.80,  0.25,   1.0, 0.5, 0.0,   0.25, 0.00,
     0.25, 0.80,  0.00,   0.0, 0.0, 1.0,   0.50, 0.00,
     0.00, 0.80, -0.25,   0.0, 0.5, 0.5,   1.00, 0.00,
    // shoulder
    -0.50, 0.60,  0.00,   1.0, 1.0, 0.0,   0.00, 1.00,
     0.00, 0.60,  0.50,   1.0, 0.5, 0.0,   0.25, 1.00,
     0.50, 0.60,  0.00,   0.0, 0.0, 1.0,   0.50, 1.00,
     0.00, 0.60, -0.50,   0.0, 0.5, 0.5,   1.00, 1.00,
    // base
    -0.50, -0.50,  0.00,  1.0, 1.0, 0.0,   0.00, 0.00,
     0.00, -0.50,  0.50,  1.0, 0.5, 0.0,   0.25, 0.00,
     0.50, -0.50,  0.00,  0.0, 0.0, 1.0,   0.50, 0.00,
     0.00, -0.50, -0.50,  0.0, 0.5, 0.5,   1.00, 0.00,
];

#[rustfmt::skip]
const BOTTLE_INDICES: [u32; 28 * 3] = [
    // cap
    0, 4, 1,    4, 5, 1,    1, 5, 2,    2, 5, 6,    2, 6, 7,
    3, 2, 7,    3, 7, 4,    0, 3, 4,    0, 1, 3,    1, 2, 3,
    // shoulder
    4, 8, 9,    4, 9, 5,    5, 9, 10,   10, 6, 5,
    7, 11, 4,   4, 11, 8,   6, 10, 11,  6, 11, 7,
    // body
    8, 12, 9,   9, 12, 13,  9, 13, 14,  14, 10, 9,
    10, 14, 15, 11, 10, 15, 8, 12, 15,  15, 11, 8,
    // bottom
    12, 13, 14, 14, 12, 15,
];

#[rustfmt::skip]
const PLANE_VERTICES: [f32; 4 * 6] = [
    -1.0, 0.0,  1.0,   0.0, 1.0, 0.0,
    -1.0, 0.0, -1.0,   0.0, 1.0, 0.0,
     1.0, 0.0,  1.0,   0.0, 1.0, 0.0,
     1.0, 0.0, -1.0,   0.0, 1.0, 0.0,
];

const PLANE_INDICES: [u32; 6] = [1, 0, 3, 3, 0, 2];

#[rustfmt::skip]
const TABLET_VERTICES: [f32; 8 * 8] = [
    -0.5,  0.5, 1.0,   0.0, 1.0, 0.0,   0.0, 0.0,
     0.5,  0.5, 1.0,   0.0, 1.0, 0.0,   1.0, 0.0,
     0.5,  0.5, 0.0,   0.0, 1.0, 0.0,   1.0, 1.0,
    -0.5,  0.5, 0.0,   0.0, 1.0, 0.0,   0.0, 1.0,
    -0.5, -0.5, 1.0,   0.0, 1.0, 0.0,   1.0, 0.0,
     0.5, -0.5, 1.0,   0.0, 1.0, 0.0,   0.0, 0.0,
     0.5, -0.5, 0.0,   0.0, 1.0, 0.0,   0.0, 1.0,
    -0.5, -0.5, 0.0,   0.0, 1.0, 0.0,   1.0, 1.0,
];

#[rustfmt::skip]
const TABLET_INDICES: [u32; 12 * 3] = [
    0, 2, 3,   0, 1, 2,
    4, 7, 6,   4, 6, 5,
    7, 0, 3,   4, 0, 7,
    4, 1, 0,   5, 1, 4,
    5, 2, 1,   6, 2, 5,
    6, 3, 2,   7, 3, 6,
];

#[rustfmt::skip]
const CHARGER_VERTICES: [f32; 18 * 6] = [
    -1.0, 1.0,  0.5,   0.0, 1.0, 0.0,
    -0.5, 1.0,  1.0,   0.0, 1.0, 0.0,
     0.5, 1.0,  1.0,   0.0, 1.0, 0.0,
     1.0, 1.0,  0.5,   0.0, 1.0, 0.0,
     1.0, 1.0, -0.5,   0.0, 1.0, 0.0,
     0.5, 1.0, -1.0,   0.0, 1.0, 0.0,
    -0.5, 1.0, -1.0,   0.0, 1.0, 0.0,
    -1.0, 1.0, -0.5,   0.0, 1.0, 0.0,
     0.0, 1.0,  0.0,   0.0, 1.0, 0.0,
    -1.0, 0.0,  0.5,   0.0, 1.0, 0.0,
    -0.5, 0.0,  1.0,   0.0, 1.0, 0.0,
     0.5, 0.0,  1.0,   0.0, 1.0, 0.0,
     1.0, 0.0,  0.5,   0.0, 1.0, 0.0,
     1.0, 0.0, -0.5,   0.0, 1.0, 0.0,
     0.5, 0.0, -1.0,   0.0, 1.0, 0.0,
    -0.5, 0.0, -1.0,   0.0, 1.0, 0.0,
    -1.0, 0.0, -0.5,   0.0, 1.0, 0.0,
     0.0, 0.0,  0.0,   0.0, 1.0, 0.0,
];

#[rustfmt::skip]
const PENCIL_VERTICES: [f32; 19 * 6] = [
    -1.0,  0.0,  0.5,   1.0, 1.0, 1.0,
    -0.5,  0.0,  1.0,   1.0, 1.0, 1.0,
     0.5,  0.0,  1.0,   1.0, 1.0, 1.0,
     1.0,  0.0,  0.5,   1.0, 1.0, 1.0,
     1.0,  0.0, -0.5,   1.0, 1.0, 1.0,
     0.5,  0.0, -1.0,   1.0, 1.0, 1.0,
    -0.5,  0.0, -1.0,   1.0, 1.0, 1.0,
    -1.0,  0.0, -0.5,   1.0, 1.0, 1.0,
     0.0,  0.0,  0.0,   1.0, 1.0, 1.0,
    -1.0, -1.0,  0.5,   1.0, 1.0, 1.0,
    -0.5, -1.0,  1.0,   1.0, 1.0, 1.0,
     0.5, -1.0,  1.0,   1.0, 1.0, 1.0,
     1.0, -1.0,  0.5,   1.0, 1.0, 1.0,
     1.0, -1.0, -0.5,   1.0, 1.0, 1.0,
     0.5, -1.0, -1.0,   1.0, 1.0, 1.0,
    -0.5, -1.0, -1.0,   1.0, 1.0, 1.0,
    -1.0, -1.0, -0.5,   1.0, 1.0, 1.0,
     0.0, -1.0,  0.0,   1.0, 1.0, 1.0,
     // tip
     0.0,  0.25, 0.0,   1.0, 1.0, 1.0,
];

/// Top cap, bottom cap and side walls of an 8-sided prism.
#[rustfmt::skip]
const PRISM_INDICES: [u32; 32 * 3] = [
    0, 8, 7,    7, 8, 6,    6, 8, 5,    5, 8, 4,
    4, 8, 3,    3, 8, 2,    2, 8, 1,    1, 8, 0,
    9, 17, 10,  10, 17, 11, 11, 17, 12, 12, 17, 13,
    13, 17, 14, 14, 17, 15, 15, 17, 16, 16, 17, 9,
    15, 7, 6,   16, 7, 15,  16, 0, 7,   9, 0, 16,
    9, 1, 0,    10, 1, 9,   10, 2, 1,   11, 2, 10,
    11, 3, 2,   12, 3, 11,  12, 4, 3,   13, 4, 12,
    13, 5, 4,   14, 5, 13,  14, 6, 5,   15, 6, 14,
];

#[rustfmt::skip]
const PENCIL_TIP_INDICES: [u32; 8 * 3] = [
    0, 18, 7,   7, 18, 6,   6, 18, 5,   5, 18, 4,
    4, 18, 3,   3, 18, 2,   2, 18, 1,   1, 18, 0,
];

pub fn bottle() -> Result<Mesh, MeshError> {
    Mesh::from_tables(VertexLayout::PositionColorTexcoord, &BOTTLE_VERTICES, &BOTTLE_INDICES)
}

/// Unit ground quad in the XZ plane with a +Y normal.
pub fn plane() -> Result<Mesh, MeshError> {
    Mesh::from_tables(VertexLayout::PositionNormal, &PLANE_VERTICES, &PLANE_INDICES)
}

pub fn tablet() -> Result<Mesh, MeshError> {
    Mesh::from_tables(VertexLayout::PositionColorTexcoord, &TABLET_VERTICES, &TABLET_INDICES)
}

pub fn charger() -> Result<Mesh, MeshError> {
    Mesh::from_tables(VertexLayout::PositionColor, &CHARGER_VERTICES, &PRISM_INDICES)
}

/// Charger-shaped body with a cone tip on top.
pub fn pencil() -> Result<Mesh, MeshError> {
    let indices = PRISM_INDICES
        .iter()
        .chain(PENCIL_TIP_INDICES.iter())
        .copied()
        .collect();
    Mesh::new(VertexLayout::PositionColor, PENCIL_VERTICES.to_vec(), indices)
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    fn assert_well_formed(mesh: &Mesh) {
        for [a, b, c] in mesh.triangles() {
            assert!(a != b && b != c && a != c, "degenerate triangle {a},{b},{c}");
            for index in [a, b, c] {
                assert!((index as usize) < mesh.vertex_count());
            }
        }
    }

    /// Every face normal must point away from the centroid of a convex mesh.
    fn assert_outward_winding(mesh: &Mesh) {
        let centroid = (0..mesh.vertex_count())
            .map(|index| mesh.position(index))
            .sum::<Vec3>()
            / mesh.vertex_count() as f32;
        for [a, b, c] in mesh.triangles() {
            let (pa, pb, pc) = (
                mesh.position(a as usize),
                mesh.position(b as usize),
                mesh.position(c as usize),
            );
            let normal = (pb - pa).cross(pc - pa);
            let face_center = (pa + pb + pc) / 3.0;
            assert!(
                normal.dot(face_center - centroid) > 0.0,
                "triangle {a},{b},{c} winds inward"
            );
        }
    }

    #[test]
    fn table_sizes_match_reference_objects() {
        let expected = [
            (bottle(), 16, 28, VertexLayout::PositionColorTexcoord),
            (plane(), 4, 2, VertexLayout::PositionNormal),
            (tablet(), 8, 12, VertexLayout::PositionColorTexcoord),
            (charger(), 18, 32, VertexLayout::PositionColor),
            (pencil(), 19, 40, VertexLayout::PositionColor),
        ];
        for (mesh, vertices, triangles, layout) in expected {
            let mesh = mesh.unwrap();
            assert_eq!(mesh.vertex_count(), vertices);
            assert_eq!(mesh.triangle_count(), triangles);
            assert_eq!(mesh.layout(), layout);
            assert_well_formed(&mesh);
        }
    }

    #[test]
    fn charger_and_pencil_wind_outward() {
        assert_outward_winding(&charger().unwrap());
        assert_outward_winding(&pencil().unwrap());
    }

    #[test]
    fn bottom_caps_use_the_bottom_hub() {
        for mesh in [charger().unwrap(), pencil().unwrap()] {
            let bottom_fan: Vec<_> = mesh.triangles().skip(8).take(8).collect();
            assert!(bottom_fan.iter().all(|tri| tri[1] == 17));
        }
    }

    #[test]
    fn plane_normals_point_up() {
        let mesh = plane().unwrap();
        for vertex in mesh.vertices().chunks_exact(6) {
            assert_eq!(&vertex[3..], &[0.0, 1.0, 0.0]);
        }
    }
}

//! Procedural meshes with outward counter-clockwise winding.

use std::f32::consts::PI;

use lumen_math::Vec3;

use crate::GeometryDescriptor;

/// Unit cube centered at the origin with 24 corner entries, so every face
/// carries its own vertices and shades flat.
pub fn cube() -> GeometryDescriptor {
    // (outward normal, u axis, v axis) with u x v == normal
    let faces = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];
    let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

    let mut vertices = Vec::with_capacity(24 * 3);
    let mut uvs = Vec::with_capacity(24 * 2);
    let mut indices = Vec::with_capacity(36);

    for (face, (normal, u, v)) in faces.iter().enumerate() {
        let base = (face * 4) as u32;
        for (su, sv) in corners {
            let p = (*normal + *u * su + *v * sv) * 0.5;
            vertices.extend_from_slice(&p.to_array());
            uvs.extend_from_slice(&[(su + 1.0) * 0.5, (sv + 1.0) * 0.5]);
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    let mut cube = GeometryDescriptor::new(vertices, indices).with_alias("cube");
    cube.texture_coords = Some(uvs);
    cube
}

/// Latitude/longitude sphere. Seam vertices are duplicated so texture
/// coordinates wrap cleanly.
pub fn uv_sphere(latitude_bands: u32, longitude_bands: u32, radius: f32) -> GeometryDescriptor {
    let lat_bands = latitude_bands.max(2);
    let long_bands = longitude_bands.max(3);

    let mut vertices = Vec::new();
    let mut uvs = Vec::new();

    for lat in 0..=lat_bands {
        let theta = lat as f32 * PI / lat_bands as f32;
        let (sin_theta, cos_theta) = theta.sin_cos();

        for long in 0..=long_bands {
            let phi = long as f32 * 2.0 * PI / long_bands as f32;
            let (sin_phi, cos_phi) = phi.sin_cos();

            let dir = Vec3::new(cos_phi * sin_theta, cos_theta, sin_phi * sin_theta);
            vertices.extend_from_slice(&(dir * radius).to_array());
            uvs.push(1.0 - long as f32 / long_bands as f32);
            uvs.push(1.0 - lat as f32 / lat_bands as f32);
        }
    }

    let mut indices = Vec::new();
    let row = long_bands + 1;
    for lat in 0..lat_bands {
        for long in 0..long_bands {
            let first = lat * row + long;
            let second = first + row;
            indices.extend_from_slice(&[first, first + 1, second]);
            indices.extend_from_slice(&[second, first + 1, second + 1]);
        }
    }

    let mut sphere = GeometryDescriptor::new(vertices, indices).with_alias("sphere");
    sphere.texture_coords = Some(uvs);
    sphere
}

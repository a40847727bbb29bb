// mesh.rs — 房间球面网格生成
// 球体从内部观看：X 轴镜像，法线与绕序一起翻转

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

#[derive(Debug, Clone)]
pub struct SphereMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl SphereMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Sphere of `radius` seen from its centre. `lon`/`lat` are the horizontal
/// and vertical segment counts.
pub fn build_inside_sphere(radius: f32, lon: usize, lat: usize) -> SphereMesh {
    let lon = lon.max(3);
    let lat = lat.max(2);

    let mut vertices = Vec::with_capacity((lat + 1) * (lon + 1));
    let mut indices = Vec::with_capacity(lat * lon * 6);

    for i in 0..=lat {
        let theta = std::f32::consts::PI * (i as f32) / (lat as f32);
        let y = radius * theta.cos();
        let sin_t = theta.sin();

        for j in 0..=lon {
            let phi = 2.0 * std::f32::consts::PI * (j as f32) / (lon as f32);

            // 镜像 X（相当于 scale(-1, 1, 1)）
            let x = radius * phi.cos() * sin_t;
            let z = radius * phi.sin() * sin_t;

            // 纹理原点在左上角：v=0 为北极
            let u = (j as f32) / (lon as f32);
            let v = (i as f32) / (lat as f32);

            vertices.push(Vertex {
                position: [x, y, z],
                uv: [u, v],
            });
        }
    }

    for i in 0..lat {
        for j in 0..lon {
            let a = (i * (lon + 1) + j) as u32;
            let b = a + (lon + 1) as u32;

            // 镜像后此绕序的正面朝向球心
            indices.extend_from_slice(&[
                a, b, a + 1,
                b, b + 1, a + 1,
            ]);
        }
    }

    SphereMesh { vertices, indices }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertices_lie_on_sphere() {
        let mesh = build_inside_sphere(500.0, 60, 40);
        assert_eq!(mesh.vertices.len(), 61 * 41);
        assert_eq!(mesh.triangle_count(), 60 * 40 * 2);
        for v in &mesh.vertices {
            let [x, y, z] = v.position;
            let r = (x * x + y * y + z * z).sqrt();
            assert!((r - 500.0).abs() < 0.01);
        }
    }

    #[test]
    fn test_faces_point_inward() {
        let mesh = build_inside_sphere(10.0, 16, 8);
        // 取赤道附近的一个三角形，法线应指向球心
        let row = 4;
        let a = (row * 17 + 3) as usize;
        let tri = mesh
            .indices
            .chunks(3)
            .find(|t| t[0] as usize == a)
            .unwrap();
        let p = |i: u32| glam::Vec3::from(mesh.vertices[i as usize].position);
        let (p0, p1, p2) = (p(tri[0]), p(tri[1]), p(tri[2]));
        let normal = (p1 - p0).cross(p2 - p0);
        let centroid = (p0 + p1 + p2) / 3.0;
        assert!(normal.dot(centroid) < 0.0);
    }

    #[test]
    fn test_indices_in_range() {
        let mesh = build_inside_sphere(1.0, 3, 2);
        let n = mesh.vertices.len() as u32;
        assert!(mesh.indices.iter().all(|&i| i < n));
    }
}

// scene.rs — 渲染端接口：房间球面、热点标记、光标
//
// 引擎只通过这个 trait 与渲染器交互；wgpu 实现在 renderer.rs，
// RecordingScene 记录所有调用，用于无 GPU 的测试与检查。

use std::collections::BTreeMap;

use glam::Vec3;
use image::RgbaImage;

use crate::mesh::SphereMesh;
use crate::resources::TextureHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorStyle {
    #[default]
    Default,
    Pointer,
}

/// A textured panorama surface to add to the scene.
pub struct SurfaceDesc<'a> {
    pub label: &'a str,
    pub mesh: &'a SphereMesh,
    /// Borrowed from the resource cache; the scene must not free it with the surface.
    pub texture: Option<&'a TextureHandle>,
}

/// A camera-facing marker. The scene takes ownership of `image` and frees
/// it together with the marker.
pub struct MarkerDesc {
    pub label: String,
    pub position: Vec3,
    pub size: f32,
    pub opacity: f32,
    pub image: RgbaImage,
}

/// Scene graph collaborator. Surfaces are drawn first, in insertion order;
/// markers are drawn on top without depth testing.
pub trait Scene {
    fn add_surface(&mut self, desc: SurfaceDesc<'_>) -> SurfaceId;
    /// `blending` selects the alpha-blended draw path; `false` draws fully opaque.
    fn set_surface_opacity(&mut self, id: SurfaceId, opacity: f32, blending: bool);
    /// Frees the surface geometry and material. The texture stays with its owner.
    fn remove_surface(&mut self, id: SurfaceId);

    fn add_marker(&mut self, desc: MarkerDesc) -> MarkerId;
    fn update_marker(&mut self, id: MarkerId, size: f32, opacity: f32);
    /// Frees the marker geometry, material and texture.
    fn remove_marker(&mut self, id: MarkerId);

    fn set_cursor(&mut self, cursor: CursorStyle);
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSurface {
    pub label: String,
    pub texture: Option<String>,
    pub triangles: usize,
    pub opacity: f32,
    pub blending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedMarker {
    pub label: String,
    pub position: Vec3,
    pub size: f32,
    pub opacity: f32,
}

/// In-memory scene that keeps what a renderer would hold, plus a log of
/// disposals so resource lifecycles can be checked.
#[derive(Debug, Default)]
pub struct RecordingScene {
    next_id: u32,
    pub surfaces: BTreeMap<SurfaceId, RecordedSurface>,
    pub markers: BTreeMap<MarkerId, RecordedMarker>,
    pub removed_surfaces: Vec<SurfaceId>,
    pub removed_markers: Vec<MarkerId>,
    pub cursor: CursorStyle,
}

impl RecordingScene {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn surface(&self, id: SurfaceId) -> Option<&RecordedSurface> {
        self.surfaces.get(&id)
    }

    pub fn marker(&self, id: MarkerId) -> Option<&RecordedMarker> {
        self.markers.get(&id)
    }
}

impl Scene for RecordingScene {
    fn add_surface(&mut self, desc: SurfaceDesc<'_>) -> SurfaceId {
        let id = SurfaceId(self.next());
        self.surfaces.insert(
            id,
            RecordedSurface {
                label: desc.label.to_string(),
                texture: desc.texture.map(|t| t.name().to_string()),
                triangles: desc.mesh.triangle_count(),
                opacity: 1.0,
                blending: false,
            },
        );
        id
    }

    fn set_surface_opacity(&mut self, id: SurfaceId, opacity: f32, blending: bool) {
        if let Some(surface) = self.surfaces.get_mut(&id) {
            surface.opacity = opacity;
            surface.blending = blending;
        }
    }

    fn remove_surface(&mut self, id: SurfaceId) {
        if self.surfaces.remove(&id).is_some() {
            self.removed_surfaces.push(id);
        }
    }

    fn add_marker(&mut self, desc: MarkerDesc) -> MarkerId {
        let id = MarkerId(self.next());
        self.markers.insert(
            id,
            RecordedMarker {
                label: desc.label,
                position: desc.position,
                size: desc.size,
                opacity: desc.opacity,
            },
        );
        id
    }

    fn update_marker(&mut self, id: MarkerId, size: f32, opacity: f32) {
        if let Some(marker) = self.markers.get_mut(&id) {
            marker.size = size;
            marker.opacity = opacity;
        }
    }

    fn remove_marker(&mut self, id: MarkerId) {
        if self.markers.remove(&id).is_some() {
            self.removed_markers.push(id);
        }
    }

    fn set_cursor(&mut self, cursor: CursorStyle) {
        self.cursor = cursor;
    }
}

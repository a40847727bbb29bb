// room.rs — 360° 房间：内表面贴全景图的巨型球体
//
// 纹理归 ResourceCache 所有，Room 只持有引用，销毁时不释放纹理。

use log::{debug, error};

use crate::config::EngineConfig;
use crate::error::TourError;
use crate::mesh::build_inside_sphere;
use crate::resources::{ResourceCache, TextureHandle};
use crate::scene::{Scene, SurfaceDesc, SurfaceId};
use crate::tour::RoomDescriptor;

#[derive(Debug)]
pub struct Room {
    descriptor: RoomDescriptor,
    surface: SurfaceId,
    texture: Option<TextureHandle>,
    opacity: f32,
    blending: bool,
    destroyed: bool,
}

impl Room {
    /// Build the room surface. A texture missing from the cache is logged
    /// and the surface is left untextured; construction never fails.
    pub fn new(
        descriptor: &RoomDescriptor,
        cache: &ResourceCache,
        scene: &mut dyn Scene,
        config: &EngineConfig,
    ) -> Self {
        let texture = cache.get(descriptor.texture_name());
        if texture.is_none() {
            let err = TourError::MissingAsset {
                name: descriptor.texture_name().to_string(),
            };
            error!("room `{}`: {}", descriptor.id, err);
        }

        let mesh = build_inside_sphere(
            config.sphere_radius,
            config.sphere_width_segments,
            config.sphere_height_segments,
        );
        let label = format!("Room360_{}", descriptor.display_name());
        let surface = scene.add_surface(SurfaceDesc {
            label: &label,
            mesh: &mesh,
            texture: texture.as_ref(),
        });
        debug!("room `{}` built ({} triangles)", descriptor.id, mesh.triangle_count());

        Self {
            descriptor: descriptor.clone(),
            surface,
            texture,
            opacity: 1.0,
            blending: false,
            destroyed: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    pub fn name(&self) -> &str {
        self.descriptor.display_name()
    }

    pub fn descriptor(&self) -> &RoomDescriptor {
        &self.descriptor
    }

    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    pub fn texture(&self) -> Option<&TextureHandle> {
        self.texture.as_ref()
    }

    pub fn is_textured(&self) -> bool {
        self.texture.is_some()
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn is_blending(&self) -> bool {
        self.blending
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Material opacity, driven by the room transition.
    pub fn set_opacity(&mut self, scene: &mut dyn Scene, opacity: f32) {
        if self.destroyed {
            return;
        }
        self.opacity = opacity.clamp(0.0, 1.0);
        scene.set_surface_opacity(self.surface, self.opacity, self.blending);
    }

    pub fn set_blending(&mut self, scene: &mut dyn Scene, blending: bool) {
        if self.destroyed {
            return;
        }
        self.blending = blending;
        scene.set_surface_opacity(self.surface, self.opacity, self.blending);
    }

    /// Free geometry and material. The texture reference is dropped, never
    /// disposed. Later calls do nothing.
    pub fn destroy(&mut self, scene: &mut dyn Scene) {
        if self.destroyed {
            return;
        }
        scene.remove_surface(self.surface);
        self.texture = None;
        self.destroyed = true;
        debug!("room `{}` destroyed", self.descriptor.id);
    }
}

// 测试用的房间描述与加载器

use futures::future::{FutureExt, LocalBoxFuture};
use image::{Rgba, RgbaImage};

use crate::error::LoadError;
use crate::resources::{ResourceCache, TextureLoader};
use crate::tour::{HotspotDescriptor, Position, RoomDescriptor};

/// Loader that answers every fetch with a tiny grey panorama.
#[derive(Default)]
pub struct StaticLoader;

impl TextureLoader for StaticLoader {
    fn fetch(&self, _source: &str) -> LocalBoxFuture<'static, Result<RgbaImage, LoadError>> {
        async { Ok::<_, LoadError>(RgbaImage::from_pixel(4, 2, Rgba([128, 128, 128, 255]))) }.boxed_local()
    }
}

/// Cache with the given texture names already resolved.
pub fn cache_with(names: &[&str]) -> ResourceCache {
    let cache = ResourceCache::new(StaticLoader);
    for name in names {
        cache.insert(name, RgbaImage::from_pixel(4, 2, Rgba([128, 128, 128, 255])));
    }
    cache
}

/// Room `id` named "Room <id>" with panorama "<id>.jpg". Hotspots are
/// `(hotspot id, position, target room)`.
pub fn descriptor(id: &str, is_start: bool, hotspots: &[(&str, (f32, f32, f32), &str)]) -> RoomDescriptor {
    RoomDescriptor {
        id: id.into(),
        name: format!("Room {id}"),
        image_url: format!("{id}.jpg"),
        is_start,
        hotspots: hotspots
            .iter()
            .map(|&(hid, (x, y, z), target)| HotspotDescriptor {
                id: hid.into(),
                position: Position { x, y, z },
                target_room: target.into(),
                label: format!("to {target}"),
            })
            .collect(),
    }
}

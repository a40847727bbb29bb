// lib.rs — 360° 全景导览引擎
//
// 房间是内表面贴全景图的球体，热点是朝向相机的标记，
// 点击热点后通过缩放 + 交叉淡入淡出切换到目标房间。

pub mod camera;
pub mod config;
pub mod error;
pub mod hotspot;
pub mod i18n;
pub mod mesh;
pub mod picker;
pub mod ray;
pub mod renderer;
pub mod resources;
pub mod room;
pub mod scene;
pub mod tour;
pub mod transition;
pub mod world;

#[cfg(test)]
pub(crate) mod test_support;

pub use camera::TourCamera;
pub use config::{Args, EngineConfig, TransitionTimings};
pub use error::{LoadError, RenderError, TourError};
pub use resources::{FileLoader, ResourceCache, TextureLoader};
pub use scene::{RecordingScene, Scene};
pub use tour::{RoomId, TourGraph};
pub use world::{NavState, TourEvent, World};

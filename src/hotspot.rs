// hotspot.rs — 可点击的热点标记（始终面向相机）

use glam::Vec3;
use image::{Rgba, RgbaImage};
use log::debug;

use crate::config::EngineConfig;
use crate::picker::{HitTag, HotspotKey, Intersectable};
use crate::ray::Billboard;
use crate::scene::{CursorStyle, MarkerDesc, MarkerId, Scene};
use crate::tour::HotspotDescriptor;

const MARKER_PIXELS: u32 = 128;
const BASE_OPACITY: f32 = 0.8;

/// Ring-and-dot marker with a forward arrow cut out of the dot.
pub fn marker_image() -> RgbaImage {
    let size = MARKER_PIXELS as f32;
    let c = size / 2.0;
    let ring_radius = size / 2.0 - 10.0;
    let dot_radius = size / 4.0;

    RgbaImage::from_fn(MARKER_PIXELS, MARKER_PIXELS, |x, y| {
        let (px, py) = (x as f32 + 0.5 - c, y as f32 + 0.5 - c);
        let d = (px * px + py * py).sqrt();

        let on_ring = (d - ring_radius).abs() <= 2.0;
        let in_dot = d <= dot_radius;
        // 箭头：横杆 + 三角形箭头，指向 +X
        let in_shaft = px >= -14.0 && px <= 2.0 && py.abs() <= 3.0;
        let in_head = px >= 2.0 && px <= 16.0 && py.abs() <= (16.0 - px) * 0.7;

        if in_dot && (in_shaft || in_head) {
            Rgba([0, 0, 0, 255])
        } else if on_ring || in_dot {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

/// A clickable marker anchored in the current room.
#[derive(Debug)]
pub struct Hotspot {
    descriptor: HotspotDescriptor,
    key: HotspotKey,
    marker: MarkerId,
    position: Vec3,
    base_size: f32,

    is_hovered: bool,
    scale: f32,
    target_scale: f32,
    opacity: f32,

    hover_scale: f32,
    idle_scale: f32,
    smoothing_rate: f32,
    pulse: (f32, f32, f32),
    destroyed: bool,
}

impl Hotspot {
    pub fn new(
        key: HotspotKey,
        descriptor: &HotspotDescriptor,
        scene: &mut dyn Scene,
        config: &EngineConfig,
    ) -> Self {
        let position = Vec3::from(descriptor.position);
        let marker = scene.add_marker(MarkerDesc {
            label: descriptor.label.clone(),
            position,
            size: config.marker_size * config.idle_scale,
            opacity: BASE_OPACITY,
            image: marker_image(),
        });

        Self {
            descriptor: descriptor.clone(),
            key,
            marker,
            position,
            base_size: config.marker_size,
            is_hovered: false,
            scale: config.idle_scale,
            target_scale: config.idle_scale,
            opacity: BASE_OPACITY,
            hover_scale: config.hover_scale,
            idle_scale: config.idle_scale,
            smoothing_rate: config.scale_smoothing_rate,
            pulse: (
                config.pulse_frequency,
                config.pulse_center,
                config.pulse_amplitude,
            ),
            destroyed: false,
        }
    }

    pub fn key(&self) -> HotspotKey {
        self.key
    }

    pub fn marker(&self) -> MarkerId {
        self.marker
    }

    pub fn descriptor(&self) -> &HotspotDescriptor {
        &self.descriptor
    }

    pub fn is_hovered(&self) -> bool {
        self.is_hovered
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn target_scale(&self) -> f32 {
        self.target_scale
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Hit metadata the picker stores for this marker.
    pub fn intersectable(&self) -> Intersectable {
        Intersectable {
            marker: self.marker,
            tag: HitTag::Hotspot {
                owner: self.key,
                target_room_id: self.descriptor.target_room.clone(),
                label: self.descriptor.label.clone(),
            },
        }
    }

    /// Current pickable extent; grows with the hover scale.
    pub fn billboard(&self) -> Billboard {
        let size = self.base_size * self.scale;
        Billboard {
            center: self.position,
            width: size,
            height: size,
        }
    }

    pub fn on_hover(&mut self, scene: &mut dyn Scene) {
        if self.is_hovered {
            return;
        }
        debug!("hover in `{}`", self.descriptor.id);
        self.is_hovered = true;
        self.target_scale = self.hover_scale;
        scene.set_cursor(CursorStyle::Pointer);
    }

    pub fn on_hover_out(&mut self, scene: &mut dyn Scene) {
        if !self.is_hovered {
            return;
        }
        debug!("hover out `{}`", self.descriptor.id);
        self.is_hovered = false;
        self.target_scale = self.idle_scale;
        scene.set_cursor(CursorStyle::Default);
    }

    /// Per-frame animation. `dt` and `elapsed` are in seconds.
    ///
    /// Scale eases toward its target with a time-based exponential blend,
    /// so convergence speed does not depend on the frame rate. While idle,
    /// opacity pulses sinusoidally between `center ± amplitude`.
    pub fn update(&mut self, dt: f32, elapsed: f32, scene: &mut dyn Scene) {
        if self.destroyed {
            return;
        }

        let blend = 1.0 - (-self.smoothing_rate * dt.max(0.0)).exp();
        self.scale += (self.target_scale - self.scale) * blend;

        if !self.is_hovered {
            let (frequency, center, amplitude) = self.pulse;
            self.opacity = center + (elapsed * frequency).sin() * amplitude;
        }

        scene.update_marker(self.marker, self.base_size * self.scale, self.opacity);
    }

    /// Release the marker with its texture. Safe to call more than once.
    pub fn destroy(&mut self, scene: &mut dyn Scene) {
        if self.destroyed {
            return;
        }
        if self.is_hovered {
            scene.set_cursor(CursorStyle::Default);
        }
        scene.remove_marker(self.marker);
        self.destroyed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::RecordingScene;
    use crate::tour::Position;

    fn descriptor() -> HotspotDescriptor {
        HotspotDescriptor {
            id: "h1".into(),
            position: Position {
                x: 200.0,
                y: 0.0,
                z: -400.0,
            },
            target_room: "b".into(),
            label: "To B".into(),
        }
    }

    fn hotspot(scene: &mut RecordingScene) -> Hotspot {
        Hotspot::new(HotspotKey(1), &descriptor(), scene, &EngineConfig::default())
    }

    #[test]
    fn test_marker_created_at_anchor() {
        let mut scene = RecordingScene::new();
        let h = hotspot(&mut scene);
        let marker = scene.marker(h.marker()).unwrap();
        assert_eq!(marker.position, Vec3::new(200.0, 0.0, -400.0));
        assert_eq!(marker.size, 20.0);
        assert_eq!(marker.label, "To B");
    }

    #[test]
    fn test_hover_is_idempotent() {
        let mut scene = RecordingScene::new();
        let mut h = hotspot(&mut scene);
        h.on_hover(&mut scene);
        h.on_hover(&mut scene);
        assert!(h.is_hovered());
        assert_eq!(h.target_scale(), 1.3);
        assert_eq!(scene.cursor, CursorStyle::Pointer);
    }

    #[test]
    fn test_hover_out_restores_idle() {
        let mut scene = RecordingScene::new();
        let mut h = hotspot(&mut scene);
        h.on_hover(&mut scene);
        h.on_hover_out(&mut scene);
        assert!(!h.is_hovered());
        assert_eq!(h.target_scale(), 1.0);
        assert_eq!(scene.cursor, CursorStyle::Default);

        // 未悬停时再次 hover out 不改变光标
        scene.set_cursor(CursorStyle::Pointer);
        h.on_hover_out(&mut scene);
        assert_eq!(scene.cursor, CursorStyle::Pointer);
    }

    #[test]
    fn test_scale_converges_independent_of_frame_rate() {
        let mut scene = RecordingScene::new();
        let mut fast = hotspot(&mut scene);
        let mut slow = hotspot(&mut scene);
        fast.on_hover(&mut scene);
        slow.on_hover(&mut scene);

        for i in 0..120 {
            fast.update(1.0 / 120.0, i as f32 / 120.0, &mut scene);
        }
        for i in 0..30 {
            slow.update(1.0 / 30.0, i as f32 / 30.0, &mut scene);
        }
        assert!((fast.scale() - slow.scale()).abs() < 1e-3);
        assert!(fast.scale() > 1.29);
        assert!((scene.marker(fast.marker()).unwrap().size - 20.0 * fast.scale()).abs() < 1e-4);
    }

    #[test]
    fn test_idle_pulse_stays_in_bounds() {
        let mut scene = RecordingScene::new();
        let mut h = hotspot(&mut scene);
        let mut seen_low = f32::MAX;
        let mut seen_high = f32::MIN;
        for i in 0..1000 {
            h.update(0.016, i as f32 * 0.016, &mut scene);
            assert!(h.opacity() >= 0.5 - 1e-6 && h.opacity() <= 0.9 + 1e-6);
            seen_low = seen_low.min(h.opacity());
            seen_high = seen_high.max(h.opacity());
        }
        assert!(seen_low < 0.55 && seen_high > 0.85);
    }

    #[test]
    fn test_hovered_marker_does_not_pulse() {
        let mut scene = RecordingScene::new();
        let mut h = hotspot(&mut scene);
        h.on_hover(&mut scene);
        let before = h.opacity();
        h.update(0.016, 0.7, &mut scene);
        assert_eq!(h.opacity(), before);
    }

    #[test]
    fn test_destroy_releases_marker_once() {
        let mut scene = RecordingScene::new();
        let mut h = hotspot(&mut scene);
        h.destroy(&mut scene);
        h.destroy(&mut scene);
        assert!(scene.markers.is_empty());
        assert_eq!(scene.removed_markers, vec![h.marker()]);
    }

    #[test]
    fn test_marker_image_has_transparent_corners() {
        let img = marker_image();
        assert_eq!(img.get_pixel(0, 0)[3], 0);
        assert_eq!(img.get_pixel(64, 64), &Rgba([0, 0, 0, 255]));
        assert_eq!(img.get_pixel(64, 64 + 25)[3], 255);
    }
}

// picker.rs — 指针拾取：屏幕坐标 → 射线 → 最近的热点

use std::sync::mpsc::Sender;

use glam::Vec2;
use log::{debug, info};

use crate::camera::TourCamera;
use crate::ray::Billboard;
use crate::scene::MarkerId;
use crate::tour::RoomId;

/// Identity of a live hotspot, unique for the lifetime of a `World`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HotspotKey(pub u32);

/// What a pickable object is, resolved from its marker id.
#[derive(Debug, Clone, PartialEq)]
pub enum HitTag {
    Hotspot {
        owner: HotspotKey,
        target_room_id: RoomId,
        label: String,
    },
    /// Pickable but inert: blocks hits behind it, never navigates.
    Decoration,
}

impl HitTag {
    pub fn owner(&self) -> Option<HotspotKey> {
        match self {
            HitTag::Hotspot { owner, .. } => Some(*owner),
            HitTag::Decoration => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Intersectable {
    pub marker: MarkerId,
    pub tag: HitTag,
}

/// Request to move to another room, raised by clicking a hotspot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationIntent {
    pub target_room_id: RoomId,
    pub label: String,
}

/// Geometry and hover reactions of the registered objects, supplied by
/// whoever owns them.
pub trait PickTarget {
    fn billboard(&self, marker: MarkerId) -> Option<Billboard>;
    fn hover(&mut self, owner: HotspotKey);
    fn hover_out(&mut self, owner: HotspotKey);
}

pub struct PointerPicker {
    intersectables: Vec<Intersectable>,
    pointer: Vec2,
    viewport: (f32, f32),
    hovered: Option<HotspotKey>,
    intents: Option<Sender<NavigationIntent>>,
}

impl PointerPicker {
    pub fn new(intents: Sender<NavigationIntent>) -> Self {
        Self {
            intersectables: Vec::new(),
            pointer: Vec2::ZERO,
            viewport: (0.0, 0.0),
            hovered: None,
            intents: Some(intents),
        }
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width as f32, height as f32);
    }

    pub fn add_intersectable(&mut self, object: Intersectable) {
        if !self.contains(object.marker) {
            self.intersectables.push(object);
        }
    }

    pub fn remove_intersectable(&mut self, marker: MarkerId) {
        let Some(index) = self.intersectables.iter().position(|o| o.marker == marker) else {
            return;
        };
        let removed = self.intersectables.remove(index);
        // 被移除的对象不能继续处于悬停状态
        if removed.tag.owner().is_some() && removed.tag.owner() == self.hovered {
            self.hovered = None;
        }
    }

    pub fn contains(&self, marker: MarkerId) -> bool {
        self.intersectables.iter().any(|o| o.marker == marker)
    }

    pub fn intersectables(&self) -> impl Iterator<Item = MarkerId> + '_ {
        self.intersectables.iter().map(|o| o.marker)
    }

    pub fn len(&self) -> usize {
        self.intersectables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intersectables.is_empty()
    }

    pub fn hovered(&self) -> Option<HotspotKey> {
        self.hovered
    }

    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    /// Window pixels (origin top-left) to NDC (origin centre, +Y up).
    pub fn to_ndc(&self, x: f32, y: f32) -> Option<Vec2> {
        let (w, h) = self.viewport;
        if w <= 0.0 || h <= 0.0 {
            return None;
        }
        Some(Vec2::new((x / w) * 2.0 - 1.0, -(y / h) * 2.0 + 1.0))
    }

    /// Nearest registered object under `ndc`. Equidistant hits resolve to
    /// the earliest registered object.
    pub fn pick(&self, ndc: Vec2, camera: &TourCamera, target: &dyn PickTarget) -> Option<&Intersectable> {
        let ray = camera.ray_through(ndc);
        let (right, up) = (camera.right(), camera.up());

        let mut nearest: Option<(f32, &Intersectable)> = None;
        for object in &self.intersectables {
            let Some(billboard) = target.billboard(object.marker) else {
                continue;
            };
            let Some(t) = ray.intersect_billboard(&billboard, right, up) else {
                continue;
            };
            if nearest.map_or(true, |(best, _)| t < best) {
                nearest = Some((t, object));
            }
        }
        nearest.map(|(_, object)| object)
    }

    fn cast(&mut self, x: f32, y: f32, camera: &TourCamera, target: &dyn PickTarget) -> Option<Intersectable> {
        if self.intents.is_none() {
            return None;
        }
        let ndc = self.to_ndc(x, y)?;
        self.pointer = ndc;
        self.pick(ndc, camera, target).cloned()
    }

    /// Resolve hover state for a pointer at window position `(x, y)`.
    pub fn pointer_move(&mut self, x: f32, y: f32, camera: &TourCamera, target: &mut dyn PickTarget) {
        if self.intents.is_none() || self.to_ndc(x, y).is_none() {
            return;
        }
        let owner = self.cast(x, y, camera, target).and_then(|hit| hit.tag.owner());
        if owner == self.hovered {
            return;
        }
        if let Some(old) = self.hovered.take() {
            target.hover_out(old);
        }
        if let Some(new) = owner {
            target.hover(new);
        }
        self.hovered = owner;
    }

    /// Hit-test a click. A hotspot hit is sent to the navigation channel
    /// and returned.
    pub fn click(&mut self, x: f32, y: f32, camera: &TourCamera, target: &dyn PickTarget) -> Option<NavigationIntent> {
        let hit = self.cast(x, y, camera, target)?;
        let HitTag::Hotspot {
            target_room_id,
            label,
            ..
        } = hit.tag
        else {
            debug!("click on a non-hotspot object");
            return None;
        };

        info!("hotspot clicked: {}", label);
        let intent = NavigationIntent {
            target_room_id,
            label,
        };
        if let Some(intents) = &self.intents {
            // 接收端关闭说明导航控制器已销毁
            let _ = intents.send(intent.clone());
        }
        Some(intent)
    }

    /// Touch start behaves like a move followed by a click at the first
    /// touch point, so hover state is settled before the click is judged.
    pub fn touch_start(&mut self, x: f32, y: f32, camera: &TourCamera, target: &mut dyn PickTarget) -> Option<NavigationIntent> {
        self.pointer_move(x, y, camera, target);
        self.click(x, y, camera, target)
    }

    /// Detach from input: forget every object and stop emitting intents.
    pub fn destroy(&mut self) {
        self.intersectables.clear();
        self.hovered = None;
        self.intents = None;
    }
}

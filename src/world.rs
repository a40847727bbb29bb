// world.rs — 导览控制器：房间图、当前房间状态机、点击导航
//
// 导航顺序：
//   1. 构建（或复用）目标房间
//   2. 清除并注销当前热点（过渡期间不可拾取）
//   3. 运行过渡动画
//   4. 完成后销毁旧房间并移出缓存，为新房间建立热点并注册

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::mpsc::{channel, Receiver, Sender};

use log::{error, info, warn};

use crate::camera::TourCamera;
use crate::config::EngineConfig;
use crate::error::TourError;
use crate::hotspot::Hotspot;
use crate::picker::{HotspotKey, NavigationIntent, PickTarget, PointerPicker};
use crate::ray::Billboard;
use crate::resources::ResourceCache;
use crate::room::Room;
use crate::scene::{MarkerId, Scene};
use crate::tour::{RoomDescriptor, RoomId, TourGraph};
use crate::transition::RoomTransition;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavState {
    Uninitialized,
    Ready(RoomId),
    Suspended { status: u16 },
}

/// Why a navigation request did not start a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    NotReady,
    MissingRoom,
    TransitionBusy,
    AlreadyInRoom,
}

/// Notifications for the UI layer.
#[derive(Debug, Clone, PartialEq)]
pub enum TourEvent {
    NavigationIntent(NavigationIntent),
    RoomChanged { room_id: RoomId, name: String },
    NavigationDropped { target_room_id: RoomId, reason: DropReason },
    Suspended { status: u16 },
    SetupFailed { reason: String },
}

/// Completion value of a running room transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSwap {
    from: RoomId,
    to: RoomId,
}

/// Hover/geometry view over the active hotspots for the picker.
struct HotspotTargets<'a> {
    hotspots: &'a mut [Hotspot],
    scene: &'a mut dyn Scene,
}

impl PickTarget for HotspotTargets<'_> {
    fn billboard(&self, marker: MarkerId) -> Option<Billboard> {
        self.hotspots
            .iter()
            .find(|h| h.marker() == marker)
            .map(Hotspot::billboard)
    }

    fn hover(&mut self, owner: HotspotKey) {
        if let Some(h) = self.hotspots.iter_mut().find(|h| h.key() == owner) {
            h.on_hover(self.scene);
        }
    }

    fn hover_out(&mut self, owner: HotspotKey) {
        if let Some(h) = self.hotspots.iter_mut().find(|h| h.key() == owner) {
            h.on_hover_out(self.scene);
        }
    }
}

pub struct World {
    cache: Rc<ResourceCache>,
    config: EngineConfig,
    graph: Option<TourGraph>,
    state: NavState,
    rooms: HashMap<RoomId, Room>,
    hotspots: Vec<Hotspot>,
    next_hotspot: u32,
    picker: PointerPicker,
    intents: Receiver<NavigationIntent>,
    transition: RoomTransition<PendingSwap>,
    events: Sender<TourEvent>,
}

impl World {
    pub fn new(cache: Rc<ResourceCache>, config: EngineConfig, events: Sender<TourEvent>) -> Self {
        let (intent_tx, intents) = channel();
        Self {
            cache,
            transition: RoomTransition::new(config.transition),
            config,
            graph: None,
            state: NavState::Uninitialized,
            rooms: HashMap::new(),
            hotspots: Vec::new(),
            next_hotspot: 0,
            picker: PointerPicker::new(intent_tx),
            intents,
            events,
        }
    }

    pub fn state(&self) -> &NavState {
        &self.state
    }

    pub fn current_room_id(&self) -> Option<&str> {
        match &self.state {
            NavState::Ready(id) => Some(id),
            _ => None,
        }
    }

    pub fn current_room(&self) -> Option<&Room> {
        self.current_room_id().and_then(|id| self.rooms.get(id))
    }

    pub fn room(&self, id: &str) -> Option<&Room> {
        self.rooms.get(id)
    }

    /// Ids of every room currently held in the room cache.
    pub fn cached_rooms(&self) -> impl Iterator<Item = &str> {
        self.rooms.keys().map(String::as_str)
    }

    pub fn hotspots(&self) -> &[Hotspot] {
        &self.hotspots
    }

    pub fn picker(&self) -> &PointerPicker {
        &self.picker
    }

    pub fn graph(&self) -> Option<&TourGraph> {
        self.graph.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_transitioning()
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.picker.set_viewport(width, height);
    }

    fn emit(&self, event: TourEvent) {
        // UI 可能已不再监听
        let _ = self.events.send(event);
    }

    /// Handle a tour service reply: build the tour, or report that it is
    /// suspended. A suspended tour replaces whatever was showing with nothing.
    pub fn receive_tour(
        &mut self,
        status: u16,
        body: &str,
        scene: &mut dyn Scene,
        camera: &mut TourCamera,
    ) -> bool {
        match TourGraph::from_response(status, body) {
            Ok(graph) => self.setup_tour(graph, scene, camera),
            Err(TourError::Suspended { status }) => {
                warn!("tour suspended (status {})", status);
                self.teardown(scene, camera);
                self.graph = None;
                self.state = NavState::Suspended { status };
                self.emit(TourEvent::Suspended { status });
                false
            }
            Err(err) => {
                error!("{}", err);
                self.emit(TourEvent::SetupFailed {
                    reason: err.to_string(),
                });
                false
            }
        }
    }

    /// Build the start room and its hotspots. Without a start room the
    /// controller stays uninitialized and no room is constructed.
    ///
    /// Any tour already showing is torn down first, including a transition
    /// in flight, so the new tour always starts from a still camera.
    pub fn setup_tour(
        &mut self,
        graph: TourGraph,
        scene: &mut dyn Scene,
        camera: &mut TourCamera,
    ) -> bool {
        self.teardown(scene, camera);

        if let Some(settings) = &graph.settings {
            self.config = settings.clone();
        }
        self.transition = RoomTransition::new(self.config.transition);

        for problem in graph.validate() {
            error!("{}", problem);
        }

        let Some(start) = graph.start_room().cloned() else {
            let err = TourError::DataIntegrity("no start room".into());
            error!("tour `{}` not started: {}", graph.name, err);
            self.state = NavState::Uninitialized;
            self.emit(TourEvent::SetupFailed {
                reason: err.to_string(),
            });
            return false;
        };

        let room = Room::new(&start, &self.cache, scene, &self.config);
        self.rooms.insert(start.id.clone(), room);
        self.build_hotspots(&start, scene);
        self.state = NavState::Ready(start.id.clone());
        self.graph = Some(graph);

        info!("tour ready in room `{}`", start.display_name());
        self.emit(TourEvent::RoomChanged {
            room_id: start.id.clone(),
            name: start.display_name().to_string(),
        });
        true
    }

    fn drop_navigation(&self, target: &str, reason: DropReason) {
        self.emit(TourEvent::NavigationDropped {
            target_room_id: target.to_string(),
            reason,
        });
    }

    /// Start moving to `target`. Requests that cannot run are logged,
    /// reported as `NavigationDropped` and leave the state untouched.
    pub fn navigate_to_room(&mut self, target: &str, scene: &mut dyn Scene, camera: &TourCamera) {
        let NavState::Ready(current) = &self.state else {
            warn!("navigation to `{}` ignored: tour not ready", target);
            self.drop_navigation(target, DropReason::NotReady);
            return;
        };
        let current = current.clone();

        let Some(descriptor) = self.graph.as_ref().and_then(|g| g.room(target)).cloned() else {
            error!("{}", TourError::MissingRoom(target.to_string()));
            self.drop_navigation(target, DropReason::MissingRoom);
            return;
        };

        if self.transition.is_transitioning() {
            warn!("navigation to `{}` dropped: {}", target, TourError::TransitionBusy);
            self.drop_navigation(target, DropReason::TransitionBusy);
            return;
        }

        if current == target {
            info!("already in room `{}`", target);
            self.drop_navigation(target, DropReason::AlreadyInRoom);
            return;
        }

        info!("navigating `{}` -> `{}`", current, target);
        let mut new_room = match self.rooms.remove(target) {
            Some(room) => room,
            None => Room::new(&descriptor, &self.cache, scene, &self.config),
        };

        self.clear_hotspots(scene);

        let Some(mut old_room) = self.rooms.remove(&current) else {
            // 当前房间不在缓存中：没有可淡出的对象，直接切换
            warn!("current room `{}` missing from room cache", current);
            self.rooms.insert(target.to_string(), new_room);
            self.finish_swap(
                PendingSwap {
                    from: current,
                    to: target.to_string(),
                },
                scene,
            );
            return;
        };

        let swap = PendingSwap {
            from: current.clone(),
            to: target.to_string(),
        };
        let started = self
            .transition
            .start(&mut old_room, &mut new_room, camera, scene, swap);

        self.rooms.insert(current.clone(), old_room);
        self.rooms.insert(target.to_string(), new_room);

        if started.is_err() {
            // 已在上面检查过，这里仅恢复旧房间的热点
            if let Some(mut room) = self.rooms.remove(target) {
                room.destroy(scene);
            }
            if let Some(descriptor) = self.graph.as_ref().and_then(|g| g.room(&current)).cloned() {
                self.build_hotspots(&descriptor, scene);
            }
            self.drop_navigation(target, DropReason::TransitionBusy);
        }
    }

    fn finish_swap(&mut self, swap: PendingSwap, scene: &mut dyn Scene) {
        if let Some(mut old) = self.rooms.remove(&swap.from) {
            old.destroy(scene);
        }

        let Some(descriptor) = self.graph.as_ref().and_then(|g| g.room(&swap.to)).cloned() else {
            error!("{}", TourError::MissingRoom(swap.to));
            return;
        };
        self.build_hotspots(&descriptor, scene);
        self.state = NavState::Ready(swap.to.clone());

        info!("now in room `{}`", descriptor.display_name());
        self.emit(TourEvent::RoomChanged {
            room_id: swap.to,
            name: descriptor.display_name().to_string(),
        });
    }

    fn build_hotspots(&mut self, room: &RoomDescriptor, scene: &mut dyn Scene) {
        for descriptor in &room.hotspots {
            self.next_hotspot += 1;
            let hotspot = Hotspot::new(HotspotKey(self.next_hotspot), descriptor, scene, &self.config);
            self.picker.add_intersectable(hotspot.intersectable());
            self.hotspots.push(hotspot);
        }
        info!("{} hotspots in room `{}`", room.hotspots.len(), room.id);
    }

    fn clear_hotspots(&mut self, scene: &mut dyn Scene) {
        for mut hotspot in self.hotspots.drain(..) {
            self.picker.remove_intersectable(hotspot.marker());
            hotspot.destroy(scene);
        }
    }

    pub fn pointer_move(&mut self, x: f32, y: f32, scene: &mut dyn Scene, camera: &TourCamera) {
        let mut targets = HotspotTargets {
            hotspots: &mut self.hotspots,
            scene,
        };
        self.picker.pointer_move(x, y, camera, &mut targets);
    }

    /// Click at window position `(x, y)`: hover is resolved first, then the
    /// click is hit-tested and any resulting navigation is started.
    pub fn pointer_click(&mut self, x: f32, y: f32, scene: &mut dyn Scene, camera: &TourCamera) {
        {
            let mut targets = HotspotTargets {
                hotspots: &mut self.hotspots,
                scene: &mut *scene,
            };
            self.picker.pointer_move(x, y, camera, &mut targets);
            self.picker.click(x, y, camera, &targets);
        }
        self.process_intents(scene, camera);
    }

    pub fn touch_start(&mut self, x: f32, y: f32, scene: &mut dyn Scene, camera: &TourCamera) {
        {
            let mut targets = HotspotTargets {
                hotspots: &mut self.hotspots,
                scene: &mut *scene,
            };
            self.picker.touch_start(x, y, camera, &mut targets);
        }
        self.process_intents(scene, camera);
    }

    fn process_intents(&mut self, scene: &mut dyn Scene, camera: &TourCamera) {
        while let Ok(intent) = self.intents.try_recv() {
            self.emit(TourEvent::NavigationIntent(intent.clone()));
            self.navigate_to_room(&intent.target_room_id, scene, camera);
        }
    }

    /// Per-frame tick: advances a running transition and animates the
    /// active hotspots. Rooms are static once built.
    pub fn update(&mut self, dt: f32, elapsed: f32, scene: &mut dyn Scene, camera: &mut TourCamera) {
        if let Some(swap) = self.transition.update(dt, camera, scene, &mut self.rooms) {
            self.finish_swap(swap, scene);
        }
        for hotspot in &mut self.hotspots {
            hotspot.update(dt, elapsed, scene);
        }
    }

    fn teardown(&mut self, scene: &mut dyn Scene, camera: &mut TourCamera) {
        if let Some(swap) = self.transition.abandon(camera) {
            info!("transition `{}` -> `{}` abandoned", swap.from, swap.to);
        }
        self.clear_hotspots(scene);
        for (_, mut room) in self.rooms.drain() {
            room.destroy(scene);
        }
        self.state = NavState::Uninitialized;
    }

    /// Destroy every room and hotspot and detach from pointer input.
    pub fn destroy(&mut self, scene: &mut dyn Scene, camera: &mut TourCamera) {
        self.teardown(scene, camera);
        self.picker.destroy();
        self.graph = None;
        info!("tour destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use glam::Vec3;

    use crate::scene::RecordingScene;
    use crate::test_support::{cache_with, descriptor};

    struct Fixture {
        world: World,
        events: Receiver<TourEvent>,
        scene: RecordingScene,
        camera: TourCamera,
    }

    fn graph() -> TourGraph {
        TourGraph {
            name: "test".into(),
            rooms: vec![
                descriptor("A", true, &[("h1", (200.0, 0.0, -400.0), "B")]),
                descriptor(
                    "B",
                    false,
                    &[
                        ("h2", (-200.0, 0.0, 400.0), "A"),
                        ("h3", (0.0, 0.0, -400.0), "C"),
                    ],
                ),
                descriptor("C", false, &[("h4", (0.0, 0.0, -300.0), "B")]),
            ],
            settings: None,
        }
    }

    fn fixture() -> Fixture {
        let (tx, events) = channel();
        let cache = Rc::new(cache_with(&["A.jpg", "B.jpg", "C.jpg"]));
        let mut world = World::new(cache, EngineConfig::default(), tx);
        world.set_viewport(1280, 720);
        Fixture {
            world,
            events,
            scene: RecordingScene::new(),
            camera: TourCamera::new(75.0, 1280.0 / 720.0),
        }
    }

    fn drain(events: &Receiver<TourEvent>) -> Vec<TourEvent> {
        events.try_iter().collect()
    }

    fn run_transition(f: &mut Fixture) {
        for i in 0..120 {
            f.world
                .update(1.0 / 60.0, i as f32 / 60.0, &mut f.scene, &mut f.camera);
        }
    }

    fn registered(world: &World) -> HashSet<MarkerId> {
        world.picker().intersectables().collect()
    }

    fn active_markers(world: &World) -> HashSet<MarkerId> {
        world.hotspots().iter().map(Hotspot::marker).collect()
    }

    #[test]
    fn test_setup_builds_start_room_and_hotspots() {
        let mut f = fixture();
        assert!(f.world.setup_tour(graph(), &mut f.scene, &mut f.camera));

        assert_eq!(f.world.current_room_id(), Some("A"));
        let hotspots = f.world.hotspots();
        assert_eq!(hotspots.len(), 1);
        let d = hotspots[0].descriptor();
        assert_eq!(d.id, "h1");
        assert_eq!(Vec3::from(d.position), Vec3::new(200.0, 0.0, -400.0));
        assert_eq!(d.target_room, "B");
        assert_eq!(d.label, "to B");
        assert_eq!(registered(&f.world), active_markers(&f.world));
        assert_eq!(f.scene.surfaces.len(), 1);

        assert_eq!(
            drain(&f.events),
            vec![TourEvent::RoomChanged {
                room_id: "A".into(),
                name: "Room A".into()
            }]
        );
    }

    #[test]
    fn test_setup_without_start_room_stays_uninitialized() {
        let mut f = fixture();
        let mut g = graph();
        for room in &mut g.rooms {
            room.is_start = false;
        }
        assert!(!f.world.setup_tour(g, &mut f.scene, &mut f.camera));

        assert_eq!(f.world.state(), &NavState::Uninitialized);
        assert!(f.scene.surfaces.is_empty());
        assert!(f.scene.markers.is_empty());
        assert!(matches!(
            drain(&f.events).as_slice(),
            [TourEvent::SetupFailed { .. }]
        ));

        // 未初始化时导航被丢弃
        f.world.navigate_to_room("B", &mut f.scene, &f.camera);
        assert!(f.scene.surfaces.is_empty());
    }

    #[test]
    fn test_suspended_tour_builds_nothing() {
        let mut f = fixture();
        assert!(!f.world.receive_tour(403, "{}", &mut f.scene, &mut f.camera));
        assert_eq!(f.world.state(), &NavState::Suspended { status: 403 });
        assert!(f.scene.surfaces.is_empty());
        assert_eq!(drain(&f.events), vec![TourEvent::Suspended { status: 403 }]);
    }

    #[test]
    fn test_receive_tour_builds_from_body() {
        let mut f = fixture();
        let body = r#"{ "rooms": [ { "id": "A", "imageUrl": "A.jpg", "isStart": true } ] }"#;
        assert!(f.world.receive_tour(200, body, &mut f.scene, &mut f.camera));
        assert_eq!(f.world.current_room_id(), Some("A"));
        assert!(f.world.current_room().unwrap().is_textured());
    }

    #[test]
    fn test_navigation_sequence_keeps_picker_in_sync() {
        let mut f = fixture();
        f.world.setup_tour(graph(), &mut f.scene, &mut f.camera);

        for target in ["B", "C", "B", "A", "B"] {
            f.world.navigate_to_room(target, &mut f.scene, &f.camera);
            // 过渡期间没有可拾取的热点
            assert!(f.world.picker().is_empty());
            assert!(f.world.hotspots().is_empty());

            run_transition(&mut f);

            assert_eq!(f.world.current_room_id(), Some(target));
            assert_eq!(registered(&f.world), active_markers(&f.world));
            let expected: Vec<_> = graph()
                .room(target)
                .unwrap()
                .hotspots
                .iter()
                .map(|h| h.id.clone())
                .collect();
            let actual: Vec<_> = f
                .world
                .hotspots()
                .iter()
                .map(|h| h.descriptor().id.clone())
                .collect();
            assert_eq!(actual, expected);

            assert_eq!(f.world.cached_rooms().collect::<Vec<_>>(), vec![target]);
            assert_eq!(f.scene.surfaces.len(), 1);
            assert_eq!(f.scene.markers.len(), expected.len());
            assert_eq!(f.camera.fov, 75.0);
        }
    }

    #[test]
    fn test_missing_room_leaves_state_unchanged() {
        let mut f = fixture();
        f.world.setup_tour(graph(), &mut f.scene, &mut f.camera);
        drain(&f.events);

        f.world.navigate_to_room("nowhere", &mut f.scene, &f.camera);

        assert_eq!(f.world.current_room_id(), Some("A"));
        assert_eq!(f.world.hotspots().len(), 1);
        assert!(!f.world.is_transitioning());
        assert_eq!(
            drain(&f.events),
            vec![TourEvent::NavigationDropped {
                target_room_id: "nowhere".into(),
                reason: DropReason::MissingRoom
            }]
        );
    }

    #[test]
    fn test_navigation_during_transition_is_dropped() {
        let mut f = fixture();
        f.world.setup_tour(graph(), &mut f.scene, &mut f.camera);
        f.world.navigate_to_room("B", &mut f.scene, &f.camera);
        drain(&f.events);
        let surfaces = f.scene.surfaces.len();

        f.world.navigate_to_room("C", &mut f.scene, &f.camera);
        f.world.navigate_to_room("B", &mut f.scene, &f.camera);

        assert_eq!(f.scene.surfaces.len(), surfaces);
        assert_eq!(
            drain(&f.events),
            vec![
                TourEvent::NavigationDropped {
                    target_room_id: "C".into(),
                    reason: DropReason::TransitionBusy
                },
                TourEvent::NavigationDropped {
                    target_room_id: "B".into(),
                    reason: DropReason::TransitionBusy
                },
            ]
        );

        run_transition(&mut f);
        assert_eq!(f.world.current_room_id(), Some("B"));
        assert!(f.world.room("C").is_none());
    }

    #[test]
    fn test_navigating_to_current_room_is_noop() {
        let mut f = fixture();
        f.world.setup_tour(graph(), &mut f.scene, &mut f.camera);
        let markers = f.scene.markers.clone();

        f.world.navigate_to_room("A", &mut f.scene, &f.camera);

        assert!(!f.world.is_transitioning());
        assert_eq!(f.scene.markers, markers);
        assert_eq!(f.scene.surfaces.len(), 1);
    }

    #[test]
    fn test_update_animates_hotspots() {
        let mut f = fixture();
        f.world.setup_tour(graph(), &mut f.scene, &mut f.camera);
        let marker = f.world.hotspots()[0].marker();
        f.world.update(0.016, 0.5, &mut f.scene, &mut f.camera);
        let opacity = f.scene.marker(marker).unwrap().opacity;
        assert!((opacity - (0.7 + (1.0f32).sin() * 0.2)).abs() < 1e-5);
    }

    #[test]
    fn test_destroy_releases_everything() {
        let mut f = fixture();
        f.world.setup_tour(graph(), &mut f.scene, &mut f.camera);
        f.world.navigate_to_room("B", &mut f.scene, &f.camera);
        f.world
            .update(0.3, 0.3, &mut f.scene, &mut f.camera);

        f.world.destroy(&mut f.scene, &mut f.camera);

        assert!(f.scene.surfaces.is_empty());
        assert!(f.scene.markers.is_empty());
        assert!(f.world.picker().is_empty());
        assert_eq!(f.world.state(), &NavState::Uninitialized);
        assert_eq!(f.camera.fov, 75.0);
    }

    #[test]
    fn test_setup_during_transition_restarts_cleanly() {
        let mut f = fixture();
        f.world.setup_tour(graph(), &mut f.scene, &mut f.camera);
        f.world.navigate_to_room("B", &mut f.scene, &f.camera);
        f.world.update(0.3, 0.3, &mut f.scene, &mut f.camera);
        assert!(f.camera.fov < 75.0);
        drain(&f.events);

        assert!(f.world.setup_tour(graph(), &mut f.scene, &mut f.camera));

        assert!(!f.world.is_transitioning());
        assert_eq!(f.camera.fov, 75.0);
        assert_eq!(f.world.current_room_id(), Some("A"));
        assert_eq!(f.world.cached_rooms().collect::<Vec<_>>(), vec!["A"]);
        assert_eq!(f.scene.surfaces.len(), 1);
        assert_eq!(f.scene.markers.len(), 1);
        assert_eq!(
            drain(&f.events),
            vec![TourEvent::RoomChanged {
                room_id: "A".into(),
                name: "Room A".into()
            }]
        );

        // 旧过渡不得在后续帧中完成
        run_transition(&mut f);

        assert_eq!(f.world.current_room_id(), Some("A"));
        assert_eq!(f.world.cached_rooms().collect::<Vec<_>>(), vec!["A"]);
        assert_eq!(f.world.hotspots().len(), 1);
        assert_eq!(f.world.hotspots()[0].descriptor().id, "h1");
        assert_eq!(registered(&f.world), active_markers(&f.world));
        assert_eq!(f.scene.surfaces.len(), 1);
        let surface = f.scene.surfaces.values().next().unwrap();
        assert_eq!((surface.opacity, surface.blending), (1.0, false));
        assert_eq!(f.scene.markers.len(), 1);
        assert_eq!(f.camera.fov, 75.0);
        assert!(drain(&f.events).is_empty());
    }

    #[test]
    fn test_setup_over_live_tour_replaces_it() {
        let mut f = fixture();
        f.world.setup_tour(graph(), &mut f.scene, &mut f.camera);
        f.world.navigate_to_room("B", &mut f.scene, &f.camera);
        run_transition(&mut f);
        assert_eq!(f.world.current_room_id(), Some("B"));

        f.world.setup_tour(graph(), &mut f.scene, &mut f.camera);

        assert_eq!(f.world.current_room_id(), Some("A"));
        assert!(f.world.room("B").is_none());
        assert_eq!(f.scene.surfaces.len(), 1);
        assert_eq!(f.scene.markers.len(), 1);
        assert_eq!(registered(&f.world), active_markers(&f.world));
    }

    #[test]
    fn test_suspended_after_ready_clears_tour() {
        let mut f = fixture();
        f.world.setup_tour(graph(), &mut f.scene, &mut f.camera);
        drain(&f.events);

        assert!(!f.world.receive_tour(403, "", &mut f.scene, &mut f.camera));

        assert_eq!(f.world.state(), &NavState::Suspended { status: 403 });
        assert!(f.world.picker().is_empty());
        assert!(f.world.hotspots().is_empty());
        assert_eq!(f.world.cached_rooms().count(), 0);
        assert!(f.scene.surfaces.is_empty());
        assert!(f.scene.markers.is_empty());
        assert_eq!(drain(&f.events), vec![TourEvent::Suspended { status: 403 }]);

        f.world.navigate_to_room("B", &mut f.scene, &f.camera);
        assert!(f.scene.surfaces.is_empty());
        assert_eq!(
            drain(&f.events),
            vec![TourEvent::NavigationDropped {
                target_room_id: "B".into(),
                reason: DropReason::NotReady
            }]
        );
    }

    #[test]
    fn test_suspended_during_transition_restores_camera() {
        let mut f = fixture();
        f.world.setup_tour(graph(), &mut f.scene, &mut f.camera);
        f.world.navigate_to_room("B", &mut f.scene, &f.camera);
        f.world.update(0.3, 0.3, &mut f.scene, &mut f.camera);

        f.world.receive_tour(503, "", &mut f.scene, &mut f.camera);

        assert!(!f.world.is_transitioning());
        assert_eq!(f.camera.fov, 75.0);
        run_transition(&mut f);
        assert_eq!(f.world.state(), &NavState::Suspended { status: 503 });
        assert!(f.scene.surfaces.is_empty());
        assert!(f.scene.markers.is_empty());
    }

    #[test]
    fn test_settings_override_engine_config() {
        let mut f = fixture();
        let mut g = graph();
        g.settings = Some(EngineConfig {
            marker_size: 40.0,
            ..EngineConfig::default()
        });
        f.world.setup_tour(g, &mut f.scene, &mut f.camera);
        let marker = f.world.hotspots()[0].marker();
        assert_eq!(f.scene.marker(marker).unwrap().size, 40.0);
    }
}

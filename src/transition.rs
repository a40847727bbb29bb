// transition.rs — 房间切换动画：交叉淡化 + FOV 推拉
//
// 时间轴（秒）：
//   0.0 ─ 0.4  FOV 缩小（ease-in）
//   0.2 ─ 1.0  旧房间 1→0，新房间 0→1（ease-in-out）
//   0.8 ─ 1.2  FOV 恢复（ease-out）
// 每一帧都按绝对时间求值，跳帧不会累积误差。

use std::collections::HashMap;

use log::{info, warn};

use crate::camera::TourCamera;
use crate::config::TransitionTimings;
use crate::room::Room;
use crate::scene::Scene;
use crate::tour::RoomId;

/// Cubic easing curves ("power2" in tweening-library terms).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ease {
    Linear,
    In,
    Out,
    InOut,
}

impl Ease {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::In => t * t * t,
            Ease::Out => 1.0 - (1.0 - t).powi(3),
            Ease::InOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

/// One animated value on the timeline, from `from` to `to` over `span`.
#[derive(Debug, Clone, Copy)]
struct Tween {
    span: (f32, f32),
    from: f32,
    to: f32,
    ease: Ease,
}

impl Tween {
    fn value_at(&self, time: f32) -> f32 {
        let (start, end) = self.span;
        if time <= start {
            self.from
        } else if time >= end || end <= start {
            self.to
        } else {
            let t = self.ease.apply((time - start) / (end - start));
            self.from + (self.to - self.from) * t
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionState {
    Idle,
    Transitioning,
}

struct Running<C> {
    from: RoomId,
    to: RoomId,
    elapsed: f32,
    original_fov: f32,
    zoom_in: Tween,
    zoom_out: Tween,
    fade_out: Tween,
    fade_in: Tween,
    on_complete: C,
}

/// Runs at most one room transition at a time.
///
/// `C` is the completion value handed back by [`RoomTransition::update`]
/// once both the fade and the field of view have reached their final values.
pub struct RoomTransition<C> {
    timings: TransitionTimings,
    running: Option<Running<C>>,
}

impl<C> RoomTransition<C> {
    pub fn new(timings: TransitionTimings) -> Self {
        Self {
            timings,
            running: None,
        }
    }

    pub fn state(&self) -> TransitionState {
        if self.running.is_some() {
            TransitionState::Transitioning
        } else {
            TransitionState::Idle
        }
    }

    pub fn is_transitioning(&self) -> bool {
        self.running.is_some()
    }

    /// Target room of the running transition.
    pub fn target(&self) -> Option<&str> {
        self.running.as_ref().map(|r| r.to.as_str())
    }

    pub fn duration(&self) -> f32 {
        self.timings.total()
    }

    /// Begin fading `old` out and `new` in. While another transition runs
    /// the request is rejected and `on_complete` is handed straight back.
    pub fn start(
        &mut self,
        old: &mut Room,
        new: &mut Room,
        camera: &TourCamera,
        scene: &mut dyn Scene,
        on_complete: C,
    ) -> Result<(), C> {
        if self.running.is_some() {
            warn!(
                "transition to `{}` rejected: a transition is already running",
                new.id()
            );
            return Err(on_complete);
        }

        info!("transition `{}` -> `{}`", old.id(), new.id());

        new.set_blending(scene, true);
        new.set_opacity(scene, 0.0);
        old.set_blending(scene, true);
        old.set_opacity(scene, 1.0);

        let t = self.timings;
        let original_fov = camera.fov;
        let zoomed_fov = original_fov - t.fov_delta;

        self.running = Some(Running {
            from: old.id().to_string(),
            to: new.id().to_string(),
            elapsed: 0.0,
            original_fov,
            zoom_in: Tween {
                span: t.zoom_in,
                from: original_fov,
                to: zoomed_fov,
                ease: Ease::In,
            },
            zoom_out: Tween {
                span: t.zoom_out,
                from: zoomed_fov,
                to: original_fov,
                ease: Ease::Out,
            },
            fade_out: Tween {
                span: t.fade,
                from: 1.0,
                to: 0.0,
                ease: Ease::InOut,
            },
            fade_in: Tween {
                span: t.fade,
                from: 0.0,
                to: 1.0,
                ease: Ease::InOut,
            },
            on_complete,
        });
        Ok(())
    }

    /// Advance by `dt` seconds. Returns the completion value on the frame
    /// the transition ends; the new room is then fully opaque without
    /// blending and the field of view is back at its starting value.
    pub fn update(
        &mut self,
        dt: f32,
        camera: &mut TourCamera,
        scene: &mut dyn Scene,
        rooms: &mut HashMap<RoomId, Room>,
    ) -> Option<C> {
        let total = self.timings.total();
        let running = self.running.as_mut()?;
        running.elapsed += dt.max(0.0);
        let time = running.elapsed;

        if time < total {
            let fov = if time < running.zoom_out.span.0 {
                running.zoom_in.value_at(time)
            } else {
                running.zoom_out.value_at(time)
            };
            camera.set_fov(fov);

            if let Some(old) = rooms.get_mut(&running.from) {
                old.set_opacity(scene, running.fade_out.value_at(time));
            }
            if let Some(new) = rooms.get_mut(&running.to) {
                new.set_opacity(scene, running.fade_in.value_at(time));
            }
            return None;
        }

        let running = self.running.take()?;
        camera.set_fov(running.original_fov);
        if let Some(old) = rooms.get_mut(&running.from) {
            old.set_opacity(scene, 0.0);
        }
        if let Some(new) = rooms.get_mut(&running.to) {
            new.set_opacity(scene, 1.0);
            new.set_blending(scene, false);
        }
        info!("transition to `{}` complete", running.to);
        Some(running.on_complete)
    }

    /// Drop a running transition during teardown, restoring the camera.
    /// The completion value is returned unfired.
    pub fn abandon(&mut self, camera: &mut TourCamera) -> Option<C> {
        let running = self.running.take()?;
        camera.set_fov(running.original_fov);
        Some(running.on_complete)
    }
}

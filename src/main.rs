// main.rs — 导览查看器：窗口、输入、预加载与界面

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // 在 Release 模式下隐藏控制台窗口

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt;
use log::{error, info, warn};
use winit::{
    dpi::{LogicalSize, PhysicalPosition},
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::{CursorIcon, Fullscreen, Window, WindowBuilder},
};

use panorama_tour::i18n::{self, tr, tr_with};
use panorama_tour::renderer::Renderer;
use panorama_tour::resources::PreloadReport;
use panorama_tour::scene::CursorStyle;
use panorama_tour::{
    Args, FileLoader, ResourceCache, TourCamera, TourError, TourEvent, TourGraph, World,
};

/// Pointer travel, in physical pixels, after which a press becomes a drag.
const DRAG_THRESHOLD_PIXELS: f64 = 4.0;

enum TourSource {
    Demo,
    File(PathBuf),
}

type PreloadSlot = Rc<RefCell<Option<(TourGraph, PreloadReport)>>>;

/// A tour whose panoramas are still being decoded.
struct PendingTour {
    assets: Vec<(String, String)>,
    slot: PreloadSlot,
}

#[derive(Default)]
struct UiState {
    room_name: Option<String>,
    moving_to: Option<String>,
    last_label: Option<String>,
    suspended: Option<u16>,
    message: Option<String>,
    loading: Option<(usize, usize)>,
    show_fps: bool,
    fps: f32,
    is_fullscreen: bool,
}

enum UiAction {
    OpenTour(PathBuf),
    DemoTour,
    ResetView,
    ToggleFullscreen,
    SetLang(String),
    Exit,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    i18n::init(args.lang.clone());

    let event_loop = EventLoop::new();
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(tr("app.title"))
            .with_inner_size(LogicalSize::new(1280, 720))
            .build(&event_loop)?,
    );

    let mut renderer = pollster::block_on(Renderer::new(window.clone()))?;
    let size = renderer.size;

    let cache = Rc::new(ResourceCache::new(FileLoader::new(&args.assets)));
    let (event_tx, event_rx) = channel();
    let mut world = World::new(cache.clone(), Default::default(), event_tx);
    world.set_viewport(size.width, size.height);

    let mut camera = TourCamera::new(world.config().camera_fov, 1.0);
    camera.set_aspect(size.width, size.height);

    let mut pool = LocalPool::new();
    let spawner = pool.spawner();

    let mut ui = UiState::default();
    let source = match args.tour.clone() {
        Some(path) => TourSource::File(path),
        None => TourSource::Demo,
    };
    let mut pending = open_tour(
        &source,
        args.status,
        &mut world,
        &mut renderer,
        &mut camera,
        &cache,
        &spawner,
    )
    .unwrap_or_else(|err| {
        ui.message = Some(tr_with("error.open_tour", &[("err", err.to_string())]));
        None
    });

    // 交互状态
    let mut mouse_pressed = false;
    let mut dragging = false;
    let mut press_pos = PhysicalPosition::new(0.0, 0.0);
    let mut cursor_pos: PhysicalPosition<f64> = PhysicalPosition::new(0.0, 0.0);
    let mut last_drag_pos: Option<PhysicalPosition<f64>> = None;

    let started = Instant::now();
    let mut last_frame = Instant::now();
    let mut fps_window_start = Instant::now();
    let mut frame_count = 0;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        match event {
            Event::WindowEvent { event, .. } => {
                // 先让 egui 处理事件
                let response = renderer.egui_state.on_event(&renderer.egui_ctx, &event);
                if response.consumed {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => {
                        world.destroy(&mut renderer, &mut camera);
                        *control_flow = ControlFlow::Exit;
                    }

                    WindowEvent::Resized(new_size) => {
                        renderer.resize(new_size);
                        camera.set_aspect(new_size.width, new_size.height);
                        world.set_viewport(new_size.width, new_size.height);
                    }

                    WindowEvent::KeyboardInput { input, .. } => {
                        if input.state == ElementState::Pressed {
                            let action = match input.virtual_keycode {
                                Some(VirtualKeyCode::O) => pick_tour_file().map(UiAction::OpenTour),
                                Some(VirtualKeyCode::F11) => Some(UiAction::ToggleFullscreen),
                                Some(VirtualKeyCode::R) => Some(UiAction::ResetView),
                                _ => None,
                            };
                            if let Some(action) = action {
                                apply_action(
                                    action,
                                    &window,
                                    &mut ui,
                                    &mut world,
                                    &mut renderer,
                                    &mut camera,
                                    &cache,
                                    &spawner,
                                    &mut pending,
                                    control_flow,
                                );
                            }
                        }
                    }

                    WindowEvent::MouseInput {
                        state,
                        button: MouseButton::Left,
                        ..
                    } => match state {
                        ElementState::Pressed => {
                            mouse_pressed = true;
                            dragging = false;
                            press_pos = cursor_pos;
                            last_drag_pos = Some(cursor_pos);
                        }
                        ElementState::Released => {
                            // 没有拖动过才算点击
                            if mouse_pressed && !dragging {
                                world.pointer_click(
                                    cursor_pos.x as f32,
                                    cursor_pos.y as f32,
                                    &mut renderer,
                                    &camera,
                                );
                            }
                            mouse_pressed = false;
                            dragging = false;
                            last_drag_pos = None;
                        }
                    },

                    WindowEvent::CursorMoved { position, .. } => {
                        cursor_pos = position;
                        if mouse_pressed {
                            let (dx, dy) = (position.x - press_pos.x, position.y - press_pos.y);
                            if !dragging && (dx * dx + dy * dy).sqrt() > DRAG_THRESHOLD_PIXELS {
                                dragging = true;
                            }
                            if dragging {
                                if let Some(last) = last_drag_pos {
                                    camera.rotate_by_pixels(
                                        (position.x - last.x) as f32,
                                        (position.y - last.y) as f32,
                                        renderer.size.width as f32,
                                        renderer.size.height as f32,
                                    );
                                }
                                last_drag_pos = Some(position);
                            }
                        } else {
                            world.pointer_move(
                                position.x as f32,
                                position.y as f32,
                                &mut renderer,
                                &camera,
                            );
                        }
                    }

                    WindowEvent::Touch(Touch {
                        phase: TouchPhase::Started,
                        location,
                        ..
                    }) => {
                        world.touch_start(location.x as f32, location.y as f32, &mut renderer, &camera);
                    }

                    WindowEvent::MouseWheel { delta, .. } => {
                        // 过渡动画期间 FOV 由动画控制
                        if !world.is_transitioning() {
                            let scroll = match delta {
                                MouseScrollDelta::LineDelta(_, y) => y,
                                MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 20.0,
                            };
                            camera.set_fov((camera.fov - scroll * 2.5).clamp(30.0, 100.0));
                        }
                    }

                    WindowEvent::DroppedFile(path) => {
                        apply_action(
                            UiAction::OpenTour(path),
                            &window,
                            &mut ui,
                            &mut world,
                            &mut renderer,
                            &mut camera,
                            &cache,
                            &spawner,
                            &mut pending,
                            control_flow,
                        );
                    }

                    _ => {}
                }
            }

            Event::RedrawRequested(_) => {
                let now = Instant::now();
                let dt = now.duration_since(last_frame).as_secs_f32();
                last_frame = now;

                frame_count += 1;
                let window_secs = now.duration_since(fps_window_start).as_secs_f32();
                if window_secs >= 1.0 {
                    ui.fps = frame_count as f32 / window_secs;
                    frame_count = 0;
                    fps_window_start = now;
                }

                // 解码线程完成后在这里推进预加载任务
                pool.run_until_stalled();
                if let Some(tour) = &pending {
                    let done = tour
                        .assets
                        .iter()
                        .filter(|(name, _)| cache.get(name).is_some())
                        .count();
                    ui.loading = Some((done, tour.assets.len()));

                    let finished = tour.slot.borrow_mut().take();
                    if let Some((graph, report)) = finished {
                        pending = None;
                        ui.loading = None;
                        if !report.is_complete() {
                            ui.message = Some(tr_with(
                                "error.preload",
                                &[("count", report.failed.len().to_string())],
                            ));
                        }
                        if world.setup_tour(graph, &mut renderer, &mut camera) {
                            camera.set_fov(world.config().camera_fov);
                        }
                    }
                }

                world.update(dt, now.duration_since(started).as_secs_f32(), &mut renderer, &mut camera);
                drain_events(&event_rx, &mut ui);

                window.set_cursor_icon(match renderer.cursor() {
                    CursorStyle::Pointer => CursorIcon::Hand,
                    CursorStyle::Default => CursorIcon::Default,
                });

                let mut action = None;
                let render_result = renderer.render_with_ui(&window, &camera, |ctx| {
                    action = draw_ui(ctx, &mut ui);
                });

                if let Some(action) = action {
                    apply_action(
                        action,
                        &window,
                        &mut ui,
                        &mut world,
                        &mut renderer,
                        &mut camera,
                        &cache,
                        &spawner,
                        &mut pending,
                        control_flow,
                    );
                }

                match render_result {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => *control_flow = ControlFlow::Exit,
                    Err(e) => warn!("render error: {:?}", e),
                }
            }

            Event::MainEventsCleared => {
                window.request_redraw();
            }

            _ => {}
        }
    });
}

/// Read a tour and start preloading its panoramas. A non-2xx status means
/// the tour is suspended: nothing is read or built.
fn open_tour(
    source: &TourSource,
    status: u16,
    world: &mut World,
    renderer: &mut Renderer,
    camera: &mut TourCamera,
    cache: &Rc<ResourceCache>,
    spawner: &LocalSpawner,
) -> Result<Option<PendingTour>, TourError> {
    if !(200..300).contains(&status) {
        world.receive_tour(status, "", renderer, camera);
        return Ok(None);
    }

    let graph = match source {
        TourSource::Demo => TourGraph::demo(),
        TourSource::File(path) => {
            info!("opening tour {:?}", path);
            TourGraph::from_file(path)?
        }
    };

    let assets = graph.assets();
    let slot: PreloadSlot = Rc::new(RefCell::new(None));
    let task_slot = slot.clone();
    let task_cache = cache.clone();
    let task_assets = assets.clone();

    info!("preloading {} panoramas for `{}`", assets.len(), graph.name);
    let spawned = spawner.spawn_local(async move {
        let report = task_cache.preload_all(&task_assets).await;
        *task_slot.borrow_mut() = Some((graph, report));
    });
    if let Err(e) = spawned {
        error!("cannot schedule preload: {}", e);
        return Ok(None);
    }

    Ok(Some(PendingTour { assets, slot }))
}

fn pick_tour_file() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter(&tr("file.filter.tours"), &["json"])
        .pick_file()
}

fn drain_events(events: &Receiver<TourEvent>, ui: &mut UiState) {
    for event in events.try_iter() {
        match event {
            TourEvent::NavigationIntent(intent) => {
                ui.moving_to = Some(intent.target_room_id);
                ui.last_label = Some(intent.label);
            }
            TourEvent::RoomChanged { name, .. } => {
                ui.room_name = Some(name);
                ui.moving_to = None;
                ui.suspended = None;
            }
            TourEvent::NavigationDropped { .. } => {
                ui.moving_to = None;
            }
            TourEvent::Suspended { status } => {
                ui.suspended = Some(status);
                ui.room_name = None;
            }
            TourEvent::SetupFailed { reason } => {
                ui.message = Some(tr_with("error.setup", &[("err", reason)]));
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_action(
    action: UiAction,
    window: &Window,
    ui: &mut UiState,
    world: &mut World,
    renderer: &mut Renderer,
    camera: &mut TourCamera,
    cache: &Rc<ResourceCache>,
    spawner: &LocalSpawner,
    pending: &mut Option<PendingTour>,
    control_flow: &mut ControlFlow,
) {
    let source = match action {
        UiAction::OpenTour(path) => TourSource::File(path),
        UiAction::DemoTour => TourSource::Demo,
        UiAction::ResetView => {
            camera.yaw = 0.0;
            camera.pitch = 0.0;
            if !world.is_transitioning() {
                camera.set_fov(world.config().camera_fov);
            }
            return;
        }
        UiAction::ToggleFullscreen => {
            ui.is_fullscreen = !ui.is_fullscreen;
            window.set_fullscreen(ui.is_fullscreen.then(|| Fullscreen::Borderless(None)));
            return;
        }
        UiAction::SetLang(lang) => {
            i18n::init(lang);
            window.set_title(&tr("app.title"));
            return;
        }
        UiAction::Exit => {
            world.destroy(renderer, camera);
            *control_flow = ControlFlow::Exit;
            return;
        }
    };

    if pending.is_some() {
        warn!("a tour is still loading; request ignored");
        return;
    }

    ui.message = None;
    match open_tour(&source, 200, world, renderer, camera, cache, spawner) {
        Ok(next) => *pending = next,
        Err(err) => {
            error!("{}", err);
            ui.message = Some(tr_with("error.open_tour", &[("err", err.to_string())]));
        }
    }
}

fn draw_ui(ctx: &egui::Context, ui_state: &mut UiState) -> Option<UiAction> {
    let mut action = None;

    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            ui.menu_button(tr("menu.file"), |ui| {
                if ui.button(tr("menu.open_tour")).clicked() {
                    action = pick_tour_file().map(UiAction::OpenTour);
                    ui.close_menu();
                }
                if ui.button(tr("menu.demo_tour")).clicked() {
                    action = Some(UiAction::DemoTour);
                    ui.close_menu();
                }
                ui.separator();
                if ui.button(tr("menu.exit")).clicked() {
                    action = Some(UiAction::Exit);
                }
            });

            ui.menu_button(tr("menu.view"), |ui| {
                if ui.button(tr("view.reset")).clicked() {
                    action = Some(UiAction::ResetView);
                    ui.close_menu();
                }
                let fullscreen = if ui_state.is_fullscreen {
                    tr("view.fullscreen.exit")
                } else {
                    tr("view.fullscreen.enter")
                };
                if ui.button(fullscreen).clicked() {
                    action = Some(UiAction::ToggleFullscreen);
                    ui.close_menu();
                }
                ui.checkbox(&mut ui_state.show_fps, tr("view.show_fps"));
            });

            ui.menu_button(tr("menu.language"), |ui| {
                let current = i18n::current_lang();
                for lang in i18n::languages() {
                    if ui.radio(current == lang, lang.as_str()).clicked() {
                        action = Some(UiAction::SetLang(lang.clone()));
                        ui.close_menu();
                    }
                }
            });
        });
    });

    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if let Some((done, total)) = ui_state.loading {
                ui.spinner();
                ui.label(tr_with(
                    "status.loading",
                    &[("done", done.to_string()), ("total", total.to_string())],
                ));
            } else if let Some(target) = &ui_state.moving_to {
                ui.label(tr_with("status.transitioning", &[("room", target.clone())]));
            } else if let Some(room) = &ui_state.room_name {
                ui.label(tr_with("status.room", &[("room", room.clone())]));
            } else {
                ui.label(tr("status.no_tour"));
            }

            if let Some(label) = &ui_state.last_label {
                ui.separator();
                ui.label(tr_with("status.last_hotspot", &[("label", label.clone())]));
            }

            if let Some(message) = &ui_state.message {
                ui.separator();
                ui.colored_label(egui::Color32::LIGHT_RED, message.as_str());
            }

            if ui_state.show_fps {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(tr_with("status.fps", &[("fps", format!("{:.0}", ui_state.fps))]));
                });
            }
        });
    });

    if let Some(status) = ui_state.suspended {
        egui::Area::new("suspended")
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.heading(tr_with("status.suspended", &[("status", status.to_string())]));
                });
            });
    }

    action
}

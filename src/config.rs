// config.rs — 命令行参数与引擎参数

use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;

/// Command line of the tour viewer. Every flag also reads an environment
/// variable so packaged builds can be configured without arguments.
#[derive(Debug, Clone, Parser)]
#[command(name = "panorama_tour", about = "360° panorama tour viewer")]
pub struct Args {
    /// Tour document (JSON). The bundled demo tour is used when omitted.
    #[arg(long, env = "PANORAMA_TOUR_FILE")]
    pub tour: Option<PathBuf>,

    /// Directory panorama image paths are resolved against.
    #[arg(long, env = "PANORAMA_TOUR_ASSETS", default_value = "assets")]
    pub assets: PathBuf,

    /// UI language (en, fr, zh-Hans, ...).
    #[arg(long, env = "PANORAMA_TOUR_LANG", default_value = "en")]
    pub lang: String,

    /// Status code the tour document is treated as having been served with.
    #[arg(long, default_value_t = 200)]
    pub status: u16,
}

/// Tunables of the navigation engine. A tour document may override any of
/// them through its `settings` object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub sphere_radius: f32,
    pub sphere_width_segments: usize,
    pub sphere_height_segments: usize,

    pub marker_size: f32,
    pub hover_scale: f32,
    pub idle_scale: f32,
    /// Per-second rate of the hover scale smoothing; 6.32/s matches a
    /// 0.1 per-frame blend at 60 fps.
    pub scale_smoothing_rate: f32,
    pub pulse_frequency: f32,
    pub pulse_center: f32,
    pub pulse_amplitude: f32,

    pub camera_fov: f32,
    pub transition: TransitionTimings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sphere_radius: 500.0,
            sphere_width_segments: 60,
            sphere_height_segments: 40,
            marker_size: 20.0,
            hover_scale: 1.3,
            idle_scale: 1.0,
            scale_smoothing_rate: 6.32,
            pulse_frequency: 2.0,
            pulse_center: 0.7,
            pulse_amplitude: 0.2,
            camera_fov: 75.0,
            transition: TransitionTimings::default(),
        }
    }
}

/// Timeline of a room transition, in seconds from its start.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransitionTimings {
    pub fov_delta: f32,
    pub zoom_in: (f32, f32),
    pub fade: (f32, f32),
    pub zoom_out: (f32, f32),
}

impl Default for TransitionTimings {
    fn default() -> Self {
        Self {
            fov_delta: 20.0,
            zoom_in: (0.0, 0.4),
            fade: (0.2, 1.0),
            zoom_out: (0.8, 1.2),
        }
    }
}

impl TransitionTimings {
    pub fn total(&self) -> f32 {
        self.zoom_in.1.max(self.fade.1).max(self.zoom_out.1)
    }
}

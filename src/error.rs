// error.rs — 导览引擎错误分类

use crate::tour::RoomId;

/// Failure of a single asset fetch or decode.
///
/// Cloneable because one load result is shared by every caller that asked
/// for the same asset while it was in flight.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("failed to open `{path}`: {reason}")]
    Io { path: String, reason: String },

    #[error("failed to decode `{path}`: {reason}")]
    Decode { path: String, reason: String },

    #[error("loader for `{0}` went away before finishing")]
    Cancelled(String),
}

#[derive(thiserror::Error, Debug)]
pub enum TourError {
    #[error("texture `{name}` is not in the resource cache")]
    MissingAsset { name: String },

    #[error("room `{0}` does not exist in the tour")]
    MissingRoom(RoomId),

    #[error("a room transition is already running")]
    TransitionBusy,

    #[error("tour data integrity: {0}")]
    DataIntegrity(String),

    #[error("asset `{name}` failed to load: {reason}")]
    LoadFailure { name: String, reason: LoadError },

    #[error("tour is suspended (status {status})")]
    Suspended { status: u16 },

    #[error("invalid tour document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("cannot read tour document: {0}")]
    Io(#[from] std::io::Error),
}

/// GPU setup failures. Frame errors stay `wgpu::SurfaceError`.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("cannot create window surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no compatible graphics adapter")]
    NoAdapter,

    #[error("cannot open graphics device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
}

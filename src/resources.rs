// resources.rs — 全景纹理缓存
//
// 每个名字只加载一次；加载中的重复请求共享同一个 future。
// 解码在后台线程完成，结果经 oneshot 通道返回主线程。

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};
use std::thread;

use futures::channel::oneshot;
use futures::future::{join_all, FutureExt, LocalBoxFuture, Shared};
use image::io::Reader as ImageReader;
use image::{GenericImage, GenericImageView, Rgba, RgbaImage};
use log::{debug, error, info};

use crate::error::{LoadError, TourError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Srgb,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Nearest,
    Linear,
}

/// Sampling parameters fixed once when a texture is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureSettings {
    pub color_space: ColorSpace,
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
}

impl Default for TextureSettings {
    fn default() -> Self {
        Self {
            color_space: ColorSpace::Srgb,
            min_filter: FilterMode::Linear,
            mag_filter: FilterMode::Linear,
        }
    }
}

/// A decoded panorama owned by the cache.
pub struct Texture {
    name: String,
    image: RgbaImage,
    settings: TextureSettings,
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("name", &self.name)
            .field("size", &self.image.dimensions())
            .field("settings", &self.settings)
            .finish()
    }
}

impl Texture {
    /// Build a texture from decoded pixels. Equirectangular panoramas are
    /// 2:1; shorter images are padded with black at the top so the image
    /// keeps its place at the bottom of the sphere.
    pub fn new(name: impl Into<String>, image: RgbaImage, settings: TextureSettings) -> Self {
        let (src_w, src_h) = image.dimensions();
        let target_h = src_w / 2;

        let image = if target_h > 0 && src_h < target_h {
            let mut canvas = RgbaImage::from_pixel(src_w, target_h, Rgba([0, 0, 0, 255]));
            // y_offset 保证不会越界
            let _ = canvas.copy_from(&image, 0, target_h - src_h);
            canvas
        } else {
            image
        };

        Self {
            name: name.into(),
            image,
            settings,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn settings(&self) -> TextureSettings {
        self.settings
    }
}

pub type TextureHandle = Rc<Texture>;

pub type LoadResult = Result<TextureHandle, LoadError>;

/// Cloneable future of one asset load; every clone resolves to the same handle.
pub type SharedLoad = Shared<LocalBoxFuture<'static, LoadResult>>;

/// Fetches and decodes the raw pixels behind a source string.
pub trait TextureLoader {
    fn fetch(&self, source: &str) -> LocalBoxFuture<'static, Result<RgbaImage, LoadError>>;
}

/// Reads images from disk below `root` and decodes them on a worker thread.
pub struct FileLoader {
    root: PathBuf,
}

impl FileLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl TextureLoader for FileLoader {
    fn fetch(&self, source: &str) -> LocalBoxFuture<'static, Result<RgbaImage, LoadError>> {
        let path = self.root.join(source.trim_start_matches('/'));
        let source = source.to_string();
        let (tx, rx) = oneshot::channel();

        thread::spawn(move || {
            debug!("decoding {:?} in background", path);
            // 接收端已丢弃时结果无人需要
            let _ = tx.send(decode_file(&path));
        });

        async move { rx.await.unwrap_or_else(|_| Err(LoadError::Cancelled(source))) }.boxed_local()
    }
}

fn decode_file(path: &Path) -> Result<RgbaImage, LoadError> {
    let display = path.display().to_string();
    let file = File::open(path).map_err(|e| LoadError::Io {
        path: display.clone(),
        reason: e.to_string(),
    })?;

    let img = ImageReader::new(BufReader::new(file))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)
        .and_then(|mut r| {
            r.no_limits();
            r.decode()
        })
        .map_err(|e| LoadError::Decode {
            path: display.clone(),
            reason: e.to_string(),
        })?;

    let (w, h) = img.dimensions();
    info!("decoded {} ({}x{})", display, w, h);
    Ok(img.to_rgba8())
}

enum Entry {
    Loading(SharedLoad),
    Ready(TextureHandle),
}

/// Outcome of a batch preload.
#[derive(Debug, Default)]
pub struct PreloadReport {
    pub loaded: Vec<String>,
    pub failed: Vec<TourError>,
}

impl PreloadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Memoizing asset cache. Owns every texture it loads for its whole lifetime.
pub struct ResourceCache {
    loader: Box<dyn TextureLoader>,
    settings: TextureSettings,
    entries: Rc<RefCell<HashMap<String, Entry>>>,
}

impl ResourceCache {
    pub fn new(loader: impl TextureLoader + 'static) -> Self {
        Self::with_settings(loader, TextureSettings::default())
    }

    pub fn with_settings(loader: impl TextureLoader + 'static, settings: TextureSettings) -> Self {
        Self {
            loader: Box::new(loader),
            settings,
            entries: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Already-resolved texture, if any. Never starts a load.
    pub fn get(&self, name: &str) -> Option<TextureHandle> {
        match self.entries.borrow().get(name) {
            Some(Entry::Ready(texture)) => Some(Rc::clone(texture)),
            _ => None,
        }
    }

    pub fn is_loading(&self, name: &str) -> bool {
        matches!(self.entries.borrow().get(name), Some(Entry::Loading(_)))
    }

    /// Insert an already-decoded texture, replacing nothing that is loaded.
    pub fn insert(&self, name: &str, image: RgbaImage) -> TextureHandle {
        if let Some(texture) = self.get(name) {
            return texture;
        }
        let texture = Rc::new(Texture::new(name, image, self.settings));
        self.entries
            .borrow_mut()
            .insert(name.to_string(), Entry::Ready(Rc::clone(&texture)));
        texture
    }

    /// Load `name` from `source` exactly once. Callers asking for a name
    /// that is already in flight get a clone of the pending load.
    pub fn load(&self, name: &str, source: &str) -> SharedLoad {
        if let Some(entry) = self.entries.borrow().get(name) {
            return match entry {
                Entry::Ready(texture) => {
                    let texture = Rc::clone(texture);
                    async move { Ok::<_, LoadError>(texture) }.boxed_local().shared()
                }
                Entry::Loading(pending) => pending.clone(),
            };
        }

        debug!("loading texture `{}` from {}", name, source);
        let fetch = self.loader.fetch(source);
        let entries: Weak<RefCell<HashMap<String, Entry>>> = Rc::downgrade(&self.entries);
        let settings = self.settings;
        let key = name.to_string();

        let pending = async move {
            let result = fetch
                .await
                .map(|image| Rc::new(Texture::new(key.clone(), image, settings)));

            if let Some(entries) = entries.upgrade() {
                let mut entries = entries.borrow_mut();
                match &result {
                    Ok(texture) => {
                        entries.insert(key, Entry::Ready(Rc::clone(texture)));
                    }
                    Err(_) => {
                        entries.remove(&key);
                    }
                }
            }
            result
        }
        .boxed_local()
        .shared();

        self.entries
            .borrow_mut()
            .insert(name.to_string(), Entry::Loading(pending.clone()));
        pending
    }

    /// Load a batch. Resolves once every entry has succeeded or failed; a
    /// failure is logged and leaves that name absent from the cache.
    pub async fn preload_all(&self, assets: &[(String, String)]) -> PreloadReport {
        let loads: Vec<_> = assets
            .iter()
            .map(|(name, source)| {
                let load = self.load(name, source);
                let name = name.clone();
                load.map(move |result| (name, result))
            })
            .collect();

        let mut report = PreloadReport::default();
        for (name, result) in join_all(loads).await {
            match result {
                Ok(_) => report.loaded.push(name),
                Err(reason) => {
                    error!("asset `{}` failed to load: {}", name, reason);
                    report.failed.push(TourError::LoadFailure { name, reason });
                }
            }
        }
        info!(
            "preloaded {} of {} assets",
            report.loaded.len(),
            assets.len()
        );
        report
    }
}

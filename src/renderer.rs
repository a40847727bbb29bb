// renderer.rs — wgpu 场景渲染器：房间球面 + 热点公告板 + egui 界面
//
// 绘制顺序：房间球面（按加入顺序）-> 热点（无深度测试，叠加在最上层）-> UI

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use image::RgbaImage;
use log::{debug, info, warn};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::camera::TourCamera;
use crate::error::RenderError;
use crate::mesh::Vertex;
use crate::resources::{ColorSpace, FilterMode, Texture};
use crate::scene::{CursorStyle, MarkerDesc, MarkerId, Scene, SurfaceDesc, SurfaceId};

fn setup_egui_ui_fonts(ctx: &egui::Context) {
    // egui 自带字体不含中文：找一款系统/assets 中可被 ab_glyph 解析的 CJK 字体
    // ab_glyph 对 .ttc 支持不稳定，失败会自动跳过
    let mut candidates: Vec<PathBuf> = Vec::new();

    if cfg!(windows) {
        let win_fonts = PathBuf::from(r"C:\Windows\Fonts");
        for f in ["msyh.ttf", "simhei.ttf", "Deng.ttf", "arialuni.ttf"] {
            candidates.push(win_fonts.join(f));
        }
    } else if cfg!(target_os = "macos") {
        for f in [
            "/System/Library/Fonts/PingFang.ttc",
            "/System/Library/Fonts/Hiragino Sans GB.ttc",
            "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
            "/Library/Fonts/NotoSansSC-Regular.otf",
        ] {
            candidates.push(PathBuf::from(f));
        }
    } else if cfg!(unix) {
        for f in [
            "/usr/share/fonts/opentype/noto/NotoSansSC-Regular.otf",
            "/usr/share/fonts/truetype/noto/NotoSansSC-Regular.ttf",
            "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
        ] {
            candidates.push(PathBuf::from(f));
        }
    }

    let asset_files = ["NotoSansSC-Regular.otf", "NotoSansSC-Regular.ttf", "NotoSans-Regular.ttf"];
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            for f in asset_files {
                candidates.push(dir.join("assets").join(f));
            }
        }
    }
    for f in asset_files {
        candidates.push(PathBuf::from("assets").join(f));
    }

    let chosen = candidates.into_iter().find_map(|p| {
        let bytes = std::fs::read(&p).ok()?;
        ab_glyph::FontArc::try_from_vec(bytes.clone()).ok()?;
        Some((p, bytes))
    });

    let Some((font_path, font_bytes)) = chosen else {
        warn!("no CJK UI font found, using egui defaults");
        return;
    };
    info!("UI font: {}", font_path.display());

    let mut fonts = egui::FontDefinitions::default();
    fonts
        .font_data
        .insert("ui".to_owned(), egui::FontData::from_owned(font_bytes));
    for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
        if let Some(list) = fonts.families.get_mut(&family) {
            list.push("ui".to_owned());
        }
    }
    ctx.set_fonts(fonts);
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
    right: [f32; 4],
    up: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct MaterialUniform {
    opacity: f32,
    _pad: [f32; 3],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct MarkerUniform {
    center: [f32; 3],
    size: f32,
    opacity: f32,
    _pad: [f32; 3],
}

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRIBUTES,
    }
}

struct GpuTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    filter: FilterMode,
}

struct GpuSurface {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    material_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    blending: bool,
}

struct GpuMarker {
    uniform: MarkerUniform,
    buffer: wgpu::Buffer,
    _texture: GpuTexture,
    bind_group: wgpu::BindGroup,
}

/// wgpu implementation of [`Scene`].
pub struct Renderer {
    surface: wgpu::Surface,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,

    room_opaque_pipeline: wgpu::RenderPipeline,
    room_blend_pipeline: wgpu::RenderPipeline,
    marker_pipeline: wgpu::RenderPipeline,

    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    material_layout: wgpu::BindGroupLayout,
    linear_sampler: wgpu::Sampler,
    nearest_sampler: wgpu::Sampler,
    marker_sampler: wgpu::Sampler,

    // 按名称镜像 ResourceCache 中的纹理；移除房间不会释放
    textures: HashMap<String, GpuTexture>,
    placeholder: GpuTexture,

    next_id: u32,
    surfaces: BTreeMap<SurfaceId, GpuSurface>,
    markers: BTreeMap<MarkerId, GpuMarker>,
    cursor: CursorStyle,

    // UI
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    pub async fn new(window: Arc<Window>) -> Result<Self, RenderError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = unsafe { instance.create_surface(window.as_ref()) }?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    features: wgpu::Features::empty(),
                    limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                    label: None,
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        // --- 1. Camera ---
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[CameraUniform {
                view_proj: glam::Mat4::IDENTITY.to_cols_array_2d(),
                right: [1.0, 0.0, 0.0, 0.0],
                up: [0.0, 1.0, 0.0, 0.0],
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        // --- 2. Material: uniform + texture + sampler（房间与热点共用布局）---
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
            label: Some("material_bind_group_layout"),
        });

        let panorama_sampler = |filter: wgpu::FilterMode| {
            device.create_sampler(&wgpu::SamplerDescriptor {
                address_mode_u: wgpu::AddressMode::Repeat, // 全景图水平循环
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: filter,
                min_filter: filter,
                mipmap_filter: wgpu::FilterMode::Nearest,
                ..Default::default()
            })
        };
        let linear_sampler = panorama_sampler(wgpu::FilterMode::Linear);
        let nearest_sampler = panorama_sampler(wgpu::FilterMode::Nearest);
        let marker_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        // --- 3. Pipelines ---
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Tour Pipeline Layout"),
            bind_group_layouts: &[&camera_layout, &material_layout],
            push_constant_ranges: &[],
        });
        let room_shader = device.create_shader_module(wgpu::include_wgsl!("shader_room.wgsl"));
        let marker_shader = device.create_shader_module(wgpu::include_wgsl!("shader_marker.wgsl"));

        let make_pipeline = |label: &str,
                             shader: &wgpu::ShaderModule,
                             buffers: &[wgpu::VertexBufferLayout<'_>],
                             blend: wgpu::BlendState| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: "vs_main",
                    buffers,
                },
                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format: config.format,
                        blend: Some(blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                // 房间按顺序叠加，热点始终在上层：不需要深度缓冲
                depth_stencil: None,
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview: None,
            })
        };
        let room_opaque_pipeline = make_pipeline(
            "Room Opaque Pipeline",
            &room_shader,
            &[vertex_layout()],
            wgpu::BlendState::REPLACE,
        );
        let room_blend_pipeline = make_pipeline(
            "Room Blend Pipeline",
            &room_shader,
            &[vertex_layout()],
            wgpu::BlendState::ALPHA_BLENDING,
        );
        let marker_pipeline = make_pipeline(
            "Marker Pipeline",
            &marker_shader,
            &[],
            wgpu::BlendState::ALPHA_BLENDING,
        );

        // 未贴图房间使用的中灰色纹理
        let placeholder = upload_texture(
            &device,
            &queue,
            "placeholder",
            &RgbaImage::from_pixel(1, 1, image::Rgba([96, 96, 96, 255])),
            wgpu::TextureFormat::Rgba8UnormSrgb,
            FilterMode::Linear,
        );

        // --- 4. Egui ---
        let egui_ctx = egui::Context::default();
        setup_egui_ui_fonts(&egui_ctx);
        let mut egui_state = egui_winit::State::new(window.as_ref());
        egui_state.set_pixels_per_point(window.scale_factor() as f32);
        let egui_renderer = egui_wgpu::Renderer::new(&device, config.format, None, 1);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            room_opaque_pipeline,
            room_blend_pipeline,
            marker_pipeline,
            camera_buffer,
            camera_bind_group,
            material_layout,
            linear_sampler,
            nearest_sampler,
            marker_sampler,
            textures: HashMap::new(),
            placeholder,
            next_id: 0,
            surfaces: BTreeMap::new(),
            markers: BTreeMap::new(),
            cursor: CursorStyle::Default,
            egui_ctx,
            egui_state,
            egui_renderer,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    pub fn cursor(&self) -> CursorStyle {
        self.cursor
    }

    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    /// Upload a cache texture once; later surfaces reuse the GPU copy.
    fn ensure_texture(&mut self, texture: &Texture) {
        if self.textures.contains_key(texture.name()) {
            return;
        }

        // GPU 纹理尺寸限制：超出时按比例缩小
        let max = self.device.limits().max_texture_dimension_2d;
        let (src_w, src_h) = texture.image().dimensions();
        let scaled;
        let image = if src_w > max || src_h > max {
            let scale = (max as f32 / src_w.max(src_h) as f32).min(1.0);
            let (new_w, new_h) = ((src_w as f32 * scale) as u32, (src_h as f32 * scale) as u32);
            warn!(
                "`{}` is {}x{}, above the GPU limit {}; scaled to {}x{}",
                texture.name(),
                src_w,
                src_h,
                max,
                new_w,
                new_h
            );
            scaled = image::imageops::resize(
                texture.image(),
                new_w,
                new_h,
                image::imageops::FilterType::Lanczos3,
            );
            &scaled
        } else {
            texture.image()
        };

        let settings = texture.settings();
        let format = match settings.color_space {
            ColorSpace::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            ColorSpace::Linear => wgpu::TextureFormat::Rgba8Unorm,
        };
        let gpu = upload_texture(
            &self.device,
            &self.queue,
            texture.name(),
            image,
            format,
            settings.mag_filter,
        );
        debug!("uploaded `{}` ({}x{})", texture.name(), image.width(), image.height());
        self.textures.insert(texture.name().to_string(), gpu);
    }

    fn material_bind_group(
        &self,
        label: &str,
        uniform: &wgpu::Buffer,
        view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
            label: Some(label),
        })
    }

    fn update_camera(&mut self, camera: &TourCamera) {
        let uniform = CameraUniform {
            view_proj: camera.view_proj().to_cols_array_2d(),
            right: camera.right().extend(0.0).to_array(),
            up: camera.up().extend(0.0).to_array(),
        };
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    pub fn render_with_ui(
        &mut self,
        window: &Window,
        camera: &TourCamera,
        run_ui: impl FnOnce(&egui::Context),
    ) -> Result<(), wgpu::SurfaceError> {
        self.update_camera(camera);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        // 1. Rooms, then markers on top
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Tour Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });

            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

            for surface in self.surfaces.values() {
                render_pass.set_pipeline(if surface.blending {
                    &self.room_blend_pipeline
                } else {
                    &self.room_opaque_pipeline
                });
                render_pass.set_bind_group(1, &surface.bind_group, &[]);
                render_pass.set_vertex_buffer(0, surface.vertex_buffer.slice(..));
                render_pass.set_index_buffer(surface.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..surface.index_count, 0, 0..1);
            }

            render_pass.set_pipeline(&self.marker_pipeline);
            for marker in self.markers.values() {
                render_pass.set_bind_group(1, &marker.bind_group, &[]);
                render_pass.draw(0..6, 0..1);
            }
        }

        // 2. Render UI
        let raw_input = self.egui_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, run_ui);

        self.egui_state
            .handle_platform_output(window, &self.egui_ctx, full_output.platform_output);
        let clipped_primitives = self.egui_ctx.tessellate(full_output.shapes);

        let screen_descriptor = egui_wgpu::renderer::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: window.scale_factor() as f32,
        };

        for (id, delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, delta);
        }

        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &clipped_primitives,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });
            self.egui_renderer
                .render(&mut render_pass, &clipped_primitives, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    image: &RgbaImage,
    format: wgpu::TextureFormat,
    filter: FilterMode,
) -> GpuTexture {
    let (width, height) = image.dimensions();
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        label: Some(label),
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        image,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    GpuTexture {
        _texture: texture,
        view,
        filter,
    }
}

impl Scene for Renderer {
    fn add_surface(&mut self, desc: SurfaceDesc<'_>) -> SurfaceId {
        if let Some(texture) = desc.texture {
            self.ensure_texture(texture);
        }

        let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(desc.label),
            contents: bytemuck::cast_slice(&desc.mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(desc.label),
            contents: bytemuck::cast_slice(&desc.mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let material_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(desc.label),
            contents: bytemuck::cast_slice(&[MaterialUniform {
                opacity: 1.0,
                _pad: [0.0; 3],
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let gpu_texture = desc
            .texture
            .and_then(|t| self.textures.get(t.name()))
            .unwrap_or(&self.placeholder);
        let sampler = match gpu_texture.filter {
            FilterMode::Linear => &self.linear_sampler,
            FilterMode::Nearest => &self.nearest_sampler,
        };
        let bind_group =
            self.material_bind_group(desc.label, &material_buffer, &gpu_texture.view, sampler);

        let id = SurfaceId(self.next());
        self.surfaces.insert(
            id,
            GpuSurface {
                vertex_buffer,
                index_buffer,
                index_count: desc.mesh.indices.len() as u32,
                material_buffer,
                bind_group,
                blending: false,
            },
        );
        debug!("surface {:?} `{}` added", id, desc.label);
        id
    }

    fn set_surface_opacity(&mut self, id: SurfaceId, opacity: f32, blending: bool) {
        let Some(surface) = self.surfaces.get_mut(&id) else {
            return;
        };
        surface.blending = blending;
        self.queue.write_buffer(
            &surface.material_buffer,
            0,
            bytemuck::cast_slice(&[MaterialUniform {
                opacity,
                _pad: [0.0; 3],
            }]),
        );
    }

    fn remove_surface(&mut self, id: SurfaceId) {
        // wgpu 资源随 drop 释放；纹理留在 textures 表中
        if self.surfaces.remove(&id).is_some() {
            debug!("surface {:?} removed", id);
        }
    }

    fn add_marker(&mut self, desc: MarkerDesc) -> MarkerId {
        let uniform = MarkerUniform {
            center: desc.position.to_array(),
            size: desc.size,
            opacity: desc.opacity,
            _pad: [0.0; 3],
        };
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(desc.label.as_str()),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let texture = upload_texture(
            &self.device,
            &self.queue,
            &desc.label,
            &desc.image,
            wgpu::TextureFormat::Rgba8UnormSrgb,
            FilterMode::Linear,
        );
        let bind_group =
            self.material_bind_group(&desc.label, &buffer, &texture.view, &self.marker_sampler);

        let id = MarkerId(self.next());
        self.markers.insert(
            id,
            GpuMarker {
                uniform,
                buffer,
                _texture: texture,
                bind_group,
            },
        );
        id
    }

    fn update_marker(&mut self, id: MarkerId, size: f32, opacity: f32) {
        let Some(marker) = self.markers.get_mut(&id) else {
            return;
        };
        marker.uniform.size = size;
        marker.uniform.opacity = opacity;
        self.queue
            .write_buffer(&marker.buffer, 0, bytemuck::cast_slice(&[marker.uniform]));
    }

    fn remove_marker(&mut self, id: MarkerId) {
        self.markers.remove(&id);
    }

    fn set_cursor(&mut self, cursor: CursorStyle) {
        self.cursor = cursor;
    }
}

//! wgpu implementation of [`RenderBackend`].
//!
//! Scene nodes are converted into instanced quads in draw order. Consecutive
//! nodes of the same kind share a draw call; a clip push or pop splits the
//! stream and changes the scissor rect. All geometry is in physical pixels;
//! the shaders convert to clip space with a viewport uniform.

mod atlas;

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use layoutlab_core::{
    Color, GlyphRasterConfig, ImageHandle, Rect, RenderBackend, Scene, SceneNode,
};

pub use atlas::{AtlasKind, GlyphAtlas, GlyphInfo, ShelfPacker};

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Globals {
    viewport: [f32; 2],
    _pad: [f32; 2],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
struct RectInstance {
    xywh: [f32; 4],
    radius: f32,
    color: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
struct BorderInstance {
    xywh: [f32; 4],
    radius: f32,
    stroke: f32,
    color: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
struct GlyphInstance {
    xywh: [f32; 4],
    uv: [f32; 4],
    color: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
struct ImageInstance {
    xywh: [f32; 4],
    uv: [f32; 4],
    radius: f32,
    tint: [f32; 4],
    use_tint: f32,
}

const RECT_ATTRS: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x4, 1 => Float32, 2 => Float32x4];
const BORDER_ATTRS: [wgpu::VertexAttribute; 4] =
    wgpu::vertex_attr_array![0 => Float32x4, 1 => Float32, 2 => Float32, 3 => Float32x4];
const GLYPH_ATTRS: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x4, 1 => Float32x4, 2 => Float32x4];
const IMAGE_ATTRS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
    0 => Float32x4, 1 => Float32x4, 2 => Float32, 3 => Float32x4, 4 => Float32
];

/// Per-frame vertex buffer that grows to fit the largest upload seen.
struct InstanceBuffer {
    label: &'static str,
    buf: wgpu::Buffer,
    cap: u64,
}

impl InstanceBuffer {
    fn new(device: &wgpu::Device, label: &'static str, cap: u64) -> Self {
        Self {
            label,
            buf: create_vertex_buffer(device, label, cap),
            cap,
        }
    }

    fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let len = bytes.len() as u64;
        if len > self.cap {
            let cap = len.next_power_of_two();
            log::debug!("growing {} to {cap} bytes", self.label);
            self.buf = create_vertex_buffer(device, self.label, cap);
            self.cap = cap;
        }
        queue.write_buffer(&self.buf, 0, bytes);
    }
}

fn create_vertex_buffer(device: &wgpu::Device, label: &str, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

struct GpuImage {
    generation: u64,
    bind: wgpu::BindGroup,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pipe {
    Rect,
    Border,
    GlyphMask,
    GlyphColor,
    Image(ImageHandle),
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Cmd {
    Scissor(Rect),
    Draw { pipe: Pipe, start: u32, count: u32 },
}

/// Instances and commands for one frame, in scene order.
#[derive(Default)]
struct FrameBatch {
    rects: Vec<RectInstance>,
    borders: Vec<BorderInstance>,
    masks: Vec<GlyphInstance>,
    colors: Vec<GlyphInstance>,
    images: Vec<ImageInstance>,
    cmds: Vec<Cmd>,
}

impl FrameBatch {
    /// Extends the previous draw when it uses the same pipeline and bindings.
    fn record(&mut self, pipe: Pipe, index: usize) {
        if let Some(Cmd::Draw {
            pipe: last, count, ..
        }) = self.cmds.last_mut()
            && *last == pipe
        {
            *count += 1;
            return;
        }
        self.cmds.push(Cmd::Draw {
            pipe,
            start: index as u32,
            count: 1,
        });
    }

    fn rect(&mut self, inst: RectInstance) {
        self.record(Pipe::Rect, self.rects.len());
        self.rects.push(inst);
    }

    fn border(&mut self, inst: BorderInstance) {
        self.record(Pipe::Border, self.borders.len());
        self.borders.push(inst);
    }

    fn glyph(&mut self, kind: AtlasKind, inst: GlyphInstance) {
        match kind {
            AtlasKind::Mask => {
                self.record(Pipe::GlyphMask, self.masks.len());
                self.masks.push(inst);
            }
            AtlasKind::Color => {
                self.record(Pipe::GlyphColor, self.colors.len());
                self.colors.push(inst);
            }
        }
    }

    fn image(&mut self, handle: ImageHandle, inst: ImageInstance) {
        self.record(Pipe::Image(handle), self.images.len());
        self.images.push(inst);
    }
}

/// Nested clip rects; each push intersects with the current top.
struct ClipStack {
    root: Rect,
    stack: Vec<Rect>,
}

impl ClipStack {
    fn new(root: Rect) -> Self {
        Self {
            root,
            stack: Vec::with_capacity(8),
        }
    }

    fn top(&self) -> Rect {
        self.stack.last().copied().unwrap_or(self.root)
    }

    fn push(&mut self, r: Rect) -> Rect {
        let next = self.top().intersect(&r);
        self.stack.push(next);
        next
    }

    fn pop(&mut self) -> Rect {
        if self.stack.pop().is_none() {
            log::warn!("PopClip with empty clip stack");
        }
        self.top()
    }
}

/// Integer scissor rect clamped to the framebuffer.
fn to_scissor(r: Rect, fb_w: u32, fb_h: u32) -> (u32, u32, u32, u32) {
    let x0 = r.x.floor().max(0.0) as i64;
    let y0 = r.y.floor().max(0.0) as i64;
    let x1 = (r.x + r.w).ceil().min(fb_w as f32) as i64;
    let y1 = (r.y + r.h).ceil().min(fb_h as f32) as i64;
    if r.w <= 0.0 || r.h <= 0.0 || x1 <= x0 || y1 <= y0 {
        return (0, 0, 0, 0);
    }
    (x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32)
}

/// Converts scene nodes into instances. Glyphs and images are resolved
/// through the closures so this stays independent of the GPU.
fn build_batch(
    scene: &Scene,
    viewport: Rect,
    mut glyph: impl FnMut(layoutlab_text::GlyphKey) -> Option<(AtlasKind, GlyphInfo)>,
    mut image_ready: impl FnMut(ImageHandle) -> bool,
) -> FrameBatch {
    let mut batch = FrameBatch::default();
    let mut clips = ClipStack::new(viewport);

    for node in &scene.nodes {
        match node {
            SceneNode::Rect {
                rect,
                color,
                radius,
            } => batch.rect(RectInstance {
                xywh: xywh(*rect),
                radius: *radius,
                color: color.to_linear(),
            }),
            SceneNode::Border {
                rect,
                color,
                width,
                radius,
            } => batch.border(BorderInstance {
                xywh: xywh(*rect),
                radius: *radius,
                stroke: *width,
                color: color.to_linear(),
            }),
            SceneNode::Text {
                rect,
                text,
                color,
                size,
                weight,
            } => {
                let px = size.clamp(4.0, 256.0);
                let baseline = rect.y + layoutlab_text::line_metrics(px, Some(rect.h)).baseline;
                for g in layoutlab_text::shape_line(text, px, weight.0) {
                    let Some((kind, info)) = glyph(g.key) else {
                        continue;
                    };
                    let x = (rect.x + g.x + g.bearing_x).round();
                    let y = (baseline - g.bearing_y).round();
                    let tint = match kind {
                        AtlasKind::Mask => color.to_linear(),
                        // Color glyphs keep their own colors.
                        AtlasKind::Color => [1.0, 1.0, 1.0, color.to_linear()[3]],
                    };
                    batch.glyph(
                        kind,
                        GlyphInstance {
                            xywh: [x, y, info.w, info.h],
                            uv: info.uv,
                            color: tint,
                        },
                    );
                }
            }
            SceneNode::Image {
                rect,
                handle,
                uv,
                radius,
                tint,
            } => {
                if !image_ready(*handle) {
                    placeholder(&mut batch, *rect, *radius);
                    continue;
                }
                batch.image(
                    *handle,
                    ImageInstance {
                        xywh: xywh(*rect),
                        uv: *uv,
                        radius: *radius,
                        tint: tint.unwrap_or(Color::WHITE).to_linear(),
                        use_tint: if tint.is_some() { 1.0 } else { 0.0 },
                    },
                );
            }
            // Rounded clips are approximated by their bounding rect.
            SceneNode::PushClip { rect, .. } => {
                let r = clips.push(*rect);
                batch.cmds.push(Cmd::Scissor(r));
            }
            SceneNode::PopClip => {
                let r = clips.pop();
                batch.cmds.push(Cmd::Scissor(r));
            }
        }
    }
    batch
}

/// Faded box with a frame, drawn when an image has no texture.
fn placeholder(batch: &mut FrameBatch, rect: Rect, radius: f32) {
    let outline = layoutlab_core::theme().outline;
    batch.rect(RectInstance {
        xywh: xywh(rect),
        radius,
        color: outline.faded(0.35).to_linear(),
    });
    batch.border(BorderInstance {
        xywh: xywh(rect),
        radius,
        stroke: 1.0,
        color: outline.to_linear(),
    });
}

fn xywh(r: Rect) -> [f32; 4] {
    [r.x, r.y, r.w, r.h]
}

pub struct WgpuBackend {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    globals_buf: wgpu::Buffer,
    globals_bind: wgpu::BindGroup,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,

    rect_pipeline: wgpu::RenderPipeline,
    border_pipeline: wgpu::RenderPipeline,
    mask_pipeline: wgpu::RenderPipeline,
    color_pipeline: wgpu::RenderPipeline,
    image_pipeline: wgpu::RenderPipeline,

    atlas_mask: GlyphAtlas,
    atlas_color: GlyphAtlas,
    mask_bind: Option<wgpu::BindGroup>,
    color_bind: Option<wgpu::BindGroup>,

    images: HashMap<ImageHandle, GpuImage>,

    rect_buf: InstanceBuffer,
    border_buf: InstanceBuffer,
    mask_buf: InstanceBuffer,
    color_buf: InstanceBuffer,
    image_buf: InstanceBuffer,
}

impl WgpuBackend {
    pub fn new(window: Arc<winit::window::Window>) -> anyhow::Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::from_env_or_default());
        let surface = instance.create_surface(window.clone())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(|e| anyhow::anyhow!("no suitable GPU adapter: {e}"))?;
        log::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) =
            pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
                label: Some("layoutlab device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            }))?;

        let size = window.inner_size();
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("surface reports no formats"))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let globals_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("globals"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let globals_bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals bind"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buf.as_entire_binding(),
            }],
        });
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("linear clamp"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let shapes_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shapes layout"),
            bind_group_layouts: &[&globals_layout],
            immediate_size: 0,
        });
        let textured_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("textured layout"),
            bind_group_layouts: &[&globals_layout, &texture_layout],
            immediate_size: 0,
        });

        let shader = |label: &'static str, src: &'static str| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(src)),
            })
        };
        let rect_shader = shader(
            "rect.wgsl",
            concat!(
                include_str!("shaders/common.wgsl"),
                include_str!("shaders/rect.wgsl")
            ),
        );
        let border_shader = shader(
            "border.wgsl",
            concat!(
                include_str!("shaders/common.wgsl"),
                include_str!("shaders/border.wgsl")
            ),
        );
        let text_shader = shader(
            "text.wgsl",
            concat!(
                include_str!("shaders/common.wgsl"),
                include_str!("shaders/text.wgsl")
            ),
        );
        let image_shader = shader(
            "image.wgsl",
            concat!(
                include_str!("shaders/common.wgsl"),
                include_str!("shaders/image.wgsl")
            ),
        );

        let pipeline = |label: &'static str,
                        module: &wgpu::ShaderModule,
                        fs_entry: &'static str,
                        layout: &wgpu::PipelineLayout,
                        stride: usize,
                        attributes: &[wgpu::VertexAttribute]| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module,
                    entry_point: Some("vs_main"),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: stride as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes,
                    }],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module,
                    entry_point: Some(fs_entry),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        };

        let rect_pipeline = pipeline(
            "rect pipeline",
            &rect_shader,
            "fs_main",
            &shapes_layout,
            std::mem::size_of::<RectInstance>(),
            &RECT_ATTRS,
        );
        let border_pipeline = pipeline(
            "border pipeline",
            &border_shader,
            "fs_main",
            &shapes_layout,
            std::mem::size_of::<BorderInstance>(),
            &BORDER_ATTRS,
        );
        let mask_pipeline = pipeline(
            "text pipeline (mask)",
            &text_shader,
            "fs_mask",
            &textured_layout,
            std::mem::size_of::<GlyphInstance>(),
            &GLYPH_ATTRS,
        );
        let color_pipeline = pipeline(
            "text pipeline (color)",
            &text_shader,
            "fs_color",
            &textured_layout,
            std::mem::size_of::<GlyphInstance>(),
            &GLYPH_ATTRS,
        );
        let image_pipeline = pipeline(
            "image pipeline",
            &image_shader,
            "fs_main",
            &textured_layout,
            std::mem::size_of::<ImageInstance>(),
            &IMAGE_ATTRS,
        );

        let atlas_mask = GlyphAtlas::new(&device, AtlasKind::Mask);
        let atlas_color = GlyphAtlas::new(&device, AtlasKind::Color);

        let rect_buf = InstanceBuffer::new(&device, "rect instances", 1 << 16);
        let border_buf = InstanceBuffer::new(&device, "border instances", 1 << 14);
        let mask_buf = InstanceBuffer::new(&device, "glyph mask instances", 1 << 16);
        let color_buf = InstanceBuffer::new(&device, "glyph color instances", 1 << 12);
        let image_buf = InstanceBuffer::new(&device, "image instances", 1 << 14);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            globals_buf,
            globals_bind,
            texture_layout,
            sampler,
            rect_pipeline,
            border_pipeline,
            mask_pipeline,
            color_pipeline,
            image_pipeline,
            atlas_mask,
            atlas_color,
            mask_bind: None,
            color_bind: None,
            images: HashMap::new(),
            rect_buf,
            border_buf,
            mask_buf,
            color_buf,
            image_buf,
        })
    }

    fn texture_bind(&self, label: &str, view: &wgpu::TextureView) -> wgpu::BindGroup {
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }

    /// Uploads a registered image, or re-uploads it when its generation
    /// changed. Returns false for unregistered handles.
    fn ensure_image(&mut self, handle: ImageHandle) -> bool {
        let Some(src) = layoutlab_core::image(handle) else {
            self.images.remove(&handle);
            return false;
        };
        if self
            .images
            .get(&handle)
            .is_some_and(|g| g.generation == src.generation)
        {
            return true;
        }
        let limit = self.device.limits().max_texture_dimension_2d;
        if src.width > limit || src.height > limit {
            log::warn!(
                "image {:?} is {}x{}, above the {limit}px texture limit",
                handle,
                src.width,
                src.height
            );
            return false;
        }

        let extent = wgpu::Extent3d {
            width: src.width,
            height: src.height,
            depth_or_array_layers: 1,
        };
        let tex = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("image"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &tex,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &src.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(src.width * 4),
                rows_per_image: Some(src.height),
            },
            extent,
        );
        let view = tex.create_view(&wgpu::TextureViewDescriptor::default());
        let bind = self.texture_bind("image bind", &view);
        log::debug!(
            "uploaded image {:?} ({}x{}, gen {})",
            handle,
            src.width,
            src.height,
            src.generation
        );
        self.images.insert(
            handle,
            GpuImage {
                generation: src.generation,
                bind,
            },
        );
        true
    }

    fn acquire(&mut self) -> Option<wgpu::SurfaceTexture> {
        for _ in 0..2 {
            match self.surface.get_current_texture() {
                Ok(frame) => return Some(frame),
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    log::warn!("surface lost or outdated; reconfiguring");
                    self.surface.configure(&self.device, &self.config);
                }
                Err(wgpu::SurfaceError::Timeout) => {
                    log::warn!("surface timeout; skipping frame");
                    return None;
                }
                Err(e) => {
                    log::error!("surface error: {e}");
                    return None;
                }
            }
        }
        None
    }
}

impl RenderBackend for WgpuBackend {
    fn configure_surface(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
    }

    fn frame(&mut self, scene: &Scene, _glyph_cfg: GlyphRasterConfig) {
        if self.config.width == 0 || self.config.height == 0 {
            return;
        }
        let fb_w = self.config.width as f32;
        let fb_h = self.config.height as f32;
        let viewport = Rect::new(0.0, 0.0, fb_w, fb_h);

        // Images are uploaded before batching so the closure below only reads.
        let mut ready: HashMap<ImageHandle, bool> = HashMap::new();
        for node in &scene.nodes {
            if let SceneNode::Image { handle, .. } = node
                && !ready.contains_key(handle)
            {
                let ok = self.ensure_image(*handle);
                ready.insert(*handle, ok);
            }
        }

        let batch = {
            let device = &self.device;
            let queue = &self.queue;
            let atlas_mask = &mut self.atlas_mask;
            let atlas_color = &mut self.atlas_color;
            build_batch(
                scene,
                viewport,
                |key| {
                    if let Some(info) = atlas_mask.get_or_upload(device, queue, key) {
                        return Some((AtlasKind::Mask, info));
                    }
                    atlas_color
                        .get_or_upload(device, queue, key)
                        .map(|info| (AtlasKind::Color, info))
                },
                |handle| ready.get(&handle).copied().unwrap_or(false),
            )
        };

        if self.atlas_mask.dirty || self.mask_bind.is_none() {
            self.mask_bind = Some(self.texture_bind("atlas mask bind", &self.atlas_mask.view));
            self.atlas_mask.dirty = false;
        }
        if self.atlas_color.dirty || self.color_bind.is_none() {
            self.color_bind = Some(self.texture_bind("atlas color bind", &self.atlas_color.view));
            self.atlas_color.dirty = false;
        }

        self.queue.write_buffer(
            &self.globals_buf,
            0,
            bytemuck::bytes_of(&Globals {
                viewport: [fb_w, fb_h],
                _pad: [0.0; 2],
            }),
        );
        self.rect_buf
            .upload(&self.device, &self.queue, bytemuck::cast_slice(&batch.rects));
        self.border_buf
            .upload(&self.device, &self.queue, bytemuck::cast_slice(&batch.borders));
        self.mask_buf
            .upload(&self.device, &self.queue, bytemuck::cast_slice(&batch.masks));
        self.color_buf
            .upload(&self.device, &self.queue, bytemuck::cast_slice(&batch.colors));
        self.image_buf
            .upload(&self.device, &self.queue, bytemuck::cast_slice(&batch.images));

        let Some(frame) = self.acquire() else {
            return;
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });

        {
            let clear = scene.clear_color.to_linear();
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear[0] as f64,
                            g: clear[1] as f64,
                            b: clear[2] as f64,
                            a: clear[3] as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            rpass.set_bind_group(0, &self.globals_bind, &[]);
            rpass.set_scissor_rect(0, 0, self.config.width, self.config.height);
            let mut clipped_out = false;

            for cmd in &batch.cmds {
                match *cmd {
                    Cmd::Scissor(r) => {
                        let (x, y, w, h) = to_scissor(r, self.config.width, self.config.height);
                        clipped_out = w == 0 || h == 0;
                        if !clipped_out {
                            rpass.set_scissor_rect(x, y, w, h);
                        }
                    }
                    Cmd::Draw { .. } if clipped_out => {}
                    Cmd::Draw { pipe, start, count } => {
                        let range = start..start + count;
                        match pipe {
                            Pipe::Rect => {
                                rpass.set_pipeline(&self.rect_pipeline);
                                rpass.set_vertex_buffer(0, self.rect_buf.buf.slice(..));
                            }
                            Pipe::Border => {
                                rpass.set_pipeline(&self.border_pipeline);
                                rpass.set_vertex_buffer(0, self.border_buf.buf.slice(..));
                            }
                            Pipe::GlyphMask => {
                                let Some(bind) = &self.mask_bind else { continue };
                                rpass.set_pipeline(&self.mask_pipeline);
                                rpass.set_bind_group(1, bind, &[]);
                                rpass.set_vertex_buffer(0, self.mask_buf.buf.slice(..));
                            }
                            Pipe::GlyphColor => {
                                let Some(bind) = &self.color_bind else { continue };
                                rpass.set_pipeline(&self.color_pipeline);
                                rpass.set_bind_group(1, bind, &[]);
                                rpass.set_vertex_buffer(0, self.color_buf.buf.slice(..));
                            }
                            Pipe::Image(handle) => {
                                let Some(img) = self.images.get(&handle) else {
                                    continue;
                                };
                                rpass.set_pipeline(&self.image_pipeline);
                                rpass.set_bind_group(1, &img.bind, &[]);
                                rpass.set_vertex_buffer(0, self.image_buf.buf.slice(..));
                            }
                        }
                        rpass.draw(0..6, range);
                    }
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(nodes: Vec<SceneNode>) -> Scene {
        Scene {
            clear_color: Color::WHITE,
            nodes,
        }
    }

    fn rect_node(x: f32) -> SceneNode {
        SceneNode::Rect {
            rect: Rect::new(x, 0.0, 10.0, 10.0),
            color: Color::WHITE,
            radius: 0.0,
        }
    }

    #[test]
    fn consecutive_rects_share_a_draw() {
        let s = scene(vec![rect_node(0.0), rect_node(10.0), rect_node(20.0)]);
        let b = build_batch(&s, Rect::new(0.0, 0.0, 100.0, 100.0), |_| None, |_| true);
        assert_eq!(b.rects.len(), 3);
        assert_eq!(
            b.cmds,
            vec![Cmd::Draw {
                pipe: Pipe::Rect,
                start: 0,
                count: 3
            }]
        );
    }

    #[test]
    fn draw_order_survives_kind_changes() {
        let s = scene(vec![
            rect_node(0.0),
            SceneNode::Border {
                rect: Rect::new(0.0, 0.0, 10.0, 10.0),
                color: Color::WHITE,
                width: 1.0,
                radius: 2.0,
            },
            rect_node(20.0),
        ]);
        let b = build_batch(&s, Rect::new(0.0, 0.0, 100.0, 100.0), |_| None, |_| true);
        let pipes: Vec<_> = b
            .cmds
            .iter()
            .filter_map(|c| match c {
                Cmd::Draw { pipe, start, .. } => Some((*pipe, *start)),
                Cmd::Scissor(_) => None,
            })
            .collect();
        assert_eq!(
            pipes,
            vec![(Pipe::Rect, 0), (Pipe::Border, 0), (Pipe::Rect, 1)]
        );
    }

    #[test]
    fn nested_clips_intersect_and_restore() {
        let s = scene(vec![
            SceneNode::PushClip {
                rect: Rect::new(10.0, 10.0, 50.0, 50.0),
                radius: 0.0,
            },
            SceneNode::PushClip {
                rect: Rect::new(40.0, 0.0, 100.0, 30.0),
                radius: 8.0,
            },
            SceneNode::PopClip,
            SceneNode::PopClip,
        ]);
        let b = build_batch(&s, Rect::new(0.0, 0.0, 200.0, 100.0), |_| None, |_| true);
        assert_eq!(
            b.cmds,
            vec![
                Cmd::Scissor(Rect::new(10.0, 10.0, 50.0, 50.0)),
                Cmd::Scissor(Rect::new(40.0, 10.0, 20.0, 20.0)),
                Cmd::Scissor(Rect::new(10.0, 10.0, 50.0, 50.0)),
                Cmd::Scissor(Rect::new(0.0, 0.0, 200.0, 100.0)),
            ]
        );
    }

    #[test]
    fn unready_images_fall_back_to_placeholder() {
        let a = ImageHandle::named("a");
        let b_handle = ImageHandle::named("b");
        let img = |handle| SceneNode::Image {
            rect: Rect::new(0.0, 0.0, 88.0, 88.0),
            handle,
            uv: [0.0, 0.0, 1.0, 1.0],
            radius: 44.0,
            tint: None,
        };
        let s = scene(vec![img(a), img(a), img(b_handle), img(ImageHandle::named("missing"))]);
        let b = build_batch(
            &s,
            Rect::new(0.0, 0.0, 100.0, 100.0),
            |_| None,
            |h| h != ImageHandle::named("missing"),
        );
        assert_eq!(b.images.len(), 3);
        assert_eq!(b.images[0].use_tint, 0.0);
        assert_eq!(b.cmds.len(), 4);
        assert!(matches!(b.cmds[2], Cmd::Draw { pipe: Pipe::Rect, count: 1, .. }));
        assert_eq!(b.borders[0].radius, 44.0);
        assert!(matches!(
            b.cmds[0],
            Cmd::Draw {
                pipe: Pipe::Image(h),
                count: 2,
                ..
            } if h == a
        ));
    }

    #[test]
    fn scissor_clamps_to_framebuffer() {
        assert_eq!(
            to_scissor(Rect::new(-5.0, 10.5, 50.0, 500.0), 40, 100),
            (0, 10, 40, 90)
        );
        assert_eq!(to_scissor(Rect::new(50.0, 0.0, 10.0, 10.0), 40, 100), (0, 0, 0, 0));
        assert_eq!(to_scissor(Rect::new(0.0, 0.0, 0.0, 10.0), 40, 100), (0, 0, 0, 0));
    }
}

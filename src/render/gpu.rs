use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::{Window, WindowId};

use crate::camera::{Camera, Viewport};
use crate::material::ShadingModel;
use crate::mesh::{Attribute, Mesh, VertexLayout};
use crate::renderer::{DrawCall, DrawSink, FrameRenderer, FrameStats};
use crate::shader::ShaderProgram;
use crate::texture::{ChannelLayout, Texture, TextureHandle, TextureStore};

type PipelineKey = (ShadingModel, VertexLayout);

/// wgpu backend: uploads each object once and replays the frame's draw calls
/// in a single depth-tested pass.
pub struct GpuRenderer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    depth: DepthBuffer,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    fallback_texture: GpuTexture,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    objects: HashMap<usize, ObjectBuffers>,
    textures: HashMap<TextureHandle, GpuTexture>,
    oversized: HashSet<TextureHandle>,
    pending: Vec<PendingDraw>,
}

impl GpuRenderer {
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(anyhow!("window has zero area"));
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance
            .create_surface(Arc::clone(&window))
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to acquire GPU adapter")?;
        info!("using GPU adapter {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("desk-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = choose_surface_format(&surface_caps.formats)
            .context("surface reports no formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth = DepthBuffer::create(&device, config.width, config.height);

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform-bind-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture-bind-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
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
            label: Some("texture1-sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            ..Default::default()
        });

        let white = Texture::from_pixels("fallback-white", &[255; 4], 1, 1, ChannelLayout::Rgba)
            .context("failed to build fallback texture")?;
        let fallback_texture = GpuTexture::upload(&device, &queue, &texture_layout, &sampler, &white);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            depth,
            uniform_layout,
            texture_layout,
            sampler,
            fallback_texture,
            pipelines: HashMap::new(),
            objects: HashMap::new(),
            textures: HashMap::new(),
            oversized: HashSet::new(),
            pending: Vec::new(),
        })
    }

    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.size.width as f32, self.size.height as f32)
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth = DepthBuffer::create(&self.device, new_size.width, new_size.height);
    }

    /// Reapplies the current configuration after a lost or outdated surface.
    pub fn reconfigure(&mut self) {
        let size = self.window.inner_size();
        self.resize(size);
    }

    /// Renders and presents one frame.
    pub fn render(
        &mut self,
        frame: &mut FrameRenderer,
        camera: &Camera,
        textures: &TextureStore,
    ) -> Result<FrameStats, wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.sync_textures(textures);
        self.pending.clear();
        let viewport = self.viewport();
        let stats = frame.render_frame(camera, viewport, textures, self);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("desk-encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("desk-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            for draw in &self.pending {
                let (Some(pipeline), Some(object)) =
                    (self.pipelines.get(&draw.pipeline), self.objects.get(&draw.slot))
                else {
                    continue;
                };
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &object.bind_group, &[]);
                if draw.textured {
                    let texture = draw
                        .texture
                        .and_then(|handle| self.textures.get(&handle))
                        .unwrap_or(&self.fallback_texture);
                    pass.set_bind_group(1, &texture.bind_group, &[]);
                }
                pass.set_vertex_buffer(0, object.mesh.vertex.slice(..));
                pass.set_index_buffer(object.mesh.index.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..object.mesh.index_count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(stats)
    }

    fn sync_textures(&mut self, store: &TextureStore) {
        for (handle, texture) in store.iter() {
            if self.textures.contains_key(&handle) || self.oversized.contains(&handle) {
                continue;
            }
            let max_dimension = self.device.limits().max_texture_dimension_2d;
            if !fits_texture_limit(texture.width(), texture.height(), max_dimension) {
                warn!(
                    "texture {} is {}x{}, above the device limit of {max_dimension}; using fallback",
                    texture.name(),
                    texture.width(),
                    texture.height()
                );
                self.oversized.insert(handle);
                continue;
            }
            let uploaded = GpuTexture::upload(
                &self.device,
                &self.queue,
                &self.texture_layout,
                &self.sampler,
                texture,
            );
            debug!("uploaded texture {}", texture.name());
            self.textures.insert(handle, uploaded);
        }
    }

    fn ensure_pipeline(&mut self, key: PipelineKey, program: &ShaderProgram) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        let (model, layout) = key;
        let source = program.source();
        let vertex_module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{model}-vertex")),
            source: wgpu::ShaderSource::Wgsl(source.vertex.into()),
        });
        let fragment_module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{model}-fragment")),
            source: wgpu::ShaderSource::Wgsl(source.fragment.into()),
        });

        let mut bind_group_layouts = vec![&self.uniform_layout];
        if program.uses_texture() {
            bind_group_layouts.push(&self.texture_layout);
        }
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&format!("{model}-layout")),
                bind_group_layouts: &bind_group_layouts,
                immediate_size: 0,
            });

        let attributes = vertex_attributes(layout);
        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&format!("{model}-pipeline")),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &vertex_module,
                    entry_point: Some(program.vertex_entry()),
                    compilation_options: Default::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: layout.stride_bytes(),
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &attributes,
                    }],
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DepthBuffer::FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: Default::default(),
                    bias: Default::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: &fragment_module,
                    entry_point: Some(program.fragment_entry()),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.config.format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                multiview_mask: None,
                cache: None,
            });
        debug!("created pipeline for {model} / {layout:?}");
        self.pipelines.insert(key, pipeline);
    }
}

impl DrawSink for GpuRenderer {
    fn draw(&mut self, call: &DrawCall<'_>) {
        let key = (call.shading_model, call.mesh.layout());
        self.ensure_pipeline(key, call.program);

        let uniforms = call.program.uniform_bytes();
        if !self.objects.contains_key(&call.slot) {
            let object =
                ObjectBuffers::new(&self.device, &self.uniform_layout, call.name, call.mesh, uniforms);
            debug!("uploaded buffers for {}", call.name);
            self.objects.insert(call.slot, object);
        }
        if let Some(object) = self.objects.get(&call.slot) {
            self.queue.write_buffer(&object.uniform, 0, uniforms);
        }

        self.pending.push(PendingDraw {
            slot: call.slot,
            pipeline: key,
            texture: call.texture,
            textured: call.program.uses_texture(),
        });
    }
}

struct PendingDraw {
    slot: usize,
    pipeline: PipelineKey,
    texture: Option<TextureHandle>,
    textured: bool,
}

fn choose_surface_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .copied()
        .find(|format| !format.is_srgb())
        .or_else(|| formats.first().copied())
}

fn vertex_attributes(layout: VertexLayout) -> Vec<wgpu::VertexAttribute> {
    layout
        .offsets()
        .map(|(attribute, offset)| wgpu::VertexAttribute {
            format: match attribute {
                Attribute::TexCoord => wgpu::VertexFormat::Float32x2,
                _ => wgpu::VertexFormat::Float32x3,
            },
            offset: (offset * std::mem::size_of::<f32>()) as u64,
            shader_location: attribute.location(),
        })
        .collect()
}

struct MeshBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
}

impl MeshBuffers {
    fn from_mesh(device: &wgpu::Device, mesh: &Mesh, label: &str) -> Self {
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-vertices")),
            contents: bytemuck::cast_slice(mesh.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-indices")),
            contents: bytemuck::cast_slice(mesh.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex,
            index,
            index_count: mesh.indices().len() as u32,
        }
    }
}

/// Mesh plus uniform block of one scene object.
struct ObjectBuffers {
    mesh: MeshBuffers,
    uniform: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl ObjectBuffers {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        label: &str,
        mesh: &Mesh,
        uniforms: &[u8],
    ) -> Self {
        let uniform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-uniforms")),
            contents: uniforms,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label}-bind-group")),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.as_entire_binding(),
            }],
        });
        Self {
            mesh: MeshBuffers::from_mesh(device, mesh, label),
            uniform,
            bind_group,
        }
    }
}

struct GpuTexture {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

impl GpuTexture {
    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        source: &Texture,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(source.name()),
            size: wgpu::Extent3d {
                width: source.width(),
                height: source.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: source.mip_level_count(),
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (mip_level, level) in source.levels().iter().enumerate() {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: mip_level as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &level.pixels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * level.width),
                    rows_per_image: Some(level.height),
                },
                wgpu::Extent3d {
                    width: level.width,
                    height: level.height,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{}-bind-group", source.name())),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        Self {
            _texture: texture,
            bind_group,
        }
    }
}

struct DepthBuffer {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthBuffer {
    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

    fn create(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth-texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

fn fits_texture_limit(width: u32, height: u32, max_dimension: u32) -> bool {
    width <= max_dimension && height <= max_dimension
}

//! Desk scene viewer.
//!
//! The library holds the camera model, shader programs with uniforms bound by
//! name, the hand-authored desk geometry and the frame assembly that turns a
//! scene into draw calls. Everything except [`render::gpu`] is headless so it
//! can be exercised from tests and tooling without a window.

pub mod app;
pub mod camera;
pub mod config;
pub mod geometry;
pub mod input;
pub mod material;
pub mod mesh;
pub mod render;
pub mod renderer;
pub mod scene;
pub mod shader;
pub mod texture;

pub use app::{ControlRequest, FrameClock, Viewer};
pub use camera::{Camera, Movement, ProjectionMode, ScrollMode, Viewport};
pub use config::ViewerConfig;
pub use input::{InputState, KeyCode, NamedKey, VirtualCursor};
pub use material::{Material, ShadingModel};
pub use mesh::{Mesh, MeshError, VertexLayout};
pub use render::GpuRenderer;
pub use renderer::{DrawCall, DrawSink, FrameRenderer, FrameStats};
pub use scene::{Scene, SceneObject, SceneSettings, Transform};
pub use shader::{ShaderError, ShaderProgram, ShaderSource};
pub use texture::{ChannelLayout, TextureError, TextureHandle, TextureStore};

pub mod gpu;

pub use gpu::GpuRenderer;

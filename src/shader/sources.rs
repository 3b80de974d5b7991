//! WGSL source pairs for the four shading models.
//!
//! Every stage that reads uniforms declares the same `Uniforms` struct at
//! `@group(0) @binding(0)`; textures live in `@group(1)`.

use super::ShaderSource;

pub const UNLIT: ShaderSource = ShaderSource {
    label: "unlit",
    vertex: UNLIT_VERTEX,
    fragment: UNLIT_FRAGMENT,
};

pub const UNLIT_TEXTURED: ShaderSource = ShaderSource {
    label: "unlit-textured",
    vertex: TEXTURED_VERTEX,
    fragment: TEXTURED_FRAGMENT,
};

pub const AMBIENT_ONLY: ShaderSource = ShaderSource {
    label: "ambient-only",
    vertex: AMBIENT_VERTEX,
    fragment: AMBIENT_FRAGMENT,
};

pub const PHONG_LIT: ShaderSource = ShaderSource {
    label: "phong-lit",
    vertex: PHONG_VERTEX,
    fragment: PHONG_FRAGMENT,
};

const UNLIT_VERTEX: &str = r#"
struct Uniforms {
    model: mat4x4<f32>,
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
}

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) color: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = uniforms.projection * uniforms.view * uniforms.model * vec4<f32>(input.position, 1.0);
    out.color = input.color;
    return out;
}
"#;

const UNLIT_FRAGMENT: &str = r#"
struct FragmentInput {
    @location(0) color: vec3<f32>,
}

@fragment
fn fs_main(input: FragmentInput) -> @location(0) vec4<f32> {
    return vec4<f32>(input.color, 1.0);
}
"#;

const TEXTURED_VERTEX: &str = r#"
struct Uniforms {
    model: mat4x4<f32>,
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
}

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) color: vec3<f32>,
    @location(2) tex_coord: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) tex_coord: vec2<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = uniforms.projection * uniforms.view * uniforms.model * vec4<f32>(input.position, 1.0);
    out.color = input.color;
    out.tex_coord = input.tex_coord;
    return out;
}
"#;

const TEXTURED_FRAGMENT: &str = r#"
@group(1) @binding(0)
var texture1: texture_2d<f32>;

@group(1) @binding(1)
var texture1_sampler: sampler;

struct FragmentInput {
    @location(1) tex_coord: vec2<f32>,
}

@fragment
fn fs_main(input: FragmentInput) -> @location(0) vec4<f32> {
    return textureSample(texture1, texture1_sampler, input.tex_coord);
}
"#;

const AMBIENT_VERTEX: &str = r#"
struct Uniforms {
    model: mat4x4<f32>,
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    objectColor: vec3<f32>,
    lightColor: vec3<f32>,
}

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return uniforms.projection * uniforms.view * uniforms.model * vec4<f32>(position, 1.0);
}
"#;

const AMBIENT_FRAGMENT: &str = r#"
struct Uniforms {
    model: mat4x4<f32>,
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    objectColor: vec3<f32>,
    lightColor: vec3<f32>,
}

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(uniforms.lightColor * uniforms.objectColor, 1.0);
}
"#;

const PHONG_VERTEX: &str = r#"
struct Material {
    ambient: vec3<f32>,
    diffuse: vec3<f32>,
    specular: vec3<f32>,
    shininess: f32,
}

struct Light {
    ambient: vec3<f32>,
    diffuse: vec3<f32>,
    specular: vec3<f32>,
}

struct Uniforms {
    model: mat4x4<f32>,
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    material: Material,
    light: Light,
    lightPos: vec3<f32>,
    viewPos: vec3<f32>,
}

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) frag_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world = uniforms.model * vec4<f32>(input.position, 1.0);
    out.clip_position = uniforms.projection * uniforms.view * world;
    out.frag_pos = world.xyz;
    // Object-space normal; the ground plane's model matrix is singular.
    out.normal = input.normal;
    return out;
}
"#;

const PHONG_FRAGMENT: &str = r#"
struct Material {
    ambient: vec3<f32>,
    diffuse: vec3<f32>,
    specular: vec3<f32>,
    shininess: f32,
}

struct Light {
    ambient: vec3<f32>,
    diffuse: vec3<f32>,
    specular: vec3<f32>,
}

struct Uniforms {
    model: mat4x4<f32>,
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    material: Material,
    light: Light,
    lightPos: vec3<f32>,
    viewPos: vec3<f32>,
}

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct FragmentInput {
    @location(0) frag_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

@fragment
fn fs_main(input: FragmentInput) -> @location(0) vec4<f32> {
    let ambient = uniforms.light.ambient * uniforms.material.ambient;

    let norm = normalize(input.normal);
    let light_dir = normalize(uniforms.lightPos - input.frag_pos);
    let diff = max(dot(norm, light_dir), 0.0);
    let diffuse = uniforms.light.diffuse * (diff * uniforms.material.diffuse);

    let view_dir = normalize(uniforms.viewPos - input.frag_pos);
    let reflect_dir = reflect(-light_dir, norm);
    let spec = pow(max(dot(view_dir, reflect_dir), 0.0), uniforms.material.shininess);
    let specular = uniforms.light.specular * (spec * uniforms.material.specular);

    return vec4<f32>(ambient + diffuse + specular, 1.0);
}
"#;

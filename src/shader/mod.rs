//! Shader programs: WGSL stage compilation, linking and uniform binding by name.

mod sources;

use std::collections::BTreeMap;
use std::fmt;

use bytemuck::pod_read_unaligned;
use glam::{Mat4, Vec3, Vec4};
use log::{error, trace, warn};
use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{AddressSpace, Binding, Handle, Module, Scalar, TypeInner, VectorSize};
use thiserror::Error;

use crate::mesh::VertexLayout;

pub use sources::{AMBIENT_ONLY, PHONG_LIT, UNLIT, UNLIT_TEXTURED};

const UNIFORM_GROUP: u32 = 0;
const UNIFORM_BINDING: u32 = 0;

/// Immutable vertex/fragment source pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderSource {
    pub label: &'static str,
    pub vertex: &'static str,
    pub fragment: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn naga(self) -> naga::ShaderStage {
        match self {
            Self::Vertex => naga::ShaderStage::Vertex,
            Self::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShaderError {
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("shader program failed to link:\n{log}")]
    Link { log: String },
}

/// Shape of a single uniform slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl UniformKind {
    fn from_inner(inner: &TypeInner) -> Option<Self> {
        match inner {
            TypeInner::Scalar(scalar) if *scalar == Scalar::F32 => Some(Self::Float),
            TypeInner::Vector { size, scalar } if *scalar == Scalar::F32 => Some(match size {
                VectorSize::Bi => Self::Vec2,
                VectorSize::Tri => Self::Vec3,
                VectorSize::Quad => Self::Vec4,
            }),
            TypeInner::Matrix {
                columns: VectorSize::Quad,
                rows: VectorSize::Quad,
                scalar,
            } if *scalar == Scalar::F32 => Some(Self::Mat4),
            _ => None,
        }
    }

    fn size(self) -> usize {
        match self {
            Self::Float => 4,
            Self::Vec2 => 8,
            Self::Vec3 => 12,
            Self::Vec4 => 16,
            Self::Mat4 => 64,
        }
    }
}

/// Value accepted by [`ShaderProgram::set_uniform`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec3(Vec3),
    Mat4(Mat4),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            Self::Float(_) => UniformKind::Float,
            Self::Vec3(_) => UniformKind::Vec3,
            Self::Mat4(_) => UniformKind::Mat4,
        }
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<Vec3> for UniformValue {
    fn from(value: Vec3) -> Self {
        Self::Vec3(value)
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(value: [f32; 3]) -> Self {
        Self::Vec3(Vec3::from_array(value))
    }
}

impl From<Mat4> for UniformValue {
    fn from(value: Mat4) -> Self {
        Self::Mat4(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformSlot {
    pub offset: u32,
    pub kind: UniformKind,
}

/// Sampled texture declared by the fragment stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureSlot {
    pub name: String,
    pub group: u32,
    pub binding: u32,
}

/// Linked program: validated sources plus the reflected uniform block.
///
/// Uniform values are staged in a CPU-side block laid out exactly like the
/// WGSL `Uniforms` struct, ready to be copied into a uniform buffer.
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    source: ShaderSource,
    vertex_entry: String,
    fragment_entry: String,
    uniforms: BTreeMap<String, UniformSlot>,
    block: Vec<u8>,
    vertex_inputs: Vec<u32>,
    texture_slots: Vec<TextureSlot>,
}

impl ShaderProgram {
    /// Compiles both stages and links them into a program.
    ///
    /// Each stage is diagnosed on its own; when both fail, the vertex error
    /// is returned and the fragment error is logged.
    pub fn compile(source: &ShaderSource) -> Result<Self, ShaderError> {
        let vertex = StageModule::compile(ShaderStage::Vertex, source.vertex);
        let fragment = StageModule::compile(ShaderStage::Fragment, source.fragment);
        match (vertex, fragment) {
            (Ok(vertex), Ok(fragment)) => link(source, &vertex, &fragment),
            (Err(err), Ok(_)) | (Ok(_), Err(err)) => Err(err),
            (Err(err), Err(fragment_err)) => {
                error!("{}: {fragment_err}", source.label);
                Err(err)
            }
        }
    }

    pub fn label(&self) -> &'static str {
        self.source.label
    }

    pub fn source(&self) -> &ShaderSource {
        &self.source
    }

    pub fn vertex_entry(&self) -> &str {
        &self.vertex_entry
    }

    pub fn fragment_entry(&self) -> &str {
        &self.fragment_entry
    }

    /// Writes a uniform by name. Unknown names are ignored.
    pub fn set_uniform(&mut self, name: &str, value: impl Into<UniformValue>) {
        let value = value.into();
        let Some(slot) = self.uniforms.get(name).copied() else {
            trace!("{}: no active uniform named `{name}`", self.source.label);
            return;
        };
        if slot.kind != value.kind() {
            warn!(
                "{}: uniform `{name}` is {:?}, refusing {:?} value",
                self.source.label,
                slot.kind,
                value.kind()
            );
            return;
        }

        let offset = slot.offset as usize;
        match value {
            UniformValue::Float(v) => self.write(offset, &[v]),
            UniformValue::Vec3(v) => self.write(offset, &v.to_array()),
            UniformValue::Mat4(m) => self.write(offset, &m.to_cols_array()),
        }
    }

    pub fn set_vec3(&mut self, name: &str, x: f32, y: f32, z: f32) {
        self.set_uniform(name, Vec3::new(x, y, z));
    }

    fn write(&mut self, offset: usize, values: &[f32]) {
        let bytes: &[u8] = bytemuck::cast_slice(values);
        self.block[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    fn read<const N: usize>(&self, name: &str, kind: UniformKind) -> Option<[f32; N]> {
        let slot = self.uniforms.get(name).filter(|slot| slot.kind == kind)?;
        let offset = slot.offset as usize;
        Some(pod_read_unaligned(&self.block[offset..offset + kind.size()]))
    }

    pub fn uniform_float(&self, name: &str) -> Option<f32> {
        self.read::<1>(name, UniformKind::Float).map(|[v]| v)
    }

    pub fn uniform_vec3(&self, name: &str) -> Option<Vec3> {
        self.read::<3>(name, UniformKind::Vec3).map(Vec3::from_array)
    }

    pub fn uniform_mat4(&self, name: &str) -> Option<Mat4> {
        self.read::<16>(name, UniformKind::Mat4)
            .map(|cols| Mat4::from_cols_array(&cols))
    }

    pub fn uniform_slot(&self, name: &str) -> Option<UniformSlot> {
        self.uniforms.get(name).copied()
    }

    /// Staged uniform block, laid out for `@group(0) @binding(0)`.
    pub fn uniform_bytes(&self) -> &[u8] {
        &self.block
    }

    /// CPU mirror of the vertex stage: `projection * view * model * position`.
    pub fn clip_position(&self, position: Vec3) -> Option<Vec4> {
        let model = self.uniform_mat4("model")?;
        let view = self.uniform_mat4("view")?;
        let projection = self.uniform_mat4("projection")?;
        Some(projection * view * model * position.extend(1.0))
    }

    pub fn vertex_inputs(&self) -> &[u32] {
        &self.vertex_inputs
    }

    /// Whether a mesh with `layout` feeds every vertex input of this program.
    pub fn accepts_layout(&self, layout: VertexLayout) -> bool {
        self.vertex_inputs
            .iter()
            .all(|location| layout.has_location(*location))
    }

    pub fn texture_slots(&self) -> &[TextureSlot] {
        &self.texture_slots
    }

    pub fn uses_texture(&self) -> bool {
        !self.texture_slots.is_empty()
    }
}

/// Parsed and validated IR of one stage; dropped once linking finishes.
struct StageModule {
    stage: ShaderStage,
    module: Module,
    entry: String,
}

impl StageModule {
    fn compile(stage: ShaderStage, text: &str) -> Result<Self, ShaderError> {
        let module = naga::front::wgsl::parse_str(text).map_err(|err| ShaderError::Compile {
            stage,
            log: err.emit_to_string(text),
        })?;
        Validator::new(ValidationFlags::all(), Capabilities::empty())
            .validate(&module)
            .map_err(|err| ShaderError::Compile {
                stage,
                log: err.to_string(),
            })?;

        let entry = module
            .entry_points
            .iter()
            .find(|entry| entry.stage == stage.naga())
            .map(|entry| entry.name.clone())
            .ok_or_else(|| ShaderError::Compile {
                stage,
                log: format!("no @{stage} entry point"),
            })?;

        Ok(Self {
            stage,
            module,
            entry,
        })
    }

    fn entry_point(&self) -> Option<&naga::EntryPoint> {
        self.module
            .entry_points
            .iter()
            .find(|entry| entry.name == self.entry)
    }

    fn input_locations(&self) -> Vec<u32> {
        let Some(entry) = self.entry_point() else {
            return Vec::new();
        };
        entry
            .function
            .arguments
            .iter()
            .flat_map(|argument| locations(&self.module, argument.ty, argument.binding.as_ref()))
            .collect()
    }

    fn output_locations(&self) -> Vec<u32> {
        self.entry_point()
            .and_then(|entry| entry.function.result.as_ref())
            .map(|result| locations(&self.module, result.ty, result.binding.as_ref()))
            .unwrap_or_default()
    }

    fn uniform_block(&self) -> Result<Option<(BTreeMap<String, UniformSlot>, u32)>, String> {
        let mut block = None;
        for (_, global) in self.module.global_variables.iter() {
            if global.space != AddressSpace::Uniform {
                continue;
            }
            let name = global.name.as_deref().unwrap_or("<unnamed>");
            match global.binding.as_ref() {
                Some(binding)
                    if binding.group == UNIFORM_GROUP && binding.binding == UNIFORM_BINDING => {}
                Some(binding) => {
                    return Err(format!(
                        "{} stage: uniform `{name}` must be bound at @group({UNIFORM_GROUP}) \
                         @binding({UNIFORM_BINDING}), found @group({}) @binding({})",
                        self.stage, binding.group, binding.binding
                    ));
                }
                None => return Err(format!("{} stage: uniform `{name}` has no binding", self.stage)),
            }

            let mut slots = BTreeMap::new();
            let size = match &self.module.types[global.ty].inner {
                TypeInner::Struct { span, .. } => {
                    flatten_members(&self.module, global.ty, "", 0, &mut slots);
                    *span
                }
                inner => {
                    let kind = UniformKind::from_inner(inner).ok_or_else(|| {
                        format!("{} stage: unsupported uniform type for `{name}`", self.stage)
                    })?;
                    slots.insert(name.to_string(), UniformSlot { offset: 0, kind });
                    kind.size() as u32
                }
            };
            block = Some((slots, size));
        }
        Ok(block)
    }

    fn texture_slots(&self) -> Vec<TextureSlot> {
        self.module
            .global_variables
            .iter()
            .filter(|(_, global)| global.space == AddressSpace::Handle)
            .filter(|(_, global)| {
                matches!(self.module.types[global.ty].inner, TypeInner::Image { .. })
            })
            .filter_map(|(_, global)| {
                let binding = global.binding.as_ref()?;
                Some(TextureSlot {
                    name: global.name.clone()?,
                    group: binding.group,
                    binding: binding.binding,
                })
            })
            .collect()
    }
}

fn locations(module: &Module, ty: Handle<naga::Type>, binding: Option<&Binding>) -> Vec<u32> {
    match binding {
        Some(Binding::Location { location, .. }) => vec![*location],
        Some(Binding::BuiltIn(_)) => Vec::new(),
        None => match &module.types[ty].inner {
            TypeInner::Struct { members, .. } => members
                .iter()
                .filter_map(|member| match member.binding {
                    Some(Binding::Location { location, .. }) => Some(location),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        },
    }
}

fn flatten_members(
    module: &Module,
    ty: Handle<naga::Type>,
    prefix: &str,
    base: u32,
    slots: &mut BTreeMap<String, UniformSlot>,
) {
    let TypeInner::Struct { members, .. } = &module.types[ty].inner else {
        return;
    };
    for member in members {
        let Some(name) = member.name.as_deref() else {
            continue;
        };
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        };
        let offset = base + member.offset;
        match UniformKind::from_inner(&module.types[member.ty].inner) {
            Some(kind) => {
                slots.insert(path, UniformSlot { offset, kind });
            }
            None => flatten_members(module, member.ty, &path, offset, slots),
        }
    }
}

fn link(
    source: &ShaderSource,
    vertex: &StageModule,
    fragment: &StageModule,
) -> Result<ShaderProgram, ShaderError> {
    let mut problems = Vec::new();

    let produced = vertex.output_locations();
    for location in fragment.input_locations() {
        if !produced.contains(&location) {
            problems.push(format!(
                "fragment input @location({location}) is not written by the vertex stage"
            ));
        }
    }

    let mut uniforms = BTreeMap::new();
    let mut size = 0u32;
    for stage in [vertex, fragment] {
        let block = match stage.uniform_block() {
            Ok(block) => block,
            Err(problem) => {
                problems.push(problem);
                continue;
            }
        };
        let Some((slots, span)) = block else {
            continue;
        };
        size = size.max(span);
        for (name, slot) in slots {
            match uniforms.get(&name) {
                Some(existing) if *existing != slot => problems.push(format!(
                    "uniform `{name}` differs between stages ({existing:?} vs {slot:?})"
                )),
                Some(_) => {}
                None => {
                    uniforms.insert(name, slot);
                }
            }
        }
    }

    if uniforms.is_empty() && problems.is_empty() {
        problems.push("program declares no uniform block".to_string());
    }

    if !problems.is_empty() {
        return Err(ShaderError::Link {
            log: problems.join("\n"),
        });
    }

    let mut texture_slots = vertex.texture_slots();
    texture_slots.extend(fragment.texture_slots());

    Ok(ShaderProgram {
        source: *source,
        vertex_entry: vertex.entry.clone(),
        fragment_entry: fragment.entry.clone(),
        uniforms,
        block: vec![0; size as usize],
        vertex_inputs: vertex.input_locations(),
        texture_slots,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry;

    fn compile(source: &ShaderSource) -> ShaderProgram {
        ShaderProgram::compile(source).unwrap_or_else(|err| panic!("{}: {err}", source.label))
    }

    #[test]
    fn builtin_sources_compile_and_link() {
        for source in [UNLIT, UNLIT_TEXTURED, AMBIENT_ONLY, PHONG_LIT] {
            let program = compile(&source);
            for name in ["model", "view", "projection"] {
                assert_eq!(
                    program.uniform_slot(name).map(|slot| slot.kind),
                    Some(UniformKind::Mat4),
                    "{} lacks {name}",
                    source.label
                );
            }
        }
    }

    #[test]
    fn phong_uniforms_are_flattened_with_struct_offsets() {
        let program = compile(&PHONG_LIT);
        let expected = [
            ("model", 0, UniformKind::Mat4),
            ("view", 64, UniformKind::Mat4),
            ("projection", 128, UniformKind::Mat4),
            ("material.ambient", 192, UniformKind::Vec3),
            ("material.diffuse", 208, UniformKind::Vec3),
            ("material.specular", 224, UniformKind::Vec3),
            ("material.shininess", 236, UniformKind::Float),
            ("light.ambient", 240, UniformKind::Vec3),
            ("light.diffuse", 256, UniformKind::Vec3),
            ("light.specular", 272, UniformKind::Vec3),
            ("lightPos", 288, UniformKind::Vec3),
            ("viewPos", 304, UniformKind::Vec3),
        ];
        for (name, offset, kind) in expected {
            assert_eq!(
                program.uniform_slot(name),
                Some(UniformSlot { offset, kind }),
                "{name}"
            );
        }
        assert_eq!(program.uniform_bytes().len(), 320);
        assert_eq!(program.vertex_inputs(), &[0, 1]);
    }

    #[test]
    fn textured_program_reports_texture_slot() {
        let program = compile(&UNLIT_TEXTURED);
        assert!(program.uses_texture());
        assert_eq!(program.texture_slots()[0].name, "texture1");
        assert_eq!(program.texture_slots()[0].group, 1);
        assert!(!compile(&UNLIT).uses_texture());
    }

    #[test]
    fn uniforms_round_trip_and_unknown_names_are_ignored() {
        let mut program = compile(&AMBIENT_ONLY);
        program.set_vec3("objectColor", 0.9, 0.9, 0.9);
        program.set_uniform("lightColor", [1.0, 1.0, 1.0]);
        let before = program.uniform_bytes().to_vec();

        program.set_uniform("doesNotExist", 3.0);
        program.set_uniform("material.shininess", 32.0);
        assert_eq!(program.uniform_bytes(), before.as_slice());

        assert_eq!(program.uniform_vec3("objectColor"), Some(Vec3::splat(0.9)));
        assert_eq!(program.uniform_vec3("lightColor"), Some(Vec3::ONE));
    }

    #[test]
    fn mismatched_kind_is_skipped() {
        let mut program = compile(&UNLIT);
        program.set_uniform("model", Vec3::ONE);
        assert_eq!(program.uniform_mat4("model"), Some(Mat4::ZERO));
    }

    #[test]
    fn identity_matrices_leave_plane_unprojected() {
        let mut program = compile(&UNLIT);
        program.set_uniform("model", Mat4::IDENTITY);
        program.set_uniform("view", Mat4::IDENTITY);
        program.set_uniform("projection", Mat4::IDENTITY);

        let plane = geometry::plane().unwrap();
        assert_eq!(plane.vertex_count(), 4);
        for index in 0..plane.vertex_count() {
            let position = plane.position(index);
            let clip = program.clip_position(position).unwrap();
            assert_eq!(clip, Vec4::new(position.x, 0.0, position.z, 1.0));
        }
    }

    #[test]
    fn vertex_syntax_error_reports_vertex_stage() {
        let broken = ShaderSource {
            vertex: "@vertex fn vs_main( -> @builtin(position) vec4<f32> {}",
            ..UNLIT
        };
        match ShaderProgram::compile(&broken) {
            Err(ShaderError::Compile { stage, log }) => {
                assert_eq!(stage, ShaderStage::Vertex);
                assert!(!log.is_empty());
            }
            other => panic!("expected vertex compile error, got {other:?}"),
        }
    }

    #[test]
    fn fragment_without_entry_point_reports_fragment_stage() {
        let broken = ShaderSource {
            fragment: "fn helper() -> f32 { return 1.0; }",
            ..UNLIT
        };
        assert!(matches!(
            ShaderProgram::compile(&broken),
            Err(ShaderError::Compile {
                stage: ShaderStage::Fragment,
                ..
            })
        ));
    }

    #[test]
    fn unmatched_varying_fails_to_link() {
        let broken = ShaderSource {
            fragment: r#"
                @fragment
                fn fs_main(@location(5) shade: vec3<f32>) -> @location(0) vec4<f32> {
                    return vec4<f32>(shade, 1.0);
                }
            "#,
            ..UNLIT
        };
        match ShaderProgram::compile(&broken) {
            Err(ShaderError::Link { log }) => assert!(log.contains("@location(5)")),
            other => panic!("expected link error, got {other:?}"),
        }
    }

    #[test]
    fn both_broken_stages_report_the_vertex_error() {
        let broken = ShaderSource {
            vertex: "@vertex fn vs_main( -> @builtin(position) vec4<f32> {}",
            fragment: "fn helper() -> f32 { return 1.0; }",
            ..UNLIT
        };
        assert!(matches!(
            ShaderProgram::compile(&broken),
            Err(ShaderError::Compile {
                stage: ShaderStage::Vertex,
                ..
            })
        ));
    }

    #[test]
    fn disagreeing_uniform_blocks_fail_to_link() {
        let broken = ShaderSource {
            fragment: r#"
                struct Uniforms {
                    view: mat4x4<f32>,
                    model: mat4x4<f32>,
                }

                @group(0) @binding(0)
                var<uniform> uniforms: Uniforms;

                @fragment
                fn fs_main(@location(0) color: vec3<f32>) -> @location(0) vec4<f32> {
                    return uniforms.model * vec4<f32>(color, 1.0);
                }
            "#,
            ..UNLIT
        };
        match ShaderProgram::compile(&broken) {
            Err(ShaderError::Link { log }) => {
                assert!(log.contains("uniform `model` differs between stages"), "{log}");
                assert!(log.contains("uniform `view` differs between stages"), "{log}");
            }
            other => panic!("expected link error, got {other:?}"),
        }
    }

    #[test]
    fn program_without_uniform_block_fails_to_link() {
        let bare = ShaderSource {
            label: "bare",
            vertex: r#"
                @vertex
                fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
                    return vec4<f32>(position, 1.0);
                }
            "#,
            fragment: r#"
                @fragment
                fn fs_main() -> @location(0) vec4<f32> {
                    return vec4<f32>(1.0, 1.0, 1.0, 1.0);
                }
            "#,
        };
        match ShaderProgram::compile(&bare) {
            Err(ShaderError::Link { log }) => assert_eq!(log, "program declares no uniform block"),
            other => panic!("expected link error, got {other:?}"),
        }
    }

    #[test]
    fn layout_compatibility_follows_vertex_inputs() {
        let textured = compile(&UNLIT_TEXTURED);
        assert!(textured.accepts_layout(VertexLayout::PositionColorTexcoord));
        assert!(!textured.accepts_layout(VertexLayout::PositionColor));

        let ambient = compile(&AMBIENT_ONLY);
        assert!(ambient.accepts_layout(VertexLayout::PositionColor));
        assert!(ambient.accepts_layout(VertexLayout::PositionNormal));
    }
}

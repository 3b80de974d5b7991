//! Frame assembly: one program per shading model, one draw per scene object.

use std::collections::HashMap;

use log::{debug, error, trace};

use crate::camera::{Camera, Viewport};
use crate::material::ShadingModel;
use crate::mesh::Mesh;
use crate::scene::Scene;
use crate::shader::ShaderProgram;
use crate::texture::{TextureHandle, TextureStore, TextureUnit};

/// Everything a backend needs to issue one indexed draw.
#[derive(Debug)]
pub struct DrawCall<'a> {
    /// Position of the object in draw order; stable across frames.
    pub slot: usize,
    pub name: &'a str,
    pub shading_model: ShadingModel,
    pub program: &'a ShaderProgram,
    pub mesh: &'a Mesh,
    pub texture: Option<TextureHandle>,
}

/// Consumer of draw calls, in submission order.
pub trait DrawSink {
    fn draw(&mut self, call: &DrawCall<'_>);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draws: usize,
    pub skipped: usize,
    pub triangles: usize,
}

pub struct FrameRenderer {
    scene: Scene,
    programs: HashMap<ShadingModel, ShaderProgram>,
    texture_unit: TextureUnit,
}

impl FrameRenderer {
    /// Compiles every program the scene needs. Failures are logged and the
    /// affected objects are skipped at draw time.
    pub fn new(scene: Scene) -> Self {
        let mut programs = HashMap::new();
        for object in &scene.objects {
            let model = object.material.shading_model();
            if programs.contains_key(&model) {
                continue;
            }
            match ShaderProgram::compile(model.source()) {
                Ok(program) => {
                    debug!("compiled {model} program");
                    programs.insert(model, program);
                }
                Err(err) => error!("{model}: {err}"),
            }
        }

        Self {
            scene,
            programs,
            texture_unit: TextureUnit::default(),
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn program(&self, model: ShadingModel) -> Option<&ShaderProgram> {
        self.programs.get(&model)
    }

    pub fn render_frame(
        &mut self,
        camera: &Camera,
        viewport: Viewport,
        textures: &TextureStore,
        sink: &mut impl DrawSink,
    ) -> FrameStats {
        let view = camera.view_matrix();
        let projection = camera.projection_matrix(viewport);
        let mut stats = FrameStats::default();

        for (slot, object) in self.scene.objects.iter().enumerate() {
            let model = object.material.shading_model();
            let Some(program) = self.programs.get_mut(&model) else {
                trace!("skipping {}: {model} program unavailable", object.name);
                stats.skipped += 1;
                continue;
            };
            if !program.accepts_layout(object.mesh.layout()) {
                error!(
                    "skipping {}: {:?} mesh does not feed the {model} program",
                    object.name,
                    object.mesh.layout()
                );
                stats.skipped += 1;
                continue;
            }

            program.set_uniform("view", view);
            program.set_uniform("projection", projection);
            object
                .material
                .bind(program, self.scene.light_position, camera.position());
            let texture = object
                .material
                .texture()
                .and_then(|name| self.texture_unit.bind(textures, name));
            program.set_uniform("model", object.transform.matrix());

            sink.draw(&DrawCall {
                slot,
                name: &object.name,
                shading_model: model,
                program,
                mesh: &object.mesh,
                texture,
            });
            stats.draws += 1;
            stats.triangles += object.mesh.triangle_count();
        }

        trace!("frame: {stats:?}");
        stats
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3, Vec4};

    use super::*;
    use crate::mesh::VertexLayout;
    use crate::scene::{SceneSettings, SceneObject, Transform};
    use crate::material::Material;
    use crate::texture::ChannelLayout;

    const VIEWPORT: Viewport = Viewport::new(800.0, 600.0);

    #[derive(Default)]
    struct Recorder {
        calls: Vec<(String, ShadingModel, Option<TextureHandle>, Mat4, Option<Vec4>)>,
    }

    impl DrawSink for Recorder {
        fn draw(&mut self, call: &DrawCall<'_>) {
            let clip = call.program.clip_position(call.mesh.position(0));
            self.calls.push((
                call.name.to_string(),
                call.shading_model,
                call.texture,
                call.program.uniform_mat4("model").unwrap(),
                clip,
            ));
        }
    }

    fn reference_renderer() -> FrameRenderer {
        FrameRenderer::new(Scene::reference(&SceneSettings::default()).unwrap())
    }

    #[test]
    fn draws_every_object_in_order() {
        let mut renderer = reference_renderer();
        let mut sink = Recorder::default();
        let stats = renderer.render_frame(&Camera::default(), VIEWPORT, &TextureStore::new(), &mut sink);

        assert_eq!(stats, FrameStats { draws: 5, skipped: 0, triangles: 28 + 2 + 12 + 32 + 40 });
        let names: Vec<_> = sink.calls.iter().map(|c| c.0.as_str()).collect();
        assert_eq!(names, ["bottle", "plane", "tablet", "charger", "pencil"]);
    }

    #[test]
    fn each_draw_sees_its_own_model_matrix() {
        let mut renderer = reference_renderer();
        let mut sink = Recorder::default();
        renderer.render_frame(&Camera::default(), VIEWPORT, &TextureStore::new(), &mut sink);

        for (call, object) in sink.calls.iter().zip(&renderer.scene().objects) {
            assert_eq!(call.3, object.transform.matrix(), "{}", object.name);
        }
    }

    #[test]
    fn textures_resolve_through_the_unit() {
        let mut store = TextureStore::new();
        let leather = store
            .load_texture("leather.jpg", Some(&[9, 9, 9]), 1, 1, ChannelLayout::Rgb)
            .unwrap();

        let mut renderer = reference_renderer();
        let mut sink = Recorder::default();
        renderer.render_frame(&Camera::default(), VIEWPORT, &store, &mut sink);

        // Bottle texture never loaded and nothing bound yet.
        assert_eq!(sink.calls[0].2, None);
        assert_eq!(sink.calls[2].2, Some(leather));
        assert_eq!(sink.calls[1].2, None);

        // Next frame the bottle reuses the last binding.
        let mut sink = Recorder::default();
        renderer.render_frame(&Camera::default(), VIEWPORT, &store, &mut sink);
        assert_eq!(sink.calls[0].2, Some(leather));
    }

    #[test]
    fn camera_matrices_reach_the_program() {
        let mut renderer = reference_renderer();
        let camera = Camera::default();
        let mut sink = Recorder::default();
        renderer.render_frame(&camera, VIEWPORT, &TextureStore::new(), &mut sink);

        let program = renderer.program(ShadingModel::PhongLit).unwrap();
        assert_eq!(program.uniform_mat4("view"), Some(camera.view_matrix()));
        assert_eq!(program.uniform_vec3("viewPos"), Some(camera.position()));
        assert_eq!(program.uniform_vec3("lightPos"), Some(Vec3::new(1.2, 1.0, 2.0)));
    }

    #[test]
    fn mismatched_layout_is_skipped() {
        let mut scene = Scene::reference(&SceneSettings::default()).unwrap();
        scene.objects.push(SceneObject {
            name: "stray".into(),
            mesh: Mesh::new(VertexLayout::PositionColor, vec![0.0; 18], vec![0, 1, 2]).unwrap(),
            material: Material::textured("leather.jpg"),
            transform: Transform::new(),
        });
        let mut renderer = FrameRenderer::new(scene);
        let mut sink = Recorder::default();
        let stats = renderer.render_frame(&Camera::default(), VIEWPORT, &TextureStore::new(), &mut sink);
        assert_eq!(stats.draws, 5);
        assert_eq!(stats.skipped, 1);
    }
}

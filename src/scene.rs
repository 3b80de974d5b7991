use glam::{Mat4, Vec3};
use log::info;

use crate::geometry;
use crate::material::{Material, PhongLight, PhongSurface};
use crate::mesh::{Mesh, MeshError};

/// Single step of a model transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformOp {
    Translate(Vec3),
    /// Rotation about `axis` (normalized on use) by `degrees`.
    Rotate { axis: Vec3, degrees: f32 },
    Scale(Vec3),
}

impl TransformOp {
    fn matrix(self) -> Mat4 {
        match self {
            Self::Translate(offset) => Mat4::from_translation(offset),
            Self::Rotate { axis, degrees } => {
                Mat4::from_axis_angle(axis.normalize(), degrees.to_radians())
            }
            Self::Scale(factors) => Mat4::from_scale(factors),
        }
    }
}

/// Ordered list of operations, each post-multiplied onto the running matrix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transform {
    ops: Vec<TransformOp>,
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn translate(mut self, offset: Vec3) -> Self {
        self.ops.push(TransformOp::Translate(offset));
        self
    }

    pub fn rotate(mut self, axis: Vec3, degrees: f32) -> Self {
        self.ops.push(TransformOp::Rotate { axis, degrees });
        self
    }

    pub fn scale(mut self, factors: Vec3) -> Self {
        self.ops.push(TransformOp::Scale(factors));
        self
    }

    pub fn matrix(&self) -> Mat4 {
        self.ops
            .iter()
            .fold(Mat4::IDENTITY, |model, op| model * op.matrix())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub name: String,
    pub mesh: Mesh,
    pub material: Material,
    pub transform: Transform,
}

/// Asset names and light placement the reference desk needs.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSettings {
    pub light_position: Vec3,
    pub bottle_texture: String,
    pub tablet_texture: String,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            light_position: Vec3::new(1.2, 1.0, 2.0),
            bottle_texture: "bottle.jpg".to_string(),
            tablet_texture: "leather.jpg".to_string(),
        }
    }
}

/// Objects in draw order plus the world-space light position.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub light_position: Vec3,
}

impl Scene {
    /// Builds the desk: bottle, plane, tablet, charger and pencil, in that order.
    pub fn reference(settings: &SceneSettings) -> Result<Self, MeshError> {
        let objects = vec![
            SceneObject {
                name: "bottle".into(),
                mesh: geometry::bottle()?,
                material: Material::textured(settings.bottle_texture.clone()),
                transform: Transform::new()
                    .rotate(Vec3::Y, -55.0)
                    .translate(Vec3::new(2.0, -1.0, -0.5)),
            },
            SceneObject {
                name: "plane".into(),
                mesh: geometry::plane()?,
                material: Material::PhongLit {
                    surface: PhongSurface {
                        ambient: Vec3::new(1.0, 0.5, 0.31),
                        diffuse: Vec3::new(1.0, 0.5, 0.31),
                        specular: Vec3::splat(0.5),
                        shininess: 32.0,
                    },
                    light: PhongLight {
                        ambient: Vec3::splat(0.1),
                        diffuse: Vec3::splat(0.1),
                        specular: Vec3::ONE,
                    },
                },
                transform: Transform::new()
                    .translate(Vec3::new(0.0, -1.5, 0.0))
                    .scale(Vec3::new(4.0, 0.0, 3.5)),
            },
            SceneObject {
                name: "tablet".into(),
                mesh: geometry::tablet()?,
                material: Material::textured(settings.tablet_texture.clone()),
                transform: Transform::new()
                    .translate(Vec3::new(-1.8, -1.4, 0.0))
                    .rotate(Vec3::Y, 15.0)
                    .scale(Vec3::new(1.5, 0.05, 2.5)),
            },
            SceneObject {
                name: "charger".into(),
                mesh: geometry::charger()?,
                material: Material::AmbientOnly {
                    object_color: Vec3::splat(0.9),
                    light_color: Vec3::ONE,
                },
                transform: Transform::new()
                    .translate(Vec3::new(0.0, -1.4, 0.0))
                    .scale(Vec3::new(0.5, 0.125, 0.5)),
            },
            SceneObject {
                name: "pencil".into(),
                mesh: geometry::pencil()?,
                material: Material::Unlit,
                transform: Transform::new()
                    .translate(Vec3::new(-0.25, -1.4, 3.0))
                    .rotate(Vec3::new(1.0, 0.0, 1.0), 90.0)
                    .scale(Vec3::new(0.075, 1.5, 0.075)),
            },
        ];

        info!("built desk scene with {} objects", objects.len());
        Ok(Self {
            objects,
            light_position: settings.light_position,
        })
    }

    pub fn object(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|object| object.name == name)
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec4;

    use super::*;
    use crate::material::ShadingModel;

    #[test]
    fn reference_scene_keeps_draw_order() {
        let scene = Scene::reference(&SceneSettings::default()).unwrap();
        let names: Vec<_> = scene.objects.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["bottle", "plane", "tablet", "charger", "pencil"]);

        let models: Vec<_> = scene
            .objects
            .iter()
            .map(|o| o.material.shading_model())
            .collect();
        assert_eq!(
            models,
            [
                ShadingModel::UnlitTextured,
                ShadingModel::PhongLit,
                ShadingModel::UnlitTextured,
                ShadingModel::AmbientOnly,
                ShadingModel::Unlit,
            ]
        );
        assert_eq!(scene.object("tablet").unwrap().material.texture(), Some("leather.jpg"));
    }

    #[test]
    fn operations_compose_left_to_right() {
        let transform = Transform::new()
            .translate(Vec3::new(1.0, 0.0, 0.0))
            .scale(Vec3::splat(2.0));
        // Scale applies first to the point, then the translation.
        let point = transform.matrix() * Vec4::new(1.0, 1.0, 1.0, 1.0);
        assert_eq!(point, Vec4::new(3.0, 2.0, 2.0, 1.0));
    }

    #[test]
    fn rotation_axis_is_normalized() {
        let unnormalized = Transform::new().rotate(Vec3::new(1.0, 0.0, 1.0), 90.0).matrix();
        let normalized = Transform::new()
            .rotate(Vec3::new(1.0, 0.0, 1.0).normalize(), 90.0)
            .matrix();
        assert!(unnormalized.abs_diff_eq(normalized, 1e-6));
    }

    #[test]
    fn plane_is_flattened_onto_desk_height() {
        let scene = Scene::reference(&SceneSettings::default()).unwrap();
        let plane = scene.object("plane").unwrap();
        let model = plane.transform.matrix();
        for index in 0..plane.mesh.vertex_count() {
            let world = model.transform_point3(plane.mesh.position(index));
            assert_eq!(world.y, -1.5);
            assert_eq!(world.x.abs(), 4.0);
            assert_eq!(world.z.abs(), 3.5);
        }
    }

    #[test]
    fn bottle_rotates_before_translating() {
        let scene = Scene::reference(&SceneSettings::default()).unwrap();
        let model = scene.object("bottle").unwrap().transform.matrix();
        let expected = Mat4::from_rotation_y((-55.0f32).to_radians())
            * Mat4::from_translation(Vec3::new(2.0, -1.0, -0.5));
        assert!(model.abs_diff_eq(expected, 1e-6));
    }
}

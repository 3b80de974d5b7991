use std::fmt;

use glam::Vec3;

use crate::shader::{ShaderProgram, ShaderSource, AMBIENT_ONLY, PHONG_LIT, UNLIT, UNLIT_TEXTURED};

/// The four fixed shading models, one shader program each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShadingModel {
    Unlit,
    UnlitTextured,
    AmbientOnly,
    PhongLit,
}

impl ShadingModel {
    pub const ALL: [ShadingModel; 4] = [
        Self::Unlit,
        Self::UnlitTextured,
        Self::AmbientOnly,
        Self::PhongLit,
    ];

    pub fn source(self) -> &'static ShaderSource {
        match self {
            Self::Unlit => &UNLIT,
            Self::UnlitTextured => &UNLIT_TEXTURED,
            Self::AmbientOnly => &AMBIENT_ONLY,
            Self::PhongLit => &PHONG_LIT,
        }
    }
}

impl fmt::Display for ShadingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source().label)
    }
}

/// Surface response for the Phong model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhongSurface {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub shininess: f32,
}

impl PhongSurface {
    /// Evaluates the fragment lighting on the CPU.
    pub fn shade(&self, light: &PhongLight, light_pos: Vec3, view_pos: Vec3, frag_pos: Vec3, normal: Vec3) -> Vec3 {
        let ambient = light.ambient * self.ambient;

        let norm = normal.normalize();
        let light_dir = (light_pos - frag_pos).normalize();
        let diff = norm.dot(light_dir).max(0.0);
        let diffuse = light.diffuse * (diff * self.diffuse);

        let view_dir = (view_pos - frag_pos).normalize();
        let reflect_dir = reflect(-light_dir, norm);
        let spec = view_dir.dot(reflect_dir).max(0.0).powf(self.shininess);
        let specular = light.specular * (spec * self.specular);

        ambient + diffuse + specular
    }
}

fn reflect(incident: Vec3, normal: Vec3) -> Vec3 {
    incident - 2.0 * normal.dot(incident) * normal
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhongLight {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

/// Per-object shading parameters, tagged by shading model.
#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    Unlit,
    /// `texture` is the asset key registered in the texture store.
    UnlitTextured { texture: String },
    AmbientOnly { object_color: Vec3, light_color: Vec3 },
    PhongLit { surface: PhongSurface, light: PhongLight },
}

impl Material {
    pub fn textured(texture: impl Into<String>) -> Self {
        Self::UnlitTextured {
            texture: texture.into(),
        }
    }

    pub fn shading_model(&self) -> ShadingModel {
        match self {
            Self::Unlit => ShadingModel::Unlit,
            Self::UnlitTextured { .. } => ShadingModel::UnlitTextured,
            Self::AmbientOnly { .. } => ShadingModel::AmbientOnly,
            Self::PhongLit { .. } => ShadingModel::PhongLit,
        }
    }

    pub fn texture(&self) -> Option<&str> {
        match self {
            Self::UnlitTextured { texture } => Some(texture),
            _ => None,
        }
    }

    /// Pushes the material's uniforms into `program`.
    pub fn bind(&self, program: &mut ShaderProgram, light_pos: Vec3, view_pos: Vec3) {
        match self {
            Self::Unlit | Self::UnlitTextured { .. } => {}
            Self::AmbientOnly {
                object_color,
                light_color,
            } => {
                program.set_uniform("objectColor", *object_color);
                program.set_uniform("lightColor", *light_color);
            }
            Self::PhongLit { surface, light } => {
                program.set_uniform("lightPos", light_pos);
                program.set_uniform("viewPos", view_pos);

                program.set_uniform("material.ambient", surface.ambient);
                program.set_uniform("material.diffuse", surface.diffuse);
                program.set_uniform("material.specular", surface.specular);
                program.set_uniform("material.shininess", surface.shininess);

                program.set_uniform("light.ambient", light.ambient);
                program.set_uniform("light.diffuse", light.diffuse);
                program.set_uniform("light.specular", light.specular);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desk_surface() -> (PhongSurface, PhongLight) {
        (
            PhongSurface {
                ambient: Vec3::new(1.0, 0.5, 0.31),
                diffuse: Vec3::new(1.0, 0.5, 0.31),
                specular: Vec3::splat(0.5),
                shininess: 32.0,
            },
            PhongLight {
                ambient: Vec3::splat(0.1),
                diffuse: Vec3::splat(0.1),
                specular: Vec3::ONE,
            },
        )
    }

    #[test]
    fn shading_models_map_to_programs() {
        assert_eq!(Material::Unlit.shading_model(), ShadingModel::Unlit);
        assert_eq!(
            Material::textured("leather.jpg").shading_model(),
            ShadingModel::UnlitTextured
        );
        assert_eq!(ShadingModel::PhongLit.to_string(), "phong-lit");
        assert_eq!(Material::textured("leather.jpg").texture(), Some("leather.jpg"));
        assert_eq!(Material::Unlit.texture(), None);
    }

    #[test]
    fn phong_binding_fills_every_lighting_uniform() {
        let (surface, light) = desk_surface();
        let mut program = ShaderProgram::compile(&PHONG_LIT).unwrap();
        let light_pos = Vec3::new(1.2, 1.0, 2.0);
        let view_pos = Vec3::new(0.0, 0.0, 5.0);
        Material::PhongLit { surface, light }.bind(&mut program, light_pos, view_pos);

        assert_eq!(program.uniform_vec3("material.ambient"), Some(surface.ambient));
        assert_eq!(program.uniform_float("material.shininess"), Some(32.0));
        assert_eq!(program.uniform_vec3("light.specular"), Some(Vec3::ONE));
        assert_eq!(program.uniform_vec3("lightPos"), Some(light_pos));
        assert_eq!(program.uniform_vec3("viewPos"), Some(view_pos));
    }

    #[test]
    fn ambient_binding_sets_colors() {
        let mut program = ShaderProgram::compile(&AMBIENT_ONLY).unwrap();
        let material = Material::AmbientOnly {
            object_color: Vec3::splat(0.9),
            light_color: Vec3::ONE,
        };
        material.bind(&mut program, Vec3::ZERO, Vec3::ZERO);
        assert_eq!(program.uniform_vec3("objectColor"), Some(Vec3::splat(0.9)));
        assert_eq!(program.uniform_vec3("lightColor"), Some(Vec3::ONE));
    }

    #[test]
    fn facing_light_adds_diffuse_and_specular() {
        let (surface, light) = desk_surface();
        let frag = Vec3::ZERO;
        let lit = surface.shade(&light, Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 1.0, 0.0), frag, Vec3::Y);
        // ambient 0.1 + diffuse 0.1 on the red channel, full specular 0.5.
        assert!((lit.x - (0.1 + 0.1 + 0.5)).abs() < 1e-5, "{lit:?}");

        let unlit = surface.shade(&light, Vec3::new(0.0, -1.0, 0.0), Vec3::new(0.0, 1.0, 0.0), frag, Vec3::Y);
        assert!((unlit - light.ambient * surface.ambient).length() < 1e-5);
    }
}

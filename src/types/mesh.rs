use std::collections::{BTreeMap, BTreeSet};

use glam::{Vec2, Vec3};

/// Surface description of one MTL material.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub illumination_model: u8,
    pub color_ambient: Vec3,
    pub color_diffuse: Vec3,
    pub color_specular: Vec3,
    pub color_emissive: Vec3,
    pub shininess: f32,
    /// Dissolve factor, 1.0 is fully opaque.
    pub transparency: f32,
    pub texture_ambient: Option<String>,
    pub texture_diffuse: Option<String>,
    pub texture_specular: Option<String>,
    pub texture_emissive: Option<String>,
    pub texture_bump: Option<String>,
    pub texture_transparency: Option<String>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            illumination_model: 2,
            color_ambient: Vec3::ZERO,
            color_diffuse: Vec3::ONE,
            color_specular: Vec3::ZERO,
            color_emissive: Vec3::ZERO,
            shininess: 0.0,
            transparency: 1.0,
            texture_ambient: None,
            texture_diffuse: None,
            texture_specular: None,
            texture_emissive: None,
            texture_bump: None,
            texture_transparency: None,
        }
    }
}

impl Material {
    /// The diffuse texture path, if present and non-empty.
    pub fn diffuse_texture(&self) -> Option<&str> {
        self.texture_diffuse.as_deref().filter(|t| !t.is_empty())
    }
}

/// A named group of triangles sharing one material.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshComponent {
    pub name: String,
    pub material: Option<String>,
    /// Triangles as indices into the mesh's shared vertex arrays.
    pub faces: Vec<[u32; 3]>,
}

/// Triangle mesh with one index space shared by positions, normals and
/// texture coordinates.
///
/// Texture coordinates use a top-left origin: `v = 0` is the first image row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    /// Per-vertex normals, or empty.
    pub normals: Vec<Vec3>,
    pub texcoords: Vec<Vec2>,
    pub components: Vec<MeshComponent>,
    pub materials: BTreeMap<String, Material>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.components.iter().map(|c| c.faces.len()).sum()
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    pub fn has_texcoords(&self) -> bool {
        !self.texcoords.is_empty()
    }

    /// Names of materials referenced by at least one component.
    pub fn used_materials(&self) -> BTreeSet<&str> {
        self.components
            .iter()
            .filter_map(|c| c.material.as_deref())
            .collect()
    }

    /// Materials that are referenced and carry a diffuse texture, in name order.
    pub fn textured_materials(&self) -> Vec<(&str, &Material)> {
        let used = self.used_materials();
        self.materials
            .iter()
            .filter(|(name, mat)| used.contains(name.as_str()) && mat.diffuse_texture().is_some())
            .map(|(name, mat)| (name.as_str(), mat))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(name: &str, material: Option<&str>) -> MeshComponent {
        MeshComponent {
            name: name.into(),
            material: material.map(Into::into),
            faces: vec![[0, 1, 2]],
        }
    }

    #[test]
    fn empty_mesh() {
        let mesh = Mesh::default();
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.triangle_count(), 0);
        assert!(!mesh.has_normals());
        assert!(!mesh.has_texcoords());
        assert!(mesh.textured_materials().is_empty());
    }

    #[test]
    fn material_defaults() {
        let mat = Material::default();
        assert_eq!(mat.illumination_model, 2);
        assert_eq!(mat.color_diffuse, Vec3::ONE);
        assert_eq!(mat.transparency, 1.0);
        assert_eq!(mat.diffuse_texture(), None);
    }

    #[test]
    fn empty_diffuse_path_counts_as_absent() {
        let mat = Material {
            texture_diffuse: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(mat.diffuse_texture(), None);
    }

    #[test]
    fn textured_materials_skip_unused_and_untextured() {
        let mut mesh = Mesh {
            components: vec![
                component("a", Some("wood")),
                component("b", Some("plain")),
                component("c", None),
            ],
            ..Default::default()
        };
        let textured = |path: &str| Material {
            texture_diffuse: Some(path.into()),
            ..Default::default()
        };
        mesh.materials.insert("wood".into(), textured("wood.png"));
        mesh.materials.insert("unused".into(), textured("unused.png"));
        mesh.materials.insert("plain".into(), Material::default());

        let names: Vec<&str> = mesh.textured_materials().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["wood"]);
        assert_eq!(mesh.triangle_count(), 3);
    }
}

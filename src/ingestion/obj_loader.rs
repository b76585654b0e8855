use std::path::Path;

use glam::{Vec2, Vec3};
use tracing::{debug, warn};

use crate::error::{BakeError, Result};
use crate::types::{Material, Mesh, MeshComponent};

/// Name given to geometry that appears before any group statement.
const DEFAULT_COMPONENT: &str = "[default]";

/// Load an OBJ file (+ associated MTL) into a single-index-space `Mesh`.
pub fn load_obj(path: &Path) -> Result<Mesh> {
    let (models, materials_result) = tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS)
        .map_err(|e| BakeError::Input(format!("Failed to load OBJ: {e}")))?;

    debug!(model_count = models.len(), "Loaded OBJ models");

    let tobj_materials = match materials_result {
        Ok(mats) => mats,
        Err(e) => {
            warn!("Failed to load MTL: {e}");
            Vec::new()
        }
    };

    let mut mesh = Mesh::default();
    for mat in &tobj_materials {
        if mesh.materials.contains_key(&mat.name) {
            warn!(material = %mat.name, "Duplicate material definition, keeping the last one");
        }
        mesh.materials.insert(mat.name.clone(), convert_material(mat));
    }

    let mut any_normals = false;
    let mut any_texcoords = false;
    for model in models {
        any_normals |= !model.mesh.normals.is_empty();
        any_texcoords |= !model.mesh.texcoords.is_empty();
        append_model(&mut mesh, model, &tobj_materials)?;
    }
    if !any_normals {
        mesh.normals.clear();
    }
    if !any_texcoords {
        mesh.texcoords.clear();
    }

    Ok(mesh)
}

/// Append one tobj model as a component, offsetting its indices into the
/// shared vertex arrays.
fn append_model(mesh: &mut Mesh, model: tobj::Model, materials: &[tobj::Material]) -> Result<()> {
    let src = model.mesh;
    if src.indices.is_empty() {
        return Ok(());
    }

    let base = u32::try_from(mesh.vertices.len())
        .map_err(|_| BakeError::Input("mesh exceeds u32 vertex indices".into()))?;
    let count = src.positions.len() / 3;

    mesh.vertices
        .extend(src.positions.chunks_exact(3).map(|p| Vec3::new(p[0], p[1], p[2])));

    if src.normals.len() == count * 3 {
        mesh.normals
            .extend(src.normals.chunks_exact(3).map(|n| Vec3::new(n[0], n[1], n[2])));
    } else {
        mesh.normals.extend(std::iter::repeat_n(Vec3::ZERO, count));
    }

    // OBJ uses a bottom-left texture origin; flip to top-left.
    if src.texcoords.len() == count * 2 {
        mesh.texcoords
            .extend(src.texcoords.chunks_exact(2).map(|t| Vec2::new(t[0], 1.0 - t[1])));
    } else {
        mesh.texcoords.extend(std::iter::repeat_n(Vec2::ZERO, count));
    }

    let material = src
        .material_id
        .and_then(|id| materials.get(id))
        .map(|m| m.name.clone());

    let name = if model.name.is_empty() {
        DEFAULT_COMPONENT.to_string()
    } else {
        model.name
    };

    let faces = src
        .indices
        .chunks_exact(3)
        .map(|f| [base + f[0], base + f[1], base + f[2]])
        .collect();

    mesh.components.push(MeshComponent {
        name,
        material,
        faces,
    });
    Ok(())
}

/// Convert a tobj material, reading emissive values from the raw MTL keys.
fn convert_material(mat: &tobj::Material) -> Material {
    let defaults = Material::default();
    let texture = |t: &Option<String>| t.clone().filter(|s| !s.is_empty());
    let param = |key: &str| mat.unknown_param.get(key).map(|v| v.trim().to_string());

    let color_emissive = param("Ke")
        .and_then(|v| parse_color(&v))
        .unwrap_or(defaults.color_emissive);

    Material {
        illumination_model: mat.illumination_model.unwrap_or(defaults.illumination_model),
        color_ambient: mat.ambient.map(Vec3::from).unwrap_or(defaults.color_ambient),
        color_diffuse: mat.diffuse.map(Vec3::from).unwrap_or(defaults.color_diffuse),
        color_specular: mat.specular.map(Vec3::from).unwrap_or(defaults.color_specular),
        color_emissive,
        shininess: mat.shininess.unwrap_or(defaults.shininess),
        transparency: mat.dissolve.unwrap_or(defaults.transparency),
        texture_ambient: texture(&mat.ambient_texture),
        texture_diffuse: texture(&mat.diffuse_texture),
        texture_specular: texture(&mat.specular_texture),
        texture_emissive: param("map_Ke").filter(|s| !s.is_empty()),
        texture_bump: texture(&mat.normal_texture)
            .or_else(|| param("bump").filter(|s| !s.is_empty())),
        texture_transparency: texture(&mat.dissolve_texture),
    }
}

fn parse_color(value: &str) -> Option<Vec3> {
    let parts: Vec<f32> = value
        .split_whitespace()
        .map(str::parse)
        .collect::<std::result::Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [r, g, b] => Some(Vec3::new(*r, *g, *b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn tobj_mesh(positions: usize, texcoords: Vec<f32>, indices: Vec<u32>) -> tobj::Mesh {
        tobj::Mesh {
            positions: vec![0.0; positions * 3],
            normals: vec![],
            texcoords,
            indices,
            vertex_color: vec![],
            face_arities: vec![],
            texcoord_indices: vec![],
            normal_indices: vec![],
            material_id: Some(0),
        }
    }

    fn model(name: &str, mesh: tobj::Mesh) -> tobj::Model {
        tobj::Model {
            mesh,
            name: name.into(),
        }
    }

    #[test]
    fn append_offsets_indices_and_flips_v() {
        let materials = vec![tobj::Material {
            name: "wood".into(),
            ..Default::default()
        }];
        let mut mesh = Mesh::default();
        append_model(
            &mut mesh,
            model("a", tobj_mesh(3, vec![0.0, 0.0, 1.0, 0.25, 0.5, 1.0], vec![0, 1, 2])),
            &materials,
        )
        .unwrap();
        append_model(
            &mut mesh,
            model("", tobj_mesh(3, vec![], vec![2, 1, 0])),
            &materials,
        )
        .unwrap();

        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.texcoords.len(), 6);
        assert_eq!(mesh.texcoords[0], Vec2::new(0.0, 1.0));
        assert_eq!(mesh.texcoords[1], Vec2::new(1.0, 0.75));
        assert_eq!(mesh.texcoords[4], Vec2::ZERO);
        assert_eq!(mesh.components[0].faces, vec![[0, 1, 2]]);
        assert_eq!(mesh.components[1].faces, vec![[5, 4, 3]]);
        assert_eq!(mesh.components[1].name, DEFAULT_COMPONENT);
        assert_eq!(mesh.components[1].material.as_deref(), Some("wood"));
    }

    #[test]
    fn empty_models_are_skipped() {
        let mut mesh = Mesh::default();
        append_model(&mut mesh, model("empty", tobj_mesh(0, vec![], vec![])), &[]).unwrap();
        assert!(mesh.components.is_empty());
    }

    #[test]
    fn material_conversion() {
        let mut raw = tobj::Material {
            name: "brick".into(),
            diffuse: Some([0.5, 0.25, 1.0]),
            dissolve: Some(0.5),
            illumination_model: Some(1),
            diffuse_texture: Some("brick.png".into()),
            specular_texture: Some(String::new()),
            ..Default::default()
        };
        raw.unknown_param.insert("Ke".into(), "0.1 0.2 0.3".into());
        raw.unknown_param.insert("map_Ke".into(), "glow.png".into());

        let mat = convert_material(&raw);
        assert_eq!(mat.color_diffuse, Vec3::new(0.5, 0.25, 1.0));
        assert_eq!(mat.color_emissive, Vec3::new(0.1, 0.2, 0.3));
        assert_eq!(mat.transparency, 0.5);
        assert_eq!(mat.illumination_model, 1);
        assert_eq!(mat.diffuse_texture(), Some("brick.png"));
        assert_eq!(mat.texture_specular, None);
        assert_eq!(mat.texture_emissive.as_deref(), Some("glow.png"));
    }

    #[test]
    fn parse_color_requires_three_values() {
        assert_eq!(parse_color("1 0 0.5"), Some(Vec3::new(1.0, 0.0, 0.5)));
        assert_eq!(parse_color("1 0"), None);
        assert_eq!(parse_color("a b c"), None);
    }

    #[test]
    fn load_obj_from_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let obj = "\
mtllib scene.mtl
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vt 1 0
vt 0 1
g tri
usemtl red
f 1/1 2/2 3/3
";
        let mtl = "\
newmtl red
Kd 1 0 0
map_Kd red.png
";
        fs::write(tmp.path().join("scene.obj"), obj).unwrap();
        fs::write(tmp.path().join("scene.mtl"), mtl).unwrap();

        let mesh = load_obj(&tmp.path().join("scene.obj")).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert!(!mesh.has_normals());
        assert!(mesh.has_texcoords());
        assert_eq!(mesh.components[0].material.as_deref(), Some("red"));
        assert_eq!(mesh.materials["red"].diffuse_texture(), Some("red.png"));
        assert_eq!(mesh.materials["red"].color_diffuse, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn load_obj_missing_file() {
        let err = load_obj(Path::new("/nonexistent/model.obj")).unwrap_err();
        assert!(err.to_string().contains("Failed to load OBJ"));
    }
}

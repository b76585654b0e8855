//! Wavefront OBJ + MTL export.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use glam::Vec3;

use crate::error::{BakeError, Result};
use crate::types::Mesh;

/// Which vertex attributes accompany each face index.
#[derive(Debug, Clone, Copy)]
struct Attributes {
    normals: bool,
    texcoords: bool,
}

impl Attributes {
    /// Check attribute arrays against the vertex count.
    fn of(mesh: &Mesh) -> Result<Self> {
        let n = mesh.vertex_count();
        if n == 0 {
            return Err(BakeError::Output("mesh contains no vertices".into()));
        }
        if !mesh.normals.is_empty() && mesh.normals.len() != n {
            return Err(BakeError::Output(format!(
                "inconsistent number of normals: {} for {n} vertices",
                mesh.normals.len()
            )));
        }
        if !mesh.texcoords.is_empty() && mesh.texcoords.len() != n {
            return Err(BakeError::Output(format!(
                "inconsistent number of texture coordinates: {} for {n} vertices",
                mesh.texcoords.len()
            )));
        }
        Ok(Self {
            normals: mesh.has_normals(),
            texcoords: mesh.has_texcoords(),
        })
    }

    /// One face corner for a 0-based vertex index.
    fn corner(&self, index: u32) -> String {
        let i = index as u64 + 1;
        match (self.texcoords, self.normals) {
            (true, true) => format!("{i}/{i}/{i}"),
            (false, true) => format!("{i}//{i}"),
            (true, false) => format!("{i}/{i}"),
            (false, false) => format!("{i}"),
        }
    }
}

/// Write the mesh as OBJ text referencing `material_lib`.
pub fn write_obj<W: Write>(out: &mut W, mesh: &Mesh, material_lib: &str) -> Result<()> {
    let attrs = Attributes::of(mesh)?;

    writeln!(out, "mtllib {material_lib}")?;

    writeln!(out, "# vertices ({})", mesh.vertices.len())?;
    for v in &mesh.vertices {
        writeln!(out, "v {} {} {}", v.x, v.y, v.z)?;
    }

    if attrs.normals {
        writeln!(out, "# normals ({})", mesh.normals.len())?;
        for n in &mesh.normals {
            writeln!(out, "vn {} {} {}", n.x, n.y, n.z)?;
        }
    }

    // Stored top-left; OBJ expects bottom-left.
    if attrs.texcoords {
        writeln!(out, "# texture coordinates ({})", mesh.texcoords.len())?;
        for t in &mesh.texcoords {
            writeln!(out, "vt {} {}", t.x, 1.0 - t.y)?;
        }
    }

    writeln!(out, "# components ({})", mesh.components.len())?;
    for component in &mesh.components {
        writeln!(out, "g {}", component.name)?;
        if let Some(material) = &component.material {
            writeln!(out, "usemtl {material}")?;
        }
        writeln!(out, "s 1")?;
        for face in &component.faces {
            writeln!(
                out,
                "f {} {} {}",
                attrs.corner(face[0]),
                attrs.corner(face[1]),
                attrs.corner(face[2])
            )?;
        }
    }
    Ok(())
}

/// Write every material of the mesh as MTL text.
pub fn write_mtl<W: Write>(out: &mut W, mesh: &Mesh) -> Result<()> {
    for (name, mat) in &mesh.materials {
        writeln!(out, "newmtl {name}")?;
        writeln!(out, "illum {}", mat.illumination_model)?;
        write_color(out, "Ka", mat.color_ambient)?;
        write_color(out, "Kd", mat.color_diffuse)?;
        write_color(out, "Ks", mat.color_specular)?;
        write_color(out, "Ke", mat.color_emissive)?;
        writeln!(out, "Ns {}", mat.shininess)?;
        writeln!(out, "d {}", mat.transparency)?;

        let maps = [
            ("map_Ka", &mat.texture_ambient),
            ("map_Kd", &mat.texture_diffuse),
            ("map_Ks", &mat.texture_specular),
            ("map_Ke", &mat.texture_emissive),
            ("map_bump", &mat.texture_bump),
            ("map_d", &mat.texture_transparency),
        ];
        for (key, texture) in maps {
            if let Some(texture) = texture.as_deref().filter(|t| !t.is_empty()) {
                writeln!(out, "{key} {texture}")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_color<W: Write>(out: &mut W, key: &str, c: Vec3) -> Result<()> {
    writeln!(out, "{key} {} {} {}", c.x, c.y, c.z)?;
    Ok(())
}

/// Write `<obj_path>` and `<mtl_path>`; the OBJ references the MTL by file name.
pub fn write_obj_files(mesh: &Mesh, obj_path: &Path, mtl_path: &Path) -> Result<()> {
    let mtl_name = mtl_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            BakeError::Output(format!("invalid material path: {}", mtl_path.display()))
        })?;

    let mut obj = BufWriter::new(File::create(obj_path)?);
    write_obj(&mut obj, mesh, mtl_name)?;
    obj.flush()?;

    let mut mtl = BufWriter::new(File::create(mtl_path)?);
    write_mtl(&mut mtl, mesh)?;
    mtl.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::types::{Material, MeshComponent};

    fn triangle() -> Mesh {
        let mut mesh = Mesh {
            vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            normals: vec![Vec3::Z; 3],
            texcoords: vec![Vec2::new(0.0, 1.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 0.25)],
            components: vec![MeshComponent {
                name: "tri".into(),
                material: Some("red".into()),
                faces: vec![[0, 1, 2]],
            }],
            ..Default::default()
        };
        mesh.materials.insert(
            "red".into(),
            Material {
                texture_diffuse: Some("atlas.png".into()),
                ..Default::default()
            },
        );
        mesh
    }

    fn obj_text(mesh: &Mesh) -> String {
        let mut buf = Vec::new();
        write_obj(&mut buf, mesh, "out.mtl").unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn obj_contains_all_records() {
        let text = obj_text(&triangle());
        assert!(text.starts_with("mtllib out.mtl\n"));
        assert!(text.contains("v 1 0 0\n"));
        assert!(text.contains("vn 0 0 1\n"));
        assert!(text.contains("g tri\nusemtl red\ns 1\n"));
        assert!(text.contains("f 1/1/1 2/2/2 3/3/3\n"));
    }

    #[test]
    fn obj_flips_v_back() {
        let text = obj_text(&triangle());
        assert!(text.contains("vt 0 0\n"));
        assert!(text.contains("vt 0 0.75\n"));
    }

    #[test]
    fn face_format_follows_attributes() {
        let mut mesh = triangle();
        mesh.texcoords.clear();
        assert!(obj_text(&mesh).contains("f 1//1 2//2 3//3\n"));

        mesh.normals.clear();
        assert!(obj_text(&mesh).contains("f 1 2 3\n"));

        let mut mesh = triangle();
        mesh.normals.clear();
        assert!(obj_text(&mesh).contains("f 1/1 2/2 3/3\n"));
    }

    #[test]
    fn inconsistent_attributes_are_rejected() {
        let mut mesh = triangle();
        mesh.normals.pop();
        let err = write_obj(&mut Vec::new(), &mesh, "out.mtl").unwrap_err();
        assert!(err.to_string().contains("normals"));

        let err = write_obj(&mut Vec::new(), &Mesh::default(), "out.mtl").unwrap_err();
        assert!(err.to_string().contains("no vertices"));
    }

    #[test]
    fn mtl_lists_material_and_maps() {
        let mut buf = Vec::new();
        write_mtl(&mut buf, &triangle()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("newmtl red\nillum 2\n"));
        assert!(text.contains("Kd 1 1 1\n"));
        assert!(text.contains("d 1\n"));
        assert!(text.contains("map_Kd atlas.png\n"));
        assert!(!text.contains("map_Ks"));
    }

    #[test]
    fn writes_files_to_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let obj = tmp.path().join("out.obj");
        let mtl = tmp.path().join("out.mtl");
        write_obj_files(&triangle(), &obj, &mtl).unwrap();

        let text = std::fs::read_to_string(&obj).unwrap();
        assert!(text.starts_with("mtllib out.mtl"));
        assert!(std::fs::read_to_string(&mtl).unwrap().contains("newmtl red"));
    }
}

use std::collections::HashMap;

use tracing::debug;

use crate::types::Mesh;

/// Give every material its own copy of any vertex it shares with another
/// material, so texture coordinates can later be remapped per material.
///
/// Components without a material count as one group of their own. Returns the
/// number of vertices that were duplicated.
pub fn split_shared_vertices(mesh: &mut Mesh) -> usize {
    let vertex_count = mesh.vertices.len();
    let mut owners: Vec<Option<Option<String>>> = vec![None; vertex_count];
    let mut copies: HashMap<(u32, Option<String>), u32> = HashMap::new();
    let mut duplicated = 0;

    for ci in 0..mesh.components.len() {
        let material = mesh.components[ci].material.clone();
        for fi in 0..mesh.components[ci].faces.len() {
            for k in 0..3 {
                let index = mesh.components[ci].faces[fi][k];
                let Some(slot) = owners.get_mut(index as usize) else {
                    continue;
                };
                match slot.as_ref() {
                    None => *slot = Some(material.clone()),
                    Some(owner) if *owner == material => {}
                    Some(_) => {
                        let key = (index, material.clone());
                        let copy = match copies.get(&key) {
                            Some(&copy) => copy,
                            None => {
                                let copy = duplicate_vertex(mesh, index as usize);
                                copies.insert(key, copy);
                                duplicated += 1;
                                copy
                            }
                        };
                        mesh.components[ci].faces[fi][k] = copy;
                    }
                }
            }
        }
    }

    if duplicated > 0 {
        debug!(duplicated, "Split vertices shared across materials");
    }
    duplicated
}

/// Append a copy of vertex `index` (position, normal, texcoord) and return its index.
fn duplicate_vertex(mesh: &mut Mesh, index: usize) -> u32 {
    let new_index = mesh.vertices.len() as u32;
    mesh.vertices.push(mesh.vertices[index]);
    if let Some(&n) = mesh.normals.get(index) {
        mesh.normals.push(n);
    }
    if let Some(&t) = mesh.texcoords.get(index) {
        mesh.texcoords.push(t);
    }
    new_index
}

use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use glam::{Vec2, Vec3};

/// Floats per vertex: `position.xyz`, `normal.xyz`, `uv.xy`.
pub const VERTEX_STRIDE: usize = 8;

/// GPU ready mesh buffers for one material group of an OBJ file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjMesh {
    pub material: Option<String>,
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl ObjMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VERTEX_STRIDE
    }
}

/// Every mesh of an OBJ file plus the material libraries it references.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjModel {
    pub meshes: Vec<ObjMesh>,
    pub material_libraries: Vec<String>,
}

/// Surface description from an MTL library.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjMaterial {
    pub name: String,
    pub diffuse_color: Vec3,
    pub specular_color: Vec3,
    pub diffuse_map: Option<String>,
    pub specular_map: Option<String>,
}

impl ObjMaterial {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            diffuse_color: Vec3::ONE,
            specular_color: Vec3::ZERO,
            diffuse_map: None,
            specular_map: None,
        }
    }
}

/// Parses an OBJ file from memory into one mesh per `usemtl` group.
///
/// Texture `v` is flipped so that `(0, 0)` addresses the top-left texel.
pub fn load_obj_from_str(data: &str) -> Result<ObjModel> {
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut texcoords = Vec::new();
    let mut groups: Vec<FaceGroup> = vec![FaceGroup::default()];
    let mut material_libraries = Vec::new();

    for (line_no, line) in data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };
        match tag {
            "v" => positions.push(
                parse_vec3(parts)
                    .with_context(|| format!("invalid vertex on line {}", line_no + 1))?,
            ),
            "vn" => normals.push(
                parse_vec3(parts)
                    .with_context(|| format!("invalid normal on line {}", line_no + 1))?,
            ),
            "vt" => texcoords.push(
                parse_vec2(parts)
                    .with_context(|| format!("invalid texture coordinate on line {}", line_no + 1))?,
            ),
            "f" => {
                let polygon = parse_face(parts)
                    .with_context(|| format!("invalid face on line {}", line_no + 1))?;
                let group = groups.last_mut().ok_or_else(|| anyhow!("no face group"))?;
                triangulate_face(&polygon, &mut group.faces);
            }
            "usemtl" => {
                let name = rest_of_line(trimmed, tag)
                    .ok_or_else(|| anyhow!("usemtl without a name on line {}", line_no + 1))?;
                if groups.last().map_or(true, |group| !group.faces.is_empty()) {
                    groups.push(FaceGroup::default());
                }
                if let Some(group) = groups.last_mut() {
                    group.material = Some(name);
                }
            }
            "mtllib" => {
                let name = rest_of_line(trimmed, tag)
                    .ok_or_else(|| anyhow!("mtllib without a file on line {}", line_no + 1))?;
                material_libraries.push(name);
            }
            _ => {}
        }
    }

    if positions.is_empty() {
        return Err(anyhow!("OBJ file does not define any vertices"));
    }

    let mut meshes = Vec::new();
    for group in groups.into_iter().filter(|group| !group.faces.is_empty()) {
        let (mut mesh, has_normal) = build_mesh(&positions, &normals, &texcoords, &group.faces)?;
        if has_normal.contains(&false) {
            compute_normals(&mut mesh, &has_normal);
        }
        mesh.material = group.material;
        meshes.push(mesh);
    }
    if meshes.is_empty() {
        return Err(anyhow!("OBJ file does not define any faces"));
    }

    Ok(ObjModel {
        meshes,
        material_libraries,
    })
}

/// Parses an MTL library. Only the diffuse/specular terms are kept.
pub fn load_mtl_from_str(data: &str) -> Result<Vec<ObjMaterial>> {
    let mut materials: Vec<ObjMaterial> = Vec::new();

    for (line_no, line) in data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };
        if tag == "newmtl" {
            let name = rest_of_line(trimmed, tag)
                .ok_or_else(|| anyhow!("newmtl without a name on line {}", line_no + 1))?;
            materials.push(ObjMaterial::named(name));
            continue;
        }
        let Some(material) = materials.last_mut() else {
            continue;
        };
        match tag {
            "Kd" => {
                material.diffuse_color = parse_vec3(parts)
                    .with_context(|| format!("invalid Kd on line {}", line_no + 1))?
            }
            "Ks" => {
                material.specular_color = parse_vec3(parts)
                    .with_context(|| format!("invalid Ks on line {}", line_no + 1))?
            }
            // Map statements may carry options before the file name.
            "map_Kd" => material.diffuse_map = parts.last().map(str::to_string),
            "map_Ks" => material.specular_map = parts.last().map(str::to_string),
            _ => {}
        }
    }

    Ok(materials)
}

fn rest_of_line(line: &str, tag: &str) -> Option<String> {
    let rest = line[tag.len()..].trim();
    (!rest.is_empty()).then(|| rest.to_string())
}

fn parse_vec3<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Vec3> {
    let x = parts
        .next()
        .ok_or_else(|| anyhow!("missing vector component"))?
        .parse::<f32>()?;
    let y = parts
        .next()
        .ok_or_else(|| anyhow!("missing vector component"))?
        .parse::<f32>()?;
    let z = parts
        .next()
        .ok_or_else(|| anyhow!("missing vector component"))?
        .parse::<f32>()?;
    Ok(Vec3::new(x, y, z))
}

fn parse_vec2<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Vec2> {
    let u = parts
        .next()
        .ok_or_else(|| anyhow!("missing texture component"))?
        .parse::<f32>()?;
    let v = match parts.next() {
        Some(v) => v.parse::<f32>()?,
        None => 0.0,
    };
    Ok(Vec2::new(u, v))
}

fn parse_face<'a>(parts: impl Iterator<Item = &'a str>) -> Result<Vec<FaceIndex>> {
    let mut indices = Vec::new();
    for part in parts {
        let mut segments = part.split('/');
        let v = segments
            .next()
            .ok_or_else(|| anyhow!("missing vertex index"))?
            .parse::<i32>()?;
        let vt = parse_optional_index(segments.next())?;
        let vn = parse_optional_index(segments.next())?;
        indices.push(FaceIndex { v, vt, vn });
    }
    if indices.len() < 3 {
        return Err(anyhow!("faces must reference at least 3 vertices"));
    }
    Ok(indices)
}

fn parse_optional_index(segment: Option<&str>) -> Result<i32> {
    match segment {
        Some(s) if !s.is_empty() => Ok(s.parse::<i32>()?),
        _ => Ok(0),
    }
}

fn triangulate_face(polygon: &[FaceIndex], faces: &mut Vec<[FaceIndex; 3]>) {
    if polygon.len() < 3 {
        return;
    }
    for i in 1..(polygon.len() - 1) {
        faces.push([polygon[0], polygon[i], polygon[i + 1]]);
    }
}

#[derive(Debug, Default)]
struct FaceGroup {
    material: Option<String>,
    faces: Vec<[FaceIndex; 3]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Key {
    position: usize,
    texcoord: Option<usize>,
    normal: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct FaceIndex {
    v: i32,
    vt: i32,
    vn: i32,
}

fn build_mesh(
    positions: &[Vec3],
    normals: &[Vec3],
    texcoords: &[Vec2],
    faces: &[[FaceIndex; 3]],
) -> Result<(ObjMesh, Vec<bool>)> {
    let mut lookup: HashMap<Key, u32> = HashMap::new();
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    let mut has_normal = Vec::new();

    for face in faces {
        for idx in face {
            let position =
                fix_index(idx.v, positions.len()).ok_or_else(|| anyhow!("invalid vertex index"))?;
            let key = Key {
                position,
                texcoord: fix_index(idx.vt, texcoords.len()),
                normal: fix_index(idx.vn, normals.len()),
            };
            let next_index = (vertices.len() / VERTEX_STRIDE) as u32;
            let entry = lookup.entry(key).or_insert_with(|| {
                let position = positions[key.position];
                let normal = key.normal.map(|i| normals[i]).unwrap_or(Vec3::ZERO);
                let uv = key.texcoord.map(|i| texcoords[i]).unwrap_or(Vec2::ZERO);
                vertices.extend_from_slice(&[position.x, position.y, position.z]);
                vertices.extend_from_slice(&[normal.x, normal.y, normal.z]);
                vertices.extend_from_slice(&[uv.x, 1.0 - uv.y]);
                has_normal.push(key.normal.is_some());
                next_index
            });
            indices.push(*entry);
        }
    }

    let mesh = ObjMesh {
        material: None,
        vertices,
        indices,
    };
    Ok((mesh, has_normal))
}

fn fix_index(index: i32, len: usize) -> Option<usize> {
    if index > 0 {
        let zero_based = index as usize - 1;
        (zero_based < len).then_some(zero_based)
    } else if index < 0 {
        let abs = index.unsigned_abs() as usize;
        (abs <= len).then_some(len - abs)
    } else {
        None
    }
}

/// Fills in face-averaged normals for the vertices the file gave none.
/// Normals read from the file are left untouched.
fn compute_normals(mesh: &mut ObjMesh, has_normal: &[bool]) {
    let stride = VERTEX_STRIDE;
    let mut accum = vec![Vec3::ZERO; mesh.vertex_count()];

    for triangle in mesh.indices.chunks_exact(3) {
        let i0 = triangle[0] as usize;
        let i1 = triangle[1] as usize;
        let i2 = triangle[2] as usize;
        let p0 = Vec3::from_slice(&mesh.vertices[i0 * stride..i0 * stride + 3]);
        let p1 = Vec3::from_slice(&mesh.vertices[i1 * stride..i1 * stride + 3]);
        let p2 = Vec3::from_slice(&mesh.vertices[i2 * stride..i2 * stride + 3]);
        let normal = (p1 - p0).cross(p2 - p0);
        if normal.length_squared() > f32::EPSILON {
            let normal = normal.normalize();
            accum[i0] += normal;
            accum[i1] += normal;
            accum[i2] += normal;
        }
    }

    for (i, normal) in accum.into_iter().enumerate() {
        if has_normal[i] {
            continue;
        }
        let normal = normal.normalize_or_zero();
        mesh.vertices[i * stride + 3] = normal.x;
        mesh.vertices[i * stride + 4] = normal.y;
        mesh.vertices[i * stride + 5] = normal.z;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUBE: &str = include_str!("../assets/models/cube/cube.obj");

    #[test]
    fn parses_simple_triangle() {
        let obj = "\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let model = load_obj_from_str(obj).unwrap();
        assert_eq!(model.meshes.len(), 1);
        assert_eq!(model.meshes[0].indices, vec![0, 1, 2]);
        assert_eq!(model.meshes[0].vertices.len(), 3 * VERTEX_STRIDE);
        assert_eq!(model.meshes[0].material, None);
    }

    #[test]
    fn computes_missing_normals() {
        let obj = "\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let model = load_obj_from_str(obj).unwrap();
        for chunk in model.meshes[0].vertices.chunks_exact(VERTEX_STRIDE) {
            let normal = Vec3::new(chunk[3], chunk[4], chunk[5]);
            assert!((normal - Vec3::Z).length() < 1e-5);
        }
    }

    #[test]
    fn keeps_file_normals_when_generating_others() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 0 0 1\nv 1 0 1\nv 0 1 1\nvn 0 1 0\nf 1//1 2//1 3//1\nf 4 5 6\n";
        let mesh = &load_obj_from_str(obj).unwrap().meshes[0];
        let normals: Vec<Vec3> = mesh
            .vertices
            .chunks_exact(VERTEX_STRIDE)
            .map(|chunk| Vec3::new(chunk[3], chunk[4], chunk[5]))
            .collect();
        assert_eq!(normals.len(), 6);
        for normal in &normals[..3] {
            assert_eq!(*normal, Vec3::Y);
        }
        for normal in &normals[3..] {
            assert!((*normal - Vec3::Z).length() < 1e-5);
        }
    }

    #[test]
    fn flips_texture_v() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0.25 0.0\nvt 1 1\nvt 0 0.75\nf 1/1 2/2 3/3\n";
        let mesh = &load_obj_from_str(obj).unwrap().meshes[0];
        let uvs: Vec<[f32; 2]> = mesh
            .vertices
            .chunks_exact(VERTEX_STRIDE)
            .map(|chunk| [chunk[6], chunk[7]])
            .collect();
        assert_eq!(uvs, vec![[0.25, 1.0], [1.0, 0.0], [0.0, 0.25]]);
    }

    #[test]
    fn triangulates_quads_and_resolves_negative_indices() {
        let obj = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf -4 -3 -2 -1\n";
        let mesh = &load_obj_from_str(obj).unwrap().meshes[0];
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.vertex_count(), 4);
    }

    #[test]
    fn splits_meshes_by_material() {
        let obj = "mtllib scene.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl Red\nf 1 2 3\nusemtl Blue\nf 3 2 1\nf 1 3 2\n";
        let model = load_obj_from_str(obj).unwrap();
        assert_eq!(model.material_libraries, vec!["scene.mtl".to_string()]);
        let materials: Vec<_> = model
            .meshes
            .iter()
            .map(|mesh| mesh.material.as_deref())
            .collect();
        assert_eq!(materials, vec![Some("Red"), Some("Blue")]);
        assert_eq!(model.meshes[1].indices.len(), 6);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(load_obj_from_str("# nothing here\n").is_err());
        assert!(load_obj_from_str("v 0 0 0\nv 1 0 0\n").is_err());
        assert!(load_obj_from_str("v 0 0 0\nf 1 2 3\n").is_err());
        let err = load_obj_from_str("v 0 0\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 1"));
    }

    #[test]
    fn bundled_cube_has_six_quads() {
        let model = load_obj_from_str(CUBE).unwrap();
        assert_eq!(model.material_libraries, vec!["cube.mtl".to_string()]);
        assert_eq!(model.meshes.len(), 1);
        let mesh = &model.meshes[0];
        assert_eq!(mesh.material.as_deref(), Some("Crate"));
        assert_eq!(mesh.indices.len(), 36);
        assert_eq!(mesh.vertex_count(), 24);
    }

    #[test]
    fn parses_material_library() {
        let mtl = "# exported\nnewmtl Body\nKd 0.5 0.25 1\nKs 1 1 1\nmap_Kd -s 1 1 1 textures/diffuse.jpg\nmap_Ks specular.png\nnewmtl Plain\n";
        let materials = load_mtl_from_str(mtl).unwrap();
        assert_eq!(materials.len(), 2);
        assert_eq!(materials[0].name, "Body");
        assert_eq!(materials[0].diffuse_color, Vec3::new(0.5, 0.25, 1.0));
        assert_eq!(materials[0].specular_color, Vec3::ONE);
        assert_eq!(materials[0].diffuse_map.as_deref(), Some("textures/diffuse.jpg"));
        assert_eq!(materials[0].specular_map.as_deref(), Some("specular.png"));
        assert_eq!(materials[1], ObjMaterial::named("Plain"));
    }

    #[test]
    fn rejects_malformed_material_color() {
        let err = load_mtl_from_str("newmtl A\nKd 1 x 0\n").unwrap_err();
        assert!(format!("{err:#}").contains("invalid Kd on line 2"));
    }
}

//! Export utilities for writing tree meshes to standard 3D file formats.
//!
//! Supports OBJ (text) and GLB (binary glTF 2.0). These are pure data
//! conversions over [`MeshData`] with no Bevy system dependencies; call them
//! from your own export systems or CLI tools.

use std::fmt::Write;

use crate::mesher::MeshData;

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Obj,
    Glb,
}

impl ExportFormat {
    pub const ALL: &'static [ExportFormat] = &[ExportFormat::Obj, ExportFormat::Glb];

    pub fn name(&self) -> &'static str {
        match self {
            ExportFormat::Obj => "OBJ",
            ExportFormat::Glb => "GLB",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Obj => "obj",
            ExportFormat::Glb => "glb",
        }
    }
}

// ---------------------------------------------------------------------------
// OBJ Export
// ---------------------------------------------------------------------------

/// Convert a tree mesh to OBJ text with positions, UVs and (when present)
/// normals. Returns the text without header comments; prepend your own.
pub fn mesh_to_obj(mesh: &MeshData, object_name: &str) -> String {
    let mut obj = String::new();
    let _ = writeln!(obj, "o {}", object_name);

    for p in &mesh.positions {
        let _ = writeln!(obj, "v {} {} {}", p.x, p.y, p.z);
    }
    for uv in &mesh.uvs {
        let _ = writeln!(obj, "vt {} {}", uv.x, uv.y);
    }

    let has_normals = mesh.normals.len() == mesh.positions.len() && !mesh.normals.is_empty();
    if has_normals {
        for n in &mesh.normals {
            let _ = writeln!(obj, "vn {} {} {}", n.x, n.y, n.z);
        }
    }

    for tri in mesh.indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] + 1, tri[1] + 1, tri[2] + 1);
        if has_normals {
            let _ = writeln!(obj, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}");
        } else {
            let _ = writeln!(obj, "f {a}/{a} {b}/{b} {c}/{c}");
        }
    }

    obj
}

// ---------------------------------------------------------------------------
// GLB (Binary glTF 2.0) Export
// ---------------------------------------------------------------------------

const TARGET_ARRAY_BUFFER: u32 = 34962;
const TARGET_ELEMENT_ARRAY_BUFFER: u32 = 34963;
const COMPONENT_FLOAT: u32 = 5126;
const COMPONENT_UNSIGNED_INT: u32 = 5125;

/// Convert a tree mesh to GLB (binary glTF 2.0) with a single bark material.
pub fn mesh_to_glb(mesh: &MeshData) -> Vec<u8> {
    if mesh.positions.is_empty() {
        return build_empty_glb();
    }

    let mut bin_buffer: Vec<u8> = Vec::new();
    let mut buffer_views = Vec::new();
    let mut accessors = Vec::new();
    let mut attr_entries = Vec::new();
    let vertex_count = mesh.positions.len();

    // --- Positions ---
    let (min, max) = mesh
        .positions
        .iter()
        .fold((mesh.positions[0], mesh.positions[0]), |(min, max), p| {
            (min.min(*p), max.max(*p))
        });
    let view = push_view(
        &mut bin_buffer,
        &mut buffer_views,
        mesh.positions.iter().flat_map(|p| p.to_array()),
        TARGET_ARRAY_BUFFER,
    );
    attr_entries.push(format!("\"POSITION\":{}", accessors.len()));
    accessors.push(format!(
        concat!(
            "{{\"bufferView\":{},\"componentType\":{},\"count\":{},\"type\":\"VEC3\",",
            "\"min\":[{:.6},{:.6},{:.6}],\"max\":[{:.6},{:.6},{:.6}]}}"
        ),
        view, COMPONENT_FLOAT, vertex_count, min.x, min.y, min.z, max.x, max.y, max.z,
    ));

    // --- Normals ---
    if mesh.normals.len() == vertex_count {
        let view = push_view(
            &mut bin_buffer,
            &mut buffer_views,
            mesh.normals.iter().flat_map(|n| n.to_array()),
            TARGET_ARRAY_BUFFER,
        );
        attr_entries.push(format!("\"NORMAL\":{}", accessors.len()));
        accessors.push(float_accessor(view, vertex_count, "VEC3"));
    }

    // --- UVs ---
    if mesh.uvs.len() == vertex_count {
        let view = push_view(
            &mut bin_buffer,
            &mut buffer_views,
            mesh.uvs.iter().flat_map(|uv| uv.to_array()),
            TARGET_ARRAY_BUFFER,
        );
        attr_entries.push(format!("\"TEXCOORD_0\":{}", accessors.len()));
        accessors.push(float_accessor(view, vertex_count, "VEC2"));
    }

    // --- Indices ---
    let idx_offset = bin_buffer.len();
    for &i in &mesh.indices {
        bin_buffer.extend_from_slice(&i.to_le_bytes());
    }
    buffer_views.push(format!(
        "{{\"buffer\":0,\"byteOffset\":{},\"byteLength\":{},\"target\":{}}}",
        idx_offset,
        bin_buffer.len() - idx_offset,
        TARGET_ELEMENT_ARRAY_BUFFER
    ));
    let indices_accessor = accessors.len();
    accessors.push(format!(
        "{{\"bufferView\":{},\"componentType\":{},\"count\":{},\"type\":\"SCALAR\"}}",
        buffer_views.len() - 1,
        COMPONENT_UNSIGNED_INT,
        mesh.indices.len(),
    ));

    let json = format!(
        concat!(
            "{{",
            "\"asset\":{{\"version\":\"2.0\",\"generator\":\"bevy_arbor\"}},",
            "\"scene\":0,",
            "\"scenes\":[{{\"name\":\"Tree\",\"nodes\":[0]}}],",
            "\"nodes\":[{{\"name\":\"tree\",\"mesh\":0}}],",
            "\"meshes\":[{{\"name\":\"bark\",\"primitives\":[{{\"attributes\":{{{}}},",
            "\"indices\":{},\"material\":0}}]}}],",
            "\"materials\":[{{\"name\":\"Bark\",\"pbrMetallicRoughness\":",
            "{{\"baseColorFactor\":[1.0,1.0,1.0,1.0],\"metallicFactor\":0.0,",
            "\"roughnessFactor\":0.9}}}}],",
            "\"accessors\":[{}],",
            "\"bufferViews\":[{}],",
            "\"buffers\":[{{\"byteLength\":{}}}]",
            "}}"
        ),
        attr_entries.join(","),
        indices_accessor,
        accessors.join(","),
        buffer_views.join(","),
        bin_buffer.len(),
    );

    pack_glb(&json, &bin_buffer)
}

/// Appends little-endian floats to the binary buffer and records a view over
/// them. Returns the view index.
fn push_view(
    bin_buffer: &mut Vec<u8>,
    buffer_views: &mut Vec<String>,
    values: impl Iterator<Item = f32>,
    target: u32,
) -> usize {
    let offset = bin_buffer.len();
    for v in values {
        bin_buffer.extend_from_slice(&v.to_le_bytes());
    }
    buffer_views.push(format!(
        "{{\"buffer\":0,\"byteOffset\":{},\"byteLength\":{},\"target\":{}}}",
        offset,
        bin_buffer.len() - offset,
        target
    ));
    buffer_views.len() - 1
}

fn float_accessor(view: usize, count: usize, kind: &str) -> String {
    format!(
        "{{\"bufferView\":{},\"componentType\":{},\"count\":{},\"type\":\"{}\"}}",
        view, COMPONENT_FLOAT, count, kind
    )
}

fn build_empty_glb() -> Vec<u8> {
    let json = r#"{"asset":{"version":"2.0","generator":"bevy_arbor"},"scene":0,"scenes":[{"name":"Empty"}]}"#;
    pack_glb(json, &[])
}

fn pack_glb(json: &str, bin_data: &[u8]) -> Vec<u8> {
    let json_bytes = json.as_bytes();
    let json_padded_len = (json_bytes.len() + 3) & !3;
    let bin_padded_len = (bin_data.len() + 3) & !3;

    let has_bin = !bin_data.is_empty();
    let bin_chunk_size = if has_bin { 8 + bin_padded_len } else { 0 };
    let total_length = 12 + 8 + json_padded_len + bin_chunk_size;

    let mut glb = Vec::with_capacity(total_length);

    // GLB Header
    glb.extend_from_slice(&0x46546C67u32.to_le_bytes()); // magic "glTF"
    glb.extend_from_slice(&2u32.to_le_bytes()); // version
    glb.extend_from_slice(&(total_length as u32).to_le_bytes());

    // JSON Chunk
    glb.extend_from_slice(&(json_padded_len as u32).to_le_bytes());
    glb.extend_from_slice(&0x4E4F534Au32.to_le_bytes()); // "JSON"
    glb.extend_from_slice(json_bytes);
    glb.resize(glb.len() + json_padded_len - json_bytes.len(), b' ');

    // BIN Chunk
    if has_bin {
        glb.extend_from_slice(&(bin_padded_len as u32).to_le_bytes());
        glb.extend_from_slice(&0x004E4942u32.to_le_bytes()); // "BIN\0"
        glb.extend_from_slice(bin_data);
        glb.resize(glb.len() + bin_padded_len - bin_data.len(), 0);
    }

    glb
}

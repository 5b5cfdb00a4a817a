//! Model import: reads a glTF 2.0 asset (binary `.glb` or `.gltf`) into
//! plain node, mesh and animation data for the scene.
//!
//! Parsing is done by the `gltf` crate; this crate only maps its output.
//! Remote (http/https) locations are downloaded first with `reqwest`.
//!
//! # Invariants
//! - Every primitive in `ModelData` is a triangle list with one normal per
//!   position.
//! - Animation channels only target node translation, rotation or scale.

mod fetch;
mod model;

pub use fetch::{Fetch, HttpFetcher};

pub use model::{
    AnimationClip, Channel, Interpolation, Keyframes, MeshData, ModelData, ModelSummary,
    NodeData, Primitive,
};

use glam::{Quat, Vec3};
use gltf::animation::util::ReadOutputs;
use modelview_common::{AssetLocation, Transform};
use std::thread::JoinHandle;

/// Errors from model import.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {status} fetching {url}")]
    HttpStatus { url: String, status: u16 },
    #[error("unsupported scheme in asset location {0}")]
    UnsupportedScheme(String),
    #[error("model contains no triangle meshes")]
    Empty,
}

/// Import the model at `location`, fetching http(s) locations over the network.
pub fn import_model(location: &AssetLocation) -> Result<ModelData, AssetError> {
    import_model_with(location, &HttpFetcher::default())
}

/// Import the model at `location`, using `fetcher` for remote locations.
pub fn import_model_with<F>(location: &AssetLocation, fetcher: &F) -> Result<ModelData, AssetError>
where
    F: Fetch + ?Sized,
{
    if location.is_remote() {
        let url = location.to_string();
        tracing::debug!("fetching model from {url}");
        let bytes = fetcher.fetch(&url)?;
        return import_model_slice(&bytes);
    }
    match location.scheme().as_deref() {
        None | Some("file") => {}
        Some(_) => return Err(AssetError::UnsupportedScheme(location.to_string())),
    }
    let path = location.resolve();
    tracing::debug!("importing model from {}", path.display());
    let (doc, buffers, _images) = gltf::import(&path)?;
    convert(&doc, &buffers)
}

/// Import a model from in-memory GLB or self-contained glTF bytes.
pub fn import_model_slice(bytes: &[u8]) -> Result<ModelData, AssetError> {
    let (doc, buffers, _images) = gltf::import_slice(bytes)?;
    convert(&doc, &buffers)
}

/// Run [`import_model`] on a background thread and hand the result to `on_done`.
pub fn spawn_import<F>(location: AssetLocation, on_done: F) -> std::io::Result<JoinHandle<()>>
where
    F: FnOnce(Result<ModelData, AssetError>) + Send + 'static,
{
    spawn_import_with(location, HttpFetcher::default(), on_done)
}

/// [`spawn_import`] with a caller-supplied fetcher for remote locations.
pub fn spawn_import_with<Fe, F>(
    location: AssetLocation,
    fetcher: Fe,
    on_done: F,
) -> std::io::Result<JoinHandle<()>>
where
    Fe: Fetch + Send + 'static,
    F: FnOnce(Result<ModelData, AssetError>) + Send + 'static,
{
    std::thread::Builder::new()
        .name("model-import".into())
        .spawn(move || {
            let result = import_model_with(&location, &fetcher);
            match &result {
                Ok(model) => tracing::info!("imported {location}: {}", model.summary()),
                Err(e) => tracing::debug!("import of {location} failed: {e}"),
            }
            on_done(result);
        })
}

fn convert(doc: &gltf::Document, buffers: &[gltf::buffer::Data]) -> Result<ModelData, AssetError> {
    let read = |buffer: gltf::Buffer<'_>| buffers.get(buffer.index()).map(|d| d.0.as_slice());

    let mut nodes: Vec<NodeData> = doc
        .nodes()
        .map(|node| {
            let (t, r, s) = node.transform().decomposed();
            NodeData {
                name: node
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("node_{}", node.index())),
                parent: None,
                transform: Transform {
                    position: Vec3::from(t),
                    rotation: Quat::from_array(r),
                    scale: Vec3::from(s),
                },
                mesh: node.mesh().map(|m| m.index()),
            }
        })
        .collect();
    for node in doc.nodes() {
        for child in node.children() {
            nodes[child.index()].parent = Some(node.index());
        }
    }

    let mut meshes = Vec::new();
    for mesh in doc.meshes() {
        let mut primitives = Vec::new();
        for prim in mesh.primitives() {
            if prim.mode() != gltf::mesh::Mode::Triangles {
                tracing::debug!(
                    "skipping {:?} primitive in mesh {}",
                    prim.mode(),
                    mesh.index()
                );
                continue;
            }
            let reader = prim.reader(read);
            let Some(positions) = reader.read_positions() else {
                continue;
            };
            let positions: Vec<[f32; 3]> = positions.collect();
            let indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };
            let normals = match reader.read_normals() {
                Some(normals) => normals.collect(),
                None => model::generate_normals(&positions, &indices),
            };
            let base_color = prim
                .material()
                .pbr_metallic_roughness()
                .base_color_factor();
            primitives.push(Primitive {
                positions,
                normals,
                indices,
                base_color,
            });
        }
        meshes.push(MeshData {
            name: mesh
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("mesh_{}", mesh.index())),
            primitives,
        });
    }

    if meshes.iter().all(|m| m.primitives.is_empty()) {
        return Err(AssetError::Empty);
    }

    let mut animations = Vec::new();
    for anim in doc.animations() {
        let mut channels = Vec::new();
        for channel in anim.channels() {
            let reader = channel.reader(read);
            let Some(inputs) = reader.read_inputs() else {
                continue;
            };
            let times: Vec<f32> = inputs.collect();
            let values = match reader.read_outputs() {
                Some(ReadOutputs::Translations(v)) => {
                    Keyframes::Translation(v.map(Vec3::from).collect())
                }
                Some(ReadOutputs::Rotations(v)) => {
                    Keyframes::Rotation(v.into_f32().map(Quat::from_array).collect())
                }
                Some(ReadOutputs::Scales(v)) => Keyframes::Scale(v.map(Vec3::from).collect()),
                Some(ReadOutputs::MorphTargetWeights(_)) => {
                    tracing::debug!("skipping morph target channel in animation {}", anim.index());
                    continue;
                }
                None => continue,
            };
            let interpolation = match channel.sampler().interpolation() {
                gltf::animation::Interpolation::Step => Interpolation::Step,
                gltf::animation::Interpolation::Linear => Interpolation::Linear,
                gltf::animation::Interpolation::CubicSpline => Interpolation::CubicSpline,
            };
            channels.push(Channel {
                node: channel.target().node().index(),
                interpolation,
                times,
                values,
            });
        }
        animations.push(AnimationClip {
            name: anim
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("animation_{}", anim.index())),
            channels,
        });
    }

    Ok(ModelData {
        nodes,
        meshes,
        animations,
    })
}

pub fn crate_info() -> &'static str {
    "modelview-assets v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::{Mutex, mpsc};

    const SCENE_JSON: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [
            { "name": "Body", "mesh": 0, "children": [1] },
            { "name": "Barrel", "translation": [0.0, 1.0, 0.0] }
        ],
        "meshes": [{ "name": "Tri", "primitives": [{ "attributes": { "POSITION": 0 } }] }],
        "animations": [{
            "name": "Recoil",
            "channels": [{ "sampler": 0, "target": { "node": 1, "path": "translation" } }],
            "samplers": [{ "input": 1, "output": 2, "interpolation": "LINEAR" }]
        }],
        "buffers": [{ "byteLength": 68 }],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 8 },
            { "buffer": 0, "byteOffset": 44, "byteLength": 24 }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
              "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
            { "bufferView": 1, "componentType": 5126, "count": 2, "type": "SCALAR",
              "min": [0.0], "max": [1.0] },
            { "bufferView": 2, "componentType": 5126, "count": 2, "type": "VEC3" }
        ]
    }"#;

    fn scene_bin() -> Vec<u8> {
        let floats: [f32; 17] = [
            // positions
            0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, //
            // key times
            0.0, 1.0, //
            // translations
            0.0, 1.0, 0.0, 2.0, 1.0, 0.0,
        ];
        floats.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Pack a JSON document and binary chunk into a GLB container.
    fn glb(json: &str, bin: &[u8]) -> Vec<u8> {
        let mut json = json.as_bytes().to_vec();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }
        let mut bin = bin.to_vec();
        while bin.len() % 4 != 0 {
            bin.push(0);
        }
        let total = 12 + 8 + json.len() + 8 + bin.len();

        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(b"glTF");
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&(json.len() as u32).to_le_bytes());
        out.extend_from_slice(b"JSON");
        out.extend_from_slice(&json);
        out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        out.extend_from_slice(b"BIN\0");
        out.extend_from_slice(&bin);
        out
    }

    #[test]
    fn import_glb_nodes_and_hierarchy() {
        let model = import_model_slice(&glb(SCENE_JSON, &scene_bin())).unwrap();
        assert_eq!(model.nodes.len(), 2);
        assert_eq!(model.nodes[0].name, "Body");
        assert_eq!(model.nodes[0].parent, None);
        assert_eq!(model.nodes[0].mesh, Some(0));
        assert_eq!(model.nodes[1].parent, Some(0));
        assert_eq!(model.nodes[1].transform.position, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn import_glb_generates_indices_and_normals() {
        let model = import_model_slice(&glb(SCENE_JSON, &scene_bin())).unwrap();
        let prim = &model.meshes[0].primitives[0];
        assert_eq!(prim.positions.len(), 3);
        assert_eq!(prim.indices, vec![0, 1, 2]);
        assert_eq!(prim.normals, vec![[0.0, 0.0, 1.0]; 3]);
        // Default material is opaque white.
        assert_eq!(prim.base_color, [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn import_glb_animation_clip() {
        let model = import_model_slice(&glb(SCENE_JSON, &scene_bin())).unwrap();
        assert_eq!(model.animations.len(), 1);
        let clip = &model.animations[0];
        assert_eq!(clip.name, "Recoil");
        assert_eq!(clip.duration(), 1.0);
        let channel = &clip.channels[0];
        assert_eq!(channel.node, 1);
        assert_eq!(channel.interpolation, Interpolation::Linear);
        match &channel.values {
            Keyframes::Translation(v) => assert_eq!(v[1], Vec3::new(2.0, 1.0, 0.0)),
            other => panic!("unexpected keyframes {other:?}"),
        }
    }

    #[test]
    fn import_from_file_location() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tri.glb"), glb(SCENE_JSON, &scene_bin())).unwrap();
        let location = AssetLocation::new(dir.path().to_string_lossy(), "tri.glb");
        let model = import_model(&location).unwrap();
        assert_eq!(model.summary().triangles, 1);
    }

    #[test]
    fn missing_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let location = AssetLocation::new(dir.path().to_string_lossy(), "missing.glb");
        assert!(import_model(&location).is_err());
    }

    /// Serves fixed bytes and records the requested URLs.
    struct StaticFetcher {
        bytes: Vec<u8>,
        requested: Mutex<Vec<String>>,
    }

    impl StaticFetcher {
        fn new(bytes: Vec<u8>) -> Self {
            Self {
                bytes,
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    impl Fetch for StaticFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError> {
            self.requested.lock().unwrap().push(url.to_string());
            Ok(self.bytes.clone())
        }
    }

    struct FailingFetcher;

    impl Fetch for FailingFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError> {
            Err(AssetError::HttpStatus {
                url: url.to_string(),
                status: 503,
            })
        }
    }

    /// Answer a single HTTP request on a local port with `status` and `body`.
    fn serve_once(status: &'static str, body: Vec<u8>) -> (String, std::thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}/models/", listener.local_addr().unwrap());
        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut chunk).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
            }
            let head = format!(
                "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(&body).unwrap();
        });
        (base, handle)
    }

    #[test]
    fn remote_location_goes_through_fetcher() {
        let fetcher = StaticFetcher::new(glb(SCENE_JSON, &scene_bin()));
        let location = AssetLocation::new("https://example.org/models/", "rifle.glb");
        let model = import_model_with(&location, &fetcher).unwrap();
        assert_eq!(model.nodes.len(), 2);
        assert_eq!(
            *fetcher.requested.lock().unwrap(),
            vec!["https://example.org/models/rifle.glb".to_string()]
        );
    }

    #[test]
    fn local_location_skips_fetcher() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tri.glb"), glb(SCENE_JSON, &scene_bin())).unwrap();
        let fetcher = StaticFetcher::new(Vec::new());
        let location = AssetLocation::new(dir.path().to_string_lossy(), "tri.glb");
        assert!(import_model_with(&location, &fetcher).is_ok());
        assert!(fetcher.requested.lock().unwrap().is_empty());
    }

    #[test]
    fn fetch_failure_is_reported() {
        let location = AssetLocation::new("http://example.org/", "a.glb");
        let err = import_model_with(&location, &FailingFetcher).unwrap_err();
        assert!(matches!(err, AssetError::HttpStatus { status: 503, .. }));
    }

    #[test]
    fn http_import_from_local_server() {
        let (base, server) = serve_once("200 OK", glb(SCENE_JSON, &scene_bin()));
        let model = import_model(&AssetLocation::new(base, "tri.glb")).unwrap();
        server.join().unwrap();
        assert_eq!(model.animations[0].name, "Recoil");
    }

    #[test]
    fn http_error_status_is_reported() {
        let (base, server) = serve_once("404 Not Found", Vec::new());
        let err = import_model(&AssetLocation::new(base, "missing.glb")).unwrap_err();
        server.join().unwrap();
        assert!(matches!(err, AssetError::HttpStatus { status: 404, .. }));
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        let location = AssetLocation::new("ftp://example.org/models/", "rifle.glb");
        let err = import_model_with(&location, &FailingFetcher).unwrap_err();
        assert!(matches!(err, AssetError::UnsupportedScheme(_)));
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        assert!(import_model_slice(b"not a model").is_err());
    }

    #[test]
    fn spawn_import_reports_once() {
        let (tx, rx) = mpsc::channel();
        let location = AssetLocation::new("https://example.org", "a.glb");
        let handle = spawn_import_with(location, FailingFetcher, move |result| {
            tx.send(result.is_err()).unwrap();
        })
        .unwrap();
        handle.join().unwrap();
        assert!(rx.recv().unwrap());
        assert!(rx.try_recv().is_err());
    }
}

//! Resource loading.
//!
//! Input is either a plain multi-document YAML stream or a single
//! `kind: ResourceList` document whose `items` are the resources and whose
//! `functionConfig` may carry the replacement rules. Files ending in `.gz`
//! and gzip data on stdin are decompressed transparently.

use super::{InputFormat, ResourceInput};
use crate::document::node::{YamlNode, YamlValue};
use crate::document::parser::{parse_yaml_stream, to_serde_value};
use crate::document::resource::Resource;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Kind of the envelope document that wraps resources and their rules.
pub const RESOURCE_LIST_KIND: &str = "ResourceList";

/// Loads resources from a file.
///
/// # Examples
///
/// ```no_run
/// use yamlreplace::file::loader::load_resources;
///
/// let input = load_resources("manifests.yaml").unwrap();
/// println!("{} resources", input.resources.len());
/// ```
///
/// # Errors
///
/// Returns an error if the file cannot be read or decompressed, or is not
/// valid YAML.
pub fn load_resources<P: AsRef<Path>>(path: P) -> Result<ResourceInput> {
    let path_ref = path.as_ref();

    let is_gzipped = path_ref
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    let content = if is_gzipped {
        read_gzipped_file(path_ref)?
    } else {
        fs::read_to_string(path_ref)
            .with_context(|| format!("Failed to read file: {}", path_ref.display()))?
    };

    parse_resources(&content).with_context(|| format!("Failed to load {}", path_ref.display()))
}

/// Loads resources from standard input until EOF.
///
/// Gzip data is recognised by its magic bytes.
pub fn load_resources_from_stdin() -> Result<ResourceInput> {
    use std::io::{self, Read};

    let mut buffer = Vec::new();
    io::stdin()
        .read_to_end(&mut buffer)
        .context("Failed to read from stdin")?;

    let content = if buffer.starts_with(&[0x1f, 0x8b]) {
        decompress_gzip_bytes(&buffer)?
    } else {
        String::from_utf8(buffer).context("Invalid UTF-8 in stdin")?
    };

    parse_resources(&content).context("Failed to load resources from stdin")
}

/// Parses YAML text into resources, unwrapping a resource list envelope.
pub fn parse_resources(content: &str) -> Result<ResourceInput> {
    let mut documents = parse_yaml_stream(content)?;

    if documents.len() == 1 && is_resource_list(&documents[0]) {
        let envelope = documents.remove(0);
        let resources = match envelope.get("items").map(|n| n.value()) {
            Some(YamlValue::Array(items)) => items.iter().cloned().map(Resource::new).collect(),
            Some(YamlValue::Null) | None => Vec::new(),
            Some(_) => anyhow::bail!("ResourceList `items` must be a sequence"),
        };
        let function_config = envelope
            .get("functionConfig")
            .filter(|n| !n.is_null())
            .map(to_serde_value);
        debug!(resources = resources.len(), "Loaded resource list");
        return Ok(ResourceInput {
            resources,
            function_config,
            format: InputFormat::ResourceList {
                envelope: to_serde_value(&envelope),
            },
        });
    }

    debug!(resources = documents.len(), "Loaded resource stream");
    Ok(ResourceInput {
        resources: documents.into_iter().map(Resource::new).collect(),
        function_config: None,
        format: InputFormat::Stream,
    })
}

fn is_resource_list(document: &YamlNode) -> bool {
    document
        .get("kind")
        .and_then(|k| k.as_scalar_text())
        .is_some_and(|kind| kind == RESOURCE_LIST_KIND)
}

fn read_gzipped_file<P: AsRef<Path>>(path: P) -> Result<String> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let file = fs::File::open(path).context("Failed to open gzipped file")?;
    let mut decoder = GzDecoder::new(file);
    let mut content = String::new();
    decoder
        .read_to_string(&mut content)
        .context("Failed to decompress gzipped file - file may be corrupted")?;
    Ok(content)
}

fn decompress_gzip_bytes(bytes: &[u8]) -> Result<String> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let mut decoder = GzDecoder::new(bytes);
    let mut content = String::new();
    decoder
        .read_to_string(&mut content)
        .context("Failed to decompress gzipped stdin")?;
    Ok(content)
}

//! Resource writing.
//!
//! Resources are rendered in the shape they were read in: a `---` separated
//! stream, or the original resource list envelope with its `items` replaced.
//! Files are written atomically (temporary file, then rename), optionally
//! after copying the previous version to `<name>.bak`, and gzip-compressed
//! when the target name ends in `.gz`.

use super::InputFormat;
use crate::config::Config;
use crate::document::parser::{serialize_yaml, to_serde_value};
use crate::document::resource::Resource;
use anyhow::{Context, Result};
use serde_yaml::Value as SerdeValue;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Renders resources as YAML text.
///
/// # Example
///
/// ```
/// use yamlreplace::document::parser::parse_yaml;
/// use yamlreplace::document::resource::Resource;
/// use yamlreplace::file::saver::render_resources;
/// use yamlreplace::file::InputFormat;
///
/// let resources = vec![
///     Resource::new(parse_yaml("kind: A\n").unwrap()),
///     Resource::new(parse_yaml("kind: B\n").unwrap()),
/// ];
/// let out = render_resources(&resources, &InputFormat::Stream).unwrap();
/// assert_eq!(out, "kind: A\n---\nkind: B\n");
/// ```
pub fn render_resources(resources: &[Resource], format: &InputFormat) -> Result<String> {
    match format {
        InputFormat::Stream => {
            let documents = resources
                .iter()
                .map(|r| serialize_yaml(r.root()))
                .collect::<Result<Vec<_>>>()?;
            Ok(documents.join("---\n"))
        }
        InputFormat::ResourceList { envelope } => {
            let mut envelope = envelope.clone();
            let items = SerdeValue::Sequence(resources.iter().map(|r| to_serde_value(r.root())).collect());
            let map = envelope
                .as_mapping_mut()
                .ok_or_else(|| anyhow::anyhow!("ResourceList envelope is not a mapping"))?;
            map.insert(SerdeValue::String("items".to_string()), items);
            serde_yaml::to_string(&envelope).context("Failed to serialize ResourceList")
        }
    }
}

/// Writes resources to `path`.
///
/// # Errors
///
/// Returns an error if the backup copy, the temporary file write or the
/// final rename fails.
pub fn save_resources<P: AsRef<Path>>(
    path: P,
    resources: &[Resource],
    format: &InputFormat,
    config: &Config,
) -> Result<()> {
    let path = path.as_ref();
    let should_compress = path.to_string_lossy().ends_with(".gz");

    if config.create_backup && path.exists() {
        create_backup(path)?;
    }

    let content = render_resources(resources, format)?;
    write_file_atomic(path, content.as_bytes(), should_compress)?;
    debug!(path = %path.display(), resources = resources.len(), "Saved resources");
    Ok(())
}

/// Creates a backup of a file by copying it with a .bak extension.
fn create_backup<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    let mut backup_path = path.to_path_buf();
    let original_name = backup_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid file name"))?;
    backup_path.set_file_name(format!("{}.bak", original_name));
    fs::copy(path, backup_path).context("Failed to create backup")?;
    Ok(())
}

fn write_file_atomic<P: AsRef<Path>>(path: P, data: &[u8], compress: bool) -> Result<()> {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let path = path.as_ref();
    let temp_path = path.with_extension("tmp");

    if compress {
        let file = fs::File::create(&temp_path).context("Failed to create temp file")?;
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder
            .write_all(data)
            .context("Failed to write compressed data")?;
        encoder.finish().context("Failed to finish compression")?;
    } else {
        fs::write(&temp_path, data).context("Failed to write temp file")?;
    }

    fs::rename(&temp_path, path).context("Failed to rename temp file")?;
    Ok(())
}

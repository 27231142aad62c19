use color_eyre::eyre::{OptionExt, Result, WrapErr, eyre};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File extensions the loader recognizes as command definitions.
pub const DEFINITION_EXTENSIONS: [&str; 2] = ["json", "toml"];

/// A single slash-command schema, sent to discord exactly as it was written.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(transparent)]
pub struct CommandDescriptor(serde_json::Value);

impl CommandDescriptor {
    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(serde_json::Value::as_str)
    }

    pub fn schema(&self) -> &serde_json::Value {
        &self.0
    }
}

/// The on-disk layout of a definition file.
///
/// Anything outside of `data` is ignored, so definition files are free to carry their own notes.
#[derive(Deserialize, Debug)]
struct DefinitionFile {
    data: Option<serde_json::Value>,
}

impl DefinitionFile {
    fn read(path: &Path) -> Result<DefinitionFile> {
        let contents = std::fs::read_to_string(path).wrap_err("Could not read definition file")?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&contents).wrap_err("Could not parse json definition"),
            Some("toml") => toml::from_str(&contents).wrap_err("Could not parse toml definition"),
            other => Err(eyre!("Unsupported definition extension {:?}", other)),
        }
    }

    fn into_descriptor(self) -> Result<CommandDescriptor> {
        let data = self.data.ok_or_eyre("Definition has no `data` table")?;

        if !data.is_object() {
            return Err(eyre!("Definition `data` must be a table, found {}", data));
        }

        Ok(CommandDescriptor(data))
    }
}

/// Collects every definition file directly inside `dir`, ordered by file name.
pub fn definition_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut files = std::fs::read_dir(dir)
        .wrap_err_with(|| format!("Could not read commands directory {}", dir.display()))?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .wrap_err("Could not list commands directory")?;

    files.retain(|path| {
        path.is_file()
            && path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| DEFINITION_EXTENSIONS.contains(&ext))
    });
    files.sort();

    Ok(files)
}

/// Loads the command schema out of every definition file in `dir`.
///
/// Any unreadable file or file without a schema fails the whole load.
pub fn load_descriptors(dir: impl AsRef<Path>) -> Result<Vec<CommandDescriptor>> {
    definition_files(dir)?
        .iter()
        .map(|path| {
            DefinitionFile::read(path)
                .and_then(DefinitionFile::into_descriptor)
                .wrap_err_with(|| format!("Failed to load command from {}", path.display()))
        })
        .collect()
}

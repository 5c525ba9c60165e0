use rmp_serde::{decode, encode};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::error::TrainError;
use crate::training::ScheduledOptimizer;

/// Saves and restores a `ScheduledOptimizer` (optimizer state, schedule and step counter)
/// so that training can resume where it stopped.
pub trait StateIO {
    fn save(&self, state: &ScheduledOptimizer) -> Result<(), TrainError>;
    fn load(&self) -> Result<ScheduledOptimizer, TrainError>;
}

#[derive(Clone)]
struct JSONStateIO {
    path: PathBuf,
}

impl StateIO for JSONStateIO {
    fn save(&self, state: &ScheduledOptimizer) -> Result<(), TrainError> {
        let data = serde_json::to_vec(state)
            .map_err(|e| TrainError::IoError(format!("Failed to serialize to JSON: {}", e)))?;
        save(&self.path, &data)
    }

    fn load(&self) -> Result<ScheduledOptimizer, TrainError> {
        let data = load(&self.path)?;
        serde_json::from_slice(&data).map_err(|e| TrainError::IoError(format!("Failed to deserialize from JSON: {}", e)))
    }
}

/// A builder for configuring and creating a JSON state exporter.
///
/// The state is written to `<directory>/<file_name>.json`.
/// Use the `build` method to validate the configuration and return
/// a concrete implementation of `StateIO`.
pub struct JSON {
    file_name: String,
    directory: String,
}

impl JSON {
    // Default values:
    // - File name: `"training_state"`
    // - Directory: `"."` (current directory)
    fn new() -> Self {
        JSON {
            file_name: "training_state".to_string(),
            directory: ".".to_string(),
        }
    }

    /// Sets the base name for the output JSON file.
    pub fn file_name(mut self, file_name: &str) -> Self {
        self.file_name = file_name.to_string();
        self
    }

    /// Sets the output directory for the JSON file.
    pub fn directory(mut self, directory: &str) -> Self {
        self.directory = directory.to_string();
        self
    }

    /// Finalizes the builder, creating the output directory if needed.
    pub fn build(self) -> Result<impl StateIO, TrainError> {
        let path = resolve(&self.file_name, &self.directory, "json")?;
        Ok(JSONStateIO { path })
    }
}

impl Default for JSON {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
struct MessagePackStateIO {
    path: PathBuf,
}

impl StateIO for MessagePackStateIO {
    fn save(&self, state: &ScheduledOptimizer) -> Result<(), TrainError> {
        let data = encode::to_vec(state)
            .map_err(|e| TrainError::IoError(format!("Failed to serialize to MessagePack: {}", e)))?;
        save(&self.path, &data)
    }

    fn load(&self) -> Result<ScheduledOptimizer, TrainError> {
        let data = load(&self.path)?;
        decode::from_slice(&data)
            .map_err(|e| TrainError::IoError(format!("Failed to deserialize from MessagePack: {}", e)))
    }
}

/// A builder for configuring and creating a MessagePack state exporter.
///
/// The state is written to `<directory>/<file_name>.msgpack`.
pub struct MessagePack {
    file_name: String,
    directory: String,
}

impl MessagePack {
    // Default values:
    // - File name: `"training_state"`
    // - Directory: `"."` (current directory)
    fn new() -> Self {
        MessagePack {
            file_name: "training_state".to_string(),
            directory: ".".to_string(),
        }
    }

    /// Sets the base name for the output MessagePack file.
    pub fn file_name(mut self, file_name: &str) -> Self {
        self.file_name = file_name.to_string();
        self
    }

    /// Sets the output directory for the MessagePack file.
    pub fn directory(mut self, directory: &str) -> Self {
        self.directory = directory.to_string();
        self
    }

    /// Finalizes the builder, creating the output directory if needed.
    pub fn build(self) -> Result<impl StateIO, TrainError> {
        let path = resolve(&self.file_name, &self.directory, "msgpack")?;
        Ok(MessagePackStateIO { path })
    }
}

impl Default for MessagePack {
    fn default() -> Self {
        Self::new()
    }
}

// Validates the names and makes sure the output directory exists.
fn resolve(file_name: &str, directory: &str, extension: &str) -> Result<PathBuf, TrainError> {
    if file_name.is_empty() {
        return Err(TrainError::ConfigError("Filename cannot be empty".to_string()));
    }
    if directory.is_empty() {
        return Err(TrainError::ConfigError("Directory cannot be empty".to_string()));
    }

    let directory = Path::new(directory);
    if !directory.exists() {
        fs::create_dir_all(directory).map_err(|e| {
            TrainError::IoError(format!("Failed to create output directory '{}': {}", directory.display(), e))
        })?;
    }

    Ok(directory.join(format!("{}.{}", file_name, extension)))
}

fn save(path: &Path, data: &[u8]) -> Result<(), TrainError> {
    let mut file = File::create(path)
        .map_err(|e| TrainError::IoError(format!("Failed to create file '{}': {}", path.display(), e)))?;
    file.write_all(data)
        .map_err(|e| TrainError::IoError(format!("Failed to write to file '{}': {}", path.display(), e)))
}

fn load(path: &Path) -> Result<Vec<u8>, TrainError> {
    let mut file = File::open(path)
        .map_err(|e| TrainError::IoError(format!("Failed to open file '{}': {}", path.display(), e)))?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)
        .map_err(|e| TrainError::IoError(format!("Failed to read file '{}': {}", path.display(), e)))?;
    Ok(buffer)
}

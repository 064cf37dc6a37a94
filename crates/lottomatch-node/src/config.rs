//! Config file loading.

use std::path::Path;

use lottomatch_types::NodeConfig;

use crate::error::NodeError;

/// Load and validate the node config. Without a path, defaults are used.
///
/// # Errors
/// `ConfigFile` if the file cannot be read, `Engine` if it does not parse
/// or validate.
pub fn load_config(path: Option<&Path>) -> Result<NodeConfig, NodeError> {
    let Some(path) = path else {
        let config = NodeConfig::default();
        config.validate()?;
        return Ok(config);
    };
    let raw = std::fs::read_to_string(path).map_err(|source| NodeError::ConfigFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(NodeConfig::from_json(&raw)?)
}

//! Optional `key=value` configuration file, loaded when `--config` is
//! passed on the command line. Every setting also has a CLI flag; CLI flags
//! take precedence over the config file. Recognized keys: `base_path`,
//! `output_path`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config file {path} line {line}: expected 'key=value', got {content:?}")]
    MalformedLine {
        path: PathBuf,
        line: usize,
        content: String,
    },
}

#[derive(Debug, Default)]
pub struct Config {
    pub base_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
}

/// Parse a `key=value` config file. Blank lines and lines starting with `#`
/// are ignored. Recognized keys: `base_path`, `output_path`.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut values: HashMap<String, String> = HashMap::new();
    for (i, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(ConfigError::MalformedLine {
                path: path.to_path_buf(),
                line: i + 1,
                content: raw_line.to_string(),
            });
        };
        values.insert(key.trim().to_string(), value.trim().to_string());
    }

    Ok(Config {
        base_path: values.get("base_path").map(PathBuf::from),
        output_path: values.get("output_path").map(PathBuf::from),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keys_and_ignores_comments_and_blanks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("somix2mse.conf");
        std::fs::write(
            &path,
            "# a comment\n\nbase_path = /repo/src\noutput_path=/tmp/out\n",
        )
        .unwrap();
        let config = load(&path).unwrap();
        assert_eq!(config.base_path, Some(PathBuf::from("/repo/src")));
        assert_eq!(config.output_path, Some(PathBuf::from("/tmp/out")));
    }

    #[test]
    fn malformed_line_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("somix2mse.conf");
        std::fs::write(&path, "not_a_key_value_line\n").unwrap();
        assert!(load(&path).is_err());
    }
}

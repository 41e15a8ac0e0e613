//! User override sources
//!
//! Loads the per-file overrides a user drops into a local configuration
//! directory. Only files named after the closed `FileKey` set are picked
//! up; `*.properties` files parse as `key=value` lines and `jvm.config`
//! as a plain line list.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::bundle::{ConfigBundle, FileContent, FileKey};
use crate::error::{ConfigurationError, PrestoResult};

/// Load override files from `dir`. A missing directory is an empty bundle.
pub fn load(dir: &Path) -> PrestoResult<ConfigBundle> {
    let mut bundle = ConfigBundle::new();
    if !dir.is_dir() {
        return Ok(bundle);
    }

    for key in FileKey::REQUIRED {
        let path = dir.join(key.file_name());
        if !path.is_file() {
            continue;
        }
        let text = fs::read_to_string(&path)?;
        let content = match key {
            FileKey::JvmConfig => FileContent::Lines(parse_lines(&text)),
            FileKey::NodeProperties | FileKey::ConfigProperties => {
                FileContent::Properties(parse_properties(&text, &path)?)
            }
        };
        debug!(file = %key, path = %path.display(), "loaded override");
        bundle.insert(key, content);
    }

    Ok(bundle)
}

fn parse_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn parse_properties(
    text: &str,
    path: &Path,
) -> Result<BTreeMap<String, String>, ConfigurationError> {
    let mut properties = BTreeMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| ConfigurationError::MalformedProperty {
                file: path.to_path_buf(),
                line: line.to_string(),
            })?;
        properties.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(properties)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) {
        let mut file = fs::File::create(dir.join(name)).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn missing_directory_is_empty_bundle() {
        let bundle = load(Path::new("/nonexistent/prestoctl-conf")).unwrap();
        assert!(bundle.is_empty());
    }

    #[test]
    fn loads_properties_and_jvm_files() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "config.properties", "coordinator=false\ntask.max-memory=2GB\n");
        write_file(dir.path(), "jvm.config", "-server\n-Xmx16G\n");

        let bundle = load(dir.path()).unwrap();
        assert_eq!(bundle.len(), 2);
        assert_eq!(
            bundle
                .get(FileKey::ConfigProperties)
                .unwrap()
                .property("task.max-memory"),
            Some("2GB")
        );
        assert_eq!(
            bundle.get(FileKey::JvmConfig).unwrap(),
            &FileContent::Lines(vec!["-server".to_string(), "-Xmx16G".to_string()])
        );
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "node.properties",
            "# environment\n\nnode.environment=test\n",
        );

        let bundle = load(dir.path()).unwrap();
        let props = bundle.get(FileKey::NodeProperties).unwrap();
        assert_eq!(props.property("node.environment"), Some("test"));
        assert_eq!(props.as_properties().unwrap().len(), 1);
    }

    #[test]
    fn malformed_property_line_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "config.properties", "coordinator\n");

        let err = load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("malformed property line 'coordinator'"));
    }

    #[test]
    fn unrelated_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "log.properties", "com.facebook.presto=INFO\n");

        let bundle = load(dir.path()).unwrap();
        assert!(bundle.is_empty());
    }
}

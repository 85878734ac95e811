//! Rclone configuration registry.
//!
//! This module reads `rclone.conf`, an INI file where every section is a
//! remote, and exposes the visible remotes together with their attributes.
//! Values of the reserved `[DEFAULT]` section are inherited by every remote.

use std::fs;
use std::path::Path;

use crate::error::{AmbiguousNameSnafu, ConfigParseSnafu, Error, IoResultExt, Result};
use crate::naming::{self, DEFAULT_SECTION};

/// Attribute naming a sub-directory of the remote to mount instead of its root.
pub const PATH_ATTRIBUTE: &str = "path";

/// Fields of one remote, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteAttributes {
    fields: Vec<(String, String)>,
}

impl RemoteAttributes {
    /// Returns the value of `key`, if set.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if `key` is set.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Sets `key`, replacing an existing value in place.
    fn insert(&mut self, key: String, value: String) {
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.fields.push((key, value)),
        }
    }

    fn last_mut(&mut self) -> Option<&mut String> {
        self.fields.last_mut().map(|(_, v)| v)
    }
}

/// One `[section]` of the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    name: String,
    attributes: RemoteAttributes,
}

/// Parsed rclone configuration.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    defaults: RemoteAttributes,
    sections: Vec<Section>,
}

impl Registry {
    /// Creates a registry with no remotes.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Reads and parses the config file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).config_read_context(path)?;
        Self::parse(&content)
    }

    /// Parses config file content.
    pub fn parse(content: &str) -> Result<Self> {
        let mut registry = Registry::default();
        // None before the first header; Some(None) inside [DEFAULT].
        let mut current: Option<Option<usize>> = None;
        let mut continuable = false;

        for (index, raw_line) in content.lines().enumerate() {
            let line_no = index + 1;
            let line = raw_line.trim();

            if line.is_empty() {
                continuable = false;
                continue;
            }
            if line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            // Indented line extends the previous value
            if continuable && raw_line.starts_with(char::is_whitespace) {
                if let Some(target) = current
                    && let Some(value) = registry.attributes_mut(target).last_mut()
                {
                    value.push('\n');
                    value.push_str(line);
                }
                continue;
            }

            if let Some(header) = line.strip_prefix('[') {
                let name = header.strip_suffix(']').ok_or_else(|| Error::ConfigParse {
                    line: line_no,
                    message: format!("malformed section header '{}'", line),
                })?;
                current = Some(registry.open_section(name, line_no)?);
                continuable = false;
                continue;
            }

            let Some(section) = current else {
                return ConfigParseSnafu {
                    line: line_no,
                    message: "key outside of any section",
                }
                .fail();
            };

            let (key, value) = split_key_value(line).ok_or_else(|| Error::ConfigParse {
                line: line_no,
                message: format!("expected 'key = value', got '{}'", line),
            })?;
            let key = key.to_lowercase();

            let attributes = registry.attributes_mut(section);
            if attributes.contains_key(&key) {
                return ConfigParseSnafu {
                    line: line_no,
                    message: format!("duplicate key '{}'", key),
                }
                .fail();
            }
            attributes.insert(key, value.to_string());
            continuable = true;
        }

        Ok(registry)
    }

    /// Starts a new section, rejecting duplicates.
    fn open_section(&mut self, name: &str, line_no: usize) -> Result<Option<usize>> {
        let name = name.trim();
        if name == DEFAULT_SECTION {
            return Ok(None);
        }
        if self.sections.iter().any(|s| s.name == name) {
            return ConfigParseSnafu {
                line: line_no,
                message: format!("duplicate remote '{}'", name),
            }
            .fail();
        }
        self.sections.push(Section {
            name: name.to_string(),
            attributes: RemoteAttributes::default(),
        });
        Ok(Some(self.sections.len() - 1))
    }

    fn attributes_mut(&mut self, section: Option<usize>) -> &mut RemoteAttributes {
        match section {
            None => &mut self.defaults,
            Some(i) => &mut self.sections[i].attributes,
        }
    }

    /// All remote names, including hidden ones, in file order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.name.as_str())
    }

    /// Remote names that may be shown and acted upon, in file order.
    pub fn list_visible(&self) -> impl Iterator<Item = &str> {
        self.names().filter(|name| !naming::is_hidden(name))
    }

    /// Returns the attributes of `name`, with `[DEFAULT]` values filled in.
    pub fn attributes_of(&self, name: &str) -> Result<RemoteAttributes> {
        let section = self
            .sections
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::RemoteNotFound {
                name: name.to_string(),
            })?;

        let mut merged = self.defaults.clone();
        for (key, value) in section.attributes.iter() {
            merged.insert(key.to_string(), value.to_string());
        }
        Ok(merged)
    }

    /// Checks that substring routing cannot confuse two visible remotes.
    ///
    /// Every visible title must be non-empty, must not be a substring of
    /// another title or of any caption, and no caption may be a substring of
    /// a title. Two remotes must also not share a mount point. Finally, each
    /// composed item `"{caption} {title}"` built from `remote_captions` must
    /// contain no other title and no other remote caption, since a match may
    /// straddle the caption and the title.
    pub fn validate_names(
        &self,
        mount_root: &Path,
        remote_captions: &[&str],
        global_captions: &[&str],
    ) -> Result<()> {
        let visible: Vec<(&str, String)> = self
            .list_visible()
            .map(|name| (name, naming::make_title(name)))
            .collect();

        for (i, (name, title)) in visible.iter().enumerate() {
            if title.trim().is_empty() {
                return AmbiguousNameSnafu {
                    first: *name,
                    second: "every action",
                }
                .fail();
            }

            for (other_name, other_title) in &visible[i + 1..] {
                if naming::make_path(name, mount_root) == naming::make_path(other_name, mount_root)
                {
                    return AmbiguousNameSnafu {
                        first: *name,
                        second: *other_name,
                    }
                    .fail();
                }
                if title.contains(other_title.as_str()) || other_title.contains(title.as_str()) {
                    return AmbiguousNameSnafu {
                        first: title.as_str(),
                        second: other_title.as_str(),
                    }
                    .fail();
                }
            }

            if let Some(caption) = remote_captions
                .iter()
                .chain(global_captions)
                .find(|c| c.contains(title.as_str()) || title.contains(**c))
            {
                return AmbiguousNameSnafu {
                    first: title.as_str(),
                    second: *caption,
                }
                .fail();
            }
        }

        for (name, title) in &visible {
            for caption in remote_captions {
                let item = format!("{} {}", caption, title);

                if let Some((_, other)) = visible
                    .iter()
                    .find(|(other_name, other)| other_name != name && item.contains(other.as_str()))
                {
                    return AmbiguousNameSnafu {
                        first: item.as_str(),
                        second: other.as_str(),
                    }
                    .fail();
                }

                if let Some(other) = remote_captions
                    .iter()
                    .find(|other| *other != caption && item.contains(**other))
                {
                    return AmbiguousNameSnafu {
                        first: item.as_str(),
                        second: *other,
                    }
                    .fail();
                }
            }
        }

        Ok(())
    }
}

/// Builds the `remote:` or `remote:sub/dir` locator passed to rclone.
pub fn remote_path_of(name: &str, attributes: &RemoteAttributes) -> String {
    match attributes.get(PATH_ATTRIBUTE) {
        Some(sub_path) => format!("{}:{}", name, sub_path),
        None => format!("{}:", name),
    }
}

/// Splits on the first `=` or `:`.
fn split_key_value(line: &str) -> Option<(&str, &str)> {
    let pos = line.find(['=', ':'])?;
    let key = line[..pos].trim();
    if key.is_empty() {
        return None;
    }
    Some((key, line[pos + 1..].trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE_CONFIG: &str = r#"# rclone config
[DEFAULT]
chunk_size = 64M

[team-drive-exclusive]
type = drive
scope = drive
team_drive = 0ABCdef

[archive-raw]
type = s3
provider = AWS

[photos]
type = alias
remote = archive-raw
path = Pictures/2024
; comment inside a section
[work-docs]
type = drive
Chunk_Size = 8M
"#;

    #[test]
    fn test_parse_sections_in_order() {
        let registry = Registry::parse(SAMPLE_CONFIG).unwrap();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(
            names,
            vec!["team-drive-exclusive", "archive-raw", "photos", "work-docs"]
        );
    }

    #[test]
    fn test_list_visible_skips_hidden() {
        let registry = Registry::parse(SAMPLE_CONFIG).unwrap();
        let visible: Vec<&str> = registry.list_visible().collect();
        assert_eq!(visible, vec!["team-drive-exclusive", "photos", "work-docs"]);
        assert!(!visible.contains(&"archive-raw"));
        assert!(!visible.contains(&"DEFAULT"));
    }

    #[test]
    fn test_attributes_inherit_defaults() {
        let registry = Registry::parse(SAMPLE_CONFIG).unwrap();

        let attrs = registry.attributes_of("team-drive-exclusive").unwrap();
        assert_eq!(attrs.get("type"), Some("drive"));
        assert_eq!(attrs.get("chunk_size"), Some("64M"));

        // Section value wins, keys are case-insensitive
        let attrs = registry.attributes_of("work-docs").unwrap();
        assert_eq!(attrs.get("chunk_size"), Some("8M"));
    }

    #[test]
    fn test_attributes_of_missing_remote() {
        let registry = Registry::parse(SAMPLE_CONFIG).unwrap();
        let err = registry.attributes_of("nope").unwrap_err();
        assert!(matches!(err, Error::RemoteNotFound { name } if name == "nope"));
    }

    #[test]
    fn test_remote_path_of() {
        let registry = Registry::parse(SAMPLE_CONFIG).unwrap();

        let attrs = registry.attributes_of("photos").unwrap();
        assert_eq!(remote_path_of("photos", &attrs), "photos:Pictures/2024");

        let attrs = registry.attributes_of("work-docs").unwrap();
        assert_eq!(remote_path_of("work-docs", &attrs), "work-docs:");
    }

    #[test]
    fn test_continuation_lines() {
        let content = "[r]\ntoken = {\"a\":\n  \"b\"}\ntype = drive\n";
        let registry = Registry::parse(content).unwrap();
        let attrs = registry.attributes_of("r").unwrap();
        assert_eq!(attrs.get("token"), Some("{\"a\":\n\"b\"}"));
        assert_eq!(attrs.get("type"), Some("drive"));
    }

    #[test]
    fn test_duplicate_remote_rejected() {
        let content = "[a]\ntype = drive\n[a]\ntype = s3\n";
        let err = Registry::parse(content).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { line: 3, .. }));
    }

    #[test]
    fn test_key_outside_section_rejected() {
        let err = Registry::parse("type = drive\n").unwrap_err();
        assert!(matches!(err, Error::ConfigParse { line: 1, .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Registry::load(Path::new("/nonexistent/rclone.conf")).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(SAMPLE_CONFIG.as_bytes()).unwrap();

        let registry = Registry::load(temp_file.path()).unwrap();
        assert_eq!(registry.list_visible().count(), 3);
    }

    #[test]
    fn test_validate_names_ok() {
        let registry = Registry::parse(SAMPLE_CONFIG).unwrap();
        registry
            .validate_names(Path::new("/home/u"), &["🎣 Mount", "⛔️ Unmount"], &[])
            .unwrap();
    }

    #[test]
    fn test_validate_names_suffix_collision() {
        let registry = Registry::parse("[a-exclusive]\n[a]\n").unwrap();
        let err = registry
            .validate_names(Path::new("/home/u"), &[], &[])
            .unwrap_err();
        assert!(matches!(err, Error::AmbiguousName { .. }));
    }

    #[test]
    fn test_validate_names_title_substring() {
        let registry = Registry::parse("[team]\n[team-drive]\n").unwrap();
        let err = registry
            .validate_names(Path::new("/home/u"), &[], &[])
            .unwrap_err();
        assert!(
            matches!(err, Error::AmbiguousName { first, second } if first == "Team" && second == "Team Drive")
        );
    }

    #[test]
    fn test_validate_names_caption_collision() {
        let registry = Registry::parse("[mount]\n").unwrap();
        let err = registry
            .validate_names(Path::new("/home/u"), &["🎣 Mount"], &[])
            .unwrap_err();
        assert!(matches!(err, Error::AmbiguousName { .. }));
    }

    #[test]
    fn test_validate_names_straddling_caption() {
        // "Mount Team" appears inside "🎣 Mount Team Drive"
        let registry = Registry::parse("[mount-team]\n[team-drive]\n").unwrap();
        let err = registry
            .validate_names(Path::new("/home/u"), &["🎣 Mount", "⛔️ Unmount"], &[])
            .unwrap_err();
        assert!(
            matches!(err, Error::AmbiguousName { first, second } if first == "🎣 Mount Team Drive" && second == "Mount Team")
        );
    }

    #[test]
    fn test_validate_names_global_caption_contains_title() {
        let registry = Registry::parse("[log]\n").unwrap();
        let err = registry
            .validate_names(Path::new("/home/u"), &[], &["🔍 Show Mounter Log"])
            .unwrap_err();
        assert!(matches!(err, Error::AmbiguousName { .. }));
    }

    #[test]
    fn test_validate_ignores_hidden() {
        let registry = Registry::parse("[archive]\n[archive-raw]\n").unwrap();
        registry
            .validate_names(Path::new("/home/u"), &[], &[])
            .unwrap();
    }
}

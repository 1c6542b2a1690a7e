//! Load `.shareinv.toml` (CLI only). Lib callers build [`Opts`] themselves.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::Opts;
use crate::utils::config::PackagePaths;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct InventoryToml {
    #[serde(default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
struct SettingsSection {
    server: Option<String>,
    network_root: Option<String>,
    output_dir: Option<String>,
    output_base: Option<String>,
    max_file_size_mb: Option<u64>,
    threads: Option<usize>,
    parallel_walk: Option<bool>,
    follow_links: Option<bool>,
    exclude: Option<Vec<String>>,
    document_properties: Option<bool>,
    events_file: Option<String>,
    manifest: Option<String>,
    manifest_delimiter: Option<char>,
    verbose: Option<bool>,
}

/// Parsed config plus the values that live outside [`Opts`] (they are CLI concerns).
#[derive(Debug, Default)]
pub(crate) struct FileSettings {
    pub output_dir: Option<PathBuf>,
    pub events_file: Option<PathBuf>,
    pub manifest: Option<PathBuf>,
}

/// Parse config text. Errors are reported with the source path.
pub(crate) fn parse_inventory_toml(text: &str, origin: &Path) -> Option<InventoryToml> {
    toml::from_str(text)
        .map_err(|e| log::warn!("{}: {}", origin.display(), e))
        .ok()
}

/// Load the config file: `explicit` if given, else `.shareinv.toml` in `dir`.
/// Returns None if the file is missing or unreadable.
pub(crate) fn load_inventory_toml(dir: &Path, explicit: Option<&Path>) -> Option<InventoryToml> {
    let path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| dir.join(PackagePaths::get().config_filename()));
    let s = std::fs::read_to_string(&path).ok()?;
    log::debug!("Loaded config from {}", path.display());
    parse_inventory_toml(&s, &path)
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($idx:expr, $opts:expr, $idx_field:ident => $($opts_field:ident).+) => {
        if let Some(v) = $idx.$idx_field.clone() {
            $opts.$($opts_field).+ = v;
        }
    };
}

/// Apply file config to opts (only fields present in the file). Call before applying CLI.
pub(crate) fn apply_file_to_opts(file: &InventoryToml, opts: &mut Opts) -> FileSettings {
    let s = &file.settings;
    apply_file_opt!(s, opts, server => server);
    if let Some(ref root) = s.network_root {
        opts.network_root = Some(PathBuf::from(root));
    }
    if let Some(ref dir) = s.output_dir {
        opts.sink.output_dir = PathBuf::from(dir);
    }
    apply_file_opt!(s, opts, output_base => sink.base_name);
    if let Some(mb) = s.max_file_size_mb {
        opts.sink.max_segment_bytes = mb.saturating_mul(1024 * 1024);
    }
    if s.threads.is_some() {
        opts.num_threads = s.threads;
    }
    apply_file_opt!(s, opts, parallel_walk => parallel_walk);
    apply_file_opt!(s, opts, follow_links => follow_links);
    apply_file_opt!(s, opts, exclude => exclude);
    apply_file_opt!(s, opts, document_properties => document_properties);
    if let Some(c) = s.manifest_delimiter {
        if c.is_ascii() {
            opts.manifest_delimiter = c as u8;
        } else {
            log::warn!("manifest_delimiter {:?} is not ASCII; keeping default", c);
        }
    }
    apply_file_opt!(s, opts, verbose => verbose);
    FileSettings {
        output_dir: s.output_dir.as_ref().map(PathBuf::from),
        events_file: s.events_file.as_ref().map(PathBuf::from),
        manifest: s.manifest.as_ref().map(PathBuf::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_values_override_defaults() {
        let text = r#"
            [settings]
            server = "FS01"
            output_dir = "/tmp/out"
            max_file_size_mb = 5
            exclude = ["*.tmp"]
            document_properties = false
            manifest_delimiter = ";"
            events_file = "events.jsonl"
        "#;
        let file = parse_inventory_toml(text, Path::new("test.toml")).unwrap();
        let mut opts = Opts::default();
        let extra = apply_file_to_opts(&file, &mut opts);
        assert_eq!(opts.server, "FS01");
        assert_eq!(opts.sink.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(opts.sink.max_segment_bytes, 5 * 1024 * 1024);
        assert_eq!(opts.exclude, vec!["*.tmp".to_string()]);
        assert!(!opts.document_properties);
        assert_eq!(opts.manifest_delimiter, b';');
        assert_eq!(extra.events_file, Some(PathBuf::from("events.jsonl")));
        assert_eq!(extra.manifest, None);
    }

    #[test]
    fn missing_section_keeps_defaults() {
        let file = parse_inventory_toml("", Path::new("empty.toml")).unwrap();
        let mut opts = Opts::default();
        apply_file_to_opts(&file, &mut opts);
        assert!(opts.document_properties);
        assert_eq!(opts.manifest_delimiter, b',');
    }

    #[test]
    fn malformed_file_is_ignored() {
        assert!(parse_inventory_toml("[settings\nserver=", Path::new("bad.toml")).is_none());
    }
}

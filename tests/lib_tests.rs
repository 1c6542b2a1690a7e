use shareinv::engine::tools::{
    glob_match, is_excluded_folder, resolve_logical_path, sanitize_field, should_include_in_walk,
};
use shareinv::engine::probe::attribute_names;
use shareinv::engine::probe::stat::{ATTR_HIDDEN, ATTR_READONLY};
use shareinv::manifest::split_fields;
use shareinv::{InventoryError, SinkOpts};
use std::path::{Path, PathBuf};

// --- resolve_logical_path ---

#[test]
fn test_resolve_first_segment_becomes_share() {
    let root = PathBuf::from("/mnt/net");
    assert_eq!(
        resolve_logical_path("/shareA/docs/2024", &root).unwrap(),
        root.join("shareA_share").join("docs").join("2024")
    );
}

#[test]
fn test_resolve_accepts_backslashes_and_empty_segments() {
    let root = PathBuf::from("/mnt/net");
    assert_eq!(
        resolve_logical_path("\\\\shareB\\\\sub\\", &root).unwrap(),
        root.join("shareB_share").join("sub")
    );
}

#[test]
fn test_resolve_share_only() {
    let root = PathBuf::from("/mnt/net");
    assert_eq!(
        resolve_logical_path("shareC", &root).unwrap(),
        root.join("shareC_share")
    );
}

#[test]
fn test_resolve_empty_is_invalid() {
    let err = resolve_logical_path(" / ", Path::new("/mnt/net")).unwrap_err();
    assert!(matches!(err, InventoryError::InvalidLogicalPath(_)));
}

// --- glob_match / should_include_in_walk ---

#[test]
fn test_glob_match_literal() {
    assert!(glob_match("report.docx", "report.docx"));
    assert!(!glob_match("report.docx", "report.xlsx"));
}

#[test]
fn test_glob_match_star_and_question() {
    assert!(glob_match("*.tmp", "~$budget.tmp"));
    assert!(glob_match("file?.log", "file1.log"));
    assert!(!glob_match("file?.log", "file10.log"));
    assert!(glob_match("*", ""));
}

#[test]
fn test_glob_match_bang_is_literal() {
    assert!(!glob_match("!*.bak", "old.bak"));
    assert!(glob_match("!*.bak", "!old.bak"));
}

#[test]
fn test_should_include_bang_pattern_is_not_negation() {
    let root = Path::new("/share");
    let exclude = vec!["!*.tmp".to_string()];
    assert!(should_include_in_walk(&root.join("a.tmp"), root, &exclude));
    assert!(!should_include_in_walk(&root.join("!a.tmp"), root, &exclude));
}

#[test]
fn test_should_include_root_always() {
    let root = Path::new("/share");
    assert!(should_include_in_walk(root, root, &["*".to_string()]));
}

#[test]
fn test_should_include_system_folders_pruned() {
    let root = Path::new("/share");
    assert!(!should_include_in_walk(
        &root.join("$RECYCLE.BIN"),
        root,
        &[]
    ));
    assert!(!should_include_in_walk(
        &root.join("system volume information"),
        root,
        &[]
    ));
    assert!(is_excluded_folder("$Recycle.Bin"));
    assert!(!is_excluded_folder("Recycle"));
}

#[test]
fn test_should_include_pattern_on_name_or_path() {
    let root = Path::new("/share");
    let exclude = vec!["*.tmp".to_string(), "/share/archive*".to_string()];
    assert!(!should_include_in_walk(&root.join("a.tmp"), root, &exclude));
    assert!(!should_include_in_walk(&root.join("archive2019"), root, &exclude));
    assert!(should_include_in_walk(&root.join("docs"), root, &exclude));
}

// --- sanitize_field ---

#[test]
fn test_sanitize_strips_delimiter_and_invisibles() {
    assert_eq!(
        sanitize_field("a|b\u{FEFF}c\u{200B}d\u{2060}e\r\nf"),
        "abcdef"
    );
}

#[test]
fn test_sanitize_leaves_clean_text() {
    assert_eq!(sanitize_field("Q3 Budget (final).xlsx"), "Q3 Budget (final).xlsx");
    assert_eq!(sanitize_field("Ünïcödé 名前"), "Ünïcödé 名前");
}

// --- attribute_names ---

#[test]
fn test_attribute_names_empty_is_normal() {
    assert_eq!(attribute_names(0), "Normal");
}

#[test]
fn test_attribute_names_joined() {
    assert_eq!(attribute_names(ATTR_READONLY | ATTR_HIDDEN), "ReadOnly, Hidden");
}

// --- manifest field splitting ---

#[test]
fn test_split_fields_quoted_delimiter() {
    assert_eq!(
        split_fields(r#"A,"/share, with comma/x",extra"#, ','),
        vec!["A", "/share, with comma/x", "extra"]
    );
}

#[test]
fn test_split_fields_escaped_quote() {
    assert_eq!(
        split_fields(r#""say ""hi""";/p"#, ';'),
        vec![r#"say "hi""#, "/p"]
    );
}

#[test]
fn test_split_fields_trailing_empty() {
    assert_eq!(split_fields("A,", ','), vec!["A", ""]);
}

// --- SinkOpts ---

#[test]
fn test_sink_opts_megabytes() {
    let opts = SinkOpts::new("/out", "inv", 100);
    assert_eq!(opts.max_segment_bytes, 100 * 1024 * 1024);
    assert_eq!(SinkOpts::default().base_name, "inventory");
}

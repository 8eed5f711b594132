use super::*;
use crate::kernel::viewer::{escape_html, format_file_size, Segment};
use std::path::PathBuf;

fn viewer_with(content: &str) -> FileViewer {
    let mut viewer = FileViewer::new();
    viewer.load(LoadedFile::new(
        PathBuf::from("/tmp/notes.txt"),
        content.to_string(),
    ));
    viewer
}

fn rendered_text(viewer: &FileViewer) -> Vec<String> {
    viewer.lines().iter().map(|line| line.text()).collect()
}

#[test]
fn test_load_renders_plain_lines() {
    let viewer = viewer_with("one\ntwo\nthree");
    assert_eq!(viewer.line_count(), 3);
    assert_eq!(rendered_text(&viewer), vec!["one", "two", "three"]);
    assert!(viewer.lines().iter().all(|line| !line.is_highlighted()));
    assert_eq!(viewer.current_line(), None);
}

#[test]
fn test_find_counts_and_highlights_matches() {
    let mut viewer = viewer_with("error here\nnothing\nERROR and Error\n");
    assert_eq!(viewer.find("error", false, false).unwrap(), 3);

    let lines = viewer.lines();
    assert_eq!(lines[0].match_count(), 1);
    assert_eq!(lines[1].match_count(), 0);
    assert_eq!(lines[2].match_count(), 2);
    assert_eq!(
        lines[2].to_html(),
        "<span class=\"highlight\">ERROR</span> and <span class=\"highlight\">Error</span>"
    );

    let summary = viewer.last_find().unwrap();
    assert_eq!(summary.term, "error");
    assert_eq!(summary.match_count, 3);
}

#[test]
fn test_find_is_case_sensitive_when_asked() {
    let mut viewer = viewer_with("error ERROR Error\n");
    assert_eq!(viewer.find("Error", true, false).unwrap(), 1);
}

#[test]
fn test_find_trims_the_term() {
    let mut viewer = viewer_with("alpha beta\n");
    assert_eq!(viewer.find("  beta  ", true, false).unwrap(), 1);
    assert_eq!(viewer.last_find().unwrap().term, "beta");
}

#[test]
fn test_blank_term_is_noop() {
    let mut viewer = viewer_with("alpha beta\n");
    viewer.find("beta", true, false).unwrap();
    let before = viewer.lines().to_vec();

    assert_eq!(viewer.find("   ", true, false).unwrap(), 0);
    assert_eq!(viewer.lines(), before.as_slice());
    assert!(viewer.last_find().is_some());
}

#[test]
fn test_invalid_regex_leaves_rendering_untouched() {
    let mut viewer = viewer_with("foo(bar\n");
    viewer.find("foo", true, false).unwrap();
    let before = viewer.lines().to_vec();

    assert!(viewer.find("(bar", true, true).is_err());
    assert_eq!(viewer.lines(), before.as_slice());
}

#[test]
fn test_regex_metacharacters_are_literal_without_regex_mode() {
    let mut viewer = viewer_with("a.b axb\n");
    assert_eq!(viewer.find("a.b", false, false).unwrap(), 1);
    assert_eq!(viewer.find("a.b", false, true).unwrap(), 2);
}

#[test]
fn test_find_replaces_previous_highlights() {
    let mut viewer = viewer_with("foo bar\n");
    viewer.find("foo", true, false).unwrap();
    assert_eq!(viewer.find("bar", true, false).unwrap(), 1);

    let segments = viewer.lines()[0].segments();
    let highlighted: Vec<&str> = segments
        .iter()
        .filter(|s| s.highlighted)
        .map(|s| s.text.as_str())
        .collect();
    assert_eq!(highlighted, vec!["bar"]);
}

#[test]
fn test_clear_restores_exact_text() {
    let content = "x < y && y > z\r\n\"quoted\" 'single'\n";
    let mut viewer = viewer_with(content);
    let original = viewer.lines().to_vec();

    viewer.find("y", true, false).unwrap();
    viewer.clear_highlights();
    assert_eq!(viewer.lines(), original.as_slice());
    assert!(viewer.last_find().is_none());

    // idempotent
    viewer.clear_highlights();
    assert_eq!(viewer.lines(), original.as_slice());
}

#[test]
fn test_html_output_escapes_content() {
    let mut viewer = viewer_with("<b>bold</b> & more\n");
    viewer.find("bold", true, false).unwrap();
    assert_eq!(
        viewer.lines()[0].to_html(),
        "&lt;b&gt;<span class=\"highlight\">bold</span>&lt;/b&gt; &amp; more"
    );
    assert_eq!(escape_html("'\""), "&#39;&quot;");
}

#[test]
fn test_go_to_line_bounds() {
    let mut viewer = viewer_with("a\nb\nc");
    assert!(!viewer.go_to_line(0));
    assert!(!viewer.go_to_line(-3));
    assert!(!viewer.go_to_line(4));
    assert_eq!(viewer.current_line(), None);

    assert!(viewer.go_to_line(3));
    assert_eq!(viewer.current_line(), Some(3));
    assert!(viewer.go_to_line(1));
    assert_eq!(viewer.current_line(), Some(1));
}

#[test]
fn test_go_to_line_without_file_is_noop() {
    let mut viewer = FileViewer::new();
    assert!(!viewer.go_to_line(1));
}

#[test]
fn test_refresh_keeps_path_and_clamps_current_line() {
    let mut viewer = viewer_with("a\nb\nc\nd\n");
    viewer.go_to_line(4);
    viewer.find("a", true, false).unwrap();

    assert!(viewer.refresh("a\nb".to_string()));
    assert_eq!(viewer.file().unwrap().path(), PathBuf::from("/tmp/notes.txt"));
    assert_eq!(viewer.line_count(), 2);
    assert_eq!(viewer.current_line(), Some(2));
    assert!(viewer.last_find().is_none());
    assert!(viewer.lines().iter().all(|line| !line.is_highlighted()));
}

#[test]
fn test_refresh_without_file_is_rejected() {
    let mut viewer = FileViewer::new();
    assert!(!viewer.refresh("x".to_string()));
    assert!(viewer.file().is_none());
}

#[test]
fn test_reset_drops_document() {
    let mut viewer = viewer_with("a\n");
    viewer.reset();
    assert!(viewer.file().is_none());
    assert!(viewer.lines().is_empty());
    assert_eq!(viewer.line_count(), 0);
}

#[test]
fn test_file_info() {
    let viewer = viewer_with("12345\n");
    let info = viewer.file_info().unwrap();
    assert_eq!(info.name, "notes.txt");
    assert_eq!(info.size_bytes, 6);
    // 末尾换行后还有一个空行
    assert_eq!(info.line_count, 2);
    assert_eq!(info.size_display(), "6 Bytes");
}

#[test]
fn test_format_file_size() {
    assert_eq!(format_file_size(0), "0 Bytes");
    assert_eq!(format_file_size(512), "512 Bytes");
    assert_eq!(format_file_size(1024), "1 KB");
    assert_eq!(format_file_size(1536), "1.5 KB");
    assert_eq!(format_file_size(1_048_576), "1 MB");
    assert_eq!(format_file_size(1_073_741_824), "1 GB");
    assert_eq!(format_file_size(5 * 1_099_511_627_776), "5120 GB");
}

#[test]
fn test_line_access_is_one_based() {
    let file = LoadedFile::new(PathBuf::from("x"), "first\r\nsecond".to_string());
    assert_eq!(file.line_count(), 2);
    assert_eq!(file.line(0), None);
    assert_eq!(file.line(1), Some("first\r"));
    assert_eq!(file.line(2), Some("second"));
    assert_eq!(file.line(3), None);
}

#[test]
fn test_trailing_newline_adds_empty_line() {
    let file = LoadedFile::new(PathBuf::from("x"), "a\nb\n".to_string());
    assert_eq!(file.line_count(), 3);
    assert_eq!(file.line(3), Some(""));

    let mut viewer = viewer_with("a\nb\n");
    assert_eq!(rendered_text(&viewer), vec!["a", "b", ""]);
    assert!(viewer.go_to_line(3));
    assert!(!viewer.go_to_line(4));
}

#[test]
fn test_empty_file_has_one_line() {
    let file = LoadedFile::new(PathBuf::from("x"), String::new());
    assert_eq!(file.line_count(), 1);
    assert_eq!(file.line(1), Some(""));

    let mut viewer = viewer_with("");
    assert_eq!(viewer.file_info().unwrap().line_count, 1);
    assert!(viewer.go_to_line(1));
    assert!(!viewer.go_to_line(2));
}

#[test]
fn test_zero_width_find_counts_without_highlighting() {
    let mut viewer = viewer_with("abc\nde");
    // 每行的每个空位置：4 + 3
    assert_eq!(viewer.find("x*", true, true).unwrap(), 7);
    assert!(viewer.lines().iter().all(|line| !line.is_highlighted()));
    assert_eq!(viewer.last_find().unwrap().match_count, 7);

    assert_eq!(viewer.find("^", true, true).unwrap(), 2);
}

#[test]
fn test_highlight_rules_mark_each_pattern() {
    let mut viewer = viewer_with("WARN disk\nERROR net\nok");
    let rules = [
        HighlightRule::new("error"),
        HighlightRule::new("unused").enabled(false),
        HighlightRule::new(r"warn\w*").use_regex(true),
    ];
    assert_eq!(viewer.set_highlight_rules(&rules, false).unwrap(), 2);
    assert_eq!(viewer.active_rule_count(), 2);

    assert_eq!(
        viewer.lines()[0].to_html(),
        "<span class=\"highlight rule-2\">WARN</span> disk"
    );
    assert_eq!(
        viewer.lines()[1].to_html(),
        "<span class=\"highlight rule-0\">ERROR</span> net"
    );
    assert!(!viewer.lines()[2].is_highlighted());
    assert_eq!(viewer.lines()[1].match_count(), 0);
    assert_eq!(viewer.lines()[1].rule_match_count(), 1);
}

#[test]
fn test_find_takes_precedence_over_rules() {
    let mut viewer = viewer_with("error in error_handler");
    viewer
        .set_highlight_rules(&[HighlightRule::new("error_handler")], true)
        .unwrap();
    assert_eq!(viewer.find("error", true, false).unwrap(), 2);

    // 第二个 error 与规则命中重叠，规则让位
    let segments: Vec<(&str, Option<usize>)> = viewer.lines()[0]
        .segments()
        .iter()
        .filter(|s| s.highlighted)
        .map(|s| (s.text.as_str(), s.rule))
        .collect();
    assert_eq!(segments, vec![("error", None), ("error", None)]);

    viewer.clear_highlights();
    assert_eq!(
        viewer.lines()[0].segments(),
        &[
            Segment {
                text: "error in ".to_string(),
                highlighted: false,
                rule: None,
            },
            Segment {
                text: "error_handler".to_string(),
                highlighted: true,
                rule: Some(0),
            },
        ]
    );
}

#[test]
fn test_rules_survive_loading_another_file() {
    let mut viewer = viewer_with("todo: first");
    viewer
        .set_highlight_rules(&[HighlightRule::new("todo")], false)
        .unwrap();

    viewer.load(LoadedFile::new(
        PathBuf::from("/tmp/other.txt"),
        "TODO: second".to_string(),
    ));
    assert_eq!(viewer.lines()[0].rule_match_count(), 1);

    viewer.clear_highlight_rules();
    assert_eq!(viewer.active_rule_count(), 0);
    assert_eq!(rendered_text(&viewer), vec!["TODO: second"]);
    assert!(!viewer.lines()[0].is_highlighted());
}

#[test]
fn test_invalid_rule_keeps_existing_rules() {
    let mut viewer = viewer_with("alpha beta");
    viewer
        .set_highlight_rules(&[HighlightRule::new("alpha")], true)
        .unwrap();
    let before = viewer.lines().to_vec();

    let bad = [
        HighlightRule::new("beta"),
        HighlightRule::new("(oops").use_regex(true),
    ];
    assert!(viewer.set_highlight_rules(&bad, true).is_err());
    assert_eq!(viewer.active_rule_count(), 1);
    assert_eq!(viewer.lines(), before.as_slice());
}

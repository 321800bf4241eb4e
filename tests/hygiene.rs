//! Hygiene budgets for production sources under `src/`.
//!
//! Each pattern has a ceiling (zero everywhere today). Test files
//! (`*_test.rs`) are exempt. The ceilings only ever go down.

use std::fs;
use std::path::{Path, PathBuf};

struct SourceFile {
    path: PathBuf,
    content: String,
}

fn source_files() -> Vec<SourceFile> {
    let mut files = Vec::new();
    walk(Path::new(env!("CARGO_MANIFEST_DIR")).join("src").as_path(), &mut files);
    assert!(!files.is_empty(), "no sources found under src/");
    files
}

fn walk(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for path in entries.flatten().map(|e| e.path()) {
        if path.is_dir() {
            walk(&path, out);
            continue;
        }
        let is_rs = path.extension().is_some_and(|e| e == "rs");
        let is_test = path.to_string_lossy().ends_with("_test.rs");
        if is_rs && !is_test {
            if let Ok(content) = fs::read_to_string(&path) {
                out.push(SourceFile { path, content });
            }
        }
    }
}

/// Assert that `pattern` appears on at most `max` lines across production sources.
fn budget(pattern: &str, max: usize) {
    let hits: Vec<(String, usize)> = source_files()
        .iter()
        .filter_map(|file| {
            let n = file.content.lines().filter(|l| l.contains(pattern)).count();
            (n > 0).then(|| (file.path.display().to_string(), n))
        })
        .collect();
    let found: usize = hits.iter().map(|(_, n)| n).sum();
    let listing: Vec<String> = hits.iter().map(|(p, n)| format!("  {p}: {n}")).collect();
    assert!(
        found <= max,
        "`{pattern}` budget exceeded: found {found}, max {max}.\n{}",
        listing.join("\n")
    );
}

// Panics.

#[test]
fn unwrap_budget() {
    budget(".unwrap()", 0);
}

#[test]
fn expect_budget() {
    budget(".expect(", 0);
}

#[test]
fn panic_budget() {
    budget("panic!(", 0);
}

#[test]
fn unreachable_budget() {
    budget("unreachable!(", 0);
}

#[test]
fn todo_budget() {
    budget("todo!(", 0);
}

#[test]
fn unimplemented_budget() {
    budget("unimplemented!(", 0);
}

// Silently dropped errors.

#[test]
fn silent_discard_budget() {
    budget("let _ =", 0);
}

#[test]
fn dot_ok_budget() {
    budget(".ok()", 0);
}

// Structure.

#[test]
fn allow_dead_code_budget() {
    budget("#[allow(dead_code)]", 0);
}

#[test]
fn print_budget() {
    budget("println!(", 0);
    budget("eprintln!(", 0);
}

#[test]
fn blocking_sleep_budget() {
    budget("std::thread::sleep", 0);
}

//! Sequence discovery backend
//!
//! Builds the ordered page sequence from a directory walk (ignore crate) or a
//! manifest file listing one identifier per line.

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use crate::core::model::{Meta, ResultItem, ResultSet, SourceMode};
use crate::core::paths::{is_config_path, make_relative};
use crate::core::render::{RenderConfig, Renderer};
use crate::core::util::{get_file_size, get_mtime_ms};
use crate::sources::FileSource;

/// How to build the page sequence
#[derive(Debug, Clone, Default)]
pub struct SequenceOptions {
    /// Read identifiers from this file instead of scanning
    pub manifest: Option<PathBuf>,

    /// Keep only files with these extensions (case-insensitive, no dot)
    pub extensions: Vec<String>,

    /// Include hidden files
    pub hidden: bool,
}

/// Page sequence plus where it came from
#[derive(Debug, Clone)]
pub struct Sequence {
    pub identifiers: Vec<String>,
    pub source_mode: SourceMode,
}

/// Scan `root` for page files in natural order
pub fn scan_sequence(root: &Path, options: &SequenceOptions) -> Result<Vec<String>> {
    let mut builder = WalkBuilder::new(root);
    builder.hidden(!options.hidden);

    let extensions: Vec<String> = options
        .extensions
        .iter()
        .map(|e| e.trim_start_matches('.').to_lowercase())
        .collect();

    let mut identifiers = Vec::new();
    for entry in builder.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };

        let path = entry.path();
        if path.is_dir() {
            continue;
        }

        if !extensions.is_empty() {
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_lowercase());
            match ext {
                Some(ext) if extensions.contains(&ext) => {}
                _ => continue,
            }
        }

        let relative = match make_relative(path, root) {
            Some(r) => r,
            None => continue,
        };
        if is_config_path(&relative) {
            continue;
        }

        identifiers.push(relative);
    }

    identifiers.sort_by(|a, b| natural_cmp(a, b));
    Ok(identifiers)
}

/// Read a manifest: one identifier per line, blank lines and `#` comments skipped
pub fn read_manifest(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {:?}", path))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Load the sequence described by `options`
pub fn load_sequence(root: &Path, options: &SequenceOptions) -> Result<Sequence> {
    match &options.manifest {
        Some(manifest) => {
            let path = if manifest.is_absolute() {
                manifest.clone()
            } else {
                root.join(manifest)
            };
            Ok(Sequence {
                identifiers: read_manifest(&path)?,
                source_mode: SourceMode::Manifest,
            })
        }
        None => Ok(Sequence {
            identifiers: scan_sequence(root, options)?,
            source_mode: SourceMode::Scan,
        }),
    }
}

/// Compare strings treating runs of ASCII digits as numbers, so `p2` sorts before `p10`
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let ln = take_number(&mut left);
                let rn = take_number(&mut right);
                let ord = ln
                    .trim_start_matches('0')
                    .len()
                    .cmp(&rn.trim_start_matches('0').len())
                    .then_with(|| ln.trim_start_matches('0').cmp(rn.trim_start_matches('0')));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(l), Some(r)) => {
                if l != r {
                    return l.cmp(&r);
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }
    digits
}

/// Run the list command
pub fn run_list(root: &Path, options: &SequenceOptions, render_config: RenderConfig) -> Result<()> {
    let sequence = load_sequence(root, options)?;
    let files = FileSource::new(root);

    let mut result_set = ResultSet::new();
    for (index, identifier) in sequence.identifiers.iter().enumerate() {
        let mut item = ResultItem::page(index, identifier.as_str(), sequence.source_mode);

        // size and mtime only for things that are actually local files
        let path = files.locate(identifier);
        if path.is_file() {
            let mut meta = Meta::default();
            if let Ok(size) = get_file_size(&path) {
                meta.size = Some(size);
            }
            if let Ok(mtime) = get_mtime_ms(&path) {
                meta.mtime_ms = Some(mtime);
            }
            item = item.with_meta(meta);
        }

        result_set.push(item);
    }

    let renderer = Renderer::with_config(render_config);
    println!("{}", renderer.render(&result_set));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::tempdir;

    #[test]
    fn test_natural_cmp() {
        let mut names = vec!["p10.png", "p2.png", "p1.png", "p02.png", "a.png"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["a.png", "p1.png", "p02.png", "p2.png", "p10.png"]);
    }

    #[test]
    fn test_natural_cmp_nested_dirs() {
        assert_eq!(natural_cmp("ch2/p9.png", "ch10/p1.png"), Ordering::Less);
        assert_eq!(natural_cmp("ch1/p9.png", "ch1/p10.png"), Ordering::Less);
    }

    #[test]
    fn test_scan_empty_dir() {
        let temp = tempdir().unwrap();
        let result = scan_sequence(temp.path(), &SequenceOptions::default()).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_scan_orders_pages_naturally() {
        let temp = tempdir().unwrap();
        for name in ["10.png", "2.png", "1.png"] {
            File::create(temp.path().join(name)).unwrap();
        }
        fs::create_dir(temp.path().join("extra")).unwrap();
        File::create(temp.path().join("extra/3.png")).unwrap();

        let result = scan_sequence(temp.path(), &SequenceOptions::default()).unwrap();
        assert_eq!(result, vec!["1.png", "2.png", "10.png", "extra/3.png"]);
    }

    #[test]
    fn test_scan_filters_extensions() {
        let temp = tempdir().unwrap();
        File::create(temp.path().join("1.png")).unwrap();
        File::create(temp.path().join("2.JPG")).unwrap();
        File::create(temp.path().join("notes.txt")).unwrap();

        let options = SequenceOptions {
            extensions: vec!["png".to_string(), ".jpg".to_string()],
            ..Default::default()
        };
        let result = scan_sequence(temp.path(), &options).unwrap();
        assert_eq!(result, vec!["1.png", "2.JPG"]);
    }

    #[test]
    fn test_scan_skips_config_dir_even_when_hidden() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join(".readahead")).unwrap();
        fs::write(temp.path().join(".readahead/config.json"), "{}").unwrap();
        File::create(temp.path().join(".cover.png")).unwrap();

        let options = SequenceOptions {
            hidden: true,
            ..Default::default()
        };
        let result = scan_sequence(temp.path(), &options).unwrap();
        assert_eq!(result, vec![".cover.png"]);
    }

    #[test]
    fn test_read_manifest() {
        let temp = tempdir().unwrap();
        let manifest = temp.path().join("pages.txt");
        fs::write(&manifest, "# volume 1\n001.png\n\n  002.png  \nmem://cover\n").unwrap();

        let ids = read_manifest(&manifest).unwrap();
        assert_eq!(ids, vec!["001.png", "002.png", "mem://cover"]);
    }

    #[test]
    fn test_load_sequence_prefers_manifest() {
        let temp = tempdir().unwrap();
        File::create(temp.path().join("a.png")).unwrap();
        fs::write(temp.path().join("list.txt"), "z.png\n").unwrap();

        let options = SequenceOptions {
            manifest: Some(PathBuf::from("list.txt")),
            ..Default::default()
        };
        let sequence = load_sequence(temp.path(), &options).unwrap();
        assert_eq!(sequence.identifiers, vec!["z.png"]);
        assert_eq!(sequence.source_mode, SourceMode::Manifest);
    }
}

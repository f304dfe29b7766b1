//! Filesystem expansion of include patterns

use globset::GlobBuilder;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

const GLOB_CHARS: &[char] = &['*', '?', '['];

fn has_glob_chars(component: &str) -> bool {
    component.contains(GLOB_CHARS)
}

/// Braces are ordinary characters in include patterns
fn escape_braces(component: &str) -> String {
    component.replace('{', "\\{").replace('}', "\\}")
}

/// Whether `candidate` passes through a dot-named entry that the pattern does
/// not spell out with a leading `.`
fn has_unrequested_hidden(candidate: &Path, rest: &[String], recursive: bool) -> bool {
    candidate.components().enumerate().any(|(i, component)| {
        if !component.as_os_str().to_string_lossy().starts_with('.') {
            return false;
        }
        let requested = if recursive {
            rest.iter().any(|part| part.starts_with('.'))
        } else {
            rest.get(i).is_some_and(|part| part.starts_with('.'))
        };
        !requested
    })
}

/// Expand a pattern to the existing paths it matches, in sorted order.
///
/// The leading components without glob metacharacters form the directory
/// that is walked; the remaining components bound the walk depth unless
/// they contain `**`. Wildcards skip dot-named entries, and `{` has no
/// special meaning.
pub fn expand(pattern: &str) -> Result<Vec<PathBuf>, globset::Error> {
    let path = Path::new(pattern);

    let mut base = PathBuf::new();
    let mut rest: Vec<String> = Vec::new();
    for component in path.components() {
        let text = component.as_os_str().to_string_lossy();
        if rest.is_empty() && !has_glob_chars(&text) {
            base.push(component);
        } else if !matches!(component, Component::CurDir) {
            rest.push(text.into_owned());
        }
    }

    if rest.is_empty() {
        return Ok(if path.symlink_metadata().is_ok() {
            vec![path.to_path_buf()]
        } else {
            Vec::new()
        });
    }

    let relative = rest
        .iter()
        .map(|part| escape_braces(part))
        .collect::<Vec<_>>()
        .join("/");
    let recursive = relative.contains("**");
    let matcher = GlobBuilder::new(&relative)
        .literal_separator(true)
        .backslash_escape(true)
        .build()?
        .compile_matcher();

    let implicit_base = base.as_os_str().is_empty();
    let root = if implicit_base { PathBuf::from(".") } else { base };

    let mut walker = WalkDir::new(&root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name();
    if !recursive {
        walker = walker.min_depth(rest.len()).max_depth(rest.len());
    }

    let matches = walker
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let candidate = entry.path().strip_prefix(&root).ok()?;
            if !matcher.is_match(candidate) || has_unrequested_hidden(candidate, &rest, recursive) {
                return None;
            }
            Some(if implicit_base {
                candidate.to_path_buf()
            } else {
                entry.path().to_path_buf()
            })
        })
        .collect();

    Ok(matches)
}

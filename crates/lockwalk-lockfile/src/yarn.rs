//! Yarn classic `yarn.lock` (lock file v1).
//!
//! ```text
//! "@babel/highlight@^7.10.4", "@babel/highlight@^7.12.13":
//!   version "7.12.13"
//!   resolved "https://registry.yarnpkg.com/@babel/highlight/-/highlight-7.12.13.tgz#8ab538393e00370b26271b01fa08f7f27f2e795c"
//!   integrity sha512-kocDQvIbgMKlWxXe9fof3TQ+gkIPOUSEYhJjqUjvKMez3krV7vbzYCDq39Oj11UAVK7JqPVGQPlgE85dPNlQLww==
//!   dependencies:
//!     chalk "^2.0.0"
//! ```
//!
//! Names and versions come from `yarn-lock-parser` when it accepts the file.
//! It has no descriptor lists, `resolved`, `integrity` or dependency blocks,
//! so a line reader supplies those and stands in alone when the library
//! rejects the file.
//!
//! Yarn berry files are YAML with a `__metadata` block and are not read.

use std::panic;
use std::path::Path;

use lockwalk_core::{normalize, FlatEntry, FlatStore};
use tracing::debug;

use crate::error::{read_to_string, LockfileError, Result};

pub fn load(path: &Path) -> Result<FlatStore> {
    parse(path, &read_to_string(path)?)
}

/// Parse lock file content. `path` is only used in errors.
pub fn parse(path: &Path, content: &str) -> Result<FlatStore> {
    if content.lines().any(|line| line.starts_with("__metadata:")) {
        return Err(LockfileError::Unsupported {
            path: path.to_path_buf(),
            detail: "Yarn berry lock files are not supported".to_string(),
        });
    }

    let mut records = read_records(path, content)?;
    let merged = merge_library(&mut records, library_entries(content));

    let mut store = FlatStore::new();
    for (descriptors, entry) in records {
        store.insert(descriptors, entry);
    }
    debug!(path = %path.display(), entries = store.len(), merged, "read yarn lock file");
    Ok(store)
}

/// A lock entry: every descriptor that points at it, and its fields.
type Record = (Vec<String>, FlatEntry);

/// Name and version of every entry as `yarn-lock-parser` reads them, or
/// `None` when it rejects the file. It panics on some valid lock files, so a
/// panic counts as a rejection.
fn library_entries(content: &str) -> Option<Vec<(String, String)>> {
    let lockfile = panic::catch_unwind(panic::AssertUnwindSafe(|| {
        yarn_lock_parser::parse_str(content)
    }))
    .ok()?
    .ok()?;
    Some(
        lockfile
            .entries
            .iter()
            .map(|entry| (entry.name.to_string(), entry.version.to_string()))
            .collect(),
    )
}

/// Take names and versions from the library when its entries line up with
/// the line reader's. Aliased entries keep the target name the line reader
/// derived from the descriptor. Returns whether the library's reading was
/// used.
fn merge_library(records: &mut [Record], library: Option<Vec<(String, String)>>) -> bool {
    let Some(library) = library else {
        debug!("yarn-lock-parser rejected the file, using the line reader");
        return false;
    };
    let lined_up = library.len() == records.len()
        && records
            .iter()
            .zip(&library)
            .all(|((descriptors, entry), (name, _))| is_aliased(descriptors) || entry.name == *name);
    if !lined_up {
        debug!(
            library = library.len(),
            lines = records.len(),
            "yarn-lock-parser entries do not line up, using the line reader"
        );
        return false;
    }
    for ((descriptors, entry), (name, version)) in records.iter_mut().zip(library) {
        if !is_aliased(descriptors) {
            entry.name = name;
        }
        entry.version = version;
    }
    true
}

fn is_aliased(descriptors: &[String]) -> bool {
    descriptors
        .first()
        .is_some_and(|d| split_descriptor(d).1.starts_with("npm:"))
}

/// Line-by-line reading of every entry, in file order.
fn read_records(path: &Path, content: &str) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    let mut current: Option<Record> = None;
    let mut section = Section::None;

    for (index, raw_line) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = raw_line.trim_end();
        if line.trim_start().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        let indent = line.len() - line.trim_start().len();
        let text = line.trim_start();
        let error = |detail: &str| LockfileError::parse(path, format!("line {line_no}: {detail}"));

        match indent {
            0 => {
                let header = text
                    .strip_suffix(':')
                    .ok_or_else(|| error("expected an entry header ending in ':'"))?;
                records.extend(current.take());
                let descriptors = parse_header(header).ok_or_else(|| error("malformed descriptor"))?;
                let entry = FlatEntry {
                    name: package_name(&descriptors[0]),
                    ..FlatEntry::default()
                };
                current = Some((descriptors, entry));
                section = Section::None;
            }
            2 => {
                let (_, entry) = current
                    .as_mut()
                    .ok_or_else(|| error("field outside of an entry"))?;
                if let Some(name) = text.strip_suffix(':') {
                    section = match unquote(name).as_str() {
                        "dependencies" => Section::Dependencies,
                        "optionalDependencies" => Section::Optional,
                        _ => Section::Ignored,
                    };
                    continue;
                }
                section = Section::None;
                let (key, value) = split_pair(text).ok_or_else(|| error("expected a key and a value"))?;
                match key.as_str() {
                    "version" => entry.version = value,
                    "resolved" => entry.resolved = Some(value),
                    "integrity" => entry.integrity = Some(value),
                    _ => {}
                }
            }
            _ => {
                let (_, entry) = current
                    .as_mut()
                    .ok_or_else(|| error("field outside of an entry"))?;
                let list = match section {
                    Section::Dependencies => &mut entry.dependencies,
                    Section::Optional => &mut entry.optional_dependencies,
                    Section::Ignored => continue,
                    Section::None => return Err(error("unexpected indentation")),
                };
                let pair = split_pair(text).ok_or_else(|| error("expected a name and a range"))?;
                list.push(pair);
            }
        }
    }
    records.extend(current.take());
    Ok(records)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Dependencies,
    Optional,
    Ignored,
}

/// `"a@^1.0.0", a@^1.1.0` → `["a@^1.0.0", "a@^1.1.0"]`.
fn parse_header(header: &str) -> Option<Vec<String>> {
    let descriptors: Vec<String> = header
        .split(", ")
        .map(|d| unquote(d.trim()))
        .filter(|d| !d.is_empty())
        .collect();
    if descriptors.is_empty() || descriptors.iter().any(|d| split_descriptor(d).1.is_empty()) {
        return None;
    }
    Some(descriptors)
}

/// Real package name behind a descriptor. Aliased descriptors
/// (`alias@npm:real@1.0.0`) name their target.
fn package_name(descriptor: &str) -> String {
    let (name, spec) = split_descriptor(descriptor);
    if spec.starts_with("npm:") {
        normalize(name, spec).name
    } else {
        name.to_string()
    }
}

/// Split at the first `@` that is not a scope marker.
fn split_descriptor(descriptor: &str) -> (&str, &str) {
    let at = descriptor
        .char_indices()
        .skip(1)
        .find(|&(_, c)| c == '@')
        .map(|(index, _)| index);
    match at {
        Some(index) => (&descriptor[..index], &descriptor[index + 1..]),
        None => (descriptor, ""),
    }
}

/// Read `key value` where either side may be double-quoted.
fn split_pair(text: &str) -> Option<(String, String)> {
    let (key, rest) = take_token(text)?;
    let (value, rest) = take_token(rest.trim_start())?;
    if !rest.trim().is_empty() {
        return None;
    }
    Some((key, value))
}

fn take_token(text: &str) -> Option<(String, &str)> {
    if let Some(quoted) = text.strip_prefix('"') {
        let mut out = String::new();
        let mut chars = quoted.char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => out.push(chars.next()?.1),
                '"' => return Some((out, &quoted[i + 1..])),
                c => out.push(c),
            }
        }
        None
    } else {
        let end = text.find(char::is_whitespace).unwrap_or(text.len());
        if end == 0 {
            return None;
        }
        Some((text[..end].to_string(), &text[end..]))
    }
}

fn unquote(text: &str) -> String {
    match take_token(text) {
        Some((token, rest)) if rest.trim().is_empty() => token,
        _ => text.to_string(),
    }
}

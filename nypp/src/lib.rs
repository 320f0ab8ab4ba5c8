use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use color_print::ceprintln;
use indexmap::IndexMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("could not open file for reading: {path}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Line-oriented textual expander. Directives are recognized one per line
/// at column 0 after leading whitespace:
///
/// - `include "path"`  — inline a file relative to the including file
/// - `include <path>`  — inline a file relative to `std/` at the project root
/// - `#define NAME value`
/// - `#ifndef NAME` … `#endif` (nesting supported)
///
/// Defined names and the built-in macros are replaced in ordinary lines by
/// whole-word match. Invalid directives warn on stderr and pass through
/// unchanged. A file with no directives is reproduced as-is, one trailing
/// newline per line.
pub struct Preprocessor {
    defines: IndexMap<String, String>,
}

impl Preprocessor {
    pub fn new() -> Self {
        let now = Local::now();
        let mut defines = IndexMap::new();
        defines.insert(
            "__DATE_TIME__".to_string(),
            format!("\"{}\"", now.format("%Y-%m-%d %H:%M:%S")),
        );
        defines.insert(
            "__DATE__".to_string(),
            format!("\"{}\"", now.format("%Y-%m-%d")),
        );
        defines.insert(
            "__TIME__".to_string(),
            format!("\"{}\"", now.format("%H:%M:%S")),
        );
        defines.insert("__VERSION__".to_string(), "\"0.1 beta\"".to_string());
        defines.insert(
            "__SYSTEM__".to_string(),
            format!("\"{}\"", system_name()),
        );
        Preprocessor { defines }
    }

    pub fn define(&mut self, name: &str, value: &str) {
        self.defines.insert(name.to_string(), value.to_string());
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.defines.contains_key(name)
    }

    /// Expand a whole file into `out`; includes resolve relative to the
    /// file's own directory.
    pub fn process_file(&mut self, path: &Path, out: &mut String) -> Result<(), PreprocessError> {
        let source = fs::read_to_string(path).map_err(|source| PreprocessError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        self.process_source(&source, &base_dir, out);
        Ok(())
    }

    pub fn process_source(&mut self, source: &str, base_dir: &Path, out: &mut String) {
        // One frame per open #ifndef; a frame is true when its body is
        // being skipped (already-defined guard, or a skipping parent).
        let mut guards: Vec<bool> = Vec::new();

        for line in source.lines() {
            let trimmed = line.trim_start();
            let skipping = guards.iter().any(|&skip| skip);

            if let Some(rest) = trimmed.strip_prefix("#ifndef") {
                let name = rest.trim();
                if name.is_empty() {
                    ceprintln!("<yellow,bold>warning</>: invalid directive: {}", line);
                    if !skipping {
                        out.push_str(line);
                        out.push('\n');
                    }
                    continue;
                }
                guards.push(skipping || self.is_defined(name));
                continue;
            }

            if trimmed.trim_end() == "#endif" {
                if guards.pop().is_none() {
                    ceprintln!("<yellow,bold>warning</>: '#endif' without matching '#ifndef'");
                    if !skipping {
                        out.push_str(line);
                        out.push('\n');
                    }
                }
                continue;
            }

            if skipping {
                continue;
            }

            if let Some(rest) = trimmed.strip_prefix("#define") {
                let rest = rest.trim();
                let mut parts = rest.splitn(2, char::is_whitespace);
                match parts.next().filter(|name| !name.is_empty()) {
                    Some(name) => {
                        let value = parts.next().unwrap_or("").trim().to_string();
                        self.defines.insert(name.to_string(), value);
                    }
                    None => {
                        ceprintln!("<yellow,bold>warning</>: invalid directive: {}", line);
                        out.push_str(line);
                        out.push('\n');
                    }
                }
                continue;
            }

            if let Some(rest) = trimmed.strip_prefix("include ") {
                match parse_include(rest.trim_start()) {
                    Some(Include::Local(path)) => {
                        self.inline_file(&base_dir.join(path), out);
                    }
                    Some(Include::Std(path)) => {
                        self.inline_file(&PathBuf::from("std").join(path), out);
                    }
                    None => {
                        ceprintln!("<yellow,bold>warning</>: invalid include directive: {}", line);
                        out.push_str(line);
                        out.push('\n');
                    }
                }
                continue;
            }

            out.push_str(&self.expand_line(line));
            out.push('\n');
        }
    }

    // Included files run through the full expander, so their own guards,
    // defines and nested includes work. A missing file is a warning, not a
    // hard error.
    fn inline_file(&mut self, path: &Path, out: &mut String) {
        if let Err(err) = self.process_file(path, out) {
            ceprintln!(
                "<yellow,bold>warning</>: could not find included file: {} ({})",
                path.display(),
                err
            );
        }
    }

    /// Replace defined names by whole-word match; word characters are
    /// `[A-Za-z0-9_]`, the same alphabet the compiler's lexer uses for
    /// identifiers.
    fn expand_line(&self, line: &str) -> String {
        let mut out = String::with_capacity(line.len());
        let mut chars = line.char_indices().peekable();
        while let Some((start, ch)) = chars.next() {
            if !ch.is_ascii_alphabetic() && ch != '_' {
                out.push(ch);
                continue;
            }
            let mut end = start + ch.len_utf8();
            while let Some(&(idx, next)) = chars.peek() {
                if next.is_ascii_alphanumeric() || next == '_' {
                    chars.next();
                    end = idx + next.len_utf8();
                } else {
                    break;
                }
            }
            let word = &line[start..end];
            match self.defines.get(word) {
                Some(value) => out.push_str(value),
                None => out.push_str(word),
            }
        }
        out
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

enum Include {
    Local(String),
    Std(String),
}

fn parse_include(rest: &str) -> Option<Include> {
    if let Some(inner) = rest.strip_prefix('"') {
        let end = inner.find('"')?;
        return Some(Include::Local(inner[..end].to_string()));
    }
    if let Some(inner) = rest.strip_prefix('<') {
        let end = inner.find('>')?;
        return Some(Include::Std(inner[..end].to_string()));
    }
    None
}

fn system_name() -> &'static str {
    if cfg!(target_os = "linux") {
        "Linux"
    } else if cfg!(target_os = "windows") {
        "Windows"
    } else if cfg!(target_os = "macos") {
        "macOS"
    } else {
        "Unknown"
    }
}

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, LineErrorKind, Result};
use crate::parser::{self, Rule};

/// Source access used by the tokenizer, so the pipeline can be driven from
/// disk, from memory or from a sandboxed host.
pub trait Filesystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// The real filesystem.
pub struct DiskFs;

impl Filesystem for DiskFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

/// An in-memory filesystem, for tests and embedding.
#[derive(Default)]
pub struct MemFs {
    files: HashMap<PathBuf, String>,
}

impl MemFs {
    pub fn new() -> MemFs {
        MemFs::default()
    }

    pub fn insert<P: Into<PathBuf>>(&mut self, path: P, source: &str) {
        self.files.insert(path.into(), source.to_string());
    }
}

impl Filesystem for MemFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }
}

/// One raw source line. The file basename doubles as the namespace of
/// every label and alias defined on the line.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceLine {
    pub file: String,
    pub line_no: u32,
    pub text: String,
}

struct Macro {
    params: usize,
    body: Vec<String>,
}

/// Flattens a source tree into one line stream: resolves `$include`
/// recursively, collects `$macro` definitions and expands their
/// invocations. Macros are global across all included files.
pub struct Tokenizer<'f> {
    fs: &'f dyn Filesystem,
    macros: HashMap<String, Macro>,
    namespaces: Vec<String>,
}

impl<'f> Tokenizer<'f> {
    pub fn new(fs: &'f dyn Filesystem) -> Tokenizer<'f> {
        Tokenizer {
            fs,
            macros: HashMap::new(),
            namespaces: Vec::new(),
        }
    }

    /// Namespaces of every file loaded so far, in load order.
    pub fn into_namespaces(self) -> Vec<String> {
        self.namespaces
    }

    /// Reads `filename` (relative to `dir`) and everything it includes.
    /// Re-including a namespace that is already loaded yields no lines.
    pub fn load(&mut self, dir: &Path, filename: &str) -> Result<Vec<SourceLine>> {
        let path = dir.join(filename);
        let basename = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => return Err(Error::File(path)),
        };
        let namespace = crate::symbols::namespace(&basename).to_string();

        let mut lines = Vec::new();
        if self.namespaces.contains(&namespace) {
            return Ok(lines);
        }
        self.namespaces.push(namespace);

        let source = match self.fs.read_to_string(&path) {
            Ok(source) => source,
            Err(_) => return Err(Error::File(path)),
        };
        let child_dir = path.parent().unwrap_or(dir).to_path_buf();

        lines.push(SourceLine {
            file: basename.clone(),
            line_no: 0,
            text: String::new(),
        });
        lines.push(SourceLine {
            file: basename.clone(),
            line_no: 0,
            text: format!(";############ File: {} ############", basename),
        });

        let mut capture: Option<String> = None;
        let mut line_no = 0;
        for raw in source.lines() {
            line_no += 1;
            let clean = raw.trim();
            let first = clean.split_whitespace().next().unwrap_or("");

            if first == "$include" {
                let tail = clean["$include".len()..].trim_start();
                let quoted = parser::parse_prefix(Rule::quoted, tail)
                    .ok_or_else(|| Error::line(&basename, line_no, LineErrorKind::IncludeSyntax))?;
                let target = quoted.into_inner().next().map(|p| p.as_str()).unwrap_or("");
                let nested = self.load(&child_dir, target)?;
                lines.extend(nested);
                continue;
            }
            if let Some(name) = capture.as_ref() {
                if first == "$endmacro" {
                    capture = None;
                } else if let Some(mac) = self.macros.get_mut(name) {
                    mac.body.push(raw.to_string());
                }
                continue;
            }
            if first == "$macro" {
                let tail = clean["$macro".len()..].trim();
                let sig = parser::parse_exact(Rule::macro_sig, tail)
                    .ok_or_else(|| Error::line(&basename, line_no, LineErrorKind::MacroSyntax))?;
                let mut inner = sig.into_inner();
                let name = match inner.next() {
                    Some(ident) => ident.as_str().to_string(),
                    None => {
                        return Err(Error::line(&basename, line_no, LineErrorKind::MacroSyntax))
                    }
                };
                let params = inner
                    .next()
                    .and_then(|digit| digit.as_str().parse().ok())
                    .unwrap_or(0);
                self.macros.insert(
                    name.clone(),
                    Macro {
                        params,
                        body: Vec::new(),
                    },
                );
                capture = Some(name);
                lines.push(SourceLine {
                    file: basename.clone(),
                    line_no,
                    text: format!("; {}", raw),
                });
                continue;
            }
            if self.macros.contains_key(first) {
                lines.extend(self.expand(&basename, line_no, clean, first)?);
                continue;
            }
            lines.push(SourceLine {
                file: basename.clone(),
                line_no,
                text: raw.to_string(),
            });
        }

        if let Some(name) = capture {
            return Err(Error::line(
                &basename,
                line_no,
                LineErrorKind::UnterminatedMacro(name),
            ));
        }
        Ok(lines)
    }

    /// Expands one macro invocation. Arguments replace `%1`..`%9` textually;
    /// the produced lines carry the caller's file and line number and are
    /// not scanned for further invocations.
    fn expand(
        &self,
        file: &str,
        line_no: u32,
        clean: &str,
        name: &str,
    ) -> Result<Vec<SourceLine>> {
        let mac = &self.macros[name];
        let args: Vec<&str> = clean.split_whitespace().skip(1).collect();
        if args.len() != mac.params {
            return Err(Error::line(
                file,
                line_no,
                LineErrorKind::MacroArity {
                    name: name.to_string(),
                    expected: mac.params,
                    found: args.len(),
                },
            ));
        }
        let mut out = Vec::with_capacity(mac.body.len());
        for body_line in &mac.body {
            let mut text = body_line.clone();
            for (i, arg) in args.iter().enumerate() {
                text = text.replace(&format!("%{}", i + 1), arg);
            }
            out.push(SourceLine {
                file: file.to_string(),
                line_no,
                text,
            });
        }
        Ok(out)
    }
}

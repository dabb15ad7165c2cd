//! Unit loader.
//!
//! Resolves a `uses` name to a source file by probing a fixed list of
//! directories for `<name>.pas`, `.pp` or `.p` with a case-insensitive
//! stem match, parses it, and caches the parsed unit. Loads are
//! idempotent: a unit named twice is parsed once.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use tpc_par::{Module, Parser, Unit};
use tpc_util::{FileId, FxHashMap, Handler, SourceMap, Span, Stage};

/// Candidate extensions, probed in order.
const UNIT_EXTENSIONS: [&str; 3] = ["pas", "pp", "p"];

/// Loads and caches unit sources.
pub struct UnitLoader {
    /// Directories probed in order.
    search_dirs: Vec<PathBuf>,
    /// Parsed units by lowercased name.
    cache: FxHashMap<String, Rc<Unit>>,
}

impl UnitLoader {
    /// Creates a loader over the given search directories.
    pub fn new(search_dirs: Vec<PathBuf>) -> Self {
        Self {
            search_dirs,
            cache: FxHashMap::default(),
        }
    }

    /// The default search path for a program at `input`: its directory,
    /// `./units`, the parent, and `../units`.
    pub fn default_search_dirs(input: &Path) -> Vec<PathBuf> {
        let base = input.parent().unwrap_or(Path::new(".")).to_path_buf();
        vec![
            base.clone(),
            base.join("units"),
            base.join(".."),
            base.join("..").join("units"),
        ]
    }

    /// Loads a unit by name, parsing it on first use.
    ///
    /// Parse diagnostics land in `handler` under their own stages; a
    /// missing file is reported as a unit error at `span`. `next_node_id`
    /// is advanced so unit expressions share the compilation's node-id
    /// space.
    pub fn load(
        &mut self,
        name: &str,
        span: Span,
        sources: &mut SourceMap,
        handler: &Handler,
        next_node_id: &mut u32,
    ) -> Option<Rc<Unit>> {
        let key = name.to_ascii_lowercase();
        if let Some(unit) = self.cache.get(&key) {
            return Some(unit.clone());
        }

        let Some(path) = self.find_unit_file(&key) else {
            handler.error(
                Stage::Unit,
                format!("unit '{}' not found on the search path", name),
                span,
            );
            return None;
        };

        let file_id = match sources.load_file(&path) {
            Ok(id) => id,
            Err(err) => {
                handler.error(Stage::Unit, err.to_string(), span);
                return None;
            }
        };

        let unit = self.parse_unit(name, span, file_id, sources, handler, next_node_id)?;
        let unit = Rc::new(unit);
        self.cache.insert(key, unit.clone());
        Some(unit)
    }

    fn parse_unit(
        &self,
        name: &str,
        span: Span,
        file_id: FileId,
        sources: &SourceMap,
        handler: &Handler,
        next_node_id: &mut u32,
    ) -> Option<Unit> {
        let source = &sources.get(file_id)?.content;
        let tokens = tpc_lex::tokenize(source, handler, file_id);
        let mut parser = Parser::with_node_offset(tokens, handler, *next_node_id);
        let module = parser.parse_module();
        *next_node_id = parser.node_count();

        match module {
            Module::Unit(unit) => {
                if !unit.name.eq_ignore_ascii_case(name) {
                    handler.error(
                        Stage::Unit,
                        format!("file declares unit '{}', expected '{}'", unit.name, name),
                        span,
                    );
                }
                Some(unit)
            }
            Module::Program(_) => {
                handler.error(
                    Stage::Unit,
                    format!("'{}' is a program, not a unit", name),
                    span,
                );
                None
            }
        }
    }

    /// Probes the search directories for a file whose stem matches the
    /// lowercased unit name and whose extension is one of the unit
    /// extensions.
    fn find_unit_file(&self, lower_name: &str) -> Option<PathBuf> {
        for dir in &self.search_dirs {
            // Exact lowercased name first, the cheap common case.
            for ext in UNIT_EXTENSIONS {
                let candidate = dir.join(format!("{}.{}", lower_name, ext));
                if candidate.is_file() {
                    return Some(candidate);
                }
            }

            // Otherwise scan the directory for a case-insensitive match.
            let Ok(entries) = std::fs::read_dir(dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                let stem_matches = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(|s| s.eq_ignore_ascii_case(lower_name))
                    .unwrap_or(false);
                let ext_matches = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| UNIT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                    .unwrap_or(false);
                if stem_matches && ext_matches {
                    return Some(path);
                }
            }
        }
        None
    }
}

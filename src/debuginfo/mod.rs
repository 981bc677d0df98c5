// This file is part of mos6502dbg.
// Licensed under the GNU Lesser General Public License, v3.0 or later.
// See LICENSE or <https://www.gnu.org/licenses/lgpl-3.0.html> for details.

//! The cc65 `.dbg` debug-info model: parser, derived indices, and query surface.
//!
//! All debug-info is loaded once at session start and is immutable thereafter. The module is
//! split one file per concern: entity types in [`model`], record parsing in [`parser`], the
//! interval index in [`interval`], and the query surface here.

mod interval;
mod model;
mod parser;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub use model::{CSymbol, File, Library, Line, Module, Scope, Segment, StorageClass, Symbol, TypeInfo};
pub use parser::DebugInfoError;

use interval::IntervalIndex;
use model::RawTables;

/// A fully parsed and indexed `.dbg` file.
pub struct DebugInfo {
    tables: RawTables,
    interval_index: IntervalIndex,
    /// span id -> indices into `tables.lines`.
    span_to_lines: HashMap<u32, Vec<usize>>,
    /// span id -> scope ids attached to it.
    span_to_scopes: HashMap<u32, Vec<u32>>,
    /// symbol name -> symbol id, for `evaluate`
    name_to_symbol: HashMap<String, u32>,
}

impl DebugInfo {
    /// Parses `text` one line at a time. Malformed records are skipped with a `warn`-level
    /// log line carrying the line number and raw text; the function itself
    /// never fails.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut tables = RawTables::default();
        for (i, raw_line) in text.lines().enumerate() {
            let line_no = i + 1;
            match parser::parse_line(line_no, raw_line) {
                Ok(Some(record)) => {
                    if let Err(err) = parser::apply_record(&mut tables, line_no, &record) {
                        log::warn!("mos6502dbg: skipping malformed .dbg record at line {line_no}: {err} ({raw_line:?})");
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    log::warn!("mos6502dbg: skipping malformed .dbg record at line {line_no}: {err} ({raw_line:?})");
                }
            }
        }
        Self::finalize(tables)
    }

    fn finalize(mut tables: RawTables) -> Self {
        // (a) compute each span's abs_start from its segment.
        let starts: HashMap<u32, u32> = tables.segments.values().map(|s| (s.id, s.start)).collect();
        for span in tables.spans.values_mut() {
            if let Some(&seg_start) = starts.get(&span.seg_id) {
                span.abs_start = seg_start + span.start_off;
            }
        }

        // (b) build the interval index.
        let span_refs: Vec<&model::Span> = tables.spans.values().collect();
        let interval_index = IntervalIndex::build(&span_refs);

        // line -> span attachment, inverted to span -> line indices.
        let mut span_to_lines: HashMap<u32, Vec<usize>> = HashMap::new();
        for (i, line) in tables.lines.iter().enumerate() {
            for &span_id in &line.span_ids {
                span_to_lines.entry(span_id).or_default().push(i);
            }
        }

        // (c) span -> scope map.
        let mut span_to_scopes: HashMap<u32, Vec<u32>> = HashMap::new();
        for scope in tables.scopes.values() {
            for &span_id in &scope.span_ids {
                span_to_scopes.entry(span_id).or_default().push(scope.id);
            }
        }

        // (d) mark every file whose owning module is a library as is_library.
        let library_file_ids: std::collections::HashSet<u32> = tables
            .modules
            .values()
            .filter(|m| m.lib_id.is_some())
            .map(|m| m.file_id)
            .collect();
        for file in tables.files.values_mut() {
            if library_file_ids.contains(&file.id) {
                file.is_library = true;
            }
        }

        let name_to_symbol = tables.symbols.values().map(|s| (s.name.clone(), s.id)).collect();

        Self { tables, interval_index, span_to_lines, span_to_scopes, name_to_symbol }
    }

    #[must_use]
    pub fn file(&self, id: u32) -> Option<&File> {
        self.tables.files.get(&id)
    }

    #[must_use]
    pub fn segment(&self, id: u32) -> Option<&Segment> {
        self.tables.segments.get(&id)
    }

    #[must_use]
    pub fn span(&self, id: u32) -> Option<&model::Span> {
        self.tables.spans.get(&id)
    }

    /// Every span id containing `addr`, most specific (smallest) first.
    #[must_use]
    pub fn spans_containing(&self, addr: u16) -> Vec<u32> {
        let mut ids = self.interval_index.spans_containing(addr as u32);
        ids.sort_by_key(|id| self.tables.spans.get(id).map_or(u32::MAX, |s| s.size));
        ids
    }

    /// The preferred symbol at exactly `addr`: `lab` over `equ`, then symbols carrying a
    /// segment id over those without one.
    #[must_use]
    pub fn symbol_for(&self, addr: u16) -> Option<&Symbol> {
        self.tables
            .symbols
            .values()
            .filter(|s| s.addr == addr as u32)
            .max_by_key(|s| (s.sym_type.as_deref() == Some("lab"), s.seg_id.is_some()))
    }

    #[must_use]
    pub fn symbol_by_name(&self, name: &str) -> Option<&Symbol> {
        self.name_to_symbol.get(name).and_then(|id| self.tables.symbols.get(id))
    }

    /// The first file whose `name` matches exactly, for embedders resolving source paths
    /// to `File` ids before arming breakpoints.
    #[must_use]
    pub fn file_by_name(&self, name: &str) -> Option<&File> {
        self.tables.files.values().find(|f| f.name == name)
    }

    /// The start address of every span attached to `(file_id, line)`: the breakpoint
    /// addresses a line-based breakpoint arms. A line with no spans (e.g. a blank or
    /// comment-only source line) yields no addresses.
    #[must_use]
    pub fn addresses_for_line(&self, file_id: u32, line: u32) -> Vec<u16> {
        self.tables
            .lines
            .iter()
            .filter(|l| l.file_id == file_id && l.line == line)
            .flat_map(|l| l.span_ids.iter().filter_map(|id| self.tables.spans.get(id)))
            .map(|s| s.abs_start as u16)
            .collect()
    }

    /// Among spans containing `addr`, collects the candidate lines attached to the smallest
    /// containing span, then prefers a C (`type == 1`) line, else the first one.
    #[must_use]
    pub fn line_for(&self, addr: u16) -> Option<&Line> {
        for span_id in self.spans_containing(addr) {
            let Some(indices) = self.span_to_lines.get(&span_id) else { continue };
            if indices.is_empty() {
                continue;
            }
            let best = indices
                .iter()
                .copied()
                .find(|&i| self.tables.lines[i].is_c())
                .unwrap_or(indices[0]);
            return Some(&self.tables.lines[best]);
        }
        None
    }

    /// The full sorted candidate list, most specific span first (used by the disassembler
    /// and UI source views that want every attached line, not just the winning one).
    #[must_use]
    pub fn all_lines_for(&self, addr: u16) -> Vec<&Line> {
        let mut out = Vec::new();
        for span_id in self.spans_containing(addr) {
            if let Some(indices) = self.span_to_lines.get(&span_id) {
                out.extend(indices.iter().map(|&i| &self.tables.lines[i]));
            }
        }
        out
    }

    /// Scopes attached to the most specific span (containing `addr`) that has any scope
    /// attachment at all.
    #[must_use]
    pub fn scopes_for(&self, addr: u16) -> Vec<&Scope> {
        for span_id in self.spans_containing(addr) {
            if let Some(ids) = self.span_to_scopes.get(&span_id) {
                if !ids.is_empty() {
                    return ids.iter().filter_map(|id| self.tables.scopes.get(id)).collect();
                }
            }
        }
        Vec::new()
    }

    /// Walks `scope.parent_id` upward from `leaf`, innermost first.
    #[must_use]
    pub fn scope_chain(&self, leaf: u32) -> Vec<&Scope> {
        let mut chain = Vec::new();
        let mut current = Some(leaf);
        while let Some(id) = current {
            let Some(scope) = self.tables.scopes.get(&id) else { break };
            chain.push(scope);
            current = scope.parent_id;
        }
        chain
    }

    #[must_use]
    pub fn variables_for(&self, scope_id: u32) -> Vec<&CSymbol> {
        self.tables.csymbols.values().filter(|c| c.scope_id == scope_id).collect()
    }

    /// The scope's declared size, or (if absent) the sum of positive-offset `auto`
    /// `CSymbol`s — used to infer the frame-pointer-addressed slot
    #[must_use]
    pub fn frame_size(&self, scope_id: u32) -> u32 {
        if let Some(size) = self.tables.scopes.get(&scope_id).and_then(|s| s.size) {
            return size;
        }
        self.variables_for(scope_id)
            .iter()
            .filter(|c| c.storage_class == StorageClass::Auto && c.offset > 0)
            .map(|c| c.offset as u32)
            .sum()
    }

    #[must_use]
    pub fn type_info(&self, id: u32) -> Option<&TypeInfo> {
        self.tables.types.get(&id)
    }

    #[must_use]
    pub fn module(&self, id: u32) -> Option<&Module> {
        self.tables.modules.get(&id)
    }
}

/// Tries `prog_path + ".dbg"`, then (if an extension is present) `prog_path` with its
/// extension replaced by `.dbg`; returns the first that exists.
#[must_use]
pub fn resolve_debug_file(prog_path: &Path) -> Option<PathBuf> {
    let with_suffix = {
        let mut s = prog_path.as_os_str().to_os_string();
        s.push(".dbg");
        PathBuf::from(s)
    };
    if with_suffix.exists() {
        return Some(with_suffix);
    }

    if prog_path.extension().is_some() {
        let replaced = prog_path.with_extension("dbg");
        if replaced.exists() {
            return Some(replaced);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
file id=1,name="test.c",size=100
seg id=1,name="CODE",start=0x1000,size=256
span id=1,seg=1,start=0,size=100
span id=2,seg=1,start=50,size=10
line file=1,line=10,span=1
line file=1,line=20,span=2
"#;

    #[test]
    fn span_lookup_scenario_from_spec() {
        let debug = DebugInfo::parse(SAMPLE);
        assert_eq!(debug.line_for(0x1032).unwrap().line, 20);
        assert_eq!(debug.line_for(0x1010).unwrap().line, 10);
        assert_eq!(debug.line_for(0x1050).unwrap().line, 10);
    }

    #[test]
    fn scope_chain_walks_to_root() {
        let text = r#"
scope id=1,name="file_scope"
scope id=2,name="func",parent=1,type=scope
"#;
        let debug = DebugInfo::parse(text);
        let chain = debug.scope_chain(2);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].id, 2);
        assert_eq!(chain[1].id, 1);
    }

    #[test]
    fn addresses_for_line_resolves_via_file_name() {
        let debug = DebugInfo::parse(SAMPLE);
        let file = debug.file_by_name("test.c").unwrap();
        assert_eq!(debug.addresses_for_line(file.id, 20), vec![0x1032]);
        assert_eq!(debug.addresses_for_line(file.id, 10), vec![0x1000]);
        assert!(debug.addresses_for_line(file.id, 999).is_empty());
    }

    #[test]
    fn library_flag_propagates_from_module_to_file() {
        let text = r#"
file id=1,name="stdio.c",size=10
lib id=1,name="libc.a"
mod id=1,name="stdio",file=1,lib=1
"#;
        let debug = DebugInfo::parse(text);
        assert!(debug.file(1).unwrap().is_library);
    }

    #[test]
    fn unknown_record_kind_does_not_abort_parsing() {
        let text = "weirdkind foo=1\nfile id=1,name=\"a.c\",size=5\n";
        let debug = DebugInfo::parse(text);
        assert_eq!(debug.file(1).unwrap().name, "a.c");
    }

    #[test]
    fn malformed_record_is_skipped_not_fatal() {
        let text = "file id=1\nfile id=2,name=\"b.c\",size=5\n";
        let debug = DebugInfo::parse(text);
        assert!(debug.file(1).is_none());
        assert_eq!(debug.file(2).unwrap().name, "b.c");
    }
}

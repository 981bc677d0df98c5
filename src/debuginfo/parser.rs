// This file is part of mos6502dbg.
// Licensed under the GNU Lesser General Public License, v3.0 or later.
// See LICENSE or <https://www.gnu.org/licenses/lgpl-3.0.html> for details.

//! Parses the cc65 `.dbg` line-oriented `kind key=value,...` record grammar.
//!
//! Parsing is kept isolated from indexing, which lives in `mod.rs`: this file only turns
//! text lines into typed [`Record`]s and applies them to the raw tables.

use std::collections::HashMap;

use thiserror::Error;

use super::model::*;

/// Raised per-record by the low-level parse step; the top-level [`super::DebugInfo::parse`]
/// entry point never returns this — it logs a `warn` and skips the record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DebugInfoError {
    #[error("line {line}: missing record kind")]
    MissingKind { line: usize },
    #[error("line {line}: malformed property list")]
    MalformedProperties { line: usize },
    #[error("line {line}: missing required key `{key}`")]
    MissingKey { line: usize, key: &'static str },
    #[error("line {line}: value for `{key}` is not a valid number")]
    NotANumber { line: usize, key: &'static str },
}

/// One parsed record: its kind and its key -> raw value map, in source order.
pub struct Record {
    pub kind: String,
    pub props: HashMap<String, String>,
}

/// Splits one `.dbg` line into a [`Record`]. Returns `None` for blank lines.
pub fn parse_line(line: usize, text: &str) -> Result<Option<Record>, DebugInfoError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    let (kind, rest) = text.split_once(char::is_whitespace).ok_or(DebugInfoError::MissingKind { line })?;
    let props = split_properties(rest).ok_or(DebugInfoError::MalformedProperties { line })?;

    let mut map = HashMap::new();
    for (key, value) in props {
        map.insert(key.to_string(), value.to_string());
    }

    Ok(Some(Record { kind: kind.to_string(), props: map }))
}

/// Splits `key=value,key=value,...` on top-level commas, respecting double-quoted values.
fn split_properties(rest: &str) -> Option<Vec<(&str, &str)>> {
    let mut props = Vec::new();
    let mut depth_quote = false;
    let mut start = 0;
    let bytes = rest.as_bytes();
    let mut i = 0;
    while i <= bytes.len() {
        let at_end = i == bytes.len();
        let is_comma = !at_end && bytes[i] == b',' && !depth_quote;
        if !at_end && bytes[i] == b'"' {
            depth_quote = !depth_quote;
        }
        if is_comma || at_end {
            let field = &rest[start..i];
            let (key, value) = field.split_once('=')?;
            props.push((key.trim(), value.trim()));
            start = i + 1;
        }
        i += 1;
    }
    Some(props)
}

/// Unquotes a double-quoted value, or returns it verbatim if it was not quoted.
fn unquote(value: &str) -> String {
    value.strip_prefix('"').and_then(|v| v.strip_suffix('"')).unwrap_or(value).to_string()
}

/// Parses a single numeric atom: decimal, or `0x`-prefixed hex.
fn parse_number(value: &str) -> Option<u32> {
    if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        value.parse().ok()
    }
}

/// Parses a signed numeric atom (used for `CSymbol::offset`).
fn parse_signed(value: &str) -> Option<i32> {
    if let Some(rest) = value.strip_prefix('-') {
        parse_number(rest).map(|v| -(v as i32))
    } else {
        parse_number(value).map(|v| v as i32)
    }
}

/// Parses a `N+M+...` list of plus-joined numeric atoms (span ids, member ids).
fn parse_id_list(value: &str) -> Vec<u32> {
    value.split('+').filter_map(parse_number).collect()
}

fn required<'a>(record: &'a Record, line: usize, key: &'static str) -> Result<&'a str, DebugInfoError> {
    record.props.get(key).map(String::as_str).ok_or(DebugInfoError::MissingKey { line, key })
}

fn required_num(record: &Record, line: usize, key: &'static str) -> Result<u32, DebugInfoError> {
    let raw = required(record, line, key)?;
    parse_number(raw).ok_or(DebugInfoError::NotANumber { line, key })
}

/// Applies one parsed [`Record`] to `tables`. Unknown kinds are silently skipped
///
pub fn apply_record(tables: &mut RawTables, line: usize, record: &Record) -> Result<(), DebugInfoError> {
    match record.kind.as_str() {
        "file" => {
            let id = required_num(record, line, "id")?;
            let name = unquote(required(record, line, "name")?);
            let size = required_num(record, line, "size")?;
            tables.files.insert(id, File { id, name, size, is_library: false });
        }
        "seg" => {
            let id = required_num(record, line, "id")?;
            let name = unquote(required(record, line, "name")?);
            let start = required_num(record, line, "start")?;
            let size = required_num(record, line, "size")?;
            tables.segments.insert(id, Segment { id, name, start, size });
        }
        "span" => {
            let id = required_num(record, line, "id")?;
            let seg_id = required_num(record, line, "seg")?;
            let start_off = required_num(record, line, "start")?;
            let size = required_num(record, line, "size")?;
            // abs_start is filled in during finalize, once every segment is known.
            tables.spans.insert(id, Span { id, seg_id, start_off, size, abs_start: 0 });
        }
        "line" => {
            let file_id = required_num(record, line, "file")?;
            let line_no = required_num(record, line, "line")?;
            let span_ids = record.props.get("span").map(|v| parse_id_list(v)).unwrap_or_default();
            let line_type = record.props.get("type").and_then(|v| parse_number(v)).unwrap_or(0);
            tables.lines.push(Line { file_id, line: line_no, span_ids, line_type });
        }
        "sym" => {
            let id = required_num(record, line, "id")?;
            let name = unquote(required(record, line, "name")?);
            let addr = required_num(record, line, "addr")?;
            let size = record.props.get("size").and_then(|v| parse_number(v));
            let sym_type = record.props.get("type").map(|v| unquote(v));
            let seg_id = record.props.get("seg").and_then(|v| parse_number(v));
            tables.symbols.insert(id, Symbol { id, name, addr, size, sym_type, seg_id });
        }
        "scope" => {
            let id = required_num(record, line, "id")?;
            let name = unquote(required(record, line, "name")?);
            let parent_id = record.props.get("parent").and_then(|v| parse_number(v));
            let scope_type = record.props.get("type").map(|v| unquote(v));
            let size = record.props.get("size").and_then(|v| parse_number(v));
            let span_ids = record.props.get("span").map(|v| parse_id_list(v)).unwrap_or_default();
            tables.scopes.insert(id, Scope { id, name, parent_id, scope_type, size, span_ids });
        }
        "csym" => {
            let id = required_num(record, line, "id")?;
            let name = unquote(required(record, line, "name")?);
            let scope_id = required_num(record, line, "scope")?;
            let type_id = required_num(record, line, "type")?;
            let storage_class = record.props.get("sc").map(|v| StorageClass::parse(v)).unwrap_or(StorageClass::Auto);
            let offset = record.props.get("offs").and_then(|v| parse_signed(v)).unwrap_or(0);
            tables.csymbols.insert(id, CSymbol { id, name, scope_id, type_id, storage_class, offset });
        }
        "type" => {
            let id = required_num(record, line, "id")?;
            let size = record.props.get("size").and_then(|v| parse_number(v)).unwrap_or(0);
            let kind = record.props.get("kind").map(|v| unquote(v)).unwrap_or_default();
            let base_id = record.props.get("base").and_then(|v| parse_number(v));
            let count = record.props.get("count").and_then(|v| parse_number(v));
            let member_ids = record.props.get("members").map(|v| parse_id_list(v)).unwrap_or_default();
            tables.types.insert(id, TypeInfo { id, size, kind, base_id, count, member_ids });
        }
        "mod" => {
            let id = required_num(record, line, "id")?;
            let name = unquote(required(record, line, "name")?);
            let file_id = required_num(record, line, "file")?;
            let lib_id = record.props.get("lib").and_then(|v| parse_number(v));
            tables.modules.insert(id, Module { id, name, file_id, lib_id });
        }
        "lib" => {
            let id = required_num(record, line, "id")?;
            let name = unquote(required(record, line, "name")?);
            tables.libraries.insert(id, Library { id, name });
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quoted_name_with_internal_comma() {
        let record = parse_line(1, r#"file id=1,name="a, b.c",size=10"#).unwrap().unwrap();
        assert_eq!(record.kind, "file");
        assert_eq!(record.props["name"], "\"a, b.c\"");
    }

    #[test]
    fn parses_hex_and_decimal_numbers() {
        assert_eq!(parse_number("0x1000"), Some(0x1000));
        assert_eq!(parse_number("256"), Some(256));
    }

    #[test]
    fn parses_plus_joined_span_list() {
        assert_eq!(parse_id_list("1+2+3"), vec![1, 2, 3]);
    }

    #[test]
    fn unknown_record_kind_is_accepted_but_ignored() {
        let mut tables = RawTables::default();
        let record = parse_line(1, "weirdkind id=1").unwrap().unwrap();
        apply_record(&mut tables, 1, &record).unwrap();
        assert!(tables.files.is_empty());
    }

    #[test]
    fn missing_required_key_is_an_error() {
        let mut tables = RawTables::default();
        let record = parse_line(1, "file id=1").unwrap().unwrap();
        let err = apply_record(&mut tables, 1, &record).unwrap_err();
        assert_eq!(err, DebugInfoError::MissingKey { line: 1, key: "name" });
    }
}

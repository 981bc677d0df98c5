// This file is part of mos6502dbg.
// Licensed under the GNU Lesser General Public License, v3.0 or later.
// See LICENSE or <https://www.gnu.org/licenses/lgpl-3.0.html> for details.

//! The `evaluate` expression grammar for embedder-facing symbol/memory lookups: a name
//! (resolved via debug-info symbols) or a `$`-prefixed hex literal, with an optional
//! addressing-mode-like modifier (`,X`, `,Y`, `(name)`, `(name),Y`). The parser follows the
//! same small hand-rolled recursive-descent style as `debuginfo::parser`'s record grammar.

use crate::cpu::Registers;
use crate::debuginfo::DebugInfo;
use crate::memory::Memory;

/// Raised when an expression names a symbol with no debug-info match, or a bad literal.
/// Recovered: the caller just sees a "not found" status, with no state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotFound;

/// The resolved value of an `evaluate` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalResult {
    /// The effective address the value was read from.
    pub address: u16,
    /// The bytes read, little-endian: as wide as the symbol's declared size, or one byte
    /// for a bare hex literal or any indirect mode.
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Index {
    X,
    Y,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Base<'a> {
    Name(&'a str),
    Hex(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expr<'a> {
    Direct(Base<'a>, Option<Index>),
    /// `(name)` or `(name),Y`; the bool is whether the `,Y` post-index is present.
    Indirect(Base<'a>, bool),
}

fn parse_base(s: &str) -> Option<Base<'_>> {
    if let Some(hex) = s.strip_prefix('$') {
        u16::from_str_radix(hex, 16).ok().map(Base::Hex)
    } else if !s.is_empty() {
        Some(Base::Name(s))
    } else {
        None
    }
}

fn parse(expr: &str) -> Option<Expr<'_>> {
    let expr = expr.trim();
    if let Some(inner) = expr.strip_prefix('(') {
        let (body, rest) = inner.split_once(')')?;
        let base = parse_base(body.trim())?;
        let rest = rest.trim();
        if rest.is_empty() {
            return Some(Expr::Indirect(base, false));
        }
        let suffix = rest.strip_prefix(',')?.trim();
        return if suffix.eq_ignore_ascii_case("y") { Some(Expr::Indirect(base, true)) } else { None };
    }

    if let Some((name_part, idx_part)) = expr.split_once(',') {
        let base = parse_base(name_part.trim())?;
        let idx_part = idx_part.trim();
        let index = if idx_part.eq_ignore_ascii_case("x") {
            Index::X
        } else if idx_part.eq_ignore_ascii_case("y") {
            Index::Y
        } else {
            return None;
        };
        return Some(Expr::Direct(base, Some(index)));
    }

    parse_base(expr).map(|base| Expr::Direct(base, None))
}

/// Resolves `base` to `(address, declared_size)`; a name with no size on its symbol leaves
/// `declared_size` as `None`, which callers treat as one byte.
fn resolve_base(base: Base<'_>, debug: Option<&DebugInfo>) -> Option<(u16, Option<u32>)> {
    match base {
        Base::Hex(addr) => Some((addr, None)),
        Base::Name(name) => {
            let sym = debug?.symbol_by_name(name)?;
            Some((sym.addr as u16, sym.size))
        }
    }
}

/// Evaluates `expr` against the current registers, memory, and (optional) debug info.
pub fn evaluate(expr: &str, regs: &Registers, mem: &Memory, debug: Option<&DebugInfo>) -> Result<EvalResult, NotFound> {
    match parse(expr).ok_or(NotFound)? {
        Expr::Direct(base, index) => {
            let (base_addr, size) = resolve_base(base, debug).ok_or(NotFound)?;
            let addr = match index {
                Some(Index::X) => base_addr.wrapping_add(regs.x as u16),
                Some(Index::Y) => base_addr.wrapping_add(regs.y as u16),
                None => base_addr,
            };
            let size = size.unwrap_or(1).max(1) as u16;
            let bytes = (0..size).map(|i| mem.read(addr.wrapping_add(i))).collect();
            Ok(EvalResult { address: addr, bytes })
        }
        Expr::Indirect(base, post_y) => {
            let (base_addr, _size) = resolve_base(base, debug).ok_or(NotFound)?;
            let ptr = mem.read_word(base_addr);
            let addr = if post_y { ptr.wrapping_add(regs.y as u16) } else { ptr };
            Ok(EvalResult { address: addr, bytes: vec![mem.read(addr)] })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regs() -> Registers {
        Registers::default()
    }

    #[test]
    fn bare_hex_literal_reads_one_byte() {
        let mut mem = Memory::new();
        mem.write(0x1234, 0x42);
        let result = evaluate("$1234", &regs(), &mem, None).unwrap();
        assert_eq!(result.address, 0x1234);
        assert_eq!(result.bytes, vec![0x42]);
    }

    #[test]
    fn name_resolves_via_debug_info_symbol_table() {
        let debug = DebugInfo::parse(r#"sym id=1,name="counter",addr=0x2000,size=2,type="lab""#);
        let mut mem = Memory::new();
        mem.write_word(0x2000, 0xBEEF);
        let result = evaluate("counter", &regs(), &mem, Some(&debug)).unwrap();
        assert_eq!(result.address, 0x2000);
        assert_eq!(result.bytes, vec![0xEF, 0xBE]);
    }

    #[test]
    fn indexed_modifier_adds_register_value() {
        let mut mem = Memory::new();
        mem.write(0x1005, 0x99);
        let mut r = regs();
        r.x = 5;
        let result = evaluate("$1000,X", &r, &mem, None).unwrap();
        assert_eq!(result.address, 0x1005);
        assert_eq!(result.bytes, vec![0x99]);
    }

    #[test]
    fn indirect_postindexed_by_y_always_yields_one_byte() {
        let mut mem = Memory::new();
        mem.write_word(0x0010, 0x3000);
        mem.write(0x3002, 0x7E);
        let mut r = regs();
        r.y = 2;
        let result = evaluate("($10),Y", &r, &mem, None).unwrap();
        assert_eq!(result.address, 0x3002);
        assert_eq!(result.bytes, vec![0x7E]);
    }

    #[test]
    fn unresolved_name_is_not_found() {
        assert_eq!(evaluate("nope", &regs(), &Memory::new(), None), Err(NotFound));
    }
}

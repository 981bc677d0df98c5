// This file is part of mos6502dbg.
// Licensed under the GNU Lesser General Public License, v3.0 or later.
// See LICENSE or <https://www.gnu.org/licenses/lgpl-3.0.html> for details.

//! Program image loader: sim65 header detection, placement, reset vector, CPU variant pick.
//!
//! Loads a raw image into memory at a fixed base, or, if the image carries a sim65 12-byte
//! header, reads the load address, reset vector, soft-stack pointer and target CPU from it.

use thiserror::Error;

use crate::memory::Memory;
use crate::opcodes::CpuVariant;

const MAGIC: &[u8] = b"sim65";
const HEADER_LEN: usize = 12;
const DEFAULT_LOAD_ADDR: u16 = 0x0200;

/// Raised for a truncated sim65 header; treating it as a parse error rather than panicking
/// keeps the "no exception leaks past the public API" guarantee the rest of the crate holds to.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LoaderError {
    #[error("sim65 header truncated: {len} bytes after the magic, need at least 7")]
    TruncatedHeader { len: usize },
    #[error("program image is empty")]
    EmptyPayload,
}

/// Outcome of [`load`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadResult {
    pub load_addr: u16,
    pub reset_addr: u16,
    pub sp_addr: u8,
    pub cpu_type: CpuVariant,
}

/// Loads `image` into `mem`. If `forced_load_addr` is given, it overrides whatever load
/// address would otherwise be used — whether inferred from a sim65 header or defaulted.
pub fn load(mem: &mut Memory, image: &[u8], forced_load_addr: Option<u16>) -> Result<LoadResult, LoaderError> {
    if image.is_empty() {
        return Err(LoaderError::EmptyPayload);
    }

    let (mut load_addr, reset_addr, sp_addr, cpu_type, payload) = if image.starts_with(MAGIC) {
        let header = &image[MAGIC.len()..];
        if header.len() < HEADER_LEN - MAGIC.len() {
            return Err(LoaderError::TruncatedHeader { len: header.len() });
        }
        let cpu_type = if header[1] == 1 { CpuVariant::Wdc65c02 } else { CpuVariant::Mos6502 };
        let sp_addr = header[2];
        let load_addr = u16::from_le_bytes([header[3], header[4]]);
        let reset_addr = u16::from_le_bytes([header[5], header[6]]);
        (load_addr, reset_addr, sp_addr, cpu_type, &image[HEADER_LEN..])
    } else {
        (DEFAULT_LOAD_ADDR, DEFAULT_LOAD_ADDR, 0, CpuVariant::Mos6502, image)
    };

    if let Some(forced) = forced_load_addr {
        load_addr = forced;
    }

    mem.bulk_load(load_addr, payload);
    mem.write_word(0xFFFC, reset_addr);

    Ok(LoadResult { load_addr, reset_addr, sp_addr, cpu_type })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_image_defaults_to_0200() {
        let mut mem = Memory::new();
        let result = load(&mut mem, &[0xA9, 0x55, 0x00], None).unwrap();
        assert_eq!(result.load_addr, 0x0200);
        assert_eq!(result.reset_addr, 0x0200);
        assert_eq!(result.cpu_type, CpuVariant::Mos6502);
        assert_eq!(mem.read(0x0200), 0xA9);
        assert_eq!(mem.read_word(0xFFFC), 0x0200);
    }

    #[test]
    fn sim65_header_is_parsed() {
        let mut image = b"sim65".to_vec();
        image.push(1); // version
        image.push(1); // cpu: 65c02
        image.push(0x02); // sp-zp base
        image.extend_from_slice(&0x8000u16.to_le_bytes()); // load addr
        image.extend_from_slice(&0x8010u16.to_le_bytes()); // reset addr
        image.extend_from_slice(&[0xEA, 0xEA]); // payload: two NOPs

        let mut mem = Memory::new();
        let result = load(&mut mem, &image, None).unwrap();
        assert_eq!(result.load_addr, 0x8000);
        assert_eq!(result.reset_addr, 0x8010);
        assert_eq!(result.cpu_type, CpuVariant::Wdc65c02);
        assert_eq!(result.sp_addr, 0x02);
        assert_eq!(mem.read(0x8000), 0xEA);
        assert_eq!(mem.read_word(0xFFFC), 0x8010);
    }

    #[test]
    fn forced_load_address_overrides_header() {
        let mut image = b"sim65".to_vec();
        image.extend_from_slice(&[0, 0, 0]);
        image.extend_from_slice(&0x8000u16.to_le_bytes());
        image.extend_from_slice(&0x8000u16.to_le_bytes());
        image.push(0xEA);

        let mut mem = Memory::new();
        let result = load(&mut mem, &image, Some(0x0300)).unwrap();
        assert_eq!(result.load_addr, 0x0300);
        assert_eq!(mem.read(0x0300), 0xEA);
    }

    #[test]
    fn truncated_header_is_an_error() {
        let mut mem = Memory::new();
        let image = b"sim65\x01\x01".to_vec();
        assert_eq!(load(&mut mem, &image, None).unwrap_err(), LoaderError::TruncatedHeader { len: 2 });
    }

    #[test]
    fn empty_image_is_an_error() {
        let mut mem = Memory::new();
        assert_eq!(load(&mut mem, &[], None).unwrap_err(), LoaderError::EmptyPayload);
    }
}

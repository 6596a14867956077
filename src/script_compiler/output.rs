// Bytecode Output Buffer
//
// Append-only instruction buffer with a reserve-then-patch API for forward
// jump targets. During lowering the final address of a branch is unknown, so
// the two operand slots are filled with PLACEHOLDER_BYTE and a PatchSite
// handle is returned. The handle is consumed by `patch`, which makes
// double-patching a type error rather than a runtime bug.

use crate::script_compiler::error::CompilerError;
use std::sync::atomic::{AtomicU64, Ordering};

/// Byte written into unresolved address slots. Detectable in hex dumps and
/// rejected by `finalize` if it ever survives to the end of a unit.
pub const PLACEHOLDER_BYTE: u8 = 0xFF;

/// Largest address a 16-bit jump operand can carry.
pub const MAX_ADDRESS: usize = u16::MAX as usize;

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(0);

/// Handle to a reserved two-byte address slot.
///
/// Deliberately neither `Clone` nor `Copy`: `OutputBuffer::patch` takes the
/// site by value, so each reservation can be resolved exactly once. The
/// buffer id ties the site to the buffer that issued it.
#[derive(Debug)]
pub struct PatchSite {
    buffer_id: u64,
    position: usize,
}

impl PatchSite {
    /// Byte offset of the reserved high byte.
    pub fn position(&self) -> usize {
        self.position
    }
}

/// Append-only, randomly-patchable byte sequence for one compilation unit.
pub struct OutputBuffer {
    id: u64,
    data: Vec<u8>,
    open_sites: usize,
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputBuffer {
    pub fn new() -> Self {
        OutputBuffer {
            id: NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed),
            data: Vec::new(),
            open_sites: 0,
        }
    }

    /// Position the next push will occupy. This is the address of any code
    /// emitted next, which is what backpatching records.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn push(&mut self, byte: u8) {
        self.data.push(byte);
    }

    /// Append a 16-bit word, high byte first.
    pub fn push_word(&mut self, word: u16) {
        self.data.push((word >> 8) as u8);
        self.data.push(word as u8);
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Append two placeholder slots for a forward jump target and return the
    /// handle needed to patch them once the target address is known.
    pub fn reserve_placeholder(&mut self) -> PatchSite {
        let position = self.data.len();
        self.data.push(PLACEHOLDER_BYTE);
        self.data.push(PLACEHOLDER_BYTE);
        self.open_sites += 1;
        log::debug!("reserved patch site at 0x{:04x}", position);
        PatchSite {
            buffer_id: self.id,
            position,
        }
    }

    /// Resolve a reserved site with the big-endian split of `address`.
    pub fn patch(&mut self, site: PatchSite, address: usize) -> Result<(), CompilerError> {
        if site.buffer_id != self.id {
            return Err(CompilerError::CodeGenError(format!(
                "patch site at 0x{:04x} belongs to a different output buffer",
                site.position
            )));
        }
        if address > MAX_ADDRESS {
            return Err(CompilerError::AddressOverflow);
        }
        // The slot must still hold the placeholder pair written by
        // reserve_placeholder; anything else means the cursor went backwards.
        debug_assert_eq!(self.data[site.position], PLACEHOLDER_BYTE);
        debug_assert_eq!(self.data[site.position + 1], PLACEHOLDER_BYTE);
        self.data[site.position] = (address >> 8) as u8;
        self.data[site.position + 1] = address as u8;
        self.open_sites -= 1;
        log::debug!(
            "patched site at 0x{:04x} with address 0x{:04x}",
            site.position,
            address
        );
        Ok(())
    }

    /// Read-only view of the bytes emitted so far.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the buffer, verifying every reserved site was patched.
    pub fn finalize(self) -> Result<Vec<u8>, CompilerError> {
        if self.open_sites > 0 {
            return Err(CompilerError::CodeGenError(format!(
                "{} unresolved patch sites remain in compiled output",
                self.open_sites
            )));
        }
        Ok(self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_writes_big_endian_address() {
        let mut output = OutputBuffer::new();
        output.push(0x02);
        let site = output.reserve_placeholder();
        output.push(0x00);
        output.patch(site, 0x1234).unwrap();
        assert_eq!(output.bytes(), &[0x02, 0x12, 0x34, 0x00]);
    }

    #[test]
    fn finalize_rejects_unpatched_placeholder() {
        let mut output = OutputBuffer::new();
        let _site = output.reserve_placeholder();
        let result = output.finalize();
        assert!(matches!(result, Err(CompilerError::CodeGenError(_))));
    }

    #[test]
    fn finalize_accepts_fully_patched_buffer() {
        let mut output = OutputBuffer::new();
        let site = output.reserve_placeholder();
        output.patch(site, 2).unwrap();
        assert_eq!(output.finalize().unwrap(), vec![0x00, 0x02]);
    }

    #[test]
    fn patch_rejects_site_from_other_buffer() {
        let mut a = OutputBuffer::new();
        let mut b = OutputBuffer::new();
        let site = a.reserve_placeholder();
        let result = b.patch(site, 0);
        assert!(matches!(result, Err(CompilerError::CodeGenError(_))));
    }

    #[test]
    fn patch_rejects_address_past_u16_range() {
        let mut output = OutputBuffer::new();
        let site = output.reserve_placeholder();
        let result = output.patch(site, MAX_ADDRESS + 1);
        assert_eq!(result, Err(CompilerError::AddressOverflow));
    }
}

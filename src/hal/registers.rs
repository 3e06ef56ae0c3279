//! Memory-mapped register block access
//!
//! The BCM283x peripherals expose their control registers as 32-bit words in
//! physical memory. On Linux the block is reached through `/dev/mem`; tests
//! use [`MemoryRegisters`], a plain in-memory block with a write log.
//!
//! All offsets are byte offsets from the start of the block and must be
//! word aligned and inside the mapped span.

use std::cell::RefCell;

use crate::error::{Error, Result};

/// Size of the GPIO register mapping (one page)
pub const BLOCK_SIZE: usize = 4 * 1024;

/// A bit field inside a 32-bit register word
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    /// Bit offset of the least significant bit
    pub shift: u32,
    /// Field width in bits
    pub width: u32,
}

impl Field {
    pub const fn new(shift: u32, width: u32) -> Self {
        Self { shift, width }
    }

    /// Mask covering the field in its register position
    pub const fn mask(&self) -> u32 {
        let bits = if self.width >= 32 {
            u32::MAX
        } else {
            (1u32 << self.width) - 1
        };
        bits << self.shift
    }

    /// Replace the field in `word` with `value`, leaving every other bit intact
    pub const fn insert(&self, word: u32, value: u32) -> u32 {
        (word & !self.mask()) | ((value << self.shift) & self.mask())
    }

    /// Extract the field value from `word`
    pub const fn extract(&self, word: u32) -> u32 {
        (word & self.mask()) >> self.shift
    }
}

/// A block of 32-bit hardware registers
///
/// Accesses take `&self`: the block behaves like device memory, and the
/// process is single threaded, so a read-modify-write through
/// [`RegisterBlock::modify_field`] cannot interleave with another access.
pub trait RegisterBlock {
    /// Size of the block in bytes
    fn len(&self) -> usize;

    /// Read the word at `offset`
    fn read(&self, offset: usize) -> Result<u32>;

    /// Write `value` to the word at `offset`
    fn write(&self, offset: usize, value: u32) -> Result<()>;

    /// Read-modify-write a single field of the word at `offset`
    fn modify_field(&self, offset: usize, field: Field, value: u32) -> Result<()> {
        let word = self.read(offset)?;
        self.write(offset, field.insert(word, value))
    }
}

fn check_offset(offset: usize, len: usize) -> Result<()> {
    if offset % 4 != 0 || offset.checked_add(4).map_or(true, |end| end > len) {
        return Err(Error::RegisterOutOfBounds { offset, len });
    }
    Ok(())
}

// ============================================================================
// /dev/mem MAPPING
// ============================================================================

/// Registers mapped from physical memory through `/dev/mem`
#[cfg(unix)]
pub struct MmapRegisters {
    base: *mut u32,
    len: usize,
}

#[cfg(unix)]
impl MmapRegisters {
    /// Map `len` bytes of physical memory starting at `phys_base`
    ///
    /// Requires root (or `CAP_SYS_RAWIO`). The mapping lives until the value
    /// is dropped.
    pub fn map(phys_base: u64, len: usize) -> Result<Self> {
        use std::fs::OpenOptions;
        use std::os::unix::fs::OpenOptionsExt;
        use std::os::unix::io::AsRawFd;

        let map_err = |source| Error::MapFailed {
            base: phys_base,
            source,
        };

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC | libc::O_CLOEXEC)
            .open("/dev/mem")
            .map_err(map_err)?;

        let offset = libc::off_t::try_from(phys_base).map_err(|_| {
            map_err(std::io::Error::from(std::io::ErrorKind::InvalidInput))
        })?;

        // SAFETY: fresh shared mapping of a device file; the pointer is only
        // dereferenced through bounds-checked word accesses below.
        let ptr = unsafe {
            libc::mmap(
                core::ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                offset,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(map_err(std::io::Error::last_os_error()));
        }

        log::debug!("mapped {} bytes of /dev/mem at {:#010x}", len, phys_base);
        Ok(Self {
            base: ptr.cast::<u32>(),
            len,
        })
    }
}

#[cfg(unix)]
impl RegisterBlock for MmapRegisters {
    fn len(&self) -> usize {
        self.len
    }

    fn read(&self, offset: usize) -> Result<u32> {
        check_offset(offset, self.len)?;
        // SAFETY: offset checked against the mapped span and word aligned.
        Ok(unsafe { core::ptr::read_volatile(self.base.add(offset / 4)) })
    }

    fn write(&self, offset: usize, value: u32) -> Result<()> {
        check_offset(offset, self.len)?;
        // SAFETY: as in `read`.
        unsafe { core::ptr::write_volatile(self.base.add(offset / 4), value) };
        Ok(())
    }
}

#[cfg(unix)]
impl Drop for MmapRegisters {
    fn drop(&mut self) {
        // SAFETY: `base`/`len` come from a successful mmap in `map`.
        unsafe {
            libc::munmap(self.base.cast(), self.len);
        }
    }
}

// ============================================================================
// IN-MEMORY BLOCK
// ============================================================================

/// Register block backed by ordinary memory
///
/// Records every write in order so tests can check exactly which words the
/// drivers touched.
#[derive(Debug)]
pub struct MemoryRegisters {
    words: RefCell<Vec<u32>>,
    writes: RefCell<Vec<(usize, u32)>>,
}

impl MemoryRegisters {
    /// Create a zeroed block of `len` bytes
    pub fn new(len: usize) -> Self {
        Self {
            words: RefCell::new(vec![0; len / 4]),
            writes: RefCell::new(Vec::new()),
        }
    }

    /// Set a word without recording it (simulates hardware-driven state)
    pub fn poke(&self, offset: usize, value: u32) {
        if let Some(word) = self.words.borrow_mut().get_mut(offset / 4) {
            *word = value;
        }
    }

    /// Current word value, zero if outside the block
    pub fn peek(&self, offset: usize) -> u32 {
        self.words.borrow().get(offset / 4).copied().unwrap_or(0)
    }

    /// All writes so far as `(offset, value)` pairs
    pub fn writes(&self) -> Vec<(usize, u32)> {
        self.writes.borrow().clone()
    }

    pub fn clear_writes(&self) {
        self.writes.borrow_mut().clear();
    }
}

impl Default for MemoryRegisters {
    fn default() -> Self {
        Self::new(BLOCK_SIZE)
    }
}

impl RegisterBlock for MemoryRegisters {
    fn len(&self) -> usize {
        self.words.borrow().len() * 4
    }

    fn read(&self, offset: usize) -> Result<u32> {
        check_offset(offset, self.len())?;
        Ok(self.words.borrow()[offset / 4])
    }

    fn write(&self, offset: usize, value: u32) -> Result<()> {
        check_offset(offset, self.len())?;
        self.words.borrow_mut()[offset / 4] = value;
        self.writes.borrow_mut().push((offset, value));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_insert_preserves_neighbours() {
        let field = Field::new(9, 3);
        assert_eq!(field.mask(), 0b111 << 9);

        let word = 0xFFFF_FFFF;
        let updated = field.insert(word, 0b001);
        assert_eq!(field.extract(updated), 0b001);
        assert_eq!(updated | field.mask(), 0xFFFF_FFFF);
    }

    #[test]
    fn test_field_insert_truncates_wide_value() {
        let field = Field::new(0, 3);
        assert_eq!(field.insert(0, 0b1111), 0b111);
    }

    #[test]
    fn test_memory_block_bounds() {
        let regs = MemoryRegisters::new(16);
        assert!(regs.write(12, 1).is_ok());
        assert!(matches!(
            regs.write(16, 1),
            Err(Error::RegisterOutOfBounds { offset: 16, len: 16 })
        ));
        assert!(regs.read(2).is_err());
        assert!(regs.read(usize::MAX - 1).is_err());
    }

    #[test]
    fn test_modify_field_read_modify_write() {
        let regs = MemoryRegisters::default();
        regs.poke(0x04, 0xAAAA_AAAA);
        regs.modify_field(0x04, Field::new(4, 4), 0x5).unwrap();
        assert_eq!(regs.peek(0x04), 0xAAAA_AA5A);
        assert_eq!(regs.writes(), vec![(0x04, 0xAAAA_AA5A)]);
    }
}

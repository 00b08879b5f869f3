//! Executable detection for a single archive entry.

use goblin::elf::header::{ELFMAG, header32::SIZEOF_EHDR};
use log::warn;
use std::io::Read;
use std::path::Path;

/// Bytes read ahead from a candidate entry: the size of a 32-bit ELF header.
pub const SNIFF_LEN: usize = SIZEOF_EHDR;

const SCRIPT_EXTENSIONS: &[&str] = &["sh", "bash"];
const SHEBANG: &[u8] = b"#!";

/// Decide whether a regular-file entry is something worth exposing on the command line.
///
/// An execute bit is required. Script extensions are trusted as-is; anything else must
/// start with the ELF magic (with a complete ELF header present) or a shebang.
///
/// Consumes up to [`SNIFF_LEN`] bytes from `reader`. A short or failed read only fails
/// the sniff.
pub fn is_executable<R: Read>(mode: u32, name: &Path, reader: &mut R) -> bool {
    if mode & 0o111 == 0 {
        return false;
    }

    if name
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SCRIPT_EXTENSIONS.contains(&ext))
    {
        return true;
    }

    let mut magic = Vec::with_capacity(SNIFF_LEN);
    if let Err(e) = reader.take(SNIFF_LEN as u64).read_to_end(&mut magic) {
        warn!("Could not read {:?} from archive: {}", name, e);
        return false;
    }

    if magic.len() >= SNIFF_LEN && magic.starts_with(ELFMAG) {
        return true;
    }

    magic.starts_with(SHEBANG)
}

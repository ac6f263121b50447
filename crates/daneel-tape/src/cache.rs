//! On-disk artifact cache keyed by structural hash.

use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::{artifact, Tape};

/// Cache key: the CRC32 pair of a canonical expression encoding and its
/// ordered symbol list. Two structurally equal programs share a key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct CacheKey {
    expr_hash: u32,
    symbols_hash: u32,
}

impl CacheKey {
    pub fn new(expr_bytes: &[u8], symbol_ids: &[u32]) -> Self {
        let mut hasher = crc32fast::Hasher::new();
        for id in symbol_ids {
            hasher.update(&id.to_le_bytes());
        }
        Self {
            expr_hash: crc32fast::hash(expr_bytes),
            symbols_hash: hasher.finalize(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}{:08x}", self.expr_hash, self.symbols_hash)
    }
}

/// Directory-backed tape cache.
///
/// Load failures of any kind (truncation, bad magic, version or checksum
/// mismatch, decode errors) delete the offending file and report a miss,
/// so the caller recompiles. There are no partial loads.
#[derive(Clone, Debug)]
pub struct TapeCache {
    dir: PathBuf,
}

impl TapeCache {
    /// Open (creating if needed) a cache rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn file_path(&self, key: CacheKey) -> PathBuf {
        self.dir.join(format!("tape-{key}.bin"))
    }

    /// Look up a tape by key. Corrupt artifacts are discarded.
    pub fn load(&self, key: CacheKey) -> Option<Tape> {
        let path = self.file_path(key);
        match read_artifact(&path) {
            Ok(tape) => Some(tape),
            Err(ReadError::NotFound) => None,
            Err(_) => {
                // Discard and recompile rather than trusting a broken file.
                let _ = fs::remove_file(&path);
                None
            }
        }
    }

    /// Persist a compiled tape under its key.
    pub fn store(&self, key: CacheKey, tape: &Tape) -> io::Result<()> {
        fs::write(self.file_path(key), artifact::encode(tape))
    }
}

enum ReadError {
    NotFound,
    Io,
    Corrupt,
}

fn read_artifact(path: &Path) -> Result<Tape, ReadError> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            ReadError::NotFound
        } else {
            ReadError::Io
        }
    })?;
    // Safety: the mapping is read-only and dropped before this function
    // returns; concurrent writers would at worst fail the checksum.
    let map = unsafe { Mmap::map(&file) }.map_err(|_| ReadError::Io)?;
    artifact::decode(&map).map_err(|_| ReadError::Corrupt)
}

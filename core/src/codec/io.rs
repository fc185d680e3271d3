//! codec/io.rs
//! File-to-file variants of encode/decode. The destination only appears once the
//! whole archive has been produced; a failed run leaves it untouched.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::codec::decode::decode_pack;
use crate::codec::encode::encode_pack;
use crate::codec::types::{DecodeOptions, DecodedPack, EncodedPack};
use crate::crypto::PackKey;
use crate::scheduler::WorkerPool;
use crate::telemetry::ProgressSink;
use crate::types::PackError;

pub fn encode_pack_file(
    src: &Path,
    dst: &Path,
    key: Option<PackKey>,
    pool: Option<&WorkerPool>,
    progress: &dyn ProgressSink,
) -> Result<EncodedPack, PackError> {
    let input = fs::read(src)?;
    let encoded = encode_pack(&input, key, pool, progress)?;
    write_atomically(dst, &encoded.archive)?;
    Ok(encoded)
}

pub fn decode_pack_file(
    src: &Path,
    dst: &Path,
    key: &str,
    options: DecodeOptions,
    pool: Option<&WorkerPool>,
    progress: &dyn ProgressSink,
) -> Result<DecodedPack, PackError> {
    let input = fs::read(src)?;
    let decoded = decode_pack(&input, key, options, pool, progress)?;
    write_atomically(dst, &decoded.archive)?;
    Ok(decoded)
}

/// Stage `bytes` next to `dst` and rename into place.
pub(crate) fn write_atomically(dst: &Path, bytes: &[u8]) -> Result<(), PackError> {
    let dir = match dst.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(bytes)?;
    staged.as_file().sync_all()?;
    staged.persist(dst).map_err(|e| PackError::Io(e.error))?;
    debug!(path = %dst.display(), bytes = bytes.len(), "artifact written");
    Ok(())
}

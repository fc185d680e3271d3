use crate::crypto::PackKey;
use crate::telemetry::{PackCounters, StageTimes};

/// Result of a successful encode.
#[derive(Debug, Clone)]
pub struct EncodedPack {
    pub archive: Vec<u8>,
    /// Master key sealing every `contents.json`; the only secret the caller must keep.
    pub key: PackKey,
    pub counters: PackCounters,
    pub stage_times: StageTimes,
}

/// Result of a successful decode.
#[derive(Debug, Clone)]
pub struct DecodedPack {
    pub archive: Vec<u8>,
    pub counters: PackCounters,
    pub stage_times: StageTimes,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Re-embed each decrypted manifest as plain JSON `contents.json`.
    pub preserve_manifest: bool,
}

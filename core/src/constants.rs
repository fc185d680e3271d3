use std::time::Duration;

/// Magic marker of the content manifest header.
// Protocol magic is kept as `[u8; 4]` so the type itself enforces "exactly 4 bytes"
// and matches the `ManifestHeader` field.
pub const MANIFEST_MAGIC: [u8; 4] = [0xFC, 0xB9, 0xCF, 0x9B];
/// Only version ever written; encoded as four zero bytes.
pub const MANIFEST_VERSION: [u8; 4] = [0u8; 4];

/// Fixed header size; ciphertext starts right after it.
pub const MANIFEST_HEADER_LEN: usize = 0x100;
/// Offset of the one-byte content id length prefix.
pub const CONTENT_ID_LEN_OFFSET: usize = 0x10;
/// Offset of the content id bytes.
pub const CONTENT_ID_OFFSET: usize = 0x11;
/// Longest content id that still fits before the ciphertext offset.
pub const MAX_CONTENT_ID_LEN: usize = MANIFEST_HEADER_LEN - CONTENT_ID_OFFSET;

/// Name of the encrypted index in every scope root.
pub const CONTENTS_FILE: &str = "contents.json";
/// Pack metadata file carrying `header.uuid`.
pub const PACK_MANIFEST_FILE: &str = "manifest.json";
/// Directory holding subpacks (`subpacks/<name>/`).
pub const SUBPACKS_DIR: &str = "subpacks";

/// Files that are always stored verbatim (compared against the scope-relative path).
pub const EXCLUDED_FILES: &[&str] = &[
    "manifest.json",
    "pack_icon.png",
    "bug_pack_icon.png",
];

/// Hard ceiling for a single cipher task.
pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(30);
/// Unit cap ceiling in constrained mode (cores - 1, capped here).
pub const CONSTRAINED_UNIT_CEILING: usize = 4;
/// Unit cap in unconstrained mode.
pub const UNCONSTRAINED_UNIT_CAP: usize = 8;

/// Lifetime of an ephemeral download link.
pub const DEFAULT_LINK_TTL: Duration = Duration::from_secs(10 * 60);
/// Delay between first resolution and artifact deletion.
pub const DEFAULT_LINK_GRACE: Duration = Duration::from_secs(30);
/// Reaper sweep period.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

//! codec/encode.rs
//! Selective encryption of a pack archive.

use std::collections::BTreeMap;

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::archive::{read_archive, ArchiveBuilder, ArchiveEntry};
use crate::codec::policy::{is_excluded, split_scope, subpack_root};
use crate::codec::types::EncodedPack;
use crate::constants::{CONTENTS_FILE, PACK_MANIFEST_FILE};
use crate::crypto::{generate_key, PackKey};
use crate::manifest::{read_content_id, ContentEntry, ContentManifest, ManifestError};
use crate::scheduler::{run_batch, Task, WorkerPool};
use crate::telemetry::progress::scaled_percent;
use crate::telemetry::{PackCounters, ProgressSink, ProgressUpdate, Stage, TelemetryTimer};
use crate::types::PackError;

/// Where an output file comes from.
enum Planned {
    Verbatim { path: String, data: Bytes },
    /// Index into the batch results.
    Encrypted { path: String, task: usize },
}

// ============================================================
// Encode
// ============================================================

/// Encrypt every non-excluded entry of `archive` under a fresh per-entry key and index
/// each scope (root and every `subpacks/<name>/`) in its own sealed `contents.json`.
///
/// `key` is the master key; one is generated when `None`. Entry crypto runs on `pool`
/// when given, sequentially otherwise (or when the pool fails).
pub fn encode_pack(
    archive: &[u8],
    key: Option<PackKey>,
    pool: Option<&WorkerPool>,
    progress: &dyn ProgressSink,
) -> Result<EncodedPack, PackError> {
    let mut timer = TelemetryTimer::new();
    let mut counters = PackCounters::default();

    // ---- Read ----
    let entries = read_archive(archive)?;
    let content_id = find_content_id(&entries)?;
    let master = key.unwrap_or_else(generate_key);
    timer.mark(Stage::Read);
    progress.report(ProgressUpdate::new(Stage::Read, 10));
    debug!(entries = entries.len(), content_id = %content_id, "pack read");

    // ---- Plan ----
    // Scope prefix ("" for the root) -> manifest of that scope.
    let mut scopes: BTreeMap<String, ContentManifest> = BTreeMap::new();
    scopes.insert(String::new(), ContentManifest::default());

    let mut directories = Vec::new();
    let mut planned = Vec::new();
    let mut tasks = Vec::new();

    for entry in entries {
        match entry {
            ArchiveEntry::Directory(path) => {
                if subpack_root(&path) == Some(path.as_str()) {
                    scopes.entry(path.clone()).or_default();
                }
                directories.push(path);
            }
            ArchiveEntry::File { path, data } => {
                let (scope, relative) = split_scope(&path);
                if relative == CONTENTS_FILE {
                    warn!(path = %path, "dropping pre-existing content manifest");
                    continue;
                }

                let manifest = scopes.entry(scope.to_owned()).or_default();
                if is_excluded(relative) {
                    manifest.content.push(ContentEntry::verbatim(relative));
                    counters.add_verbatim(data.len());
                    planned.push(Planned::Verbatim { path, data });
                } else {
                    let entry_key = generate_key();
                    manifest.content.push(ContentEntry::encrypted(relative, &entry_key));
                    counters.add_encrypted(data.len());
                    planned.push(Planned::Encrypted { path: path.clone(), task: tasks.len() });
                    tasks.push(Task::encrypt(path, data, entry_key));
                }
            }
        }
    }
    timer.mark(Stage::Plan);
    progress.report(ProgressUpdate::new(Stage::Plan, 20));

    // ---- Encrypt ----
    let task_count = tasks.len();
    let outcome = run_batch(pool, tasks)?;
    if outcome.sequential && pool.is_some() {
        counters.sequential_fallbacks += 1;
    }
    timer.mark(Stage::Encrypt);
    progress.report(ProgressUpdate::new(Stage::Encrypt, 80));
    debug!(tasks = task_count, sequential = outcome.sequential, "entries encrypted");

    // ---- Write ----
    let mut out = ArchiveBuilder::new();
    for dir in &directories {
        out.add_directory(dir)?;
        counters.add_directory();
    }

    let total = planned.len();
    for (done, item) in planned.into_iter().enumerate() {
        match item {
            Planned::Verbatim { path, data } => out.add_file(&path, &data)?,
            Planned::Encrypted { path, task } => {
                let payload = outcome.payloads.get(task).ok_or_else(|| {
                    PackError::WorkerFault(format!("no result for {path}"))
                })?;
                out.add_file(&path, payload)?;
            }
        }
        progress.report(ProgressUpdate::new(Stage::Write, scaled_percent(done + 1, total, 80, 95)));
    }

    for (scope, manifest) in &scopes {
        if !scope.is_empty() {
            counters.add_subpack();
        }
        let sealed = manifest.seal(&content_id, &master)?;
        out.add_file(&format!("{scope}{CONTENTS_FILE}"), &sealed)?;
    }

    let archive = out.finish()?;
    counters.set_output_len(archive.len());
    timer.mark(Stage::Write);
    progress.report(ProgressUpdate::new(Stage::Write, 100));

    info!(
        content_id = %content_id,
        encrypted = counters.entries_encrypted,
        verbatim = counters.entries_verbatim,
        subpacks = counters.subpacks,
        elapsed_ms = timer.elapsed().as_millis() as u64,
        "pack encoded"
    );

    Ok(EncodedPack {
        archive,
        key: master,
        counters,
        stage_times: timer.stage_times,
    })
}

fn find_content_id(entries: &[ArchiveEntry]) -> Result<String, PackError> {
    let data = entries
        .iter()
        .find_map(|entry| match entry {
            ArchiveEntry::File { path, data } if path == PACK_MANIFEST_FILE => Some(data),
            _ => None,
        })
        .ok_or(ManifestError::Missing(PACK_MANIFEST_FILE))?;
    Ok(read_content_id(data)?)
}

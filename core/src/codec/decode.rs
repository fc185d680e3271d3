//! codec/decode.rs
//! Restore a pack sealed by `encode_pack`.

use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::archive::{read_archive, ArchiveBuilder, ArchiveEntry};
use crate::codec::policy::{is_excluded, split_scope};
use crate::codec::types::{DecodeOptions, DecodedPack};
use crate::constants::CONTENTS_FILE;
use crate::crypto::PackKey;
use crate::manifest::ContentManifest;
use crate::scheduler::{run_batch, Task, WorkerPool};
use crate::telemetry::progress::scaled_percent;
use crate::telemetry::{PackCounters, ProgressSink, ProgressUpdate, Stage, TelemetryTimer};
use crate::types::PackError;

enum Planned {
    Verbatim { path: String, data: Bytes },
    Decrypted { path: String, task: usize },
}

// ============================================================
// Decode
// ============================================================

/// Decrypt every entry listed in the root and subpack manifests of `archive`.
///
/// The key is validated before any cipher work. Nothing is returned unless every
/// entry opened.
pub fn decode_pack(
    archive: &[u8],
    key: &str,
    options: DecodeOptions,
    pool: Option<&WorkerPool>,
    progress: &dyn ProgressSink,
) -> Result<DecodedPack, PackError> {
    let master = PackKey::parse(key)?;
    let mut timer = TelemetryTimer::new();
    let mut counters = PackCounters::default();

    // ---- Read ----
    let entries = read_archive(archive)?;
    let mut directories = Vec::new();
    let mut files: HashMap<&str, &Bytes> = HashMap::with_capacity(entries.len());
    // Source order, used to re-emit excluded files deterministically.
    let mut file_order: Vec<&str> = Vec::with_capacity(entries.len());
    for entry in &entries {
        match entry {
            ArchiveEntry::Directory(path) => directories.push(path.as_str()),
            ArchiveEntry::File { path, data } => {
                files.insert(path.as_str(), data);
                file_order.push(path.as_str());
            }
        }
    }

    let scopes = open_manifests(&files, &file_order, &master)?;
    timer.mark(Stage::Read);
    progress.report(ProgressUpdate::new(Stage::Read, 10));

    // ---- Plan ----
    let mut planned = Vec::new();
    let mut tasks = Vec::new();
    for (scope, manifest) in &scopes {
        for entry in &manifest.content {
            let path = format!("{scope}{}", entry.path);
            let data = *files
                .get(path.as_str())
                .ok_or_else(|| PackError::MissingEntry { path: path.clone() })?;

            match &entry.key {
                None => {
                    counters.add_verbatim(data.len());
                    planned.push(Planned::Verbatim { path, data: data.clone() });
                }
                Some(raw) => {
                    let entry_key = PackKey::parse(raw)?;
                    counters.add_decrypted(data.len());
                    planned.push(Planned::Decrypted { path: path.clone(), task: tasks.len() });
                    tasks.push(Task::decrypt(path, data.clone(), entry_key));
                }
            }
        }
    }
    timer.mark(Stage::Plan);
    progress.report(ProgressUpdate::new(Stage::Plan, 20));

    // ---- Decrypt ----
    let outcome = run_batch(pool, tasks)?;
    if outcome.sequential && pool.is_some() {
        counters.sequential_fallbacks += 1;
    }
    timer.mark(Stage::Decrypt);
    progress.report(ProgressUpdate::new(Stage::Decrypt, 80));

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
            Planned::Decrypted { path, task } => {
                let payload = outcome.payloads.get(task).ok_or_else(|| {
                    PackError::WorkerFault(format!("no result for {path}"))
                })?;
                out.add_file(&path, payload)?;
            }
        }
        progress.report(ProgressUpdate::new(Stage::Write, scaled_percent(done + 1, total, 80, 95)));
    }

    // Excluded files the manifests did not list still travel with the pack.
    for path in &file_order {
        let (_, relative) = split_scope(path);
        if is_excluded(relative) && !out.contains(path) {
            if let Some(data) = files.get(path) {
                out.add_file(path, data)?;
                counters.add_verbatim(data.len());
            }
        }
    }

    if options.preserve_manifest {
        for (scope, manifest) in &scopes {
            out.add_file(&format!("{scope}{CONTENTS_FILE}"), &manifest.to_pretty_json()?)?;
        }
    }

    for scope in scopes.keys().filter(|s| !s.is_empty()) {
        debug!(scope = %scope, "subpack restored");
        counters.add_subpack();
    }

    let archive = out.finish()?;
    counters.set_output_len(archive.len());
    timer.mark(Stage::Write);
    progress.report(ProgressUpdate::new(Stage::Write, 100));

    info!(
        decrypted = counters.entries_decrypted,
        verbatim = counters.entries_verbatim,
        subpacks = counters.subpacks,
        elapsed_ms = timer.elapsed().as_millis() as u64,
        "pack decoded"
    );

    Ok(DecodedPack {
        archive,
        counters,
        stage_times: timer.stage_times,
    })
}

/// Open the root manifest and every `subpacks/<name>/contents.json` present.
fn open_manifests(
    files: &HashMap<&str, &Bytes>,
    file_order: &[&str],
    master: &PackKey,
) -> Result<BTreeMap<String, ContentManifest>, PackError> {
    let root = files
        .get(CONTENTS_FILE)
        .ok_or_else(|| PackError::Format(format!("{CONTENTS_FILE} not found")))?;
    let (root_header, root_manifest) = ContentManifest::open(root, master)?;
    debug!(content_id = %root_header.content_id, entries = root_manifest.content.len(), "root manifest opened");

    let mut scopes = BTreeMap::new();
    scopes.insert(String::new(), root_manifest);

    for path in file_order {
        let (scope, relative) = split_scope(path);
        if scope.is_empty() || relative != CONTENTS_FILE {
            continue;
        }
        let Some(data) = files.get(path) else {
            continue;
        };
        let (header, manifest) = ContentManifest::open(data, master)?;
        if header.content_id != root_header.content_id {
            warn!(
                scope = %scope,
                expected = %root_header.content_id,
                found = %header.content_id,
                "subpack manifest carries a different content id"
            );
        }
        scopes.insert(scope.to_owned(), manifest);
    }

    Ok(scopes)
}

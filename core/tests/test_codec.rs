// End-to-end behaviour of the pack codec: selective encryption, exclusion,
// subpack manifests, key validation and failure modes.

mod common;

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use proptest::prelude::*;

    use packguard_core::archive::{read_archive, ArchiveBuilder, ArchiveEntry};
    use packguard_core::codec::{decode_pack, encode_pack, DecodeOptions};
    use packguard_core::config::PoolConfig;
    use packguard_core::crypto::{decrypt, generate_key, KeyError, PackKey};
    use packguard_core::manifest::ContentManifest;
    use packguard_core::scheduler::WorkerPool;
    use packguard_core::telemetry::{NoProgress, ProgressUpdate};
    use packguard_core::types::PackError;

    const CONTENT_ID: &str = "0b7e5e0c-2c49-4b8e-9a57-1f0c2c7d1a11";

    fn pack_manifest() -> Vec<u8> {
        format!(
            r#"{{
    // generated for tests
    "format_version": 2,
    "header": {{ "name": "Test", "uuid": "{CONTENT_ID}" }}
}}"#
        )
        .into_bytes()
    }

    fn build(dirs: &[&str], files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut out = ArchiveBuilder::new();
        for dir in dirs {
            out.add_directory(dir).unwrap();
        }
        for (path, data) in files {
            out.add_file(path, data).unwrap();
        }
        out.finish().unwrap()
    }

    fn files_of(archive: &[u8]) -> BTreeMap<String, Vec<u8>> {
        read_archive(archive)
            .unwrap()
            .into_iter()
            .filter_map(|entry| match entry {
                ArchiveEntry::File { path, data } => Some((path, data.to_vec())),
                ArchiveEntry::Directory(_) => None,
            })
            .collect()
    }

    fn dirs_of(archive: &[u8]) -> Vec<String> {
        read_archive(archive)
            .unwrap()
            .into_iter()
            .filter_map(|entry| match entry {
                ArchiveEntry::Directory(path) => Some(path),
                ArchiveEntry::File { .. } => None,
            })
            .collect()
    }

    fn encode(archive: &[u8]) -> (Vec<u8>, PackKey) {
        let encoded = encode_pack(archive, None, None, &NoProgress).unwrap();
        (encoded.archive, encoded.key)
    }

    fn decode(archive: &[u8], key: &str) -> Result<Vec<u8>, PackError> {
        decode_pack(archive, key, DecodeOptions::default(), None, &NoProgress).map(|d| d.archive)
    }

    fn scenario_a() -> Vec<u8> {
        let manifest = pack_manifest();
        build(
            &[],
            &[
                ("manifest.json", &manifest),
                ("a.txt", b"alpha contents"),
                ("pack_icon.png", b"\x89PNG fake icon"),
            ],
        )
    }

    // ---- Scenario A ----

    #[test]
    fn excluded_files_stay_verbatim_and_others_are_encrypted() {
        let source = scenario_a();
        let (encoded, master) = encode(&source);
        let out = files_of(&encoded);

        assert_eq!(out["manifest.json"], pack_manifest());
        assert_eq!(out["pack_icon.png"], b"\x89PNG fake icon");
        assert_ne!(out["a.txt"], b"alpha contents");
        assert_eq!(out["a.txt"].len(), b"alpha contents".len());

        let (header, manifest) = ContentManifest::open(&out["contents.json"], &master).unwrap();
        assert_eq!(header.content_id, CONTENT_ID);

        let entries: Vec<(&str, bool)> = manifest
            .content
            .iter()
            .map(|e| (e.path.as_str(), e.is_encrypted()))
            .collect();
        assert_eq!(entries, vec![("manifest.json", false), ("a.txt", true), ("pack_icon.png", false)]);

        let entry_key = PackKey::parse(manifest.content[1].key.as_deref().unwrap()).unwrap();
        assert_ne!(entry_key, master);
        assert_eq!(decrypt(&out["a.txt"], &entry_key).unwrap(), b"alpha contents");
    }

    #[test]
    fn scenario_a_round_trips() {
        let source = scenario_a();
        let (encoded, master) = encode(&source);
        let decoded = decode(&encoded, master.as_str()).unwrap();
        assert_eq!(files_of(&decoded), files_of(&source));
    }

    #[test]
    fn supplied_master_key_is_used() {
        let master = generate_key();
        let encoded = encode_pack(&scenario_a(), Some(master), None, &NoProgress).unwrap();
        assert_eq!(encoded.key, master);
        assert!(decode(&encoded.archive, master.as_str()).is_ok());
    }

    // ---- Scenario B ----

    #[test]
    fn subpacks_get_their_own_manifest() {
        let manifest = pack_manifest();
        let source = build(
            &["subpacks/", "subpacks/foo/"],
            &[("manifest.json", &manifest), ("subpacks/foo/b.txt", b"bravo")],
        );
        let (encoded, master) = encode(&source);
        let out = files_of(&encoded);

        let (_, root) = ContentManifest::open(&out["contents.json"], &master).unwrap();
        assert!(root.content.iter().all(|e| !e.path.contains("b.txt")));

        let (header, sub) = ContentManifest::open(&out["subpacks/foo/contents.json"], &master).unwrap();
        assert_eq!(header.content_id, CONTENT_ID);
        assert_eq!(sub.content.len(), 1);
        assert_eq!(sub.content[0].path, "b.txt");
        assert!(sub.content[0].is_encrypted());

        let decoded = decode(&encoded, master.as_str()).unwrap();
        assert_eq!(files_of(&decoded), files_of(&source));
        assert_eq!(dirs_of(&decoded), vec!["subpacks/", "subpacks/foo/"]);
    }

    #[test]
    fn subpack_roots_found_without_directory_entries() {
        let manifest = pack_manifest();
        let source = build(
            &[],
            &[
                ("manifest.json", &manifest),
                ("subpacks/low/textures/t.png", b"low"),
                ("subpacks/high/textures/t.png", b"high"),
                ("subpacks/high/manifest.json", b"{}"),
            ],
        );
        let (encoded, master) = encode(&source);
        let out = files_of(&encoded);

        assert!(out.contains_key("subpacks/low/contents.json"));
        assert!(out.contains_key("subpacks/high/contents.json"));
        // Exclusion is relative to the subpack root.
        assert_eq!(out["subpacks/high/manifest.json"], b"{}");

        let decoded = decode(&encoded, master.as_str()).unwrap();
        assert_eq!(files_of(&decoded), files_of(&source));
    }

    // ---- Scenario C ----

    #[test]
    fn short_key_is_rejected_before_decryption() {
        let (encoded, master) = encode(&scenario_a());
        let short = &master.as_str()[..31];

        let err = decode(&encoded, short).unwrap_err();
        assert!(matches!(err, PackError::Key(KeyError::InvalidLength { expected: 32, actual: 31 })), "{err:?}");
    }

    #[test]
    fn wrong_key_is_a_key_error() {
        let (encoded, _) = encode(&scenario_a());
        let err = decode(&encoded, generate_key().as_str()).unwrap_err();
        assert!(err.is_key_error(), "{err:?}");
    }

    // ---- Failure modes ----

    #[test]
    fn missing_pack_manifest_is_a_format_error() {
        let source = build(&[], &[("a.txt", b"alpha")]);
        let err = encode_pack(&source, None, None, &NoProgress).unwrap_err();
        assert!(err.is_format_error(), "{err:?}");
    }

    #[test]
    fn non_zip_input_is_a_format_error() {
        let err = encode_pack(b"definitely not a zip", None, None, &NoProgress).unwrap_err();
        assert!(err.is_format_error(), "{err:?}");
    }

    #[test]
    fn absent_content_manifest_is_a_format_error() {
        let err = decode(&scenario_a(), generate_key().as_str()).unwrap_err();
        assert!(err.is_format_error(), "{err:?}");
    }

    #[test]
    fn undersized_content_manifest_is_a_format_error() {
        let manifest = pack_manifest();
        let source = build(&[], &[("manifest.json", &manifest), ("contents.json", &[0u8; 100])]);
        let err = decode(&source, generate_key().as_str()).unwrap_err();
        assert!(err.is_format_error(), "{err:?}");
    }

    #[test]
    fn entry_listed_but_absent_is_reported() {
        let (encoded, master) = encode(&scenario_a());

        let mut stripped = ArchiveBuilder::new();
        for entry in read_archive(&encoded).unwrap() {
            if let ArchiveEntry::File { path, data } = entry {
                if path != "a.txt" {
                    stripped.add_file(&path, &data).unwrap();
                }
            }
        }
        let stripped = stripped.finish().unwrap();

        let err = decode(&stripped, master.as_str()).unwrap_err();
        match err {
            PackError::MissingEntry { path } => assert_eq!(path, "a.txt"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn stale_content_manifest_in_source_is_replaced() {
        let manifest = pack_manifest();
        let source = build(&[], &[("manifest.json", &manifest), ("contents.json", b"old")]);
        let (encoded, master) = encode(&source);
        let out = files_of(&encoded);
        assert!(ContentManifest::open(&out["contents.json"], &master).is_ok());
    }

    // ---- Options ----

    #[test]
    fn preserve_manifest_embeds_plain_json() {
        let (encoded, master) = encode(&scenario_a());
        let options = DecodeOptions { preserve_manifest: true };
        let decoded = decode_pack(&encoded, master.as_str(), options, None, &NoProgress).unwrap();
        let out = files_of(&decoded.archive);

        let manifest: ContentManifest = serde_json::from_slice(&out["contents.json"]).unwrap();
        assert_eq!(manifest.content.len(), 3);
    }

    #[test]
    fn directories_are_preserved() {
        let manifest = pack_manifest();
        let source = build(&["textures/"], &[("manifest.json", &manifest), ("textures/a.png", b"img")]);
        let (encoded, master) = encode(&source);
        assert_eq!(dirs_of(&encoded), vec!["textures/"]);
        assert_eq!(dirs_of(&decode(&encoded, master.as_str()).unwrap()), vec!["textures/"]);
    }

    #[test]
    fn counters_reflect_the_run() {
        let encoded = encode_pack(&scenario_a(), None, None, &NoProgress).unwrap();
        assert_eq!(encoded.counters.entries_encrypted, 1);
        assert_eq!(encoded.counters.entries_verbatim, 2);
        assert_eq!(encoded.counters.bytes_out, encoded.archive.len() as u64);
        assert_eq!(encoded.counters.sequential_fallbacks, 0);
    }

    #[test]
    fn progress_reaches_one_hundred() {
        let (tx, rx) = crossbeam::channel::unbounded::<ProgressUpdate>();
        encode_pack(&scenario_a(), None, None, &tx).unwrap();
        let updates: Vec<_> = rx.try_iter().collect();
        assert!(!updates.is_empty());
        assert!(updates.windows(2).all(|w| w[0].percent <= w[1].percent));
        assert_eq!(updates.last().map(|u| u.percent), Some(100));
    }

    // ---- Pool-backed runs ----

    #[test]
    fn pool_and_sequential_runs_are_interchangeable() {
        let pool = WorkerPool::new(&PoolConfig { max_units: Some(2), ..PoolConfig::default() }).unwrap();
        let manifest = pack_manifest();
        let files: Vec<(String, Vec<u8>)> = (0..20)
            .map(|i| (format!("data/file_{i}.bin"), vec![i as u8; 100 + i]))
            .collect();
        let mut all: Vec<(&str, &[u8])> = vec![("manifest.json", &manifest)];
        all.extend(files.iter().map(|(p, d)| (p.as_str(), d.as_slice())));
        let source = build(&[], &all);

        let encoded = encode_pack(&source, None, Some(&pool), &NoProgress).unwrap();
        let decoded = decode_pack(&encoded.archive, encoded.key.as_str(), DecodeOptions::default(), None, &NoProgress).unwrap();
        assert_eq!(files_of(&decoded.archive), files_of(&source));

        let decoded = decode_pack(&encoded.archive, encoded.key.as_str(), DecodeOptions::default(), Some(&pool), &NoProgress).unwrap();
        assert_eq!(files_of(&decoded.archive), files_of(&source));
    }

    #[test]
    fn shut_down_pool_falls_back_to_sequential() {
        crate::common::init_tracing();
        let pool = WorkerPool::new(&PoolConfig { max_units: Some(1), ..PoolConfig::default() }).unwrap();
        pool.shutdown();

        let encoded = encode_pack(&scenario_a(), None, Some(&pool), &NoProgress).unwrap();
        assert_eq!(encoded.counters.sequential_fallbacks, 1);
        assert!(decode(&encoded.archive, encoded.key.as_str()).is_ok());
    }

    // ---- Properties ----

    fn file_map() -> impl Strategy<Value = BTreeMap<String, Vec<u8>>> {
        prop::collection::btree_map(
            "[a-z]{1,8}(/[a-z]{1,8})?\\.bin",
            prop::collection::vec(any::<u8>(), 0..256),
            1..8,
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn decode_inverts_encode(files in file_map(), icon in prop::collection::vec(any::<u8>(), 0..64)) {
            let manifest = pack_manifest();
            let mut all: Vec<(&str, &[u8])> = vec![("manifest.json", &manifest), ("pack_icon.png", &icon)];
            all.extend(files.iter().map(|(p, d)| (p.as_str(), d.as_slice())));
            let source = build(&[], &all);

            let (encoded, master) = encode(&source);
            let out = files_of(&encoded);
            prop_assert_eq!(&out["manifest.json"], &manifest);
            prop_assert_eq!(&out["pack_icon.png"], &icon);

            let decoded = decode(&encoded, master.as_str()).unwrap();
            prop_assert_eq!(files_of(&decoded), files_of(&source));
        }
    }
}

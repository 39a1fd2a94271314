use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use depot_store::{Artifact, CacheStore};
use depot_verify::digest_bytes;
use tempfile::tempdir;

fn payload() -> Vec<u8> { (0..256 * 1024u32).map(|i| (i % 241) as u8).collect() }

#[test]
fn test_racing_commits_of_same_artifact_are_idempotent() {
    let dir = tempdir().unwrap();
    let store = Arc::new(CacheStore::new(dir.path()));
    let data = Arc::new(payload());
    let artifact = Artifact::new("https://example.com/big.bin", digest_bytes(&data));

    let writers: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            let data = Arc::clone(&data);
            let artifact = artifact.clone();
            thread::spawn(move || {
                let staged = store.stage().unwrap();
                staged.writer().unwrap().write_all(&data).unwrap();
                store.commit(staged, &artifact).unwrap()
            })
        })
        .collect();

    let paths: Vec<_> = writers.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(paths.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(store.lookup(&artifact).unwrap(), Some(paths[0].clone()));
}

#[test]
fn test_readers_never_observe_partial_files() {
    let dir = tempdir().unwrap();
    let store = Arc::new(CacheStore::new(dir.path()));
    let data = Arc::new(payload());
    let artifact = Artifact::new("https://example.com/big.bin", digest_bytes(&data));
    let target = store.location_for(&artifact).unwrap().file;
    let done = Arc::new(AtomicBool::new(false));

    let reader = {
        let done = Arc::clone(&done);
        let data = Arc::clone(&data);
        let target = target.clone();
        thread::spawn(move || {
            while !done.load(Ordering::Acquire) {
                if let Ok(seen) = std::fs::read(&target) {
                    assert_eq!(seen.len(), data.len(), "observed a partial file");
                }
            }
        })
    };

    for _ in 0..20 {
        let staged = store.stage().unwrap();
        let mut writer = staged.writer().unwrap();
        // Write in pieces so a non-atomic install would be visible mid-way.
        for chunk in data.chunks(4096) {
            writer.write_all(chunk).unwrap();
        }
        drop(writer);
        store.commit(staged, &artifact).unwrap();
    }

    done.store(true, Ordering::Release);
    reader.join().unwrap();
    assert_eq!(std::fs::read(&target).unwrap(), *data);
}

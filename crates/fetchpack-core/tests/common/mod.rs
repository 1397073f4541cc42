#![allow(dead_code)]

pub mod file_server;

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use fetchpack_core::model::{Job, JobId};
use fetchpack_core::store::JobStore;

/// Polls until the job leaves `pending`/`running`.
pub async fn wait_terminal(store: &JobStore, id: &JobId) -> Job {
    for _ in 0..1000 {
        let job = store.get_job(id).expect("job exists");
        if job.status.is_terminal() {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} did not finish", id);
}

/// Entry name to contents for every entry in a zip file.
pub fn read_zip(path: &Path) -> BTreeMap<String, Vec<u8>> {
    use std::io::Read;

    let file = std::fs::File::open(path).expect("open archive");
    let mut archive = zip::ZipArchive::new(file).expect("valid zip");
    let mut out = BTreeMap::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).unwrap();
        let mut data = Vec::new();
        entry.read_to_end(&mut data).unwrap();
        out.insert(entry.name().to_string(), data);
    }
    out
}

//! Splitting a corpus across workers and merging what they produce
//!
//! Workers share nothing in memory. Before they start, the filters they need are written to the
//! scratch directory under their role names; each worker reads its own copy, scans its group of
//! files and writes its partial result to an artifact named after the process and worker. Once
//! every worker has returned, the coordinator reads each artifact exactly once, merges them and
//! removes the scratch directory.
//!
//! A worker that fails to leave an artifact behind does not stop the build. Its index is reported
//! in the `Outcome` so the caller can tell a complete result from an under-counted one.
use crate::errors::*;
use crate::persist;
use crate::vocab::Vocab;
use rayon::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::process;

pub const TARGET_VOCAB: &str = "target.vocab";
pub const CONTEXT_VOCAB: &str = "context.vocab";

/// A result that can be built for part of a corpus and merged with the other parts
pub trait Partial: Serialize + DeserializeOwned + Default + Send {
    /// Combine partial results; an empty list gives the empty result
    fn merge_all(parts: Vec<Self>) -> Self;
}

impl Partial for Vocab {
    fn merge_all(parts: Vec<Self>) -> Self {
        Vocab::merge_all(parts)
    }
}

/// The vocabularies every worker starts from
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Filters {
    pub targets: Vocab,
    pub contexts: Vocab,
}

impl Filters {
    pub fn new(targets: Vocab, contexts: Vocab) -> Self {
        Filters { targets, contexts }
    }

    pub fn publish(&self, scratch: &Scratch) -> Result<()> {
        scratch.save(TARGET_VOCAB, &self.targets)?;
        scratch.save(CONTEXT_VOCAB, &self.contexts)
    }

    pub fn fetch(scratch: &Scratch) -> Result<Filters> {
        Ok(Filters {
            targets: scratch.load(TARGET_VOCAB)?,
            contexts: scratch.load(CONTEXT_VOCAB)?,
        })
    }
}

/// A merged result and the workers whose part is missing from it
#[derive(Debug)]
pub struct Outcome<T> {
    pub result: T,
    pub failed_workers: Vec<usize>,
}

impl<T> Outcome<T> {
    pub fn complete(result: T) -> Self {
        Outcome {
            result,
            failed_workers: vec![],
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed_workers.is_empty()
    }

    /// The result, logging a warning if some of it is missing
    pub fn into_result(self) -> T {
        if !self.is_complete() {
            warn!(
                "Result is missing the output of worker(s) {:?}; counts are incomplete",
                self.failed_workers
            );
        }
        self.result
    }
}

/// Deal `items` round-robin into `groups` groups, keeping their relative order
pub fn partition<T: Clone>(items: &[T], groups: usize) -> Vec<Vec<T>> {
    let groups = groups.max(1);
    let mut out: Vec<Vec<T>> = (0..groups).map(|_| vec![]).collect();
    for (i, item) in items.iter().enumerate() {
        out[i % groups].push(item.clone());
    }
    out
}

/// A directory owned by one build for handing objects between workers
pub struct Scratch {
    dir: PathBuf,
}

impl Scratch {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Scratch { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Create the directory, emptying it if it already exists
    pub fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    pub fn save<T: Serialize>(&self, name: &str, object: &T) -> Result<()> {
        let path = self.path(name);
        persist::save(object, &path).map_err(|err| Error::ScratchIO(path, Box::new(err)))
    }

    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.path(name);
        persist::load(&path).map_err(|err| Error::ScratchIO(path, Box::new(err)))
    }

    /// Load an artifact and delete it
    pub fn take<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let object = self.load(name)?;
        if let Err(err) = fs::remove_file(self.path(name)) {
            warn!("Cannot remove tmp file {}: {}", self.path(name).display(), err);
        }
        Ok(object)
    }

    /// Remove the directory and anything left in it
    pub fn dispose(&self) {
        if let Err(err) = fs::remove_dir_all(&self.dir) {
            warn!("Cannot remove tmp folder {}: {}", self.dir.display(), err);
        }
    }
}

pub struct Coordinator {
    workers: usize,
    scratch: Scratch,
}

impl Coordinator {
    pub fn new<P: Into<PathBuf>>(workers: usize, scratch_dir: P) -> Self {
        Coordinator {
            workers: workers.max(1),
            scratch: Scratch::new(scratch_dir),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn scratch(&self) -> &Scratch {
        &self.scratch
    }

    /// Run `build` over `files`, split across the workers, and merge the parts
    ///
    /// With a single worker `build` runs here on every file and its error, if any, is returned.
    /// Otherwise errors inside a worker (including a panic) only drop that worker's part.
    pub fn run<P, F>(&self, files: &[PathBuf], filters: Filters, build: F) -> Result<Outcome<P>>
    where
        P: Partial,
        F: Fn(Filters, &[PathBuf]) -> Result<P> + Sync,
    {
        if self.workers <= 1 {
            return Ok(Outcome::complete(build(filters, files)?));
        }

        self.scratch.prepare()?;
        filters.publish(&self.scratch)?;
        let groups = partition(files, self.workers);
        info!(
            "{} files over {} workers, scratch in {}",
            files.len(),
            self.workers,
            self.scratch.dir().display()
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()?;
        let pid = process::id();
        let artifacts: Vec<Result<String>> = pool.install(|| {
            groups
                .par_iter()
                .enumerate()
                .map(|(worker, group)| self.work::<P, F>(pid, worker, group, &build))
                .collect()
        });

        let mut parts = Vec::with_capacity(artifacts.len());
        let mut failed_workers = vec![];
        for (worker, artifact) in artifacts.into_iter().enumerate() {
            match artifact.and_then(|name| self.scratch.take::<P>(&name)) {
                Ok(part) => parts.push(part),
                Err(err) => {
                    error!("Worker #{} left no usable result: {}", worker, err);
                    failed_workers.push(worker);
                }
            }
        }
        info!("Merging {} partial results", parts.len());
        let result = P::merge_all(parts);
        self.scratch.dispose();
        Ok(Outcome {
            result,
            failed_workers,
        })
    }

    /// One worker: load the filters, build, and leave the part in the scratch directory
    fn work<P, F>(&self, pid: u32, worker: usize, group: &[PathBuf], build: &F) -> Result<String>
    where
        P: Partial,
        F: Fn(Filters, &[PathBuf]) -> Result<P> + Sync,
    {
        info!("Starting worker #{} of process {} on {} files", worker, pid, group.len());
        let filters = Filters::fetch(&self.scratch)?;
        let part = panic::catch_unwind(AssertUnwindSafe(|| build(filters, group)))
            .map_err(|_| Error::WorkerPanicked(worker))??;
        let name = format!("part.{}.{}", pid, worker);
        self.scratch.save(&name, &part)?;
        debug!("Worker #{} wrote {}", worker, name);
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_is_round_robin() {
        let files: Vec<u32> = (0..7).collect();
        assert_eq!(
            partition(&files, 3),
            vec![vec![0, 3, 6], vec![1, 4], vec![2, 5]]
        );
        assert_eq!(partition(&files, 1), vec![files.clone()]);
        assert_eq!(partition(&files[..1], 3), vec![vec![0], vec![], vec![]]);
        assert_eq!(partition::<u32>(&[], 0), vec![Vec::<u32>::new()]);
    }

    fn paths(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("f{}", i))).collect()
    }

    /// Counts file names, so merges are easy to check
    fn count_names(_: Filters, group: &[PathBuf]) -> Result<Vocab> {
        let mut v = Vocab::growable();
        for p in group {
            v.consider(&p.to_string_lossy());
        }
        Ok(v)
    }

    #[test]
    fn single_worker_runs_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = dir.path().join("scratch");
        let c = Coordinator::new(1, &scratch);
        let out = c.run(&paths(3), Filters::default(), count_names).unwrap();
        assert!(out.is_complete());
        assert_eq!(out.result.len(), 3);
        assert!(!scratch.exists());
    }

    #[test]
    fn parts_merge_and_scratch_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = dir.path().join("scratch");
        let c = Coordinator::new(3, &scratch);
        let out = c.run(&paths(8), Filters::default(), count_names).unwrap();
        assert!(out.is_complete());
        let single = count_names(Filters::default(), &paths(8)).unwrap();
        assert!(out.result.equal(&single));
        assert!(!scratch.exists());
    }

    #[test]
    fn workers_see_the_published_filters() {
        let dir = tempfile::tempdir().unwrap();
        let c = Coordinator::new(2, dir.path().join("scratch"));
        let filters = Filters::new(Vocab::fixed(vec!["f1"]), Vocab::growable());
        let out = c
            .run(&paths(4), filters, |f: Filters, group: &[PathBuf]| {
                let mut v = Vocab::growable();
                for p in group {
                    let name = p.to_string_lossy();
                    if f.targets.contains(&name) {
                        v.consider(&name);
                    }
                }
                Ok(v)
            })
            .unwrap();
        assert_eq!(out.result.snapshot_items(), vec!["f1"]);
    }

    #[test]
    fn failing_workers_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let c = Coordinator::new(3, dir.path().join("scratch"));
        let out = c
            .run(&paths(6), Filters::default(), |_: Filters, group: &[PathBuf]| {
                if group.iter().any(|p| p == Path::new("f1")) {
                    return Err(Error::Other("boom".to_string()));
                }
                if group.iter().any(|p| p == Path::new("f2")) {
                    panic!("worker crashed");
                }
                count_names(Filters::default(), group)
            })
            .unwrap();
        assert_eq!(out.failed_workers, vec![1, 2]);
        assert_eq!(out.result.snapshot_items(), vec!["f0", "f3"]);
        assert!(!out.is_complete());
    }

    /// Saves fine, but the unreadable variant cannot be loaded back
    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    enum Names {
        #[default]
        Empty,
        Some(Vec<String>),
        #[serde(skip_deserializing)]
        Unreadable,
    }

    impl Partial for Names {
        fn merge_all(parts: Vec<Self>) -> Self {
            let mut all: Vec<String> = parts
                .into_iter()
                .flat_map(|p| match p {
                    Names::Some(names) => names,
                    _ => vec![],
                })
                .collect();
            all.sort();
            Names::Some(all)
        }
    }

    #[test]
    fn unreadable_artifacts_drop_only_their_worker() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = dir.path().join("scratch");
        let c = Coordinator::new(3, &scratch);
        let out = c
            .run(&paths(6), Filters::default(), |_: Filters, group: &[PathBuf]| {
                if group.contains(&PathBuf::from("f1")) {
                    return Ok(Names::Unreadable);
                }
                Ok(Names::Some(group.iter().map(|p| p.to_string_lossy().into_owned()).collect()))
            })
            .unwrap();
        assert_eq!(out.failed_workers, vec![1]);
        assert_eq!(out.result, Names::Some(vec!["f0".into(), "f2".into(), "f3".into(), "f5".into()]));
        assert!(!scratch.exists());
    }

    #[test]
    fn prepare_clears_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let s = Scratch::new(dir.path().join("s"));
        fs::create_dir_all(s.dir().join("old")).unwrap();
        fs::write(s.path("stale.part"), "x").unwrap();
        s.prepare().unwrap();
        assert_eq!(fs::read_dir(s.dir()).unwrap().count(), 0);
        s.save("v", &7u32).unwrap();
        assert_eq!(s.take::<u32>("v").unwrap(), 7);
        assert!(matches!(s.load::<u32>("v"), Err(Error::ScratchIO(_, _))));
        s.dispose();
        assert!(!s.dir().exists());
    }
}

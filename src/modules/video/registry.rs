use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // The guarded collections stay consistent even if a holder panicked.
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Local paths currently owned by a running job.
#[derive(Clone, Default)]
pub struct InFlightJobs {
    keys: Arc<Mutex<HashSet<String>>>,
}

impl InFlightJobs {
    /// Atomically claims every path in `paths`, or none of them. `None` means
    /// at least one path is owned by another job.
    pub fn try_claim<'a, I>(&self, paths: I) -> Option<JobClaim>
    where
        I: IntoIterator<Item = &'a Path>,
    {
        let wanted: Vec<String> = paths.into_iter().map(path_key).collect();

        let mut keys = lock(&self.keys);
        if wanted.iter().any(|k| keys.contains(k)) {
            return None;
        }
        keys.extend(wanted.iter().cloned());
        drop(keys);

        Some(JobClaim {
            owned: wanted,
            keys: self.keys.clone(),
        })
    }

    #[cfg(test)]
    pub fn is_claimed(&self, path: &Path) -> bool {
        lock(&self.keys).contains(&path_key(path))
    }
}

fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Releases its paths on drop.
pub struct JobClaim {
    owned: Vec<String>,
    keys: Arc<Mutex<HashSet<String>>>,
}

impl Drop for JobClaim {
    fn drop(&mut self) {
        let mut keys = lock(&self.keys);
        for key in &self.owned {
            keys.remove(key);
        }
    }
}

/// Local files that cleanup could not delete, grouped by job key.
#[derive(Clone, Default)]
pub struct ReclaimLedger {
    entries: Arc<Mutex<HashMap<String, Vec<PathBuf>>>>,
}

impl ReclaimLedger {
    pub fn record(&self, key: &str, paths: Vec<PathBuf>) {
        lock(&self.entries).insert(key.to_string(), paths);
    }

    pub fn forget(&self, key: &str) {
        lock(&self.entries).remove(key);
    }

    pub fn snapshot(&self) -> Vec<(String, Vec<PathBuf>)> {
        lock(&self.entries)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }
}

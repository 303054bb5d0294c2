//! Mock remote store implementation for testing

use crate::keys::remote_parent_dir;
use crate::traits::{
    EntryKind, RemoteConnection, RemoteConnector, RemoteEntry, RemoteError, RemoteResult,
};
use crate::RemoteStoreBackend;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct MockState {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
    connect_attempts: usize,
    connect_failures_remaining: usize,
    hang_connects: bool,
    hang_puts: bool,
    size_hangs_remaining: usize,
    binary_mode_hangs_remaining: usize,
    binary_mode_set: bool,
    fail_binary_mode: bool,
    close_calls: usize,
    blocked_dirs: Vec<String>,
    failing_puts: HashSet<String>,
    failing_rmdirs: HashSet<String>,
    size_overrides: HashMap<String, u64>,
    fail_size: bool,
    fail_list: bool,
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

impl MockState {
    fn add_dir_with_ancestors(&mut self, path: &str) {
        let mut current = normalize(path);
        loop {
            self.dirs.insert(current.clone());
            if current == "/" || current == "." {
                break;
            }
            current = remote_parent_dir(&current);
        }
    }

    fn is_blocked(&self, path: &str) -> bool {
        self.blocked_dirs
            .iter()
            .any(|b| path == b || path.starts_with(&format!("{}/", b)))
    }

    fn children(&self, dir: &str) -> Vec<RemoteEntry> {
        let dir = normalize(dir);
        let mut entries = Vec::new();

        for sub in &self.dirs {
            if sub != &dir && remote_parent_dir(sub) == dir {
                entries.push(RemoteEntry {
                    name: sub.rsplit('/').next().unwrap_or_default().to_string(),
                    kind: EntryKind::Directory,
                    size: 0,
                    modified_at: None,
                });
            }
        }
        for (path, data) in &self.files {
            if remote_parent_dir(path) == dir {
                entries.push(RemoteEntry {
                    name: path.rsplit('/').next().unwrap_or_default().to_string(),
                    kind: EntryKind::File,
                    size: data.len() as u64,
                    modified_at: None,
                });
            }
        }
        entries
    }
}

/// In-memory remote store shared by every connection it hands out
#[derive(Clone, Default)]
pub struct MockRemoteStore {
    state: Arc<Mutex<MockState>>,
}

impl MockRemoteStore {
    pub fn new() -> Self {
        let store = Self::default();
        store.state.lock().unwrap().dirs.insert("/".to_string());
        store
    }

    /// Connector handing out connections to this store
    pub fn connector(&self) -> Arc<dyn RemoteConnector> {
        Arc::new(MockConnector {
            state: self.state.clone(),
        })
    }

    /// Set a file in the mock store (parent directories are created)
    pub fn set_file(&self, path: &str, data: Vec<u8>) {
        let mut state = self.state.lock().unwrap();
        state.add_dir_with_ancestors(&remote_parent_dir(path));
        state.files.insert(path.to_string(), data);
    }

    /// Create a directory (and its ancestors)
    pub fn add_dir(&self, path: &str) {
        self.state.lock().unwrap().add_dir_with_ancestors(path);
    }

    /// Get file data (for test assertions)
    pub fn get_file(&self, path: &str) -> Option<Vec<u8>> {
        self.state.lock().unwrap().files.get(path).cloned()
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.state.lock().unwrap().dirs.contains(&normalize(path))
    }

    /// Fail the next `n` connect attempts
    pub fn fail_next_connects(&self, n: usize) {
        self.state.lock().unwrap().connect_failures_remaining = n;
    }

    /// Make connect attempts never complete
    pub fn hang_connects(&self, hang: bool) {
        self.state.lock().unwrap().hang_connects = hang;
    }

    /// Make uploads never complete
    pub fn hang_puts(&self, hang: bool) {
        self.state.lock().unwrap().hang_puts = hang;
    }

    /// Make the next `n` size queries never complete
    pub fn hang_next_size_queries(&self, n: usize) {
        self.state.lock().unwrap().size_hangs_remaining = n;
    }

    /// Make the next `n` binary mode commands never complete
    pub fn hang_next_binary_modes(&self, n: usize) {
        self.state.lock().unwrap().binary_mode_hangs_remaining = n;
    }

    pub fn fail_binary_mode(&self, fail: bool) {
        self.state.lock().unwrap().fail_binary_mode = fail;
    }

    /// Make `ensure_dir` fail for `path` and everything below it
    pub fn fail_ensure_dir(&self, path: &str) {
        self.state
            .lock()
            .unwrap()
            .blocked_dirs
            .push(normalize(path));
    }

    pub fn fail_put(&self, remote_path: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_puts
            .insert(remote_path.to_string());
    }

    pub fn fail_remove_dir(&self, path: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_rmdirs
            .insert(normalize(path));
    }

    /// Report `size` for `remote_path` regardless of its stored length
    pub fn override_size(&self, remote_path: &str, size: u64) {
        self.state
            .lock()
            .unwrap()
            .size_overrides
            .insert(remote_path.to_string(), size);
    }

    pub fn fail_size_queries(&self, fail: bool) {
        self.state.lock().unwrap().fail_size = fail;
    }

    pub fn fail_listing(&self, fail: bool) {
        self.state.lock().unwrap().fail_list = fail;
    }

    pub fn connect_attempts(&self) -> usize {
        self.state.lock().unwrap().connect_attempts
    }

    pub fn close_calls(&self) -> usize {
        self.state.lock().unwrap().close_calls
    }

    pub fn binary_mode_set(&self) -> bool {
        self.state.lock().unwrap().binary_mode_set
    }
}

/// Connector for [`MockRemoteStore`]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl RemoteConnector for MockConnector {
    async fn connect(&self) -> RemoteResult<Box<dyn RemoteConnection>> {
        let (attempt, hang, fail) = {
            let mut state = self.state.lock().unwrap();
            state.connect_attempts += 1;
            let fail = state.connect_failures_remaining > 0;
            if fail {
                state.connect_failures_remaining -= 1;
            }
            (state.connect_attempts, state.hang_connects, fail)
        };

        if hang {
            std::future::pending::<()>().await;
        }
        if fail {
            return Err(RemoteError::Backend(format!(
                "connection refused (connect attempt {})",
                attempt
            )));
        }

        Ok(Box::new(MockConnection {
            state: self.state.clone(),
            dead: false,
        }))
    }

    fn backend_type(&self) -> RemoteStoreBackend {
        RemoteStoreBackend::Local
    }

    fn endpoint(&self) -> String {
        "mock://remote".to_string()
    }
}

/// A command that never completes leaves the connection dead, like a blocking
/// FTP stream whose worker never returned.
struct MockConnection {
    state: Arc<Mutex<MockState>>,
    dead: bool,
}

impl MockConnection {
    fn ensure_alive(&self) -> RemoteResult<()> {
        if self.dead {
            return Err(RemoteError::NotConnected);
        }
        Ok(())
    }

    async fn hang(&mut self) {
        self.dead = true;
        std::future::pending::<()>().await;
    }

    fn take_hang(counter: &mut usize) -> bool {
        if *counter > 0 {
            *counter -= 1;
            true
        } else {
            false
        }
    }
}

#[async_trait]
impl RemoteConnection for MockConnection {
    async fn set_binary_mode(&mut self) -> RemoteResult<()> {
        self.ensure_alive()?;
        let hang = Self::take_hang(&mut self.state.lock().unwrap().binary_mode_hangs_remaining);
        if hang {
            self.hang().await;
        }

        let mut state = self.state.lock().unwrap();
        if state.fail_binary_mode {
            return Err(RemoteError::Backend("504 TYPE not implemented".to_string()));
        }
        state.binary_mode_set = true;
        Ok(())
    }

    async fn ensure_dir(&mut self, path: &str) -> RemoteResult<()> {
        self.ensure_alive()?;
        let mut state = self.state.lock().unwrap();
        let path = normalize(path);
        if state.is_blocked(&path) {
            return Err(RemoteError::Backend(format!(
                "550 {}: Permission denied",
                path
            )));
        }
        state.add_dir_with_ancestors(&path);
        Ok(())
    }

    async fn put_file(&mut self, local_path: &Path, remote_path: &str) -> RemoteResult<u64> {
        self.ensure_alive()?;
        let hang = self.state.lock().unwrap().hang_puts;
        if hang {
            self.hang().await;
        }

        let data = tokio::fs::read(local_path).await?;

        let mut state = self.state.lock().unwrap();
        if state.failing_puts.contains(remote_path) {
            return Err(RemoteError::Backend(
                "552 Exceeded storage allocation".to_string(),
            ));
        }
        if !state.dirs.contains(&remote_parent_dir(remote_path)) {
            return Err(RemoteError::NotFound(remote_parent_dir(remote_path)));
        }
        let len = data.len() as u64;
        state.files.insert(remote_path.to_string(), data);
        Ok(len)
    }

    async fn get_file(&mut self, remote_path: &str, local_path: &Path) -> RemoteResult<u64> {
        self.ensure_alive()?;
        let data = self
            .state
            .lock()
            .unwrap()
            .files
            .get(remote_path)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(remote_path.to_string()))?;
        tokio::fs::write(local_path, &data).await?;
        Ok(data.len() as u64)
    }

    async fn size(&mut self, remote_path: &str) -> RemoteResult<u64> {
        self.ensure_alive()?;
        let hang = Self::take_hang(&mut self.state.lock().unwrap().size_hangs_remaining);
        if hang {
            self.hang().await;
        }

        let state = self.state.lock().unwrap();
        if state.fail_size {
            return Err(RemoteError::Backend("502 SIZE not implemented".to_string()));
        }
        if let Some(size) = state.size_overrides.get(remote_path) {
            return Ok(*size);
        }
        state
            .files
            .get(remote_path)
            .map(|data| data.len() as u64)
            .ok_or_else(|| RemoteError::NotFound(remote_path.to_string()))
    }

    async fn list(&mut self, path: &str) -> RemoteResult<Vec<RemoteEntry>> {
        self.ensure_alive()?;
        let state = self.state.lock().unwrap();
        if state.fail_list {
            return Err(RemoteError::Backend("425 Can't open data connection".to_string()));
        }
        if !state.dirs.contains(&normalize(path)) {
            return Err(RemoteError::NotFound(path.to_string()));
        }
        Ok(state.children(path))
    }

    async fn remove_file(&mut self, remote_path: &str) -> RemoteResult<()> {
        self.ensure_alive()?;
        self.state
            .lock()
            .unwrap()
            .files
            .remove(remote_path)
            .map(|_| ())
            .ok_or_else(|| RemoteError::NotFound(remote_path.to_string()))
    }

    async fn remove_dir(&mut self, path: &str) -> RemoteResult<()> {
        self.ensure_alive()?;
        let mut state = self.state.lock().unwrap();
        let path = normalize(path);
        if state.failing_rmdirs.contains(&path) {
            return Err(RemoteError::Backend(format!("550 {}: Permission denied", path)));
        }
        if !state.dirs.contains(&path) {
            return Err(RemoteError::NotFound(path));
        }
        if !state.children(&path).is_empty() {
            return Err(RemoteError::Backend(format!("550 {}: Directory not empty", path)));
        }
        state.dirs.remove(&path);
        Ok(())
    }

    async fn close(&mut self) -> RemoteResult<()> {
        self.state.lock().unwrap().close_calls += 1;
        Ok(())
    }
}

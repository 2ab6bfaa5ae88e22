//! Git-binary-backed [`RefStore`] adapter.
//!
//! Maps the abstract contract onto git plumbing, one subprocess per
//! operation:
//!
//! - `put` → `hash-object -w` + `update-ref refs/{path}`, then a
//!   best-effort push of the ref to the configured share remote
//! - `get` → `cat-file blob`
//! - `list_prefix` → `ls-remote {remote} refs/{prefix}*`, prefetching
//!   listed objects that are not yet local
//! - `create_branch` → blob + temporary-index `write-tree` +
//!   `commit-tree` + creation-only `update-ref`
//! - `merge_branch` / `delete_branch` → `merge --no-ff` / `branch -D`
//!
//! Remote-facing commands carry a hard timeout; a timed-out or failing
//! remote surfaces as `StoreError::Unreachable` so tallies skip it.

mod runner;

pub use runner::GitCmdError;

use plenum_store::{ContentRef, RefStore, StoreError};
use plenum_types::RemoteName;
use runner::run_git;
use std::path::PathBuf;
use std::time::Duration;

/// Default per-command deadline, matching the protocol's conservative
/// remote read timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// A participant's git repository as a [`RefStore`].
pub struct GitRefStore {
    repo: PathBuf,
    /// Remote to propagate freshly written refs to. Propagation is
    /// best-effort: the local write is durable before `put` returns and a
    /// failed push only logs.
    push_remote: Option<String>,
    timeout: Duration,
}

impl GitRefStore {
    pub fn open(repo: impl Into<PathBuf>) -> Self {
        Self {
            repo: repo.into(),
            push_remote: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_push_remote(mut self, remote: impl Into<String>) -> Self {
        self.push_remote = Some(remote.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn git(&self, args: &[&str]) -> Result<Vec<u8>, GitCmdError> {
        run_git(&self.repo, args, None, &[], self.timeout)
    }

    fn git_stdin(&self, args: &[&str], stdin: &[u8]) -> Result<Vec<u8>, GitCmdError> {
        run_git(&self.repo, args, Some(stdin), &[], self.timeout)
    }

    fn git_env(&self, args: &[&str], envs: &[(&str, &str)]) -> Result<Vec<u8>, GitCmdError> {
        run_git(&self.repo, args, None, envs, self.timeout)
    }

    fn backend(e: GitCmdError) -> StoreError {
        StoreError::Backend(e.to_string())
    }

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8_lossy(&bytes).trim().to_string()
    }

    /// Whether an object is already in the local object store.
    fn has_object(&self, sha: &str) -> bool {
        self.git(&["cat-file", "-e", sha]).is_ok()
    }

    fn head_commit(&self) -> Option<String> {
        self.git(&["rev-parse", "--verify", "--quiet", "HEAD"])
            .ok()
            .map(Self::text)
            .filter(|s| !s.is_empty())
    }

    fn git_dir(&self) -> Result<PathBuf, StoreError> {
        let out = self.git(&["rev-parse", "--git-dir"]).map_err(Self::backend)?;
        let dir = PathBuf::from(Self::text(out));
        Ok(if dir.is_absolute() {
            dir
        } else {
            self.repo.join(dir)
        })
    }
}

impl RefStore for GitRefStore {
    fn put(&self, path: &str, payload: &[u8]) -> Result<ContentRef, StoreError> {
        let sha = Self::text(
            self.git_stdin(&["hash-object", "-w", "--stdin"], payload)
                .map_err(Self::backend)?,
        );
        let full_ref = format!("refs/{path}");
        self.git(&["update-ref", full_ref.as_str(), sha.as_str()])
            .map_err(Self::backend)?;

        if let Some(remote) = &self.push_remote {
            let refspec = format!("{full_ref}:{full_ref}");
            if let Err(e) = self.git(&["push", "--quiet", remote.as_str(), refspec.as_str()]) {
                tracing::warn!(%remote, %full_ref, error = %e, "best-effort ref push failed");
            }
        }
        Ok(ContentRef::new(sha))
    }

    fn get(&self, content: &ContentRef) -> Result<Vec<u8>, StoreError> {
        match self.git(&["cat-file", "blob", content.as_str()]) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.is_timeout() => Err(Self::backend(e)),
            Err(GitCmdError::Failed { .. }) => Err(StoreError::NotFound(content.to_string())),
            Err(e) => Err(Self::backend(e)),
        }
    }

    fn list_prefix(
        &self,
        remote: &RemoteName,
        prefix: &str,
    ) -> Result<Vec<(ContentRef, String)>, StoreError> {
        let pattern = format!("refs/{prefix}*");
        let out = match self.git(&["ls-remote", remote.as_str(), pattern.as_str()]) {
            Ok(out) => out,
            // A remote that cannot be listed (bad address, auth failure,
            // or a hang past the deadline) is unreachable, not fatal.
            Err(e @ GitCmdError::Timeout { .. }) | Err(e @ GitCmdError::Failed { .. }) => {
                tracing::warn!(remote = %remote, error = %e, "ls-remote failed");
                return Err(StoreError::Unreachable(remote.to_string()));
            }
            Err(e) => return Err(Self::backend(e)),
        };

        let mut listed = Vec::new();
        for line in String::from_utf8_lossy(&out).lines() {
            let mut fields = line.split_whitespace();
            let (Some(sha), Some(full_ref)) = (fields.next(), fields.next()) else {
                continue;
            };
            let Some(path) = full_ref.strip_prefix("refs/") else {
                continue;
            };
            if !self.has_object(sha) {
                // Objects live on the remote until fetched; a failed fetch
                // just means the record is skipped downstream.
                if let Err(e) = self.git(&["fetch", "--quiet", remote.as_str(), sha]) {
                    tracing::warn!(remote = %remote, sha, error = %e, "object prefetch failed");
                }
            }
            listed.push((ContentRef::new(sha.to_string()), path.to_string()));
        }
        listed.sort_by(|a, b| a.1.cmp(&b.1));
        Ok(listed)
    }

    fn create_branch(
        &self,
        name: &str,
        file_path: &str,
        payload: &[u8],
        message: &str,
    ) -> Result<(), StoreError> {
        let blob = Self::text(
            self.git_stdin(&["hash-object", "-w", "--stdin"], payload)
                .map_err(Self::backend)?,
        );

        // Build the branch tree in a throwaway index: HEAD's tree (when
        // one exists) plus the motion file, without touching the worktree.
        let index = self
            .git_dir()?
            .join(format!("plenum_index_{}", std::process::id()));
        let index_str = index.to_string_lossy().to_string();
        let env: &[(&str, &str)] = &[("GIT_INDEX_FILE", index_str.as_str())];

        let head = self.head_commit();
        let seed = match &head {
            Some(commit) => self.git_env(&["read-tree", commit.as_str()], env),
            None => self.git_env(&["read-tree", "--empty"], env),
        };
        let result = seed
            .and_then(|_| {
                let cacheinfo = format!("100644,{blob},{file_path}");
                self.git_env(
                    &["update-index", "--add", "--cacheinfo", cacheinfo.as_str()],
                    env,
                )
            })
            .and_then(|_| self.git_env(&["write-tree"], env))
            .map(Self::text)
            .and_then(|tree| match &head {
                Some(commit) => self.git(&[
                    "commit-tree",
                    tree.as_str(),
                    "-p",
                    commit.as_str(),
                    "-m",
                    message,
                ]),
                None => self.git(&["commit-tree", tree.as_str(), "-m", message]),
            })
            .map(Self::text);
        let _ = std::fs::remove_file(&index);
        let commit = result.map_err(Self::backend)?;

        // Creation-only update: the empty old-value asserts the branch
        // does not exist yet.
        let branch_ref = format!("refs/heads/{name}");
        match self.git(&["update-ref", branch_ref.as_str(), commit.as_str(), ""]) {
            Ok(_) => Ok(()),
            Err(GitCmdError::Failed { .. }) => Err(StoreError::Duplicate(name.to_string())),
            Err(e) => Err(Self::backend(e)),
        }
    }

    fn merge_branch(&self, name: &str, no_fast_forward: bool) -> Result<(), StoreError> {
        let result = if no_fast_forward {
            self.git(&["merge", "--no-ff", "--no-edit", name])
        } else {
            self.git(&["merge", "--no-edit", name])
        };
        match result {
            Ok(_) => Ok(()),
            Err(e) if e.stderr().contains("not something we can merge") => {
                Err(StoreError::NotFound(name.to_string()))
            }
            Err(e) => Err(Self::backend(e)),
        }
    }

    fn delete_branch(&self, name: &str) -> Result<(), StoreError> {
        match self.git(&["branch", "-D", name]) {
            Ok(_) => Ok(()),
            Err(e) if e.stderr().contains("not found") => {
                Err(StoreError::NotFound(name.to_string()))
            }
            Err(e) => Err(Self::backend(e)),
        }
    }
}

//! Storage back-end for FTP sessions.
//!
//! Wraps the engine's filesystem back-end so that a fresh upload of a root-level file is
//! staged under `.partial/` and renamed into place, the same way the REST front-end writes.
//! A reader of the shared store therefore never sees a half-transferred FTP upload.

use std::fmt::Debug;
use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use filedrop_files::{discard_staged, staging_path_in, FileKey};
use libunftp::auth::UserDetail;
use libunftp::storage::{Fileinfo, Metadata, Result, StorageBackend, FEATURE_SITEMD5};
use tokio::io::{AsyncRead, AsyncWriteExt, BufReader};
use unftp_sbe_fs::{Filesystem, Meta};

#[derive(Debug)]
pub struct StagedFilesystem {
    inner: Filesystem,
    root: PathBuf,
}

impl StagedFilesystem {
    /// The root must exist; the engine's back-end panics otherwise.
    pub fn new(root: PathBuf) -> Self {
        Self {
            inner: Filesystem::new(root.clone()),
            root,
        }
    }

    async fn put_staged<R: AsyncRead + Unpin>(&self, key: &FileKey, input: R) -> io::Result<u64> {
        let staging_path = staging_path_in(&self.root, key)?;
        let result = match write_staged(&staging_path, input).await {
            Ok(written) => tokio::fs::rename(&staging_path, self.root.join(key.as_str()))
                .await
                .map(|()| written),
            Err(e) => Err(e),
        };
        if result.is_err() {
            discard_staged(&staging_path);
        }
        result
    }
}

async fn write_staged<R: AsyncRead + Unpin>(path: &Path, input: R) -> io::Result<u64> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    let mut reader = BufReader::new(input);
    let written = tokio::io::copy(&mut reader, &mut file).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}

/// The key for a path naming a file directly under the session root, if it is already in
/// sanitised form.
fn root_level_key(path: &Path) -> Option<FileKey> {
    let mut parts = path
        .components()
        .filter(|c| !matches!(c, Component::RootDir | Component::CurDir));
    let name = match (parts.next(), parts.next()) {
        (Some(Component::Normal(name)), None) => name.to_str()?,
        _ => return None,
    };
    FileKey::sanitize(name).ok().filter(|key| key.as_str() == name)
}

#[async_trait]
impl<User: UserDetail> StorageBackend<User> for StagedFilesystem {
    type Metadata = Meta;

    // Restarted uploads would bypass staging and write in place, so REST is not offered.
    fn supported_features(&self) -> u32 {
        FEATURE_SITEMD5
    }

    async fn metadata<P: AsRef<Path> + Send + Debug>(
        &self,
        user: &User,
        path: P,
    ) -> Result<Self::Metadata> {
        self.inner.metadata(user, path).await
    }

    async fn list<P: AsRef<Path> + Send + Debug>(
        &self,
        user: &User,
        path: P,
    ) -> Result<Vec<Fileinfo<PathBuf, Self::Metadata>>>
    where
        <Self as StorageBackend<User>>::Metadata: Metadata,
    {
        self.inner.list(user, path).await
    }

    async fn get<P: AsRef<Path> + Send + Debug>(
        &self,
        user: &User,
        path: P,
        start_pos: u64,
    ) -> Result<Box<dyn tokio::io::AsyncRead + Send + Sync + Unpin>> {
        self.inner.get(user, path, start_pos).await
    }

    async fn put<
        P: AsRef<Path> + Send + Debug,
        R: tokio::io::AsyncRead + Send + Sync + Unpin + 'static,
    >(
        &self,
        user: &User,
        input: R,
        path: P,
        start_pos: u64,
    ) -> Result<u64> {
        match root_level_key(path.as_ref()) {
            Some(key) if start_pos == 0 => {
                let written = self.put_staged(&key, input).await?;
                tracing::info!(name = %key, size = written, "stored FTP upload");
                Ok(written)
            }
            _ => self.inner.put(user, input, path, start_pos).await,
        }
    }

    async fn del<P: AsRef<Path> + Send + Debug>(&self, user: &User, path: P) -> Result<()> {
        self.inner.del(user, path).await
    }

    async fn mkd<P: AsRef<Path> + Send + Debug>(&self, user: &User, path: P) -> Result<()> {
        self.inner.mkd(user, path).await
    }

    async fn rename<P: AsRef<Path> + Send + Debug>(
        &self,
        user: &User,
        from: P,
        to: P,
    ) -> Result<()> {
        self.inner.rename(user, from, to).await
    }

    async fn rmd<P: AsRef<Path> + Send + Debug>(&self, user: &User, path: P) -> Result<()> {
        self.inner.rmd(user, path).await
    }

    async fn cwd<P: AsRef<Path> + Send + Debug>(&self, user: &User, path: P) -> Result<()> {
        self.inner.cwd(user, path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filedrop_files::STAGING_DIR_NAME;
    use libunftp::auth::DefaultUser;
    use std::sync::Arc;
    use std::time::Duration;

    fn staged_entries(root: &Path) -> usize {
        match std::fs::read_dir(root.join(STAGING_DIR_NAME)) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }

    #[test]
    fn root_level_key_accepts_only_plain_top_level_names() {
        assert_eq!(
            root_level_key(Path::new("/notes.txt")).map(|k| k.as_str().to_owned()),
            Some("notes.txt".to_owned())
        );
        assert!(root_level_key(Path::new("notes.txt")).is_some());
        assert!(root_level_key(Path::new("./notes.txt")).is_some());
        assert!(root_level_key(Path::new("/sub/notes.txt")).is_none());
        assert!(root_level_key(Path::new("/a\\b.txt")).is_none());
        assert!(root_level_key(Path::new("/")).is_none());
        assert!(root_level_key(Path::new("/..")).is_none());
    }

    #[tokio::test]
    async fn put_stages_then_renames_into_root() {
        let root = tempfile::tempdir().unwrap();
        let backend = StagedFilesystem::new(root.path().to_path_buf());

        let written = backend
            .put(&DefaultUser, &b"hello"[..], "/notes.txt", 0)
            .await
            .unwrap();

        assert_eq!(written, 5);
        assert_eq!(std::fs::read(root.path().join("notes.txt")).unwrap(), b"hello");
        assert_eq!(staged_entries(root.path()), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn overwrite_keeps_old_content_until_transfer_completes() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("report.txt");
        std::fs::write(&target, b"old report").unwrap();
        let backend = Arc::new(StagedFilesystem::new(root.path().to_path_buf()));

        let (mut tx, rx) = tokio::io::duplex(64);
        let upload = {
            let backend = Arc::clone(&backend);
            tokio::spawn(async move {
                let user = DefaultUser;
                backend.put(&user, rx, "/report.txt", 0).await
            })
        };

        tx.write_all(b"new report, ").await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(std::fs::read(&target).unwrap(), b"old report");

        tx.write_all(b"second half").await.unwrap();
        drop(tx);
        let written = upload.await.unwrap().unwrap();

        assert_eq!(written, 23);
        assert_eq!(std::fs::read(&target).unwrap(), b"new report, second half");
        assert_eq!(staged_entries(root.path()), 0);
    }

    #[tokio::test]
    async fn nested_paths_use_the_engine_directly() {
        let root = tempfile::tempdir().unwrap();
        let backend = StagedFilesystem::new(root.path().to_path_buf());

        backend.mkd(&DefaultUser, "/sub").await.unwrap();
        backend
            .put(&DefaultUser, &b"inner"[..], "/sub/a.txt", 0)
            .await
            .unwrap();

        assert_eq!(std::fs::read(root.path().join("sub/a.txt")).unwrap(), b"inner");
        assert_eq!(staged_entries(root.path()), 0);
    }
}

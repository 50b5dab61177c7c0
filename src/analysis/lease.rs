use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use tracing::{debug, warn};

use super::dto::UploadedImage;
use crate::storage::{new_upload_key, TransientStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LeaseState {
    Held,
    Released,
}

/// Ownership of one staged upload for the rest of a request.
///
/// The object is deleted at most once: [`ImageLease::release`] on the normal
/// path, [`ImageLease::release_after_failure`] from the failure handler. Both
/// check the lease state first, and the failure path also checks that the
/// object still exists.
pub struct ImageLease {
    store: Arc<dyn TransientStore>,
    key: String,
    content_type: String,
    state: LeaseState,
}

impl ImageLease {
    /// Persists the image under a fresh key.
    pub async fn acquire(store: Arc<dyn TransientStore>, image: UploadedImage) -> anyhow::Result<Self> {
        let key = new_upload_key(&image.content_type);
        if let Err(e) = store.put(&key, image.bytes).await {
            // a failed write can still leave a partial object behind
            if let Ok(true) = store.exists(&key).await {
                let _ = store.delete(&key).await;
            }
            return Err(e).with_context(|| format!("stage upload {}", key));
        }
        debug!(%key, content_type = %image.content_type, "upload staged");
        Ok(Self {
            store,
            key,
            content_type: image.content_type,
            state: LeaseState::Held,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn is_released(&self) -> bool {
        self.state == LeaseState::Released
    }

    pub async fn read(&self) -> anyhow::Result<Bytes> {
        anyhow::ensure!(!self.is_released(), "upload {} already released", self.key);
        self.store
            .read(&self.key)
            .await
            .with_context(|| format!("read upload {}", self.key))
    }

    /// Normal-path release. A failed delete leaves the lease held so the
    /// failure handler can retry once.
    pub async fn release(&mut self) -> anyhow::Result<()> {
        if self.is_released() {
            return Ok(());
        }
        self.store
            .delete(&self.key)
            .await
            .with_context(|| format!("delete upload {}", self.key))?;
        self.state = LeaseState::Released;
        debug!(key = %self.key, "upload released");
        Ok(())
    }

    /// Best-effort release from the failure handler. Never fails; a leftover
    /// object is only logged.
    pub async fn release_after_failure(&mut self) {
        if self.is_released() {
            return;
        }
        match self.store.exists(&self.key).await {
            Ok(true) => match self.store.delete(&self.key).await {
                Ok(()) => {
                    self.state = LeaseState::Released;
                    debug!(key = %self.key, "upload released after failure");
                }
                Err(e) => warn!(key = %self.key, error = %e, "could not release upload; leaving it behind"),
            },
            Ok(false) => self.state = LeaseState::Released,
            Err(e) => warn!(key = %self.key, error = %e, "could not check upload; leaving it behind"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::testing::MemoryStore;

    fn png() -> UploadedImage {
        UploadedImage {
            bytes: Bytes::from_static(b"png-bytes"),
            content_type: "image/png".into(),
        }
    }

    #[tokio::test]
    async fn acquire_stages_and_release_deletes_once() {
        let store = Arc::new(MemoryStore::default());
        let mut lease = ImageLease::acquire(store.clone(), png()).await.unwrap();
        assert_eq!(store.len(), 1);
        assert!(lease.key().ends_with(".png"));
        assert_eq!(lease.read().await.unwrap(), Bytes::from_static(b"png-bytes"));

        lease.release().await.unwrap();
        lease.release().await.unwrap();
        lease.release_after_failure().await;

        assert_eq!(store.len(), 0);
        assert_eq!(store.deletes(), 1);
        assert!(lease.read().await.is_err());
    }

    #[tokio::test]
    async fn failure_path_releases_a_held_lease() {
        let store = Arc::new(MemoryStore::default());
        let mut lease = ImageLease::acquire(store.clone(), png()).await.unwrap();
        lease.release_after_failure().await;
        assert!(lease.is_released());
        assert_eq!(store.len(), 0);
        assert_eq!(store.deletes(), 1);
    }

    #[tokio::test]
    async fn failed_delete_keeps_lease_held_and_failure_path_does_not_panic() {
        let store = Arc::new(MemoryStore::failing_deletes());
        let mut lease = ImageLease::acquire(store.clone(), png()).await.unwrap();
        assert!(lease.release().await.is_err());
        assert!(!lease.is_released());
        lease.release_after_failure().await;
        assert!(!lease.is_released());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn failure_path_skips_an_object_that_is_already_gone() {
        let store = Arc::new(MemoryStore::default());
        let mut lease = ImageLease::acquire(store.clone(), png()).await.unwrap();
        store.delete(lease.key()).await.unwrap();
        lease.release_after_failure().await;
        assert!(lease.is_released());
        assert_eq!(store.deletes(), 1);
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//! Content transfer between local files and remote items

use bytes::Bytes;
use dpn_core::{DpnError, DpnResult, Item, RemotePath};
use std::path::Path;
use tokio::fs;

use crate::navigator::Navigator;

impl Navigator {
    /// Upload `local_path` to `remote_path`, creating the remote file if
    /// needed. The remote parent folder must already exist.
    pub async fn upload(
        &self,
        local_path: impl AsRef<Path>,
        remote_path: impl Into<RemotePath>,
    ) -> DpnResult<Item> {
        let local_path = local_path.as_ref();
        let remote_path = remote_path.into();

        if !fs::try_exists(local_path).await? {
            tracing::error!("local path `{}` doesn't exist", local_path.display());
            return Err(DpnError::NotFound(local_path.display().to_string()));
        }
        if !fs::metadata(local_path).await?.is_file() {
            tracing::error!("local path `{}` is not a file", local_path.display());
            return Err(DpnError::NotAFile(local_path.display().to_string()));
        }
        // Local failures must surface before anything is created remotely
        let data = fs::read(local_path).await?;

        let target = self.touch(&remote_path).await?;
        if target.is_folder() {
            return Err(DpnError::NotAFile(remote_path.to_string()));
        }

        tracing::info!(
            "uploading {} ({} bytes) to {}",
            local_path.display(),
            data.len(),
            remote_path
        );
        self.store.write_content(&target.id, Bytes::from(data)).await
    }

    /// Write the content of `remote_path` to `local_path`
    pub async fn download(
        &self,
        remote_path: impl Into<RemotePath>,
        local_path: impl AsRef<Path>,
    ) -> DpnResult<Item> {
        let local_path = local_path.as_ref();
        let remote_path = remote_path.into();

        let item = match self.resolve(&remote_path).await {
            Ok(item) => item,
            Err(e) => {
                if e.is_not_found() {
                    tracing::error!("remote path `{}` doesn't exist", remote_path);
                }
                return Err(e);
            }
        };
        if item.is_folder() {
            return Err(DpnError::NotAFile(remote_path.to_string()));
        }

        let data = self.store.read_content(&item.id).await?;
        fs::write(local_path, &data).await?;
        tracing::info!(
            "downloaded {} ({} bytes) to {}",
            remote_path,
            data.len(),
            local_path.display()
        );
        Ok(item)
    }
}

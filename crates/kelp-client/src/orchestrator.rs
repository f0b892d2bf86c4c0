// Copyright (c) Kelp Contributors
// SPDX-License-Identifier: Apache-2.0

//! The end-to-end orchestrator: assign, resolve, transfer.

use std::{collections::HashMap, path::Path};

use kelp_core::{FileIdentifier, PackedCookie, VolumeId};
use tokio::sync::Mutex;

use crate::{
    ClientError,
    FilerClient,
    api::VolumeLocation,
    config::ClientConfig,
    master::{AssignOptions, MasterClient},
    volume::{DeleteReport, VolumeClient},
};

/// Orchestrates uploads and deletes across the master and volume servers.
///
/// Volume locations are resolved lazily through the master and cached for
/// the lifetime of the client; entries never expire, so a master that
/// rebalances volumes mid-run can leave the cache stale. The cache is keyed
/// by volume id and collection jointly, and the cache lock is held across
/// the read-check-insert so concurrent first resolution of one volume
/// issues a single lookup.
///
/// Instances are cheap to share behind an `Arc`; there is no process-wide
/// default client.
#[derive(Debug)]
pub struct StorageClient {
    master: MasterClient,
    http: reqwest::Client,
    config: ClientConfig,
    volumes: Mutex<HashMap<(VolumeId, String), VolumeLocation>>,
}

impl StorageClient {
    /// Creates a client for the given master endpoint with default
    /// configuration.
    pub fn new(master_endpoint: &str) -> Self {
        Self::with_config(ClientConfig::for_master(master_endpoint))
    }

    /// Creates a client from a full configuration.
    pub fn with_config(config: ClientConfig) -> Self {
        let http = reqwest::Client::new();
        Self {
            master: MasterClient::with_http_client(&config.master, http.clone()),
            http,
            config,
            volumes: Mutex::new(HashMap::new()),
        }
    }

    /// The master gateway this client orchestrates.
    pub fn master(&self) -> &MasterClient {
        &self.master
    }

    /// Creates a filer gateway sharing this client's HTTP client.
    pub fn filer(&self, endpoint: &str) -> FilerClient {
        FilerClient::with_http_client(endpoint, self.http.clone())
    }

    /// Assigns a fresh identifier and uploads `content` under it, returning
    /// the identifier and the number of bytes written.
    pub async fn assign_and_upload(
        &self,
        filename: &str,
        mime_type: &str,
        content: Vec<u8>,
    ) -> Result<(FileIdentifier, u64), ClientError> {
        let assignment = self.master.assign_response(&self.assign_options()).await?;
        let fid: FileIdentifier = assignment.fid.parse()?;
        let volume = self.volume_for(fid.volume_id).await?;
        // The assigned spelling is carried through verbatim; re-encoding
        // would drop leading zeros from the key.
        let size = volume
            .upload(&assignment.fid, filename, mime_type, content, 0)
            .await?;
        Ok((fid, size))
    }

    /// Uploads the file at `path` under a self-describing identifier.
    ///
    /// The master-assigned key and cookie are discarded: the key is replaced
    /// with the current time in nanoseconds and the cookie with the packed
    /// mime-class/size encoding derived from the file. This relies on the
    /// volume server accepting client-chosen keys verbatim.
    pub async fn assign_and_upload_time_keyed(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<FileIdentifier, ClientError> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                ClientError::invalid_argument(format!("'{}' has no file name", path.display()))
            })?;
        let content = tokio::fs::read(path).await?;
        let size_bytes = u64::try_from(content.len()).unwrap_or(u64::MAX);
        let mime_type = mime_guess::from_path(path).first_or_octet_stream();
        let cookie = PackedCookie::derive(
            size_bytes,
            mime_type.essence_str(),
            self.config.cookie_overflow,
        )?;

        let assigned = self.master.assign(&self.assign_options()).await?;
        let fid = assigned.with_time_key().with_cookie(cookie);
        tracing::debug!(assigned = %assigned, rekeyed = %fid, "rewrote identifier for time-keyed upload");

        let volume = self.volume_for(fid.volume_id).await?;
        volume
            .upload(
                &fid.to_string(),
                &filename,
                cookie.mime_class(),
                content,
                0,
            )
            .await?;
        Ok(fid)
    }

    /// Deletes the blob identified by `fid` and `replica_count - 1` numbered
    /// replicas, best-effort past the primary.
    ///
    /// The identifier string is passed to the volume verbatim, so
    /// non-canonical but parseable spellings keep addressing the blob they
    /// were issued for.
    pub async fn delete(&self, fid: &str, replica_count: u32) -> Result<DeleteReport, ClientError> {
        let parsed: FileIdentifier = fid.parse()?;
        let volume = self.volume_for(parsed.volume_id).await?;
        volume.delete(fid, replica_count).await
    }

    /// Resolves the blob's URLs without performing any I/O against the blob
    /// itself. Returns `(public_url, url)`.
    pub async fn locate(&self, fid: &str) -> Result<(String, String), ClientError> {
        let parsed: FileIdentifier = fid.parse()?;
        let location = self
            .resolve_volume(parsed.volume_id, self.config.collection.as_deref())
            .await?;
        Ok((location.public_blob_url(fid), location.blob_url(fid)))
    }

    /// Resolves the location of `volume_id`, cache-first.
    pub async fn resolve_volume(
        &self,
        volume_id: VolumeId,
        collection: Option<&str>,
    ) -> Result<VolumeLocation, ClientError> {
        let key = (volume_id, collection.unwrap_or_default().to_owned());
        let mut volumes = self.volumes.lock().await;
        if let Some(location) = volumes.get(&key) {
            return Ok(location.clone());
        }
        let location = self.master.lookup(volume_id, collection).await?;
        volumes.insert(key, location.clone());
        Ok(location)
    }

    async fn volume_for(&self, volume_id: VolumeId) -> Result<VolumeClient, ClientError> {
        let location = self
            .resolve_volume(volume_id, self.config.collection.as_deref())
            .await?;
        Ok(VolumeClient::with_http_client(location, self.http.clone()))
    }

    fn assign_options(&self) -> AssignOptions {
        AssignOptions {
            replication: self.config.replication.clone(),
            collection: self.config.collection.clone(),
            ttl: self.config.ttl.clone(),
        }
    }
}

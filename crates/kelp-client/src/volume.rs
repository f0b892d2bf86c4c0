// Copyright (c) Kelp Contributors
// SPDX-License-Identifier: Apache-2.0

//! Gateway to a volume server: blob upload, replica-aware delete, and
//! status.

use reqwest::multipart::{Form, Part};

use crate::{
    ClientError,
    api::{ClusterStatus, UploadResponse, VolumeLocation},
};

/// The multipart field name the volume server expects for the blob bytes.
const FILE_FIELD: &str = "file";

/// Client for a single volume server.
#[derive(Debug, Clone)]
pub struct VolumeClient {
    location: VolumeLocation,
    http: reqwest::Client,
}

/// Outcome of one delete attempt within a replica-aware delete.
#[derive(Debug)]
pub struct ReplicaDelete {
    /// Which copy was addressed: 0 is the primary, `n` the `_n` suffix.
    pub replica_index: u32,
    /// The failure, if the attempt did not succeed.
    pub error: Option<ClientError>,
}

/// Aggregated result of a replica-aware delete.
///
/// The primary delete succeeding is what makes the overall call succeed;
/// failed replica deletes are recorded here (and logged) rather than failing
/// the call, since a replicated store is expected to reconcile stragglers
/// out-of-band.
#[derive(Debug)]
pub struct DeleteReport {
    /// One entry per attempted copy, in attempt order.
    pub attempts: Vec<ReplicaDelete>,
}

impl DeleteReport {
    /// Returns true if every attempted delete succeeded.
    pub fn is_complete(&self) -> bool {
        self.attempts.iter().all(|attempt| attempt.error.is_none())
    }

    /// The attempts that failed.
    pub fn failures(&self) -> impl Iterator<Item = &ReplicaDelete> {
        self.attempts.iter().filter(|attempt| attempt.error.is_some())
    }
}

impl VolumeClient {
    /// Creates a volume client with a fresh HTTP client.
    pub fn new(location: VolumeLocation) -> Self {
        Self::with_http_client(location, reqwest::Client::new())
    }

    /// Creates a volume client sharing an existing HTTP client.
    pub fn with_http_client(location: VolumeLocation, http: reqwest::Client) -> Self {
        Self { location, http }
    }

    /// The resolved endpoints of this volume.
    pub fn location(&self) -> &VolumeLocation {
        &self.location
    }

    /// Uploads a blob under `fid`, returning the number of bytes written.
    ///
    /// A `replica_index` greater than zero addresses that numbered replica
    /// slot (`<fid>_<index>`) instead of the primary.
    pub async fn upload(
        &self,
        fid: &str,
        filename: &str,
        mime_type: &str,
        content: Vec<u8>,
        replica_index: u32,
    ) -> Result<u64, ClientError> {
        let mime_type = if mime_type.is_empty() {
            kelp_core::GENERIC_BINARY
        } else {
            mime_type
        };
        let part = Part::bytes(content)
            .file_name(filename.to_owned())
            .mime_str(mime_type)
            .map_err(|err| {
                ClientError::invalid_argument(format!("invalid mime type '{mime_type}': {err}"))
            })?;
        let url = self.blob_url(fid, replica_index);
        tracing::debug!(%url, filename, "uploading blob");

        let response: UploadResponse = self
            .http
            .post(url)
            .multipart(Form::new().part(FILE_FIELD, part))
            .send()
            .await
            .map_err(ClientError::transport)?
            .json()
            .await
            .map_err(ClientError::transport)?;
        if !response.error.is_empty() {
            return Err(ClientError::upstream(response.error));
        }
        Ok(response.size)
    }

    /// Deletes the blob `fid` and, when `replica_count > 1`, its numbered
    /// replicas `_1` through `_(replica_count - 1)`.
    ///
    /// Failure to delete the primary fails the call; failures on replicas
    /// are logged and recorded in the returned [`DeleteReport`].
    pub async fn delete(&self, fid: &str, replica_count: u32) -> Result<DeleteReport, ClientError> {
        let replica_count = replica_count.max(1);

        self.delete_copy(fid, 0).await?;
        let mut attempts = vec![ReplicaDelete {
            replica_index: 0,
            error: None,
        }];

        for replica_index in 1..replica_count {
            let error = self.delete_copy(fid, replica_index).await.err();
            if let Some(error) = &error {
                tracing::warn!(fid, replica_index, %error, "failed to delete replica");
            }
            attempts.push(ReplicaDelete {
                replica_index,
                error,
            });
        }
        Ok(DeleteReport { attempts })
    }

    /// Fetches and decodes the server's status document.
    pub async fn status(&self) -> Result<ClusterStatus, ClientError> {
        let status: ClusterStatus = self
            .http
            .get(format!("{}/status", self.location.url))
            .send()
            .await
            .map_err(ClientError::transport)?
            .json()
            .await
            .map_err(ClientError::transport)?;
        if !status.error.is_empty() {
            return Err(ClientError::upstream(status.error));
        }
        Ok(status)
    }

    async fn delete_copy(&self, fid: &str, replica_index: u32) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.blob_url(fid, replica_index))
            .send()
            .await
            .map_err(ClientError::transport)?;
        if !response.status().is_success() {
            return Err(ClientError::upstream(format!(
                "delete returned status {}",
                response.status()
            )));
        }
        Ok(())
    }

    fn blob_url(&self, fid: &str, replica_index: u32) -> String {
        if replica_index > 0 {
            format!("{}_{replica_index}", self.location.blob_url(fid))
        } else {
            self.location.blob_url(fid)
        }
    }
}

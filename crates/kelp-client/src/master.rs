// Copyright (c) Kelp Contributors
// SPDX-License-Identifier: Apache-2.0

//! Gateway to the master service: identifier assignment and volume location
//! lookup.

use kelp_core::{FileIdentifier, VolumeId};

use crate::{
    ClientError,
    api::{self, AssignResponse, ClusterStatus, LookupResponse, VolumeLocation},
};

/// Optional parameters forwarded to the master at assign time.
#[derive(Debug, Clone, Default)]
pub struct AssignOptions {
    /// Replication placement for the new blob (e.g. `"001"`).
    pub replication: Option<String>,
    /// Collection the new blob belongs to.
    pub collection: Option<String>,
    /// Time-to-live of the new blob (e.g. `"1d"`).
    pub ttl: Option<String>,
}

/// Client for the master service.
#[derive(Debug, Clone)]
pub struct MasterClient {
    endpoint: String,
    http: reqwest::Client,
}

impl MasterClient {
    /// Creates a master client for `endpoint` with a fresh HTTP client.
    pub fn new(endpoint: &str) -> Self {
        Self::with_http_client(endpoint, reqwest::Client::new())
    }

    /// Creates a master client sharing an existing HTTP client.
    pub fn with_http_client(endpoint: &str, http: reqwest::Client) -> Self {
        Self {
            endpoint: api::normalize_endpoint(endpoint),
            http,
        }
    }

    /// The normalized master endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Requests one fresh file identifier.
    pub async fn assign(&self, options: &AssignOptions) -> Result<FileIdentifier, ClientError> {
        let assignment = self.assign_response(options).await?;
        Ok(assignment.fid.parse()?)
    }

    /// Requests one fresh identifier, returning the raw assignment document
    /// so the assigned spelling can be carried through verbatim.
    pub(crate) async fn assign_response(
        &self,
        options: &AssignOptions,
    ) -> Result<AssignResponse, ClientError> {
        self.request_assignment(1, options).await
    }

    /// Requests `count` fresh identifiers in a single round trip.
    ///
    /// The master grants a contiguous key range anchored at the returned
    /// identifier; the batch is materialized by incrementing the key.
    pub async fn assign_batch(
        &self,
        count: u32,
        options: &AssignOptions,
    ) -> Result<Vec<FileIdentifier>, ClientError> {
        if count == 0 {
            return Err(ClientError::invalid_argument(
                "batch assignment requires a positive count",
            ));
        }
        let assignment = self.request_assignment(count, options).await?;
        if assignment.count < u64::from(count) {
            return Err(ClientError::upstream(format!(
                "master granted {} identifiers instead of {count}",
                assignment.count
            )));
        }
        let first: FileIdentifier = assignment.fid.parse()?;
        Ok((0..u64::from(count))
            .map(|offset| FileIdentifier {
                key: first.key.wrapping_add(offset),
                ..first
            })
            .collect())
    }

    /// Asks the master which server currently owns `volume_id`, optionally
    /// scoped to `collection`.
    pub async fn lookup(
        &self,
        volume_id: VolumeId,
        collection: Option<&str>,
    ) -> Result<VolumeLocation, ClientError> {
        let mut query = vec![("volumeId", volume_id.to_string())];
        if let Some(collection) = collection {
            query.push(("collection", collection.to_owned()));
        }
        tracing::debug!(volume_id, ?collection, "looking up volume location");

        let response: LookupResponse = self
            .http
            .get(format!("{}/dir/lookup", self.endpoint))
            .query(&query)
            .send()
            .await
            .map_err(ClientError::transport)?
            .json()
            .await
            .map_err(ClientError::transport)?;
        if !response.error.is_empty() {
            return Err(ClientError::upstream(response.error));
        }

        response
            .locations
            .first()
            .map(|location| VolumeLocation::new(&location.url, &location.public_url))
            .ok_or_else(|| ClientError::volume_not_found(volume_id))
    }

    /// Succeeds iff the master responds to its status endpoint with no error
    /// field. Used as a fail-fast precondition before longer workloads.
    pub async fn health_check(&self) -> Result<(), ClientError> {
        let status: ClusterStatus = self
            .http
            .get(format!("{}/status", self.endpoint))
            .send()
            .await
            .map_err(ClientError::transport)?
            .json()
            .await
            .map_err(ClientError::transport)?;
        if !status.error.is_empty() {
            return Err(ClientError::upstream(status.error));
        }
        Ok(())
    }

    async fn request_assignment(
        &self,
        count: u32,
        options: &AssignOptions,
    ) -> Result<AssignResponse, ClientError> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if count > 1 {
            query.push(("count", count.to_string()));
        }
        if let Some(replication) = &options.replication {
            query.push(("replication", replication.clone()));
        }
        if let Some(collection) = &options.collection {
            query.push(("collection", collection.clone()));
        }
        if let Some(ttl) = &options.ttl {
            query.push(("ttl", ttl.clone()));
        }

        let assignment: AssignResponse = self
            .http
            .get(format!("{}/dir/assign", self.endpoint))
            .query(&query)
            .send()
            .await
            .map_err(ClientError::transport)?
            .json()
            .await
            .map_err(ClientError::transport)?;
        if !assignment.error.is_empty() {
            return Err(ClientError::upstream(assignment.error));
        }
        tracing::trace!(fid = %assignment.fid, count = assignment.count, "assigned identifiers");
        Ok(assignment)
    }
}

// Copyright (c) Kelp Contributors
// SPDX-License-Identifier: Apache-2.0

//! Gateway to a filer service: path-addressed upload, delete, and listing.
//!
//! The filer maps logical paths to file identifiers through its own
//! indirection; no identifier encoding is involved on this surface.

use reqwest::{
    header,
    multipart::{Form, Part},
};

use crate::{
    ClientError,
    api::{self, DirectoryListing},
};

/// Client for a filer service.
#[derive(Debug, Clone)]
pub struct FilerClient {
    endpoint: String,
    http: reqwest::Client,
}

impl FilerClient {
    /// Creates a filer client with a fresh HTTP client.
    pub fn new(endpoint: &str) -> Self {
        Self::with_http_client(endpoint, reqwest::Client::new())
    }

    /// Creates a filer client sharing an existing HTTP client.
    pub fn with_http_client(endpoint: &str, http: reqwest::Client) -> Self {
        Self {
            endpoint: api::normalize_endpoint(endpoint),
            http,
        }
    }

    /// The normalized filer endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Stores `content` under the logical `path`.
    pub async fn upload(
        &self,
        path: &str,
        mime_type: &str,
        content: Vec<u8>,
    ) -> Result<(), ClientError> {
        let filename = path.rsplit('/').next().unwrap_or(path).to_owned();
        let part = Part::bytes(content)
            .file_name(filename)
            .mime_str(mime_type)
            .map_err(|err| {
                ClientError::invalid_argument(format!("invalid mime type '{mime_type}': {err}"))
            })?;
        let response = self
            .http
            .post(self.path_url(path))
            .multipart(Form::new().part("file", part))
            .send()
            .await
            .map_err(ClientError::transport)?;
        if !response.status().is_success() {
            return Err(ClientError::upstream(format!(
                "filer upload returned status {}",
                response.status()
            )));
        }
        Ok(())
    }

    /// Removes the object stored under `path`.
    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.path_url(path))
            .send()
            .await
            .map_err(ClientError::transport)?;
        if !response.status().is_success() {
            return Err(ClientError::upstream(format!(
                "filer delete returned status {}",
                response.status()
            )));
        }
        Ok(())
    }

    /// Lists the directory at `path`.
    pub async fn list_directory(&self, path: &str) -> Result<DirectoryListing, ClientError> {
        let listing: DirectoryListing = self
            .http
            .get(self.path_url(path))
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(ClientError::transport)?
            .json()
            .await
            .map_err(ClientError::transport)?;
        if !listing.error.is_empty() {
            return Err(ClientError::upstream(listing.error));
        }
        Ok(listing)
    }

    fn path_url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }
}

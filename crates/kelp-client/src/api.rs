// Copyright (c) Kelp Contributors
// SPDX-License-Identifier: Apache-2.0

//! Wire types for the master, volume, and filer JSON surfaces.
//!
//! Every response document carries an `error` field that is empty on
//! success; the gateways translate a non-empty field into
//! [`ClientError`][crate::ClientError] rather than exposing it.

use serde::Deserialize;

/// Resolved network endpoints for a volume.
///
/// `url` is the endpoint the client itself talks to; `public_url` is the one
/// handed out when the blob is later served to end users. Both always carry
/// an explicit scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeLocation {
    /// The endpoint used for client requests.
    pub url: String,
    /// The endpoint to embed in externally served links.
    pub public_url: String,
}

impl VolumeLocation {
    /// Creates a location, prefixing `http://` onto endpoints that lack a
    /// scheme (the master reports bare `host:port` pairs).
    pub fn new(url: &str, public_url: &str) -> Self {
        Self {
            url: normalize_endpoint(url),
            public_url: normalize_endpoint(public_url),
        }
    }

    /// The full URL of the blob identified by `fid` on this volume.
    pub fn blob_url(&self, fid: &str) -> String {
        format!("{}/{}", self.url, fid)
    }

    /// The externally servable URL of the blob identified by `fid`.
    pub fn public_blob_url(&self, fid: &str) -> String {
        format!("{}/{}", self.public_url, fid)
    }
}

/// Prefixes `http://` onto an endpoint without an explicit scheme and trims
/// any trailing slash so URLs can be joined with plain formatting.
pub(crate) fn normalize_endpoint(endpoint: &str) -> String {
    let endpoint = endpoint.trim_end_matches('/');
    if endpoint.contains("://") {
        endpoint.to_owned()
    } else {
        format!("http://{endpoint}")
    }
}

/// Response to `GET /dir/assign`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignResponse {
    /// The assigned file identifier in canonical string form.
    #[serde(default)]
    pub fid: String,
    /// The number of identifiers granted.
    #[serde(default)]
    pub count: u64,
    /// The owning volume server.
    #[serde(default)]
    pub url: String,
    /// The owning volume server's public endpoint.
    #[serde(default)]
    pub public_url: String,
    /// Empty on success.
    #[serde(default)]
    pub error: String,
}

/// A single entry of [`LookupResponse::locations`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupLocation {
    /// The volume server endpoint.
    #[serde(default)]
    pub url: String,
    /// The volume server's public endpoint.
    #[serde(default)]
    pub public_url: String,
}

/// Response to `GET /dir/lookup`.
#[derive(Debug, Clone, Deserialize)]
pub struct LookupResponse {
    /// The servers currently owning the volume; empty if none.
    #[serde(default)]
    pub locations: Vec<LookupLocation>,
    /// Empty on success.
    #[serde(default)]
    pub error: String,
}

/// Response to a blob upload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// The stored file name.
    #[serde(default)]
    pub file_name: String,
    /// The URL the blob is now served under.
    #[serde(default)]
    pub file_url: String,
    /// The number of bytes written.
    #[serde(default)]
    pub size: u64,
    /// Empty on success.
    #[serde(default)]
    pub error: String,
}

/// The status document served by masters and volume servers.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStatus {
    /// The server version string.
    #[serde(default)]
    pub version: String,
    /// Empty on success.
    #[serde(default)]
    pub error: String,
}

/// A file entry of a filer directory listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    /// The file name within the directory.
    #[serde(default)]
    pub name: String,
    /// The file identifier the filer maps the name to.
    #[serde(default)]
    pub fid: String,
}

/// A subdirectory entry of a filer directory listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    /// The subdirectory name.
    #[serde(default)]
    pub name: String,
}

/// Response to a filer directory listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryListing {
    /// The listed directory path.
    #[serde(default)]
    pub directory: String,
    /// Files directly under the directory.
    #[serde(default)]
    pub files: Vec<FileEntry>,
    /// Subdirectories directly under the directory.
    #[serde(default)]
    pub subdirectories: Vec<DirectoryEntry>,
    /// Empty on success.
    #[serde(default)]
    pub error: String,
}

// Copyright (c) Kelp Contributors
// SPDX-License-Identifier: Apache-2.0

//! Errors raised while driving the blob-store protocol.

use kelp_core::{CookieOverflowError, FidParseError, VolumeId};

/// Error raised by the client or one of its gateways.
///
/// Gateways never retry internally; every failure is returned to the
/// orchestrator, which returns it unchanged to the caller. The only
/// deliberate exception is the best-effort replica delete, whose per-replica
/// failures are reported through [`DeleteReport`][crate::DeleteReport]
/// instead of this type.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ClientError {
    #[from]
    kind: Kind,
}

impl ClientError {
    /// Returns true if a server could not be reached or returned an
    /// undecodable body.
    pub fn is_unavailable(&self) -> bool {
        matches!(self.kind, Kind::Unavailable(_))
    }

    /// Returns true if a server was reachable but reported an error.
    pub fn is_upstream(&self) -> bool {
        matches!(self.kind, Kind::Upstream { .. })
    }

    /// Returns true if a lookup succeeded but named no owner for the volume.
    pub fn is_volume_not_found(&self) -> bool {
        matches!(self.kind, Kind::VolumeNotFound(_))
    }

    /// Returns true if the caller passed a malformed file identifier.
    pub fn is_malformed_fid(&self) -> bool {
        matches!(self.kind, Kind::MalformedFid(_))
    }

    /// Returns true if the caller passed an otherwise invalid argument.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self.kind, Kind::InvalidArgument(_))
    }

    pub(crate) fn transport(err: reqwest::Error) -> Self {
        Kind::Unavailable(err).into()
    }

    pub(crate) fn upstream(message: impl Into<String>) -> Self {
        Kind::Upstream {
            message: message.into(),
        }
        .into()
    }

    pub(crate) fn volume_not_found(volume_id: VolumeId) -> Self {
        Kind::VolumeNotFound(volume_id).into()
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Kind::InvalidArgument(message.into()).into()
    }
}

impl From<FidParseError> for ClientError {
    fn from(err: FidParseError) -> Self {
        Kind::MalformedFid(err).into()
    }
}

impl From<CookieOverflowError> for ClientError {
    fn from(err: CookieOverflowError) -> Self {
        Kind::CookieOverflow(err).into()
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Kind::Io(err).into()
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum Kind {
    #[error("malformed file identifier: {0}")]
    MalformedFid(#[source] FidParseError),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("failed to reach the server")]
    Unavailable(#[source] reqwest::Error),
    #[error("server returned an error: {message}")]
    Upstream { message: String },
    #[error("no location found for volume {0}")]
    VolumeNotFound(VolumeId),
    #[error(transparent)]
    CookieOverflow(CookieOverflowError),
    #[error("failed to read local file")]
    Io(#[source] std::io::Error),
}

// Copyright (c) Kelp Contributors
// SPDX-License-Identifier: Apache-2.0

//! Core types for the kelp blob-store client: the file identifier and its
//! packed-cookie encoding.
//!
//! A file identifier addresses a single blob in the store. Its canonical text
//! form is `"<volume id>,<key hex><cookie as 8 hex digits>"`, where the key is
//! rendered without padding and the cookie always occupies the last eight hex
//! characters after the comma.

mod cookie;
mod fid;

pub use cookie::{
    CookieOverflowError,
    GENERIC_BINARY,
    MAX_SIZE_KB,
    OverflowPolicy,
    PackedCookie,
    mime_class_index,
};
pub use fid::{FidParseError, FileIdentifier, time_key};

/// Identifies a volume within the store. Assigned by the master, never by
/// the client.
pub type VolumeId = u32;

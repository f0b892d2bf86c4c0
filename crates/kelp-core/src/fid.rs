// Copyright (c) Kelp Contributors
// SPDX-License-Identifier: Apache-2.0

//! The file identifier and its canonical text encoding.

use std::{
    fmt,
    num::ParseIntError,
    str::FromStr,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};

use crate::{PackedCookie, VolumeId};

/// The number of hex characters the cookie occupies at the end of the
/// post-comma segment.
const COOKIE_HEX_DIGITS: usize = 8;

/// A unique identifier for a blob stored in the network.
///
/// The identifier is created once, at assign time, and never mutated
/// afterwards; the `with_*` methods return a new value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileIdentifier {
    /// The volume owning the blob. Assigned by the master.
    pub volume_id: VolumeId,
    /// The key of the blob, unique within its volume.
    pub key: u64,
    /// The verification/metadata cookie. Opaque unless the caller opts into
    /// the [`PackedCookie`] interpretation.
    pub cookie: u32,
}

impl FileIdentifier {
    /// Creates an identifier from its parts.
    pub fn new(volume_id: VolumeId, key: u64, cookie: u32) -> Self {
        Self {
            volume_id,
            key,
            cookie,
        }
    }

    /// Returns a copy of this identifier with the key replaced by the current
    /// time in nanoseconds since the Unix epoch.
    #[must_use]
    pub fn with_time_key(self) -> Self {
        Self {
            key: time_key(),
            ..self
        }
    }

    /// Returns a copy of this identifier carrying `cookie`.
    #[must_use]
    pub fn with_cookie(self, cookie: PackedCookie) -> Self {
        Self {
            cookie: cookie.as_u32(),
            ..self
        }
    }

    /// Interprets the key as a nanosecond timestamp.
    ///
    /// Only meaningful for identifiers whose key was derived from the clock;
    /// for master-assigned keys the result is arbitrary.
    pub fn key_time(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_nanos(self.key)
    }

    /// Returns the cookie under the packed mime-class/size interpretation.
    pub fn packed_cookie(&self) -> PackedCookie {
        PackedCookie::from(self.cookie)
    }
}

impl fmt::Display for FileIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{:x}{:08x}", self.volume_id, self.key, self.cookie)
    }
}

/// Error returned when a string is not a well-formed file identifier.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FidParseError {
    /// The string does not contain exactly one comma separator.
    #[error("expected exactly one comma separator")]
    MissingSeparator,
    /// The segment after the comma leaves no room for a non-empty key.
    #[error("segment after the comma must be longer than 8 hex characters")]
    SegmentTooShort,
    /// The volume id is not a decimal 32-bit integer.
    #[error("invalid volume id: {0}")]
    InvalidVolumeId(#[source] ParseIntError),
    /// The key is not a hexadecimal 64-bit integer.
    #[error("invalid key: {0}")]
    InvalidKey(#[source] ParseIntError),
    /// The cookie is not a hexadecimal 32-bit integer.
    #[error("invalid cookie: {0}")]
    InvalidCookie(#[source] ParseIntError),
}

impl FromStr for FileIdentifier {
    type Err = FidParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut segments = input.split(',');
        let (Some(volume), Some(rest), None) =
            (segments.next(), segments.next(), segments.next())
        else {
            return Err(FidParseError::MissingSeparator);
        };
        // The cookie is located from the end, so the segment must be ASCII
        // hex for the split below to be sound at all.
        if !rest.is_ascii() || rest.len() <= COOKIE_HEX_DIGITS {
            return Err(FidParseError::SegmentTooShort);
        }

        let volume_id = volume.parse().map_err(FidParseError::InvalidVolumeId)?;
        let (key, cookie) = rest.split_at(rest.len() - COOKIE_HEX_DIGITS);
        let key = u64::from_str_radix(key, 16).map_err(FidParseError::InvalidKey)?;
        let cookie = u32::from_str_radix(cookie, 16).map_err(FidParseError::InvalidCookie)?;

        Ok(Self {
            volume_id,
            key,
            cookie,
        })
    }
}

/// Returns the current time in nanoseconds since the Unix epoch, for use as a
/// time-ordered file key.
///
/// Keys derived this way are monotonically non-decreasing under normal clock
/// behavior; the residual collision risk is accepted, not eliminated.
pub fn time_key() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_canonical_form() {
        let fid = FileIdentifier::new(3, 0x1, 0x01a2_b3c4);
        assert_eq!(fid.to_string(), "3,101a2b3c4");
    }

    #[test]
    fn decode_takes_last_eight_hex_chars_as_cookie() {
        let fid: FileIdentifier = "3,0000000101a2b3c4".parse().expect("valid fid");
        assert_eq!(fid.volume_id, 3);
        assert_eq!(fid.key, 0x1);
        assert_eq!(fid.cookie, 0x01a2_b3c4);
    }

    #[test]
    fn round_trips_from_identifier() {
        for fid in [
            FileIdentifier::new(1, 0x9, 0),
            FileIdentifier::new(42, 0x1786_4cc8_82a2_2e4d, 0xdead_beef),
            FileIdentifier::new(u32::MAX, u64::MAX, u32::MAX),
        ] {
            let reparsed: FileIdentifier = fid.to_string().parse().expect("valid fid");
            assert_eq!(reparsed, fid);
        }
    }

    #[test]
    fn round_trips_from_canonical_string() {
        // Canonical strings carry no leading zeros in the key.
        for input in ["3,101a2b3c4", "7,17864cc882a22e4d00000001", "1,fdeadbeef"] {
            let fid: FileIdentifier = input.parse().expect("valid fid");
            assert_eq!(fid.to_string(), input);
        }
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(
            "abc".parse::<FileIdentifier>(),
            Err(FidParseError::MissingSeparator)
        );
        assert_eq!(
            "1,2,3".parse::<FileIdentifier>(),
            Err(FidParseError::MissingSeparator)
        );
        // Eight or fewer characters after the comma leave no room for a key.
        assert_eq!(
            "1,short".parse::<FileIdentifier>(),
            Err(FidParseError::SegmentTooShort)
        );
        assert_eq!(
            "1,01a2b3c4".parse::<FileIdentifier>(),
            Err(FidParseError::SegmentTooShort)
        );
        assert!(matches!(
            "x,0000000101a2b3c4".parse::<FileIdentifier>(),
            Err(FidParseError::InvalidVolumeId(_))
        ));
        assert!(matches!(
            "1,zz00000101a2b3c4".parse::<FileIdentifier>(),
            Err(FidParseError::InvalidKey(_))
        ));
    }

    #[test]
    fn key_time_inverts_time_key() {
        let before = SystemTime::now();
        let fid = FileIdentifier::new(2, time_key(), 0);
        let elapsed = fid
            .key_time()
            .duration_since(before)
            .expect("key time not before start");
        assert!(elapsed < Duration::from_secs(60));
    }
}

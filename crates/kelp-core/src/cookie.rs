// Copyright (c) Kelp Contributors
// SPDX-License-Identifier: Apache-2.0

//! The packed-cookie layout.
//!
//! A file identifier's cookie is nominally an opaque verification token. The
//! packed interpretation trades that role for self-description: the high 10
//! bits index a fixed mime-class table and the low 22 bits carry the object
//! size in kilobytes, so a directory or browsing UI can recover approximate
//! content type and size without a round trip to the volume server.

use serde::{Deserialize, Serialize};

/// Number of low bits holding the size in kilobytes.
const SIZE_KB_BITS: u32 = 22;

/// Largest size, in kilobytes, representable in the packed layout. Objects of
/// roughly 4 GiB and above would otherwise overflow into the mime bits.
pub const MAX_SIZE_KB: u32 = (1 << SIZE_KB_BITS) - 1;

/// The mime class used when a type is not in the table: generic binary.
pub const GENERIC_BINARY: &str = "application/octet-stream";

/// The fixed mime-class table. The packed mime index is a position in this
/// slice, so entries must never be reordered or removed; new classes are
/// appended (10 bits leave room for 1024 of them).
const MIME_CLASSES: &[&str] = &[
    GENERIC_BINARY,
    "text/plain",
    "text/html",
    "text/css",
    "text/csv",
    "text/xml",
    "text/markdown",
    "application/json",
    "application/javascript",
    "application/pdf",
    "application/zip",
    "application/gzip",
    "application/x-tar",
    "application/x-7z-compressed",
    "application/msword",
    "application/vnd.ms-excel",
    "application/vnd.ms-powerpoint",
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/webp",
    "image/svg+xml",
    "image/bmp",
    "image/tiff",
    "image/x-icon",
    "audio/mpeg",
    "audio/ogg",
    "audio/wav",
    "audio/flac",
    "audio/aac",
    "video/mp4",
    "video/mpeg",
    "video/webm",
    "video/ogg",
    "video/quicktime",
    "video/x-msvideo",
    "font/woff",
    "font/woff2",
    "font/ttf",
    "font/otf",
];

/// Returns the table index for `mime_type`, falling back to the generic
/// binary class (index 0) for unrecognized types.
///
/// Parameters after a `;` (e.g. `charset=utf-8`) are ignored.
pub fn mime_class_index(mime_type: &str) -> u32 {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    MIME_CLASSES
        .iter()
        .position(|class| *class == essence)
        .and_then(|position| u32::try_from(position).ok())
        .unwrap_or(0)
}

/// Policy applied when a packed size would not fit in its 22 bits.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowPolicy {
    /// Clamp the size field to [`MAX_SIZE_KB`].
    Saturate,
    /// Reject the derivation with [`CookieOverflowError`].
    #[default]
    Error,
}

/// Error returned when the kilobyte size of an object exceeds the 22 bits of
/// the packed layout under [`OverflowPolicy::Error`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("object size of {size_kb} KB does not fit in the packed cookie")]
pub struct CookieOverflowError {
    /// The kilobyte size that overflowed.
    pub size_kb: u64,
}

/// A cookie carrying a mime-class index in its high 10 bits and the object
/// size in kilobytes in its low 22 bits.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedCookie(u32);

impl PackedCookie {
    /// Packs `size_bytes` and `mime_type` into a cookie.
    ///
    /// The size is converted to kilobytes rounding up, with a floor of one so
    /// that even a zero-byte object reads back as non-empty. An unrecognized
    /// mime type packs as the generic binary class.
    pub fn derive(
        size_bytes: u64,
        mime_type: &str,
        policy: OverflowPolicy,
    ) -> Result<Self, CookieOverflowError> {
        let size_kb = size_bytes.div_ceil(1024).max(1);
        let size_kb = if size_kb > u64::from(MAX_SIZE_KB) {
            match policy {
                OverflowPolicy::Saturate => MAX_SIZE_KB,
                OverflowPolicy::Error => return Err(CookieOverflowError { size_kb }),
            }
        } else {
            // Fits in 22 bits, so the cast is lossless.
            size_kb as u32
        };
        Ok(Self((mime_class_index(mime_type) << SIZE_KB_BITS) | size_kb))
    }

    /// The mime class packed into this cookie.
    ///
    /// Indices outside the table (possible when interpreting a cookie that
    /// was never packed) read back as the generic binary class.
    pub fn mime_class(&self) -> &'static str {
        let index = (self.0 >> SIZE_KB_BITS) as usize;
        MIME_CLASSES.get(index).copied().unwrap_or(GENERIC_BINARY)
    }

    /// The object size in kilobytes packed into this cookie.
    pub fn size_kb(&self) -> u32 {
        self.0 & MAX_SIZE_KB
    }

    /// The raw cookie value.
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl From<u32> for PackedCookie {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_byte_object_packs_as_one_kilobyte() {
        let cookie =
            PackedCookie::derive(0, "text/plain", OverflowPolicy::Error).expect("no overflow");
        assert_eq!(cookie.size_kb(), 1);
        assert_eq!(cookie.mime_class(), "text/plain");
    }

    #[test]
    fn size_rounds_up_to_whole_kilobytes() {
        let exact =
            PackedCookie::derive(2048, "text/plain", OverflowPolicy::Error).expect("no overflow");
        assert_eq!(exact.size_kb(), 2);
        let partial =
            PackedCookie::derive(1025, "text/plain", OverflowPolicy::Error).expect("no overflow");
        assert_eq!(partial.size_kb(), 2);
    }

    #[test]
    fn unrecognized_type_falls_back_to_generic_binary() {
        let unknown =
            PackedCookie::derive(100, "application/x-nonexistent", OverflowPolicy::Error)
                .expect("no overflow");
        let generic =
            PackedCookie::derive(100, GENERIC_BINARY, OverflowPolicy::Error).expect("no overflow");
        assert_eq!(unknown.as_u32(), generic.as_u32());
        assert_eq!(unknown.mime_class(), GENERIC_BINARY);
    }

    #[test]
    fn mime_parameters_are_ignored() {
        assert_eq!(
            mime_class_index("text/plain; charset=utf-8"),
            mime_class_index("text/plain")
        );
    }

    #[test]
    fn overflow_policy_saturates_or_fails() {
        // 5 GiB does not fit in 22 bits of kilobytes.
        let five_gib = 5 * 1024 * 1024 * 1024;
        let saturated = PackedCookie::derive(five_gib, GENERIC_BINARY, OverflowPolicy::Saturate)
            .expect("saturating derivation cannot fail");
        assert_eq!(saturated.size_kb(), MAX_SIZE_KB);
        assert_eq!(
            PackedCookie::derive(five_gib, GENERIC_BINARY, OverflowPolicy::Error),
            Err(CookieOverflowError {
                size_kb: five_gib / 1024
            })
        );
    }

    #[test]
    fn packing_round_trips_through_the_raw_value() {
        let cookie =
            PackedCookie::derive(3 * 1024 * 1024, "image/png", OverflowPolicy::Error)
                .expect("no overflow");
        let reread = PackedCookie::from(cookie.as_u32());
        assert_eq!(reread.mime_class(), "image/png");
        assert_eq!(reread.size_kb(), 3 * 1024);
    }
}

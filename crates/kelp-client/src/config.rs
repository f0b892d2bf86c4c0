// Copyright (c) Kelp Contributors
// SPDX-License-Identifier: Apache-2.0

//! Client configuration.

use std::path::Path;

use anyhow::{Context, Result};
use kelp_core::OverflowPolicy;
use serde::{Deserialize, Serialize};

/// The default master endpoint.
pub const DEFAULT_MASTER: &str = "http://localhost:9333";

/// Config for the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// The master endpoint.
    #[serde(default = "default_master")]
    pub master: String,
    /// The collection new blobs are assigned to, if any.
    #[serde(default)]
    pub collection: Option<String>,
    /// The replication placement requested at assign time, if any
    /// (e.g. `"001"`).
    #[serde(default)]
    pub replication: Option<String>,
    /// The time-to-live requested at assign time, if any (e.g. `"1d"`).
    #[serde(default)]
    pub ttl: Option<String>,
    /// What to do when an object is too large for the packed cookie's
    /// 22-bit kilobyte size.
    #[serde(default)]
    pub cookie_overflow: OverflowPolicy,
}

fn default_master() -> String {
    DEFAULT_MASTER.to_owned()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            master: default_master(),
            collection: None,
            replication: None,
            ttl: None,
            cookie_overflow: OverflowPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Creates a configuration for the given master endpoint, with defaults
    /// for everything else.
    pub fn for_master(master: impl Into<String>) -> Self {
        Self {
            master: master.into(),
            ..Self::default()
        }
    }
}

/// Loads the client configuration from a YAML file.
pub fn load_configuration(path: impl AsRef<Path>) -> Result<ClientConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("unable to read configuration from '{}'", path.display()))?;
    serde_yaml::from_str(&contents)
        .with_context(|| format!("unable to parse configuration at '{}'", path.display()))
}

// Copyright (c) Kelp Contributors
// SPDX-License-Identifier: Apache-2.0

//! Client for a master/volume/filer blob store.
//!
//! The store assigns compact file identifiers through a master service,
//! stores the bytes on volume servers, and optionally maps logical paths to
//! identifiers through filer servers. This crate hides the multi-step
//! protocol behind the [`StorageClient`] orchestrator: assign an identifier,
//! resolve which volume server owns it (with caching), transfer the bytes,
//! and drive replica-aware deletes.
//!
//! The per-service gateways ([`MasterClient`], [`VolumeClient`],
//! [`FilerClient`]) are public for callers that need to drive a single
//! server directly.

pub mod api;
pub mod config;
pub mod error;
mod filer;
mod master;
mod orchestrator;
mod volume;

pub use kelp_core as core;

pub use error::ClientError;
pub use filer::FilerClient;
pub use master::{AssignOptions, MasterClient};
pub use orchestrator::StorageClient;
pub use volume::{DeleteReport, ReplicaDelete, VolumeClient};

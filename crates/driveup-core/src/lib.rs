//! driveup Core - Domain logic for resumable OneDrive uploads
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `UploadSession`, `ChunkRange`, `TransferState`, `RemoteFile`
//! - **Use cases** - `ResumableUpload`, the chunked upload controller
//! - **Port definitions** - Traits for adapters: `ISessionNegotiator`, `IRequestExecutor`
//! - **Configuration** - YAML config with defaults and validation
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module holds the byte-range and state rules with no I/O.
//! Ports define trait interfaces that adapter crates implement.
//! Use cases orchestrate domain entities through port interfaces.

pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;

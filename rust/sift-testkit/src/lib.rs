//! Test utilities and helpers for the Sift project.
//!
//! This crate provides:
//! - [`table_image`]: writer for bucket-chain hash table images
//! - [`recording`]: an `IndexSource` wrapper that records every read
//! - [`memory_shard`]: in-memory shard lookup providers
//! - [`fixture_shard`]: a small on-disk shard format, read through `HashTableReader`
//!
//! # Usage
//!
//! This crate is primarily intended for use within the Sift project's test suite.

pub mod fixture_shard;
pub mod memory_shard;
pub mod recording;
pub mod table_image;

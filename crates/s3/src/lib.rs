//! sb-s3: S3 SDK adapter for s3-browser
//!
//! This crate provides the implementation of the ObjectStore trait
//! using the aws-sdk-s3 crate. It is the only crate that directly
//! depends on the AWS SDK.

pub mod client;
pub mod error;

pub use client::{S3Client, S3Connector};
pub use error::classify;

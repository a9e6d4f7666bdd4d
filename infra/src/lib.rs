//! Infrastructure for the photo gallery
//!
//! Synthesizes the DNS/certificate stack and the application stack into
//! CloudFormation templates, seeds the photo and website buckets, and
//! invalidates the website distribution after a re-seed.

#![deny(clippy::all, clippy::pedantic, clippy::nursery, dead_code)]

/// Configuration file
pub mod config;

/// IAM policy documents
pub mod iam;

/// Distribution cache invalidation
pub mod invalidation;

/// Bucket seeding
pub mod seed;

/// Stack definitions
pub mod stacks;

/// Stack synthesis and output
pub mod synth;

/// CloudFormation template model
pub mod template;

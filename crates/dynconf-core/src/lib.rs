//! # dynconf core
//!
//! Foundational types for the dynconf cluster configuration model.
//!
//! - [`Uid`] - stable 128-bit identifier with a short base64 text form
//! - [`Scope`], [`Operation`], [`ClusterState`], [`Requirement`], [`Version`] - policy enums
//! - [`Permission`] - one entry of a setting's state/operation/level matrix
//! - [`Measure`] - quantity plus [`MemoryUnit`] or [`TimeUnit`]
//! - [`RawPath`] - path value keeping the user's exact text
//! - [`DynConfigError`] - standard error type

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod measure;
mod permission;
mod policy;
mod raw_path;
pub mod substitution;
mod uid;

pub use error::{DynConfigError, DynConfigResult, ErrorCategory};
pub use measure::{Measure, MemoryUnit, TimeUnit, Unit};
pub use permission::{Permission, PermissionBuilder};
pub use policy::{ClusterState, Operation, Requirement, Scope, Version};
pub use raw_path::RawPath;
pub use substitution::{contains_placeholders, Placeholder};
pub use uid::Uid;

//! huddle - Multi-Tenant Collaboration Core
//!
//! This library provides the core functionality for the huddle CLI tool:
//! permission resolution and board ordering for a multi-tenant
//! collaboration platform.
//!
//! # Core Concepts
//!
//! - **Organizations**: Tenant boundaries owning groups, projects, and boards
//! - **Groups**: Teams inside an organization; the unit of access delegation
//! - **Grants**: (group, resource) -> permission level records
//! - **Effective Permission**: One resolver aggregating grants with the
//!   creator override over a strict `read < write < admin` order
//! - **Boards**: Columns, sprints, and tasks with numbering and ordering
//!   invariants preserved under concurrent mutation
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap (the thin handler layer)
//! - `config`: Configuration loading from `huddle.toml`
//! - `error`: Error taxonomy, exit codes, HTTP status mapping
//! - `permission`: The canonical ordered permission-level type
//! - `access`: Effective-permission resolver and membership guards
//! - `directory`: Organizations, memberships, and groups
//! - `grant`: Resource grant registry
//! - `project`: Project entities
//! - `board`: Board records and the per-board store
//! - `ordering`: Board ordering engine (numbering, columns, sprints)
//! - `actor`: Acting-user identity resolution
//! - `storage`: Data directory layout and atomic JSON persistence
//! - `lock`: File locking for per-file write serialization

pub mod access;
pub mod actor;
pub mod board;
pub mod cli;
pub mod config;
pub mod directory;
pub mod error;
pub mod grant;
pub mod ident;
pub mod lock;
pub mod ordering;
pub mod output;
pub mod permission;
pub mod project;
pub mod storage;

pub use error::{Error, Result};
pub use permission::PermissionLevel;

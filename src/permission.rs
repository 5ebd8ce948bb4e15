//! Permission levels and their total order.
//!
//! Every permission comparison in the crate goes through this one type.
//! The order is `read < write < admin`; "no access" is represented as
//! `Option::<PermissionLevel>::None` and compares below `read`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Permission level on a project or board.
///
/// The derive order of the variants is the authority for comparisons:
/// `Read < Write < Admin`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    Read,
    Write,
    Admin,
}

impl PermissionLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            PermissionLevel::Read => "read",
            PermissionLevel::Write => "write",
            PermissionLevel::Admin => "admin",
        }
    }

    /// All levels in ascending order.
    pub fn all() -> [PermissionLevel; 3] {
        [
            PermissionLevel::Read,
            PermissionLevel::Write,
            PermissionLevel::Admin,
        ]
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionLevel {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "read" => Ok(PermissionLevel::Read),
            "write" => Ok(PermissionLevel::Write),
            "admin" => Ok(PermissionLevel::Admin),
            other => Err(Error::InvalidArgument(format!(
                "unknown permission level '{other}' (expected read|write|admin)"
            ))),
        }
    }
}

/// Whether a resolved level satisfies a requirement.
///
/// `None` (no access) satisfies nothing, including `read`.
pub fn meets(resolved: Option<PermissionLevel>, required: PermissionLevel) -> bool {
    match resolved {
        Some(level) => level >= required,
        None => false,
    }
}

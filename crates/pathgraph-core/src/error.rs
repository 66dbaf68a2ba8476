use std::fmt;

use crate::graph::GraphError;
use crate::model::BuildError;
use crate::model::builder::UnknownDeduplication;
use crate::pathbuilder::TreeError;

/// Machine-readable error codes shared by the library and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    InvalidDeduplication,
    EmptyPathId,
    DuplicatePathId,
    InvalidPathRecords,
    NodeKindMismatch,
    EdgeRejected,
    UnknownNode,
    DuplicateAlias,
    InternalUnexpected,
}

impl ErrorCode {
    pub const ALL: [Self; 10] = [
        Self::ConfigParseError,
        Self::InvalidDeduplication,
        Self::EmptyPathId,
        Self::DuplicatePathId,
        Self::InvalidPathRecords,
        Self::NodeKindMismatch,
        Self::EdgeRejected,
        Self::UnknownNode,
        Self::DuplicateAlias,
        Self::InternalUnexpected,
    ];

    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::InvalidDeduplication => "E1002",
            Self::EmptyPathId => "E2001",
            Self::DuplicatePathId => "E2002",
            Self::InvalidPathRecords => "E2003",
            Self::NodeKindMismatch => "E3001",
            Self::EdgeRejected => "E3002",
            Self::UnknownNode => "E4001",
            Self::DuplicateAlias => "E4002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidDeduplication => "Unknown deduplication mode",
            Self::EmptyPathId => "Path without id",
            Self::DuplicatePathId => "Duplicate path id",
            Self::InvalidPathRecords => "Path records are not valid JSON",
            Self::NodeKindMismatch => "Node key reused across node kinds",
            Self::EdgeRejected => "Edge rejected by graph store",
            Self::UnknownNode => "Unknown graph node",
            Self::DuplicateAlias => "Duplicate node alias",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .pathgraph.toml and retry."),
            Self::InvalidDeduplication => Some("Use one of: none, bundle, parents, full."),
            Self::EmptyPathId => Some("Give every path a non-empty id."),
            Self::DuplicatePathId => Some("Path ids must be unique within a pathbuilder."),
            Self::InvalidPathRecords => {
                Some("Provide a JSON array of path objects, each with an `id`.")
            }
            Self::NodeKindMismatch | Self::EdgeRejected | Self::UnknownNode => {
                Some("This is a bug in the deduplication engine; report it with the input.")
            }
            Self::DuplicateAlias => None,
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl ErrorCode {
    /// Classify an application error by the first library error in its
    /// chain.
    #[must_use]
    pub fn of(err: &anyhow::Error) -> Self {
        err.chain()
            .find_map(|cause| {
                if let Some(e) = cause.downcast_ref::<TreeError>() {
                    Some(e.code())
                } else if let Some(e) = cause.downcast_ref::<BuildError>() {
                    Some(e.code())
                } else if let Some(e) = cause.downcast_ref::<GraphError>() {
                    Some(e.code())
                } else if cause.is::<UnknownDeduplication>() {
                    Some(Self::InvalidDeduplication)
                } else if cause.is::<toml::de::Error>() {
                    Some(Self::ConfigParseError)
                } else if cause.is::<serde_json::Error>() {
                    Some(Self::InvalidPathRecords)
                } else {
                    None
                }
            })
            .unwrap_or(Self::InternalUnexpected)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

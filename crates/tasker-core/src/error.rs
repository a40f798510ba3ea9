use std::fmt;
use std::io;
use std::path::PathBuf;

/// Machine-readable error codes surfaced by the command layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    StoreUnavailable,
    SchemaApplyFailed,
    ConfigParseError,
    ProjectNotFound,
    TaskNotFound,
    UnknownProject,
    TagNotFound,
    InvalidEnumValue,
    InvalidDate,
    QueryTooShort,
    OperationFailed,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::StoreUnavailable => "E1001",
            Self::SchemaApplyFailed => "E1002",
            Self::ConfigParseError => "E1003",
            Self::ProjectNotFound => "E2001",
            Self::TaskNotFound => "E2002",
            Self::UnknownProject => "E2003",
            Self::TagNotFound => "E2004",
            Self::InvalidEnumValue => "E2005",
            Self::InvalidDate => "E2006",
            Self::QueryTooShort => "E2007",
            Self::OperationFailed => "E5001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::StoreUnavailable => "Task store could not be opened",
            Self::SchemaApplyFailed => "Schema could not be applied",
            Self::ConfigParseError => "Config file parse error",
            Self::ProjectNotFound => "Project not found",
            Self::TaskNotFound => "Task not found",
            Self::UnknownProject => "Referenced project does not exist",
            Self::TagNotFound => "Tag not found",
            Self::InvalidEnumValue => "Invalid priority/status value",
            Self::InvalidDate => "Invalid calendar date",
            Self::QueryTooShort => "Search query too short",
            Self::OperationFailed => "Storage operation failed",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::StoreUnavailable => {
                Some("Check the database path and its directory permissions.")
            }
            Self::SchemaApplyFailed => {
                Some("The database may belong to a newer tasker; point --db elsewhere.")
            }
            Self::ConfigParseError => Some("Fix syntax in tasker.toml and retry."),
            Self::ProjectNotFound | Self::TaskNotFound | Self::TagNotFound => None,
            Self::UnknownProject => Some("Create the project first with `tk project create`."),
            Self::InvalidEnumValue => Some(
                "Priority is one of low|medium|high; status is one of pending|in_progress|completed|blocked.",
            ),
            Self::InvalidDate => Some("Use the YYYY-MM-DD format."),
            Self::QueryTooShort => Some("Use at least 2 characters."),
            Self::OperationFailed => Some("Re-run with TASKER_LOG=debug for details."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Fatal failures while bringing the store up.
///
/// These are the only errors that escape the store boundary; every other
/// storage fault is logged and folded into an empty/absent/false result.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The parent directory of the database file could not be created.
    #[error("failed to create database directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// `SQLite` refused to open the database file.
    #[error("failed to open database {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Connection pragmas could not be applied.
    #[error("failed to configure database connection: {0}")]
    Configure(#[source] rusqlite::Error),

    /// The schema batch failed to apply.
    #[error("failed to apply schema: {0}")]
    Schema(#[source] rusqlite::Error),

    /// The file was written by a newer schema than this binary understands.
    #[error("database schema version {found} is newer than supported version {supported}")]
    UnsupportedSchema { found: u32, supported: u32 },

    /// Closing the connection failed; the handle is dropped regardless.
    #[error("failed to close database: {0}")]
    Close(#[source] rusqlite::Error),
}

impl StoreError {
    /// Map this failure to its stable [`ErrorCode`].
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::CreateDir { .. } | Self::Open { .. } | Self::Configure(_) | Self::Close(_) => {
                ErrorCode::StoreUnavailable
            }
            Self::Schema(_) | Self::UnsupportedSchema { .. } => ErrorCode::SchemaApplyFailed,
        }
    }
}

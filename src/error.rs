use thiserror::Error;

/// Errors raised while configuring or driving a grid-world MDP.
///
/// Every variant describes caller misuse. The numerical kernel itself has no
/// failure modes once a grid has been validated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MdpError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("cell ({row}, {col}) lies outside the {height}x{width} grid")]
    OutOfBounds {
        row: i32,
        col: i32,
        height: usize,
        width: usize,
    },

    #[error("cell ({row}, {col}) is already used by the {existing}")]
    CellConflict {
        row: i32,
        col: i32,
        existing: &'static str,
    },

    #[error("the {0} location has already been set")]
    AlreadyConfigured(&'static str),

    #[error("the {0} location must be set before solving")]
    MissingTerminal(&'static str),

    #[error("terminal cells must be pinned before sweeping")]
    NotPinned,

    #[error("table entry at ({row}, {col}) rejected: {reason}")]
    TableInvariant {
        row: i32,
        col: i32,
        reason: &'static str,
    },
}

impl MdpError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        MdpError::InvalidInput(msg.into())
    }

    pub(crate) fn out_of_bounds(row: i32, col: i32, height: usize, width: usize) -> Self {
        MdpError::OutOfBounds {
            row,
            col,
            height,
            width,
        }
    }
}

pub type Result<T> = std::result::Result<T, MdpError>;

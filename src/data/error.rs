use super::assignment::AssignmentStatus;

/// Everything that can go wrong between the raw export and the ratio plot.
///
/// Parser variants (`UnrecognizedFormat`, `MalformedWellIdentifier`,
/// `MalformedChannelHeader`, `DuplicateWell`) invalidate the whole upload.
/// The remaining variants are scoped to a single compound.
#[derive(Debug, thiserror::Error)]
pub enum WranglerError {
    #[error("Unrecognized export format: {0}")]
    UnrecognizedFormat(String),

    #[error("Malformed well identifier '{cell}': expected a row letter followed by a column number")]
    MalformedWellIdentifier { cell: String },

    #[error("Malformed channel header '{header}': expected '<channel>' or '<channel>.<n>'")]
    MalformedChannelHeader { header: String },

    #[error("Well {0} appears more than once in the export")]
    DuplicateWell(String),

    #[error("'{token}' is not a number")]
    ConcentrationParse { token: String },

    #[error("{0}")]
    AssignmentCountMismatch(AssignmentStatus),

    #[error("Assignment is incomplete: {0}")]
    IncompleteAssignment(String),

    #[error("Concentration {0} is assigned to more than one row")]
    DuplicateConcentration(f64),

    #[error("Channel '{0}' is not present in this export")]
    MissingChannel(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WranglerError>;

/// Problems with the arguments of a temporal edit.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TemporalError {
    #[error("processing date must be infinity when creating/modifying an object (key: {key})")]
    ImmutableHistory { key: String },

    #[error("business date must not be infinity when creating/modifying an object (key: {key})")]
    InfiniteBusinessDate { key: String },

    #[error("processing date must be infinity for an insert (key: {key})")]
    NonCurrentInsert { key: String },

    #[error("Dated objects must not have an infinity date when being inserted/modified (key: {key})")]
    InfinityDate { key: String },

    #[error("until date set incorrectly for {key}. expecting {expected} but was set to {actual}")]
    UntilDateMismatch {
        key: String,
        expected: String,
        actual: String,
    },

    #[error("need to specify {field} attribute for {key}")]
    MissingDate { key: String, field: &'static str },

    #[error("{axis} date must be valid for to and from {axis} dates (key: {key})")]
    DateOutOfRange { key: String, axis: &'static str },

    #[error("no business date set on {key}")]
    MissingBusinessDate { key: String },

    #[error("attribute {attribute} is not numeric and cannot be incremented")]
    NonNumericIncrement { attribute: String },

    #[error("cannot update readonly attribute {attribute}")]
    ReadOnlyAttribute { attribute: String },

    #[error("no data available to insert for {key}")]
    NothingToInsert { key: String },
}

use thiserror::Error;

/// Everything that aborts a conversion run.
///
/// Any of these halts the run before output is written: partially converted
/// schemas would compile but under-validate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    #[error("{schema}.{field}: unknown constraint keyword `{keyword}`")]
    UnknownConstraint {
        schema: String,
        field: String,
        keyword: String,
    },

    #[error("{schema}.{field}: malformed annotation: {reason}")]
    MalformedAnnotation {
        schema: String,
        field: String,
        reason: String,
    },

    #[error("{schema}: malformed node: {reason}")]
    MalformedNode { schema: String, reason: String },

    #[error("{schema}: validator `{validator}` is attached to unknown field `{field}`")]
    UnknownValidatorField {
        schema: String,
        field: String,
        validator: String,
    },

    #[error("schema name `{name}` is still ambiguous after deriving it from its file name")]
    DuplicateSchema { name: String },

    #[error("cyclic schema reference: {}", path.join(" -> "))]
    CyclicSchema { path: Vec<String> },

    #[error("`{name}` is referenced but never registered")]
    UnregisteredStruct { name: String },

    #[error("{schema}.{field}: cannot coerce {value} to a number")]
    Coercion {
        schema: String,
        field: String,
        value: String,
    },

    #[error("{path}: {message}")]
    Document { path: String, message: String },
}

pub type Result<T, E = ConvertError> = std::result::Result<T, E>;

use core::fmt;

/// Result alias for `semigmm`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by mixture fitting and dataset loading.
///
/// Every error is fatal to the fit call that produced it. Use
/// [`Error::is_numerical`] and [`Error::is_configuration`] to tell a
/// degenerate fit (retry with another seed) from bad input (fix the caller).
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Input was empty.
    EmptyInput,

    /// Matrix dimension mismatch (usize).
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// Shape mismatch (string description).
    ShapeMismatch {
        /// Expected shape description.
        expected: String,
        /// Actual shape description.
        actual: String,
    },

    /// Invalid number of clusters requested.
    InvalidClusterCount {
        /// Requested count.
        requested: usize,
        /// Number of items.
        n_items: usize,
    },

    /// Rows cannot be split into equal-size initialization groups.
    UnevenPartition {
        /// Number of rows.
        n_items: usize,
        /// Number of groups requested.
        n_groups: usize,
    },

    /// A label lies outside `[0, n_components)`.
    LabelOutOfRange {
        /// Row of the labeled matrix carrying the label.
        index: usize,
        /// Offending label.
        label: usize,
        /// Number of mixture components.
        n_components: usize,
    },

    /// Input matrix holds a NaN or infinite entry.
    NonFiniteInput {
        /// Row index.
        row: usize,
        /// Column index.
        col: usize,
    },

    /// Invalid parameter value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// Covariance of a component is singular or not positive-definite.
    SingularCovariance {
        /// Component index.
        component: usize,
    },

    /// A component received (almost) no responsibility mass.
    EmptyComponent {
        /// Component index.
        component: usize,
        /// Total weight the component received.
        weight: f64,
    },

    /// Mixture density at a point is zero or non-finite; its responsibilities
    /// cannot be normalized.
    DegenerateResponsibility {
        /// Row index of the point.
        point: usize,
    },

    /// Objective evaluated to NaN or an infinity.
    NonFiniteLogLikelihood {
        /// Iteration (1-based) that produced it.
        iteration: usize,
    },

    /// Malformed dataset text.
    Parse {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// I/O failure while reading a dataset.
    Io(String),

    /// Generic error with message.
    Other(String),
}

impl Error {
    /// True for failures of the numerics (degenerate fit); a different seed may succeed.
    pub fn is_numerical(&self) -> bool {
        matches!(
            self,
            Error::SingularCovariance { .. }
                | Error::EmptyComponent { .. }
                | Error::DegenerateResponsibility { .. }
                | Error::NonFiniteLogLikelihood { .. }
        )
    }

    /// True for invalid input or configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::EmptyInput
                | Error::DimensionMismatch { .. }
                | Error::ShapeMismatch { .. }
                | Error::InvalidClusterCount { .. }
                | Error::UnevenPartition { .. }
                | Error::LabelOutOfRange { .. }
                | Error::NonFiniteInput { .. }
                | Error::InvalidParameter { .. }
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "empty input provided"),
            Error::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {expected}, found {found}")
            }
            Error::ShapeMismatch { expected, actual } => {
                write!(f, "shape mismatch: expected {expected}, actual {actual}")
            }
            Error::InvalidClusterCount { requested, n_items } => {
                write!(f, "cannot create {requested} clusters from {n_items} items")
            }
            Error::UnevenPartition { n_items, n_groups } => {
                write!(
                    f,
                    "cannot split {n_items} rows into {n_groups} equal-size groups"
                )
            }
            Error::LabelOutOfRange {
                index,
                label,
                n_components,
            } => write!(
                f,
                "label {label} at labeled row {index} is outside [0, {n_components})"
            ),
            Error::NonFiniteInput { row, col } => {
                write!(f, "non-finite input value at ({row}, {col})")
            }
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
            Error::SingularCovariance { component } => write!(
                f,
                "covariance of component {component} is singular or not positive-definite"
            ),
            Error::EmptyComponent { component, weight } => write!(
                f,
                "component {component} collapsed: total responsibility {weight:e}"
            ),
            Error::DegenerateResponsibility { point } => write!(
                f,
                "mixture density at point {point} is zero or non-finite"
            ),
            Error::NonFiniteLogLikelihood { iteration } => {
                write!(f, "log-likelihood is not finite at iteration {iteration}")
            }
            Error::Parse { line, message } => write!(f, "line {line}: {message}"),
            Error::Io(msg) => write!(f, "i/o error: {msg}"),
            Error::Other(msg) => write!(f, "{msg}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

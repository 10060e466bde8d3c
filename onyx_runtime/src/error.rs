//! Error taxonomy for dynamic operations.
//!
//! Two families:
//! - `BindError`: the operation itself is malformed (wrong operand count,
//!   bad keyword layout). Detected before any rule executes.
//! - `DispatchError`: the real semantic error of a bound operation
//!   (member not found, not callable, bad index, ...). Raised by rule
//!   bodies and propagated to the caller unmodified.

// =============================================================================
// Bind Errors
// =============================================================================

/// Operation-shape errors detected before any rule executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// The operation requires a receiver but no arguments were supplied.
    MissingReceiver { operation: &'static str },

    /// Operand count does not match the operation's signature.
    WrongArgumentCount {
        operation: &'static str,
        expected: usize,
        given: usize,
    },

    /// More keyword names than arguments in a call signature.
    KeywordCountExceedsArguments { keywords: usize, argc: usize },

    /// The same keyword name appears twice in a call signature.
    RepeatedKeywordName { name: String },
}

impl std::fmt::Display for BindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingReceiver { operation } => {
                write!(f, "{} operation requires a receiver", operation)
            }
            Self::WrongArgumentCount {
                operation,
                expected,
                given,
            } => {
                write!(
                    f,
                    "{} operation takes {} operands but {} were given",
                    operation, expected, given
                )
            }
            Self::KeywordCountExceedsArguments { keywords, argc } => {
                write!(
                    f,
                    "call signature has {} keyword names for {} arguments",
                    keywords, argc
                )
            }
            Self::RepeatedKeywordName { name } => {
                write!(f, "keyword name '{}' repeated in call signature", name)
            }
        }
    }
}

impl std::error::Error for BindError {}

// =============================================================================
// Dispatch Errors
// =============================================================================

/// Domain errors raised by bound operations.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchError {
    /// Member lookup failed.
    MemberNotFound {
        type_name: &'static str,
        member: String,
    },

    /// Value cannot be invoked.
    NotCallable { type_name: &'static str },

    /// Value cannot be instantiated.
    NotConstructible { type_name: &'static str },

    /// Value does not support indexing.
    NotIndexable { type_name: &'static str },

    /// Container supports indexing but not with this key type.
    InvalidIndex {
        type_name: &'static str,
        index_type: &'static str,
    },

    /// List index outside the valid range.
    IndexOutOfRange { index: i64, len: usize },

    /// Map key not present.
    KeyNotFound { key: String },

    /// Binary operator not defined for the operand types.
    UnsupportedOperand {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },

    /// Unary operator not defined for the operand type.
    UnsupportedUnary {
        op: &'static str,
        operand: &'static str,
    },

    /// Integer arithmetic overflowed.
    ArithmeticOverflow { op: &'static str },

    /// Division by zero.
    DivisionByZero,

    /// Conversion between value kinds failed.
    ConversionFailed {
        from: &'static str,
        to: &'static str,
    },

    /// Too many positional arguments provided.
    TooManyArguments {
        callee: String,
        expected: usize,
        given: usize,
    },

    /// Missing required argument.
    MissingArgument { callee: String, parameter: String },

    /// Unexpected keyword argument (no matching parameter).
    UnexpectedKeyword { callee: String, keyword: String },

    /// Parameter received both a positional and a keyword value.
    DuplicateArgument { callee: String, parameter: String },

    /// The operation shape itself was malformed.
    Bind(BindError),
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MemberNotFound { type_name, member } => {
                write!(f, "'{}' value has no member '{}'", type_name, member)
            }
            Self::NotCallable { type_name } => {
                write!(f, "'{}' value is not callable", type_name)
            }
            Self::NotConstructible { type_name } => {
                write!(f, "'{}' value is not constructible", type_name)
            }
            Self::NotIndexable { type_name } => {
                write!(f, "'{}' value is not indexable", type_name)
            }
            Self::InvalidIndex {
                type_name,
                index_type,
            } => {
                write!(
                    f,
                    "'{}' value cannot be indexed by '{}'",
                    type_name, index_type
                )
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {} out of range for length {}", index, len)
            }
            Self::KeyNotFound { key } => write!(f, "key not found: '{}'", key),
            Self::UnsupportedOperand { op, lhs, rhs } => {
                write!(
                    f,
                    "unsupported operand types for {}: '{}' and '{}'",
                    op, lhs, rhs
                )
            }
            Self::UnsupportedUnary { op, operand } => {
                write!(f, "unsupported operand type for {}: '{}'", op, operand)
            }
            Self::ArithmeticOverflow { op } => {
                write!(f, "integer overflow in {}", op)
            }
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::ConversionFailed { from, to } => {
                write!(f, "cannot convert '{}' value to {}", from, to)
            }
            Self::TooManyArguments {
                callee,
                expected,
                given,
            } => {
                write!(
                    f,
                    "{}() takes {} arguments but {} were given",
                    callee, expected, given
                )
            }
            Self::MissingArgument { callee, parameter } => {
                write!(f, "{}() missing required argument: '{}'", callee, parameter)
            }
            Self::UnexpectedKeyword { callee, keyword } => {
                write!(
                    f,
                    "{}() got an unexpected keyword argument '{}'",
                    callee, keyword
                )
            }
            Self::DuplicateArgument { callee, parameter } => {
                write!(
                    f,
                    "{}() got multiple values for argument '{}'",
                    callee, parameter
                )
            }
            Self::Bind(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for DispatchError {}

impl From<BindError> for DispatchError {
    fn from(err: BindError) -> Self {
        Self::Bind(err)
    }
}

/// Result type for dynamic operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

// =============================================================================
// Tests
// =============================================================================

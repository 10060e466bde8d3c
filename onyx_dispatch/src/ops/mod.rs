//! Operation kinds and their binders.
//!
//! `DynOp` is the closed set of dynamic operations a call site can
//! stand for. Each variant carries the operation's static metadata
//! (a member name and its case sensitivity, or an argument count with
//! optional trailing keyword names), fixed when the binder is
//! constructed, once per distinct operation usage.
//!
//! One binder type per operation family lives in the submodules:
//! member access, indexing, invocation/instantiation, and
//! operators/conversions.

pub mod index;
pub mod invoke;
pub mod member;
pub mod operator;

pub use index::{DeleteIndexBinder, GetIndexBinder, SetIndexBinder};
pub use invoke::{CreateInstanceBinder, InvokeBinder, InvokeMemberBinder};
pub use member::{DeleteMemberBinder, GetMemberBinder, SetMemberBinder};
pub use operator::{BinaryOpBinder, ConvertBinder, UnaryOpBinder};

use onyx_runtime::{intern, BindError, Name, ShapeId, Value, ValueKind};

// =============================================================================
// Operation Metadata
// =============================================================================

/// Member name plus case sensitivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberSpec {
    /// The member name.
    pub name: Name,
    /// Match the name case-insensitively.
    pub ignore_case: bool,
}

impl MemberSpec {
    /// Case-sensitive member spec.
    pub fn new(name: &str) -> Self {
        Self {
            name: intern(name),
            ignore_case: false,
        }
    }

    /// Case-insensitive member spec.
    pub fn case_insensitive(name: &str) -> Self {
        Self {
            name: intern(name),
            ignore_case: true,
        }
    }
}

/// Argument count plus trailing keyword names.
///
/// Keyword names correspond pairwise to the last `kw_names.len()`
/// arguments: named arguments always trail positional ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallInfo {
    /// Number of operands (excluding the callee/receiver).
    pub argc: usize,
    /// Names of the trailing keyword arguments.
    pub kw_names: Vec<Name>,
}

impl CallInfo {
    /// Positional-only signature.
    pub fn positional(argc: usize) -> Self {
        Self {
            argc,
            kw_names: Vec::new(),
        }
    }

    /// Signature with trailing keyword names.
    pub fn with_keywords(argc: usize, names: &[&str]) -> Self {
        Self {
            argc,
            kw_names: names.iter().map(|n| intern(n)).collect(),
        }
    }

    /// Number of purely positional arguments.
    #[inline]
    pub fn positional_count(&self) -> usize {
        self.argc.saturating_sub(self.kw_names.len())
    }

    /// Reject malformed signatures before any rule executes.
    pub fn validate(&self) -> Result<(), BindError> {
        if self.kw_names.len() > self.argc {
            return Err(BindError::KeywordCountExceedsArguments {
                keywords: self.kw_names.len(),
                argc: self.argc,
            });
        }
        for (index, name) in self.kw_names.iter().enumerate() {
            if self.kw_names[..index].contains(name) {
                return Err(BindError::RepeatedKeywordName {
                    name: name.text().to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// Arithmetic negation.
    Neg,
    /// Logical (truthiness) negation.
    Not,
}

impl UnaryOperator {
    /// Source-level symbol, for error messages.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Not => "not",
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOperator {
    /// Source-level symbol, for error messages.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// Conversion targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertKind {
    Bool,
    Int,
    Float,
    Str,
}

impl ConvertKind {
    /// Target type name, for error messages.
    pub fn target_name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
        }
    }
}

// =============================================================================
// Operation Kinds
// =============================================================================

/// The closed set of dynamic operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DynOp {
    GetMember(MemberSpec),
    SetMember(MemberSpec),
    DeleteMember(MemberSpec),
    GetIndex,
    SetIndex,
    DeleteIndex,
    Invoke(CallInfo),
    InvokeMember(MemberSpec, CallInfo),
    CreateInstance(CallInfo),
    Convert(ConvertKind),
    Unary(UnaryOperator),
    Binary(BinaryOperator),
}

impl DynOp {
    /// Operation kind name, for diagnostics and bind errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::GetMember(_) => "get-member",
            Self::SetMember(_) => "set-member",
            Self::DeleteMember(_) => "delete-member",
            Self::GetIndex => "get-index",
            Self::SetIndex => "set-index",
            Self::DeleteIndex => "delete-index",
            Self::Invoke(_) => "invoke",
            Self::InvokeMember(..) => "invoke-member",
            Self::CreateInstance(_) => "create-instance",
            Self::Convert(_) => "convert",
            Self::Unary(_) => "unary-op",
            Self::Binary(_) => "binary-op",
        }
    }
}

// =============================================================================
// Shared Guard Builders
// =============================================================================

/// Guard: the receiver is an object with exactly this shape.
pub(crate) fn shape_guard(shape_id: ShapeId) -> impl Fn(&[Value]) -> bool {
    move |args| matches!(args.first(), Some(Value::Object(obj)) if obj.shape_id() == shape_id)
}

/// Guard: the receiver has this kind.
pub(crate) fn kind_guard(kind: ValueKind) -> impl Fn(&[Value]) -> bool {
    move |args| args.first().is_some_and(|v| v.kind() == kind)
}

/// Guard: the first two arguments have these kinds.
pub(crate) fn kind_pair_guard(first: ValueKind, second: ValueKind) -> impl Fn(&[Value]) -> bool {
    move |args| {
        args.first().is_some_and(|v| v.kind() == first)
            && args.get(1).is_some_and(|v| v.kind() == second)
    }
}

/// Helper for binders validating their operand count.
pub(crate) fn expect_arg_count(
    operation: &'static str,
    expected: usize,
    args: &[Value],
) -> Result<(), BindError> {
    if args.is_empty() {
        return Err(BindError::MissingReceiver { operation });
    }
    if args.len() != expected {
        return Err(BindError::WrongArgumentCount {
            operation,
            expected,
            given: args.len(),
        });
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

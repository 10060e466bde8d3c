//! Index binders: get, set, delete.
//!
//! Specializations guard on the (receiver kind, index kind) pair:
//! integer indexing for lists and strings, string keys for maps.
//! Anything else gets a kind-guarded rule raising the precise domain
//! error: not-indexable for receivers with no index protocol,
//! invalid-index for a supported receiver with the wrong key type.

use crate::binder::Binder;
use crate::cache::RuleCache;
use crate::ops::{kind_pair_guard, DynOp};
use crate::rule::Rule;
use onyx_runtime::{BindError, DispatchError, DispatchResult, Value, ValueKind};

fn invalid_index(receiver: Option<&Value>, index: Option<&Value>) -> DispatchError {
    match receiver {
        Some(r @ (Value::List(_) | Value::Map(_) | Value::Str(_))) => {
            DispatchError::InvalidIndex {
                type_name: r.type_name(),
                index_type: index.map_or("null", Value::type_name),
            }
        }
        Some(other) => DispatchError::NotIndexable {
            type_name: other.type_name(),
        },
        None => DispatchError::NotIndexable { type_name: "null" },
    }
}

fn str_char_at(text: &str, index: i64) -> DispatchResult<Value> {
    let len = text.chars().count();
    let adjusted = if index < 0 { index + len as i64 } else { index };
    if adjusted < 0 {
        return Err(DispatchError::IndexOutOfRange { index, len });
    }
    match text.chars().nth(adjusted as usize) {
        Some(ch) => Ok(Value::str(ch.to_string())),
        None => Err(DispatchError::IndexOutOfRange { index, len }),
    }
}

/// Rule raising the right error for an unsupported receiver/index pair.
fn reject_pair(first: ValueKind, second: ValueKind) -> Rule {
    Rule::guarded(kind_pair_guard(first, second), |args| {
        Err(invalid_index(args.first(), args.get(1)))
    })
}

// =============================================================================
// Get Index
// =============================================================================

/// Binder for `receiver[index]` reads.
pub struct GetIndexBinder {
    op: DynOp,
    cache: RuleCache,
}

impl GetIndexBinder {
    pub fn new() -> Self {
        Self {
            op: DynOp::GetIndex,
            cache: RuleCache::new(),
        }
    }
}

impl Default for GetIndexBinder {
    fn default() -> Self {
        Self::new()
    }
}

impl Binder for GetIndexBinder {
    fn operation(&self) -> &DynOp {
        &self.op
    }

    fn rule_cache(&self) -> &RuleCache {
        &self.cache
    }

    fn bind(&self, args: &[Value]) -> Result<Rule, BindError> {
        crate::ops::expect_arg_count("get-index", 2, args)?;
        let pair = (args[0].kind(), args[1].kind());

        Ok(match pair {
            (ValueKind::List, ValueKind::Int) => Rule::guarded(
                kind_pair_guard(ValueKind::List, ValueKind::Int),
                |args| match (args.first(), args.get(1)) {
                    (Some(Value::List(list)), Some(Value::Int(index))) => list.get(*index),
                    (receiver, index) => Err(invalid_index(receiver, index)),
                },
            ),
            (ValueKind::Map, ValueKind::Str) => Rule::guarded(
                kind_pair_guard(ValueKind::Map, ValueKind::Str),
                |args| match (args.first(), args.get(1)) {
                    (Some(Value::Map(map)), Some(Value::Str(key))) => {
                        map.get(key).ok_or_else(|| DispatchError::KeyNotFound {
                            key: key.to_string(),
                        })
                    }
                    (receiver, index) => Err(invalid_index(receiver, index)),
                },
            ),
            (ValueKind::Str, ValueKind::Int) => Rule::guarded(
                kind_pair_guard(ValueKind::Str, ValueKind::Int),
                |args| match (args.first(), args.get(1)) {
                    (Some(Value::Str(text)), Some(Value::Int(index))) => {
                        str_char_at(text, *index)
                    }
                    (receiver, index) => Err(invalid_index(receiver, index)),
                },
            ),
            (first, second) => reject_pair(first, second),
        })
    }
}

// =============================================================================
// Set Index
// =============================================================================

/// Binder for `receiver[index] = value` writes. The assigned value is
/// the operation's result.
pub struct SetIndexBinder {
    op: DynOp,
    cache: RuleCache,
}

impl SetIndexBinder {
    pub fn new() -> Self {
        Self {
            op: DynOp::SetIndex,
            cache: RuleCache::new(),
        }
    }
}

impl Default for SetIndexBinder {
    fn default() -> Self {
        Self::new()
    }
}

impl Binder for SetIndexBinder {
    fn operation(&self) -> &DynOp {
        &self.op
    }

    fn rule_cache(&self) -> &RuleCache {
        &self.cache
    }

    fn bind(&self, args: &[Value]) -> Result<Rule, BindError> {
        crate::ops::expect_arg_count("set-index", 3, args)?;
        let pair = (args[0].kind(), args[1].kind());

        Ok(match pair {
            (ValueKind::List, ValueKind::Int) => Rule::guarded(
                kind_pair_guard(ValueKind::List, ValueKind::Int),
                |args| match (args.first(), args.get(1), args.get(2)) {
                    (Some(Value::List(list)), Some(Value::Int(index)), Some(value)) => {
                        list.set(*index, value.clone())?;
                        Ok(value.clone())
                    }
                    (receiver, index, _) => Err(invalid_index(receiver, index)),
                },
            ),
            (ValueKind::Map, ValueKind::Str) => Rule::guarded(
                kind_pair_guard(ValueKind::Map, ValueKind::Str),
                |args| match (args.first(), args.get(1), args.get(2)) {
                    (Some(Value::Map(map)), Some(Value::Str(key)), Some(value)) => {
                        map.insert(key.clone(), value.clone());
                        Ok(value.clone())
                    }
                    (receiver, index, _) => Err(invalid_index(receiver, index)),
                },
            ),
            (first, second) => reject_pair(first, second),
        })
    }
}

// =============================================================================
// Delete Index
// =============================================================================

/// Binder for `delete receiver[index]`. Produces the removed value.
pub struct DeleteIndexBinder {
    op: DynOp,
    cache: RuleCache,
}

impl DeleteIndexBinder {
    pub fn new() -> Self {
        Self {
            op: DynOp::DeleteIndex,
            cache: RuleCache::new(),
        }
    }
}

impl Default for DeleteIndexBinder {
    fn default() -> Self {
        Self::new()
    }
}

impl Binder for DeleteIndexBinder {
    fn operation(&self) -> &DynOp {
        &self.op
    }

    fn rule_cache(&self) -> &RuleCache {
        &self.cache
    }

    fn bind(&self, args: &[Value]) -> Result<Rule, BindError> {
        crate::ops::expect_arg_count("delete-index", 2, args)?;
        let pair = (args[0].kind(), args[1].kind());

        Ok(match pair {
            (ValueKind::List, ValueKind::Int) => Rule::guarded(
                kind_pair_guard(ValueKind::List, ValueKind::Int),
                |args| match (args.first(), args.get(1)) {
                    (Some(Value::List(list)), Some(Value::Int(index))) => list.remove(*index),
                    (receiver, index) => Err(invalid_index(receiver, index)),
                },
            ),
            (ValueKind::Map, ValueKind::Str) => Rule::guarded(
                kind_pair_guard(ValueKind::Map, ValueKind::Str),
                |args| match (args.first(), args.get(1)) {
                    (Some(Value::Map(map)), Some(Value::Str(key))) => {
                        map.remove(key).ok_or_else(|| DispatchError::KeyNotFound {
                            key: key.to_string(),
                        })
                    }
                    (receiver, index) => Err(invalid_index(receiver, index)),
                },
            ),
            (first, second) => reject_pair(first, second),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

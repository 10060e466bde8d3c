//! Invocation binders: invoke, invoke-member, create-instance.
//!
//! Call rules guard on callee identity (the exact function or class),
//! plus the operand count fixed by the site's `CallInfo`. Keyword
//! binding resolves trailing named arguments to parameter positions
//! before the body runs; its errors are the operation's domain errors
//! and are never cached.

use crate::binder::Binder;
use crate::cache::RuleCache;
use crate::ops::{kind_guard, shape_guard, CallInfo, DynOp, MemberSpec};
use crate::rule::Rule;
use onyx_runtime::{
    bind_positional_and_keywords, BindError, ClassObject, DispatchError, DispatchResult, Name,
    Value,
};
use std::sync::Arc;

// =============================================================================
// Shared call helpers
// =============================================================================

/// Guard: exact callee identity and operand count.
fn callee_guard(callee: &Value, total_args: usize) -> impl Fn(&[Value]) -> bool {
    let callee = callee.clone();
    move |args| args.len() == total_args && args.first().is_some_and(|v| *v == callee)
}

/// Resolve operands and run a class construction.
fn construct(class: &Arc<ClassObject>, operands: &[Value], info: &CallInfo) -> DispatchResult<Value> {
    let callee = class.name().text();
    let bound = match class.constructor() {
        // Constructor's first parameter is the fresh instance; bind the
        // caller's operands against the remainder.
        Some(ctor) => bind_positional_and_keywords(
            &callee,
            ctor.param_names().get(1..).unwrap_or(&[]),
            operands,
            &info.kw_names,
        )?,
        // No constructor: operands fill the declared fields.
        None => bind_positional_and_keywords(&callee, class.fields(), operands, &info.kw_names)?,
    };
    class.instantiate(&bound)
}

/// Call a resolved member value with operands.
fn call_member_value(
    value: Value,
    operands: &[Value],
    kw_names: &[Name],
) -> DispatchResult<Value> {
    match value {
        Value::Function(func) => func.call_with_keywords(operands, kw_names),
        other => Err(DispatchError::NotCallable {
            type_name: other.type_name(),
        }),
    }
}

// =============================================================================
// Invoke
// =============================================================================

/// Binder for `callee(args...)`.
///
/// Functions are called; classes construct (invoking a class is
/// instantiation, as in most dynamic hosts). Everything else raises
/// not-callable.
pub struct InvokeBinder {
    op: DynOp,
    info: CallInfo,
    cache: RuleCache,
}

impl InvokeBinder {
    pub fn new(info: CallInfo) -> Self {
        Self {
            op: DynOp::Invoke(info.clone()),
            info,
            cache: RuleCache::new(),
        }
    }
}

impl Binder for InvokeBinder {
    fn operation(&self) -> &DynOp {
        &self.op
    }

    fn rule_cache(&self) -> &RuleCache {
        &self.cache
    }

    fn bind(&self, args: &[Value]) -> Result<Rule, BindError> {
        self.info.validate()?;
        let total = 1 + self.info.argc;
        crate::ops::expect_arg_count("invoke", total, args)?;

        Ok(match &args[0] {
            Value::Function(func) => {
                let func = Arc::clone(func);
                let kw_names = self.info.kw_names.clone();
                Rule::guarded(callee_guard(&args[0], total), move |args| {
                    func.call_with_keywords(&args[1..], &kw_names)
                })
            }
            Value::Class(class) => {
                let class = Arc::clone(class);
                let info = self.info.clone();
                Rule::guarded(callee_guard(&args[0], total), move |args| {
                    construct(&class, &args[1..], &info)
                })
            }
            other => {
                let kind = other.kind();
                Rule::guarded(kind_guard(kind), |args| {
                    Err(DispatchError::NotCallable {
                        type_name: args.first().map_or("null", Value::type_name),
                    })
                })
            }
        })
    }
}

// =============================================================================
// Invoke Member
// =============================================================================

/// Binder for `receiver.name(args...)`.
///
/// Rules guard on the receiver's shape; the member value is re-read
/// from its slot on every call, so two instances of one shape holding
/// different functions share a rule and still call their own function.
pub struct InvokeMemberBinder {
    op: DynOp,
    spec: MemberSpec,
    info: CallInfo,
    cache: RuleCache,
}

impl InvokeMemberBinder {
    pub fn new(name: &str, info: CallInfo) -> Self {
        Self::with_spec(MemberSpec::new(name), info)
    }

    pub fn case_insensitive(name: &str, info: CallInfo) -> Self {
        Self::with_spec(MemberSpec::case_insensitive(name), info)
    }

    fn with_spec(spec: MemberSpec, info: CallInfo) -> Self {
        Self {
            op: DynOp::InvokeMember(spec, info.clone()),
            spec,
            info,
            cache: RuleCache::new(),
        }
    }
}

impl Binder for InvokeMemberBinder {
    fn operation(&self) -> &DynOp {
        &self.op
    }

    fn rule_cache(&self) -> &RuleCache {
        &self.cache
    }

    fn bind(&self, args: &[Value]) -> Result<Rule, BindError> {
        self.info.validate()?;
        let total = 1 + self.info.argc;
        crate::ops::expect_arg_count("invoke-member", total, args)?;
        let spec = self.spec;
        let kw_names = self.info.kw_names.clone();

        Ok(match &args[0] {
            Value::Object(obj) => {
                let shape = obj.shape();
                let shape_id = shape.id();
                let slot = if spec.ignore_case {
                    shape.lookup_ignore_case(&spec.name.text())
                } else {
                    shape.lookup(spec.name)
                };
                match slot {
                    Some(slot) => Rule::guarded(
                        move |args| args.len() == total && shape_guard(shape_id)(args),
                        move |args| match args.first() {
                            Some(Value::Object(obj)) => {
                                call_member_value(obj.read_slot(slot), &args[1..], &kw_names)
                            }
                            other => Err(DispatchError::MemberNotFound {
                                type_name: other.map_or("null", Value::type_name),
                                member: spec.name.text().to_string(),
                            }),
                        },
                    ),
                    None => Rule::guarded(
                        move |args| args.len() == total && shape_guard(shape_id)(args),
                        move |args| {
                            let member = super::member::generic_get(args, spec)?;
                            call_member_value(member, &args[1..], &kw_names)
                        },
                    ),
                }
            }
            other => {
                let kind = other.kind();
                Rule::guarded(
                    move |args| args.len() == total && kind_guard(kind)(args),
                    move |args| {
                        let member = super::member::generic_get(args, spec)?;
                        call_member_value(member, &args[1..], &kw_names)
                    },
                )
            }
        })
    }
}

// =============================================================================
// Create Instance
// =============================================================================

/// Binder for `new callee(args...)`.
pub struct CreateInstanceBinder {
    op: DynOp,
    info: CallInfo,
    cache: RuleCache,
}

impl CreateInstanceBinder {
    pub fn new(info: CallInfo) -> Self {
        Self {
            op: DynOp::CreateInstance(info.clone()),
            info,
            cache: RuleCache::new(),
        }
    }
}

impl Binder for CreateInstanceBinder {
    fn operation(&self) -> &DynOp {
        &self.op
    }

    fn rule_cache(&self) -> &RuleCache {
        &self.cache
    }

    fn bind(&self, args: &[Value]) -> Result<Rule, BindError> {
        self.info.validate()?;
        let total = 1 + self.info.argc;
        crate::ops::expect_arg_count("create-instance", total, args)?;

        Ok(match &args[0] {
            Value::Class(class) => {
                let class = Arc::clone(class);
                let info = self.info.clone();
                Rule::guarded(callee_guard(&args[0], total), move |args| {
                    construct(&class, &args[1..], &info)
                })
            }
            other => {
                let kind = other.kind();
                Rule::guarded(kind_guard(kind), |args| {
                    Err(DispatchError::NotConstructible {
                        type_name: args.first().map_or("null", Value::type_name),
                    })
                })
            }
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

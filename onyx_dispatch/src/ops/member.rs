//! Member access binders: get, set, delete.
//!
//! For object receivers every rule guards on the receiver's exact
//! shape, so the body can touch the resolved slot directly. A member
//! that is absent still gets a shape-guarded rule whose body re-runs
//! the full generic lookup before raising. The failure is recomputed
//! on every call, never cached, and any shape change (the object
//! gaining the member) falsifies the guard.
//!
//! Non-object receivers get kind-guarded rules over the generic path,
//! which also serves the built-in `length` member on strings, lists
//! and maps.

use crate::binder::Binder;
use crate::cache::RuleCache;
use crate::ops::{kind_guard, shape_guard, DynOp, MemberSpec};
use crate::rule::Rule;
use onyx_runtime::{
    global_shapes, BindError, DispatchError, DispatchResult, Name, Shape, Value,
};

// =============================================================================
// Generic (slow-path) member access
// =============================================================================

fn member_not_found(receiver: Option<&Value>, spec: MemberSpec) -> DispatchError {
    DispatchError::MemberNotFound {
        type_name: receiver.map_or("null", Value::type_name),
        member: spec.name.text().to_string(),
    }
}

fn member_slot(spec: MemberSpec, shape: &Shape) -> Option<u16> {
    if spec.ignore_case {
        shape.lookup_ignore_case(&spec.name.text())
    } else {
        shape.lookup(spec.name)
    }
}

/// The declared name of the member `spec` resolves to on `shape`
/// (differs from `spec.name` only in case).
fn member_name(spec: MemberSpec, shape: &Shape) -> Option<Name> {
    let slot = member_slot(spec, shape)?;
    shape
        .properties()
        .iter()
        .find(|desc| desc.slot == slot)
        .map(|desc| desc.name)
}

fn is_length_member(spec: MemberSpec) -> bool {
    if spec.ignore_case {
        spec.name.text().eq_ignore_ascii_case("length")
    } else {
        &*spec.name.text() == "length"
    }
}

/// Full member lookup: object slots, then built-in members.
pub(crate) fn generic_get(args: &[Value], spec: MemberSpec) -> DispatchResult<Value> {
    let receiver = args.first();
    if let Some(Value::Object(obj)) = receiver {
        let found = if spec.ignore_case {
            obj.get_member_ignore_case(&spec.name.text())
        } else {
            obj.get_member(spec.name)
        };
        return found.ok_or_else(|| member_not_found(receiver, spec));
    }

    if is_length_member(spec) {
        match receiver {
            Some(Value::Str(s)) => return Ok(Value::Int(s.chars().count() as i64)),
            Some(Value::List(list)) => return Ok(Value::Int(list.len() as i64)),
            Some(Value::Map(map)) => return Ok(Value::Int(map.len() as i64)),
            _ => {}
        }
    }
    Err(member_not_found(receiver, spec))
}

// =============================================================================
// Get Member
// =============================================================================

/// Binder for `receiver.name` reads.
pub struct GetMemberBinder {
    op: DynOp,
    spec: MemberSpec,
    cache: RuleCache,
}

impl GetMemberBinder {
    /// Bind reads of `name`, case-sensitively.
    pub fn new(name: &str) -> Self {
        Self::with_spec(MemberSpec::new(name))
    }

    /// Bind reads of `name`, ignoring case.
    pub fn case_insensitive(name: &str) -> Self {
        Self::with_spec(MemberSpec::case_insensitive(name))
    }

    fn with_spec(spec: MemberSpec) -> Self {
        Self {
            op: DynOp::GetMember(spec),
            spec,
            cache: RuleCache::new(),
        }
    }
}

impl Binder for GetMemberBinder {
    fn operation(&self) -> &DynOp {
        &self.op
    }

    fn rule_cache(&self) -> &RuleCache {
        &self.cache
    }

    fn bind(&self, args: &[Value]) -> Result<Rule, BindError> {
        let spec = self.spec;
        let receiver = args.first().ok_or(BindError::MissingReceiver {
            operation: "get-member",
        })?;

        Ok(match receiver {
            Value::Object(obj) => {
                let shape = obj.shape();
                let shape_id = shape.id();
                match member_slot(spec, &shape) {
                    Some(slot) => Rule::guarded(shape_guard(shape_id), move |args| {
                        match args.first() {
                            Some(Value::Object(obj)) => Ok(obj.read_slot(slot)),
                            other => Err(member_not_found(other, spec)),
                        }
                    }),
                    None => {
                        Rule::guarded(shape_guard(shape_id), move |args| generic_get(args, spec))
                    }
                }
            }
            other => {
                let kind = other.kind();
                Rule::guarded(kind_guard(kind), move |args| generic_get(args, spec))
            }
        })
    }
}

// =============================================================================
// Set Member
// =============================================================================

/// Binder for `receiver.name = value` writes. The assigned value is
/// the operation's result.
pub struct SetMemberBinder {
    op: DynOp,
    spec: MemberSpec,
    cache: RuleCache,
}

impl SetMemberBinder {
    /// Bind writes of `name`, case-sensitively.
    pub fn new(name: &str) -> Self {
        Self::with_spec(MemberSpec::new(name))
    }

    /// Bind writes of `name`, ignoring case.
    pub fn case_insensitive(name: &str) -> Self {
        Self::with_spec(MemberSpec::case_insensitive(name))
    }

    fn with_spec(spec: MemberSpec) -> Self {
        Self {
            op: DynOp::SetMember(spec),
            spec,
            cache: RuleCache::new(),
        }
    }
}

impl Binder for SetMemberBinder {
    fn operation(&self) -> &DynOp {
        &self.op
    }

    fn rule_cache(&self) -> &RuleCache {
        &self.cache
    }

    fn bind(&self, args: &[Value]) -> Result<Rule, BindError> {
        crate::ops::expect_arg_count("set-member", 2, args)?;
        let spec = self.spec;

        Ok(match &args[0] {
            Value::Object(obj) => {
                let shape = obj.shape();
                let shape_id = shape.id();
                match member_slot(spec, &shape) {
                    // Existing member: in-place slot write.
                    Some(slot) => Rule::guarded(shape_guard(shape_id), move |args| {
                        match (args.first(), args.get(1)) {
                            (Some(Value::Object(obj)), Some(value)) => {
                                obj.write_slot(slot, value.clone());
                                Ok(value.clone())
                            }
                            (other, _) => Err(member_not_found(other, spec)),
                        }
                    }),
                    // New member: the body transitions the shape. The
                    // guard pins the pre-transition shape, so the rule
                    // serves every instance taking the same path.
                    None => Rule::guarded(shape_guard(shape_id), move |args| {
                        match (args.first(), args.get(1)) {
                            (Some(Value::Object(obj)), Some(value)) => {
                                obj.set_member(spec.name, value.clone(), global_shapes());
                                Ok(value.clone())
                            }
                            (other, _) => Err(member_not_found(other, spec)),
                        }
                    }),
                }
            }
            other => {
                let kind = other.kind();
                Rule::guarded(kind_guard(kind), move |args| {
                    Err(member_not_found(args.first(), spec))
                })
            }
        })
    }
}

// =============================================================================
// Delete Member
// =============================================================================

/// Binder for `delete receiver.name`. Produces null on success.
pub struct DeleteMemberBinder {
    op: DynOp,
    spec: MemberSpec,
    cache: RuleCache,
}

impl DeleteMemberBinder {
    /// Bind deletes of `name`, case-sensitively.
    pub fn new(name: &str) -> Self {
        Self::with_spec(MemberSpec::new(name))
    }

    /// Bind deletes of `name`, ignoring case.
    pub fn case_insensitive(name: &str) -> Self {
        Self::with_spec(MemberSpec::case_insensitive(name))
    }

    fn with_spec(spec: MemberSpec) -> Self {
        Self {
            op: DynOp::DeleteMember(spec),
            spec,
            cache: RuleCache::new(),
        }
    }
}

impl Binder for DeleteMemberBinder {
    fn operation(&self) -> &DynOp {
        &self.op
    }

    fn rule_cache(&self) -> &RuleCache {
        &self.cache
    }

    fn bind(&self, args: &[Value]) -> Result<Rule, BindError> {
        let spec = self.spec;
        let receiver = args.first().ok_or(BindError::MissingReceiver {
            operation: "delete-member",
        })?;

        Ok(match receiver {
            Value::Object(obj) => {
                let shape = obj.shape();
                let shape_id = shape.id();
                match member_name(spec, &shape) {
                    Some(resolved) => Rule::guarded(shape_guard(shape_id), move |args| {
                        match args.first() {
                            Some(Value::Object(obj)) => {
                                if obj.delete_member(resolved, global_shapes()) {
                                    Ok(Value::Null)
                                } else {
                                    Err(member_not_found(args.first(), spec))
                                }
                            }
                            other => Err(member_not_found(other, spec)),
                        }
                    }),
                    None => Rule::guarded(shape_guard(shape_id), move |args| {
                        Err(member_not_found(args.first(), spec))
                    }),
                }
            }
            other => {
                let kind = other.kind();
                Rule::guarded(kind_guard(kind), move |args| {
                    Err(member_not_found(args.first(), spec))
                })
            }
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::CallSite;
    use onyx_runtime::{intern, Instance};
    use std::sync::Arc;

    fn object_with(fields: &[(&str, i64)]) -> Value {
        let obj = Instance::new(global_shapes().empty_shape());
        for (name, value) in fields {
            obj.set_member(intern(name), Value::Int(*value), global_shapes());
        }
        Value::Object(Arc::new(obj))
    }

    #[test]
    fn test_get_member_reads_slot() {
        let site = CallSite::new(Arc::new(GetMemberBinder::new("x")));
        let obj = object_with(&[("x", 11)]);
        assert_eq!(site.invoke(&[obj]).unwrap(), Value::Int(11));
    }

    #[test]
    fn test_get_member_missing_raises_every_time() {
        let site = CallSite::new(Arc::new(GetMemberBinder::new("ghost")));
        let obj = object_with(&[("x", 1)]);

        for calls in 1..=3u64 {
            let err = site.invoke(&[obj.clone()]).unwrap_err();
            assert!(matches!(err, DispatchError::MemberNotFound { .. }));
            // Failures are never cached: every call re-attempts full
            // resolution through the binder.
            assert_eq!(site.stats().binds, calls);
        }
    }

    #[test]
    fn test_get_member_after_gaining_member() {
        let site = CallSite::new(Arc::new(GetMemberBinder::new("late")));
        let obj = object_with(&[]);

        assert!(site.invoke(&[obj.clone()]).is_err());

        // Gaining the member changes the shape, falsifying the old guard.
        if let Value::Object(instance) = &obj {
            instance.set_member(intern("late"), Value::Int(5), global_shapes());
        }
        assert_eq!(site.invoke(&[obj]).unwrap(), Value::Int(5));
    }

    #[test]
    fn test_get_member_ignore_case() {
        let site = CallSite::new(Arc::new(GetMemberBinder::case_insensitive("SPEED")));
        let obj = object_with(&[("Speed", 88)]);
        assert_eq!(site.invoke(&[obj]).unwrap(), Value::Int(88));
    }

    #[test]
    fn test_builtin_length_members() {
        let site = CallSite::new(Arc::new(GetMemberBinder::new("length")));
        assert_eq!(
            site.invoke(&[Value::str("onyx")]).unwrap(),
            Value::Int(4)
        );
        assert_eq!(
            site.invoke(&[Value::list(vec![Value::Null; 3])]).unwrap(),
            Value::Int(3)
        );
    }

    #[test]
    fn test_get_member_on_primitive() {
        let site = CallSite::new(Arc::new(GetMemberBinder::new("x")));
        let err = site.invoke(&[Value::Int(1)]).unwrap_err();
        assert_eq!(
            err,
            DispatchError::MemberNotFound {
                type_name: "int",
                member: "x".to_string(),
            }
        );
    }

    #[test]
    fn test_set_member_existing_slot() {
        let site = CallSite::new(Arc::new(SetMemberBinder::new("x")));
        let obj = object_with(&[("x", 1)]);
        let result = site.invoke(&[obj.clone(), Value::Int(2)]).unwrap();
        assert_eq!(result, Value::Int(2));

        let get = CallSite::new(Arc::new(GetMemberBinder::new("x")));
        assert_eq!(get.invoke(&[obj]).unwrap(), Value::Int(2));
    }

    #[test]
    fn test_set_member_adds_and_transitions() {
        let site = CallSite::new(Arc::new(SetMemberBinder::new("fresh")));
        let obj = object_with(&[("x", 1)]);
        let before = obj.as_object().unwrap().shape_id();

        site.invoke(&[obj.clone(), Value::Int(9)]).unwrap();
        assert_ne!(obj.as_object().unwrap().shape_id(), before);
        assert_eq!(
            obj.as_object().unwrap().get_member(intern("fresh")),
            Some(Value::Int(9))
        );
    }

    #[test]
    fn test_set_member_rule_shared_across_same_shape() {
        let binder = Arc::new(SetMemberBinder::new("y"));
        let site = CallSite::new(binder);
        let a = object_with(&[("x", 1)]);
        let b = object_with(&[("x", 2)]);

        site.invoke(&[a, Value::Int(10)]).unwrap();
        site.invoke(&[b, Value::Int(20)]).unwrap();
        // Same pre-transition shape: the first rule covers both.
        assert_eq!(site.stats().binds, 1);
    }

    #[test]
    fn test_delete_member() {
        let site = CallSite::new(Arc::new(DeleteMemberBinder::new("x")));
        let obj = object_with(&[("x", 1), ("y", 2)]);

        assert_eq!(site.invoke(&[obj.clone()]).unwrap(), Value::Null);
        assert_eq!(obj.as_object().unwrap().get_member(intern("x")), None);
        assert_eq!(
            obj.as_object().unwrap().get_member(intern("y")),
            Some(Value::Int(2))
        );

        // Deleting again: the shape changed, rebind raises.
        let err = site.invoke(&[obj]).unwrap_err();
        assert!(matches!(err, DispatchError::MemberNotFound { .. }));
    }
}

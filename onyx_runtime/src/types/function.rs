//! Native function objects.
//!
//! A `FunctionObject` is a named native callable with declared parameter
//! names. Parameter names drive keyword-argument binding: callers may
//! pass trailing arguments by name, and binding resolves them to
//! parameter positions before the body runs.
//!
//! # Binding Algorithm
//!
//! 1. The first `argc - k` arguments are positional and fill parameters
//!    left to right.
//! 2. The last `k` arguments correspond pairwise to the `k` keyword
//!    names and fill the parameters those names denote.
//! 3. A parameter receiving both a positional and a keyword value, an
//!    unknown keyword name, or an unfilled parameter is an error.

use crate::error::{BindError, DispatchError, DispatchResult};
use crate::intern::{intern, Name};
use crate::value::Value;
use std::sync::Arc;

/// Boxed native function body.
pub type NativeFn = dyn Fn(&[Value]) -> DispatchResult<Value> + Send + Sync;

/// A named native callable with fixed parameters.
pub struct FunctionObject {
    name: Name,
    params: Vec<Name>,
    body: Box<NativeFn>,
}

impl FunctionObject {
    /// Create a native function. Returned in an `Arc` because function
    /// identity (pointer equality) is what call-site guards check.
    pub fn native(
        name: &str,
        params: &[&str],
        body: impl Fn(&[Value]) -> DispatchResult<Value> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: intern(name),
            params: params.iter().map(|p| intern(p)).collect(),
            body: Box::new(body),
        })
    }

    /// Function name.
    #[inline]
    pub fn name(&self) -> Name {
        self.name
    }

    /// Declared parameter names.
    #[inline]
    pub fn param_names(&self) -> &[Name] {
        &self.params
    }

    /// Number of parameters.
    #[inline]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Call with positional arguments only.
    pub fn call(&self, args: &[Value]) -> DispatchResult<Value> {
        self.check_arity(args.len())?;
        (self.body)(args)
    }

    /// Call with trailing keyword arguments.
    pub fn call_with_keywords(&self, args: &[Value], kw_names: &[Name]) -> DispatchResult<Value> {
        let bound = self.bind_arguments(args, kw_names)?;
        (self.body)(&bound)
    }

    /// Resolve positional plus trailing keyword arguments into
    /// parameter order.
    pub fn bind_arguments(&self, args: &[Value], kw_names: &[Name]) -> DispatchResult<Vec<Value>> {
        bind_positional_and_keywords(&self.name.text(), &self.params, args, kw_names)
    }

    fn check_arity(&self, given: usize) -> DispatchResult<()> {
        if given > self.params.len() {
            return Err(DispatchError::TooManyArguments {
                callee: self.name.text().to_string(),
                expected: self.params.len(),
                given,
            });
        }
        if given < self.params.len() {
            return Err(DispatchError::MissingArgument {
                callee: self.name.text().to_string(),
                parameter: self.params[given].text().to_string(),
            });
        }
        Ok(())
    }
}

/// Resolve positional plus trailing keyword arguments against an
/// arbitrary parameter list. Shared by function calls, member
/// invocation and constructor dispatch.
pub fn bind_positional_and_keywords(
    callee: &str,
    params: &[Name],
    args: &[Value],
    kw_names: &[Name],
) -> DispatchResult<Vec<Value>> {
    if kw_names.is_empty() {
        if args.len() > params.len() {
            return Err(DispatchError::TooManyArguments {
                callee: callee.to_string(),
                expected: params.len(),
                given: args.len(),
            });
        }
        if args.len() < params.len() {
            return Err(DispatchError::MissingArgument {
                callee: callee.to_string(),
                parameter: params[args.len()].text().to_string(),
            });
        }
        return Ok(args.to_vec());
    }

    let Some(positional) = args.len().checked_sub(kw_names.len()) else {
        return Err(BindError::KeywordCountExceedsArguments {
            keywords: kw_names.len(),
            argc: args.len(),
        }
        .into());
    };

    if positional > params.len() {
        return Err(DispatchError::TooManyArguments {
            callee: callee.to_string(),
            expected: params.len(),
            given: args.len(),
        });
    }

    let mut bound: Vec<Option<Value>> = vec![None; params.len()];
    for (index, value) in args[..positional].iter().enumerate() {
        bound[index] = Some(value.clone());
    }

    for (kw_name, value) in kw_names.iter().zip(&args[positional..]) {
        let Some(index) = params.iter().position(|p| p == kw_name) else {
            return Err(DispatchError::UnexpectedKeyword {
                callee: callee.to_string(),
                keyword: kw_name.text().to_string(),
            });
        };
        if bound[index].is_some() {
            return Err(DispatchError::DuplicateArgument {
                callee: callee.to_string(),
                parameter: kw_name.text().to_string(),
            });
        }
        bound[index] = Some(value.clone());
    }

    let mut resolved = Vec::with_capacity(params.len());
    for (index, slot) in bound.into_iter().enumerate() {
        match slot {
            Some(value) => resolved.push(value),
            None => {
                return Err(DispatchError::MissingArgument {
                    callee: callee.to_string(),
                    parameter: params[index].text().to_string(),
                })
            }
        }
    }
    Ok(resolved)
}

impl std::fmt::Debug for FunctionObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionObject")
            .field("name", &self.name.text())
            .field("arity", &self.params.len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn adder() -> Arc<FunctionObject> {
        FunctionObject::native("add", &["a", "b"], |args| {
            match (args[0].as_int(), args[1].as_int()) {
                (Some(a), Some(b)) => Ok(Value::Int(a + b)),
                _ => Err(DispatchError::UnsupportedOperand {
                    op: "+",
                    lhs: args[0].type_name(),
                    rhs: args[1].type_name(),
                }),
            }
        })
    }

    #[test]
    fn test_positional_call() {
        let func = adder();
        let result = func.call(&[Value::Int(2), Value::Int(3)]).unwrap();
        assert_eq!(result, Value::Int(5));
    }

    #[test]
    fn test_arity_errors() {
        let func = adder();
        let err = func.call(&[Value::Int(1)]).unwrap_err();
        assert_eq!(
            err,
            DispatchError::MissingArgument {
                callee: "add".to_string(),
                parameter: "b".to_string(),
            }
        );

        let err = func
            .call(&[Value::Int(1), Value::Int(2), Value::Int(3)])
            .unwrap_err();
        assert!(matches!(err, DispatchError::TooManyArguments { given: 3, .. }));
    }

    #[test]
    fn test_keyword_binding_trailing_names() {
        let func = adder();
        // add(10, b=4)
        let result = func
            .call_with_keywords(&[Value::Int(10), Value::Int(4)], &[intern("b")])
            .unwrap();
        assert_eq!(result, Value::Int(14));

        // add(b=4, a=10): all keywords, order by name
        let result = func
            .call_with_keywords(
                &[Value::Int(4), Value::Int(10)],
                &[intern("b"), intern("a")],
            )
            .unwrap();
        assert_eq!(result, Value::Int(14));
    }

    #[test]
    fn test_unexpected_keyword() {
        let func = adder();
        let err = func
            .call_with_keywords(&[Value::Int(1), Value::Int(2)], &[intern("c")])
            .unwrap_err();
        assert!(matches!(err, DispatchError::UnexpectedKeyword { .. }));
    }

    #[test]
    fn test_duplicate_argument() {
        let func = adder();
        // add(1, 2, a=3): 'a' already filled positionally
        let err = func
            .call_with_keywords(
                &[Value::Int(1), Value::Int(2), Value::Int(3)],
                &[intern("a")],
            )
            .unwrap_err();
        assert!(matches!(err, DispatchError::DuplicateArgument { .. }));
    }

    #[test]
    fn test_missing_argument_with_keywords() {
        let func = adder();
        // add(b=1): 'a' never filled
        let err = func
            .call_with_keywords(&[Value::Int(1)], &[intern("b")])
            .unwrap_err();
        assert_eq!(
            err,
            DispatchError::MissingArgument {
                callee: "add".to_string(),
                parameter: "a".to_string(),
            }
        );
    }
}

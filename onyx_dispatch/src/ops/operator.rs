//! Operator and conversion binders.
//!
//! Rules guard on the operand kind (or kind pair); bodies are
//! type-dispatched evaluators. Numeric operands promote int/float
//! mixes to float; integer arithmetic is checked, never wrapping.

use crate::binder::Binder;
use crate::cache::RuleCache;
use crate::ops::{
    kind_guard, kind_pair_guard, BinaryOperator, ConvertKind, DynOp, UnaryOperator,
};
use crate::rule::Rule;
use onyx_runtime::{BindError, DispatchError, DispatchResult, Value, ValueKind};

// =============================================================================
// Evaluators
// =============================================================================

fn unsupported(op: BinaryOperator, lhs: &Value, rhs: &Value) -> DispatchError {
    DispatchError::UnsupportedOperand {
        op: op.symbol(),
        lhs: lhs.type_name(),
        rhs: rhs.type_name(),
    }
}

/// Numeric view of a value, promoting int to float when mixed.
fn as_number_pair(lhs: &Value, rhs: &Value) -> Option<(f64, f64)> {
    let to_float = |v: &Value| match v {
        Value::Int(i) => Some(*i as f64),
        Value::Float(x) => Some(*x),
        _ => None,
    };
    Some((to_float(lhs)?, to_float(rhs)?))
}

fn arithmetic(op: BinaryOperator, lhs: &Value, rhs: &Value) -> DispatchResult<Value> {
    // Int × Int stays integral.
    if let (Value::Int(a), Value::Int(b)) = (lhs, rhs) {
        let result = match op {
            BinaryOperator::Add => a.checked_add(*b),
            BinaryOperator::Sub => a.checked_sub(*b),
            BinaryOperator::Mul => a.checked_mul(*b),
            BinaryOperator::Div => {
                if *b == 0 {
                    return Err(DispatchError::DivisionByZero);
                }
                a.checked_div(*b)
            }
            _ => return Err(unsupported(op, lhs, rhs)),
        };
        return result
            .map(Value::Int)
            .ok_or(DispatchError::ArithmeticOverflow { op: op.symbol() });
    }

    // Any other numeric mix promotes to float.
    if let Some((a, b)) = as_number_pair(lhs, rhs) {
        let result = match op {
            BinaryOperator::Add => a + b,
            BinaryOperator::Sub => a - b,
            BinaryOperator::Mul => a * b,
            BinaryOperator::Div => {
                if b == 0.0 {
                    return Err(DispatchError::DivisionByZero);
                }
                a / b
            }
            _ => return Err(unsupported(op, lhs, rhs)),
        };
        return Ok(Value::Float(result));
    }

    // String concatenation.
    if op == BinaryOperator::Add {
        if let (Value::Str(a), Value::Str(b)) = (lhs, rhs) {
            let mut joined = String::with_capacity(a.len() + b.len());
            joined.push_str(a);
            joined.push_str(b);
            return Ok(Value::str(joined));
        }
    }

    Err(unsupported(op, lhs, rhs))
}

fn ordering(op: BinaryOperator, lhs: &Value, rhs: &Value) -> DispatchResult<Value> {
    let decide = |ord: std::cmp::Ordering| {
        let holds = match op {
            BinaryOperator::Lt => ord.is_lt(),
            BinaryOperator::Le => ord.is_le(),
            BinaryOperator::Gt => ord.is_gt(),
            BinaryOperator::Ge => ord.is_ge(),
            _ => false,
        };
        Value::Bool(holds)
    };

    if let Some((a, b)) = as_number_pair(lhs, rhs) {
        return a
            .partial_cmp(&b)
            .map(decide)
            .ok_or(unsupported(op, lhs, rhs));
    }
    if let (Value::Str(a), Value::Str(b)) = (lhs, rhs) {
        return Ok(decide(a.cmp(b)));
    }
    Err(unsupported(op, lhs, rhs))
}

fn eval_binary(op: BinaryOperator, lhs: &Value, rhs: &Value) -> DispatchResult<Value> {
    match op {
        BinaryOperator::Add
        | BinaryOperator::Sub
        | BinaryOperator::Mul
        | BinaryOperator::Div => arithmetic(op, lhs, rhs),
        BinaryOperator::Eq => Ok(Value::Bool(lhs == rhs)),
        BinaryOperator::Ne => Ok(Value::Bool(lhs != rhs)),
        BinaryOperator::Lt | BinaryOperator::Le | BinaryOperator::Gt | BinaryOperator::Ge => {
            ordering(op, lhs, rhs)
        }
    }
}

fn eval_unary(op: UnaryOperator, operand: &Value) -> DispatchResult<Value> {
    match op {
        UnaryOperator::Neg => match operand {
            Value::Int(i) => i
                .checked_neg()
                .map(Value::Int)
                .ok_or(DispatchError::ArithmeticOverflow { op: "-" }),
            Value::Float(x) => Ok(Value::Float(-x)),
            other => Err(DispatchError::UnsupportedUnary {
                op: op.symbol(),
                operand: other.type_name(),
            }),
        },
        UnaryOperator::Not => Ok(Value::Bool(!operand.is_truthy())),
    }
}

fn eval_convert(target: ConvertKind, operand: &Value) -> DispatchResult<Value> {
    let failed = || DispatchError::ConversionFailed {
        from: operand.type_name(),
        to: target.target_name(),
    };
    match target {
        ConvertKind::Bool => Ok(Value::Bool(operand.is_truthy())),
        ConvertKind::Int => match operand {
            Value::Int(i) => Ok(Value::Int(*i)),
            Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
            Value::Float(x) if x.is_finite() => Ok(Value::Int(*x as i64)),
            Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| failed()),
            _ => Err(failed()),
        },
        ConvertKind::Float => match operand {
            Value::Int(i) => Ok(Value::Float(*i as f64)),
            Value::Float(x) => Ok(Value::Float(*x)),
            Value::Str(s) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| failed()),
            _ => Err(failed()),
        },
        ConvertKind::Str => Ok(Value::str(operand.to_string())),
    }
}

// =============================================================================
// Binary Operator Binder
// =============================================================================

/// Binder for `lhs op rhs`.
pub struct BinaryOpBinder {
    op: DynOp,
    operator: BinaryOperator,
    cache: RuleCache,
}

impl BinaryOpBinder {
    pub fn new(operator: BinaryOperator) -> Self {
        Self {
            op: DynOp::Binary(operator),
            operator,
            cache: RuleCache::new(),
        }
    }
}

impl Binder for BinaryOpBinder {
    fn operation(&self) -> &DynOp {
        &self.op
    }

    fn rule_cache(&self) -> &RuleCache {
        &self.cache
    }

    fn bind(&self, args: &[Value]) -> Result<Rule, BindError> {
        crate::ops::expect_arg_count("binary-op", 2, args)?;
        let operator = self.operator;
        let (lk, rk) = (args[0].kind(), args[1].kind());

        Ok(Rule::guarded(kind_pair_guard(lk, rk), move |args| {
            match (args.first(), args.get(1)) {
                (Some(lhs), Some(rhs)) => eval_binary(operator, lhs, rhs),
                _ => Err(DispatchError::UnsupportedOperand {
                    op: operator.symbol(),
                    lhs: "null",
                    rhs: "null",
                }),
            }
        }))
    }
}

// =============================================================================
// Unary Operator Binder
// =============================================================================

/// Binder for `op operand`.
pub struct UnaryOpBinder {
    op: DynOp,
    operator: UnaryOperator,
    cache: RuleCache,
}

impl UnaryOpBinder {
    pub fn new(operator: UnaryOperator) -> Self {
        Self {
            op: DynOp::Unary(operator),
            operator,
            cache: RuleCache::new(),
        }
    }
}

impl Binder for UnaryOpBinder {
    fn operation(&self) -> &DynOp {
        &self.op
    }

    fn rule_cache(&self) -> &RuleCache {
        &self.cache
    }

    fn bind(&self, args: &[Value]) -> Result<Rule, BindError> {
        crate::ops::expect_arg_count("unary-op", 1, args)?;
        let operator = self.operator;
        let kind = args[0].kind();

        Ok(Rule::guarded(kind_guard(kind), move |args| {
            match args.first() {
                Some(operand) => eval_unary(operator, operand),
                None => Err(DispatchError::UnsupportedUnary {
                    op: operator.symbol(),
                    operand: "null",
                }),
            }
        }))
    }
}

// =============================================================================
// Convert Binder
// =============================================================================

/// Binder for conversions to a fixed target kind.
pub struct ConvertBinder {
    op: DynOp,
    target: ConvertKind,
    cache: RuleCache,
}

impl ConvertBinder {
    pub fn new(target: ConvertKind) -> Self {
        Self {
            op: DynOp::Convert(target),
            target,
            cache: RuleCache::new(),
        }
    }
}

impl Binder for ConvertBinder {
    fn operation(&self) -> &DynOp {
        &self.op
    }

    fn rule_cache(&self) -> &RuleCache {
        &self.cache
    }

    fn bind(&self, args: &[Value]) -> Result<Rule, BindError> {
        crate::ops::expect_arg_count("convert", 1, args)?;
        let target = self.target;
        let kind = args[0].kind();

        Ok(Rule::guarded(kind_guard(kind), move |args| {
            match args.first() {
                Some(operand) => eval_convert(target, operand),
                None => Err(DispatchError::ConversionFailed {
                    from: "null",
                    to: target.target_name(),
                }),
            }
        }))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::CallSite;
    use std::sync::Arc;

    fn binary_site(op: BinaryOperator) -> Arc<CallSite> {
        CallSite::new(Arc::new(BinaryOpBinder::new(op)))
    }

    #[test]
    fn test_int_arithmetic() {
        let add = binary_site(BinaryOperator::Add);
        assert_eq!(
            add.invoke(&[Value::Int(2), Value::Int(3)]).unwrap(),
            Value::Int(5)
        );

        let div = binary_site(BinaryOperator::Div);
        assert_eq!(
            div.invoke(&[Value::Int(7), Value::Int(2)]).unwrap(),
            Value::Int(3)
        );
    }

    #[test]
    fn test_mixed_numeric_promotes_to_float() {
        let add = binary_site(BinaryOperator::Add);
        assert_eq!(
            add.invoke(&[Value::Int(1), Value::Float(0.5)]).unwrap(),
            Value::Float(1.5)
        );
        // Two kind pairs were observed.
        add.invoke(&[Value::Float(0.5), Value::Int(1)]).unwrap();
        assert_eq!(add.stats().binds, 2);
    }

    #[test]
    fn test_division_errors() {
        let div = binary_site(BinaryOperator::Div);
        assert_eq!(
            div.invoke(&[Value::Int(1), Value::Int(0)]).unwrap_err(),
            DispatchError::DivisionByZero
        );
    }

    #[test]
    fn test_int_overflow_is_checked() {
        let add = binary_site(BinaryOperator::Add);
        let err = add
            .invoke(&[Value::Int(i64::MAX), Value::Int(1)])
            .unwrap_err();
        assert_eq!(err, DispatchError::ArithmeticOverflow { op: "+" });
    }

    #[test]
    fn test_string_concat_and_compare() {
        let add = binary_site(BinaryOperator::Add);
        assert_eq!(
            add.invoke(&[Value::str("on"), Value::str("yx")]).unwrap(),
            Value::str("onyx")
        );

        let lt = binary_site(BinaryOperator::Lt);
        assert_eq!(
            lt.invoke(&[Value::str("a"), Value::str("b")]).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_equality_across_kinds() {
        let eq = binary_site(BinaryOperator::Eq);
        assert_eq!(
            eq.invoke(&[Value::Int(2), Value::Float(2.0)]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            eq.invoke(&[Value::str("a"), Value::Int(1)]).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_unsupported_operand() {
        let mul = binary_site(BinaryOperator::Mul);
        let err = mul
            .invoke(&[Value::str("a"), Value::Int(2)])
            .unwrap_err();
        assert_eq!(
            err,
            DispatchError::UnsupportedOperand {
                op: "*",
                lhs: "str",
                rhs: "int",
            }
        );
    }

    #[test]
    fn test_unary_neg_and_not() {
        let neg = CallSite::new(Arc::new(UnaryOpBinder::new(UnaryOperator::Neg)));
        assert_eq!(neg.invoke(&[Value::Int(5)]).unwrap(), Value::Int(-5));
        assert_eq!(
            neg.invoke(&[Value::Float(2.5)]).unwrap(),
            Value::Float(-2.5)
        );
        assert_eq!(
            neg.invoke(&[Value::str("x")]).unwrap_err(),
            DispatchError::UnsupportedUnary {
                op: "-",
                operand: "str"
            }
        );

        let not = CallSite::new(Arc::new(UnaryOpBinder::new(UnaryOperator::Not)));
        assert_eq!(not.invoke(&[Value::Int(0)]).unwrap(), Value::Bool(true));
        assert_eq!(not.invoke(&[Value::str("x")]).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_conversions() {
        let to_int = CallSite::new(Arc::new(ConvertBinder::new(ConvertKind::Int)));
        assert_eq!(to_int.invoke(&[Value::str(" 42 ")]).unwrap(), Value::Int(42));
        assert_eq!(to_int.invoke(&[Value::Float(3.9)]).unwrap(), Value::Int(3));
        assert_eq!(
            to_int.invoke(&[Value::str("nope")]).unwrap_err(),
            DispatchError::ConversionFailed {
                from: "str",
                to: "int"
            }
        );

        let to_str = CallSite::new(Arc::new(ConvertBinder::new(ConvertKind::Str)));
        assert_eq!(to_str.invoke(&[Value::Int(7)]).unwrap(), Value::str("7"));

        let to_bool = CallSite::new(Arc::new(ConvertBinder::new(ConvertKind::Bool)));
        assert_eq!(
            to_bool.invoke(&[Value::list(vec![])]).unwrap(),
            Value::Bool(false)
        );
    }
}

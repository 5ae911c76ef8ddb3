//! Binary and unary operator dispatch.
//!
//! Dispatch order for `lhs OP rhs`:
//! 1. a user-instance lhs gets its forward dunder (MRO-searched); any
//!    non-`NotImplemented` result wins;
//! 2. otherwise the host implementation for builtin operand types runs;
//! 3. a user-instance rhs gets the *reflected* dunder;
//! 4. exhaustion is `TypeError: unsupported operand type(s)`.
//!
//! Augmented assignment tries the in-place dunder on the current value
//! first (with true in-place mutation for lists and sets), then falls back
//! to the forward dispatch.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, ToPrimitive, Zero};

use crate::{
    args::ArgValues,
    ast::{BinOp, UnaryOp},
    exception_private::{ExcType, RunResult},
    heap::HeapData,
    types::list::repeat_items,
    value::{Num, Value, numeric_kind},
};

use super::Evaluator;

impl Evaluator<'_> {
    pub(crate) fn binary_op(&mut self, op: BinOp, lhs: Value, rhs: Value) -> RunResult<Value> {
        if self.is_instance(lhs) {
            if let Some(result) = self.call_dunder(lhs, op.dunder(), ArgValues::One(rhs))?
                && result != Value::NotImplemented
            {
                return Ok(result);
            }
        } else {
            let result = self.host_binary(op, lhs, rhs)?;
            if result != Value::NotImplemented {
                return Ok(result);
            }
        }

        if self.is_instance(rhs)
            && let Some(result) = self.call_dunder(rhs, op.reflected_dunder(), ArgValues::One(lhs))?
            && result != Value::NotImplemented
        {
            return Ok(result);
        }

        Err(self.binary_type_error(op, lhs, rhs))
    }

    fn binary_type_error(&self, op: BinOp, lhs: Value, rhs: Value) -> crate::exception_private::RunError {
        ExcType::type_error(format!(
            "unsupported operand type(s) for {}: '{}' and '{}'",
            op.symbol(),
            lhs.type_name(self.heap),
            rhs.type_name(self.heap)
        ))
    }

    /// Augmented assignment: `__iadd__` first, then forward dispatch.
    pub(crate) fn inplace_binary_op(&mut self, op: BinOp, current: Value, rhs: Value) -> RunResult<Value> {
        if self.is_instance(current) {
            if let Some(result) = self.call_dunder(current, op.inplace_dunder(), ArgValues::One(rhs))?
                && result != Value::NotImplemented
            {
                return Ok(result);
            }
            return self.binary_op(op, current, rhs);
        }

        // True in-place semantics for mutable containers, so aliases observe
        // the mutation.
        if let Value::Ref(id) = current {
            match (op, self.heap.get(id)) {
                (BinOp::Add, HeapData::List(_)) => {
                    let added = self.collect_iterable(rhs)?;
                    if let HeapData::List(items) = self.heap.get_mut(id) {
                        items.extend(added);
                    }
                    return Ok(current);
                }
                (BinOp::Mult, HeapData::List(items)) => {
                    if let Some(n) = crate::value::as_int(rhs, self.heap) {
                        let repeated = repeat_items(items, n);
                        if let HeapData::List(items) = self.heap.get_mut(id) {
                            *items = repeated;
                        }
                        return Ok(current);
                    }
                }
                (BinOp::BitOr | BinOp::BitAnd | BinOp::Sub | BinOp::BitXor, HeapData::Set(_)) => {
                    if self.set_items_of(rhs).is_some() {
                        let result = self.host_binary(op, current, rhs)?;
                        if result != Value::NotImplemented {
                            // Overwrite the original storage in place.
                            let Some(result_id) = result.ref_id() else {
                                unreachable!("set ops build sets");
                            };
                            let taken = std::mem::replace(
                                self.heap.get_mut(result_id),
                                HeapData::Set(crate::types::Set::new()),
                            );
                            *self.heap.get_mut(id) = taken;
                            return Ok(current);
                        }
                    }
                }
                _ => {}
            }
        }
        self.binary_op(op, current, rhs)
    }

    /// Host (non-instance) binary semantics. Returns `NotImplemented` when
    /// the operand types have no meaning for `op`.
    fn host_binary(&mut self, op: BinOp, lhs: Value, rhs: Value) -> RunResult<Value> {
        // The numeric tower (bool ⊂ int ⊂ float).
        if let (Some(a), Some(b)) = (numeric_kind(lhs, self.heap), numeric_kind(rhs, self.heap)) {
            return self.num_binary(op, a, b);
        }

        match op {
            BinOp::Add => self.host_concat(lhs, rhs),
            BinOp::Mult => self.host_repeat(lhs, rhs),
            BinOp::BitOr | BinOp::BitAnd | BinOp::BitXor | BinOp::Sub => self.host_set_op(op, lhs, rhs),
            _ => Ok(Value::NotImplemented),
        }
    }

    fn host_concat(&mut self, lhs: Value, rhs: Value) -> RunResult<Value> {
        let (Value::Ref(id1), Value::Ref(id2)) = (lhs, rhs) else {
            return Ok(Value::NotImplemented);
        };
        match (self.heap.get(id1), self.heap.get(id2)) {
            (HeapData::Str(a), HeapData::Str(b)) => {
                let joined = format!("{a}{b}");
                Ok(self.heap.alloc_str(joined))
            }
            (HeapData::Bytes(a), HeapData::Bytes(b)) => {
                let mut joined = a.clone();
                joined.extend_from_slice(b);
                Ok(self.heap.alloc_value(HeapData::Bytes(joined)))
            }
            (HeapData::List(a), HeapData::List(b)) => {
                let mut joined = a.clone();
                joined.extend_from_slice(b);
                Ok(self.heap.alloc_list(joined))
            }
            (HeapData::Tuple(a), HeapData::Tuple(b)) => {
                let mut joined = a.clone();
                joined.extend_from_slice(b);
                Ok(self.heap.alloc_tuple(joined))
            }
            _ => Ok(Value::NotImplemented),
        }
    }

    fn host_repeat(&mut self, lhs: Value, rhs: Value) -> RunResult<Value> {
        // seq * int or int * seq.
        let (seq, count) = if crate::value::is_int_like(rhs, self.heap) {
            (lhs, rhs)
        } else if crate::value::is_int_like(lhs, self.heap) {
            (rhs, lhs)
        } else {
            return Ok(Value::NotImplemented);
        };
        let Some(n) = crate::value::as_int(count, self.heap) else {
            return Err(ExcType::value_error("repeat count too large"));
        };
        let Value::Ref(id) = seq else {
            return Ok(Value::NotImplemented);
        };
        match self.heap.get(id) {
            HeapData::Str(s) => {
                let repeated = if n <= 0 { String::new() } else { s.repeat(n as usize) };
                Ok(self.heap.alloc_str(repeated))
            }
            HeapData::Bytes(b) => {
                let repeated = if n <= 0 { Vec::new() } else { b.repeat(n as usize) };
                Ok(self.heap.alloc_value(HeapData::Bytes(repeated)))
            }
            HeapData::List(items) => {
                let repeated = repeat_items(items, n);
                Ok(self.heap.alloc_list(repeated))
            }
            HeapData::Tuple(items) => {
                let repeated = repeat_items(items, n);
                Ok(self.heap.alloc_tuple(repeated))
            }
            _ => Ok(Value::NotImplemented),
        }
    }

    /// `| & ^ -` over sets, plus `|` as dict merge.
    fn host_set_op(&mut self, op: BinOp, lhs: Value, rhs: Value) -> RunResult<Value> {
        if op == BinOp::BitOr
            && let (Value::Ref(id1), Value::Ref(id2)) = (lhs, rhs)
            && matches!(self.heap.get(id1), HeapData::Dict(_))
            && matches!(self.heap.get(id2), HeapData::Dict(_))
        {
            let mut pairs = self.dict_pairs(lhs)?;
            pairs.extend(self.dict_pairs(rhs)?);
            return self.dict_from_pairs(pairs);
        }

        let (Some(a), Some(b)) = (self.set_items_of(lhs), self.set_items_of(rhs)) else {
            return Ok(Value::NotImplemented);
        };
        let result = match op {
            BinOp::BitOr => {
                let mut all = a;
                all.extend(b);
                all
            }
            BinOp::BitAnd => {
                let mut kept = Vec::new();
                for item in a {
                    if self.vec_contains(&b, item)? {
                        kept.push(item);
                    }
                }
                kept
            }
            BinOp::Sub => {
                let mut kept = Vec::new();
                for item in a {
                    if !self.vec_contains(&b, item)? {
                        kept.push(item);
                    }
                }
                kept
            }
            BinOp::BitXor => {
                let mut kept = Vec::new();
                for item in &a {
                    if !self.vec_contains(&b, *item)? {
                        kept.push(*item);
                    }
                }
                for item in &b {
                    if !self.vec_contains(&a, *item)? {
                        kept.push(*item);
                    }
                }
                kept
            }
            _ => unreachable!("set ops only"),
        };
        self.set_from_values(result, false)
    }

    pub(crate) fn vec_contains(&mut self, items: &[Value], needle: Value) -> RunResult<bool> {
        for item in items {
            if self.value_eq(needle, *item)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    // --- numeric tower ---

    fn num_binary(&mut self, op: BinOp, a: Num, b: Num) -> RunResult<Value> {
        // Any float operand promotes the whole operation.
        if matches!(a, Num::Float(_)) || matches!(b, Num::Float(_)) {
            let (Some(x), Some(y)) = (num_to_f64(&a), num_to_f64(&b)) else {
                return Err(ExcType::OverflowError.msg("int too large to convert to float"));
            };
            return self.float_binary(op, x, y);
        }
        match (a, b) {
            (Num::Int(x), Num::Int(y)) => self.int_binary(op, x, y),
            (a, b) => {
                let x = num_to_big(a);
                let y = num_to_big(b);
                self.big_binary(op, x, y)
            }
        }
    }

    fn float_binary(&mut self, op: BinOp, x: f64, y: f64) -> RunResult<Value> {
        let result = match op {
            BinOp::Add => x + y,
            BinOp::Sub => x - y,
            BinOp::Mult => x * y,
            BinOp::Div => {
                if y == 0.0 {
                    return Err(ExcType::zero_division("float division by zero"));
                }
                x / y
            }
            BinOp::FloorDiv => {
                if y == 0.0 {
                    return Err(ExcType::zero_division("float floor division by zero"));
                }
                (x / y).floor()
            }
            BinOp::Mod => {
                if y == 0.0 {
                    return Err(ExcType::zero_division("float modulo"));
                }
                // Result takes the divisor's sign, as in Python.
                x - y * (x / y).floor()
            }
            BinOp::Pow => x.powf(y),
            BinOp::MatMult
            | BinOp::LShift
            | BinOp::RShift
            | BinOp::BitAnd
            | BinOp::BitOr
            | BinOp::BitXor => return Ok(Value::NotImplemented),
        };
        Ok(Value::Float(result))
    }

    fn int_binary(&mut self, op: BinOp, x: i64, y: i64) -> RunResult<Value> {
        let result = match op {
            BinOp::Add => x.checked_add(y),
            BinOp::Sub => x.checked_sub(y),
            BinOp::Mult => x.checked_mul(y),
            BinOp::Div => {
                if y == 0 {
                    return Err(ExcType::zero_division("division by zero"));
                }
                return Ok(Value::Float(x as f64 / y as f64));
            }
            BinOp::FloorDiv => {
                if y == 0 {
                    return Err(ExcType::zero_division("integer division or modulo by zero"));
                }
                // Qualified call: i64 has an unstable inherent div_floor.
                Some(Integer::div_floor(&x, &y))
            }
            BinOp::Mod => {
                if y == 0 {
                    return Err(ExcType::zero_division("integer division or modulo by zero"));
                }
                Some(Integer::mod_floor(&x, &y))
            }
            BinOp::Pow => return self.int_pow(BigInt::from(x), BigInt::from(y)),
            BinOp::LShift => {
                if y < 0 {
                    return Err(ExcType::value_error("negative shift count"));
                }
                if y < 64 { x.checked_shl(y as u32).filter(|r| (r >> y) == x) } else { None }
            }
            BinOp::RShift => {
                if y < 0 {
                    return Err(ExcType::value_error("negative shift count"));
                }
                Some(if y >= 64 { if x < 0 { -1 } else { 0 } } else { x >> y })
            }
            BinOp::BitAnd => Some(x & y),
            BinOp::BitOr => Some(x | y),
            BinOp::BitXor => Some(x ^ y),
            BinOp::MatMult => return Ok(Value::NotImplemented),
        };
        match result {
            Some(value) => Ok(Value::Int(value)),
            // Overflow: redo in arbitrary precision.
            None => self.big_binary(op, BigInt::from(x), BigInt::from(y)),
        }
    }

    fn big_binary(&mut self, op: BinOp, x: BigInt, y: BigInt) -> RunResult<Value> {
        let result = match op {
            BinOp::Add => x + y,
            BinOp::Sub => x - y,
            BinOp::Mult => x * y,
            BinOp::Div => {
                if y.is_zero() {
                    return Err(ExcType::zero_division("division by zero"));
                }
                let (Some(fx), Some(fy)) = (x.to_f64(), y.to_f64()) else {
                    return Err(ExcType::OverflowError.msg("int too large to convert to float"));
                };
                return Ok(Value::Float(fx / fy));
            }
            BinOp::FloorDiv => {
                if y.is_zero() {
                    return Err(ExcType::zero_division("integer division or modulo by zero"));
                }
                x.div_floor(&y)
            }
            BinOp::Mod => {
                if y.is_zero() {
                    return Err(ExcType::zero_division("integer division or modulo by zero"));
                }
                x.mod_floor(&y)
            }
            BinOp::Pow => return self.int_pow(x, y),
            BinOp::LShift => {
                let Some(shift) = y.to_u64() else {
                    return Err(ExcType::value_error("negative shift count"));
                };
                x << shift
            }
            BinOp::RShift => {
                let Some(shift) = y.to_u64() else {
                    return Err(ExcType::value_error("negative shift count"));
                };
                x >> shift
            }
            BinOp::BitAnd => x & y,
            BinOp::BitOr => x | y,
            BinOp::BitXor => x ^ y,
            BinOp::MatMult => return Ok(Value::NotImplemented),
        };
        Ok(self.heap.alloc_int(result))
    }

    /// Integer power: negative exponents fall back to floats.
    fn int_pow(&mut self, base: BigInt, exp: BigInt) -> RunResult<Value> {
        if exp.is_negative() {
            if base.is_zero() {
                return Err(ExcType::zero_division("0.0 cannot be raised to a negative power"));
            }
            let (Some(b), Some(e)) = (base.to_f64(), exp.to_f64()) else {
                return Err(ExcType::OverflowError.msg("int too large to convert to float"));
            };
            return Ok(Value::Float(b.powf(e)));
        }
        let Some(exp) = exp.to_u32() else {
            return Err(ExcType::OverflowError.msg("exponent too large"));
        };
        Ok(self.heap.alloc_int(base.pow(exp)))
    }

    /// Three-argument `pow(base, exp, mod)` over integers.
    pub(crate) fn int_pow_mod(&mut self, base: &BigInt, exp: &BigInt, modulus: &BigInt) -> RunResult<Value> {
        if modulus.is_zero() {
            return Err(ExcType::value_error("pow() 3rd argument cannot be 0"));
        }
        if exp.is_negative() {
            return Err(ExcType::value_error(
                "pow() 2nd argument cannot be negative when 3rd argument specified",
            ));
        }
        Ok(self.heap.alloc_int(base.modpow(exp, modulus)))
    }

    // --- unary operators ---

    pub(crate) fn unary_op(&mut self, op: UnaryOp, operand: Value) -> RunResult<Value> {
        if self.is_instance(operand) {
            let dunder = match op {
                UnaryOp::Neg => "__neg__",
                UnaryOp::Pos => "__pos__",
                UnaryOp::Invert => "__invert__",
                UnaryOp::Not => unreachable!("handled by the caller via truthiness"),
            };
            if let Some(result) = self.call_dunder(operand, dunder, ArgValues::Empty)? {
                return Ok(result);
            }
        }

        match (op, operand) {
            (UnaryOp::Neg, Value::Int(i)) => Ok(match i.checked_neg() {
                Some(value) => Value::Int(value),
                None => self.heap.alloc_int(-BigInt::from(i)),
            }),
            (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
            (UnaryOp::Neg, Value::Bool(b)) => Ok(Value::Int(-i64::from(b))),
            (UnaryOp::Pos, Value::Int(_) | Value::Float(_)) => Ok(operand),
            (UnaryOp::Pos, Value::Bool(b)) => Ok(Value::Int(i64::from(b))),
            (UnaryOp::Invert, Value::Int(i)) => Ok(Value::Int(!i)),
            (UnaryOp::Invert, Value::Bool(b)) => Ok(Value::Int(!i64::from(b))),
            (_, Value::Ref(id)) => {
                if let HeapData::LongInt(big) = self.heap.get(id) {
                    let big = big.clone();
                    let result = match op {
                        UnaryOp::Neg => -big,
                        UnaryOp::Pos => big,
                        UnaryOp::Invert => !big,
                        UnaryOp::Not => unreachable!(),
                    };
                    return Ok(self.heap.alloc_int(result));
                }
                Err(self.unary_type_error(op, operand))
            }
            _ => Err(self.unary_type_error(op, operand)),
        }
    }

    fn unary_type_error(&self, op: UnaryOp, operand: Value) -> crate::exception_private::RunError {
        let symbol = match op {
            UnaryOp::Neg => "-",
            UnaryOp::Pos => "+",
            UnaryOp::Invert => "~",
            UnaryOp::Not => "not",
        };
        ExcType::type_error(format!(
            "bad operand type for unary {symbol}: '{}'",
            operand.type_name(self.heap)
        ))
    }

    /// Floor-divides helpers used by `divmod`.
    pub(crate) fn divmod_values(&mut self, a: Value, b: Value) -> RunResult<(Value, Value)> {
        let quotient = self.binary_op(BinOp::FloorDiv, a, b)?;
        let remainder = self.binary_op(BinOp::Mod, a, b)?;
        Ok((quotient, remainder))
    }
}

/// Widens a `Num` to `f64` (floats pass through).
fn num_to_f64(n: &Num) -> Option<f64> {
    match n {
        Num::Int(i) => Some(*i as f64),
        Num::Big(big) => big.to_f64(),
        Num::Float(f) => Some(*f),
    }
}

fn num_to_big(n: Num) -> BigInt {
    match n {
        Num::Int(i) => BigInt::from(i),
        Num::Big(big) => big,
        Num::Float(_) => unreachable!("floats handled before the big path"),
    }
}

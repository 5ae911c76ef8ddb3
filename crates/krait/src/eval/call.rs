//! Call dispatch: user functions, bound methods, classes, builtins,
//! generator/coroutine construction, and `await`.

use crate::{
    args::ArgValues,
    ast::CallArg,
    builtins::Builtins,
    exception_private::{ExcType, RunResult, SimpleException},
    heap::{HeapData, HeapId},
    namespace::{ScopeId, ScopeKind},
    prepare::{self, LocalInfo},
    signature::bind_arguments,
    types::{Coroutine, CoroutineState, FunctionBody, Generator, Instance, mro_lookup},
    value::Value,
};

use super::{Evaluator, Flow, methods};

impl Evaluator<'_> {
    /// Evaluates call-site arguments with `*iterable` and `**mapping`
    /// expansion applied in source order.
    pub(crate) fn eval_args(&mut self, args: &[CallArg], scope: ScopeId) -> RunResult<ArgValues> {
        let mut pos = Vec::new();
        let mut kwargs: Vec<(String, Value)> = Vec::new();
        for arg in args {
            match arg {
                CallArg::Positional(e) => pos.push(self.eval_expr(e, scope)?),
                CallArg::Starred(e) => {
                    let iterable = self.eval_expr(e, scope)?;
                    pos.extend(self.collect_iterable(iterable)?);
                }
                CallArg::Keyword(name, e) => {
                    let value = self.eval_expr(e, scope)?;
                    if kwargs.iter().any(|(existing, _)| existing == name) {
                        return Err(ExcType::type_error(format!(
                            "got multiple values for keyword argument '{name}'"
                        )));
                    }
                    kwargs.push((name.clone(), value));
                }
                CallArg::DoubleStarred(e) => {
                    let mapping = self.eval_expr(e, scope)?;
                    let pairs = self.dict_pairs(mapping)?;
                    for (key, value) in pairs {
                        let Value::Ref(key_id) = key else {
                            return Err(ExcType::type_error("keywords must be strings"));
                        };
                        let HeapData::Str(name) = self.heap.get(key_id) else {
                            return Err(ExcType::type_error("keywords must be strings"));
                        };
                        let name = name.clone();
                        if kwargs.iter().any(|(existing, _)| *existing == name) {
                            return Err(ExcType::type_error(format!(
                                "got multiple values for keyword argument '{name}'"
                            )));
                        }
                        kwargs.push((name, value));
                    }
                }
            }
        }
        Ok(ArgValues::from_parts(pos, kwargs))
    }

    pub(crate) fn call_value(&mut self, func: Value, args: ArgValues) -> RunResult<Value> {
        match func {
            Value::Builtin(Builtins::Function(builtin)) => crate::builtins::call_function(self, builtin, args),
            Value::Builtin(Builtins::Type(ty)) => crate::builtins::call_type_constructor(self, ty, args),
            Value::Builtin(Builtins::Exc(exc_type)) => {
                if args.has_kwargs() {
                    return Err(ExcType::type_error(format!(
                        "{exc_type}() takes no keyword arguments"
                    )));
                }
                let (pos, _) = args.into_parts();
                let exc = SimpleException::with_args(exc_type, pos);
                Ok(self.heap.alloc_value(HeapData::Exception(exc)))
            }
            Value::Builtin(Builtins::TypeMethod { ty, method }) => {
                let Some(receiver) = args.first_pos() else {
                    return Err(ExcType::type_error(format!(
                        "descriptor '{method}' of '{ty}' object needs an argument"
                    )));
                };
                let (mut pos, kwargs) = args.into_parts();
                pos.remove(0);
                methods::call_type_method(self, ty, method, receiver, ArgValues::from_parts(pos, kwargs))
            }
            Value::Ref(id) => match self.heap.get(id) {
                HeapData::Function(_) => self.call_function_object(id, args),
                HeapData::BoundMethod(method) => {
                    let func = method.func;
                    let receiver = method.receiver;
                    self.call_value(func, args.prepend(receiver))
                }
                HeapData::ClassObject(_) => self.instantiate_class(id, args),
                HeapData::Instance(_) => {
                    match self.call_dunder(func, "__call__", args)? {
                        Some(result) => Ok(result),
                        None => Err(ExcType::type_error(format!(
                            "'{}' object is not callable",
                            func.type_name(self.heap)
                        ))),
                    }
                }
                HeapData::StaticMethod(inner) => {
                    let inner = *inner;
                    self.call_value(inner, args)
                }
                _ => Err(ExcType::type_error(format!(
                    "'{}' object is not callable",
                    func.type_name(self.heap)
                ))),
            },
            _ => Err(ExcType::type_error(format!(
                "'{}' object is not callable",
                func.type_name(self.heap)
            ))),
        }
    }

    /// Calling a user function: generator functions build a generator,
    /// async functions build a coroutine, everything else runs now.
    fn call_function_object(&mut self, func_id: HeapId, args: ArgValues) -> RunResult<Value> {
        let HeapData::Function(func) = self.heap.get(func_id) else {
            unreachable!("caller checked");
        };
        let (is_generator, is_async) = (func.is_generator, func.is_async);

        if is_generator {
            return Ok(self
                .heap
                .alloc_value(HeapData::Generator(Generator::new(Value::Ref(func_id), args, is_async))));
        }
        if is_async {
            return Ok(self
                .heap
                .alloc_value(HeapData::Coroutine(Coroutine::new(Value::Ref(func_id), args))));
        }
        // A plain call always starts in synchronous mode; only awaiting a
        // coroutine re-enters async execution.
        self.run_function_now(func_id, args, false)
    }

    /// Binds arguments, creates the call scope, and executes the body.
    pub(crate) fn run_function_now(
        &mut self,
        func_id: HeapId,
        args: ArgValues,
        async_mode: bool,
    ) -> RunResult<Value> {
        let HeapData::Function(func) = self.heap.get(func_id) else {
            return Err(ExcType::type_error("expected a function"));
        };
        let body = func.body.clone();
        let closure = func.closure;
        let defaults = func.defaults.clone();
        let kw_defaults = func.kw_defaults.clone();
        let defining_class = func.defining_class;
        let name = func.name.clone();

        let params = body.params().clone();
        let first_arg = args.first_pos();
        let bindings = bind_arguments(&params, &defaults, &kw_defaults, args, &name, self.heap)?;

        let info = match &body {
            FunctionBody::Def(def) => prepare::collect_locals(&params, &def.body),
            FunctionBody::Lambda(_) => {
                let mut info = LocalInfo::default();
                for param_name in params.names() {
                    info.locals.insert(param_name.to_string());
                }
                info
            }
        };
        let scope = self.scopes.new_scope(closure, ScopeKind::Local, &info)?;
        for (param_name, value) in bindings {
            self.scopes.set(scope, &param_name, value);
        }

        self.push_frame(defining_class, first_arg)?;
        let saved_async = self.set_async_context(async_mode);
        let outcome = match &body {
            FunctionBody::Def(def) => match self.exec_block(&def.body, scope) {
                Ok(Flow::Return(value)) => Ok(value),
                Ok(Flow::Normal) => Ok(Value::None),
                Ok(Flow::Break) => Err(ExcType::SyntaxError.msg("'break' outside loop")),
                Ok(Flow::Continue) => Err(ExcType::SyntaxError.msg("'continue' not properly in loop")),
                Err(err) => Err(err),
            },
            FunctionBody::Lambda(def) => self.eval_expr(&def.body, scope),
        };
        self.set_async_context(saved_async);
        self.pop_frame();
        outcome
    }

    /// Calling a class: create a bare instance, capture `args` for
    /// exception classes, then run `__init__` found via the MRO.
    fn instantiate_class(&mut self, class_id: HeapId, args: ArgValues) -> RunResult<Value> {
        let instance = self.heap.alloc_value(HeapData::Instance(Instance::new(class_id)));

        let is_exception = crate::types::class_exc_base(self.heap, class_id).is_some();
        if is_exception {
            let (pos, _) = match &args {
                ArgValues::Many { args, kwargs } => (args.clone(), kwargs.clone()),
                other => (other.clone().into_parts().0, Vec::new()),
            };
            let args_tuple = self.heap.alloc_tuple(pos);
            if let Value::Ref(id) = instance
                && let HeapData::Instance(inst) = self.heap.get_mut(id)
            {
                inst.attrs.insert("args".to_string(), args_tuple);
            }
        }

        let has_init = mro_lookup(self.heap, class_id, "__init__").is_some();
        if has_init {
            let result = self
                .call_dunder(instance, "__init__", args)?
                .expect("lookup succeeded above");
            if !result.is_none() {
                return Err(ExcType::type_error(format!(
                    "__init__() should return None, not '{}'",
                    result.type_name(self.heap)
                )));
            }
        } else if args.pos_len() != 0 || args.has_kwargs() {
            if !is_exception {
                let HeapData::ClassObject(cls) = self.heap.get(class_id) else {
                    unreachable!("instantiating a class");
                };
                return Err(ExcType::type_error(format!("{}() takes no arguments", cls.name)));
            }
        }
        Ok(instance)
    }

    /// `await EXPR`: coroutines run their body under async execution mode;
    /// everything else is a `TypeError`. Coroutines are single-shot.
    pub(crate) fn await_value(&mut self, value: Value) -> RunResult<Value> {
        let Value::Ref(id) = value else {
            return Err(ExcType::type_error(format!(
                "object {} can't be used in 'await' expression",
                value.type_name(self.heap)
            )));
        };
        match self.heap.get(id) {
            HeapData::Coroutine(_) => {
                let HeapData::Coroutine(coroutine) = self.heap.get_mut(id) else {
                    unreachable!("checked above");
                };
                let state = std::mem::replace(&mut coroutine.state, CoroutineState::Consumed);
                match state {
                    CoroutineState::Pending { func, args } => {
                        let Value::Ref(func_id) = func else {
                            return Err(ExcType::type_error("corrupt coroutine"));
                        };
                        self.run_function_now(func_id, args, true)
                    }
                    CoroutineState::Consumed => {
                        Err(ExcType::runtime_error("cannot reuse already awaited coroutine"))
                    }
                }
            }
            _ => Err(ExcType::type_error(format!(
                "object {} can't be used in 'await' expression",
                value.type_name(self.heap)
            ))),
        }
    }
}

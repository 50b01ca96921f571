/// Tree reducer: walks the entry function, folding everything that is
/// known at compile time and emitting gates for the rest.
///
/// Values flow through the reducer as `FactorList`s. Linear operations stay
/// symbolic; a gate is only emitted for a product or quotient of two
/// non-constant values, for builtins, and when a value has to be pinned to a
/// single wire (function results, the circuit output, split sources).
use ercs_parser::{ArrayInit, BinOp, Expr, FunctionDef, Program, Span, Stmt, UnaryOp};
use field::{from_biguint, modulus_bit_size, to_biguint};
use num_bigint::BigUint;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::config::CompilerConfig;
use crate::error::{
    ArityError, CompileError, GateLoweringError, ScopeError, UnsupportedFeatureError,
};
use crate::factor::FactorList;
use crate::gate::{Gate, GateContainer, GateKey};
use crate::rational::Rational;
use crate::scope::{Binding, FunctionId, FunctionRecord, ScopeArena, ScopeId, ScopeKind};

pub const BUILTINS: [&str; 3] = ["equal", "split", "scalarBaseMultiply"];

/// Shifts wider than this are rejected rather than materialised.
const MAX_SHIFT: usize = 1024;

/// Result of reducing a statement.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reduction {
    pub factors: FactorList,
    /// Set once a `return` has run; the enclosing statement lists stop.
    pub is_return: bool,
}

impl Reduction {
    fn returned(factors: FactorList) -> Self {
        Self {
            factors,
            is_return: true,
        }
    }

    pub fn is_variable(&self) -> bool {
        self.factors.is_variable()
    }
}

/// Everything lowering needs from a reduced program.
#[derive(Clone, Debug)]
pub struct Reduced {
    pub gates: GateContainer,
    /// Entry parameters, in declaration order.
    pub inputs: Vec<String>,
    /// Wire holding the entry function's return value.
    pub output: Option<String>,
}

pub struct Reducer<'p> {
    scopes: ScopeArena,
    functions: Vec<FunctionRecord<'p>>,
    /// Function ids by definition site and defining scope.
    defined: FxHashMap<(Span, ScopeId), FunctionId>,
    gates: GateContainer,
    splits: FxHashMap<String, Vec<String>>,
    next_wire: usize,
    call_depth: usize,
    max_unroll_iterations: usize,
    max_call_depth: usize,
}

/// Reduce `program` starting from the configured entry function.
pub fn reduce_program(program: &Program, config: &CompilerConfig) -> Result<Reduced, CompileError> {
    let _span = tracing::debug_span!("reduce", entry = %config.entry).entered();
    let mut reducer = Reducer::new(config);
    reducer.register_program(program)?;
    let reduced = reducer.reduce_entry(&config.entry)?;
    debug!(
        gates = reduced.gates.len(),
        inputs = reduced.inputs.len(),
        "reduction complete"
    );
    Ok(reduced)
}

impl<'p> Reducer<'p> {
    pub fn new(config: &CompilerConfig) -> Self {
        Self {
            scopes: ScopeArena::new(),
            functions: Vec::new(),
            defined: FxHashMap::default(),
            gates: GateContainer::new(),
            splits: FxHashMap::default(),
            next_wire: 0,
            call_depth: 0,
            max_unroll_iterations: config.max_unroll_iterations,
            max_call_depth: config.max_call_depth,
        }
    }

    // --- Function table ---

    pub fn register_program(&mut self, program: &'p Program) -> Result<(), CompileError> {
        let root = self.scopes.root();
        for def in &program.functions {
            if BUILTINS.contains(&def.name.as_str()) || self.scopes.lookup(root, &def.name).is_some() {
                return Err(ScopeError::RedeclaredFunction {
                    name: def.name.clone(),
                    span: def.span,
                }
                .into());
            }
            let id = self.register_function(def, root);
            self.scopes
                .declare(root, &def.name, Binding::Function(id), def.span)?;
        }
        Ok(())
    }

    fn register_function(&mut self, def: &'p FunctionDef, parent: ScopeId) -> FunctionId {
        self.scopes.pin(parent);
        if let Some(id) = self.defined.get(&(def.span, parent)) {
            return *id;
        }
        let id = FunctionId(self.functions.len());
        self.functions.push(FunctionRecord { def, parent });
        self.defined.insert((def.span, parent), id);
        id
    }

    fn reduce_entry(mut self, entry: &str) -> Result<Reduced, CompileError> {
        let root = self.scopes.root();
        let record = match self.scopes.lookup(root, entry) {
            Some(Binding::Function(id)) => self.functions[id.0],
            _ => {
                return Err(ScopeError::UndeclaredFunction {
                    name: entry.to_string(),
                    span: Span::default(),
                }
                .into())
            }
        };

        let frame = self.scopes.push(ScopeKind::Function, record.parent);
        let mut inputs = Vec::with_capacity(record.def.params.len());
        for param in &record.def.params {
            self.scopes.declare(
                frame,
                param,
                Binding::Value(FactorList::wire(param.as_str())),
                record.def.span,
            )?;
            inputs.push(param.clone());
        }

        let result = self.reduce_block(frame, &record.def.body)?;
        let output = if result.is_return {
            Some(self.complete(result.factors))
        } else {
            None
        };
        Ok(Reduced {
            gates: self.gates,
            inputs,
            output,
        })
    }

    // --- Statements ---

    fn reduce_block(&mut self, scope: ScopeId, body: &'p [Stmt]) -> Result<Reduction, CompileError> {
        for stmt in body {
            let reduction = self.reduce_stmt(scope, stmt)?;
            if reduction.is_return {
                return Ok(reduction);
            }
        }
        Ok(Reduction::default())
    }

    /// Run `body` in a fresh block scope under `parent`.
    fn reduce_nested(&mut self, parent: ScopeId, body: &'p [Stmt]) -> Result<Reduction, CompileError> {
        let block = self.scopes.push(ScopeKind::Block, parent);
        let reduction = self.reduce_block(block, body)?;
        self.scopes.retire(block);
        Ok(reduction)
    }

    fn reduce_stmt(&mut self, scope: ScopeId, stmt: &'p Stmt) -> Result<Reduction, CompileError> {
        match stmt {
            Stmt::VarDecl { name, value, span } => {
                let binding = self.bind_value(scope, value)?;
                self.scopes.declare(scope, name, binding, *span)?;
            }
            Stmt::ArrayDecl { name, init, span } => self.declare_array(scope, name, init, *span)?,
            Stmt::Assign {
                target,
                op,
                value,
                span,
            } => {
                let flat = self.element_name(scope, &target.name, &target.indices, *span)?;
                if let Some(Binding::Array { .. }) = self.scopes.lookup(scope, &flat) {
                    return Err(GateLoweringError::UnsupportedForm {
                        what: format!("assignment to whole array `{flat}`"),
                        span: *span,
                    }
                    .into());
                }
                let binding = match op.binary() {
                    None => self.bind_value(scope, value)?,
                    Some(bin) => {
                        let current = self.read(scope, &flat, *span)?;
                        let rhs = self.reduce_expr(scope, value)?;
                        Binding::Value(self.binary(bin, current, rhs, *span)?)
                    }
                };
                self.scopes.assign(scope, &flat, binding, *span)?;
            }
            Stmt::If {
                condition,
                then_body,
                else_body,
                span,
            } => {
                let taken = self
                    .static_condition(scope, condition)?
                    .ok_or(UnsupportedFeatureError::NonStaticBranch { span: *span })?;
                let body = if taken {
                    Some(then_body.as_slice())
                } else {
                    else_body.as_deref()
                };
                if let Some(body) = body {
                    return self.reduce_nested(scope, body);
                }
            }
            Stmt::For {
                init,
                condition,
                step,
                body,
                span,
            } => return self.reduce_for(scope, init.as_deref(), condition, step.as_deref(), body, *span),
            Stmt::Return { value, .. } => {
                let factors = match value {
                    Some(expr) => self.reduce_expr(scope, expr)?,
                    None => FactorList::zero(),
                };
                return Ok(Reduction::returned(factors));
            }
            Stmt::Expr { expr, .. } => {
                self.reduce_expr(scope, expr)?;
            }
            Stmt::Function(def) => {
                if BUILTINS.contains(&def.name.as_str()) {
                    return Err(ScopeError::RedeclaredFunction {
                        name: def.name.clone(),
                        span: def.span,
                    }
                    .into());
                }
                let id = self.register_function(def, scope);
                self.scopes
                    .declare(scope, &def.name, Binding::Function(id), def.span)?;
            }
        }
        Ok(Reduction::default())
    }

    fn reduce_for(
        &mut self,
        scope: ScopeId,
        init: Option<&'p Stmt>,
        condition: &'p Expr,
        step: Option<&'p Stmt>,
        body: &'p [Stmt],
        span: Span,
    ) -> Result<Reduction, CompileError> {
        let loop_scope = self.scopes.push(ScopeKind::Block, scope);
        if let Some(init) = init {
            self.reduce_stmt(loop_scope, init)?;
        }
        let mut iterations = 0usize;
        loop {
            let running = self
                .static_condition(loop_scope, condition)?
                .ok_or(UnsupportedFeatureError::NonStaticLoopBound { span })?;
            if !running {
                break;
            }
            if iterations == self.max_unroll_iterations {
                return Err(UnsupportedFeatureError::UnrollLimitExceeded {
                    limit: self.max_unroll_iterations,
                    span,
                }
                .into());
            }
            iterations += 1;
            let reduction = self.reduce_nested(loop_scope, body)?;
            if reduction.is_return {
                self.scopes.retire(loop_scope);
                return Ok(reduction);
            }
            if let Some(step) = step {
                self.reduce_stmt(loop_scope, step)?;
            }
        }
        self.scopes.retire(loop_scope);
        trace!(iterations, line = span.line, "loop unrolled");
        Ok(Reduction::default())
    }

    /// `Some(true)` / `Some(false)` for a constant condition, `None` when it
    /// depends on a wire.
    fn static_condition(&mut self, scope: ScopeId, condition: &'p Expr) -> Result<Option<bool>, CompileError> {
        let value = self.reduce_expr(scope, condition)?;
        Ok(value.constant_value().map(|v| !v.vanishes()))
    }

    /// The binding a `var` initializer or plain assignment produces.
    fn bind_value(&mut self, scope: ScopeId, value: &'p Expr) -> Result<Binding, CompileError> {
        match value {
            Expr::Function(def) => Ok(Binding::Function(self.register_function(def, scope))),
            Expr::Ident { name, .. } => match self.scopes.lookup(scope, name) {
                Some(Binding::Function(id)) => Ok(Binding::Function(*id)),
                _ => Ok(Binding::Value(self.reduce_expr(scope, value)?)),
            },
            _ => Ok(Binding::Value(self.reduce_expr(scope, value)?)),
        }
    }

    fn declare_array(
        &mut self,
        scope: ScopeId,
        name: &str,
        init: &'p ArrayInit,
        span: Span,
    ) -> Result<(), CompileError> {
        match init {
            ArrayInit::List(items) => {
                self.scopes
                    .declare(scope, name, Binding::Array { len: items.len() }, span)?;
                for (i, item) in items.iter().enumerate() {
                    let element = format!("{name}[{i}]");
                    match item {
                        ArrayInit::List(_) => self.declare_array(scope, &element, item, span)?,
                        ArrayInit::Element(expr) => {
                            let value = self.reduce_expr(scope, expr)?;
                            self.scopes
                                .declare(scope, &element, Binding::Value(value), span)?;
                        }
                    }
                }
            }
            ArrayInit::Element(Expr::Call {
                name: callee,
                args,
                span: call_span,
            }) if callee == "split" => {
                let (_, bits) = self.split(scope, args, *call_span)?;
                self.scopes
                    .declare(scope, name, Binding::Array { len: bits.len() }, span)?;
                for (i, bit) in bits.iter().enumerate() {
                    self.scopes.declare(
                        scope,
                        &format!("{name}[{i}]"),
                        Binding::Value(FactorList::wire(bit.as_str())),
                        span,
                    )?;
                }
            }
            ArrayInit::Element(Expr::Ident { name: source, .. })
                if matches!(self.scopes.lookup(scope, source), Some(Binding::Array { .. })) =>
            {
                for (suffix, binding) in self.collect_array(scope, source) {
                    self.scopes
                        .declare(scope, &format!("{name}{suffix}"), binding, span)?;
                }
            }
            ArrayInit::Element(_) => {
                return Err(GateLoweringError::UnsupportedForm {
                    what: format!("initializer of array `{name}`"),
                    span,
                }
                .into())
            }
        }
        Ok(())
    }

    /// The marker and every element binding of array `name`, keyed by the
    /// suffix after the base name (`""`, `"[0]"`, `"[0][1]"`, ...).
    fn collect_array(&self, scope: ScopeId, name: &str) -> Vec<(String, Binding)> {
        let mut out = Vec::new();
        self.collect_into(scope, name, String::new(), &mut out);
        out
    }

    fn collect_into(&self, scope: ScopeId, base: &str, suffix: String, out: &mut Vec<(String, Binding)>) {
        match self.scopes.lookup(scope, &format!("{base}{suffix}")) {
            Some(Binding::Array { len }) => {
                let len = *len;
                out.push((suffix.clone(), Binding::Array { len }));
                for i in 0..len {
                    self.collect_into(scope, base, format!("{suffix}[{i}]"), out);
                }
            }
            Some(binding) => out.push((suffix, binding.clone())),
            None => {}
        }
    }

    /// Flat binding name of `name[i][j]..`, with every index folded and
    /// bounds-checked.
    fn element_name(
        &mut self,
        scope: ScopeId,
        name: &str,
        indices: &'p [Expr],
        span: Span,
    ) -> Result<String, CompileError> {
        let mut flat = name.to_string();
        for index in indices {
            let len = match self.scopes.lookup(scope, &flat) {
                Some(Binding::Array { len }) => *len,
                Some(_) => {
                    return Err(GateLoweringError::UnsupportedForm {
                        what: format!("indexing non-array `{flat}`"),
                        span,
                    }
                    .into())
                }
                None => return Err(ScopeError::UndeclaredIdentifier { name: flat, span }.into()),
            };
            let value = self
                .reduce_expr(scope, index)?
                .constant_value()
                .ok_or(UnsupportedFeatureError::DynamicIndex { span })?;
            let position = usize::try_from(&to_biguint(&value.to_field()))
                .ok()
                .filter(|&i| i < len)
                .ok_or_else(|| ScopeError::IndexOutOfBounds {
                    name: flat.clone(),
                    index: value.to_string(),
                    len,
                    span,
                })?;
            flat = format!("{flat}[{position}]");
        }
        Ok(flat)
    }

    /// Current value bound to `name`.
    fn read(&self, scope: ScopeId, name: &str, span: Span) -> Result<FactorList, CompileError> {
        match self.scopes.lookup(scope, name) {
            Some(Binding::Value(factors)) => Ok(factors.clone()),
            Some(Binding::Function(_)) => Ok(FactorList::zero()),
            Some(Binding::Array { .. }) => Err(GateLoweringError::UnsupportedForm {
                what: format!("array `{name}` used as a value"),
                span,
            }
            .into()),
            None => Err(ScopeError::UndeclaredIdentifier {
                name: name.to_string(),
                span,
            }
            .into()),
        }
    }

    // --- Expressions ---

    pub fn reduce_expr(&mut self, scope: ScopeId, expr: &'p Expr) -> Result<FactorList, CompileError> {
        match expr {
            Expr::Number { value, span } => Rational::parse_decimal(value)
                .map(FactorList::constant)
                .ok_or_else(|| {
                    GateLoweringError::UnsupportedForm {
                        what: format!("number literal `{value}`"),
                        span: *span,
                    }
                    .into()
                }),
            Expr::Ident { name, span } => self.read(scope, name, *span),
            Expr::Index {
                name,
                indices,
                span,
            } => {
                let flat = self.element_name(scope, name, indices, *span)?;
                self.read(scope, &flat, *span)
            }
            Expr::Call { name, args, span } => self.call(scope, name, args, *span),
            Expr::Binary { op, lhs, rhs, span } => {
                let lhs = self.reduce_expr(scope, lhs)?;
                let rhs = self.reduce_expr(scope, rhs)?;
                self.binary(*op, lhs, rhs, *span)
            }
            Expr::Unary { op, operand, span } => {
                let value = self.reduce_expr(scope, operand)?;
                match op {
                    UnaryOp::Neg => Ok(value.neg()),
                    UnaryOp::Not => match value.constant_value() {
                        Some(v) => Ok(boolean(v.vanishes())),
                        None => Err(GateLoweringError::UnsupportedForm {
                            what: "`!` on a non-constant operand".to_string(),
                            span: *span,
                        }
                        .into()),
                    },
                }
            }
            Expr::Function(def) => Err(GateLoweringError::UnsupportedForm {
                what: "function value used in an expression".to_string(),
                span: def.span,
            }
            .into()),
        }
    }

    fn binary(&mut self, op: BinOp, lhs: FactorList, rhs: FactorList, span: Span) -> Result<FactorList, CompileError> {
        match op {
            BinOp::Add => Ok(lhs.add(&rhs)),
            BinOp::Sub => Ok(lhs.sub(&rhs)),
            BinOp::Mul => Ok(self.multiply(lhs, rhs)),
            BinOp::Div => self.divide(lhs, rhs, span),
            _ => match (lhs.constant_value(), rhs.constant_value()) {
                (Some(a), Some(b)) => fold(op, &a, &b, span),
                _ => Err(GateLoweringError::UnsupportedForm {
                    what: format!("`{}` on a non-constant operand", op.symbol()),
                    span,
                }
                .into()),
            },
        }
    }

    fn multiply(&mut self, lhs: FactorList, rhs: FactorList) -> FactorList {
        match (lhs.constant_value(), rhs.constant_value()) {
            (Some(a), Some(b)) => FactorList::constant(&a * &b),
            (Some(a), None) => rhs.scale(&a),
            (None, Some(b)) => lhs.scale(&b),
            (None, None) => {
                let (left, ka) = lhs.extract_constant();
                let (right, kb) = rhs.extract_constant();
                let key = GateKey::multiply(&left, &right);
                let out = self.emit(key, |out| Gate::multiply(left, right, out));
                FactorList::wire(out).scale(&(&ka * &kb))
            }
        }
    }

    fn divide(&mut self, lhs: FactorList, rhs: FactorList, span: Span) -> Result<FactorList, CompileError> {
        if let Some(divisor) = rhs.constant_value() {
            let inverse = divisor
                .recip()
                .ok_or(GateLoweringError::ConstantDivisionByZero { span })?;
            return Ok(lhs.scale(&inverse));
        }
        let (dividend, ka) = lhs.extract_constant();
        let (divisor, kb) = rhs.extract_constant();
        let scalar = ka
            .checked_div(&kb)
            .ok_or(GateLoweringError::ConstantDivisionByZero { span })?;
        let key = GateKey::divide(&dividend, &divisor);
        let out = self.emit(key, |out| Gate::divide(dividend, divisor, out));
        Ok(FactorList::wire(out).scale(&scalar))
    }

    // --- Calls ---

    fn call(&mut self, scope: ScopeId, name: &str, args: &'p [Expr], span: Span) -> Result<FactorList, CompileError> {
        match name {
            "equal" => {
                check_arity(name, 2, args.len(), span)?;
                let a = self.reduce_expr(scope, &args[0])?;
                let b = self.reduce_expr(scope, &args[1])?;
                let key = GateKey::equality(&a, &b);
                self.gates.insert(key, Gate::equality(a, b));
                Ok(FactorList::zero())
            }
            "split" => {
                let (z, _) = self.split(scope, args, span)?;
                Ok(FactorList::wire(z))
            }
            "scalarBaseMultiply" => {
                check_arity(name, 1, args.len(), span)?;
                let exponent = self.reduce_expr(scope, &args[0])?;
                let key = GateKey::scalar_mult(&exponent);
                let out = self.emit(key, |out| Gate::scalar_mult(exponent, out));
                Ok(FactorList::wire(out))
            }
            _ => self.call_user(scope, name, args, span),
        }
    }

    /// Decompose the argument into `modulus_bit_size()` bit wires. Returns
    /// the recombined wire and its bits, least significant first.
    fn split(&mut self, scope: ScopeId, args: &'p [Expr], span: Span) -> Result<(String, Vec<String>), CompileError> {
        check_arity("split", 1, args.len(), span)?;
        let value = self.reduce_expr(scope, &args[0])?;
        let z = self.complete(value);
        if let Some(bits) = self.splits.get(&z) {
            trace!(wire = %z, "reusing split");
            return Ok((z, bits.clone()));
        }
        let bits: Vec<String> = (0..modulus_bit_size()).map(|_| self.fresh_wire()).collect();
        for (position, bit) in bits.iter().enumerate() {
            self.gates
                .insert(GateKey::bit_range(bit), Gate::bit_range(bit, &z, position));
        }
        self.gates
            .insert(GateKey::bit_recombine(&z), Gate::bit_recombine(&bits, &z));
        debug!(wire = %z, bits = bits.len(), "split");
        self.splits.insert(z.clone(), bits.clone());
        Ok((z, bits))
    }

    fn call_user(&mut self, scope: ScopeId, name: &str, args: &'p [Expr], span: Span) -> Result<FactorList, CompileError> {
        let record = match self.scopes.lookup(scope, name) {
            Some(Binding::Function(id)) => self.functions[id.0],
            _ => {
                return Err(ScopeError::UndeclaredFunction {
                    name: name.to_string(),
                    span,
                }
                .into())
            }
        };
        check_arity(name, record.def.params.len(), args.len(), span)?;
        if self.call_depth >= self.max_call_depth {
            return Err(UnsupportedFeatureError::RecursionLimitExceeded {
                function: name.to_string(),
                limit: self.max_call_depth,
                span,
            }
            .into());
        }

        let mut arguments = Vec::with_capacity(args.len());
        for arg in args {
            arguments.push(self.argument(scope, arg)?);
        }

        let frame = self.scopes.push(ScopeKind::Function, record.parent);
        for (param, bindings) in record.def.params.iter().zip(arguments) {
            for (suffix, binding) in bindings {
                self.scopes
                    .declare(frame, &format!("{param}{suffix}"), binding, span)?;
            }
        }
        self.call_depth += 1;
        let result = self.reduce_block(frame, &record.def.body);
        self.call_depth -= 1;
        self.scopes.retire(frame);

        let value = result?.factors;
        if value.is_variable() && value.as_unit_wire().is_none() {
            Ok(FactorList::wire(self.complete(value)))
        } else {
            Ok(value)
        }
    }

    /// Bindings an argument contributes to the callee, keyed by suffix after
    /// the parameter name.
    fn argument(&mut self, scope: ScopeId, arg: &'p Expr) -> Result<Vec<(String, Binding)>, CompileError> {
        match arg {
            Expr::Ident { name, .. } => match self.scopes.lookup(scope, name) {
                Some(Binding::Function(id)) => Ok(vec![(String::new(), Binding::Function(*id))]),
                Some(Binding::Array { .. }) => Ok(self.collect_array(scope, name)),
                _ => Ok(vec![(String::new(), Binding::Value(self.reduce_expr(scope, arg)?))]),
            },
            _ => Ok(vec![(String::new(), Binding::Value(self.reduce_expr(scope, arg)?))]),
        }
    }

    // --- Gate emission ---

    fn fresh_wire(&mut self) -> String {
        let name = format!("$w{}", self.next_wire);
        self.next_wire += 1;
        name
    }

    /// Output wire of the gate under `key`, emitting it on first use.
    fn emit(&mut self, key: GateKey, build: impl FnOnce(&str) -> Gate) -> String {
        if let Some(out) = self.gates.find(&key).and_then(|g| g.output_wire.clone()) {
            trace!(kind = ?key.kind(), wire = %out, "reusing gate");
            return out;
        }
        let out = self.fresh_wire();
        self.gates.insert(key, build(&out));
        out
    }

    /// Pin `value` to a single wire, emitting an add gate unless it already
    /// is one.
    fn complete(&mut self, value: FactorList) -> String {
        if let Some(wire) = value.as_unit_wire() {
            return wire.to_string();
        }
        let key = GateKey::add(&value);
        self.emit(key, |out| Gate::add(value, out))
    }
}

fn check_arity(function: &str, expected: usize, got: usize, span: Span) -> Result<(), ArityError> {
    if expected == got {
        Ok(())
    } else {
        Err(ArityError {
            function: function.to_string(),
            expected,
            got,
            span,
        })
    }
}

fn boolean(value: bool) -> FactorList {
    FactorList::constant(Rational::from_i64(value as i64))
}

/// Fold a comparison, boolean or bitwise operator over two constants.
/// Operands are taken as their canonical field representatives.
fn fold(op: BinOp, a: &Rational, b: &Rational, span: Span) -> Result<FactorList, CompileError> {
    let x = to_biguint(&a.to_field());
    let y = to_biguint(&b.to_field());
    let integer = |v: BigUint| FactorList::constant(Rational::from_field(&from_biguint(&v)));
    Ok(match op {
        BinOp::Eq => boolean(x == y),
        BinOp::Neq => boolean(x != y),
        BinOp::Lt => boolean(x < y),
        BinOp::Le => boolean(x <= y),
        BinOp::Gt => boolean(x > y),
        BinOp::Ge => boolean(x >= y),
        BinOp::And => boolean(!a.vanishes() && !b.vanishes()),
        BinOp::Or => boolean(!a.vanishes() || !b.vanishes()),
        BinOp::BitAnd => integer(x & y),
        BinOp::BitOr => integer(x | y),
        BinOp::BitXor => integer(x ^ y),
        BinOp::Shl => {
            let amount = usize::try_from(&y)
                .ok()
                .filter(|&n| n <= MAX_SHIFT)
                .ok_or_else(|| GateLoweringError::UnsupportedForm {
                    what: format!("shift by {y}"),
                    span,
                })?;
            integer(x << amount)
        }
        BinOp::Shr => match usize::try_from(&y) {
            Ok(amount) => integer(x >> amount),
            Err(_) => FactorList::zero(),
        },
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => {
            unreachable!("arithmetic is handled symbolically")
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::GateKind;
    use ercs_parser::parse_program;

    fn reduce(source: &str) -> Result<Reduced, CompileError> {
        let program = parse_program(source).unwrap();
        reduce_program(&program, &CompilerConfig::default())
    }

    #[test]
    fn linear_code_emits_only_the_output_gate() {
        let reduced = reduce("def main(x, y) {\n return x + y - 3\n}").unwrap();
        assert_eq!(reduced.gates.len(), 1);
        assert_eq!(reduced.gates.gates()[0].kind, GateKind::Add);
        assert_eq!(reduced.inputs, ["x", "y"]);
    }

    #[test]
    fn scaled_products_share_a_gate() {
        let reduced = reduce("def main(x, y) {\n var a = (2 * x) * y\n var b = x * (3 * y)\n return a + b\n}").unwrap();
        assert_eq!(reduced.gates.count(GateKind::Multiply), 1);
    }

    #[test]
    fn unit_wire_results_are_not_completed() {
        let reduced = reduce("def main(x, y) {\n return x * y\n}").unwrap();
        assert_eq!(reduced.gates.len(), 1);
        assert_eq!(reduced.output.as_deref(), Some("$w0"));
    }

    #[test]
    fn constant_folds_comparisons_and_bits() {
        let reduced = reduce(
            "def main() {\n var a = (6 & 3) + (1 << 4) + (7 > 2)\n return a\n}",
        )
        .unwrap();
        let gate = &reduced.gates.gates()[0];
        assert_eq!(gate.left.constant_value(), Some(Rational::from_i64(19)));
    }

    #[test]
    fn comparison_on_wire_is_unsupported() {
        let err = reduce("def main(x) {\n return x < 3\n}").unwrap_err();
        assert!(matches!(
            err,
            CompileError::Lowering(GateLoweringError::UnsupportedForm { .. })
        ));
    }

    #[test]
    fn division_by_constant_zero() {
        let err = reduce("def main(x) {\n return x / (3 - 3)\n}").unwrap_err();
        assert!(matches!(
            err,
            CompileError::Lowering(GateLoweringError::ConstantDivisionByZero { .. })
        ));
    }

    #[test]
    fn split_is_cached_per_wire() {
        let reduced = reduce("def main(z) {\n var a[] = split(z)\n var b[] = split(z)\n return a[3] + b[3]\n}").unwrap();
        assert_eq!(reduced.gates.count(GateKind::BitRangeAssert), modulus_bit_size());
        assert_eq!(reduced.gates.count(GateKind::BitRecombineAssert), 1);
    }

    #[test]
    fn function_values_can_be_passed() {
        let source = "def apply(f, v) {\n return f(v)\n}\ndef main(x) {\n var sq = def(t) {\n return t * t\n }\n return apply(sq, x)\n}";
        let reduced = reduce(source).unwrap();
        assert_eq!(reduced.gates.count(GateKind::Multiply), 1);
    }

    #[test]
    fn arrays_are_copied_into_calls() {
        let source = "def sum(v) {\n return v[0] + v[1] + v[2]\n}\ndef main(x) {\n var a[] = {x, 2, 3}\n return sum(a)\n}";
        let reduced = reduce(source).unwrap();
        let gate = &reduced.gates.gates()[0];
        assert_eq!(gate.kind, GateKind::Add);
        assert_eq!(gate.left.to_string(), "1·x + 5");
    }

    #[test]
    fn nested_functions_see_enclosing_bindings() {
        let source = "def main(x) {\n var k = 4\n def scale(v) {\n return k * v\n }\n return scale(x)\n}";
        let reduced = reduce(source).unwrap();
        assert_eq!(reduced.gates.gates()[0].left.to_string(), "4·x");
    }

    #[test]
    fn nested_functions_cannot_assign_enclosing_bindings() {
        let source = "def main(x) {\n var k = 4\n def bump() {\n k = 5\n }\n bump()\n return k\n}";
        assert!(matches!(
            reduce(source).unwrap_err(),
            CompileError::Scope(ScopeError::CapturedAssignment { .. })
        ));
    }

    #[test]
    fn builtin_names_are_reserved() {
        assert!(matches!(
            reduce("def split(a) {\n return a\n}\ndef main() {\n return 1\n}").unwrap_err(),
            CompileError::Scope(ScopeError::RedeclaredFunction { .. })
        ));
    }

    #[test]
    fn arity_is_checked() {
        let err = reduce("def f(a, b) {\n return a\n}\ndef main(x) {\n return f(x)\n}").unwrap_err();
        assert_eq!(
            err,
            CompileError::Arity(ArityError {
                function: "f".to_string(),
                expected: 2,
                got: 1,
                span: Span { line: 5, col: 9 },
            })
        );
    }

    #[test]
    fn loop_iterations_reuse_scope_slots() {
        let source = "def main() {\n def inc(v) {\n return v + 1\n }\n var acc = 0\n for (var i = 0; i < 50; i += 1) {\n acc = inc(acc)\n }\n return acc\n}";
        let program = parse_program(source).unwrap();
        let mut reducer = Reducer::new(&CompilerConfig::default());
        reducer.register_program(&program).unwrap();
        let root = reducer.scopes.root();
        let reduction = reducer.reduce_nested(root, &program.functions[0].body).unwrap();
        assert_eq!(reduction.factors.constant_value(), Some(Rational::from_i64(50)));
        // root, the body block, the loop scope, one iteration block, one call frame
        assert_eq!(reducer.scopes.len(), 5);
        assert_eq!(reducer.functions.len(), 2);
    }

    #[test]
    fn missing_entry() {
        assert!(matches!(
            reduce("def helper() {\n return 1\n}").unwrap_err(),
            CompileError::Scope(ScopeError::UndeclaredFunction { .. })
        ));
    }
}

use crate::language::ast::{
    AssignOp, AssignStmt, BinaryOp, Block, BranchKind, DeclKind, DeclStmt, Expr, ForStmt, IfStmt,
    IncDecStmt, RangeStmt, Stmt, SwitchStmt,
};
use crate::runtime::coerce::{coerce_to, match_dest_type, match_type};
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::eval::{self, display_expr};
use crate::runtime::machine::Machine;
use crate::runtime::namespace::{Binding, NameSpace};
use crate::runtime::types::{self, IntKind, Type};
use crate::runtime::value::{new_cell, Place, Raw, Stored, Value};

/// Control-flow signal carried beside the error channel; caught by the
/// nearest enclosing loop or switch.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Flow {
    Normal,
    Break,
    Continue,
}

impl Machine {
    pub(crate) fn run_statement(&mut self, ns: &NameSpace, stmt: &Stmt) -> RuntimeResult<Flow> {
        match stmt {
            Stmt::Expr(expr) => {
                self.eval_expr(ns, expr)?;
                Ok(Flow::Normal)
            }
            Stmt::Assign(assign) => {
                self.run_assign(ns, assign)?;
                Ok(Flow::Normal)
            }
            Stmt::Decl(decl) => {
                self.run_decl(ns, decl)?;
                Ok(Flow::Normal)
            }
            Stmt::Block(block) => self.run_block(ns, block),
            Stmt::If(stmt) => self.run_if(ns, stmt),
            Stmt::For(stmt) => self.run_for(ns, stmt),
            Stmt::Range(stmt) => self.run_range(ns, stmt),
            Stmt::Switch(stmt) => self.run_switch(ns, stmt),
            Stmt::Branch(branch) => Ok(match branch.kind {
                BranchKind::Break => Flow::Break,
                BranchKind::Continue => Flow::Continue,
            }),
            Stmt::IncDec(stmt) => {
                self.run_incdec(ns, stmt)?;
                Ok(Flow::Normal)
            }
            Stmt::Return(_) => Err(RuntimeError::Unsupported {
                message: "return outside a function body is not supported".into(),
            }),
        }
    }

    /// Runs a block's statements in a fresh child scope.
    pub(crate) fn run_block(&mut self, ns: &NameSpace, block: &Block) -> RuntimeResult<Flow> {
        let block_ns = ns.new_block();
        for stmt in &block.statements {
            match self.run_statement(&block_ns, stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    /// Snapshots the assignment sources before any destination is
    /// written, expanding multi-returns and map slots.
    fn assign_sources(
        &mut self,
        ns: &NameSpace,
        assign: &AssignStmt,
    ) -> RuntimeResult<Vec<Stored>> {
        let mismatch = |right: usize| RuntimeError::AssignCountMismatch {
            left: assign.lhs.len(),
            op: assign.op.symbol().into(),
            right,
        };

        if assign.rhs.len() == 1 {
            let mut values = self.eval_expr(ns, &assign.rhs[0])?;
            if values.len() == 1 {
                let value = values.pop().unwrap();
                if let Value::MapSlot(slot) = value {
                    // `v, ok := m[k]`
                    return match assign.lhs.len() {
                        1 => Ok(vec![Stored::Typed(slot.read()?)]),
                        2 => Ok(vec![
                            Stored::Typed(slot.read()?),
                            Stored::Typed(Raw::Bool(slot.present())),
                        ]),
                        _ => Err(mismatch(1)),
                    };
                }
                if assign.lhs.len() != 1 {
                    return Err(mismatch(1));
                }
                return Ok(vec![value.read()?]);
            }
            if assign.lhs.len() != values.len() {
                return Err(mismatch(values.len()));
            }
            return values.into_iter().map(Value::read).collect();
        }

        if assign.lhs.len() != assign.rhs.len() {
            return Err(mismatch(assign.rhs.len()));
        }
        assign
            .rhs
            .iter()
            .map(|expr| self.eval_stored(ns, expr))
            .collect()
    }

    fn run_assign(&mut self, ns: &NameSpace, assign: &AssignStmt) -> RuntimeResult<()> {
        match assign.op {
            AssignOp::Define => self.run_define(ns, assign),
            AssignOp::Assign => self.run_plain_assign(ns, assign),
            _ => self.run_op_assign(ns, assign),
        }
    }

    fn run_define(&mut self, ns: &NameSpace, assign: &AssignStmt) -> RuntimeResult<()> {
        // Every target must be an identifier, and at least one must be
        // new in this scope.
        let mut has_new = false;
        for target in &assign.lhs {
            let Expr::Ident(ident) = target else {
                return Err(RuntimeError::CannotAssign {
                    what: display_expr(target),
                });
            };
            if ident.name == "_" {
                continue;
            }
            match ns.find_local(&ident.name) {
                None => has_new = true,
                Some(binding) if binding.is_const => {
                    return Err(RuntimeError::CannotAssign {
                        what: ident.name.clone(),
                    });
                }
                Some(_) => {}
            }
        }
        if !has_new {
            return Err(RuntimeError::NoNewVars);
        }

        let sources = self.assign_sources(ns, assign)?;
        for (target, source) in assign.lhs.iter().zip(sources) {
            let Expr::Ident(ident) = target else {
                unreachable!()
            };
            if ident.name == "_" {
                continue;
            }
            match ns.find_local(&ident.name) {
                Some(binding) => {
                    let ty = Place::Cell(binding.cell.clone()).ty();
                    let raw = coerce_to(source, &ty, "assignment")?;
                    Place::Cell(binding.cell).write(raw);
                }
                None => {
                    let raw = source.into_raw();
                    ns.add_local(
                        &ident.name,
                        Binding {
                            cell: new_cell(Stored::Typed(raw)),
                            is_const: false,
                        },
                    )?;
                }
            }
        }
        Ok(())
    }

    fn run_plain_assign(&mut self, ns: &NameSpace, assign: &AssignStmt) -> RuntimeResult<()> {
        let sources = self.assign_sources(ns, assign)?;
        for (target, source) in assign.lhs.iter().zip(sources) {
            if let Expr::Ident(ident) = target {
                if ident.name == "_" {
                    continue;
                }
            }
            match self.eval_single(ns, target)? {
                Value::MapSlot(slot) => {
                    let raw = coerce_to(source, &slot.map.elem.clone(), "assignment")?;
                    slot.map.insert(slot.key, slot.raw_key, raw);
                }
                Value::Place(place) => {
                    let raw = coerce_to(source, &place.ty(), "assignment")?;
                    place.write(raw);
                }
                _ => {
                    return Err(RuntimeError::CannotAssign {
                        what: display_expr(target),
                    });
                }
            }
        }
        Ok(())
    }

    fn run_op_assign(&mut self, ns: &NameSpace, assign: &AssignStmt) -> RuntimeResult<()> {
        if assign.lhs.len() != 1 || assign.rhs.len() != 1 {
            return Err(RuntimeError::AssignCountMismatch {
                left: assign.lhs.len(),
                op: assign.op.symbol().into(),
                right: assign.rhs.len(),
            });
        }

        let target = &assign.lhs[0];
        let place = match self.eval_single(ns, target)? {
            Value::Place(place) => place,
            _ => {
                return Err(RuntimeError::CannotAssign {
                    what: display_expr(target),
                });
            }
        };

        let current = place.read();
        let delta = self.eval_stored(ns, &assign.rhs[0])?;
        let op = match assign.op {
            AssignOp::Add => BinaryOp::Add,
            AssignOp::Sub => BinaryOp::Sub,
            AssignOp::Mul => BinaryOp::Mul,
            AssignOp::Div => BinaryOp::Div,
            AssignOp::Rem => BinaryOp::Rem,
            AssignOp::And => BinaryOp::And,
            AssignOp::Or => BinaryOp::Or,
            AssignOp::Xor => BinaryOp::Xor,
            AssignOp::Shl => BinaryOp::Shl,
            AssignOp::Shr => BinaryOp::Shr,
            AssignOp::AndNot => BinaryOp::AndNot,
            AssignOp::Define | AssignOp::Assign => unreachable!(),
        };

        let result = if op == BinaryOp::Shl || op == BinaryOp::Shr {
            eval::shift(op, Stored::Typed(current), delta)?
        } else {
            let delta = match_dest_type(delta, &current.type_of());
            let (lhs, rhs) = match_type(Stored::Typed(current), delta)?;
            eval::binary_op(op, lhs, rhs)?
        };
        let raw = coerce_to(result.read()?, &place.ty(), "assignment")?;
        place.write(raw);
        Ok(())
    }

    fn run_incdec(&mut self, ns: &NameSpace, stmt: &IncDecStmt) -> RuntimeResult<()> {
        let place = match self.eval_single(ns, &stmt.expr)? {
            Value::Place(place) => place,
            _ => {
                return Err(RuntimeError::CannotAssign {
                    what: display_expr(&stmt.expr),
                });
            }
        };
        let delta: i64 = if stmt.inc { 1 } else { -1 };
        let next = match place.read() {
            Raw::Int(kind, v) => Raw::Int(kind, kind.truncate(v.wrapping_add(delta))),
            Raw::Uint(kind, v) => {
                Raw::Uint(kind, kind.truncate(v.wrapping_add(delta as u64)))
            }
            Raw::Float32(v) => Raw::Float32(v + delta as f32),
            Raw::Float64(v) => Raw::Float64(v + delta as f64),
            Raw::Complex64(re, im) => Raw::Complex64(re + delta as f32, im),
            Raw::Complex128(re, im) => Raw::Complex128(re + delta as f64, im),
            other => {
                return Err(RuntimeError::InvalidOperation {
                    op: if stmt.inc { "++" } else { "--" }.into(),
                    ty: other.type_of().to_string(),
                });
            }
        };
        place.write(next);
        Ok(())
    }

    fn run_decl(&mut self, ns: &NameSpace, decl: &DeclStmt) -> RuntimeResult<()> {
        let is_const = decl.kind == DeclKind::Const;
        for spec in &decl.specs {
            let mut values: Option<Vec<Stored>> = None;
            if spec.values.len() == 1 {
                let evaluated = self.eval_expr(ns, &spec.values[0])?;
                values = Some(
                    evaluated
                        .into_iter()
                        .map(Value::read)
                        .collect::<RuntimeResult<_>>()?,
                );
            } else if spec.values.len() > 1 {
                let mut evaluated = Vec::with_capacity(spec.values.len());
                for expr in &spec.values {
                    evaluated.push(self.eval_stored(ns, expr)?);
                }
                values = Some(evaluated);
            } else if spec.ty.is_none() {
                return Err(RuntimeError::Unsupported {
                    message: "missing type or initializer in declaration".into(),
                });
            }

            if let Some(values) = &values {
                if values.len() != spec.names.len() {
                    return Err(RuntimeError::AssignCountMismatch {
                        left: spec.names.len(),
                        op: "=".into(),
                        right: values.len(),
                    });
                }
            }

            let declared_ty = match &spec.ty {
                Some(ty_expr) => Some(types::eval_type(ns, ty_expr)?),
                None => None,
            };

            for (i, name) in spec.names.iter().enumerate() {
                if name.name == "_" {
                    continue;
                }
                if ns.find_local(&name.name).is_some() {
                    return Err(RuntimeError::Redeclared {
                        name: name.name.clone(),
                    });
                }

                let stored = match (&declared_ty, &values) {
                    (Some(ty), Some(values)) => {
                        Stored::Typed(coerce_to(values[i].clone(), ty, "assignment")?)
                    }
                    (Some(ty), None) => Stored::Typed(Raw::zero(ty)?),
                    (None, Some(values)) => {
                        let value = values[i].clone();
                        if is_const {
                            value
                        } else {
                            Stored::Typed(value.into_raw())
                        }
                    }
                    (None, None) => unreachable!(),
                };

                ns.add_local(
                    &name.name,
                    Binding {
                        cell: new_cell(stored),
                        is_const,
                    },
                )?;
            }
        }
        Ok(())
    }

    fn run_if(&mut self, ns: &NameSpace, stmt: &IfStmt) -> RuntimeResult<Flow> {
        let block_ns = match &stmt.init {
            Some(init) => {
                let block_ns = ns.new_block();
                self.run_statement(&block_ns, init)?;
                block_ns
            }
            None => ns.clone(),
        };

        if self.eval_condition(&block_ns, &stmt.cond, "if")? {
            self.run_block(&block_ns, &stmt.then)
        } else if let Some(els) = &stmt.els {
            self.run_statement(&block_ns, els)
        } else {
            Ok(Flow::Normal)
        }
    }

    fn eval_condition(
        &mut self,
        ns: &NameSpace,
        cond: &Expr,
        stmt: &'static str,
    ) -> RuntimeResult<bool> {
        match self.eval_stored(ns, cond)? {
            Stored::Typed(Raw::Bool(v)) => Ok(v),
            other => Err(RuntimeError::NonBoolCondition {
                value: other.to_string(),
                ty: other.type_name(),
                stmt,
            }),
        }
    }

    fn run_for(&mut self, ns: &NameSpace, stmt: &ForStmt) -> RuntimeResult<Flow> {
        let block_ns = match &stmt.init {
            Some(init) => {
                let block_ns = ns.new_block();
                self.run_statement(&block_ns, init)?;
                block_ns
            }
            None => ns.clone(),
        };

        loop {
            if let Some(cond) = &stmt.cond {
                if !self.eval_condition(&block_ns, cond, "for")? {
                    break;
                }
            }

            match self.run_block(&block_ns, &stmt.body)? {
                Flow::Break => break,
                Flow::Continue | Flow::Normal => {}
            }

            if let Some(post) = &stmt.post {
                self.run_statement(&block_ns, post)?;
            }
        }
        Ok(Flow::Normal)
    }

    fn run_range(&mut self, ns: &NameSpace, stmt: &RangeStmt) -> RuntimeResult<Flow> {
        let subject = self.eval_stored(ns, &stmt.expr)?.into_raw();

        let key_name = stmt.key.as_ref().filter(|i| i.name != "_");
        let value_name = stmt.value.as_ref().filter(|i| i.name != "_");

        if !stmt.define && (key_name.is_some() || value_name.is_some()) {
            return Err(RuntimeError::Unsupported {
                message: "assigning range variables with = is not supported".into(),
            });
        }

        let block_ns = if key_name.is_some() || value_name.is_some() {
            ns.new_block()
        } else {
            ns.clone()
        };

        let declare = |name: &crate::language::ast::Ident,
                       ty: &Type|
         -> RuntimeResult<Place> {
            let cell = new_cell(Stored::Typed(Raw::zero(ty)?));
            block_ns.add_local(
                &name.name,
                Binding {
                    cell: cell.clone(),
                    is_const: false,
                },
            )?;
            Ok(Place::Cell(cell))
        };

        match subject {
            Raw::Slice(s) => {
                let key_place = key_name
                    .map(|n| declare(n, &Type::Int(IntKind::Int)))
                    .transpose()?;
                let value_place = value_name.map(|n| declare(n, &s.elem)).transpose()?;
                for i in 0..s.len {
                    if let Some(place) = &key_place {
                        place.write(Raw::Int(IntKind::Int, i as i64));
                    }
                    if let Some(place) = &value_place {
                        place.write(s.get(i));
                    }
                    match self.run_block(&block_ns, &stmt.body)? {
                        Flow::Break => break,
                        Flow::Continue | Flow::Normal => {}
                    }
                }
                Ok(Flow::Normal)
            }
            Raw::Map(m) => {
                let key_place = key_name.map(|n| declare(n, &m.key)).transpose()?;
                let value_place = value_name.map(|n| declare(n, &m.elem)).transpose()?;
                for (key, value) in m.pairs() {
                    if let Some(place) = &key_place {
                        place.write(key);
                    }
                    if let Some(place) = &value_place {
                        place.write(value);
                    }
                    match self.run_block(&block_ns, &stmt.body)? {
                        Flow::Break => break,
                        Flow::Continue | Flow::Normal => {}
                    }
                }
                Ok(Flow::Normal)
            }
            Raw::Str(s) => {
                let key_place = key_name
                    .map(|n| declare(n, &Type::Int(IntKind::Int)))
                    .transpose()?;
                let value_place = value_name
                    .map(|n| declare(n, &Type::Int(IntKind::I32)))
                    .transpose()?;
                for (offset, ch) in s.char_indices() {
                    if let Some(place) = &key_place {
                        place.write(Raw::Int(IntKind::Int, offset as i64));
                    }
                    if let Some(place) = &value_place {
                        place.write(Raw::Int(IntKind::I32, ch as i64));
                    }
                    match self.run_block(&block_ns, &stmt.body)? {
                        Flow::Break => break,
                        Flow::Continue | Flow::Normal => {}
                    }
                }
                Ok(Flow::Normal)
            }
            other => Err(RuntimeError::CannotRange {
                value: other.to_string(),
                ty: other.type_of().to_string(),
            }),
        }
    }

    fn run_switch(&mut self, ns: &NameSpace, stmt: &SwitchStmt) -> RuntimeResult<Flow> {
        let block_ns = match &stmt.init {
            Some(init) => {
                let block_ns = ns.new_block();
                self.run_statement(&block_ns, init)?;
                block_ns
            }
            None => ns.clone(),
        };

        let tag = match &stmt.tag {
            Some(expr) => self.eval_stored(&block_ns, expr)?,
            None => Stored::Typed(Raw::Bool(true)),
        };

        for case in &stmt.cases {
            if case.values.is_empty() {
                continue;
            }
            for value_expr in &case.values {
                let value = self.eval_stored(&block_ns, value_expr)?;
                let (tag_matched, value) = match_type(tag.clone(), value)?;
                let eq = eval::binary_op(BinaryOp::Eq, tag_matched, value)?;
                if matches!(eq.read()?, Stored::Typed(Raw::Bool(true))) {
                    return self.run_case(&block_ns, &case.body);
                }
            }
        }

        if let Some(default) = stmt.cases.iter().find(|c| c.values.is_empty()) {
            return self.run_case(&block_ns, &default.body);
        }
        Ok(Flow::Normal)
    }

    /// A case body runs in its own scope; `break` stops the switch.
    fn run_case(&mut self, ns: &NameSpace, body: &[Stmt]) -> RuntimeResult<Flow> {
        let case_ns = ns.new_block();
        for stmt in body {
            match self.run_statement(&case_ns, stmt)? {
                Flow::Normal => {}
                Flow::Break => return Ok(Flow::Normal),
                Flow::Continue => return Ok(Flow::Continue),
            }
        }
        Ok(Flow::Normal)
    }
}


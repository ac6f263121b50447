//! Lowering expressions to tapes, with common-subexpression elimination.
//!
//! Two dedup levels: shared `Rc` nodes are recognized by pointer, and
//! structurally equal nodes built independently (FK blocks, rotation
//! matrices, axis-angle extractions repeat across goals) collapse onto
//! one slot via a structural key.

use std::collections::HashMap;
use std::rc::Rc;

use daneel_core::Symbol;
use daneel_tape::{CacheKey, OpCode, Tape, TapeBuilder, TapeCache};

use crate::scalar::{BinaryOp, Node, SelectKind, UnaryOp};
use crate::{Expr, ExprError, ExprMatrix, Result};

#[derive(PartialEq, Eq, Hash)]
enum StructKey {
    Op(OpCode, u32, u32, u32),
}

struct Lowering<'a> {
    builder: TapeBuilder,
    sym_index: HashMap<Symbol, usize>,
    by_ptr: HashMap<*const Node, u32>,
    by_struct: HashMap<StructKey, u32>,
    symbols: &'a [Symbol],
}

impl<'a> Lowering<'a> {
    fn new(symbols: &'a [Symbol]) -> Self {
        Self {
            builder: TapeBuilder::new(symbols.iter().copied()),
            sym_index: symbols.iter().enumerate().map(|(i, &s)| (s, i)).collect(),
            by_ptr: HashMap::new(),
            by_struct: HashMap::new(),
            symbols,
        }
    }

    fn push_deduped(&mut self, op: OpCode, a: u32, b: u32, c: u32) -> u32 {
        let key = StructKey::Op(op, a, b, c);
        if let Some(&slot) = self.by_struct.get(&key) {
            return slot;
        }
        let slot = self.builder.push(op, a, b, c);
        self.by_struct.insert(key, slot);
        slot
    }

    fn lower(&mut self, expr: &Expr) -> Result<u32> {
        let ptr = Rc::as_ptr(&expr.0);
        if let Some(&slot) = self.by_ptr.get(&ptr) {
            return Ok(slot);
        }

        let slot = match &*expr.0 {
            Node::Const(v) => self.builder.const_slot(*v),
            Node::Sym(s) => {
                let index = *self
                    .sym_index
                    .get(s)
                    .ok_or(ExprError::UnboundSymbol(*s))?;
                self.builder.input_slot(index)
            }
            Node::Unary(op, a) => {
                let a = self.lower(a)?;
                self.push_deduped(unary_opcode(*op), a, 0, 0)
            }
            Node::Binary(op, a, b) => {
                let a = self.lower(a)?;
                let b = self.lower(b)?;
                self.push_deduped(binary_opcode(*op), a, b, 0)
            }
            Node::Select(kind, cond, then, otherwise) => {
                let cond = self.lower(cond)?;
                let then = self.lower(then)?;
                let otherwise = self.lower(otherwise)?;
                self.push_deduped(select_opcode(*kind), cond, then, otherwise)
            }
        };

        self.by_ptr.insert(ptr, slot);
        Ok(slot)
    }

    fn finish(self, outputs: Vec<u32>, rows: usize, cols: usize) -> Tape {
        debug_assert_eq!(self.symbols.len(), self.sym_index.len());
        self.builder.finish(outputs, rows, cols)
    }
}

fn unary_opcode(op: UnaryOp) -> OpCode {
    match op {
        UnaryOp::Neg => OpCode::Neg,
        UnaryOp::Sqrt => OpCode::Sqrt,
        UnaryOp::Sin => OpCode::Sin,
        UnaryOp::Cos => OpCode::Cos,
        UnaryOp::Tan => OpCode::Tan,
        UnaryOp::Acos => OpCode::Acos,
        UnaryOp::Asin => OpCode::Asin,
        UnaryOp::Atan => OpCode::Atan,
        UnaryOp::Tanh => OpCode::Tanh,
        UnaryOp::Floor => OpCode::Floor,
        UnaryOp::Abs => OpCode::Abs,
        UnaryOp::Sign => OpCode::Sign,
    }
}

fn binary_opcode(op: BinaryOp) -> OpCode {
    match op {
        BinaryOp::Add => OpCode::Add,
        BinaryOp::Sub => OpCode::Sub,
        BinaryOp::Mul => OpCode::Mul,
        BinaryOp::Div => OpCode::Div,
        BinaryOp::Atan2 => OpCode::Atan2,
        BinaryOp::Min => OpCode::Min,
        BinaryOp::Max => OpCode::Max,
    }
}

fn select_opcode(kind: SelectKind) -> OpCode {
    match kind {
        SelectKind::LeZero => OpCode::SelectLeZero,
        SelectKind::GtZero => OpCode::SelectGtZero,
        SelectKind::EqZero => OpCode::SelectEqZero,
    }
}

/// Compile a matrix expression against an ordered symbol list.
///
/// Every symbol the expression references must appear in `symbols`;
/// extra symbols are allowed (the goal set compiles against the union of
/// all bound symbols).
pub fn compile(matrix: &ExprMatrix, symbols: &[Symbol]) -> Result<Tape> {
    let mut lowering = Lowering::new(symbols);
    let mut outputs = Vec::with_capacity(matrix.len());
    for e in matrix.iter() {
        outputs.push(lowering.lower(e)?);
    }
    Ok(lowering.finish(outputs, matrix.rows(), matrix.cols()))
}

/// Compile with a disk cache: hit returns the stored tape, miss compiles
/// and stores. Store failures are ignored; the cache is an optimization.
pub fn compile_cached(
    matrix: &ExprMatrix,
    symbols: &[Symbol],
    cache: &TapeCache,
) -> Result<Tape> {
    let ids: Vec<u32> = symbols.iter().map(|s| s.as_u32()).collect();
    let key = CacheKey::new(&canonical_bytes(matrix), &ids);
    if let Some(tape) = cache.load(key) {
        return Ok(tape);
    }
    let tape = compile(matrix, symbols)?;
    let _ = cache.store(key, &tape);
    Ok(tape)
}

/// Jacobian of scalar expressions against the controlled symbols.
pub fn jacobian(rows: &[Expr], symbols: &[Symbol]) -> Result<ExprMatrix> {
    ExprMatrix::column(rows.to_vec()).jacobian(symbols)
}

/// Canonical byte encoding of an expression DAG, stable under structural
/// equality. Keys the artifact cache.
pub fn canonical_bytes(matrix: &ExprMatrix) -> Vec<u8> {
    let mut out = Vec::new();
    let mut ids: HashMap<*const Node, u32> = HashMap::new();
    let mut next = 0u32;

    fn visit(
        expr: &Expr,
        out: &mut Vec<u8>,
        ids: &mut HashMap<*const Node, u32>,
        next: &mut u32,
    ) -> u32 {
        let ptr = Rc::as_ptr(&expr.0);
        if let Some(&id) = ids.get(&ptr) {
            return id;
        }
        let id = match &*expr.0 {
            Node::Const(v) => {
                out.push(0);
                out.extend_from_slice(&v.to_bits().to_le_bytes());
                alloc(ids, ptr, next)
            }
            Node::Sym(s) => {
                out.push(1);
                out.extend_from_slice(&s.as_u32().to_le_bytes());
                alloc(ids, ptr, next)
            }
            Node::Unary(op, a) => {
                let a = visit(a, out, ids, next);
                out.push(2);
                out.push(unary_opcode(*op) as u8);
                out.extend_from_slice(&a.to_le_bytes());
                alloc(ids, ptr, next)
            }
            Node::Binary(op, a, b) => {
                let a = visit(a, out, ids, next);
                let b = visit(b, out, ids, next);
                out.push(3);
                out.push(binary_opcode(*op) as u8);
                out.extend_from_slice(&a.to_le_bytes());
                out.extend_from_slice(&b.to_le_bytes());
                alloc(ids, ptr, next)
            }
            Node::Select(kind, c, t, e) => {
                let c = visit(c, out, ids, next);
                let t = visit(t, out, ids, next);
                let e = visit(e, out, ids, next);
                out.push(4);
                out.push(select_opcode(*kind) as u8);
                out.extend_from_slice(&c.to_le_bytes());
                out.extend_from_slice(&t.to_le_bytes());
                out.extend_from_slice(&e.to_le_bytes());
                alloc(ids, ptr, next)
            }
        };
        id
    }

    fn alloc(ids: &mut HashMap<*const Node, u32>, ptr: *const Node, next: &mut u32) -> u32 {
        let id = *next;
        *next += 1;
        ids.insert(ptr, id);
        id
    }

    out.extend_from_slice(&(matrix.rows() as u32).to_le_bytes());
    out.extend_from_slice(&(matrix.cols() as u32).to_le_bytes());
    for e in matrix.iter() {
        let id = visit(e, &mut out, &mut ids, &mut next);
        out.extend_from_slice(&id.to_le_bytes());
    }
    out
}

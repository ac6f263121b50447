//! Tape program representation and interpreter.

use daneel_core::Symbol;
use serde::{Deserialize, Serialize};

/// Operation kinds. Binary ops read `a` and `b`; unary ops read `a`;
/// select ops read the condition from `a` and pick `b` or `c`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum OpCode {
    Add,
    Sub,
    Mul,
    Div,
    Neg,
    Sqrt,
    Sin,
    Cos,
    Tan,
    Acos,
    Asin,
    Atan,
    Atan2,
    Tanh,
    Floor,
    Abs,
    Min,
    Max,
    Sign,
    /// `if a <= 0 { b } else { c }`
    SelectLeZero,
    /// `if a > 0 { b } else { c }`
    SelectGtZero,
    /// `if a == 0 { b } else { c }`
    SelectEqZero,
}

/// One tape instruction. `dst` is always a fresh slot.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct TapeOp {
    pub op: OpCode,
    pub dst: u32,
    pub a: u32,
    pub b: u32,
    pub c: u32,
}

/// Evaluation outcome. Non-finite outputs are reported, never raised;
/// the solver driver decides what to do with them.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct EvalReport {
    /// Number of non-finite values among the outputs.
    pub non_finite: usize,
}

impl EvalReport {
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.non_finite == 0
    }
}

/// A compiled expression: ordered symbol list, output shape, and the op
/// sequence producing the outputs from the packed input vector.
///
/// Slot layout: input slots first (one per symbol), then one fresh slot
/// per constant or operation in creation order.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Tape {
    /// Raw ids of the bound symbols, in input order.
    symbols: Vec<u32>,
    rows: u32,
    cols: u32,
    /// Pooled constants with their assigned slots.
    consts: Vec<(u32, f64)>,
    ops: Vec<TapeOp>,
    /// Slot of each output element, row-major, `rows * cols` entries.
    outputs: Vec<u32>,
}

impl Tape {
    /// Number of input slots (bound symbols).
    #[inline]
    pub fn input_len(&self) -> usize {
        self.symbols.len()
    }

    /// Output shape `(rows, cols)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows as usize, self.cols as usize)
    }

    /// Number of output elements.
    #[inline]
    pub fn output_len(&self) -> usize {
        self.outputs.len()
    }

    /// Number of tape instructions.
    #[inline]
    pub fn op_count(&self) -> usize {
        self.ops.len()
    }

    /// The bound symbols in input order.
    pub fn symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.symbols.iter().map(|&raw| Symbol::from_raw(raw))
    }

    /// Collect the bound symbols into a vector.
    pub fn symbol_vec(&self) -> Vec<Symbol> {
        self.symbols().collect()
    }

    fn slot_count(&self) -> usize {
        self.symbols.len() + self.consts.len() + self.ops.len()
    }

    /// Run the tape over `inputs` (one value per symbol, in order).
    ///
    /// The outputs land in `scratch` (see [`TapeScratch::output`]);
    /// repeated evaluation with identical inputs is bitwise identical.
    pub fn eval(&self, inputs: &[f64], scratch: &mut TapeScratch) -> EvalReport {
        assert_eq!(inputs.len(), self.symbols.len(), "tape input arity mismatch");

        let slots = &mut scratch.slots;
        slots.clear();
        slots.extend_from_slice(inputs);
        slots.resize(self.slot_count(), 0.0);
        for &(slot, value) in &self.consts {
            slots[slot as usize] = value;
        }

        for op in &self.ops {
            let a = slots[op.a as usize];
            let v = match op.op {
                OpCode::Add => a + slots[op.b as usize],
                OpCode::Sub => a - slots[op.b as usize],
                OpCode::Mul => a * slots[op.b as usize],
                OpCode::Div => a / slots[op.b as usize],
                OpCode::Neg => -a,
                OpCode::Sqrt => a.sqrt(),
                OpCode::Sin => a.sin(),
                OpCode::Cos => a.cos(),
                OpCode::Tan => a.tan(),
                OpCode::Acos => a.acos(),
                OpCode::Asin => a.asin(),
                OpCode::Atan => a.atan(),
                OpCode::Atan2 => a.atan2(slots[op.b as usize]),
                OpCode::Tanh => a.tanh(),
                OpCode::Floor => a.floor(),
                OpCode::Abs => a.abs(),
                OpCode::Min => a.min(slots[op.b as usize]),
                OpCode::Max => a.max(slots[op.b as usize]),
                OpCode::Sign => {
                    if a > 0.0 {
                        1.0
                    } else if a < 0.0 {
                        -1.0
                    } else {
                        0.0
                    }
                }
                OpCode::SelectLeZero => {
                    if a <= 0.0 {
                        slots[op.b as usize]
                    } else {
                        slots[op.c as usize]
                    }
                }
                OpCode::SelectGtZero => {
                    if a > 0.0 {
                        slots[op.b as usize]
                    } else {
                        slots[op.c as usize]
                    }
                }
                OpCode::SelectEqZero => {
                    if a == 0.0 {
                        slots[op.b as usize]
                    } else {
                        slots[op.c as usize]
                    }
                }
            };
            slots[op.dst as usize] = v;
        }

        scratch.out.clear();
        let mut non_finite = 0;
        for &slot in &self.outputs {
            let v = slots[slot as usize];
            if !v.is_finite() {
                non_finite += 1;
            }
            scratch.out.push(v);
        }
        EvalReport { non_finite }
    }
}

/// Reusable evaluation buffers.
#[derive(Clone, Debug, Default)]
pub struct TapeScratch {
    slots: Vec<f64>,
    out: Vec<f64>,
}

impl TapeScratch {
    pub fn new() -> Self {
        Self::default()
    }

    /// The outputs of the last `eval`, row-major.
    #[inline]
    pub fn output(&self) -> &[f64] {
        &self.out
    }
}

/// Incremental tape construction, used by the expression compiler.
///
/// The builder hands out slot indices; the compiler is responsible for
/// only referencing slots it has already produced.
#[derive(Debug, Default)]
pub struct TapeBuilder {
    symbols: Vec<u32>,
    consts: Vec<(u32, f64)>,
    ops: Vec<TapeOp>,
    next_slot: u32,
}

impl TapeBuilder {
    pub fn new(symbols: impl IntoIterator<Item = Symbol>) -> Self {
        let symbols: Vec<u32> = symbols.into_iter().map(Symbol::as_u32).collect();
        let next_slot = symbols.len() as u32;
        Self {
            symbols,
            consts: Vec::new(),
            ops: Vec::new(),
            next_slot,
        }
    }

    /// Input slot of the `i`-th bound symbol.
    #[inline]
    pub fn input_slot(&self, index: usize) -> u32 {
        debug_assert!(index < self.symbols.len());
        index as u32
    }

    /// Slot of a pooled constant, allocating one if the value is new.
    pub fn const_slot(&mut self, value: f64) -> u32 {
        if let Some(&(slot, _)) = self
            .consts
            .iter()
            .find(|(_, c)| c.to_bits() == value.to_bits())
        {
            return slot;
        }
        let slot = self.next_slot;
        self.next_slot += 1;
        self.consts.push((slot, value));
        slot
    }

    /// Append an operation, returning its destination slot.
    pub fn push(&mut self, op: OpCode, a: u32, b: u32, c: u32) -> u32 {
        let dst = self.next_slot;
        self.next_slot += 1;
        self.ops.push(TapeOp { op, dst, a, b, c });
        dst
    }

    /// Finish the tape with the given output slots and shape.
    pub fn finish(self, outputs: Vec<u32>, rows: usize, cols: usize) -> Tape {
        assert_eq!(outputs.len(), rows * cols, "output shape mismatch");
        Tape {
            symbols: self.symbols,
            rows: rows as u32,
            cols: cols as u32,
            consts: self.consts,
            ops: self.ops,
            outputs,
        }
    }
}

use crate::block::BlockId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuadId(pub u32);

impl QuadId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for QuadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named variable slot. Ordering is lexicographic on the name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Register(pub String);

impl Register {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Register {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Constant {
    Int(i64),
    Null,
    Str(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    Reg(Register),
    Const(Constant),
}

impl Operand {
    pub fn reg(name: impl Into<String>) -> Self {
        Operand::Reg(Register::new(name))
    }

    pub fn int(value: i64) -> Self {
        Operand::Const(Constant::Int(value))
    }

    pub fn null() -> Self {
        Operand::Const(Constant::Null)
    }

    pub fn as_register(&self) -> Option<&Register> {
        match self {
            Operand::Reg(reg) => Some(reg),
            Operand::Const(_) => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Operand::Const(Constant::Null))
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Reg(reg) => write!(f, "{}", reg),
            Operand::Const(Constant::Int(v)) => write!(f, "{}", v),
            Operand::Const(Constant::Null) => f.write_str("null"),
            Operand::Const(Constant::Str(s)) => write!(f, "{:?}", s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    Eq,
    Ne,
    Lt,
    Ge,
    Gt,
    Le,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuadKind {
    Move {
        dst: Register,
        src: Operand,
    },
    Binary {
        op: BinaryOp,
        dst: Register,
        lhs: Operand,
        rhs: Operand,
    },
    Unary {
        op: UnaryOp,
        dst: Register,
        src: Operand,
    },
    NullCheck {
        guard: Option<Register>,
        checked: Register,
    },
    IfCmp {
        lhs: Operand,
        rhs: Operand,
        cond: Condition,
        target: BlockId,
    },
    Goto {
        target: BlockId,
    },
    Return {
        value: Option<Operand>,
    },
    Call {
        dst: Option<Register>,
        method: String,
        args: Vec<Operand>,
    },
    GetField {
        dst: Register,
        base: Operand,
        field: String,
    },
    PutField {
        base: Operand,
        field: String,
        value: Operand,
    },
    Nop,
}

/// Operator tag used to dispatch transfer functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Move,
    Binary,
    Unary,
    NullCheck,
    IfCmp,
    Goto,
    Return,
    Call,
    GetField,
    PutField,
    Nop,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quad {
    pub id: QuadId,
    pub kind: QuadKind,
}

impl Quad {
    pub fn new(id: QuadId, kind: QuadKind) -> Self {
        Self { id, kind }
    }

    pub fn operator(&self) -> Operator {
        match &self.kind {
            QuadKind::Move { .. } => Operator::Move,
            QuadKind::Binary { .. } => Operator::Binary,
            QuadKind::Unary { .. } => Operator::Unary,
            QuadKind::NullCheck { .. } => Operator::NullCheck,
            QuadKind::IfCmp { .. } => Operator::IfCmp,
            QuadKind::Goto { .. } => Operator::Goto,
            QuadKind::Return { .. } => Operator::Return,
            QuadKind::Call { .. } => Operator::Call,
            QuadKind::GetField { .. } => Operator::GetField,
            QuadKind::PutField { .. } => Operator::PutField,
            QuadKind::Nop => Operator::Nop,
        }
    }

    pub fn defined_registers(&self) -> Vec<&Register> {
        match &self.kind {
            QuadKind::Move { dst, .. }
            | QuadKind::Binary { dst, .. }
            | QuadKind::Unary { dst, .. }
            | QuadKind::GetField { dst, .. } => vec![dst],
            QuadKind::NullCheck { guard, .. } => guard.iter().collect(),
            QuadKind::Call { dst, .. } => dst.iter().collect(),
            QuadKind::IfCmp { .. }
            | QuadKind::Goto { .. }
            | QuadKind::Return { .. }
            | QuadKind::PutField { .. }
            | QuadKind::Nop => Vec::new(),
        }
    }

    pub fn used_registers(&self) -> Vec<&Register> {
        let operands: Vec<&Operand> = match &self.kind {
            QuadKind::Move { src, .. } | QuadKind::Unary { src, .. } => vec![src],
            QuadKind::Binary { lhs, rhs, .. } | QuadKind::IfCmp { lhs, rhs, .. } => {
                vec![lhs, rhs]
            }
            QuadKind::NullCheck { checked, .. } => return vec![checked],
            QuadKind::Return { value } => value.iter().collect(),
            QuadKind::Call { args, .. } => args.iter().collect(),
            QuadKind::GetField { base, .. } => vec![base],
            QuadKind::PutField { base, value, .. } => vec![base, value],
            QuadKind::Goto { .. } | QuadKind::Nop => Vec::new(),
        };

        operands.into_iter().filter_map(Operand::as_register).collect()
    }

    pub fn defines_anything(&self) -> bool {
        !self.defined_registers().is_empty()
    }

    pub fn null_checked_register(&self) -> Option<&Register> {
        match &self.kind {
            QuadKind::NullCheck { checked, .. } => Some(checked),
            _ => None,
        }
    }

    /// The register and condition of an `IfCmp` that tests a register against `null`.
    pub fn compares_to_null(&self) -> Option<(&Register, Condition)> {
        match &self.kind {
            QuadKind::IfCmp { lhs, rhs, cond, .. } => {
                let reg = match (lhs, rhs) {
                    (Operand::Reg(reg), other) | (other, Operand::Reg(reg)) if other.is_null() => {
                        reg
                    }
                    _ => return None,
                };
                Some((reg, *cond))
            }
            _ => None,
        }
    }

    pub fn branch_target(&self) -> Option<BlockId> {
        match &self.kind {
            QuadKind::IfCmp { target, .. } | QuadKind::Goto { target } => Some(*target),
            _ => None,
        }
    }

    pub fn set_branch_target(&mut self, block: BlockId) {
        if let QuadKind::IfCmp { target, .. } | QuadKind::Goto { target } = &mut self.kind {
            *target = block;
        }
    }

    pub fn is_control_transfer(&self) -> bool {
        matches!(
            self.operator(),
            Operator::IfCmp | Operator::Goto | Operator::Return
        )
    }
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.id)?;
        match &self.kind {
            QuadKind::Move { dst, src } => write!(f, "MOVE {}, {}", dst, src),
            QuadKind::Binary { op, dst, lhs, rhs } => {
                write!(f, "{:?} {}, {}, {}", op, dst, lhs, rhs)
            }
            QuadKind::Unary { op, dst, src } => write!(f, "{:?} {}, {}", op, dst, src),
            QuadKind::NullCheck { guard, checked } => match guard {
                Some(guard) => write!(f, "NULL_CHECK {}, {}", guard, checked),
                None => write!(f, "NULL_CHECK {}", checked),
            },
            QuadKind::IfCmp {
                lhs,
                rhs,
                cond,
                target,
            } => write!(f, "IFCMP {}, {}, {:?}, {}", lhs, rhs, cond, target),
            QuadKind::Goto { target } => write!(f, "GOTO {}", target),
            QuadKind::Return { value: Some(value) } => write!(f, "RETURN {}", value),
            QuadKind::Return { value: None } => f.write_str("RETURN"),
            QuadKind::Call { dst, method, args } => {
                f.write_str("CALL ")?;
                if let Some(dst) = dst {
                    write!(f, "{}, ", dst)?;
                }
                write!(f, "{}(", method)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
            QuadKind::GetField { dst, base, field } => {
                write!(f, "GETFIELD {}, {}.{}", dst, base, field)
            }
            QuadKind::PutField { base, field, value } => {
                write!(f, "PUTFIELD {}.{}, {}", base, field, value)
            }
            QuadKind::Nop => f.write_str("NOP"),
        }
    }
}

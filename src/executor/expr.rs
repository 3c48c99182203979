//! Scalar expression trees handed to the executor by the planner.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{DataType, Value};

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

/// Boolean connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOp {
    And,
    Or,
    Not,
}

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// A scalar expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// A literal value.
    Literal(Value),
    /// Reference to a column of the input batch, by position.
    Column(usize),
    /// Reference to a bound statement parameter, by position.
    Param(usize),
    /// Binary comparison.
    Comparison {
        left: Box<Expr>,
        op: ComparisonOp,
        right: Box<Expr>,
    },
    /// AND / OR over operands, or NOT over the first operand.
    Logical { op: LogicalOp, operands: Vec<Expr> },
    /// Binary arithmetic.
    Arithmetic {
        left: Box<Expr>,
        op: ArithmeticOp,
        right: Box<Expr>,
    },
    /// `IS [NOT] NULL`.
    IsNull { operand: Box<Expr>, negated: bool },
    /// `CAST(operand AS to)`.
    Cast { operand: Box<Expr>, to: DataType },
}

impl Expr {
    /// Literal expression.
    pub fn lit(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    /// Typed null literal.
    #[must_use]
    pub fn null(data_type: DataType) -> Self {
        Expr::Cast {
            operand: Box::new(Expr::Literal(Value::Null)),
            to: data_type,
        }
    }

    /// Column reference.
    #[must_use]
    pub fn col(index: usize) -> Self {
        Expr::Column(index)
    }

    /// Parameter reference.
    #[must_use]
    pub fn param(index: usize) -> Self {
        Expr::Param(index)
    }

    /// Binary comparison.
    #[must_use]
    pub fn compare(left: Expr, op: ComparisonOp, right: Expr) -> Self {
        Expr::Comparison {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Binary arithmetic.
    #[must_use]
    pub fn arith(left: Expr, op: ArithmeticOp, right: Expr) -> Self {
        Expr::Arithmetic {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Cast to another type.
    #[must_use]
    pub fn cast(self, to: DataType) -> Self {
        Expr::Cast {
            operand: Box::new(self),
            to,
        }
    }

    /// Collects the column positions referenced by this tree, deduplicated
    /// and sorted.
    #[must_use]
    pub fn column_refs(&self) -> Vec<usize> {
        let mut refs = Vec::new();
        self.visit(&mut |e| {
            if let Expr::Column(i) = e {
                refs.push(*i);
            }
        });
        refs.sort_unstable();
        refs.dedup();
        refs
    }

    /// Returns true if the tree references any parameter.
    #[must_use]
    pub fn has_params(&self) -> bool {
        let mut found = false;
        self.visit(&mut |e| found |= matches!(e, Expr::Param(_)));
        found
    }

    /// Returns true if the tree depends neither on input columns nor on
    /// parameters, so it can be folded once.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.column_refs().is_empty() && !self.has_params()
    }

    fn visit(&self, f: &mut impl FnMut(&Expr)) {
        f(self);
        match self {
            Expr::Literal(_) | Expr::Column(_) | Expr::Param(_) => {}
            Expr::Comparison { left, right, .. } | Expr::Arithmetic { left, right, .. } => {
                left.visit(f);
                right.visit(f);
            }
            Expr::Logical { operands, .. } => operands.iter().for_each(|o| o.visit(f)),
            Expr::IsNull { operand, .. } | Expr::Cast { operand, .. } => operand.visit(f),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(v) => write!(f, "{v}"),
            Expr::Column(i) => write!(f, "#{i}"),
            Expr::Param(i) => write!(f, "${}", i + 1),
            Expr::Comparison { left, op, right } => write!(f, "({left} {op:?} {right})"),
            Expr::Logical { op, operands } => {
                write!(f, "{op:?}(")?;
                for (i, o) in operands.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{o}")?;
                }
                f.write_str(")")
            }
            Expr::Arithmetic { left, op, right } => write!(f, "({left} {op:?} {right})"),
            Expr::IsNull { operand, negated } => {
                let not = if *negated { " NOT" } else { "" };
                write!(f, "{operand} IS{not} NULL")
            }
            Expr::Cast { operand, to } => write!(f, "CAST({operand} AS {to})"),
        }
    }
}

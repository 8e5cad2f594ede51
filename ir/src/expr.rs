//! Expression nodes and folding constructors.

use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::tensor::Tensor;
use crate::types::BinOp;
use crate::var::Var;

/// Index expression list; most accesses are rank four or below.
pub type Indices = SmallVec<[Rc<Expr>; 4]>;

/// Expression node.
///
/// Expressions are shared via `Rc`; constructors fold constant integer
/// arithmetic so that extents produced by split/fuse stay readable.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(i64),
    Var(Var),
    Binary(BinOp, Rc<Expr>, Rc<Expr>),
    /// Branch-probability hint wrapped around a guard predicate.
    /// Semantically transparent; safe for consumers to drop.
    Likely(Rc<Expr>),
    /// Element read from a tensor.
    Read { tensor: Tensor, indices: Indices },
    /// Flattened value list; the payload of buffer-bind annotations.
    Tuple(Vec<Rc<Expr>>),
}

impl Expr {
    pub fn int(value: i64) -> Rc<Expr> {
        Rc::new(Expr::Int(value))
    }

    pub fn var(var: &Var) -> Rc<Expr> {
        Rc::new(Expr::Var(var.clone()))
    }

    pub fn add(lhs: Rc<Expr>, rhs: Rc<Expr>) -> Rc<Expr> {
        match (lhs.as_const_int(), rhs.as_const_int()) {
            (Some(a), Some(b)) => Expr::int(a + b),
            (Some(0), _) => rhs,
            (_, Some(0)) => lhs,
            _ => Rc::new(Expr::Binary(BinOp::Add, lhs, rhs)),
        }
    }

    pub fn sub(lhs: Rc<Expr>, rhs: Rc<Expr>) -> Rc<Expr> {
        match (lhs.as_const_int(), rhs.as_const_int()) {
            (Some(a), Some(b)) => Expr::int(a - b),
            (_, Some(0)) => lhs,
            _ => Rc::new(Expr::Binary(BinOp::Sub, lhs, rhs)),
        }
    }

    pub fn mul(lhs: Rc<Expr>, rhs: Rc<Expr>) -> Rc<Expr> {
        match (lhs.as_const_int(), rhs.as_const_int()) {
            (Some(a), Some(b)) => Expr::int(a * b),
            (Some(1), _) => rhs,
            (_, Some(1)) => lhs,
            _ => Rc::new(Expr::Binary(BinOp::Mul, lhs, rhs)),
        }
    }

    pub fn floordiv(lhs: Rc<Expr>, rhs: Rc<Expr>) -> Rc<Expr> {
        Rc::new(Expr::Binary(BinOp::FloorDiv, lhs, rhs))
    }

    pub fn floormod(lhs: Rc<Expr>, rhs: Rc<Expr>) -> Rc<Expr> {
        Rc::new(Expr::Binary(BinOp::FloorMod, lhs, rhs))
    }

    pub fn lt(lhs: Rc<Expr>, rhs: Rc<Expr>) -> Rc<Expr> {
        Rc::new(Expr::Binary(BinOp::Lt, lhs, rhs))
    }

    pub fn likely(cond: Rc<Expr>) -> Rc<Expr> {
        Rc::new(Expr::Likely(cond))
    }

    pub fn read(tensor: Tensor, indices: impl IntoIterator<Item = Rc<Expr>>) -> Rc<Expr> {
        Rc::new(Expr::Read { tensor, indices: indices.into_iter().collect() })
    }

    pub fn tuple(values: Vec<Rc<Expr>>) -> Rc<Expr> {
        Rc::new(Expr::Tuple(values))
    }

    /// The constant integer value of this expression, if it is one.
    pub fn as_const_int(&self) -> Option<i64> {
        match self {
            Expr::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Int(v) => write!(f, "{v}"),
            Expr::Var(v) => write!(f, "{v}"),
            Expr::Binary(op, a, b) => match op {
                BinOp::Add => write!(f, "({a} + {b})"),
                BinOp::Sub => write!(f, "({a} - {b})"),
                BinOp::Mul => write!(f, "({a}*{b})"),
                BinOp::FloorDiv => write!(f, "floordiv({a}, {b})"),
                BinOp::FloorMod => write!(f, "floormod({a}, {b})"),
                BinOp::Lt => write!(f, "({a} < {b})"),
            },
            Expr::Likely(c) => write!(f, "likely({c})"),
            Expr::Read { tensor, indices } => {
                write!(f, "{tensor}(")?;
                for (i, idx) in indices.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{idx}")?;
                }
                f.write_str(")")
            }
            Expr::Tuple(values) => {
                f.write_str("tuple(")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str(")")
            }
        }
    }
}

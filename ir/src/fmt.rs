//! Indented tree printing for statements.
//!
//! Debug aid only; nothing parses this output back.

use std::fmt;
use std::fmt::Write as _;

use crate::stmt::{AttrNode, Stmt};
use crate::types::ForKind;

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        write_stmt(self, &mut out, 0).map_err(|_| fmt::Error)?;
        f.write_str(out.trim_end_matches('\n'))
    }
}

fn pad(out: &mut String, indent: usize) {
    for _ in 0..indent {
        out.push_str("  ");
    }
}

fn write_stmt(stmt: &Stmt, out: &mut String, indent: usize) -> fmt::Result {
    match stmt {
        Stmt::For { loop_var, min, extent, kind, body } => {
            pad(out, indent);
            match kind {
                ForKind::Serial => writeln!(out, "for ({loop_var}, {min}, {extent}) {{")?,
                _ => writeln!(out, "{kind} for ({loop_var}, {min}, {extent}) {{")?,
            }
            write_stmt(body, out, indent + 1)?;
            pad(out, indent);
            out.push_str("}\n");
            Ok(())
        }
        Stmt::Attr { node, key, value, body } => {
            pad(out, indent);
            match node {
                AttrNode::IterVar(iv) => writeln!(out, "// attr [{iv}] {key} = {value}")?,
                AttrNode::Var(v) => writeln!(out, "// attr [{v}] {key} = {value}")?,
                AttrNode::BufferBind { buffer, tensor } => {
                    writeln!(out, "// attr [bind({buffer}, {tensor})] {key} = {value}")?
                }
                AttrNode::None => writeln!(out, "// attr {key} = {value}")?,
            }
            write_stmt(body, out, indent)
        }
        Stmt::IfThenElse { cond, then_case, else_case } => {
            pad(out, indent);
            writeln!(out, "if ({cond}) {{")?;
            write_stmt(then_case, out, indent + 1)?;
            if let Some(else_case) = else_case {
                pad(out, indent);
                out.push_str("} else {\n");
                write_stmt(else_case, out, indent + 1)?;
            }
            pad(out, indent);
            out.push_str("}\n");
            Ok(())
        }
        Stmt::Provide { tensor, value, indices } => {
            pad(out, indent);
            write!(out, "{tensor}(")?;
            for (i, idx) in indices.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write!(out, "{idx}")?;
            }
            writeln!(out, ") = {value}")?;
            Ok(())
        }
        Stmt::Realize { tensor, bounds, body } => {
            pad(out, indent);
            write!(out, "realize {tensor}(")?;
            for (i, r) in bounds.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write!(out, "{r}")?;
            }
            writeln!(out, ") {{")?;
            write_stmt(body, out, indent + 1)?;
            pad(out, indent);
            out.push_str("}\n");
            Ok(())
        }
        Stmt::Block(stmts) => {
            for s in stmts {
                write_stmt(s, out, indent)?;
            }
            Ok(())
        }
    }
}

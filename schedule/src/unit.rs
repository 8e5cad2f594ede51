//! Schedulable-unit accessor layer and the provide/buffer rebinding pass.
//!
//! A unit's body is authored against its own logical output tensors before
//! the unit is attached to the operation graph; the graph-bound output
//! identities only exist once the body is finalized. The resolution is an
//! explicit two-phase construction: build the unit, then [`build_provide`]
//! rebinds the body against the graph-bound tensors and applies the
//! schedule.
//!
//! [`build_provide`]: ScheduleUnit::build_provide

use std::collections::HashMap;
use std::rc::Rc;

use ravel_ir::{AttrKey, AttrNode, Buffer, DType, Expr, IterVar, Range, Region, Shape, Stmt, Tensor};

use crate::apply::{apply_schedule, gather_loop_vars};
use crate::error::Result;
use crate::provide::{replace_provide_tensor, replace_tensor};
use crate::stage::{DomMap, Stage};

/// One schedulable unit: an authored loop-nest body with its input/output
/// tensors and optional explicit buffer backings.
#[derive(Debug, Clone)]
pub struct ScheduleUnit {
    pub name: String,
    pub inputs: Vec<Tensor>,
    pub outputs: Vec<Tensor>,
    pub input_buffers: HashMap<Tensor, Buffer>,
    pub output_buffers: HashMap<Tensor, Buffer>,
    pub input_regions: HashMap<Tensor, Region>,
    pub output_regions: HashMap<Tensor, Region>,
    /// Implicit iteration variables of the body, outermost first.
    pub axis: Vec<IterVar>,
    pub body: Rc<Stmt>,
}

impl ScheduleUnit {
    pub fn new(name: impl Into<String>, inputs: Vec<Tensor>, outputs: Vec<Tensor>, body: Rc<Stmt>) -> Self {
        Self {
            name: name.into(),
            inputs,
            outputs,
            input_buffers: HashMap::new(),
            output_buffers: HashMap::new(),
            input_regions: HashMap::new(),
            output_regions: HashMap::new(),
            axis: gather_loop_vars(&body),
            body,
        }
    }

    /// Declares an explicit buffer backing (and optionally the sub-region
    /// it exposes) for one of the unit's input tensors.
    pub fn bind_input(&mut self, tensor: &Tensor, buffer: Buffer, region: Region) {
        self.input_buffers.insert(tensor.clone(), buffer);
        self.input_regions.insert(tensor.clone(), region);
    }

    pub fn bind_output(&mut self, tensor: &Tensor, buffer: Buffer, region: Region) {
        self.output_buffers.insert(tensor.clone(), buffer);
        self.output_regions.insert(tensor.clone(), region);
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    pub fn output_shape(&self, i: usize) -> &Shape {
        self.outputs[i].shape()
    }

    pub fn output_dtype(&self, i: usize) -> DType {
        self.outputs[i].dtype()
    }

    pub fn input_tensors(&self) -> &[Tensor] {
        &self.inputs
    }

    pub fn root_iter_vars(&self) -> &[IterVar] {
        &self.axis
    }

    /// Substitutes input tensors per the operation-graph rewrite map,
    /// returning a unit whose body and input list use the new identities.
    /// Returns a plain clone when nothing matched.
    pub fn replace_inputs(&self, rmap: &HashMap<Tensor, Tensor>) -> Self {
        let body = replace_tensor(&self.body, rmap);
        let mut unit = self.clone();
        if !Rc::ptr_eq(&body, &self.body) {
            unit.body = body;
        }
        for input in &mut unit.inputs {
            if let Some(mapped) = rmap.get(input) {
                *input = mapped.clone();
            }
        }
        unit
    }

    /// Wraps `body` in realize nodes declaring the full shape of every
    /// graph-bound output.
    pub fn build_realize(&self, graph_outputs: &[Tensor], body: &Rc<Stmt>) -> Rc<Stmt> {
        let mut out = body.clone();
        for tensor in graph_outputs {
            let bounds: Region =
                tensor.shape().iter().map(|dim| Range::by_min_extent(Expr::int(0), dim.clone())).collect();
            out = Stmt::realize(tensor.clone(), bounds, out);
        }
        out
    }

    /// Rebinds the body to the graph-bound output identities, wraps it in
    /// buffer-bind scopes for all inputs and outputs, and applies the
    /// schedule.
    ///
    /// `graph_outputs[i]` is the graph-bound identity of `outputs[i]`.
    /// Each tensor is paired with its declared buffer and region; tensors
    /// with no explicit backing get a fresh buffer and the full declared
    /// shape. Bind scopes are pushed outputs first, each group iterated in
    /// reverse, so the outermost annotations are the inputs in declaration
    /// order.
    pub fn build_provide(&self, graph_outputs: &[Tensor], stage: &Stage, dom_map: &DomMap) -> Result<Rc<Stmt>> {
        debug_assert_eq!(graph_outputs.len(), self.outputs.len());
        let mut ret = Stmt::attr(AttrNode::None, AttrKey::ExternScope, Expr::int(0), self.body.clone());

        for (i, output) in self.outputs.iter().enumerate().rev() {
            let (buffer, region) = match self.output_buffers.get(output) {
                Some(buffer) => (buffer.clone(), self.output_regions.get(output)),
                None => (Buffer::decl(output.shape(), output.dtype(), output.name()), None),
            };
            ret = push_bind(ret, buffer, graph_outputs[i].clone(), region);
        }
        for input in self.inputs.iter().rev() {
            let (buffer, region) = match self.input_buffers.get(input) {
                Some(buffer) => (buffer.clone(), self.input_regions.get(input)),
                None => (Buffer::decl(input.shape(), input.dtype(), input.name()), None),
            };
            ret = push_bind(ret, buffer, input.clone(), region);
        }

        let rmap: HashMap<Tensor, Tensor> =
            self.outputs.iter().cloned().zip(graph_outputs.iter().cloned()).collect();
        let ret = replace_tensor(&ret, &rmap);
        // A body that never provides a declared output is a latent defect,
        // but surfacing it is later validation's job; this pass stays
        // structural.
        let (ret, _provided) = replace_provide_tensor(&ret, &rmap);

        apply_schedule(stage, dom_map, &ret)
    }
}

/// Wraps `body` in one buffer-bind scope pairing `buffer` with `tensor`.
/// The value is the flattened `(offset, extent)` tuple per dimension of
/// the region the surrounding allocation exposes; an absent or empty
/// region defaults to the buffer's full shape.
fn push_bind(body: Rc<Stmt>, buffer: Buffer, tensor: Tensor, region: Option<&Region>) -> Rc<Stmt> {
    let mut tuple: Vec<Rc<Expr>> = Vec::new();
    match region {
        Some(region) if !region.is_empty() => {
            for range in region {
                tuple.push(range.min.clone());
                tuple.push(range.extent.clone());
            }
        }
        _ => {
            for dim in buffer.shape() {
                tuple.push(Expr::int(0));
                tuple.push(dim.clone());
            }
        }
    }
    Stmt::attr(AttrNode::BufferBind { buffer, tensor }, AttrKey::BufferBindScope, Expr::tuple(tuple), body)
}

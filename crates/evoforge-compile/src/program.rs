//! The straight-line program a genome compiles to: a topologically ordered
//! sequence of steps, each either a formal parameter, a literal, or a named
//! function applied to the outputs of earlier steps.

use evoforge_error::{evo_err, Result};

use crate::registry::Registry;
use crate::value::Value;

#[derive(Debug, Clone)]
pub enum Step {
    /// Reads the `n`-th formal parameter (declared input order).
    Input(usize),
    Literal(Value),
    /// Invokes the named operator with the listed steps' outputs as
    /// arguments, in order.
    Call { name: String, args: Vec<usize> },
}

/// A compiled genome: feed it `inputs` in declared order, get the declared
/// outputs back in order.
#[derive(Debug, Clone)]
pub struct Program {
    steps: Vec<Step>,
    outputs: Vec<usize>,
    n_inputs: usize,
}

impl Program {
    pub fn new(steps: Vec<Step>, outputs: Vec<usize>, n_inputs: usize) -> Self {
        Program { steps, outputs, n_inputs }
    }

    pub fn n_inputs(&self) -> usize {
        self.n_inputs
    }

    pub fn n_outputs(&self) -> usize {
        self.outputs.len()
    }

    pub fn eval(&self, registry: &Registry, inputs: &[Value]) -> Result<Vec<Value>> {
        if inputs.len() != self.n_inputs {
            return Err(evo_err!(Compile: "expected {} inputs, got {}", self.n_inputs, inputs.len()));
        }

        let mut slots: Vec<Value> = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            let value = match step {
                Step::Input(i) => inputs[*i].clone(),
                Step::Literal(v) => v.clone(),
                Step::Call { name, args } => {
                    let f = registry.get(name)?;
                    let arg_values: Vec<Value> = args.iter().map(|&i| slots[i].clone()).collect();
                    f(&arg_values)
                }
            };
            slots.push(value);
        }

        Ok(self.outputs.iter().map(|&i| slots[i].clone()).collect())
    }
}

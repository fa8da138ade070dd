/*!
 * C source generation for scalar functions.
 *
 * A [CodeGenerator] collects any number of [SXFunction]s and emits them as a single self
 * contained C translation unit. Every function becomes an evaluation routine
 *
 * ```c
 * int name(const d** arg, d** res);
 * ```
 *
 * reading the nonzeros of input `i` from `arg[i]` and writing the nonzeros of output `j`
 * to `res[j]` (a null `res[j]` skips that output), together with routines reporting the
 * number of inputs and outputs and their sparsity patterns. Patterns are emitted in
 * [compressed](crate::sparsity::Sparsity::compress) form and shared between functions, as
 * are arrays of numerical constants.
 *
 * ```
 * use easy_sens::codegen::{CodeGenerator, CodeGeneratorOptions};
 * use easy_sens::scalar::{SXFunction, SXMatrix};
 * use easy_sens::sparsity::Sparsity;
 * let x = SXMatrix::sym("x", Sparsity::scalar());
 * let y = x.map(|x| x.clone() * x.clone() + x.clone());
 * let f = SXFunction::new(vec![x], vec![y]).unwrap();
 * let mut generator = CodeGenerator::new(CodeGeneratorOptions::default());
 * generator.add_function(&f, "f");
 * let source = generator.generate();
 * assert!(source.contains("int f(const d** arg, d** res) {"));
 * assert!(source.contains("int f_n_in(void) { return 1; }"));
 * ```
 */

use crate::functions::Function;
use crate::ops::UnaryOp;
use crate::scalar::{Instruction, SXFunction};
use crate::sparsity::Sparsity;

use log::debug;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/**
 * Settings for a [CodeGenerator].
 */
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CodeGeneratorOptions {
    /// Prepended to the name of every generated routine.
    pub prefix: String,
    /// An extra header to include, written as `#include "header"`.
    pub include: Option<String>,
    /// Wraps the translation unit in `extern "C"` when compiled as C++.
    pub cpp_guards: bool,
    /// The C type used for real numbers.
    pub real_t: String,
}

impl Default for CodeGeneratorOptions {
    fn default() -> Self {
        CodeGeneratorOptions {
            prefix: String::new(),
            include: None,
            cpp_guards: true,
            real_t: "double".to_string(),
        }
    }
}

/**
 * Accumulates generated C code for one or more functions.
 */
#[derive(Clone, Debug)]
pub struct CodeGenerator {
    options: CodeGeneratorOptions,
    includes: Vec<String>,
    auxiliaries: String,
    squares: bool,
    integer_constants: Vec<Vec<usize>>,
    added_integer_constants: HashMap<Vec<usize>, usize>,
    double_constants: Vec<Vec<f64>>,
    added_double_constants: HashMap<Vec<u64>, usize>,
    functions: String,
}

impl CodeGenerator {
    pub fn new(options: CodeGeneratorOptions) -> CodeGenerator {
        let mut generator = CodeGenerator {
            options,
            includes: Vec::new(),
            auxiliaries: String::new(),
            squares: false,
            integer_constants: Vec::new(),
            added_integer_constants: HashMap::new(),
            double_constants: Vec::new(),
            added_double_constants: HashMap::new(),
            functions: String::new(),
        };
        if let Some(include) = generator.options.include.clone() {
            generator.add_include(&include, true);
        }
        generator
    }

    pub fn options(&self) -> &CodeGeneratorOptions {
        &self.options
    }

    /**
     * Adds a header, once. Relative headers are written with quotes, system headers with
     * angle brackets.
     */
    pub fn add_include(&mut self, header: &str, relative: bool) {
        let line = if relative {
            format!("#include \"{}\"", header)
        } else {
            format!("#include <{}>", header)
        };
        if !self.includes.contains(&line) {
            self.includes.push(line);
        }
    }

    /**
     * Returns the index of an integer constant array, adding it if it is new.
     */
    pub fn add_integer_constant(&mut self, values: Vec<usize>) -> usize {
        if let Some(&index) = self.added_integer_constants.get(&values) {
            return index;
        }
        let index = self.integer_constants.len();
        self.added_integer_constants.insert(values.clone(), index);
        self.integer_constants.push(values);
        index
    }

    /**
     * Returns the index of a double constant array, adding it if it is new. Arrays are
     * equal if their values have identical bit patterns.
     */
    pub fn add_double_constant(&mut self, values: Vec<f64>) -> usize {
        let key: Vec<u64> = values.iter().map(|x| x.to_bits()).collect();
        if let Some(&index) = self.added_double_constants.get(&key) {
            return index;
        }
        let index = self.double_constants.len();
        self.added_double_constants.insert(key, index);
        self.double_constants.push(values);
        index
    }

    /**
     * The name of the integer constant holding a compressed sparsity pattern.
     */
    pub fn sparsity(&mut self, sparsity: &Sparsity) -> String {
        format!("s{}", self.add_integer_constant(sparsity.compress()))
    }

    fn add_square(&mut self) {
        if self.squares {
            return;
        }
        self.squares = true;
        let prefix = &self.options.prefix;
        self.auxiliaries
            .push_str(&format!("d {}aux_sq(d x) {{ return x*x;}}\n", prefix));
        self.auxiliaries
            .push_str(&format!("#define sq(x) {}aux_sq(x)\n\n", prefix));
    }

    /**
     * Adds the evaluation routine of a function and its metadata routines under the
     * given name.
     */
    pub fn add_function(&mut self, function: &SXFunction, name: &str) {
        let name = format!("{}{}", self.options.prefix, name);
        let tape = function.instructions();
        debug!(
            "Generating C routine {} from {} instructions",
            name,
            tape.len()
        );

        // equal values share one entry of the constant array
        let mut constants: Vec<f64> = Vec::new();
        let mut constant_entries: HashMap<u64, usize> = HashMap::new();
        let constant_indices: Vec<Option<usize>> = tape
            .iter()
            .map(|instruction| match instruction {
                Instruction::Constant { value } => {
                    Some(*constant_entries.entry(value.to_bits()).or_insert_with(|| {
                        constants.push(*value);
                        constants.len() - 1
                    }))
                }
                _ => None,
            })
            .collect();
        let constant_array = if constants.is_empty() {
            None
        } else {
            if constants.iter().any(|x| !x.is_finite()) {
                self.add_include("math.h", false);
            }
            Some(self.add_double_constant(constants))
        };

        let mut body = String::new();
        body.push_str(&format!("/* {} */\n", name));
        body.push_str(&format!("int {}(const d** arg, d** res) {{\n", name));
        if !tape.is_empty() {
            body.push_str(&format!("  d w[{}];\n", tape.len()));
        }
        for (i, instruction) in tape.iter().enumerate() {
            let rhs = match instruction {
                Instruction::Input { input, nonzero } => {
                    format!("arg[{}] ? arg[{}][{}] : 0", input, input, nonzero)
                }
                Instruction::Constant { .. } => match (constant_array, constant_indices[i]) {
                    (Some(array), Some(k)) => format!("c{}[{}]", array, k),
                    _ => "0".to_string(),
                },
                Instruction::Unary { op, arg } => match op {
                    UnaryOp::Neg => format!("(-w[{}])", arg),
                    UnaryOp::Sq => {
                        self.add_square();
                        format!("sq(w[{}])", arg)
                    }
                    _ => {
                        self.add_include("math.h", false);
                        format!("{}(w[{}])", op.name(), arg)
                    }
                },
                Instruction::Binary { op, lhs, rhs } => {
                    format!("(w[{}]{}w[{}])", lhs, op.symbol(), rhs)
                }
            };
            body.push_str(&format!("  w[{}] = {};\n", i, rhs));
        }
        for (j, slots) in function.output_slots().iter().enumerate() {
            if slots.is_empty() {
                continue;
            }
            body.push_str(&format!("  if (res[{}]) {{\n", j));
            for (k, slot) in slots.iter().enumerate() {
                body.push_str(&format!("    res[{}][{}] = w[{}];\n", j, k, slot));
            }
            body.push_str("  }\n");
        }
        body.push_str("  return 0;\n}\n\n");

        body.push_str(&format!(
            "int {}_n_in(void) {{ return {}; }}\n\n",
            name,
            function.n_in()
        ));
        body.push_str(&format!(
            "int {}_n_out(void) {{ return {}; }}\n\n",
            name,
            function.n_out()
        ));
        let inputs: Vec<String> = (0..function.n_in())
            .map(|i| self.sparsity(function.sparsity_in(i)))
            .collect();
        let outputs: Vec<String> = (0..function.n_out())
            .map(|i| self.sparsity(function.sparsity_out(i)))
            .collect();
        body.push_str(&sparsity_switch(&format!("{}_sparsity_in", name), &inputs));
        body.push_str(&sparsity_switch(&format!("{}_sparsity_out", name), &outputs));

        self.functions.push_str(&body);
    }

    /**
     * Assembles the translation unit from everything added so far.
     */
    pub fn generate(&self) -> String {
        let mut s = String::new();
        s.push_str("/* This file was automatically generated by easy-sens */\n");
        if self.options.cpp_guards {
            s.push_str("#ifdef __cplusplus\nextern \"C\" {\n#endif\n\n");
        }
        for include in &self.includes {
            s.push_str(include);
            s.push('\n');
        }
        s.push('\n');
        s.push_str(&format!("#define d {}\n\n", self.options.real_t));
        s.push_str(&self.auxiliaries);
        for (i, values) in self.integer_constants.iter().enumerate() {
            let values: Vec<String> = values.iter().map(usize::to_string).collect();
            s.push_str(&format!("static const int s{}[] = {{{}}};\n", i, values.join(", ")));
        }
        for (i, values) in self.double_constants.iter().enumerate() {
            let values: Vec<String> = values.iter().map(|&x| constant(x)).collect();
            s.push_str(&format!("static const d c{}[] = {{{}}};\n", i, values.join(", ")));
        }
        if !self.integer_constants.is_empty() || !self.double_constants.is_empty() {
            s.push('\n');
        }
        s.push_str(&self.functions);
        if self.options.cpp_guards {
            s.push_str("#ifdef __cplusplus\n} /* extern \"C\" */\n#endif\n");
        }
        s
    }

    /**
     * Writes the generated translation unit to a file.
     */
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        fs::write(path, self.generate())
    }
}

fn sparsity_switch(name: &str, patterns: &[String]) -> String {
    let mut s = format!("const int* {}(int i) {{\n  switch (i) {{\n", name);
    for (i, pattern) in patterns.iter().enumerate() {
        s.push_str(&format!("    case {}: return {};\n", i, pattern));
    }
    s.push_str("    default: return 0;\n  }\n}\n\n");
    s
}

/**
 * Formats a number as a C literal of type `d`. Integral values are written as `3.`, and
 * every other finite value in scientific notation with enough digits to round trip.
 */
pub fn constant(value: f64) -> String {
    if value.is_nan() {
        return "NAN".to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-INFINITY" } else { "INFINITY" }.to_string();
    }
    if value.fract() == 0.0 && value.abs() <= i32::MAX as f64 {
        return format!("{}.", value as i64);
    }
    let formatted = format!("{:.16e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => match exponent.parse::<i32>() {
            Ok(exponent) => format!(
                "{}e{}{:02}",
                mantissa,
                if exponent < 0 { '-' } else { '+' },
                exponent.abs()
            ),
            Err(_) => formatted,
        },
        None => formatted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_c_literals() {
        assert_eq!(constant(3.0), "3.");
        assert_eq!(constant(-2.0), "-2.");
        assert_eq!(constant(f64::NAN), "NAN");
        assert_eq!(constant(f64::NEG_INFINITY), "-INFINITY");
        assert_eq!(constant(0.5), "5.0000000000000000e-01");
        assert_eq!(constant(1.5e300), "1.5000000000000000e+300");
    }

    #[test]
    fn constant_arrays_are_deduplicated() {
        let mut generator = CodeGenerator::new(CodeGeneratorOptions::default());
        assert_eq!(generator.add_double_constant(vec![1.0, 2.0]), 0);
        assert_eq!(generator.add_double_constant(vec![2.0]), 1);
        assert_eq!(generator.add_double_constant(vec![1.0, 2.0]), 0);
        assert_eq!(generator.sparsity(&Sparsity::dense(2, 1)), "s0");
        assert_eq!(generator.sparsity(&Sparsity::scalar()), "s1");
        assert_eq!(generator.sparsity(&Sparsity::dense(2, 1)), "s0");
    }

    #[test]
    fn guards_are_optional() {
        let options = CodeGeneratorOptions {
            cpp_guards: false,
            real_t: "float".to_string(),
            ..CodeGeneratorOptions::default()
        };
        let source = CodeGenerator::new(options).generate();
        assert!(!source.contains("__cplusplus"));
        assert!(source.contains("#define d float"));
    }
}

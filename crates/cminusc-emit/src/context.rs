//! Symbol tables threaded explicitly through emission.
//!
//! `EmitContext` is an explicit value owned by the emission pass and
//! passed as `&mut`, so nothing about emission is global or shared
//! across threads.

use std::collections::HashMap;

use cminusc_par::{ReturnType, Type};
use cminusc_util::Span;

/// Byte offset from the frame base pointer, plus the declared type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocalVariable {
    pub ty: Type,
    pub offset: u32,
}

/// Everything known about one function name by the time emission finishes
/// with it.
#[derive(Clone, Debug)]
pub struct FunctionInfo {
    pub return_type: ReturnType,
    pub parameters: Vec<String>,
    /// Declared type of each parameter, parallel to `parameters`. Kept
    /// alongside the plain name list (as named in the data model) because
    /// the redeclaration check also has to compare types, not just names.
    pub parameter_types: Vec<Type>,
    pub locals: HashMap<String, LocalVariable>,
    pub stack_offset: u32,
    pub is_defined: bool,
    pub is_called: bool,
    pub if_count: u32,
    pub while_count: u32,
    pub decl_span: Span,
}

impl FunctionInfo {
    fn new(decl_span: Span) -> Self {
        Self {
            return_type: ReturnType::Void,
            parameters: Vec::new(),
            parameter_types: Vec::new(),
            locals: HashMap::new(),
            stack_offset: 0,
            is_defined: false,
            is_called: false,
            if_count: 0,
            while_count: 0,
            decl_span,
        }
    }

    /// Reserve the next 8-byte slot in this function's frame for `name`.
    pub fn declare_local(&mut self, name: &str, ty: Type) -> u32 {
        let offset = self.stack_offset;
        self.locals.insert(
            name.to_string(),
            LocalVariable { ty, offset },
        );
        self.stack_offset += 8;
        offset
    }

    pub fn next_if_label(&mut self) -> u32 {
        let n = self.if_count;
        self.if_count += 1;
        n
    }

    pub fn next_while_label(&mut self) -> u32 {
        let n = self.while_count;
        self.while_count += 1;
        n
    }

    /// Returns whether `(return_type, params)` matches this function's
    /// existing signature exactly: same return type, same arity, same
    /// parameter names and types in order.
    pub fn signature_matches(&self, return_type: ReturnType, param_names: &[&str], param_types: &[Type]) -> bool {
        self.return_type == return_type
            && self.parameters.len() == param_names.len()
            && self.parameters.iter().map(String::as_str).eq(param_names.iter().copied())
            && self.parameter_types == param_types
    }

    /// Records this set of parameters as the function's known signature.
    /// Only meaningful the first time a name is seen; later calls should
    /// go through `signature_matches` instead.
    pub fn set_signature(&mut self, return_type: ReturnType, param_names: Vec<String>, param_types: Vec<Type>) {
        self.return_type = return_type;
        self.parameters = param_names;
        self.parameter_types = param_types;
    }
}

/// Function table, global table, and the ordered list of string literals
/// encountered so far.
#[derive(Default)]
pub struct EmitContext {
    pub functions: HashMap<String, FunctionInfo>,
    /// Names in first-seen order, so end-of-program checks (and any other
    /// pass over all functions) are deterministic regardless of the
    /// `HashMap`'s iteration order.
    pub function_order: Vec<String>,
    pub globals: HashMap<String, Type>,
    /// Names in first-seen order, mirroring `function_order`.
    pub global_order: Vec<String>,
    pub string_literals: Vec<String>,
}

impl EmitContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a `write(...)` string literal, returning its `str_lit<i>` index.
    pub fn intern_string(&mut self, text: &str) -> usize {
        let index = self.string_literals.len();
        self.string_literals.push(text.to_string());
        index
    }

    /// Registers a new global, returning `false` if one by that name
    /// already exists (the caller reports redeclaration).
    pub fn declare_global(&mut self, name: &str, ty: Type) -> bool {
        if self.globals.contains_key(name) {
            return false;
        }
        self.globals.insert(name.to_string(), ty);
        self.global_order.push(name.to_string());
        true
    }

    pub fn function_mut(&mut self, name: &str) -> Option<&mut FunctionInfo> {
        self.functions.get_mut(name)
    }

    pub fn function(&self, name: &str) -> Option<&FunctionInfo> {
        self.functions.get(name)
    }

    pub fn entry(&mut self, name: &str, decl_span: Span) -> &mut FunctionInfo {
        if !self.functions.contains_key(name) {
            self.function_order.push(name.to_string());
        }
        self.functions
            .entry(name.to_string())
            .or_insert_with(|| FunctionInfo::new(decl_span))
    }
}

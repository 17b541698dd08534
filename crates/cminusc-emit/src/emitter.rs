//! AST-directed code generation: symbol-table construction, semantic
//! checks, and NASM text emission, all in a single walk per node.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use cminusc_par::{
    BinOp, Expr, ExprKind, FunctionDef, Item, Param, Program, ReturnType, Stmt, Type, UnaryOp,
    WriteArg,
};
use cminusc_util::Span;

use crate::asm::AsmWriter;
use crate::context::EmitContext;
use crate::error::{EmitError, EmitResult};

/// Prefix applied to every global variable name when it is emitted as a
/// `.bss` label, so it can never collide with a register mnemonic.
const GLOBAL_PREFIX: &str = "gvar_";

const ARG_REGS: [&str; 6] = ["rdi", "rsi", "rdx", "rcx", "r8", "r9"];

/// Entry point: walks `program`, builds the symbol tables, and writes the
/// resulting assembly text to `out_path`. The output file is opened only
/// after the whole program has been successfully walked, so a semantic
/// error never leaves a half-written file behind.
pub fn emit_program(program: &Program, out_path: &Path) -> EmitResult<()> {
    let mut ctx = EmitContext::new();
    let mut function_bodies = Vec::new();

    for item in &program.items {
        match item {
            Item::VarDecl(group) => {
                for name in &group.names {
                    if !ctx.declare_global(name, group.ty) {
                        return Err(EmitError::VariableRedeclared {
                            name: name.clone(),
                            span: group.span,
                        });
                    }
                }
            }
            Item::FunctionDecl(group) => {
                for sig in &group.sigs {
                    register_signature(&mut ctx, &sig.name, group.return_type, &sig.params, sig.span)?;
                }
            }
            Item::FunctionDef(def) => {
                let body = emit_function_def(&mut ctx, def)?;
                function_bodies.push(body);
            }
        }
    }

    for name in &ctx.function_order {
        let info = ctx.functions.get(name).expect("function_order entries exist in functions");
        if info.is_called && !info.is_defined {
            return Err(EmitError::CalledButNeverDefined { name: name.clone() });
        }
    }

    let text = assemble_output(&ctx, &function_bodies);
    write_output(out_path, &text)?;
    Ok(())
}

fn write_output(out_path: &Path, text: &str) -> EmitResult<()> {
    let file = File::create(out_path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(text.as_bytes()).map_err(io_err)?;
    writer.flush().map_err(io_err)?;
    Ok(())
}

fn io_err(e: io::Error) -> EmitError {
    EmitError::Io(e.to_string())
}

fn assemble_output(ctx: &EmitContext, function_bodies: &[String]) -> String {
    let mut w = AsmWriter::new();
    w.directive("global main");
    w.directive("extern printf");
    w.directive("extern scanf");
    w.blank();

    w.section(".data");
    w.data_decl("read_int_fmt:   db \"%lld\", 0");
    w.data_decl("read_float_fmt: db \"%lf\", 0");
    w.data_decl("write_int_fmt:  db \"%lld\", 0xA, 0");
    w.data_decl("write_flt_fmt:  db \"%lf\", 0xA, 0");
    for (i, text) in ctx.string_literals.iter().enumerate() {
        w.data_decl(&format!("str_lit{i}: db \"{text}\", 0xA, 0"));
    }
    w.blank();

    w.section(".bss");
    for name in &ctx.global_order {
        w.data_decl(&format!("{GLOBAL_PREFIX}{name}: resb 8"));
    }
    w.blank();

    w.section(".text");
    for body in function_bodies {
        w.directive(body.trim_end());
        w.blank();
    }

    w.into_string()
}

/// A location a name resolves to: a local slot in the current function's
/// frame, or a global variable.
enum VarLoc {
    Local { ty: Type, offset: u32 },
    Global { ty: Type },
}

fn resolve_variable(ctx: &EmitContext, fn_name: &str, name: &str) -> Option<VarLoc> {
    if let Some(info) = ctx.function(fn_name) {
        if let Some(lv) = info.locals.get(name) {
            return Some(VarLoc::Local {
                ty: lv.ty,
                offset: lv.offset,
            });
        }
    }
    ctx.globals.get(name).map(|ty| VarLoc::Global { ty: *ty })
}

/// The frame address of a local/parameter slot. Offsets are counted up
/// from the first slot (0, 8, 16, ...); the `+ 8` accounts for the slot
/// sitting strictly below the saved frame pointer.
fn local_addr(offset: u32) -> String {
    format!("[rbp - {}]", offset + 8)
}

fn global_addr(name: &str) -> String {
    format!("[{GLOBAL_PREFIX}{name}]")
}

fn register_signature(
    ctx: &mut EmitContext,
    name: &str,
    return_type: ReturnType,
    params: &[Param],
    span: Span,
) -> EmitResult<()> {
    let param_names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
    let param_types: Vec<Type> = params.iter().map(|p| p.ty).collect();

    let is_new = ctx.function(name).is_none();
    let entry = ctx.entry(name, span);
    if is_new {
        entry.set_signature(return_type, param_names.iter().map(|s| s.to_string()).collect(), param_types);
        Ok(())
    } else if entry.signature_matches(return_type, &param_names, &param_types) {
        Ok(())
    } else {
        Err(EmitError::FunctionSignatureMismatch {
            name: name.to_string(),
            span,
            earlier: entry.decl_span,
        })
    }
}

fn emit_function_def(ctx: &mut EmitContext, def: &FunctionDef) -> EmitResult<String> {
    register_signature(ctx, &def.name, def.return_type, &def.params, def.span)?;

    {
        let info = ctx.entry(&def.name, def.span);
        if info.is_defined {
            return Err(EmitError::FunctionRedefined {
                name: def.name.clone(),
                span: def.span,
                earlier: info.decl_span,
            });
        }
        info.is_defined = true;
    }

    for p in &def.params {
        let info = ctx.function_mut(&def.name).expect("just registered");
        if info.locals.contains_key(&p.name) {
            return Err(EmitError::VariableRedeclared {
                name: p.name.clone(),
                span: p.span,
            });
        }
        info.declare_local(&p.name, p.ty);
    }
    for group in &def.locals {
        for name in &group.names {
            let info = ctx.function_mut(&def.name).expect("just registered");
            if info.locals.contains_key(name) {
                return Err(EmitError::VariableRedeclared {
                    name: name.clone(),
                    span: group.span,
                });
            }
            info.declare_local(name, group.ty);
        }
    }

    let mut w = AsmWriter::new();
    emit_prologue(ctx, def, &mut w)?;
    for stmt in &def.body {
        emit_stmt(ctx, &def.name, &mut w, stmt)?;
    }
    w.instr("mov rax, 0");
    w.label(".function_end");
    w.comment("restore caller's frame");
    w.instr("mov rsp, rbp");
    w.instr("pop rbp");
    w.instr("ret");

    Ok(w.into_string())
}

fn emit_prologue(ctx: &mut EmitContext, def: &FunctionDef, w: &mut AsmWriter) -> EmitResult<()> {
    w.label(&def.name);
    w.comment("save caller's frame");
    w.instr("push rbp");
    w.instr("mov rbp, rsp");

    let locals_count = ctx.function(&def.name).expect("registered").locals.len() as u32;
    if locals_count > 0 {
        w.instr_commented(
            &format!("sub rsp, {}", 8 * locals_count),
            &format!("reserve {locals_count} local slot(s)"),
        );
    }

    for (i, p) in def.params.iter().enumerate() {
        let offset = ctx
            .function(&def.name)
            .expect("registered")
            .locals
            .get(&p.name)
            .expect("declared above")
            .offset;
        let addr = local_addr(offset);
        if i < ARG_REGS.len() {
            w.instr_commented(&format!("mov {addr}, {}", ARG_REGS[i]), &p.name);
        } else {
            let k = i - ARG_REGS.len();
            w.instr(&format!("mov r10, [rbp + {}]", 8 * (k + 1)));
            w.instr_commented(&format!("mov {addr}, r10"), &p.name);
        }
    }
    Ok(())
}

fn emit_stmt(ctx: &mut EmitContext, fn_name: &str, w: &mut AsmWriter, stmt: &Stmt) -> EmitResult<()> {
    match stmt {
        Stmt::Empty => Ok(()),
        Stmt::Block(stmts) => {
            for s in stmts {
                emit_stmt(ctx, fn_name, w, s)?;
            }
            Ok(())
        }
        Stmt::Assignment { name, value, span } => {
            match resolve_variable(ctx, fn_name, name) {
                Some(VarLoc::Local { ty, offset }) => {
                    if ty == Type::Float {
                        return Err(EmitError::FloatUnsupported { span: *span });
                    }
                    emit_expr(ctx, fn_name, w, value)?;
                    w.instr(&format!("mov {}, r8", local_addr(offset)));
                    Ok(())
                }
                Some(VarLoc::Global { ty }) => {
                    if ty == Type::Float {
                        return Err(EmitError::FloatUnsupported { span: *span });
                    }
                    emit_expr(ctx, fn_name, w, value)?;
                    w.instr(&format!("mov {}, r8", global_addr(name)));
                    Ok(())
                }
                None => Err(EmitError::UndeclaredIdentifier {
                    name: name.clone(),
                    span: *span,
                }),
            }
        }
        Stmt::Read { name, span } => match resolve_variable(ctx, fn_name, name) {
            Some(VarLoc::Local { ty, offset }) => {
                if ty == Type::Float {
                    return Err(EmitError::FloatUnsupported { span: *span });
                }
                w.instr(&format!("lea rsi, {}", local_addr(offset)));
                w.instr("lea rdi, [rel read_int_fmt]");
                w.instr("xor eax, eax");
                w.instr("call scanf");
                Ok(())
            }
            Some(VarLoc::Global { ty }) => {
                if ty == Type::Float {
                    return Err(EmitError::FloatUnsupported { span: *span });
                }
                w.instr(&format!("lea rsi, {}", global_addr(name)));
                w.instr("lea rdi, [rel read_int_fmt]");
                w.instr("xor eax, eax");
                w.instr("call scanf");
                Ok(())
            }
            None => Err(EmitError::UndeclaredIdentifier {
                name: name.clone(),
                span: *span,
            }),
        },
        Stmt::Write { arg, .. } => {
            match arg {
                WriteArg::Str(text) => {
                    let idx = ctx.intern_string(text);
                    w.instr(&format!("lea rdi, [rel str_lit{idx}]"));
                    w.instr("xor eax, eax");
                    w.instr("call printf");
                }
                WriteArg::Expr(e) => {
                    emit_expr(ctx, fn_name, w, e)?;
                    w.instr("mov rsi, r8");
                    w.instr("lea rdi, [rel write_int_fmt]");
                    w.instr("xor eax, eax");
                    w.instr("call printf");
                }
            }
            Ok(())
        }
        Stmt::CallStmt { name, args, span } => emit_call(ctx, fn_name, w, name, args, *span),
        Stmt::If {
            cond,
            then_branch,
            else_branch,
            ..
        } => {
            let n = ctx.function_mut(fn_name).expect("current function").next_if_label();
            emit_expr(ctx, fn_name, w, cond)?;
            w.instr("cmp r8, 0");
            w.instr(&format!("jne .if_true_{n}"));
            if else_branch.is_some() {
                w.instr(&format!("jmp .if_false_{n}"));
            } else {
                w.instr(&format!("jmp .if_end_{n}"));
            }
            w.label(&format!(".if_true_{n}"));
            emit_stmt(ctx, fn_name, w, then_branch)?;
            if let Some(eb) = else_branch {
                w.instr(&format!("jmp .if_end_{n}"));
                w.label(&format!(".if_false_{n}"));
                emit_stmt(ctx, fn_name, w, eb)?;
            }
            w.label(&format!(".if_end_{n}"));
            Ok(())
        }
        Stmt::While { cond, body, .. } => {
            let n = ctx.function_mut(fn_name).expect("current function").next_while_label();
            w.label(&format!(".while_{n}"));
            emit_expr(ctx, fn_name, w, cond)?;
            w.instr("cmp r8, 0");
            w.instr(&format!("je .while_end_{n}"));
            emit_stmt(ctx, fn_name, w, body)?;
            w.instr(&format!("jmp .while_{n}"));
            w.label(&format!(".while_end_{n}"));
            Ok(())
        }
        Stmt::Return { value, .. } => {
            match value {
                Some(e) => {
                    emit_expr(ctx, fn_name, w, e)?;
                    w.instr("mov rax, r8");
                }
                None => {
                    w.instr("mov rax, 0");
                }
            }
            w.instr("jmp .function_end");
            Ok(())
        }
    }
}

fn emit_expr(ctx: &mut EmitContext, fn_name: &str, w: &mut AsmWriter, expr: &Expr) -> EmitResult<()> {
    match &expr.kind {
        ExprKind::IntLiteral(text) => {
            w.instr(&format!("mov r8, {text}"));
            Ok(())
        }
        ExprKind::FloatLiteral(_) => Err(EmitError::FloatUnsupported { span: expr.span }),
        ExprKind::Variable(name) => emit_load_variable(ctx, fn_name, w, name, expr.span),
        ExprKind::Unary { op, operand } => {
            emit_expr(ctx, fn_name, w, operand)?;
            match op {
                UnaryOp::Neg => {
                    w.instr("neg r8");
                }
                UnaryOp::Not => {
                    w.instr("cmp r8, 0");
                    w.instr("sete al");
                    w.instr("movzx r8, al");
                }
            }
            Ok(())
        }
        ExprKind::Binary { op, left, right } => {
            emit_expr(ctx, fn_name, w, left)?;
            w.instr("push r8");
            emit_expr(ctx, fn_name, w, right)?;
            w.instr("mov r9, r8");
            w.instr("pop r8");
            emit_binop(w, *op);
            Ok(())
        }
        ExprKind::Call { name, args } => {
            emit_call(ctx, fn_name, w, name, args, expr.span)?;
            w.instr("mov r8, rax");
            Ok(())
        }
    }
}

fn emit_load_variable(ctx: &EmitContext, fn_name: &str, w: &mut AsmWriter, name: &str, span: Span) -> EmitResult<()> {
    match resolve_variable(ctx, fn_name, name) {
        Some(VarLoc::Local { ty, offset }) => {
            if ty == Type::Float {
                return Err(EmitError::FloatUnsupported { span });
            }
            w.instr(&format!("mov r8, {}", local_addr(offset)));
            Ok(())
        }
        Some(VarLoc::Global { ty }) => {
            if ty == Type::Float {
                return Err(EmitError::FloatUnsupported { span });
            }
            w.instr(&format!("mov r8, {}", global_addr(name)));
            Ok(())
        }
        None => Err(EmitError::UndeclaredIdentifier {
            name: name.to_string(),
            span,
        }),
    }
}

/// Combines `r8` (left) and `r9` (right), leaving the result in `r8`.
fn emit_binop(w: &mut AsmWriter, op: BinOp) {
    match op {
        BinOp::Add => {
            w.instr("add r8, r9");
        }
        BinOp::Sub => {
            w.instr("sub r8, r9");
        }
        BinOp::Mul => {
            w.instr("imul r8, r9");
        }
        BinOp::Div => {
            w.instr("mov rax, r8");
            w.instr("cqo");
            w.instr("idiv r9");
            w.instr("mov r8, rax");
        }
        BinOp::Eq => emit_compare(w, "sete"),
        BinOp::Ne => emit_compare(w, "setne"),
        BinOp::Lt => emit_compare(w, "setl"),
        BinOp::Le => emit_compare(w, "setle"),
        BinOp::Gt => emit_compare(w, "setg"),
        BinOp::Ge => emit_compare(w, "setge"),
        BinOp::And => {
            w.instr("cmp r8, 0");
            w.instr("setne al");
            w.instr("movzx r8, al");
            w.instr("cmp r9, 0");
            w.instr("setne r10b");
            w.instr("movzx r9, r10b");
            w.instr("and r8, r9");
        }
        BinOp::Or => {
            w.instr("cmp r8, 0");
            w.instr("setne al");
            w.instr("movzx r8, al");
            w.instr("cmp r9, 0");
            w.instr("setne r10b");
            w.instr("movzx r9, r10b");
            w.instr("or r8, r9");
        }
    }
}

fn emit_compare(w: &mut AsmWriter, setcc: &str) {
    w.instr("cmp r8, r9");
    w.instr(&format!("{setcc} al"));
    w.instr("movzx r8, al");
}

/// Emits a call, leaving the raw return value in `rax`. Returns `Ok(())`
/// so call sites that only need the side effect (a `CallStmt`) don't have
/// to discard anything explicitly.
fn emit_call(
    ctx: &mut EmitContext,
    fn_name: &str,
    w: &mut AsmWriter,
    callee: &str,
    args: &[Expr],
    span: Span,
) -> EmitResult<()> {
    let expected = match ctx.function(callee) {
        Some(info) => info.parameters.len(),
        None => {
            return Err(EmitError::UndeclaredFunction {
                name: callee.to_string(),
                span,
            })
        }
    };
    if args.len() != expected {
        return Err(EmitError::ArityMismatch {
            name: callee.to_string(),
            given: args.len(),
            expected,
            span,
        });
    }

    for (i, arg) in args.iter().take(ARG_REGS.len()).enumerate() {
        emit_expr(ctx, fn_name, w, arg)?;
        if ARG_REGS[i] != "r8" {
            w.instr(&format!("mov {}, r8", ARG_REGS[i]));
        }
    }
    let stack_arg_count = args.len().saturating_sub(ARG_REGS.len());
    if stack_arg_count > 0 {
        for arg in args[ARG_REGS.len()..].iter().rev() {
            emit_expr(ctx, fn_name, w, arg)?;
            w.instr("push r8");
        }
    }

    w.instr(&format!("call {callee}"));
    if stack_arg_count > 0 {
        w.instr(&format!("add rsp, {}", 8 * stack_arg_count));
    }

    ctx.function_mut(callee).expect("checked above").is_called = true;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cminusc_par::Parser;

    fn compile(src: &str) -> EmitResult<String> {
        let program = Parser::new(src).parse_program().expect("parse should succeed");
        let dir = tempfile::tempdir().expect("tempdir");
        let out_path = dir.path().join("out.asm");
        emit_program(&program, &out_path)?;
        Ok(std::fs::read_to_string(&out_path).expect("output should be written"))
    }

    #[test]
    fn global_and_main_shape() {
        let asm = compile("int x; int main(void) { int x; if (!0) x = 2; }").unwrap();
        assert!(asm.contains("gvar_x: resb 8"));
        assert!(asm.contains("main:"));
        assert!(asm.contains("push rbp"));
        assert!(asm.contains("mov rbp, rsp"));
        assert!(asm.contains("; save caller's frame"));
        assert!(asm.contains("; x"));
    }

    #[test]
    fn write_string_literal_is_interned_and_referenced() {
        let asm = compile(r#"void main(void) { write("hi"); }"#).unwrap();
        assert!(asm.contains("str_lit0: db \"hi\", 0xA, 0"));
        assert!(asm.contains("lea rdi, [rel str_lit0]"));
        assert!(asm.contains("call printf"));
    }

    #[test]
    fn emitter_is_deterministic() {
        let src = "int f(int a, int b) { return a + b; } int main(void) { return f(1, 2); }";
        let first = compile(src).unwrap();
        let second = compile(src).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn function_signature_mismatch_is_fatal() {
        let err = compile("int f(int x); int f(float x) { return 0; }").unwrap_err();
        assert!(matches!(err, EmitError::FunctionSignatureMismatch { .. }));
    }

    #[test]
    fn call_to_undeclared_function_is_fatal() {
        let err = compile("int main(void) { g(); return 0; }").unwrap_err();
        assert!(matches!(err, EmitError::UndeclaredFunction { .. }));
    }

    #[test]
    fn call_arity_mismatch_is_fatal() {
        let err = compile("int f(int x); int main(void) { f(1, 2); return 0; }").unwrap_err();
        assert!(matches!(err, EmitError::ArityMismatch { .. }));
    }

    #[test]
    fn called_but_never_defined_is_fatal_at_end_of_program() {
        let err = compile("int g(void); int main(void) { g(); return 0; }").unwrap_err();
        assert!(matches!(err, EmitError::CalledButNeverDefined { .. }));
    }

    #[test]
    fn redeclared_global_is_fatal() {
        let err = compile("int x; int x;").unwrap_err();
        assert!(matches!(err, EmitError::VariableRedeclared { .. }));
    }

    #[test]
    fn function_redefinition_is_fatal() {
        let err = compile("int f(void) { return 0; } int f(void) { return 1; }").unwrap_err();
        assert!(matches!(err, EmitError::FunctionRedefined { .. }));
    }

    #[test]
    fn float_assignment_is_unsupported() {
        let err = compile("float x; int main(void) { x = 1; return 0; }").unwrap_err();
        assert!(matches!(err, EmitError::FloatUnsupported { .. }));
    }

    #[test]
    fn float_read_is_unsupported() {
        let err = compile("float x; int main(void) { read(x); return 0; }").unwrap_err();
        assert!(matches!(err, EmitError::FloatUnsupported { .. }));
    }

    #[test]
    fn labels_are_unique_within_a_function() {
        let asm = compile(
            r#"
            int main(void) {
                if (1) { write(1); } else { write(0); }
                if (1) { write(1); } else { write(0); }
                return 0;
            }
            "#,
        )
        .unwrap();
        assert!(asm.contains(".if_true_0:"));
        assert!(asm.contains(".if_true_1:"));
    }

    #[test]
    fn stack_offset_matches_local_count() {
        let program = Parser::new("int f(int a, int b) { int c; return a + b + c; }")
            .parse_program()
            .unwrap();
        let mut ctx = EmitContext::new();
        let dir = tempfile::tempdir().unwrap();
        emit_program(&program, &dir.path().join("out.asm")).unwrap();
        // Re-derive via a second pass since emit_program owns its own ctx;
        // exercise the invariant directly against a freshly built one.
        if let Item::FunctionDef(def) = &program.items[0] {
            register_signature(&mut ctx, &def.name, def.return_type, &def.params, def.span).unwrap();
            for p in &def.params {
                ctx.function_mut(&def.name).unwrap().declare_local(&p.name, p.ty);
            }
            for g in &def.locals {
                for n in &g.names {
                    ctx.function_mut(&def.name).unwrap().declare_local(n, g.ty);
                }
            }
            let info = ctx.function(&def.name).unwrap();
            assert_eq!(info.stack_offset, 8 * info.locals.len() as u32);
        } else {
            panic!("expected function def");
        }
    }
}

use la_arena::Arena;

use crate::expr::{BinOp, Expr, UnOp, VarRef};
use crate::stmt::Stmt;
use crate::symtab::SymbolTable;
use crate::types::{FieldType, IntKind, StructType};

/// Indented text sink every artifact is composed into.
pub struct Emitter {
    indent: usize,
    out: String,
}

impl Emitter {
    pub fn new() -> Self {
        Self {
            indent: 0,
            out: String::new(),
        }
    }

    pub fn emit_inline(&mut self, s: &str) {
        self.out.push_str(s);
    }

    pub fn emit_line(&mut self, s: &str) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
        self.out.push_str(s);
        self.out.push('\n');
    }

    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    pub fn enter_block(&mut self) {
        self.indent += 1;
    }

    pub fn exit_block(&mut self) {
        self.indent -= 1;
    }

    pub fn finish(self) -> String {
        self.out
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view the serialization walks against: name resolution goes
/// through the same tables generation used, so emission stays a pure
/// function of the finished program.
pub struct EmitCtx<'a> {
    pub arena: &'a Arena<StructType>,
    pub inp: &'a SymbolTable,
    pub mix: &'a SymbolTable,
    pub out: &'a SymbolTable,
    pub mode_64bit: bool,
}

impl EmitCtx<'_> {
    pub fn ref_name(&self, var_ref: &VarRef) -> String {
        match var_ref {
            VarRef::Inp(i) => self.inp.variables[*i].name.clone(),
            VarRef::Mix(i) => self.mix.variables[*i].name.clone(),
            VarRef::Local(name) => name.clone(),
            VarRef::InpMember(slot) => self.inp.member_name(self.arena, slot),
            VarRef::MixMember(slot) => self.mix.member_name(self.arena, slot),
            VarRef::OutMember(slot) => self.out.member_name(self.arena, slot),
        }
    }
}

pub trait Emit {
    fn emit(&self, e: &mut Emitter, ctx: &EmitCtx);
}

fn cast_if_needed(target: IntKind, expr: &Expr, ctx: &EmitCtx) -> String {
    let inner = emit_expr(expr, ctx);
    if expr.kind() == target {
        inner
    } else {
        format!("(({})({}))", target.spelling(), inner)
    }
}

/// Serializes an expression. Hazardous operations come out wrapped in
/// their defined-behavior form: divisors are forced non-zero with `| 1`
/// and shift amounts are masked to the compute width.
pub fn emit_expr(expr: &Expr, ctx: &EmitCtx) -> String {
    match expr {
        Expr::Const(v) => v.literal(ctx.mode_64bit),
        Expr::Ref(var_ref, _) => ctx.ref_name(var_ref),
        Expr::Unary { op, kind, arg } => match op {
            UnOp::Plus => format!("(+{})", cast_if_needed(*kind, arg, ctx)),
            UnOp::Neg => format!("(-{})", cast_if_needed(*kind, arg, ctx)),
            UnOp::BitNot => format!("(~{})", cast_if_needed(*kind, arg, ctx)),
            UnOp::LogNot => format!("(!{})", emit_expr(arg, ctx)),
        },
        Expr::Binary { op, kind, lhs, rhs } => {
            if op.is_logical() {
                return format!(
                    "({} {} {})",
                    emit_expr(lhs, ctx),
                    op.token(),
                    emit_expr(rhs, ctx)
                );
            }
            let operand_kind = if op.is_comparison() {
                IntKind::common_compute_kind(lhs.kind(), rhs.kind())
            } else {
                *kind
            };
            let l = cast_if_needed(operand_kind, lhs, ctx);
            let r = cast_if_needed(operand_kind, rhs, ctx);
            if op.needs_nonzero_rhs() {
                format!("({} {} ({} | 1{}))", l, op.token(), r, operand_kind.suffix())
            } else if op.is_shift() {
                let mask = operand_kind.bit_width(ctx.mode_64bit) - 1;
                format!(
                    "({} {} ({} & {}{}))",
                    l,
                    op.token(),
                    r,
                    mask,
                    operand_kind.suffix()
                )
            } else {
                format!("({} {} {})", l, op.token(), r)
            }
        }
    }
}

/// Serializes the value stored into a slot of `kind`: widened to
/// `unsigned long long`, masked into the slot's representable non-negative
/// range, then converted. The conversion is always in range, so it is
/// never implementation-defined.
pub fn emit_store(
    kind: IntKind,
    bit_width: Option<u32>,
    value: &Expr,
    ctx: &EmitCtx,
) -> String {
    let width = kind.bit_width(ctx.mode_64bit);
    let mask_bits = match bit_width {
        Some(w) if kind.is_signed() => w - 1,
        Some(w) => w,
        None if kind.is_signed() => width - 1,
        None => width,
    };
    let wide = cast_if_needed(IntKind::ULongLong, value, ctx);
    if mask_bits >= 64 {
        format!("({})({})", kind.spelling(), wide)
    } else {
        format!(
            "({})({} & 0x{:x}ULL)",
            kind.spelling(),
            wide,
            (1u128 << mask_bits) - 1
        )
    }
}

fn emit_braced(body: &[Stmt], e: &mut Emitter, ctx: &EmitCtx) {
    e.emit_line("{");
    e.enter_block();
    for stmt in body {
        stmt.emit(e, ctx);
    }
    e.exit_block();
    e.emit_line("}");
}

impl Emit for Stmt {
    fn emit(&self, e: &mut Emitter, ctx: &EmitCtx) {
        match self {
            Stmt::Decl { var, init } => {
                e.emit_line(&format!(
                    "{} {} = {};",
                    var.kind.spelling(),
                    var.name,
                    emit_store(var.kind, None, init, ctx)
                ));
            }
            Stmt::Assign {
                target,
                kind,
                bit_width,
                value,
            } => {
                e.emit_line(&format!(
                    "{} = {};",
                    ctx.ref_name(target),
                    emit_store(*kind, *bit_width, value, ctx)
                ));
            }
            Stmt::If { cond, then, els } => {
                e.emit_line(&format!("if ({})", emit_expr(cond, ctx)));
                emit_braced(then, e, ctx);
                if let Some(els) = els {
                    e.emit_line("else");
                    emit_braced(els, e, ctx);
                }
            }
            Stmt::Block(body) => emit_braced(body, e, ctx),
        }
    }
}

impl Emit for StructType {
    fn emit(&self, e: &mut Emitter, ctx: &EmitCtx) {
        e.emit_line(&format!("struct {} {{", self.name));
        e.enter_block();
        for field in &self.fields {
            let mut line = match field.ty {
                // A plain `int` bit-field has implementation-defined
                // signedness, so bit-fields always spell it out.
                FieldType::Scalar(IntKind::Int) if field.bit_width.is_some() => {
                    format!("signed int {}", field.name)
                }
                FieldType::Scalar(kind) => format!("{} {}", kind.spelling(), field.name),
                FieldType::Struct(id) => {
                    format!("struct {} {}", ctx.arena[id].name, field.name)
                }
            };
            if let Some(w) = field.bit_width {
                line.push_str(&format!(" : {w}"));
            }
            line.push(';');
            e.emit_line(&line);
        }
        e.exit_block();
        e.emit_line("};");
    }
}

/// Emits the whole body of `foo` as one braced block.
pub fn emit_function_body(body: &[Stmt], ctx: &EmitCtx) -> String {
    let mut e = Emitter::new();
    emit_braced(body, &mut e, ctx);
    e.finish()
}

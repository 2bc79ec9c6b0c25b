use la_arena::Arena;

use crate::context::{Context, ScopeStack};
use crate::policy::ExprKind;
use crate::random::RandGen;
use crate::symtab::{MemberSlot, NameSupply, SymbolTable};
use crate::types::{IntKind, StructType, TypedVal};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnOp {
    Plus,
    Neg,
    BitNot,
    LogNot,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    LogAnd,
    LogOr,
}

impl BinOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge | BinOp::Eq | BinOp::Ne
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinOp::LogAnd | BinOp::LogOr)
    }

    pub fn is_shift(self) -> bool {
        matches!(self, BinOp::Shl | BinOp::Shr)
    }

    pub fn needs_nonzero_rhs(self) -> bool {
        matches!(self, BinOp::Div | BinOp::Mod)
    }

    pub fn token(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::LogAnd => "&&",
            BinOp::LogOr => "||",
        }
    }
}

/// Reference to a visible value. Extern entities are identified by table
/// index (resolved against the owning table at emission), locals by name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VarRef {
    Inp(usize),
    Mix(usize),
    Local(String),
    InpMember(MemberSlot),
    MixMember(MemberSlot),
    OutMember(MemberSlot),
}

/// Expression tree. Every node owns its children exclusively; reuse from
/// the CSE pool clones, so this stays a tree, never a graph.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Const(TypedVal),
    Ref(VarRef, IntKind),
    Unary {
        op: UnOp,
        kind: IntKind,
        arg: Box<Expr>,
    },
    Binary {
        op: BinOp,
        kind: IntKind,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// Static result kind. Comparisons and logical operators yield `int`;
    /// arithmetic interior nodes carry their unsigned compute kind.
    pub fn kind(&self) -> IntKind {
        match self {
            Expr::Const(v) => v.kind,
            Expr::Ref(_, kind) => *kind,
            Expr::Unary { kind, .. } | Expr::Binary { kind, .. } => *kind,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Expr::Const(_) | Expr::Ref(..))
    }

    pub fn walk(&self, f: &mut impl FnMut(&Expr)) {
        f(self);
        match self {
            Expr::Unary { arg, .. } => arg.walk(f),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.walk(f);
                rhs.walk(f);
            }
            _ => {}
        }
    }

    /// Depth counted in operator nodes; terminals are depth zero.
    pub fn operator_depth(&self) -> u32 {
        match self {
            Expr::Const(_) | Expr::Ref(..) => 0,
            Expr::Unary { arg, .. } => 1 + arg.operator_depth(),
            Expr::Binary { lhs, rhs, .. } => 1 + lhs.operator_depth().max(rhs.operator_depth()),
        }
    }
}

/// Mutable generation state threaded alongside the immutable [`Context`]:
/// the randomness source, the read-only symbol tables, the local scope
/// stack, the name supply and the CSE reuse pool.
pub struct GenState<'a> {
    pub rng: &'a mut RandGen,
    pub arena: &'a Arena<StructType>,
    pub inp: &'a SymbolTable,
    pub mix: &'a SymbolTable,
    pub out: &'a SymbolTable,
    pub locals: ScopeStack,
    pub names: &'a mut NameSupply,
    pub cse: Vec<Expr>,
}

impl GenState<'_> {
    /// Everything the generated code may read, in a fixed enumeration
    /// order: input scalars, mixed scalars, input members, mixed members,
    /// then locals. The output pool is write-only and never appears.
    pub fn readable_refs(&self) -> Vec<(VarRef, IntKind)> {
        let mut refs = Vec::new();
        for (i, var) in self.inp.variables.iter().enumerate() {
            refs.push((VarRef::Inp(i), var.kind));
        }
        for (i, var) in self.mix.variables.iter().enumerate() {
            refs.push((VarRef::Mix(i), var.kind));
        }
        for slot in self.inp.scalar_members(self.arena) {
            let kind = slot.kind;
            refs.push((VarRef::InpMember(slot), kind));
        }
        for slot in self.mix.scalar_members(self.arena) {
            let kind = slot.kind;
            refs.push((VarRef::MixMember(slot), kind));
        }
        for binding in self.locals.visible() {
            refs.push((VarRef::Local(binding.name.clone()), binding.kind));
        }
        refs
    }

    /// Everything the generated code may write: mixed scalars, mixed and
    /// output members, then locals. Input entities never appear.
    pub fn assignable_slots(&self) -> Vec<(VarRef, IntKind, Option<u32>)> {
        let mut slots = Vec::new();
        for (i, var) in self.mix.variables.iter().enumerate() {
            if !var.is_const {
                slots.push((VarRef::Mix(i), var.kind, None));
            }
        }
        for slot in self.mix.scalar_members(self.arena) {
            let (kind, width) = (slot.kind, slot.bit_width);
            slots.push((VarRef::MixMember(slot), kind, width));
        }
        for slot in self.out.scalar_members(self.arena) {
            let (kind, width) = (slot.kind, slot.bit_width);
            slots.push((VarRef::OutMember(slot), kind, width));
        }
        for binding in self.locals.visible() {
            slots.push((VarRef::Local(binding.name.clone()), binding.kind, None));
        }
        slots
    }

    fn remember_cse(&mut self, max_cse_count: u32, expr: &Expr) {
        if self.cse.len() < max_cse_count as usize {
            self.cse.push(expr.clone());
        }
    }
}

/// Generates an expression feeding a value of `target` kind. The context
/// decides which forms are on offer; once depth narrowing has run its
/// course only terminals remain.
pub fn gen_expr(ctx: &Context, st: &mut GenState, target: IntKind) -> Expr {
    match st.rng.weighted(&ctx.policy.expr_kind_weights) {
        ExprKind::Const => gen_const(ctx, st, target),
        ExprKind::Var => gen_var_use(ctx, st, target),
        ExprKind::Unary => gen_unary(ctx, st, target),
        ExprKind::Binary => gen_binary(ctx, st, target),
        ExprKind::Cse => gen_cse_reuse(ctx, st, target),
    }
}

fn gen_const(ctx: &Context, st: &mut GenState, target: IntKind) -> Expr {
    Expr::Const(TypedVal::generate(target, ctx.policy.mode_64bit, st.rng))
}

fn gen_var_use(ctx: &Context, st: &mut GenState, target: IntKind) -> Expr {
    let all = st.readable_refs();
    if all.is_empty() {
        return gen_const(ctx, st, target);
    }
    // Prefer references that already have the target kind; fall back to
    // any visible scalar, the use site casts.
    let same_kind: Vec<_> = all.iter().filter(|(_, k)| *k == target).cloned().collect();
    let pool = if same_kind.is_empty() { all } else { same_kind };
    let idx = st.rng.uniform(0, pool.len() as u32 - 1) as usize;
    let (var_ref, kind) = pool[idx].clone();
    Expr::Ref(var_ref, kind)
}

fn gen_unary(ctx: &Context, st: &mut GenState, target: IntKind) -> Expr {
    let op = st.rng.weighted(&ctx.policy.unary_op_weights);
    let arg = gen_expr(&ctx.for_arith(), st, target);
    let kind = match op {
        UnOp::LogNot => IntKind::Int,
        _ => target.compute_kind(),
    };
    Expr::Unary {
        op,
        kind,
        arg: Box::new(arg),
    }
}

fn gen_binary(ctx: &Context, st: &mut GenState, target: IntKind) -> Expr {
    let op = st.rng.weighted(&ctx.policy.binary_op_weights);
    let operand_ctx = ctx.for_arith();
    let lhs = gen_expr(&operand_ctx, st, target);
    let rhs = gen_expr(&operand_ctx, st, target);
    let kind = if op.is_comparison() || op.is_logical() {
        IntKind::Int
    } else {
        target.compute_kind()
    };
    let expr = Expr::Binary {
        op,
        kind,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    };
    st.remember_cse(ctx.policy.max_cse_count, &expr);
    expr
}

/// Reuses a pooled subexpression of matching kind, provided it still fits
/// the remaining depth budget at this position; regenerates when the pool
/// has nothing suitable.
fn gen_cse_reuse(ctx: &Context, st: &mut GenState, target: IntKind) -> Expr {
    let wanted = target.compute_kind();
    let budget = ctx.policy.max_arith_depth.saturating_sub(ctx.arith_depth);
    let matches: Vec<usize> = st
        .cse
        .iter()
        .enumerate()
        .filter(|(_, e)| e.kind() == wanted && e.operator_depth() <= budget)
        .map(|(i, _)| i)
        .collect();
    if matches.is_empty() {
        return gen_binary(ctx, st, target);
    }
    let pick = st.rng.uniform(0, matches.len() as u32 - 1) as usize;
    st.cse[matches[pick]].clone()
}

/// Generates a branch condition. While operator nodes are on offer this is
/// a comparison over freshly drawn operands; under full narrowing it
/// degrades to a terminal tested for non-zero, so the depth contract holds
/// for conditions too.
pub fn gen_cond(ctx: &Context, st: &mut GenState) -> Expr {
    let expr_ctx = ctx.enter_expr();
    if !expr_ctx.policy.offers_expr(ExprKind::Binary) {
        return gen_expr(&expr_ctx, st, IntKind::Int);
    }
    let op = st.rng.weighted(&ctx.policy.cmp_op_weights);
    let operand_kind = st.rng.weighted(&ctx.policy.scalar_kind_weights);
    let operand_ctx = expr_ctx.for_arith();
    let lhs = gen_expr(&operand_ctx, st, operand_kind);
    let rhs = gen_expr(&operand_ctx, st, operand_kind);
    Expr::Binary {
        op,
        kind: IntKind::Int,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

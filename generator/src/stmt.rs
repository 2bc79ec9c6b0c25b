use crate::context::{Context, LocalBinding, NodeKind};
use crate::expr::{gen_cond, gen_expr, Expr, GenState, VarRef};
use crate::policy::StmtKind;
use crate::symtab::Variable;
use crate::types::IntKind;

/// Statement tree. A closed variant set; the heavy logic is in
/// construction, emission is a plain walk.
#[derive(Clone, Debug)]
pub enum Stmt {
    Decl {
        var: Variable,
        init: Expr,
    },
    Assign {
        target: VarRef,
        kind: IntKind,
        bit_width: Option<u32>,
        value: Expr,
    },
    If {
        cond: Expr,
        then: Vec<Stmt>,
        els: Option<Vec<Stmt>>,
    },
    Block(Vec<Stmt>),
}

impl Stmt {
    pub fn walk_exprs(&self, f: &mut impl FnMut(&Expr)) {
        match self {
            Stmt::Decl { init, .. } => init.walk(f),
            Stmt::Assign { value, .. } => value.walk(f),
            Stmt::If { cond, then, els } => {
                cond.walk(f);
                for stmt in then {
                    stmt.walk_exprs(f);
                }
                if let Some(els) = els {
                    for stmt in els {
                        stmt.walk_exprs(f);
                    }
                }
            }
            Stmt::Block(body) => {
                for stmt in body {
                    stmt.walk_exprs(f);
                }
            }
        }
    }
}

/// Generates one scope's worth of statements. The scope owns a frame on
/// the local stack and a watermark into the CSE pool, so nothing declared
/// or memoized inside leaks out to siblings.
pub fn gen_scope(ctx: &Context, st: &mut GenState) -> Vec<Stmt> {
    st.locals.push_scope();
    let cse_mark = st.cse.len();

    let count = st
        .rng
        .uniform(ctx.policy.min_scope_stmt_count, ctx.policy.max_scope_stmt_count);
    let mut body = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let stmt = match st.rng.weighted(&ctx.policy.stmt_kind_weights) {
            StmtKind::Decl => gen_decl(ctx, st),
            StmtKind::Assign => gen_assign(ctx, st),
            StmtKind::Scope => Stmt::Block(gen_scope(&ctx.for_scope(), st)),
            StmtKind::If => gen_if(ctx, st),
        };
        body.push(stmt);
    }

    st.cse.truncate(cse_mark);
    st.locals.pop_scope();
    body
}

/// Declares a fresh local. The initializer is generated before the name is
/// bound, so it can see everything already visible but never the variable
/// it initializes.
fn gen_decl(ctx: &Context, st: &mut GenState) -> Stmt {
    let dctx = ctx.for_stmt(NodeKind::Decl);
    let kind = st.rng.weighted(&dctx.policy.scalar_kind_weights);
    let init = gen_expr(&dctx.enter_expr(), st, kind);
    let var = Variable {
        name: st.names.next_var(),
        kind,
        is_const: false,
        init: None,
    };
    st.locals.bind(LocalBinding {
        name: var.name.clone(),
        kind,
    });
    Stmt::Decl { var, init }
}

/// Assigns to a mixed scalar, a mixed/output struct member, or a local.
/// When nothing is assignable yet the statement degrades to a declaration,
/// which makes a target available for the rest of the scope.
fn gen_assign(ctx: &Context, st: &mut GenState) -> Stmt {
    let slots = st.assignable_slots();
    if slots.is_empty() {
        return gen_decl(ctx, st);
    }
    let actx = ctx.for_stmt(NodeKind::Assign);
    let idx = st.rng.uniform(0, slots.len() as u32 - 1) as usize;
    let (target, kind, bit_width) = slots[idx].clone();
    let value = gen_expr(&actx.enter_expr(), st, kind);
    Stmt::Assign {
        target,
        kind,
        bit_width,
        value,
    }
}

fn gen_if(ctx: &Context, st: &mut GenState) -> Stmt {
    let cond = gen_cond(ctx, st);
    let then = gen_scope(&ctx.for_if(), st);
    let els = if st.rng.weighted(&ctx.policy.else_branch_weights) {
        Some(gen_scope(&ctx.for_if(), st))
    } else {
        None
    };
    Stmt::If { cond, then, els }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::context::ScopeStack;
    use crate::options::Options;
    use crate::policy::GenPolicy;
    use crate::random::RandGen;
    use crate::symtab::{NameSupply, SymbolTable};
    use crate::types::{StructType, TypedVal};
    use la_arena::Arena;
    use std::collections::HashSet;

    fn gen_root(opts: &Options, seed: u64) -> Vec<Stmt> {
        let arena: Arena<StructType> = Arena::new();
        let mut inp = SymbolTable::default();
        let mut mix = SymbolTable::default();
        let out = SymbolTable::default();
        inp.add_variable(Variable {
            name: "var_1".into(),
            kind: IntKind::UInt,
            is_const: true,
            init: Some(TypedVal::zero(IntKind::UInt)),
        });
        mix.add_variable(Variable {
            name: "var_2".into(),
            kind: IntKind::LongLong,
            is_const: false,
            init: Some(TypedVal::zero(IntKind::LongLong)),
        });
        let mut rng = RandGen::new(seed);
        let mut names = NameSupply::default();
        // Extern names var_1/var_2 are taken.
        names.next_var();
        names.next_var();
        let mut st = GenState {
            rng: &mut rng,
            arena: &arena,
            inp: &inp,
            mix: &mix,
            out: &out,
            locals: ScopeStack::default(),
            names: &mut names,
            cse: Vec::new(),
        };
        gen_scope(&Context::root(GenPolicy::from_options(opts)), &mut st)
    }

    fn stmt_count_bounds(body: &[Stmt], opts: &Options) {
        let n = body.len() as u32;
        assert!(n >= opts.min_scope_stmt_count && n <= opts.max_scope_stmt_count);
        for stmt in body {
            match stmt {
                Stmt::Block(inner) => stmt_count_bounds(inner, opts),
                Stmt::If { then, els, .. } => {
                    stmt_count_bounds(then, opts);
                    if let Some(els) = els {
                        stmt_count_bounds(els, opts);
                    }
                }
                _ => {}
            }
        }
    }

    fn max_if_depth(body: &[Stmt]) -> u32 {
        body.iter()
            .map(|stmt| match stmt {
                Stmt::If { then, els, .. } => {
                    let t = max_if_depth(then);
                    let e = els.as_deref().map(max_if_depth).unwrap_or(0);
                    1 + t.max(e)
                }
                Stmt::Block(inner) => max_if_depth(inner),
                _ => 0,
            })
            .max()
            .unwrap_or(0)
    }

    /// Replays scope visibility over the finished tree and demands every
    /// local reference is declared earlier in an enclosing scope.
    fn check_no_forward_refs(body: &[Stmt], visible: &mut Vec<String>) {
        let mark = visible.len();
        for stmt in body {
            match stmt {
                Stmt::Decl { var, init } => {
                    assert_locals_visible(init, visible);
                    visible.push(var.name.clone());
                }
                Stmt::Assign { target, value, .. } => {
                    if let VarRef::Local(name) = target {
                        assert!(visible.contains(name), "assignment to unseen {name}");
                    }
                    assert_locals_visible(value, visible);
                }
                Stmt::If { cond, then, els } => {
                    assert_locals_visible(cond, visible);
                    check_no_forward_refs(then, visible);
                    if let Some(els) = els {
                        check_no_forward_refs(els, visible);
                    }
                }
                Stmt::Block(inner) => check_no_forward_refs(inner, visible),
            }
        }
        visible.truncate(mark);
    }

    fn assert_locals_visible(expr: &Expr, visible: &[String]) {
        expr.walk(&mut |node| {
            if let Expr::Ref(VarRef::Local(name), _) = node {
                assert!(visible.contains(name), "forward reference to {name}");
            }
        });
    }

    #[test]
    fn scope_counts_respect_configuration() {
        let opts = Options::default();
        for seed in [97, 101, 103] {
            stmt_count_bounds(&gen_root(&opts, seed), &opts);
        }
    }

    #[test]
    fn conditional_nesting_is_bounded() {
        let opts = Options::default();
        for seed in [107, 109, 113] {
            assert!(max_if_depth(&gen_root(&opts, seed)) <= opts.max_if_depth);
        }
        let mut flat = Options::default();
        flat.max_if_depth = 1;
        for seed in [127, 131] {
            assert!(max_if_depth(&gen_root(&flat, seed)) <= 1);
        }
    }

    #[test]
    fn no_forward_references() {
        for seed in [137, 139, 149] {
            let body = gen_root(&Options::default(), seed);
            check_no_forward_refs(&body, &mut Vec::new());
        }
    }

    #[test]
    fn assignments_never_target_input_pool() {
        for seed in [151, 157] {
            let body = gen_root(&Options::default(), seed);
            fn check(body: &[Stmt]) {
                for stmt in body {
                    match stmt {
                        Stmt::Assign { target, .. } => {
                            assert!(
                                !matches!(target, VarRef::Inp(_) | VarRef::InpMember(_)),
                                "write into the input pool"
                            );
                        }
                        Stmt::If { then, els, .. } => {
                            check(then);
                            if let Some(els) = els {
                                check(els);
                            }
                        }
                        Stmt::Block(inner) => check(inner),
                        _ => {}
                    }
                }
            }
            check(&body);
        }
    }

    #[test]
    fn local_names_are_unique() {
        let body = gen_root(&Options::default(), 163);
        let mut seen = HashSet::new();
        fn collect(body: &[Stmt], seen: &mut HashSet<String>) {
            for stmt in body {
                match stmt {
                    Stmt::Decl { var, .. } => {
                        assert!(seen.insert(var.name.clone()), "duplicate {}", var.name);
                    }
                    Stmt::If { then, els, .. } => {
                        collect(then, seen);
                        if let Some(els) = els {
                            collect(els, seen);
                        }
                    }
                    Stmt::Block(inner) => collect(inner, seen),
                    _ => {}
                }
            }
        }
        collect(&body, &mut seen);
    }
}

use crate::expr::{BinOp, UnOp};
use crate::options::Options;
use crate::types::IntKind;

/// Statement forms a scope can draw from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StmtKind {
    Decl,
    Assign,
    Scope,
    If,
}

/// Expression forms a generation step can draw from. `Const` and `Var` are
/// the terminal forms; depth narrowing reduces the distribution to them.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExprKind {
    Const,
    Var,
    Unary,
    Binary,
    Cse,
}

/// A value snapshot of distribution weights, capability flags and
/// structural limits. Contexts clone and narrow it on derivation; a child
/// never mutates a policy a sibling can see.
#[derive(Clone, Debug)]
pub struct GenPolicy {
    pub mode_64bit: bool,

    pub allow_const: bool,
    pub allow_struct: bool,
    pub allow_arrays: bool,
    pub allow_bit_fields: bool,

    pub max_arith_depth: u32,
    pub max_if_depth: u32,
    pub min_scope_stmt_count: u32,
    pub max_scope_stmt_count: u32,
    pub max_cse_count: u32,
    pub min_struct_field_count: u32,
    pub max_struct_field_count: u32,

    pub stmt_kind_weights: Vec<(StmtKind, u32)>,
    pub expr_kind_weights: Vec<(ExprKind, u32)>,
    pub scalar_kind_weights: Vec<(IntKind, u32)>,
    pub unary_op_weights: Vec<(UnOp, u32)>,
    pub binary_op_weights: Vec<(BinOp, u32)>,
    pub cmp_op_weights: Vec<(BinOp, u32)>,

    pub nested_field_weights: Vec<(bool, u32)>,
    pub bit_field_weights: Vec<(bool, u32)>,
    pub const_var_weights: Vec<(bool, u32)>,
    pub else_branch_weights: Vec<(bool, u32)>,
}

impl GenPolicy {
    pub fn from_options(opts: &Options) -> GenPolicy {
        let mut policy = GenPolicy {
            mode_64bit: opts.mode_64bit,

            allow_const: false,
            allow_struct: opts.max_struct_type_count > 0,
            allow_arrays: opts.enable_arrays,
            allow_bit_fields: opts.enable_bit_fields,

            max_arith_depth: opts.max_arith_depth,
            max_if_depth: opts.max_if_depth,
            min_scope_stmt_count: opts.min_scope_stmt_count,
            max_scope_stmt_count: opts.max_scope_stmt_count,
            max_cse_count: opts.max_cse_count,
            min_struct_field_count: 1,
            max_struct_field_count: 6,

            stmt_kind_weights: vec![
                (StmtKind::Decl, 3),
                (StmtKind::Assign, 4),
                (StmtKind::Scope, 1),
                (StmtKind::If, 2),
            ],
            expr_kind_weights: vec![
                (ExprKind::Const, 2),
                (ExprKind::Var, 3),
                (ExprKind::Unary, 2),
                (ExprKind::Binary, 5),
                (ExprKind::Cse, 1),
            ],
            scalar_kind_weights: vec![
                (IntKind::Char, 2),
                (IntKind::UChar, 2),
                (IntKind::Short, 2),
                (IntKind::UShort, 2),
                (IntKind::Int, 4),
                (IntKind::UInt, 4),
                (IntKind::Long, 2),
                (IntKind::ULong, 2),
                (IntKind::LongLong, 2),
                (IntKind::ULongLong, 2),
            ],
            unary_op_weights: vec![
                (UnOp::Plus, 1),
                (UnOp::Neg, 2),
                (UnOp::BitNot, 2),
                (UnOp::LogNot, 1),
            ],
            binary_op_weights: vec![
                (BinOp::Add, 4),
                (BinOp::Sub, 4),
                (BinOp::Mul, 3),
                (BinOp::Div, 2),
                (BinOp::Mod, 2),
                (BinOp::Shl, 1),
                (BinOp::Shr, 1),
                (BinOp::BitAnd, 2),
                (BinOp::BitOr, 2),
                (BinOp::BitXor, 2),
                (BinOp::Lt, 1),
                (BinOp::Gt, 1),
                (BinOp::Le, 1),
                (BinOp::Ge, 1),
                (BinOp::Eq, 1),
                (BinOp::Ne, 1),
                (BinOp::LogAnd, 1),
                (BinOp::LogOr, 1),
            ],
            cmp_op_weights: vec![
                (BinOp::Lt, 2),
                (BinOp::Gt, 2),
                (BinOp::Le, 1),
                (BinOp::Ge, 1),
                (BinOp::Eq, 1),
                (BinOp::Ne, 2),
            ],

            nested_field_weights: vec![(true, 1), (false, 3)],
            bit_field_weights: vec![(true, 1), (false, 2)],
            const_var_weights: vec![(true, 1), (false, 1)],
            else_branch_weights: vec![(true, 1), (false, 1)],
        };
        // A zero nesting bound means the forms are not offered at all, not
        // narrowed one level down.
        if policy.max_if_depth == 0 {
            policy.forbid_if();
            policy.forbid_scope();
        }
        policy
    }

    pub fn with_const_allowed(mut self, allow: bool) -> GenPolicy {
        self.allow_const = allow;
        self
    }

    pub fn with_bit_fields(mut self, allow: bool) -> GenPolicy {
        self.allow_bit_fields = allow;
        self
    }

    /// Leaves only terminal expression forms in the distribution. Applied
    /// by context derivation once the arithmetic depth bound is reached.
    pub fn narrow_to_terminal_exprs(&mut self) {
        self.expr_kind_weights
            .retain(|(kind, _)| matches!(kind, ExprKind::Const | ExprKind::Var));
    }

    /// Removes conditional statements from the distribution.
    pub fn forbid_if(&mut self) {
        self.stmt_kind_weights.retain(|(kind, _)| *kind != StmtKind::If);
    }

    /// Removes bare nested scopes from the distribution.
    pub fn forbid_scope(&mut self) {
        self.stmt_kind_weights.retain(|(kind, _)| *kind != StmtKind::Scope);
    }

    pub fn offers_stmt(&self, kind: StmtKind) -> bool {
        self.stmt_kind_weights.iter().any(|(k, w)| *k == kind && *w > 0)
    }

    pub fn offers_expr(&self, kind: ExprKind) -> bool {
        self.expr_kind_weights.iter().any(|(k, w)| *k == kind && *w > 0)
    }
}

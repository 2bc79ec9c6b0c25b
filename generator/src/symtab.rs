use la_arena::Arena;

use crate::context::Context;
use crate::random::RandGen;
use crate::types::{FieldType, IntKind, StructType, StructTypeId, TypedVal};

/// Deterministic name allocation. One supply per run; every generated
/// entity draws from it in generation order.
#[derive(Default)]
pub struct NameSupply {
    vars: u32,
    struct_types: u32,
    struct_objs: u32,
}

impl NameSupply {
    pub fn next_var(&mut self) -> String {
        self.vars += 1;
        format!("var_{}", self.vars)
    }

    pub fn next_struct_type(&mut self) -> String {
        self.struct_types += 1;
        format!("struct_{}", self.struct_types)
    }

    pub fn next_struct_obj(&mut self) -> String {
        self.struct_objs += 1;
        format!("struct_obj_{}", self.struct_objs)
    }
}

/// A declared scalar variable. Externally-pooled variables always carry an
/// initial value; locally declared ones keep their initializer expression
/// in the declaration statement instead.
#[derive(Clone, Debug)]
pub struct Variable {
    pub name: String,
    pub kind: IntKind,
    pub is_const: bool,
    pub init: Option<TypedVal>,
}

impl Variable {
    pub fn generate(ctx: &Context, rng: &mut RandGen, names: &mut NameSupply) -> Variable {
        let kind = rng.weighted(&ctx.policy.scalar_kind_weights);
        let is_const = ctx.policy.allow_const && rng.weighted(&ctx.policy.const_var_weights);
        let init = TypedVal::generate(kind, ctx.policy.mode_64bit, rng);
        Variable {
            name: names.next_var(),
            kind,
            is_const,
            init: Some(init),
        }
    }
}

/// Per-field initial values of a struct instance, parallel to the type's
/// field list.
#[derive(Clone, Debug)]
pub enum FieldInit {
    Scalar(TypedVal),
    Nested(Vec<FieldInit>),
}

/// An instance of a registered struct type.
#[derive(Clone, Debug)]
pub struct StructInstance {
    pub name: String,
    pub ty: StructTypeId,
    pub inits: Vec<FieldInit>,
}

impl StructInstance {
    pub fn generate(
        ctx: &Context,
        rng: &mut RandGen,
        arena: &Arena<StructType>,
        ty: StructTypeId,
        names: &mut NameSupply,
    ) -> StructInstance {
        StructInstance {
            name: names.next_struct_obj(),
            ty,
            inits: generate_field_inits(ctx, rng, arena, ty),
        }
    }
}

fn generate_field_inits(
    ctx: &Context,
    rng: &mut RandGen,
    arena: &Arena<StructType>,
    ty: StructTypeId,
) -> Vec<FieldInit> {
    arena[ty]
        .fields
        .iter()
        .map(|field| match field.ty {
            FieldType::Scalar(kind) => {
                let (lo, hi) = field
                    .value_range(ctx.policy.mode_64bit)
                    .expect("scalar field has a value range");
                FieldInit::Scalar(TypedVal {
                    kind,
                    val: rng.uniform_wide(lo, hi),
                })
            }
            FieldType::Struct(nested) => {
                FieldInit::Nested(generate_field_inits(ctx, rng, arena, nested))
            }
        })
        .collect()
}

/// A scalar slot reachable through a struct instance: the instance index,
/// the field path into (possibly nested) struct types, and the slot's kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberSlot {
    pub struct_idx: usize,
    pub path: Vec<usize>,
    pub kind: IntKind,
    pub bit_width: Option<u32>,
}

/// One visibility pool: declared scalars, struct instances, and the struct
/// types visible to it. Backed by `Vec`s throughout, so every enumeration
/// is in declaration order.
#[derive(Default)]
pub struct SymbolTable {
    pub variables: Vec<Variable>,
    pub structs: Vec<StructInstance>,
    pub struct_types: Vec<StructTypeId>,
}

impl SymbolTable {
    pub fn add_variable(&mut self, var: Variable) {
        self.variables.push(var);
    }

    pub fn add_struct(&mut self, instance: StructInstance) {
        self.structs.push(instance);
    }

    pub fn add_struct_type(&mut self, ty: StructTypeId) {
        self.struct_types.push(ty);
    }

    /// Every scalar slot reachable through this table's struct instances,
    /// in instance order and depth-first field order.
    pub fn scalar_members(&self, arena: &Arena<StructType>) -> Vec<MemberSlot> {
        let mut slots = Vec::new();
        for (struct_idx, instance) in self.structs.iter().enumerate() {
            collect_members(arena, instance.ty, struct_idx, &mut Vec::new(), &mut slots);
        }
        slots
    }

    /// Source-text name of a member slot, e.g. `struct_obj_2.member_1`.
    pub fn member_name(&self, arena: &Arena<StructType>, slot: &MemberSlot) -> String {
        let instance = &self.structs[slot.struct_idx];
        let mut name = instance.name.clone();
        let mut ty = instance.ty;
        for &field_idx in &slot.path {
            let field = &arena[ty].fields[field_idx];
            name.push('.');
            name.push_str(&field.name);
            if let FieldType::Struct(nested) = field.ty {
                ty = nested;
            }
        }
        name
    }
}

fn collect_members(
    arena: &Arena<StructType>,
    ty: StructTypeId,
    struct_idx: usize,
    path: &mut Vec<usize>,
    slots: &mut Vec<MemberSlot>,
) {
    for (field_idx, field) in arena[ty].fields.iter().enumerate() {
        path.push(field_idx);
        match field.ty {
            FieldType::Scalar(kind) => slots.push(MemberSlot {
                struct_idx,
                path: path.clone(),
                kind,
                bit_width: field.bit_width,
            }),
            FieldType::Struct(nested) => collect_members(arena, nested, struct_idx, path, slots),
        }
        path.pop();
    }
}

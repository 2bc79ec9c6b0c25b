use la_arena::Idx;

use crate::context::Context;
use crate::random::RandGen;
use crate::symtab::NameSupply;

/// Integer scalar kinds the generator can hand out.
///
/// Plain `char` is deliberately absent: its signedness is
/// implementation-defined, so the generator always spells `signed char`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IntKind {
    Char,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    LongLong,
    ULongLong,
}

impl IntKind {
    pub const ALL: [IntKind; 10] = [
        IntKind::Char,
        IntKind::UChar,
        IntKind::Short,
        IntKind::UShort,
        IntKind::Int,
        IntKind::UInt,
        IntKind::Long,
        IntKind::ULong,
        IntKind::LongLong,
        IntKind::ULongLong,
    ];

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            IntKind::Char | IntKind::Short | IntKind::Int | IntKind::Long | IntKind::LongLong
        )
    }

    /// Width in bits. `long` follows the bit mode (LP64 in 64-bit mode).
    pub fn bit_width(self, mode_64bit: bool) -> u32 {
        match self {
            IntKind::Char | IntKind::UChar => 8,
            IntKind::Short | IntKind::UShort => 16,
            IntKind::Int | IntKind::UInt => 32,
            IntKind::Long | IntKind::ULong => {
                if mode_64bit {
                    64
                } else {
                    32
                }
            }
            IntKind::LongLong | IntKind::ULongLong => 64,
        }
    }

    pub fn min_val(self, mode_64bit: bool) -> i128 {
        if self.is_signed() {
            -(1i128 << (self.bit_width(mode_64bit) - 1))
        } else {
            0
        }
    }

    pub fn max_val(self, mode_64bit: bool) -> i128 {
        if self.is_signed() {
            (1i128 << (self.bit_width(mode_64bit) - 1)) - 1
        } else {
            (1i128 << self.bit_width(mode_64bit)) - 1
        }
    }

    /// Conversion rank. Total over all kinds; signed and unsigned
    /// counterparts share a rank, mirroring the C rank rules.
    pub fn rank(self) -> u32 {
        match self {
            IntKind::Char | IntKind::UChar => 1,
            IntKind::Short | IntKind::UShort => 2,
            IntKind::Int | IntKind::UInt => 3,
            IntKind::Long | IntKind::ULong => 4,
            IntKind::LongLong | IntKind::ULongLong => 5,
        }
    }

    pub fn unsigned_counterpart(self) -> IntKind {
        match self {
            IntKind::Char | IntKind::UChar => IntKind::UChar,
            IntKind::Short | IntKind::UShort => IntKind::UShort,
            IntKind::Int | IntKind::UInt => IntKind::UInt,
            IntKind::Long | IntKind::ULong => IntKind::ULong,
            IntKind::LongLong | IntKind::ULongLong => IntKind::ULongLong,
        }
    }

    pub fn spelling(self) -> &'static str {
        match self {
            IntKind::Char => "signed char",
            IntKind::UChar => "unsigned char",
            IntKind::Short => "short",
            IntKind::UShort => "unsigned short",
            IntKind::Int => "int",
            IntKind::UInt => "unsigned int",
            IntKind::Long => "long int",
            IntKind::ULong => "unsigned long int",
            IntKind::LongLong => "long long int",
            IntKind::ULongLong => "unsigned long long int",
        }
    }

    /// Literal suffix. Kinds below `int` promote, so they carry none.
    pub fn suffix(self) -> &'static str {
        match self {
            IntKind::Char | IntKind::Short | IntKind::Int => "",
            IntKind::UChar | IntKind::UShort | IntKind::UInt => "U",
            IntKind::Long => "L",
            IntKind::ULong => "UL",
            IntKind::LongLong => "LL",
            IntKind::ULongLong => "ULL",
        }
    }

    /// The kind every interior arithmetic node computes in when its result
    /// feeds a value of `self`: the unsigned counterpart, widened to at
    /// least `unsigned int` so no operand ever promotes to plain `int`.
    pub fn compute_kind(self) -> IntKind {
        if self.rank() < IntKind::Int.rank() {
            IntKind::UInt
        } else {
            self.unsigned_counterpart()
        }
    }

    /// Common compute kind for a pair of operands.
    pub fn common_compute_kind(a: IntKind, b: IntKind) -> IntKind {
        if a.rank() >= b.rank() {
            a.compute_kind()
        } else {
            b.compute_kind()
        }
    }
}

/// A constant that always fits its kind's representable range.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TypedVal {
    pub kind: IntKind,
    pub val: i128,
}

impl TypedVal {
    pub fn zero(kind: IntKind) -> TypedVal {
        TypedVal { kind, val: 0 }
    }

    pub fn generate(kind: IntKind, mode_64bit: bool, rng: &mut RandGen) -> TypedVal {
        let val = rng.uniform_wide(kind.min_val(mode_64bit), kind.max_val(mode_64bit));
        TypedVal { kind, val }
    }

    /// Source-text literal. The most negative value of a signed kind is
    /// spelled `(-MAX - 1)` because its magnitude has no literal of its
    /// own type.
    pub fn literal(self, mode_64bit: bool) -> String {
        let suffix = self.kind.suffix();
        if self.kind.is_signed() && self.val == self.kind.min_val(mode_64bit) {
            let max = self.kind.max_val(mode_64bit);
            format!("(-{max}{suffix} - 1{suffix})")
        } else if self.val < 0 {
            format!("(-{}{})", -self.val, suffix)
        } else {
            format!("{}{}", self.val, suffix)
        }
    }
}

pub type StructTypeId = Idx<StructType>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldType {
    Scalar(IntKind),
    /// Handle to a previously registered type; a type under construction is
    /// never in the candidate set, so field graphs are acyclic.
    Struct(StructTypeId),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: FieldType,
    /// Bit-field width; only ever set on `int`/`unsigned int` fields.
    pub bit_width: Option<u32>,
}

impl Field {
    /// Range of values a scalar field can hold, accounting for bit-fields.
    pub fn value_range(&self, mode_64bit: bool) -> Option<(i128, i128)> {
        match self.ty {
            FieldType::Scalar(kind) => Some(match self.bit_width {
                Some(w) if kind.is_signed() => (-(1i128 << (w - 1)), (1i128 << (w - 1)) - 1),
                Some(w) => (0, (1i128 << w) - 1),
                None => (kind.min_val(mode_64bit), kind.max_val(mode_64bit)),
            }),
            FieldType::Struct(_) => None,
        }
    }
}

/// A named, immutable field list. Registered once in the program's arena
/// and shared by handle across all three symbol tables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructType {
    pub name: String,
    pub fields: Vec<Field>,
}

impl StructType {
    pub fn generate(
        ctx: &Context,
        rng: &mut RandGen,
        existing: &[StructTypeId],
        names: &mut NameSupply,
    ) -> StructType {
        let policy = &ctx.policy;
        let field_count = rng.uniform(policy.min_struct_field_count, policy.max_struct_field_count);
        let mut fields = Vec::with_capacity(field_count as usize);
        for member_idx in 1..=field_count {
            let nested = policy.allow_struct
                && !existing.is_empty()
                && rng.weighted(&policy.nested_field_weights);
            let (ty, bit_width) = if nested {
                let type_idx = rng.uniform(0, existing.len() as u32 - 1);
                (FieldType::Struct(existing[type_idx as usize]), None)
            } else {
                let kind = rng.weighted(&policy.scalar_kind_weights);
                let bit_width = if policy.allow_bit_fields
                    && matches!(kind, IntKind::Int | IntKind::UInt)
                    && rng.weighted(&policy.bit_field_weights)
                {
                    Some(rng.uniform(1, 31))
                } else {
                    None
                };
                (FieldType::Scalar(kind), bit_width)
            };
            fields.push(Field {
                name: format!("member_{member_idx}"),
                ty,
                bit_width,
            });
        }
        StructType {
            name: names.next_struct_type(),
            fields,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::context::Context;
    use crate::options::Options;
    use crate::policy::GenPolicy;
    use la_arena::Arena;

    #[test]
    fn rank_order_is_total() {
        for kind in IntKind::ALL {
            assert_eq!(kind.rank(), kind.unsigned_counterpart().rank());
        }
        assert!(IntKind::Char.rank() < IntKind::Short.rank());
        assert!(IntKind::Short.rank() < IntKind::Int.rank());
        assert!(IntKind::Int.rank() < IntKind::Long.rank());
        assert!(IntKind::Long.rank() < IntKind::LongLong.rank());
    }

    #[test]
    fn ranges_match_widths() {
        assert_eq!(IntKind::UChar.max_val(true), 255);
        assert_eq!(IntKind::Char.min_val(true), -128);
        assert_eq!(IntKind::UInt.max_val(true), u32::MAX as i128);
        assert_eq!(IntKind::ULongLong.max_val(true), u64::MAX as i128);
        assert_eq!(IntKind::LongLong.min_val(true), i64::MIN as i128);
    }

    #[test]
    fn long_width_follows_bit_mode() {
        assert_eq!(IntKind::Long.bit_width(true), 64);
        assert_eq!(IntKind::Long.bit_width(false), 32);
        assert_eq!(IntKind::ULong.max_val(false), u32::MAX as i128);
        assert_eq!(IntKind::Int.bit_width(false), 32);
    }

    #[test]
    fn compute_kind_is_unsigned_and_wide_enough() {
        for kind in IntKind::ALL {
            let ck = kind.compute_kind();
            assert!(!ck.is_signed());
            assert!(ck.rank() >= IntKind::Int.rank());
            assert!(ck.rank() >= kind.rank() || kind.rank() < IntKind::Int.rank());
        }
        assert_eq!(IntKind::Char.compute_kind(), IntKind::UInt);
        assert_eq!(IntKind::Long.compute_kind(), IntKind::ULong);
        assert_eq!(
            IntKind::common_compute_kind(IntKind::Char, IntKind::ULongLong),
            IntKind::ULongLong
        );
    }

    #[test]
    fn literal_of_most_negative_value_avoids_overflow() {
        let v = TypedVal {
            kind: IntKind::LongLong,
            val: i64::MIN as i128,
        };
        assert_eq!(v.literal(true), "(-9223372036854775807LL - 1LL)");
        let c = TypedVal {
            kind: IntKind::Char,
            val: -128,
        };
        assert_eq!(c.literal(true), "(-127 - 1)");
    }

    #[test]
    fn literal_suffixes() {
        let v = TypedVal {
            kind: IntKind::ULongLong,
            val: u64::MAX as i128,
        };
        assert_eq!(v.literal(true), "18446744073709551615ULL");
        let n = TypedVal {
            kind: IntKind::Int,
            val: -42,
        };
        assert_eq!(n.literal(true), "(-42)");
    }

    #[test]
    fn generated_values_fit_kind() {
        let mut rng = RandGen::new(17);
        for kind in IntKind::ALL {
            for _ in 0..64 {
                let v = TypedVal::generate(kind, true, &mut rng);
                assert!(v.val >= kind.min_val(true) && v.val <= kind.max_val(true));
            }
        }
    }

    #[test]
    fn struct_fields_reference_only_existing_types() {
        let opts = Options::default();
        let policy = GenPolicy::from_options(&opts).with_bit_fields(true);
        let ctx = Context::root(policy);
        let mut rng = RandGen::new(23);
        let mut names = NameSupply::default();
        let mut arena: Arena<StructType> = Arena::new();
        let mut registered: Vec<StructTypeId> = Vec::new();

        for _ in 0..12 {
            let st = StructType::generate(&ctx, &mut rng, &registered, &mut names);
            for field in &st.fields {
                if let FieldType::Struct(id) = field.ty {
                    assert!(registered.contains(&id), "field references unregistered type");
                }
                if let Some(w) = field.bit_width {
                    assert!((1..=31).contains(&w));
                    assert!(matches!(
                        field.ty,
                        FieldType::Scalar(IntKind::Int) | FieldType::Scalar(IntKind::UInt)
                    ));
                }
            }
            registered.push(arena.alloc(st));
        }

        let unique: std::collections::HashSet<_> =
            arena.iter().map(|(_, st)| st.name.clone()).collect();
        assert_eq!(unique.len(), 12, "struct type names must be unique");
    }

    #[test]
    fn bit_field_value_ranges() {
        let f = Field {
            name: "member_1".into(),
            ty: FieldType::Scalar(IntKind::UInt),
            bit_width: Some(5),
        };
        assert_eq!(f.value_range(true), Some((0, 31)));
        let g = Field {
            name: "member_2".into(),
            ty: FieldType::Scalar(IntKind::Int),
            bit_width: Some(4),
        };
        assert_eq!(g.value_range(true), Some((-8, 7)));
    }
}

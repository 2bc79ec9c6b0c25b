use std::fs;
use std::path::Path;

use la_arena::Arena;
use tracing::debug;

use crate::context::{Context, ScopeStack};
use crate::emit::{emit_function_body, Emit, EmitCtx, Emitter};
use crate::error::Result;
use crate::expr::GenState;
use crate::options::Options;
use crate::policy::GenPolicy;
use crate::random::RandGen;
use crate::stmt::{gen_scope, Stmt};
use crate::symtab::{FieldInit, NameSupply, StructInstance, SymbolTable, Variable};
use crate::types::{FieldType, StructType};

/// Owns the three symbol tables, the shared struct-type arena and the
/// generated function body; sequences population, generation and emission.
pub struct Program {
    pub options: Options,
    pub arena: Arena<StructType>,
    pub inp: SymbolTable,
    pub mix: SymbolTable,
    pub out: SymbolTable,
    pub function: Vec<Stmt>,
    seed: u64,
}

impl Program {
    pub fn generate(options: Options, rng: &mut RandGen) -> Result<Program> {
        options.validate()?;

        let mut names = NameSupply::default();
        let mut arena = Arena::new();
        let mut inp = SymbolTable::default();
        let mut mix = SymbolTable::default();
        let mut out = SymbolTable::default();

        populate_extern_tables(
            &options, rng, &mut arena, &mut inp, &mut mix, &mut out, &mut names,
        );

        debug!("generating function body");
        let function = {
            let mut state = GenState {
                rng: &mut *rng,
                arena: &arena,
                inp: &inp,
                mix: &mix,
                out: &out,
                locals: ScopeStack::default(),
                names: &mut names,
                cse: Vec::new(),
            };
            gen_scope(&Context::root(GenPolicy::from_options(&options)), &mut state)
        };

        Ok(Program {
            options,
            arena,
            inp,
            mix,
            out,
            function,
            seed: rng.seed(),
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn emit_ctx(&self) -> EmitCtx<'_> {
        EmitCtx {
            arena: &self.arena,
            inp: &self.inp,
            mix: &self.mix,
            out: &self.out,
            mode_64bit: self.options.mode_64bit,
        }
    }

    /// The extern declarations header, `init.h`.
    pub fn emit_decl(&self) -> String {
        let ctx = self.emit_ctx();
        let mut e = Emitter::new();
        e.emit_line("void hash(unsigned long long int *seed, unsigned long long int const v);");
        e.blank();

        for table in [&self.inp, &self.mix, &self.out] {
            for var in &table.variables {
                let qualifier = if var.is_const { "const " } else { "" };
                e.emit_line(&format!(
                    "extern {}{} {};",
                    qualifier,
                    var.kind.spelling(),
                    var.name
                ));
            }
        }
        e.blank();

        for (_, ty) in self.arena.iter() {
            ty.emit(&mut e, &ctx);
            e.blank();
        }

        for table in [&self.inp, &self.mix, &self.out] {
            for instance in &table.structs {
                e.emit_line(&format!(
                    "extern struct {} {};",
                    self.arena[instance.ty].name, instance.name
                ));
            }
        }
        e.finish()
    }

    /// Definitions plus the `init` entry point, `init.<ext>`.
    pub fn emit_init(&self) -> String {
        let mut e = Emitter::new();
        e.emit_line("#include \"init.h\"");
        e.blank();

        for table in [&self.inp, &self.mix, &self.out] {
            for var in &table.variables {
                let qualifier = if var.is_const { "const " } else { "" };
                let init = var.init.expect("extern variables are always initialized");
                e.emit_line(&format!(
                    "{}{} {} = {};",
                    qualifier,
                    var.kind.spelling(),
                    var.name,
                    init.literal(self.options.mode_64bit)
                ));
            }
        }
        e.blank();

        for table in [&self.inp, &self.mix, &self.out] {
            for instance in &table.structs {
                e.emit_line(&format!(
                    "struct {} {};",
                    self.arena[instance.ty].name, instance.name
                ));
            }
        }
        e.blank();

        e.emit_line("void init () {");
        e.enter_block();
        for table in [&self.inp, &self.mix, &self.out] {
            for instance in &table.structs {
                self.emit_instance_init(&mut e, instance);
            }
        }
        e.exit_block();
        e.emit_line("}");
        e.finish()
    }

    fn emit_instance_init(&self, e: &mut Emitter, instance: &StructInstance) {
        self.emit_field_inits(e, &instance.name, instance.ty, &instance.inits);
    }

    fn emit_field_inits(
        &self,
        e: &mut Emitter,
        prefix: &str,
        ty: crate::types::StructTypeId,
        inits: &[FieldInit],
    ) {
        for (field, init) in self.arena[ty].fields.iter().zip(inits) {
            let path = format!("{prefix}.{}", field.name);
            match (init, &field.ty) {
                (FieldInit::Scalar(val), FieldType::Scalar(_)) => {
                    e.emit_line(&format!(
                        "{path} = {};",
                        val.literal(self.options.mode_64bit)
                    ));
                }
                (FieldInit::Nested(nested), FieldType::Struct(nested_ty)) => {
                    self.emit_field_inits(e, &path, *nested_ty, nested);
                }
                _ => unreachable!("initializer shape diverged from the field list"),
            }
        }
    }

    /// The generated function, `func.<ext>`.
    pub fn emit_func(&self) -> String {
        let ctx = self.emit_ctx();
        let mut text = String::from("#include \"init.h\"\n\nvoid foo ()\n");
        text.push_str(&emit_function_body(&self.function, &ctx));
        text
    }

    /// The fixed mixing primitive, `hash.<ext>`.
    pub fn emit_hash(&self) -> String {
        let mut text = String::new();
        text.push_str("void hash(unsigned long long int *seed, unsigned long long int const v) {\n");
        text.push_str("    *seed ^= v + 0x9e3779b9 + ((*seed)<<6) + ((*seed)>>2);\n");
        text.push_str("}\n");
        text
    }

    /// The checksum routine, `check.<ext>`. Folds mixed and output state
    /// in declaration order; the order is never randomized.
    pub fn emit_check(&self) -> String {
        let mut e = Emitter::new();
        if self.options.print_assignments {
            e.emit_line("#include <stdio.h>");
        }
        e.emit_line("#include \"init.h\"");
        e.blank();
        e.emit_line("unsigned long long int checksum () {");
        e.enter_block();
        e.emit_line("unsigned long long int seed = 0ULL;");

        let fold = |e: &mut Emitter, name: &str| {
            if self.options.print_assignments {
                e.emit_line(&format!(
                    "printf(\"{name} = %llu\\n\", (unsigned long long int){name});"
                ));
            }
            e.emit_line(&format!("hash(&seed, (unsigned long long int){name});"));
        };

        for table in [&self.mix, &self.out] {
            for var in &table.variables {
                fold(&mut e, &var.name);
            }
        }
        for table in [&self.mix, &self.out] {
            for slot in table.scalar_members(&self.arena) {
                let name = table.member_name(&self.arena, &slot);
                fold(&mut e, &name);
            }
        }

        e.emit_line("return seed;");
        e.exit_block();
        e.emit_line("}");
        e.finish()
    }

    /// The driver entry point, `driver.<ext>`.
    pub fn emit_main(&self) -> String {
        let mut text = String::new();
        text.push_str("#include <stdio.h>\n");
        text.push_str("#include \"init.h\"\n\n");
        text.push_str("extern void init ();\n");
        text.push_str("extern void foo ();\n");
        text.push_str("extern unsigned long long int checksum ();\n\n");
        text.push_str("int main () {\n");
        text.push_str("    init ();\n");
        text.push_str("    foo ();\n");
        text.push_str("    printf(\"%llu\\n\", checksum ());\n");
        text.push_str("    return 0;\n");
        text.push_str("}\n");
        text
    }

    /// The complete artifact set for this program.
    pub fn emit(&self) -> TestCase {
        let ext = self.options.file_ext();
        let files = vec![
            ("init.h".to_string(), self.emit_decl()),
            (format!("init.{ext}"), self.emit_init()),
            (format!("func.{ext}"), self.emit_func()),
            (format!("hash.{ext}"), self.emit_hash()),
            (format!("check.{ext}"), self.emit_check()),
            (format!("driver.{ext}"), self.emit_main()),
        ];
        debug!(
            seed = self.seed,
            files = files.len(),
            bytes = files.iter().map(|(_, t)| t.len()).sum::<usize>(),
            "emitted test case"
        );
        TestCase {
            seed: self.seed,
            files,
        }
    }
}

/// Fills the extern pools before any statement exists: struct types, then
/// input and mixed scalars, then instances for all three pools. A zero
/// struct-type draw short-circuits every instance phase.
fn populate_extern_tables(
    options: &Options,
    rng: &mut RandGen,
    arena: &mut Arena<StructType>,
    inp: &mut SymbolTable,
    mix: &mut SymbolTable,
    out: &mut SymbolTable,
    names: &mut NameSupply,
) {
    let policy = GenPolicy::from_options(options);
    let ctx = Context::root(policy.clone());
    let const_ctx = ctx.with_policy(policy.with_const_allowed(true));

    let struct_type_count = rng.uniform(options.min_struct_type_count, options.max_struct_type_count);
    debug!(struct_type_count, "populating struct type pool");
    for _ in 0..struct_type_count {
        let existing = inp.struct_types.clone();
        let id = arena.alloc(StructType::generate(&ctx, rng, &existing, names));
        inp.add_struct_type(id);
        mix.add_struct_type(id);
        out.add_struct_type(id);
    }

    let inp_var_count = rng.uniform(options.min_inp_var_count, options.max_inp_var_count);
    for _ in 0..inp_var_count {
        inp.add_variable(Variable::generate(&const_ctx, rng, names));
    }
    let mix_var_count = rng.uniform(options.min_mix_var_count, options.max_mix_var_count);
    for _ in 0..mix_var_count {
        mix.add_variable(Variable::generate(&ctx, rng, names));
    }
    debug!(inp_var_count, mix_var_count, "populated scalar pools");

    if struct_type_count == 0 {
        debug!("no struct types; skipping instance pools");
        return;
    }

    let inp_struct_count = rng.uniform(options.min_inp_struct_count, options.max_inp_struct_count);
    for _ in 0..inp_struct_count {
        let idx = rng.uniform(0, struct_type_count - 1) as usize;
        inp.add_struct(StructInstance::generate(
            &const_ctx,
            rng,
            arena,
            inp.struct_types[idx],
            names,
        ));
    }
    let mix_struct_count = rng.uniform(options.min_mix_struct_count, options.max_mix_struct_count);
    for _ in 0..mix_struct_count {
        let idx = rng.uniform(0, struct_type_count - 1) as usize;
        mix.add_struct(StructInstance::generate(
            &ctx,
            rng,
            arena,
            mix.struct_types[idx],
            names,
        ));
    }
    let out_struct_count = rng.uniform(options.min_out_struct_count, options.max_out_struct_count);
    for _ in 0..out_struct_count {
        let idx = rng.uniform(0, struct_type_count - 1) as usize;
        out.add_struct(StructInstance::generate(
            &ctx,
            rng,
            arena,
            out.struct_types[idx],
            names,
        ));
    }
    debug!(
        inp_struct_count,
        mix_struct_count, out_struct_count, "populated struct instance pools"
    );
}

/// A fully composed artifact set. Nothing touches the filesystem until
/// every artifact is complete, so a failed run leaves no partial output.
#[derive(Debug)]
pub struct TestCase {
    pub seed: u64,
    pub files: Vec<(String, String)>,
}

impl TestCase {
    pub fn file(&self, name: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, text)| text.as_str())
    }

    pub fn write_to(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        for (name, text) in &self.files {
            fs::write(dir.join(name), text)?;
        }
        Ok(())
    }
}

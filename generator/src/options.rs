use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Bumped every time the generation algorithm changes, so that
/// version + seed unambiguously identifies a generated test case.
pub const GENERATOR_VERSION: &str = "1.0";

/// Version tag as it appears in a two-part seed (`VV_SSS`).
pub const PLANE_VERSION: &str = "10";

/// Language standards the emitted test case can target.
///
/// The generated sources stay inside the common C/C++ subset, so the
/// standard only selects the file extension and the compiler flags a
/// harness would pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Standard {
    C99,
    C11,
    Cxx98,
    Cxx03,
    Cxx11,
    Cxx14,
    Cxx17,
}

impl Standard {
    pub const ALL: [Standard; 7] = [
        Standard::C99,
        Standard::C11,
        Standard::Cxx98,
        Standard::Cxx03,
        Standard::Cxx11,
        Standard::Cxx14,
        Standard::Cxx17,
    ];

    pub fn parse(s: &str) -> Result<Standard> {
        match s {
            "c99" => Ok(Standard::C99),
            "c11" => Ok(Standard::C11),
            "c++98" => Ok(Standard::Cxx98),
            "c++03" => Ok(Standard::Cxx03),
            "c++11" => Ok(Standard::Cxx11),
            "c++14" => Ok(Standard::Cxx14),
            "c++17" => Ok(Standard::Cxx17),
            _ => Err(Error::UnknownStandard(s.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Standard::C99 => "c99",
            Standard::C11 => "c11",
            Standard::Cxx98 => "c++98",
            Standard::Cxx03 => "c++03",
            Standard::Cxx11 => "c++11",
            Standard::Cxx14 => "c++14",
            Standard::Cxx17 => "c++17",
        }
    }

    pub fn is_c(self) -> bool {
        matches!(self, Standard::C99 | Standard::C11)
    }

    pub fn is_cxx(self) -> bool {
        !self.is_c()
    }

    pub fn file_ext(self) -> &'static str {
        if self.is_c() {
            "c"
        } else {
            "cpp"
        }
    }
}

/// The full set of generation limits. Built once, validated once, then
/// consumed read-only by every other component.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    pub standard: Standard,
    pub mode_64bit: bool,

    pub max_arith_depth: u32,
    pub min_scope_stmt_count: u32,
    pub max_scope_stmt_count: u32,
    pub max_cse_count: u32,
    pub max_if_depth: u32,

    pub min_inp_var_count: u32,
    pub max_inp_var_count: u32,
    pub min_mix_var_count: u32,
    pub max_mix_var_count: u32,

    pub min_struct_type_count: u32,
    pub max_struct_type_count: u32,
    pub min_inp_struct_count: u32,
    pub max_inp_struct_count: u32,
    pub min_mix_struct_count: u32,
    pub max_mix_struct_count: u32,
    pub min_out_struct_count: u32,
    pub max_out_struct_count: u32,

    pub enable_arrays: bool,
    pub enable_bit_fields: bool,
    pub print_assignments: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            standard: Standard::C11,
            mode_64bit: true,

            max_arith_depth: 5,
            min_scope_stmt_count: 5,
            max_scope_stmt_count: 10,
            max_cse_count: 5,
            max_if_depth: 3,

            min_inp_var_count: 5,
            max_inp_var_count: 10,
            min_mix_var_count: 3,
            max_mix_var_count: 8,

            min_struct_type_count: 0,
            max_struct_type_count: 6,
            min_inp_struct_count: 0,
            max_inp_struct_count: 6,
            min_mix_struct_count: 0,
            max_mix_struct_count: 6,
            min_out_struct_count: 0,
            max_out_struct_count: 8,

            enable_arrays: true,
            enable_bit_fields: false,
            print_assignments: false,
        }
    }
}

impl Options {
    /// Rejects every unsatisfiable range up front, before any random draw.
    pub fn validate(&self) -> Result<()> {
        let ranges: [(&'static str, u32, u32); 7] = [
            (
                "scope statement count",
                self.min_scope_stmt_count,
                self.max_scope_stmt_count,
            ),
            ("input variable count", self.min_inp_var_count, self.max_inp_var_count),
            ("mixed variable count", self.min_mix_var_count, self.max_mix_var_count),
            (
                "struct type count",
                self.min_struct_type_count,
                self.max_struct_type_count,
            ),
            (
                "input struct count",
                self.min_inp_struct_count,
                self.max_inp_struct_count,
            ),
            (
                "mixed struct count",
                self.min_mix_struct_count,
                self.max_mix_struct_count,
            ),
            (
                "output struct count",
                self.min_out_struct_count,
                self.max_out_struct_count,
            ),
        ];
        for (what, min, max) in ranges {
            if min > max {
                return Err(Error::EmptyRange { what, min, max });
            }
        }
        Ok(())
    }

    pub fn from_toml_str(s: &str) -> Result<Options> {
        let opts: Options = toml::from_str(s).map_err(|e| Error::Config(e.to_string()))?;
        opts.validate()?;
        Ok(opts)
    }

    pub fn file_ext(&self) -> &'static str {
        self.standard.file_ext()
    }

    pub fn set_bit_mode(&mut self, arg: &str) -> Result<()> {
        match arg {
            "32" => self.mode_64bit = false,
            "64" => self.mode_64bit = true,
            _ => return Err(Error::InvalidBitMode(arg.to_string())),
        }
        Ok(())
    }
}

/// Parses a seed argument in the form `SSS` or `VV_SSS`, where `VV` must
/// match [`PLANE_VERSION`]. A seed of zero means "mint a fresh one".
pub fn parse_seed(arg: &str) -> Result<u64> {
    let digits = match arg.split_once('_') {
        Some((version, rest)) => {
            if version != PLANE_VERSION {
                return Err(Error::SeedVersionMismatch(arg.to_string()));
            }
            rest
        }
        None => arg,
    };
    digits
        .parse::<u64>()
        .map_err(|_| Error::InvalidSeed(arg.to_string()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn seed_plain_form() {
        assert_eq!(parse_seed("42").unwrap(), 42);
        assert_eq!(parse_seed("0").unwrap(), 0);
    }

    #[test]
    fn seed_versioned_form() {
        assert_eq!(parse_seed("10_12345").unwrap(), 12345);
    }

    #[test]
    fn seed_version_mismatch_is_fatal() {
        let err = parse_seed("99_12345").unwrap_err();
        assert!(matches!(err, Error::SeedVersionMismatch(_)));
    }

    #[test]
    fn seed_garbage_rejected() {
        assert!(matches!(parse_seed("abc").unwrap_err(), Error::InvalidSeed(_)));
        assert!(matches!(parse_seed("10_abc").unwrap_err(), Error::InvalidSeed(_)));
        assert!(matches!(parse_seed("").unwrap_err(), Error::InvalidSeed(_)));
    }

    #[test]
    fn standard_round_trip() {
        for std in Standard::ALL {
            assert_eq!(Standard::parse(std.as_str()).unwrap(), std);
        }
        assert!(Standard::parse("c++20").is_err());
    }

    #[test]
    fn extension_follows_standard() {
        assert_eq!(Standard::C99.file_ext(), "c");
        assert_eq!(Standard::Cxx17.file_ext(), "cpp");
    }

    #[test]
    fn empty_range_rejected() {
        let mut opts = Options::default();
        opts.min_struct_type_count = 4;
        opts.max_struct_type_count = 1;
        assert!(matches!(
            opts.validate().unwrap_err(),
            Error::EmptyRange { what: "struct type count", .. }
        ));
    }

    #[test]
    fn toml_config_round_trip() {
        let opts = Options::default();
        let text = toml::to_string(&opts).unwrap();
        let back = Options::from_toml_str(&text).unwrap();
        assert_eq!(back.max_arith_depth, opts.max_arith_depth);
        assert_eq!(back.standard, opts.standard);
    }

    #[test]
    fn toml_config_validates_ranges() {
        let text = "min_mix_var_count = 9\nmax_mix_var_count = 2\n";
        assert!(Options::from_toml_str(text).is_err());
    }

    #[test]
    fn bit_mode_parse() {
        let mut opts = Options::default();
        opts.set_bit_mode("32").unwrap();
        assert!(!opts.mode_64bit);
        opts.set_bit_mode("64").unwrap();
        assert!(opts.mode_64bit);
        assert!(opts.set_bit_mode("16").is_err());
    }
}

use crate::{Error, Stage};
use clap::Parser;
use lurch::{Options, Outcome};
use std::path::PathBuf;

#[derive(Clone, Debug, Parser)]
/// A validator for Lurch documents written in putdown notation
pub struct Opt {
    /// Read the corpus from a JSON file instead of the built-in one
    ///
    /// The file must contain an array of entries
    /// with the fields "filename", "content", and optionally "metadata".
    #[arg(long, value_name = "FILE")]
    pub corpus: Option<PathBuf>,

    /// Prepend the forms of a corpus entry as givens (cumulative)
    ///
    /// Example: --include "/propositional logic/all rules.putdown"
    #[arg(long, value_name = "KEY")]
    pub include: Vec<String>,

    /// Read validation options from a JSON file
    ///
    /// Missing keys take their default values,
    /// and the flags below override the values from the file.
    #[arg(long, value_name = "FILE")]
    pub options: Option<PathBuf>,

    /// Validate only claims with the attribute "target"
    #[arg(long)]
    pub targets_only: bool,

    /// Do not report conclusions that are justified only by later instantiations
    #[arg(long)]
    pub no_preemies: bool,

    /// Do not check blatant instantiation hints
    #[arg(long)]
    pub no_bihs: bool,

    /// Do not split chains of equations
    #[arg(long)]
    pub no_equations: bool,

    /// Instantiate also lone metavariables, EFAs, and element-ofs
    #[arg(long)]
    pub instantiate_everything: bool,

    /// Treat every rule with a lone metavariable as conclusion as cases rule
    #[arg(long)]
    pub auto_cases: bool,

    /// Offer all unresolved equations to the computer algebra system
    #[arg(long)]
    pub cas: bool,

    /// Result of claims that do not follow propositionally
    ///
    /// Possible values are: indeterminate, invalid.
    #[arg(long, value_name = "RESULT")]
    pub bad_result: Option<Outcome>,

    /// Maximal number of partial instantiations per rule
    #[arg(long, value_name = "N")]
    pub instantiation_limit: Option<usize>,

    /// Perform only operations until (excluding) the given stage.
    ///
    /// Possible values are: parse, import, validate.
    #[arg(long)]
    pub omit: Option<Stage>,

    /// Compare verdicts with expected results
    ///
    /// Expected results are given by ✔︎ and ✗ markers
    /// or by the attribute "ExpectedResult".
    /// If any expectation is not met, the program fails.
    #[arg(long)]
    pub expected: bool,

    /// Print the documents after validation
    #[arg(long)]
    pub print: bool,

    /// Validate files concurrently
    ///
    /// If this option is given with a number n, then
    /// maximally n files are concurrently validated.
    /// If this option is given without an extra argument, then
    /// the number of concurrently validated files is
    /// determined automatically from the number of CPUs.
    #[arg(long, short = 'j')]
    pub jobs: Option<Option<usize>>,

    /// Files to process
    ///
    /// Every file is validated as a separate document.
    /// To read from standard input, use "-" as file name.
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

impl Opt {
    pub fn omits(&self, stage: Stage) -> bool {
        self.omit.as_ref().map_or(false, |omit| *omit <= stage)
    }

    /// Validation options from the options file, overridden by flags.
    pub fn validation_options(&self) -> Result<Options, Error> {
        let mut opts: Options = match &self.options {
            Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
            None => Options::default(),
        };
        if self.targets_only {
            opts.validate_all = false
        }
        if self.no_preemies {
            opts.check_preemies = false
        }
        if self.no_bihs {
            opts.process_bihs = false
        }
        if self.no_equations {
            opts.process_equations = false
        }
        opts.instantiate_everything |= self.instantiate_everything;
        opts.auto_cases |= self.auto_cases;
        opts.process_cas |= self.cas;
        if let Some(result) = self.bad_result {
            opts.bad_result = result
        }
        if let Some(limit) = self.instantiation_limit {
            opts.instantiation_limit = limit
        }
        Ok(opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides() {
        let opt = Opt::parse_from(["lurchcheck", "--no-preemies", "--bad-result", "invalid", "a.putdown"]);
        let opts = opt.validation_options().unwrap();
        assert!(!opts.check_preemies);
        assert_eq!(opts.bad_result, Outcome::Invalid);
        assert!(opts.process_bihs);
        assert_eq!(opt.files, [PathBuf::from("a.putdown")]);
    }

    #[test]
    fn omits() {
        let opt = Opt::parse_from(["lurchcheck", "--omit", "import", "-j"]);
        assert!(!opt.omits(Stage::Parse));
        assert!(opt.omits(Stage::Import));
        assert!(opt.omits(Stage::Validate));
        assert_eq!(opt.jobs, Some(None));
        assert!(opt.files.is_empty());
    }

    #[test]
    fn verify() {
        use clap::CommandFactory;
        Opt::command().debug_assert()
    }
}

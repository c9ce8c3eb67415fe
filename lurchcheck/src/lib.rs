mod error;
mod opt;
mod path_read;
mod stage;

pub use error::Error;
pub use opt::Opt;
pub use path_read::{path_reads, read_source, PathRead};
pub use stage::Stage;

use lurch::database::Database;
use lurch::expect::{self, Failure, Tally};
use lurch::node::VALIDATION_RESULT;
use lurch::putdown::Form;
use lurch::{Document, NodeId, Options, Validator};

/// Outcome of processing a single document.
#[derive(Debug, Default)]
pub struct Report {
    pub name: String,
    /// one line per validated target
    pub targets: Vec<String>,
    /// the whole document after validation, if requested
    pub document: Option<String>,
    /// expectations that were not met
    pub failures: Vec<Failure>,
    pub tally: Tally,
}

/// Forms of the given corpus entries, in order.
pub fn includes(db: &Database, keys: &[String]) -> Result<Vec<Form<String>>, Error> {
    let mut forms = Vec::new();
    for key in keys {
        let concepts = db.get_logic_concepts(key);
        let concepts = concepts.ok_or_else(|| lurch::Error::Missing(key.clone()))??;
        log::info!("Include {} with {} forms", key, concepts.len());
        forms.extend(concepts.iter().cloned());
    }
    Ok(forms)
}

/// Print a target as `address verdict putdown`.
fn target_line(doc: &Document, id: NodeId) -> Option<String> {
    let verdict = doc.verdict(id)?;
    let address = doc.address(id).iter().map(|i| i.to_string()).collect::<Vec<_>>();
    let mut form = doc.form(id);
    form.attributes.remove(VALIDATION_RESULT);
    Some(format!("{} {} {}", address.join("."), verdict, form))
}

/// Parse, import, and validate a document, as far as the options say.
pub fn check(
    name: &str,
    source: &str,
    includes: &[Form<String>],
    opt: &Opt,
    opts: &Options,
) -> Result<Report, Error> {
    let mut report = Report {
        name: name.into(),
        ..Report::default()
    };
    if opt.omits(Stage::Parse) {
        return Ok(report);
    }
    log::info!("Parse {}", name);
    let mut doc = Document::parse(source)?;

    if !opt.omits(Stage::Import) {
        doc.import(includes.iter().cloned())?;
    }

    if !opt.omits(Stage::Validate) {
        let mut validator = Validator::new(opts.clone())
            .on_progress(|done, total| log::debug!("Validated {}/{} targets", done, total));
        let summary = validator.validate(&mut doc);
        log::info!(
            "{}: {} targets, {} valid, {} invalid, {} indeterminate, {} errors",
            name,
            summary.targets,
            summary.valid,
            summary.invalid,
            summary.indeterminate,
            summary.errors
        );
        let root = doc.root();
        let lines = doc.descendants(root).filter_map(|n| target_line(&doc, n));
        report.targets = lines.collect();
    }

    if opt.expected {
        report.failures = expect::expected_failures(&doc);
        report.tally = expect::tally(&doc);
    }
    if opt.print {
        report.document = Some(doc.to_putdown());
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    const RULES: &str = "/propositional logic/all rules.putdown";

    fn opt(args: &[&str]) -> Opt {
        Opt::parse_from(["lurchcheck"].iter().chain(args))
    }

    #[test]
    fn expected() {
        let opt = opt(&["--expected", "--include", RULES]);
        let includes = includes(&Database::builtin().unwrap(), &opt.include).unwrap();
        let opts = opt.validation_options().unwrap();
        let report = check("proof", ":P :Q (and P Q) ✔︎ (or R Q) ✔︎ R ✗", &includes, &opt, &opts).unwrap();
        assert_eq!(report.tally, Tally { valid: 2, invalid: 1, ..Tally::default() });
        assert_eq!(report.targets.len(), 3);
        // R does not follow, so it is only indeterminate
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].expected, "invalid");
    }

    #[test]
    fn targets() {
        let opt = opt(&[]);
        let opts = opt.validation_options().unwrap();
        let report = check("proof", "{* :A :B (and A B) *} :P :Q (and P Q)", &[], &opt, &opts).unwrap();
        assert_eq!(report.targets, ["4 valid (and P Q)"]);
        assert!(report.document.is_none());
    }

    #[test]
    fn omit() {
        let opt = opt(&["--omit", "validate", "--print", "--include", RULES]);
        let includes = includes(&Database::builtin().unwrap(), &opt.include).unwrap();
        let opts = opt.validation_options().unwrap();
        let report = check("proof", "(and P Q)", &includes, &opt, &opts).unwrap();
        assert!(report.targets.is_empty());
        let document = report.document.unwrap();
        assert!(document.ends_with("(and P Q)"));
        assert!(document.len() > "(and P Q)".len());

        let opt = Opt::parse_from(["lurchcheck", "--omit", "parse"]);
        assert!(check("junk", "(((", &[], &opt, &opts).is_ok());
    }

    #[test]
    fn missing() {
        let keys = ["/nothing".to_string()];
        let err = includes(&Database::builtin().unwrap(), &keys).unwrap_err();
        assert!(matches!(err, Error::Lurch(lurch::Error::Missing(_))));
    }
}

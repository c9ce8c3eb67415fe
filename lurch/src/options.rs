//! Validation options.

use crate::Outcome;
use serde::{Deserialize, Serialize};

/// Options that control which validation tools run.
///
/// Options can be read from JSON with camel-case keys;
/// missing keys take their default values:
///
/// ~~~
/// # use lurch::{Options, Outcome};
/// let opts: Options = serde_json::from_str(r#"{"checkPreemies": false, "badResultMsg": "invalid"}"#)?;
/// assert!(!opts.check_preemies);
/// assert_eq!(opts.bad_result, Outcome::Invalid);
/// assert!(opts.process_bihs);
/// # Ok::<_, serde_json::Error>(())
/// ~~~
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    /// validate all claims, not only those marked as targets
    #[serde(alias = "validateall")]
    pub validate_all: bool,
    /// treat conclusions justified only by later instantiations as preemies
    pub check_preemies: bool,
    #[serde(rename = "processBIHs")]
    pub process_bihs: bool,
    /// override all avoidance options
    pub instantiate_everything: bool,
    pub avoid_lone_metavars: bool,
    #[serde(rename = "avoidLoneEFAs")]
    pub avoid_lone_efas: bool,
    pub avoid_lone_element_ofs: bool,
    pub process_equations: bool,
    pub process_cases: bool,
    /// treat every rule with a lone metavariable conclusion as a cases rule
    pub auto_cases: bool,
    #[serde(rename = "processCAS")]
    pub process_cas: bool,
    pub process_arithmetic: bool,
    pub process_algebra: bool,
    pub swap_theorem_proof_pairs: bool,
    /// number of validated targets between two progress reports
    pub update_freq: usize,
    /// result of conclusions that cannot be justified
    #[serde(rename = "badResultMsg")]
    pub bad_result: Outcome,
    /// maximal number of partial instantiations kept per rule
    pub instantiation_limit: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            validate_all: true,
            check_preemies: true,
            process_bihs: true,
            instantiate_everything: false,
            avoid_lone_metavars: true,
            avoid_lone_efas: true,
            avoid_lone_element_ofs: true,
            process_equations: true,
            process_cases: true,
            auto_cases: false,
            process_cas: false,
            process_arithmetic: true,
            process_algebra: true,
            swap_theorem_proof_pairs: true,
            update_freq: 100,
            bad_result: Outcome::Indeterminate,
            instantiation_limit: 2000,
        }
    }
}

impl Options {
    pub fn avoids_lone_metavars(&self) -> bool {
        self.avoid_lone_metavars && !self.instantiate_everything
    }

    pub fn avoids_lone_efas(&self) -> bool {
        self.avoid_lone_efas && !self.instantiate_everything
    }

    pub fn avoids_lone_element_ofs(&self) -> bool {
        self.avoid_lone_element_ofs && !self.instantiate_everything
    }
}

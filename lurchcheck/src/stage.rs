/// A stage in the processing of documents.
///
/// This is useful to omit certain parts of document processing.
/// Omitting one stage also omits all stages after it,
/// i.e. all stages greater than the stage.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// Parsing
    Parse,
    /// Importing included corpus entries as givens
    Import,
    /// Instantiation and judging of targets
    Validate,
}

impl core::str::FromStr for Stage {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "parse" => Ok(Self::Parse),
            "import" => Ok(Self::Import),
            "validate" => Ok(Self::Validate),
            _ => Err("unknown stage: ".to_owned() + s),
        }
    }
}

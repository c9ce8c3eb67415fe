//! Corpus of named putdown documents.
//!
//! Keys are slash-separated paths such as `/propositional logic/all rules.putdown`.
//! The forms of an entry are parsed on first request;
//! the result, be it forms or a parse error, is kept for all later requests.

use crate::{Document, Error};
use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, OnceCell};
use putdown_parse::Form;
use serde::{Deserialize, Serialize};
use serde_json::Value;

type Parsed = Result<Vec<Form<String>>, putdown_parse::Error>;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Entry {
    pub filename: String,
    /// free-form data such as `"rule": true` or `"includes": [...]`
    #[serde(default)]
    pub metadata: Value,
    /// source with all included files prepended
    pub content: String,
    /// source without included files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
    #[serde(skip)]
    parsed: OnceCell<Parsed>,
}

impl Entry {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            metadata: Value::Object(Default::default()),
            content: content.into(),
            original: None,
            parsed: OnceCell::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Database {
    entries: Vec<Entry>,
    parses: Cell<usize>,
}

impl Database {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self {
            entries,
            parses: Cell::new(0),
        }
    }

    /// Read a corpus from a JSON array of entries.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Corpus of parsing tests and propositional logic rules.
    ///
    /// ~~~
    /// # use lurch::database::Database;
    /// let db = Database::builtin().unwrap();
    /// let rules = db.get_logic_concepts("/propositional logic/all rules.putdown").unwrap()?;
    /// assert_eq!(rules.len(), 14);
    /// # Ok::<_, lurch::Error>(())
    /// ~~~
    pub fn builtin() -> Result<Self, serde_json::Error> {
        Self::from_json(include_str!("../data/corpus.json"))
    }

    fn entry(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.filename == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.filename.as_str())
    }

    pub fn keys_starting_with<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> {
        self.keys().filter(move |k| k.starts_with(prefix))
    }

    /// Contents of a folder, like `ls`.
    ///
    /// ~~~
    /// # use lurch::database::{Database, Entry};
    /// let db = Database::new(["/one/two/a", "/one/two/b", "/one/c"].map(|k| Entry::new(k, "")).to_vec());
    /// assert_eq!(db.keys_paths(""), ["one"]);
    /// assert_eq!(db.keys_paths("/one"), ["two", "c"]);
    /// assert_eq!(db.keys_paths("/one/two/"), ["a", "b"]);
    /// ~~~
    pub fn keys_paths(&self, prefix: &str) -> Vec<&str> {
        let mut prefix = String::from(prefix);
        if !prefix.ends_with('/') {
            prefix.push('/')
        }
        let mut seen = BTreeSet::new();
        let keys = self.keys().filter(|k| k.starts_with(prefix.as_str()));
        let names = keys.filter_map(|k| k[prefix.len()..].split('/').next());
        names.filter(|n| seen.insert(*n)).collect()
    }

    /// Keys of the entries whose metadata satisfy the predicate.
    pub fn filter_by_metadata(&self, pred: impl Fn(&Value) -> bool) -> Vec<&str> {
        let entries = self.entries.iter().filter(|e| pred(&e.metadata));
        entries.map(|e| e.filename.as_str()).collect()
    }

    pub fn get_metadata(&self, key: &str) -> Option<&Value> {
        self.entry(key).map(|e| &e.metadata)
    }

    /// Source of an entry, including the sources of all files it includes.
    pub fn get_putdown(&self, key: &str) -> Option<&str> {
        self.entry(key).map(|e| e.content.as_str())
    }

    pub fn get_putdown_without_includes(&self, key: &str) -> Option<&str> {
        let entry = self.entry(key)?;
        Some(entry.original.as_deref().unwrap_or(&entry.content))
    }

    /// Number of times that some entry was parsed.
    pub fn parse_count(&self) -> usize {
        self.parses.get()
    }

    /// Forms of an entry, parsed at most once.
    ///
    /// Return `None` if there is no entry with the given key.
    pub fn get_logic_concepts(&self, key: &str) -> Option<Result<&[Form<String>], Error>> {
        let entry = self.entry(key)?;
        let parsed = entry.parsed.get_or_init(|| {
            self.parses.set(self.parses.get() + 1);
            debug!("Parsing {}", key);
            let forms = putdown_parse::parse(&entry.content)?;
            Ok(forms.into_iter().map(|f| f.map(&|s: &str| String::from(s))).collect())
        });
        Some(parsed.as_deref().map_err(|e| Error::Parse(e.clone())))
    }

    /// The only form of an entry.
    pub fn get_logic_concept(&self, key: &str) -> Result<&Form<String>, Error> {
        let forms = self.get_logic_concepts(key).ok_or_else(|| Error::Missing(key.into()))??;
        match forms {
            [form] => Ok(form),
            _ => Err(Error::Cardinality(forms.len())),
        }
    }

    /// Construct a document from an entry, preceded by the given dependencies.
    ///
    /// The contents of the dependencies become givens.
    pub fn get_document(&self, key: &str, dependencies: &[&str]) -> Result<Document, Error> {
        let forms = |k: &str| self.get_logic_concepts(k).ok_or_else(|| Error::Missing(k.into()));
        let mut doc = Document::from_forms(forms(key)??.iter().cloned())?;
        let mut imported = Vec::new();
        for dep in dependencies {
            imported.extend(forms(dep)??.iter().cloned());
        }
        doc.import(imported)?;
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Options, Outcome, Validator};

    const RULES: &str = "/propositional logic/all rules.putdown";

    #[test]
    fn malformed() {
        assert!(Database::builtin().is_ok());
        assert!(Database::from_json("[{\"filename\": 1}]").is_err());
        assert!(Database::from_json("[{\"filename\": \"/a\"}]").is_err());
        let db = Database::from_json("[{\"filename\": \"/a\", \"content\": \"A\"}]").unwrap();
        assert_eq!(db.keys().count(), 1);
    }

    #[test]
    fn lookup() {
        let db = Database::builtin().unwrap();
        assert_eq!(db.keys().count(), 16);
        assert_eq!(db.keys_paths("/"), ["parsing tests", "propositional logic"]);
        assert_eq!(db.keys_starting_with("/parsing tests/").count(), 4);
        let rules = db.filter_by_metadata(|m| m["rule"] == true);
        assert_eq!(rules.len(), 10);
        assert_eq!(db.get_putdown_without_includes(RULES), Some(""));
        assert!(db.get_putdown(RULES).unwrap().contains("(iff A B)"));
        assert_eq!(db.get_metadata("/nothing"), None);
    }

    #[test]
    fn cached() {
        let db = Database::builtin().unwrap();
        let key = "/propositional logic/conjunction introduction.putdown";
        let first = db.get_logic_concepts(key).unwrap().unwrap();
        let second = db.get_logic_concepts(key).unwrap().unwrap();
        assert!(core::ptr::eq(first, second));
        assert_eq!(db.parse_count(), 1);
        assert!(db.get_logic_concept(key).is_ok());
    }

    #[test]
    fn syntax() {
        let db = Database::builtin().unwrap();
        for key in db.filter_by_metadata(|m| m["testing"]["syntax"] == "invalid") {
            assert!(db.get_logic_concepts(key).unwrap().is_err());
        }
        for key in db.filter_by_metadata(|m| m["testing"]["syntax"] == "valid") {
            let len = db.get_metadata(key).unwrap()["testing"]["length"].as_u64().unwrap();
            let forms = db.get_logic_concepts(key).unwrap().unwrap();
            let forms = forms.iter().filter(|f| !f.is_comment());
            assert_eq!(forms.count() as u64, len);
        }
        // errors are cached, too
        let key = "/parsing tests/syntax error 2.putdown";
        let count = db.parse_count();
        assert!(matches!(db.get_logic_concept(key), Err(Error::Parse(_))));
        assert_eq!(db.parse_count(), count);
    }

    #[test]
    fn cardinality() {
        let db = Database::builtin().unwrap();
        let err = db.get_logic_concept(RULES).unwrap_err();
        assert_eq!(err, Error::Cardinality(14));
        assert_eq!(db.get_logic_concept("/nothing"), Err(Error::Missing("/nothing".into())));
        assert!(db.get_logic_concepts("/nothing").is_none());
    }

    #[test]
    fn document() {
        let mut entries = Database::builtin().unwrap().entries;
        entries.push(Entry::new("/proof", ":P :Q (and P Q) (or Q R)"));
        let db = Database::new(entries);
        let mut doc = db.get_document("/proof", &[RULES]).unwrap();
        Validator::new(Options::default()).validate(&mut doc);
        let claims: Vec<_> = doc
            .children(doc.root())
            .iter()
            .filter_map(|c| doc.verdict(*c))
            .map(|v| v.result)
            .collect();
        assert_eq!(claims, [Outcome::Valid, Outcome::Valid]);
    }
}

use criterion::{criterion_group, criterion_main, Criterion};
use lurch::database::Database;
use lurch::{Document, Options, Validator};

const RULES: &str = "/propositional logic/all rules.putdown";

fn validate(mut doc: Document) -> usize {
    let summary = Validator::new(Options::default()).validate(&mut doc);
    summary.valid
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let db = Database::builtin().unwrap();
    let rules = db.get_putdown(RULES).unwrap();

    let proof = r"
        :P :Q
        (and P Q)
        (and Q P)
        (or (and P Q) R)
        { :R (implies Q R) }
        (implies P (and P Q))
    ";
    let mut doc = Document::parse(proof).unwrap();
    let deps = db.get_logic_concepts(RULES).unwrap().unwrap();
    doc.import(deps.iter().cloned()).unwrap();

    c.bench_function("parse", |b| b.iter(|| putdown_parse::parse(rules).unwrap()));
    c.bench_function("corpus", |b| {
        b.iter(|| {
            let db = Database::builtin().unwrap();
            db.keys().filter_map(|k| db.get_logic_concepts(k)).count()
        })
    });
    c.bench_function("propositional", |b| b.iter(|| validate(doc.clone())));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

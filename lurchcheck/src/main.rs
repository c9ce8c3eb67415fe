//! A validator for Lurch documents written in putdown notation.

use clap::Parser;
use lurch::database::Database;
use lurch::expect::Tally;
use lurchcheck::{check, includes, path_reads, read_source, Error, Opt, Report};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn corpus(opt: &Opt) -> Result<Database, Error> {
    match &opt.corpus {
        Some(path) => Ok(Database::from_json(&std::fs::read_to_string(path)?)?),
        None => Ok(Database::builtin()?),
    }
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env("LOG").init();

    let opt = Opt::parse();

    // if a precise number of parallel jobs has been given
    if let Some(Some(jobs)) = opt.jobs {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs);
        if let Err(e) = pool.build_global() {
            log::warn!("Could not set number of jobs: {}", e)
        }
    }

    let includes = includes(&corpus(&opt)?, &opt.include)?;
    let opts = opt.validation_options()?;

    // every document is read in full before validation
    let sources = path_reads(&opt.files).map(|pr| read_source(pr?));
    let sources = sources.collect::<Result<Vec<_>, _>>()?;
    let check = |(name, source): &(String, String)| check(name, source, &includes, &opt, &opts);

    let mut tally = Tally::default();
    let mut unmet = 0;
    let mut handle = |report: Result<Report, Error>| -> Result<(), Error> {
        let report = report?;
        for line in &report.targets {
            println!("{}:{}", report.name, line)
        }
        for failure in &report.failures {
            eprintln!("{}: {}", report.name, failure)
        }
        if let Some(doc) = &report.document {
            println!("{}", doc)
        }
        unmet += report.failures.len();
        tally += report.tally;
        Ok(())
    };

    if opt.jobs.is_some() {
        // reports are collected to print them in the order of the files
        let reports: Vec<_> = sources.par_iter().map(check).collect();
        reports.into_iter().try_for_each(&mut handle)?;
    } else {
        sources.iter().map(check).try_for_each(&mut handle)?;
    }

    if opt.expected {
        println!(
            "Expected {} valid, {} invalid, {} indeterminate, {} inapplicable; {} unmet",
            tally.valid, tally.invalid, tally.indeterminate, tally.inapplicable, unmet
        );
        if unmet > 0 {
            return Err(Error::Unmet(unmet));
        }
    }
    Ok(())
}

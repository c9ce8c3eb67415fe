//! Print the forms of putdown files, one top-level form per line.

use clap::Parser;
use putdown_parse::{Form, Token};
use std::io::{self, Error, ErrorKind};
use std::path::PathBuf;

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Clone, Debug, Parser)]
pub struct Opt {
    /// Only lex instead of parse
    #[arg(long)]
    lex: bool,
    /// Print nothing.
    #[arg(long)]
    quiet: bool,

    files: Vec<PathBuf>,
}

fn no_space_after(token: &Token) -> bool {
    matches!(
        token,
        Token::LPar | Token::LBrace | Token::LFormula | Token::LBrk | Token::Colon
    )
}

fn no_space_before(token: &Token) -> bool {
    matches!(token, Token::RPar | Token::RBrk | Token::Comma)
}

fn print_token(token: &Token, space: &mut bool) {
    if *space && !no_space_before(token) {
        print!(" ");
    }
    print!("{}", token);
    *space = !no_space_after(token);

    if matches!(token, Token::Comment(_)) {
        println!();
        *space = false;
    }
}

fn print_tokens<'s>(iter: impl Iterator<Item = Token<'s>>, opt: &Opt) -> io::Result<()> {
    let mut space = false;

    for token in iter {
        if token == Token::Error {
            return Err(Error::new(ErrorKind::InvalidData, "unknown token"));
        }
        if !opt.quiet {
            print_token(&token, &mut space)
        }
    }
    if space && !opt.quiet {
        println!()
    }
    Ok(())
}

fn print_forms<'s>(iter: impl Iterator<Item = Result<Form<&'s str>, putdown_parse::Error>>, opt: &Opt) -> io::Result<()> {
    for form in iter {
        let form = form.map_err(|e| Error::new(ErrorKind::InvalidData, e.to_string()))?;
        log::info!("form parsed");
        if !opt.quiet {
            println!("{form}")
        }
    }
    Ok(())
}

fn main() -> io::Result<()> {
    env_logger::Builder::from_env("LOG").init();

    let opt = Opt::parse();

    for path in &opt.files {
        let file = std::fs::read_to_string(path)?;
        log::info!("Format {}", path.display());
        if opt.lex {
            print_tokens(putdown_parse::lex(&file), &opt)?
        } else {
            print_forms(putdown_parse::Parser::new(&file), &opt)?
        }
    }
    Ok(())
}

use super::super::args::*;
use crate::exit_codes::SUCCESS;

pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Prepare(args) => super::prepare::run(args),
        Command::Evaluate(args) => super::evaluate::run(args),
        Command::Match(args) => super::match_cmd::run(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(SUCCESS)
        }
    }
}

use clap::Parser;

use loadwire::error::AppResult;

use crate::cli::ProbeArgs;

pub(crate) fn run() -> AppResult<()> {
    let args = match ProbeArgs::try_parse() {
        Ok(args) => args,
        // --help and --version
        Err(err) if !err.use_stderr() => {
            err.print()?;
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    crate::logger::init_logging(args.verbose, args.no_color);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(crate::probe::run(args))
}

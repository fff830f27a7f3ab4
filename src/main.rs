mod cli;
mod entry;
mod logger;
mod probe;

use loadwire::error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}

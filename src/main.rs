use std::env;
use std::process;

use tutor_confirm::Config;

fn main() {
    env_logger::init();

    let config = Config::build(env::args()).unwrap_or_else(|err| {
        eprintln!("Problem loading configuration: {err}");
        process::exit(1);
    });

    if let Err(e) = tutor_confirm::run(config) {
        eprintln!("Application error: {e}");
        process::exit(1);
    }
}

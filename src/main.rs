use a2o_migrate::output as out;
use a2o_migrate::MigrateError;

mod app;
mod logging;

fn main() {
    let args = a2o_migrate::cli::parse();
    let code = match app::run(args) {
        Ok(code) => code,
        Err(e) => {
            out::print_error(&format!("{e:#}"));
            e.downcast_ref::<MigrateError>()
                .map(MigrateError::code)
                .unwrap_or(1)
        }
    };
    std::process::exit(code);
}

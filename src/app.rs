//! Application orchestrator.
//! Loads/merges config, initializes logging, installs the signal handler, probes
//! both store roots, discovers layers and runs (or plans) the migration.

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use a2o_migrate::cli::Args;
use a2o_migrate::config::{load_config, CONFIG_ENV};
use a2o_migrate::output as out;
use a2o_migrate::{
    check_aufs_root, check_overlay_root, default_config_path, list_layers, shutdown, Config,
    MigrateError, Migrator,
};

use crate::logging::init_tracing;

/// Run the CLI application and return the process exit code.
pub fn run(args: Args) -> Result<i32> {
    // Handle --print-config before logging init
    if args.print_config {
        print_config_location();
        return Ok(0);
    }

    let mut cfg = load_config()?.unwrap_or_default();
    args.apply_overrides(&mut cfg);

    let guard_opt = init_tracing(&cfg.log_level, cfg.log_file.as_deref(), args.json).map_err(|e| {
        out::print_error(&format!("Failed to initialize logging: {}", e));
        e
    })?;

    // Held until the run returns, interrupted or not.
    let guard = guard_opt;
    if let Err(e) = ctrlc::set_handler(on_interrupt) {
        warn!(error = %e, "could not install signal handler; ctrl-c will kill the run mid-layer");
    }

    debug!(?args, "starting a2o-migrate");

    let result = migrate(&args, &cfg);
    drop(guard);
    result
}

fn on_interrupt() {
    shutdown::request();
    out::print_warn("Received interrupt; finishing the current layer, then stopping...");
}

fn migrate(args: &Args, cfg: &Config) -> Result<i32> {
    // Probes first so a missing engine dir reports as a missing store root.
    let aufs_root = check_aufs_root(&cfg.engine_dir).map_err(log_fatal)?;
    let overlay_root = check_overlay_root(&cfg.engine_dir).map_err(log_fatal)?;
    cfg.validate()?;

    let mut layers = args.requested_layers();
    if layers.is_empty() {
        layers = list_layers(&aufs_root)
            .map_err(|source| MigrateError::DiscoveryFailed {
                path: aufs_root.join(a2o_migrate::aufs::ancestry::LAYERS_DIR),
                source,
            })
            .map_err(log_fatal)?;
    }
    if layers.is_empty() {
        out::print_info(&format!("No layers found under {}", aufs_root.display()));
        return Ok(0);
    }
    info!(
        layers = layers.len(),
        engine_dir = %cfg.engine_dir.display(),
        failure_policy = %cfg.failure_policy,
        dry_run = cfg.dry_run,
        "migration requested"
    );

    let migrator = Migrator::new(aufs_root, overlay_root, cfg.migrate_options());
    let plan = migrator.plan(&layers);

    if cfg.dry_run {
        out::print_plan(&plan);
        // Same codes a real run would fail with.
        let code = if !plan.unreadable.is_empty() {
            4
        } else if !plan.cyclic.is_empty() {
            5
        } else {
            0
        };
        return Ok(code);
    }

    if shutdown::is_requested() {
        return Ok(MigrateError::Interrupted.code());
    }

    let report = migrator.execute(plan);
    out::print_report(&report);
    Ok(report.exit_code())
}

fn log_fatal(e: MigrateError) -> anyhow::Error {
    error!(code = e.code(), kind = e.kind(), error = %e, "cannot start migration");
    anyhow::Error::new(e)
}

fn print_config_location() {
    if let Some(p) = std::env::var_os(CONFIG_ENV) {
        out::print_info(&format!(
            "Using {CONFIG_ENV} (explicit):\n  {}\n",
            std::path::Path::new(&p).display()
        ));
        out::print_info(&format!("To override, unset {CONFIG_ENV} or set it to another file."));
        return;
    }
    match default_config_path()
        .context("could not determine a default config path (no config dir and no HOME)")
    {
        Ok(p) => {
            out::print_info(&format!("Default a2o_migrate config path:\n  {}\n", p.display()));
            if p.exists() {
                out::print_info("A config file already exists at that location.");
            } else {
                out::print_info("No config file exists there yet. Run without --print-config to create a template.");
            }
        }
        Err(e) => out::print_error(&format!("{e:#}")),
    }
}

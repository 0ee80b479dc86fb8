use owo_colors::OwoColorize;

use crate::migrate::{LayerStatus, MigrationPlan, MigrationReport};

/// Small wrapper around stdout/stderr printing to provide consistent, colored
/// user-facing messages. Colors are enabled only when output is a TTY.
fn is_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

pub fn print_info(msg: &str) {
    if is_tty() {
        println!("{} {}", "info:".cyan().bold(), msg);
    } else {
        println!("info: {}", msg);
    }
}

pub fn print_warn(msg: &str) {
    if is_tty() {
        eprintln!("{} {}", "warn:".yellow().bold(), msg);
    } else {
        eprintln!("warn: {}", msg);
    }
}

pub fn print_error(msg: &str) {
    if is_tty() {
        eprintln!("{} {}", "error:".red().bold(), msg);
    } else {
        eprintln!("error: {}", msg);
    }
}

pub fn print_success(msg: &str) {
    if is_tty() {
        println!("{} {}", "ok:".green().bold(), msg);
    } else {
        println!("ok: {}", msg);
    }
}

/// Print a plain user-facing line (no prefix). Use this for primary outputs
/// that users may script against.
pub fn print_user(msg: &str) {
    println!("{}", msg);
}

/// One line per layer in dispatch order: `<id> <parent count>`, then the
/// layers that cannot be migrated.
pub fn print_plan(plan: &MigrationPlan) {
    print_info(&format!("Dry-run: {} layer(s) would be migrated in this order:", plan.order.len()));
    for layer in &plan.order {
        let parents = plan.chains.get(layer).map(|c| c.len()).unwrap_or(0);
        print_user(&format!("{layer} parents={parents}"));
    }
    for layer in &plan.cyclic {
        print_warn(&format!("{layer}: on or below an ancestry cycle"));
    }
    for (layer, e) in &plan.unreadable {
        print_warn(&format!("{layer}: ancestry unreadable: {e}"));
    }
}

/// Per-layer lines followed by a one-line summary.
pub fn print_report(report: &MigrationReport) {
    for outcome in &report.outcomes {
        match &outcome.status {
            LayerStatus::Done(m) => print_user(&format!(
                "{} {} link={} whiteouts={} opaque={}",
                outcome.status.label(),
                outcome.layer,
                m.link,
                m.translation.whiteouts,
                m.translation.opaque_dirs
            )),
            other => {
                let reason = other.error().map(|e| e.to_string()).unwrap_or_default();
                print_warn(&format!(
                    "{} {} at {}: {reason}",
                    other.label(),
                    outcome.layer,
                    other.reached()
                ));
            }
        }
    }

    let summary = format!(
        "{} migrated, {} failed, {} skipped, {} not attempted",
        report.done_count(),
        report.failed_count(),
        report.skipped_count(),
        report.not_attempted.len()
    );
    if report.interrupted {
        print_warn(&format!("Interrupted: {summary}"));
    } else if report.is_success() {
        print_success(&summary);
    } else {
        print_error(&summary);
    }
}

use std::env::{self, current_dir};

use color_eyre::{Section, eyre::eyre};
use libfolio::{
    config::load_config,
    pipeline::{BuildReport, build_at, check_with},
};
use time::OffsetDateTime;
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: folio [build|check]";

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let command = env::args().nth(1);
    let root = current_dir().with_note(|| "While getting the current working directory")?;

    match command.as_deref() {
        None | Some("build") => {
            let report = build_at(&root)?;
            info!(pages = report.pages, "build finished");
        }
        Some("check") => {
            let config =
                load_config(&root).with_note(|| "While loading the site configuration.")?;
            let report = check_with(&root, &config, OffsetDateTime::now_utc())?;
            print_report(&report);
        }
        Some(other) => return Err::<(), _>(eyre!("unknown command `{other}`")).suggestion(USAGE),
    }

    Ok(())
}

fn print_report(report: &BuildReport) {
    println!("posts:     {}", report.total);
    println!("visible:   {}", report.visible);
    println!("drafts:    {}", report.drafts);
    println!("scheduled: {}", report.scheduled);
}

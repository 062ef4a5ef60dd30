use anyhow::Context;
use banks_etl::{config::EtlConfig, constants, infra, logging, pipeline};
use std::path::Path;
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    let loaded = EtlConfig::load_or_default(Path::new(constants::CONFIG_PATH));

    // Keep the guard alive so the file layer flushes on exit
    let _log_guard = logging::init_logging(&logging::resolve_log_dir(&loaded));
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!(path = constants::CONFIG_PATH, "Configuration rejected: {}", e);
            return Err(e).context("loading run configuration");
        }
    };
    info!(url = %config.source_url, table = %config.table_name, "Starting banks ETL run");

    let source = infra::page_source_for(&config).context("building page source")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match pipeline::run(&config, source.as_ref(), &mut out) {
        Ok(summary) => {
            info!(
                extracted = summary.extracted,
                loaded = summary.loaded,
                "Run complete"
            );
            Ok(())
        }
        Err(e) => {
            error!("ETL run failed: {}", e);
            Err(e).context("ETL run failed")
        }
    }
}

use std::path::PathBuf;

pub(super) fn run_validate(
    config_path: PathBuf,
    strict: bool,
    out: Option<PathBuf>,
) -> Result<(), String> {
    let config = marlin_application::config::load_config(&config_path)?;
    super::common::print_config_summary("validate", &config, None);

    let crate::infra::ValidateDeps { market_data } = crate::infra::build_validate_deps(&config)?;

    let report = marlin_application::validation::validate(&config, strict, market_data.as_ref())?;

    println!("{}", serde_json::to_string_pretty(&report).unwrap_or_else(|_| report.to_string()));

    if let Some(out_path) = out {
        std::fs::write(&out_path, report.to_string())
            .map_err(|err| format!("failed to write report {}: {}", out_path.display(), err))?;
        println!("validation report: {}", out_path.display());
    }

    Ok(())
}

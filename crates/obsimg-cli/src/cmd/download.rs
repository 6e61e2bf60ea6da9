//! Download command

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use obsimg_core::InputProvider;
use obsimg_core::input::{collect_conditions, collect_list, parse_condition};
use obsimg_schema::Condition;
use serde::Deserialize;

use crate::DownloadArgs;
use crate::config::Settings;

/// Resolve, gate, verify and store the newest image.
pub fn download(
    args: &DownloadArgs,
    settings: &Settings,
    input: &mut dyn InputProvider,
) -> Result<()> {
    let mut config = settings.resolver_config();
    config.conditions = gather_conditions(args, input)?;
    if let Some(secs) = args.conditions_wait_time {
        config.conditions_wait = Duration::from_secs(secs);
    }
    config.skip_verify = args.skip_verify;

    config.disallow.licenses.clone_from(&args.disallow_licenses);
    config.disallow.packages.clone_from(&args.disallow_packages);
    if args.disallow {
        config.disallow.licenses.extend(collect_list(
            &mut *input,
            "Enter disallowed licenses (empty line to finish)",
        )?);
        config.disallow.packages.extend(collect_list(
            &mut *input,
            "Enter disallowed package patterns (empty line to finish)",
        )?);
    }

    tracing::debug!(
        "{} condition(s), wait {}s",
        config.conditions.len(),
        config.conditions_wait.as_secs()
    );

    let path = super::resolver(config, settings).download()?;
    println!("Image downloaded: {}", path.display());
    Ok(())
}

/// Conditions from `--condition`, `--conditions-file` and `--conditions`, in
/// that order.
fn gather_conditions(args: &DownloadArgs, input: &mut dyn InputProvider) -> Result<Vec<Condition>> {
    let mut conditions = args
        .condition
        .iter()
        .map(|spec| parse_condition(spec))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(path) = &args.conditions_file {
        conditions.extend(load_conditions_file(path)?);
    }
    if args.conditions {
        conditions.extend(collect_conditions(&mut *input)?);
    }
    Ok(conditions)
}

#[derive(Deserialize)]
struct ConditionsFile {
    conditions: Vec<Condition>,
}

/// Read conditions from a TOML file (`[[conditions]]` tables) or a JSON
/// array.
pub fn load_conditions_file(path: &Path) -> Result<Vec<Condition>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read conditions file {}", path.display()))?;

    let is_toml = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let conditions = if is_toml {
        toml::from_str::<ConditionsFile>(&content)
            .map(|f| f.conditions)
            .with_context(|| format!("Failed to parse conditions file {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse conditions file {}", path.display()))?
    };
    Ok(conditions)
}

//! Package commands

use anyhow::{Result, bail};
use obsimg_core::filter;
use obsimg_schema::{FilterSpec, PackageMap};

use crate::config::Settings;
use crate::ui::{Theme, render};

/// Print the packages of the newest image, narrowed by license and name.
pub fn list(settings: &Settings, licenses: &[String], names: &[String], json: bool) -> Result<()> {
    let packages = fetch(settings)?;
    let spec = FilterSpec {
        licenses: licenses.to_vec(),
        packages: names.to_vec(),
    };
    let packages = filter::apply(&packages, &spec);

    if json {
        println!("{}", render::packages_json(&packages)?);
    } else {
        let theme = Theme::new(settings.no_color);
        println!("{}", render::packages_table(&packages, &theme));
        println!();
        println!("{}", render::packages_footer(packages.len(), &theme));
    }
    Ok(())
}

/// Print one package of the newest image.
pub fn show(settings: &Settings, package_name: &str, json: bool) -> Result<()> {
    let packages = fetch(settings)?;
    let Some(record) = packages.get(package_name) else {
        bail!("Package '{package_name}' not found in image {}", settings.target.image_name);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
    } else {
        print!("{}", render::package_details(record, &Theme::new(settings.no_color)));
    }
    Ok(())
}

fn fetch(settings: &Settings) -> Result<PackageMap> {
    Ok(super::resolver(settings.resolver_config(), settings).packages()?)
}

//! Text and JSON rendering of package records.

use comfy_table::presets::NOTHING;
use comfy_table::{Cell, Color, Table};
use obsimg_schema::{PackageMap, PackageRecord};

use super::theme::Theme;

/// Column-aligned table of `packages`, one row per record in name order.
pub fn packages_table(packages: &PackageMap, theme: &Theme) -> String {
    let mut table = Table::new();
    table.load_preset(NOTHING);
    if theme.no_color {
        table.force_no_tty();
    } else {
        table.enforce_styling();
    }

    let header = ["name", "version", "release", "arch", "license"];
    table.set_header(header.map(|h| colored(h, Color::DarkGrey, theme)));

    for record in packages.values() {
        table.add_row(vec![
            colored(&record.name, Color::Cyan, theme),
            Cell::new(&record.version),
            Cell::new(&record.release),
            colored(&record.arch, Color::DarkGrey, theme),
            colored(&record.license, Color::DarkGrey, theme),
        ]);
    }

    table.to_string()
}

fn colored(text: &str, color: Color, theme: &Theme) -> Cell {
    let cell = Cell::new(text);
    if theme.no_color { cell } else { cell.fg(color) }
}

/// Footer line for a package table.
pub fn packages_footer(count: usize, theme: &Theme) -> String {
    let noun = if count == 1 { "package" } else { "packages" };
    theme.paint(&format!("{count} {noun}"), theme.colors.secondary)
}

/// Pretty JSON object keyed by package name.
pub fn packages_json(packages: &PackageMap) -> serde_json::Result<String> {
    serde_json::to_string_pretty(packages)
}

/// Labelled fields of one record.
pub fn package_details(record: &PackageRecord, theme: &Theme) -> String {
    let lw = 10;
    let mut out = format!(
        "{} {}\n",
        theme.bold(&theme.paint(&record.name, theme.colors.package_name)),
        theme.paint(&record.full_version(), theme.colors.version)
    );

    let mut field = |label: &str, value: &str| {
        out.push_str(&format!("  {label:<lw$}{value}\n"));
    };
    field("version", &record.version);
    field("release", &record.release);
    if let Some(epoch) = &record.epoch {
        field("epoch", epoch);
    }
    field("arch", &record.arch);
    field("license", &record.license);
    if let Some(disturl) = &record.disturl {
        field("disturl", disturl);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> PackageRecord {
        PackageRecord {
            name: name.to_string(),
            epoch: None,
            version: "5.2.15".to_string(),
            release: "150500.2.1".to_string(),
            arch: "x86_64".to_string(),
            disturl: Some("obs://build.opensuse.org/SUSE:SLE-15-SP5:GA/standard/1".to_string()),
            license: "GPL-3.0-or-later".to_string(),
        }
    }

    fn packages() -> PackageMap {
        ["bash", "aaa_base"]
            .into_iter()
            .map(|n| (n.to_string(), record(n)))
            .collect()
    }

    #[test]
    fn table_lists_rows_in_name_order() {
        let out = packages_table(&packages(), &Theme::new(true));
        let aaa = out.find("aaa_base").unwrap();
        let bash = out.find("bash").unwrap();
        assert!(aaa < bash);
        assert!(out.contains("license"));
        assert!(out.contains("150500.2.1"));
        assert!(!out.contains('\u{1b}'));
    }

    #[test]
    fn json_is_keyed_by_name() {
        let json: serde_json::Value =
            serde_json::from_str(&packages_json(&packages()).unwrap()).unwrap();
        assert_eq!(json["bash"]["version"], "5.2.15");
        assert!(json["bash"].get("epoch").is_none());
    }

    #[test]
    fn details_skip_absent_fields() {
        let out = package_details(&record("bash"), &Theme::new(true));
        assert!(out.starts_with("bash 5.2.15-150500.2.1\n"));
        assert!(out.contains("  license   GPL-3.0-or-later\n"));
        assert!(!out.contains("epoch"));
        assert!(out.contains("disturl"));
    }

    #[test]
    fn footer_pluralizes() {
        let theme = Theme::new(true);
        assert_eq!(packages_footer(1, &theme), "1 package");
        assert_eq!(packages_footer(3, &theme), "3 packages");
    }
}

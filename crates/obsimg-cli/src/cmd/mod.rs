//! Command implementations

pub mod download;
pub mod packages;

use obsimg_core::{HttpFetcher, ImageResolver, ResolverConfig};

use crate::config::Settings;
use crate::ui::{ConsoleReporter, Theme};

/// Resolver over HTTP reporting to the console.
fn resolver(
    config: ResolverConfig,
    settings: &Settings,
) -> ImageResolver<HttpFetcher, obsimg_core::SystemClock, ConsoleReporter> {
    let reporter = ConsoleReporter::new(Theme::new(settings.no_color), settings.is_quiet());
    ImageResolver::new(config, HttpFetcher::new()).with_reporter(reporter)
}

//! The resolver ties the pipeline together for one run.
//!
//! The artifact streams into a temporary file beside its final path. It is
//! only renamed into place once verified (or verification was explicitly
//! skipped), so a failed run leaves no file at the final path.

use std::path::{Path, PathBuf};
use std::time::Duration;

use obsimg_schema::{Condition, DownloadTarget, FilterSpec, PackageMap, ResolvedArtifact};
use tracing::{debug, info};

use crate::persist::StagedFile;
use crate::poller::ConditionPoller;
use crate::verify::{ChecksumAlgorithm, DigestWriter, IntegrityVerifier};
use crate::{
    Clock, Fetch, NullReporter, Reporter, ResolveError, Snapshot, SystemClock, filter, listing,
    manifest, selector,
};

/// Pause between condition polling attempts.
pub const RETRY_INTERVAL: Duration = Duration::from_secs(150);

/// Everything a run needs, built once by the caller and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    pub target: DownloadTarget,
    /// Directory the artifact and its checksum are written to.
    pub download_dir: PathBuf,
    /// Readiness conditions; empty means download right away.
    pub conditions: Vec<Condition>,
    /// Total polling budget. Zero means a single attempt.
    pub conditions_wait: Duration,
    pub retry_interval: Duration,
    pub skip_verify: bool,
    /// Base64 ed25519 key for detached signatures.
    pub public_key: Option<String>,
    /// Licenses and package patterns that must not be in the image.
    pub disallow: FilterSpec,
}

impl ResolverConfig {
    pub fn new(target: DownloadTarget, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            target,
            download_dir: download_dir.into(),
            conditions: Vec::new(),
            conditions_wait: Duration::ZERO,
            retry_interval: RETRY_INTERVAL,
            skip_verify: false,
            public_key: None,
            disallow: FilterSpec::default(),
        }
    }
}

/// Resolves, gates, downloads and verifies one image.
pub struct ImageResolver<F, C = SystemClock, R = NullReporter> {
    config: ResolverConfig,
    fetcher: F,
    clock: C,
    reporter: R,
}

impl<F: Fetch> ImageResolver<F> {
    pub fn new(config: ResolverConfig, fetcher: F) -> Self {
        Self {
            config,
            fetcher,
            clock: SystemClock::new(),
            reporter: NullReporter,
        }
    }
}

impl<F: Fetch, C: Clock, R: Reporter> ImageResolver<F, C, R> {
    /// Replace the clock used for polling waits.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> ImageResolver<F, C2, R> {
        ImageResolver {
            config: self.config,
            fetcher: self.fetcher,
            clock,
            reporter: self.reporter,
        }
    }

    /// Replace the progress sink.
    pub fn with_reporter<R2: Reporter>(self, reporter: R2) -> ImageResolver<F, C, R2> {
        ImageResolver {
            config: self.config,
            fetcher: self.fetcher,
            clock: self.clock,
            reporter,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// List the remote directory and pick the newest matching artifact.
    ///
    /// # Errors
    ///
    /// [`ResolveError::Network`] or [`ResolveError::NotFound`].
    pub fn resolve_artifact(&self) -> Result<ResolvedArtifact, ResolveError> {
        let entries = listing::list_entries(&self.fetcher, &self.config.target)?;
        selector::resolve(&entries, &self.config.target)
    }

    /// Fetch and parse the manifest published next to `artifact`.
    ///
    /// # Errors
    ///
    /// [`ResolveError::Network`] or [`ResolveError::Parse`].
    pub fn fetch_packages(&self, artifact: &ResolvedArtifact) -> Result<PackageMap, ResolveError> {
        let name = manifest::manifest_filename(artifact, &self.config.target);
        let body = self.fetcher.get(&self.config.target.file_url(&name))?;
        manifest::parse(&body)
    }

    /// Resolve the current artifact and read its manifest.
    ///
    /// # Errors
    ///
    /// Any error of [`Self::resolve_artifact`] or [`Self::fetch_packages`].
    pub fn snapshot(&self) -> Result<Snapshot, ResolveError> {
        let artifact = self.resolve_artifact()?;
        let packages = self.fetch_packages(&artifact)?;
        Ok(Snapshot { artifact, packages })
    }

    /// Package records of the newest matching image.
    ///
    /// # Errors
    ///
    /// Any error of [`Self::snapshot`].
    pub fn packages(&self) -> Result<PackageMap, ResolveError> {
        self.reporter.section("Resolving");
        let snapshot = self.snapshot()?;
        self.reporter.info(&format!("Using {}", snapshot.artifact));
        Ok(snapshot.packages)
    }

    /// Poll until the configured conditions hold on one snapshot.
    ///
    /// Returns `None` without touching the network if there are no
    /// conditions.
    ///
    /// # Errors
    ///
    /// [`ResolveError::ConditionsNotMet`] once the budget is spent.
    pub fn wait_for_conditions(&self) -> Result<Option<Snapshot>, ResolveError> {
        ConditionPoller::new(
            &self.config.conditions,
            self.config.conditions_wait,
            self.config.retry_interval,
            &self.clock,
        )
        .poll(|| self.snapshot(), &self.reporter)
    }

    /// Run the whole pipeline and return the path of the downloaded image.
    ///
    /// # Errors
    ///
    /// Any [`ResolveError`]; on error nothing has been written to the
    /// download directory.
    pub fn download(&self) -> Result<PathBuf, ResolveError> {
        self.reporter.section("Resolving");

        let (artifact, packages) = match self.wait_for_conditions()? {
            Some(snapshot) => (snapshot.artifact, Some(snapshot.packages)),
            None => (self.resolve_artifact()?, None),
        };
        debug!("Selected {artifact}");
        self.reporter.info(&format!("Selected {artifact}"));

        if !self.config.disallow.is_empty() {
            let packages = match packages {
                Some(packages) => packages,
                None => self.fetch_packages(&artifact)?,
            };
            let offending = filter::disallowed(&packages, &self.config.disallow);
            if !offending.is_empty() {
                return Err(ResolveError::DisallowedPackages(offending));
            }
            debug!("No disallowed packages in {}", artifact.filename);
        }

        let dir: &Path = &self.config.download_dir;
        let fresh_dir = !dir.exists();
        let result = self.store(&artifact);
        if result.is_err() && fresh_dir {
            // only removes it while still empty
            let _ = std::fs::remove_dir(dir);
        }

        let path = result?;
        debug!("Image written to {}", path.display());
        Ok(path)
    }

    /// Stream the artifact into a staged file, verify it, then move it and
    /// its checksum file into place.
    fn store(&self, artifact: &ResolvedArtifact) -> Result<PathBuf, ResolveError> {
        let target = &self.config.target;
        let dir: &Path = &self.config.download_dir;
        let algorithm = if self.config.skip_verify {
            None
        } else {
            Some(ChecksumAlgorithm::from_extension(&target.checksum_extension)?)
        };

        self.reporter.section("Downloading");
        let mut staged = StagedFile::new(dir)?;
        let mut sink = DigestWriter::new(staged.file_mut(), algorithm);
        let mut progress = |current: u64, total: Option<u64>| {
            self.reporter.downloading(&artifact.filename, current, total);
        };
        let size = self.fetcher.download(&artifact.url, &mut sink, &mut progress)?;
        let digest = sink.finish()?;
        debug!("Downloaded {size} bytes of {}", artifact.filename);

        let checksum = match digest {
            Some(digest) => {
                let verifier =
                    IntegrityVerifier::new(&self.fetcher, self.config.public_key.as_deref());
                let verification = verifier.verify(staged.path(), &digest, artifact, target)?;
                self.reporter.success(&format!(
                    "Verified {} checksum{}",
                    target.checksum_extension,
                    if verification.signed { " and signature" } else { "" }
                ));
                Some(StagedFile::with_contents(dir, &verification.checksum_file)?)
            }
            None => {
                info!("Skipping verification of {}", artifact.filename);
                None
            }
        };

        let path = staged.persist(&artifact.filename)?;
        if let Some(checksum) = checksum {
            let name = format!("{}.{}", artifact.filename, target.checksum_extension);
            if let Err(e) = checksum.persist(&name) {
                let _ = std::fs::remove_file(&path);
                return Err(e);
            }
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poller::ManualClock;
    use std::cell::RefCell;
    use std::collections::HashMap;

    const BASE: &str = "https://obs.example/images";
    const OLD: &str = "Leap.x86_64-1.0.0-Build1.1.raw.xz";
    const NEW: &str = "Leap.x86_64-1.1.0-Build1.1.raw.xz";

    /// In-memory build service; the listing changes after `publish_after`
    /// listing reads.
    struct FakeService {
        files: HashMap<String, Vec<u8>>,
        publish_after: usize,
        listings: RefCell<usize>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeService {
        fn new(publish_after: usize) -> Self {
            let mut files = HashMap::new();
            files.insert(
                format!("{BASE}/Leap.x86_64-1.0.0-Build1.1.packages"),
                b"kernel-default||5.3.18|1|x86_64||GPL-2.0\n".to_vec(),
            );
            files.insert(
                format!("{BASE}/Leap.x86_64-1.1.0-Build1.1.packages"),
                b"kernel-default||5.14.21|1|x86_64||GPL-2.0\n".to_vec(),
            );
            files.insert(format!("{BASE}/{OLD}"), b"old".to_vec());
            files.insert(format!("{BASE}/{NEW}"), b"new".to_vec());
            Self {
                files,
                publish_after,
                listings: RefCell::new(0),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl Fetch for FakeService {
        fn get(&self, url: &str) -> Result<Vec<u8>, ResolveError> {
            self.calls.borrow_mut().push(url.to_string());
            if url == format!("{BASE}/") {
                let mut seen = self.listings.borrow_mut();
                *seen += 1;
                let mut body = format!("{OLD}\n");
                if *seen > self.publish_after {
                    body.push_str(NEW);
                }
                return Ok(body.into_bytes());
            }
            self.files
                .get(url)
                .cloned()
                .ok_or_else(|| ResolveError::network(url, "HTTP 404 Not Found"))
        }
    }

    fn config(dir: &Path) -> ResolverConfig {
        let mut config = ResolverConfig::new(DownloadTarget::new(BASE, "Leap"), dir);
        config.skip_verify = true;
        config
    }

    #[test]
    fn poller_downloads_the_snapshot_that_satisfied_it() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.conditions = vec!["kernel-default>=5.14".parse().unwrap()];
        config.conditions_wait = Duration::from_secs(300);

        let clock = ManualClock::new();
        let service = FakeService::new(1);
        let path = ImageResolver::new(config, &service)
            .with_clock(&clock)
            .download()
            .unwrap();

        assert_eq!(path, dir.path().join(NEW));
        assert_eq!(std::fs::read(&path).unwrap(), b"new");
        assert_eq!(clock.sleeps(), 1);
    }

    #[test]
    fn unmet_conditions_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.conditions = vec![Condition::image("2.0.0")];

        let err = ImageResolver::new(config, FakeService::new(0))
            .with_clock(ManualClock::new())
            .download()
            .unwrap_err();

        assert!(err.is_not_ready());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn disallowed_package_aborts_before_download() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.disallow.packages = vec!["kernel-*".to_string()];

        let service = FakeService::new(0);
        let err = ImageResolver::new(config, &service).download().unwrap_err();

        match err {
            ResolveError::DisallowedPackages(names) => assert_eq!(names, vec!["kernel-default"]),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!service.calls.borrow().iter().any(|u| u.ends_with(".raw.xz")));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn packages_come_from_the_newest_image() {
        let dir = tempfile::tempdir().unwrap();
        let packages = ImageResolver::new(config(dir.path()), FakeService::new(0))
            .packages()
            .unwrap();
        assert_eq!(packages["kernel-default"].version, "5.14.21");
    }
}

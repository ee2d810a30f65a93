//! Datastore addressing — deterministic `root/area/domain/YYYY/MM/DD` paths
//! and enumeration of existing date partitions.
//!
//! Nominal layout under the storage root:
//!
//! ```text
//! <root>/
//!     01-Mine/<Domain>/YYYY/MM/DD/
//!     02-Analysis/<Domain>/YYYY/MM/DD/
//!     03-Present/<Domain>/YYYY/MM/DD/
//! ```
//!
//! Area aliases: `mine` -> `01-Mine`, `analysis`/`analyse`/`analyze` ->
//! `02-Analysis`, `present` -> `03-Present`. Unknown areas pass through
//! verbatim. Skills never build datastore paths by hand; they go through
//! this module so the folder rules stay in one place.

use super::error::Error;
use super::timeframe::Timeframe;
use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn domain_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z]+$").unwrap())
}

/// Validate a domain label: non-empty, alphabetic only, case preserved.
pub fn validate_domain(domain: &str) -> Result<&str, Error> {
    let cleaned = domain.trim();
    if !domain_pattern().is_match(cleaned) {
        return Err(Error::DomainInvalid(domain.to_string()));
    }
    Ok(cleaned)
}

/// Resolves datastore addresses under a fixed storage root.
///
/// The (root, area, domain, date) -> path mapping is a pure function;
/// directory creation is the only side effect and is idempotent. Concurrent
/// runs from independent processes are not coordinated beyond that
/// create-or-noop guarantee — there is no file locking here.
#[derive(Debug, Clone)]
pub struct FolderNavigator {
    root: PathBuf,
}

impl FolderNavigator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map an area alias to its on-disk directory name.
    pub fn normalize_area(area: &str) -> String {
        match area.trim().to_ascii_lowercase().as_str() {
            "mine" => "01-Mine".to_string(),
            "analysis" | "analyse" | "analyze" => "02-Analysis".to_string(),
            "present" => "03-Present".to_string(),
            _ => area.trim().to_string(),
        }
    }

    pub fn area_root(&self, area: &str) -> PathBuf {
        self.root.join(Self::normalize_area(area))
    }

    /// Area + validated domain. Touches nothing on disk.
    pub fn domain_root(&self, area: &str, domain: &str) -> Result<PathBuf, Error> {
        let domain = validate_domain(domain)?;
        Ok(self.area_root(area).join(domain))
    }

    /// Resolve the path for a dated partition. Domain validation happens
    /// before any path is touched. With `create`, every missing directory on
    /// the path is created; on failure the directories this call created are
    /// removed again, so the caller never inherits a half-built path.
    pub fn date_path(
        &self,
        area: &str,
        domain: &str,
        date: NaiveDate,
        create: bool,
    ) -> Result<PathBuf, Error> {
        let path = self
            .domain_root(area, domain)?
            .join(format!("{:04}", date.year()))
            .join(format!("{:02}", date.month()))
            .join(format!("{:02}", date.day()));
        if create {
            create_scoped(&path)?;
        }
        Ok(path)
    }

    /// Resolve the partition for the current date. Writers log against
    /// "now"; readers query historical ranges via [`Self::partitions`].
    pub fn today_path(&self, area: &str, domain: &str, create: bool) -> Result<PathBuf, Error> {
        self.date_path(area, domain, Local::now().date_naive(), create)
    }

    /// Lazily enumerate existing date partitions under a domain whose date
    /// satisfies `timeframe`, ascending by (year, month, day). Missing
    /// intermediate levels are skipped; a domain with no matching partitions
    /// yields an empty iterator. Call again to restart.
    pub fn partitions(
        &self,
        area: &str,
        domain: &str,
        timeframe: Timeframe,
    ) -> Result<Partitions, Error> {
        let domain_root = self.domain_root(area, domain)?;
        Ok(Partitions::new(domain_root, timeframe))
    }

    /// Existing domain directories under an area, sorted by name.
    pub fn list_domains(&self, area: &str) -> Vec<String> {
        let mut names: Vec<String> = read_subdirs(&self.area_root(area))
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        names.sort();
        names
    }

    /// The most recent existing partition under a domain, if any.
    pub fn latest_date_path(&self, area: &str, domain: &str) -> Result<Option<(NaiveDate, PathBuf)>, Error> {
        Ok(self.partitions(area, domain, Timeframe::Any)?.last())
    }
}

/// Create every missing directory on `path`, removing anything this call
/// created if a later step fails. Existing directories are left untouched,
/// so a repeat call is a no-op.
fn create_scoped(path: &Path) -> Result<(), Error> {
    let mut created: Vec<PathBuf> = Vec::new();
    let mut current = PathBuf::new();

    for component in path.components() {
        current.push(component);
        if current.exists() {
            continue;
        }
        match fs::create_dir(&current) {
            Ok(()) => created.push(current.clone()),
            // Races with a sibling process creating the same partition.
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                for dir in created.iter().rev() {
                    let _ = fs::remove_dir(dir);
                }
                return Err(Error::PathUnwritable {
                    path: current,
                    reason: e.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Subdirectories of `dir` whose names parse as a zero-padded number of the
/// given width, sorted ascending by value. A missing or unreadable directory
/// yields nothing.
fn numbered_subdirs(dir: &Path, width: usize) -> Vec<(u32, PathBuf)> {
    let mut out: Vec<(u32, PathBuf)> = read_subdirs(dir)
        .into_iter()
        .filter(|(name, _)| name.len() == width && name.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|(name, path)| name.parse::<u32>().ok().map(|n| (n, path)))
        .collect();
    out.sort_by_key(|(n, _)| *n);
    out
}

fn read_subdirs(dir: &Path) -> Vec<(String, PathBuf)> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .flatten()
        .filter(|e| e.path().is_dir())
        .filter_map(|e| {
            let name = e.file_name().into_string().ok()?;
            Some((name, e.path()))
        })
        .collect()
}

/// Lazy ascending iterator over `(date, path)` partition pairs.
///
/// Year directories are listed up front; month and day levels are read only
/// as the iteration reaches them.
#[derive(Debug)]
pub struct Partitions {
    timeframe: Timeframe,
    // Pending levels, each sorted ascending and consumed front-first.
    years: std::vec::IntoIter<(u32, PathBuf)>,
    months: std::vec::IntoIter<(u32, PathBuf)>,
    days: std::vec::IntoIter<(u32, PathBuf)>,
    current_year: i32,
    current_month: u32,
}

impl Partitions {
    fn new(domain_root: PathBuf, timeframe: Timeframe) -> Self {
        Self {
            timeframe,
            years: numbered_subdirs(&domain_root, 4).into_iter(),
            months: Vec::new().into_iter(),
            days: Vec::new().into_iter(),
            current_year: 0,
            current_month: 0,
        }
    }
}

impl Iterator for Partitions {
    type Item = (NaiveDate, PathBuf);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((day, path)) = self.days.next() {
                let Some(date) = NaiveDate::from_ymd_opt(self.current_year, self.current_month, day)
                else {
                    continue;
                };
                if self.timeframe.matches(date) {
                    return Some((date, path));
                }
                continue;
            }
            if let Some((month, path)) = self.months.next() {
                self.current_month = month;
                self.days = numbered_subdirs(&path, 2).into_iter();
                continue;
            }
            let (year, path) = self.years.next()?;
            self.current_year = i32::try_from(year).ok()?;
            self.months = numbered_subdirs(&path, 2).into_iter();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seed_partition(nav: &FolderNavigator, area: &str, domain: &str, y: i32, m: u32, d: u32) {
        nav.date_path(area, domain, date(y, m, d), true).unwrap();
    }

    #[test]
    fn test_validate_domain() {
        assert_eq!(validate_domain("News").unwrap(), "News");
        assert_eq!(validate_domain("  Energy  ").unwrap(), "Energy");
        assert!(validate_domain("").is_err());
        assert!(validate_domain("news-2026").is_err());
        assert!(validate_domain("a/b").is_err());
        assert!(validate_domain("..").is_err());
    }

    #[test]
    fn test_area_aliases() {
        assert_eq!(FolderNavigator::normalize_area("mine"), "01-Mine");
        assert_eq!(FolderNavigator::normalize_area("MINE"), "01-Mine");
        assert_eq!(FolderNavigator::normalize_area("analysis"), "02-Analysis");
        assert_eq!(FolderNavigator::normalize_area("analyse"), "02-Analysis");
        assert_eq!(FolderNavigator::normalize_area("analyze"), "02-Analysis");
        assert_eq!(FolderNavigator::normalize_area("present"), "03-Present");
        assert_eq!(FolderNavigator::normalize_area("custom"), "custom");
    }

    #[test]
    fn test_date_path_shape() {
        let nav = FolderNavigator::new("/data/store");
        let path = nav
            .date_path("mine", "News", date(2026, 2, 3), false)
            .unwrap();
        assert_eq!(
            path,
            PathBuf::from("/data/store/01-Mine/News/2026/02/03")
        );
    }

    #[test]
    fn test_date_path_create_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let nav = FolderNavigator::new(dir.path());
        let first = nav.date_path("mine", "News", date(2026, 2, 20), true).unwrap();
        assert!(first.is_dir());
        let second = nav.date_path("mine", "News", date(2026, 2, 20), true).unwrap();
        assert_eq!(first, second);
        assert!(second.is_dir());
    }

    #[test]
    fn test_date_path_rejects_domain_before_touching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let nav = FolderNavigator::new(dir.path());
        let err = nav
            .date_path("mine", "bad domain", date(2026, 2, 20), true)
            .unwrap_err();
        assert!(matches!(err, Error::DomainInvalid(_)));
        assert!(!dir.path().join("01-Mine").exists());
    }

    #[test]
    fn test_create_scoped_rolls_back_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where a directory is needed makes creation fail
        // partway down the path.
        let obstacle = dir.path().join("a").join("b");
        fs::create_dir_all(obstacle.parent().unwrap()).unwrap();
        fs::write(&obstacle, "not a directory").unwrap();

        let target = dir.path().join("a").join("b").join("c").join("d");
        let err = create_scoped(&target).unwrap_err();
        assert!(matches!(err, Error::PathUnwritable { .. }));
        // Nothing new left behind beyond the pre-existing obstacle.
        assert!(obstacle.is_file());
        assert!(!dir.path().join("a").join("b").join("c").exists());
    }

    #[test]
    fn test_partitions_filtered_and_ascending() {
        let dir = tempfile::tempdir().unwrap();
        let nav = FolderNavigator::new(dir.path());
        // Deliberately seeded out of order.
        seed_partition(&nav, "mine", "News", 2026, 2, 15);
        seed_partition(&nav, "mine", "News", 2026, 3, 1);
        seed_partition(&nav, "mine", "News", 2026, 2, 1);
        seed_partition(&nav, "mine", "News", 2026, 1, 31);

        let tf = Timeframe::parse("2026/02").unwrap();
        let found: Vec<NaiveDate> = nav
            .partitions("mine", "News", tf)
            .unwrap()
            .map(|(d, _)| d)
            .collect();
        assert_eq!(found, vec![date(2026, 2, 1), date(2026, 2, 15)]);
    }

    #[test]
    fn test_partitions_ascending_across_years() {
        let dir = tempfile::tempdir().unwrap();
        let nav = FolderNavigator::new(dir.path());
        seed_partition(&nav, "mine", "News", 2027, 1, 1);
        seed_partition(&nav, "mine", "News", 2025, 12, 31);
        seed_partition(&nav, "mine", "News", 2026, 6, 15);

        let found: Vec<NaiveDate> = nav
            .partitions("mine", "News", Timeframe::Any)
            .unwrap()
            .map(|(d, _)| d)
            .collect();
        assert_eq!(
            found,
            vec![date(2025, 12, 31), date(2026, 6, 15), date(2027, 1, 1)]
        );
    }

    #[test]
    fn test_partitions_missing_domain_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let nav = FolderNavigator::new(dir.path());
        let found: Vec<_> = nav
            .partitions("mine", "Nothing", Timeframe::Any)
            .unwrap()
            .collect();
        assert!(found.is_empty());
    }

    #[test]
    fn test_partitions_skips_nonconforming_names() {
        let dir = tempfile::tempdir().unwrap();
        let nav = FolderNavigator::new(dir.path());
        seed_partition(&nav, "mine", "News", 2026, 2, 1);
        let domain_root = nav.domain_root("mine", "News").unwrap();
        fs::create_dir_all(domain_root.join("notes")).unwrap();
        fs::create_dir_all(domain_root.join("2026").join("2")).unwrap();
        fs::create_dir_all(domain_root.join("2026").join("02").join("32")).unwrap();

        let found: Vec<NaiveDate> = nav
            .partitions("mine", "News", Timeframe::Any)
            .unwrap()
            .map(|(d, _)| d)
            .collect();
        assert_eq!(found, vec![date(2026, 2, 1)]);
    }

    #[test]
    fn test_partitions_restartable() {
        let dir = tempfile::tempdir().unwrap();
        let nav = FolderNavigator::new(dir.path());
        seed_partition(&nav, "mine", "News", 2026, 2, 1);
        seed_partition(&nav, "mine", "News", 2026, 2, 2);

        let first: Vec<_> = nav.partitions("mine", "News", Timeframe::Any).unwrap().collect();
        let second: Vec<_> = nav.partitions("mine", "News", Timeframe::Any).unwrap().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_latest_date_path() {
        let dir = tempfile::tempdir().unwrap();
        let nav = FolderNavigator::new(dir.path());
        assert!(nav.latest_date_path("mine", "News").unwrap().is_none());

        seed_partition(&nav, "mine", "News", 2026, 1, 5);
        seed_partition(&nav, "mine", "News", 2026, 2, 20);
        seed_partition(&nav, "mine", "News", 2025, 12, 31);

        let (latest, path) = nav.latest_date_path("mine", "News").unwrap().unwrap();
        assert_eq!(latest, date(2026, 2, 20));
        assert!(path.ends_with("01-Mine/News/2026/02/20"));
    }

    #[test]
    fn test_list_domains_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let nav = FolderNavigator::new(dir.path());
        seed_partition(&nav, "mine", "Energy", 2026, 1, 1);
        seed_partition(&nav, "mine", "News", 2026, 1, 1);
        seed_partition(&nav, "mine", "Defence", 2026, 1, 1);
        assert_eq!(nav.list_domains("mine"), vec!["Defence", "Energy", "News"]);
        assert!(nav.list_domains("present").is_empty());
    }

    #[test]
    fn test_today_path_uses_current_date() {
        let dir = tempfile::tempdir().unwrap();
        let nav = FolderNavigator::new(dir.path());
        let today = Local::now().date_naive();
        let expected = nav.date_path("present", "News", today, false).unwrap();
        assert_eq!(nav.today_path("present", "News", false).unwrap(), expected);
    }
}

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::catalog::CatalogError;
use crate::orbit::parsing::{parse_multi_tle, IncompleteSet};
use crate::orbit::{OrbitalElementSet, Propagator, TrackedSatellite};

/// Information about a single satellite from its TLE.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SatelliteInfo {
    pub name: String,
    pub norad_id: u64,
    pub tle_source: String,
    pub epoch: DateTime<Utc>,
    pub period_minutes: f64,
}

#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub info: SatelliteInfo,
    pub elements: OrbitalElementSet,
    pub propagator: Propagator,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RejectedEntry {
    pub source: String,
    pub name: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct LoadReport {
    pub loaded: usize,
    pub rejected: Vec<RejectedEntry>,
}

impl LoadReport {
    fn merge(&mut self, other: LoadReport) {
        self.loaded += other.loaded;
        self.rejected.extend(other.rejected);
    }
}

/// Satellites known to the console and their latest ground tracks.
pub struct Catalog {
    tle_dir: Option<PathBuf>,
    satellites: HashMap<u64, CatalogEntry>,
    tracks: HashMap<u64, TrackedSatellite>,
}

impl Catalog {
    pub fn new(tle_dir: PathBuf) -> Self {
        Self {
            tle_dir: Some(tle_dir),
            satellites: HashMap::new(),
            tracks: HashMap::new(),
        }
    }

    /// An empty copy to rebuild off to the side. A folder-backed catalog
    /// reloads its folder; an in-memory one keeps its satellites.
    pub fn staging_copy(&self) -> Self {
        let satellites = match self.tle_dir {
            Some(_) => HashMap::new(),
            None => self.satellites.clone(),
        };
        Self {
            tle_dir: self.tle_dir.clone(),
            satellites,
            tracks: HashMap::new(),
        }
    }

    /// A catalog fed only through `ingest`.
    pub fn in_memory() -> Self {
        Self {
            tle_dir: None,
            satellites: HashMap::new(),
            tracks: HashMap::new(),
        }
    }

    /// Replace the catalog with every `*.tle` / `*.txt` file in the folder.
    ///
    /// Unreadable files and bad element sets are reported, not fatal.
    pub fn load_all(&mut self) -> Result<LoadReport, CatalogError> {
        let Some(tle_dir) = self.tle_dir.clone() else {
            return Ok(LoadReport::default());
        };
        if !tle_dir.is_dir() {
            return Err(CatalogError::DirectoryNotFound(
                tle_dir.display().to_string(),
            ));
        }

        let mut paths = Vec::new();
        for entry in fs::read_dir(&tle_dir)? {
            let path = entry?.path();
            if path.is_file() && is_tle_file(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        self.satellites.clear();
        self.tracks.clear();

        let mut report = LoadReport::default();
        for path in paths {
            let source = path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string();
            match fs::read_to_string(&path) {
                Ok(content) => report.merge(self.ingest(&source, &content)),
                Err(e) => {
                    log::warn!("Failed to read TLE file {}: {}", path.display(), e);
                    report.rejected.push(RejectedEntry {
                        source,
                        name: None,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if self.is_empty() {
            log::warn!("No usable element sets in {}", tle_dir.display());
        }
        log::info!(
            "Loaded {} satellites from {} ({} rejected)",
            report.loaded,
            tle_dir.display(),
            report.rejected.len()
        );
        Ok(report)
    }

    /// Add every element set found in `content`. A later set for the same
    /// catalog number replaces the earlier one.
    pub fn ingest(&mut self, source: &str, content: &str) -> LoadReport {
        let mut report = LoadReport::default();

        for tle in parse_multi_tle(content) {
            let tle = match tle {
                Ok(tle) => tle,
                Err(IncompleteSet { name, reason }) => {
                    log::warn!(
                        "Incomplete element set {} in {}: {}",
                        name.as_deref().unwrap_or("(unnamed)"),
                        source,
                        reason
                    );
                    report.rejected.push(RejectedEntry {
                        source: source.to_string(),
                        name,
                        reason,
                    });
                    continue;
                }
            };
            let parsed = OrbitalElementSet::from_tle(&tle)
                .and_then(|elements| Propagator::new(&elements).map(|p| (elements, p)));

            match parsed {
                Ok((elements, propagator)) => {
                    let info = SatelliteInfo {
                        name: elements.display_name(),
                        norad_id: elements.catalog_number,
                        tle_source: source.to_string(),
                        epoch: elements.epoch,
                        period_minutes: elements.period_minutes(),
                    };
                    self.tracks.remove(&info.norad_id);
                    self.satellites.insert(
                        info.norad_id,
                        CatalogEntry {
                            info,
                            elements,
                            propagator,
                        },
                    );
                    report.loaded += 1;
                }
                Err(e) => {
                    log::warn!(
                        "Skipping element set {} from {}: {}",
                        tle.name.as_deref().unwrap_or("(unnamed)"),
                        source,
                        e
                    );
                    report.rejected.push(RejectedEntry {
                        source: source.to_string(),
                        name: tle.name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        report
    }

    /// Regenerate the track of every satellite from `reference`.
    ///
    /// Returns the number of satellites that now have a track.
    pub fn refresh_tracks(&mut self, reference: DateTime<Utc>, minutes: u32) -> usize {
        self.tracks.clear();
        for entry in self.satellites.values() {
            let tracked = TrackedSatellite::from_ephemeris(
                entry.info.name.clone(),
                entry.info.norad_id,
                &entry.propagator,
                reference,
                minutes,
            );
            self.tracks.insert(entry.info.norad_id, tracked);
        }
        log::debug!(
            "Regenerated {} of {} tracks at {}",
            self.tracks.len(),
            self.satellites.len(),
            reference
        );
        self.tracks.len()
    }

    /// All satellites, ordered by catalog number.
    pub fn satellites(&self) -> Vec<&CatalogEntry> {
        let mut entries: Vec<_> = self.satellites.values().collect();
        entries.sort_by_key(|e| e.info.norad_id);
        entries
    }

    pub fn get(&self, norad_id: u64) -> Option<&CatalogEntry> {
        self.satellites.get(&norad_id)
    }

    pub fn track(&self, norad_id: u64) -> Option<&TrackedSatellite> {
        self.tracks.get(&norad_id)
    }

    pub fn len(&self) -> usize {
        self.satellites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.satellites.is_empty()
    }
}

fn is_tle_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("tle") | Some("txt")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbit::fixtures::*;
    use chrono::TimeZone;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "groundtrack-catalog-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 25, 6, 0, 0).unwrap()
    }

    #[test]
    fn ingest_keeps_good_sets_when_one_is_bad() {
        let bad_line2 = format!("{}0", &ISS_LINE2[..68]);
        let content = format!(
            "{ISS_TLE}\nBROKEN\n{ISS_LINE1}\n{bad_line2}\nSSO\n{SSO_LINE1}\n{SSO_LINE2}\n"
        );
        let mut catalog = Catalog::in_memory();
        let report = catalog.ingest("mixed.tle", &content);

        assert_eq!(report.loaded, 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].name.as_deref(), Some("BROKEN"));
        assert!(report.rejected[0].reason.contains("checksum"));

        let ids: Vec<u64> = catalog.satellites().iter().map(|e| e.info.norad_id).collect();
        assert_eq!(ids, vec![25544, 63211]);
        assert_eq!(catalog.get(63211).unwrap().info.name, "SSO");
    }

    #[test]
    fn truncated_sets_are_rejected_not_dropped() {
        let headless = &SSO_LINE1[2..];
        let content = format!(
            "{ISS_TLE}\nSSO\n{SSO_LINE1}\nORPHAN\n{headless}\n{SSO_LINE2}\n"
        );
        let mut catalog = Catalog::in_memory();
        let report = catalog.ingest("broken.tle", &content);

        assert_eq!(report.loaded, 1);
        assert_eq!(report.rejected.len(), 2);
        assert_eq!(report.rejected[0].name.as_deref(), Some("SSO"));
        assert_eq!(report.rejected[1].name.as_deref(), Some("ORPHAN"));
        assert!(report.rejected.iter().all(|r| r.source == "broken.tle"));
        assert!(catalog.get(63211).is_none());
    }

    #[test]
    fn staging_copy_keeps_in_memory_satellites() {
        let mut catalog = Catalog::in_memory();
        catalog.ingest("iss.tle", ISS_TLE);
        catalog.refresh_tracks(reference(), 10);

        let copy = catalog.staging_copy();
        assert_eq!(copy.len(), 1);
        assert!(copy.track(25544).is_none());

        let folder = Catalog::new(PathBuf::from("/nonexistent/groundtrack/tle"));
        assert!(folder.staging_copy().is_empty());
    }

    #[test]
    fn refresh_tracks_every_satellite() {
        let mut catalog = Catalog::in_memory();
        catalog.ingest("sso.tle", &format!("{SSO_LINE1}\n{SSO_LINE2}\n"));
        catalog.ingest("iss.tle", ISS_TLE);

        assert_eq!(catalog.refresh_tracks(reference(), 95), 2);
        let sso = catalog.track(63211).unwrap();
        assert_eq!(sso.last_update, reference());
        assert_eq!(sso.track.len(), 96);
        assert!(catalog.track(25544).is_some());
    }

    #[test]
    fn reingest_drops_stale_track() {
        let mut catalog = Catalog::in_memory();
        catalog.ingest("iss.tle", ISS_TLE);
        catalog.refresh_tracks(reference(), 10);
        assert!(catalog.track(25544).is_some());

        catalog.ingest("iss.tle", ISS_TLE);
        assert!(catalog.track(25544).is_none());
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn loads_tle_files_from_folder() {
        let dir = temp_dir("load");
        fs::write(dir.join("iss.tle"), ISS_TLE).unwrap();
        fs::write(dir.join("sso.txt"), format!("{SSO_LINE1}\n{SSO_LINE2}\n")).unwrap();
        fs::write(dir.join("notes.md"), ISS_TLE).unwrap();

        let mut catalog = Catalog::new(dir.clone());
        let report = catalog.load_all().unwrap();
        assert_eq!(report.loaded, 2);
        assert!(report.rejected.is_empty());
        assert_eq!(catalog.get(25544).unwrap().info.tle_source, "iss.tle");

        fs::remove_file(dir.join("sso.txt")).unwrap();
        catalog.load_all().unwrap();
        assert_eq!(catalog.len(), 1);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_folder_is_an_error() {
        let mut catalog = Catalog::new(PathBuf::from("/nonexistent/groundtrack/tle"));
        assert!(matches!(
            catalog.load_all(),
            Err(CatalogError::DirectoryNotFound(_))
        ));
    }
}

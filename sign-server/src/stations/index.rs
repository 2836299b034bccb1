//! Stop ID → station name index.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::Serialize;
use tracing::{info, warn};

use super::error::StationError;

/// Direction suffixes on platform-level stop IDs.
const DIRECTION_SUFFIXES: [char; 2] = ['N', 'S'];

/// A station search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationMatch {
    pub id: String,
    pub name: String,
}

/// Lazily loaded station name lookup.
///
/// The table is read on first access. A missing or malformed table is
/// logged once and leaves the index empty: lookups then echo the ID back
/// and searches find nothing.
#[derive(Debug)]
pub struct StationIndex {
    path: PathBuf,
    stops: OnceLock<HashMap<String, String>>,
}

impl StationIndex {
    /// Index backed by the table at `path`, not yet read.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            stops: OnceLock::new(),
        }
    }

    /// Index over the given `(id, name)` pairs.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            path: PathBuf::new(),
            stops: OnceLock::from(entries.into_iter().collect::<HashMap<_, _>>()),
        }
    }

    /// The ID → name mapping, reading the table if this is the first use.
    pub fn load(&self) -> &HashMap<String, String> {
        self.stops.get_or_init(|| match read_table(&self.path) {
            Ok(stops) => {
                info!(stations = stops.len(), path = %self.path.display(), "Loaded station table");
                stops
            }
            Err(e) => {
                warn!(error = %e, "Station name lookup will be unavailable");
                HashMap::new()
            }
        })
    }

    /// Station name for a stop ID.
    ///
    /// Tries the ID as given, then with any direction suffix removed, and
    /// falls back to the ID itself.
    pub fn resolve(&self, id: &str) -> String {
        let stops = self.load();

        if let Some(name) = stops.get(id) {
            return name.clone();
        }

        id.strip_suffix(DIRECTION_SUFFIXES)
            .and_then(|base| stops.get(base))
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    /// Stations whose name contains `term`, ignoring case, sorted by name.
    ///
    /// Direction-suffixed platform IDs are skipped so each station appears
    /// once.
    pub fn search(&self, term: &str) -> Vec<StationMatch> {
        let term = term.to_lowercase();

        let mut matches: Vec<StationMatch> = self
            .load()
            .iter()
            .filter(|(id, _)| !id.ends_with(DIRECTION_SUFFIXES))
            .filter(|(_, name)| name.to_lowercase().contains(&term))
            .map(|(id, name)| StationMatch {
                id: id.clone(),
                name: name.clone(),
            })
            .collect();

        matches.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        matches
    }

    /// Number of stop IDs in the index.
    pub fn len(&self) -> usize {
        self.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.load().is_empty()
    }
}

fn read_table(path: &Path) -> Result<HashMap<String, String>, StationError> {
    let file = std::fs::File::open(path).map_err(|_| StationError::NotFound {
        path: path.display().to_string(),
    })?;
    parse_table(file)
}

/// Parse a GTFS `stops.txt` into ID → name.
///
/// Rows too short to hold both columns are skipped.
fn parse_table<R: Read>(reader: R) -> Result<HashMap<String, String>, StationError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}') == name)
            .ok_or(StationError::MissingColumn(name))
    };
    let id_idx = column("stop_id")?;
    let name_idx = column("stop_name")?;

    let mut stops = HashMap::new();
    for record in reader.records() {
        let Ok(record) = record else {
            continue;
        };
        let (Some(id), Some(name)) = (record.get(id_idx), record.get(name_idx)) else {
            continue;
        };
        if id.is_empty() {
            continue;
        }
        stops.insert(id.to_string(), name.to_string());
    }

    Ok(stops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const STOPS: &str = "\
stop_id,stop_name,stop_lat,stop_lon,location_type,parent_station
A22,14 St,40.740893,-74.00169,1,
A22N,14 St,40.740893,-74.00169,0,A22
A22S,14 St,40.740893,-74.00169,0,A22
A41,\"Jay St-MetroTech\",40.692338,-73.987342,1,
A41N,\"Jay St-MetroTech\",40.692338,-73.987342,0,A41
D20,\"W 4 St-Wash Sq\",40.732338,-74.000495,1,
D20S,\"W 4 St-Wash Sq\",40.732338,-74.000495,0,D20
L01,8 Av,40.739777,-74.002578,1,
635,14 St-Union Sq,40.734673,-73.989951,1,
";

    fn index() -> StationIndex {
        let stops = parse_table(STOPS.as_bytes()).unwrap();
        StationIndex::from_entries(stops)
    }

    #[test]
    fn parses_quoted_fields() {
        let stops = parse_table(STOPS.as_bytes()).unwrap();
        assert_eq!(stops.len(), 9);
        assert_eq!(stops["A41"], "Jay St-MetroTech");
    }

    #[test]
    fn quoted_commas_stay_in_field() {
        let table = "stop_id,stop_name\nR20,\"14 St, Union Sq\"\n";
        let stops = parse_table(table.as_bytes()).unwrap();
        assert_eq!(stops["R20"], "14 St, Union Sq");
    }

    #[test]
    fn skips_short_rows() {
        let table = "stop_id,stop_lat,stop_name\nA22,40.7,14 St\nA23\n\n";
        let stops = parse_table(table.as_bytes()).unwrap();
        assert_eq!(stops.len(), 1);
        assert_eq!(stops["A22"], "14 St");
    }

    #[test]
    fn missing_name_column_rejected() {
        let table = "stop_id,stop_desc\nA22,14 St\n";
        let err = parse_table(table.as_bytes()).unwrap_err();
        assert!(matches!(err, StationError::MissingColumn("stop_name")));
    }

    #[test]
    fn resolve_exact() {
        assert_eq!(index().resolve("A41"), "Jay St-MetroTech");
        assert_eq!(index().resolve("A22S"), "14 St");
    }

    #[test]
    fn resolve_strips_direction() {
        // A41S isn't in the table but A41 is
        assert_eq!(index().resolve("A41S"), "Jay St-MetroTech");
    }

    #[test]
    fn resolve_unknown_echoes_id() {
        assert_eq!(index().resolve("Z99"), "Z99");
        assert_eq!(index().resolve("Z99N"), "Z99N");
        assert_eq!(index().resolve(""), "");
    }

    #[test]
    fn search_is_case_insensitive_and_sorted() {
        let results = index().search("14 st");
        let ids: Vec<_> = results.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["A22", "635"]);

        let results = index().search("METROTECH");
        assert_eq!(
            results,
            vec![StationMatch {
                id: "A41".to_string(),
                name: "Jay St-MetroTech".to_string(),
            }]
        );
    }

    #[test]
    fn search_excludes_platform_ids() {
        let results = index().search("st");
        assert!(results.iter().all(|m| !m.id.ends_with(['N', 'S'])));
        assert!(!results.is_empty());
    }

    #[test]
    fn loads_from_file_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stops.txt");
        std::fs::write(&path, STOPS).unwrap();

        let index = StationIndex::new(&path);
        assert_eq!(index.len(), 9);

        // Later edits are not picked up
        std::fs::write(&path, "stop_id,stop_name\n").unwrap();
        assert_eq!(index.len(), 9);
    }

    #[test]
    fn missing_file_degrades_to_empty() {
        let index = StationIndex::new("/nonexistent/stops.txt");
        assert!(index.is_empty());
        assert_eq!(index.resolve("A22S"), "A22S");
        assert!(index.search("14").is_empty());
    }

    #[test]
    fn missing_column_degrades_to_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stops.txt");
        std::fs::write(&path, "stop_id,stop_desc\nA22,14 St\n").unwrap();

        let index = StationIndex::new(&path);
        assert!(index.load().is_empty());
        assert_eq!(index.resolve("A22S"), "A22S");
    }
}

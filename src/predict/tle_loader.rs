use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::predict::elements::{OrbitalElementSet, TrackedObject};
use crate::predict::error::PredictError;

pub struct TleLoader {
    tle_dir: PathBuf,
    objects: BTreeMap<String, TrackedObject>,
}

impl TleLoader {
    pub fn new(tle_dir: PathBuf) -> Self {
        Self {
            tle_dir,
            objects: BTreeMap::new(),
        }
    }

    /// Load all TLE files from the directory
    pub fn load_all(&mut self) -> Result<(), PredictError> {
        if !self.tle_dir.exists() {
            return Err(PredictError::DirectoryNotFound(
                self.tle_dir.display().to_string(),
            ));
        }

        self.objects.clear();

        let entries = fs::read_dir(&self.tle_dir)?;
        for entry in entries {
            let path = entry?.path();
            let is_tle = path
                .extension()
                .is_some_and(|ext| ext == "tle" || ext == "txt");
            if !path.is_file() || !is_tle {
                continue;
            }

            match parse_tle_file(&path) {
                Ok(objects) => {
                    for object in objects {
                        self.objects.insert(object.id.clone(), object);
                    }
                }
                Err(e) => {
                    log::warn!("Failed to parse TLE file {}: {}", path.display(), e);
                    // Continue with other files
                }
            }
        }

        log::info!(
            "Loaded {} objects from {}",
            self.objects.len(),
            self.tle_dir.display()
        );
        Ok(())
    }

    /// All loaded objects, ordered by id.
    pub fn objects(&self) -> Vec<&TrackedObject> {
        self.objects.values().collect()
    }

    pub fn get(&self, id: &str) -> Option<&TrackedObject> {
        self.objects.get(id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

fn parse_tle_file(path: &Path) -> Result<Vec<TrackedObject>, PredictError> {
    let content = fs::read_to_string(path)?;
    let filename = path.file_name().unwrap_or_default().to_string_lossy().to_string();
    let objects = parse_objects(&content, &filename);
    if objects.is_empty() && !content.trim().is_empty() {
        return Err(PredictError::InvalidTle {
            file: filename,
            message: "no element sets found".into(),
        });
    }
    Ok(objects)
}

/// Builds tracked objects from TLE text. Sets sgp4 cannot decode are kept
/// (their scans will fail and be reported); sets without a readable catalog
/// number are dropped.
pub fn parse_objects(content: &str, source: &str) -> Vec<TrackedObject> {
    let mut objects = Vec::new();
    for (name, line1, line2) in parse_multi_tle(content) {
        let elements = OrbitalElementSet::from_tle(name.as_deref(), &line1, &line2);
        let Some(catalog_number) = elements.catalog_number() else {
            log::warn!("Skipping element set without catalog number in {}", source);
            continue;
        };
        if let Err(e) = elements.elements() {
            log::warn!("Element set {} in {} does not decode: {}", catalog_number, source, e);
        }
        let name = name.unwrap_or_else(|| format!("NORAD {}", catalog_number));
        objects.push(TrackedObject::new(catalog_number.to_string(), name, elements));
    }
    objects
}

/// Parse multi-satellite TLE content
fn parse_multi_tle(content: &str) -> Vec<(Option<String>, String, String)> {
    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let mut result = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].starts_with("1 ") && i + 1 < lines.len() && lines[i + 1].starts_with("2 ") {
            // 2-line TLE (no name)
            result.push((None, lines[i].to_string(), lines[i + 1].to_string()));
            i += 2;
        } else if i + 2 < lines.len()
            && lines[i + 1].starts_with("1 ")
            && lines[i + 2].starts_with("2 ")
        {
            // 3-line TLE (with name)
            let name = lines[i].trim_start_matches("0 ").to_string();
            result.push((Some(name), lines[i + 1].to_string(), lines[i + 2].to_string()));
            i += 3;
        } else {
            i += 1; // Skip unknown line
        }
    }

    result
}

//! Labelled photo collections laid out as one sub-directory per class

use std::fs;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use rayon::prelude::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use weather_common::{
    WeatherClass,
    utils::{ensure_output_dir, is_image_file},
};

use crate::WeatherKitError;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct DatasetConfig {
    /// Directory holding one sub-directory per class
    pub root: PathBuf,
    /// Unreadable files are moved here when set, otherwise left in place
    pub outliers_dir: Option<PathBuf>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data/raw"),
            outliers_dir: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Dataset {
    pub images: Vec<DynamicImage>,
    pub labels: Vec<WeatherClass>,
    pub paths: Vec<PathBuf>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Number of images per class, in class index order
    pub fn class_counts(&self) -> [usize; WeatherClass::COUNT] {
        let mut counts = [0; WeatherClass::COUNT];
        for label in &self.labels {
            counts[label.index()] += 1;
        }
        counts
    }

    /// Images and labels at `indices`
    pub fn select(&self, indices: &[usize]) -> (Vec<DynamicImage>, Vec<WeatherClass>) {
        indices
            .iter()
            .map(|&i| (self.images[i].clone(), self.labels[i]))
            .unzip()
    }
}

/// Supported image files directly inside `dir`, sorted by path
pub fn list_images<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>, WeatherKitError> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_image_file(&path) {
            paths.push(path);
        } else {
            debug!("Skipping {}", path.display());
        }
    }
    paths.sort();
    Ok(paths)
}

/// Class directory under `root`: the exact class name, else a
/// case-insensitive match
fn find_class_dir(root: &Path, class: WeatherClass) -> Result<Option<PathBuf>, WeatherKitError> {
    let exact = root.join(class.name());
    if exact.is_dir() {
        return Ok(Some(exact));
    }
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.eq_ignore_ascii_case(class.name()));
        if matches && path.is_dir() {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

fn move_to_outliers(path: &Path, outliers: &Path) -> Result<(), WeatherKitError> {
    ensure_output_dir(outliers)?;
    let Some(name) = path.file_name() else {
        return Ok(());
    };
    let destination = outliers.join(name);
    if fs::rename(path, &destination).is_err() {
        fs::copy(path, &destination)?;
        fs::remove_file(path)?;
    }
    warn!("Moved unreadable {} to {}", path.display(), destination.display());
    Ok(())
}

/// Decode every image of every class directory. Missing class directories
/// and unreadable files are skipped with a warning.
pub fn load_dataset(config: &DatasetConfig) -> Result<Dataset, WeatherKitError> {
    let root = &config.root;
    if !root.is_dir() {
        return Err(WeatherKitError::MissingDataset(root.clone()));
    }
    info!("Loading images from {}", root.display());

    let mut dataset = Dataset::default();
    for class in WeatherClass::ALL {
        let Some(dir) = find_class_dir(root, class)? else {
            warn!("No directory for class '{}', skipping", class);
            continue;
        };

        let paths = list_images(&dir)?;
        let decoded: Vec<_> = paths.par_iter().map(image::open).collect();

        let mut loaded = 0;
        for (path, result) in paths.into_iter().zip(decoded) {
            match result {
                Ok(image) => {
                    dataset.images.push(image);
                    dataset.labels.push(class);
                    dataset.paths.push(path);
                    loaded += 1;
                }
                Err(e) => {
                    warn!("Failed to read {}: {}", path.display(), e);
                    if let Some(outliers) = &config.outliers_dir {
                        move_to_outliers(&path, outliers)?;
                    }
                }
            }
        }
        info!("{}: {} images", class, loaded);
    }

    if dataset.is_empty() {
        return Err(WeatherKitError::EmptyDataset(root.clone()));
    }
    info!("Total images loaded: {}", dataset.len());
    Ok(dataset)
}

/// Each image followed by its horizontal mirror
pub fn augment_with_flips(
    images: Vec<DynamicImage>,
    labels: Vec<WeatherClass>,
) -> (Vec<DynamicImage>, Vec<WeatherClass>) {
    let mut out_images = Vec::with_capacity(images.len() * 2);
    let mut out_labels = Vec::with_capacity(labels.len() * 2);
    for (image, label) in images.into_iter().zip(labels) {
        let flipped = image.fliph();
        out_images.push(image);
        out_images.push(flipped);
        out_labels.push(label);
        out_labels.push(label);
    }
    (out_images, out_labels)
}

//! Append-only star ratings, one JSON record per line.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

pub const MIN_STARS: u8 = 1;
pub const MAX_STARS: u8 = 5;

#[derive(Debug, Error)]
pub enum RatingError {
    #[error("rating must be between 1 and 5 stars, got {0}")]
    InvalidStars(u8),
    #[error("recipe name must not be empty")]
    EmptyRecipeName,
    #[error("rating store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("rating store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub recipe_name: String,
    pub stars: u8,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingSummary {
    pub recipe_name: String,
    pub count: u64,
    pub average: Option<f64>,
}

impl RatingSummary {
    fn empty(recipe_name: &str) -> Self {
        Self {
            recipe_name: recipe_name.to_string(),
            count: 0,
            average: None,
        }
    }
}

#[derive(Debug)]
pub struct RatingStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl RatingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn submit(&self, recipe_name: &str, stars: u8) -> Result<Rating, RatingError> {
        let recipe_name = recipe_name.trim();
        if recipe_name.is_empty() {
            return Err(RatingError::EmptyRecipeName);
        }
        if !(MIN_STARS..=MAX_STARS).contains(&stars) {
            return Err(RatingError::InvalidStars(stars));
        }

        let rating = Rating {
            recipe_name: recipe_name.to_string(),
            stars,
            submitted_at: Utc::now(),
        };
        let mut line = serde_json::to_string(&rating)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        tracing::info!(recipe = %rating.recipe_name, stars, "rating recorded");
        Ok(rating)
    }

    pub async fn load_all(&self) -> Result<Vec<Rating>, RatingError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ratings = Vec::new();
        for (line_no, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Rating>(line) {
                Ok(rating) => ratings.push(rating),
                Err(e) => {
                    tracing::warn!(line = line_no + 1, error = %e, "skipping unreadable rating record");
                }
            }
        }
        Ok(ratings)
    }

    pub async fn summary(&self, recipe_name: &str) -> Result<RatingSummary, RatingError> {
        let recipe_name = recipe_name.trim();
        let summaries = self.summaries().await?;
        Ok(summaries
            .into_iter()
            .find(|s| s.recipe_name == recipe_name)
            .unwrap_or_else(|| RatingSummary::empty(recipe_name)))
    }

    /// Per-recipe aggregates, ordered by recipe name.
    pub async fn summaries(&self) -> Result<Vec<RatingSummary>, RatingError> {
        let mut totals: BTreeMap<String, (u64, u64)> = BTreeMap::new();
        for rating in self.load_all().await? {
            let entry = totals.entry(rating.recipe_name).or_default();
            entry.0 += 1;
            entry.1 += u64::from(rating.stars);
        }

        Ok(totals
            .into_iter()
            .map(|(recipe_name, (count, sum))| RatingSummary {
                recipe_name,
                count,
                average: Some(sum as f64 / count as f64),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn missing_file_means_no_ratings() {
        let tmp = tempfile::tempdir().unwrap();
        let store = RatingStore::new(tmp.path().join("ratings.jsonl"));

        assert!(store.load_all().await.unwrap().is_empty());
        let summary = store.summary("Tofu Curry").await.unwrap();
        assert_eq!(summary.count, 0);
        assert_eq!(summary.average, None);
    }

    #[tokio::test]
    async fn submit_validates_input() {
        let tmp = tempfile::tempdir().unwrap();
        let store = RatingStore::new(tmp.path().join("ratings.jsonl"));

        assert!(matches!(store.submit("Tofu Curry", 0).await, Err(RatingError::InvalidStars(0))));
        assert!(matches!(store.submit("Tofu Curry", 6).await, Err(RatingError::InvalidStars(6))));
        assert!(matches!(store.submit("   ", 3).await, Err(RatingError::EmptyRecipeName)));
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn summaries_average_per_recipe() {
        let tmp = tempfile::tempdir().unwrap();
        let store = RatingStore::new(tmp.path().join("nested/ratings.jsonl"));

        store.submit("Tofu Curry", 5).await.unwrap();
        store.submit("Tofu Curry", 4).await.unwrap();
        store.submit(" Lentil Bolognese ", 2).await.unwrap();

        let summaries = store.summaries().await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].recipe_name, "Lentil Bolognese");
        assert_eq!(summaries[0].average, Some(2.0));
        assert_eq!(summaries[1].count, 2);
        assert_eq!(summaries[1].average, Some(4.5));
    }

    #[tokio::test]
    async fn unreadable_lines_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("ratings.jsonl");
        let store = RatingStore::new(&path);
        store.submit("Tofu Curry", 3).await.unwrap();

        let mut contents = fs::read_to_string(&path).await.unwrap();
        contents.push_str("{not json\n\n");
        fs::write(&path, contents).await.unwrap();
        store.submit("Tofu Curry", 5).await.unwrap();

        let summary = store.summary("Tofu Curry").await.unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.average, Some(4.0));
    }

    #[tokio::test]
    async fn concurrent_submissions_are_all_recorded() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Arc::new(RatingStore::new(tmp.path().join("ratings.jsonl")));

        let handles: Vec<_> = (0..20u8)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.submit("Tofu Curry", i % 5 + 1).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.load_all().await.unwrap().len(), 20);
    }
}

use serde::{Deserialize, Serialize};

/// Category used to route a movie to a root folder
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MovieCategory {
    Animation,
    General,
}

impl MovieCategory {
    pub const ANIMATION_GENRE: &'static str = "Animation";

    /// Map a genre list to a category by membership test
    pub fn from_genres<S: AsRef<str>>(genres: &[S]) -> Self {
        if genres.iter().any(|g| g.as_ref() == Self::ANIMATION_GENRE) {
            MovieCategory::Animation
        } else {
            MovieCategory::General
        }
    }
}

/// Current state of a movie as reported by the acquisition service.
/// Recomputed on every run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AcquisitionRecord {
    pub title: String,
    pub year: u32,
    pub monitored: bool,
    pub has_file: bool,
    pub category: MovieCategory,
    pub tmdb_id: u32,
}

/// Add-if-absent request sent to the acquisition service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AcquisitionRequest {
    pub tmdb_id: u32,
    pub title: String,
    pub year: u32,
    pub quality_profile_id: u32,
    pub monitored: bool,
    pub root_folder_path: String,
    pub search_on_add: bool,
}

/// Both outcomes are successes: the service treats a repeated add as a no-op.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AcquisitionOutcome {
    Added,
    AlreadyPresent,
}

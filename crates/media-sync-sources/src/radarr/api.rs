use media_sync_models::{AcquisitionRecord, AcquisitionRequest, MovieCategory};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieFile {
    #[serde(default)]
    pub relative_path: Option<String>,
}

/// Row of `GET movie/lookup`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieLookup {
    #[serde(default)]
    pub movie_file: Option<MovieFile>,
    #[serde(default)]
    pub monitored: bool,
    pub title: String,
    pub tmdb_id: u32,
    #[serde(default)]
    pub year: u32,
    #[serde(default)]
    pub genres: Vec<String>,
}

impl MovieLookup {
    /// A file counts only when it has a non-empty relative path
    pub fn has_file(&self) -> bool {
        self.movie_file
            .as_ref()
            .and_then(|f| f.relative_path.as_deref())
            .map_or(false, |p| !p.is_empty())
    }
}

impl From<MovieLookup> for AcquisitionRecord {
    fn from(lookup: MovieLookup) -> Self {
        AcquisitionRecord {
            has_file: lookup.has_file(),
            category: MovieCategory::from_genres(&lookup.genres),
            title: lookup.title,
            year: lookup.year,
            monitored: lookup.monitored,
            tmdb_id: lookup.tmdb_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOptions {
    pub search_for_movie: bool,
}

/// Body of `POST movie`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMovieBody {
    pub tmdb_id: u32,
    pub title: String,
    pub year: u32,
    pub quality_profile_id: u32,
    pub monitored: bool,
    pub root_folder_path: String,
    pub add_options: AddOptions,
}

impl From<&AcquisitionRequest> for AddMovieBody {
    fn from(request: &AcquisitionRequest) -> Self {
        AddMovieBody {
            tmdb_id: request.tmdb_id,
            title: request.title.clone(),
            year: request.year,
            quality_profile_id: request.quality_profile_id,
            monitored: request.monitored,
            root_folder_path: request.root_folder_path.clone(),
            add_options: AddOptions {
                search_for_movie: request.search_on_add,
            },
        }
    }
}

use serde::{Deserialize, Serialize};

/// A movie in the media server library snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LibraryItem {
    pub id: String,
    pub name: String,
    pub production_year: Option<u32>,
}

/// A member of a user's collection, with that user's watched state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionItem {
    pub id: String,
    pub name: String,
    pub played: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaServerUser {
    pub id: String,
    pub name: String,
}

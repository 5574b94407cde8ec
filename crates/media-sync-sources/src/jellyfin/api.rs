use media_sync_models::{CollectionItem, LibraryItem, MediaServerUser};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserDto {
    pub name: String,
    pub id: String,
}

impl From<UserDto> for MediaServerUser {
    fn from(dto: UserDto) -> Self {
        MediaServerUser {
            id: dto.id,
            name: dto.name,
        }
    }
}

/// `{ "Items": [...] }` envelope of `GET Items`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemsResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserData {
    #[serde(default)]
    pub played: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserItemDto {
    pub name: String,
    pub id: String,
    #[serde(default)]
    pub user_data: Option<UserData>,
}

impl From<UserItemDto> for CollectionItem {
    fn from(dto: UserItemDto) -> Self {
        CollectionItem {
            played: dto.user_data.map_or(false, |d| d.played),
            id: dto.id,
            name: dto.name,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MovieDto {
    pub name: String,
    pub id: String,
    #[serde(default)]
    pub production_year: Option<u32>,
}

impl From<MovieDto> for LibraryItem {
    fn from(dto: MovieDto) -> Self {
        LibraryItem {
            id: dto.id,
            name: dto.name,
            production_year: dto.production_year,
        }
    }
}

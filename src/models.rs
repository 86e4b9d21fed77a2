use serde::{Deserialize, Deserializer, Serialize};
use chrono::{DateTime, Utc};

use crate::utils::get_file_extension;

pub type UserId = u64;
pub type CategoryId = u64;
pub type FileId = u64;

/// Archive formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    #[serde(rename = "RAR")]
    Rar,
    #[serde(rename = "ZIP")]
    Zip,
    #[serde(rename = "7Z")]
    SevenZ,
}

impl FileType {
    /// Resolve the archive type from a filename extension (case-insensitive).
    pub fn from_filename(filename: &str) -> Option<Self> {
        match get_file_extension(filename)?.as_str() {
            "rar" => Some(FileType::Rar),
            "zip" => Some(FileType::Zip),
            "7z" => Some(FileType::SevenZ),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            FileType::Zip => "application/zip",
            FileType::Rar => "application/x-rar-compressed",
            FileType::SevenZ => "application/x-7z-compressed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Metadata record of an uploaded archive.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub id: FileId,
    pub name: String,
    pub description: Option<String>,
    pub size: u64,
    #[serde(skip_serializing)]
    pub storage_key: String,
    #[serde(rename = "type")]
    pub file_type: FileType,
    pub downloads: u64,
    pub category_id: CategoryId,
    pub created_at: DateTime<Utc>,
}

/// Fields of a file record known before an ID is assigned.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub name: String,
    pub description: Option<String>,
    pub size: u64,
    pub storage_key: String,
    pub file_type: FileType,
    pub category_id: CategoryId,
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub is_admin: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            is_admin: user.is_admin,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Partial category update. `description: Some(None)` clears the field.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present_field")]
    pub description: Option<Option<String>>,
}

// Distinguishes an explicit `null` from an absent key.
fn present_field<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileQuery {
    pub category_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    #[serde(flatten)]
    pub category: Category,
    pub file_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub category: Category,
    pub files: Vec<File>,
    pub file_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub id: CategoryId,
    pub name: String,
    pub file_count: usize,
    pub downloads: u64,
}

#[derive(Debug, Serialize)]
pub struct PopularFile {
    pub id: FileId,
    pub name: String,
    pub downloads: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_files: usize,
    pub total_categories: usize,
    pub total_downloads: u64,
    pub category_stats: Vec<CategoryStats>,
    pub popular_files: Vec<PopularFile>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_type_from_extension_is_case_insensitive() {
        assert_eq!(FileType::from_filename("app.ZIP"), Some(FileType::Zip));
        assert_eq!(FileType::from_filename("tools.Rar"), Some(FileType::Rar));
        assert_eq!(FileType::from_filename("backup.tar.7z"), Some(FileType::SevenZ));
        assert_eq!(FileType::from_filename("notes.txt"), None);
        assert_eq!(FileType::from_filename("zip"), None);
    }

    #[test]
    fn file_serializes_without_storage_key() {
        let file = File {
            id: 1,
            name: "app.zip".into(),
            description: None,
            size: 3,
            storage_key: "1700000000-abc.zip".into(),
            file_type: FileType::SevenZ,
            downloads: 0,
            category_id: 1,
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(&file).unwrap();
        assert!(value.get("storageKey").is_none());
        assert_eq!(value["type"], json!("7Z"));
        assert_eq!(value["categoryId"], json!(1));
    }

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let absent: CategoryPatch = serde_json::from_value(json!({"name": "x"})).unwrap();
        assert!(absent.description.is_none());

        let cleared: CategoryPatch = serde_json::from_value(json!({"description": null})).unwrap();
        assert_eq!(cleared.description, Some(None));

        let set: CategoryPatch = serde_json::from_value(json!({"description": "d"})).unwrap();
        assert_eq!(set.description, Some(Some("d".to_string())));
    }
}

use serde::{Deserialize, Serialize};

/// An uploaded course document. `path` is whatever the upload service stored;
/// only its file name is trusted when resolving it on disk.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Material {
    pub id: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Material {
    pub fn new(id: &str, path: &str) -> Self {
        Material {
            id: id.to_string(),
            path: path.to_string(),
            title: None,
        }
    }
}

use serde::{Deserialize, Serialize};

/// Owner of an image record.
///
/// Stored as the pair `type` + `typeId`; `type` selects the variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageOwner {
    /// Profile picture of a user.
    User(String),
    /// Picture attached to a share post.
    Post(String),
    /// Picture attached to a diary entity.
    DiaryEntity(String),
}

impl ImageOwner {
    pub const PROFILE_TAG: &'static str = "profile";
    pub const POST_TAG: &'static str = "post";
    pub const ENTITY_TAG: &'static str = "entity";

    /// Rebuild an owner from its stored `type` tag and `typeId`.
    pub fn from_parts(tag: &str, id: impl Into<String>) -> Option<Self> {
        match tag {
            Self::PROFILE_TAG => Some(Self::User(id.into())),
            Self::POST_TAG => Some(Self::Post(id.into())),
            Self::ENTITY_TAG => Some(Self::DiaryEntity(id.into())),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::User(_) => Self::PROFILE_TAG,
            Self::Post(_) => Self::POST_TAG,
            Self::DiaryEntity(_) => Self::ENTITY_TAG,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::User(id) | Self::Post(id) | Self::DiaryEntity(id) => id,
        }
    }
}

impl std::fmt::Display for ImageOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.tag(), self.id())
    }
}

/// An image record. The bytes live in the object store under `image_key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    #[serde(rename = "type", default)]
    pub owner_type: String,
    #[serde(default)]
    pub type_id: String,
    #[serde(default)]
    pub image_key: Option<String>,
    #[serde(default)]
    pub is_deleted: bool,
}

impl ImageRecord {
    /// Typed owner, or `None` for an unrecognised `type` tag.
    pub fn owner(&self) -> Option<ImageOwner> {
        ImageOwner::from_parts(&self.owner_type, self.type_id.clone())
    }
}

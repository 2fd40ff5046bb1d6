use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use validator::Validate;

use crate::error::{AppError, Result};
use crate::utils::validation::validate_not_blank;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author_id: i64,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// 列表与详情页使用的帖子视图（已连接作者与分组）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostView {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub image: Option<String>,
    pub author_id: i64,
    pub author_username: String,
    pub group_id: Option<i64>,
    pub group_slug: Option<String>,
    pub group_title: Option<String>,
}

/// 创建/编辑帖子的表单
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PostForm {
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank", message = "Post text must not be empty"))]
    pub text: String,

    /// 分组 ID，空字符串表示不属于任何分组
    #[serde(default)]
    pub group: Option<String>,

    /// 已上传图片的存储路径
    #[serde(default)]
    pub image: Option<String>,
}

impl PostForm {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_group(mut self, group_id: i64) -> Self {
        self.group = Some(group_id.to_string());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// 解析分组字段
    pub fn group_id(&self) -> Result<Option<i64>> {
        match self.group.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse::<i64>()
                .map(Some)
                .map_err(|_| AppError::validation("Select a valid choice")),
        }
    }

    pub fn image_path(&self) -> Option<String> {
        self.image
            .as_deref()
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .map(str::to_string)
    }

    pub fn from_post(post: &PostView) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group_id.map(|id| id.to_string()),
            image: post.image.clone(),
        }
    }
}

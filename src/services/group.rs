use crate::{
    error::{AppError, Result},
    models::group::*,
    services::Database,
    utils::validation::validate_slug,
};
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

#[derive(Clone)]
pub struct GroupService {
    db: Arc<Database>,
}

impl GroupService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    /// 创建分组；未提供 slug 时由标题生成
    pub async fn create_group(&self, request: CreateGroupRequest) -> Result<Group> {
        debug!("Creating group: {}", request.title);
        request.validate()?;

        let slug = match request.slug.as_deref().map(str::trim) {
            Some(slug) if !slug.is_empty() => slug.to_string(),
            _ => slug::slugify(&request.title),
        };
        validate_slug(&slug)?;

        if self.get_by_slug(&slug).await?.is_some() {
            return Err(AppError::Validation(format!(
                "A group with slug {} already exists",
                slug
            )));
        }

        let id = sqlx::query("INSERT INTO post_groups (title, slug, description) VALUES (?, ?, ?)")
            .bind(&request.title)
            .bind(&slug)
            .bind(&request.description)
            .execute(&self.db.pool)
            .await?
            .last_insert_rowid();

        info!("Created group {} ({})", slug, id);
        Ok(Group {
            id,
            title: request.title,
            slug,
            description: request.description,
        })
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>("SELECT * FROM post_groups WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.db.pool)
            .await?;
        Ok(group)
    }

    pub async fn require_by_slug(&self, slug: &str) -> Result<Group> {
        self.get_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::not_found("Group"))
    }

    /// 所有分组（用于表单选项）
    pub async fn list_groups(&self) -> Result<Vec<Group>> {
        let groups = sqlx::query_as::<_, Group>("SELECT * FROM post_groups ORDER BY title, id")
            .fetch_all(&self.db.pool)
            .await?;
        Ok(groups)
    }

    /// 删除分组，所属帖子保留且分组置空
    pub async fn delete_group(&self, slug: &str) -> Result<()> {
        let group = self.require_by_slug(slug).await?;

        sqlx::query("DELETE FROM post_groups WHERE id = ?")
            .bind(group.id)
            .execute(&self.db.pool)
            .await?;

        info!("Deleted group {}", slug);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::test_db;

    fn request(title: &str, slug: Option<&str>) -> CreateGroupRequest {
        CreateGroupRequest {
            title: title.to_string(),
            slug: slug.map(str::to_string),
            description: "Test description".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_with_explicit_slug() {
        let service = GroupService::new(test_db().await).await.unwrap();
        let group = service.create_group(request("Test group", Some("test_group"))).await.unwrap();
        assert_eq!(group.slug, "test_group");
        assert_eq!(service.require_by_slug("test_group").await.unwrap(), group);
    }

    #[tokio::test]
    async fn test_slug_generated_from_title() {
        let service = GroupService::new(test_db().await).await.unwrap();
        let group = service.create_group(request("Cats and Dogs", None)).await.unwrap();
        assert_eq!(group.slug, "cats-and-dogs");
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let service = GroupService::new(test_db().await).await.unwrap();
        service.create_group(request("One", Some("same"))).await.unwrap();
        let err = service.create_group(request("Two", Some("same"))).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_unknown_slug_not_found() {
        let service = GroupService::new(test_db().await).await.unwrap();
        assert!(matches!(
            service.require_by_slug("missing").await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            service.delete_group("missing").await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let service = GroupService::new(test_db().await).await.unwrap();
        service.create_group(request("Beta", Some("beta"))).await.unwrap();
        service.create_group(request("Alpha", Some("alpha"))).await.unwrap();

        let titles: Vec<String> = service.list_groups().await.unwrap().into_iter().map(|g| g.title).collect();
        assert_eq!(titles, vec!["Alpha", "Beta"]);

        service.delete_group("alpha").await.unwrap();
        assert!(service.get_by_slug("alpha").await.unwrap().is_none());
    }
}

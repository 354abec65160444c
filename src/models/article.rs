use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Draft,
    Published,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Draft => "draft",
            ArticleStatus::Published => "published",
        }
    }
}

impl FromStr for ArticleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ArticleStatus::Draft),
            "published" => Ok(ArticleStatus::Published),
            other => Err(format!("Estado inválido: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Design,
    Development,
    Technology,
    Business,
    Lifestyle,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Design => "Design",
            Category::Development => "Development",
            Category::Technology => "Technology",
            Category::Business => "Business",
            Category::Lifestyle => "Lifestyle",
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Design" => Ok(Category::Design),
            "Development" => Ok(Category::Development),
            "Technology" => Ok(Category::Technology),
            "Business" => Ok(Category::Business),
            "Lifestyle" => Ok(Category::Lifestyle),
            other => Err(format!("Categoría inválida: {other}")),
        }
    }
}

// 1. Artículo completo tal como vive en el store
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub cover_image: String,
    pub author: String,
    pub author_id: Uuid,
    pub category: Category,
    pub tags: Vec<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub featured: bool,
    pub status: ArticleStatus,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Datos de la cuenta dueña que se "pegan" al artículo para la UI
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

// 2. Lo que devuelve la API: artículo + autor resuelto
#[derive(Debug, Clone, Serialize)]
pub struct ArticleView {
    #[serde(flatten)]
    pub article: Article,
    pub author_account: Option<AuthorSummary>,
}

// Fila de Postgres (artículo + LEFT JOIN con accounts)
#[derive(Debug, FromRow)]
pub struct ArticleRow {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub cover_image: String,
    pub author: String,
    pub author_id: Uuid,
    pub category: String,
    pub tags: Vec<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub featured: bool,
    pub status: String,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
}

impl TryFrom<ArticleRow> for ArticleView {
    type Error = String;

    fn try_from(row: ArticleRow) -> Result<Self, Self::Error> {
        let author_account = match (row.author_name, row.author_email) {
            (Some(name), Some(email)) => Some(AuthorSummary { id: row.author_id, name, email }),
            _ => None,
        };

        Ok(ArticleView {
            article: Article {
                id: row.id,
                title: row.title,
                slug: row.slug,
                excerpt: row.excerpt,
                content: row.content,
                cover_image: row.cover_image,
                author: row.author,
                author_id: row.author_id,
                category: row.category.parse()?,
                tags: row.tags,
                published_at: row.published_at,
                featured: row.featured,
                status: row.status.parse()?,
                views: row.views,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            author_account,
        })
    }
}

/// Un elemento de la lista de tags; los números se aceptan como texto.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TagItem {
    Text(String),
    Number(serde_json::Number),
}

impl TagItem {
    fn into_text(self) -> String {
        match self {
            TagItem::Text(s) => s,
            TagItem::Number(n) => n.to_string(),
        }
    }
}

/// Los tags llegan como lista o como "a, b, c".
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TagsInput {
    List(Vec<TagItem>),
    Csv(String),
}

impl TagsInput {
    /// Lista canónica: recortada y sin entradas vacías (sin deduplicar).
    pub fn into_tags(self) -> Vec<String> {
        let raw: Vec<String> = match self {
            TagsInput::List(items) => items.into_iter().map(TagItem::into_text).collect(),
            TagsInput::Csv(s) => s.split(',').map(str::to_string).collect(),
        };
        raw.into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

// 3. Lo que recibimos del panel al crear un artículo
#[derive(Debug, Deserialize, Validate)]
pub struct CreateArticleSchema {
    #[serde(default)]
    #[validate(length(min = 1, message = "El título es obligatorio"))]
    pub title: String,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "El contenido es obligatorio"))]
    pub content: String,
    #[serde(alias = "coverImage")]
    pub cover_image: Option<String>,
    pub category: Option<String>,
    pub tags: Option<TagsInput>,
    pub featured: Option<bool>,
    pub status: Option<String>, // draft | published
}

impl CreateArticleSchema {
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            excerpt: self.excerpt.map(|e| e.trim().to_string()),
            content: self.content.trim().to_string(),
            cover_image: self.cover_image.map(|c| c.trim().to_string()),
            category: self.category.map(|c| c.trim().to_string()),
            ..self
        }
    }
}

// 4. Actualización parcial: solo se toca lo que viene en el JSON
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateArticleSchema {
    #[validate(length(min = 1, message = "El título no puede estar vacío"))]
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    #[validate(length(min = 1, message = "El contenido no puede estar vacío"))]
    pub content: Option<String>,
    #[serde(alias = "coverImage")]
    pub cover_image: Option<String>,
    pub category: Option<String>,
    pub tags: Option<TagsInput>,
    pub featured: Option<bool>,
    pub status: Option<String>,
}

impl UpdateArticleSchema {
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.map(|t| t.trim().to_string()),
            excerpt: self.excerpt.map(|e| e.trim().to_string()),
            content: self.content.map(|c| c.trim().to_string()),
            cover_image: self.cover_image.map(|c| c.trim().to_string()),
            category: self.category.map(|c| c.trim().to_string()),
            ..self
        }
    }
}

// Parámetros crudos de GET /api/posts (?category=..&tag=..&search=..)
#[derive(Debug, Default, Deserialize)]
pub struct FilterOptions {
    pub category: Option<String>,
    pub tag: Option<String>,
    pub featured: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

/// Filtro neutral respecto al store; `None` significa "sin restricción".
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ArticleFilter {
    pub status: Option<ArticleStatus>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub featured: Option<bool>,
    pub search: Option<String>,
}

impl ArticleFilter {
    pub fn published() -> Self {
        Self { status: Some(ArticleStatus::Published), ..Default::default() }
    }

    /// Evaluación en memoria, misma semántica que la consulta SQL.
    pub fn matches(&self, article: &Article) -> bool {
        if let Some(status) = self.status {
            if article.status != status {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if article.category.as_str() != category {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !article.tags.iter().any(|t| t == tag) {
                return false;
            }
        }
        if let Some(featured) = self.featured {
            if article.featured != featured {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let hit = [&article.title, &article.excerpt, &article.content]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        true
    }
}

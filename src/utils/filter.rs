use crate::{
    error::AppError,
    models::article::{ArticleFilter, ArticleStatus, FilterOptions},
};

// "" y "   " valen lo mismo que no mandar el parámetro
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Traduce los parámetros de la URL a un filtro del store. No sabe nada de
/// autenticación: forzar `published` para anónimos es cosa del handler.
pub fn build_filter(opts: &FilterOptions) -> Result<ArticleFilter, AppError> {
    let status = present(&opts.status)
        .map(|s| s.parse::<ArticleStatus>())
        .transpose()
        .map_err(|_| AppError::validation("status", "El estado debe ser 'draft' o 'published'"))?;

    let featured = present(&opts.featured)
        .map(|f| parse_bool(f).ok_or(()))
        .transpose()
        .map_err(|_| AppError::validation("featured", "featured debe ser un booleano"))?;

    Ok(ArticleFilter {
        status,
        category: present(&opts.category).map(str::to_string),
        tag: present(&opts.tag).map(str::to_string),
        featured,
        search: present(&opts.search).map(str::to_string),
    })
}

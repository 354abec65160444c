use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

// Último sello usado para slugs de respaldo; evita repetir el mismo milisegundo
static LAST_FALLBACK_MS: AtomicI64 = AtomicI64::new(0);

/// Normaliza un título: minúsculas, cada tramo fuera de `[a-z0-9]` se
/// convierte en un solo guion y se recortan los guiones de los extremos.
/// Puede devolver una cadena vacía.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut prev_hyphen = false;

    for ch in input.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            slug.push(ch);
            prev_hyphen = false;
        } else if !prev_hyphen {
            slug.push('-');
            prev_hyphen = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }
    while slug.starts_with('-') {
        slug.remove(0);
    }

    slug
}

/// Igual que [`slugify`], pero nunca vacío: si el título no trae nada
/// alfanumérico (o no hay título) se usa `<prefix>-<milisegundos>`.
pub fn slug_or_fallback(title: Option<&str>, prefix: &str) -> String {
    let slug = title.map(slugify).unwrap_or_default();
    if slug.is_empty() {
        format!("{}-{}", prefix, next_fallback_millis())
    } else {
        slug
    }
}

// Tiempo actual en ms, estrictamente creciente entre llamadas
fn next_fallback_millis() -> i64 {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_FALLBACK_MS.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_FALLBACK_MS.compare_exchange_weak(last, candidate, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return candidate,
            Err(actual) => last = actual,
        }
    }
}

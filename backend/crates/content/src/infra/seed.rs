//! Demo dataset
//!
//! Fixed ids and dates so demo mode and tests see the same content on
//! every start.

use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::entity::{Author, Category, Post};
use crate::domain::value_object::excerpt::{DEFAULT_EXCERPT_LEN, derive_excerpt};
use crate::domain::value_object::slug::generate_slug;
use crate::domain::value_object::{AuthorId, CategoryId, PostId, Visibility};

pub const FAMILY: CategoryId = CategoryId::from_u128(0x0c01);
pub const LABOR: CategoryId = CategoryId::from_u128(0x0c02);
pub const CRIMINAL: CategoryId = CategoryId::from_u128(0x0c03);
pub const MEDIATION: CategoryId = CategoryId::from_u128(0x0c04);

pub const LUCIA: AuthorId = AuthorId::from_u128(0x0a01);
pub const JAVIER: AuthorId = AuthorId::from_u128(0x0a02);

/// Posts in creation order, oldest first
pub const POST_IDS: [PostId; 8] = [
    PostId::from_u128(0x0b01),
    PostId::from_u128(0x0b02),
    PostId::from_u128(0x0b03),
    PostId::from_u128(0x0b04),
    PostId::from_u128(0x0b05),
    PostId::from_u128(0x0b06),
    PostId::from_u128(0x0b07),
    PostId::from_u128(0x0b08),
];

/// Collections to preload into a repository
#[derive(Debug, Clone, Default)]
pub struct SeedData {
    pub categories: Vec<Category>,
    pub authors: Vec<Author>,
    pub posts: Vec<(Post, Vec<CategoryId>)>,
}

fn day(month: u32, day: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2024, month, day)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_default()
}

fn category(id: CategoryId, name: &str, created: DateTime<Utc>) -> Category {
    Category {
        id,
        name: name.to_string(),
        created_at: created,
    }
}

fn author(id: AuthorId, name: &str, role: &str, email: &str) -> Author {
    Author {
        id,
        name: name.to_string(),
        role: Some(role.to_string()),
        description: None,
        profile_picture_url: None,
        email: Some(email.to_string()),
        created_at: day(1, 2),
        updated_at: day(1, 2),
    }
}

struct Draft {
    title: &'static str,
    content: &'static str,
    author: Option<(AuthorId, &'static str)>,
    visibility: Visibility,
    categories: &'static [CategoryId],
}

fn post(id: PostId, created: DateTime<Utc>, draft: Draft) -> (Post, Vec<CategoryId>) {
    let post = Post {
        id,
        title: draft.title.to_string(),
        content: draft.content.to_string(),
        excerpt: derive_excerpt(draft.content, DEFAULT_EXCERPT_LEN),
        image: None,
        author: draft.author.map(|(_, name)| name.to_string()),
        author_id: draft.author.map(|(id, _)| id),
        visibility: draft.visibility,
        slug: Some(generate_slug(draft.title)),
        date: None,
        created_at: created,
        updated_at: created,
    };
    (post, draft.categories.to_vec())
}

pub fn demo_dataset() -> SeedData {
    const LUCIA_NAME: &str = "Lucía Fernández";
    const JAVIER_NAME: &str = "Javier Morales";

    let drafts = [
        Draft {
            title: "¿Qué es la Mediación Familiar?",
            content: "<p>La mediación familiar es un procedimiento voluntario en el que un \
                      tercero imparcial ayuda a las partes a alcanzar acuerdos sobre custodia, \
                      pensiones y régimen de visitas sin acudir a juicio.</p>",
            author: Some((LUCIA, LUCIA_NAME)),
            visibility: Visibility::Public,
            categories: &[FAMILY, MEDIATION],
        },
        Draft {
            title: "Despido improcedente: plazos para reclamar",
            content: "<p>El trabajador dispone de veinte días hábiles para presentar la \
                      papeleta de conciliación desde la fecha efectiva del despido.</p>",
            author: Some((JAVIER, JAVIER_NAME)),
            visibility: Visibility::Public,
            categories: &[LABOR],
        },
        Draft {
            title: "Custodia compartida y vivienda familiar",
            content: "<p>La atribución del uso de la vivienda familiar en supuestos de custodia \
                      compartida atiende al interés superior de los menores.</p>",
            author: Some((LUCIA, LUCIA_NAME)),
            visibility: Visibility::Public,
            categories: &[FAMILY],
        },
        Draft {
            title: "Notas internas sobre honorarios",
            content: "<p>Criterios orientativos de honorarios para el equipo del despacho.</p>",
            author: None,
            visibility: Visibility::Private,
            categories: &[],
        },
        Draft {
            title: "Derechos del detenido en comisaría",
            content: "<p>Toda persona detenida tiene derecho a guardar silencio, a no declarar \
                      contra sí misma y a la asistencia de un abogado.</p>",
            author: Some((JAVIER, JAVIER_NAME)),
            visibility: Visibility::Public,
            categories: &[CRIMINAL],
        },
        Draft {
            title: "Bienvenida al blog del despacho",
            content: "<p>Publicaremos periódicamente artículos divulgativos sobre las áreas \
                      en las que trabajamos.</p>",
            author: None,
            visibility: Visibility::Public,
            categories: &[],
        },
        Draft {
            title: "Borrador: reforma laboral y teletrabajo",
            content: "<p>Análisis preliminar de las obligaciones empresariales en materia de \
                      teletrabajo.</p>",
            author: Some((JAVIER, JAVIER_NAME)),
            visibility: Visibility::Private,
            categories: &[LABOR],
        },
        Draft {
            title: "Mediación laboral antes del juicio",
            content: "<p>La conciliación previa y la mediación laboral permiten resolver \
                      conflictos con la empresa de forma rápida y económica.</p>",
            author: Some((LUCIA, LUCIA_NAME)),
            visibility: Visibility::Public,
            categories: &[LABOR, MEDIATION],
        },
    ];

    let posts = POST_IDS
        .into_iter()
        .zip(drafts)
        .enumerate()
        .map(|(i, (id, draft))| post(id, day(2, 1 + 3 * i as u32), draft))
        .collect();

    SeedData {
        categories: vec![
            category(FAMILY, "Derecho Familiar", day(1, 1)),
            category(LABOR, "Derecho Laboral", day(1, 1)),
            category(CRIMINAL, "Derecho Penal", day(1, 1)),
            category(MEDIATION, "Mediación", day(1, 1)),
        ],
        authors: vec![
            author(LUCIA, LUCIA_NAME, "Socia directora", "lucia@despacho.example"),
            author(JAVIER, JAVIER_NAME, "Abogado asociado", "javier@despacho.example"),
        ],
        posts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_shape() {
        let data = demo_dataset();
        assert_eq!(data.posts.len(), POST_IDS.len());

        let private = data
            .posts
            .iter()
            .filter(|(p, _)| p.visibility == Visibility::Private)
            .count();
        let uncategorized = data.posts.iter().filter(|(_, c)| c.is_empty()).count();
        assert_eq!(private, 2);
        assert_eq!(uncategorized, 2);

        let created: Vec<_> = data.posts.iter().map(|(p, _)| p.created_at).collect();
        assert!(created.windows(2).all(|w| w[0] < w[1]));
        assert!(data.posts.iter().all(|(p, _)| p.slug.is_some()));
    }
}

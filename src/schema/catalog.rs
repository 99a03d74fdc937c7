use serde::Serialize;
use serde_json::Value;

use super::column::ColumnProjection;
use super::field::FieldDescriptor as F;
use super::models::{self, validate_as};
use crate::database::record::{value_text, Record, RecordError};
use crate::store::OrderBy;

/// Everything an admin section needs to manage one collection
#[derive(Clone, Copy)]
pub struct CollectionSpec {
    pub table: &'static str,
    pub title: &'static str,
    pub fields: &'static [F],
    pub columns: &'static [ColumnProjection],
    pub order_by: OrderBy,
    pub filter_by: Option<&'static str>,
    /// Typed check run before every write
    pub validate: fn(&Record) -> Result<(), RecordError>,
}

impl CollectionSpec {
    pub fn field(&self, key: &str) -> Option<&'static F> {
        self.fields.iter().find(|f| f.key == key)
    }
}

impl std::fmt::Debug for CollectionSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionSpec")
            .field("table", &self.table)
            .field("title", &self.title)
            .field("order_by", &self.order_by)
            .field("filter_by", &self.filter_by)
            .finish()
    }
}

impl PartialEq for CollectionSpec {
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table
    }
}

// ========================================
// Field lists
// ========================================

pub const JOBS_FIELDS: &[F] = &[
    F::short("title", "Tytuł").required(),
    F::short("salary", "Wynagrodzenie").required(),
    F::short("location", "Lokalizacja").required(),
    F::short("contract", "Umowa").required(),
    F::long("description", "Opis").required(),
    F::tags("tags", "Tagi"),
    F::tags("tech_stack", "Tech Stack"),
    F::list("responsibilities", "Obowiązki"),
];

pub const FAQ_CATEGORIES: &[&str] = &["career", "internship", "practices"];

pub const FAQS_FIELDS: &[F] = &[
    F::short("question", "Pytanie").required(),
    F::long("answer", "Odpowiedź").required(),
    F::select("category", "Kategoria", FAQ_CATEGORIES).required(),
];

pub const TESTIMONIALS_FIELDS: &[F] = &[
    F::short("name", "Imię").required(),
    F::short("role", "Rola").required(),
    F::long("quote", "Cytat").required(),
];

pub const VALUES_FIELDS: &[F] = &[
    F::short("title", "Tytuł").required(),
    F::long("description", "Opis").required(),
    F::numeric("display_order", "Kolejność").required(),
];

pub const INTERNSHIP_FIELDS: &[F] = &[
    F::short("title", "Tytuł").required(),
    F::short("subtitle", "Podtytuł"),
    F::long("description", "Opis").required(),
    F::short("icon_name", "Ikona (Lucide Name)").placeholder("Code2, Users, Terminal..."),
    F::list("learn_list", "Czego się nauczysz?"),
    F::tags("stack_list", "Tech Stack"),
];

pub const TIMELINE_CATEGORIES: &[&str] = &["recruitment", "internship", "practices"];

pub const TIMELINE_FIELDS: &[F] = &[
    F::short("date_display", "Data (wyświetlana)").required(),
    F::short("title", "Tytuł").required(),
    F::long("description", "Opis (opcjonalny)"),
    F::select("category", "Kategoria", TIMELINE_CATEGORIES).required(),
    F::select("align", "Wyrównanie (Praktyki)", &["left", "right", "center"]),
];

pub const VIDEO_FIELDS: &[F] = &[
    F::short("title", "Tytuł").required(),
    F::short("url", "URL YouTube").required(),
];

pub const STATS_FIELDS: &[F] = &[
    F::short("label", "Etykieta").required(),
    F::short("value", "Wartość").required(),
    F::long("description", "Opis (opcjonalny)"),
    F::numeric("display_order", "Kolejność").required(),
];

pub const GROWTH_FIELDS: &[F] = &[
    F::short("year", "Rok").required(),
    F::numeric("count", "Wartość").required(),
];

pub const MEMORIES_FIELDS: &[F] = &[
    F::short("year", "Rok").placeholder("np. 2023").required(),
    F::short("label", "Etykieta").placeholder("np. Hackathon Zwycięzcy").required(),
    F::image("image_url", "Zdjęcie").required(),
];

pub const PROJECTS_FIELDS: &[F] = &[
    F::short("year", "Rok").placeholder("2023").required(),
    F::short("title", "Tytuł Projektu").required(),
    F::long("goal", "Cel Projektu"),
    F::short("tools", "Narzędzia").placeholder("Angular, .NET, Docker..."),
    F::long("skills", "Pozyskane Umiejętności"),
    F::short("team", "Zespół (imiona)").placeholder("Ania, Tomek..."),
    F::long("description", "Dodatkowy Opis"),
];

pub const PROGRAM_GOALS_FIELDS: &[F] = &[
    F::short("title", "Tytuł").required(),
    F::short("value", "Wartość").required(),
    F::short("subtitle", "Podtytuł"),
    F::numeric("display_order", "Kolejność").required(),
];

pub const INTERNSHIP_RULES_FIELDS: &[F] = &[
    F::long("rule", "Zasada").required(),
    F::numeric("display_order", "Kolejność").required(),
];

// ========================================
// Cell renderers
// ========================================

fn category_label(value: &Value, _record: &Record) -> String {
    match value.as_str() {
        Some("career") => "Kariera".to_string(),
        Some("internship") => "Staż".to_string(),
        Some("practices") => "Praktyki".to_string(),
        Some("recruitment") => "Rekrutacja".to_string(),
        _ => value_text(value),
    }
}

type C = ColumnProjection;

// ========================================
// Collections
// ========================================

pub static COLLECTIONS: &[CollectionSpec] = &[
    CollectionSpec {
        table: "job_offers",
        title: "Oferty Pracy",
        fields: JOBS_FIELDS,
        columns: &[C::new("title", "Stanowisko"), C::new("salary", "Wynagrodzenie"), C::new("location", "Lokalizacja")],
        order_by: OrderBy::created_at(),
        filter_by: None,
        validate: validate_as::<models::JobOffer>,
    },
    CollectionSpec {
        table: "faqs",
        title: "FAQ",
        fields: FAQS_FIELDS,
        columns: &[
            C::new("question", "Pytanie"),
            C::new("answer", "Odpowiedź"),
            C::rendered("category", "Kategoria", category_label),
        ],
        order_by: OrderBy::created_at(),
        filter_by: Some("category"),
        validate: validate_as::<models::Faq>,
    },
    CollectionSpec {
        table: "testimonials",
        title: "Opinie Uczestników",
        fields: TESTIMONIALS_FIELDS,
        columns: &[C::new("name", "Osoba"), C::new("role", "Rola"), C::new("quote", "Opinia")],
        order_by: OrderBy::created_at(),
        filter_by: None,
        validate: validate_as::<models::Testimonial>,
    },
    CollectionSpec {
        table: "company_values",
        title: "Wartości Firmy",
        fields: VALUES_FIELDS,
        columns: &[C::new("display_order", "#"), C::new("title", "Wartość"), C::new("description", "Opis")],
        order_by: OrderBy::asc("display_order"),
        filter_by: None,
        validate: validate_as::<models::CompanyValue>,
    },
    CollectionSpec {
        table: "program_goals",
        title: "Założenia Programu",
        fields: PROGRAM_GOALS_FIELDS,
        columns: &[C::new("display_order", "#"), C::new("title", "Tytuł"), C::new("value", "Wartość")],
        order_by: OrderBy::asc("display_order"),
        filter_by: None,
        validate: validate_as::<models::ProgramGoal>,
    },
    CollectionSpec {
        table: "internship_rules",
        title: "Zasady Naboru",
        fields: INTERNSHIP_RULES_FIELDS,
        columns: &[C::new("display_order", "#"), C::new("rule", "Zasada")],
        order_by: OrderBy::asc("display_order"),
        filter_by: None,
        validate: validate_as::<models::InternshipRule>,
    },
    CollectionSpec {
        table: "internship_paths",
        title: "Ścieżki Stażowe",
        fields: INTERNSHIP_FIELDS,
        columns: &[C::new("title", "Ścieżka"), C::new("subtitle", "Stack"), C::new("description", "Opis")],
        order_by: OrderBy::created_at(),
        filter_by: None,
        validate: validate_as::<models::InternshipPath>,
    },
    CollectionSpec {
        table: "timeline_events",
        title: "Oś Czasu",
        fields: TIMELINE_FIELDS,
        columns: &[
            C::new("date_display", "Data"),
            C::new("title", "Wydarzenie"),
            C::new("description", "Opis"),
            C::rendered("category", "Kategoria", category_label),
        ],
        order_by: OrderBy::created_at(),
        filter_by: Some("category"),
        validate: validate_as::<models::TimelineEvent>,
    },
    CollectionSpec {
        table: "video_gallery",
        title: "Galeria Wideo",
        fields: VIDEO_FIELDS,
        columns: &[C::new("title", "Tytuł"), C::new("url", "Link")],
        order_by: OrderBy::created_at(),
        filter_by: None,
        validate: validate_as::<models::Video>,
    },
    CollectionSpec {
        table: "company_stats",
        title: "Statystyki Firmy",
        fields: STATS_FIELDS,
        columns: &[C::new("display_order", "#"), C::new("label", "Etykieta"), C::new("value", "Wartość")],
        order_by: OrderBy::asc("display_order"),
        filter_by: None,
        validate: validate_as::<models::CompanyStat>,
    },
    CollectionSpec {
        table: "growth_points",
        title: "Punkty Wykresu",
        fields: GROWTH_FIELDS,
        columns: &[C::new("year", "Rok"), C::new("count", "Wartość")],
        order_by: OrderBy::asc("year"),
        filter_by: None,
        validate: validate_as::<models::GrowthPoint>,
    },
    CollectionSpec {
        table: "memories",
        title: "Galeria Zdjęć",
        fields: MEMORIES_FIELDS,
        columns: &[C::new("year", "Rok"), C::new("label", "Etykieta"), C::new("image_url", "URL Zdjęcia")],
        order_by: OrderBy::asc("year"),
        filter_by: None,
        validate: validate_as::<models::Memory>,
    },
    CollectionSpec {
        table: "internship_projects",
        title: "Historia Projektów",
        fields: PROJECTS_FIELDS,
        columns: &[C::new("year", "Rok"), C::new("title", "Projekt"), C::new("team", "Zespół")],
        order_by: OrderBy::asc("year"),
        filter_by: None,
        validate: validate_as::<models::InternshipProject>,
    },
];

/// Look up a collection by table name
pub fn collection(table: &str) -> Option<&'static CollectionSpec> {
    COLLECTIONS.iter().find(|c| c.table == table)
}

// ========================================
// Tabs
// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "collections", rename_all = "lowercase")]
pub enum TabKind {
    /// One admin section per listed collection
    Sections(&'static [&'static str]),
    /// Team roster, administrators only
    Team,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tab {
    pub id: &'static str,
    pub label: &'static str,
    #[serde(flatten)]
    pub kind: TabKind,
}

impl Tab {
    pub fn admin_only(&self) -> bool {
        matches!(self.kind, TabKind::Team)
    }

    /// Collection specs shown on this tab, in display order
    pub fn collections(&self) -> Vec<&'static CollectionSpec> {
        match self.kind {
            TabKind::Sections(tables) => tables.iter().filter_map(|t| collection(t)).collect(),
            TabKind::Team => Vec::new(),
        }
    }
}

pub const TEAM_TAB: &str = "team";

pub static TABS: &[Tab] = &[
    Tab { id: "jobs", label: "Oferty Pracy", kind: TabKind::Sections(&["job_offers"]) },
    Tab { id: "faqs", label: "FAQ", kind: TabKind::Sections(&["faqs"]) },
    Tab { id: "testimonials", label: "Opinie", kind: TabKind::Sections(&["testimonials"]) },
    Tab { id: "values", label: "Wartości", kind: TabKind::Sections(&["company_values"]) },
    Tab {
        id: "internship",
        label: "Ścieżki Stażowe",
        kind: TabKind::Sections(&["program_goals", "internship_rules", "internship_paths"]),
    },
    Tab { id: "timeline", label: "Oś Czasu", kind: TabKind::Sections(&["timeline_events"]) },
    Tab { id: "videos", label: "Wideo", kind: TabKind::Sections(&["video_gallery"]) },
    Tab { id: "growth", label: "Rozwój", kind: TabKind::Sections(&["company_stats", "growth_points"]) },
    Tab { id: "memories", label: "Wspomnienia", kind: TabKind::Sections(&["memories", "internship_projects"]) },
    Tab { id: TEAM_TAB, label: "Zespół", kind: TabKind::Team },
];

pub fn tab(id: &str) -> Option<&'static Tab> {
    TABS.iter().find(|t| t.id == id)
}

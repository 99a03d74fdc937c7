use serde::Serialize;

/// How a field is edited and stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    /// Single-line text
    ShortText,
    /// Multi-line text
    LongText,
    /// Numeric input kept as raw text; Postgres casts it on write
    Numeric,
    /// One value out of `options`
    SingleSelect,
    /// Ordered list of strings, typed as `a; b; c`
    DelimitedList,
    /// Same as `DelimitedList`, rendered as chips
    TagList,
    /// Public URL of an uploaded image
    ImageReference,
}

impl FieldKind {
    pub fn is_list(&self) -> bool {
        matches!(self, FieldKind::DelimitedList | FieldKind::TagList)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "no_options")]
    pub options: &'static [&'static str],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
    pub required: bool,
}

impl FieldDescriptor {
    const fn of(key: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self { key, label, kind, options: &[], placeholder: None, required: false }
    }

    pub const fn short(key: &'static str, label: &'static str) -> Self {
        Self::of(key, label, FieldKind::ShortText)
    }

    pub const fn long(key: &'static str, label: &'static str) -> Self {
        Self::of(key, label, FieldKind::LongText)
    }

    pub const fn numeric(key: &'static str, label: &'static str) -> Self {
        Self::of(key, label, FieldKind::Numeric)
    }

    pub const fn select(key: &'static str, label: &'static str, options: &'static [&'static str]) -> Self {
        let mut field = Self::of(key, label, FieldKind::SingleSelect);
        field.options = options;
        field
    }

    pub const fn list(key: &'static str, label: &'static str) -> Self {
        Self::of(key, label, FieldKind::DelimitedList)
    }

    pub const fn tags(key: &'static str, label: &'static str) -> Self {
        Self::of(key, label, FieldKind::TagList)
    }

    pub const fn image(key: &'static str, label: &'static str) -> Self {
        Self::of(key, label, FieldKind::ImageReference)
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    pub fn allows_option(&self, value: &str) -> bool {
        self.options.iter().any(|option| *option == value)
    }
}

fn no_options(options: &&'static [&'static str]) -> bool {
    options.is_empty()
}

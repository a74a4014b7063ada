use serde::{Deserialize, Serialize};

/// Separator used to join `authors` into `authors_str`.
pub const AUTHORS_SEPARATOR: &str = "; ";

/// A single bibliographic record as consumed by the index builder.
///
/// `id` is not stored here: the builder assigns dense ids in consumption
/// order, so a `Record`'s id is simply its position in the input stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub page_range: Option<String>,
    #[serde(default)]
    pub doi: Option<String>,
}

impl Record {
    pub fn authors_str(&self) -> String {
        self.authors.join(AUTHORS_SEPARATOR)
    }
}

/// A byte-offset span within a field, used for the optional `highlight` hint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HighlightSpan {
    pub start: u32,
    pub end: u32,
}

/// Retrievable record returned from `search`/`get_entry`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub id: u32,
    pub key: String,
    pub title: String,
    pub authors_str: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<std::collections::HashMap<String, Vec<HighlightSpan>>>,
}

/// Two self-contained tiers of fields. Core is loaded eagerly; extended is
/// loaded lazily the first time a query needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Core,
    Ext,
}

impl Tier {
    pub fn dir_prefix(self) -> &'static str {
        match self {
            Tier::Core => "index.core",
            Tier::Ext => "index.ext",
        }
    }
}

/// Fields carried by the core tier, in the fixed order the on-disk
/// struct-of-arrays pointer table commits to. `Title` and `Authors` carry
/// positional postings; `Key` is frequency-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoreField {
    Title,
    Authors,
    Key,
}

impl CoreField {
    pub const ALL: [CoreField; 3] = [CoreField::Title, CoreField::Authors, CoreField::Key];

    pub fn is_positional(self) -> bool {
        matches!(self, CoreField::Title | CoreField::Authors)
    }

    pub fn weight(self) -> f64 {
        match self {
            CoreField::Title => 3.0,
            CoreField::Authors => 1.8,
            CoreField::Key => 0.8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CoreField::Title => "title",
            CoreField::Authors => "authors",
            CoreField::Key => "key",
        }
    }
}

/// Fields carried by the extended tier. All frequency-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtField {
    Venue,
    Year,
    Doi,
}

impl ExtField {
    pub const ALL: [ExtField; 3] = [ExtField::Venue, ExtField::Year, ExtField::Doi];

    pub fn weight(self) -> f64 {
        match self {
            ExtField::Venue => 1.2,
            ExtField::Year => 0.8,
            ExtField::Doi => 0.8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ExtField::Venue => "venue",
            ExtField::Year => "year",
            ExtField::Doi => "doi",
        }
    }
}

/// A field tag spanning both tiers, used once doc sets from core/extended
/// postings have been merged for scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldTag {
    Title,
    Authors,
    Key,
    Venue,
    Year,
    Doi,
}

impl FieldTag {
    pub fn weight(self) -> f64 {
        match self {
            FieldTag::Title => 3.0,
            FieldTag::Authors => 1.8,
            FieldTag::Key => 0.8,
            FieldTag::Venue => 1.2,
            FieldTag::Year => 0.8,
            FieldTag::Doi => 0.8,
        }
    }
}

impl From<CoreField> for FieldTag {
    fn from(f: CoreField) -> Self {
        match f {
            CoreField::Title => FieldTag::Title,
            CoreField::Authors => FieldTag::Authors,
            CoreField::Key => FieldTag::Key,
        }
    }
}

impl From<ExtField> for FieldTag {
    fn from(f: ExtField) -> Self {
        match f {
            ExtField::Venue => FieldTag::Venue,
            ExtField::Year => FieldTag::Year,
            ExtField::Doi => FieldTag::Doi,
        }
    }
}

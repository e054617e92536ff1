//! Index schema definitions.
//!
//! Two fixed schemas share settings and metadata:
//! - loader: ranked articles (link, title, contents, list, rank)
//! - searcher: the query-side index (id, link, title, contents)

use serde_json::{json, Map, Value};

/// Field types used by the fixed schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Exact-match token
    Keyword,
    /// Analyzed full text
    Text,
    Integer,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Keyword => "keyword",
            FieldType::Text => "text",
            FieldType::Integer => "integer",
        }
    }
}

/// Which fixed schema to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Loader,
    Searcher,
}

impl SchemaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaKind::Loader => "loader",
            SchemaKind::Searcher => "searcher",
        }
    }

    /// Parse from string, returning None for unknown kinds.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "loader" => Some(SchemaKind::Loader),
            "searcher" => Some(SchemaKind::Searcher),
            _ => None,
        }
    }

    pub fn build(&self) -> IndexSchema {
        match self {
            SchemaKind::Loader => IndexSchema::loader(),
            SchemaKind::Searcher => IndexSchema::searcher(),
        }
    }
}

impl std::str::FromStr for SchemaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown schema kind: {}", s))
    }
}

/// Versioned index schema: settings, `_meta` tag and field mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSchema {
    /// `_meta.index_type`
    pub index_type: String,
    /// `_meta.version`
    pub version: String,
    pub shards: u32,
    pub replicas: u32,
    /// Field name to type, in mapping order
    pub fields: Vec<(String, FieldType)>,
}

impl IndexSchema {
    fn base(fields: &[(&str, FieldType)]) -> Self {
        Self {
            index_type: "wikis".to_string(),
            version: "1.0".to_string(),
            shards: 8,
            replicas: 1,
            fields: fields
                .iter()
                .map(|(name, ty)| (name.to_string(), *ty))
                .collect(),
        }
    }

    /// Schema for the ranked-article index.
    pub fn loader() -> Self {
        Self::base(&[
            ("link", FieldType::Keyword),
            ("title", FieldType::Text),
            ("contents", FieldType::Text),
            ("list", FieldType::Text),
            ("rank", FieldType::Integer),
        ])
    }

    /// Schema for the query-side index.
    pub fn searcher() -> Self {
        Self::base(&[
            ("id", FieldType::Keyword),
            ("link", FieldType::Keyword),
            ("title", FieldType::Text),
            ("contents", FieldType::Text),
        ])
    }

    /// Request body for index creation.
    pub fn to_body(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, ty)| (name.clone(), json!({ "type": ty.as_str() })))
            .collect();

        json!({
            "settings": {
                "index": {
                    "number_of_shards": self.shards,
                    "number_of_replicas": self.replicas
                }
            },
            "mappings": {
                "_meta": {
                    "index_type": self.index_type,
                    "version": self.version
                },
                "_source": { "enabled": true },
                "properties": properties
            }
        })
    }
}

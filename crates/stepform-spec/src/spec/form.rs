use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Top-level multi-step form metadata. Steps live in a separate sub-resource.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Form {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "formId", default)]
    pub slug: String,
    #[serde(rename = "formTitle", default)]
    pub title: String,
    #[serde(rename = "formDescription", default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
}

impl Form {
    /// Unsaved form; the slug is derived from the title once, here.
    pub fn new(title: impl Into<String>, description: impl Into<String>, price: f64) -> Self {
        let title = title.into();
        Self {
            id: None,
            slug: slugify(&title),
            title,
            description: description.into(),
            price,
        }
    }

    /// Applies a metadata patch. The slug never changes.
    pub fn apply(&mut self, patch: &FormPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
    }
}

/// Partial update of form metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct FormPatch {
    #[serde(rename = "formTitle", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        rename = "formDescription",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl FormPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.price.is_none()
    }
}

/// Lowercases the title and joins its words with hyphens.
pub fn slugify(title: &str) -> String {
    title
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_is_lowercase_and_hyphenated() {
        assert_eq!(slugify("Sell Request"), "sell-request");
        assert_eq!(slugify("  Buy   A Home "), "buy-a-home");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn patch_keeps_slug() {
        let mut form = Form::new("Sell Request", "", 0.0);
        form.apply(&FormPatch {
            title: Some("Sell Now".into()),
            price: Some(25.0),
            ..FormPatch::default()
        });
        assert_eq!(form.slug, "sell-request");
        assert_eq!(form.title, "Sell Now");
        assert_eq!(form.price, 25.0);
    }

    #[test]
    fn form_uses_wire_names() {
        let mut form = Form::new("Sell Request", "Tell us more", 10.0);
        form.id = Some("f1".into());
        let value = serde_json::to_value(&form).expect("encode");
        assert_eq!(value["_id"], "f1");
        assert_eq!(value["formId"], "sell-request");
        assert_eq!(value["formTitle"], "Sell Request");
        assert_eq!(value["formDescription"], "Tell us more");
        assert_eq!(value["price"], 10.0);
    }
}

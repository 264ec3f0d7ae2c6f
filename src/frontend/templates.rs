use serde::Serialize;
use tera::{Context, Tera};

use crate::backend::PhraseData;
use crate::error::Result;

const DEGRADED_PHRASE: &str = "Unable to fetch phrase right now.";
pub const DEGRADED_ERROR: &str = "Backend service unavailable. Please try again.";

/// Page renderer backed by templates compiled into the binary.
pub struct PageRenderer {
    tera: Tera,
}

/// Timings arrive preformatted so the template can test for presence; a
/// reported `0` must still render.
#[derive(Serialize)]
struct PhraseView<'a> {
    phrase: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    selection_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_time: Option<String>,
    error: Option<&'a str>,
}

fn format_selection_time(value: Option<&serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::Null => None,
        serde_json::Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

impl PageRenderer {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("base.html", include_str!("../../templates/base.html")),
            ("index.html", include_str!("../../templates/index.html")),
            ("phrase.html", include_str!("../../templates/phrase.html")),
        ])?;
        Ok(Self { tera })
    }

    pub fn index(&self) -> Result<String> {
        Ok(self.tera.render("index.html", &Context::new())?)
    }

    pub fn phrase(&self, data: &PhraseData) -> Result<String> {
        self.render_phrase(&PhraseView {
            phrase: &data.phrase,
            selection_time: format_selection_time(data.selection_time.as_ref()),
            total_time: Some(data.total_time.to_string()),
            error: None,
        })
    }

    /// Page shown when the backend could not be reached.
    pub fn degraded(&self) -> Result<String> {
        self.render_phrase(&PhraseView {
            phrase: DEGRADED_PHRASE,
            selection_time: None,
            total_time: None,
            error: Some(DEGRADED_ERROR),
        })
    }

    fn render_phrase(&self, view: &PhraseView<'_>) -> Result<String> {
        let context = Context::from_serialize(view)?;
        Ok(self.tera.render("phrase.html", &context)?)
    }
}

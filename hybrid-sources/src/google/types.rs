use hybrid_common::{AnswerBox, Citation, GoogleOptions, KnowledgePanel, NormalizedResult};
use serde::{Deserialize, Serialize};

use crate::null_as_default;

pub const GOOGLE_LABEL: &str = "Google (Serper)";

/// Request body for `POST /search`.
#[derive(Debug, Clone, Serialize)]
pub struct SerperSearchRequest<'a> {
    pub q: &'a str,
    pub num: u32,
    pub gl: &'a str,
    pub hl: &'a str,
}

impl<'a> SerperSearchRequest<'a> {
    pub fn new(query: &'a str, opts: &'a GoogleOptions) -> Self {
        Self {
            q: query,
            num: opts.num,
            gl: &opts.gl,
            hl: &opts.hl,
        }
    }
}

/// The subset of the Serper response we map. Everything else is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SerperResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub organic: Vec<OrganicResult>,
    #[serde(default, rename = "answerBox")]
    pub answer_box: Option<SerperAnswerBox>,
    #[serde(default, rename = "knowledgeGraph")]
    pub knowledge_graph: Option<SerperKnowledgeGraph>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrganicResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub link: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub snippet: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub position: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SerperAnswerBox {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub link: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SerperKnowledgeGraph {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub website: String,
}

impl SerperResponse {
    /// Normalize, keeping at most `limit` organic entries in backend order.
    pub fn into_normalized(self, limit: usize) -> NormalizedResult {
        let total = self.organic.len();
        let entries: Vec<Citation> = self
            .organic
            .into_iter()
            .take(limit)
            .map(|r| Citation {
                title: r.title,
                url: r.link,
                snippet: r.snippet,
                date: r.date.filter(|d| !d.is_empty()),
                position: r.position,
            })
            .collect();

        let answer_box = self.answer_box.and_then(|ab| {
            let answer = ab
                .answer
                .filter(|a| !a.trim().is_empty())
                .or(ab.snippet)
                .unwrap_or_default();
            if answer.trim().is_empty() && ab.title.is_empty() {
                return None;
            }
            Some(AnswerBox {
                title: ab.title,
                answer,
                source: ab.link,
            })
        });

        let knowledge_graph = self.knowledge_graph.and_then(|kg| {
            if kg.title.is_empty() && kg.description.is_empty() {
                return None;
            }
            Some(KnowledgePanel {
                title: kg.title,
                kind: kg.kind,
                description: kg.description,
                source: kg.website,
            })
        });

        NormalizedResult {
            label: GOOGLE_LABEL.to_string(),
            content: String::new(),
            omitted_entries: total.saturating_sub(entries.len()),
            entries,
            answer_box,
            knowledge_graph,
            tool_calls: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_organic_answer_box_and_knowledge_graph() {
        let raw = json!({
            "searchParameters": {"q": "taipei 101", "engine": "google"},
            "answerBox": {"title": "Height", "snippet": "508 m", "link": "https://a.example"},
            "knowledgeGraph": {
                "title": "Taipei 101",
                "type": "Skyscraper",
                "description": "Supertall skyscraper in Taipei.",
                "website": "https://taipei-101.com.tw",
                "attributes": {"Floors": "101"}
            },
            "organic": [
                {"title": "Taipei 101 - Wikipedia", "link": "https://en.wikipedia.org/wiki/Taipei_101",
                 "snippet": "Taipei 101 is a supertall skyscraper", "position": 1},
                {"title": "Official site", "link": "https://taipei-101.com.tw",
                 "snippet": "Observatory tickets", "date": "Mar 3, 2025", "position": 2,
                 "sitelinks": [{"title": "x", "link": "y"}]}
            ],
            "peopleAlsoAsk": []
        });
        let resp: SerperResponse = serde_json::from_value(raw).unwrap();
        let n = resp.into_normalized(10);

        assert_eq!(n.label, GOOGLE_LABEL);
        assert!(n.content.is_empty());
        assert_eq!(n.entries.len(), 2);
        assert_eq!(n.entries[0].url, "https://en.wikipedia.org/wiki/Taipei_101");
        assert_eq!(n.entries[1].date.as_deref(), Some("Mar 3, 2025"));
        assert_eq!(n.entries[1].position, Some(2));
        assert_eq!(n.omitted_entries, 0);

        let ab = n.answer_box.unwrap();
        assert_eq!(ab.answer, "508 m");
        assert_eq!(ab.source, "https://a.example");

        let kg = n.knowledge_graph.unwrap();
        assert_eq!(kg.kind, "Skyscraper");
        assert_eq!(kg.source, "https://taipei-101.com.tw");
    }

    #[test]
    fn extra_entries_are_dropped_and_counted() {
        let organic: Vec<_> = (1..=5)
            .map(|i| json!({"title": format!("r{i}"), "link": format!("https://r{i}.example")}))
            .collect();
        let resp: SerperResponse = serde_json::from_value(json!({ "organic": organic })).unwrap();
        let n = resp.into_normalized(3);
        assert_eq!(n.entries.len(), 3);
        assert_eq!(n.entries[2].title, "r3");
        assert_eq!(n.omitted_entries, 2);
    }

    #[test]
    fn empty_object_is_an_empty_success_shape() {
        let resp: SerperResponse = serde_json::from_value(json!({})).unwrap();
        let n = resp.into_normalized(10);
        assert!(n.is_empty());
        assert!(n.answer_box.is_none());
    }

    #[test]
    fn null_fields_read_as_empty() {
        let resp: SerperResponse = serde_json::from_value(json!({
            "organic": [
                {"title": "ok", "link": "https://a.example", "snippet": "fine"},
                {"title": "ok2", "link": "https://b.example", "snippet": null, "date": null},
                {"title": null, "link": null, "snippet": null, "position": null}
            ],
            "answerBox": {"title": "Height", "answer": null, "snippet": "508 m", "link": null},
            "knowledgeGraph": {"title": "Taipei 101", "type": null, "description": null, "website": null}
        }))
        .unwrap();
        let n = resp.into_normalized(10);
        assert_eq!(n.entries.len(), 3);
        assert_eq!(n.entries[1].title, "ok2");
        assert!(n.entries[1].snippet.is_empty());
        assert!(n.entries[1].date.is_none());
        assert!(n.entries[2].url.is_empty());

        let ab = n.answer_box.unwrap();
        assert_eq!(ab.answer, "508 m");
        assert!(ab.source.is_empty());
        assert_eq!(n.knowledge_graph.unwrap().title, "Taipei 101");

        let resp: SerperResponse = serde_json::from_value(json!({"organic": null})).unwrap();
        assert!(resp.into_normalized(10).is_empty());
    }

    #[test]
    fn answer_prefers_answer_over_snippet() {
        let resp: SerperResponse = serde_json::from_value(json!({
            "answerBox": {"answer": "42", "snippet": "long text", "link": ""}
        }))
        .unwrap();
        assert_eq!(resp.into_normalized(10).answer_box.unwrap().answer, "42");
    }

    #[test]
    fn request_body_uses_serper_field_names() {
        let opts = GoogleOptions::default();
        let body = serde_json::to_value(SerperSearchRequest::new("rust", &opts)).unwrap();
        assert_eq!(body, json!({"q": "rust", "num": 10, "gl": "tw", "hl": "zh-TW"}));
    }
}

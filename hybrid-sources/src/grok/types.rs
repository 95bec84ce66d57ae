use hybrid_common::{Citation, GrokMode, NormalizedResult, ToolCall};
use serde::{Deserialize, Serialize};

use crate::null_as_default;
use serde_json::Value;

pub fn mode_label(mode: GrokMode) -> &'static str {
    match mode {
        GrokMode::Web => "Grok Web",
        GrokMode::X => "Grok X/Twitter",
        GrokMode::Both => "Grok Web + X",
    }
}

/// Server-side search tools enabled for a mode.
pub fn tools_for(mode: GrokMode) -> Vec<GrokTool> {
    let web = GrokTool {
        kind: "web_search",
    };
    let x = GrokTool { kind: "x_search" };
    match mode {
        GrokMode::Web => vec![web],
        GrokMode::X => vec![x],
        GrokMode::Both => vec![web, x],
    }
}

pub fn build_prompt(mode: GrokMode, query: &str, language: &str) -> String {
    let scope = match mode {
        GrokMode::Web => "Search the web for the latest information about",
        GrokMode::X => "Search X/Twitter for the latest discussions and posts about",
        GrokMode::Both => "Search both the web and X/Twitter for the latest information about",
    };
    format!(
        "{scope} \"{query}\". Summarize the key points, answer in {language}, and cite your sources."
    )
}

#[derive(Debug, Clone, Serialize)]
pub struct GrokTool {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

/// Request body for `POST /responses`.
#[derive(Debug, Clone, Serialize)]
pub struct GrokRequest<'a> {
    pub model: &'a str,
    pub tools: Vec<GrokTool>,
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Responses API payload, plus the chat-completions fallback fields some
/// deployments still return.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GrokResponse {
    #[serde(default)]
    pub output_text: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub output: Vec<OutputItem>,
    /// Usually a format object on the Responses API; only a bare string is content.
    #[serde(default)]
    pub text: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub choices: Vec<ChatChoice>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub citations: Vec<CitationRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputItem {
    #[serde(default, rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<Value>,
    #[serde(default)]
    pub action: Option<Value>,
    #[serde(default)]
    pub input: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Vec<OutputContent>,
}

impl OutputItem {
    fn is_tool_call(&self) -> bool {
        self.kind.ends_with("_call") || self.kind == "tool_call"
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputContent {
    #[serde(default, rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Annotation {
    #[serde(default, rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatChoice {
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: ChatMessage,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Citations arrive either as bare URLs or as `{title, url}` objects.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CitationRef {
    Url(String),
    Titled {
        #[serde(default, deserialize_with = "null_as_default")]
        title: String,
        #[serde(default, deserialize_with = "null_as_default")]
        url: String,
    },
}

impl GrokResponse {
    /// Answer text, taken from the first shape that carries any.
    pub fn content(&self) -> String {
        if let Some(text) = self.output_text.as_deref().filter(|t| !t.is_empty()) {
            return text.to_string();
        }

        let joined: String = self
            .output
            .iter()
            .filter(|item| item.kind == "message")
            .flat_map(|item| &item.content)
            .filter(|c| c.kind == "output_text" || c.kind == "text")
            .map(|c| c.text.as_str())
            .collect();
        if !joined.is_empty() {
            return joined;
        }

        if let Some(Value::String(text)) = &self.text {
            if !text.is_empty() {
                return text.clone();
            }
        }

        self.choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default()
    }

    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.output
            .iter()
            .filter(|item| item.is_tool_call())
            .map(|item| ToolCall {
                name: item.name.clone().unwrap_or_else(|| item.kind.clone()),
                arguments: item
                    .arguments
                    .clone()
                    .or_else(|| item.action.clone())
                    .or_else(|| item.input.clone())
                    .unwrap_or(Value::Null),
            })
            .collect()
    }

    /// Top-level `citations`, else URL annotations on message content.
    pub fn citations(&self) -> Vec<Citation> {
        let refs: Vec<(String, String)> = if !self.citations.is_empty() {
            self.citations
                .iter()
                .map(|c| match c {
                    CitationRef::Url(url) => (String::new(), url.clone()),
                    CitationRef::Titled { title, url } => (title.clone(), url.clone()),
                })
                .collect()
        } else {
            let mut seen = std::collections::HashSet::new();
            self.output
                .iter()
                .flat_map(|item| &item.content)
                .flat_map(|c| &c.annotations)
                .filter(|a| a.kind == "url_citation" && !a.url.is_empty())
                .filter(|a| seen.insert(a.url.clone()))
                .map(|a| (a.title.clone(), a.url.clone()))
                .collect()
        };

        refs.into_iter()
            .filter(|(title, url)| !(title.is_empty() && url.is_empty()))
            .enumerate()
            .map(|(i, (title, url))| Citation {
                title,
                url,
                snippet: String::new(),
                date: None,
                position: Some(i as u32 + 1),
            })
            .collect()
    }

    pub fn into_normalized(self, mode: GrokMode) -> NormalizedResult {
        NormalizedResult {
            label: mode_label(mode).to_string(),
            content: self.content(),
            entries: self.citations(),
            answer_box: None,
            knowledge_graph: None,
            tool_calls: self.tool_calls(),
            omitted_entries: 0,
        }
    }
}

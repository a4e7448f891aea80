use serde::{Deserialize, Serialize};

// Field names follow the `caterpillar.Caterpillar` service definition. Missing request
// fields read as empty strings, like proto3 scalars.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewspaperRequest {
    pub link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewspaperReply {
    pub link: String,
    pub title: String,
    pub text: String,
    pub canonical: String,
    pub pubdate: String,
    pub authors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentenceReply {
    pub sentences: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryReply {
    pub summary: String,
    pub keywords: Vec<String>,
}

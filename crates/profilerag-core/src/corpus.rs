//! Turns the external profile corpus into indexable [`Document`]s.
//!
//! Two shapes are accepted: a structured profile JSON file, flattened into one
//! passage per fact, or a directory of `.txt` files split on blank lines.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{Document, DocumentMetadata};

const PROFILE_SOURCE: &str = "profile";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileCorpus {
    pub name: String,
    pub title: String,
    pub summary: String,
    /// Skill categories in the order the file declares them.
    #[serde(deserialize_with = "ordered_skills")]
    pub skills: Vec<(String, Vec<String>)>,
    pub experiences: Vec<Experience>,
    pub star_examples: Vec<StarExample>,
    pub additional: Vec<AdditionalContent>,
}

fn ordered_skills<'de, D>(deserializer: D) -> std::result::Result<Vec<(String, Vec<String>)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct SkillsVisitor;

    impl<'de> Visitor<'de> for SkillsVisitor {
        type Value = Vec<(String, Vec<String>)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of skill category to a list of skills")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
            let mut categories = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(entry) = map.next_entry::<String, Vec<String>>()? {
                categories.push(entry);
            }
            Ok(categories)
        }
    }

    deserializer.deserialize_map(SkillsVisitor)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Experience {
    pub company: String,
    pub position: String,
    pub duration: String,
    pub description: String,
    pub achievements: Vec<String>,
}

/// A Situation/Task/Action/Result story.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StarExample {
    pub category: String,
    pub situation: String,
    pub task: String,
    pub action: String,
    pub result: String,
    pub skills: Vec<String>,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdditionalContent {
    pub title: String,
    pub content: String,
}

impl ProfileCorpus {
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| Error::Corpus(format!("invalid profile JSON: {}", e)))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| Error::Corpus(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&raw)
    }

    /// Flatten the profile into passages with ids `doc_0`, `doc_1`, ...
    pub fn documents(&self) -> Vec<Document> {
        let mut passages: Vec<(String, DocumentMetadata)> = Vec::new();
        let plain = || DocumentMetadata::with_source(PROFILE_SOURCE);

        if !self.name.is_empty() { passages.push((format!("Name: {}", self.name), plain())); }
        if !self.title.is_empty() { passages.push((format!("Title: {}", self.title), plain())); }
        if !self.summary.is_empty() { passages.push((format!("Summary: {}", self.summary), plain())); }

        for (category, skills) in &self.skills {
            passages.push((format!("{} skills: {}", category, skills.join(", ")), plain()));
        }

        for exp in &self.experiences {
            passages.push((format!("{} at {} ({}): {}", exp.position, exp.company, exp.duration, exp.description), plain()));
            for achievement in &exp.achievements {
                passages.push((format!("Achievement: {}", achievement), plain()));
            }
        }

        for star in &self.star_examples {
            let meta = DocumentMetadata {
                category: Some(star.category.clone()),
                keywords: star.keywords.clone(),
                source: Some(PROFILE_SOURCE.to_string()),
            };
            for (label, body) in [("Situation", &star.situation), ("Task", &star.task), ("Action", &star.action), ("Result", &star.result)] {
                passages.push((format!("{} - {}: {}", star.category, label, body), meta.clone()));
            }
            passages.push((format!("Skills demonstrated: {}", star.skills.join(", ")), meta.clone()));
        }

        for item in &self.additional {
            passages.push((format!("{}: {}", item.title, item.content), plain()));
        }

        passages
            .into_iter()
            .filter(|(text, _)| !text.trim().is_empty())
            .enumerate()
            .map(|(i, (text, metadata))| Document { id: format!("doc_{}", i), text, metadata })
            .collect()
    }
}

/// Load documents from a profile JSON file or a directory of `.txt` files.
pub fn load_corpus(path: &Path) -> Result<Vec<Document>> {
    if path.is_dir() {
        load_text_dir(path)
    } else if path.is_file() {
        Ok(ProfileCorpus::from_path(path)?.documents())
    } else {
        Err(Error::Corpus(format!("corpus path not found: {}", path.display())))
    }
}

/// One document per non-empty paragraph of every `.txt` file under `root`.
pub fn load_text_dir(root: &Path) -> Result<Vec<Document>> {
    let files = list_txt_files(root);
    if files.is_empty() {
        tracing::warn!(dir = %root.display(), "no .txt files found");
        return Ok(vec![]);
    }
    let mut documents = Vec::new();
    for file_path in &files {
        let content = read_file_content(file_path)?;
        let stem = file_path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_else(|| "doc".to_string());
        let category = facet_from_path(file_path, root);
        let paragraphs = content.split("\n\n").map(str::trim).filter(|p| !p.is_empty());
        for (n, paragraph) in paragraphs.enumerate() {
            let metadata = DocumentMetadata {
                category: Some(category.clone()),
                keywords: Vec::new(),
                source: Some(file_path.to_string_lossy().to_string()),
            };
            documents.push(Document { id: format!("{}:{}", stem, n), text: paragraph.to_string(), metadata });
        }
    }
    tracing::info!(files = files.len(), documents = documents.len(), "loaded text corpus");
    Ok(documents)
}

fn read_file_content(file_path: &Path) -> Result<String> {
    match fs::read_to_string(file_path) {
        Ok(content) => Ok(content),
        Err(_) => {
            let bytes = fs::read(file_path).map_err(|e| Error::Corpus(format!("{}: {}", file_path.display(), e)))?;
            Ok(String::from_utf8_lossy(&bytes).to_string())
        }
    }
}

fn facet_from_path(file_path: &Path, root: &Path) -> String {
    let relative_path = file_path.strip_prefix(root).unwrap_or(file_path);
    match relative_path.parent().and_then(|p| p.to_str()) {
        Some(facet) if !facet.is_empty() => facet.to_string(),
        _ => "misc".to_string(),
    }
}

fn list_txt_files(root: &Path) -> Vec<PathBuf> {
    let mut txt_files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("txt"))
        .collect();
    txt_files.sort();
    txt_files
}

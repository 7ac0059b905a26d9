//! Structured resume document produced by the transformer
//!
//! This is the only artifact handed to renderers. It serializes to camelCase
//! JSON; optional fields are left out when absent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The structured result of transforming one resume source
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedResumeDocument {
    pub document_class: String,
    pub metadata: ResumeMetadata,
    pub sections: Vec<ResumeSection>,
    pub raw: String,
}

/// Document-level metadata
///
/// The typed fields are the ones resume commands can set. `extra` collects
/// any other key supplied through metadata overrides (title, tags, ...).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResumeMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResumeMetadata {
    /// Mutable access to a typed string field by its JSON key
    pub fn field_mut(&mut self, key: &str) -> Option<&mut Option<String>> {
        match key {
            "name" => Some(&mut self.name),
            "email" => Some(&mut self.email),
            "phone" => Some(&mut self.phone),
            "linkedin" => Some(&mut self.linkedin),
            "github" => Some(&mut self.github),
            "website" => Some(&mut self.website),
            "location" => Some(&mut self.location),
            _ => None,
        }
    }

    /// Look up an extra (override-supplied) string value
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }
}

/// Classification of a section, derived from its title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Skills,
    Experience,
    Projects,
    Education,
    #[default]
    Custom,
}

impl SectionType {
    /// Classify a section title by case-insensitive keyword, in priority order
    pub fn classify(title: &str) -> Self {
        let lower = title.to_lowercase();
        if lower.contains("skill") {
            SectionType::Skills
        } else if lower.contains("experience") || lower.contains("work") {
            SectionType::Experience
        } else if lower.contains("project") {
            SectionType::Projects
        } else if lower.contains("education") {
            SectionType::Education
        } else {
            SectionType::Custom
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SectionType::Skills => "skills",
            SectionType::Experience => "experience",
            SectionType::Projects => "projects",
            SectionType::Education => "education",
            SectionType::Custom => "custom",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeSection {
    pub id: String,
    #[serde(rename = "type")]
    pub section_type: SectionType,
    pub title: String,
    pub items: Vec<ResumeItem>,
}

/// An entry inside a section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResumeItem {
    #[serde(rename = "skill-group")]
    SkillGroup(SkillGroup),
    #[serde(rename = "experience")]
    Experience(ExperienceEntry),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SkillGroup {
    pub category: String,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceEntry {
    pub company: String,
    pub date_range: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub bullets: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technologies: Option<Vec<String>>,
}

impl ParsedResumeDocument {
    /// Find a section by its id
    pub fn section(&self, id: &str) -> Option<&ResumeSection> {
        self.sections.iter().find(|s| s.id == id)
    }
}

impl ResumeSection {
    pub fn skill_groups(&self) -> impl Iterator<Item = &SkillGroup> {
        self.items.iter().filter_map(|item| match item {
            ResumeItem::SkillGroup(group) => Some(group),
            ResumeItem::Experience(_) => None,
        })
    }

    pub fn experiences(&self) -> impl Iterator<Item = &ExperienceEntry> {
        self.items.iter().filter_map(|item| match item {
            ResumeItem::Experience(entry) => Some(entry),
            ResumeItem::SkillGroup(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_priority_order() {
        assert_eq!(SectionType::classify("Technical Skills"), SectionType::Skills);
        assert_eq!(SectionType::classify("Work History"), SectionType::Experience);
        // "skill" wins over "project"
        assert_eq!(
            SectionType::classify("Project Skills"),
            SectionType::Skills
        );
        assert_eq!(SectionType::classify("EDUCATION"), SectionType::Education);
        assert_eq!(SectionType::classify("Hobbies"), SectionType::Custom);
    }

    #[test]
    fn test_items_serialize_with_type_tags() {
        let section = ResumeSection {
            id: "skills".to_string(),
            section_type: SectionType::Skills,
            title: "Skills".to_string(),
            items: vec![ResumeItem::SkillGroup(SkillGroup {
                category: "Languages".to_string(),
                skills: vec!["Go".to_string()],
            })],
        };
        let value = serde_json::to_value(&section).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "skills",
                "type": "skills",
                "title": "Skills",
                "items": [{"type": "skill-group", "category": "Languages", "skills": ["Go"]}]
            })
        );
    }

    #[test]
    fn test_experience_omits_absent_optionals() {
        let entry = ResumeItem::Experience(ExperienceEntry {
            company: "Acme".to_string(),
            date_range: "2020".to_string(),
            title: "Engineer".to_string(),
            ..Default::default()
        });
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["type"], "experience");
        assert_eq!(value["dateRange"], "2020");
        assert!(value.get("subtitle").is_none());
        assert!(value.get("technologies").is_none());
    }

    #[test]
    fn test_metadata_extra_is_flattened() {
        let mut metadata = ResumeMetadata {
            slug: "cv".to_string(),
            ..Default::default()
        };
        metadata.extra.insert("title".to_string(), json!("My CV"));
        let value = serde_json::to_value(&metadata).unwrap();
        assert_eq!(value, json!({"slug": "cv", "title": "My CV"}));
        assert_eq!(metadata.extra_str("title"), Some("My CV"));
    }

    #[test]
    fn test_document_round_trips_through_json() {
        let doc = ParsedResumeDocument {
            document_class: "resume".to_string(),
            raw: "\\documentclass{resume}".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("\"documentClass\":\"resume\""));
        let back: ParsedResumeDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }
}

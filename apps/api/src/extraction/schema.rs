//! The resume record returned by `/extract_resume`.
//!
//! `ParsedResume::default()` is the source of truth for the required-field map:
//! every key the extractor must return and the empty value it gets when the model
//! leaves it out. The nested records' defaults play the same role for each item
//! of the array fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParsedResume {
    pub resume_text: String,
    pub softskills: Vec<String>,
    pub skills: Vec<String>,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub co_curricular: Vec<String>,
    pub certifications: Vec<Certification>,
    pub projects: Vec<Project>,
    pub summary: String,
    pub linkedin: String,
    pub profile_links: Vec<ProfileLink>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Experience {
    pub company: String,
    pub position: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Education {
    pub institution: String,
    pub degree: String,
    pub field_of_study: String,
    pub start_year: String,
    pub end_year: String,
    pub grade: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Certification {
    pub name: String,
    pub issuer: String,
    pub date: String,
    pub credentials: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    pub title: String,
    pub description: String,
    pub link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileLink {
    pub platform: String,
    pub url: String,
}

/// Shape of one resume field, as described to the model.
pub struct FieldSpec {
    pub name: &'static str,
    pub shape: &'static str,
}

/// Every `ParsedResume` field with the shape the model must produce.
pub const RESUME_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "resumeText",
        shape: "string: the full plain text of the resume",
    },
    FieldSpec {
        name: "softskills",
        shape: "array of strings: interpersonal skills (e.g. \"Leadership\")",
    },
    FieldSpec {
        name: "skills",
        shape: "array of strings: technical skills, tools and languages",
    },
    FieldSpec {
        name: "experience",
        shape: "array of objects {company, position, startDate, endDate, description}",
    },
    FieldSpec {
        name: "education",
        shape: "array of objects {institution, degree, fieldOfStudy, startYear, endYear, grade}",
    },
    FieldSpec {
        name: "coCurricular",
        shape: "array of strings: extracurricular activities and achievements",
    },
    FieldSpec {
        name: "certifications",
        shape: "array of objects {name, issuer, date, credentials}",
    },
    FieldSpec {
        name: "projects",
        shape: "array of objects {title, description, link}",
    },
    FieldSpec {
        name: "summary",
        shape: "string: a short professional summary",
    },
    FieldSpec {
        name: "linkedin",
        shape: "string: LinkedIn profile URL",
    },
    FieldSpec {
        name: "profileLinks",
        shape: "array of objects {platform, url} for GitHub, portfolio and similar",
    },
];

/// Required field → default value, derived from `ParsedResume::default()`.
pub fn required_fields() -> Map<String, Value> {
    match serde_json::to_value(ParsedResume::default()) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Array field → default object for each of its items, from the nested records' `Default`.
pub fn item_defaults() -> Map<String, Value> {
    let mut items = Map::new();
    items.insert("experience".to_string(), default_object::<Experience>());
    items.insert("education".to_string(), default_object::<Education>());
    items.insert("certifications".to_string(), default_object::<Certification>());
    items.insert("projects".to_string(), default_object::<Project>());
    items.insert("profileLinks".to_string(), default_object::<ProfileLink>());
    items
}

fn default_object<T: Default + Serialize>() -> Value {
    serde_json::to_value(T::default()).unwrap_or_else(|_| Value::Object(Map::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_required_fields_match_field_specs() {
        let required = required_fields();
        assert_eq!(required.len(), RESUME_FIELDS.len());
        for spec in RESUME_FIELDS {
            assert!(required.contains_key(spec.name), "missing {}", spec.name);
        }
    }

    #[test]
    fn test_required_field_defaults_are_empty() {
        let required = required_fields();
        assert_eq!(required["resumeText"], json!(""));
        assert_eq!(required["summary"], json!(""));
        assert_eq!(required["experience"], json!([]));
        assert_eq!(required["profileLinks"], json!([]));
    }

    #[test]
    fn test_item_defaults_cover_every_array_of_records() {
        let items = item_defaults();
        let required = required_fields();
        for field in items.keys() {
            assert!(required.contains_key(field), "{field} is not a resume field");
        }
        assert_eq!(
            items["experience"],
            json!({"company": "", "position": "", "startDate": "", "endDate": "", "description": ""})
        );
        assert_eq!(items["profileLinks"], json!({"platform": "", "url": ""}));
        assert_eq!(items.len(), 5);
    }

    #[test]
    fn test_partial_record_deserializes_with_defaults() {
        let parsed: ParsedResume = serde_json::from_value(json!({
            "skills": ["Rust"],
            "experience": [{"company": "Acme", "startDate": "2020-01"}]
        }))
        .unwrap();
        assert_eq!(parsed.skills, vec!["Rust"]);
        assert_eq!(parsed.experience[0].company, "Acme");
        assert_eq!(parsed.experience[0].start_date, "2020-01");
        assert_eq!(parsed.experience[0].end_date, "");
        assert!(parsed.summary.is_empty());
    }
}

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Structured resume as supplied by the caller.
///
/// Known fields are typed; anything else the caller sends (phone, education,
/// links, ...) lands in `extra` and is written back out unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub full_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub experience: Vec<ExperienceEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One position on the resume. `description` holds bullet lines, each prefixed `* `.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub company: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dates: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `null` reads as the field's default, the same as an absent key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Fields the tailoring pipeline never rewrites.
pub const IDENTITY_FIELDS: [&str; 2] = ["full_name", "email"];

impl ResumeRecord {
    /// Serializes the record into an ordered JSON mapping.
    pub fn to_map(&self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Err(serde::ser::Error::custom(
                "resume record did not serialize to an object",
            )),
        }
    }

    pub fn from_map(map: Map<String, Value>) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(map))
    }

    /// Short passages suitable for similarity indexing: the summary, then one
    /// passage per experience entry.
    pub fn passages(&self) -> Vec<String> {
        let mut passages = Vec::new();

        if !self.summary.trim().is_empty() {
            passages.push(self.summary.trim().to_string());
        }

        for entry in &self.experience {
            if entry.description.trim().is_empty() {
                continue;
            }
            let heading = match (entry.title.trim(), entry.company.trim()) {
                ("", "") => String::new(),
                (title, "") => format!("{title}: "),
                ("", company) => format!("{company}: "),
                (title, company) => format!("{title} at {company}: "),
            };
            passages.push(format!("{heading}{}", entry.description.trim()));
        }

        passages
    }
}

/// Renders a list of bullet strings as the `* `-prefixed description format.
pub fn bullets_to_description(bullets: &[String]) -> String {
    bullets
        .iter()
        .map(|b| b.trim())
        .filter(|b| !b.is_empty())
        .map(|b| {
            let body = b.strip_prefix("* ").or_else(|| b.strip_prefix("- ")).unwrap_or(b);
            format!("* {body}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let input = json!({
            "full_name": "Jane Doe",
            "email": "jane@example.com",
            "phone": "555-0100",
            "education": [{"degree": "BSc", "institution": "State U"}],
            "skills": ["SQL"]
        });

        let record: ResumeRecord = serde_json::from_value(input).unwrap();
        assert_eq!(record.extra.get("phone"), Some(&json!("555-0100")));

        let output = serde_json::to_value(&record).unwrap();
        assert_eq!(output["education"][0]["institution"], "State U");
        assert_eq!(output["phone"], "555-0100");
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let record: ResumeRecord = serde_json::from_value(json!({})).unwrap();
        assert!(record.full_name.is_empty());
        assert!(record.skills.is_empty());
        assert!(record.experience.is_empty());
    }

    #[test]
    fn test_null_fields_default_to_empty() {
        let record: ResumeRecord = serde_json::from_value(json!({
            "full_name": null,
            "skills": null,
            "experience": [{"title": "Analyst", "company": "Acme", "dates": null, "description": null}]
        }))
        .unwrap();
        assert!(record.full_name.is_empty());
        assert!(record.skills.is_empty());
        assert_eq!(record.experience[0].company, "Acme");
        assert!(record.experience[0].dates.is_empty());
        assert!(record.experience[0].description.is_empty());
        assert!(record.experience[0].extra.is_empty());
    }

    #[test]
    fn test_experience_entry_keeps_extra_date_fields() {
        let entry: ExperienceEntry = serde_json::from_value(json!({
            "title": "Engineer",
            "company": "Acme",
            "start_date": "2020-01",
            "description": "* Built things"
        }))
        .unwrap();
        assert_eq!(entry.extra.get("start_date"), Some(&json!("2020-01")));
        assert!(entry.dates.is_empty());
    }

    #[test]
    fn test_to_map_keeps_typed_fields_first() {
        let mut record = ResumeRecord {
            full_name: "Jane Doe".to_string(),
            ..Default::default()
        };
        record.extra.insert("phone".to_string(), json!("555"));

        let keys: Vec<String> = record.to_map().unwrap().keys().cloned().collect();
        assert_eq!(keys[0], "full_name");
        assert_eq!(keys.last().map(String::as_str), Some("phone"));
    }

    #[test]
    fn test_passages_skip_empty_descriptions() {
        let record = ResumeRecord {
            summary: "Backend engineer.".to_string(),
            experience: vec![
                ExperienceEntry {
                    title: "Engineer".to_string(),
                    company: "Acme".to_string(),
                    description: "* Cut latency by 40%".to_string(),
                    ..Default::default()
                },
                ExperienceEntry {
                    title: "Intern".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let passages = record.passages();
        assert_eq!(passages.len(), 2);
        assert_eq!(passages[1], "Engineer at Acme: * Cut latency by 40%");
    }

    #[test]
    fn test_bullets_to_description_normalizes_prefixes() {
        let bullets = vec![
            "Architected a service".to_string(),
            "* Reduced costs".to_string(),
            "- Led migration".to_string(),
            "  ".to_string(),
        ];
        assert_eq!(
            bullets_to_description(&bullets),
            "* Architected a service\n* Reduced costs\n* Led migration"
        );
    }
}

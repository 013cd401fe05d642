use serde::{Deserialize, Deserializer, Serialize};

/// One row of `GET /api/resumes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeSummary {
    pub id: i64,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_rating")]
    pub resume_rating: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkExperience {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Education {
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub university: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub cgpa: Option<String>,
    #[serde(default)]
    pub percentage: Option<String>,
    #[serde(default)]
    pub additional: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub issuer: Option<String>,
}

/// Full extraction plus AI feedback for one resume. Also the shape of an
/// upload's `analysis` object, which has no id until the backend stores it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeDetail {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub portfolio_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub core_skills: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub soft_skills: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub work_experience: Vec<WorkExperience>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub education: Vec<Education>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub projects: Vec<Project>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub certifications: Vec<Certification>,
    #[serde(default, deserialize_with = "lenient_rating")]
    pub resume_rating: Option<f64>,
    #[serde(default)]
    pub improvement_areas: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub upskill_suggestions: Vec<String>,
}

impl ResumeDetail {
    /// Column/dialog heading: the extracted name, else the file name.
    pub fn display_title(&self) -> String {
        non_blank(&self.name)
            .or_else(|| non_blank(&self.filename))
            .unwrap_or("Untitled resume")
            .to_string()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoredRecord {
    pub id: i64,
    #[serde(default)]
    pub filename: Option<String>,
}

/// Body of `POST /api/resumes/upload`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub analysis: ResumeDetail,
    #[serde(default, rename = "dbRecord")]
    pub db_record: Option<StoredRecord>,
}

impl UploadResponse {
    pub fn into_detail(self) -> ResumeDetail {
        let mut detail = self.analysis;
        if let Some(record) = self.db_record {
            detail.id.get_or_insert(record.id);
            if detail.filename.is_none() {
                detail.filename = record.filename;
            }
        }
        detail
    }
}

/// `Some(s)` only when the field holds visible text.
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

// Ratings come straight from an LLM: 8, 7.5, "8" and "8/10" all show up.
fn lenient_rating<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => {
            let head = s.split('/').next().unwrap_or_default().trim();
            head.parse::<f64>().ok()
        }
        _ => None,
    })
}

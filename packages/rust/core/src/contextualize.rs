//! Rural contextualization of a generated learning path.
//!
//! The editorial material (per-domain rural contexts and urban → rural
//! phrase substitutions) is not compiled in; it is a [`ContextLibrary`]
//! loaded from the JSON file named by `storage.context_library`.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use regex::{NoExpand, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use trainingcatalog_shared::{
    DifficultyLevel, LearningPath, ModuleUnit, Resource, Result, Settings, TrainingCatalogError,
};
use trainingcatalog_storage::{CatalogStore, CurriculumStore, read_json, write_json_atomic};

/// Path title fragment used when the caller names none.
pub const DEFAULT_PATH_FILTER: &str = "ml basics";

/// Context used when neither the path's domains nor `ml_basics` have one.
const GENERIC_DOMAIN: &str = "general";
const GENERIC_OVERVIEW: &str = "AI concepts applied to rural community challenges.";
const GENERIC_WHY: &str = "Rural communities can benefit from AI-driven solutions.";

const EXTRA_HOURS: f64 = 2.0;
const RURAL_PREREQUISITE: &str =
    "Basic familiarity with rural/agricultural concepts (no AI experience needed)";
const UNCHANGED_NOTE: &str = "Apply the concepts from this resource to the rural use cases below.";

/// Use cases shown for a module whose text matches none.
const FALLBACK_USE_CASES: usize = 2;

// ---------------------------------------------------------------------------
// Context library
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuralUseCase {
    pub concept: String,
    pub urban_example: String,
    pub rural_example: String,
    pub dataset_suggestion: String,
    pub exercise_prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuralDomainContext {
    /// Skill domain wire name (`ml_basics`, ...).
    pub domain: String,
    pub overview: String,
    pub why_it_matters: String,
    #[serde(default)]
    pub use_cases: Vec<RuralUseCase>,
    #[serde(default)]
    pub local_datasets: Vec<String>,
    #[serde(default)]
    pub community_projects: Vec<String>,
}

impl RuralDomainContext {
    fn generic() -> Self {
        Self {
            domain: GENERIC_DOMAIN.into(),
            overview: GENERIC_OVERVIEW.into(),
            why_it_matters: GENERIC_WHY.into(),
            use_cases: Vec::new(),
            local_datasets: Vec::new(),
            community_projects: Vec::new(),
        }
    }
}

/// One phrase replacement, applied case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substitution {
    pub from: String,
    pub to: String,
}

/// Injected editorial tables. Substitutions apply in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextLibrary {
    #[serde(default)]
    pub contexts: Vec<RuralDomainContext>,
    #[serde(default)]
    pub substitutions: Vec<Substitution>,
}

impl ContextLibrary {
    pub fn load(path: &Path) -> Result<Self> {
        read_json(path)?.ok_or_else(|| {
            TrainingCatalogError::config(format!(
                "context library not found at {}",
                path.display()
            ))
        })
    }

    /// The library named in settings, or an empty one.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        match &settings.context_library {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// First context matching one of the path's domains, then `ml_basics`,
    /// then the generic context.
    pub fn context_for(&self, path: &LearningPath) -> RuralDomainContext {
        let find = |name: &str| self.contexts.iter().find(|c| c.domain == name);
        path.domains
            .iter()
            .find_map(|d| find(d.as_str()))
            .or_else(|| find("ml_basics"))
            .cloned()
            .unwrap_or_else(RuralDomainContext::generic)
    }

    fn compiled_substitutions(&self) -> Result<Vec<(Regex, &str)>> {
        self.substitutions
            .iter()
            .map(|s| {
                RegexBuilder::new(&regex::escape(&s.from))
                    .case_insensitive(true)
                    .build()
                    .map(|re| (re, s.to.as_str()))
                    .map_err(|e| {
                        TrainingCatalogError::parse(format!("substitution '{}': {e}", s.from))
                    })
            })
            .collect()
    }
}

fn substitute(text: &str, substitutions: &[(Regex, &str)]) -> String {
    substitutions
        .iter()
        .fold(text.to_string(), |acc, (re, to)| re.replace_all(&acc, NoExpand(*to)).into_owned())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceNote {
    pub title: String,
    pub url: String,
    pub original_description: String,
    pub rural_context_note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSupplement {
    pub module_title: String,
    pub estimated_hours: f64,
    pub resources_with_rural_notes: Vec<ResourceNote>,
    pub rural_use_cases: Vec<RuralUseCase>,
    pub rural_objectives: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuralOverview {
    pub overview: String,
    pub why_it_matters: String,
}

/// A learning path adapted for rural practitioners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextualizedPath {
    pub title: String,
    pub original_path_id: String,
    pub difficulty: DifficultyLevel,
    pub target_audience: String,
    pub rural_context: RuralOverview,
    pub total_estimated_hours: f64,
    pub prerequisites: Vec<String>,
    pub modules: Vec<ModuleSupplement>,
    pub rural_datasets: Vec<String>,
    pub community_projects: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

/// Writes a contextualized path to a file in some presentation format.
pub trait ContextRenderer: Send + Sync {
    fn name(&self) -> &str;
    fn render(&self, path: &ContextualizedPath, output: &Path) -> Result<()>;
}

/// Pretty-printed JSON.
pub struct JsonRenderer;

impl ContextRenderer for JsonRenderer {
    fn name(&self) -> &str {
        "json"
    }

    fn render(&self, path: &ContextualizedPath, output: &Path) -> Result<()> {
        write_json_atomic(output, path)
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Adapt `path` using the context chosen from `library`. Resource ids
/// missing from `resources` are skipped.
pub fn contextualize_path(
    path: &LearningPath,
    resources: &HashMap<String, Resource>,
    library: &ContextLibrary,
) -> Result<ContextualizedPath> {
    let context = library.context_for(path);
    let substitutions = library.compiled_substitutions()?;

    let modules = path
        .modules
        .iter()
        .map(|m| module_supplement(m, resources, &context, &substitutions))
        .collect();

    let subject = path
        .domains
        .first()
        .map(|d| d.as_str().replace('_', " "))
        .unwrap_or_else(|| "AI".to_string());

    let mut prerequisites = path.prerequisites.clone();
    prerequisites.push(RURAL_PREREQUISITE.to_string());

    Ok(ContextualizedPath {
        title: format!("{} — Rural Edition", path.title),
        original_path_id: path.id.clone(),
        difficulty: path.difficulty,
        target_audience: format!(
            "Rural practitioners, agricultural extension workers, community development \
             professionals, and anyone interested in applying {subject} to rural challenges. \
             Original audience: {}",
            path.target_audience
        ),
        rural_context: RuralOverview {
            overview: context.overview,
            why_it_matters: context.why_it_matters,
        },
        total_estimated_hours: path.total_estimated_hours + EXTRA_HOURS,
        prerequisites,
        modules,
        rural_datasets: context.local_datasets,
        community_projects: context.community_projects,
        generated_at: Utc::now(),
    })
}

fn module_supplement(
    module: &ModuleUnit,
    resources: &HashMap<String, Resource>,
    context: &RuralDomainContext,
    substitutions: &[(Regex, &str)],
) -> ModuleSupplement {
    let notes = module
        .resource_ids
        .iter()
        .filter_map(|id| resources.get(id))
        .map(|r| {
            let adapted = substitute(&r.description, substitutions);
            ResourceNote {
                title: r.title.clone(),
                url: r.url.clone(),
                rural_context_note: if adapted == r.description {
                    UNCHANGED_NOTE.to_string()
                } else {
                    adapted
                },
                original_description: r.description.clone(),
            }
        })
        .collect();

    let module_text = std::iter::once(module.title.as_str())
        .chain(std::iter::once(module.description.as_str()))
        .chain(module.objectives.iter().map(|o| o.description.as_str()))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let mut use_cases: Vec<RuralUseCase> = context
        .use_cases
        .iter()
        .filter(|uc| {
            uc.concept
                .to_lowercase()
                .split_whitespace()
                .any(|word| module_text.contains(word))
        })
        .cloned()
        .collect();
    if use_cases.is_empty() {
        use_cases = context.use_cases.iter().take(FALLBACK_USE_CASES).cloned().collect();
    }

    ModuleSupplement {
        module_title: module.title.clone(),
        estimated_hours: module.estimated_hours,
        resources_with_rural_notes: notes,
        rural_objectives: use_cases
            .iter()
            .map(|uc| format!("Apply {} to a rural context: {}", uc.concept, uc.rural_example))
            .collect(),
        rural_use_cases: use_cases,
    }
}

/// Contextualize a path of the most recent curriculum and render it.
///
/// The first path whose title contains `path_title` (case-insensitive,
/// default [`DEFAULT_PATH_FILTER`]) is used. `json_output`, when given,
/// always receives raw JSON regardless of the renderer.
#[instrument(skip_all, fields(renderer = renderer.name(), output = %output.display()))]
pub async fn contextualize(
    settings: &Settings,
    path_title: Option<&str>,
    renderer: &dyn ContextRenderer,
    output: &Path,
    json_output: Option<&Path>,
) -> Result<ContextualizedPath> {
    let curriculum = CurriculumStore::open(&settings.curricula_dir)
        .latest()?
        .ok_or_else(|| {
            TrainingCatalogError::validation("no curriculum found; run `generate` first")
        })?;

    let filter = path_title.unwrap_or(DEFAULT_PATH_FILTER).to_lowercase();
    let path = curriculum
        .learning_paths
        .iter()
        .find(|p| p.title.to_lowercase().contains(&filter))
        .ok_or_else(|| {
            let available: Vec<&str> =
                curriculum.learning_paths.iter().map(|p| p.title.as_str()).collect();
            TrainingCatalogError::validation(format!(
                "no learning path matching '{filter}'; available: {}",
                available.join(", ")
            ))
        })?;

    let library = ContextLibrary::from_settings(settings)?;
    if library.contexts.is_empty() {
        warn!("no context library configured, using the generic rural context");
    }

    let catalog = CatalogStore::open(&settings.catalog_path);
    let resources: HashMap<String, Resource> = catalog
        .get_all(0.0)
        .await?
        .into_iter()
        .map(|r| (r.id.clone(), r))
        .collect();

    let contextualized = contextualize_path(path, &resources, &library)?;
    renderer.render(&contextualized, output)?;
    if let Some(json_output) = json_output {
        write_json_atomic(json_output, &contextualized)?;
    }

    info!(
        path = %path.title,
        modules = contextualized.modules.len(),
        "path contextualized"
    );
    Ok(contextualized)
}

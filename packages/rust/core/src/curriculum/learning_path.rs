//! Per-domain learning path construction.

use std::collections::HashMap;

use chrono::Utc;

use trainingcatalog_shared::taxonomy;
use trainingcatalog_shared::{
    BloomLevel, DifficultyLevel, LearningObjective, LearningPath, ModuleUnit, Resource, Settings,
    SkillDomain,
};

/// Hours assumed for a resource without an estimate.
const DEFAULT_RESOURCE_HOURS: f64 = 2.0;

/// A path holds at most this many modules.
const MAX_MODULES: usize = 3;

fn audience(difficulty: DifficultyLevel) -> &'static str {
    match difficulty {
        DifficultyLevel::Beginner => "Newcomers with no prior experience in this domain",
        DifficultyLevel::Intermediate => {
            "Practitioners with foundational knowledge seeking deeper skills"
        }
        DifficultyLevel::Advanced => "Experienced professionals aiming for expert-level mastery",
    }
}

/// Builds one learning path per difficulty band from a domain's resources.
#[derive(Debug, Clone, Copy)]
pub struct LearningPathBuilder {
    pub max_per_module: usize,
    pub max_hours_beginner: f64,
    pub diversity_cap: f64,
}

impl From<&Settings> for LearningPathBuilder {
    fn from(settings: &Settings) -> Self {
        Self {
            max_per_module: settings.max_resources_per_module.max(1),
            max_hours_beginner: settings.max_hours_beginner_path,
            diversity_cap: settings.provider_diversity_cap,
        }
    }
}

impl LearningPathBuilder {
    /// Paths in beginner, intermediate, advanced order. Bands without
    /// resources, or whose modules were all trimmed away, are omitted.
    pub fn build(&self, domain: SkillDomain, resources: &[Resource]) -> Vec<LearningPath> {
        DifficultyLevel::ALL
            .into_iter()
            .filter_map(|difficulty| {
                let bucket: Vec<&Resource> = resources
                    .iter()
                    .filter(|r| r.difficulty == difficulty)
                    .collect();
                if bucket.is_empty() {
                    return None;
                }
                let path = self.build_path(domain, difficulty, bucket);
                (!path.modules.is_empty()).then_some(path)
            })
            .collect()
    }

    fn build_path(
        &self,
        domain: SkillDomain,
        difficulty: DifficultyLevel,
        mut resources: Vec<&Resource>,
    ) -> LearningPath {
        resources.sort_by(|a, b| b.quality_score.total_cmp(&a.quality_score));
        let mut selected = self.apply_diversity(resources);
        selected.truncate(self.max_per_module * MAX_MODULES);

        let bloom = BloomLevel::for_difficulty(difficulty);
        let domain_title = domain.title();
        let mut modules: Vec<ModuleUnit> = selected
            .chunks(self.max_per_module)
            .enumerate()
            .map(|(idx, chunk)| {
                let order = idx as u32 + 1;
                ModuleUnit {
                    title: format!("Module {order}: {domain_title}"),
                    description: format!("{}-level resources — part {order}", difficulty.title()),
                    resource_ids: chunk.iter().map(|r| r.id.clone()).collect(),
                    objectives: chunk
                        .iter()
                        .map(|r| LearningObjective {
                            description: format!("{} {}", bloom.verb(), r.title),
                            bloom_level: bloom,
                        })
                        .collect(),
                    estimated_hours: chunk
                        .iter()
                        .map(|r| r.estimated_hours.unwrap_or(DEFAULT_RESOURCE_HOURS))
                        .sum(),
                    order,
                }
            })
            .collect();

        if difficulty == DifficultyLevel::Beginner {
            self.trim_to_hour_cap(&mut modules);
        }

        let mut prerequisites: Vec<String> = taxonomy::dependencies(domain)
            .iter()
            .map(|dep| format!("Complete the {} path", dep.title()))
            .collect();
        if let Some(lower) = difficulty.previous() {
            prerequisites.push(format!(
                "Complete the {} path for {domain_title}",
                lower.title()
            ));
        }

        let mut path = LearningPath {
            id: LearningPath::stable_id(domain, difficulty),
            title: format!("{domain_title} — {}", difficulty.title()),
            description: format!(
                "A {difficulty}-level learning path covering {} using curated free and \
                 open-source resources.",
                domain.as_str().replace('_', " ")
            ),
            target_audience: audience(difficulty).to_string(),
            difficulty,
            domains: vec![domain],
            modules,
            total_estimated_hours: 0.0,
            prerequisites,
            created_at: Utc::now(),
            version: "1.0".into(),
        };
        path.recalculate_hours();
        path
    }

    /// Cap each provider at `max(1, floor(cap × n))` items; the excess keeps
    /// its relative order at the tail.
    fn apply_diversity<'a>(&self, resources: Vec<&'a Resource>) -> Vec<&'a Resource> {
        let total = resources.len();
        if total == 0 {
            return resources;
        }
        let max_per_provider = ((total as f64 * self.diversity_cap).floor() as usize).max(1);

        let mut counts: HashMap<&str, usize> = HashMap::new();
        let (mut kept, mut deferred) = (Vec::with_capacity(total), Vec::new());
        for r in resources {
            let provider = if r.provider.is_empty() { "unknown" } else { r.provider.as_str() };
            let count = counts.entry(provider).or_default();
            if *count < max_per_provider {
                *count += 1;
                kept.push(r);
            } else {
                deferred.push(r);
            }
        }
        kept.extend(deferred);
        kept
    }

    /// Keep leading modules while the running total stays within the cap.
    fn trim_to_hour_cap(&self, modules: &mut Vec<ModuleUnit>) {
        let total: f64 = modules.iter().map(|m| m.estimated_hours).sum();
        if total <= self.max_hours_beginner {
            return;
        }
        let mut running = 0.0;
        let keep = modules
            .iter()
            .take_while(|m| {
                running += m.estimated_hours;
                running <= self.max_hours_beginner
            })
            .count();
        modules.truncate(keep);
    }
}

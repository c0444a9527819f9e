//! Static best-practice rules checked against a generated curriculum.
//!
//! Rules are stateless and independent of each other: each one looks at a
//! single learning path (plus the resources it references) and emits zero or
//! more [`ValidationIssue`]s. Findings never block persistence.

use std::collections::{BTreeMap, HashMap};

use trainingcatalog_shared::{
    ContentType, Curriculum, DifficultyLevel, LearningPath, Resource, Settings, Severity,
    SkillCategory, ValidationIssue, ValidationReport,
};

/// What a rule sees for one path.
pub struct PathContext<'a> {
    pub path: &'a LearningPath,
    /// Resources referenced by the path that exist in the lookup table.
    pub resources: Vec<&'a Resource>,
    pub max_hours_beginner: f64,
    pub diversity_cap: f64,
}

impl PathContext<'_> {
    fn issue(&self, rule: &str, severity: Severity, message: String) -> ValidationIssue {
        ValidationIssue {
            path_id: self.path.id.clone(),
            rule: rule.to_string(),
            severity,
            message,
        }
    }

    fn has_content_type(&self, types: &[ContentType]) -> bool {
        self.resources.iter().any(|r| types.contains(&r.content_type))
    }
}

type Rule = fn(&PathContext<'_>) -> Vec<ValidationIssue>;

/// Every rule, by name.
pub const RULES: &[(&str, Rule)] = &[
    ("hands_on_required", hands_on_required),
    ("beginner_hour_cap", beginner_hour_cap),
    ("advanced_needs_paper", advanced_needs_paper),
    ("business_needs_cases", business_needs_cases),
    ("prerequisites_required", prerequisites_required),
    ("provider_diversity", provider_diversity),
    ("module_objectives", module_objectives),
];

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct BestPracticesEngine {
    pub max_hours_beginner: f64,
    pub diversity_cap: f64,
}

impl From<&Settings> for BestPracticesEngine {
    fn from(settings: &Settings) -> Self {
        Self {
            max_hours_beginner: settings.max_hours_beginner_path,
            diversity_cap: settings.provider_diversity_cap,
        }
    }
}

impl BestPracticesEngine {
    /// Run every rule over every path. `resources` maps resource id to
    /// resource; ids missing from it are ignored.
    pub fn validate(
        &self,
        curriculum: &Curriculum,
        resources: &HashMap<String, Resource>,
    ) -> ValidationReport {
        let mut report = ValidationReport::default();
        for path in &curriculum.learning_paths {
            let ctx = PathContext {
                path,
                resources: path.resource_ids().filter_map(|id| resources.get(id)).collect(),
                max_hours_beginner: self.max_hours_beginner,
                diversity_cap: self.diversity_cap,
            };
            for (_, rule) in RULES {
                report.issues.extend(rule(&ctx));
            }
        }
        report
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

fn hands_on_required(ctx: &PathContext<'_>) -> Vec<ValidationIssue> {
    if ctx.has_content_type(&[ContentType::Course, ContentType::InteractiveNotebook]) {
        return vec![];
    }
    vec![ctx.issue(
        "hands_on_required",
        Severity::Warning,
        format!(
            "Path '{}' has no hands-on resources (notebooks or interactive courses).",
            ctx.path.title
        ),
    )]
}

fn beginner_hour_cap(ctx: &PathContext<'_>) -> Vec<ValidationIssue> {
    let path = ctx.path;
    if path.difficulty != DifficultyLevel::Beginner
        || path.total_estimated_hours <= ctx.max_hours_beginner
    {
        return vec![];
    }
    vec![ctx.issue(
        "beginner_hour_cap",
        Severity::Warning,
        format!(
            "Beginner path '{}' is {}h, exceeding the recommended {}h cap.",
            path.title, path.total_estimated_hours, ctx.max_hours_beginner
        ),
    )]
}

fn advanced_needs_paper(ctx: &PathContext<'_>) -> Vec<ValidationIssue> {
    if ctx.path.difficulty != DifficultyLevel::Advanced
        || ctx.has_content_type(&[ContentType::Paper])
    {
        return vec![];
    }
    vec![ctx.issue(
        "advanced_needs_paper",
        Severity::Info,
        format!(
            "Advanced path '{}' has no research papers; consider adding one.",
            ctx.path.title
        ),
    )]
}

fn business_needs_cases(ctx: &PathContext<'_>) -> Vec<ValidationIssue> {
    let is_business = ctx
        .path
        .domains
        .iter()
        .any(|d| d.category() == SkillCategory::Business);
    if !is_business {
        return vec![];
    }
    let has_cases = ctx.resources.iter().any(|r| {
        let text = format!("{} {}", r.description, r.tags.join(" ")).to_lowercase();
        text.contains("case study") || text.contains("strategy")
    });
    if has_cases {
        return vec![];
    }
    vec![ctx.issue(
        "business_needs_cases",
        Severity::Info,
        format!(
            "Business path '{}' could benefit from case-study content.",
            ctx.path.title
        ),
    )]
}

fn prerequisites_required(ctx: &PathContext<'_>) -> Vec<ValidationIssue> {
    let path = ctx.path;
    if path.difficulty == DifficultyLevel::Beginner || !path.prerequisites.is_empty() {
        return vec![];
    }
    vec![ctx.issue(
        "prerequisites_required",
        Severity::Warning,
        format!("Non-beginner path '{}' has no prerequisites listed.", path.title),
    )]
}

fn provider_diversity(ctx: &PathContext<'_>) -> Vec<ValidationIssue> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for r in &ctx.resources {
        if !r.provider.is_empty() {
            *counts.entry(r.provider.as_str()).or_default() += 1;
        }
    }
    let total: usize = counts.values().sum();

    counts
        .into_iter()
        .filter(|&(_, count)| count as f64 / total as f64 > ctx.diversity_cap)
        .map(|(provider, count)| {
            ctx.issue(
                "provider_diversity",
                Severity::Warning,
                format!(
                    "Provider '{provider}' represents {count}/{total} ({:.0}%) of path '{}'; cap is {:.0}%.",
                    count as f64 / total as f64 * 100.0,
                    ctx.path.title,
                    ctx.diversity_cap * 100.0
                ),
            )
        })
        .collect()
}

fn module_objectives(ctx: &PathContext<'_>) -> Vec<ValidationIssue> {
    ctx.path
        .modules
        .iter()
        .filter(|m| m.objectives.is_empty())
        .map(|m| {
            ctx.issue(
                "module_objectives",
                Severity::Info,
                format!(
                    "Module '{}' in path '{}' has no learning objectives.",
                    m.title, ctx.path.title
                ),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use trainingcatalog_shared::{
        CurriculumMetadata, LearningObjective, ModuleUnit, SkillDomain,
    };

    fn engine() -> BestPracticesEngine {
        BestPracticesEngine {
            max_hours_beginner: 20.0,
            diversity_cap: 0.4,
        }
    }

    fn resource(id: &str, provider: &str, content_type: ContentType) -> Resource {
        let mut r = Resource::new(format!("https://example.com/{id}"), id);
        r.id = id.into();
        r.provider = provider.into();
        r.content_type = content_type;
        r
    }

    fn path(
        difficulty: DifficultyLevel,
        domain: SkillDomain,
        ids: &[&str],
        objectives: bool,
    ) -> LearningPath {
        LearningPath {
            id: format!("{domain}-{difficulty}"),
            title: format!("{} — {}", domain.title(), difficulty.title()),
            description: String::new(),
            target_audience: String::new(),
            difficulty,
            domains: vec![domain],
            modules: vec![ModuleUnit {
                title: "Module 1".into(),
                description: String::new(),
                resource_ids: ids.iter().map(|s| s.to_string()).collect(),
                objectives: if objectives {
                    vec![LearningObjective {
                        description: "Understand x".into(),
                        bloom_level: Default::default(),
                    }]
                } else {
                    vec![]
                },
                estimated_hours: 2.0,
                order: 1,
            }],
            total_estimated_hours: 2.0,
            prerequisites: vec![],
            created_at: Utc::now(),
            version: "1.0".into(),
        }
    }

    fn curriculum(paths: Vec<LearningPath>) -> Curriculum {
        Curriculum {
            id: "c".into(),
            title: "c".into(),
            description: String::new(),
            learning_paths: paths,
            generated_at: Utc::now(),
            source_catalog_hash: String::new(),
            metadata: CurriculumMetadata::default(),
        }
    }

    fn lookup(resources: Vec<Resource>) -> HashMap<String, Resource> {
        resources.into_iter().map(|r| (r.id.clone(), r)).collect()
    }

    fn rules_hit(report: &ValidationReport) -> Vec<&str> {
        let mut rules: Vec<&str> = report.issues.iter().map(|i| i.rule.as_str()).collect();
        rules.sort();
        rules.dedup();
        rules
    }

    #[test]
    fn clean_beginner_path_passes() {
        let resources = lookup(vec![
            resource("a", "mit", ContentType::Course),
            resource("b", "kaggle", ContentType::InteractiveNotebook),
            resource("c", "fast.ai", ContentType::Tutorial),
            resource("d", "", ContentType::Tutorial),
        ]);
        let c = curriculum(vec![path(
            DifficultyLevel::Beginner,
            SkillDomain::MlBasics,
            &["a", "b", "c", "d"],
            true,
        )]);
        let report = engine().validate(&c, &resources);
        assert!(report.issues.is_empty(), "{:?}", report.issues);
    }

    #[test]
    fn advanced_path_rules() {
        let resources = lookup(vec![
            resource("a", "mit", ContentType::Tutorial),
            resource("b", "mit", ContentType::Tutorial),
        ]);
        let c = curriculum(vec![path(
            DifficultyLevel::Advanced,
            SkillDomain::DeepLearning,
            &["a", "b", "missing"],
            false,
        )]);
        let report = engine().validate(&c, &resources);
        assert_eq!(
            rules_hit(&report),
            vec![
                "advanced_needs_paper",
                "hands_on_required",
                "module_objectives",
                "prerequisites_required",
                "provider_diversity",
            ]
        );
        assert_eq!(report.warning_count(), 3);
        assert_eq!(report.info_count(), 2);
        let diversity = report.by_rule("provider_diversity").next().unwrap();
        assert!(diversity.message.contains("2/2 (100%)"));
    }

    #[test]
    fn business_paths_want_case_studies() {
        let mut with_case = resource("a", "hbr", ContentType::Course);
        with_case.description = "A Case Study in AI adoption".into();
        let plain = resource("b", "x", ContentType::Course);

        let c = curriculum(vec![path(
            DifficultyLevel::Beginner,
            SkillDomain::AiStrategy,
            &["b"],
            true,
        )]);
        let report = engine().validate(&c, &lookup(vec![plain.clone()]));
        assert_eq!(report.by_rule("business_needs_cases").count(), 1);

        let c = curriculum(vec![path(
            DifficultyLevel::Beginner,
            SkillDomain::AiStrategy,
            &["a", "b"],
            true,
        )]);
        let report = engine().validate(&c, &lookup(vec![with_case, plain]));
        assert_eq!(report.by_rule("business_needs_cases").count(), 0);
    }

    #[test]
    fn beginner_hour_cap_is_strict() {
        let resources = lookup(vec![resource("a", "mit", ContentType::Course)]);
        let mut p = path(DifficultyLevel::Beginner, SkillDomain::MlBasics, &["a"], true);
        p.total_estimated_hours = 20.0;
        let report = engine().validate(&curriculum(vec![p.clone()]), &resources);
        assert_eq!(report.by_rule("beginner_hour_cap").count(), 0);

        p.total_estimated_hours = 20.5;
        let report = engine().validate(&curriculum(vec![p]), &resources);
        assert_eq!(report.by_rule("beginner_hour_cap").count(), 1);
    }

    #[test]
    fn rule_table_lists_seven_rules() {
        assert_eq!(RULES.len(), 7);
    }
}

//! Static skill taxonomy.
//!
//! Each [`SkillDomain`] has one node with a display name, subtopics (used as
//! tags by the categorizer) and keywords (used for query generation and
//! keyword scoring). Domains also carry a static prerequisite graph used when
//! assembling learning paths.

use crate::types::SkillDomain;

/// One entry in the taxonomy table.
#[derive(Debug, Clone, Copy)]
pub struct TaxonomyNode {
    pub domain: SkillDomain,
    pub display_name: &'static str,
    pub subtopics: &'static [&'static str],
    pub keywords: &'static [&'static str],
}

/// The full taxonomy, in [`SkillDomain::ALL`] order.
pub static TAXONOMY: [TaxonomyNode; 13] = [
    // -- Technical --
    TaxonomyNode {
        domain: SkillDomain::MlBasics,
        display_name: "Machine Learning Fundamentals",
        subtopics: &[
            "supervised learning",
            "unsupervised learning",
            "feature engineering",
            "model evaluation",
            "cross-validation",
            "bias-variance tradeoff",
        ],
        keywords: &[
            "machine learning",
            "regression",
            "classification",
            "clustering",
            "decision tree",
            "random forest",
            "SVM",
            "scikit-learn",
            "gradient descent",
            "overfitting",
            "training set",
            "test set",
            "feature selection",
        ],
    },
    TaxonomyNode {
        domain: SkillDomain::DeepLearning,
        display_name: "Deep Learning",
        subtopics: &[
            "neural networks",
            "backpropagation",
            "convolutional networks",
            "recurrent networks",
            "attention mechanisms",
            "transfer learning",
        ],
        keywords: &[
            "deep learning",
            "neural network",
            "CNN",
            "RNN",
            "LSTM",
            "transformer",
            "PyTorch",
            "TensorFlow",
            "Keras",
            "backpropagation",
            "activation function",
            "dropout",
            "batch normalization",
            "GPU training",
        ],
    },
    TaxonomyNode {
        domain: SkillDomain::Nlp,
        display_name: "Natural Language Processing",
        subtopics: &[
            "text classification",
            "named entity recognition",
            "sentiment analysis",
            "machine translation",
            "question answering",
            "text generation",
        ],
        keywords: &[
            "NLP",
            "natural language processing",
            "tokenization",
            "embedding",
            "word2vec",
            "BERT",
            "GPT",
            "language model",
            "text mining",
            "corpus",
            "spaCy",
            "Hugging Face",
            "seq2seq",
        ],
    },
    TaxonomyNode {
        domain: SkillDomain::ComputerVision,
        display_name: "Computer Vision",
        subtopics: &[
            "image classification",
            "object detection",
            "image segmentation",
            "generative models for images",
            "video analysis",
        ],
        keywords: &[
            "computer vision",
            "image recognition",
            "object detection",
            "YOLO",
            "ResNet",
            "image segmentation",
            "OpenCV",
            "convolutional",
            "data augmentation",
            "bounding box",
        ],
    },
    TaxonomyNode {
        domain: SkillDomain::Mlops,
        display_name: "MLOps & Production ML",
        subtopics: &[
            "model deployment",
            "CI/CD for ML",
            "experiment tracking",
            "model monitoring",
            "feature stores",
            "ML pipelines",
        ],
        keywords: &[
            "MLOps",
            "model deployment",
            "MLflow",
            "Kubeflow",
            "model serving",
            "feature store",
            "experiment tracking",
            "model registry",
            "containerization",
            "Docker",
            "Kubernetes",
            "CI/CD",
        ],
    },
    TaxonomyNode {
        domain: SkillDomain::GenerativeAi,
        display_name: "Generative AI",
        subtopics: &[
            "large language models",
            "prompt engineering",
            "fine-tuning",
            "RAG",
            "diffusion models",
            "AI agents",
        ],
        keywords: &[
            "generative AI",
            "LLM",
            "large language model",
            "prompt engineering",
            "fine-tuning",
            "RLHF",
            "diffusion model",
            "Stable Diffusion",
            "ChatGPT",
            "RAG",
            "retrieval augmented",
            "AI agent",
            "langchain",
        ],
    },
    TaxonomyNode {
        domain: SkillDomain::ReinforcementLearning,
        display_name: "Reinforcement Learning",
        subtopics: &[
            "Markov decision processes",
            "Q-learning",
            "policy gradient",
            "multi-agent RL",
            "reward shaping",
        ],
        keywords: &[
            "reinforcement learning",
            "RL",
            "Q-learning",
            "policy gradient",
            "reward",
            "environment",
            "agent",
            "Markov decision",
            "exploration",
            "exploitation",
            "OpenAI Gym",
        ],
    },
    TaxonomyNode {
        domain: SkillDomain::DataEngineering,
        display_name: "Data Engineering for AI",
        subtopics: &[
            "data pipelines",
            "data warehousing",
            "ETL",
            "data quality",
            "streaming data",
        ],
        keywords: &[
            "data engineering",
            "ETL",
            "data pipeline",
            "Apache Spark",
            "data warehouse",
            "data lake",
            "Airflow",
            "Kafka",
            "data quality",
            "data governance",
        ],
    },
    // -- Business --
    TaxonomyNode {
        domain: SkillDomain::AiStrategy,
        display_name: "AI Strategy",
        subtopics: &[
            "AI roadmap",
            "AI maturity model",
            "build vs buy",
            "AI use case identification",
            "organizational readiness",
        ],
        keywords: &[
            "AI strategy",
            "digital transformation",
            "AI adoption",
            "AI roadmap",
            "AI maturity",
            "use case",
            "competitive advantage",
            "AI initiative",
            "executive",
            "business strategy",
        ],
    },
    TaxonomyNode {
        domain: SkillDomain::AiEthics,
        display_name: "AI Ethics & Responsible AI",
        subtopics: &[
            "fairness",
            "bias detection",
            "explainability",
            "privacy",
            "accountability",
            "AI safety",
        ],
        keywords: &[
            "AI ethics",
            "responsible AI",
            "fairness",
            "bias",
            "explainability",
            "interpretability",
            "XAI",
            "privacy",
            "GDPR",
            "accountability",
            "AI safety",
            "alignment",
            "transparency",
        ],
    },
    TaxonomyNode {
        domain: SkillDomain::AiProjectManagement,
        display_name: "AI Project Management",
        subtopics: &[
            "ML project lifecycle",
            "team structure",
            "agile for AI",
            "stakeholder management",
            "risk management",
        ],
        keywords: &[
            "AI project management",
            "ML lifecycle",
            "data science team",
            "agile",
            "scrum",
            "stakeholder",
            "risk management",
            "project planning",
            "cross-functional",
            "delivery",
        ],
    },
    TaxonomyNode {
        domain: SkillDomain::AiRoi,
        display_name: "AI Return on Investment",
        subtopics: &[
            "cost-benefit analysis",
            "AI value measurement",
            "total cost of ownership",
            "scaling AI",
        ],
        keywords: &[
            "AI ROI",
            "return on investment",
            "cost-benefit",
            "business value",
            "total cost",
            "scaling AI",
            "monetization",
            "KPI",
            "business case",
            "value measurement",
        ],
    },
    TaxonomyNode {
        domain: SkillDomain::AiGovernance,
        display_name: "AI Governance & Compliance",
        subtopics: &[
            "model risk management",
            "regulatory compliance",
            "AI audit",
            "documentation standards",
        ],
        keywords: &[
            "AI governance",
            "model risk",
            "compliance",
            "regulation",
            "audit",
            "documentation",
            "EU AI Act",
            "model card",
            "risk assessment",
            "policy",
        ],
    },
];

/// Look up the taxonomy node for a domain.
pub fn node(domain: SkillDomain) -> &'static TaxonomyNode {
    // TAXONOMY is laid out in declaration order of SkillDomain.
    &TAXONOMY[domain as usize]
}

/// Nodes for the requested domains, or every node when `domains` is empty.
pub fn nodes_for(domains: &[SkillDomain]) -> Vec<&'static TaxonomyNode> {
    TAXONOMY
        .iter()
        .filter(|n| domains.is_empty() || domains.contains(&n.domain))
        .collect()
}

/// Domains that must be completed before starting `domain`.
pub fn dependencies(domain: SkillDomain) -> &'static [SkillDomain] {
    use SkillDomain::*;
    match domain {
        DeepLearning => &[MlBasics],
        Nlp => &[DeepLearning],
        ComputerVision => &[DeepLearning],
        Mlops => &[MlBasics],
        GenerativeAi => &[DeepLearning, Nlp],
        ReinforcementLearning => &[MlBasics],
        AiProjectManagement => &[AiStrategy],
        AiRoi => &[AiStrategy],
        AiGovernance => &[AiEthics],
        MlBasics | DataEngineering | AiStrategy | AiEthics => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_in_domain_order() {
        for (node, domain) in TAXONOMY.iter().zip(SkillDomain::ALL) {
            assert_eq!(node.domain, domain);
            assert!(!node.keywords.is_empty());
            assert!(!node.subtopics.is_empty());
        }
    }

    #[test]
    fn node_lookup() {
        assert_eq!(node(SkillDomain::Nlp).display_name, "Natural Language Processing");
        assert_eq!(node(SkillDomain::AiGovernance).keywords.len(), 10);
    }

    #[test]
    fn nodes_for_filters() {
        assert_eq!(nodes_for(&[]).len(), 13);
        let picked = nodes_for(&[SkillDomain::AiRoi, SkillDomain::MlBasics]);
        assert_eq!(picked.len(), 2);
        assert_eq!(picked[0].domain, SkillDomain::MlBasics);
    }

    #[test]
    fn dependency_graph_is_acyclic_towards_roots() {
        assert_eq!(dependencies(SkillDomain::GenerativeAi), &[SkillDomain::DeepLearning, SkillDomain::Nlp]);
        assert!(dependencies(SkillDomain::MlBasics).is_empty());
        // Every chain terminates within the table size.
        for domain in SkillDomain::ALL {
            let mut frontier = vec![domain];
            for _ in 0..SkillDomain::ALL.len() {
                frontier = frontier.iter().flat_map(|d| dependencies(*d).iter().copied()).collect();
            }
            assert!(frontier.is_empty(), "cycle through {domain}");
        }
    }
}

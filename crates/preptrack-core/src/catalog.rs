//! Built-in topic catalog seeded on first run.

use crate::models::Topic;

/// Categories and their topics, in display order.
pub const DEFAULT_CATALOG: &[(&str, &[&str])] = &[
    (
        "ML Algorithms & Neural Networks",
        &[
            "Random Forest",
            "SVM",
            "Naive Bayes",
            "k-NN",
            "Ensemble Methods",
            "k-Means",
            "PCA",
            "Clustering",
            "Neural Network Fundamentals",
            "Backpropagation",
            "Activation Functions",
            "CNNs Architecture",
            "Convolution & Pooling",
            "Transfer Learning",
            "RNN Fundamentals",
            "LSTM",
            "GRU",
            "Vanishing Gradient",
            "Transformers & Attention",
            "Self-Attention",
            "Multi-Head Attention",
            "Positional Encoding",
            "GANs",
            "Generator/Discriminator",
            "Mode Collapse",
            "Autoencoders",
            "VAE",
            "Graph Neural Networks",
            "Node Embeddings",
            "Message Passing",
        ],
    ),
    (
        "Computer Vision",
        &[
            "Object Detection (YOLO)",
            "Object Tracking (DeepSORT)",
            "MOTA/MOTP/IDF1",
            "Semantic Segmentation",
            "Instance Segmentation",
            "Amodal Segmentation",
            "SLAM",
            "Camera Calibration",
            "Homogeneous Coordinates",
            "Epipolar Geometry",
        ],
    ),
    (
        "NLP & LLMs",
        &[
            "Tokenization",
            "Word2Vec",
            "Subword Tokenization",
            "Attention Mechanisms",
            "RAG (Retrieval-Augmented Generation)",
            "Fine-tuning",
            "RLHF",
            "DPO",
            "Prompt Engineering",
            "Hallucination",
            "LLM Evaluation",
        ],
    ),
    (
        "Statistics & Probability",
        &[
            "Normal Distribution",
            "Binomial Distribution",
            "Poisson Distribution",
            "Hypothesis Testing",
            "p-values",
            "Type I/II Errors",
            "t-test",
            "z-test",
            "Chi-square",
            "ANOVA",
            "Mann-Whitney",
            "Wilcoxon",
            "Bias-Variance Tradeoff",
            "Chebyshev Inequality",
            "Markov Inequality",
            "Jensen's Inequality",
        ],
    ),
    (
        "Model Evaluation & Validation",
        &[
            "Confusion Matrix",
            "Precision & Recall",
            "F1 Score",
            "ROC/AUC",
            "Cross-Validation",
            "Data Drift",
            "Concept Drift",
            "Variable Selection",
            "AIC/BIC",
        ],
    ),
    (
        "Regression & Optimization",
        &[
            "Linear Regression",
            "Lasso (L1)",
            "Ridge (L2)",
            "Elastic Net",
            "Gradient Descent",
            "SGD",
            "Adam Optimizer",
            "MSE",
            "MSPE",
            "Cross-Entropy Loss",
        ],
    ),
    (
        "Data Engineering",
        &[
            "Relational Databases",
            "NoSQL",
            "Graph Databases",
            "Vector Databases",
            "Spatial Databases",
            "ACID Properties",
            "Star Schema",
            "Snowflake Schema",
            "Normalization",
            "B-Tree Index",
            "Hash Index",
            "Spatial Index (R-Tree)",
            "Clustered vs Non-clustered Index",
            "Sharding",
            "Partitioning",
            "Slowly Changing Dimensions",
            "SCD Types",
            "ETL Pipelines",
        ],
    ),
    (
        "System Design & Architecture",
        &[
            "Horizontal Scaling",
            "Vertical Scaling",
            "CAP Theorem",
            "Caching Strategies",
            "Load Balancing",
            "Replication",
            "Eventual Consistency",
            "Circuit Breakers",
            "Fault Tolerance",
        ],
    ),
    (
        "Software Engineering",
        &[
            "Merge Sort",
            "Quick Sort",
            "Complexity Analysis",
            "Binary Trees",
            "Heaps",
            "Docker",
            "Containerization",
            "CI/CD Pipelines",
            "Memory Management",
        ],
    ),
    (
        "Behavioral & Soft Skills",
        &[
            "Leadership & Influence",
            "Stakeholder Management",
            "Technical Communication",
            "Problem-Solving Approach",
            "STAR Method",
        ],
    ),
];

/// Fresh topics for the whole catalog, each with a device-local id.
#[must_use]
pub fn default_topics() -> Vec<Topic> {
    DEFAULT_CATALOG
        .iter()
        .flat_map(|(category, names)| names.iter().map(move |name| Topic::new(*category, *name)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_topics_have_unique_merge_keys() {
        let topics = default_topics();
        let keys = topics.iter().map(Topic::merge_key).collect::<HashSet<_>>();
        assert_eq!(keys.len(), topics.len());
        assert_eq!(
            topics.len(),
            DEFAULT_CATALOG.iter().map(|(_, names)| names.len()).sum::<usize>()
        );
    }
}

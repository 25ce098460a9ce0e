use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage directories of the document pipeline, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Intents,
    Contexts,
    Specs,
    Plans,
    Tasks,
    Implementation,
    Feedback,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 7] = [
        PipelineStage::Intents,
        PipelineStage::Contexts,
        PipelineStage::Specs,
        PipelineStage::Plans,
        PipelineStage::Tasks,
        PipelineStage::Implementation,
        PipelineStage::Feedback,
    ];

    /// Directory name used in both layouts
    pub fn dir_name(&self) -> &'static str {
        match self {
            PipelineStage::Intents => "intents",
            PipelineStage::Contexts => "contexts",
            PipelineStage::Specs => "specs",
            PipelineStage::Plans => "plans",
            PipelineStage::Tasks => "tasks",
            PipelineStage::Implementation => "implementation",
            PipelineStage::Feedback => "feedback",
        }
    }

    /// The stage's main document; the one `current/` pointers track
    pub fn primary_artifact(&self) -> ArtifactKind {
        match self {
            PipelineStage::Intents => ArtifactKind::Intent,
            PipelineStage::Contexts => ArtifactKind::Context,
            PipelineStage::Specs => ArtifactKind::Spec,
            PipelineStage::Plans => ArtifactKind::Plan,
            PipelineStage::Tasks => ArtifactKind::Tasks,
            PipelineStage::Implementation => ArtifactKind::Implementation,
            PipelineStage::Feedback => ArtifactKind::Feedback,
        }
    }

    pub fn artifacts(&self) -> impl Iterator<Item = ArtifactKind> + '_ {
        ArtifactKind::ALL
            .into_iter()
            .filter(move |artifact| artifact.stage() == *self)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Required documents of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    Intent,
    Context,
    Spec,
    Plan,
    TestPlan,
    Tasks,
    Implementation,
    Feedback,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 8] = [
        ArtifactKind::Intent,
        ArtifactKind::Context,
        ArtifactKind::Spec,
        ArtifactKind::Plan,
        ArtifactKind::TestPlan,
        ArtifactKind::Tasks,
        ArtifactKind::Implementation,
        ArtifactKind::Feedback,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ArtifactKind::Intent => "intent",
            ArtifactKind::Context => "context",
            ArtifactKind::Spec => "spec",
            ArtifactKind::Plan => "plan",
            ArtifactKind::TestPlan => "test-plan",
            ArtifactKind::Tasks => "tasks",
            ArtifactKind::Implementation => "implementation",
            ArtifactKind::Feedback => "feedback",
        }
    }

    pub fn stage(&self) -> PipelineStage {
        match self {
            ArtifactKind::Intent => PipelineStage::Intents,
            ArtifactKind::Context => PipelineStage::Contexts,
            ArtifactKind::Spec => PipelineStage::Specs,
            ArtifactKind::Plan | ArtifactKind::TestPlan => PipelineStage::Plans,
            ArtifactKind::Tasks => PipelineStage::Tasks,
            ArtifactKind::Implementation => PipelineStage::Implementation,
            ArtifactKind::Feedback => PipelineStage::Feedback,
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            ArtifactKind::Intent => "intent.md",
            ArtifactKind::Context => "context.md",
            ArtifactKind::Spec => "spec.md",
            ArtifactKind::Plan => "plan.md",
            ArtifactKind::TestPlan => "test-plan.md",
            ArtifactKind::Tasks => "tasks.md",
            ArtifactKind::Implementation => "README.md",
            ArtifactKind::Feedback => "feedback.md",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

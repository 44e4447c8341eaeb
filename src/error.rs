use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline error categories. Item-local failures (one URL, one corpus line,
/// one generated pair) are absorbed where they occur; everything else aborts
/// the run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("missing configuration: {0}")]
    Configuration(String),

    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("no pages could be scraped successfully")]
    NoContent,

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("invalid training record: {0}")]
    RecordParse(String),

    #[error("training file not found: {0}")]
    NotFound(String),

    #[error("need at least 10 valid examples, found {0}")]
    InsufficientData(usize),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("fine-tune job creation failed: {0}")]
    JobCreation(String),

    #[error("fine-tuning failed: {0}")]
    TrainingFailed(String),

    #[error("fine-tuning was cancelled")]
    TrainingCancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

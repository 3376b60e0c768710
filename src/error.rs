use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("frame {frame} has {found} values but the joint schema expects {expected}")]
    SchemaMismatch {
        frame: usize,
        expected: usize,
        found: usize,
    },

    #[error("the extension of `{0}` does not match the expected input")]
    UnsupportedFileExtension(String),

    #[error("cannot evaluate: {0}")]
    EvaluationPrecondition(String),

    #[error("ground truth has {gt} bones but prediction has {pred}")]
    BoneCountMismatch { gt: usize, pred: usize },

    #[error("bone #{index} is `{gt}` in ground truth but `{pred}` in prediction")]
    BoneOrderMismatch {
        index: usize,
        gt: String,
        pred: String,
    },

    #[error("sample period {0} is not a positive number of seconds")]
    SamplePeriod(f32),

    #[error("malformed dataset: {0}")]
    MalformedDataset(String),

    #[error("invalid track binding `{0}`")]
    InvalidBinding(String),

    #[error("no joint schema table named `{0}`")]
    UnknownSchemaTable(String),

    #[error("invalid capture camera: {0}")]
    Camera(String),

    #[error("invalid skeleton: {0}")]
    Skeleton(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

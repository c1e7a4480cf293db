use folio_notify::NotifyError;
use folio_pipeline::PipelineError;
use folio_refs::RefError;
use folio_store::StoreError;
use folio_tree::TreeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("commit failed: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("folder tree: {0}")]
    Tree(#[from] TreeError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("ref error: {0}")]
    Ref(#[from] RefError),

    #[error("notification hub: {0}")]
    Notify(#[from] NotifyError),
}

impl SdkError {
    /// The remote failure underneath, if the error came from the store.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::Pipeline(e) => e.store_error(),
            Self::Tree(TreeError::Store(e)) | Self::Store(e) => Some(e),
            _ => None,
        }
    }

    /// `true` when reloading and retrying is the right answer.
    pub fn is_conflict(&self) -> bool {
        self.store_error().is_some_and(StoreError::is_conflict)
    }

    pub fn is_not_found(&self) -> bool {
        self.store_error().is_some_and(StoreError::is_not_found)
    }
}

pub type SdkResult<T> = Result<T, SdkError>;

use shared::Prediction;
use yew::Properties;

/// What happened to the uploaded image.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Success(Prediction),
    Failure {
        message: String,
        /// Extra guidance when the user can fix the problem by re-uploading.
        hint: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadView {
    pub file_name: String,
    /// `data:` URI of the upload, absent when the bytes are not a displayable image.
    pub preview_src: Option<String>,
    pub outcome: AnalysisOutcome,
}

#[derive(Debug, Clone, PartialEq, Properties)]
pub struct PageProps {
    pub show_confidence: bool,
    #[prop_or_default]
    pub upload: Option<UploadView>,
}

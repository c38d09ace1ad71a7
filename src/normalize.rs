//! Text normalization shared by the classifier and model output cleanup

/// Lower-case `text` and strip markdown emphasis asterisks
#[must_use]
pub fn normalize(text: &str) -> String {
    text.to_lowercase().replace('*', "")
}

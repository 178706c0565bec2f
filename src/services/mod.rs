pub(crate) mod assessment;
pub(crate) mod attempts;
pub(crate) mod document_analysis;
pub(crate) mod json_import;
pub(crate) mod key_resolver;
pub(crate) mod payload;
pub(crate) mod question_reconciler;

pub(crate) mod attempts;
pub(crate) mod documents;
pub(crate) mod errors;
pub(crate) mod handlers;
pub(crate) mod papers;
pub(crate) mod quizzes;
pub(crate) mod router;
pub(crate) mod users;

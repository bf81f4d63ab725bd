pub mod backend;
pub mod generation;
pub mod session;

pub use backend::HttpAdminApi;
pub use generation::OpenAiQuizAdapter;
pub use session::FileCredentialStore;

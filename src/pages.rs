use actix_files::{Files, NamedFile};
use actix_web::web;

use crate::{AppState, Result};

/// Serve the chat page.
pub async fn chat_page(state: web::Data<AppState>) -> Result<NamedFile> {
    Ok(NamedFile::open_async(&state.config.chat.index_file).await?)
}

/// Mount the static asset directory under `/static`.
pub fn static_files(static_dir: &str) -> Files {
    Files::new("/static", static_dir)
}

// Adapters layer: concrete implementations for external systems (catalog
// HTTP API, docx container, PDF converter, MP4 tags).

pub mod docx;
pub mod kinopoisk;
pub mod pdf;
pub mod tags;
pub mod template;

pub mod template_renderer;

pub use template_renderer::{MiniJinjaRenderer, TemplateRenderer, TEMPLATE_EXTENSION};

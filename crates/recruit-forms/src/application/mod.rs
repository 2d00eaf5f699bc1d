//! Application layer
//!
//! Drives a form session for one agency: loading, editing, rendering and
//! submitting.

pub mod page;
pub mod routes;
pub mod session;
pub mod view;

pub use page::{ApplicationPage, PageView, SchemaRequest};
pub use routes::Route;
pub use session::FormSession;
pub use view::{render, Block, FieldView, FormView, JobOption, JobSelectorView, RenderContext, RowView, Widget};

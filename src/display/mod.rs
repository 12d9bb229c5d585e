//! Page-render facing views: lazy, cached, and never failing past a
//! display-ready message.

pub mod multiple;
pub mod page;
pub mod pagination;
pub mod shortcode;
pub mod single;

pub use multiple::{MultiData, MultiKind, MultiView, filter_params};
pub use page::{LoadState, PageRender, RenderContext};
pub use pagination::{Direction, PageLink, PaginationState, build_link, button_html};
pub use shortcode::{field_spans, link_with_query, replace_fields};
pub use single::{SingleKind, SingleView};

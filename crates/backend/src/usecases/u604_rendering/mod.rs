pub mod assets;
pub mod executor;
pub mod paging;
pub mod snapshot;
pub mod templates;

pub use executor::{RankingImages, RankingRenderer};
pub use snapshot::{Snapshotter, Viewport, WebDriverSnapshotter};
pub use templates::TemplateRenderer;

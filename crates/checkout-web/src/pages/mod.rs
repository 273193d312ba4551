//! Pages

mod result;
mod subscribe;

pub use result::ResultPage;
pub use subscribe::SubscribePage;

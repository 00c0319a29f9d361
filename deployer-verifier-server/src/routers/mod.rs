mod app;
mod deployers;
mod router;

pub use self::{
    app::AppRouter,
    router::{configure_router, Router},
};

//! A multi-tenant project and task tracker with cookie sessions.
//!
//! Sessions are signed, self-contained tokens renewed on every request by
//! the route guard in [`middleware_layer::auth`].

pub mod app;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod state;

pub mod crypto {
    pub mod password;
    pub mod token;
}

pub mod models {
    pub mod project;
    pub mod session;
    pub mod task;
    pub mod user;
}

pub mod repositories {
    pub mod memory;
    pub mod project;
    pub mod task;
    pub mod user;
}

pub mod services {
    pub mod dashboard;
    pub mod projects;
    pub mod session;
    pub mod tasks;
}

pub mod handlers {
    pub mod auth;
    pub mod dashboard;
    pub mod projects;
    pub mod tasks;
}

pub mod middleware_layer {
    pub mod auth;
}

pub mod validation {
    pub mod forms;
}

pub use app::build_app;
pub use config::Config;
pub use state::AppState;

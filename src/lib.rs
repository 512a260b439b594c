pub mod api;
pub mod composer;
pub mod config;
pub mod draft;
pub mod tg_login;
pub mod ui;
pub mod view;

#[cfg(test)]
mod test_support;

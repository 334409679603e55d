pub mod admin_view;
pub mod app;
pub mod claim_view;
pub mod event_setup_view;
pub mod events_view;
pub mod hooks;
pub mod organizer_view;
pub mod services;
pub mod steps;
pub mod wallet_bar;

#[cfg(target_family = "wasm")]
pub mod browser;
#[cfg(target_family = "wasm")]
pub mod wallet_sdk;

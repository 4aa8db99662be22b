mod demo;
mod web_app;

pub use demo::{fetch_users, user_columns, User, UsersPage};
pub use web_app::{SiteApp, UsersTableDemo};

#[cfg(all(feature = "csr", target_arch = "wasm32"))]
pub fn mount() {
    console_error_panic_hook::set_once();
    leptos::mount_to_body(|| leptos::view! { <SiteApp /> })
}

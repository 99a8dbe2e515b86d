#[path = "../test_utils.rs"]
mod test_utils;

mod auth_test;
mod import_test;
mod middleware_test;
mod pending_test;
mod router_test;

use std::sync::Once;
use tkhash::common::logger as core_logger;

static INIT: Once = Once::new();

pub fn init_test_logger() {
    INIT.call_once(|| {
        // Prefer INFO level for CI noise; override via RUST_LOG when needed
        if std::env::var("RUST_LOG").is_err() {
            std::env::set_var("RUST_LOG", "info");
        }
        core_logger::initialize_logger();
    });
}

#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(val) => val,
            Err(err) => panic!("Expected Ok(_), got Err({:?})", err),
        }
    };
    ($expr:expr, $($arg:tt)+) => {
        match $expr {
            Ok(val) => val,
            Err(err) => panic!(concat!("Expected Ok(_): ", $($arg)+, ": {:?}"), err),
        }
    };
}

#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        if $expr.is_ok() { panic!("Expected Err(_), got Ok(_)" ); }
    };
    ($expr:expr, $($arg:tt)+) => {
        if $expr.is_ok() { panic!(concat!("Expected Err(_): ", $($arg)+)); }
    };
}
